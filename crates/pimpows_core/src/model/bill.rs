//! Bill model: payable obligations with due date and payment status.
//!
//! # Invariants
//! - Stored status is `Pending` or `Paid`; "overdue" is derived from the
//!   due date and a reference day, never persisted.
//! - A paid bill has `paid_at`; a pending bill has neither `paid_at` nor
//!   `paid_value`.
//! - Installment bills carry `current_installment` in
//!   `1..=total_installments`.

use super::category::{Categorized, CategoryRef};
use super::money::Money;
use super::{epoch_ms_to_date, require_amount, require_text, ValidationError};
use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type BillId = Uuid;

/// How a bill repeats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recurrence {
    /// One-off bill.
    #[default]
    Single,
    /// Every month.
    Monthly,
    /// Every `recurrence_months` months.
    Custom,
}

impl Recurrence {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Monthly => "monthly",
            Self::Custom => "custom",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "single" => Some(Self::Single),
            "monthly" => Some(Self::Monthly),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }
}

/// Persisted payment state shared by bills and loans.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "paid" => Some(Self::Paid),
            _ => None,
        }
    }
}

/// Display status of a bill relative to a reference day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillStatus {
    Pending,
    Paid,
    Overdue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bill {
    pub id: BillId,
    pub name: String,
    pub due_date: NaiveDate,
    /// Expected amount; some bills are registered before the value is known.
    pub value: Option<Money>,
    pub paid_value: Option<Money>,
    pub recurrence: Recurrence,
    pub recurrence_months: Option<u32>,
    pub total_installments: Option<u32>,
    pub current_installment: Option<u32>,
    pub observation: Option<String>,
    pub status: PaymentStatus,
    /// Epoch milliseconds of the payment.
    pub paid_at: Option<i64>,
    pub categories: Vec<CategoryRef>,
}

impl Bill {
    /// Creates a pending one-off bill with a generated id.
    pub fn new(name: impl Into<String>, due_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            due_date,
            value: None,
            paid_value: None,
            recurrence: Recurrence::Single,
            recurrence_months: None,
            total_installments: None,
            current_installment: None,
            observation: None,
            status: PaymentStatus::Pending,
            paid_at: None,
            categories: Vec::new(),
        }
    }

    pub fn is_paid(&self) -> bool {
        self.status == PaymentStatus::Paid
    }

    pub fn is_pending(&self) -> bool {
        self.status == PaymentStatus::Pending
    }

    /// Pending and due strictly before `today`.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.is_pending() && self.due_date < today
    }

    pub fn effective_status(&self, today: NaiveDate) -> BillStatus {
        match self.status {
            PaymentStatus::Paid => BillStatus::Paid,
            PaymentStatus::Pending if self.due_date < today => BillStatus::Overdue,
            PaymentStatus::Pending => BillStatus::Pending,
        }
    }

    /// UTC calendar day of the payment, when paid.
    pub fn paid_on(&self) -> Option<NaiveDate> {
        self.paid_at.and_then(epoch_ms_to_date)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)?;
        if let Some(value) = self.value {
            require_amount("value", value)?;
        }
        if let Some(paid_value) = self.paid_value {
            require_amount("paid_value", paid_value)?;
        }

        if self.recurrence == Recurrence::Custom && self.recurrence_months.unwrap_or(0) == 0 {
            return Err(ValidationError::MissingRecurrenceMonths);
        }

        match (self.current_installment, self.total_installments) {
            (Some(0), _) | (_, Some(0)) => return Err(ValidationError::ZeroInstallments),
            (Some(current), Some(total)) if current > total => {
                return Err(ValidationError::InvalidInstallment { current, total });
            }
            _ => {}
        }

        match self.status {
            PaymentStatus::Paid if self.paid_at.is_none() => Err(
                ValidationError::InconsistentPayment("paid bill requires paid_at"),
            ),
            PaymentStatus::Pending if self.paid_at.is_some() || self.paid_value.is_some() => Err(
                ValidationError::InconsistentPayment("pending bill must not carry payment data"),
            ),
            _ => Ok(()),
        }
    }
}

impl Categorized for Bill {
    fn categories(&self) -> &[CategoryRef] {
        &self.categories
    }
}

/// Month step between installments for a recurrence policy.
///
/// Returns `None` for one-off bills.
pub fn installment_step_months(
    recurrence: Recurrence,
    recurrence_months: Option<u32>,
) -> Option<u32> {
    match recurrence {
        Recurrence::Single => None,
        Recurrence::Monthly => Some(1),
        Recurrence::Custom => recurrence_months.filter(|months| *months > 0),
    }
}

/// Due date of the zero-based installment `index`.
///
/// Day-of-month is clamped to the target month's last day, so a bill due
/// on Jan 31 has its second installment on Feb 28/29.
pub fn installment_due_date(
    first_due: NaiveDate,
    index: u32,
    step_months: u32,
) -> Option<NaiveDate> {
    first_due.checked_add_months(Months::new(index.checked_mul(step_months)?))
}

#[cfg(test)]
mod tests {
    use super::{
        installment_due_date, installment_step_months, Bill, BillStatus, PaymentStatus, Recurrence,
    };
    use crate::model::money::Money;
    use crate::model::ValidationError;
    use chrono::NaiveDate;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn overdue_is_derived_from_reference_day() {
        let bill = Bill::new("Luz", day(2024, 5, 10));
        assert_eq!(bill.effective_status(day(2024, 5, 10)), BillStatus::Pending);
        assert_eq!(bill.effective_status(day(2024, 5, 11)), BillStatus::Overdue);

        let mut paid = bill.clone();
        paid.status = PaymentStatus::Paid;
        paid.paid_at = Some(0);
        assert_eq!(paid.effective_status(day(2030, 1, 1)), BillStatus::Paid);
    }

    #[test]
    fn installment_dates_clamp_to_month_end() {
        let first = day(2024, 1, 31);
        assert_eq!(installment_due_date(first, 0, 1), Some(first));
        assert_eq!(installment_due_date(first, 1, 1), Some(day(2024, 2, 29)));
        assert_eq!(installment_due_date(first, 2, 1), Some(day(2024, 3, 31)));
        assert_eq!(installment_due_date(first, 1, 3), Some(day(2024, 4, 30)));
    }

    #[test]
    fn step_depends_on_recurrence() {
        assert_eq!(installment_step_months(Recurrence::Single, Some(3)), None);
        assert_eq!(installment_step_months(Recurrence::Monthly, None), Some(1));
        assert_eq!(installment_step_months(Recurrence::Custom, Some(3)), Some(3));
        assert_eq!(installment_step_months(Recurrence::Custom, None), None);
    }

    #[test]
    fn validate_checks_installments_and_payment_state() {
        let mut bill = Bill::new("Carro", day(2024, 1, 5));
        bill.total_installments = Some(3);
        bill.current_installment = Some(4);
        assert_eq!(
            bill.validate(),
            Err(ValidationError::InvalidInstallment { current: 4, total: 3 })
        );

        let mut pending_with_value = Bill::new("Agua", day(2024, 1, 5));
        pending_with_value.paid_value = Some(Money::new(10, 0));
        assert!(matches!(
            pending_with_value.validate(),
            Err(ValidationError::InconsistentPayment(_))
        ));

        let mut custom = Bill::new("IPVA", day(2024, 1, 5));
        custom.recurrence = Recurrence::Custom;
        assert_eq!(custom.validate(), Err(ValidationError::MissingRecurrenceMonths));
    }
}
