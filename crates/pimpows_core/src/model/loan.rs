//! Loan model: personal debt installments tracked like bills.

use super::bill::PaymentStatus;
use super::money::Money;
use super::{require_amount, require_text, ValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type LoanId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub name: String,
    pub due_date: NaiveDate,
    pub installment_value: Money,
    pub observation: Option<String>,
    pub status: PaymentStatus,
    pub paid_at: Option<i64>,
}

impl Loan {
    pub fn new(name: impl Into<String>, due_date: NaiveDate, installment_value: Money) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            due_date,
            installment_value,
            observation: None,
            status: PaymentStatus::Pending,
            paid_at: None,
        }
    }

    pub fn is_paid(&self) -> bool {
        self.status == PaymentStatus::Paid
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)?;
        require_amount("installment_value", self.installment_value)?;
        match (self.status, self.paid_at) {
            (PaymentStatus::Paid, None) => Err(ValidationError::InconsistentPayment(
                "paid loan requires paid_at",
            )),
            (PaymentStatus::Pending, Some(_)) => Err(ValidationError::InconsistentPayment(
                "pending loan must not carry paid_at",
            )),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Loan;
    use crate::model::bill::PaymentStatus;
    use crate::model::money::Money;
    use crate::model::ValidationError;
    use chrono::NaiveDate;

    #[test]
    fn paid_loan_without_timestamp_is_rejected() {
        let mut loan = Loan::new(
            "Emprestimo tio",
            NaiveDate::from_ymd_opt(2024, 2, 10).unwrap(),
            Money::new(300, 0),
        );
        assert!(loan.validate().is_ok());

        loan.status = PaymentStatus::Paid;
        assert!(matches!(
            loan.validate(),
            Err(ValidationError::InconsistentPayment(_))
        ));
    }
}
