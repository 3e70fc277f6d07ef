//! Ledger domain model.
//!
//! # Responsibility
//! - Define the records the ledger stores: categories, bills, income and
//!   expense entries, income predictions and loans.
//! - Own per-record validation rules shared by repositories and services.
//!
//! # Invariants
//! - Every record is identified by a stable UUID.
//! - Amounts are `Money` (integer cents); calendar fields are `NaiveDate`.
//! - Payment timestamps are epoch milliseconds (UTC).

use chrono::{DateTime, NaiveDate};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod bill;
pub mod category;
pub mod entry;
pub mod loan;
pub mod money;

/// Validation failure for a ledger record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required text field is empty after trim.
    BlankField(&'static str),
    /// Amount field holds a negative value.
    NegativeAmount(&'static str),
    /// Amount field exceeds `Money::MAX`.
    AmountTooLarge(&'static str),
    /// Category color is not `#RRGGBB`.
    InvalidColor(String),
    /// `current_installment` falls outside `1..=total_installments`.
    InvalidInstallment { current: u32, total: u32 },
    /// Installment counters must be at least one.
    ZeroInstallments,
    /// Custom recurrence needs `recurrence_months >= 1`.
    MissingRecurrenceMonths,
    /// Payment fields disagree with the payment status.
    InconsistentPayment(&'static str),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "`{field}` must not be blank"),
            Self::NegativeAmount(field) => write!(f, "`{field}` must not be negative"),
            Self::AmountTooLarge(field) => {
                write!(f, "`{field}` must not exceed {}", money::Money::MAX)
            }
            Self::InvalidColor(value) => {
                write!(f, "invalid color `{value}`; expected #RRGGBB")
            }
            Self::InvalidInstallment { current, total } => write!(
                f,
                "installment {current} is outside the range 1..={total}"
            ),
            Self::ZeroInstallments => write!(f, "installment counters must be at least 1"),
            Self::MissingRecurrenceMonths => {
                write!(f, "custom recurrence requires recurrence_months >= 1")
            }
            Self::InconsistentPayment(details) => write!(f, "inconsistent payment: {details}"),
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::BlankField(field));
    }
    Ok(())
}

pub(crate) fn require_amount(
    field: &'static str,
    value: money::Money,
) -> Result<(), ValidationError> {
    if value.is_negative() {
        return Err(ValidationError::NegativeAmount(field));
    }
    if value > money::Money::MAX {
        return Err(ValidationError::AmountTooLarge(field));
    }
    Ok(())
}

/// Converts an epoch-millisecond timestamp into its UTC calendar day.
pub fn epoch_ms_to_date(epoch_ms: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp_millis(epoch_ms).map(|dt| dt.date_naive())
}
