//! Dated monetary records: income entries, expense entries and income
//! predictions.

use super::bill::BillId;
use super::category::{Categorized, CategoryRef};
use super::money::Money;
use super::{epoch_ms_to_date, require_amount, require_text, ValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type IncomeId = Uuid;
pub type ExpenseId = Uuid;
pub type PredictionId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeEntry {
    pub id: IncomeId,
    pub date: NaiveDate,
    /// Who paid (employer, client, ...).
    pub origin: String,
    /// Receiving bank account, free text.
    pub account: Option<String>,
    pub value: Money,
    pub categories: Vec<CategoryRef>,
}

impl IncomeEntry {
    pub fn new(date: NaiveDate, origin: impl Into<String>, value: Money) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            origin: origin.into(),
            account: None,
            value,
            categories: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("origin", &self.origin)?;
        require_amount("value", self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseEntry {
    pub id: ExpenseId,
    pub date: NaiveDate,
    pub name: String,
    pub value: Money,
    /// Bill whose payment produced this expense.
    pub bill_id: Option<BillId>,
    pub categories: Vec<CategoryRef>,
}

impl ExpenseEntry {
    pub fn new(date: NaiveDate, name: impl Into<String>, value: Money) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            name: name.into(),
            value,
            bill_id: None,
            categories: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)?;
        require_amount("value", self.value)
    }
}

/// Forecasted income; `paid_at` is set once the money arrives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomePrediction {
    pub id: PredictionId,
    pub date: NaiveDate,
    pub origin: String,
    pub value: Money,
    pub paid_at: Option<i64>,
    pub categories: Vec<CategoryRef>,
}

impl IncomePrediction {
    pub fn new(date: NaiveDate, origin: impl Into<String>, value: Money) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            origin: origin.into(),
            value,
            paid_at: None,
            categories: Vec::new(),
        }
    }

    pub fn is_paid(&self) -> bool {
        self.paid_at.is_some()
    }

    pub fn paid_on(&self) -> Option<NaiveDate> {
        self.paid_at.and_then(epoch_ms_to_date)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("origin", &self.origin)?;
        require_amount("value", self.value)
    }
}

impl Categorized for IncomeEntry {
    fn categories(&self) -> &[CategoryRef] {
        &self.categories
    }
}

impl Categorized for ExpenseEntry {
    fn categories(&self) -> &[CategoryRef] {
        &self.categories
    }
}

impl Categorized for IncomePrediction {
    fn categories(&self) -> &[CategoryRef] {
        &self.categories
    }
}
