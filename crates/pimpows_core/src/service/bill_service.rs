//! Bill use-case service.
//!
//! # Responsibility
//! - Create bills, expanding recurring bills into dated installments.
//! - Drive the pending/paid lifecycle and keep the matching expense entry
//!   in sync with it.
//! - Filter and sort bill listings.
//!
//! # Invariants
//! - Paying a bill and recording its expense happen in one transaction;
//!   so do reverting the payment and deleting that expense.
//! - All installments of one request share name, value and categories.

use super::{matches_search, resolve_categories, trimmed, LedgerError, LedgerResult};
use crate::model::bill::{
    installment_due_date, installment_step_months, Bill, BillId, BillStatus, PaymentStatus,
    Recurrence,
};
use crate::model::category::{Categorized, CategoryId, CategoryKind};
use crate::model::entry::ExpenseEntry;
use crate::model::epoch_ms_to_date;
use crate::model::money::Money;
use crate::repo::bill_repo::{BillRepository, SqliteBillRepository};
use crate::repo::expense_repo::{ExpenseRepository, SqliteExpenseRepository};
use chrono::NaiveDate;
use log::info;
use rusqlite::Connection;
use std::cmp::Reverse;

/// Upper bound for one installment expansion (30 years of monthly bills).
pub const MAX_INSTALLMENTS: u32 = 360;

/// Request model for registering a bill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBill {
    pub name: String,
    pub due_date: NaiveDate,
    pub value: Option<Money>,
    pub recurrence: Recurrence,
    /// Month step for `Recurrence::Custom`.
    pub recurrence_months: Option<u32>,
    /// When set on a recurring bill, that many installments are created.
    pub total_installments: Option<u32>,
    pub observation: Option<String>,
    pub category_ids: Vec<CategoryId>,
}

impl NewBill {
    pub fn single(name: impl Into<String>, due_date: NaiveDate, value: Option<Money>) -> Self {
        Self {
            name: name.into(),
            due_date,
            value,
            recurrence: Recurrence::Single,
            recurrence_months: None,
            total_installments: None,
            observation: None,
            category_ids: Vec::new(),
        }
    }
}

/// Partial update of a bill's editable fields.
///
/// Outer `None` keeps the stored value; `Some(None)` clears nullable fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BillPatch {
    pub name: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub value: Option<Option<Money>>,
    pub observation: Option<Option<String>>,
    /// Replaces the whole category set when present.
    pub category_ids: Option<Vec<CategoryId>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BillStatusFilter {
    #[default]
    All,
    Pending,
    Paid,
    Overdue,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BillSort {
    /// Earliest due date first.
    #[default]
    DueDate,
    /// Largest value first; bills without value last.
    ValueDesc,
}

/// Query options for bill listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillListQuery {
    /// Case-insensitive substring of the bill name.
    pub search: Option<String>,
    pub category: Option<CategoryId>,
    pub status: BillStatusFilter,
    pub sort: BillSort,
    /// Reference day for the overdue status.
    pub today: NaiveDate,
}

impl BillListQuery {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            search: None,
            category: None,
            status: BillStatusFilter::All,
            sort: BillSort::DueDate,
            today,
        }
    }
}

/// Result of paying a bill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillPayment {
    pub bill: Bill,
    pub expense: ExpenseEntry,
}

pub struct BillService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> BillService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Registers a bill, or one bill per installment for recurring bills
    /// with `total_installments`.
    ///
    /// # Contract
    /// - Installment `i` (0-based) is due `due_date + i * step` months,
    ///   day clamped to month end; step is 1 for monthly bills and
    ///   `recurrence_months` for custom ones.
    /// - `current_installment` runs `1..=total_installments`.
    /// - Every created bill starts pending.
    pub fn create_bill(&self, request: &NewBill) -> LedgerResult<Vec<Bill>> {
        let tx = self.conn.unchecked_transaction()?;
        let categories = resolve_categories(&tx, &request.category_ids, CategoryKind::Expense)?;

        let mut template = Bill::new(request.name.trim(), request.due_date);
        template.value = request.value;
        template.recurrence = request.recurrence;
        template.recurrence_months = request.recurrence_months;
        template.total_installments = request.total_installments;
        template.observation = trimmed(request.observation.as_deref());
        template.categories = categories;

        let step = installment_step_months(request.recurrence, request.recurrence_months);
        let bills = match (step, request.total_installments) {
            (Some(step), Some(total)) => expand_installments(&template, step, total)?,
            _ => vec![template],
        };

        let repo = SqliteBillRepository::new(&tx);
        for bill in &bills {
            repo.create_bill(bill)?;
        }
        tx.commit()?;

        info!(
            "event=bill_create module=service status=ok count={} recurrence={}",
            bills.len(),
            request.recurrence.as_str()
        );
        Ok(bills)
    }

    /// Applies a partial update; categories are replaced only when the
    /// patch carries a set.
    pub fn update_bill(&self, id: BillId, patch: &BillPatch) -> LedgerResult<Bill> {
        let tx = self.conn.unchecked_transaction()?;
        let repo = SqliteBillRepository::new(&tx);
        let mut bill = repo.get_bill(id)?.ok_or(LedgerError::NotFound(id))?;

        if let Some(name) = &patch.name {
            bill.name = name.trim().to_string();
        }
        if let Some(due_date) = patch.due_date {
            bill.due_date = due_date;
        }
        if let Some(value) = patch.value {
            bill.value = value;
        }
        if let Some(observation) = &patch.observation {
            bill.observation = trimmed(observation.as_deref());
        }
        if let Some(category_ids) = &patch.category_ids {
            bill.categories = resolve_categories(&tx, category_ids, CategoryKind::Expense)?;
        }

        repo.update_bill(&bill)?;
        tx.commit()?;
        Ok(bill)
    }

    /// Marks a bill as paid and records the matching expense entry.
    ///
    /// # Contract
    /// - The expense takes the bill's name and categories, `paid_value` as
    ///   value, the UTC day of `paid_at_ms` as date, and links back via
    ///   `bill_id`.
    /// - Paying an already-paid bill fails with `AlreadyPaid`.
    pub fn pay_bill(
        &self,
        id: BillId,
        paid_value: Money,
        paid_at_ms: i64,
    ) -> LedgerResult<BillPayment> {
        let paid_on =
            epoch_ms_to_date(paid_at_ms).ok_or(LedgerError::InvalidTimestamp(paid_at_ms))?;

        let tx = self.conn.unchecked_transaction()?;
        let bills = SqliteBillRepository::new(&tx);
        let mut bill = bills.get_bill(id)?.ok_or(LedgerError::NotFound(id))?;
        if bill.is_paid() {
            return Err(LedgerError::AlreadyPaid(id));
        }

        bill.status = PaymentStatus::Paid;
        bill.paid_value = Some(paid_value);
        bill.paid_at = Some(paid_at_ms);
        bills.update_bill(&bill)?;

        let mut expense = ExpenseEntry::new(paid_on, bill.name.clone(), paid_value);
        expense.bill_id = Some(bill.id);
        expense.categories = bill.categories.clone();
        SqliteExpenseRepository::new(&tx).create_expense(&expense)?;
        tx.commit()?;

        info!("event=bill_pay module=service status=ok bill_id={id}");
        Ok(BillPayment { bill, expense })
    }

    /// Returns a paid bill to pending and deletes the expenses its payment
    /// produced.
    pub fn unpay_bill(&self, id: BillId) -> LedgerResult<Bill> {
        let tx = self.conn.unchecked_transaction()?;
        let bills = SqliteBillRepository::new(&tx);
        let mut bill = bills.get_bill(id)?.ok_or(LedgerError::NotFound(id))?;
        if !bill.is_paid() {
            return Err(LedgerError::NotPaid(id));
        }

        bill.status = PaymentStatus::Pending;
        bill.paid_value = None;
        bill.paid_at = None;
        bills.update_bill(&bill)?;
        let removed = SqliteExpenseRepository::new(&tx).delete_expenses_for_bill(id)?;
        tx.commit()?;

        info!(
            "event=bill_unpay module=service status=ok bill_id={id} removed_expenses={removed}"
        );
        Ok(bill)
    }

    /// Deletes a bill; expenses it produced stay, with `bill_id` cleared.
    pub fn delete_bill(&self, id: BillId) -> LedgerResult<()> {
        SqliteBillRepository::new(self.conn).delete_bill(id)?;
        info!("event=bill_delete module=service status=ok bill_id={id}");
        Ok(())
    }

    /// Expenses produced by paying `id`, newest first.
    pub fn bill_expenses(&self, id: BillId) -> LedgerResult<Vec<ExpenseEntry>> {
        Ok(SqliteExpenseRepository::new(self.conn).list_expenses_for_bill(id)?)
    }

    pub fn get_bill(&self, id: BillId) -> LedgerResult<Option<Bill>> {
        Ok(SqliteBillRepository::new(self.conn).get_bill(id)?)
    }

    /// Every bill, earliest due first.
    pub fn all_bills(&self) -> LedgerResult<Vec<Bill>> {
        Ok(SqliteBillRepository::new(self.conn).list_bills()?)
    }

    pub fn list_bills(&self, query: &BillListQuery) -> LedgerResult<Vec<Bill>> {
        let bills = self.all_bills()?;
        Ok(filter_bills(bills, query))
    }
}

/// Applies search, category and status filters, then sorts.
pub fn filter_bills(bills: Vec<Bill>, query: &BillListQuery) -> Vec<Bill> {
    let mut result: Vec<Bill> = bills
        .into_iter()
        .filter(|bill| matches_search(&bill.name, query.search.as_deref()))
        .filter(|bill| query.category.map_or(true, |id| bill.has_category(id)))
        .filter(|bill| {
            let status = bill.effective_status(query.today);
            match query.status {
                BillStatusFilter::All => true,
                BillStatusFilter::Pending => status == BillStatus::Pending,
                BillStatusFilter::Paid => status == BillStatus::Paid,
                BillStatusFilter::Overdue => status == BillStatus::Overdue,
            }
        })
        .collect();

    match query.sort {
        BillSort::DueDate => result.sort_by_key(|bill| (bill.due_date, bill.id)),
        BillSort::ValueDesc => result.sort_by_key(|bill| {
            (
                bill.value.is_none(),
                Reverse(bill.value.unwrap_or(Money::ZERO)),
                bill.due_date,
                bill.id,
            )
        }),
    }
    result
}

fn expand_installments(template: &Bill, step: u32, total: u32) -> LedgerResult<Vec<Bill>> {
    if total == 0 || total > MAX_INSTALLMENTS {
        return Err(LedgerError::InstallmentCount {
            requested: total,
            max: MAX_INSTALLMENTS,
        });
    }

    (0..total)
        .map(|index| {
            let due_date = installment_due_date(template.due_date, index, step)
                .ok_or(LedgerError::InstallmentCount {
                    requested: total,
                    max: MAX_INSTALLMENTS,
                })?;
            let mut bill = Bill::new(template.name.clone(), due_date);
            bill.value = template.value;
            bill.recurrence = template.recurrence;
            bill.recurrence_months = template.recurrence_months;
            bill.total_installments = Some(total);
            bill.current_installment = Some(index + 1);
            bill.observation = template.observation.clone();
            bill.categories = template.categories.clone();
            Ok(bill)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{filter_bills, BillListQuery, BillSort, BillStatusFilter};
    use crate::model::bill::{Bill, PaymentStatus};
    use crate::model::money::Money;
    use chrono::NaiveDate;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn bill(name: &str, due: NaiveDate, value: Option<i64>) -> Bill {
        let mut bill = Bill::new(name, due);
        bill.value = value.map(Money::from_cents);
        bill
    }

    #[test]
    fn value_sort_puts_unknown_values_last() {
        let bills = vec![
            bill("a", day(2024, 1, 1), None),
            bill("b", day(2024, 1, 2), Some(100)),
            bill("c", day(2024, 1, 3), Some(900)),
        ];
        let mut query = BillListQuery::new(day(2024, 1, 1));
        query.sort = BillSort::ValueDesc;

        let names: Vec<_> = filter_bills(bills, &query)
            .into_iter()
            .map(|bill| bill.name)
            .collect();
        assert_eq!(names, vec!["c", "b", "a"]);
    }

    #[test]
    fn overdue_filter_uses_reference_day() {
        let mut paid = bill("paid", day(2024, 1, 1), Some(10));
        paid.status = PaymentStatus::Paid;
        paid.paid_at = Some(0);
        let bills = vec![
            bill("late", day(2024, 1, 5), Some(10)),
            bill("upcoming", day(2024, 1, 20), Some(10)),
            paid,
        ];
        let mut query = BillListQuery::new(day(2024, 1, 10));
        query.status = BillStatusFilter::Overdue;

        let overdue = filter_bills(bills.clone(), &query);
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].name, "late");

        query.status = BillStatusFilter::Pending;
        let pending = filter_bills(bills, &query);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].name, "upcoming");
    }
}
