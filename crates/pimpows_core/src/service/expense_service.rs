//! Expense entry use-case service.
//!
//! Expenses are either entered by hand or produced by paying a bill; the
//! latter carry `bill_id` and are removed when the payment is reverted.

use super::income_service::EntryListQuery;
use super::{matches_search, resolve_categories, EntrySort, LedgerError, LedgerResult};
use crate::model::category::{Categorized, CategoryId, CategoryKind};
use crate::model::entry::{ExpenseEntry, ExpenseId};
use crate::model::money::Money;
use crate::repo::expense_repo::{ExpenseRepository, SqliteExpenseRepository};
use chrono::NaiveDate;
use log::info;
use rusqlite::Connection;
use std::cmp::Reverse;

/// Request model for a hand-entered expense.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExpense {
    pub date: NaiveDate,
    pub name: String,
    pub value: Money,
    pub category_ids: Vec<CategoryId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpensePatch {
    pub date: Option<NaiveDate>,
    pub name: Option<String>,
    pub value: Option<Money>,
    pub category_ids: Option<Vec<CategoryId>>,
}

pub struct ExpenseService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> ExpenseService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn create_expense(&self, request: &NewExpense) -> LedgerResult<ExpenseEntry> {
        let tx = self.conn.unchecked_transaction()?;
        let mut entry = ExpenseEntry::new(request.date, request.name.trim(), request.value);
        entry.categories = resolve_categories(&tx, &request.category_ids, CategoryKind::Expense)?;
        SqliteExpenseRepository::new(&tx).create_expense(&entry)?;
        tx.commit()?;

        info!("event=expense_create module=service status=ok");
        Ok(entry)
    }

    /// Edits an expense. The `bill_id` link is kept as is.
    pub fn update_expense(
        &self,
        id: ExpenseId,
        patch: &ExpensePatch,
    ) -> LedgerResult<ExpenseEntry> {
        let tx = self.conn.unchecked_transaction()?;
        let repo = SqliteExpenseRepository::new(&tx);
        let mut entry = repo.get_expense(id)?.ok_or(LedgerError::NotFound(id))?;

        if let Some(date) = patch.date {
            entry.date = date;
        }
        if let Some(name) = &patch.name {
            entry.name = name.trim().to_string();
        }
        if let Some(value) = patch.value {
            entry.value = value;
        }
        if let Some(category_ids) = &patch.category_ids {
            entry.categories = resolve_categories(&tx, category_ids, CategoryKind::Expense)?;
        }

        repo.update_expense(&entry)?;
        tx.commit()?;
        Ok(entry)
    }

    pub fn get_expense(&self, id: ExpenseId) -> LedgerResult<Option<ExpenseEntry>> {
        Ok(SqliteExpenseRepository::new(self.conn).get_expense(id)?)
    }

    pub fn delete_expense(&self, id: ExpenseId) -> LedgerResult<()> {
        SqliteExpenseRepository::new(self.conn).delete_expense(id)?;
        info!("event=expense_delete module=service status=ok");
        Ok(())
    }

    pub fn list_expenses(&self, query: &EntryListQuery) -> LedgerResult<Vec<ExpenseEntry>> {
        let mut entries: Vec<ExpenseEntry> = SqliteExpenseRepository::new(self.conn)
            .list_expenses(&query.window)?
            .into_iter()
            .filter(|entry| entry.matches_any(&query.categories))
            .filter(|entry| matches_search(&entry.name, query.search.as_deref()))
            .collect();

        if query.sort == EntrySort::ValueDesc {
            entries.sort_by_key(|entry| (Reverse(entry.value), Reverse(entry.date)));
        }
        Ok(entries)
    }
}
