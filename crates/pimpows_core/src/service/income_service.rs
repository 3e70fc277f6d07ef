//! Income entry use-case service.

use super::{
    matches_search, resolve_categories, trimmed, EntrySort, LedgerError, LedgerResult,
};
use crate::model::category::{Categorized, CategoryId, CategoryKind};
use crate::model::entry::{IncomeEntry, IncomeId};
use crate::model::money::Money;
use crate::repo::income_repo::{IncomeRepository, SqliteIncomeRepository};
use crate::repo::DateWindow;
use chrono::NaiveDate;
use log::info;
use rusqlite::Connection;
use std::cmp::Reverse;
use std::collections::HashSet;

/// Request model for recording received income.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIncome {
    pub date: NaiveDate,
    pub origin: String,
    pub account: Option<String>,
    pub value: Money,
    pub category_ids: Vec<CategoryId>,
}

/// Partial update; `account: Some(None)` clears the account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncomePatch {
    pub date: Option<NaiveDate>,
    pub origin: Option<String>,
    pub account: Option<Option<String>>,
    pub value: Option<Money>,
    pub category_ids: Option<Vec<CategoryId>>,
}

/// Query options shared by income and expense listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryListQuery {
    pub window: DateWindow,
    /// Keeps entries tagged with any of these; empty keeps all.
    pub categories: HashSet<CategoryId>,
    /// Case-insensitive substring of origin (income) or name (expense).
    pub search: Option<String>,
    pub sort: EntrySort,
}

pub struct IncomeService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> IncomeService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn create_income(&self, request: &NewIncome) -> LedgerResult<IncomeEntry> {
        let tx = self.conn.unchecked_transaction()?;
        let mut entry = IncomeEntry::new(request.date, request.origin.trim(), request.value);
        entry.account = trimmed(request.account.as_deref());
        entry.categories = resolve_categories(&tx, &request.category_ids, CategoryKind::Income)?;
        SqliteIncomeRepository::new(&tx).create_income(&entry)?;
        tx.commit()?;

        info!("event=income_create module=service status=ok");
        Ok(entry)
    }

    pub fn update_income(&self, id: IncomeId, patch: &IncomePatch) -> LedgerResult<IncomeEntry> {
        let tx = self.conn.unchecked_transaction()?;
        let repo = SqliteIncomeRepository::new(&tx);
        let mut entry = repo.get_income(id)?.ok_or(LedgerError::NotFound(id))?;

        if let Some(date) = patch.date {
            entry.date = date;
        }
        if let Some(origin) = &patch.origin {
            entry.origin = origin.trim().to_string();
        }
        if let Some(account) = &patch.account {
            entry.account = trimmed(account.as_deref());
        }
        if let Some(value) = patch.value {
            entry.value = value;
        }
        if let Some(category_ids) = &patch.category_ids {
            entry.categories = resolve_categories(&tx, category_ids, CategoryKind::Income)?;
        }

        repo.update_income(&entry)?;
        tx.commit()?;
        Ok(entry)
    }

    pub fn get_income(&self, id: IncomeId) -> LedgerResult<Option<IncomeEntry>> {
        Ok(SqliteIncomeRepository::new(self.conn).get_income(id)?)
    }

    pub fn delete_income(&self, id: IncomeId) -> LedgerResult<()> {
        SqliteIncomeRepository::new(self.conn).delete_income(id)?;
        info!("event=income_delete module=service status=ok");
        Ok(())
    }

    pub fn list_income(&self, query: &EntryListQuery) -> LedgerResult<Vec<IncomeEntry>> {
        let mut entries: Vec<IncomeEntry> = SqliteIncomeRepository::new(self.conn)
            .list_income(&query.window)?
            .into_iter()
            .filter(|entry| entry.matches_any(&query.categories))
            .filter(|entry| matches_search(&entry.origin, query.search.as_deref()))
            .collect();

        // Repository order is already date DESC.
        if query.sort == EntrySort::ValueDesc {
            entries.sort_by_key(|entry| (Reverse(entry.value), Reverse(entry.date)));
        }
        Ok(entries)
    }
}
