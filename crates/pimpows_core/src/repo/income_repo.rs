//! Income entry repository contract and SQLite implementation.
//!
//! # Invariants
//! - Listing is ordered by `date DESC, id ASC`.
//! - Date windows are inclusive on both ends.

use super::links::{load_category_refs, replace_category_links, LinkTable};
use super::{
    check_row, date_to_db, expect_changed, in_write_scope, parse_date, parse_id, DateWindow,
    RepoResult,
};
use crate::model::entry::{IncomeEntry, IncomeId};
use crate::model::money::Money;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const INCOME_SELECT_SQL: &str =
    "SELECT id, date, origin, account, value_cents FROM income_entries";

pub trait IncomeRepository {
    fn create_income(&self, entry: &IncomeEntry) -> RepoResult<IncomeId>;
    fn update_income(&self, entry: &IncomeEntry) -> RepoResult<()>;
    fn get_income(&self, id: IncomeId) -> RepoResult<Option<IncomeEntry>>;
    fn list_income(&self, window: &DateWindow) -> RepoResult<Vec<IncomeEntry>>;
    fn delete_income(&self, id: IncomeId) -> RepoResult<()>;
}

pub struct SqliteIncomeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteIncomeRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn attach_categories(&self, mut entry: IncomeEntry) -> RepoResult<IncomeEntry> {
        entry.categories =
            load_category_refs(self.conn, LinkTable::Income, &entry.id.to_string())?;
        Ok(entry)
    }
}

impl IncomeRepository for SqliteIncomeRepository<'_> {
    fn create_income(&self, entry: &IncomeEntry) -> RepoResult<IncomeId> {
        entry.validate()?;
        let id = entry.id.to_string();

        in_write_scope(self.conn, || {
            self.conn.execute(
                "INSERT INTO income_entries (id, date, origin, account, value_cents)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    id,
                    date_to_db(entry.date),
                    entry.origin.trim(),
                    entry.account.as_deref(),
                    entry.value.cents(),
                ],
            )?;
            replace_category_links(
                self.conn,
                LinkTable::Income,
                &id,
                entry.categories.iter().map(|category| &category.id),
            )
        })?;

        Ok(entry.id)
    }

    fn update_income(&self, entry: &IncomeEntry) -> RepoResult<()> {
        entry.validate()?;
        let id = entry.id.to_string();

        in_write_scope(self.conn, || {
            let changed = self.conn.execute(
                "UPDATE income_entries
                 SET
                    date = ?2,
                    origin = ?3,
                    account = ?4,
                    value_cents = ?5,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1;",
                params![
                    id,
                    date_to_db(entry.date),
                    entry.origin.trim(),
                    entry.account.as_deref(),
                    entry.value.cents(),
                ],
            )?;
            expect_changed(changed, entry.id)?;
            replace_category_links(
                self.conn,
                LinkTable::Income,
                &id,
                entry.categories.iter().map(|category| &category.id),
            )
        })
    }

    fn get_income(&self, id: IncomeId) -> RepoResult<Option<IncomeEntry>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{INCOME_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(self.attach_categories(parse_income_row(row)?)?)),
            None => Ok(None),
        }
    }

    fn list_income(&self, window: &DateWindow) -> RepoResult<Vec<IncomeEntry>> {
        let mut sql = format!("{INCOME_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();
        if let Some(from) = window.from {
            sql.push_str(" AND date >= ?");
            bind_values.push(Value::Text(date_to_db(from)));
        }
        if let Some(to) = window.to {
            sql.push_str(" AND date <= ?");
            bind_values.push(Value::Text(date_to_db(to)));
        }
        sql.push_str(" ORDER BY date DESC, id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(self.attach_categories(parse_income_row(row)?)?);
        }
        Ok(entries)
    }

    fn delete_income(&self, id: IncomeId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM income_entries WHERE id = ?1;", [id.to_string()])?;
        expect_changed(changed, id)
    }
}

fn parse_income_row(row: &Row<'_>) -> RepoResult<IncomeEntry> {
    let id_text: String = row.get("id")?;
    let date_text: String = row.get("date")?;
    let entry = IncomeEntry {
        id: parse_id(&id_text, "income_entries.id")?,
        date: parse_date(&date_text, "income_entries.date")?,
        origin: row.get("origin")?,
        account: row.get("account")?,
        value: Money::from_cents(row.get("value_cents")?),
        categories: Vec::new(),
    };
    check_row(entry.validate(), "income_entries")?;
    Ok(entry)
}
