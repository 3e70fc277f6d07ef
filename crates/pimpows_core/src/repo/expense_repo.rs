//! Expense entry repository contract and SQLite implementation.
//!
//! # Invariants
//! - Listing is ordered by `date DESC, id ASC`.
//! - `bill_id` links an expense to the bill payment that produced it; it is
//!   cleared (not cascaded) when the bill is deleted.

use super::links::{load_category_refs, replace_category_links, LinkTable};
use super::{
    check_row, date_to_db, expect_changed, in_write_scope, parse_date, parse_id, DateWindow,
    RepoResult,
};
use crate::model::bill::BillId;
use crate::model::entry::{ExpenseEntry, ExpenseId};
use crate::model::money::Money;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const EXPENSE_SELECT_SQL: &str =
    "SELECT id, date, name, value_cents, bill_id FROM expense_entries";

pub trait ExpenseRepository {
    fn create_expense(&self, entry: &ExpenseEntry) -> RepoResult<ExpenseId>;
    fn update_expense(&self, entry: &ExpenseEntry) -> RepoResult<()>;
    fn get_expense(&self, id: ExpenseId) -> RepoResult<Option<ExpenseEntry>>;
    fn list_expenses(&self, window: &DateWindow) -> RepoResult<Vec<ExpenseEntry>>;
    fn list_expenses_for_bill(&self, bill_id: BillId) -> RepoResult<Vec<ExpenseEntry>>;
    fn delete_expense(&self, id: ExpenseId) -> RepoResult<()>;
    /// Deletes every expense produced by paying `bill_id`; returns the count.
    fn delete_expenses_for_bill(&self, bill_id: BillId) -> RepoResult<usize>;
}

pub struct SqliteExpenseRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteExpenseRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn attach_categories(&self, mut entry: ExpenseEntry) -> RepoResult<ExpenseEntry> {
        entry.categories =
            load_category_refs(self.conn, LinkTable::Expense, &entry.id.to_string())?;
        Ok(entry)
    }

    fn query_expenses(&self, sql: &str, bind_values: Vec<Value>) -> RepoResult<Vec<ExpenseEntry>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(self.attach_categories(parse_expense_row(row)?)?);
        }
        Ok(entries)
    }
}

impl ExpenseRepository for SqliteExpenseRepository<'_> {
    fn create_expense(&self, entry: &ExpenseEntry) -> RepoResult<ExpenseId> {
        entry.validate()?;
        let id = entry.id.to_string();

        in_write_scope(self.conn, || {
            self.conn.execute(
                "INSERT INTO expense_entries (id, date, name, value_cents, bill_id)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    id,
                    date_to_db(entry.date),
                    entry.name.trim(),
                    entry.value.cents(),
                    entry.bill_id.map(|bill_id| bill_id.to_string()),
                ],
            )?;
            replace_category_links(
                self.conn,
                LinkTable::Expense,
                &id,
                entry.categories.iter().map(|category| &category.id),
            )
        })?;

        Ok(entry.id)
    }

    fn update_expense(&self, entry: &ExpenseEntry) -> RepoResult<()> {
        entry.validate()?;
        let id = entry.id.to_string();

        in_write_scope(self.conn, || {
            let changed = self.conn.execute(
                "UPDATE expense_entries
                 SET
                    date = ?2,
                    name = ?3,
                    value_cents = ?4,
                    bill_id = ?5,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1;",
                params![
                    id,
                    date_to_db(entry.date),
                    entry.name.trim(),
                    entry.value.cents(),
                    entry.bill_id.map(|bill_id| bill_id.to_string()),
                ],
            )?;
            expect_changed(changed, entry.id)?;
            replace_category_links(
                self.conn,
                LinkTable::Expense,
                &id,
                entry.categories.iter().map(|category| &category.id),
            )
        })
    }

    fn get_expense(&self, id: ExpenseId) -> RepoResult<Option<ExpenseEntry>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{EXPENSE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(self.attach_categories(parse_expense_row(row)?)?)),
            None => Ok(None),
        }
    }

    fn list_expenses(&self, window: &DateWindow) -> RepoResult<Vec<ExpenseEntry>> {
        let mut sql = format!("{EXPENSE_SELECT_SQL} WHERE 1 = 1");
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
        self.query_expenses(&sql, bind_values)
    }

    fn list_expenses_for_bill(&self, bill_id: BillId) -> RepoResult<Vec<ExpenseEntry>> {
        self.query_expenses(
            &format!("{EXPENSE_SELECT_SQL} WHERE bill_id = ? ORDER BY date DESC, id ASC"),
            vec![Value::Text(bill_id.to_string())],
        )
    }

    fn delete_expense(&self, id: ExpenseId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM expense_entries WHERE id = ?1;", [id.to_string()])?;
        expect_changed(changed, id)
    }

    fn delete_expenses_for_bill(&self, bill_id: BillId) -> RepoResult<usize> {
        let removed = self.conn.execute(
            "DELETE FROM expense_entries WHERE bill_id = ?1;",
            [bill_id.to_string()],
        )?;
        Ok(removed)
    }
}

fn parse_expense_row(row: &Row<'_>) -> RepoResult<ExpenseEntry> {
    let id_text: String = row.get("id")?;
    let date_text: String = row.get("date")?;
    let bill_id = match row.get::<_, Option<String>>("bill_id")? {
        Some(value) => Some(parse_id(&value, "expense_entries.bill_id")?),
        None => None,
    };

    let entry = ExpenseEntry {
        id: parse_id(&id_text, "expense_entries.id")?,
        date: parse_date(&date_text, "expense_entries.date")?,
        name: row.get("name")?,
        value: Money::from_cents(row.get("value_cents")?),
        bill_id,
        categories: Vec::new(),
    };
    check_row(entry.validate(), "expense_entries")?;
    Ok(entry)
}
