//! Bill repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist bills together with their `bill_categories` links.
//! - Store payment state as written by the service layer; overdue is
//!   never persisted.
//!
//! # Invariants
//! - Listing is ordered by `due_date ASC, id ASC`.
//! - `create_bill`/`update_bill` persist the link set taken from
//!   `Bill::categories` (ids only; names/colors are read back from
//!   `categories`).

use super::links::{load_category_refs, replace_category_links, LinkTable};
use super::{
    check_row, date_to_db, expect_changed, in_write_scope, parse_count, parse_date, parse_id,
    RepoError, RepoResult,
};
use crate::model::bill::{Bill, BillId, PaymentStatus, Recurrence};
use crate::model::money::Money;
use rusqlite::{params, Connection, Row};

const BILL_SELECT_SQL: &str = "SELECT
    id,
    name,
    due_date,
    value_cents,
    paid_value_cents,
    recurrence,
    recurrence_months,
    total_installments,
    current_installment,
    observation,
    status,
    paid_at
FROM bills";

pub trait BillRepository {
    fn create_bill(&self, bill: &Bill) -> RepoResult<BillId>;
    /// Replaces every column and the category set of an existing bill.
    fn update_bill(&self, bill: &Bill) -> RepoResult<()>;
    fn get_bill(&self, id: BillId) -> RepoResult<Option<Bill>>;
    fn list_bills(&self) -> RepoResult<Vec<Bill>>;
    fn delete_bill(&self, id: BillId) -> RepoResult<()>;
}

pub struct SqliteBillRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBillRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn attach_categories(&self, mut bill: Bill) -> RepoResult<Bill> {
        bill.categories = load_category_refs(self.conn, LinkTable::Bill, &bill.id.to_string())?;
        Ok(bill)
    }
}

impl BillRepository for SqliteBillRepository<'_> {
    fn create_bill(&self, bill: &Bill) -> RepoResult<BillId> {
        bill.validate()?;
        let id = bill.id.to_string();

        in_write_scope(self.conn, || {
            self.conn.execute(
                "INSERT INTO bills (
                    id,
                    name,
                    due_date,
                    value_cents,
                    paid_value_cents,
                    recurrence,
                    recurrence_months,
                    total_installments,
                    current_installment,
                    observation,
                    status,
                    paid_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12);",
                params![
                    id,
                    bill.name.trim(),
                    date_to_db(bill.due_date),
                    bill.value.map(Money::cents),
                    bill.paid_value.map(Money::cents),
                    bill.recurrence.as_str(),
                    bill.recurrence_months,
                    bill.total_installments,
                    bill.current_installment,
                    bill.observation.as_deref(),
                    bill.status.as_str(),
                    bill.paid_at,
                ],
            )?;
            replace_category_links(
                self.conn,
                LinkTable::Bill,
                &id,
                bill.categories.iter().map(|category| &category.id),
            )
        })?;

        Ok(bill.id)
    }

    fn update_bill(&self, bill: &Bill) -> RepoResult<()> {
        bill.validate()?;
        let id = bill.id.to_string();

        in_write_scope(self.conn, || {
            let changed = self.conn.execute(
                "UPDATE bills
                 SET
                    name = ?2,
                    due_date = ?3,
                    value_cents = ?4,
                    paid_value_cents = ?5,
                    recurrence = ?6,
                    recurrence_months = ?7,
                    total_installments = ?8,
                    current_installment = ?9,
                    observation = ?10,
                    status = ?11,
                    paid_at = ?12,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1;",
                params![
                    id,
                    bill.name.trim(),
                    date_to_db(bill.due_date),
                    bill.value.map(Money::cents),
                    bill.paid_value.map(Money::cents),
                    bill.recurrence.as_str(),
                    bill.recurrence_months,
                    bill.total_installments,
                    bill.current_installment,
                    bill.observation.as_deref(),
                    bill.status.as_str(),
                    bill.paid_at,
                ],
            )?;
            expect_changed(changed, bill.id)?;
            replace_category_links(
                self.conn,
                LinkTable::Bill,
                &id,
                bill.categories.iter().map(|category| &category.id),
            )
        })
    }

    fn get_bill(&self, id: BillId) -> RepoResult<Option<Bill>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{BILL_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(self.attach_categories(parse_bill_row(row)?)?)),
            None => Ok(None),
        }
    }

    fn list_bills(&self) -> RepoResult<Vec<Bill>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{BILL_SELECT_SQL} ORDER BY due_date ASC, id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut bills = Vec::new();
        while let Some(row) = rows.next()? {
            bills.push(self.attach_categories(parse_bill_row(row)?)?);
        }
        Ok(bills)
    }

    fn delete_bill(&self, id: BillId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM bills WHERE id = ?1;", [id.to_string()])?;
        expect_changed(changed, id)
    }
}

fn parse_bill_row(row: &Row<'_>) -> RepoResult<Bill> {
    let id_text: String = row.get("id")?;
    let due_text: String = row.get("due_date")?;

    let recurrence_text: String = row.get("recurrence")?;
    let recurrence = Recurrence::parse(&recurrence_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid recurrence `{recurrence_text}` in bills.recurrence"
        ))
    })?;

    let status_text: String = row.get("status")?;
    let status = PaymentStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid status `{status_text}` in bills.status"))
    })?;

    let bill = Bill {
        id: parse_id(&id_text, "bills.id")?,
        name: row.get("name")?,
        due_date: parse_date(&due_text, "bills.due_date")?,
        value: row.get::<_, Option<i64>>("value_cents")?.map(Money::from_cents),
        paid_value: row
            .get::<_, Option<i64>>("paid_value_cents")?
            .map(Money::from_cents),
        recurrence,
        recurrence_months: parse_count(row.get("recurrence_months")?, "bills.recurrence_months")?,
        total_installments: parse_count(
            row.get("total_installments")?,
            "bills.total_installments",
        )?,
        current_installment: parse_count(
            row.get("current_installment")?,
            "bills.current_installment",
        )?,
        observation: row.get("observation")?,
        status,
        paid_at: row.get("paid_at")?,
        categories: Vec::new(),
    };
    check_row(bill.validate(), "bills")?;
    Ok(bill)
}
