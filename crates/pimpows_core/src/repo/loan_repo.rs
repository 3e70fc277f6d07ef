//! Loan repository contract and SQLite implementation.
//!
//! Loans carry no categories; listing is ordered by `due_date ASC, id ASC`.

use super::{
    check_row, date_to_db, expect_changed, parse_date, parse_id, RepoError, RepoResult,
};
use crate::model::bill::PaymentStatus;
use crate::model::loan::{Loan, LoanId};
use crate::model::money::Money;
use rusqlite::{params, Connection, Row};

const LOAN_SELECT_SQL: &str = "SELECT
    id,
    name,
    due_date,
    installment_value_cents,
    observation,
    status,
    paid_at
FROM loans";

pub trait LoanRepository {
    fn create_loan(&self, loan: &Loan) -> RepoResult<LoanId>;
    fn update_loan(&self, loan: &Loan) -> RepoResult<()>;
    fn get_loan(&self, id: LoanId) -> RepoResult<Option<Loan>>;
    fn list_loans(&self) -> RepoResult<Vec<Loan>>;
    fn delete_loan(&self, id: LoanId) -> RepoResult<()>;
}

pub struct SqliteLoanRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLoanRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl LoanRepository for SqliteLoanRepository<'_> {
    fn create_loan(&self, loan: &Loan) -> RepoResult<LoanId> {
        loan.validate()?;
        self.conn.execute(
            "INSERT INTO loans (
                id,
                name,
                due_date,
                installment_value_cents,
                observation,
                status,
                paid_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                loan.id.to_string(),
                loan.name.trim(),
                date_to_db(loan.due_date),
                loan.installment_value.cents(),
                loan.observation.as_deref(),
                loan.status.as_str(),
                loan.paid_at,
            ],
        )?;
        Ok(loan.id)
    }

    fn update_loan(&self, loan: &Loan) -> RepoResult<()> {
        loan.validate()?;
        let changed = self.conn.execute(
            "UPDATE loans
             SET
                name = ?2,
                due_date = ?3,
                installment_value_cents = ?4,
                observation = ?5,
                status = ?6,
                paid_at = ?7,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![
                loan.id.to_string(),
                loan.name.trim(),
                date_to_db(loan.due_date),
                loan.installment_value.cents(),
                loan.observation.as_deref(),
                loan.status.as_str(),
                loan.paid_at,
            ],
        )?;
        expect_changed(changed, loan.id)
    }

    fn get_loan(&self, id: LoanId) -> RepoResult<Option<Loan>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{LOAN_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_loan_row(row)?)),
            None => Ok(None),
        }
    }

    fn list_loans(&self) -> RepoResult<Vec<Loan>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{LOAN_SELECT_SQL} ORDER BY due_date ASC, id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut loans = Vec::new();
        while let Some(row) = rows.next()? {
            loans.push(parse_loan_row(row)?);
        }
        Ok(loans)
    }

    fn delete_loan(&self, id: LoanId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM loans WHERE id = ?1;", [id.to_string()])?;
        expect_changed(changed, id)
    }
}

fn parse_loan_row(row: &Row<'_>) -> RepoResult<Loan> {
    let id_text: String = row.get("id")?;
    let due_text: String = row.get("due_date")?;
    let status_text: String = row.get("status")?;
    let status = PaymentStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid status `{status_text}` in loans.status"))
    })?;

    let loan = Loan {
        id: parse_id(&id_text, "loans.id")?,
        name: row.get("name")?,
        due_date: parse_date(&due_text, "loans.due_date")?,
        installment_value: Money::from_cents(row.get("installment_value_cents")?),
        observation: row.get("observation")?,
        status,
        paid_at: row.get("paid_at")?,
    };
    check_row(loan.validate(), "loans")?;
    Ok(loan)
}
