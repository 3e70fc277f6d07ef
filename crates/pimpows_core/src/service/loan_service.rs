//! Loan use-case service.

use super::{matches_search, trimmed, LedgerError, LedgerResult};
use crate::model::bill::PaymentStatus;
use crate::model::loan::{Loan, LoanId};
use crate::model::money::Money;
use crate::repo::loan_repo::{LoanRepository, SqliteLoanRepository};
use chrono::NaiveDate;
use log::info;
use rusqlite::Connection;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLoan {
    pub name: String,
    pub due_date: NaiveDate,
    pub installment_value: Money,
    pub observation: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoanPatch {
    pub name: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub installment_value: Option<Money>,
    pub observation: Option<Option<String>>,
}

/// Loans split by payment state, each ordered by due date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoanBoard {
    pub pending: Vec<Loan>,
    pub paid: Vec<Loan>,
}

impl LoanBoard {
    pub fn pending_total(&self) -> Money {
        self.pending.iter().map(|loan| loan.installment_value).sum()
    }
}

pub struct LoanService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> LoanService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn repo(&self) -> SqliteLoanRepository<'conn> {
        SqliteLoanRepository::new(self.conn)
    }

    pub fn create_loan(&self, request: &NewLoan) -> LedgerResult<Loan> {
        let mut loan = Loan::new(
            request.name.trim(),
            request.due_date,
            request.installment_value,
        );
        loan.observation = trimmed(request.observation.as_deref());
        self.repo().create_loan(&loan)?;
        info!("event=loan_create module=service status=ok");
        Ok(loan)
    }

    pub fn update_loan(&self, id: LoanId, patch: &LoanPatch) -> LedgerResult<Loan> {
        let repo = self.repo();
        let mut loan = repo.get_loan(id)?.ok_or(LedgerError::NotFound(id))?;
        if let Some(name) = &patch.name {
            loan.name = name.trim().to_string();
        }
        if let Some(due_date) = patch.due_date {
            loan.due_date = due_date;
        }
        if let Some(value) = patch.installment_value {
            loan.installment_value = value;
        }
        if let Some(observation) = &patch.observation {
            loan.observation = trimmed(observation.as_deref());
        }
        repo.update_loan(&loan)?;
        Ok(loan)
    }

    pub fn pay_loan(&self, id: LoanId, paid_at_ms: i64) -> LedgerResult<Loan> {
        let repo = self.repo();
        let mut loan = repo.get_loan(id)?.ok_or(LedgerError::NotFound(id))?;
        if loan.is_paid() {
            return Err(LedgerError::AlreadyPaid(id));
        }
        loan.status = PaymentStatus::Paid;
        loan.paid_at = Some(paid_at_ms);
        repo.update_loan(&loan)?;
        info!("event=loan_pay module=service status=ok");
        Ok(loan)
    }

    pub fn unpay_loan(&self, id: LoanId) -> LedgerResult<Loan> {
        let repo = self.repo();
        let mut loan = repo.get_loan(id)?.ok_or(LedgerError::NotFound(id))?;
        if !loan.is_paid() {
            return Err(LedgerError::NotPaid(id));
        }
        loan.status = PaymentStatus::Pending;
        loan.paid_at = None;
        repo.update_loan(&loan)?;
        info!("event=loan_unpay module=service status=ok");
        Ok(loan)
    }

    pub fn get_loan(&self, id: LoanId) -> LedgerResult<Option<Loan>> {
        Ok(self.repo().get_loan(id)?)
    }

    pub fn delete_loan(&self, id: LoanId) -> LedgerResult<()> {
        self.repo().delete_loan(id)?;
        info!("event=loan_delete module=service status=ok");
        Ok(())
    }

    /// Loans matching `search` (by name), split by payment state.
    pub fn loan_board(&self, search: Option<&str>) -> LedgerResult<LoanBoard> {
        let (paid, pending): (Vec<_>, Vec<_>) = self
            .repo()
            .list_loans()?
            .into_iter()
            .filter(|loan| matches_search(&loan.name, search))
            .partition(Loan::is_paid);
        Ok(LoanBoard { pending, paid })
    }
}
