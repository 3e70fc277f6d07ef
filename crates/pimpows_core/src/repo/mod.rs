//! Repository layer contracts and SQLite implementations.
//!
//! # Responsibility
//! - One repository per table family (categories, bills, income, expenses,
//!   predictions, loans).
//! - Keep SQL, column encodings and category-link bookkeeping out of the
//!   service layer.
//!
//! # Invariants
//! - Write paths call the record's `validate()` before any SQL mutation.
//! - Read paths reject corrupt rows with `RepoError::InvalidData`.
//! - A parent row and its category links are written in one transaction;
//!   repositories open one themselves unless the caller already has one.

use crate::db::DbError;
use crate::model::ValidationError;
use chrono::NaiveDate;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod bill_repo;
pub mod category_repo;
pub mod expense_repo;
pub mod income_repo;
pub(crate) mod links;
pub mod loan_repo;
pub mod prediction_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by every ledger table.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    NotFound(Uuid),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Inclusive date window used by dated-entry listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateWindow {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateWindow {
    pub fn between(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }
}

/// Runs `write` inside a transaction unless the caller already opened one.
pub(crate) fn in_write_scope<T>(
    conn: &Connection,
    write: impl FnOnce() -> RepoResult<T>,
) -> RepoResult<T> {
    if !conn.is_autocommit() {
        return write();
    }
    let tx = conn.unchecked_transaction()?;
    let value = write()?;
    tx.commit()?;
    Ok(value)
}

/// Re-checks a decoded row; a stored record that fails validation is corrupt.
pub(crate) fn check_row(
    checked: Result<(), ValidationError>,
    table: &'static str,
) -> RepoResult<()> {
    checked.map_err(|err| RepoError::InvalidData(format!("corrupt row in {table}: {err}")))
}

pub(crate) fn parse_id(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

pub(crate) fn parse_date(value: &str, column: &'static str) -> RepoResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| RepoError::InvalidData(format!("invalid date `{value}` in {column}")))
}

pub(crate) fn date_to_db(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub(crate) fn parse_count(value: Option<i64>, column: &'static str) -> RepoResult<Option<u32>> {
    value
        .map(|raw| {
            u32::try_from(raw).map_err(|_| {
                RepoError::InvalidData(format!("invalid counter `{raw}` in {column}"))
            })
        })
        .transpose()
}

/// Ensures a mutation touched a row; maps zero changes to `NotFound`.
pub(crate) fn expect_changed(changed: usize, id: Uuid) -> RepoResult<()> {
    if changed == 0 {
        return Err(RepoError::NotFound(id));
    }
    Ok(())
}
