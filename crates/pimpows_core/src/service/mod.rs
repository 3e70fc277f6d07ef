//! Ledger use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into user-level operations (create a
//!   bill with installments, pay a bill, mark a prediction as received...).
//! - Enforce cross-record rules the repositories cannot see: category
//!   kinds, payment transitions, installment expansion.
//!
//! # Invariants
//! - Every operation touching more than one row runs in one transaction.
//! - Bills and expenses accept expense categories only; income entries and
//!   predictions accept income categories only.

use crate::model::category::{CategoryId, CategoryKind, CategoryRef};
use crate::model::ValidationError;
use crate::repo::category_repo::{CategoryRepository, SqliteCategoryRepository};
use crate::repo::RepoError;
use rusqlite::Connection;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod bill_service;
pub mod category_service;
pub mod expense_service;
pub mod income_service;
pub mod loan_service;
pub mod prediction_service;

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Service error for ledger use-cases.
#[derive(Debug)]
pub enum LedgerError {
    /// Input record failed validation.
    Validation(ValidationError),
    /// Target record does not exist.
    NotFound(Uuid),
    /// Referenced category does not exist.
    CategoryNotFound(CategoryId),
    /// Referenced category has the wrong kind for this record.
    CategoryKindMismatch {
        id: CategoryId,
        expected: CategoryKind,
        actual: CategoryKind,
    },
    /// Record is already paid.
    AlreadyPaid(Uuid),
    /// Record is not paid, so it cannot be reverted.
    NotPaid(Uuid),
    /// Installment count is zero or above the supported maximum.
    InstallmentCount { requested: u32, max: u32 },
    /// Timestamp cannot be mapped to a calendar day.
    InvalidTimestamp(i64),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for LedgerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::CategoryNotFound(id) => write!(f, "category not found: {id}"),
            Self::CategoryKindMismatch {
                id,
                expected,
                actual,
            } => write!(
                f,
                "category {id} is an {} category; expected {}",
                actual.as_str(),
                expected.as_str()
            ),
            Self::AlreadyPaid(id) => write!(f, "record already paid: {id}"),
            Self::NotPaid(id) => write!(f, "record is not paid: {id}"),
            Self::InstallmentCount { requested, max } => write!(
                f,
                "installment count {requested} is outside the supported range 1..={max}"
            ),
            Self::InvalidTimestamp(value) => write!(f, "invalid timestamp: {value}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LedgerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for LedgerError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<ValidationError> for LedgerError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<rusqlite::Error> for LedgerError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(RepoError::from(value))
    }
}

/// Sort order for dated entry listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EntrySort {
    /// Newest first.
    #[default]
    DateDesc,
    /// Largest amount first.
    ValueDesc,
}

/// Case-insensitive substring match; an empty needle matches everything.
pub(crate) fn matches_search(haystack: &str, needle: Option<&str>) -> bool {
    match needle.map(str::trim) {
        None | Some("") => true,
        Some(needle) => haystack.to_lowercase().contains(&needle.to_lowercase()),
    }
}

/// Optional free text: trimmed, with blank input stored as `None`.
pub(crate) fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// Loads category tags for `ids`, checking existence and kind.
///
/// Duplicate ids collapse; output keeps the first-seen order.
pub(crate) fn resolve_categories(
    conn: &Connection,
    ids: &[CategoryId],
    expected: CategoryKind,
) -> LedgerResult<Vec<CategoryRef>> {
    let repo = SqliteCategoryRepository::new(conn);
    let mut seen = HashSet::new();
    let mut refs = Vec::with_capacity(ids.len());
    for id in ids {
        if !seen.insert(*id) {
            continue;
        }
        let category = repo
            .get_category(*id)?
            .ok_or(LedgerError::CategoryNotFound(*id))?;
        if category.kind != expected {
            return Err(LedgerError::CategoryKindMismatch {
                id: *id,
                expected,
                actual: category.kind,
            });
        }
        refs.push(category.to_ref());
    }
    Ok(refs)
}

#[cfg(test)]
mod tests {
    use super::{matches_search, trimmed};

    #[test]
    fn search_is_case_insensitive_and_blank_matches_all() {
        assert!(matches_search("Conta de Luz", Some("luz")));
        assert!(matches_search("Conta de Luz", Some("  ")));
        assert!(matches_search("Conta de Luz", None));
        assert!(!matches_search("Conta de Luz", Some("agua")));
    }

    #[test]
    fn optional_text_is_trimmed_and_blank_becomes_none() {
        assert_eq!(trimmed(Some("  Banco A ")), Some("Banco A".to_string()));
        assert_eq!(trimmed(Some("   ")), None);
        assert_eq!(trimmed(None), None);
    }
}
