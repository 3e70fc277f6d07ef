//! JSON backup export and restore.
//!
//! # Responsibility
//! - Snapshot every ledger table, link tables included, into one
//!   versioned JSON document.
//! - Replace the whole ledger with the contents of such a document.
//!
//! # Invariants
//! - Restore is all-or-nothing: one transaction wraps the wipe and the
//!   re-insert, so a bad row leaves the previous data untouched.
//! - Rows are re-inserted through the repositories, which re-validate
//!   them and write category links.

use crate::model::bill::{Bill, BillId, PaymentStatus, Recurrence};
use crate::model::category::{Category, CategoryId, CategoryKind, CategoryRef};
use crate::model::entry::{ExpenseEntry, IncomeEntry, IncomePrediction};
use crate::model::loan::Loan;
use crate::model::money::Money;
use crate::repo::bill_repo::{BillRepository, SqliteBillRepository};
use crate::repo::category_repo::{CategoryRepository, SqliteCategoryRepository};
use crate::repo::expense_repo::{ExpenseRepository, SqliteExpenseRepository};
use crate::repo::income_repo::{IncomeRepository, SqliteIncomeRepository};
use crate::repo::loan_repo::{LoanRepository, SqliteLoanRepository};
use crate::repo::prediction_repo::{PredictionRepository, SqlitePredictionRepository};
use crate::repo::{DateWindow, RepoError};
use chrono::{DateTime, NaiveDate, Utc};
use log::{error, info};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::Write;
use uuid::Uuid;

/// Format version written by this build.
pub const BACKUP_VERSION: &str = "1.0";

const SUPPORTED_MAJOR: &str = "1";

#[derive(Debug)]
pub enum BackupError {
    /// Document is not a ledger backup this build understands.
    InvalidDocument(String),
    Json(serde_json::Error),
    Io(std::io::Error),
    Repo(RepoError),
}

impl Display for BackupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDocument(details) => write!(f, "invalid backup document: {details}"),
            Self::Json(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BackupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidDocument(_) => None,
            Self::Json(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for BackupError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<std::io::Error> for BackupError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<RepoError> for BackupError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<rusqlite::Error> for BackupError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(RepoError::from(value))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupDocument {
    pub version: String,
    pub created_at: DateTime<Utc>,
    pub data: BackupData,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupData {
    pub categories: Vec<Category>,
    pub bills: Vec<BillRow>,
    pub income_entries: Vec<IncomeRow>,
    pub expense_entries: Vec<ExpenseRow>,
    pub income_predictions: Vec<PredictionRow>,
    pub loans: Vec<Loan>,
    pub bill_categories: Vec<CategoryLink>,
    pub income_categories: Vec<CategoryLink>,
    pub expense_categories: Vec<CategoryLink>,
    pub income_prediction_categories: Vec<CategoryLink>,
}

/// One row of a `*_categories` link table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryLink {
    pub owner_id: Uuid,
    pub category_id: CategoryId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillRow {
    pub id: BillId,
    pub name: String,
    pub due_date: NaiveDate,
    pub value: Option<Money>,
    pub paid_value: Option<Money>,
    pub recurrence: Recurrence,
    pub recurrence_months: Option<u32>,
    pub total_installments: Option<u32>,
    pub current_installment: Option<u32>,
    pub observation: Option<String>,
    pub status: PaymentStatus,
    pub paid_at: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeRow {
    pub id: Uuid,
    pub date: NaiveDate,
    pub origin: String,
    pub account: Option<String>,
    pub value: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseRow {
    pub id: Uuid,
    pub date: NaiveDate,
    pub name: String,
    pub value: Money,
    pub bill_id: Option<BillId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionRow {
    pub id: Uuid,
    pub date: NaiveDate,
    pub origin: String,
    pub value: Money,
    pub paid_at: Option<i64>,
}

/// Rows written per table by `restore_backup`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub categories: usize,
    pub bills: usize,
    pub income_entries: usize,
    pub expense_entries: usize,
    pub income_predictions: usize,
    pub loans: usize,
    pub category_links: usize,
}

/// Reads the whole ledger into a backup document.
pub fn export_backup(
    conn: &Connection,
    created_at: DateTime<Utc>,
) -> Result<BackupDocument, BackupError> {
    let everything = DateWindow::default();
    let categories = SqliteCategoryRepository::new(conn).list_categories(None)?;
    let bills = SqliteBillRepository::new(conn).list_bills()?;
    let income = SqliteIncomeRepository::new(conn).list_income(&everything)?;
    let expenses = SqliteExpenseRepository::new(conn).list_expenses(&everything)?;
    let predictions = SqlitePredictionRepository::new(conn).list_predictions()?;
    let loans = SqliteLoanRepository::new(conn).list_loans()?;

    let data = BackupData {
        bill_categories: links_of(bills.iter().map(|bill| (bill.id, &bill.categories))),
        income_categories: links_of(income.iter().map(|entry| (entry.id, &entry.categories))),
        expense_categories: links_of(expenses.iter().map(|entry| (entry.id, &entry.categories))),
        income_prediction_categories: links_of(
            predictions
                .iter()
                .map(|prediction| (prediction.id, &prediction.categories)),
        ),
        categories,
        bills: bills.into_iter().map(BillRow::from).collect(),
        income_entries: income.into_iter().map(IncomeRow::from).collect(),
        expense_entries: expenses.into_iter().map(ExpenseRow::from).collect(),
        income_predictions: predictions.into_iter().map(PredictionRow::from).collect(),
        loans,
    };

    info!(
        "event=backup_export module=backup status=ok categories={} bills={} income={} expenses={} predictions={} loans={}",
        data.categories.len(),
        data.bills.len(),
        data.income_entries.len(),
        data.expense_entries.len(),
        data.income_predictions.len(),
        data.loans.len()
    );
    Ok(BackupDocument {
        version: BACKUP_VERSION.to_string(),
        created_at,
        data,
    })
}

/// Writes the document as pretty-printed JSON.
pub fn write_backup_json(
    document: &BackupDocument,
    writer: impl Write,
) -> Result<(), BackupError> {
    serde_json::to_writer_pretty(writer, document)?;
    Ok(())
}

/// Suggested file name for a backup taken on `date`.
pub fn default_backup_file_name(date: NaiveDate) -> String {
    format!("pimpows-backup-{}.json", date.format("%Y-%m-%d"))
}

/// Parses backup JSON, checking the format version before the payload.
pub fn parse_backup_json(text: &str) -> Result<BackupDocument, BackupError> {
    let raw: serde_json::Value = serde_json::from_str(text)?;
    let version = raw
        .get("version")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| BackupError::InvalidDocument("missing `version`".to_string()))?;
    let major = version.split('.').next().unwrap_or_default();
    if major != SUPPORTED_MAJOR {
        return Err(BackupError::InvalidDocument(format!(
            "unsupported version `{version}`"
        )));
    }
    if raw.get("data").is_none() {
        return Err(BackupError::InvalidDocument("missing `data`".to_string()));
    }
    Ok(serde_json::from_value(raw)?)
}

/// Replaces every ledger row with the document's contents.
pub fn restore_backup(
    conn: &Connection,
    document: &BackupDocument,
) -> Result<RestoreReport, BackupError> {
    let tx = conn.unchecked_transaction()?;
    match restore_rows(&tx, &document.data) {
        Ok(report) => {
            tx.commit()?;
            info!(
                "event=backup_restore module=backup status=ok categories={} bills={} links={}",
                report.categories, report.bills, report.category_links
            );
            Ok(report)
        }
        Err(err) => {
            error!("event=backup_restore module=backup status=error error={err}");
            Err(err)
        }
    }
}

fn restore_rows(conn: &Connection, data: &BackupData) -> Result<RestoreReport, BackupError> {
    conn.execute_batch(
        "DELETE FROM bill_categories;
         DELETE FROM income_categories;
         DELETE FROM expense_categories;
         DELETE FROM income_prediction_categories;
         DELETE FROM expense_entries;
         DELETE FROM income_entries;
         DELETE FROM income_predictions;
         DELETE FROM bills;
         DELETE FROM loans;
         DELETE FROM categories;",
    )?;

    let category_repo = SqliteCategoryRepository::new(conn);
    for category in &data.categories {
        category_repo.create_category(category)?;
    }
    let categories: HashMap<CategoryId, &Category> = data
        .categories
        .iter()
        .map(|category| (category.id, category))
        .collect();

    let mut report = RestoreReport {
        categories: data.categories.len(),
        ..RestoreReport::default()
    };

    let bill_links = group_links(
        LinkSet {
            table: "bill_categories",
            links: &data.bill_categories,
            owners: data.bills.iter().map(|row| row.id).collect(),
            kind: CategoryKind::Expense,
        },
        &categories,
    )?;
    let bill_repo = SqliteBillRepository::new(conn);
    for row in &data.bills {
        let mut bill = Bill::from(row.clone());
        bill.categories = bill_links.get(&row.id).cloned().unwrap_or_default();
        report.category_links += bill.categories.len();
        bill_repo.create_bill(&bill)?;
    }
    report.bills = data.bills.len();

    let income_links = group_links(
        LinkSet {
            table: "income_categories",
            links: &data.income_categories,
            owners: data.income_entries.iter().map(|row| row.id).collect(),
            kind: CategoryKind::Income,
        },
        &categories,
    )?;
    let income_repo = SqliteIncomeRepository::new(conn);
    for row in &data.income_entries {
        let mut entry = IncomeEntry::from(row.clone());
        entry.categories = income_links.get(&row.id).cloned().unwrap_or_default();
        report.category_links += entry.categories.len();
        income_repo.create_income(&entry)?;
    }
    report.income_entries = data.income_entries.len();

    let expense_links = group_links(
        LinkSet {
            table: "expense_categories",
            links: &data.expense_categories,
            owners: data.expense_entries.iter().map(|row| row.id).collect(),
            kind: CategoryKind::Expense,
        },
        &categories,
    )?;
    let expense_repo = SqliteExpenseRepository::new(conn);
    for row in &data.expense_entries {
        let mut entry = ExpenseEntry::from(row.clone());
        entry.categories = expense_links.get(&row.id).cloned().unwrap_or_default();
        report.category_links += entry.categories.len();
        expense_repo.create_expense(&entry)?;
    }
    report.expense_entries = data.expense_entries.len();

    let prediction_links = group_links(
        LinkSet {
            table: "income_prediction_categories",
            links: &data.income_prediction_categories,
            owners: data.income_predictions.iter().map(|row| row.id).collect(),
            kind: CategoryKind::Income,
        },
        &categories,
    )?;
    let prediction_repo = SqlitePredictionRepository::new(conn);
    for row in &data.income_predictions {
        let mut prediction = IncomePrediction::from(row.clone());
        prediction.categories = prediction_links.get(&row.id).cloned().unwrap_or_default();
        report.category_links += prediction.categories.len();
        prediction_repo.create_prediction(&prediction)?;
    }
    report.income_predictions = data.income_predictions.len();

    let loan_repo = SqliteLoanRepository::new(conn);
    for loan in &data.loans {
        loan_repo.create_loan(loan)?;
    }
    report.loans = data.loans.len();

    Ok(report)
}

fn links_of<'a>(
    owners: impl Iterator<Item = (Uuid, &'a Vec<CategoryRef>)>,
) -> Vec<CategoryLink> {
    owners
        .flat_map(|(owner_id, categories)| {
            categories.iter().map(move |category| CategoryLink {
                owner_id,
                category_id: category.id,
            })
        })
        .collect()
}

/// One link table from the document plus what its rows must point at.
struct LinkSet<'a> {
    table: &'static str,
    links: &'a [CategoryLink],
    owners: HashSet<Uuid>,
    kind: CategoryKind,
}

/// Groups links by owner; every link must name a restored owner and a
/// category of the table's kind.
fn group_links(
    set: LinkSet<'_>,
    categories: &HashMap<CategoryId, &Category>,
) -> Result<HashMap<Uuid, Vec<CategoryRef>>, BackupError> {
    let mut grouped: HashMap<Uuid, Vec<CategoryRef>> = HashMap::new();
    for link in set.links {
        if !set.owners.contains(&link.owner_id) {
            return Err(BackupError::InvalidDocument(format!(
                "{} link references unknown record {}",
                set.table, link.owner_id
            )));
        }
        let category = categories.get(&link.category_id).ok_or_else(|| {
            BackupError::InvalidDocument(format!(
                "{} link references unknown category {}",
                set.table, link.category_id
            ))
        })?;
        if category.kind != set.kind {
            return Err(BackupError::InvalidDocument(format!(
                "{} link points at {} category {}; expected {}",
                set.table,
                category.kind.as_str(),
                category.id,
                set.kind.as_str()
            )));
        }
        grouped
            .entry(link.owner_id)
            .or_default()
            .push(category.to_ref());
    }
    Ok(grouped)
}

impl From<Bill> for BillRow {
    fn from(bill: Bill) -> Self {
        Self {
            id: bill.id,
            name: bill.name,
            due_date: bill.due_date,
            value: bill.value,
            paid_value: bill.paid_value,
            recurrence: bill.recurrence,
            recurrence_months: bill.recurrence_months,
            total_installments: bill.total_installments,
            current_installment: bill.current_installment,
            observation: bill.observation,
            status: bill.status,
            paid_at: bill.paid_at,
        }
    }
}

impl From<BillRow> for Bill {
    fn from(row: BillRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            due_date: row.due_date,
            value: row.value,
            paid_value: row.paid_value,
            recurrence: row.recurrence,
            recurrence_months: row.recurrence_months,
            total_installments: row.total_installments,
            current_installment: row.current_installment,
            observation: row.observation,
            status: row.status,
            paid_at: row.paid_at,
            categories: Vec::new(),
        }
    }
}

impl From<IncomeEntry> for IncomeRow {
    fn from(entry: IncomeEntry) -> Self {
        Self {
            id: entry.id,
            date: entry.date,
            origin: entry.origin,
            account: entry.account,
            value: entry.value,
        }
    }
}

impl From<IncomeRow> for IncomeEntry {
    fn from(row: IncomeRow) -> Self {
        Self {
            id: row.id,
            date: row.date,
            origin: row.origin,
            account: row.account,
            value: row.value,
            categories: Vec::new(),
        }
    }
}

impl From<ExpenseEntry> for ExpenseRow {
    fn from(entry: ExpenseEntry) -> Self {
        Self {
            id: entry.id,
            date: entry.date,
            name: entry.name,
            value: entry.value,
            bill_id: entry.bill_id,
        }
    }
}

impl From<ExpenseRow> for ExpenseEntry {
    fn from(row: ExpenseRow) -> Self {
        Self {
            id: row.id,
            date: row.date,
            name: row.name,
            value: row.value,
            bill_id: row.bill_id,
            categories: Vec::new(),
        }
    }
}

impl From<IncomePrediction> for PredictionRow {
    fn from(prediction: IncomePrediction) -> Self {
        Self {
            id: prediction.id,
            date: prediction.date,
            origin: prediction.origin,
            value: prediction.value,
            paid_at: prediction.paid_at,
        }
    }
}

impl From<PredictionRow> for IncomePrediction {
    fn from(row: PredictionRow) -> Self {
        Self {
            id: row.id,
            date: row.date,
            origin: row.origin,
            value: row.value,
            paid_at: row.paid_at,
            categories: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{default_backup_file_name, parse_backup_json, BackupError};
    use chrono::NaiveDate;

    #[test]
    fn file_name_uses_iso_date() {
        let date = NaiveDate::from_ymd_opt(2024, 7, 3).unwrap();
        assert_eq!(default_backup_file_name(date), "pimpows-backup-2024-07-03.json");
    }

    #[test]
    fn parse_rejects_missing_or_future_version() {
        let missing = parse_backup_json(r#"{"data": {}}"#);
        assert!(matches!(missing, Err(BackupError::InvalidDocument(_))));

        let future = parse_backup_json(
            r#"{"version": "2.0", "created_at": "2024-01-01T00:00:00Z", "data": {}}"#,
        );
        assert!(matches!(future, Err(BackupError::InvalidDocument(_))));
    }

    #[test]
    fn parse_accepts_minor_revisions_and_missing_tables() {
        let document = parse_backup_json(
            r#"{"version": "1.3", "created_at": "2024-01-01T00:00:00Z", "data": {"loans": []}}"#,
        )
        .unwrap();
        assert_eq!(document.version, "1.3");
        assert!(document.data.categories.is_empty());
    }
}
