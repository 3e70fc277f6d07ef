//! Core domain logic for the Pimpows personal-finance ledger.
//! This crate is the single source of truth for ledger invariants.

pub mod backup;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod summary;

pub use backup::{
    default_backup_file_name, export_backup, parse_backup_json, restore_backup,
    write_backup_json, BackupDocument, BackupError, RestoreReport,
};
pub use db::{now_epoch_ms, open_db, open_db_in_memory, DbError};
pub use logging::{default_log_level, init_logging, logging_status, LogLevel};
pub use model::bill::{Bill, BillId, BillStatus, PaymentStatus, Recurrence};
pub use model::category::{Category, CategoryId, CategoryKind, CategoryRef};
pub use model::entry::{ExpenseEntry, IncomeEntry, IncomePrediction};
pub use model::loan::Loan;
pub use model::money::Money;
pub use model::ValidationError;
pub use repo::{DateWindow, RepoError, RepoResult};
pub use rusqlite::Connection;
pub use service::bill_service::{
    BillListQuery, BillPatch, BillPayment, BillService, BillSort, BillStatusFilter, NewBill,
};
pub use service::category_service::CategoryService;
pub use service::expense_service::{ExpensePatch, ExpenseService, NewExpense};
pub use service::income_service::{EntryListQuery, IncomePatch, IncomeService, NewIncome};
pub use service::loan_service::{LoanBoard, LoanPatch, LoanService, NewLoan};
pub use service::prediction_service::{
    NewPrediction, PredictionBoard, PredictionPatch, PredictionService,
};
pub use service::{EntrySort, LedgerError, LedgerResult};
pub use summary::{
    annual_series, dashboard_bill_groups, monthly_summary, DashboardBills, MonthPoint,
    MonthRange, MonthlySummary,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
