use chrono::NaiveDate;
use clap::{Args, Subcommand, ValueEnum};
use pimpows_core::{
    BillSort, BillStatusFilter, CategoryId, CategoryKind, EntrySort, Money, Recurrence,
};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Manage expense and income categories.
    #[command(subcommand)]
    Category(CategoryCommand),
    /// Manage bills to pay.
    #[command(subcommand)]
    Bill(BillCommand),
    /// Manage received income.
    #[command(subcommand)]
    Income(IncomeCommand),
    /// Manage expenses.
    #[command(subcommand)]
    Expense(ExpenseCommand),
    /// Manage forecasted income.
    #[command(subcommand)]
    Prediction(PredictionCommand),
    /// Manage loan installments.
    #[command(subcommand)]
    Loan(LoanCommand),
    /// Monthly totals and balance.
    Summary {
        /// Month to summarize (YYYY-MM); defaults to the current month.
        #[arg(long, value_parser = parse_month)]
        month: Option<NaiveDate>,
        #[arg(long = "category")]
        categories: Vec<CategoryId>,
    },
    /// Pending, paid and overdue bills of the current month.
    Dashboard,
    /// Twelve-month series ending at the current month.
    Annual {
        #[arg(long = "category")]
        categories: Vec<CategoryId>,
    },
    /// Export or restore a JSON backup.
    #[command(subcommand)]
    Backup(BackupCommand),
    /// Print the core library version.
    Version,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub(crate) enum KindArg {
    Expense,
    Income,
}

impl From<KindArg> for CategoryKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Expense => CategoryKind::Expense,
            KindArg::Income => CategoryKind::Income,
        }
    }
}

#[derive(Subcommand, Debug)]
pub(crate) enum CategoryCommand {
    Add {
        name: String,
        #[arg(long, value_enum, default_value = "expense")]
        kind: KindArg,
        /// `#RRGGBB`; picked from the palette when omitted.
        #[arg(long)]
        color: Option<String>,
    },
    List {
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
    },
    Edit {
        id: CategoryId,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    Rm {
        id: CategoryId,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub(crate) enum RecurrenceArg {
    Single,
    Monthly,
    Custom,
}

impl From<RecurrenceArg> for Recurrence {
    fn from(value: RecurrenceArg) -> Self {
        match value {
            RecurrenceArg::Single => Recurrence::Single,
            RecurrenceArg::Monthly => Recurrence::Monthly,
            RecurrenceArg::Custom => Recurrence::Custom,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub(crate) enum BillStatusArg {
    #[default]
    All,
    Pending,
    Paid,
    Overdue,
}

impl From<BillStatusArg> for BillStatusFilter {
    fn from(value: BillStatusArg) -> Self {
        match value {
            BillStatusArg::All => BillStatusFilter::All,
            BillStatusArg::Pending => BillStatusFilter::Pending,
            BillStatusArg::Paid => BillStatusFilter::Paid,
            BillStatusArg::Overdue => BillStatusFilter::Overdue,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub(crate) enum SortArg {
    #[default]
    Date,
    Value,
}

impl From<SortArg> for BillSort {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Date => BillSort::DueDate,
            SortArg::Value => BillSort::ValueDesc,
        }
    }
}

impl From<SortArg> for EntrySort {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Date => EntrySort::DateDesc,
            SortArg::Value => EntrySort::ValueDesc,
        }
    }
}

#[derive(Subcommand, Debug)]
pub(crate) enum BillCommand {
    Add {
        name: String,
        #[arg(long)]
        due: NaiveDate,
        #[arg(long)]
        value: Option<Money>,
        #[arg(long, value_enum, default_value = "single")]
        recurrence: RecurrenceArg,
        /// Month step for custom recurrence.
        #[arg(long)]
        every: Option<u32>,
        /// Number of installments to create.
        #[arg(long)]
        installments: Option<u32>,
        #[arg(long)]
        observation: Option<String>,
        #[arg(long = "category")]
        categories: Vec<CategoryId>,
    },
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        category: Option<CategoryId>,
        #[arg(long, value_enum, default_value = "all")]
        status: BillStatusArg,
        #[arg(long, value_enum, default_value = "date")]
        sort: SortArg,
    },
    Edit {
        id: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        due: Option<NaiveDate>,
        #[arg(long)]
        value: Option<Money>,
        #[arg(long)]
        observation: Option<String>,
        /// Replaces the category set.
        #[arg(long = "category")]
        categories: Option<Vec<CategoryId>>,
    },
    Pay {
        id: Uuid,
        /// Amount paid; defaults to the bill value.
        #[arg(long)]
        value: Option<Money>,
        /// Payment day; defaults to now.
        #[arg(long)]
        on: Option<NaiveDate>,
    },
    Unpay {
        id: Uuid,
    },
    Rm {
        id: Uuid,
    },
}

#[derive(Args, Debug)]
pub(crate) struct EntryListArgs {
    #[arg(long)]
    pub from: Option<NaiveDate>,
    #[arg(long)]
    pub to: Option<NaiveDate>,
    #[arg(long = "category")]
    pub categories: Vec<CategoryId>,
    #[arg(long)]
    pub search: Option<String>,
    #[arg(long, value_enum, default_value = "date")]
    pub sort: SortArg,
}

#[derive(Subcommand, Debug)]
pub(crate) enum IncomeCommand {
    Add {
        origin: String,
        #[arg(long)]
        value: Money,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        account: Option<String>,
        #[arg(long = "category")]
        categories: Vec<CategoryId>,
    },
    List(EntryListArgs),
    Edit {
        id: Uuid,
        #[arg(long)]
        origin: Option<String>,
        #[arg(long)]
        value: Option<Money>,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        account: Option<String>,
        #[arg(long = "category")]
        categories: Option<Vec<CategoryId>>,
    },
    Rm {
        id: Uuid,
    },
}

#[derive(Subcommand, Debug)]
pub(crate) enum ExpenseCommand {
    Add {
        name: String,
        #[arg(long)]
        value: Money,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long = "category")]
        categories: Vec<CategoryId>,
    },
    List(EntryListArgs),
    Edit {
        id: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        value: Option<Money>,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long = "category")]
        categories: Option<Vec<CategoryId>>,
    },
    Rm {
        id: Uuid,
    },
}

#[derive(Subcommand, Debug)]
pub(crate) enum PredictionCommand {
    Add {
        origin: String,
        #[arg(long)]
        value: Money,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long = "category")]
        categories: Vec<CategoryId>,
    },
    List(EntryListArgs),
    Edit {
        id: Uuid,
        #[arg(long)]
        origin: Option<String>,
        #[arg(long)]
        value: Option<Money>,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long = "category")]
        categories: Option<Vec<CategoryId>>,
    },
    /// Mark the prediction as received.
    Paid {
        id: Uuid,
        #[arg(long)]
        on: Option<NaiveDate>,
        /// Clear the received mark instead.
        #[arg(long)]
        undo: bool,
    },
    Rm {
        id: Uuid,
    },
}

#[derive(Subcommand, Debug)]
pub(crate) enum LoanCommand {
    Add {
        name: String,
        #[arg(long)]
        due: NaiveDate,
        #[arg(long)]
        value: Money,
        #[arg(long)]
        observation: Option<String>,
    },
    List {
        #[arg(long)]
        search: Option<String>,
    },
    Edit {
        id: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        due: Option<NaiveDate>,
        #[arg(long)]
        value: Option<Money>,
        #[arg(long)]
        observation: Option<String>,
    },
    Pay {
        id: Uuid,
        #[arg(long)]
        on: Option<NaiveDate>,
    },
    Unpay {
        id: Uuid,
    },
    Rm {
        id: Uuid,
    },
}

#[derive(Subcommand, Debug)]
pub(crate) enum BackupCommand {
    Export {
        /// Output file; defaults to `pimpows-backup-<today>.json`.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    Restore {
        path: PathBuf,
    },
}

pub(crate) fn parse_month(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(&format!("{}-01", value.trim()), "%Y-%m-%d")
        .map_err(|_| format!("invalid month `{value}`; expected YYYY-MM"))
}
