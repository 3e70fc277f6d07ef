//! Month-level aggregation over ledger records.
//!
//! # Responsibility
//! - Compute the monthly summary block, the dashboard bill groups and the
//!   twelve-month annual series.
//!
//! # Invariants
//! - Pure functions over borrowed slices; no I/O and no clock access.
//!   Callers pass the reference day.
//! - Month ranges include both the first and the last day.
//! - An empty category filter keeps every record.

use crate::model::bill::Bill;
use crate::model::category::{Categorized, CategoryId};
use crate::model::entry::{ExpenseEntry, IncomeEntry};
use crate::model::money::Money;
use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;
use std::collections::HashSet;

const MONTH_LABELS_PT_BR: [&str; 12] = [
    "jan", "fev", "mar", "abr", "mai", "jun", "jul", "ago", "set", "out", "nov", "dez",
];

/// Inclusive calendar-month range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthRange {
    pub first: NaiveDate,
    pub last: NaiveDate,
}

impl MonthRange {
    /// Month that contains `date`.
    pub fn containing(date: NaiveDate) -> Self {
        let first = date.with_day(1).unwrap_or(date);
        let last = first
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(first);
        Self { first, last }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.first <= date && date <= self.last
    }

    /// Month `count` months before this one.
    pub fn months_before(&self, count: u32) -> Option<Self> {
        self.first
            .checked_sub_months(Months::new(count))
            .map(Self::containing)
    }

    /// Short label such as `mar/24`.
    pub fn label(&self) -> String {
        let month = MONTH_LABELS_PT_BR[self.first.month0() as usize];
        format!("{month}/{:02}", self.first.year().rem_euclid(100))
    }
}

/// Amount plus number of records that made it up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub total: Money,
    pub count: usize,
}

impl Tally {
    fn add(&mut self, amount: Money) {
        self.total += amount;
        self.count += 1;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlySummary {
    pub month: MonthRange,
    pub income: Tally,
    pub expenses: Tally,
    /// Pending bills due within the month.
    pub bills_to_pay: Tally,
    /// Bills whose payment date falls within the month, by paid value.
    pub bills_paid: Tally,
    /// Every pending bill regardless of due date.
    pub all_pending: Tally,
    /// Income minus expenses.
    pub balance: Money,
}

/// Computes the summary block for `month`.
pub fn monthly_summary(
    bills: &[Bill],
    income: &[IncomeEntry],
    expenses: &[ExpenseEntry],
    month: MonthRange,
    filter: &HashSet<CategoryId>,
) -> MonthlySummary {
    let mut summary = MonthlySummary {
        month,
        income: Tally::default(),
        expenses: Tally::default(),
        bills_to_pay: Tally::default(),
        bills_paid: Tally::default(),
        all_pending: Tally::default(),
        balance: Money::ZERO,
    };

    for entry in income
        .iter()
        .filter(|entry| entry.matches_any(filter) && month.contains(entry.date))
    {
        summary.income.add(entry.value);
    }
    for entry in expenses
        .iter()
        .filter(|entry| entry.matches_any(filter) && month.contains(entry.date))
    {
        summary.expenses.add(entry.value);
    }
    for bill in bills.iter().filter(|bill| bill.matches_any(filter)) {
        if bill.is_pending() {
            let value = bill_value(bill);
            summary.all_pending.add(value);
            if month.contains(bill.due_date) {
                summary.bills_to_pay.add(value);
            }
        } else if bill.paid_on().is_some_and(|day| month.contains(day)) {
            summary.bills_paid.add(paid_value(bill));
        }
    }

    summary.balance = summary.income.total - summary.expenses.total;
    summary
}

/// Bill groups shown on the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardBills {
    /// Pending bills due this month, late ones included.
    pub pending: Vec<Bill>,
    /// Bills paid this month.
    pub paid: Vec<Bill>,
    /// Pending bills due before today.
    pub overdue: Vec<Bill>,
}

/// Splits bills into the dashboard groups relative to `today`.
///
/// A late bill due this month appears in both `pending` and `overdue`,
/// matching `MonthlySummary::bills_to_pay`.
pub fn dashboard_bill_groups(bills: &[Bill], today: NaiveDate) -> DashboardBills {
    let month = MonthRange::containing(today);
    let mut groups = DashboardBills::default();
    for bill in bills {
        if bill.is_pending() {
            if month.contains(bill.due_date) {
                groups.pending.push(bill.clone());
            }
            if bill.is_overdue(today) {
                groups.overdue.push(bill.clone());
            }
        } else if bill.paid_on().is_some_and(|day| month.contains(day)) {
            groups.paid.push(bill.clone());
        }
    }
    for group in [&mut groups.pending, &mut groups.paid, &mut groups.overdue] {
        group.sort_by_key(|bill| (bill.due_date, bill.id));
    }
    groups
}

/// One month of the annual chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthPoint {
    pub month: MonthRange,
    pub label: String,
    pub bills_to_pay: Money,
    pub bills_paid: Money,
    pub income: Money,
    pub expenses: Money,
    /// Pending bills due before this month started.
    pub overdue: Money,
}

/// Twelve points ending at the month of `end_month`, oldest first.
pub fn annual_series(
    bills: &[Bill],
    income: &[IncomeEntry],
    expenses: &[ExpenseEntry],
    end_month: NaiveDate,
    filter: &HashSet<CategoryId>,
) -> Vec<MonthPoint> {
    let last = MonthRange::containing(end_month);
    (0..12u32)
        .rev()
        .filter_map(|offset| last.months_before(offset))
        .map(|month| month_point(bills, income, expenses, month, filter))
        .collect()
}

fn month_point(
    bills: &[Bill],
    income: &[IncomeEntry],
    expenses: &[ExpenseEntry],
    month: MonthRange,
    filter: &HashSet<CategoryId>,
) -> MonthPoint {
    let bills: Vec<&Bill> = bills.iter().filter(|bill| bill.matches_any(filter)).collect();

    MonthPoint {
        month,
        label: month.label(),
        bills_to_pay: bills
            .iter()
            .filter(|bill| bill.is_pending() && month.contains(bill.due_date))
            .map(|bill| bill_value(bill))
            .sum(),
        bills_paid: bills
            .iter()
            .filter(|bill| bill.paid_on().is_some_and(|day| month.contains(day)))
            .map(|bill| paid_value(bill))
            .sum(),
        income: income
            .iter()
            .filter(|entry| entry.matches_any(filter) && month.contains(entry.date))
            .map(|entry| entry.value)
            .sum(),
        expenses: expenses
            .iter()
            .filter(|entry| entry.matches_any(filter) && month.contains(entry.date))
            .map(|entry| entry.value)
            .sum(),
        overdue: bills
            .iter()
            .filter(|bill| bill.is_overdue(month.first))
            .map(|bill| bill_value(bill))
            .sum(),
    }
}

fn bill_value(bill: &Bill) -> Money {
    bill.value.unwrap_or(Money::ZERO)
}

/// Paid amount, falling back to the expected value for old records.
fn paid_value(bill: &Bill) -> Money {
    bill.paid_value.or(bill.value).unwrap_or(Money::ZERO)
}
