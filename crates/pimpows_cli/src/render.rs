//! Plain-text output for CLI commands.

use chrono::NaiveDate;
use pimpows_core::{
    Bill, BillStatus, Category, CategoryRef, DashboardBills, ExpenseEntry, IncomeEntry,
    IncomePrediction, Loan, LoanBoard, Money, MonthPoint, MonthlySummary, PredictionBoard,
};

fn tags(categories: &[CategoryRef]) -> String {
    if categories.is_empty() {
        return String::new();
    }
    let names: Vec<&str> = categories.iter().map(|category| category.name.as_str()).collect();
    format!(" [{}]", names.join(", "))
}

fn status_label(status: BillStatus) -> &'static str {
    match status {
        BillStatus::Pending => "pending",
        BillStatus::Paid => "paid",
        BillStatus::Overdue => "overdue",
    }
}

pub(crate) fn category(category: &Category) {
    println!(
        "{}  {:<7} {}  {}",
        category.id,
        category.kind.as_str(),
        category.color,
        category.name
    );
}

pub(crate) fn bill(bill: &Bill, today: NaiveDate) {
    let value = bill
        .value
        .map_or_else(|| "-".to_string(), Money::format_brl);
    let installment = match (bill.current_installment, bill.total_installments) {
        (Some(current), Some(total)) => format!(" ({current}/{total})"),
        _ => String::new(),
    };
    println!(
        "{}  {}  {:<8} {:>14}  {}{}{}",
        bill.id,
        bill.due_date,
        status_label(bill.effective_status(today)),
        value,
        bill.name,
        installment,
        tags(&bill.categories)
    );
}

pub(crate) fn income(entry: &IncomeEntry) {
    let account = entry
        .account
        .as_deref()
        .map(|account| format!(" @ {account}"))
        .unwrap_or_default();
    println!(
        "{}  {}  {:>14}  {}{}{}",
        entry.id,
        entry.date,
        entry.value.format_brl(),
        entry.origin,
        account,
        tags(&entry.categories)
    );
}

pub(crate) fn expense(entry: &ExpenseEntry) {
    let from_bill = if entry.bill_id.is_some() { " (bill)" } else { "" };
    println!(
        "{}  {}  {:>14}  {}{}{}",
        entry.id,
        entry.date,
        entry.value.format_brl(),
        entry.name,
        from_bill,
        tags(&entry.categories)
    );
}

pub(crate) fn prediction(prediction: &IncomePrediction) {
    let received = prediction
        .paid_on()
        .map(|day| format!(" received {day}"))
        .unwrap_or_default();
    println!(
        "{}  {}  {:>14}  {}{}{}",
        prediction.id,
        prediction.date,
        prediction.value.format_brl(),
        prediction.origin,
        received,
        tags(&prediction.categories)
    );
}

pub(crate) fn prediction_board(board: &PredictionBoard) {
    println!("pending ({})", board.pending_total().format_brl());
    for item in &board.pending {
        prediction(item);
    }
    println!("received ({})", board.received_total().format_brl());
    for item in &board.received {
        prediction(item);
    }
}

pub(crate) fn loan(loan: &Loan) {
    println!(
        "{}  {}  {:<7} {:>14}  {}",
        loan.id,
        loan.due_date,
        loan.status.as_str(),
        loan.installment_value.format_brl(),
        loan.name
    );
}

pub(crate) fn loan_board(board: &LoanBoard) {
    println!("pending ({})", board.pending_total().format_brl());
    for item in &board.pending {
        loan(item);
    }
    println!("paid");
    for item in &board.paid {
        loan(item);
    }
}

pub(crate) fn total(amount: Money) {
    println!("total {}", amount.format_brl());
}

pub(crate) fn summary(summary: &MonthlySummary) {
    println!("month        {}", summary.month.label());
    println!(
        "income       {} ({})",
        summary.income.total.format_brl(),
        summary.income.count
    );
    println!(
        "expenses     {} ({})",
        summary.expenses.total.format_brl(),
        summary.expenses.count
    );
    println!(
        "bills to pay {} ({})",
        summary.bills_to_pay.total.format_brl(),
        summary.bills_to_pay.count
    );
    println!(
        "bills paid   {} ({})",
        summary.bills_paid.total.format_brl(),
        summary.bills_paid.count
    );
    println!(
        "all pending  {} ({})",
        summary.all_pending.total.format_brl(),
        summary.all_pending.count
    );
    println!("balance      {}", summary.balance.format_brl());
}

pub(crate) fn dashboard(groups: &DashboardBills, today: NaiveDate) {
    for (title, bills) in [
        ("overdue", &groups.overdue),
        ("pending this month", &groups.pending),
        ("paid this month", &groups.paid),
    ] {
        println!("{title} ({})", bills.len());
        for item in bills {
            bill(item, today);
        }
    }
}

pub(crate) fn annual(points: &[MonthPoint]) {
    println!(
        "{:<7} {:>14} {:>14} {:>14} {:>14} {:>14}",
        "month", "to pay", "paid", "income", "expenses", "overdue"
    );
    for point in points {
        println!(
            "{:<7} {:>14} {:>14} {:>14} {:>14} {:>14}",
            point.label,
            point.bills_to_pay.format_brl(),
            point.bills_paid.format_brl(),
            point.income.format_brl(),
            point.expenses.format_brl(),
            point.overdue.format_brl()
        );
    }
}
