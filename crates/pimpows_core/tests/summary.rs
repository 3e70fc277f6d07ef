use chrono::NaiveDate;
use pimpows_core::model::category::CategoryRef;
use pimpows_core::{
    annual_series, dashboard_bill_groups, monthly_summary, Bill, ExpenseEntry, IncomeEntry,
    Money, MonthRange, PaymentStatus,
};
use std::collections::HashSet;
use uuid::Uuid;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn noon_ms(date: NaiveDate) -> i64 {
    date.and_hms_opt(12, 0, 0)
        .unwrap()
        .and_utc()
        .timestamp_millis()
}

fn pending_bill(name: &str, due: NaiveDate, reais: Option<i64>) -> Bill {
    let mut bill = Bill::new(name, due);
    bill.value = reais.map(|value| Money::new(value, 0));
    bill
}

fn paid_bill(name: &str, due: NaiveDate, reais: i64, paid_on: NaiveDate) -> Bill {
    let mut bill = pending_bill(name, due, Some(reais));
    bill.status = PaymentStatus::Paid;
    bill.paid_value = Some(Money::new(reais, 0));
    bill.paid_at = Some(noon_ms(paid_on));
    bill
}

fn names(bills: &[Bill]) -> Vec<&str> {
    bills.iter().map(|bill| bill.name.as_str()).collect()
}

fn tag(name: &str) -> CategoryRef {
    CategoryRef {
        id: Uuid::new_v4(),
        name: name.to_string(),
        color: "#3B82F6".to_string(),
    }
}

#[test]
fn monthly_summary_totals_and_balance() {
    let bills = vec![
        pending_bill("Luz", day(2024, 3, 10), Some(150)),
        pending_bill("Seguro", day(2024, 3, 31), None),
        pending_bill("IPVA", day(2024, 4, 5), Some(900)),
        paid_bill("Agua", day(2024, 2, 28), 80, day(2024, 3, 1)),
        paid_bill("Gas", day(2024, 3, 2), 95, day(2024, 2, 29)),
    ];
    let income = vec![
        IncomeEntry::new(day(2024, 3, 5), "Salario", Money::new(5000, 0)),
        IncomeEntry::new(day(2024, 4, 5), "Salario", Money::new(5000, 0)),
    ];
    let expenses = vec![
        ExpenseEntry::new(day(2024, 3, 1), "Agua", Money::new(80, 0)),
        ExpenseEntry::new(day(2024, 3, 31), "Mercado", Money::new(620, 50)),
    ];

    let summary = monthly_summary(
        &bills,
        &income,
        &expenses,
        MonthRange::containing(day(2024, 3, 15)),
        &HashSet::new(),
    );

    assert_eq!(summary.income.total, Money::new(5000, 0));
    assert_eq!(summary.income.count, 1);
    assert_eq!(summary.expenses.total, Money::new(700, 50));
    assert_eq!(summary.expenses.count, 2);
    assert_eq!(summary.bills_to_pay.total, Money::new(150, 0));
    assert_eq!(summary.bills_to_pay.count, 2);
    assert_eq!(summary.bills_paid.total, Money::new(80, 0));
    assert_eq!(summary.all_pending.total, Money::new(1050, 0));
    assert_eq!(summary.all_pending.count, 3);
    assert_eq!(summary.balance, Money::new(4299, 50));
}

#[test]
fn category_filter_keeps_records_tagged_with_any_selected_category() {
    let casa = tag("Casa");
    let lazer = tag("Lazer");
    let mut aluguel = ExpenseEntry::new(day(2024, 3, 5), "Aluguel", Money::new(1500, 0));
    aluguel.categories = vec![casa.clone()];
    let mut cinema = ExpenseEntry::new(day(2024, 3, 6), "Cinema", Money::new(60, 0));
    cinema.categories = vec![lazer];
    let untagged = ExpenseEntry::new(day(2024, 3, 7), "Outro", Money::new(10, 0));

    let filter: HashSet<_> = [casa.id].into_iter().collect();
    let summary = monthly_summary(
        &[],
        &[],
        &[aluguel, cinema, untagged],
        MonthRange::containing(day(2024, 3, 1)),
        &filter,
    );
    assert_eq!(summary.expenses.total, Money::new(1500, 0));
    assert_eq!(summary.expenses.count, 1);
    assert_eq!(summary.balance, Money::new(-1500, 0));
}

#[test]
fn dashboard_groups_split_overdue_pending_and_paid() {
    let today = day(2024, 3, 15);
    let bills = vec![
        pending_bill("Luz", day(2024, 3, 10), Some(150)),
        pending_bill("Cartao antigo", day(2024, 1, 10), Some(300)),
        pending_bill("Internet", day(2024, 3, 20), Some(100)),
        pending_bill("Hoje", day(2024, 3, 15), Some(10)),
        pending_bill("Abril", day(2024, 4, 1), Some(100)),
        paid_bill("Agua", day(2024, 3, 5), 80, day(2024, 3, 4)),
        paid_bill("Fevereiro", day(2024, 2, 5), 80, day(2024, 2, 4)),
    ];

    let groups = dashboard_bill_groups(&bills, today);

    assert_eq!(names(&groups.overdue), vec!["Cartao antigo", "Luz"]);
    assert_eq!(names(&groups.pending), vec!["Luz", "Hoje", "Internet"]);
    assert_eq!(names(&groups.paid), vec!["Agua"]);
}

#[test]
fn dashboard_pending_agrees_with_monthly_bills_to_pay() {
    let today = day(2024, 3, 15);
    let bills = vec![
        pending_bill("Luz", day(2024, 3, 10), Some(150)),
        pending_bill("Internet", day(2024, 3, 20), Some(100)),
    ];

    let groups = dashboard_bill_groups(&bills, today);
    let summary = monthly_summary(
        &bills,
        &[],
        &[],
        MonthRange::containing(today),
        &HashSet::new(),
    );

    assert_eq!(groups.pending.len(), summary.bills_to_pay.count);
    assert_eq!(names(&groups.overdue), vec!["Luz"]);
}

#[test]
fn huge_amounts_saturate_instead_of_panicking() {
    let huge: Money = "90000000000000000".parse().unwrap();
    let income = vec![
        IncomeEntry::new(day(2024, 3, 5), "Premio", huge),
        IncomeEntry::new(day(2024, 3, 6), "Premio", huge),
    ];

    let summary = monthly_summary(
        &[],
        &income,
        &[],
        MonthRange::containing(day(2024, 3, 1)),
        &HashSet::new(),
    );

    assert_eq!(summary.income.total, Money::from_cents(i64::MAX));
    assert_eq!(summary.income.count, 2);
    assert_eq!(summary.balance, Money::from_cents(i64::MAX));
}

#[test]
fn annual_series_has_twelve_labelled_points_oldest_first() {
    let bills = vec![
        pending_bill("Antiga", day(2023, 12, 10), Some(100)),
        pending_bill("Marco", day(2024, 3, 10), Some(150)),
        paid_bill("Agua", day(2024, 2, 28), 80, day(2024, 3, 1)),
    ];
    let income = vec![IncomeEntry::new(day(2024, 3, 5), "Salario", Money::new(5000, 0))];
    let expenses = vec![ExpenseEntry::new(day(2024, 1, 9), "Feira", Money::new(50, 0))];

    let points = annual_series(&bills, &income, &expenses, day(2024, 3, 20), &HashSet::new());

    assert_eq!(points.len(), 12);
    assert_eq!(points[0].label, "abr/23");
    assert_eq!(points[11].label, "mar/24");

    let march = &points[11];
    assert_eq!(march.bills_to_pay, Money::new(150, 0));
    assert_eq!(march.bills_paid, Money::new(80, 0));
    assert_eq!(march.income, Money::new(5000, 0));
    assert_eq!(march.overdue, Money::new(100, 0));

    let january = &points[9];
    assert_eq!(january.label, "jan/24");
    assert_eq!(january.expenses, Money::new(50, 0));
    assert_eq!(january.overdue, Money::new(100, 0));

    let december = &points[8];
    assert_eq!(december.bills_to_pay, Money::new(100, 0));
    assert_eq!(december.overdue, Money::ZERO);
}
