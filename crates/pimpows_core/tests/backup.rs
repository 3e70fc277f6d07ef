use chrono::{NaiveDate, TimeZone, Utc};
use pimpows_core::db::open_db_in_memory;
use pimpows_core::{
    export_backup, parse_backup_json, restore_backup, write_backup_json, BackupError,
    BillService, CategoryKind, CategoryService, Connection, EntryListQuery, ExpenseService,
    IncomeService, LoanService, Money, NewBill, NewIncome, NewLoan, NewPrediction,
    PredictionService,
};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn seed_ledger(conn: &Connection) {
    let categories = CategoryService::new(conn);
    let casa = categories
        .create_category("Casa", None, CategoryKind::Expense)
        .unwrap();
    let salario = categories
        .create_category("Salario", None, CategoryKind::Income)
        .unwrap();

    let bills = BillService::new(conn);
    let mut luz = NewBill::single("Luz", day(2024, 3, 10), Some(Money::new(150, 0)));
    luz.category_ids = vec![casa.id];
    let luz = bills.create_bill(&luz).unwrap().remove(0);
    bills
        .pay_bill(luz.id, Money::new(149, 90), 1_710_504_000_000)
        .unwrap();
    bills
        .create_bill(&NewBill::single("Internet", day(2024, 3, 20), None))
        .unwrap();

    IncomeService::new(conn)
        .create_income(&NewIncome {
            date: day(2024, 3, 5),
            origin: "Empresa X".to_string(),
            account: Some("Banco A".to_string()),
            value: Money::new(5000, 0),
            category_ids: vec![salario.id],
        })
        .unwrap();
    PredictionService::new(conn)
        .create_prediction(&NewPrediction {
            date: day(2024, 4, 5),
            origin: "Empresa X".to_string(),
            value: Money::new(5000, 0),
            category_ids: vec![salario.id],
        })
        .unwrap();
    LoanService::new(conn)
        .create_loan(&NewLoan {
            name: "Emprestimo".to_string(),
            due_date: day(2024, 5, 1),
            installment_value: Money::new(300, 0),
            observation: None,
        })
        .unwrap();
}

#[test]
fn export_then_restore_into_fresh_database_preserves_ledger() {
    let source = open_db_in_memory().unwrap();
    seed_ledger(&source);
    let created_at = Utc.with_ymd_and_hms(2024, 3, 16, 9, 0, 0).unwrap();

    let document = export_backup(&source, created_at).unwrap();
    assert_eq!(document.version, "1.0");
    assert_eq!(document.data.categories.len(), 2);
    assert_eq!(document.data.bills.len(), 2);
    assert_eq!(document.data.bill_categories.len(), 1);
    assert_eq!(document.data.expense_categories.len(), 1);

    let mut buffer = Vec::new();
    write_backup_json(&document, &mut buffer).unwrap();
    let text = String::from_utf8(buffer).unwrap();
    let raw: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(raw["version"], "1.0");
    assert!(raw["data"]["income_prediction_categories"].is_array());

    let target = open_db_in_memory().unwrap();
    let parsed = parse_backup_json(&text).unwrap();
    let report = restore_backup(&target, &parsed).unwrap();
    assert_eq!(report.categories, 2);
    assert_eq!(report.bills, 2);
    assert_eq!(report.expense_entries, 1);
    assert_eq!(report.loans, 1);
    assert_eq!(report.category_links, 4);

    let restored = export_backup(&target, created_at).unwrap();
    assert_eq!(restored, document);

    let expenses = ExpenseService::new(&target)
        .list_expenses(&EntryListQuery::default())
        .unwrap();
    assert_eq!(expenses[0].categories[0].name, "Casa");
    assert!(expenses[0].bill_id.is_some());
}

#[test]
fn restore_replaces_existing_rows() {
    let conn = open_db_in_memory().unwrap();
    seed_ledger(&conn);
    let document = export_backup(&conn, Utc::now()).unwrap();

    CategoryService::new(&conn)
        .create_category("Temporaria", None, CategoryKind::Expense)
        .unwrap();
    restore_backup(&conn, &document).unwrap();

    let names: Vec<_> = CategoryService::new(&conn)
        .list_categories(None)
        .unwrap()
        .into_iter()
        .map(|category| category.name)
        .collect();
    assert_eq!(names, vec!["Casa", "Salario"]);
}

#[test]
fn invalid_rows_abort_restore_and_keep_previous_data() {
    let conn = open_db_in_memory().unwrap();
    seed_ledger(&conn);
    let before = export_backup(&conn, Utc::now()).unwrap();

    let mut broken = before.clone();
    broken.data.bills[0].name = "   ".to_string();
    assert!(restore_backup(&conn, &broken).is_err());

    let after = export_backup(&conn, before.created_at).unwrap();
    assert_eq!(after, before);
}

#[test]
fn links_to_unknown_categories_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    seed_ledger(&conn);
    let mut document = export_backup(&conn, Utc::now()).unwrap();
    document.data.categories.retain(|category| category.name != "Casa");

    let err = restore_backup(&conn, &document).unwrap_err();
    assert!(matches!(err, BackupError::InvalidDocument(_)));
    assert_eq!(
        CategoryService::new(&conn).list_categories(None).unwrap().len(),
        2
    );
}

#[test]
fn links_to_missing_records_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    seed_ledger(&conn);
    let mut document = export_backup(&conn, Utc::now()).unwrap();
    document.data.income_entries.clear();

    let err = restore_backup(&conn, &document).unwrap_err();
    match err {
        BackupError::InvalidDocument(message) => {
            assert!(message.contains("income_categories"))
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(
        IncomeService::new(&conn)
            .list_income(&EntryListQuery::default())
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn links_with_wrong_category_kind_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    seed_ledger(&conn);
    let mut document = export_backup(&conn, Utc::now()).unwrap();
    let salario = document
        .data
        .categories
        .iter()
        .find(|category| category.kind == CategoryKind::Income)
        .unwrap()
        .id;
    document.data.bill_categories[0].category_id = salario;

    let err = restore_backup(&conn, &document).unwrap_err();
    assert!(matches!(err, BackupError::InvalidDocument(_)));
    let bills = BillService::new(&conn).all_bills().unwrap();
    assert_eq!(bills.len(), 2);
    assert!(bills
        .iter()
        .flat_map(|bill| bill.categories.iter())
        .all(|category| category.name == "Casa"));
}

#[test]
fn non_backup_json_is_rejected() {
    let err = parse_backup_json(r#"{"hello": "world"}"#).unwrap_err();
    assert!(matches!(err, BackupError::InvalidDocument(_)));

    let err = parse_backup_json("not json").unwrap_err();
    assert!(matches!(err, BackupError::Json(_)));
}
