use chrono::NaiveDate;
use pimpows_core::db::open_db_in_memory;
use pimpows_core::repo::bill_repo::{BillRepository, SqliteBillRepository};
use pimpows_core::repo::income_repo::{IncomeRepository, SqliteIncomeRepository};
use pimpows_core::{
    BillService, DateWindow, IncomeService, LedgerError, Money, NewBill, NewIncome, RepoError,
};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn paid_bill_without_timestamp_reads_as_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    let bill = BillService::new(&conn)
        .create_bill(&NewBill::single("Luz", day(2024, 3, 10), Some(Money::new(10, 0))))
        .unwrap()
        .remove(0);
    conn.execute(
        "UPDATE bills SET status = 'paid', paid_at = NULL WHERE id = ?1",
        [bill.id.to_string()],
    )
    .unwrap();

    let err = SqliteBillRepository::new(&conn)
        .get_bill(bill.id)
        .unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));

    let err = BillService::new(&conn).all_bills().unwrap_err();
    assert!(matches!(err, LedgerError::Repo(RepoError::InvalidData(_))));
}

#[test]
fn negative_stored_amount_reads_as_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    let entry = IncomeService::new(&conn)
        .create_income(&NewIncome {
            date: day(2024, 1, 5),
            origin: "Empresa X".to_string(),
            account: None,
            value: Money::new(5000, 0),
            category_ids: Vec::new(),
        })
        .unwrap();
    conn.execute(
        "UPDATE income_entries SET value_cents = -1 WHERE id = ?1",
        [entry.id.to_string()],
    )
    .unwrap();

    let err = SqliteIncomeRepository::new(&conn)
        .list_income(&DateWindow::default())
        .unwrap_err();
    match err {
        RepoError::InvalidData(message) => assert!(message.contains("income_entries")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn blank_stored_category_name_reads_as_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO categories (id, name, color, kind) VALUES (?1, '  ', '#3B82F6', 'expense')",
        [uuid::Uuid::new_v4().to_string()],
    )
    .unwrap();

    let err = pimpows_core::CategoryService::new(&conn)
        .list_categories(None)
        .unwrap_err();
    assert!(matches!(err, LedgerError::Repo(RepoError::InvalidData(_))));
}
