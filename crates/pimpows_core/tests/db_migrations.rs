use pimpows_core::db::migrations::latest_version;
use pimpows_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

const LEDGER_TABLES: [&str; 10] = [
    "categories",
    "bills",
    "income_entries",
    "expense_entries",
    "income_predictions",
    "loans",
    "bill_categories",
    "income_categories",
    "expense_categories",
    "income_prediction_categories",
];

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    for table in LEDGER_TABLES {
        assert_table_exists(&conn, table);
    }
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pimpows.sqlite3");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "bills");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn foreign_keys_are_enforced() {
    let conn = open_db_in_memory().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);

    let orphan_link = conn.execute(
        "INSERT INTO bill_categories (bill_id, category_id) VALUES ('missing', 'missing');",
        [],
    );
    assert!(orphan_link.is_err());
}

#[test]
fn status_and_kind_columns_reject_unknown_values() {
    let conn = open_db_in_memory().unwrap();
    let bad_kind = conn.execute(
        "INSERT INTO categories (id, name, color, kind) VALUES ('c1', 'Casa', '#3B82F6', 'other');",
        [],
    );
    assert!(bad_kind.is_err());

    let bad_status = conn.execute(
        "INSERT INTO bills (id, name, due_date, status) VALUES ('b1', 'Luz', '2024-01-10', 'overdue');",
        [],
    );
    assert!(bad_status.is_err());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
