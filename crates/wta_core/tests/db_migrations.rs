use rusqlite::Connection;
use wta_core::db::migrations::latest_version;
use wta_core::db::{open_db, open_db_in_memory, DbError};
use wta_core::{builtin_entity_types, ReportTable};

#[test]
fn open_db_in_memory_creates_destination_and_report_tables() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "destinations");
    for name in builtin_entity_types() {
        let table = ReportTable::for_entity_type(name).unwrap();
        assert_table_exists(&conn, table.table);
    }
}

#[test]
fn reopening_database_keeps_schema_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wta.db");

    drop(open_db(&path).unwrap());
    let conn = open_db(&path).unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "auto_send_reports");
}

#[test]
fn newer_schema_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
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
fn report_state_column_rejects_unknown_values() {
    let conn = open_db_in_memory().unwrap();

    let result = conn.execute(
        "INSERT INTO auto_send_reports (attempt_uuid, auto, state) VALUES ('a', 1, 'sent');",
        [],
    );

    assert!(result.is_err());
}

#[test]
fn confirmed_report_requires_remote_id() {
    let conn = open_db_in_memory().unwrap();

    let result = conn.execute(
        "INSERT INTO companies_send_reports (attempt_uuid, company, state) VALUES ('b', 1, 'confirmed');",
        [],
    );

    assert!(result.is_err());
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
