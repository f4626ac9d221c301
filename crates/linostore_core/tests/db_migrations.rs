use linostore_core::db::migrations::latest_version;
use linostore_core::db::{open_db, open_db_in_memory, DbError};
use linostore_core::{Links, LinksError, SqliteLinks};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "links");
    assert_table_exists(&conn, "substrate_meta");
}

#[test]
fn reopening_a_storage_file_keeps_links() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("links.db");

    let conn_first = open_db(&path).unwrap();
    let stored = SqliteLinks::try_new(&conn_first)
        .unwrap()
        .get_or_create(3, 4)
        .unwrap();
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    let links = SqliteLinks::try_new(&conn_second).unwrap();
    assert_eq!(links.find(3, 4).unwrap(), Some(stored));
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

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
fn unopenable_storage_path_is_named_in_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("links.db");

    let err = open_db(&path).unwrap_err();
    assert!(err.to_string().contains("links.db"));
    match err {
        DbError::Open { path: failed, .. } => assert_eq!(failed, path),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn links_refuse_unmigrated_connections() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteLinks::try_new(&conn) {
        Err(LinksError::UninitializedConnection {
            expected_version,
            actual_version,
        }) => {
            assert_eq!(expected_version, latest_version());
            assert_eq!(actual_version, 0);
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("unmigrated connection must be rejected"),
    }
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
