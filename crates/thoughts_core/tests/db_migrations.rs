use rusqlite::Connection;
use thoughts_core::db::migrations::latest_version;
use thoughts_core::db::{open_db, open_db_in_memory, DbError};
use thoughts_core::{NewThought, RepoError, SqliteThoughtRepository, ThoughtRepository};

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "thoughts");
    assert_table_exists(&conn, "thought_tags");
    assert_index_exists(&conn, "idx_thoughts_author");
}

#[test]
fn reopening_a_file_keeps_schema_and_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("thoughts.sqlite3");

    {
        let mut conn = open_db(&path).unwrap();
        let mut repo = SqliteThoughtRepository::try_new(&mut conn).unwrap();
        let draft = NewThought::new(
            "Persisted across opens",
            vec!["disk".to_string(), "io".to_string()],
            Some("Ops".to_string()),
        );
        repo.create(&draft, 42).unwrap();
    }

    let mut conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
    let repo = SqliteThoughtRepository::try_new(&mut conn).unwrap();
    let stored = repo.get_by_id(1).unwrap().unwrap();
    assert_eq!(stored.tags, vec!["disk".to_string(), "io".to_string()]);
    assert_eq!(stored.author, "Ops");
    assert_eq!(stored.created_at, 42);
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
fn repository_refuses_unmigrated_connection() {
    let mut conn = Connection::open_in_memory().unwrap();
    let err = SqliteThoughtRepository::try_new(&mut conn).err().unwrap();
    assert!(matches!(err, RepoError::MissingRequiredTable("thoughts")));
}

#[test]
fn deleting_a_thought_drops_its_tag_rows() {
    let mut conn = open_db_in_memory().unwrap();
    {
        let mut repo = SqliteThoughtRepository::try_new(&mut conn).unwrap();
        let draft = NewThought::new("Short lived one", vec!["tmp".to_string()], None);
        let created = repo.create(&draft, 1).unwrap();
        repo.delete(created.id).unwrap();
    }

    let orphans: i64 = conn
        .query_row("SELECT COUNT(*) FROM thought_tags;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(orphans, 0);
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    assert_schema_object(conn, "table", table_name);
}

fn assert_index_exists(conn: &Connection, index_name: &str) {
    assert_schema_object(conn, "index", index_name);
}

fn assert_schema_object(conn: &Connection, kind: &str, name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = ?1 AND name = ?2
            );",
            [kind, name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "{kind} {name} does not exist");
}
