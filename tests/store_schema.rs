//! Store Schema Tests
//!
//! Inspects the SQLite file created by `DbContext::init_schema` with a plain
//! rusqlite connection, independent of the diesel models.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use rusqlite::{Connection, Result as SqliteResult};
use tempfile::tempdir;

use jobfeed::repository::DbContext;

#[derive(Debug, Clone, PartialEq, Eq)]
struct ColumnInfo {
    col_type: String,
    not_null: bool,
    primary_key: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct IndexInfo {
    name: String,
    columns: Vec<String>,
    unique: bool,
}

fn extract_columns(conn: &Connection, table: &str) -> SqliteResult<BTreeMap<String, ColumnInfo>> {
    let mut pragma = conn.prepare(&format!("PRAGMA table_info(\"{}\")", table))?;
    let rows = pragma.query_map([], |row| {
        Ok((
            row.get::<_, String>(1)?,
            ColumnInfo {
                col_type: row.get::<_, String>(2)?.to_uppercase(),
                not_null: row.get(3)?,
                primary_key: row.get::<_, i32>(5)? > 0,
            },
        ))
    })?;
    rows.collect()
}

fn extract_indexes(conn: &Connection, table: &str) -> SqliteResult<Vec<IndexInfo>> {
    let mut list = conn.prepare(&format!("PRAGMA index_list(\"{}\")", table))?;
    let entries: Vec<(String, bool)> = list
        .query_map([], |row| Ok((row.get(1)?, row.get(2)?)))?
        .collect::<SqliteResult<_>>()?;

    let mut indexes = Vec::new();
    for (name, unique) in entries {
        let mut info = conn.prepare(&format!("PRAGMA index_info(\"{}\")", name))?;
        let columns = info
            .query_map([], |row| row.get::<_, String>(2))?
            .collect::<SqliteResult<Vec<_>>>()?;
        indexes.push(IndexInfo {
            name,
            columns,
            unique,
        });
    }
    Ok(indexes)
}

fn table_names(conn: &Connection) -> SqliteResult<BTreeSet<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
    )?;
    let names = stmt.query_map([], |row| row.get(0))?;
    names.collect()
}

async fn create_store(path: &Path) {
    DbContext::new(path).init_schema().await.unwrap();
}

#[tokio::test]
async fn test_tables_and_columns() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("jobs.sqlite");
    create_store(&path).await;

    let conn = Connection::open(&path).unwrap();
    let tables = table_names(&conn).unwrap();
    assert_eq!(
        tables,
        ["jobs", "meta"].iter().map(|s| s.to_string()).collect()
    );

    let jobs = extract_columns(&conn, "jobs").unwrap();
    let names: Vec<&str> = jobs.keys().map(String::as_str).collect();
    assert_eq!(
        names,
        vec![
            "category",
            "company",
            "created_at",
            "hash",
            "id",
            "location",
            "posted_at",
            "salary",
            "source",
            "title",
            "url",
        ]
    );
    assert!(jobs["id"].primary_key);
    assert_eq!(jobs["id"].col_type, "INTEGER");
    assert!(jobs["url"].not_null);
    assert!(!jobs["salary"].not_null);
    assert!(!jobs["posted_at"].not_null);

    let meta = extract_columns(&conn, "meta").unwrap();
    assert!(meta["key"].primary_key);
    assert!(meta["value"].not_null);
}

#[tokio::test]
async fn test_url_is_unique_and_indexes_exist() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("jobs.sqlite");
    create_store(&path).await;

    let conn = Connection::open(&path).unwrap();
    let indexes = extract_indexes(&conn, "jobs").unwrap();

    assert!(indexes
        .iter()
        .any(|i| i.unique && i.columns == vec!["url".to_string()]));
    for (name, column) in [
        ("idx_jobs_hash", "hash"),
        ("idx_jobs_posted_at", "posted_at"),
        ("idx_jobs_source", "source"),
    ] {
        let index = indexes
            .iter()
            .find(|i| i.name == name)
            .unwrap_or_else(|| panic!("missing index {}", name));
        assert_eq!(index.columns, vec![column.to_string()]);
        assert!(!index.unique);
    }

    conn.execute(
        "INSERT INTO jobs (title, company, url, source, category, location, created_at, hash)
         VALUES ('A', 'B', 'https://x.example/1', 'S', 'C', 'Remote', '2024-01-01 00:00:00', 'h')",
        [],
    )
    .unwrap();
    let duplicate = conn.execute(
        "INSERT INTO jobs (title, company, url, source, category, location, created_at, hash)
         VALUES ('A2', 'B2', 'https://x.example/1', 'S', 'C', 'Remote',
                 '2024-01-01 00:00:00', 'h2')",
        [],
    );
    assert!(duplicate.is_err());
}

#[tokio::test]
async fn test_init_schema_is_idempotent() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("jobs.sqlite");
    create_store(&path).await;

    {
        let conn = Connection::open(&path).unwrap();
        conn.execute(
            "INSERT INTO meta (key, value) VALUES ('last_fetch_at', '1717400000')",
            [],
        )
        .unwrap();
    }

    create_store(&path).await;

    let conn = Connection::open(&path).unwrap();
    let value: String = conn
        .query_row(
            "SELECT value FROM meta WHERE key = 'last_fetch_at'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(value, "1717400000");

    let mode: String = conn
        .query_row("PRAGMA journal_mode", [], |row| row.get(0))
        .unwrap();
    assert_eq!(mode.to_lowercase(), "wal");
}
