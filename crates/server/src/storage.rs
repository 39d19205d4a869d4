use anyhow::{Context, Result};
use rusqlite::types::{Type, Value as SqlValue};
use rusqlite::{Connection, Row, params_from_iter};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use valuequest_api::db::Built;
use valuequest_api::db::migrations::MIGRATIONS;

/// Shared database state
#[derive(Clone)]
pub struct Db {
    conn: Arc<Mutex<Connection>>,
}

impl Db {
    pub fn conn(&self) -> MutexGuard<'_, Connection> {
        // A handler that panicked mid-request leaves the connection itself intact.
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Initialize the database: open connection, enable WAL, run migrations
pub fn init_db(data_dir: &Path) -> Result<Db> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("creating data directory {}", data_dir.display()))?;
    let db_path = data_dir.join("valuequest.db");
    let conn = Connection::open(&db_path).context("opening SQLite database")?;

    // WAL for concurrent reads while a writer holds the lock
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    configure(conn)
}

/// Fresh in-memory database with all migrations applied.
pub fn open_in_memory() -> Result<Db> {
    let conn = Connection::open_in_memory().context("opening in-memory database")?;
    configure(conn)
}

fn configure(conn: Connection) -> Result<Db> {
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;
    run_migrations(&conn)?;
    Ok(Db {
        conn: Arc::new(Mutex::new(conn)),
    })
}

fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    for (name, sql) in MIGRATIONS {
        let already_applied: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM _migrations WHERE name = ?1",
            [name],
            |row| row.get(0),
        )?;

        if !already_applied {
            conn.execute_batch(sql)
                .with_context(|| format!("running migration {name}"))?;
            conn.execute("INSERT INTO _migrations (name) VALUES (?1)", [name])?;
            tracing::info!("applied migration: {name}");
        }
    }

    Ok(())
}

// ── sea-query bridge ────────────────────────────────────────────────────────

/// Convert `sea_query::Values` into rusqlite bind parameters.
fn bind_values(values: &sea_query::Values) -> Vec<SqlValue> {
    use sea_query::Value as V;

    values
        .0
        .iter()
        .map(|v| match v {
            V::Bool(Some(b)) => SqlValue::Integer(i64::from(*b)),
            V::TinyInt(Some(i)) => SqlValue::Integer(i64::from(*i)),
            V::SmallInt(Some(i)) => SqlValue::Integer(i64::from(*i)),
            V::Int(Some(i)) => SqlValue::Integer(i64::from(*i)),
            V::BigInt(Some(i)) => SqlValue::Integer(*i),
            V::TinyUnsigned(Some(u)) => SqlValue::Integer(i64::from(*u)),
            V::SmallUnsigned(Some(u)) => SqlValue::Integer(i64::from(*u)),
            V::Unsigned(Some(u)) => SqlValue::Integer(i64::from(*u)),
            V::BigUnsigned(Some(u)) => SqlValue::Integer(i64::try_from(*u).unwrap_or(i64::MAX)),
            V::Float(Some(f)) => SqlValue::Real(f64::from(*f)),
            V::Double(Some(f)) => SqlValue::Real(*f),
            V::String(Some(s)) => SqlValue::Text(s.as_str().to_owned()),
            V::Char(Some(c)) => SqlValue::Text(c.to_string()),
            V::Bytes(Some(b)) => SqlValue::Blob(b.to_vec()),
            _ => SqlValue::Null,
        })
        .collect()
}

/// Execute a built statement, returning the number of changed rows.
pub fn sq_execute(conn: &Connection, (sql, values): Built) -> rusqlite::Result<usize> {
    conn.execute(&sql, params_from_iter(bind_values(&values)))
}

/// Run a built query expected to return exactly one row.
pub fn sq_query_row<T, F>(conn: &Connection, (sql, values): Built, f: F) -> rusqlite::Result<T>
where
    F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
{
    conn.query_row(&sql, params_from_iter(bind_values(&values)), f)
}

/// Like [`sq_query_row`], but `Ok(None)` when the query returns no rows.
pub fn sq_query_opt<T, F>(conn: &Connection, built: Built, f: F) -> rusqlite::Result<Option<T>>
where
    F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
{
    match sq_query_row(conn, built, f) {
        Ok(v) => Ok(Some(v)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Run a built query and map every row.
pub fn sq_query_map<T, F>(conn: &Connection, (sql, values): Built, f: F) -> rusqlite::Result<Vec<T>>
where
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(bind_values(&values)), f)?;
    rows.collect()
}

/// Read a text column holding one of a closed set of values.
pub fn text_enum<T>(row: &Row<'_>, idx: usize, parse: fn(&str) -> Option<T>) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    parse(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("unexpected value {raw:?}").into(),
        )
    })
}
