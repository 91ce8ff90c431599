use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

use mediarank_api::db::{migrations, works, Built};
use mediarank_api::{Category, UserResponse, VoteResponse, WorkResponse};

/// Shared database state.
#[derive(Clone)]
pub struct Db {
    conn: Arc<Mutex<Connection>>,
}

impl Db {
    pub fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }
}

/// Initialize the database: open connection, enable WAL, run migrations.
pub fn init_db(data_dir: &Path) -> Result<Db> {
    std::fs::create_dir_all(data_dir)?;
    let db_path = data_dir.join("mediarank.db");
    let conn = Connection::open(&db_path).context("opening SQLite database")?;

    // WAL for concurrent readers; foreign keys drive the vote cascade.
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
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

    for (name, sql) in migrations::MIGRATIONS {
        let already_applied: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM _migrations WHERE name = ?1",
                [name],
                |row| row.get(0),
            )
            .unwrap_or(false);

        if !already_applied {
            conn.execute_batch(sql)
                .with_context(|| format!("running migration {name}"))?;
            conn.execute("INSERT INTO _migrations (name) VALUES (?1)", [name])?;
            tracing::info!("Applied migration: {name}");
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// sea-query binding helpers
// ---------------------------------------------------------------------------

fn bind_values(values: &sea_query::Values) -> Vec<rusqlite::types::Value> {
    values
        .0
        .iter()
        .map(|v| match v {
            sea_query::Value::String(Some(s)) => {
                rusqlite::types::Value::Text(s.as_ref().clone())
            }
            sea_query::Value::TinyInt(Some(i)) => rusqlite::types::Value::Integer(i64::from(*i)),
            sea_query::Value::SmallInt(Some(i)) => rusqlite::types::Value::Integer(i64::from(*i)),
            sea_query::Value::Int(Some(i)) => rusqlite::types::Value::Integer(i64::from(*i)),
            sea_query::Value::BigInt(Some(i)) => rusqlite::types::Value::Integer(*i),
            sea_query::Value::TinyUnsigned(Some(u)) => {
                rusqlite::types::Value::Integer(i64::from(*u))
            }
            sea_query::Value::SmallUnsigned(Some(u)) => {
                rusqlite::types::Value::Integer(i64::from(*u))
            }
            sea_query::Value::Unsigned(Some(u)) => rusqlite::types::Value::Integer(i64::from(*u)),
            sea_query::Value::BigUnsigned(Some(u)) => {
                rusqlite::types::Value::Integer(*u as i64)
            }
            sea_query::Value::Bool(Some(b)) => rusqlite::types::Value::Integer(i64::from(*b)),
            sea_query::Value::Float(Some(f)) => rusqlite::types::Value::Real(f64::from(*f)),
            sea_query::Value::Double(Some(f)) => rusqlite::types::Value::Real(*f),
            _ => rusqlite::types::Value::Null,
        })
        .collect()
}

/// Execute a built statement, returning the affected row count.
pub fn sq_execute(conn: &Connection, (sql, values): Built) -> rusqlite::Result<usize> {
    conn.execute(&sql, rusqlite::params_from_iter(bind_values(&values)))
}

/// Run a built query expected to yield at most one row.
pub fn sq_query_row<T>(
    conn: &Connection,
    (sql, values): Built,
    f: impl FnOnce(&rusqlite::Row<'_>) -> rusqlite::Result<T>,
) -> rusqlite::Result<T> {
    conn.query_row(&sql, rusqlite::params_from_iter(bind_values(&values)), f)
}

/// Run a built query and collect every successfully mapped row.
pub fn sq_query_all<T>(
    conn: &Connection,
    (sql, values): Built,
    f: impl FnMut(&rusqlite::Row<'_>) -> rusqlite::Result<T>,
) -> rusqlite::Result<Vec<T>> {
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(bind_values(&values)), f)?;
    Ok(rows.filter_map(|r| r.ok()).collect())
}

// ---------------------------------------------------------------------------
// Row mappers (column order matches the *_COLUMNS consts in mediarank-api)
// ---------------------------------------------------------------------------

pub fn work_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<WorkResponse> {
    let category: String = row.get(2)?;
    Ok(WorkResponse {
        id: row.get(0)?,
        title: row.get(1)?,
        // The CHECK constraint keeps this canonical; an out-of-set value
        // would mean the schema was bypassed.
        category: Category::parse(&category).unwrap_or(Category::Album),
        creator: row.get(3)?,
        description: row.get(4)?,
        publication_year: row.get(5)?,
        owner_id: row.get(6)?,
        vote_count: row.get(7)?,
        created_at: row.get(8)?,
    })
}

pub fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserResponse> {
    Ok(UserResponse {
        id: row.get(0)?,
        provider: row.get(1)?,
        // column 2 is provider_uid, internal only
        username: row.get(3)?,
        avatar_url: row.get(4)?,
        created_at: row.get(5)?,
    })
}

pub fn vote_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<VoteResponse> {
    Ok(VoteResponse {
        id: row.get(0)?,
        user_id: row.get(1)?,
        work_id: row.get(2)?,
        created_at: row.get(3)?,
    })
}

/// Load a work by id, `Ok(None)` when absent.
pub fn load_work(conn: &Connection, work_id: &str) -> rusqlite::Result<Option<WorkResponse>> {
    match sq_query_row(conn, works::get_by_id(work_id), work_from_row) {
        Ok(work) => Ok(Some(work)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}
