use crate::entry::{EntryKind, Fields, Kind, Record};
use crate::error::{LedgerError, Result};
use rusqlite::types::ValueRef;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

/// Entry Store: owns the canonical copy of every entry.
///
/// One SQLite connection behind a mutex, so add/delete calls coming from
/// several windows are serialised. Each operation is a single statement,
/// which SQLite applies atomically.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Open (or create) the database file and make sure the tables exist.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        info!(path = %path.display(), "opened ledger database");
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        setup_database(&conn)?;
        Ok(Store {
            conn: Mutex::new(conn),
        })
    }

    /// Flush and release the connection.
    pub fn close(self) -> Result<()> {
        let conn = self
            .conn
            .into_inner()
            .map_err(|_| LedgerError::Storage("store lock poisoned".to_string()))?;
        conn.close().map_err(|(_, err)| LedgerError::from(err))?;
        debug!("closed ledger database");
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| LedgerError::Storage("store lock poisoned".to_string()))
    }

    /// Validate and persist `entry`, returning the freshly assigned id.
    pub fn add<K: EntryKind>(&self, entry: &K) -> Result<i64> {
        entry.validate()?;

        let values: Vec<String> = entry.row();
        let sql = insert_sql(K::KIND, K::COLUMNS);
        debug!(%sql, "insert");

        let conn = self.lock()?;
        conn.execute(&sql, params_from_iter(values.iter()))?;
        let id = conn.last_insert_rowid();

        info!(kind = %K::KIND, id, "entry added");
        Ok(id)
    }

    /// Remove an entry permanently.
    pub fn delete<K: EntryKind>(&self, id: i64) -> Result<()> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", K::KIND.table());
        debug!(%sql, id, "delete");

        let changed = self.lock()?.execute(&sql, params![id])?;
        if changed == 0 {
            return Err(LedgerError::NotFound {
                kind: K::KIND.as_str(),
                id,
            });
        }

        info!(kind = %K::KIND, id, "entry deleted");
        Ok(())
    }

    pub fn get<K: EntryKind>(&self, id: i64) -> Result<Record<K>> {
        let sql = format!("{} WHERE id = ?1", select_sql(K::KIND, K::COLUMNS));
        let conn = self.lock()?;

        let raw = conn
            .query_row(&sql, params![id], |row| read_row(row, K::COLUMNS))
            .optional()?;

        match raw {
            Some((id, fields)) => decode::<K>(id, &fields),
            None => Err(LedgerError::NotFound {
                kind: K::KIND.as_str(),
                id,
            }),
        }
    }

    /// Every entry of a kind, in insertion order.
    pub fn all<K: EntryKind>(&self) -> Result<Vec<Record<K>>> {
        let sql = format!("{} ORDER BY id", select_sql(K::KIND, K::COLUMNS));
        let conn = self.lock()?;

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| read_row(row, K::COLUMNS))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.iter()
            .map(|(id, fields)| decode::<K>(*id, fields))
            .collect()
    }

    pub fn count<K: EntryKind>(&self) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", K::KIND.table());
        let count: i64 = self.lock()?.query_row(&sql, [], |row| row.get(0))?;
        Ok(count)
    }
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // WAL for crash recovery; in-memory databases answer "memory"
    let mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    debug!(%mode, "journal mode");

    // AUTOINCREMENT keeps ids from being reused after a delete
    conn.execute(
        "CREATE TABLE IF NOT EXISTS income (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            source TEXT NOT NULL,
            \"type\" TEXT NOT NULL,
            amount TEXT NOT NULL,
            date TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS expenses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            category TEXT NOT NULL,
            item TEXT NOT NULL,
            amount TEXT NOT NULL,
            quantity INTEGER NOT NULL DEFAULT 1 CHECK (quantity > 0),
            date TEXT NOT NULL,
            payment_mode TEXT NOT NULL CHECK (payment_mode IN ('Offline', 'Online')),
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS budgets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            category TEXT NOT NULL,
            amount TEXT NOT NULL,
            date TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    for kind in Kind::ALL {
        let table = kind.table();
        conn.execute(
            &format!("CREATE INDEX IF NOT EXISTS idx_{table}_date ON {table}(date)"),
            [],
        )?;
    }

    Ok(())
}

fn quoted(columns: &[&str]) -> String {
    columns
        .iter()
        .map(|c| format!("\"{}\"", c))
        .collect::<Vec<_>>()
        .join(", ")
}

// Table and column names are compile-time constants; values are always bound.
fn insert_sql(kind: Kind, columns: &[&str]) -> String {
    let placeholders = (1..=columns.len())
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        kind.table(),
        quoted(columns),
        placeholders
    )
}

fn select_sql(kind: Kind, columns: &[&str]) -> String {
    format!("SELECT id, {} FROM {}", quoted(columns), kind.table())
}

fn read_row(row: &rusqlite::Row<'_>, columns: &[&str]) -> rusqlite::Result<(i64, Fields)> {
    let id: i64 = row.get(0)?;
    let mut fields = Fields::new();
    for (i, column) in columns.iter().enumerate() {
        fields.insert(column, value_text(row.get_ref(i + 1)?));
    }
    Ok((id, fields))
}

fn value_text(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) | ValueRef::Blob(t) => String::from_utf8_lossy(t).into_owned(),
    }
}

// A row that no longer passes validation was written outside the engine.
fn decode<K: EntryKind>(id: i64, fields: &Fields) -> Result<Record<K>> {
    K::from_fields(fields)
        .map(|entry| Record::new(id, entry))
        .map_err(|err| {
            LedgerError::Storage(format!(
                "unreadable {} row {}: {}",
                K::KIND,
                id,
                err
            ))
        })
}
