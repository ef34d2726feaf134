//! SQLite connection implementation

use mrtp_core::{
    ColumnMeta, Connection, ConstraintKind, MrtpError, QueryResult, Result, Row,
    StatementResult, Value,
};
use parking_lot::Mutex;
use rusqlite::{Connection as RusqliteConnection, OpenFlags, ffi, params_from_iter};
use std::sync::Arc;

/// SQLite connection wrapper.
///
/// The handle is shared by every model of a session; the mutex keeps each
/// statement (and the `last_insert_rowid` read that follows an insert) from
/// interleaving with another.
pub struct SqliteConnection {
    conn: Mutex<RusqliteConnection>,
}

impl SqliteConnection {
    /// Open (or create) a SQLite database file
    pub fn open(path: &str) -> Result<Self> {
        if path == ":memory:" {
            return Self::open_in_memory();
        }
        tracing::info!(path = %path, "opening SQLite database");

        let file_path = std::path::Path::new(path);
        if let Some(parent) = file_path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            return Err(MrtpError::Connection(format!(
                "Parent directory does not exist: {}",
                parent.display()
            )));
        }

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let conn = RusqliteConnection::open_with_flags(path, flags).map_err(|e| {
            MrtpError::Connection(format!(
                "Failed to open SQLite database at '{}': {}",
                path, e
            ))
        })?;

        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| MrtpError::Connection(format!("Failed to set journal mode: {}", e)))?;

        Self::configure(conn)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = RusqliteConnection::open_in_memory().map_err(|e| {
            MrtpError::Connection(format!("Failed to open in-memory database: {}", e))
        })?;
        Self::configure(conn)
    }

    fn configure(conn: RusqliteConnection) -> Result<Self> {
        // Deleting a referenced record must fail, the models rely on it
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(|e| MrtpError::Connection(format!("Failed to enable foreign keys: {}", e)))?;

        tracing::debug!("SQLite connection configured");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Wrap into the shared handle type the models expect
    pub fn into_shared(self) -> Arc<dyn Connection> {
        Arc::new(self)
    }

    /// Execute multiple SQL statements without parameters (schema scripts)
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        tracing::debug!("executing SQL batch");
        self.conn.lock().execute_batch(sql).map_err(map_sqlite_error)
    }
}

impl Connection for SqliteConnection {
    fn driver_name(&self) -> &str {
        "sqlite"
    }

    #[tracing::instrument(skip(self, sql, params), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    fn execute(&self, sql: &str, params: &[Value]) -> Result<StatementResult> {
        let conn = self.conn.lock();
        let rusqlite_params = values_to_rusqlite(params);

        let rows_affected = conn
            .execute(sql, params_from_iter(rusqlite_params.iter()))
            .map_err(map_sqlite_error)?;

        let is_insert = sql.trim_start().get(..6).is_some_and(|kw| kw.eq_ignore_ascii_case("insert"));
        let last_insert_id = (is_insert && rows_affected > 0).then(|| conn.last_insert_rowid());

        tracing::debug!(affected_rows = rows_affected, ?last_insert_id, "statement executed");
        Ok(StatementResult {
            affected_rows: rows_affected as u64,
            last_insert_id,
        })
    }

    #[tracing::instrument(skip(self, sql, params), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        let start_time = std::time::Instant::now();

        let conn = self.conn.lock();
        let rusqlite_params = values_to_rusqlite(params);

        let mut stmt = conn.prepare(sql).map_err(map_sqlite_error)?;

        let columns: Vec<ColumnMeta> = stmt
            .columns()
            .iter()
            .enumerate()
            .map(|(ordinal, col)| ColumnMeta {
                name: col.name().to_string(),
                data_type: col.decl_type().unwrap_or("DYNAMIC").to_string(),
                ordinal,
            })
            .collect();
        let column_names: Arc<[String]> = columns.iter().map(|c| c.name.clone()).collect();

        let mut rows = Vec::new();
        let mut query_rows = stmt
            .query(params_from_iter(rusqlite_params.iter()))
            .map_err(map_sqlite_error)?;

        while let Some(row) = query_rows.next().map_err(map_sqlite_error)? {
            let mut values = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                values.push(rusqlite_to_value(row, i)?);
            }
            rows.push(Row::new(column_names.clone(), values));
        }

        let execution_time_ms = start_time.elapsed().as_millis() as u64;
        tracing::debug!(
            row_count = rows.len(),
            execution_time_ms = execution_time_ms,
            "query executed"
        );
        Ok(QueryResult {
            columns,
            rows,
            execution_time_ms,
        })
    }
}

/// Convert a rusqlite error, classifying constraint failures by extended code
pub(crate) fn map_sqlite_error(err: rusqlite::Error) -> MrtpError {
    if let rusqlite::Error::SqliteFailure(ffi_err, msg) = &err
        && ffi_err.code == rusqlite::ErrorCode::ConstraintViolation
    {
        let message = msg.clone().unwrap_or_else(|| err.to_string());
        let kind = constraint_kind(ffi_err.extended_code);
        let columns = constraint_columns(&message);
        tracing::debug!(?kind, ?columns, "constraint violation");
        return MrtpError::Constraint {
            kind,
            columns,
            message,
        };
    }
    MrtpError::Query(err.to_string())
}

fn constraint_kind(extended_code: std::os::raw::c_int) -> ConstraintKind {
    match extended_code {
        ffi::SQLITE_CONSTRAINT_UNIQUE => ConstraintKind::Unique,
        ffi::SQLITE_CONSTRAINT_PRIMARYKEY | ffi::SQLITE_CONSTRAINT_ROWID => {
            ConstraintKind::PrimaryKey
        }
        ffi::SQLITE_CONSTRAINT_FOREIGNKEY => ConstraintKind::ForeignKey,
        ffi::SQLITE_CONSTRAINT_TRIGGER => ConstraintKind::Trigger,
        ffi::SQLITE_CONSTRAINT_NOTNULL => ConstraintKind::NotNull,
        ffi::SQLITE_CONSTRAINT_CHECK => ConstraintKind::Check,
        _ => ConstraintKind::Other,
    }
}

/// Columns named by messages like `UNIQUE constraint failed: rs_list.model_id, rs_list.number`
fn constraint_columns(message: &str) -> Vec<String> {
    match message.split_once("constraint failed: ") {
        Some((_, cols)) => cols
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect(),
        None => Vec::new(),
    }
}

fn values_to_rusqlite(values: &[Value]) -> Vec<rusqlite::types::Value> {
    values.iter().map(value_to_rusqlite).collect()
}

fn value_to_rusqlite(value: &Value) -> rusqlite::types::Value {
    match value {
        Value::Null => rusqlite::types::Value::Null,
        Value::Bool(b) => rusqlite::types::Value::Integer(i64::from(*b)),
        Value::Int64(i) => rusqlite::types::Value::Integer(*i),
        Value::Float64(f) => rusqlite::types::Value::Real(*f),
        Value::String(s) => rusqlite::types::Value::Text(s.clone()),
        Value::Bytes(b) => rusqlite::types::Value::Blob(b.clone()),
    }
}

/// Convert rusqlite row value to our Value type
fn rusqlite_to_value(row: &rusqlite::Row, idx: usize) -> Result<Value> {
    use rusqlite::types::ValueRef;

    let value_ref = row.get_ref(idx).map_err(map_sqlite_error)?;

    let value = match value_ref {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int64(i),
        ValueRef::Real(f) => Value::Float64(f),
        ValueRef::Text(s) => Value::String(String::from_utf8_lossy(s).into_owned()),
        ValueRef::Blob(b) => Value::Bytes(b.to_vec()),
    };

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_constraint_columns() {
        assert_eq!(
            constraint_columns("UNIQUE constraint failed: rs_list.model_id, rs_list.number"),
            vec!["rs_list.model_id".to_string(), "rs_list.number".to_string()]
        );
        assert!(constraint_columns("FOREIGN KEY constraint failed").is_empty());
    }

    #[test]
    fn classifies_extended_codes() {
        assert_eq!(constraint_kind(ffi::SQLITE_CONSTRAINT_UNIQUE), ConstraintKind::Unique);
        assert_eq!(
            constraint_kind(ffi::SQLITE_CONSTRAINT_FOREIGNKEY),
            ConstraintKind::ForeignKey
        );
        assert_eq!(constraint_kind(ffi::SQLITE_CONSTRAINT_CHECK), ConstraintKind::Check);
        assert_eq!(constraint_kind(ffi::SQLITE_CONSTRAINT), ConstraintKind::Other);
    }

    #[test]
    fn insert_reports_rowid() {
        let conn = SqliteConnection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY, v TEXT)")
            .unwrap();
        let res = conn.execute("INSERT INTO t(v) VALUES (?)", &["a".into()]).unwrap();
        assert_eq!(res.affected_rows, 1);
        assert_eq!(res.last_insert_id, Some(1));

        let res = conn.execute("UPDATE t SET v = ?", &["b".into()]).unwrap();
        assert_eq!(res.last_insert_id, None);
    }
}
