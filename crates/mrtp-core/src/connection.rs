//! Connection trait

use crate::{QueryResult, Result, Row, StatementResult, Value};

/// A database connection.
///
/// Every call runs synchronously on the calling thread and completes a single
/// statement. Implementations must not interleave two statements on the
/// underlying handle.
pub trait Connection: Send + Sync {
    /// Get the driver name (e.g., "sqlite")
    fn driver_name(&self) -> &str;

    /// Execute a statement that modifies data (INSERT/UPDATE/DELETE)
    fn execute(&self, sql: &str, params: &[Value]) -> Result<StatementResult>;

    /// Execute a query that returns rows (SELECT)
    fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult>;

    /// First row of a query, if any
    fn query_row(&self, sql: &str, params: &[Value]) -> Result<Option<Row>> {
        Ok(self.query(sql, params)?.rows.into_iter().next())
    }

    /// First value of the first row of a query, `Value::Null` when empty
    fn query_scalar(&self, sql: &str, params: &[Value]) -> Result<Value> {
        Ok(self.query(sql, params)?.scalar().cloned().unwrap_or_default())
    }
}
