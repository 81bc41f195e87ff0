//! Buffered SQLite row cursor.

use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};

use super::{Result, SqliteError};
use crate::driver::{DataReader, Value};

/// Cursor over rows fetched by `SqliteCommand::execute_reader`.
///
/// Rows are read into memory when the command executes; the cursor does
/// not hold the connection.
#[derive(Debug, Clone, Default)]
pub struct SqliteDataReader {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    current: Option<usize>,
}

impl SqliteDataReader {
    pub(crate) fn from_rows(rows: &[SqliteRow]) -> Result<Self> {
        let columns = rows
            .first()
            .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();
        let rows = rows.iter().map(decode_row).collect::<Result<_>>()?;
        Ok(Self {
            columns,
            rows,
            current: None,
        })
    }

    /// Whether the result set has any rows at all.
    pub fn has_rows(&self) -> bool {
        !self.rows.is_empty()
    }
}

pub(crate) fn decode_row(row: &SqliteRow) -> Result<Vec<Value>> {
    (0..row.len()).map(|i| decode_column(row, i)).collect()
}

/// Decode by the value's runtime storage class.
pub(crate) fn decode_column(row: &SqliteRow, index: usize) -> Result<Value> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let value = match raw.type_info().name() {
        "INTEGER" | "BOOLEAN" => Value::Integer(row.try_get_unchecked::<i64, _>(index)?),
        "REAL" => Value::Real(row.try_get_unchecked::<f64, _>(index)?),
        "BLOB" => Value::Blob(row.try_get_unchecked::<Vec<u8>, _>(index)?),
        _ => Value::Text(row.try_get_unchecked::<String, _>(index)?),
    };
    Ok(value)
}

impl DataReader for SqliteDataReader {
    type Error = SqliteError;

    fn read(&mut self) -> Result<bool> {
        let next = self.current.map_or(0, |i| i + 1);
        self.current = Some(next.min(self.rows.len()));
        Ok(next < self.rows.len())
    }

    fn field_count(&self) -> usize {
        self.columns.len()
    }

    fn column_name(&self, ordinal: usize) -> Result<&str> {
        self.columns
            .get(ordinal)
            .map(String::as_str)
            .ok_or(SqliteError::ColumnOutOfRange(ordinal))
    }

    fn value(&self, ordinal: usize) -> Result<&Value> {
        let row = self
            .current
            .and_then(|i| self.rows.get(i))
            .ok_or(SqliteError::NoCurrentRow)?;
        row.get(ordinal).ok_or(SqliteError::ColumnOutOfRange(ordinal))
    }
}
