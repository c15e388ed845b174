use chrono::{DateTime, Timelike, Utc};
use rusqlite::ToSql;
use rusqlite::types::{ToSqlOutput, Value, ValueRef};

use crate::schema::DatasetSchema;

/// A single typed value as returned by the warehouse.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Python-style truthiness: null, zero, `false` and empty text are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Cell::Null => false,
            Cell::Integer(value) => *value != 0,
            Cell::Float(value) => *value != 0.0,
            Cell::Text(value) => !value.is_empty(),
            Cell::Boolean(value) => *value,
            Cell::Timestamp(_) => true,
        }
    }

    /// Textual rendering used for identifier-like columns.
    pub fn render(&self) -> Option<String> {
        match self {
            Cell::Null => None,
            Cell::Integer(value) => Some(value.to_string()),
            Cell::Float(value) => Some(render_float(*value)),
            Cell::Text(value) => Some(value.clone()),
            Cell::Boolean(true) => Some("True".to_string()),
            Cell::Boolean(false) => Some("False".to_string()),
            Cell::Timestamp(value) => Some(render_timestamp(value)),
        }
    }
}

fn render_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

/// `2025-01-06 00:15:00+00:00`, with microseconds only when present.
pub fn render_timestamp(value: &DateTime<Utc>) -> String {
    if value.nanosecond() == 0 {
        value.format("%Y-%m-%d %H:%M:%S%:z").to_string()
    } else {
        value.format("%Y-%m-%d %H:%M:%S%.6f%:z").to_string()
    }
}

/// A value as written to the local store.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(value) => Some(value),
            _ => None,
        }
    }
}

impl ToSql for FieldValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            FieldValue::Null => ToSqlOutput::Owned(Value::Null),
            FieldValue::Integer(value) => ToSqlOutput::Owned(Value::Integer(*value)),
            FieldValue::Real(value) => ToSqlOutput::Owned(Value::Real(*value)),
            FieldValue::Text(value) => ToSqlOutput::Borrowed(ValueRef::Text(value.as_bytes())),
        })
    }
}

/// One flat record; `values` follows the column order of its dataset schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    schema: &'static DatasetSchema,
    values: Vec<FieldValue>,
}

impl Record {
    pub fn new(schema: &'static DatasetSchema, values: Vec<FieldValue>) -> Self {
        Self { schema, values }
    }

    pub fn schema(&self) -> &'static DatasetSchema {
        self.schema
    }

    pub fn values(&self) -> &[FieldValue] {
        &self.values
    }

    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.schema
            .column_index(column)
            .and_then(|idx| self.values.get(idx))
    }
}
