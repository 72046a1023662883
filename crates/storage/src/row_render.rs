//! Rendering of executed rows into JSON objects.
//!
//! Rows come from the simple query protocol, so every non-null value is
//! available as text and is converted by its column type.

use dbsage_core::Row;
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{Column, Row as _, TypeInfo};

use crate::error::StorageError;

/// Render a text-format row keyed by column name.
///
/// A later column with a duplicate name replaces the earlier one.
pub(crate) fn render_row(row: &PgRow) -> Result<Row, StorageError> {
    let mut out = Row::new();
    for (index, column) in row.columns().iter().enumerate() {
        let raw: Option<String> = row.try_get_unchecked(index)?;
        let value = match raw {
            Some(text) => render_text(column.type_info().name(), text),
            None => Value::Null,
        };
        out.insert(column.name().to_owned(), value);
    }
    Ok(out)
}

/// Convert one text-format value by its PostgreSQL type name.
///
/// `NUMERIC` stays a string to keep its precision.
pub(crate) fn render_text(type_name: &str, text: String) -> Value {
    match type_name {
        "BOOL" => match text.as_str() {
            "t" => Value::Bool(true),
            "f" => Value::Bool(false),
            _ => Value::String(text),
        },
        "INT2" | "INT4" | "INT8" | "OID" => match text.parse::<i64>() {
            Ok(n) => Value::from(n),
            Err(_) => Value::String(text),
        },
        "FLOAT4" | "FLOAT8" => {
            match text.parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
                Some(n) => Value::Number(n),
                None => Value::String(text),
            }
        },
        "JSON" | "JSONB" => serde_json::from_str(&text).unwrap_or(Value::String(text)),
        _ => Value::String(text),
    }
}
