//! Per-table column whitelist and value codecs for the libSQL backend.
//!
//! Rows travel through the crate as JSON objects. SQLite has no boolean or
//! decimal type, so each column declares how its JSON value is stored and
//! read back.

use chrono::{DateTime, SecondsFormat, Utc};
use libsql::Value;
use rust_decimal::Decimal;
use serde_json::Value as Json;

use crate::error::StoreError;
use crate::recurrence::parse_date;

use ColumnKind::{Bool, Date, Decimal as Dec, Text, Timestamp};

/// Storage representation of one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    /// Stored as 0 / 1.
    Bool,
    /// Stored as canonical decimal text.
    Decimal,
    /// Stored as `YYYY-MM-DD`.
    Date,
    /// Stored as fixed-width RFC 3339 UTC, so text order is time order.
    Timestamp,
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
}

const fn col(name: &'static str, kind: ColumnKind) -> Column {
    Column { name, kind }
}

#[derive(Debug)]
pub struct TableSchema {
    pub name: &'static str,
    pub columns: &'static [Column],
}

static TODOS: TableSchema = TableSchema {
    name: "todos",
    columns: &[
        col("id", Text),
        col("user_id", Text),
        col("title", Text),
        col("description", Text),
        col("category", Text),
        col("priority", Text),
        col("status", Text),
        col("due_date", Date),
        col("is_active", Bool),
        col("created_at", Timestamp),
        col("updated_at", Timestamp),
    ],
};

static BILLS: TableSchema = TableSchema {
    name: "bills",
    columns: &[
        col("id", Text),
        col("user_id", Text),
        col("account_name", Text),
        col("bill_type", Text),
        col("need_or_want", Text),
        col("amount", Dec),
        col("balance", Dec),
        col("due_date", Date),
        col("frequency", Text),
        col("autopay", Bool),
        col("interest_rate", Dec),
        col("is_active", Bool),
        col("notes", Text),
        col("account_id", Text),
        col("created_at", Timestamp),
        col("updated_at", Timestamp),
    ],
};

static INCOME: TableSchema = TableSchema {
    name: "income",
    columns: &[
        col("id", Text),
        col("user_id", Text),
        col("source_name", Text),
        col("amount", Dec),
        col("frequency", Text),
        col("next_date", Date),
        col("account_id", Text),
        col("notes", Text),
        col("is_active", Bool),
        col("created_at", Timestamp),
        col("updated_at", Timestamp),
    ],
};

static ACCOUNTS: TableSchema = TableSchema {
    name: "accounts",
    columns: &[
        col("id", Text),
        col("user_id", Text),
        col("account_name", Text),
        col("account_type", Text),
        col("current_balance", Dec),
        col("institution_name", Text),
        col("account_number_last4", Text),
        col("notes", Text),
        col("is_active", Bool),
        col("created_at", Timestamp),
        col("updated_at", Timestamp),
    ],
};

static JOBS: TableSchema = TableSchema {
    name: "teague_jobs",
    columns: &[
        col("id", Text),
        col("user_id", Text),
        col("client_name", Text),
        col("client_phone", Text),
        col("client_email", Text),
        col("job_description", Text),
        col("quote_amount", Dec),
        col("concerns", Text),
        col("status", Text),
        col("scheduled_date", Date),
        col("created_at", Timestamp),
        col("updated_at", Timestamp),
    ],
};

static TABLES: &[&TableSchema] = &[&TODOS, &BILLS, &INCOME, &ACCOUNTS, &JOBS];

/// Look up a table by name.
pub fn table(name: &str) -> Result<&'static TableSchema, StoreError> {
    TABLES
        .iter()
        .copied()
        .find(|t| t.name == name)
        .ok_or_else(|| StoreError::UnknownTable(name.to_string()))
}

impl TableSchema {
    pub fn column(&self, name: &str) -> Result<&Column, StoreError> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| StoreError::UnknownColumn {
                table: self.name.to_string(),
                column: name.to_string(),
            })
    }

    /// Comma-separated column list for SELECT / RETURNING.
    pub fn column_list(&self) -> String {
        self.columns
            .iter()
            .map(|c| c.name)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Column {
    /// Convert a JSON value into its stored form.
    pub fn encode(&self, value: &Json) -> Result<Value, StoreError> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        let bad = || {
            StoreError::Serialization(format!(
                "column {} ({:?}) cannot store {value}",
                self.name, self.kind
            ))
        };
        match self.kind {
            ColumnKind::Text => value.as_str().map(|s| Value::Text(s.to_string())).ok_or_else(bad),
            ColumnKind::Bool => match value {
                Json::Bool(b) => Ok(Value::Integer(i64::from(*b))),
                Json::Number(n) => n.as_i64().map(|i| Value::Integer(i64::from(i != 0))).ok_or_else(bad),
                _ => Err(bad()),
            },
            ColumnKind::Decimal => {
                let parsed = match value {
                    Json::String(s) => s.trim().parse::<Decimal>().ok(),
                    Json::Number(n) => n.to_string().parse::<Decimal>().ok(),
                    _ => None,
                };
                parsed
                    .map(|d| Value::Text(d.normalize().to_string()))
                    .ok_or_else(bad)
            }
            ColumnKind::Date => value
                .as_str()
                .and_then(|s| parse_date(s).ok())
                .map(|d| Value::Text(d.to_string()))
                .ok_or_else(bad),
            ColumnKind::Timestamp => value
                .as_str()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| Value::Text(format_timestamp(dt.with_timezone(&Utc))))
                .ok_or_else(bad),
        }
    }

    /// Convert a stored value back into JSON.
    pub fn decode(&self, value: Value) -> Result<Json, StoreError> {
        let bad = |v: &Value| {
            StoreError::Serialization(format!(
                "column {} ({:?}) holds unexpected value {v:?}",
                self.name, self.kind
            ))
        };
        match (self.kind, value) {
            (_, Value::Null) => Ok(Json::Null),
            (ColumnKind::Bool, Value::Integer(i)) => Ok(Json::Bool(i != 0)),
            (ColumnKind::Decimal, Value::Text(s)) => Ok(Json::String(s)),
            (ColumnKind::Decimal, Value::Integer(i)) => Ok(Json::String(i.to_string())),
            (ColumnKind::Decimal, Value::Real(f)) => Ok(Json::String(f.to_string())),
            (ColumnKind::Text | ColumnKind::Date | ColumnKind::Timestamp, Value::Text(s)) => {
                Ok(Json::String(s))
            }
            (_, other) => Err(bad(&other)),
        }
    }
}

/// Canonical timestamp text: microsecond precision, `Z` suffix.
pub fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn unknown_tables_and_columns_are_rejected() {
        assert!(matches!(table("cards"), Err(StoreError::UnknownTable(_))));
        let bills = table("bills").unwrap();
        assert!(bills.column("due_date").is_ok());
        assert!(matches!(
            bills.column("due_day_of_month"),
            Err(StoreError::UnknownColumn { .. })
        ));
    }

    #[test]
    fn booleans_are_stored_as_integers() {
        let bills = table("bills").unwrap();
        let autopay = bills.column("autopay").unwrap();
        assert_eq!(autopay.encode(&json!(true)).unwrap(), Value::Integer(1));
        assert_eq!(autopay.decode(Value::Integer(0)).unwrap(), json!(false));
    }

    #[test]
    fn decimals_keep_exact_text() {
        let amount = table("bills").unwrap().column("amount").unwrap();
        assert_eq!(
            amount.encode(&json!("120.50")).unwrap(),
            Value::Text("120.5".to_string())
        );
        assert_eq!(
            amount.encode(&json!(19.99)).unwrap(),
            Value::Text("19.99".to_string())
        );
        assert!(amount.encode(&json!("lots")).is_err());
        assert_eq!(amount.decode(Value::Text("19.99".into())).unwrap(), json!("19.99"));
    }

    #[test]
    fn timestamps_are_normalized() {
        let created = table("todos").unwrap().column("created_at").unwrap();
        assert_eq!(
            created.encode(&json!("2026-10-14T08:00:00-04:00")).unwrap(),
            Value::Text("2026-10-14T12:00:00.000000Z".to_string())
        );
    }

    #[test]
    fn dates_are_validated() {
        let due = table("todos").unwrap().column("due_date").unwrap();
        assert_eq!(
            due.encode(&json!("2026-10-14")).unwrap(),
            Value::Text("2026-10-14".to_string())
        );
        assert!(due.encode(&json!("soon")).is_err());
        assert_eq!(due.encode(&Json::Null).unwrap(), Value::Null);
    }
}
