//! libSQL backend: `TableStore` over a local file or in-memory database.
//!
//! Queries are built from the column whitelist in [`schema`], so table and
//! column names never come from caller input unchecked.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use libsql::params::Params;
use libsql::{Connection, Database as LibSqlDatabase, Value};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::store::query::{Filter, Order, Query};
use crate::store::schema::{self, TableSchema};
use crate::store::migrations;
use crate::store::traits::{Row, TableStore};

/// libSQL table store over one shared connection.
pub struct LibSqlStore {
    /// Held only so the database outlives `conn`.
    _db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlStore {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StoreError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let store = Self::from_database(db).await?;
        info!(path = %path.display(), "Database opened");
        Ok(store)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, StoreError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| StoreError::Pool(format!("Failed to create in-memory database: {e}")))?;
        Self::from_database(db).await
    }

    async fn from_database(db: LibSqlDatabase) -> Result<Self, StoreError> {
        let conn = db
            .connect()
            .map_err(|e| StoreError::Pool(format!("Failed to create connection: {e}")))?;
        migrations::run_migrations(&conn).await?;
        Ok(Self {
            _db: Arc::new(db),
            conn,
        })
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Run a statement that yields full rows and decode them.
    async fn fetch(
        &self,
        schema: &TableSchema,
        sql: &str,
        params: Vec<Value>,
        op: &str,
    ) -> Result<Vec<Row>, StoreError> {
        let mut rows = self
            .conn()
            .query(sql, Params::Positional(params))
            .await
            .map_err(|e| StoreError::Query(format!("{op} {}: {e}", schema.name)))?;

        let mut out = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| StoreError::Query(format!("{op} {} row: {e}", schema.name)))?
        {
            out.push(decode_row(schema, &row)?);
        }
        Ok(out)
    }
}

// ── SQL building ────────────────────────────────────────────────────

/// Append a WHERE clause for `filters`, pushing bound values onto `params`.
fn where_clause(
    schema: &TableSchema,
    filters: &[Filter],
    params: &mut Vec<Value>,
) -> Result<String, StoreError> {
    if filters.is_empty() {
        return Ok(String::new());
    }
    let mut terms = Vec::with_capacity(filters.len());
    for filter in filters {
        let column = schema.column(filter.column())?;
        let term = match filter {
            Filter::Eq(name, v) if v.is_null() => format!("{name} IS NULL"),
            Filter::Neq(name, v) if v.is_null() => format!("{name} IS NOT NULL"),
            Filter::Eq(name, v) => bind(params, column.encode(v)?, |p| format!("{name} = {p}")),
            Filter::Neq(name, v) => bind(params, column.encode(v)?, |p| format!("{name} <> {p}")),
            Filter::Gte(name, v) => bind(params, column.encode(v)?, |p| format!("{name} >= {p}")),
            Filter::Lte(name, v) => bind(params, column.encode(v)?, |p| format!("{name} <= {p}")),
            Filter::In(_, values) if values.is_empty() => "0".to_string(),
            Filter::In(name, values) => {
                let mut placeholders = Vec::with_capacity(values.len());
                for v in values {
                    params.push(column.encode(v)?);
                    placeholders.push(format!("?{}", params.len()));
                }
                format!("{name} IN ({})", placeholders.join(", "))
            }
        };
        terms.push(term);
    }
    Ok(format!(" WHERE {}", terms.join(" AND ")))
}

fn bind(params: &mut Vec<Value>, value: Value, term: impl FnOnce(String) -> String) -> String {
    params.push(value);
    term(format!("?{}", params.len()))
}

fn order_clause(schema: &TableSchema, order: &[Order]) -> Result<String, StoreError> {
    if order.is_empty() {
        return Ok(String::new());
    }
    let terms = order
        .iter()
        .map(|o| {
            schema.column(&o.column)?;
            Ok(format!(
                "{} {} {}",
                o.column,
                if o.ascending { "ASC" } else { "DESC" },
                if o.nulls_first { "NULLS FIRST" } else { "NULLS LAST" }
            ))
        })
        .collect::<Result<Vec<_>, StoreError>>()?;
    Ok(format!(" ORDER BY {}", terms.join(", ")))
}

fn decode_row(schema: &TableSchema, row: &libsql::Row) -> Result<Row, StoreError> {
    let mut out = Row::new();
    for (i, column) in schema.columns.iter().enumerate() {
        let value = row
            .get_value(i as i32)
            .map_err(|e| StoreError::Query(format!("{}.{}: {e}", schema.name, column.name)))?;
        out.insert(column.name.to_string(), column.decode(value)?);
    }
    Ok(out)
}

// ── Trait implementation ────────────────────────────────────────────

#[async_trait]
impl TableStore for LibSqlStore {
    fn backend(&self) -> &'static str {
        "libsql"
    }

    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Row>, StoreError> {
        let schema = schema::table(table)?;
        let mut params = Vec::new();
        let mut sql = format!("SELECT {} FROM {}", schema.column_list(), schema.name);
        sql.push_str(&where_clause(schema, &query.filters, &mut params)?);
        sql.push_str(&order_clause(schema, &query.order)?);
        if let Some(limit) = query.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        let rows = self.fetch(schema, &sql, params, "select").await?;
        debug!(table, count = rows.len(), "Rows selected");
        Ok(rows)
    }

    async fn insert(&self, table: &str, row: Row) -> Result<Row, StoreError> {
        let schema = schema::table(table)?;
        if row.is_empty() {
            return Err(StoreError::Query(format!("insert {table}: empty row")));
        }

        let mut names = Vec::with_capacity(row.len());
        let mut params = Vec::with_capacity(row.len());
        for (name, value) in &row {
            params.push(schema.column(name)?.encode(value)?);
            names.push(name.as_str());
        }
        let placeholders: Vec<String> = (1..=params.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            schema.name,
            names.join(", "),
            placeholders.join(", "),
            schema.column_list()
        );

        let inserted = self
            .fetch(schema, &sql, params, "insert")
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Query(format!("insert {table}: no row returned")))?;
        debug!(table, id = ?inserted.get("id"), "Row inserted");
        Ok(inserted)
    }

    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        changes: Row,
    ) -> Result<Vec<Row>, StoreError> {
        let schema = schema::table(table)?;
        if filters.is_empty() {
            return Err(StoreError::Query(format!("update {table}: refusing unfiltered update")));
        }
        if changes.is_empty() {
            let query = Query {
                filters: filters.to_vec(),
                ..Query::default()
            };
            return self.select(table, &query).await;
        }

        let mut params = Vec::with_capacity(changes.len() + filters.len());
        let mut sets = Vec::with_capacity(changes.len());
        for (name, value) in &changes {
            params.push(schema.column(name)?.encode(value)?);
            sets.push(format!("{name} = ?{}", params.len()));
        }
        let sql = format!(
            "UPDATE {} SET {}{} RETURNING {}",
            schema.name,
            sets.join(", "),
            where_clause(schema, filters, &mut params)?,
            schema.column_list()
        );

        let rows = self.fetch(schema, &sql, params, "update").await?;
        debug!(table, count = rows.len(), "Rows updated");
        Ok(rows)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<usize, StoreError> {
        let schema = schema::table(table)?;
        if filters.is_empty() {
            return Err(StoreError::Query(format!("delete {table}: refusing unfiltered delete")));
        }
        let mut params = Vec::new();
        let sql = format!(
            "DELETE FROM {}{}",
            schema.name,
            where_clause(schema, filters, &mut params)?
        );

        let affected = self
            .conn()
            .execute(&sql, Params::Positional(params))
            .await
            .map_err(|e| StoreError::Query(format!("delete {table}: {e}")))?;
        debug!(table, affected, "Rows deleted");
        Ok(affected as usize)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    async fn test_store() -> LibSqlStore {
        LibSqlStore::new_memory().await.unwrap()
    }

    fn bill(id: &str, name: &str, due: &str, active: bool) -> Row {
        let value = json!({
            "id": id,
            "user_id": "u1",
            "account_name": name,
            "bill_type": "utility",
            "need_or_want": "need",
            "amount": "42.10",
            "due_date": due,
            "frequency": "monthly",
            "autopay": false,
            "is_active": active,
            "created_at": "2026-10-01T00:00:00Z",
            "updated_at": "2026-10-01T00:00:00Z",
        });
        value.as_object().unwrap().clone()
    }

    #[tokio::test]
    async fn insert_returns_full_typed_row() {
        let store = test_store().await;
        let row = store.insert("bills", bill("b1", "Power", "2026-10-20", true)).await.unwrap();

        assert_eq!(row["account_name"], json!("Power"));
        assert_eq!(row["amount"], json!("42.1"));
        assert_eq!(row["autopay"], json!(false));
        assert_eq!(row["is_active"], json!(true));
        assert_eq!(row["balance"], json!(null));
        assert_eq!(row["created_at"], json!("2026-10-01T00:00:00.000000Z"));
    }

    #[tokio::test]
    async fn select_filters_orders_and_limits() {
        let store = test_store().await;
        store.insert("bills", bill("b1", "Power", "2026-10-20", true)).await.unwrap();
        store.insert("bills", bill("b2", "Water", "2026-10-15", true)).await.unwrap();
        store.insert("bills", bill("b3", "Gym", "2026-10-16", false)).await.unwrap();
        store.insert("bills", bill("b4", "Rent", "2026-11-30", true)).await.unwrap();

        let q = Query::new()
            .eq("user_id", "u1")
            .eq("is_active", true)
            .gte("due_date", "2026-10-14")
            .lte("due_date", "2026-10-28")
            .asc("due_date");
        let rows = store.select("bills", &q).await.unwrap();
        let names: Vec<_> = rows.iter().map(|r| r["account_name"].clone()).collect();
        assert_eq!(names, vec![json!("Water"), json!("Power")]);

        let limited = store.select("bills", &Query::new().asc("due_date").limit(1)).await.unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0]["id"], json!("b2"));
    }

    #[tokio::test]
    async fn in_and_neq_filters() {
        let store = test_store().await;
        store.insert("bills", bill("b1", "Power", "2026-10-20", true)).await.unwrap();
        store.insert("bills", bill("b2", "Water", "2026-10-15", true)).await.unwrap();
        store.insert("bills", bill("b3", "Gym", "2026-10-16", true)).await.unwrap();

        let q = Query::new().in_list("id", ["b1", "b3"]).neq("account_name", "Gym");
        let rows = store.select("bills", &q).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], json!("b1"));

        let none = store
            .select("bills", &Query::new().in_list("id", Vec::<String>::new()))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn nulls_sort_last_ascending() {
        let store = test_store().await;
        for (id, date) in [("j1", None), ("j2", Some("2026-10-20")), ("j3", Some("2026-10-15"))] {
            let row = json!({
                "id": id,
                "user_id": "u1",
                "client_name": id,
                "job_description": "Deck repair",
                "status": "lead",
                "scheduled_date": date,
                "created_at": "2026-10-01T00:00:00Z",
                "updated_at": "2026-10-01T00:00:00Z",
            });
            store.insert("teague_jobs", row.as_object().unwrap().clone()).await.unwrap();
        }
        let rows = store
            .select("teague_jobs", &Query::new().asc("scheduled_date"))
            .await
            .unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r["id"].as_str().unwrap().to_string()).collect();
        assert_eq!(ids, vec!["j3", "j2", "j1"]);
    }

    #[tokio::test]
    async fn update_changes_only_named_columns() {
        let store = test_store().await;
        let before = store.insert("bills", bill("b1", "Power", "2026-10-20", true)).await.unwrap();

        let mut changes = Row::new();
        changes.insert("is_active".into(), json!(false));
        let updated = store
            .update("bills", &[Filter::eq("id", "b1")], changes)
            .await
            .unwrap();

        assert_eq!(updated.len(), 1);
        let after = &updated[0];
        assert_eq!(after["is_active"], json!(false));
        for (key, value) in &before {
            if key != "is_active" {
                assert_eq!(&after[key], value, "{key} changed");
            }
        }
    }

    #[tokio::test]
    async fn delete_reports_affected_rows() {
        let store = test_store().await;
        store.insert("bills", bill("b1", "Power", "2026-10-20", true)).await.unwrap();
        store.insert("bills", bill("b2", "Water", "2026-10-15", true)).await.unwrap();

        assert_eq!(store.delete("bills", &[Filter::eq("id", "b1")]).await.unwrap(), 1);
        assert_eq!(store.delete("bills", &[Filter::eq("id", "b1")]).await.unwrap(), 0);
        assert!(store.delete("bills", &[]).await.is_err());
        assert_eq!(store.select("bills", &Query::new()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_columns_are_rejected() {
        let store = test_store().await;
        let err = store
            .select("bills", &Query::new().eq("due_day_of_month", 5))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownColumn { .. }));

        let err = store.select("cards", &Query::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::UnknownTable(_)));
    }

    #[tokio::test]
    async fn local_file_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("homebase.db");
        {
            let store = LibSqlStore::new_local(&path).await.unwrap();
            store.insert("bills", bill("b1", "Power", "2026-10-20", true)).await.unwrap();
        }
        let store = LibSqlStore::new_local(&path).await.unwrap();
        let rows = store.select("bills", &Query::new()).await.unwrap();
        assert_eq!(rows.len(), 1);
    }
}
