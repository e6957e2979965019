//! Hosted table store spoken over the PostgREST dialect.
//!
//! Requests go to `{url}/rest/v1/{table}` with filters as query parameters
//! (`col=eq.value`, `col=in.(a,b)`, `order=col.asc.nullslast`, `limit=n`).

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::debug;

use crate::config::RestStoreConfig;
use crate::error::StoreError;
use crate::store::query::{Filter, Order, Query};
use crate::store::schema;
use crate::store::traits::{Row, TableStore};

/// PostgREST-backed table store.
pub struct RestStore {
    base_url: String,
    api_key: SecretString,
    client: reqwest::Client,
}

impl RestStore {
    pub fn new(config: &RestStoreConfig) -> Self {
        Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            client: reqwest::Client::new(),
        }
    }

    /// Use a preconfigured HTTP client (timeouts, proxies).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        let key = self.api_key.expose_secret();
        self.client
            .request(method, self.table_url(table))
            .header("apikey", key)
            .bearer_auth(key)
            .header("Prefer", "return=representation")
    }

    async fn rows(&self, table: &str, op: &str, request: RequestBuilder) -> Result<Vec<Row>, StoreError> {
        let resp = request.send().await?;
        let resp = check_status(resp).await?;
        let body: Value = resp.json().await?;
        let rows = match body {
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Object(row) => Ok(row),
                    other => Err(StoreError::Serialization(format!(
                        "{op} {table}: expected row object, got {other}"
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()?,
            Value::Object(row) => vec![row],
            other => {
                return Err(StoreError::Serialization(format!(
                    "{op} {table}: expected row array, got {other}"
                )));
            }
        };
        debug!(table, op, count = rows.len(), "REST rows returned");
        Ok(rows)
    }
}

/// Turn a non-2xx response into `StoreError::Rejected`, keeping PostgREST's message.
async fn check_status(resp: Response) -> Result<Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or(text);
    Err(StoreError::Rejected {
        status: status.as_u16(),
        message,
    })
}

// ── Query encoding ──────────────────────────────────────────────────

/// Render a scalar as PostgREST filter text.
fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// Values inside `in.(...)` are quoted when they contain reserved characters.
fn list_item(value: &Value) -> String {
    let raw = scalar(value);
    if raw.contains([',', '(', ')', '"', ' ']) {
        format!("\"{}\"", raw.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        raw
    }
}

fn filter_param(filter: &Filter) -> (String, String) {
    let value = match filter {
        Filter::Eq(_, v) if v.is_null() => "is.null".to_string(),
        Filter::Neq(_, v) if v.is_null() => "not.is.null".to_string(),
        Filter::Eq(_, v) => format!("eq.{}", scalar(v)),
        Filter::Neq(_, v) => format!("neq.{}", scalar(v)),
        Filter::Gte(_, v) => format!("gte.{}", scalar(v)),
        Filter::Lte(_, v) => format!("lte.{}", scalar(v)),
        Filter::In(_, values) => format!(
            "in.({})",
            values.iter().map(list_item).collect::<Vec<_>>().join(",")
        ),
    };
    (filter.column().to_string(), value)
}

fn order_param(order: &[Order]) -> Option<(String, String)> {
    if order.is_empty() {
        return None;
    }
    let terms = order
        .iter()
        .map(|o| {
            format!(
                "{}.{}.{}",
                o.column,
                if o.ascending { "asc" } else { "desc" },
                if o.nulls_first { "nullsfirst" } else { "nullslast" }
            )
        })
        .collect::<Vec<_>>()
        .join(",");
    Some(("order".to_string(), terms))
}

/// Full query-string pairs for a select, validated against the column whitelist.
pub fn encode_query(table: &str, query: &Query) -> Result<Vec<(String, String)>, StoreError> {
    let schema = schema::table(table)?;
    let mut pairs = vec![("select".to_string(), "*".to_string())];
    for filter in &query.filters {
        schema.column(filter.column())?;
        pairs.push(filter_param(filter));
    }
    for o in &query.order {
        schema.column(&o.column)?;
    }
    pairs.extend(order_param(&query.order));
    if let Some(limit) = query.limit {
        pairs.push(("limit".to_string(), limit.to_string()));
    }
    Ok(pairs)
}

fn encode_filters(table: &str, filters: &[Filter]) -> Result<Vec<(String, String)>, StoreError> {
    let schema = schema::table(table)?;
    if filters.is_empty() {
        return Err(StoreError::Query(format!("{table}: refusing unfiltered mutation")));
    }
    filters
        .iter()
        .map(|f| {
            schema.column(f.column())?;
            Ok(filter_param(f))
        })
        .collect()
}

fn check_columns(table: &str, row: &Row) -> Result<(), StoreError> {
    let schema = schema::table(table)?;
    for name in row.keys() {
        schema.column(name)?;
    }
    Ok(())
}

// ── Trait implementation ────────────────────────────────────────────

#[async_trait]
impl TableStore for RestStore {
    fn backend(&self) -> &'static str {
        "rest"
    }

    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Row>, StoreError> {
        let pairs = encode_query(table, query)?;
        self.rows(table, "select", self.request(Method::GET, table).query(&pairs))
            .await
    }

    async fn insert(&self, table: &str, row: Row) -> Result<Row, StoreError> {
        check_columns(table, &row)?;
        let request = self.request(Method::POST, table).json(&row);
        self.rows(table, "insert", request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Query(format!("insert {table}: no row returned")))
    }

    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        changes: Row,
    ) -> Result<Vec<Row>, StoreError> {
        let pairs = encode_filters(table, filters)?;
        check_columns(table, &changes)?;
        let request = self
            .request(Method::PATCH, table)
            .query(&pairs)
            .json(&changes);
        self.rows(table, "update", request).await
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<usize, StoreError> {
        let pairs = encode_filters(table, filters)?;
        let request = self.request(Method::DELETE, table).query(&pairs);
        Ok(self.rows(table, "delete", request).await?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(table: &str, q: &Query) -> Vec<(String, String)> {
        encode_query(table, q).unwrap()
    }

    fn pair(k: &str, v: &str) -> (String, String) {
        (k.to_string(), v.to_string())
    }

    #[test]
    fn dashboard_jobs_query_encoding() {
        let q = Query::new()
            .eq("user_id", "u1")
            .in_list("status", ["lead", "quoted", "scheduled", "in_progress"])
            .asc("scheduled_date")
            .desc("created_at");
        assert_eq!(
            pairs("teague_jobs", &q),
            vec![
                pair("select", "*"),
                pair("user_id", "eq.u1"),
                pair("status", "in.(lead,quoted,scheduled,in_progress)"),
                pair("order", "scheduled_date.asc.nullslast,created_at.desc.nullsfirst"),
            ]
        );
    }

    #[test]
    fn scalars_booleans_and_limits() {
        let q = Query::new()
            .eq("is_active", true)
            .neq("status", "done")
            .gte("due_date", "2026-10-14")
            .lte("due_date", "2026-10-21")
            .eq("description", Value::Null)
            .limit(10);
        let encoded = pairs("todos", &q);
        assert!(encoded.contains(&pair("is_active", "eq.true")));
        assert!(encoded.contains(&pair("status", "neq.done")));
        assert!(encoded.contains(&pair("due_date", "gte.2026-10-14")));
        assert!(encoded.contains(&pair("due_date", "lte.2026-10-21")));
        assert!(encoded.contains(&pair("description", "is.null")));
        assert_eq!(encoded.last(), Some(&pair("limit", "10")));
    }

    #[test]
    fn list_items_with_commas_are_quoted() {
        let q = Query::new().in_list("account_name", ["Smith, J", "Plain"]);
        assert!(pairs("bills", &q).contains(&pair("account_name", "in.(\"Smith, J\",Plain)")));
    }

    #[test]
    fn whitelist_applies_to_rest_queries() {
        assert!(matches!(
            encode_query("bills", &Query::new().eq("due_day_of_month", 3)),
            Err(StoreError::UnknownColumn { .. })
        ));
        assert!(matches!(
            encode_query("users", &Query::new()),
            Err(StoreError::UnknownTable(_))
        ));
        assert!(encode_filters("bills", &[]).is_err());
    }
}
