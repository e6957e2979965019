//! `TableStore` trait: the row-oriented table operations every backend offers.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::store::query::{Filter, Query};

/// A row as a JSON object keyed by column name.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Backend-agnostic table store.
///
/// Each call targets one table. Mutations return the affected rows so callers
/// can update local state without a second round trip.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Short backend name for logs and diagnostics.
    fn backend(&self) -> &'static str;

    /// Rows matching every filter, in the requested order.
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Row>, StoreError>;

    /// Insert one row and return it as stored.
    async fn insert(&self, table: &str, row: Row) -> Result<Row, StoreError>;

    /// Apply `changes` to every row matching `filters`; returns the updated rows.
    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        changes: Row,
    ) -> Result<Vec<Row>, StoreError>;

    /// Delete every row matching `filters`; returns how many were removed.
    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<usize, StoreError>;
}
