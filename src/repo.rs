//! Typed, session-scoped access to one table.

use std::marker::PhantomData;
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::{Draft, Record};
use crate::session::Session;
use crate::store::schema::format_timestamp;
use crate::store::{Filter, Query, Row, TableStore};

/// Reads and writes `T` rows owned by the session's user.
///
/// Every query and mutation carries a `user_id` filter, so one user can never
/// touch another's rows through a repository.
pub struct Repository<T: Record> {
    store: Arc<dyn TableStore>,
    session: Session,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            session: self.session,
            _record: PhantomData,
        }
    }
}

impl<T: Record> Repository<T> {
    pub fn new(store: Arc<dyn TableStore>, session: Session) -> Self {
        Self {
            store,
            session,
            _record: PhantomData,
        }
    }

    pub fn session(&self) -> Session {
        self.session
    }

    fn owner(&self) -> Filter {
        Filter::eq("user_id", self.session.user_id().to_string())
    }

    fn by_id(&self, id: Uuid) -> [Filter; 2] {
        [Filter::id(id), self.owner()]
    }

    fn not_found(id: Uuid) -> StoreError {
        StoreError::NotFound {
            entity: T::NOUN.to_string(),
            id: id.to_string(),
        }
    }

    /// Rows matching `query`, restricted to the session user.
    pub async fn list(&self, mut query: Query) -> Result<Vec<T>, StoreError> {
        query.filters.insert(0, self.owner());
        self.store
            .select(T::TABLE, &query)
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    pub async fn get(&self, id: Uuid) -> Result<T, StoreError> {
        let query = Query {
            filters: self.by_id(id).to_vec(),
            order: Vec::new(),
            limit: Some(1),
        };
        self.store
            .select(T::TABLE, &query)
            .await?
            .into_iter()
            .next()
            .map(decode)
            .transpose()?
            .ok_or_else(|| Self::not_found(id))
    }

    /// Insert a new record and return it as stored.
    pub async fn insert(&self, record: &T) -> Result<T, StoreError> {
        let row = encode(record)?;
        decode(self.store.insert(T::TABLE, row).await?)
    }

    /// Apply column changes to one record, stamping `updated_at`.
    pub async fn update(&self, id: Uuid, mut changes: Row) -> Result<T, StoreError> {
        changes.insert(
            "updated_at".to_string(),
            Value::String(format_timestamp(Utc::now())),
        );
        self.store
            .update(T::TABLE, &self.by_id(id), changes)
            .await?
            .into_iter()
            .next()
            .map(decode)
            .transpose()?
            .ok_or_else(|| Self::not_found(id))
    }

    /// Replace the editable fields of one record with a draft's values.
    pub async fn update_from<D>(&self, id: Uuid, draft: &D) -> Result<T, StoreError>
    where
        D: Draft<Record = T>,
    {
        let changes = match serde_json::to_value(draft)? {
            Value::Object(map) => map,
            other => {
                return Err(StoreError::Serialization(format!(
                    "draft for {} serialized to {other}",
                    T::NOUN
                )));
            }
        };
        self.update(id, changes).await
    }

    /// Delete one record. Missing rows are `NotFound`.
    pub async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        match self.store.delete(T::TABLE, &self.by_id(id)).await? {
            0 => Err(Self::not_found(id)),
            _ => Ok(()),
        }
    }
}

fn encode<T: Record>(record: &T) -> Result<Row, StoreError> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Serialization(format!(
            "{} serialized to {other}",
            T::NOUN
        ))),
    }
}

fn decode<T: Record>(row: Row) -> Result<T, StoreError> {
    serde_json::from_value(Value::Object(row))
        .map_err(|e| StoreError::Serialization(format!("{} row: {e}", T::NOUN)))
}

/// Column-change set from `(column, value)` pairs.
pub fn changes<I, V>(pairs: I) -> Row
where
    I: IntoIterator<Item = (&'static str, V)>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::model::{Account, AccountDraft, AccountType, Todo, TodoDraft};
    use crate::store::LibSqlStore;

    async fn store() -> Arc<dyn TableStore> {
        Arc::new(LibSqlStore::new_memory().await.unwrap())
    }

    #[tokio::test]
    async fn insert_then_get_round_trips_typed_record() {
        let repo = Repository::<Account>::new(store().await, Session::demo());
        let account = AccountDraft::new("Checking", AccountType::Checking)
            .with_balance(dec!(1520.75))
            .into_record(Session::demo().user_id(), Utc::now())
            .unwrap();

        let stored = repo.insert(&account).await.unwrap();
        assert_eq!(stored.id, account.id);
        assert_eq!(stored.current_balance, dec!(1520.75));

        let fetched = repo.get(account.id).await.unwrap();
        assert_eq!(fetched.account_name, "Checking");
    }

    #[tokio::test]
    async fn other_users_rows_are_invisible() {
        let shared = store().await;
        let mine = Repository::<Todo>::new(Arc::clone(&shared), Session::demo());
        let theirs = Repository::<Todo>::new(shared, Session::new(Uuid::new_v4()));

        let todo = TodoDraft::new("Private")
            .into_record(Session::demo().user_id(), Utc::now())
            .unwrap();
        mine.insert(&todo).await.unwrap();

        assert!(theirs.list(Query::new()).await.unwrap().is_empty());
        assert!(matches!(theirs.get(todo.id).await, Err(StoreError::NotFound { .. })));
        assert!(theirs.delete(todo.id).await.is_err());
        assert_eq!(mine.list(Query::new()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_stamps_updated_at() {
        let repo = Repository::<Todo>::new(store().await, Session::demo());
        let created = Utc::now() - chrono::Duration::days(1);
        let todo = TodoDraft::new("Stamp me")
            .into_record(Session::demo().user_id(), created)
            .unwrap();
        repo.insert(&todo).await.unwrap();

        let updated = repo
            .update(todo.id, changes([("is_active", true)]))
            .await
            .unwrap();
        assert!(updated.is_active);
        assert!(updated.updated_at > todo.updated_at);
        assert_eq!(updated.title, "Stamp me");
    }

    #[tokio::test]
    async fn update_missing_row_is_not_found() {
        let repo = Repository::<Todo>::new(store().await, Session::demo());
        let err = repo
            .update(Uuid::new_v4(), changes([("is_active", true)]))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { ref entity, .. } if entity == "todo"));
    }
}
