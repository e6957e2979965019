//! Store connectivity check: which backend is live and whether it answers.

use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::config::ConfigStatus;
use crate::error::StoreError;
use crate::model::{Bill, Job, Record, Todo};
use crate::repo::Repository;
use crate::session::Session;
use crate::store::{Query, TableStore};

/// Row count and a sample label from one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSample {
    pub table: &'static str,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Connection {
    Connected { tables: Vec<TableSample> },
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    pub backend: &'static str,
    pub hosted_configured: bool,
    /// Why the hosted store is not in use, when it isn't.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hosted_reason: Option<String>,
    pub connection: Connection,
}

impl Diagnostics {
    pub fn is_healthy(&self) -> bool {
        matches!(self.connection, Connection::Connected { .. })
    }
}

async fn sample<T, F>(repo: Repository<T>, label: F) -> Result<TableSample, StoreError>
where
    T: Record,
    F: Fn(&T) -> String,
{
    let rows = repo.list(Query::new().desc("created_at")).await?;
    Ok(TableSample {
        table: T::TABLE,
        count: rows.len(),
        first: rows.first().map(label),
    })
}

/// Probe the store with the session's todos, bills and jobs in parallel.
pub async fn run(
    store: Arc<dyn TableStore>,
    session: Session,
    status: &ConfigStatus,
) -> Diagnostics {
    let backend = store.backend();
    let todos = Repository::<Todo>::new(Arc::clone(&store), session);
    let bills = Repository::<Bill>::new(Arc::clone(&store), session);
    let jobs = Repository::<Job>::new(store, session);

    let probe = tokio::try_join!(
        sample(todos, |t| t.title.clone()),
        sample(bills, |b| b.account_name.clone()),
        sample(jobs, |j| j.client_name.clone()),
    );

    let connection = match probe {
        Ok((todos, bills, jobs)) => Connection::Connected {
            tables: vec![todos, bills, jobs],
        },
        Err(e) => {
            warn!(backend, error = %e, "Store diagnostics failed");
            Connection::Failed {
                message: e.to_string(),
            }
        }
    };

    let hosted_reason = match status {
        ConfigStatus::Configured => None,
        ConfigStatus::NotConfigured { reason } => Some(format!(
            "Please set up hosted store credentials: {reason}"
        )),
    };

    Diagnostics {
        backend,
        hosted_configured: status.is_configured(),
        hosted_reason,
        connection,
    }
}
