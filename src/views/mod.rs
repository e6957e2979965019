//! Per-page data access: what each screen loads and the mutations it offers.
//!
//! A view owns typed repositories for the session user. Listing returns a
//! [`Collection`](crate::collection::Collection) that the mutation methods
//! then keep in step with the store.

pub mod accounts;
pub mod bills;
pub mod dashboard;
pub mod income;
pub mod jobs;
pub mod todos;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::model::Record;
use crate::recurrence::Recurring;
use crate::repo::{Repository, changes};
use crate::store::Query;

pub use accounts::AccountsView;
pub use bills::BillsView;
pub use dashboard::{Dashboard, DashboardView};
pub use income::{IncomeList, IncomeView};
pub use jobs::JobsView;
pub use todos::TodosView;

/// Persist the effective date of every lapsed recurring record.
///
/// `column` is the record's date column. Returns how many rows were moved.
/// A row whose write fails keeps its stored date and is retried on the next
/// call.
pub(crate) async fn roll_forward<T>(
    repo: &Repository<T>,
    column: &'static str,
    today: NaiveDate,
) -> Result<usize, StoreError>
where
    T: Record + Recurring,
{
    let records = repo.list(Query::new()).await?;
    let mut moved = 0;

    for record in records.iter().filter(|r| r.is_lapsed(today)) {
        let next = match record.effective_date(today) {
            Ok(next) => next,
            Err(e) => {
                warn!(table = T::TABLE, id = %record.id(), error = %e, "Cannot advance date");
                continue;
            }
        };
        match repo.update(record.id(), changes([(column, next.to_string())])).await {
            Ok(_) => {
                debug!(table = T::TABLE, id = %record.id(), from = %record.anchor(), to = %next, "Rolled forward");
                moved += 1;
            }
            Err(e) => {
                warn!(table = T::TABLE, id = %record.id(), error = %e, "Failed to roll date forward");
            }
        }
    }

    if moved > 0 {
        info!(table = T::TABLE, moved, "Advanced lapsed recurring dates");
    }
    Ok(moved)
}
