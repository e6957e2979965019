use std::cmp::{Ordering, Reverse};
use std::sync::Arc;

use chrono::{Days, NaiveDate};
use serde::Serialize;
use tracing::debug;

use crate::error::StoreError;
use crate::model::{Bill, Job, JobStatus, Todo, TodoStatus};
use crate::repo::Repository;
use crate::session::Session;
use crate::stats::{DashboardStats, dashboard_stats};
use crate::store::{Query, TableStore};

const WEEK_DAYS: u64 = 7;
const UPCOMING_BILL_DAYS: u64 = 14;
const UPCOMING_BILL_LIMIT: usize = 10;

/// Everything the home page shows.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    /// Focused, unfinished todos, most urgent first.
    pub active_todos: Vec<Todo>,
    pub week_todos: Vec<Todo>,
    pub upcoming_bills: Vec<Bill>,
    pub pending_jobs: Vec<Job>,
    pub stats: DashboardStats,
}

pub struct DashboardView {
    todos: Repository<Todo>,
    bills: Repository<Bill>,
    jobs: Repository<Job>,
}

/// High priority first; within a priority, earliest due date first and
/// undated last.
fn by_urgency(a: &Todo, b: &Todo) -> Ordering {
    let key = |t: &Todo| (Reverse(t.priority.rank()), t.due_date.is_none(), t.due_date);
    key(a).cmp(&key(b))
}

impl DashboardView {
    pub fn new(store: Arc<dyn TableStore>, session: Session) -> Self {
        Self {
            todos: Repository::new(Arc::clone(&store), session),
            bills: Repository::new(Arc::clone(&store), session),
            jobs: Repository::new(store, session),
        }
    }

    /// Load all dashboard sections concurrently. Any failed fetch fails the
    /// whole load.
    pub async fn load(&self, today: NaiveDate) -> Result<Dashboard, StoreError> {
        super::roll_forward(&self.bills, "due_date", today).await?;

        let week_end = today + Days::new(WEEK_DAYS);
        let bills_end = today + Days::new(UPCOMING_BILL_DAYS);
        let today_s = today.to_string();
        let open: Vec<&str> = JobStatus::OPEN.iter().map(|s| s.as_str()).collect();

        let active_todos = self.todos.list(
            Query::new()
                .neq("status", TodoStatus::Done.as_str())
                .eq("is_active", true)
                .asc("due_date"),
        );
        let week_todos = self.todos.list(
            Query::new()
                .neq("status", TodoStatus::Done.as_str())
                .gte("due_date", today_s.as_str())
                .lte("due_date", week_end.to_string())
                .asc("due_date"),
        );
        let upcoming_bills = self.bills.list(
            Query::new()
                .eq("is_active", true)
                .gte("due_date", today_s.as_str())
                .lte("due_date", bills_end.to_string())
                .asc("due_date")
                .limit(UPCOMING_BILL_LIMIT),
        );
        let pending_jobs = self.jobs.list(
            Query::new()
                .in_list("status", open)
                .asc("scheduled_date")
                .desc("created_at"),
        );
        let all_bills = self.bills.list(Query::new());
        let all_jobs = self.jobs.list(Query::new());

        let (mut active_todos, week_todos, upcoming_bills, pending_jobs, all_bills, all_jobs) = tokio::try_join!(
            active_todos,
            week_todos,
            upcoming_bills,
            pending_jobs,
            all_bills,
            all_jobs
        )?;
        active_todos.sort_by(by_urgency);

        let stats = dashboard_stats(&active_todos, &all_bills, &all_jobs, today);
        debug!(
            active = active_todos.len(),
            week = week_todos.len(),
            bills = upcoming_bills.len(),
            jobs = pending_jobs.len(),
            "Dashboard loaded"
        );

        Ok(Dashboard {
            active_todos,
            week_todos,
            upcoming_bills,
            pending_jobs,
            stats,
        })
    }
}
