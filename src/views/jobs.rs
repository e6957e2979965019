use std::sync::Arc;

use uuid::Uuid;

use crate::collection::{Collection, Confirmation, Outcome};
use crate::error::StoreError;
use crate::model::{Job, JobDraft, JobStatus};
use crate::repo::{Repository, changes};
use crate::session::Session;
use crate::store::{Query, TableStore};

pub struct JobsView {
    jobs: Repository<Job>,
}

impl JobsView {
    pub fn new(store: Arc<dyn TableStore>, session: Session) -> Self {
        Self {
            jobs: Repository::new(store, session),
        }
    }

    /// Newest first.
    pub async fn list(&self) -> Result<Collection<Job>, StoreError> {
        let jobs = self.jobs.list(Query::new().desc("created_at")).await?;
        Ok(Collection::new(jobs))
    }

    pub async fn create(&self, jobs: &mut Collection<Job>, draft: JobDraft) -> Outcome<Job> {
        jobs.create(&self.jobs, draft, "Job added!").await
    }

    pub async fn update(&self, jobs: &mut Collection<Job>, id: Uuid, draft: JobDraft) -> Outcome<Job> {
        jobs.edit(&self.jobs, id, draft, "Job updated!").await
    }

    /// Move a job to another pipeline stage.
    pub async fn update_status(
        &self,
        jobs: &mut Collection<Job>,
        id: Uuid,
        status: JobStatus,
    ) -> Outcome<Job> {
        let success = format!("Job marked {}.", status.label());
        jobs.patch(
            &self.jobs,
            id,
            changes([("status", status.as_str())]),
            "update",
            &success,
        )
        .await
    }

    pub async fn delete(
        &self,
        jobs: &mut Collection<Job>,
        id: Uuid,
        confirmation: Confirmation,
    ) -> Outcome<Job> {
        jobs.delete(&self.jobs, id, confirmation, "Job deleted!").await
    }
}
