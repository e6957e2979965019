//! Business job tracking model.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Draft, Record, clean, require_text, trim};
use crate::error::ValidationError;

/// Pipeline stage of a job. `Completed` and `Lost` are closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Lead,
    Quoted,
    Scheduled,
    InProgress,
    Completed,
    Lost,
}

impl JobStatus {
    pub const ALL: [JobStatus; 6] = [
        JobStatus::Lead,
        JobStatus::Quoted,
        JobStatus::Scheduled,
        JobStatus::InProgress,
        JobStatus::Completed,
        JobStatus::Lost,
    ];

    pub const OPEN: [JobStatus; 4] = [
        JobStatus::Lead,
        JobStatus::Quoted,
        JobStatus::Scheduled,
        JobStatus::InProgress,
    ];

    /// Stages whose quotes count toward pipeline value.
    pub const PIPELINE: [JobStatus; 3] =
        [JobStatus::Quoted, JobStatus::Scheduled, JobStatus::InProgress];

    pub fn is_open(self) -> bool {
        !matches!(self, JobStatus::Completed | JobStatus::Lost)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Lead => "lead",
            JobStatus::Quoted => "quoted",
            JobStatus::Scheduled => "scheduled",
            JobStatus::InProgress => "in_progress",
            JobStatus::Completed => "completed",
            JobStatus::Lost => "lost",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            JobStatus::Lead => "Lead",
            JobStatus::Quoted => "Quoted",
            JobStatus::Scheduled => "Scheduled",
            JobStatus::InProgress => "In Progress",
            JobStatus::Completed => "Completed",
            JobStatus::Lost => "Lost",
        }
    }
}

/// A client job (table `teague_jobs`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub user_id: Uuid,
    pub client_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_email: Option<String>,
    pub job_description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concerns: Option<String>,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Job {
    const TABLE: &'static str = "teague_jobs";
    const NOUN: &'static str = "job";

    fn id(&self) -> Uuid {
        self.id
    }
}

/// Fields entered on the job form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobDraft {
    pub client_name: String,
    #[serde(default)]
    pub client_phone: Option<String>,
    #[serde(default)]
    pub client_email: Option<String>,
    pub job_description: String,
    #[serde(default)]
    pub quote_amount: Option<Decimal>,
    #[serde(default)]
    pub concerns: Option<String>,
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default)]
    pub scheduled_date: Option<NaiveDate>,
}

impl JobDraft {
    pub fn new(client_name: impl Into<String>, job_description: impl Into<String>) -> Self {
        Self {
            client_name: client_name.into(),
            job_description: job_description.into(),
            ..Self::default()
        }
    }

    pub fn with_quote(mut self, amount: Decimal) -> Self {
        self.quote_amount = Some(amount);
        self
    }

    pub fn with_status(mut self, status: JobStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_scheduled_date(mut self, date: NaiveDate) -> Self {
        self.scheduled_date = Some(date);
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.client_email = Some(email.into());
        self
    }
}

impl Draft for JobDraft {
    type Record = Job;

    fn normalize(self) -> Self {
        Self {
            client_name: trim(self.client_name),
            client_phone: clean(self.client_phone),
            client_email: clean(self.client_email),
            job_description: trim(self.job_description),
            concerns: clean(self.concerns),
            ..self
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("client_name", &self.client_name, "Please enter a client name")?;
        require_text(
            "job_description",
            &self.job_description,
            "Please enter a job description",
        )?;
        if let Some(email) = &self.client_email {
            if !email.contains('@') {
                return Err(ValidationError::new("client_email", "Please enter a valid email"));
            }
        }
        if let Some(quote) = self.quote_amount {
            if quote < Decimal::ZERO {
                return Err(ValidationError::new("quote_amount", "Please enter a valid amount"));
            }
        }
        Ok(())
    }

    fn into_record(self, user_id: Uuid, now: DateTime<Utc>) -> Result<Job, ValidationError> {
        self.validate()?;
        Ok(Job {
            id: Uuid::new_v4(),
            user_id,
            client_name: self.client_name,
            client_phone: self.client_phone,
            client_email: self.client_email,
            job_description: self.job_description,
            quote_amount: self.quote_amount,
            concerns: self.concerns,
            status: self.status,
            scheduled_date: self.scheduled_date,
            created_at: now,
            updated_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_and_closed_statuses() {
        let open: Vec<_> = JobStatus::ALL.into_iter().filter(|s| s.is_open()).collect();
        assert_eq!(open, JobStatus::OPEN.to_vec());
        assert!(!JobStatus::Completed.is_open());
        assert!(!JobStatus::Lost.is_open());
        assert!(JobStatus::PIPELINE.iter().all(|s| s.is_open()));
    }

    #[test]
    fn job_validation() {
        assert_eq!(
            JobDraft::new(" ", "Fence").validate().unwrap_err().message,
            "Please enter a client name"
        );
        assert_eq!(
            JobDraft::new("Dana", "").validate().unwrap_err().field,
            "job_description"
        );
        let bad_email = JobDraft::new("Dana", "Fence").with_email("dana.example.com");
        assert_eq!(bad_email.validate().unwrap_err().field, "client_email");
        assert!(JobDraft::new("Dana", "Fence").with_email("dana@example.com").validate().is_ok());
    }

    #[test]
    fn status_wire_form() {
        assert_eq!(serde_json::to_string(&JobStatus::InProgress).unwrap(), "\"in_progress\"");
        for status in JobStatus::ALL {
            assert_eq!(
                serde_json::to_value(status).unwrap(),
                serde_json::Value::String(status.as_str().into())
            );
        }
    }
}
