//! Todo data model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Draft, Record, clean, require_text, trim};
use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    /// Sort key; higher is more urgent.
    pub fn rank(self) -> u8 {
        match self {
            Priority::Low => 0,
            Priority::Medium => 1,
            Priority::High => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

/// Current lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl TodoStatus {
    pub const ALL: [TodoStatus; 3] = [TodoStatus::Todo, TodoStatus::InProgress, TodoStatus::Done];

    pub fn as_str(self) -> &'static str {
        match self {
            TodoStatus::Todo => "todo",
            TodoStatus::InProgress => "in_progress",
            TodoStatus::Done => "done",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TodoStatus::Todo => "To do",
            TodoStatus::InProgress => "In progress",
            TodoStatus::Done => "Done",
        }
    }
}

/// A single to-do item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub priority: Priority,
    pub status: TodoStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    /// Marked as part of today's focus.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Todo {
    pub fn is_done(&self) -> bool {
        self.status == TodoStatus::Done
    }
}

impl Record for Todo {
    const TABLE: &'static str = "todos";
    const NOUN: &'static str = "todo";

    fn id(&self) -> Uuid {
        self.id
    }
}

/// Fields entered on the todo form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TodoDraft {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

impl TodoDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_due_date(mut self, due: NaiveDate) -> Self {
        self.due_date = Some(due);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

impl Draft for TodoDraft {
    type Record = Todo;

    fn normalize(self) -> Self {
        Self {
            title: trim(self.title),
            description: clean(self.description),
            category: clean(self.category),
            ..self
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title, "Please enter a title")
    }

    fn into_record(self, user_id: Uuid, now: DateTime<Utc>) -> Result<Todo, ValidationError> {
        self.validate()?;
        Ok(Todo {
            id: Uuid::new_v4(),
            user_id,
            title: self.title,
            description: self.description,
            category: self.category,
            priority: self.priority,
            status: TodoStatus::Todo,
            due_date: self.due_date,
            is_active: false,
            created_at: now,
            updated_at: now,
        })
    }
}
