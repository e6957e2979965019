//! In-memory list state and the shared create / update / delete flow.
//!
//! A view loads a [`Collection`] and mutates it through a [`Repository`].
//! Local state only changes after the store accepts the write, and every
//! mutation reports a [`Notice`] for the user.

use std::cmp::Ordering;
use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::model::{Draft, Record};
use crate::repo::Repository;
use crate::store::Row;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Error,
    Warning,
    Info,
}

/// A user-visible message about the outcome of an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    /// The generic store-failure message, e.g. "Failed to add bill. Please try again."
    pub fn failed(verb: &str, noun: &str) -> Self {
        Self::error(format!("Failed to {verb} {noun}. Please try again."))
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Explicit answer to "are you sure?" before a destructive delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
}

impl From<bool> for Confirmation {
    fn from(confirmed: bool) -> Self {
        if confirmed {
            Confirmation::Confirmed
        } else {
            Confirmation::Declined
        }
    }
}

/// Result of one mutation: the notice to show and the affected record, if any.
#[derive(Debug, Clone)]
pub struct Outcome<T> {
    pub notice: Notice,
    pub record: Option<T>,
}

impl<T> Outcome<T> {
    fn done(notice: Notice, record: Option<T>) -> Self {
        Self { notice, record }
    }

    pub(crate) fn rejected(notice: Notice) -> Self {
        Self {
            notice,
            record: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.notice.level == NoticeLevel::Success
    }
}

type SortFn<T> = fn(&T, &T) -> Ordering;

/// The list a view works against.
#[derive(Debug, Clone)]
pub struct Collection<T: Record> {
    items: Vec<T>,
    sort: Option<SortFn<T>>,
}

impl<T: Record> Collection<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items, sort: None }
    }

    /// Keep the list ordered by `sort` after every insert or edit.
    pub fn sorted_by(mut self, sort: SortFn<T>) -> Self {
        self.items.sort_by(sort);
        self.sort = Some(sort);
        self
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    fn resort(&mut self) {
        if let Some(sort) = self.sort {
            self.items.sort_by(sort);
        }
    }

    /// Put a new record at the front.
    pub fn prepend(&mut self, record: T) {
        self.items.insert(0, record);
        self.resort();
    }

    /// Replace the record with the same id. Returns false when absent.
    pub fn replace(&mut self, record: T) -> bool {
        match self.items.iter_mut().find(|item| item.id() == record.id()) {
            Some(slot) => {
                *slot = record;
                self.resort();
                true
            }
            None => false,
        }
    }

    /// Remove the one record with `id`.
    pub fn remove(&mut self, id: Uuid) -> Option<T> {
        let index = self.items.iter().position(|item| item.id() == id)?;
        Some(self.items.remove(index))
    }

    // ── Mutation flow ───────────────────────────────────────────────

    /// Validate and insert a draft, prepending the stored record.
    pub async fn create<D>(&mut self, repo: &Repository<T>, draft: D, success: &str) -> Outcome<T>
    where
        D: Draft<Record = T>,
    {
        let draft = draft.normalize();
        let record = match draft.into_record(repo.session().user_id(), Utc::now()) {
            Ok(record) => record,
            Err(e) => return Outcome::rejected(Notice::warning(e.message)),
        };

        match repo.insert(&record).await {
            Ok(stored) => {
                info!(table = T::TABLE, id = %stored.id(), "Record created");
                self.prepend(stored.clone());
                Outcome::done(Notice::success(success), Some(stored))
            }
            Err(e) => {
                warn!(table = T::TABLE, error = %e, "Failed to add record");
                Outcome::rejected(Notice::failed("add", T::NOUN))
            }
        }
    }

    /// Validate a draft and write its fields over record `id`.
    pub async fn edit<D>(
        &mut self,
        repo: &Repository<T>,
        id: Uuid,
        draft: D,
        success: &str,
    ) -> Outcome<T>
    where
        D: Draft<Record = T>,
    {
        let draft = draft.normalize();
        if let Err(e) = draft.validate() {
            return Outcome::rejected(Notice::warning(e.message));
        }

        match repo.update_from(id, &draft).await {
            Ok(stored) => {
                info!(table = T::TABLE, %id, "Record updated");
                self.replace(stored.clone());
                Outcome::done(Notice::success(success), Some(stored))
            }
            Err(e) => {
                warn!(table = T::TABLE, %id, error = %e, "Failed to update record");
                Outcome::rejected(Notice::failed("update", T::NOUN))
            }
        }
    }

    /// Write a small set of columns (a toggle or status change) to record `id`.
    pub async fn patch(
        &mut self,
        repo: &Repository<T>,
        id: Uuid,
        changes: Row,
        verb: &str,
        success: &str,
    ) -> Outcome<T> {
        match repo.update(id, changes).await {
            Ok(stored) => {
                info!(table = T::TABLE, %id, verb, "Record patched");
                self.replace(stored.clone());
                Outcome::done(Notice::success(success), Some(stored))
            }
            Err(e) => {
                warn!(table = T::TABLE, %id, verb, error = %e, "Failed to patch record");
                Outcome::rejected(Notice::failed(verb, T::NOUN))
            }
        }
    }

    /// Delete record `id` once confirmed, removing it locally.
    pub async fn delete(
        &mut self,
        repo: &Repository<T>,
        id: Uuid,
        confirmation: Confirmation,
        success: &str,
    ) -> Outcome<T> {
        if confirmation == Confirmation::Declined {
            return Outcome::rejected(Notice::info("Delete cancelled."));
        }

        match repo.delete(id).await {
            Ok(()) => {
                info!(table = T::TABLE, %id, "Record deleted");
                let removed = self.remove(id);
                Outcome::done(Notice::success(success), removed)
            }
            Err(e) => {
                warn!(table = T::TABLE, %id, error = %e, "Failed to delete record");
                Outcome::rejected(Notice::failed("delete", T::NOUN))
            }
        }
    }
}
