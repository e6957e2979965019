//! Entity types, drafts and draft validation.
//!
//! Every entity is a flat row owned by one user. Closed enums carry their
//! display labels as exhaustive matches.

pub mod account;
pub mod bill;
pub mod income;
pub mod job;
pub mod todo;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::ValidationError;

pub use account::{Account, AccountDraft, AccountType};
pub use bill::{Bill, BillDraft, BillType, NeedOrWant};
pub use income::{Income, IncomeDraft, IncomeFrequency};
pub use job::{Job, JobDraft, JobStatus};
pub use todo::{Priority, Todo, TodoDraft, TodoStatus};

/// A persisted entity.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Backing table.
    const TABLE: &'static str;
    /// Noun used in user-facing notices, e.g. "Failed to add bill".
    const NOUN: &'static str;

    fn id(&self) -> Uuid;
}

/// User-entered fields for creating or editing a record.
///
/// Serialized field names match the record's columns, so a draft doubles as
/// the change set for an edit.
pub trait Draft: Serialize + Send + Sync {
    type Record: Record;

    /// Trim text and turn blank optional fields into `None`.
    fn normalize(self) -> Self;

    fn validate(&self) -> Result<(), ValidationError>;

    /// Build a new record. Validates first.
    fn into_record(
        self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Self::Record, ValidationError>;
}

// ── Field helpers ───────────────────────────────────────────────────

pub(crate) fn trim(s: String) -> String {
    let trimmed = s.trim();
    if trimmed.len() == s.len() {
        s
    } else {
        trimmed.to_string()
    }
}

/// Trim an optional field; blank becomes `None`.
pub(crate) fn clean(s: Option<String>) -> Option<String> {
    s.map(trim).filter(|s| !s.is_empty())
}

pub(crate) fn require_text(
    field: &'static str,
    value: &str,
    message: &str,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, message));
    }
    Ok(())
}

pub(crate) fn require_positive(
    field: &'static str,
    value: Option<Decimal>,
) -> Result<Decimal, ValidationError> {
    match value {
        Some(v) if v > Decimal::ZERO => Ok(v),
        _ => Err(ValidationError::new(field, "Please enter a valid amount")),
    }
}

pub(crate) fn require<T: Copy>(
    field: &'static str,
    value: Option<T>,
    message: &str,
) -> Result<T, ValidationError> {
    value.ok_or_else(|| ValidationError::new(field, message))
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn clean_trims_and_drops_blanks() {
        assert_eq!(clean(Some("  gas  ".into())), Some("gas".into()));
        assert_eq!(clean(Some("   ".into())), None);
        assert_eq!(clean(None), None);
    }

    #[test]
    fn positive_amounts_only() {
        assert_eq!(require_positive("amount", Some(dec!(0.01))).unwrap(), dec!(0.01));
        assert!(require_positive("amount", Some(Decimal::ZERO)).is_err());
        assert!(require_positive("amount", Some(dec!(-5))).is_err());
        let err = require_positive("amount", None).unwrap_err();
        assert_eq!(err.field, "amount");
        assert_eq!(err.to_string(), "Please enter a valid amount");
    }
}
