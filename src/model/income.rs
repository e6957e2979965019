//! Income data model.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Draft, Record, clean, require, require_positive, require_text, trim};
use crate::error::ValidationError;
use crate::recurrence::{Frequency, Recurring};

/// Income cadences: the bill frequencies without semi-annual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncomeFrequency {
    OneTime,
    Weekly,
    Biweekly,
    #[default]
    Monthly,
    Bimonthly,
    Quarterly,
    Annual,
}

impl IncomeFrequency {
    pub fn label(self) -> &'static str {
        Frequency::from(self).label()
    }
}

impl From<IncomeFrequency> for Frequency {
    fn from(f: IncomeFrequency) -> Self {
        match f {
            IncomeFrequency::OneTime => Frequency::OneTime,
            IncomeFrequency::Weekly => Frequency::Weekly,
            IncomeFrequency::Biweekly => Frequency::Biweekly,
            IncomeFrequency::Monthly => Frequency::Monthly,
            IncomeFrequency::Bimonthly => Frequency::Bimonthly,
            IncomeFrequency::Quarterly => Frequency::Quarterly,
            IncomeFrequency::Annual => Frequency::Annual,
        }
    }
}

/// A paycheck or other expected deposit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Income {
    pub id: Uuid,
    pub user_id: Uuid,
    pub source_name: String,
    pub amount: Decimal,
    pub frequency: IncomeFrequency,
    pub next_date: NaiveDate,
    /// Deposit account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Income {
    const TABLE: &'static str = "income";
    const NOUN: &'static str = "income";

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Recurring for Income {
    fn anchor(&self) -> NaiveDate {
        self.next_date
    }

    fn cadence(&self) -> Frequency {
        self.frequency.into()
    }
}

/// Fields entered on the income form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomeDraft {
    pub source_name: String,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub frequency: IncomeFrequency,
    #[serde(default)]
    pub next_date: Option<NaiveDate>,
    #[serde(default)]
    pub account_id: Option<Uuid>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl IncomeDraft {
    pub fn new(source_name: impl Into<String>, amount: Decimal, next_date: NaiveDate) -> Self {
        Self {
            source_name: source_name.into(),
            amount: Some(amount),
            frequency: IncomeFrequency::default(),
            next_date: Some(next_date),
            account_id: None,
            notes: None,
        }
    }

    pub fn with_frequency(mut self, frequency: IncomeFrequency) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn with_account(mut self, account_id: Uuid) -> Self {
        self.account_id = Some(account_id);
        self
    }
}

impl Draft for IncomeDraft {
    type Record = Income;

    fn normalize(self) -> Self {
        Self {
            source_name: trim(self.source_name),
            notes: clean(self.notes),
            ..self
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("source_name", &self.source_name, "Please enter a source name")?;
        require_positive("amount", self.amount)?;
        require("next_date", self.next_date, "Please select the next payment date")?;
        Ok(())
    }

    fn into_record(self, user_id: Uuid, now: DateTime<Utc>) -> Result<Income, ValidationError> {
        self.validate()?;
        Ok(Income {
            id: Uuid::new_v4(),
            user_id,
            source_name: self.source_name,
            amount: require_positive("amount", self.amount)?,
            frequency: self.frequency,
            next_date: require("next_date", self.next_date, "Please select the next payment date")?,
            account_id: self.account_id,
            notes: self.notes,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }
}
