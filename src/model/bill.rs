//! Bill data model.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Draft, Record, clean, require, require_positive, require_text, trim};
use crate::error::ValidationError;
use crate::recurrence::{Frequency, Recurring};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillType {
    #[default]
    Utility,
    Loan,
    CreditCard,
    Subscription,
    Insurance,
    RentMortgage,
    Tax,
    PhoneInternet,
    Other,
}

impl BillType {
    pub const ALL: [BillType; 9] = [
        BillType::Utility,
        BillType::Loan,
        BillType::CreditCard,
        BillType::Subscription,
        BillType::Insurance,
        BillType::RentMortgage,
        BillType::Tax,
        BillType::PhoneInternet,
        BillType::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            BillType::Utility => "Utility",
            BillType::Loan => "Loan",
            BillType::CreditCard => "Credit Card",
            BillType::Subscription => "Subscription",
            BillType::Insurance => "Insurance",
            BillType::RentMortgage => "Rent/Mortgage",
            BillType::Tax => "Tax",
            BillType::PhoneInternet => "Phone/Internet",
            BillType::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeedOrWant {
    #[default]
    Need,
    Want,
    Unsure,
}

impl NeedOrWant {
    pub fn label(self) -> &'static str {
        match self {
            NeedOrWant::Need => "Need",
            NeedOrWant::Want => "Want",
            NeedOrWant::Unsure => "Unsure",
        }
    }
}

/// A recurring or one-time bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    pub id: Uuid,
    pub user_id: Uuid,
    pub account_name: String,
    pub bill_type: BillType,
    pub need_or_want: NeedOrWant,
    pub amount: Decimal,
    /// Outstanding balance for loans and cards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<Decimal>,
    pub due_date: NaiveDate,
    pub frequency: Frequency,
    pub autopay: bool,
    /// Annual percentage rate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest_rate: Option<Decimal>,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Account the bill is paid from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Bill {
    const TABLE: &'static str = "bills";
    const NOUN: &'static str = "bill";

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Recurring for Bill {
    fn anchor(&self) -> NaiveDate {
        self.due_date
    }

    fn cadence(&self) -> Frequency {
        self.frequency
    }
}

/// Fields entered on the bill form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillDraft {
    pub account_name: String,
    #[serde(default)]
    pub bill_type: BillType,
    #[serde(default)]
    pub need_or_want: NeedOrWant,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub balance: Option<Decimal>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default = "default_frequency")]
    pub frequency: Frequency,
    #[serde(default)]
    pub autopay: bool,
    #[serde(default)]
    pub interest_rate: Option<Decimal>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub account_id: Option<Uuid>,
}

fn default_frequency() -> Frequency {
    Frequency::Monthly
}

impl BillDraft {
    pub fn new(account_name: impl Into<String>, amount: Decimal, due_date: NaiveDate) -> Self {
        Self {
            account_name: account_name.into(),
            bill_type: BillType::default(),
            need_or_want: NeedOrWant::default(),
            amount: Some(amount),
            balance: None,
            due_date: Some(due_date),
            frequency: default_frequency(),
            autopay: false,
            interest_rate: None,
            notes: None,
            account_id: None,
        }
    }

    pub fn with_frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn with_type(mut self, bill_type: BillType) -> Self {
        self.bill_type = bill_type;
        self
    }

    pub fn with_need_or_want(mut self, need_or_want: NeedOrWant) -> Self {
        self.need_or_want = need_or_want;
        self
    }

    pub fn with_balance(mut self, balance: Decimal, interest_rate: Option<Decimal>) -> Self {
        self.balance = Some(balance);
        self.interest_rate = interest_rate;
        self
    }

    pub fn with_autopay(mut self, autopay: bool) -> Self {
        self.autopay = autopay;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

impl Draft for BillDraft {
    type Record = Bill;

    fn normalize(self) -> Self {
        Self {
            account_name: trim(self.account_name),
            notes: clean(self.notes),
            ..self
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("account_name", &self.account_name, "Please enter an account name")?;
        require_positive("amount", self.amount)?;
        require("due_date", self.due_date, "Please select a due date")?;
        Ok(())
    }

    fn into_record(self, user_id: Uuid, now: DateTime<Utc>) -> Result<Bill, ValidationError> {
        self.validate()?;
        Ok(Bill {
            id: Uuid::new_v4(),
            user_id,
            account_name: self.account_name,
            bill_type: self.bill_type,
            need_or_want: self.need_or_want,
            amount: require_positive("amount", self.amount)?,
            balance: self.balance,
            due_date: require("due_date", self.due_date, "Please select a due date")?,
            frequency: self.frequency,
            autopay: self.autopay,
            interest_rate: self.interest_rate,
            is_active: true,
            notes: self.notes,
            account_id: self.account_id,
            created_at: now,
            updated_at: now,
        })
    }
}
