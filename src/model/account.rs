//! Account data model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Draft, Record, clean, require_text, trim};
use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    #[default]
    Checking,
    Savings,
    CreditCard,
    Investment,
    Cash,
    Loan,
    Other,
}

impl AccountType {
    pub const ALL: [AccountType; 7] = [
        AccountType::Checking,
        AccountType::Savings,
        AccountType::CreditCard,
        AccountType::Investment,
        AccountType::Cash,
        AccountType::Loan,
        AccountType::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AccountType::Checking => "Checking",
            AccountType::Savings => "Savings",
            AccountType::CreditCard => "Credit Card",
            AccountType::Investment => "Investment",
            AccountType::Cash => "Cash",
            AccountType::Loan => "Loan",
            AccountType::Other => "Other",
        }
    }
}

/// A bank, card, loan or cash account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub user_id: Uuid,
    pub account_name: String,
    pub account_type: AccountType,
    /// Signed; negative is debt.
    pub current_balance: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_number_last4: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Account {
    const TABLE: &'static str = "accounts";
    const NOUN: &'static str = "account";

    fn id(&self) -> Uuid {
        self.id
    }
}

/// Fields entered on the account form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountDraft {
    pub account_name: String,
    #[serde(default)]
    pub account_type: AccountType,
    #[serde(default)]
    pub current_balance: Decimal,
    #[serde(default)]
    pub institution_name: Option<String>,
    #[serde(default)]
    pub account_number_last4: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl AccountDraft {
    pub fn new(account_name: impl Into<String>, account_type: AccountType) -> Self {
        Self {
            account_name: account_name.into(),
            account_type,
            ..Self::default()
        }
    }

    pub fn with_balance(mut self, balance: Decimal) -> Self {
        self.current_balance = balance;
        self
    }

    pub fn with_institution(mut self, name: impl Into<String>) -> Self {
        self.institution_name = Some(name.into());
        self
    }

    pub fn with_last4(mut self, last4: impl Into<String>) -> Self {
        self.account_number_last4 = Some(last4.into());
        self
    }
}

impl Draft for AccountDraft {
    type Record = Account;

    fn normalize(self) -> Self {
        Self {
            account_name: trim(self.account_name),
            institution_name: clean(self.institution_name),
            account_number_last4: clean(self.account_number_last4),
            notes: clean(self.notes),
            ..self
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("account_name", &self.account_name, "Please enter an account name")?;
        if let Some(last4) = &self.account_number_last4 {
            if last4.len() != 4 || !last4.chars().all(|c| c.is_ascii_digit()) {
                return Err(ValidationError::new(
                    "account_number_last4",
                    "Account number must be the last 4 digits",
                ));
            }
        }
        Ok(())
    }

    fn into_record(self, user_id: Uuid, now: DateTime<Utc>) -> Result<Account, ValidationError> {
        self.validate()?;
        Ok(Account {
            id: Uuid::new_v4(),
            user_id,
            account_name: self.account_name,
            account_type: self.account_type,
            current_balance: self.current_balance,
            institution_name: self.institution_name,
            account_number_last4: self.account_number_last4,
            notes: self.notes,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn last4_must_be_four_digits() {
        let ok = AccountDraft::new("Chase", AccountType::Checking).with_last4("0042");
        assert!(ok.validate().is_ok());

        for bad in ["42", "12345", "12a4"] {
            let draft = AccountDraft::new("Chase", AccountType::Checking).with_last4(bad);
            assert_eq!(draft.validate().unwrap_err().field, "account_number_last4", "{bad}");
        }

        let blank = AccountDraft::new("Chase", AccountType::Checking)
            .with_last4("  ")
            .normalize();
        assert!(blank.validate().is_ok());
    }

    #[test]
    fn balance_may_be_negative() {
        let account = AccountDraft::new("Mortgage", AccountType::Loan)
            .with_balance(dec!(-185000))
            .into_record(Uuid::nil(), Utc::now())
            .unwrap();
        assert!(account.is_active);
        assert_eq!(account.current_balance, dec!(-185000));
    }
}
