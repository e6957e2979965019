use std::sync::Arc;

use uuid::Uuid;

use crate::collection::{Collection, Confirmation, Notice, Outcome};
use crate::error::StoreError;
use crate::model::{Account, AccountDraft, Record};
use crate::repo::{Repository, changes};
use crate::session::Session;
use crate::store::{Query, TableStore};

pub struct AccountsView {
    accounts: Repository<Account>,
}

impl AccountsView {
    pub fn new(store: Arc<dyn TableStore>, session: Session) -> Self {
        Self {
            accounts: Repository::new(store, session),
        }
    }

    /// Every account, active or archived, by name.
    pub async fn list(&self) -> Result<Collection<Account>, StoreError> {
        let accounts = self.accounts.list(Query::new().asc("account_name")).await?;
        Ok(Collection::new(accounts))
    }

    pub async fn create(
        &self,
        accounts: &mut Collection<Account>,
        draft: AccountDraft,
    ) -> Outcome<Account> {
        accounts.create(&self.accounts, draft, "Account added!").await
    }

    pub async fn update(
        &self,
        accounts: &mut Collection<Account>,
        id: Uuid,
        draft: AccountDraft,
    ) -> Outcome<Account> {
        accounts
            .edit(&self.accounts, id, draft, "Account updated!")
            .await
    }

    /// Archive an active account or restore an archived one.
    pub async fn toggle_active(
        &self,
        accounts: &mut Collection<Account>,
        id: Uuid,
    ) -> Outcome<Account> {
        let Some(active) = accounts.get(id).map(|a| a.is_active) else {
            return Outcome::rejected(Notice::failed("update", Account::NOUN));
        };
        let success = if active {
            "Account archived!"
        } else {
            "Account restored!"
        };
        accounts
            .patch(&self.accounts, id, changes([("is_active", !active)]), "update", success)
            .await
    }

    pub async fn delete(
        &self,
        accounts: &mut Collection<Account>,
        id: Uuid,
        confirmation: Confirmation,
    ) -> Outcome<Account> {
        accounts
            .delete(&self.accounts, id, confirmation, "Account deleted!")
            .await
    }
}
