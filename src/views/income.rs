use std::cmp::Ordering;
use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::collection::{Collection, Confirmation, Notice, Outcome};
use crate::error::StoreError;
use crate::model::{Account, Income, IncomeDraft, Record};
use crate::repo::{Repository, changes};
use crate::session::Session;
use crate::store::{Query, TableStore};

fn by_next_date(a: &Income, b: &Income) -> Ordering {
    a.next_date.cmp(&b.next_date)
}

/// Income sources plus the accounts a deposit can land in.
#[derive(Debug, Clone)]
pub struct IncomeList {
    pub income: Collection<Income>,
    /// Active accounts, by name.
    pub accounts: Vec<Account>,
}

impl IncomeList {
    pub fn account_for(&self, income: &Income) -> Option<&Account> {
        let id = income.account_id?;
        self.accounts.iter().find(|a| a.id == id)
    }
}

pub struct IncomeView {
    income: Repository<Income>,
    accounts: Repository<Account>,
}

impl IncomeView {
    pub fn new(store: Arc<dyn TableStore>, session: Session) -> Self {
        Self {
            income: Repository::new(Arc::clone(&store), session),
            accounts: Repository::new(store, session),
        }
    }

    pub async fn roll_forward(&self, today: NaiveDate) -> Result<usize, StoreError> {
        super::roll_forward(&self.income, "next_date", today).await
    }

    /// Newest sources first, then stably re-sorted by next payment date.
    pub async fn list(&self, today: NaiveDate) -> Result<IncomeList, StoreError> {
        self.roll_forward(today).await?;
        let (income, accounts) = tokio::try_join!(
            self.income.list(Query::new().desc("created_at")),
            self.accounts
                .list(Query::new().eq("is_active", true).asc("account_name")),
        )?;
        Ok(IncomeList {
            income: Collection::new(income).sorted_by(by_next_date),
            accounts,
        })
    }

    pub async fn create(
        &self,
        income: &mut Collection<Income>,
        draft: IncomeDraft,
    ) -> Outcome<Income> {
        income.create(&self.income, draft, "Income added!").await
    }

    pub async fn update(
        &self,
        income: &mut Collection<Income>,
        id: Uuid,
        draft: IncomeDraft,
    ) -> Outcome<Income> {
        income.edit(&self.income, id, draft, "Income updated!").await
    }

    pub async fn toggle_active(&self, income: &mut Collection<Income>, id: Uuid) -> Outcome<Income> {
        let Some(active) = income.get(id).map(|i| i.is_active) else {
            return Outcome::rejected(Notice::failed("update", Income::NOUN));
        };
        let success = if active {
            "Income deactivated!"
        } else {
            "Income activated!"
        };
        income
            .patch(&self.income, id, changes([("is_active", !active)]), "update", success)
            .await
    }

    pub async fn delete(
        &self,
        income: &mut Collection<Income>,
        id: Uuid,
        confirmation: Confirmation,
    ) -> Outcome<Income> {
        income
            .delete(&self.income, id, confirmation, "Income deleted!")
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering as AtomicOrdering;

    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;

    use super::*;
    use crate::collection::tests::CountingStore;
    use crate::model::{AccountDraft, AccountType, Draft, IncomeFrequency};

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, day).unwrap()
    }

    fn today() -> NaiveDate {
        d(10, 14)
    }

    async fn setup() -> (Arc<CountingStore>, IncomeView) {
        let store = Arc::new(CountingStore::new(false).await);
        let view = IncomeView::new(store.clone(), Session::demo());
        (store, view)
    }

    async fn seed(store: &Arc<CountingStore>, drafts: Vec<IncomeDraft>) {
        let repo = Repository::<Income>::new(store.clone(), Session::demo());
        let start = Utc::now() - Duration::hours(1);
        for (i, draft) in drafts.into_iter().enumerate() {
            let created = start + Duration::minutes(i as i64);
            let record = draft.into_record(Session::demo().user_id(), created).unwrap();
            repo.insert(&record).await.unwrap();
        }
    }

    #[tokio::test]
    async fn lapsed_paychecks_roll_forward_once_each() {
        let (store, view) = setup().await;
        seed(
            &store,
            vec![
                IncomeDraft::new("Salary", dec!(2400), d(10, 2))
                    .with_frequency(IncomeFrequency::Biweekly),
                IncomeDraft::new("Bonus", dec!(500), d(3, 1))
                    .with_frequency(IncomeFrequency::OneTime),
                IncomeDraft::new("Rental", dec!(900), d(11, 1)),
            ],
        )
        .await;

        let list = view.list(today()).await.unwrap();
        assert_eq!(store.updates.load(AtomicOrdering::SeqCst), 1);

        let dates: Vec<_> = list
            .income
            .items()
            .iter()
            .map(|i| (i.source_name.as_str(), i.next_date))
            .collect();
        assert_eq!(
            dates,
            vec![
                ("Bonus", d(3, 1)),
                ("Salary", d(10, 16)),
                ("Rental", d(11, 1)),
            ]
        );
    }

    #[tokio::test]
    async fn list_loads_active_accounts_for_lookup() {
        let (store, view) = setup().await;
        let accounts = Repository::<Account>::new(store.clone(), Session::demo());
        let checking = AccountDraft::new("Checking", AccountType::Checking)
            .into_record(Session::demo().user_id(), Utc::now())
            .unwrap();
        let mut closed = AccountDraft::new("Closed", AccountType::Savings)
            .into_record(Session::demo().user_id(), Utc::now())
            .unwrap();
        closed.is_active = false;
        accounts.insert(&checking).await.unwrap();
        accounts.insert(&closed).await.unwrap();

        seed(
            &store,
            vec![IncomeDraft::new("Salary", dec!(2400), d(10, 30)).with_account(checking.id)],
        )
        .await;

        let list = view.list(today()).await.unwrap();
        assert_eq!(list.accounts.len(), 1);
        let salary = &list.income.items()[0];
        assert_eq!(list.account_for(salary).map(|a| a.account_name.as_str()), Some("Checking"));
    }

    #[tokio::test]
    async fn toggle_active_reports_direction() {
        let (store, view) = setup().await;
        seed(&store, vec![IncomeDraft::new("Etsy", dec!(120), d(10, 20))]).await;
        let mut list = view.list(today()).await.unwrap();
        let id = list.income.items()[0].id;

        let off = view.toggle_active(&mut list.income, id).await;
        assert_eq!(off.notice.message, "Income deactivated!");
        let on = view.toggle_active(&mut list.income, id).await;
        assert_eq!(on.notice.message, "Income activated!");
        assert!(list.income.items()[0].is_active);
    }

    #[tokio::test]
    async fn toggle_unknown_id_makes_no_store_call() {
        let (store, view) = setup().await;
        let mut income = Collection::new(Vec::new());
        let outcome = view.toggle_active(&mut income, Uuid::new_v4()).await;
        assert!(!outcome.is_success());
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn create_keeps_next_date_order() {
        let (store, view) = setup().await;
        seed(&store, vec![IncomeDraft::new("Salary", dec!(2400), d(10, 30))]).await;
        let mut list = view.list(today()).await.unwrap();

        let outcome = view
            .create(&mut list.income, IncomeDraft::new("Refund", dec!(80), d(10, 31)))
            .await;
        assert_eq!(outcome.notice.message, "Income added!");
        let names: Vec<_> = list.income.items().iter().map(|i| i.source_name.as_str()).collect();
        assert_eq!(names, vec!["Salary", "Refund"]);
    }
}
