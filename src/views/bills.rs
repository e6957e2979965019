use std::cmp::Ordering;
use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::collection::{Collection, Confirmation, Outcome};
use crate::error::StoreError;
use crate::model::{Bill, BillDraft};
use crate::repo::{Repository, changes};
use crate::session::Session;
use crate::store::{Query, TableStore};

fn by_due(a: &Bill, b: &Bill) -> Ordering {
    a.due_date.cmp(&b.due_date)
}

pub struct BillsView {
    bills: Repository<Bill>,
}

impl BillsView {
    pub fn new(store: Arc<dyn TableStore>, session: Session) -> Self {
        Self {
            bills: Repository::new(store, session),
        }
    }

    /// Move lapsed recurring due dates to their next occurrence.
    pub async fn roll_forward(&self, today: NaiveDate) -> Result<usize, StoreError> {
        super::roll_forward(&self.bills, "due_date", today).await
    }

    /// All bills, soonest due first, after rolling lapsed dates forward.
    pub async fn list(&self, today: NaiveDate) -> Result<Collection<Bill>, StoreError> {
        self.roll_forward(today).await?;
        let bills = self.bills.list(Query::new().asc("due_date")).await?;
        Ok(Collection::new(bills).sorted_by(by_due))
    }

    pub async fn create(&self, bills: &mut Collection<Bill>, draft: BillDraft) -> Outcome<Bill> {
        bills.create(&self.bills, draft, "Bill added!").await
    }

    pub async fn update(
        &self,
        bills: &mut Collection<Bill>,
        id: Uuid,
        draft: BillDraft,
    ) -> Outcome<Bill> {
        bills.edit(&self.bills, id, draft, "Bill updated!").await
    }

    pub async fn archive(&self, bills: &mut Collection<Bill>, id: Uuid) -> Outcome<Bill> {
        bills
            .patch(&self.bills, id, changes([("is_active", false)]), "archive", "Bill archived!")
            .await
    }

    pub async fn restore(&self, bills: &mut Collection<Bill>, id: Uuid) -> Outcome<Bill> {
        bills
            .patch(&self.bills, id, changes([("is_active", true)]), "restore", "Bill restored!")
            .await
    }

    pub async fn delete(
        &self,
        bills: &mut Collection<Bill>,
        id: Uuid,
        confirmation: Confirmation,
    ) -> Outcome<Bill> {
        bills
            .delete(&self.bills, id, confirmation, "Bill deleted!")
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering as AtomicOrdering;

    use chrono::Utc;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::collection::tests::CountingStore;
    use crate::collection::NoticeLevel;
    use crate::model::Draft;
    use crate::recurrence::Frequency;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, day).unwrap()
    }

    fn today() -> NaiveDate {
        d(10, 14)
    }

    async fn seeded(drafts: Vec<BillDraft>) -> (Arc<CountingStore>, BillsView) {
        let store = Arc::new(CountingStore::new(false).await);
        let repo = Repository::<Bill>::new(store.clone(), Session::demo());
        for draft in drafts {
            let bill = draft.into_record(Session::demo().user_id(), Utc::now()).unwrap();
            repo.insert(&bill).await.unwrap();
        }
        let view = BillsView::new(store.clone(), Session::demo());
        (store, view)
    }

    #[tokio::test]
    async fn bill_due_yesterday_advances_one_month() {
        let (_store, view) = seeded(vec![BillDraft::new("Rent", dec!(1500), d(10, 13))]).await;

        let bills = view.list(today()).await.unwrap();
        assert_eq!(bills.items()[0].due_date, d(11, 13));

        // Persisted, so a second pass has nothing to do.
        assert_eq!(view.roll_forward(today()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn roll_forward_touches_only_lapsed_recurring_rows() {
        let (store, view) = seeded(vec![
            BillDraft::new("Lapsed", dec!(10), d(9, 1)).with_frequency(Frequency::Weekly),
            BillDraft::new("Current", dec!(10), d(10, 21)),
            BillDraft::new("Due today", dec!(10), today()),
            BillDraft::new("Once", dec!(10), d(1, 5)).with_frequency(Frequency::OneTime),
        ])
        .await;

        assert_eq!(view.roll_forward(today()).await.unwrap(), 1);
        assert_eq!(store.updates.load(AtomicOrdering::SeqCst), 1);

        let bills = view.list(today()).await.unwrap();
        let due: Vec<_> = bills
            .items()
            .iter()
            .map(|b| (b.account_name.as_str(), b.due_date))
            .collect();
        assert_eq!(
            due,
            vec![
                ("Once", d(1, 5)),
                ("Due today", today()),
                ("Lapsed", d(10, 20)),
                ("Current", d(10, 21)),
            ]
        );
    }

    #[tokio::test]
    async fn archived_bills_still_roll_forward() {
        let (_store, view) = seeded(vec![BillDraft::new("Old gym", dec!(30), d(8, 2))]).await;
        let mut bills = view.list(d(8, 1)).await.unwrap();
        let id = bills.items()[0].id;
        assert!(view.archive(&mut bills, id).await.is_success());

        assert_eq!(view.roll_forward(today()).await.unwrap(), 1);
        let bills = view.list(today()).await.unwrap();
        assert_eq!(bills.items()[0].due_date, d(11, 2));
        assert!(!bills.items()[0].is_active);
    }

    #[tokio::test]
    async fn archive_and_restore_flip_the_flag() {
        let (_store, view) = seeded(vec![BillDraft::new("Netflix", dec!(15.49), d(10, 30))]).await;
        let mut bills = view.list(today()).await.unwrap();
        let id = bills.items()[0].id;

        let archived = view.archive(&mut bills, id).await;
        assert_eq!(archived.notice.message, "Bill archived!");
        assert!(!bills.get(id).unwrap().is_active);

        let restored = view.restore(&mut bills, id).await;
        assert_eq!(restored.notice.message, "Bill restored!");
        assert!(bills.get(id).unwrap().is_active);
        assert_eq!(bills.get(id).unwrap().amount, dec!(15.49));
    }

    #[tokio::test]
    async fn update_resorts_by_due_date() {
        let (_store, view) = seeded(vec![
            BillDraft::new("Water", dec!(40), d(10, 16)),
            BillDraft::new("Power", dec!(90), d(10, 25)),
        ])
        .await;
        let mut bills = view.list(today()).await.unwrap();
        let water = bills.items()[0].id;

        let outcome = view
            .update(&mut bills, water, BillDraft::new("Water", dec!(42), d(10, 28)))
            .await;
        assert!(outcome.is_success());
        assert_eq!(bills.items()[1].id, water);
    }

    #[tokio::test]
    async fn invalid_update_is_a_warning() {
        let (store, view) = seeded(vec![BillDraft::new("Water", dec!(40), d(10, 16))]).await;
        let mut bills = view.list(today()).await.unwrap();
        let id = bills.items()[0].id;
        let writes = store.writes();

        let mut draft = BillDraft::new("Water", dec!(40), d(10, 16));
        draft.due_date = None;
        let outcome = view.update(&mut bills, id, draft).await;
        assert_eq!(outcome.notice.level, NoticeLevel::Warning);
        assert_eq!(outcome.notice.message, "Please select a due date");
        assert_eq!(store.writes(), writes);
    }
}
