//! Per-view list filters.
//!
//! Each filter is a conjunction of independent predicates. Filtering never
//! reorders; sort first, then filter.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

use crate::model::{
    Account, AccountType, Bill, BillType, Income, Job, JobStatus, NeedOrWant, Priority, Todo,
    TodoStatus,
};
use crate::recurrence::{Urgency, UrgencyWindow, classify_urgency, days_until_due};

/// A filter over one kind of item.
pub trait ViewFilter<T> {
    fn matches(&self, item: &T, today: NaiveDate) -> bool;

    /// Number of predicates set away from their default.
    fn active_count(&self) -> usize;

    /// Items that pass, in input order.
    fn apply<'a>(&self, items: &'a [T], today: NaiveDate) -> Vec<&'a T> {
        items.iter().filter(|item| self.matches(item, today)).collect()
    }
}

/// Active / inactive soft-state selector. `archived` is accepted for inactive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveFilter {
    #[default]
    All,
    Active,
    #[serde(alias = "archived")]
    Inactive,
}

impl ActiveFilter {
    fn admits(self, is_active: bool) -> bool {
        match self {
            ActiveFilter::All => true,
            ActiveFilter::Active => is_active,
            ActiveFilter::Inactive => !is_active,
        }
    }
}

/// Case-insensitive substring search. Blank matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Search(String);

impl Search {
    pub fn new(query: &str) -> Self {
        Self(query.trim().to_lowercase())
    }

    pub fn is_blank(&self) -> bool {
        self.0.is_empty()
    }

    /// True when any field contains the query.
    pub fn any<'a, I>(&self, fields: I) -> bool
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        self.is_blank()
            || fields
                .into_iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(&self.0))
    }
}

impl<'de> Deserialize<'de> for Search {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Search::new(&raw))
    }
}

/// `"all"` or a blank value means no restriction.
fn all_or<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") | Some("all") => Ok(None),
        Some(tag) => T::deserialize(serde::de::value::StrDeserializer::<D::Error>::new(tag)).map(Some),
    }
}

/// Comma-separated enum tags, e.g. `lead,quoted`.
fn tag_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(|tag| T::deserialize(serde::de::value::StrDeserializer::<D::Error>::new(tag)))
        .collect()
}

fn count(flags: &[bool]) -> usize {
    flags.iter().filter(|set| **set).count()
}

// ── Todos ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DueFilter {
    #[default]
    All,
    Overdue,
    /// Due within the todo "soon" window.
    Soon,
    NoDate,
    HasDate,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TodoFilter {
    #[serde(deserialize_with = "all_or")]
    pub status: Option<TodoStatus>,
    #[serde(deserialize_with = "all_or")]
    pub priority: Option<Priority>,
    pub focus: ActiveFilter,
    pub due: DueFilter,
    pub search: Search,
}

impl ViewFilter<Todo> for TodoFilter {
    fn matches(&self, todo: &Todo, today: NaiveDate) -> bool {
        if self.status.is_some_and(|s| s != todo.status) {
            return false;
        }
        if self.priority.is_some_and(|p| p != todo.priority) {
            return false;
        }
        if !self.focus.admits(todo.is_active) {
            return false;
        }
        let urgency = todo
            .due_date
            .map(|due| classify_urgency(days_until_due(due, today), UrgencyWindow::TODOS));
        let due_ok = match self.due {
            DueFilter::All => true,
            DueFilter::Overdue => urgency == Some(Urgency::Overdue),
            DueFilter::Soon => urgency == Some(Urgency::Soon),
            DueFilter::NoDate => todo.due_date.is_none(),
            DueFilter::HasDate => todo.due_date.is_some(),
        };
        due_ok
            && self.search.any([
                Some(todo.title.as_str()),
                todo.description.as_deref(),
                todo.category.as_deref(),
            ])
    }

    fn active_count(&self) -> usize {
        count(&[
            self.status.is_some(),
            self.priority.is_some(),
            self.focus != ActiveFilter::All,
            self.due != DueFilter::All,
            !self.search.is_blank(),
        ])
    }
}

// ── Bills ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BillFilter {
    pub status: ActiveFilter,
    #[serde(deserialize_with = "all_or")]
    pub bill_type: Option<BillType>,
    #[serde(deserialize_with = "all_or")]
    pub need_or_want: Option<NeedOrWant>,
    #[serde(deserialize_with = "all_or")]
    pub urgency: Option<Urgency>,
    pub search: Search,
}

impl ViewFilter<Bill> for BillFilter {
    fn matches(&self, bill: &Bill, today: NaiveDate) -> bool {
        self.status.admits(bill.is_active)
            && self.bill_type.is_none_or(|t| t == bill.bill_type)
            && self.need_or_want.is_none_or(|n| n == bill.need_or_want)
            && self.urgency.is_none_or(|u| {
                u == classify_urgency(days_until_due(bill.due_date, today), UrgencyWindow::BILLS)
            })
            && self
                .search
                .any([Some(bill.account_name.as_str()), bill.notes.as_deref()])
    }

    fn active_count(&self) -> usize {
        count(&[
            self.status != ActiveFilter::All,
            self.bill_type.is_some(),
            self.need_or_want.is_some(),
            self.urgency.is_some(),
            !self.search.is_blank(),
        ])
    }
}

// ── Income ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IncomeFilter {
    pub status: ActiveFilter,
    pub search: Search,
}

impl ViewFilter<Income> for IncomeFilter {
    fn matches(&self, income: &Income, _today: NaiveDate) -> bool {
        self.status.admits(income.is_active)
            && self
                .search
                .any([Some(income.source_name.as_str()), income.notes.as_deref()])
    }

    fn active_count(&self) -> usize {
        count(&[self.status != ActiveFilter::All, !self.search.is_blank()])
    }
}

// ── Accounts ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AccountFilter {
    #[serde(deserialize_with = "all_or")]
    pub account_type: Option<AccountType>,
    pub status: ActiveFilter,
    pub search: Search,
}

impl ViewFilter<Account> for AccountFilter {
    fn matches(&self, account: &Account, _today: NaiveDate) -> bool {
        self.account_type.is_none_or(|t| t == account.account_type)
            && self.status.admits(account.is_active)
            && self.search.any([
                Some(account.account_name.as_str()),
                account.institution_name.as_deref(),
            ])
    }

    fn active_count(&self) -> usize {
        count(&[
            self.account_type.is_some(),
            self.status != ActiveFilter::All,
            !self.search.is_blank(),
        ])
    }
}

// ── Jobs ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JobFilter {
    /// When non-empty, only these statuses show and `show_all` is ignored.
    #[serde(deserialize_with = "tag_list")]
    pub statuses: Vec<JobStatus>,
    /// Include completed and lost jobs.
    pub show_all: bool,
    pub search: Search,
}

impl ViewFilter<Job> for JobFilter {
    fn matches(&self, job: &Job, _today: NaiveDate) -> bool {
        let status_ok = if self.statuses.is_empty() {
            self.show_all || job.status.is_open()
        } else {
            self.statuses.contains(&job.status)
        };
        status_ok
            && self.search.any([
                Some(job.client_name.as_str()),
                job.client_email.as_deref(),
                Some(job.job_description.as_str()),
            ])
    }

    fn active_count(&self) -> usize {
        count(&[
            !self.statuses.is_empty(),
            self.show_all,
            !self.search.is_blank(),
        ])
    }
}
