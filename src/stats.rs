//! Summary figures shown above each list.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::model::{Account, AccountType, Bill, Income, Job, JobStatus, NeedOrWant, Todo};
use crate::recurrence::{Frequency, days_until_due};

/// Days ahead counted as "this week" in summaries.
const WEEK: i64 = 7;

fn within_week(date: NaiveDate, today: NaiveDate) -> bool {
    (0..=WEEK).contains(&days_until_due(date, today))
}

/// Cents precision without trailing zeros.
fn money(amount: Decimal) -> Decimal {
    amount.round_dp(2).normalize()
}

fn monthly_equivalent(amount: Decimal, frequency: Frequency) -> Decimal {
    amount * frequency.monthly_multiplier()
}

// ── Bills ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillStats {
    pub total_debt: Decimal,
    pub high_interest_debt: Decimal,
    pub monthly_total: Decimal,
    pub annual_total: Decimal,
    /// Amount to set aside each week to cover a year of bills.
    pub weekly_savings: Decimal,
    pub autopay_count: usize,
    pub autopay_percent: u32,
    pub active_count: usize,
    pub needs_total: Decimal,
    pub wants_total: Decimal,
}

/// Interest rate above which a balance counts as high-interest debt.
const HIGH_INTEREST_RATE: Decimal = dec!(10);

/// Totals are monthly equivalents, so a weekly bill counts about 4.33 times.
pub fn bill_stats(bills: &[Bill]) -> BillStats {
    let active: Vec<&Bill> = bills.iter().filter(|b| b.is_active).collect();

    let total_debt: Decimal = active.iter().filter_map(|b| b.balance).sum();
    let high_interest_debt: Decimal = active
        .iter()
        .filter(|b| b.interest_rate.is_some_and(|r| r > HIGH_INTEREST_RATE))
        .filter_map(|b| b.balance)
        .sum();

    let monthly = |b: &&Bill| monthly_equivalent(b.amount, b.frequency);
    let monthly_total: Decimal = active.iter().map(monthly).sum();
    let annual_total = monthly_total * dec!(12);
    let by_kind = |kind: NeedOrWant| -> Decimal {
        active
            .iter()
            .filter(|b| b.need_or_want == kind)
            .map(monthly)
            .sum()
    };

    let autopay_count = active.iter().filter(|b| b.autopay).count();
    BillStats {
        total_debt,
        high_interest_debt,
        monthly_total: money(monthly_total),
        annual_total: money(annual_total),
        weekly_savings: money(annual_total / dec!(52)),
        autopay_count,
        autopay_percent: percent(autopay_count, active.len()),
        active_count: active.len(),
        needs_total: money(by_kind(NeedOrWant::Need)),
        wants_total: money(by_kind(NeedOrWant::Want)),
    }
}

fn percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((part as f64 / whole as f64) * 100.0).round() as u32
}

// ── Income ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncomeStats {
    pub monthly_total: Decimal,
    pub annual_total: Decimal,
    pub upcoming_count: usize,
    pub upcoming_amount: Decimal,
    /// Soonest expected deposit on or after today.
    pub next: Option<NextIncome>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NextIncome {
    pub source_name: String,
    pub amount: Decimal,
    pub date: NaiveDate,
}

pub fn income_stats(income: &[Income], today: NaiveDate) -> IncomeStats {
    let active: Vec<&Income> = income.iter().filter(|i| i.is_active).collect();

    let monthly_total: Decimal = active
        .iter()
        .map(|i| monthly_equivalent(i.amount, i.frequency.into()))
        .sum();

    let upcoming: Vec<&&Income> = active
        .iter()
        .filter(|i| within_week(i.next_date, today))
        .collect();

    let next = active
        .iter()
        .filter(|i| i.next_date >= today)
        .min_by_key(|i| i.next_date)
        .map(|i| NextIncome {
            source_name: i.source_name.clone(),
            amount: i.amount,
            date: i.next_date,
        });

    IncomeStats {
        monthly_total: money(monthly_total),
        annual_total: money(monthly_total * dec!(12)),
        upcoming_count: upcoming.len(),
        upcoming_amount: upcoming.iter().map(|i| i.amount).sum(),
        next,
    }
}

// ── Accounts ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountStats {
    pub net_worth: Decimal,
    pub assets: Decimal,
    /// Absolute value of negative balances.
    pub liabilities: Decimal,
    pub by_type: BTreeMap<&'static str, usize>,
    pub active_count: usize,
    pub archived_count: usize,
}

pub fn account_stats(accounts: &[Account]) -> AccountStats {
    let active: Vec<&Account> = accounts.iter().filter(|a| a.is_active).collect();

    let assets: Decimal = active
        .iter()
        .map(|a| a.current_balance)
        .filter(|b| *b > Decimal::ZERO)
        .sum();
    let debts: Decimal = active
        .iter()
        .map(|a| a.current_balance)
        .filter(|b| *b < Decimal::ZERO)
        .sum();

    let mut by_type: BTreeMap<&'static str, usize> = AccountType::ALL
        .iter()
        .map(|t| (t.label(), 0))
        .collect();
    for account in &active {
        *by_type.entry(account.account_type.label()).or_default() += 1;
    }

    AccountStats {
        net_worth: active.iter().map(|a| a.current_balance).sum(),
        assets,
        liabilities: debts.abs(),
        by_type,
        active_count: active.len(),
        archived_count: accounts.len() - active.len(),
    }
}

// ── Jobs ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobStats {
    pub by_status: BTreeMap<&'static str, usize>,
    pub open_count: usize,
    pub total_quoted: Decimal,
    /// Quotes on jobs that are still open.
    pub potential_revenue: Decimal,
}

pub fn job_stats(jobs: &[Job]) -> JobStats {
    let by_status = JobStatus::ALL
        .iter()
        .map(|s| (s.as_str(), jobs.iter().filter(|j| j.status == *s).count()))
        .collect();

    JobStats {
        by_status,
        open_count: jobs.iter().filter(|j| j.status.is_open()).count(),
        total_quoted: jobs.iter().filter_map(|j| j.quote_amount).sum(),
        potential_revenue: jobs
            .iter()
            .filter(|j| j.status.is_open())
            .filter_map(|j| j.quote_amount)
            .sum(),
    }
}

// ── Dashboard ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub active_tasks: usize,
    /// Active bills due between today and a week out.
    pub bills_due_week: Decimal,
    pub overdue_bills: usize,
    pub jobs_this_week: usize,
    /// Quotes on quoted, scheduled and in-progress jobs.
    pub pipeline_value: Decimal,
}

pub fn dashboard_stats(
    active_todos: &[Todo],
    bills: &[Bill],
    jobs: &[Job],
    today: NaiveDate,
) -> DashboardStats {
    let active_bills = || bills.iter().filter(|b| b.is_active);

    DashboardStats {
        active_tasks: active_todos.len(),
        bills_due_week: active_bills()
            .filter(|b| within_week(b.due_date, today))
            .map(|b| b.amount)
            .sum(),
        overdue_bills: active_bills()
            .filter(|b| days_until_due(b.due_date, today) < 0)
            .count(),
        jobs_this_week: jobs
            .iter()
            .filter(|j| j.scheduled_date.is_some_and(|d| within_week(d, today)))
            .count(),
        pipeline_value: jobs
            .iter()
            .filter(|j| JobStatus::PIPELINE.contains(&j.status))
            .filter_map(|j| j.quote_amount)
            .sum(),
    }
}
