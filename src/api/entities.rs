//! Per-entity list and mutation routes.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::{AppState, DeleteParams, load_failed, not_found, parse_id, reply};
use crate::collection::{Collection, Outcome};
use crate::error::StoreError;
use crate::filter::{AccountFilter, BillFilter, IncomeFilter, JobFilter, TodoFilter, ViewFilter};
use crate::model::{AccountDraft, BillDraft, IncomeDraft, JobDraft, JobStatus, Record, TodoDraft};
use crate::recurrence::today;
use crate::stats::{account_stats, bill_stats, income_stats, job_stats};
use crate::views::{AccountsView, BillsView, IncomeView, JobsView, TodosView};

type Reply = Result<Response, Response>;

fn loaded<T>(result: Result<T, StoreError>, noun: &str) -> Result<T, Response> {
    result.map_err(|e| load_failed(noun, e))
}

/// The record must be in the freshly loaded list.
fn existing<T: Record>(items: &Collection<T>, id: Uuid) -> Result<(), Response> {
    match items.get(id) {
        Some(_) => Ok(()),
        None => Err(not_found(T::NOUN)),
    }
}

fn created<T: serde::Serialize>(outcome: Outcome<T>) -> Reply {
    Ok(reply(outcome, StatusCode::CREATED))
}

fn done<T: serde::Serialize>(outcome: Outcome<T>) -> Reply {
    Ok(reply(outcome, StatusCode::OK))
}

// ── Todos ───────────────────────────────────────────────────────────

pub(super) async fn list_todos(
    State(state): State<AppState>,
    Query(filter): Query<TodoFilter>,
) -> Reply {
    let view = TodosView::new(state.store, state.session);
    let todos = loaded(view.list().await, "todos")?;
    let items = filter.apply(todos.items(), today());
    Ok(Json(json!({
        "items": items,
        "total": todos.len(),
        "active_filters": filter.active_count(),
    }))
    .into_response())
}

pub(super) async fn create_todo(
    State(state): State<AppState>,
    Json(draft): Json<TodoDraft>,
) -> Reply {
    let view = TodosView::new(state.store, state.session);
    created(view.create(&mut Collection::new(Vec::new()), draft).await)
}

pub(super) async fn update_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(draft): Json<TodoDraft>,
) -> Reply {
    let id = parse_id(&id)?;
    let view = TodosView::new(state.store, state.session);
    let mut todos = loaded(view.list().await, "todos")?;
    existing(&todos, id)?;
    done(view.update(&mut todos, id, draft).await)
}

pub(super) async fn toggle_todo_focus(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Reply {
    let id = parse_id(&id)?;
    let view = TodosView::new(state.store, state.session);
    let mut todos = loaded(view.list().await, "todos")?;
    existing(&todos, id)?;
    done(view.toggle_focus(&mut todos, id).await)
}

pub(super) async fn mark_todo_done(State(state): State<AppState>, Path(id): Path<String>) -> Reply {
    let id = parse_id(&id)?;
    let view = TodosView::new(state.store, state.session);
    let mut todos = loaded(view.list().await, "todos")?;
    existing(&todos, id)?;
    done(view.mark_done(&mut todos, id).await)
}

pub(super) async fn reopen_todo(State(state): State<AppState>, Path(id): Path<String>) -> Reply {
    let id = parse_id(&id)?;
    let view = TodosView::new(state.store, state.session);
    let mut todos = loaded(view.list().await, "todos")?;
    existing(&todos, id)?;
    done(view.reopen(&mut todos, id).await)
}

pub(super) async fn delete_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<DeleteParams>,
) -> Reply {
    let id = parse_id(&id)?;
    let view = TodosView::new(state.store, state.session);
    let mut todos = loaded(view.list().await, "todos")?;
    existing(&todos, id)?;
    done(view.delete(&mut todos, id, params.confirmation()).await)
}

// ── Bills ───────────────────────────────────────────────────────────

pub(super) async fn list_bills(
    State(state): State<AppState>,
    Query(filter): Query<BillFilter>,
) -> Reply {
    let today = today();
    let view = BillsView::new(state.store, state.session);
    let bills = loaded(view.list(today).await, "bills")?;
    Ok(Json(json!({
        "items": filter.apply(bills.items(), today),
        "total": bills.len(),
        "active_filters": filter.active_count(),
        "stats": bill_stats(bills.items()),
    }))
    .into_response())
}

pub(super) async fn create_bill(
    State(state): State<AppState>,
    Json(draft): Json<BillDraft>,
) -> Reply {
    let view = BillsView::new(state.store, state.session);
    created(view.create(&mut Collection::new(Vec::new()), draft).await)
}

pub(super) async fn update_bill(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(draft): Json<BillDraft>,
) -> Reply {
    let id = parse_id(&id)?;
    let view = BillsView::new(state.store, state.session);
    let mut bills = loaded(view.list(today()).await, "bills")?;
    existing(&bills, id)?;
    done(view.update(&mut bills, id, draft).await)
}

pub(super) async fn archive_bill(State(state): State<AppState>, Path(id): Path<String>) -> Reply {
    let id = parse_id(&id)?;
    let view = BillsView::new(state.store, state.session);
    let mut bills = loaded(view.list(today()).await, "bills")?;
    existing(&bills, id)?;
    done(view.archive(&mut bills, id).await)
}

pub(super) async fn restore_bill(State(state): State<AppState>, Path(id): Path<String>) -> Reply {
    let id = parse_id(&id)?;
    let view = BillsView::new(state.store, state.session);
    let mut bills = loaded(view.list(today()).await, "bills")?;
    existing(&bills, id)?;
    done(view.restore(&mut bills, id).await)
}

pub(super) async fn delete_bill(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<DeleteParams>,
) -> Reply {
    let id = parse_id(&id)?;
    let view = BillsView::new(state.store, state.session);
    let mut bills = loaded(view.list(today()).await, "bills")?;
    existing(&bills, id)?;
    done(view.delete(&mut bills, id, params.confirmation()).await)
}

// ── Income ──────────────────────────────────────────────────────────

pub(super) async fn list_income(
    State(state): State<AppState>,
    Query(filter): Query<IncomeFilter>,
) -> Reply {
    let today = today();
    let view = IncomeView::new(state.store, state.session);
    let list = loaded(view.list(today).await, "income sources")?;
    let income = list.income.items();
    Ok(Json(json!({
        "items": filter.apply(income, today),
        "total": income.len(),
        "active_filters": filter.active_count(),
        "accounts": list.accounts,
        "stats": income_stats(income, today),
    }))
    .into_response())
}

pub(super) async fn create_income(
    State(state): State<AppState>,
    Json(draft): Json<IncomeDraft>,
) -> Reply {
    let view = IncomeView::new(state.store, state.session);
    created(view.create(&mut Collection::new(Vec::new()), draft).await)
}

pub(super) async fn update_income(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(draft): Json<IncomeDraft>,
) -> Reply {
    let id = parse_id(&id)?;
    let view = IncomeView::new(state.store, state.session);
    let mut list = loaded(view.list(today()).await, "income sources")?;
    existing(&list.income, id)?;
    done(view.update(&mut list.income, id, draft).await)
}

pub(super) async fn toggle_income(State(state): State<AppState>, Path(id): Path<String>) -> Reply {
    let id = parse_id(&id)?;
    let view = IncomeView::new(state.store, state.session);
    let mut list = loaded(view.list(today()).await, "income sources")?;
    existing(&list.income, id)?;
    done(view.toggle_active(&mut list.income, id).await)
}

pub(super) async fn delete_income(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<DeleteParams>,
) -> Reply {
    let id = parse_id(&id)?;
    let view = IncomeView::new(state.store, state.session);
    let mut list = loaded(view.list(today()).await, "income sources")?;
    existing(&list.income, id)?;
    done(view.delete(&mut list.income, id, params.confirmation()).await)
}

// ── Accounts ────────────────────────────────────────────────────────

pub(super) async fn list_accounts(
    State(state): State<AppState>,
    Query(filter): Query<AccountFilter>,
) -> Reply {
    let view = AccountsView::new(state.store, state.session);
    let accounts = loaded(view.list().await, "accounts")?;
    Ok(Json(json!({
        "items": filter.apply(accounts.items(), today()),
        "total": accounts.len(),
        "active_filters": filter.active_count(),
        "stats": account_stats(accounts.items()),
    }))
    .into_response())
}

pub(super) async fn create_account(
    State(state): State<AppState>,
    Json(draft): Json<AccountDraft>,
) -> Reply {
    let view = AccountsView::new(state.store, state.session);
    created(view.create(&mut Collection::new(Vec::new()), draft).await)
}

pub(super) async fn update_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(draft): Json<AccountDraft>,
) -> Reply {
    let id = parse_id(&id)?;
    let view = AccountsView::new(state.store, state.session);
    let mut accounts = loaded(view.list().await, "accounts")?;
    existing(&accounts, id)?;
    done(view.update(&mut accounts, id, draft).await)
}

pub(super) async fn toggle_account(State(state): State<AppState>, Path(id): Path<String>) -> Reply {
    let id = parse_id(&id)?;
    let view = AccountsView::new(state.store, state.session);
    let mut accounts = loaded(view.list().await, "accounts")?;
    existing(&accounts, id)?;
    done(view.toggle_active(&mut accounts, id).await)
}

pub(super) async fn delete_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<DeleteParams>,
) -> Reply {
    let id = parse_id(&id)?;
    let view = AccountsView::new(state.store, state.session);
    let mut accounts = loaded(view.list().await, "accounts")?;
    existing(&accounts, id)?;
    done(view.delete(&mut accounts, id, params.confirmation()).await)
}

// ── Jobs ────────────────────────────────────────────────────────────

pub(super) async fn list_jobs(
    State(state): State<AppState>,
    Query(filter): Query<JobFilter>,
) -> Reply {
    let view = JobsView::new(state.store, state.session);
    let jobs = loaded(view.list().await, "jobs")?;
    Ok(Json(json!({
        "items": filter.apply(jobs.items(), today()),
        "total": jobs.len(),
        "active_filters": filter.active_count(),
        "stats": job_stats(jobs.items()),
    }))
    .into_response())
}

pub(super) async fn create_job(State(state): State<AppState>, Json(draft): Json<JobDraft>) -> Reply {
    let view = JobsView::new(state.store, state.session);
    created(view.create(&mut Collection::new(Vec::new()), draft).await)
}

pub(super) async fn update_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(draft): Json<JobDraft>,
) -> Reply {
    let id = parse_id(&id)?;
    let view = JobsView::new(state.store, state.session);
    let mut jobs = loaded(view.list().await, "jobs")?;
    existing(&jobs, id)?;
    done(view.update(&mut jobs, id, draft).await)
}

#[derive(Debug, Deserialize)]
pub(super) struct StatusRequest {
    status: JobStatus,
}

pub(super) async fn update_job_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<StatusRequest>,
) -> Reply {
    let id = parse_id(&id)?;
    let view = JobsView::new(state.store, state.session);
    let mut jobs = loaded(view.list().await, "jobs")?;
    existing(&jobs, id)?;
    done(view.update_status(&mut jobs, id, body.status).await)
}

pub(super) async fn delete_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<DeleteParams>,
) -> Reply {
    let id = parse_id(&id)?;
    let view = JobsView::new(state.store, state.session);
    let mut jobs = loaded(view.list().await, "jobs")?;
    existing(&jobs, id)?;
    done(view.delete(&mut jobs, id, params.confirmation()).await)
}
