//! HTTP API over the views.
//!
//! Every request builds its views from shared state, loads a fresh
//! collection, applies at most one mutation and answers with the data plus a
//! `notice`.

mod entities;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;
use uuid::Uuid;

use crate::collection::{Confirmation, Notice, NoticeLevel, Outcome};
use crate::config::ConfigStatus;
use crate::diagnostics;
use crate::error::StoreError;
use crate::recurrence::today;
use crate::session::Session;
use crate::store::TableStore;
use crate::views::DashboardView;

/// Shared state for all routes.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TableStore>,
    pub session: Session,
    /// Hosted store configuration, reported by diagnostics.
    pub store_status: ConfigStatus,
}

impl AppState {
    pub fn new(store: Arc<dyn TableStore>, session: Session, store_status: ConfigStatus) -> Self {
        Self {
            store,
            session,
            store_status,
        }
    }
}

/// Build the full router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/diagnostics", get(get_diagnostics))
        .route("/api/dashboard", get(get_dashboard))
        .route("/api/todos", get(entities::list_todos).post(entities::create_todo))
        .route(
            "/api/todos/{id}",
            put(entities::update_todo).delete(entities::delete_todo),
        )
        .route("/api/todos/{id}/focus", post(entities::toggle_todo_focus))
        .route("/api/todos/{id}/done", post(entities::mark_todo_done))
        .route("/api/todos/{id}/reopen", post(entities::reopen_todo))
        .route("/api/bills", get(entities::list_bills).post(entities::create_bill))
        .route(
            "/api/bills/{id}",
            put(entities::update_bill).delete(entities::delete_bill),
        )
        .route("/api/bills/{id}/archive", post(entities::archive_bill))
        .route("/api/bills/{id}/restore", post(entities::restore_bill))
        .route("/api/income", get(entities::list_income).post(entities::create_income))
        .route(
            "/api/income/{id}",
            put(entities::update_income).delete(entities::delete_income),
        )
        .route("/api/income/{id}/toggle", post(entities::toggle_income))
        .route(
            "/api/accounts",
            get(entities::list_accounts).post(entities::create_account),
        )
        .route(
            "/api/accounts/{id}",
            put(entities::update_account).delete(entities::delete_account),
        )
        .route("/api/accounts/{id}/toggle", post(entities::toggle_account))
        .route("/api/jobs", get(entities::list_jobs).post(entities::create_job))
        .route(
            "/api/jobs/{id}",
            put(entities::update_job).delete(entities::delete_job),
        )
        .route("/api/jobs/{id}/status", post(entities::update_job_status))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ── Shared responses ────────────────────────────────────────────────

/// Status code for a mutation outcome.
fn notice_status(notice: &Notice, success: StatusCode) -> StatusCode {
    match notice.level {
        NoticeLevel::Success => success,
        NoticeLevel::Warning => StatusCode::UNPROCESSABLE_ENTITY,
        NoticeLevel::Info => StatusCode::BAD_REQUEST,
        NoticeLevel::Error => StatusCode::BAD_GATEWAY,
    }
}

fn reply<T: Serialize>(outcome: Outcome<T>, success: StatusCode) -> Response {
    let status = notice_status(&outcome.notice, success);
    (
        status,
        Json(json!({ "data": outcome.record, "notice": outcome.notice })),
    )
        .into_response()
}

fn bad_id() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "notice": Notice::error("Invalid id") })),
    )
        .into_response()
}

fn not_found(noun: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "notice": Notice::error(format!("That {noun} no longer exists.")) })),
    )
        .into_response()
}

/// A list load failed before any mutation could run.
fn load_failed(noun: &str, e: StoreError) -> Response {
    warn!(noun, error = %e, "Failed to load records");
    (
        StatusCode::BAD_GATEWAY,
        Json(json!({
            "notice": Notice::error(format!("Failed to load {noun}. Please refresh the page."))
        })),
    )
        .into_response()
}

fn parse_id(raw: &str) -> Result<Uuid, Response> {
    Uuid::parse_str(raw).map_err(|_| bad_id())
}

#[derive(Debug, Default, Deserialize)]
struct DeleteParams {
    #[serde(default)]
    confirm: bool,
}

impl DeleteParams {
    fn confirmation(&self) -> Confirmation {
        Confirmation::from(self.confirm)
    }
}

// ── Routes ──────────────────────────────────────────────────────────

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "homebase",
        "backend": state.store.backend(),
    }))
}

/// GET /api/diagnostics
///
/// 200 when the store answered, 503 otherwise. The body explains which.
async fn get_diagnostics(State(state): State<AppState>) -> impl IntoResponse {
    let report = diagnostics::run(state.store, state.session, &state.store_status).await;
    let status = if report.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(json!(report)))
}

async fn get_dashboard(State(state): State<AppState>) -> Response {
    let view = DashboardView::new(state.store, state.session);
    match view.load(today()).await {
        Ok(dashboard) => Json(json!(dashboard)).into_response(),
        Err(e) => load_failed("dashboard", e),
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::store::LibSqlStore;

    async fn app() -> Router {
        let store: Arc<dyn TableStore> = Arc::new(LibSqlStore::new_memory().await.unwrap());
        router(AppState::new(
            store,
            Session::demo(),
            ConfigStatus::NotConfigured {
                reason: "not set".into(),
            },
        ))
    }

    #[tokio::test]
    async fn health_names_backend() {
        let resp = app()
            .await
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn malformed_id_is_bad_request() {
        let resp = app()
            .await
            .oneshot(
                Request::post("/api/bills/not-a-uuid/archive")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let resp = app()
            .await
            .oneshot(
                Request::post(format!("/api/accounts/{}/toggle", Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn notice_levels_map_to_status_codes() {
        assert_eq!(notice_status(&Notice::success("ok"), StatusCode::CREATED), StatusCode::CREATED);
        assert_eq!(
            notice_status(&Notice::warning("Please enter a title"), StatusCode::OK),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(notice_status(&Notice::info("Delete cancelled."), StatusCode::OK), StatusCode::BAD_REQUEST);
        assert_eq!(notice_status(&Notice::failed("add", "bill"), StatusCode::OK), StatusCode::BAD_GATEWAY);
    }
}
