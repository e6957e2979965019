//! Integration tests for the PostgREST table store.
//!
//! Each test runs a fake PostgREST server on a random port that records the
//! requests it receives and answers with canned rows.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::routing::any;
use chrono::Utc;
use rust_decimal_macros::dec;
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::time::timeout;
use uuid::Uuid;

use homebase::config::RestStoreConfig;
use homebase::error::StoreError;
use homebase::model::{Bill, BillDraft, Draft};
use homebase::repo::{Repository, changes};
use homebase::session::Session;
use homebase::store::{Query, RestStore, TableStore};

const TEST_TIMEOUT: Duration = Duration::from_secs(5);
const API_KEY: &str = "anon-test-key";

#[derive(Debug, Clone)]
struct Captured {
    method: Method,
    table: String,
    query: String,
    headers: HeaderMap,
    body: Value,
}

impl Captured {
    fn param(&self, key: &str) -> Option<String> {
        url_pairs(&self.query)
            .into_iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }
}

fn url_pairs(query: &str) -> Vec<(String, String)> {
    reqwest::Url::parse(&format!("http://x/?{query}"))
        .unwrap()
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

#[derive(Clone, Default)]
struct Fake {
    requests: Arc<Mutex<Vec<Captured>>>,
    rows: Arc<Mutex<Vec<Value>>>,
}

async fn handle(
    State(fake): State<Fake>,
    Path(table): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    fake.requests.lock().await.push(Captured {
        method: method.clone(),
        table: table.clone(),
        query: uri.query().unwrap_or_default().to_string(),
        headers: headers.clone(),
        body: body.clone(),
    });

    if headers.get("apikey").and_then(|v| v.to_str().ok()) != Some(API_KEY) {
        return (
            StatusCode::UNAUTHORIZED,
            axum::Json(json!({"message": "Invalid API key", "hint": null})),
        );
    }

    let mut rows = fake.rows.lock().await;
    match method {
        Method::POST => {
            rows.push(body.clone());
            (StatusCode::CREATED, axum::Json(json!([body])))
        }
        Method::PATCH => {
            let updated: Vec<Value> = rows
                .iter_mut()
                .map(|row| {
                    if let (Value::Object(obj), Value::Object(changes)) = (&mut *row, &body) {
                        for (k, v) in changes {
                            obj.insert(k.clone(), v.clone());
                        }
                    }
                    row.clone()
                })
                .collect();
            (StatusCode::OK, axum::Json(Value::Array(updated)))
        }
        Method::DELETE => {
            let deleted: Vec<Value> = rows.drain(..).collect();
            (StatusCode::OK, axum::Json(Value::Array(deleted)))
        }
        _ => (StatusCode::OK, axum::Json(Value::Array(rows.clone()))),
    }
}

/// Start the fake server, return (store, fake).
async fn start_fake(api_key: &str) -> (Arc<dyn TableStore>, Fake) {
    let fake = Fake::default();
    let app = Router::new()
        .route("/rest/v1/{table}", any(handle))
        .with_state(fake.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let store = RestStore::new(&RestStoreConfig {
        url: format!("http://127.0.0.1:{port}/"),
        api_key: SecretString::from(api_key.to_string()),
    });
    (Arc::new(store), fake)
}

fn bill() -> Bill {
    BillDraft::new("Power", dec!(92.40), Utc::now().date_naive())
        .into_record(Session::demo().user_id(), Utc::now())
        .unwrap()
}

#[tokio::test]
async fn select_sends_filters_order_limit_and_headers() {
    timeout(TEST_TIMEOUT, async {
        let (store, fake) = start_fake(API_KEY).await;
        let query = Query::new()
            .eq("user_id", Session::demo().user_id().to_string())
            .eq("is_active", true)
            .gte("due_date", "2026-10-14")
            .asc("due_date")
            .limit(10);

        let rows = store.select("bills", &query).await.unwrap();
        assert!(rows.is_empty());

        let requests = fake.requests.lock().await;
        let req = &requests[0];
        assert_eq!(req.method, Method::GET);
        assert_eq!(req.table, "bills");
        assert_eq!(req.param("select").as_deref(), Some("*"));
        assert_eq!(
            req.param("user_id"),
            Some(format!("eq.{}", Session::demo().user_id()))
        );
        assert_eq!(req.param("is_active").as_deref(), Some("eq.true"));
        assert_eq!(req.param("due_date").as_deref(), Some("gte.2026-10-14"));
        assert_eq!(req.param("order").as_deref(), Some("due_date.asc.nullslast"));
        assert_eq!(req.param("limit").as_deref(), Some("10"));
        assert_eq!(req.headers["apikey"], API_KEY);
        assert_eq!(req.headers["authorization"], format!("Bearer {API_KEY}"));
        assert_eq!(req.headers["prefer"], "return=representation");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn repository_round_trip_through_rest() {
    timeout(TEST_TIMEOUT, async {
        let (store, fake) = start_fake(API_KEY).await;
        let repo = Repository::<Bill>::new(store, Session::demo());
        let bill = bill();

        let stored = repo.insert(&bill).await.unwrap();
        assert_eq!(stored.id, bill.id);
        assert_eq!(stored.amount, dec!(92.40));

        let updated = repo
            .update(bill.id, changes([("autopay", true)]))
            .await
            .unwrap();
        assert!(updated.autopay);

        repo.delete(bill.id).await.unwrap();

        let requests = fake.requests.lock().await;
        let methods: Vec<_> = requests.iter().map(|r| r.method.clone()).collect();
        assert_eq!(methods, vec![Method::POST, Method::PATCH, Method::DELETE]);

        let insert = &requests[0];
        assert_eq!(insert.body["account_name"], "Power");
        assert_eq!(insert.body["is_active"], true);

        let patch = &requests[1];
        assert_eq!(patch.param("id"), Some(format!("eq.{}", bill.id)));
        assert_eq!(
            patch.param("user_id"),
            Some(format!("eq.{}", Session::demo().user_id()))
        );
        assert_eq!(patch.body["autopay"], true);
        assert!(patch.body.get("updated_at").is_some());
        assert!(patch.body.get("amount").is_none());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn rejected_request_keeps_server_message() {
    timeout(TEST_TIMEOUT, async {
        let (store, _fake) = start_fake("wrong-key").await;
        let err = store.select("todos", &Query::new()).await.unwrap_err();
        match err {
            StoreError::Rejected { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid API key");
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn unknown_columns_never_leave_the_process() {
    timeout(TEST_TIMEOUT, async {
        let (store, fake) = start_fake(API_KEY).await;
        let err = store
            .select("bills", &Query::new().eq("password", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownColumn { .. }));

        let err = store.delete("bills", &[]).await.unwrap_err();
        assert!(matches!(err, StoreError::Query(_)));

        assert!(fake.requests.lock().await.is_empty());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn missing_row_on_update_is_not_found() {
    timeout(TEST_TIMEOUT, async {
        let (store, _fake) = start_fake(API_KEY).await;
        let repo = Repository::<Bill>::new(store, Session::demo());
        let err = repo
            .update(Uuid::new_v4(), changes([("autopay", true)]))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    })
    .await
    .expect("test timed out");
}
