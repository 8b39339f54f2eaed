use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Form, Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::time::{Duration, sleep};

pub const PATH_CUSTOMERS: &str = "/v1/customers";

/// Canned failure the fake API answers every request with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::EnumString, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum FailureMode {
    #[default]
    None,
    CardDeclined,
    ExpiredCard,
    IncorrectCvc,
    IncorrectZip,
    InvalidRequest,
    RateLimited,
    ApiError,
}

#[derive(Debug, Clone, Default)]
pub struct TestServerBehavior {
    /// Added to every request before it is answered.
    pub latency: Duration,
    pub failure: FailureMode,
    /// If set, requests without `Authorization: Bearer <key>` get a 401.
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TestServerStats {
    requests_total: Arc<AtomicU64>,
    in_flight: Arc<AtomicU64>,
    max_in_flight: Arc<AtomicU64>,
    unauthorized_total: Arc<AtomicU64>,
    descriptions: Arc<Mutex<Vec<String>>>,
}

impl TestServerStats {
    fn enter(&self) -> InFlight {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        InFlight {
            in_flight: self.in_flight.clone(),
        }
    }

    fn push_description(&self, description: String) {
        self.descriptions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(description);
    }

    pub fn requests_total(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed)
    }

    /// Highest number of requests the server was handling at the same time.
    pub fn max_in_flight(&self) -> u64 {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn unauthorized_total(&self) -> u64 {
        self.unauthorized_total.load(Ordering::Relaxed)
    }

    pub fn descriptions(&self) -> Vec<String> {
        self.descriptions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

struct InFlight {
    in_flight: Arc<AtomicU64>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone)]
struct AppState {
    stats: TestServerStats,
    behavior: Arc<TestServerBehavior>,
}

#[derive(Debug, Deserialize)]
struct CreateCustomerForm {
    description: Option<String>,
}

#[derive(Debug, Serialize)]
struct CustomerBody {
    id: String,
    object: &'static str,
    description: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    decline_code: Option<&'static str>,
    message: &'static str,
}

fn error_response(failure: FailureMode) -> Option<(StatusCode, ErrorBody)> {
    let (status, kind, code, decline_code, message) = match failure {
        FailureMode::None => return None,
        FailureMode::CardDeclined => (
            StatusCode::PAYMENT_REQUIRED,
            "card_error",
            Some("card_declined"),
            Some("generic_decline"),
            "Your card was declined.",
        ),
        FailureMode::ExpiredCard => (
            StatusCode::PAYMENT_REQUIRED,
            "card_error",
            Some("expired_card"),
            None,
            "Your card has expired.",
        ),
        FailureMode::IncorrectCvc => (
            StatusCode::PAYMENT_REQUIRED,
            "card_error",
            Some("incorrect_cvc"),
            None,
            "Your card's security code is incorrect.",
        ),
        FailureMode::IncorrectZip => (
            StatusCode::PAYMENT_REQUIRED,
            "card_error",
            Some("incorrect_zip"),
            None,
            "The zip code you supplied failed validation.",
        ),
        FailureMode::InvalidRequest => (
            StatusCode::BAD_REQUEST,
            "invalid_request_error",
            Some("parameter_unknown"),
            None,
            "Received unknown parameter.",
        ),
        FailureMode::RateLimited => (
            StatusCode::TOO_MANY_REQUESTS,
            "rate_limit_error",
            None,
            None,
            "Too many requests hit the API too quickly.",
        ),
        FailureMode::ApiError => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "api_error",
            None,
            None,
            "An unknown error occurred.",
        ),
    };

    Some((
        status,
        ErrorBody {
            kind,
            code,
            decline_code,
            message,
        },
    ))
}

fn authorized(headers: &HeaderMap, api_key: Option<&str>) -> bool {
    let Some(key) = api_key else {
        return true;
    };
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        == Some(key)
}

async fn handle_create_customer(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<CreateCustomerForm>,
) -> (StatusCode, Json<serde_json::Value>) {
    let _in_flight = state.stats.enter();
    let n = state.stats.requests_total();

    if !state.behavior.latency.is_zero() {
        sleep(state.behavior.latency).await;
    }

    if !authorized(&headers, state.behavior.api_key.as_deref()) {
        state.stats.unauthorized_total.fetch_add(1, Ordering::Relaxed);
        let body = ErrorEnvelope {
            error: ErrorBody {
                kind: "authentication_error",
                code: None,
                decline_code: None,
                message: "Invalid API Key provided.",
            },
        };
        return (StatusCode::UNAUTHORIZED, Json(to_json(&body)));
    }

    if let Some(description) = &form.description {
        state.stats.push_description(description.clone());
    }

    match error_response(state.behavior.failure) {
        Some((status, error)) => (status, Json(to_json(&ErrorEnvelope { error }))),
        None => {
            let body = CustomerBody {
                id: format!("cus_test{n:08}"),
                object: "customer",
                description: form.description,
            };
            (StatusCode::OK, Json(to_json(&body)))
        }
    }
}

fn to_json<T: Serialize>(v: &T) -> serde_json::Value {
    serde_json::to_value(v).unwrap_or(serde_json::Value::Null)
}

pub fn router(stats: TestServerStats, behavior: TestServerBehavior) -> Router {
    let state = AppState {
        stats,
        behavior: Arc::new(behavior),
    };
    Router::new()
        .route(PATH_CUSTOMERS, post(handle_create_customer))
        .with_state(state)
}

pub struct TestServer {
    base_url: String,
    stats: TestServerStats,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    pub async fn start() -> std::io::Result<Self> {
        Self::start_with(TestServerBehavior::default()).await
    }

    pub async fn start_with(behavior: TestServerBehavior) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let stats = TestServerStats::default();
        let app = router(stats.clone(), behavior);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            let _ = serve.await;
        });

        Ok(Self {
            base_url: format!("http://{addr}"),
            stats,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn stats(&self) -> &TestServerStats {
        &self.stats
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if self.shutdown_tx.is_some()
            && let Some(task) = self.task.take()
        {
            task.abort();
        }
    }
}
