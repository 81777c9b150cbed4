//! HTTP boundary for sheetwise.
//!
//! Routes:
//! - `POST /api/query` — `{"query": "..."}` → `{"response": "..."}` or `{"error": "..."}`
//! - `GET /api/health` — liveness
//! - `GET /` — service index
//!
//! Built on Axum. Shared state is immutable and built once at startup.

use axum::body::Bytes;
use axum::extract::DefaultBodyLimit;
use axum::extract::rejection::BytesRejection;
use axum::{
    Router,
    extract::State,
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use sheetwise_agent::{FailureKind, QueryEngine, ResultEnvelope, SecretScrubber, respond};
use sheetwise_config::{AppConfig, GatewayConfig};

/// Shared application state for the gateway.
pub struct AppState {
    pub engine: Arc<dyn QueryEngine>,
    pub scrubber: SecretScrubber,
}

type SharedState = Arc<AppState>;

/// Build the Axum router with all gateway routes.
///
/// Layers: request body limit, optional CORS allow-list, HTTP trace logging.
pub fn build_router(state: SharedState, config: &GatewayConfig) -> Router {
    let mut router = Router::new()
        .route("/", get(index_handler))
        .route("/api/health", get(health_handler))
        .route("/api/query", post(query_handler))
        .fallback(not_found_handler)
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.max_body_bytes));

    if let Some(cors) = cors_layer(&config.allowed_origins) {
        router = router.layer(cors);
    }

    router.layer(tower_http::trace::TraceLayer::new_for_http())
}

/// CORS for the configured origins. `None` when the list is empty, which
/// leaves cross-origin requests to the browser's same-origin policy.
fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if parsed.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(parsed)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE])
            .max_age(std::time::Duration::from_secs(3600)),
    )
}

/// Start the gateway HTTP server.
///
/// Provider, tabular source, and persona are built once and shared
/// read-only by every request.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let engine = sheetwise_agent::build_engine_from_config(&config)?;
    let state = Arc::new(AppState {
        engine,
        scrubber: SecretScrubber::new(config.secret_values()),
    });

    let app = build_router(state, &config.gateway);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn status_for(envelope: &ResultEnvelope) -> StatusCode {
    match envelope.failure_kind() {
        None => StatusCode::OK,
        Some(FailureKind::Input) => StatusCode::BAD_REQUEST,
        Some(FailureKind::ContextFetch | FailureKind::ModelInvocation) => StatusCode::BAD_GATEWAY,
        Some(FailureKind::Internal) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// --- Handlers ---

#[derive(Deserialize)]
struct QueryRequest {
    #[serde(default)]
    query: Option<String>,
}

/// The body is parsed by hand so that a missing body, a wrong content type,
/// and malformed JSON all collapse into the same input error. A body that
/// cannot be buffered still gets a JSON error.
async fn query_handler(
    State(state): State<SharedState>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            let status = rejection.status();
            warn!(status = status.as_u16(), "Query body rejected");
            let message = if status == StatusCode::PAYLOAD_TOO_LARGE {
                "Request body too large"
            } else {
                "No query provided"
            };
            return (status, Json(serde_json::json!({ "error": message }))).into_response();
        }
    };

    let query = serde_json::from_slice::<QueryRequest>(&body)
        .ok()
        .and_then(|r| r.query);

    let envelope = respond(state.engine.as_ref(), &state.scrubber, query.as_deref()).await;
    let status = status_for(&envelope);

    if status.is_success() {
        info!(mode = state.engine.mode(), "Query answered");
    } else {
        warn!(status = status.as_u16(), mode = state.engine.mode(), "Query failed");
    }

    (status, Json(envelope)).into_response()
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}

#[derive(Serialize)]
struct Endpoints {
    query: &'static str,
    health: &'static str,
}

#[derive(Serialize)]
struct IndexResponse {
    status: &'static str,
    version: &'static str,
    endpoints: Endpoints,
}

async fn index_handler() -> Json<IndexResponse> {
    Json(IndexResponse {
        status: "running",
        version: env!("CARGO_PKG_VERSION"),
        endpoints: Endpoints {
            query: "/api/query",
            health: "/api/health",
        },
    })
}

async fn not_found_handler() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "Not found" })),
    )
}
