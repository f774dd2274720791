//! HTTP surface: router, `/evaluate` handler and the serve loop.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::body::{to_bytes, Body};
use axum::extract::{ConnectInfo, Request, State};
use axum::http::header::ORIGIN;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::net::TcpListener;
use tracing::{field, Instrument, Span};
use uuid::Uuid;

use thinkgrade_core::engine::EvaluationEngine;
use thinkgrade_core::model::{EvaluationRequest, Feedback};
use thinkgrade_providers::create_provider;

use crate::admission::{client_key, cors_headers, FixedWindowLimiter, RateLimitStore};
use crate::config::{AdmissionConfig, GatewayConfig};
use crate::error::GatewayError;
use crate::notifier::ChatworkNotifier;
use crate::tasks::BackgroundTasks;

/// Request bodies above this are rejected as invalid.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// How long shutdown waits for pending notifications.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// Everything a request handler needs, built once per process.
#[derive(Clone)]
pub struct AppState {
    admission: Arc<AdmissionConfig>,
    limiter: Arc<dyn RateLimitStore>,
    engine: Arc<EvaluationEngine>,
    notifier: Arc<ChatworkNotifier>,
    tasks: BackgroundTasks,
}

impl AppState {
    pub fn new(
        admission: AdmissionConfig,
        limiter: Arc<dyn RateLimitStore>,
        engine: EvaluationEngine,
        notifier: ChatworkNotifier,
    ) -> Self {
        Self {
            admission: Arc::new(admission),
            limiter,
            engine: Arc::new(engine),
            notifier: Arc::new(notifier),
            tasks: BackgroundTasks::new(),
        }
    }

    pub fn from_config(config: &GatewayConfig) -> anyhow::Result<Self> {
        let provider = create_provider(&config.llm.provider)?;
        let engine = EvaluationEngine::new(provider, config.llm.engine_config());
        let limiter = Arc::new(FixedWindowLimiter::from_config(&config.admission));
        let notifier = ChatworkNotifier::new(config.notifier.clone())?;

        if config.admission.allowed_origin.is_empty() {
            tracing::warn!(
                dev_origin = %config.admission.dev_origin,
                "no allowed_origin configured; only the development origin is accepted"
            );
        }
        if config.llm.provider.api_key().is_empty() {
            tracing::warn!(
                "{} is not set; every evaluation will fail",
                config.llm.provider.key_env_var()
            );
        }

        Ok(Self::new(
            config.admission.clone(),
            limiter,
            engine,
            notifier,
        ))
    }

    /// The background task set notifications are spawned on.
    pub fn tasks(&self) -> &BackgroundTasks {
        &self.tasks
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/evaluate", post(evaluate).fallback(fallback))
        .route("/healthz", get(healthz).fallback(fallback))
        .fallback(fallback)
        .with_state(state)
}

async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// `OPTIONS` anywhere is a preflight; everything else unrouted is 404.
async fn fallback(State(state): State<AppState>, method: Method, headers: HeaderMap) -> Response {
    if method != Method::OPTIONS {
        return GatewayError::NotFound.into_response();
    }
    let origin = headers.get(ORIGIN).and_then(|v| v.to_str().ok());
    match cors_headers(origin, &state.admission) {
        Some(cors) => (StatusCode::NO_CONTENT, cors).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

async fn evaluate(State(state): State<AppState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();

    let origin = parts.headers.get(ORIGIN).and_then(|v| v.to_str().ok());
    let Some(cors) = cors_headers(origin, &state.admission) else {
        tracing::warn!(origin = origin.unwrap_or("<none>"), "origin not allowed");
        return GatewayError::Forbidden.into_response();
    };

    let peer = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);
    let client = client_key(&parts.headers, peer);

    let span = tracing::info_span!(
        "evaluate",
        request_id = %Uuid::new_v4(),
        client = %client,
        exercise_id = field::Empty,
    );

    let (with_cors, mut response) = match handle_evaluate(&state, &client, body)
        .instrument(span)
        .await
    {
        Ok(feedback) => (true, (StatusCode::OK, Json(feedback)).into_response()),
        Err(e) => (e.allows_cors(), e.into_response()),
    };
    if with_cors {
        response.headers_mut().extend(cors);
    }
    response
}

async fn handle_evaluate(
    state: &AppState,
    client: &str,
    body: Body,
) -> Result<Feedback, GatewayError> {
    if !state.limiter.check_and_increment(client) {
        tracing::warn!("rate limit exceeded");
        return Err(GatewayError::RateLimited);
    }

    let bytes = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| GatewayError::Validation(format!("failed to read request body: {e}")))?;
    let request: EvaluationRequest = serde_json::from_slice(&bytes)
        .map_err(|e| GatewayError::Validation(format!("invalid request body: {e}")))?;

    Span::current().record("exercise_id", request.exercise_id.as_str());
    request.validate().map_err(GatewayError::Validation)?;

    let feedback = state
        .engine
        .evaluate(&request)
        .await
        .inspect_err(|e| match e.provider_error() {
            Some(p) if p.is_configuration() => {
                tracing::error!("gateway misconfigured: {e:#}")
            }
            _ => tracing::warn!("evaluation failed: {e:#}"),
        })?;
    tracing::info!(score = feedback.score, "evaluation complete");

    let notifier = state.notifier.clone();
    let result = feedback.clone();
    state.tasks.spawn(
        async move {
            notifier
                .notify(&request.exercise_id, &request.answer_text, &result)
                .await;
        }
        .instrument(Span::current()),
    );

    Ok(feedback)
}

/// Serve on `listener` until `shutdown` resolves, then drain pending
/// notifications.
pub async fn run<F>(listener: TcpListener, state: AppState, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let tasks = state.tasks.clone();
    let app = router(state).into_make_service_with_connect_info::<SocketAddr>();

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("server error")?;

    if !tasks.drain_timeout(SHUTDOWN_GRACE).await {
        tracing::warn!(pending = tasks.len(), "shutdown with notifications still pending");
    }
    Ok(())
}

/// Bind the configured address and serve until Ctrl-C.
pub async fn serve(config: GatewayConfig) -> anyhow::Result<()> {
    let state = AppState::from_config(&config)?;
    let listener = TcpListener::bind(&config.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.listen))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        provider = config.llm.provider.kind(),
        model = %config.llm.model,
        "gateway listening"
    );

    run(listener, state, shutdown_signal()).await?;
    tracing::info!("gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
