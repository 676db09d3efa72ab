//! HTTP API for the treasury monitor
//!
//! Read-only snapshot and pricing endpoints plus the usual health and
//! metrics surface:
//! - GET /health - Full health status (JSON)
//! - GET /healthz - Liveness probe
//! - GET /readyz - Readiness probe (first refresh cycle settled)
//! - GET /metrics - Prometheus metrics
//! - GET /treasury - Latest treasury snapshot
//! - GET /chains - Static chain registry and allocations
//! - GET /curve/{chain} - Bonding-curve quote for a mint chain
//! - POST /refresh - Manual refresh trigger
//! - GET /bridge/status - Proxied bridge backend status

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use eyre::eyre;
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::bridge::BridgeStatusClient;
use crate::chains::{self, Chain, RaisedSnapshot};
use crate::curve::{self, PriceCurve};
use crate::metrics::Metrics;
use crate::refresher::{TreasuryHandle, TreasuryView};

/// Shared state for the HTTP server
#[derive(Clone)]
pub struct AppState {
    pub treasury: TreasuryHandle,
    pub metrics: Arc<Metrics>,
    pub bridge: Option<Arc<BridgeStatusClient>>,
    pub curve: PriceCurve,
    pub raised: Arc<RaisedSnapshot>,
    pub instance_id: String,
    pub started_at: Instant,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    instance_id: String,
    uptime_seconds: u64,
    loading: bool,
    total_usd: f64,
    progress_pct: f64,
    last_updated: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct ChainInfo {
    chain: Chain,
    display_name: &'static str,
    symbol: &'static str,
    color: &'static str,
    icon: &'static str,
    redemption_only: bool,
    allocation_fraction: f64,
    max_raise_usd: f64,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    sub_chains: &'static [&'static str],
}

#[derive(Deserialize)]
struct CurveQuery {
    /// USD amount to quote token output for
    usd: Option<f64>,
}

#[derive(Serialize)]
struct CurveResponse {
    chain: Chain,
    price_usd: f64,
    progress_pct: f64,
    raised_usd: f64,
    max_raise_usd: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    usd: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tokens: Option<f64>,
}

/// Health check endpoint handler
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let view = state.treasury.snapshot().await;
    Json(HealthResponse {
        status: "healthy".to_string(),
        instance_id: state.instance_id.clone(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        loading: view.loading,
        total_usd: view.state.total_usd,
        progress_pct: view.state.progress_pct,
        last_updated: view.state.last_updated,
    })
}

/// Liveness probe (always returns OK if server is running)
async fn liveness() -> &'static str {
    "OK"
}

/// Readiness probe (first refresh cycle has settled)
async fn readiness(State(state): State<AppState>) -> Response {
    let view = state.treasury.snapshot().await;
    if view.loading {
        (StatusCode::SERVICE_UNAVAILABLE, "NOT_READY").into_response()
    } else {
        "OK".into_response()
    }
}

/// Prometheus metrics endpoint
async fn prometheus_metrics(State(state): State<AppState>) -> Response {
    let encoder = TextEncoder::new();
    let metric_families = state.metrics.registry.gather();
    let mut buffer = Vec::new();

    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to encode metrics",
        )
            .into_response();
    }

    match Response::builder()
        .header(header::CONTENT_TYPE, encoder.format_type())
        .body(axum::body::Body::from(buffer))
    {
        Ok(resp) => resp,
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to build metrics response",
        )
            .into_response(),
    }
}

/// Latest treasury snapshot
async fn treasury(State(state): State<AppState>) -> Json<TreasuryView> {
    Json(state.treasury.snapshot().await)
}

/// Static chain registry with allocations
async fn chain_registry() -> Json<Vec<ChainInfo>> {
    let registry = chains::all_chains()
        .map(|spec| ChainInfo {
            chain: spec.chain,
            display_name: spec.display_name,
            symbol: spec.symbol,
            color: spec.color,
            icon: spec.icon,
            redemption_only: spec.redemption_only,
            allocation_fraction: chains::allocation_fraction(spec.chain),
            max_raise_usd: chains::max_raise_usd(spec.chain),
            sub_chains: spec.sub_chains,
        })
        .collect();
    Json(registry)
}

/// Bonding-curve quote for a mint chain
async fn curve_quote(
    Path(chain_id): Path<String>,
    Query(query): Query<CurveQuery>,
    State(state): State<AppState>,
) -> Response {
    let chain = match Chain::from_id(&chain_id) {
        Ok(chain) => chain,
        Err(e) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response();
        }
    };

    if chain.spec().redemption_only {
        return (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("{} is a redemption network, not a mint chain", chain),
            }),
        )
            .into_response();
    }

    let raised_usd = state.raised.raised_usd(chain);
    let max_raise = chains::max_raise_usd(chain);
    let tokens = query
        .usd
        .map(|usd| state.curve.tokens_for_chain(chain, &state.raised, usd));

    Json(CurveResponse {
        chain,
        price_usd: state.curve.price_for_chain(chain, &state.raised),
        progress_pct: curve::chain_progress_percent(chain, &state.raised),
        raised_usd,
        max_raise_usd: max_raise,
        usd: query.usd,
        tokens,
    })
    .into_response()
}

/// Manual refresh trigger
async fn trigger_refresh(State(state): State<AppState>) -> StatusCode {
    state.treasury.refresh();
    StatusCode::ACCEPTED
}

/// Proxied bridge backend status
async fn bridge_status(State(state): State<AppState>) -> Response {
    let Some(client) = state.bridge.as_ref() else {
        return (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Bridge status backend not configured".to_string(),
            }),
        )
            .into_response();
    };

    match client.fetch_status().await {
        Ok(status) => Json(status).into_response(),
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

/// Build the router for the monitor API
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/healthz", get(liveness))
        .route("/readyz", get(readiness))
        .route("/metrics", get(prometheus_metrics))
        .route("/treasury", get(treasury))
        .route("/chains", get(chain_registry))
        .route("/curve/{chain}", get(curve_quote))
        .route("/refresh", post(trigger_refresh))
        .route("/bridge/status", get(bridge_status))
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(bind_address: &str, port: u16, state: AppState) -> eyre::Result<()> {
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", bind_address, port)
        .parse()
        .map_err(|e| eyre!("Invalid bind address {}:{}: {}", bind_address, port, e))?;
    info!("API server listening on {}", addr);
    info!("  /health   - Full health status (JSON)");
    info!("  /treasury - Latest treasury snapshot");
    info!("  /metrics  - Prometheus metrics");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
