//! # HTTP API
//!
//! JSON endpoints polled and driven by the meter web page.
//!
//! ## Routes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /api/start          {name?, level?}  → {status, trip_id, ...}    │
//! │  POST /api/toggle_state                    → {status, applied,         │
//! │                                               new_state}               │
//! │  POST /api/toggle_option  {option, active} → {status, applied}         │
//! │  GET  /api/update                          → live snapshot             │
//! │  POST /api/stop                            → {fare, saved}             │
//! │  GET  /api/history?limit=N                 → [trip records]            │
//! │  GET  /health                              → {status, database}        │
//! │                                                                         │
//! │  Errors: {code, message} with 4xx/5xx status                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::commands::{
    self, HistoryQuery, StartTripRequest, StartTripResponse, StopTripResponse, ToggleOptionRequest,
    ToggleOptionResponse, ToggleStateResponse,
};
use crate::error::ApiError;
use crate::state::AppState;
use taxi_core::{LiveSnapshot, TripRecord};

type SharedState = Arc<AppState>;

/// Builds the router with all API routes.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/api/start", post(start_handler))
        .route("/api/toggle_state", post(toggle_state_handler))
        .route("/api/toggle_option", post(toggle_option_handler))
        .route("/api/update", get(update_handler))
        .route("/api/stop", post(stop_handler))
        .route("/api/history", get(history_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Binds the configured address and serves until Ctrl+C / SIGTERM.
pub async fn serve(state: SharedState) -> anyhow::Result<()> {
    let bind_addr = state.config.bind_address();
    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", bind_addr, e))?;

    info!(addr = %bind_addr, "HTTP server started");

    axum::serve(listener, router(Arc::clone(&state)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // A trip still running at shutdown is dropped, like any abandoned trip.
    if state.session.with_session(|s| s.meter.is_running()) {
        warn!("Shutting down with a trip still running; it is not recorded");
    }

    state.db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}

// =============================================================================
// Handlers
// =============================================================================

async fn start_handler(
    State(state): State<SharedState>,
    Json(request): Json<StartTripRequest>,
) -> Result<Json<StartTripResponse>, ApiError> {
    let level = request.level.as_ref().map(|l| l.to_level()).transpose()?;
    commands::start_trip(&state, request.name.as_deref(), level, Utc::now()).map(Json)
}

async fn toggle_state_handler(State(state): State<SharedState>) -> Json<ToggleStateResponse> {
    Json(commands::toggle_state(&state, Utc::now()))
}

async fn toggle_option_handler(
    State(state): State<SharedState>,
    Json(request): Json<ToggleOptionRequest>,
) -> Result<Json<ToggleOptionResponse>, ApiError> {
    commands::toggle_option(&state, &request.option, request.active, Utc::now()).map(Json)
}

async fn update_handler(State(state): State<SharedState>) -> Json<LiveSnapshot> {
    Json(commands::live_snapshot(&state, Utc::now()))
}

async fn stop_handler(State(state): State<SharedState>) -> Json<StopTripResponse> {
    Json(commands::stop_trip(&state, Utc::now()).await)
}

async fn history_handler(
    State(state): State<SharedState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<TripRecord>>, ApiError> {
    commands::trip_history(&state, query.limit).await.map(Json)
}

/// Health check endpoint.
async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let database = state.db.health_check().await;
    Json(json!({
        "status": if database { "ok" } else { "degraded" },
        "database": database,
    }))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::commands::LevelInput;
    use crate::error::ErrorCode;
    use axum::http::StatusCode;
    use std::path::PathBuf;
    use taxi_core::{MeterState, RateConfig};
    use taxi_db::{Database, DbConfig};

    async fn test_state() -> SharedState {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let config = AppConfig {
            data_dir: PathBuf::from("/tmp/taximeter-http-test"),
            rates_path: PathBuf::from("/tmp/taximeter-http-test/rates.json"),
            db_path: PathBuf::from(":memory:"),
            bind_addr: "127.0.0.1".to_string(),
            http_port: 0,
        };
        Arc::new(AppState::new(config, RateConfig::default(), db))
    }

    #[tokio::test]
    async fn test_start_update_stop_history() {
        let state = test_state().await;

        let Json(started) = start_handler(
            State(Arc::clone(&state)),
            Json(StartTripRequest {
                name: Some("Ana".to_string()),
                level: Some(LevelInput::Number(1)),
            }),
        )
        .await
        .unwrap();
        assert_eq!(started.status, "started");
        assert_eq!(started.customer, "Ana");

        let Json(snapshot) = update_handler(State(Arc::clone(&state))).await;
        assert!(snapshot.is_running);
        assert_eq!(snapshot.state, MeterState::Moving);
        assert_eq!(snapshot.trip_id.as_deref(), Some(started.trip_id.as_str()));
        assert_eq!(snapshot.logs[0].msg, "Trip Started (Lv.1)");

        let Json(stopped) = stop_handler(State(Arc::clone(&state))).await;
        assert!(stopped.saved);

        let Json(history) = history_handler(
            State(Arc::clone(&state)),
            Query(HistoryQuery::default()),
        )
        .await
        .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].name, "Ana");
        assert_eq!(history[0].id, started.trip_id);
    }

    #[tokio::test]
    async fn test_start_with_string_level_and_limited_history() {
        let state = test_state().await;

        for _ in 0..3 {
            let Json(started) = start_handler(
                State(Arc::clone(&state)),
                Json(StartTripRequest {
                    name: None,
                    level: Some(LevelInput::Text("2".to_string())),
                }),
            )
            .await
            .unwrap();
            assert_eq!(started.level.get(), 2);
            stop_handler(State(Arc::clone(&state))).await;
        }

        let Json(history) = history_handler(
            State(Arc::clone(&state)),
            Query(HistoryQuery { limit: Some(2) }),
        )
        .await
        .unwrap();
        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|t| t.level == 2));
    }

    #[tokio::test]
    async fn test_toggle_state_response_shape() {
        let state = test_state().await;

        let Json(idle) = toggle_state_handler(State(Arc::clone(&state))).await;
        let body = serde_json::to_value(&idle).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["applied"], false);
        assert_eq!(body["new_state"], "stopped");

        start_handler(State(Arc::clone(&state)), Json(StartTripRequest::default()))
            .await
            .unwrap();
        let Json(toggled) = toggle_state_handler(State(Arc::clone(&state))).await;
        assert!(toggled.applied);
        assert_eq!(toggled.new_state, MeterState::Stopped);
    }

    #[tokio::test]
    async fn test_invalid_requests_map_to_400() {
        let state = test_state().await;

        let err = start_handler(
            State(Arc::clone(&state)),
            Json(StartTripRequest {
                name: None,
                level: Some(LevelInput::Number(0)),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);

        let err = start_handler(
            State(Arc::clone(&state)),
            Json(StartTripRequest {
                name: None,
                level: Some(LevelInput::Text("fast".to_string())),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(!state.session.with_session(|s| s.meter.is_running()));

        let err = toggle_option_handler(
            State(Arc::clone(&state)),
            Json(ToggleOptionRequest {
                option: String::new(),
                active: true,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_idle_stop_reports_zero() {
        let state = test_state().await;

        let Json(stopped) = stop_handler(State(Arc::clone(&state))).await;
        let body = serde_json::to_value(&stopped).unwrap();
        assert_eq!(body["fare"], 0.0);
        assert_eq!(body["saved"], false);
        assert!(body.get("trip").is_none());
    }

    #[tokio::test]
    async fn test_health() {
        let state = test_state().await;
        let response = health_handler(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
