// ── Local trigger endpoint ──
//
// Loopback-only HTTP surface for manual triggering and status. Routes
// land on the same bridge entry points as physical button edges, so
// dispatch semantics are identical.

use std::net::SocketAddr;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::info;

use padlink_core::{Bridge, CoreError, LedColor};

pub fn router(bridge: Bridge) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/trigger/{button}", post(trigger))
        .route("/led", post(set_led))
        .route("/led/cycle", post(cycle))
        .with_state(bridge)
}

/// Serve until the token is cancelled.
pub async fn serve(
    bind: SocketAddr,
    bridge: Bridge,
    cancel: CancellationToken,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(addr = %listener.local_addr()?, "trigger endpoint listening");

    axum::serve(listener, router(bridge))
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await
}

// ── Bodies ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusBody {
    pub connected: bool,
    pub mode: String,
    pub color: ColorBody,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ColorBody {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl From<LedColor> for ColorBody {
    fn from(c: LedColor) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
        }
    }
}

// ── Error mapping ───────────────────────────────────────────────────

struct ApiError(CoreError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            CoreError::InvalidButton { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(serde_json::json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

// ── Handlers ────────────────────────────────────────────────────────

async fn status(State(bridge): State<Bridge>) -> Json<StatusBody> {
    Json(StatusBody {
        connected: bridge.is_connected(),
        mode: bridge.current_mode().to_string(),
        color: bridge.current_color().into(),
    })
}

async fn trigger(
    State(bridge): State<Bridge>,
    Path(button): Path<u8>,
) -> Result<StatusCode, ApiError> {
    bridge
        .execute_button_action(button)
        .await
        .map_err(ApiError)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn set_led(
    State(bridge): State<Bridge>,
    Json(color): Json<ColorBody>,
) -> StatusCode {
    bridge.set_led(LedColor::new(color.r, color.g, color.b));
    StatusCode::NO_CONTENT
}

async fn cycle(State(bridge): State<Bridge>) -> StatusCode {
    bridge.cycle_mode();
    StatusCode::NO_CONTENT
}

// ── Tests ────────────────────────────────────────────────────────────
