//! Publishes the setup view over HTTP while the poller keeps it current.

use anyhow::{anyhow, Result};
use axum::{
    extract::State,
    response::{Html, Redirect},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::future::Future;

use crate::{
    core::{events::PollStats, poller::PollerMonitor},
    render::{render_page, SharedTarget},
};

#[derive(Clone)]
pub struct ViewState {
    pub target: SharedTarget,
    pub monitor: PollerMonitor,
    /// Auto-refresh period of the full page, in seconds
    pub refresh_secs: u64,
}

#[derive(Debug, Serialize)]
struct StatusBody {
    active: bool,
    degraded: bool,
    networks: usize,
    stats: PollStats,
}

pub fn router(state: ViewState) -> Router {
    Router::new()
        .route("/", get(|| async { Redirect::to("/setup") }))
        .route("/setup", get(setup_page))
        .route("/setup/networks", get(networks_fragment))
        .route("/setup/status", get(poll_status))
        .with_state(state)
}

async fn setup_page(State(state): State<ViewState>) -> Html<String> {
    Html(render_page(&state.target.body(), Some(state.refresh_secs)))
}

async fn networks_fragment(State(state): State<ViewState>) -> Html<String> {
    Html(state.target.body())
}

async fn poll_status(State(state): State<ViewState>) -> Json<StatusBody> {
    let stats = state.monitor.stats();
    Json(StatusBody {
        active: state.monitor.is_active(),
        degraded: stats.is_degraded(),
        networks: state.monitor.known().len(),
        stats,
    })
}

/// Serve the view on `127.0.0.1:<port>` until `shutdown` resolves.
pub async fn run_view_server(
    port: u16,
    state: ViewState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let addr = format!("127.0.0.1:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|err| anyhow!("Failed to bind view server to {addr}: {err}"))?;
    log::info!("Setup view available at http://{addr}/setup");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|err| anyhow!("View server error: {err}"))
}
