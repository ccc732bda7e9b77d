//! HTTP status endpoint.
//!
//! Serves `/metrics` for Prometheus scraping and `/connections`, a plain-text
//! snapshot of the registry. The server stops with the bot.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::Bot;

async fn metrics_handler() -> String {
    crate::metrics::gather_metrics()
}

/// One line per live connection: `label state nick channels`.
async fn connections_handler(State(bot): State<Arc<Bot>>) -> String {
    let mut body = String::new();
    for (label, conn) in bot.registry().list_all() {
        let channels = conn.channels();
        let channels = if channels.is_empty() {
            "-".to_string()
        } else {
            channels.join(",")
        };
        body.push_str(&format!(
            "{label} {:?} {} {channels}\n",
            conn.state(),
            conn.nick()
        ));
    }
    body
}

pub fn router(bot: Arc<Bot>) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/connections", get(connections_handler))
        .with_state(bot)
}

/// Serve on an already bound listener until the bot is stopped.
pub async fn serve(listener: TcpListener, bot: Arc<Bot>) -> std::io::Result<()> {
    let app = router(bot.clone());
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { bot.stopped().await })
        .await
}

/// Bind `127.0.0.1:port` and serve. Meant to be spawned; errors are logged.
pub async fn run_http_server(port: u16, bot: Arc<Bot>) {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(%addr, error = %e, "Failed to bind status endpoint");
            return;
        }
    };
    info!(%addr, "Status endpoint listening");
    if let Err(e) = serve(listener, bot).await {
        error!(error = %e, "Status endpoint error");
    }
}
