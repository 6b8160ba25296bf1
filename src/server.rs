use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::handler::Handler;

pub fn router(handler: Arc<Handler>) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok\n" }))
        .route("/webhook", post(receive_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(handler)
}

async fn receive_webhook(
    State(handler): State<Arc<Handler>>,
    body: String,
) -> (StatusCode, String) {
    match handler.handle_body(&body).await {
        Ok(outcome) => {
            tracing::info!(%outcome, "webhook handled");
            (StatusCode::OK, format!("{outcome}\n"))
        }
        Err(err) if err.is_malformed() => {
            tracing::warn!(error = %err, "rejected webhook");
            (StatusCode::BAD_REQUEST, format!("{err}\n"))
        }
        Err(err) => {
            tracing::error!(error = %err, "webhook handler fault");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("{err}\n"))
        }
    }
}

pub async fn serve(addr: SocketAddr, handler: Arc<Handler>) -> anyhow::Result<()> {
    let app = router(handler);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| anyhow::anyhow!("bind {addr}: {err}"))?;
    tracing::info!(addr = %addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
