//! Webhook endpoint. Every path is served: `POST` carries an update, any
//! other method answers with a liveness string.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{Method, StatusCode},
    Router,
};
use teloxide::types::Update;
use tracing::{error, info};

use crate::router::{Ack, UpdateRouter};

pub fn app(router: Arc<UpdateRouter>) -> Router {
    Router::new().fallback(handle_request).with_state(router)
}

async fn handle_request(
    State(router): State<Arc<UpdateRouter>>,
    method: Method,
    body: Bytes,
) -> (StatusCode, &'static str) {
    if method != Method::POST {
        return (StatusCode::OK, "Bot is running");
    }

    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            error!("Failed to decode update: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Error");
        }
    };

    match router.dispatch(&update).await {
        Ack::Ok => (StatusCode::OK, "OK"),
        Ack::Failed => (StatusCode::INTERNAL_SERVER_ERROR, "Error"),
    }
}

pub async fn run(router: Arc<UpdateRouter>, listen: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .with_context(|| format!("Failed to bind to {}", listen))?;

    info!("Webhook server listening on {}", listen);

    axum::serve(listener, app(router))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down webhook server");
        })
        .await
        .context("Server error")?;

    Ok(())
}
