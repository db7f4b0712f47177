//! Graceful HTTP server runner shared by the NF binaries.

use std::net::SocketAddr;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use axum::Router;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::{Error, Result};
use crate::sbi::CORRELATION_HEADER;

/// Echoes the request's `3gpp-Sbi-Correlation-Id` header into the response.
/// Routers install this with `axum::middleware::from_fn`.
pub async fn propagate_correlation(req: Request, next: Next) -> Response {
    let correlation = req.headers().get(CORRELATION_HEADER).cloned();
    let mut resp = next.run(req).await;
    if let Some(value) = correlation {
        resp.headers_mut().insert(CORRELATION_HEADER, value);
    }
    resp
}

/// Binds `addr` and serves `router` until `cancel` fires, then drains
/// in-flight handlers.
pub async fn serve(router: Router, addr: SocketAddr, cancel: CancellationToken) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Unavailable(format!("bind {addr}: {e}")))?;
    info!(%addr, "SBI server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| Error::Internal(format!("SBI server: {e}")))
}

/// Cancels the token on ctrl-c; the standard shutdown trigger for the
/// binaries.
pub fn cancel_on_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            cancel.cancel();
        }
    });
}
