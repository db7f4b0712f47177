//! Axum handlers for the `nsmf-pdusession` service.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::sbi::server::propagate_correlation;
use crate::smf::session::CreateSessionRequest;
use crate::smf::SmfState;

pub fn router(state: SmfState) -> Router {
    Router::new()
        .route("/nsmf-pdusession/v1/sm-contexts", post(create_sm_context))
        .route(
            "/nsmf-pdusession/v1/sm-contexts/{sm_context_ref}/release",
            post(release_sm_context),
        )
        .layer(axum::middleware::from_fn(propagate_correlation))
        .with_state(state)
}

async fn create_sm_context(
    State(state): State<SmfState>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<Response> {
    let session = state.service.create_session(req).await?;
    Ok((StatusCode::CREATED, Json(session)).into_response())
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReleaseRequest {
    #[serde(default)]
    cause: Option<String>,
}

/// The sm-context reference is `{supi}-{pduSessionId}`.
async fn release_sm_context(
    State(state): State<SmfState>,
    Path(sm_context_ref): Path<String>,
    body: Option<Json<ReleaseRequest>>,
) -> Result<Json<serde_json::Value>> {
    let (supi, id) = sm_context_ref
        .rsplit_once('-')
        .ok_or_else(|| Error::InvalidInput(format!("bad sm-context ref {sm_context_ref:?}")))?;
    let pdu_session_id: u8 = id
        .parse()
        .map_err(|_| Error::InvalidInput(format!("bad PDU session id in {sm_context_ref:?}")))?;

    let cause = body
        .and_then(|Json(r)| r.cause)
        .unwrap_or_else(|| "REGULAR_DEACTIVATION".into());
    state
        .service
        .release_session(supi, pdu_session_id, &cause)
        .await?;
    Ok(Json(serde_json::json!({ "status": "RELEASED" })))
}

#[cfg(test)]
mod tests {
    #[test]
    fn sm_context_ref_splits_on_the_last_dash() {
        let (supi, id) = "imsi-001010000000001-1".rsplit_once('-').unwrap();
        assert_eq!(supi, "imsi-001010000000001");
        assert_eq!(id, "1");
    }
}
