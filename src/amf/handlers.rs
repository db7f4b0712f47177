//! Axum handlers for the AMF registration surface.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;

use crate::amf::registration::{RegistrationRequest, RegistrationResult};
use crate::amf::AmfState;
use crate::error::Result;
use crate::sbi::server::propagate_correlation;

pub fn router(state: AmfState) -> Router {
    Router::new()
        .route(
            "/namf-reg/v1/ue-contexts/{supi}/authenticate",
            post(initiate_auth),
        )
        .route(
            "/namf-reg/v1/ue-contexts/{supi}/confirm-auth",
            post(confirm_auth),
        )
        .route("/namf-reg/v1/ue-contexts/{supi}/register", post(register))
        .route(
            "/namf-reg/v1/ue-contexts/{supi}/deregister",
            post(deregister),
        )
        .layer(axum::middleware::from_fn(propagate_correlation))
        .with_state(state)
}

async fn initiate_auth(State(state): State<AmfState>, Path(supi): Path<String>) -> Result<Response> {
    let challenge = state.service.initiate_auth(&supi).await?;
    Ok((StatusCode::CREATED, Json(challenge)).into_response())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfirmAuthRequest {
    res_star: String,
}

async fn confirm_auth(
    State(state): State<AmfState>,
    Path(supi): Path<String>,
    Json(req): Json<ConfirmAuthRequest>,
) -> Result<Json<serde_json::Value>> {
    let result = state.service.confirm_auth(&supi, &req.res_star).await?;
    let outcome = match result {
        RegistrationResult::Success => "AUTHENTICATION_SUCCESS",
        RegistrationResult::Failure => "AUTHENTICATION_FAILURE",
    };
    Ok(Json(serde_json::json!({ "result": outcome })))
}

async fn register(
    State(state): State<AmfState>,
    Path(supi): Path<String>,
    Json(req): Json<RegistrationRequest>,
) -> Response {
    let resp = state.service.register(&supi, &req);
    let status = match resp.result {
        RegistrationResult::Success => StatusCode::OK,
        // Unauthorized per the error taxonomy; the body still carries the
        // FSM's result/reason pair.
        RegistrationResult::Failure => StatusCode::FORBIDDEN,
    };
    (status, Json(resp)).into_response()
}

async fn deregister(State(state): State<AmfState>, Path(supi): Path<String>) -> Result<StatusCode> {
    state.service.deregister(&supi)?;
    Ok(StatusCode::NO_CONTENT)
}
