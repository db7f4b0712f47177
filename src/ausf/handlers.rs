//! Axum handlers for the `nausf-auth` service.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::ausf::{AusfService, Confirmation};
use crate::error::{Error, Result};
use crate::sbi::server::propagate_correlation;

#[derive(Clone)]
pub struct AusfState {
    pub service: Arc<AusfService>,
}

pub fn router(state: AusfState) -> Router {
    Router::new()
        .route("/nausf-auth/v1/ue-authentications", post(initiate))
        .route(
            "/nausf-auth/v1/ue-authentications/{auth_ctx_id}/5g-aka-confirmation",
            put(confirm),
        )
        .layer(axum::middleware::from_fn(propagate_correlation))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthenticationInfo {
    supi_or_suci: String,
    serving_network_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UeAuthenticationCtx {
    auth_type: String,
    #[serde(rename = "_5gAuthData")]
    auth_data: FiveGAuthData,
    #[serde(rename = "_links")]
    links: Links,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FiveGAuthData {
    rand: String,
    autn: String,
}

#[derive(Debug, Serialize)]
struct Links {
    #[serde(rename = "5g-aka")]
    five_g_aka: Href,
}

#[derive(Debug, Serialize)]
struct Href {
    href: String,
}

async fn initiate(
    State(state): State<AusfState>,
    Json(info): Json<AuthenticationInfo>,
) -> Result<Response> {
    let challenge = state
        .service
        .initiate(&info.supi_or_suci, &info.serving_network_name)
        .await?;
    let href = format!(
        "/nausf-auth/v1/ue-authentications/{}/5g-aka-confirmation",
        challenge.auth_ctx_id
    );
    let body = UeAuthenticationCtx {
        auth_type: "5G_AKA".into(),
        auth_data: FiveGAuthData {
            rand: hex::encode(challenge.rand),
            autn: hex::encode(challenge.autn),
        },
        links: Links {
            five_g_aka: Href { href },
        },
    };
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfirmationData {
    res_star: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfirmationDataResponse {
    auth_result: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    supi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kseaf: Option<String>,
}

async fn confirm(
    State(state): State<AusfState>,
    Path(auth_ctx_id): Path<String>,
    Json(data): Json<ConfirmationData>,
) -> Result<Json<ConfirmationDataResponse>> {
    let res_star: [u8; 16] = hex::decode(&data.res_star)
        .map_err(|_| Error::InvalidInput("resStar is not valid hex".into()))?
        .try_into()
        .map_err(|_| Error::InvalidInput("resStar must be 16 bytes".into()))?;

    let body = match state.service.confirm(&auth_ctx_id, &res_star).await? {
        Confirmation::Success { supi, kseaf } => ConfirmationDataResponse {
            auth_result: "AUTHENTICATION_SUCCESS".into(),
            supi: Some(supi),
            kseaf: Some(hex::encode(kseaf)),
        },
        Confirmation::Failure => ConfirmationDataResponse {
            auth_result: "AUTHENTICATION_FAILURE".into(),
            supi: None,
            kseaf: None,
        },
    };
    Ok(Json(body))
}
