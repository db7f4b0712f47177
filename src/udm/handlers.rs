//! Axum handlers for the `nudm-ueau` service.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::sbi::server::propagate_correlation;
use crate::types::validate_supi;
use crate::udm::vectors::ResyncInfo;
use crate::udm::UdmState;

pub fn router(state: UdmState) -> Router {
    Router::new()
        .route(
            "/nudm-ueau/v1/supi/{supi}/security-information/generate-auth-data",
            post(generate_auth_data),
        )
        .route("/nudm-ueau/v1/supi/{supi}/auth-events", post(auth_event))
        .layer(axum::middleware::from_fn(propagate_correlation))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateAuthDataRequest {
    serving_network_name: String,
    #[serde(default)]
    resynchronization_info: Option<ResynchronizationInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResynchronizationInfo {
    rand: String,
    auts: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateAuthDataResponse {
    auth_type: String,
    authentication_vector: AuthenticationVector,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthenticationVector {
    rand: String,
    autn: String,
    hxres: String,
    kausf: String,
}

fn parse_hex<const N: usize>(what: &str, value: &str) -> Result<[u8; N]> {
    let bytes = hex::decode(value)
        .map_err(|_| Error::InvalidInput(format!("{what} is not valid hex")))?;
    bytes
        .try_into()
        .map_err(|_| Error::invalid_length(what, N, value.len() / 2))
}

async fn generate_auth_data(
    State(state): State<UdmState>,
    Path(supi): Path<String>,
    Json(req): Json<GenerateAuthDataRequest>,
) -> Result<Json<GenerateAuthDataResponse>> {
    validate_supi(&supi)?;
    let resync = match req.resynchronization_info {
        Some(info) => Some(ResyncInfo {
            rand: parse_hex::<16>("resync RAND", &info.rand)?,
            auts: parse_hex::<14>("AUTS", &info.auts)?,
        }),
        None => None,
    };

    let vector = state
        .vectors
        .generate(&supi, &req.serving_network_name, resync)?;
    Ok(Json(GenerateAuthDataResponse {
        auth_type: "5G_AKA".into(),
        authentication_vector: AuthenticationVector {
            rand: hex::encode(vector.rand),
            autn: hex::encode(vector.autn),
            hxres: hex::encode(vector.hxres_star),
            kausf: hex::encode(vector.kausf),
        },
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthEvent {
    #[serde(default)]
    nf_instance_id: Option<uuid::Uuid>,
    success: bool,
    #[serde(default)]
    time_stamp: Option<chrono::DateTime<chrono::Utc>>,
}

/// Records the authentication outcome. Only the acknowledgement matters to
/// the AUSF; persistence is a UDR concern.
async fn auth_event(
    Path(supi): Path<String>,
    Json(event): Json<AuthEvent>,
) -> Result<StatusCode> {
    validate_supi(&supi)?;
    tracing::info!(
        supi = %supi,
        success = event.success,
        ausf = ?event.nf_instance_id,
        at = ?event.time_stamp,
        "authentication event recorded"
    );
    Ok(StatusCode::CREATED)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hex_checks_length_and_alphabet() {
        assert!(parse_hex::<16>("RAND", "23553cbe9637a89d218ae64dae47bf35").is_ok());
        assert!(parse_hex::<16>("RAND", "23553cbe").is_err());
        assert!(parse_hex::<16>("RAND", "zz553cbe9637a89d218ae64dae47bf35").is_err());
    }
}
