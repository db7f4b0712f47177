//! Axum handlers for the `nnrf-nfm` and `nnrf-disc` services.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::nrf::matcher::DiscoveryQuery;
use crate::nrf::subscription::NfSubscription;
use crate::nrf::NrfState;
use crate::sbi::server::propagate_correlation;
use crate::types::{NfProfile, NfType, PlmnId, Snssai};

pub fn router(state: NrfState) -> Router {
    Router::new()
        .route(
            "/nnrf-nfm/v1/nf-instances/{id}",
            put(register).patch(update).delete(deregister).get(get_profile),
        )
        .route("/nnrf-nfm/v1/nf-instances/{id}/heartbeat", put(heartbeat))
        .route("/nnrf-disc/v1/nf-instances", get(discover))
        .route("/nnrf-nfm/v1/subscriptions", post(subscribe))
        .route(
            "/nnrf-nfm/v1/subscriptions/{id}",
            axum::routing::delete(unsubscribe),
        )
        .layer(axum::middleware::from_fn(propagate_correlation))
        .with_state(state)
}

async fn register(
    State(state): State<NrfState>,
    Path(id): Path<Uuid>,
    Json(profile): Json<NfProfile>,
) -> Result<Response> {
    let (stored, created, jobs) = state.registry.register(id, profile)?;
    state.notifier.deliver(jobs).await;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(stored)).into_response())
}

async fn update(
    State(state): State<NrfState>,
    Path(id): Path<Uuid>,
    Json(profile): Json<NfProfile>,
) -> Result<Json<NfProfile>> {
    let (stored, jobs) = state.registry.update(id, profile)?;
    state.notifier.deliver(jobs).await;
    Ok(Json(stored))
}

async fn deregister(State(state): State<NrfState>, Path(id): Path<Uuid>) -> Result<StatusCode> {
    let jobs = state.registry.deregister(id)?;
    state.notifier.deliver(jobs).await;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_profile(
    State(state): State<NrfState>,
    Path(id): Path<Uuid>,
) -> Result<Json<NfProfile>> {
    Ok(Json(state.registry.get(id)?))
}

async fn heartbeat(State(state): State<NrfState>, Path(id): Path<Uuid>) -> Result<StatusCode> {
    state.registry.heartbeat(id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Query half of `GET /nnrf-disc/v1/nf-instances`. Structured values arrive
/// as JSON strings, per the 3GPP convention for these parameters.
#[derive(Debug, Default, Deserialize)]
pub struct DiscoveryParams {
    #[serde(rename = "target-nf-type")]
    target_nf_type: Option<String>,
    #[serde(rename = "target-nf-instance-id")]
    target_nf_instance_id: Option<Uuid>,
    #[serde(rename = "requester-plmn")]
    requester_plmn: Option<String>,
    #[serde(rename = "snssais")]
    snssais: Option<String>,
    #[serde(rename = "service-names")]
    service_names: Option<String>,
    #[serde(rename = "amf-region-id")]
    amf_region_id: Option<String>,
    #[serde(rename = "amf-set-id")]
    amf_set_id: Option<String>,
    #[serde(rename = "guami")]
    guami: Option<String>,
    #[serde(rename = "tai")]
    tai: Option<String>,
    #[serde(rename = "dnn")]
    dnn: Option<String>,
}

impl DiscoveryParams {
    fn into_query(self) -> Result<DiscoveryQuery> {
        let target_nf_type = self
            .target_nf_type
            .map(|s| s.parse::<NfType>())
            .transpose()?;
        let requester_plmn = self
            .requester_plmn
            .map(|s| serde_json::from_str::<PlmnId>(&s))
            .transpose()
            .map_err(|e| Error::InvalidInput(format!("requester-plmn: {e}")))?;
        let target_snssai_list = self
            .snssais
            .map(|s| serde_json::from_str::<Vec<Snssai>>(&s))
            .transpose()
            .map_err(|e| Error::InvalidInput(format!("snssais: {e}")))?
            .unwrap_or_default();
        let guami = self
            .guami
            .map(|s| serde_json::from_str(&s))
            .transpose()
            .map_err(|e| Error::InvalidInput(format!("guami: {e}")))?;
        let tai = self
            .tai
            .map(|s| serde_json::from_str(&s))
            .transpose()
            .map_err(|e| Error::InvalidInput(format!("tai: {e}")))?;
        let service_names = self
            .service_names
            .map(|s| s.split(',').map(|n| n.trim().to_string()).collect())
            .unwrap_or_default();

        Ok(DiscoveryQuery {
            target_nf_type,
            target_nf_instance_id: self.target_nf_instance_id,
            requester_plmn,
            target_snssai_list,
            service_names,
            amf_region_id: self.amf_region_id,
            amf_set_id: self.amf_set_id,
            guami,
            tai,
            dnn: self.dnn,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchResult {
    validity_period: u64,
    nf_instances: Vec<NfProfile>,
    search_id: String,
}

async fn discover(
    State(state): State<NrfState>,
    Query(params): Query<DiscoveryParams>,
) -> Result<Json<SearchResult>> {
    let query = params.into_query()?;
    let nf_instances = state.registry.discover(&query);
    Ok(Json(SearchResult {
        validity_period: 3600,
        nf_instances,
        search_id: Uuid::new_v4().to_string(),
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubscriptionCreated {
    subscription_id: String,
}

async fn subscribe(
    State(state): State<NrfState>,
    Json(sub): Json<NfSubscription>,
) -> Result<Response> {
    let subscription_id = state.registry.subscribe(sub);
    Ok((
        StatusCode::CREATED,
        Json(SubscriptionCreated { subscription_id }),
    )
        .into_response())
}

async fn unsubscribe(State(state): State<NrfState>, Path(id): Path<String>) -> Result<StatusCode> {
    state.registry.unsubscribe(&id)?;
    Ok(StatusCode::NO_CONTENT)
}
