//! Route handlers

use super::AppState;
use crate::error::{LookupError, ServerError, ServerResult};
use crate::scheduler::SchedulerState;
use crate::store::StoreStatus;
use autobot_common::vehicle::{parse_hash_key, RegCountry, Vehicle};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Serialize)]
pub struct ServiceStatus {
    pub service: &'static str,
    pub version: &'static str,
    pub started: DateTime<Local>,
    pub uptime_secs: i64,
    /// Absent when the scheduler is not running.
    pub scheduler: Option<SchedulerState>,
}

pub async fn service_status(State(state): State<AppState>) -> Json<ServiceStatus> {
    Json(ServiceStatus {
        service: "autobot",
        version: env!("CARGO_PKG_VERSION"),
        started: state.started_at,
        uptime_secs: (Local::now() - state.started_at).num_seconds(),
        scheduler: state.scheduler.as_ref().map(|rx| *rx.borrow()),
    })
}

pub async fn store_status(State(state): State<AppState>) -> ServerResult<Json<StoreStatus>> {
    Ok(Json(state.store.store_status().await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct LookupParams {
    pub country: Option<String>,
    pub hash: Option<String>,
    pub regnr: Option<String>,
    pub vin: Option<String>,
    #[serde(default)]
    pub disabled: bool,
}

#[derive(Debug, Serialize)]
pub struct LookupResponse {
    #[serde(flatten)]
    pub vehicle: Vehicle,
    pub from_cache: bool,
}

enum LookupKey {
    Hash(u64),
    Vin(String),
    RegNr(String),
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn lookup_key(params: &LookupParams) -> ServerResult<LookupKey> {
    match (present(&params.hash), present(&params.regnr), present(&params.vin)) {
        (Some(hash), None, None) => parse_hash_key(hash)
            .map(LookupKey::Hash)
            .map_err(|e| ServerError::BadRequest(e.to_string())),
        (None, Some(reg_nr), None) => Ok(LookupKey::RegNr(reg_nr.to_uppercase())),
        (None, None, Some(vin)) => Ok(LookupKey::Vin(vin.to_uppercase())),
        (None, None, None) => Err(ServerError::BadRequest(
            "one of hash, regnr or vin is required".to_string(),
        )),
        _ => Err(ServerError::BadRequest(
            "only one of hash, regnr or vin may be given".to_string(),
        )),
    }
}

/// Look a vehicle up in the store, falling back to the remote service for
/// the country. Remote hits are cached in the store.
pub async fn lookup(
    State(state): State<AppState>,
    Query(params): Query<LookupParams>,
) -> ServerResult<Json<LookupResponse>> {
    let country: RegCountry = params
        .country
        .as_deref()
        .ok_or_else(|| ServerError::BadRequest("country is required".to_string()))?
        .parse()
        .map_err(|e: autobot_common::AutobotError| ServerError::BadRequest(e.to_string()))?;
    let key = lookup_key(&params)?;

    let cached = match &key {
        LookupKey::Hash(hash) => state.store.lookup_by_hash(*hash).await?,
        LookupKey::Vin(vin) => state.store.lookup_by_vin(country, vin, params.disabled).await?,
        LookupKey::RegNr(reg_nr) => {
            state
                .store
                .lookup_by_registration(country, reg_nr, params.disabled)
                .await?
        },
    };
    if let Some(vehicle) = cached {
        return Ok(Json(LookupResponse {
            vehicle,
            from_cache: true,
        }));
    }

    let not_found = || ServerError::NotFound("vehicle not found".to_string());
    let Some(service) = state.lookups.find_by_country(country) else {
        debug!(country = %country, "No lookup service for country");
        return Err(not_found());
    };

    let remote = match &key {
        LookupKey::Hash(_) => return Err(not_found()),
        LookupKey::Vin(vin) => service.lookup_by_vin(vin).await,
        LookupKey::RegNr(reg_nr) => service.lookup_by_registration(reg_nr).await,
    };
    let vehicle = match remote {
        Ok(vehicle) => vehicle,
        Err(LookupError::Status(404)) => return Err(not_found()),
        Err(e) => return Err(e.into()),
    };

    if state.store.sync_vehicle(&vehicle).await? {
        info!(service = service.name(), hash = vehicle.meta.hash, "Cached remote lookup result");
    }
    if vehicle.meta.disabled && !params.disabled {
        return Err(not_found());
    }
    Ok(Json(LookupResponse {
        vehicle,
        from_cache: false,
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct PatchParams {
    pub hash: Option<String>,
    pub op: Option<String>,
}

pub async fn patch_vehicle(
    State(state): State<AppState>,
    Query(params): Query<PatchParams>,
) -> ServerResult<StatusCode> {
    let hash = params
        .hash
        .as_deref()
        .ok_or_else(|| ServerError::BadRequest("hash is required".to_string()))
        .and_then(|h| parse_hash_key(h).map_err(|e| ServerError::BadRequest(e.to_string())))?;

    match params.op.as_deref().map(str::to_lowercase).as_deref() {
        Some("enable") => state.store.enable(hash).await?,
        Some("disable") => state.store.disable(hash).await?,
        Some(other) => {
            return Err(ServerError::BadRequest(format!(
                "unknown op '{}', expected enable or disable",
                other
            )))
        },
        None => return Err(ServerError::BadRequest("op is required".to_string())),
    }
    Ok(StatusCode::NO_CONTENT)
}
