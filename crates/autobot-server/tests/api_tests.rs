//! HTTP API tests driven through `tower::ServiceExt::oneshot`

#![allow(clippy::unwrap_used, clippy::expect_used)]

use async_trait::async_trait;
use autobot_common::vehicle::{RegCountry, Vehicle, VehicleType};
use autobot_server::api::{router, AppState};
use autobot_server::config::SyncConfig;
use autobot_server::lookup::{LookupRegistry, LookupService};
use autobot_server::store::{MemoryBackend, VehicleStore};
use autobot_server::LookupError;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// Answers for one known registration number, 404 for anything else.
struct StubLookup;

#[async_trait]
impl LookupService for StubLookup {
    fn name(&self) -> &str {
        "stub"
    }

    fn supports(&self, country: RegCountry) -> bool {
        country == RegCountry::DK
    }

    async fn lookup_by_vin(&self, _vin: &str) -> Result<Vehicle, LookupError> {
        Err(LookupError::Status(404))
    }

    async fn lookup_by_registration(&self, reg_nr: &str) -> Result<Vehicle, LookupError> {
        if reg_nr != "RM99999" {
            return Err(LookupError::Status(404));
        }
        Ok(vehicle("RM99999", "REMOTE0000001"))
    }
}

fn vehicle(reg_nr: &str, vin: &str) -> Vehicle {
    let mut v = Vehicle::new(VehicleType::Car, RegCountry::DK);
    v.reg_nr = reg_nr.to_string();
    v.vin = vin.to_string();
    v.brand = "Skoda".to_string();
    v.model = "Octavia".to_string();
    v.fuel_type = "Diesel".to_string();
    v.first_reg_date = NaiveDate::from_ymd_opt(2018, 2, 1).unwrap();
    v.rehash();
    v
}

async fn app() -> (Router, Arc<VehicleStore>, Vehicle) {
    let store = Arc::new(VehicleStore::new(
        Arc::new(MemoryBackend::new()),
        SyncConfig::default(),
    ));
    let cached = vehicle("AB12345", "TMB1234567890");
    store.sync_vehicle(&cached).await.unwrap();

    let mut lookups = LookupRegistry::new();
    lookups.register(Arc::new(StubLookup));

    let state = AppState::new(store.clone(), lookups);
    (router(state, &[]), store, cached)
}

async fn send(app: &Router, method: Method, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn test_service_status() {
    let (app, _, _) = app().await;
    let (status, body) = send(&app, Method::GET, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "autobot");
    assert!(body["uptime_secs"].as_i64().unwrap() >= 0);
    assert!(body["scheduler"].is_null());
}

#[tokio::test]
async fn test_store_status() {
    let (app, store, _) = app().await;
    store.log("synced something").await.unwrap();
    let (status, body) = send(&app, Method::GET, "/vehiclestore/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["history_size"], 1);
    assert_eq!(body["last_entry"]["message"], "synced something");
}

#[tokio::test]
async fn test_lookup_from_cache() {
    let (app, _, cached) = app().await;

    let (status, body) = send(&app, Method::GET, "/lookup?country=dk&regnr=ab12345").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["from_cache"], true);
    assert_eq!(body["vin"], "TMB1234567890");

    let uri = format!("/lookup?country=DK&hash={}", cached.meta.hash);
    let (status, body) = send(&app, Method::GET, &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reg_nr"], "AB12345");
}

#[tokio::test]
async fn test_lookup_falls_back_and_caches() {
    let (app, store, _) = app().await;

    let (status, body) = send(&app, Method::GET, "/lookup?country=DK&regnr=RM99999").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["from_cache"], false);
    assert!(store
        .lookup_by_vin(RegCountry::DK, "REMOTE0000001", false)
        .await
        .unwrap()
        .is_some());

    let (_, body) = send(&app, Method::GET, "/lookup?country=DK&regnr=RM99999").await;
    assert_eq!(body["from_cache"], true);
}

#[tokio::test]
async fn test_lookup_errors() {
    let (app, _, _) = app().await;

    let (status, body) = send(&app, Method::GET, "/lookup?country=DK&regnr=ZZ00000").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["status"], 404);

    let (status, _) = send(&app, Method::GET, "/lookup?country=NO&vin=X").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::GET, "/lookup?regnr=AB12345").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::GET, "/lookup?country=SE&regnr=AB12345").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::GET, "/lookup?country=DK").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::GET, "/lookup?country=DK&regnr=A&vin=B").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::GET, "/lookup?country=DK&hash=abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_patch_vehicle() {
    let (app, _, cached) = app().await;
    let hash = cached.meta.hash;

    let (status, _) = send(&app, Method::PATCH, &format!("/vehicle?hash={}&op=disable", hash)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::GET, "/lookup?country=DK&vin=TMB1234567890").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, body) =
        send(&app, Method::GET, "/lookup?country=DK&vin=TMB1234567890&disabled=true").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["disabled"], true);

    let (status, _) = send(&app, Method::PATCH, &format!("/vehicle?hash={}&op=enable", hash)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::PATCH, &format!("/vehicle?hash={}&op=toggle", hash)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::PATCH, &format!("/vehicle?hash={}&op=enable", hash + 1)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
