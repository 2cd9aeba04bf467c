//! Danish plate lookups against a mock HTTP service

#![allow(clippy::unwrap_used, clippy::expect_used)]

use autobot_common::vehicle::{RegCountry, VehicleType};
use autobot_server::config::ProviderConfig;
use autobot_server::lookup::{LookupService, NrpladeService};
use autobot_server::LookupError;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn service(server: &MockServer) -> NrpladeService {
    let provider = ProviderConfig {
        lookup_supported: true,
        lookup_secure: false,
        lookup_host: server.uri().trim_start_matches("http://").to_string(),
        lookup_path: "/api/v1/".to_string(),
        lookup_key: "secret".to_string(),
        ..ProviderConfig::default()
    };
    NrpladeService::new(&provider)
}

fn payload(status: &str) -> serde_json::Value {
    json!({
        "data": {
            "registration": "AB12345",
            "first_registration_date": "2016-09-14T00:00:00+02:00",
            "vin": "wvwzzz1kz6w000001",
            "type": "Personbil",
            "brand": "VOLKSWAGEN",
            "model": "Golf",
            "version": "1.4 TSI",
            "fuel_type": "BENZIN",
            "registration_status": status
        }
    })
}

#[tokio::test]
async fn test_lookup_by_registration() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/AB12345"))
        .and(query_param("api_token", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(payload("Registreret")))
        .expect(1)
        .mount(&server)
        .await;

    let service = service(&server);
    assert!(service.supports(RegCountry::DK));
    assert!(!service.supports(RegCountry::NO));

    let v = service.lookup_by_registration("AB12345").await.unwrap();
    assert_eq!(v.vin, "WVWZZZ1KZ6W000001");
    assert_eq!(v.brand, "Volkswagen");
    assert_eq!(v.fuel_type, "Benzin");
    assert_eq!(v.vehicle_type, VehicleType::Car);
    assert_eq!(v.first_reg_date.to_string(), "2016-09-14");
    assert_eq!(v.meta.source, "nrplade");
    assert!(!v.meta.disabled);
}

#[tokio::test]
async fn test_lookup_by_vin_deregistered() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/vin/WVWZZZ1KZ6W000001"))
        .respond_with(ResponseTemplate::new(200).set_body_json(payload("Afmeldt")))
        .mount(&server)
        .await;

    let v = service(&server)
        .lookup_by_vin("WVWZZZ1KZ6W000001")
        .await
        .unwrap();
    assert!(v.meta.disabled);
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = service(&server)
        .lookup_by_registration("ZZ00000")
        .await
        .unwrap_err();
    assert!(matches!(err, LookupError::Status(404)));
}

#[tokio::test]
async fn test_bad_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = service(&server)
        .lookup_by_registration("AB12345")
        .await
        .unwrap_err();
    assert!(matches!(err, LookupError::Decode(_)));
}
