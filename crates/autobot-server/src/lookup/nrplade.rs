//! Danish license plate lookups
//!
//! Endpoints, relative to `{scheme}://{lookup_host}/{lookup_path}`:
//!
//! - `/{regnr}?api_token=KEY`
//! - `/vin/{vin}?api_token=KEY`
//!
//! Both answer `{"data": {...}}` with the vehicle fields.

use super::LookupService;
use crate::config::ProviderConfig;
use crate::error::LookupError;
use async_trait::async_trait;
use autobot_common::vehicle::{pretty_brand_name, pretty_fuel_type, RegCountry, Vehicle, VehicleType};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

pub const SERVICE_NAME: &str = "Nrplade";

const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Deserialize)]
struct Envelope {
    data: NrpladeVehicle,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NrpladeVehicle {
    registration: String,
    first_registration_date: String,
    vin: String,
    #[serde(rename = "type")]
    kind: String,
    brand: String,
    model: String,
    version: String,
    fuel_type: String,
    registration_status: String,
}

pub struct NrpladeService {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl NrpladeService {
    pub fn new(provider: &ProviderConfig) -> Self {
        let scheme = if provider.lookup_secure { "https" } else { "http" };
        let path = provider.lookup_path.trim_matches('/');
        let base_url = if path.is_empty() {
            format!("{}://{}", scheme, provider.lookup_host)
        } else {
            format!("{}://{}/{}", scheme, provider.lookup_host, path)
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url,
            api_key: provider.lookup_key.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch(&self, url: String) -> Result<Vehicle, LookupError> {
        debug!(url = %url, "Nrplade request");
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .query(&[("api_token", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }

        let envelope: Envelope = response
            .json()
            .await
            .map_err(|e| LookupError::Decode(e.to_string()))?;
        to_vehicle(envelope.data)
    }
}

/// Danish vehicle class names used by the service.
fn vehicle_type(kind: &str) -> VehicleType {
    match kind.trim().to_lowercase().as_str() {
        "personbil" => VehicleType::Car,
        "varebil" => VehicleType::Van,
        "lastbil" => VehicleType::Truck,
        "bus" => VehicleType::Bus,
        "påhængsvogn" | "sættevogn" => VehicleType::Trailer,
        other => other.parse().unwrap_or_default(),
    }
}

fn to_vehicle(data: NrpladeVehicle) -> Result<Vehicle, LookupError> {
    let raw_date = data.first_registration_date.trim();
    let first_reg_date = raw_date
        .get(..10)
        .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
        .ok_or_else(|| LookupError::Decode(format!("invalid first_registration_date '{}'", raw_date)))?;

    let mut vehicle = Vehicle::new(vehicle_type(&data.kind), RegCountry::DK);
    vehicle.meta.source = SERVICE_NAME.to_lowercase();
    vehicle.meta.last_updated = Utc::now();
    vehicle.meta.disabled = data.registration_status.eq_ignore_ascii_case("afmeldt");
    vehicle.reg_nr = data.registration.trim().to_uppercase();
    vehicle.vin = data.vin.trim().to_uppercase();
    vehicle.brand = pretty_brand_name(&data.brand);
    vehicle.model = data.model.trim().to_string();
    vehicle.variant = data.version.trim().to_string();
    vehicle.fuel_type = pretty_fuel_type(&data.fuel_type);
    vehicle.first_reg_date = first_reg_date;
    vehicle.rehash();
    Ok(vehicle)
}

#[async_trait]
impl LookupService for NrpladeService {
    fn name(&self) -> &str {
        SERVICE_NAME
    }

    fn supports(&self, country: RegCountry) -> bool {
        country == RegCountry::DK
    }

    async fn lookup_by_vin(&self, vin: &str) -> Result<Vehicle, LookupError> {
        self.fetch(format!("{}/vin/{}", self.base_url, vin.trim())).await
    }

    async fn lookup_by_registration(&self, reg_nr: &str) -> Result<Vehicle, LookupError> {
        self.fetch(format!("{}/{}", self.base_url, reg_nr.trim())).await
    }
}
