//! Query filters for exports

use autobot_common::vehicle::{Vehicle, VehicleType};
use serde::{Deserialize, Serialize};

/// Search and filter options. Empty string fields do not filter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Query {
    /// Maximum rows to export; 0 exports everything.
    pub limit: u64,
    #[serde(rename = "type")]
    pub vehicle_type: String,
    pub brand: String,
    pub model: String,
    pub fuel_type: String,
    pub include_disabled: bool,
}

impl Query {
    pub fn prepare(&self) -> PreparedQuery {
        let vehicle_type = self.vehicle_type.trim();
        PreparedQuery {
            limit: self.limit,
            vehicle_type: (!vehicle_type.is_empty())
                .then(|| vehicle_type.parse().unwrap_or(VehicleType::Unknown)),
            brand: non_empty(&self.brand),
            model: non_empty(&self.model),
            fuel_type: non_empty(&self.fuel_type),
            include_disabled: self.include_disabled,
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// A [`Query`] with its type filter resolved.
#[derive(Debug, Clone)]
pub struct PreparedQuery {
    pub limit: u64,
    pub vehicle_type: Option<VehicleType>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub fuel_type: Option<String>,
    pub include_disabled: bool,
}

impl PreparedQuery {
    /// A record matches when it passes every active filter.
    pub fn matches(&self, vehicle: &Vehicle) -> bool {
        if vehicle.meta.disabled && !self.include_disabled {
            return false;
        }
        if self.vehicle_type.is_some_and(|t| t != vehicle.vehicle_type) {
            return false;
        }
        eq_filter(&self.brand, &vehicle.brand)
            && eq_filter(&self.model, &vehicle.model)
            && eq_filter(&self.fuel_type, &vehicle.fuel_type)
    }

    pub fn limit_reached(&self, written: u64) -> bool {
        self.limit > 0 && written >= self.limit
    }
}

fn eq_filter(filter: &Option<String>, value: &str) -> bool {
    filter
        .as_deref()
        .map_or(true, |f| f.to_lowercase() == value.to_lowercase())
}
