//! Vehicle record model
//!
//! A [`Vehicle`] carries identity-bearing fields plus a [`Meta`] block. The
//! identity hash in `meta.hash` is derived from the identity fields only (see
//! [`hash`]), so flipping `disabled` or refreshing `last_updated` never moves
//! a record to a new key.

pub mod hash;
pub mod normalize;
pub mod types;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use hash::{hash_key, identity_hash, parse_hash_key, IdentityHasher};
pub use normalize::{pretty_brand_name, pretty_fuel_type, title_case};
pub use types::{RegCountry, VehicleType};

/// Column header of the delimited export, matching [`Vehicle::export_row`].
pub const EXPORT_HEADER: [&str; 10] = [
    "hash",
    "country",
    "ident",
    "reg nr",
    "vin",
    "brand",
    "model",
    "variant",
    "fuel type",
    "first reg date",
];

/// Bookkeeping that travels with a record but is not part of its identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    pub hash: u64,
    pub source: String,
    pub country: RegCountry,
    /// Numeric identifier assigned by the source feed.
    pub ident: u64,
    pub last_updated: DateTime<Utc>,
    pub disabled: bool,
}

impl Meta {
    pub fn new(country: RegCountry) -> Self {
        Self {
            hash: 0,
            source: String::new(),
            country,
            ident: 0,
            last_updated: Utc::now(),
            disabled: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub meta: Meta,
    #[serde(rename = "type")]
    pub vehicle_type: VehicleType,
    pub reg_nr: String,
    pub vin: String,
    pub brand: String,
    pub model: String,
    pub fuel_type: String,
    pub variant: String,
    pub first_reg_date: NaiveDate,
}

impl Vehicle {
    /// Empty record of the given class; callers fill in fields and call
    /// [`Vehicle::rehash`].
    pub fn new(vehicle_type: VehicleType, country: RegCountry) -> Self {
        Self {
            meta: Meta::new(country),
            vehicle_type,
            reg_nr: String::new(),
            vin: String::new(),
            brand: String::new(),
            model: String::new(),
            fuel_type: String::new(),
            variant: String::new(),
            first_reg_date: NaiveDate::default(),
        }
    }

    /// Recompute `meta.hash` from the identity fields.
    pub fn rehash(&mut self) -> u64 {
        self.meta.hash = identity_hash(self);
        self.meta.hash
    }

    pub fn hash_key(&self) -> String {
        hash_key(self.meta.hash)
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Row for the delimited export, in [`EXPORT_HEADER`] order.
    pub fn export_row(&self) -> [String; 10] {
        [
            self.hash_key(),
            self.meta.country.to_string(),
            self.meta.ident.to_string(),
            self.reg_nr.clone(),
            self.vin.clone(),
            self.brand.clone(),
            self.model.clone(),
            self.variant.clone(),
            self.fuel_type.clone(),
            self.first_reg_date.format("%Y-%m-%d").to_string(),
        ]
    }
}

impl fmt::Display for Vehicle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.meta.disabled { "disabled" } else { "enabled" };
        writeln!(f, "#{} ({})", self.meta.hash, state)?;
        writeln!(f, "  Country:  {}", self.meta.country)?;
        writeln!(f, "  Ident:    {}", self.meta.ident)?;
        writeln!(f, "  Type:     {}", self.vehicle_type)?;
        writeln!(f, "  RegNr:    {}", self.reg_nr)?;
        writeln!(f, "  VIN:      {}", self.vin)?;
        writeln!(f, "  Brand:    {}", self.brand)?;
        writeln!(f, "  Model:    {}", self.model)?;
        writeln!(f, "  Variant:  {}", self.variant)?;
        writeln!(f, "  FuelType: {}", self.fuel_type)?;
        write!(f, "  RegDate:  {}", self.first_reg_date.format("%Y-%m-%d"))
    }
}
