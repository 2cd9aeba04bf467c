//! Content identity hashing
//!
//! A vehicle's primary key is a 64-bit digest of its identity-bearing fields.
//! The encoding is fixed so the value stays stable across restarts and can be
//! reproduced by any other implementation:
//!
//! 1. Collect `(field name, value)` pairs. Values are UTF-8 strings; dates use
//!    `YYYY-MM-DD` and the vehicle class uses its display name (`Car`, ...).
//! 2. Sort the pairs by field name.
//! 3. For each pair append `u32_be(len(name)) ++ name ++ u32_be(len(value)) ++ value`.
//! 4. SHA-256 the buffer and read the first 8 digest bytes as a big-endian `u64`.
//!
//! The identity fields are `brand`, `first_reg_date`, `fuel_type`, `model`,
//! `reg_nr`, `variant`, `vehicle_type` and `vin`. Everything under
//! [`Meta`](super::Meta) (hash, source, country, ident, timestamps, disabled
//! flag) is excluded.

use super::Vehicle;
use crate::error::{AutobotError, Result};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Order-independent, length-prefixed field hasher.
#[derive(Debug, Default, Clone)]
pub struct IdentityHasher {
    fields: BTreeMap<&'static str, String>,
}

impl IdentityHasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field. Adding the same name twice keeps the last value.
    pub fn field(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.fields.insert(name, value.into());
        self
    }

    pub fn finish(&self) -> u64 {
        let mut digest = Sha256::new();
        for (name, value) in &self.fields {
            write_prefixed(&mut digest, name.as_bytes());
            write_prefixed(&mut digest, value.as_bytes());
        }
        let out = digest.finalize();
        let mut head = [0u8; 8];
        head.copy_from_slice(&out[..8]);
        u64::from_be_bytes(head)
    }
}

fn write_prefixed(digest: &mut Sha256, bytes: &[u8]) {
    let len = u32::try_from(bytes.len()).unwrap_or(u32::MAX);
    digest.update(len.to_be_bytes());
    digest.update(bytes);
}

/// Identity hash of a vehicle. Metadata never contributes.
pub fn identity_hash(vehicle: &Vehicle) -> u64 {
    IdentityHasher::new()
        .field("brand", vehicle.brand.as_str())
        .field("first_reg_date", vehicle.first_reg_date.format("%Y-%m-%d").to_string())
        .field("fuel_type", vehicle.fuel_type.as_str())
        .field("model", vehicle.model.as_str())
        .field("reg_nr", vehicle.reg_nr.as_str())
        .field("variant", vehicle.variant.as_str())
        .field("vehicle_type", vehicle.vehicle_type.as_str())
        .field("vin", vehicle.vin.as_str())
        .finish()
}

/// Render a hash as the store key (unsigned decimal).
pub fn hash_key(hash: u64) -> String {
    hash.to_string()
}

/// Parse a store key back into a hash.
pub fn parse_hash_key(key: &str) -> Result<u64> {
    key.trim()
        .parse()
        .map_err(|_| AutobotError::InvalidHash(key.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::vehicle::{RegCountry, VehicleType};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn sample() -> Vehicle {
        let mut v = Vehicle::new(VehicleType::Car, RegCountry::DK);
        v.reg_nr = "AB12345".into();
        v.vin = "WDB1234567890".into();
        v.brand = "BMW".into();
        v.model = "320d".into();
        v.fuel_type = "Diesel".into();
        v.first_reg_date = NaiveDate::from_ymd_opt(2020, 5, 1).unwrap();
        v
    }

    #[test]
    fn test_field_order_does_not_matter() {
        let a = IdentityHasher::new().field("brand", "BMW").field("vin", "X1").finish();
        let b = IdentityHasher::new().field("vin", "X1").field("brand", "BMW").finish();
        assert_eq!(a, b);
    }

    #[test]
    fn test_boundaries_are_unambiguous() {
        let a = IdentityHasher::new().field("brand", "AB").field("model", "C").finish();
        let b = IdentityHasher::new().field("brand", "A").field("model", "BC").finish();
        assert_ne!(a, b);
    }

    #[test]
    fn test_metadata_is_ignored() {
        let base = sample();
        let mut other = sample();
        other.meta.country = RegCountry::NO;
        other.meta.source = "elsewhere".into();
        other.meta.ident = 42;
        other.meta.disabled = true;
        other.meta.last_updated = Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0).unwrap();
        other.meta.hash = 7;
        assert_eq!(identity_hash(&base), identity_hash(&other));
    }

    #[test]
    fn test_identity_fields_change_hash() {
        let base = sample();
        let mut other = sample();
        other.variant = "Touring".into();
        assert_ne!(identity_hash(&base), identity_hash(&other));
    }

    #[test]
    fn test_hash_key_round_trip() {
        let key = hash_key(u64::MAX);
        assert_eq!(key, "18446744073709551615");
        assert_eq!(parse_hash_key(&key).unwrap(), u64::MAX);
        assert!(parse_hash_key("-1").is_err());
    }
}
