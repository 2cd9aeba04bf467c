//! Registration country and vehicle class enums.

use crate::error::AutobotError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Country in which a vehicle is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum RegCountry {
    #[default]
    DK,
    NO,
}

impl RegCountry {
    pub fn as_str(self) -> &'static str {
        match self {
            RegCountry::DK => "DK",
            RegCountry::NO => "NO",
        }
    }
}

impl fmt::Display for RegCountry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegCountry {
    type Err = AutobotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DK" => Ok(RegCountry::DK),
            "NO" => Ok(RegCountry::NO),
            _ => Err(AutobotError::UnknownCountry(s.to_string())),
        }
    }
}

/// Overall class of a vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum VehicleType {
    #[default]
    Unknown,
    Car,
    Bus,
    Van,
    Truck,
    Trailer,
}

impl VehicleType {
    /// Every class except [`VehicleType::Unknown`].
    pub const KNOWN: [VehicleType; 5] = [
        VehicleType::Car,
        VehicleType::Bus,
        VehicleType::Van,
        VehicleType::Truck,
        VehicleType::Trailer,
    ];

    /// Map the registry feed's numeric class code (`KoeretoejArtNummer`).
    ///
    /// | code | class   |
    /// |------|---------|
    /// | 1    | Car     |
    /// | 2    | Van     |
    /// | 3    | Truck   |
    /// | 4    | Bus     |
    /// | 8    | Trailer |
    ///
    /// Anything else is `Unknown`.
    pub fn from_feed_code(code: u64) -> Self {
        match code {
            1 => VehicleType::Car,
            2 => VehicleType::Van,
            3 => VehicleType::Truck,
            4 => VehicleType::Bus,
            8 => VehicleType::Trailer,
            _ => VehicleType::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VehicleType::Unknown => "Unknown",
            VehicleType::Car => "Car",
            VehicleType::Bus => "Bus",
            VehicleType::Van => "Van",
            VehicleType::Truck => "Truck",
            VehicleType::Trailer => "Trailer",
        }
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive; unrecognized names become `Unknown`.
impl FromStr for VehicleType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "car" => VehicleType::Car,
            "bus" => VehicleType::Bus,
            "van" => VehicleType::Van,
            "truck" => VehicleType::Truck,
            "trailer" => VehicleType::Trailer,
            _ => VehicleType::Unknown,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_country_parsing() {
        assert_eq!("dk".parse::<RegCountry>().unwrap(), RegCountry::DK);
        assert_eq!(" NO ".parse::<RegCountry>().unwrap(), RegCountry::NO);
        assert!(matches!(
            "SE".parse::<RegCountry>(),
            Err(AutobotError::UnknownCountry(c)) if c == "SE"
        ));
    }

    #[test]
    fn test_feed_codes() {
        assert_eq!(VehicleType::from_feed_code(1), VehicleType::Car);
        assert_eq!(VehicleType::from_feed_code(8), VehicleType::Trailer);
        assert_eq!(VehicleType::from_feed_code(99), VehicleType::Unknown);
    }

    #[test]
    fn test_type_from_str_falls_back_to_unknown() {
        assert_eq!("TRUCK".parse::<VehicleType>().unwrap(), VehicleType::Truck);
        assert_eq!("tractor".parse::<VehicleType>().unwrap(), VehicleType::Unknown);
    }
}
