//! Autobot Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, utilities, and error handling for the Autobot workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`AutobotError`] and the crate [`Result`] alias
//! - **Logging**: tracing subscriber bootstrap shared by every binary
//! - **Vehicle**: the record model, its identity hash and name normalization
//!
//! # Example
//!
//! ```no_run
//! use autobot_common::vehicle::{RegCountry, Vehicle, VehicleType};
//!
//! let mut vehicle = Vehicle::new(VehicleType::Car, RegCountry::DK);
//! vehicle.vin = "WDB1234567890".into();
//! vehicle.rehash();
//! println!("{}", vehicle.meta.hash);
//! ```

pub mod error;
pub mod logging;
pub mod vehicle;

// Re-export commonly used types
pub use error::{AutobotError, Result};
