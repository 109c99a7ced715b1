// lib.rs

use serde::{Deserialize, Serialize};

mod config;
pub use config::*;

mod sensor;
pub use sensor::*;

mod validate;
pub use validate::*;

mod indicator;
pub use indicator::*;

mod wifi;
pub use wifi::*;

mod net;
pub use net::*;

mod server;
pub use server::*;

pub const FW_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TempUnit {
    Celsius,
    Fahrenheit,
}

/// Converted sensor output. Built from a raw frame and never mutated afterwards.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct PhysicalReading {
    pub temperature: f32,
    pub humidity: f32,
    pub unit: TempUnit,
}

/// Integer-truncated reading that passed the plausibility bounds.
/// This is the only representation ever sent to a client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ServedReading {
    #[serde(rename = "Temp")]
    pub temperature: i32,
    #[serde(rename = "Humidity")]
    pub humidity: i32,
}

// EOF
