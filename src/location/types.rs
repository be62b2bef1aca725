//! Core types for the location subsystem.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Which signal source produced (or was asked to produce) a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationSource {
    Fused,
    Wifi,
    Cell,
}

impl LocationSource {
    pub const ALL: [LocationSource; 3] = [Self::Fused, Self::Wifi, Self::Cell];

    /// Whether this pipeline talks to the remote geolocation service.
    pub fn uses_network(self) -> bool {
        !matches!(self, Self::Fused)
    }
}

impl fmt::Display for LocationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fused => write!(f, "FusedLocation"),
            Self::Wifi => write!(f, "Wifi"),
            Self::Cell => write!(f, "Cell"),
        }
    }
}

impl FromStr for LocationSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fused" | "gps" => Ok(Self::Fused),
            "wifi" | "wi-fi" => Ok(Self::Wifi),
            "cell" | "lte" => Ok(Self::Cell),
            other => Err(format!("Unknown source '{}'. Use 'fused', 'wifi' or 'cell'.", other)),
        }
    }
}

/// A resolved coordinate. Latitude, longitude and accuracy (metres) always
/// travel together; the absent case is an `Err` or `None` around it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    pub lat: f64,
    pub lon: f64,
    pub accuracy: f64,
}

impl Fix {
    pub fn new(lat: f64, lon: f64, accuracy: f64) -> Self {
        Self { lat, lon, accuracy }
    }
}

/// One cell tower as sent to the geolocation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellDescriptor {
    pub cell_id: u32,
    pub location_area_code: u32,
    pub mobile_country_code: u16,
    pub mobile_network_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tac: Option<u32>,
    /// Received signal strength in dBm.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal_strength: Option<i32>,
}

/// Location resolution errors.
///
/// Every variant ends up as the same "could not retrieve location" status;
/// the distinction only matters for logs.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationError {
    PermissionDenied,
    /// The fused provider answered, but had no cached fix.
    NoCachedLocation,
    /// No Wi-Fi access point is associated.
    NotAssociated,
    Platform(String),
    Network(String),
    InvalidResponse(String),
    /// The service answered with its own error document.
    Service { code: u16, message: String },
    Timeout(Duration),
    Cancelled,
    Worker(String),
}

impl fmt::Display for LocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PermissionDenied => write!(f, "Location permission not granted"),
            Self::NoCachedLocation => write!(f, "No cached location available"),
            Self::NotAssociated => write!(f, "No Wi-Fi access point associated"),
            Self::Platform(msg) => write!(f, "Platform error: {}", msg),
            Self::Network(msg) => write!(f, "Network error: {}", msg),
            Self::InvalidResponse(msg) => write!(f, "Invalid API response: {}", msg),
            Self::Service { code, message } => write!(f, "Geolocation service error {}: {}", code, message),
            Self::Timeout(d) => write!(f, "Timed out after {:.1}s", d.as_secs_f64()),
            Self::Cancelled => write!(f, "Request cancelled"),
            Self::Worker(msg) => write!(f, "Worker failed: {}", msg),
        }
    }
}

impl std::error::Error for LocationError {}
