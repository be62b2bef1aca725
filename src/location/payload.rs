//! Request and response bodies of the `/geolocation/v1/geolocate` API.
//!
//! Request: either `{"wifiAccessPoints": [...]}` or `{"cellTowers": [...]}`.
//! Response: `{"location": {"lat", "lng"}, "accuracy"}`, or an error document
//! `{"error": {"code", "message"}}`.

use super::types::{CellDescriptor, Fix, LocationError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessPoint {
    pub mac_address: String,
}

/// A single geolocate request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum GeolocateRequest {
    Wifi {
        #[serde(rename = "wifiAccessPoints")]
        wifi_access_points: Vec<AccessPoint>,
    },
    Cell {
        #[serde(rename = "cellTowers")]
        cell_towers: Vec<CellDescriptor>,
    },
}

impl GeolocateRequest {
    /// Body for the currently associated access point.
    pub fn wifi(bssid: &str) -> Self {
        Self::Wifi {
            wifi_access_points: vec![AccessPoint {
                mac_address: bssid.to_string(),
            }],
        }
    }

    /// Body for a list of towers. An empty list still produces a body.
    pub fn cells(cells: Vec<CellDescriptor>) -> Self {
        Self::Cell { cell_towers: cells }
    }

    /// Number of transmitters in the request.
    pub fn len(&self) -> usize {
        match self {
            Self::Wifi { wifi_access_points } => wifi_access_points.len(),
            Self::Cell { cell_towers } => cell_towers.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Deserialize)]
struct GeolocateResponse {
    location: LatLng,
    accuracy: f64,
}

#[derive(Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[derive(Deserialize)]
struct ErrorDocument {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: u16,
    #[serde(default)]
    message: String,
}

/// Parse a response body, whatever the HTTP status was.
pub fn parse_response(body: &str) -> Result<Fix, LocationError> {
    match serde_json::from_str::<GeolocateResponse>(body) {
        Ok(r) => Ok(Fix::new(r.location.lat, r.location.lng, r.accuracy)),
        Err(parse_err) => match serde_json::from_str::<ErrorDocument>(body) {
            Ok(doc) => Err(LocationError::Service {
                code: doc.error.code,
                message: doc.error.message,
            }),
            Err(_) => Err(LocationError::InvalidResponse(parse_err.to_string())),
        },
    }
}
