//! Remote geolocation provider: the Google-compatible `geolocate` endpoint.

use super::payload::{parse_response, GeolocateRequest};
use super::types::{Fix, LocationError};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_ENDPOINT: &str = "https://www.googleapis.com/geolocation/v1/geolocate";

/// Something that turns a request body into a fix.
pub trait GeolocationService: Send + Sync {
    fn geolocate(&self, request: &GeolocateRequest) -> Result<Fix, LocationError>;
}

/// Blocking HTTP client for the geolocate API.
pub struct GoogleGeolocation {
    agent: ureq::Agent,
    endpoint: String,
    api_key: String,
}

impl GoogleGeolocation {
    pub fn new(endpoint: &str, api_key: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("siglocate/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            agent,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST the body and return the response text, whatever the status.
    fn post(&self, request: &GeolocateRequest) -> Result<String, LocationError> {
        let mut call = self.agent.post(&self.endpoint);
        // Keyless endpoints (beaconDB, self-hosted) take no query parameter.
        if !self.api_key.is_empty() {
            call = call.query("key", &self.api_key);
        }

        let response = match call.send_json(request) {
            Ok(response) => response,
            Err(ureq::Error::Status(code, response)) => {
                debug!(status = code, "geolocate returned an error status, reading body anyway");
                response
            }
            Err(ureq::Error::Transport(e)) => return Err(LocationError::Network(e.to_string())),
        };

        response
            .into_string()
            .map_err(|e| LocationError::Network(e.to_string()))
    }
}

impl GeolocationService for GoogleGeolocation {
    fn geolocate(&self, request: &GeolocateRequest) -> Result<Fix, LocationError> {
        let body = self.post(request)?;
        debug!(response = %body, "geolocate response");
        parse_response(&body)
    }
}
