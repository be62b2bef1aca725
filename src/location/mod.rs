//! Location subsystem for siglocate.
//!
//! Resolves a coordinate from the fused location cache, the associated
//! Wi-Fi access point, or the visible LTE cells via a remote geolocate API.

pub mod payload;
pub mod providers;
pub mod resolver;
pub mod types;

pub use payload::{parse_response, GeolocateRequest};
pub use providers::{GeolocationService, GoogleGeolocation, DEFAULT_ENDPOINT};
pub use resolver::LocationResolver;
pub use types::{CellDescriptor, Fix, LocationError, LocationSource};
