//! Location resolver: the three signal pipelines.
//!
//! Fused: platform cache → fix (no network)
//! Wi-Fi: associated BSSID → geolocate → fix
//! Cell:  visible LTE towers → geolocate → fix

use super::payload::GeolocateRequest;
use super::providers::GeolocationService;
use super::types::{CellDescriptor, Fix, LocationError, LocationSource};
use crate::sensors::{CellInfo, CellInfoSource, FusedLocationProvider, LteCell, WifiInfoSource};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct LocationResolver {
    fused: Arc<dyn FusedLocationProvider>,
    wifi: Arc<dyn WifiInfoSource>,
    cells: Arc<dyn CellInfoSource>,
    service: Arc<dyn GeolocationService>,
}

impl LocationResolver {
    pub fn new(
        fused: Arc<dyn FusedLocationProvider>,
        wifi: Arc<dyn WifiInfoSource>,
        cells: Arc<dyn CellInfoSource>,
        service: Arc<dyn GeolocationService>,
    ) -> Self {
        Self {
            fused,
            wifi,
            cells,
            service,
        }
    }

    /// Run one pipeline. Failures are logged here with their source.
    pub fn resolve(&self, source: LocationSource) -> Result<Fix, LocationError> {
        let result = match source {
            LocationSource::Fused => self.resolve_fused(),
            LocationSource::Wifi => self.resolve_wifi(),
            LocationSource::Cell => self.resolve_cell(),
        };
        match &result {
            Ok(fix) => info!(%source, lat = fix.lat, lon = fix.lon, accuracy = fix.accuracy, "location resolved"),
            Err(e) => warn!(%source, error = %e, "location request failed"),
        }
        result
    }

    /// Last cached fused fix. A provider with nothing cached is a failure.
    pub fn resolve_fused(&self) -> Result<Fix, LocationError> {
        self.fused.last_location()?.ok_or(LocationError::NoCachedLocation)
    }

    /// Geolocate the associated access point. Not associated: no request.
    pub fn resolve_wifi(&self) -> Result<Fix, LocationError> {
        let conn = self.wifi.connection_info()?;
        let bssid = conn.bssid.ok_or(LocationError::NotAssociated)?;
        debug!(bssid = %bssid, ssid = conn.ssid.as_deref().unwrap_or(""), "wifi: using access point");

        self.service.geolocate(&GeolocateRequest::wifi(&bssid))
    }

    /// Geolocate the visible LTE towers. An empty list is still sent.
    pub fn resolve_cell(&self) -> Result<Fix, LocationError> {
        let request = GeolocateRequest::cells(lte_descriptors(self.cells.all_cell_info()?));
        if request.is_empty() {
            debug!("cell: no LTE towers visible, asking anyway");
        } else {
            debug!(towers = request.len(), "cell: using towers");
        }

        self.service.geolocate(&request)
    }
}

/// Keep LTE records only. Other radio kinds have no mapping yet.
pub fn lte_descriptors(cells: Vec<CellInfo>) -> Vec<CellDescriptor> {
    cells
        .into_iter()
        .filter_map(|cell| match cell {
            CellInfo::Lte(lte) => Some(describe_lte(&lte)),
            CellInfo::Other { radio } => {
                debug!(?radio, "cell: skipping non-LTE record");
                None
            }
        })
        .collect()
}

fn describe_lte(cell: &LteCell) -> CellDescriptor {
    CellDescriptor {
        cell_id: cell.ci,
        // LTE has no LAC; the tracking area code stands in for it.
        location_area_code: cell.tac,
        mobile_country_code: cell.mcc,
        mobile_network_code: cell.mnc,
        tac: Some(cell.tac),
        signal_strength: cell.dbm,
    }
}
