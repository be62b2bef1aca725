//! Recorded sensor state loaded from JSON.
//!
//! ```json
//! {
//!   "permissions": { "granted": ["fine_location", "wifi_state"], "grant_on_request": true },
//!   "fused": { "lat": 35.68, "lon": 139.76, "accuracy": 12.0 },
//!   "wifi": { "bssid": "aa:bb:cc:dd:ee:ff", "ssid": "home" },
//!   "cells": [ { "type": "lte", "ci": 1234567, "tac": 4660, "mcc": 440, "mnc": 10, "dbm": -95 } ]
//! }
//! ```

use super::{
    CellInfo, CellInfoSource, FusedLocationProvider, Permission, PermissionGate, WifiConnection,
    WifiInfoSource, REQUIRED_PERMISSIONS,
};
use crate::config::ConfigError;
use crate::location::{Fix, LocationError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Mutex;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionState {
    #[serde(default = "all_permissions")]
    pub granted: Vec<Permission>,
    /// What the user answers when asked.
    #[serde(default = "default_true")]
    pub grant_on_request: bool,
}

fn all_permissions() -> Vec<Permission> {
    REQUIRED_PERMISSIONS.to_vec()
}

fn default_true() -> bool {
    true
}

impl Default for PermissionState {
    fn default() -> Self {
        Self {
            granted: all_permissions(),
            grant_on_request: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SensorSnapshot {
    #[serde(default)]
    pub permissions: PermissionState,
    /// Last cached fused fix; `null` means the provider has none.
    #[serde(default)]
    pub fused: Option<Fix>,
    /// Makes the fused provider fail with this message.
    #[serde(default)]
    pub fused_error: Option<String>,
    #[serde(default)]
    pub wifi: WifiConnection,
    #[serde(default)]
    pub cells: Vec<CellInfo>,
}

impl SensorSnapshot {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e.to_string()))?;
        Self::from_json(&data).map_err(|e| match e {
            ConfigError::Parse(_, msg) => ConfigError::Parse(path.to_path_buf(), msg),
            other => other,
        })
    }

    pub fn from_json(data: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(data).map_err(|e| ConfigError::Parse(Default::default(), e.to_string()))
    }

    pub fn permission_gate(&self) -> SnapshotPermissions {
        SnapshotPermissions {
            granted: Mutex::new(self.permissions.granted.iter().copied().collect()),
            grant_on_request: self.permissions.grant_on_request,
        }
    }
}

/// Recorded when the platform refused the location call for lack of permission.
const SECURITY_EXCEPTION: &str = "SecurityException";

impl FusedLocationProvider for SensorSnapshot {
    fn last_location(&self) -> Result<Option<Fix>, LocationError> {
        match self.fused_error.as_deref() {
            Some(SECURITY_EXCEPTION) => Err(LocationError::PermissionDenied),
            Some(msg) => Err(LocationError::Platform(msg.to_string())),
            None => Ok(self.fused),
        }
    }
}

impl WifiInfoSource for SensorSnapshot {
    fn connection_info(&self) -> Result<WifiConnection, LocationError> {
        Ok(self.wifi.clone())
    }
}

impl CellInfoSource for SensorSnapshot {
    fn all_cell_info(&self) -> Result<Vec<CellInfo>, LocationError> {
        Ok(self.cells.clone())
    }
}

/// Permission gate over the recorded state. A granted request sticks.
pub struct SnapshotPermissions {
    granted: Mutex<HashSet<Permission>>,
    grant_on_request: bool,
}

impl PermissionGate for SnapshotPermissions {
    fn granted(&self, perms: &[Permission]) -> bool {
        match self.granted.lock() {
            Ok(granted) => perms.iter().all(|p| granted.contains(p)),
            Err(_) => false,
        }
    }

    fn request(&self, perms: &[Permission]) -> bool {
        if !self.grant_on_request {
            return self.granted(perms);
        }
        if let Ok(mut granted) = self.granted.lock() {
            granted.extend(perms.iter().copied());
        }
        self.granted(perms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::{LteCell, RadioKind};
    use std::io::Write;

    #[test]
    fn test_empty_document_defaults() {
        let snap = SensorSnapshot::from_json("{}").unwrap();
        assert!(snap.permission_gate().granted(&REQUIRED_PERMISSIONS));
        assert_eq!(snap.last_location(), Ok(None));
        assert_eq!(snap.connection_info().unwrap().bssid, None);
        assert!(snap.all_cell_info().unwrap().is_empty());
    }

    #[test]
    fn test_full_document() {
        let snap = SensorSnapshot::from_json(
            r#"{
                "fused": {"lat": 35.68, "lon": 139.76, "accuracy": 12.0},
                "wifi": {"bssid": "aa:bb:cc:dd:ee:ff", "ssid": "home"},
                "cells": [
                    {"type": "lte", "ci": 1234567, "tac": 4660, "mcc": 440, "mnc": 10, "dbm": -95},
                    {"type": "other", "radio": "gsm"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(snap.last_location().unwrap(), Some(Fix::new(35.68, 139.76, 12.0)));
        assert_eq!(snap.connection_info().unwrap().ssid.as_deref(), Some("home"));
        assert_eq!(
            snap.all_cell_info().unwrap(),
            vec![
                CellInfo::Lte(LteCell { ci: 1234567, tac: 4660, mcc: 440, mnc: 10, dbm: Some(-95) }),
                CellInfo::Other { radio: RadioKind::Gsm },
            ]
        );
    }

    #[test]
    fn test_fused_error() {
        let snap = SensorSnapshot::from_json(r#"{"fused_error": "play services missing"}"#).unwrap();
        assert_eq!(
            snap.last_location(),
            Err(LocationError::Platform("play services missing".into()))
        );
    }

    #[test]
    fn test_fused_security_exception_is_permission_denied() {
        let snap = SensorSnapshot::from_json(r#"{"fused_error": "SecurityException"}"#).unwrap();
        assert_eq!(snap.last_location(), Err(LocationError::PermissionDenied));
    }

    #[test]
    fn test_permission_request_granted() {
        let snap = SensorSnapshot::from_json(r#"{"permissions": {"granted": []}}"#).unwrap();
        let gate = snap.permission_gate();
        assert!(!gate.granted(&REQUIRED_PERMISSIONS));
        assert!(gate.request(&REQUIRED_PERMISSIONS));
        assert!(gate.granted(&REQUIRED_PERMISSIONS));
    }

    #[test]
    fn test_permission_request_denied() {
        let snap = SensorSnapshot::from_json(
            r#"{"permissions": {"granted": ["wifi_state"], "grant_on_request": false}}"#,
        )
        .unwrap();
        let gate = snap.permission_gate();
        assert!(gate.granted(&[Permission::WifiState]));
        assert!(!gate.request(&REQUIRED_PERMISSIONS));
        assert!(!gate.granted(&REQUIRED_PERMISSIONS));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"wifi": {{"bssid": "00:11:22:33:44:55"}}}}"#).unwrap();
        let snap = SensorSnapshot::load(file.path()).unwrap();
        assert_eq!(snap.wifi.bssid.as_deref(), Some("00:11:22:33:44:55"));
    }

    #[test]
    fn test_load_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        match SensorSnapshot::load(file.path()) {
            Err(ConfigError::Parse(path, _)) => assert_eq!(path, file.path()),
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
    }
}
