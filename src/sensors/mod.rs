//! Platform seams: permissions and the three signal sources.
//!
//! On a phone these wrap the permission model, the fused location client and
//! the telephony/Wi-Fi services. On a desktop they are backed by `iw` or by a
//! recorded [`snapshot::SensorSnapshot`].

pub mod iw;
pub mod snapshot;

use crate::location::{Fix, LocationError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    FineLocation,
    WifiState,
}

/// Everything the pipelines need before touching a sensor.
pub const REQUIRED_PERMISSIONS: [Permission; 2] = [Permission::FineLocation, Permission::WifiState];

pub trait PermissionGate: Send + Sync {
    /// Whether every permission in `perms` is already granted.
    fn granted(&self, perms: &[Permission]) -> bool;

    /// Ask for `perms` once. Returns true only when all were granted.
    fn request(&self, perms: &[Permission]) -> bool;
}

pub trait FusedLocationProvider: Send + Sync {
    /// The platform's cached last-known fix, if it has one.
    fn last_location(&self) -> Result<Option<Fix>, LocationError>;
}

/// Current Wi-Fi association.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WifiConnection {
    pub bssid: Option<String>,
    pub ssid: Option<String>,
}

pub trait WifiInfoSource: Send + Sync {
    fn connection_info(&self) -> Result<WifiConnection, LocationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RadioKind {
    Gsm,
    Wcdma,
    Cdma,
    Nr,
}

/// LTE cell identity plus the measured signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LteCell {
    pub ci: u32,
    pub tac: u32,
    pub mcc: u16,
    pub mnc: u16,
    #[serde(default)]
    pub dbm: Option<i32>,
}

/// A visible cell record. Only LTE carries an identity we can send today.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CellInfo {
    Lte(LteCell),
    Other { radio: RadioKind },
}

pub trait CellInfoSource: Send + Sync {
    fn all_cell_info(&self) -> Result<Vec<CellInfo>, LocationError>;
}

/// Desktops have no runtime permission model.
#[derive(Debug, Clone, Copy, Default)]
pub struct DesktopPermissions;

impl PermissionGate for DesktopPermissions {
    fn granted(&self, _perms: &[Permission]) -> bool {
        true
    }

    fn request(&self, _perms: &[Permission]) -> bool {
        true
    }
}

/// Desktops have no fused location client.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFusedProvider;

impl FusedLocationProvider for NoFusedProvider {
    fn last_location(&self) -> Result<Option<Fix>, LocationError> {
        Err(LocationError::Platform("fused location is not available on this platform".into()))
    }
}

/// No modem: nothing visible.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoModem;

impl CellInfoSource for NoModem {
    fn all_cell_info(&self) -> Result<Vec<CellInfo>, LocationError> {
        Ok(Vec::new())
    }
}
