//! Linux Wi-Fi association via `iw dev <iface> link`.

use super::{WifiConnection, WifiInfoSource};
use crate::location::LocationError;
use std::process::Command;
use tracing::debug;

pub const DEFAULT_INTERFACE: &str = "wlan0";

pub struct IwWifi {
    interface: String,
}

impl IwWifi {
    pub fn new(interface: &str) -> Self {
        Self {
            interface: interface.to_string(),
        }
    }
}

impl WifiInfoSource for IwWifi {
    fn connection_info(&self) -> Result<WifiConnection, LocationError> {
        let output = Command::new("iw")
            .args(["dev", &self.interface, "link"])
            .output()
            .map_err(|e| LocationError::Platform(format!("cannot run iw: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LocationError::Platform(format!(
                "iw dev {} link failed: {}",
                self.interface,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        debug!(interface = %self.interface, output = %stdout.trim(), "iw link");
        Ok(parse_link(&stdout))
    }
}

/// Parse `iw dev <iface> link` output. "Not connected." yields no BSSID.
pub fn parse_link(output: &str) -> WifiConnection {
    let mut conn = WifiConnection::default();
    for line in output.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("Connected to ") {
            conn.bssid = rest
                .split_whitespace()
                .next()
                .filter(|mac| looks_like_mac(mac))
                .map(|mac| mac.to_lowercase());
        } else if let Some(ssid) = line.strip_prefix("SSID: ") {
            conn.ssid = Some(ssid.to_string());
        }
    }
    conn
}

fn looks_like_mac(s: &str) -> bool {
    let parts: Vec<&str> = s.split(':').collect();
    parts.len() == 6 && parts.iter().all(|p| p.len() == 2 && p.chars().all(|c| c.is_ascii_hexdigit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_connected() {
        let out = "Connected to AA:BB:CC:DD:EE:FF (on wlan0)\n\tSSID: home-net\n\tfreq: 5180\n\tsignal: -52 dBm\n";
        let conn = parse_link(out);
        assert_eq!(conn.bssid.as_deref(), Some("aa:bb:cc:dd:ee:ff"));
        assert_eq!(conn.ssid.as_deref(), Some("home-net"));
    }

    #[test]
    fn test_parse_not_connected() {
        assert_eq!(parse_link("Not connected.\n"), WifiConnection::default());
    }

    #[test]
    fn test_parse_rejects_malformed_bssid() {
        let conn = parse_link("Connected to something (on wlan0)\n\tSSID: x\n");
        assert_eq!(conn.bssid, None);
        assert_eq!(conn.ssid.as_deref(), Some("x"));
    }

    #[test]
    fn test_looks_like_mac() {
        assert!(looks_like_mac("00:11:22:aa:BB:cc"));
        assert!(!looks_like_mac("00:11:22:aa:BB"));
        assert!(!looks_like_mac("00:11:22:aa:BB:zz"));
    }
}
