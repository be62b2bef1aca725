//! siglocate: approximate device location from fused fixes, the associated
//! Wi-Fi access point, or visible LTE cells.

pub mod app;
pub mod config;
pub mod location;
pub mod logging;
pub mod sensors;
pub mod server;
