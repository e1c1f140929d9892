//! Wi-Fi credentials baked in by `build.rs`

use iis2dlpc_core::WifiConfig;

pub const WIFI_SSID: &str = env!("WIFI_SSID");
pub const WIFI_PASSWORD: &str = env!("WIFI_PASSWORD");

/// Station configuration built from the compile-time credentials
pub const fn station_config() -> WifiConfig<'static> {
    WifiConfig::new(WIFI_SSID, WIFI_PASSWORD)
}
