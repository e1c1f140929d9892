use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

use crate::registers::{INT1_DRDY, INT2_DRDY};
#[cfg(feature = "tap")]
use crate::registers::{INT1_SINGLE_TAP, INT1_TAP};
use crate::trigger::TriggerKind;

/// Largest GPIO number a bridge can filter on (pin masks are 32 bit)
pub const MAX_GPIO_PIN: u8 = 31;

/// Physical interrupt pad of the sensor
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptPad {
    /// INT1, routed through `CTRL4_INT1_PAD_CTRL`
    Int1,
    /// INT2, routed through `CTRL5_INT2_PAD_CTRL`
    Int2,
}

impl InterruptPad {
    /// Routing bit for `kind` on this pad, or `None` when the pad cannot
    /// raise that trigger.
    pub const fn route_mask(self, kind: TriggerKind) -> Option<u8> {
        match (self, kind) {
            (Self::Int1, TriggerKind::DataReady) => Some(INT1_DRDY),
            #[cfg(feature = "tap")]
            (Self::Int1, TriggerKind::Tap) => Some(INT1_SINGLE_TAP),
            #[cfg(feature = "tap")]
            (Self::Int1, TriggerKind::DoubleTap) => Some(INT1_TAP),
            (Self::Int2, TriggerKind::DataReady) => Some(INT2_DRDY),
            _ => None,
        }
    }

    pub const fn supports(self, kind: TriggerKind) -> bool {
        self.route_mask(kind).is_some()
    }
}

/// Board wiring of the sensor's interrupt line
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterruptConfig {
    /// Sensor pad the triggers are routed to
    pub pad: InterruptPad,
    /// GPIO number the pad is wired to on the MCU side
    pub gpio_pin: u8,
}

impl InterruptConfig {
    pub const fn new(pad: InterruptPad, gpio_pin: u8) -> Self {
        Self { pad, gpio_pin }
    }

    /// Bit of this pin in a GPIO interrupt status mask, `None` if the pin
    /// number does not fit in a mask.
    pub const fn pin_mask(&self) -> Option<u32> {
        if self.gpio_pin > MAX_GPIO_PIN {
            None
        } else {
            Some(1 << self.gpio_pin)
        }
    }
}

/// Minimum security accepted when joining an access point
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum AuthThreshold {
    Open,
    Wpa,
    #[default]
    Wpa2Personal,
    Wpa3Personal,
}

/// Station-mode Wi-Fi credentials used at boot
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy)]
#[serde(bound(deserialize = "'de: 'a"))]
pub struct WifiConfig<'a> {
    pub ssid: &'a str,
    pub password: &'a str,
    pub auth_threshold: AuthThreshold,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("SSID must be 1 to 32 bytes")]
    InvalidSsid,
    #[error("Passphrase must be 8 to 63 bytes for WPA networks")]
    InvalidPassword,
}

impl<'a> WifiConfig<'a> {
    /// Maximum SSID length defined by 802.11
    pub const MAX_SSID_LEN: usize = 32;
    /// WPA passphrase bounds
    pub const MIN_PASSWORD_LEN: usize = 8;
    pub const MAX_PASSWORD_LEN: usize = 63;

    pub const fn new(ssid: &'a str, password: &'a str) -> Self {
        Self {
            ssid,
            password,
            auth_threshold: AuthThreshold::Wpa2Personal,
        }
    }

    /// Check the credentials before handing them to the radio.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ssid.is_empty() || self.ssid.len() > Self::MAX_SSID_LEN {
            return Err(ConfigError::InvalidSsid);
        }

        // An open threshold still accepts a passphrase, but never requires one
        let needs_password = self.auth_threshold != AuthThreshold::Open;
        let len = self.password.len();
        if (needs_password || len > 0)
            && !(Self::MIN_PASSWORD_LEN..=Self::MAX_PASSWORD_LEN).contains(&len)
        {
            return Err(ConfigError::InvalidPassword);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int1_routes() {
        assert_eq!(InterruptPad::Int1.route_mask(TriggerKind::DataReady), Some(INT1_DRDY));
        assert_eq!(InterruptPad::Int1.route_mask(TriggerKind::Threshold), None);
        assert_eq!(InterruptPad::Int1.route_mask(TriggerKind::Timer), None);
    }

    #[cfg(feature = "tap")]
    #[test]
    fn test_int1_tap_routes() {
        assert_eq!(InterruptPad::Int1.route_mask(TriggerKind::Tap), Some(INT1_SINGLE_TAP));
        assert_eq!(InterruptPad::Int1.route_mask(TriggerKind::DoubleTap), Some(INT1_TAP));
    }

    #[test]
    fn test_int2_only_routes_data_ready() {
        assert!(InterruptPad::Int2.supports(TriggerKind::DataReady));
        assert!(!InterruptPad::Int2.supports(TriggerKind::Tap));
        assert!(!InterruptPad::Int2.supports(TriggerKind::DoubleTap));
        assert!(!InterruptPad::Int2.supports(TriggerKind::Delta));
    }

    #[test]
    fn test_pin_mask() {
        assert_eq!(InterruptConfig::new(InterruptPad::Int1, 0).pin_mask(), Some(1));
        assert_eq!(InterruptConfig::new(InterruptPad::Int1, 31).pin_mask(), Some(1 << 31));
        assert_eq!(InterruptConfig::new(InterruptPad::Int1, 32).pin_mask(), None);
    }

    #[test]
    fn test_wifi_config_defaults_to_wpa2() {
        let config = WifiConfig::new("myssid", "mypassword");
        assert_eq!(config.auth_threshold, AuthThreshold::Wpa2Personal);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_wifi_config_rejects_bad_ssid() {
        assert_eq!(WifiConfig::new("", "mypassword").validate(), Err(ConfigError::InvalidSsid));

        let long: std::string::String = core::iter::repeat_n('x', 33).collect();
        assert_eq!(
            WifiConfig::new(&long, "mypassword").validate(),
            Err(ConfigError::InvalidSsid)
        );
    }

    #[test]
    fn test_wifi_config_rejects_short_passphrase() {
        assert_eq!(
            WifiConfig::new("myssid", "short").validate(),
            Err(ConfigError::InvalidPassword)
        );
    }

    #[test]
    fn test_interrupt_config_serde_round_trip() {
        let config = InterruptConfig::new(InterruptPad::Int2, 17);
        let mut buf = [0u8; 8];
        let bytes = postcard::to_slice(&config, &mut buf).unwrap();

        let decoded: InterruptConfig = postcard::from_bytes(bytes).unwrap();
        assert_eq!(decoded, config);
    }

    #[test]
    fn test_wifi_config_deserializes_borrowed() {
        let config = WifiConfig {
            auth_threshold: AuthThreshold::Wpa3Personal,
            ..WifiConfig::new("office", "hunter2hunter2")
        };
        let mut buf = [0u8; 64];
        let bytes = postcard::to_slice(&config, &mut buf).unwrap();

        let decoded: WifiConfig<'_> = postcard::from_bytes(bytes).unwrap();
        assert_eq!(decoded.ssid, "office");
        assert_eq!(decoded.password, "hunter2hunter2");
        assert_eq!(decoded.auth_threshold, AuthThreshold::Wpa3Personal);
        assert_eq!(decoded.validate(), Ok(()));
    }

    #[test]
    fn test_open_network_needs_no_passphrase() {
        let config = WifiConfig {
            auth_threshold: AuthThreshold::Open,
            ..WifiConfig::new("guest", "")
        };
        assert_eq!(config.validate(), Ok(()));
    }
}
