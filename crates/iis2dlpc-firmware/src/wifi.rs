//! Wi-Fi station bring-up

use alloc::string::String;

use esp_radio::wifi::{AuthMethod, ClientConfig, ModeConfig, WifiController, WifiError};
use iis2dlpc_core::{AuthThreshold, ConfigError, WifiConfig};
use log::info;
use thiserror_no_std::Error;

#[derive(Error, Debug)]
pub enum WifiBringUpError {
    #[error("Invalid Wi-Fi configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Radio error: {0:?}")]
    Radio(WifiError),
}

impl From<WifiError> for WifiBringUpError {
    fn from(value: WifiError) -> Self {
        Self::Radio(value)
    }
}

const fn auth_method(threshold: AuthThreshold) -> AuthMethod {
    match threshold {
        AuthThreshold::Open => AuthMethod::None,
        AuthThreshold::Wpa => AuthMethod::Wpa,
        AuthThreshold::Wpa2Personal => AuthMethod::Wpa2Personal,
        AuthThreshold::Wpa3Personal => AuthMethod::Wpa3Personal,
    }
}

/// Configure station mode, start the radio and join the access point.
pub async fn start_station(
    controller: &mut WifiController<'static>,
    config: &WifiConfig<'_>,
) -> Result<(), WifiBringUpError> {
    config.validate()?;

    let client = ClientConfig::default()
        .with_ssid(String::from(config.ssid))
        .with_password(String::from(config.password))
        .with_auth_method(auth_method(config.auth_threshold));
    controller.set_config(&ModeConfig::Client(client))?;

    info!("Starting Wi-Fi station");
    controller.start_async().await?;

    info!("Connecting to {}", config.ssid);
    controller.connect_async().await?;

    info!("Wi-Fi connected");
    Ok(())
}
