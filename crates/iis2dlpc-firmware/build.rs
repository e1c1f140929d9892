//! Loads Wi-Fi credentials from `.env` (or the environment) at build time.
//!
//! ```text
//! WIFI_SSID=myssid
//! WIFI_PASSWORD=mypassword
//! ```

const KEYS: [&str; 2] = ["WIFI_SSID", "WIFI_PASSWORD"];

fn main() {
    println!("cargo:rerun-if-changed=.env");
    for key in KEYS {
        println!("cargo:rerun-if-env-changed={key}");
    }

    if let Err(e) = dotenvy::dotenv() {
        println!("cargo:warning=No .env file loaded ({e}), using process environment");
    }

    for key in KEYS {
        let value = std::env::var(key).unwrap_or_else(|_| {
            println!("cargo:warning={key} is not set, Wi-Fi bring-up will fail");
            String::new()
        });
        println!("cargo:rustc-env={key}={value}");
    }
}
