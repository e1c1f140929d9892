//! ESP32-S3 firmware-specific modules for the IIS2DLPC trigger driver
//!
//! This crate contains hardware-specific code that cannot compile on desktop
//! targets: the esp-hal GPIO binding for the interrupt bridge, board wiring,
//! and Wi-Fi station bring-up.

#![no_std]

extern crate alloc;

pub mod board;
pub mod interrupt_pin;
pub mod wifi;
pub mod wifi_secrets;
