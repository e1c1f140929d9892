//! Hardware-independent trigger handling for the ST IIS2DLPC accelerometer
//!
//! This crate contains the platform-agnostic part of the driver: the register
//! interface abstraction, the trigger registry, the interrupt bridge that
//! takes GPIO edges out of interrupt context, and the dispatcher that turns
//! the sensor's interrupt sources into callbacks.
//!
//! It is `#![no_std]` so it compiles on both embedded targets (ESP32-S3) and
//! desktop hosts (for the simulator and tests).

#![no_std]

#[cfg(test)]
extern crate std;

pub mod bridge;
pub mod config;
pub mod deferred;
pub mod driver;
pub mod error;
pub mod interface;
pub mod registers;
pub mod trigger;

#[cfg(test)]
mod testing;

pub use bridge::{BridgeState, InterruptBridge, InterruptMode, InterruptPin};
pub use config::{AuthThreshold, ConfigError, InterruptConfig, InterruptPad, WifiConfig};
#[cfg(any(feature = "trigger-own-thread", feature = "trigger-global-thread"))]
pub use deferred::DefaultDeferred;
pub use deferred::{DeferredDispatch, EdgeSignal, WorkId, WorkItem, WorkQueue};
pub use driver::{DispatchReport, Iis2dlpc};
pub use error::TriggerError;
pub use interface::{I2cInterface, RegisterInterface, SpiInterface};
pub use trigger::{TriggerHandler, TriggerKind, TriggerRegistry};
