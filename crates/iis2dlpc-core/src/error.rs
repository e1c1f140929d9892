use thiserror_no_std::Error;

/// Status returned by the trigger driver's public operations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerError {
    /// The trigger kind cannot be routed on the configured interrupt pad.
    #[error("Unsupported trigger")]
    NotSupported,
    /// The interrupt wiring could not be bound (bad pin, bridge already in use,
    /// or interrupts not initialised yet).
    #[error("Invalid interrupt configuration")]
    InvalidConfig,
    /// A bus or GPIO transfer failed.
    #[error("I/O error")]
    Io,
}
