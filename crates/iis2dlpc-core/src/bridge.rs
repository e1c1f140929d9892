//! Interrupt bridge between the GPIO edge callback and the dispatch context
//!
//! The bridge owns the interrupt pin once it is attached and tracks whether
//! the pin is armed. An edge disarms the pin at the GPIO level and submits a
//! notification through the [`DeferredDispatch`] capability; the dispatcher
//! calls [`InterruptBridge::rearm`] when it is done. Because the pin stays
//! masked in between, at most one dispatch cycle is ever outstanding.
//!
//! The bridge is meant to live in a `static` so the interrupt handler can
//! reach it:
//!
//! ```rust,ignore
//! static ACCEL_BRIDGE: InterruptBridge<MyPin, EdgeSignal> =
//!     InterruptBridge::new(EdgeSignal::new());
//!
//! #[handler]
//! fn gpio_isr() {
//!     ACCEL_BRIDGE.on_edge(pending_pins());
//! }
//! ```

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embedded_hal::digital::ErrorType;

use crate::config::MAX_GPIO_PIN;
use crate::deferred::DeferredDispatch;
use crate::error::TriggerError;

/// Interrupt sensing mode of a GPIO pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptMode {
    /// Interrupt sensing off
    Disabled,
    /// Interrupt on the transition to the active level
    EdgeToActive,
}

/// GPIO capability needed by the bridge.
///
/// embedded-hal has no interface for pin interrupts, so boards implement this
/// for their pin type.
pub trait InterruptPin: ErrorType {
    /// Put the pin in input mode with the board's pull/polarity settings.
    fn configure_input(&mut self) -> Result<(), Self::Error>;

    /// Change the interrupt sensing mode.
    fn set_interrupt(&mut self, mode: InterruptMode) -> Result<(), Self::Error>;
}

/// Arming state of the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    /// Waiting for an edge
    Armed,
    /// Edge taken, pin masked until the dispatcher re-arms
    Disarmed,
}

struct Binding<P> {
    pin: P,
    mask: u32,
    state: BridgeState,
}

/// Edge handler state shared between interrupt and task context
pub struct InterruptBridge<P, D> {
    binding: Mutex<CriticalSectionRawMutex, RefCell<Option<Binding<P>>>>,
    deferred: D,
}

impl<P, D> InterruptBridge<P, D>
where
    P: InterruptPin,
    D: DeferredDispatch,
{
    /// Create an unbound bridge that submits edges through `deferred`.
    pub const fn new(deferred: D) -> Self {
        Self {
            binding: Mutex::new(RefCell::new(None)),
            deferred,
        }
    }

    pub fn deferred(&self) -> &D {
        &self.deferred
    }

    /// Take ownership of `pin`, wired to GPIO number `gpio_pin`.
    ///
    /// The bridge starts disarmed; call [`arm`](Self::arm) once the sensor
    /// side is ready. Fails with [`TriggerError::InvalidConfig`] if the pin
    /// number does not fit a pin mask or the bridge is already bound, handing
    /// the pin back in that case.
    pub fn attach(&self, pin: P, gpio_pin: u8) -> Result<(), (TriggerError, P)> {
        if gpio_pin > MAX_GPIO_PIN {
            return Err((TriggerError::InvalidConfig, pin));
        }

        self.binding.lock(|binding| {
            let mut binding = binding.borrow_mut();
            if binding.is_some() {
                return Err((TriggerError::InvalidConfig, pin));
            }
            *binding = Some(Binding {
                pin,
                mask: 1 << gpio_pin,
                state: BridgeState::Disarmed,
            });
            Ok(())
        })
    }

    pub fn is_attached(&self) -> bool {
        self.binding.lock(|binding| binding.borrow().is_some())
    }

    /// Release the pin, leaving the bridge unbound. Edge sensing is turned
    /// off before the pin is handed back.
    pub fn detach(&self) -> Option<P> {
        self.binding.lock(|binding| {
            let mut binding = binding.borrow_mut().take()?;
            let _ = binding.pin.set_interrupt(InterruptMode::Disabled);
            Some(binding.pin)
        })
    }

    /// Current arming state, `None` while unbound.
    pub fn state(&self) -> Option<BridgeState> {
        self.binding
            .lock(|binding| binding.borrow().as_ref().map(|b| b.state))
    }

    /// Run `f` with the bound pin, e.g. to read or clear its interrupt status.
    pub fn with_pin<T>(&self, f: impl FnOnce(&mut P) -> T) -> Option<T> {
        self.binding
            .lock(|binding| binding.borrow_mut().as_mut().map(|b| f(&mut b.pin)))
    }

    /// GPIO edge callback.
    ///
    /// `pins` is the mask of GPIOs whose interrupt fired. Edges for other pins
    /// sharing the same callback and edges that arrive while disarmed are
    /// ignored. If the deferred context refuses the hand-off the pin is armed
    /// again, so a lost notification never leaves the line masked. Returns
    /// `true` when the edge was handed off.
    pub fn on_edge(&self, pins: u32) -> bool {
        let taken = self.binding.lock(|binding| {
            let mut binding = binding.borrow_mut();
            let Some(binding) = binding.as_mut() else {
                return false;
            };

            if pins & binding.mask == 0 || binding.state == BridgeState::Disarmed {
                return false;
            }

            // Nothing useful to do with a failure here; the dispatcher's
            // re-arm rewrites the mode anyway.
            let _ = binding.pin.set_interrupt(InterruptMode::Disabled);
            binding.state = BridgeState::Disarmed;
            true
        });

        if !taken {
            return false;
        }

        if self.deferred.submit() {
            return true;
        }

        log::warn!("Edge hand-off refused, re-arming");
        if let Err(e) = self.arm() {
            log::error!("Could not re-arm after refused hand-off: {}", e);
        }
        false
    }

    /// Enable edge sensing and move to [`BridgeState::Armed`].
    pub fn arm(&self) -> Result<(), TriggerError> {
        self.binding.lock(|binding| {
            let mut binding = binding.borrow_mut();
            let binding = binding.as_mut().ok_or(TriggerError::InvalidConfig)?;

            binding
                .pin
                .set_interrupt(InterruptMode::EdgeToActive)
                .map_err(|e| {
                    log::error!("Failed to enable pin interrupt: {:?}", e);
                    TriggerError::Io
                })?;
            binding.state = BridgeState::Armed;
            Ok(())
        })
    }

    /// Re-enable the pin after a dispatch cycle.
    pub fn rearm(&self) -> Result<(), TriggerError> {
        self.arm()
    }
}
