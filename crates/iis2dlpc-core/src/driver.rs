//! IIS2DLPC trigger driver
//!
//! Ties the register interface, the trigger registry and the interrupt bridge
//! together. The owning task registers callbacks with
//! [`set_trigger`](Iis2dlpc::set_trigger); the dispatch context runs
//! [`handle_interrupt`](Iis2dlpc::handle_interrupt) once per edge handed off
//! by the bridge.
//!
//! ## Usage
//!
//! ```rust,ignore
//! static ACCEL_BRIDGE: InterruptBridge<BoardPin, EdgeSignal> =
//!     InterruptBridge::new(EdgeSignal::new());
//!
//! let mut accel = Iis2dlpc::new(I2cInterface::new(i2c, I2C_ADDR_SA0_HIGH), &ACCEL_BRIDGE);
//! accel
//!     .init_interrupts(&InterruptConfig::new(InterruptPad::Int1, 7), pin)
//!     .await?;
//! accel.set_trigger(TriggerKind::DataReady, Some(&on_data_ready)).await?;
//!
//! accel.run().await
//! ```

use log::{debug, error, info, warn};

use crate::bridge::{InterruptBridge, InterruptPin};
use crate::config::{InterruptConfig, InterruptPad};
use crate::deferred::{DeferredDispatch, EdgeSignal};
use crate::error::TriggerError;
use crate::interface::RegisterInterface;
use crate::registers::{
    AllSources, CTRL3, CTRL3_LIR, CTRL4_INT1_PAD_CTRL, CTRL5_INT2_PAD_CTRL, CTRL7,
    CTRL7_INTERRUPTS_ENABLE, INT1_EMBEDDED_FUNCTIONS, INT2_EMBEDDED_FUNCTIONS, OUT_LEN, OUT_X_L,
    STATUS_DUP, WHO_AM_I, with_bits,
};
use crate::trigger::{TriggerHandler, TriggerKind, TriggerRegistry};

/// Trigger kinds the dispatcher can fire in one cycle
const DISPATCH_KINDS: usize = 3;

/// Outcome of one dispatch cycle
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    sources: Option<AllSources>,
    fired: heapless::Vec<TriggerKind, DISPATCH_KINDS>,
}

impl DispatchReport {
    /// Source registers read during the cycle, `None` if the read failed.
    pub fn sources(&self) -> Option<&AllSources> {
        self.sources.as_ref()
    }

    /// Callbacks invoked, in invocation order.
    pub fn fired(&self) -> &[TriggerKind] {
        &self.fired
    }
}

/// Device state of one IIS2DLPC instance
pub struct Iis2dlpc<'a, R, P, D> {
    interface: R,
    bridge: &'a InterruptBridge<P, D>,
    pad: Option<InterruptPad>,
    registry: TriggerRegistry<'a>,
}

impl<'a, R, P, D> Iis2dlpc<'a, R, P, D>
where
    R: RegisterInterface,
    P: InterruptPin,
    D: DeferredDispatch,
{
    pub fn new(interface: R, bridge: &'a InterruptBridge<P, D>) -> Self {
        Self {
            interface,
            bridge,
            pad: None,
            registry: TriggerRegistry::new(),
        }
    }

    pub fn interface(&self) -> &R {
        &self.interface
    }

    pub fn interface_mut(&mut self) -> &mut R {
        &mut self.interface
    }

    pub fn bridge(&self) -> &'a InterruptBridge<P, D> {
        self.bridge
    }

    /// Interrupt pad selected by [`init_interrupts`](Self::init_interrupts).
    pub fn pad(&self) -> Option<InterruptPad> {
        self.pad
    }

    pub fn registry(&self) -> &TriggerRegistry<'a> {
        &self.registry
    }

    async fn read_register(&mut self, register: u8) -> Result<u8, TriggerError> {
        self.interface.read_register(register).await.map_err(|e| {
            error!("IIS2DLPC read of register {:#04x} failed: {:?}", register, e);
            TriggerError::Io
        })
    }

    async fn write_register(&mut self, register: u8, value: u8) -> Result<(), TriggerError> {
        self.interface
            .write_register(register, value)
            .await
            .map_err(|e| {
                error!("IIS2DLPC write of register {:#04x} failed: {:?}", register, e);
                TriggerError::Io
            })
    }

    /// Read `WHO_AM_I`, expected to be [`DEVICE_ID`](crate::registers::DEVICE_ID).
    pub async fn device_id(&mut self) -> Result<u8, TriggerError> {
        self.read_register(WHO_AM_I).await
    }

    /// Raw X/Y/Z output. Reading the output registers also clears a pending
    /// data-ready condition.
    pub async fn acceleration_raw(&mut self) -> Result<[i16; 3], TriggerError> {
        let mut raw = [0u8; OUT_LEN];
        self.interface
            .read_registers(OUT_X_L, &mut raw)
            .await
            .map_err(|e| {
                error!("IIS2DLPC acceleration read failed: {:?}", e);
                TriggerError::Io
            })?;

        Ok([
            i16::from_le_bytes([raw[0], raw[1]]),
            i16::from_le_bytes([raw[2], raw[3]]),
            i16::from_le_bytes([raw[4], raw[5]]),
        ])
    }

    /// Read `STATUS_DUP` through `ALL_INT_SRC` in one burst.
    pub async fn all_sources(&mut self) -> Result<AllSources, TriggerError> {
        let mut raw = [0u8; AllSources::LEN];
        self.interface
            .read_registers(STATUS_DUP, &mut raw)
            .await
            .map_err(|e| {
                error!("IIS2DLPC interrupt source read failed: {:?}", e);
                TriggerError::Io
            })?;
        Ok(AllSources::from_bytes(raw))
    }

    /// Bind the interrupt line and start listening for edges.
    ///
    /// Takes ownership of the GPIO `pin`, attaches it to the bridge, selects
    /// pulsed interrupt notification on the sensor and arms edge-to-active
    /// sensing. A pin number that cannot be bound yields
    /// [`TriggerError::InvalidConfig`]; pin or bus failures yield
    /// [`TriggerError::Io`]. A failure after the pin was attached releases it
    /// from the bridge again, so the call can be retried.
    pub async fn init_interrupts(
        &mut self,
        config: &InterruptConfig,
        mut pin: P,
    ) -> Result<(), TriggerError> {
        if config.pin_mask().is_none() {
            debug!("Cannot bind GPIO {} for IIS2DLPC interrupt", config.gpio_pin);
            return Err(TriggerError::InvalidConfig);
        }

        pin.configure_input().map_err(|e| {
            debug!("Could not configure GPIO {}: {:?}", config.gpio_pin, e);
            TriggerError::Io
        })?;

        self.bridge
            .attach(pin, config.gpio_pin)
            .map_err(|(err, _pin)| {
                debug!("Could not attach GPIO {} callback", config.gpio_pin);
                err
            })?;

        if let Err(e) = self.start_notifications().await {
            // Unbind so a later attempt can take the line again
            self.bridge.detach();
            return Err(e);
        }
        self.pad = Some(config.pad);

        info!(
            "IIS2DLPC: interrupts on {:?} via GPIO {}",
            config.pad, config.gpio_pin
        );
        Ok(())
    }

    async fn start_notifications(&mut self) -> Result<(), TriggerError> {
        // Pulsed notification: the pad drops again without a source read
        let ctrl3 = self.read_register(CTRL3).await?;
        self.write_register(CTRL3, with_bits(ctrl3, CTRL3_LIR, false))
            .await?;

        self.bridge.arm()
    }

    /// Register or clear the callback for `kind` and route it to the pad.
    ///
    /// Passing `None` disables the trigger. Kinds the configured pad cannot
    /// raise are rejected with [`TriggerError::NotSupported`] before anything
    /// is touched. Enabling data-ready first performs a dummy output read so a
    /// stale sample cannot hold the line. The callback is only stored once the
    /// routing registers were written.
    pub async fn set_trigger(
        &mut self,
        kind: TriggerKind,
        handler: Option<TriggerHandler<'a>>,
    ) -> Result<(), TriggerError> {
        let Some(pad) = self.pad else {
            error!("IIS2DLPC interrupts not initialised");
            return Err(TriggerError::InvalidConfig);
        };

        let Some(mask) = pad.route_mask(kind) else {
            error!("Unsupported trigger {} on {:?}", kind.name(), pad);
            return Err(TriggerError::NotSupported);
        };

        let enable = handler.is_some();
        if enable && kind == TriggerKind::DataReady {
            // dummy read: re-trigger interrupt
            if self.acceleration_raw().await.is_err() {
                warn!("IIS2DLPC dummy read failed, enabling data-ready anyway");
            }
        }

        self.route(pad, mask, enable).await?;
        self.registry.set(kind, handler);

        debug!(
            "IIS2DLPC: {} trigger {}",
            kind.name(),
            if enable { "enabled" } else { "disabled" }
        );
        Ok(())
    }

    /// Read-modify-write of the pad routing register, keeping
    /// `CTRL7.INTERRUPTS_ENABLE` in step with the embedded-function routes of
    /// both pads.
    async fn route(
        &mut self,
        pad: InterruptPad,
        mask: u8,
        enable: bool,
    ) -> Result<(), TriggerError> {
        let int1 = self.read_register(CTRL4_INT1_PAD_CTRL).await?;
        let int2 = self.read_register(CTRL5_INT2_PAD_CTRL).await?;
        let ctrl7 = self.read_register(CTRL7).await?;

        let (register, previous) = match pad {
            InterruptPad::Int1 => (CTRL4_INT1_PAD_CTRL, int1),
            InterruptPad::Int2 => (CTRL5_INT2_PAD_CTRL, int2),
        };
        let routed = with_bits(previous, mask, enable);
        let (int1, int2) = match pad {
            InterruptPad::Int1 => (routed, int2),
            InterruptPad::Int2 => (int1, routed),
        };

        let embedded_functions =
            int1 & INT1_EMBEDDED_FUNCTIONS != 0 || int2 & INT2_EMBEDDED_FUNCTIONS != 0;
        let ctrl7 = with_bits(ctrl7, CTRL7_INTERRUPTS_ENABLE, embedded_functions);

        self.write_register(register, routed).await?;
        if let Err(e) = self.write_register(CTRL7, ctrl7).await {
            if self.write_register(register, previous).await.is_err() {
                error!("IIS2DLPC could not restore route register {:#04x}", register);
            }
            return Err(e);
        }

        Ok(())
    }

    /// One dispatch cycle: read the interrupt sources once, invoke the
    /// callbacks of every active kind (data-ready, then tap, then double tap)
    /// and re-arm the pin.
    ///
    /// Runs in task context, never from the interrupt handler. A failed
    /// source read skips the callbacks but still re-arms.
    pub async fn handle_interrupt(&mut self) -> DispatchReport {
        let mut report = DispatchReport::default();

        match self.all_sources().await {
            Ok(sources) => {
                report.sources = Some(sources);

                if sources.data_ready() {
                    self.fire(TriggerKind::DataReady, &mut report);
                }
                #[cfg(feature = "tap")]
                {
                    if sources.single_tap() {
                        self.fire(TriggerKind::Tap, &mut report);
                    }
                    if sources.double_tap() {
                        self.fire(TriggerKind::DoubleTap, &mut report);
                    }
                }
            }
            Err(_) => warn!("IIS2DLPC dispatch skipped, sources unavailable"),
        }

        if let Err(e) = self.bridge.rearm() {
            error!("IIS2DLPC could not re-arm interrupt: {}", e);
        }

        report
    }

    fn fire(&self, kind: TriggerKind, report: &mut DispatchReport) {
        if let Some(handler) = self.registry.get(kind) {
            handler(kind);
            // Capacity covers every dispatchable kind
            let _ = report.fired.push(kind);
        }
    }
}

impl<'a, R, P> Iis2dlpc<'a, R, P, EdgeSignal>
where
    R: RegisterInterface,
    P: InterruptPin,
{
    /// Wait for the next edge and run one dispatch cycle.
    pub async fn dispatch_next(&mut self) -> DispatchReport {
        self.bridge.deferred().wait().await;
        self.handle_interrupt().await
    }

    /// Dedicated dispatch task body. Never returns.
    pub async fn run(&mut self) -> ! {
        info!("IIS2DLPC: dispatch task running");
        loop {
            self.dispatch_next().await;
        }
    }
}
