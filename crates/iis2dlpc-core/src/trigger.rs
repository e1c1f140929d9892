//! Trigger kinds and the per-device callback registry

/// Sensor trigger kinds a consumer can subscribe to.
///
/// The set mirrors the generic sensor trigger vocabulary; the IIS2DLPC only
/// routes [`DataReady`](Self::DataReady), [`Tap`](Self::Tap) and
/// [`DoubleTap`](Self::DoubleTap), everything else is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerKind {
    /// Periodic timer
    Timer,
    /// New sample available
    DataReady,
    /// Change beyond a configured delta
    Delta,
    /// Proximity near/far transition
    NearFar,
    /// Threshold crossing
    Threshold,
    /// Single tap
    Tap,
    /// Double tap
    DoubleTap,
}

impl TriggerKind {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Timer => "timer",
            Self::DataReady => "data-ready",
            Self::Delta => "delta",
            Self::NearFar => "near-far",
            Self::Threshold => "threshold",
            Self::Tap => "tap",
            Self::DoubleTap => "double-tap",
        }
    }
}

/// Callback invoked from the dispatch context when a trigger fires.
pub type TriggerHandler<'a> = &'a dyn Fn(TriggerKind);

/// One callback slot per trigger kind the sensor can raise.
#[derive(Default)]
pub struct TriggerRegistry<'a> {
    data_ready: Option<TriggerHandler<'a>>,
    tap: Option<TriggerHandler<'a>>,
    double_tap: Option<TriggerHandler<'a>>,
}

impl<'a> TriggerRegistry<'a> {
    pub const fn new() -> Self {
        Self {
            data_ready: None,
            tap: None,
            double_tap: None,
        }
    }

    fn slot(&mut self, kind: TriggerKind) -> Option<&mut Option<TriggerHandler<'a>>> {
        match kind {
            TriggerKind::DataReady => Some(&mut self.data_ready),
            TriggerKind::Tap => Some(&mut self.tap),
            TriggerKind::DoubleTap => Some(&mut self.double_tap),
            _ => None,
        }
    }

    /// Registered callback for `kind`, if any.
    pub fn get(&self, kind: TriggerKind) -> Option<TriggerHandler<'a>> {
        match kind {
            TriggerKind::DataReady => self.data_ready,
            TriggerKind::Tap => self.tap,
            TriggerKind::DoubleTap => self.double_tap,
            _ => None,
        }
    }

    pub fn is_registered(&self, kind: TriggerKind) -> bool {
        self.get(kind).is_some()
    }

    /// Store or clear the callback for `kind`.
    ///
    /// Returns `false` without touching anything when `kind` has no slot.
    pub fn set(&mut self, kind: TriggerKind, handler: Option<TriggerHandler<'a>>) -> bool {
        match self.slot(kind) {
            Some(slot) => {
                *slot = handler;
                true
            }
            None => false,
        }
    }
}

impl core::fmt::Debug for TriggerRegistry<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TriggerRegistry")
            .field("data_ready", &self.data_ready.is_some())
            .field("tap", &self.tap.is_some())
            .field("double_tap", &self.double_tap.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    #[test]
    fn test_set_and_clear() {
        let hits = Cell::new(0);
        let handler = |_: TriggerKind| hits.set(hits.get() + 1);

        let mut registry = TriggerRegistry::new();
        assert!(registry.set(TriggerKind::DataReady, Some(&handler)));
        assert!(registry.is_registered(TriggerKind::DataReady));
        assert!(!registry.is_registered(TriggerKind::Tap));

        registry.get(TriggerKind::DataReady).unwrap()(TriggerKind::DataReady);
        assert_eq!(hits.get(), 1);

        assert!(registry.set(TriggerKind::DataReady, None));
        assert!(registry.get(TriggerKind::DataReady).is_none());
    }

    #[test]
    fn test_kinds_without_slot_are_refused() {
        let handler = |_: TriggerKind| {};
        let mut registry = TriggerRegistry::new();

        assert!(!registry.set(TriggerKind::Threshold, Some(&handler)));
        assert!(!registry.set(TriggerKind::Timer, Some(&handler)));
        assert!(!registry.is_registered(TriggerKind::Threshold));
    }

    #[test]
    fn test_slots_are_independent() {
        let handler = |_: TriggerKind| {};
        let mut registry = TriggerRegistry::new();

        registry.set(TriggerKind::Tap, Some(&handler));
        registry.set(TriggerKind::DoubleTap, Some(&handler));
        registry.set(TriggerKind::Tap, None);

        assert!(!registry.is_registered(TriggerKind::Tap));
        assert!(registry.is_registered(TriggerKind::DoubleTap));
    }
}
