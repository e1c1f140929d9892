//! Test doubles for the register bus, the interrupt pin and the deferred
//! dispatch capability.

use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::vec::Vec;

use embedded_hal::digital::{Error, ErrorKind, ErrorType};

use crate::bridge::{InterruptMode, InterruptPin};
use crate::deferred::DeferredDispatch;
use crate::interface::RegisterInterface;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegOp {
    Read { register: u8, len: usize },
    Write { register: u8, value: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockBusError;

/// In-memory register file that records every access.
#[derive(Debug)]
pub struct MockRegisters {
    regs: [u8; 0x40],
    pub ops: Vec<RegOp>,
    pub fail_reads: bool,
    pub fail_write_to: Option<u8>,
}

impl MockRegisters {
    pub fn new() -> Self {
        Self {
            regs: [0; 0x40],
            ops: Vec::new(),
            fail_reads: false,
            fail_write_to: None,
        }
    }

    pub fn reg(&self, register: u8) -> u8 {
        self.regs[register as usize]
    }

    pub fn set_reg(&mut self, register: u8, value: u8) {
        self.regs[register as usize] = value;
    }

    pub fn reads_of(&self, register: u8) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, RegOp::Read { register: r, .. } if *r == register))
            .count()
    }

    pub fn writes_to(&self, register: u8) -> Vec<u8> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                RegOp::Write { register: r, value } if *r == register => Some(*value),
                _ => None,
            })
            .collect()
    }

    /// Index of the first recorded op matching `pred`.
    pub fn position(&self, pred: impl Fn(&RegOp) -> bool) -> Option<usize> {
        self.ops.iter().position(pred)
    }
}

impl RegisterInterface for MockRegisters {
    type Error = MockBusError;

    async fn read_registers(&mut self, register: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.ops.push(RegOp::Read {
            register,
            len: buf.len(),
        });
        if self.fail_reads {
            return Err(MockBusError);
        }
        let start = register as usize;
        buf.copy_from_slice(&self.regs[start..start + buf.len()]);
        Ok(())
    }

    async fn write_register(&mut self, register: u8, value: u8) -> Result<(), Self::Error> {
        self.ops.push(RegOp::Write { register, value });
        if self.fail_write_to == Some(register) {
            return Err(MockBusError);
        }
        self.regs[register as usize] = value;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockPinError;

impl Error for MockPinError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

#[derive(Debug)]
pub struct MockPin {
    mode: InterruptMode,
    pub configured: bool,
    pub fail_configure: bool,
    pub fail_interrupts: bool,
    pub history: Vec<InterruptMode>,
}

impl MockPin {
    pub fn new() -> Self {
        Self {
            mode: InterruptMode::Disabled,
            configured: false,
            fail_configure: false,
            fail_interrupts: false,
            history: Vec::new(),
        }
    }

    pub fn failing_configure() -> Self {
        Self {
            fail_configure: true,
            ..Self::new()
        }
    }

    pub fn failing_interrupts() -> Self {
        Self {
            fail_interrupts: true,
            ..Self::new()
        }
    }

    pub fn mode(&self) -> InterruptMode {
        self.mode
    }
}

impl ErrorType for MockPin {
    type Error = MockPinError;
}

impl InterruptPin for MockPin {
    fn configure_input(&mut self) -> Result<(), Self::Error> {
        if self.fail_configure {
            return Err(MockPinError);
        }
        self.configured = true;
        Ok(())
    }

    fn set_interrupt(&mut self, mode: InterruptMode) -> Result<(), Self::Error> {
        if self.fail_interrupts {
            return Err(MockPinError);
        }
        self.mode = mode;
        self.history.push(mode);
        Ok(())
    }
}

/// Counts submissions instead of waking anything.
#[derive(Debug, Default)]
pub struct CountingDispatch {
    submitted: AtomicUsize,
    reject: AtomicBool,
}

impl CountingDispatch {
    pub const fn new() -> Self {
        Self {
            submitted: AtomicUsize::new(0),
            reject: AtomicBool::new(false),
        }
    }

    /// Dispatcher that refuses every hand-off
    pub const fn rejecting() -> Self {
        Self {
            submitted: AtomicUsize::new(0),
            reject: AtomicBool::new(true),
        }
    }

    pub fn count(&self) -> usize {
        self.submitted.load(Ordering::SeqCst)
    }

    pub fn set_rejecting(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }
}

impl DeferredDispatch for CountingDispatch {
    fn submit(&self) -> bool {
        if self.reject.load(Ordering::SeqCst) {
            return false;
        }
        self.submitted.fetch_add(1, Ordering::SeqCst);
        true
    }
}
