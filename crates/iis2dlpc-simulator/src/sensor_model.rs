//! Register-level model of the IIS2DLPC, enough to exercise the trigger path.

use std::convert::Infallible;
use std::sync::Mutex;

use iis2dlpc_core::RegisterInterface;
use iis2dlpc_core::registers::{
    ALL_INT_SRC, CTRL1, CTRL4_INT1_PAD_CTRL, CTRL5_INT2_PAD_CTRL, CTRL7, CTRL7_INTERRUPTS_ENABLE,
    DEVICE_ID, INT1_DRDY, INT1_SINGLE_TAP, INT1_TAP, INT2_DRDY, OUT_X_L, STATUS_DOUBLE_TAP,
    STATUS_DRDY, STATUS_DUP, STATUS_SINGLE_TAP, TAP_SRC, TAP_SRC_DOUBLE_TAP, TAP_SRC_SINGLE_TAP,
    TAP_SRC_TAP_IA, WHO_AM_I,
};

const REG_FILE_LEN: usize = 0x40;

/// A single tap every this many samples
const SINGLE_TAP_PERIOD: u32 = 25;
/// A double tap every this many samples
const DOUBLE_TAP_PERIOD: u32 = 60;

/// Which interrupt pads pulse after a sample
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PadPulse {
    pub int1: bool,
    pub int2: bool,
}

pub struct SensorModel {
    regs: [u8; REG_FILE_LEN],
    samples: u32,
}

impl SensorModel {
    pub fn new() -> Self {
        let mut regs = [0; REG_FILE_LEN];
        regs[WHO_AM_I as usize] = DEVICE_ID;
        Self { regs, samples: 0 }
    }

    fn reg(&self, register: u8) -> u8 {
        self.regs[register as usize]
    }

    fn powered(&self) -> bool {
        self.reg(CTRL1) & 0xF0 != 0
    }

    /// Produce the next sample and latch its events. Nothing happens while
    /// the output data rate is zero.
    pub fn step(&mut self) -> PadPulse {
        if !self.powered() {
            return PadPulse::default();
        }

        self.samples = self.samples.wrapping_add(1);
        let n = self.samples;

        // Slow wobble around 1 g on Z, 14-bit left-justified like the part
        let wobble = ((n % 64) as i16 - 32) * 16;
        let sample: [i16; 3] = [wobble, -wobble / 2, 0x4000 + wobble / 4];
        for (axis, value) in sample.iter().enumerate() {
            let [lo, hi] = value.to_le_bytes();
            let base = OUT_X_L as usize + axis * 2;
            self.regs[base] = lo;
            self.regs[base + 1] = hi;
        }

        self.regs[STATUS_DUP as usize] |= STATUS_DRDY;
        if n % DOUBLE_TAP_PERIOD == 0 {
            self.regs[STATUS_DUP as usize] |= STATUS_DOUBLE_TAP;
            self.regs[TAP_SRC as usize] |= TAP_SRC_TAP_IA | TAP_SRC_DOUBLE_TAP;
        } else if n % SINGLE_TAP_PERIOD == 0 {
            self.regs[STATUS_DUP as usize] |= STATUS_SINGLE_TAP;
            self.regs[TAP_SRC as usize] |= TAP_SRC_TAP_IA | TAP_SRC_SINGLE_TAP;
        }

        self.pads()
    }

    fn pads(&self) -> PadPulse {
        let status = self.reg(STATUS_DUP);
        let int1 = self.reg(CTRL4_INT1_PAD_CTRL);
        let int2 = self.reg(CTRL5_INT2_PAD_CTRL);
        let functions = self.reg(CTRL7) & CTRL7_INTERRUPTS_ENABLE != 0;

        let drdy = status & STATUS_DRDY != 0;
        let single = functions && status & STATUS_SINGLE_TAP != 0;
        let double = functions && status & STATUS_DOUBLE_TAP != 0;

        PadPulse {
            int1: (drdy && int1 & INT1_DRDY != 0)
                || (single && int1 & INT1_SINGLE_TAP != 0)
                || (double && int1 & INT1_TAP != 0),
            int2: drdy && int2 & INT2_DRDY != 0,
        }
    }

    fn read(&mut self, register: u8, buf: &mut [u8]) {
        let start = register as usize;
        buf.copy_from_slice(&self.regs[start..start + buf.len()]);

        // Event flags clear once the whole source block has been read
        let end = start + buf.len();
        if start <= STATUS_DUP as usize && end > ALL_INT_SRC as usize {
            self.regs[STATUS_DUP as usize] &= !(STATUS_DRDY | STATUS_SINGLE_TAP | STATUS_DOUBLE_TAP);
            self.regs[TAP_SRC as usize] = 0;
        }
    }

    fn write(&mut self, register: u8, value: u8) {
        self.regs[register as usize] = value;
    }
}

impl Default for SensorModel {
    fn default() -> Self {
        Self::new()
    }
}

/// Bus handle onto a model shared with the thread that steps it
pub struct SimBus<'a> {
    model: &'a Mutex<SensorModel>,
}

impl<'a> SimBus<'a> {
    pub fn new(model: &'a Mutex<SensorModel>) -> Self {
        Self { model }
    }
}

impl RegisterInterface for SimBus<'_> {
    type Error = Infallible;

    async fn read_registers(&mut self, register: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        let mut model = self.model.lock().unwrap_or_else(|e| e.into_inner());
        model.read(register, buf);
        Ok(())
    }

    async fn write_register(&mut self, register: u8, value: u8) -> Result<(), Self::Error> {
        let mut model = self.model.lock().unwrap_or_else(|e| e.into_inner());
        model.write(register, value);
        Ok(())
    }
}
