//! IIS2DLPC register map
//!
//! Only the registers touched by the interrupt path are described here. Bit
//! positions follow the datasheet (DocID 031222).

// =============================================================================
// I2C Addresses
// =============================================================================

/// I2C address with SA0 tied low
pub const I2C_ADDR_SA0_LOW: u8 = 0x18;
/// I2C address with SA0 tied high
pub const I2C_ADDR_SA0_HIGH: u8 = 0x19;

// =============================================================================
// Register Addresses
// =============================================================================

pub const WHO_AM_I: u8 = 0x0F;
pub const CTRL1: u8 = 0x20;
pub const CTRL3: u8 = 0x22;
pub const CTRL4_INT1_PAD_CTRL: u8 = 0x23;
pub const CTRL5_INT2_PAD_CTRL: u8 = 0x24;
pub const OUT_X_L: u8 = 0x28;
pub const STATUS_DUP: u8 = 0x37;
pub const WAKE_UP_SRC: u8 = 0x38;
pub const TAP_SRC: u8 = 0x39;
pub const SIXD_SRC: u8 = 0x3A;
pub const ALL_INT_SRC: u8 = 0x3B;
pub const CTRL7: u8 = 0x3F;

/// Expected `WHO_AM_I` value
pub const DEVICE_ID: u8 = 0x44;

/// Number of output bytes (X, Y, Z, little-endian 16 bit each)
pub const OUT_LEN: usize = 6;

// =============================================================================
// Bit Fields
// =============================================================================

/// CTRL1: 50 Hz output data rate, low-power mode 1
pub const CTRL1_ODR_50HZ_LP1: u8 = 0x40;

/// CTRL3: latched interrupt (0 = pulsed)
pub const CTRL3_LIR: u8 = 1 << 4;

/// CTRL4_INT1_PAD_CTRL bits
pub const INT1_DRDY: u8 = 1 << 0;
pub const INT1_FTH: u8 = 1 << 1;
pub const INT1_DIFF5: u8 = 1 << 2;
/// Double tap on INT1 (the datasheet calls it `INT1_TAP`)
pub const INT1_TAP: u8 = 1 << 3;
pub const INT1_FF: u8 = 1 << 4;
pub const INT1_WU: u8 = 1 << 5;
pub const INT1_SINGLE_TAP: u8 = 1 << 6;
pub const INT1_6D: u8 = 1 << 7;

/// CTRL5_INT2_PAD_CTRL bits
pub const INT2_DRDY: u8 = 1 << 0;
pub const INT2_FTH: u8 = 1 << 1;
pub const INT2_DIFF5: u8 = 1 << 2;
pub const INT2_OVR: u8 = 1 << 3;
pub const INT2_DRDY_T: u8 = 1 << 4;
pub const INT2_BOOT: u8 = 1 << 5;
pub const INT2_SLEEP_CHG: u8 = 1 << 6;
pub const INT2_SLEEP_STATE: u8 = 1 << 7;

/// INT1 routes that need the embedded-function block enabled
pub const INT1_EMBEDDED_FUNCTIONS: u8 = INT1_TAP | INT1_FF | INT1_WU | INT1_SINGLE_TAP | INT1_6D;
/// INT2 routes that need the embedded-function block enabled
pub const INT2_EMBEDDED_FUNCTIONS: u8 = INT2_SLEEP_CHG | INT2_SLEEP_STATE;

/// CTRL7: enable tap/free-fall/wake-up/6D/sleep interrupt generation
pub const CTRL7_INTERRUPTS_ENABLE: u8 = 1 << 5;

/// STATUS_DUP bits
pub const STATUS_DRDY: u8 = 1 << 0;
pub const STATUS_FF_IA: u8 = 1 << 1;
pub const STATUS_6D_IA: u8 = 1 << 2;
pub const STATUS_SINGLE_TAP: u8 = 1 << 3;
pub const STATUS_DOUBLE_TAP: u8 = 1 << 4;
pub const STATUS_SLEEP_STATE_IA: u8 = 1 << 5;
pub const STATUS_DRDY_T: u8 = 1 << 6;
pub const STATUS_OVR: u8 = 1 << 7;

/// TAP_SRC bits
pub const TAP_SRC_DOUBLE_TAP: u8 = 1 << 4;
pub const TAP_SRC_SINGLE_TAP: u8 = 1 << 5;
pub const TAP_SRC_TAP_IA: u8 = 1 << 6;

/// Snapshot of the interrupt source registers `STATUS_DUP..=ALL_INT_SRC`,
/// read in one burst.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllSources {
    pub status_dup: u8,
    pub wake_up_src: u8,
    pub tap_src: u8,
    pub sixd_src: u8,
    pub all_int_src: u8,
}

impl AllSources {
    /// Number of consecutive registers covered by the snapshot
    pub const LEN: usize = (ALL_INT_SRC - STATUS_DUP + 1) as usize;

    pub const fn from_bytes(raw: [u8; Self::LEN]) -> Self {
        Self {
            status_dup: raw[0],
            wake_up_src: raw[1],
            tap_src: raw[2],
            sixd_src: raw[3],
            all_int_src: raw[4],
        }
    }

    pub const fn data_ready(&self) -> bool {
        self.status_dup & STATUS_DRDY != 0
    }

    pub const fn single_tap(&self) -> bool {
        self.status_dup & STATUS_SINGLE_TAP != 0
    }

    pub const fn double_tap(&self) -> bool {
        self.status_dup & STATUS_DOUBLE_TAP != 0
    }

    /// True when no status bit the dispatcher cares about is set
    pub const fn is_idle(&self) -> bool {
        self.status_dup & (STATUS_DRDY | STATUS_SINGLE_TAP | STATUS_DOUBLE_TAP) == 0
    }
}

/// Set or clear `mask` in `value`.
#[inline]
pub const fn with_bits(value: u8, mask: u8, enable: bool) -> u8 {
    if enable { value | mask } else { value & !mask }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_sources_covers_status_through_all_int_src() {
        assert_eq!(AllSources::LEN, 5);
    }

    #[test]
    fn test_all_sources_decodes_status_bits() {
        let sources = AllSources::from_bytes([STATUS_DRDY | STATUS_DOUBLE_TAP, 0, 0x20, 0, 0x01]);

        assert!(sources.data_ready());
        assert!(!sources.single_tap());
        assert!(sources.double_tap());
        assert!(!sources.is_idle());
        assert_eq!(sources.tap_src, 0x20);
        assert_eq!(sources.all_int_src, 0x01);
    }

    #[test]
    fn test_unrelated_status_bits_are_idle() {
        let sources = AllSources::from_bytes([STATUS_FF_IA | STATUS_OVR, 0, 0, 0, 0]);
        assert!(sources.is_idle());
    }

    #[test]
    fn test_with_bits() {
        assert_eq!(with_bits(0b1000_0000, INT1_DRDY, true), 0b1000_0001);
        assert_eq!(with_bits(0b1000_0001, INT1_DRDY, false), 0b1000_0000);
        assert_eq!(with_bits(0, INT1_DRDY, false), 0);
    }
}
