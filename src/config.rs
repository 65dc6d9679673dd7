//! Bus and timing configuration.
//!
//! The driver only records these values. The host applies `clock_khz` and
//! `timeout_ms` when it builds its HAL I2C peripheral; a HAL that gives up after the
//! timeout reports it as an I2C error, which the driver returns as [`Error::I2c`].
//!
//! [`Error::I2c`]: crate::Error::I2c

/// Per-transaction timeout the host HAL should enforce.
pub const DEFAULT_TIMEOUT_MS: u32 = 1_000;
/// Fast-mode bus clock.
pub const DEFAULT_CLOCK_KHZ: u32 = 400;
/// Period at which the host should call `tick()` to sample the CT pin.
pub const CRITICAL_POLL_PERIOD_MS: u32 = 1_000;

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BusConfig {
    pub clock_khz: u32,
    pub timeout_ms: u32,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            clock_khz: DEFAULT_CLOCK_KHZ,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl BusConfig {
    pub const fn with_clock_khz(mut self, clock_khz: u32) -> Self {
        self.clock_khz = clock_khz;
        self
    }

    pub const fn with_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}
