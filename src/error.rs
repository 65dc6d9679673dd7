//! Error definitions for the ADT7410 driver.

use embedded_hal::digital::ErrorKind as PinErrorKind;

use crate::data_types::UnsupportedAddress;

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug)]
pub enum Error<I2cError> {
    /// Underlying I2C transaction failed or timed out.
    I2c(I2cError),
    /// Alarm pin could not be sampled.
    Pin(PinErrorKind),
    /// Address is not one of the four strap options.
    UnsupportedAddress(u8),
    /// Provided parameter was outside datasheet limits.
    OutOfRange,
    /// Unsupported request (oversized burst, foreign device ID).
    InvalidConfig,
    /// Register access before `init` completed.
    NotReady,
    /// Every handler slot of the channel is taken.
    SubscriberLimit,
    /// No handler registered under that id.
    UnknownHandler,
}

impl<I2cError> From<UnsupportedAddress> for Error<I2cError> {
    fn from(err: UnsupportedAddress) -> Self {
        Error::UnsupportedAddress(err.0)
    }
}

impl<I2cError: core::fmt::Debug> core::fmt::Display for Error<I2cError> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::I2c(e) => write!(f, "I2C error: {:?}", e),
            Error::Pin(kind) => write!(f, "alarm pin error: {:?}", kind),
            Error::UnsupportedAddress(addr) => {
                write!(f, "unsupported address {:#04x} (expected 0x48..=0x4b)", addr)
            }
            Error::OutOfRange => write!(f, "parameter out of range"),
            Error::InvalidConfig => write!(f, "invalid configuration"),
            Error::NotReady => write!(f, "driver not initialized"),
            Error::SubscriberLimit => write!(f, "no free handler slot"),
            Error::UnknownHandler => write!(f, "handler not registered"),
        }
    }
}
