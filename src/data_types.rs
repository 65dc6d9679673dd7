//! Data types for the ADT7410 driver.

use embedded_hal::digital::PinState;

/// I2C slave addresses selectable via the A1/A0 strap pins.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum DeviceAddress {
    /// A1 = 0, A0 = 0.
    #[default]
    Addr0x48,
    /// A1 = 0, A0 = 1.
    Addr0x49,
    /// A1 = 1, A0 = 0.
    Addr0x4A,
    /// A1 = 1, A0 = 1.
    Addr0x4B,
}

impl From<DeviceAddress> for u8 {
    fn from(address: DeviceAddress) -> Self {
        match address {
            DeviceAddress::Addr0x48 => 0x48,
            DeviceAddress::Addr0x49 => 0x49,
            DeviceAddress::Addr0x4A => 0x4A,
            DeviceAddress::Addr0x4B => 0x4B,
        }
    }
}

/// Raw address that none of the strap options produce.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct UnsupportedAddress(pub u8);

impl TryFrom<u8> for DeviceAddress {
    type Error = UnsupportedAddress;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            0x48 => Ok(DeviceAddress::Addr0x48),
            0x49 => Ok(DeviceAddress::Addr0x49),
            0x4A => Ok(DeviceAddress::Addr0x4A),
            0x4B => Ok(DeviceAddress::Addr0x4B),
            other => Err(UnsupportedAddress(other)),
        }
    }
}

/// ADC resolution (configuration register bit 7).
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Resolution {
    /// 13-bit conversions, 1/16 °C per LSB.
    #[default]
    Default,
    /// 16-bit conversions, 1/128 °C per LSB.
    High,
}

impl Resolution {
    /// Divisor between a raw register word and degrees Celsius.
    pub const fn factor(self) -> i16 {
        match self {
            Resolution::Default => crate::registers::SCALE_13BIT,
            Resolution::High => crate::registers::SCALE_16BIT,
        }
    }

    /// [`factor`](Self::factor) as a float, for the codec.
    pub fn scale(self) -> f32 {
        f32::from(self.factor())
    }
}

/// The three independent comparator limits.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Limit {
    /// T_HIGH setpoint, reported on the INT pin.
    Over,
    /// T_LOW setpoint, reported on the INT pin.
    Under,
    /// T_CRIT setpoint, reported on the CT pin.
    Critical,
}

impl Limit {
    pub(crate) const fn index(self) -> usize {
        match self {
            Limit::Over => 0,
            Limit::Under => 1,
            Limit::Critical => 2,
        }
    }
}

/// Direction of a threshold crossing.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LimitState {
    /// Temperature is back on the safe side of the limit.
    #[default]
    FallenBelow,
    /// Temperature crossed the limit.
    Exceeded,
}

impl LimitState {
    /// Map the level of an active-low alarm pin (INT/CT reset polarity).
    pub fn from_active_low(level: PinState) -> Self {
        match level {
            PinState::Low => LimitState::Exceeded,
            PinState::High => LimitState::FallenBelow,
        }
    }
}

/// Lifecycle of a driver instance.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DriverState {
    /// Constructed with a valid address, device not yet configured.
    Addressed,
    /// Comparator mode and resolution programmed; register accessors are usable.
    Ready,
}

/// Conversion mode (configuration register bits 6:5).
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum OperationMode {
    #[default]
    Continuous,
    OneShot,
    /// One conversion per second, idle in between.
    OneSps,
    Shutdown,
}

/// Number of consecutive out-of-limit conversions before INT/CT assert (bits 1:0).
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum FaultQueue {
    #[default]
    One,
    Two,
    Three,
    Four,
}
