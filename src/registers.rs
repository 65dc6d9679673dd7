//! Register map, bitfields and the temperature codec for the ADT7410.

use crate::data_types::{FaultQueue, OperationMode, Resolution};

/// Default I2C address (A1 = A0 = GND).
pub const DEFAULT_I2C_ADDRESS: u8 = 0x48;

/// Register addresses.
pub mod addr {
    /// Temperature value, MSB at 0x00 and LSB at 0x01.
    pub const TEMP_MSB: u8 = 0x00;
    pub const TEMP_LSB: u8 = 0x01;
    pub const STATUS: u8 = 0x02;
    pub const CONFIG: u8 = 0x03;
    /// Over-temperature setpoint (T_HIGH).
    pub const T_HIGH_MSB: u8 = 0x04;
    pub const T_HIGH_LSB: u8 = 0x05;
    /// Under-temperature setpoint (T_LOW).
    pub const T_LOW_MSB: u8 = 0x06;
    pub const T_LOW_LSB: u8 = 0x07;
    /// Critical setpoint (T_CRIT).
    pub const T_CRIT_MSB: u8 = 0x08;
    pub const T_CRIT_LSB: u8 = 0x09;
    /// Hysteresis in whole degrees, bits 3:0.
    pub const T_HYST: u8 = 0x0A;
    pub const ID: u8 = 0x0B;
    /// Software reset; addressing it is the command, no payload.
    pub const RESET: u8 = 0x2F;
}

/// LSBs per °C in 13-bit mode.
pub const SCALE_13BIT: i16 = 16;
/// LSBs per °C in 16-bit mode.
pub const SCALE_16BIT: i16 = 128;

pub const HYSTERESIS_MAX: u8 = 15;
pub const HYSTERESIS_MASK: u8 = 0x0F;

/// Manufacturer ID in ID register bits 7:3.
pub const MANUFACTURER_ID: u8 = 0b1_1001;
pub const MANUFACTURER_ID_SHIFT: u8 = 3;

bitflags::bitflags! {
    /// CONFIG register bits (0x03).
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct ConfigBits: u8 {
        /// Bit 7: 1 = 16-bit resolution, 0 = 13-bit.
        const RESOLUTION  = 1 << 7;
        const OP_MODE1    = 1 << 6;
        const OP_MODE0    = 1 << 5;
        /// Bit 4: 1 = comparator mode, 0 = interrupt mode.
        const COMPARATOR  = 1 << 4;
        /// Bit 3: INT polarity (0 = active low).
        const INT_POLARITY = 1 << 3;
        /// Bit 2: CT polarity (0 = active low).
        const CT_POLARITY = 1 << 2;
        const FAULT_QUEUE1 = 1 << 1;
        const FAULT_QUEUE0 = 1 << 0;
    }

    /// STATUS register bits (0x02). Bits 3-0 are reserved.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct StatusBits: u8 {
        /// Bit 7: conversion result not yet available (active low ready).
        const NOT_READY = 1 << 7;
        const T_CRIT    = 1 << 6;
        const T_HIGH    = 1 << 5;
        const T_LOW     = 1 << 4;
    }
}

/// Value written by `init`: comparator mode, everything else at reset.
pub const CONFIG_INIT: ConfigBits = ConfigBits::COMPARATOR;

pub const OP_MODE_MASK: ConfigBits = ConfigBits::OP_MODE1.union(ConfigBits::OP_MODE0);
pub const FAULT_QUEUE_MASK: ConfigBits = ConfigBits::FAULT_QUEUE1.union(ConfigBits::FAULT_QUEUE0);

/// Decode a big-endian two's-complement register word into °C.
pub fn decode16(msb: u8, lsb: u8, scale: f32) -> f32 {
    f32::from(i16::from_be_bytes([msb, lsb])) / scale
}

/// Encode °C into a big-endian register word.
///
/// The scaled value is truncated toward zero and only its low 16 bits are kept, so
/// anything outside `i16::MIN / scale ..= i16::MAX / scale` wraps around
/// (e.g. 300 °C at 16-bit resolution becomes raw `0x9600`, i.e. -212 °C).
pub fn encode16(value: f32, scale: f32) -> (u8, u8) {
    let raw = (value * scale) as i32 as i16;
    let [msb, lsb] = raw.to_be_bytes();
    (msb, lsb)
}

/// Threshold setpoint in whole degrees to register bytes. Wraps like [`encode16`].
pub fn encode_degrees(degrees: i16, resolution: Resolution) -> [u8; 2] {
    let (msb, lsb) = encode16(f32::from(degrees), resolution.scale());
    [msb, lsb]
}

/// Register bytes to a setpoint, truncated toward zero to whole degrees.
pub fn decode_degrees(bytes: [u8; 2], resolution: Resolution) -> i16 {
    decode16(bytes[0], bytes[1], resolution.scale()) as i16
}

/// Apply/clear the resolution bit on a CONFIG value.
pub fn config_with_resolution(config: ConfigBits, resolution: Resolution) -> ConfigBits {
    let mut config = config;
    config.set(ConfigBits::RESOLUTION, matches!(resolution, Resolution::High));
    config
}

pub fn operation_mode_bits(mode: OperationMode) -> ConfigBits {
    match mode {
        OperationMode::Continuous => ConfigBits::empty(),
        OperationMode::OneShot => ConfigBits::OP_MODE0,
        OperationMode::OneSps => ConfigBits::OP_MODE1,
        OperationMode::Shutdown => ConfigBits::OP_MODE1 | ConfigBits::OP_MODE0,
    }
}

pub fn fault_queue_bits(queue: FaultQueue) -> ConfigBits {
    match queue {
        FaultQueue::One => ConfigBits::empty(),
        FaultQueue::Two => ConfigBits::FAULT_QUEUE0,
        FaultQueue::Three => ConfigBits::FAULT_QUEUE1,
        FaultQueue::Four => ConfigBits::FAULT_QUEUE1 | ConfigBits::FAULT_QUEUE0,
    }
}

/// Whether an ID register value carries the ADT7410 manufacturer code.
pub fn is_manufacturer_id(id: u8) -> bool {
    id >> MANUFACTURER_ID_SHIFT == MANUFACTURER_ID
}
