//! ADT7410 Rust Driver
//!
//! Platform-agnostic driver for the Analog Devices ADT7410 I2C temperature sensor,
//! built on the `embedded-hal` 1.0 traits. `no_std`, optional async
//! (`async` feature) and `defmt` support (`defmt` feature).
//!
//! Besides temperature and setpoint access, the driver turns the comparator outputs
//! of the device into over/under/critical threshold events: INT edges are forwarded
//! by the host, the CT pin is polled from a periodic `tick`.

#![no_std]

#[macro_use]
mod fmt;

pub mod bus;
pub mod config;
pub mod data_types;
pub mod driver;
pub mod error;
pub mod events;
pub mod registers;

pub use config::BusConfig;
pub use data_types::{DeviceAddress, Limit, LimitState, Resolution};
pub use driver::Adt7410;
pub use error::Error;
pub use events::{HandlerId, Inline, OwnerContext, ThresholdEvent};
pub use registers::DEFAULT_I2C_ADDRESS;
