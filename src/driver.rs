//! ADT7410 driver.
//!
//! Blocking API over `embedded_hal::i2c::I2c`; the `async` feature adds `_async`
//! mirrors over `embedded_hal_async::i2c::I2c`.
//!
//! The driver runs the two alarm paths of the device in comparator mode:
//!
//! * INT (over/under): the host forwards every edge to [`Adt7410::on_int_edge`]. The
//!   level after the edge is the transition; a level equal to the previous one (a
//!   glitch too short to sample) is dropped.
//! * CT (critical): the host calls [`Adt7410::tick`] every
//!   [`CRITICAL_POLL_PERIOD_MS`](crate::config::CRITICAL_POLL_PERIOD_MS); the pin is
//!   sampled and compared against the last known state.
//!
//! Both entry points, and every register accessor, take `&mut self`. Edge callbacks
//! and ticks must be serialized onto one context by the host before they get here.

use embedded_hal::digital::{Error as _, ErrorKind as PinErrorKind, InputPin, PinState};
use embedded_hal::i2c::{ErrorType, I2c};

use crate::bus;
use crate::config::BusConfig;
use crate::data_types::{DeviceAddress, DriverState, FaultQueue, Limit, LimitState, OperationMode, Resolution};
use crate::error::Error;
use crate::events::{Dispatcher, Handler, HandlerId, Inline, OwnerContext};
use crate::registers::{
    addr, config_with_resolution, decode16, decode_degrees, encode_degrees, fault_queue_bits, is_manufacturer_id,
    operation_mode_bits, ConfigBits, StatusBits, CONFIG_INIT, FAULT_QUEUE_MASK, HYSTERESIS_MASK, HYSTERESIS_MAX,
    OP_MODE_MASK,
};

/// ADT7410 driver. `CT` is the critical-temperature pin, `CX` the context
/// handlers are invoked on.
pub struct Adt7410<I2C, CT, CX = Inline> {
    i2c: I2C,
    ct: CT,
    address: DeviceAddress,
    resolution: Resolution,
    state: DriverState,
    bus_config: BusConfig,
    dispatcher: Dispatcher<CX>,
    /// Limit the INT pin was last attributed to; the release edge reports on it.
    int_limit: Limit,
    /// INT level after the last dispatched edge, `None` until the first one.
    int_level: Option<PinState>,
}

impl<I2C, CT> Adt7410<I2C, CT, Inline> {
    /// Create a driver at the default address (0x48). Call `init` before use.
    pub fn new(i2c: I2C, ct: CT) -> Self {
        Self::with_context(i2c, ct, DeviceAddress::default(), Inline)
    }

    /// Create a driver at one of the strap-selected addresses.
    pub fn with_address(i2c: I2C, ct: CT, address: DeviceAddress) -> Self {
        Self::with_context(i2c, ct, address, Inline)
    }
}

impl<I2C, CT, CX> Adt7410<I2C, CT, CX> {
    /// Create a driver whose handlers are marshalled through `context`.
    pub fn with_context(i2c: I2C, ct: CT, address: DeviceAddress, context: CX) -> Self {
        Self {
            i2c,
            ct,
            address,
            resolution: Resolution::Default,
            state: DriverState::Addressed,
            bus_config: BusConfig::default(),
            dispatcher: Dispatcher::new(context),
            int_limit: Limit::Over,
            int_level: None,
        }
    }

    /// Record the bus settings the host applied to its I2C peripheral.
    pub fn with_bus_config(mut self, bus_config: BusConfig) -> Self {
        self.bus_config = bus_config;
        self
    }

    pub fn bus_config(&self) -> BusConfig {
        self.bus_config
    }

    pub fn address(&self) -> DeviceAddress {
        self.address
    }

    /// Locally tracked resolution; changed only by `set_resolution` / `init` / reset.
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Last state reported for `limit`. Never read back from the device.
    pub fn limit_state(&self, limit: Limit) -> LimitState {
        self.dispatcher.state(limit)
    }

    /// Give back the bus and the CT pin.
    pub fn free(self) -> (I2C, CT) {
        (self.i2c, self.ct)
    }
}

impl<I2C: ErrorType, CT, CX> Adt7410<I2C, CT, CX> {
    /// Register `handler` for transitions of `limit`. Handlers run in registration order.
    pub fn subscribe(&mut self, limit: Limit, handler: Handler) -> Result<HandlerId, Error<I2C::Error>> {
        self.dispatcher.subscribe(limit, handler)
    }

    pub fn unsubscribe(&mut self, id: HandlerId) -> Result<(), Error<I2C::Error>> {
        self.dispatcher.unsubscribe(id)
    }

    fn ensure_ready(&self) -> Result<(), Error<I2C::Error>> {
        match self.state {
            DriverState::Ready => Ok(()),
            DriverState::Addressed => Err(Error::NotReady),
        }
    }
}

impl<I2C, CT, CX> Adt7410<I2C, CT, CX>
where
    I2C: ErrorType,
    CX: OwnerContext,
{
    fn dispatch_int(&mut self, level: PinState, limit: Limit, state: LimitState) {
        self.int_level = Some(level);
        self.int_limit = limit;
        self.dispatcher.edge(self.address, limit, state);
    }

    fn after_reset(&mut self) {
        self.resolution = Resolution::Default;
        self.state = DriverState::Addressed;
    }
}

impl<I2C, CT, CX> Adt7410<I2C, CT, CX>
where
    I2C: I2c,
    CX: OwnerContext,
{
    /// Select comparator mode and 13-bit resolution, then mark the driver ready.
    pub fn init(&mut self) -> Result<(), Error<I2C::Error>> {
        self.write_reg(addr::CONFIG, CONFIG_INIT.bits())?;
        self.apply_resolution(Resolution::Default)?;
        self.state = DriverState::Ready;
        debug!("adt7410 {} ready", self.address);
        Ok(())
    }

    /// Write a single register.
    pub fn write_reg(&mut self, reg: u8, value: u8) -> Result<(), Error<I2C::Error>> {
        bus::write(&mut self.i2c, self.address.into(), reg, &[value])
    }

    /// Read a single register.
    pub fn read_reg(&mut self, reg: u8) -> Result<u8, Error<I2C::Error>> {
        let mut buf = [0u8; 1];
        bus::read(&mut self.i2c, self.address.into(), reg, &mut buf)?;
        Ok(buf[0])
    }

    /// Update masked bits in a register (read-modify-write).
    pub fn update_reg(&mut self, reg: u8, mask: u8, value: u8) -> Result<(), Error<I2C::Error>> {
        let cur = self.read_reg(reg)?;
        let new = (cur & !mask) | (value & mask);
        self.write_reg(reg, new)
    }

    /// Write a burst starting at a register.
    pub fn write_regs(&mut self, start_reg: u8, data: &[u8]) -> Result<(), Error<I2C::Error>> {
        bus::write(&mut self.i2c, self.address.into(), start_reg, data)
    }

    /// Read a burst starting at a register.
    pub fn read_regs(&mut self, start_reg: u8, data: &mut [u8]) -> Result<(), Error<I2C::Error>> {
        bus::read(&mut self.i2c, self.address.into(), start_reg, data)
    }

    /// Read from wherever the device's address pointer currently is.
    pub fn read_current(&mut self, data: &mut [u8]) -> Result<(), Error<I2C::Error>> {
        bus::read_bare(&mut self.i2c, self.address.into(), data)
    }

    /// Current temperature in °C. Every call performs a fresh bus read.
    pub fn temperature(&mut self) -> Result<f32, Error<I2C::Error>> {
        self.ensure_ready()?;
        let mut buf = [0u8; 2];
        self.read_regs(addr::TEMP_MSB, &mut buf)?;
        Ok(decode16(buf[0], buf[1], self.resolution.scale()))
    }

    pub fn over_temperature(&mut self) -> Result<i16, Error<I2C::Error>> {
        self.read_setpoint(addr::T_HIGH_MSB)
    }

    /// Values beyond the register range at the current resolution wrap, see
    /// [`encode16`](crate::registers::encode16).
    pub fn set_over_temperature(&mut self, degrees: i16) -> Result<(), Error<I2C::Error>> {
        self.write_setpoint(addr::T_HIGH_MSB, degrees)
    }

    pub fn under_temperature(&mut self) -> Result<i16, Error<I2C::Error>> {
        self.read_setpoint(addr::T_LOW_MSB)
    }

    pub fn set_under_temperature(&mut self, degrees: i16) -> Result<(), Error<I2C::Error>> {
        self.write_setpoint(addr::T_LOW_MSB, degrees)
    }

    pub fn critical_temperature(&mut self) -> Result<i16, Error<I2C::Error>> {
        self.read_setpoint(addr::T_CRIT_MSB)
    }

    pub fn set_critical_temperature(&mut self, degrees: i16) -> Result<(), Error<I2C::Error>> {
        self.write_setpoint(addr::T_CRIT_MSB, degrees)
    }

    /// Hysteresis in whole degrees (0..=15).
    pub fn hysteresis(&mut self) -> Result<u8, Error<I2C::Error>> {
        self.ensure_ready()?;
        Ok(self.read_reg(addr::T_HYST)? & HYSTERESIS_MASK)
    }

    /// Rejects values above 15 before touching the bus.
    pub fn set_hysteresis(&mut self, degrees: u8) -> Result<(), Error<I2C::Error>> {
        self.ensure_ready()?;
        if degrees > HYSTERESIS_MAX {
            return Err(Error::OutOfRange);
        }
        self.write_reg(addr::T_HYST, degrees)
    }

    /// Reprogram the resolution bit (read-modify-write of CONFIG).
    ///
    /// Subsequent conversions use the new scale immediately. A value the device
    /// latched before the change is decoded with the new scale too, so callers must
    /// serialize resolution changes with pending reads.
    pub fn set_resolution(&mut self, resolution: Resolution) -> Result<(), Error<I2C::Error>> {
        self.ensure_ready()?;
        self.apply_resolution(resolution)
    }

    /// Issue the software reset command. No confirmation read; the device returns to
    /// power-on defaults (13-bit, interrupt mode) and the driver drops back to
    /// [`DriverState::Addressed`] until `init` restores comparator mode.
    pub fn reset_register_values(&mut self) -> Result<(), Error<I2C::Error>> {
        self.ensure_ready()?;
        bus::write_command(&mut self.i2c, self.address.into(), addr::RESET)?;
        self.after_reset();
        Ok(())
    }

    /// Read the STATUS register.
    pub fn status(&mut self) -> Result<StatusBits, Error<I2C::Error>> {
        let val = self.read_reg(addr::STATUS)?;
        Ok(StatusBits::from_bits_truncate(val))
    }

    /// Raw ID register (manufacturer code in bits 7:3, silicon revision in 2:0).
    pub fn device_id(&mut self) -> Result<u8, Error<I2C::Error>> {
        self.read_reg(addr::ID)
    }

    /// Check the manufacturer code; a foreign device yields `InvalidConfig`.
    pub fn verify_id(&mut self) -> Result<u8, Error<I2C::Error>> {
        let id = self.device_id()?;
        if !is_manufacturer_id(id) {
            warn!("unexpected ID {=u8:#x}", id);
            return Err(Error::InvalidConfig);
        }
        Ok(id)
    }

    pub fn set_operation_mode(&mut self, mode: OperationMode) -> Result<(), Error<I2C::Error>> {
        self.ensure_ready()?;
        self.update_reg(addr::CONFIG, OP_MODE_MASK.bits(), operation_mode_bits(mode).bits())
    }

    pub fn set_fault_queue(&mut self, queue: FaultQueue) -> Result<(), Error<I2C::Error>> {
        self.ensure_ready()?;
        self.update_reg(addr::CONFIG, FAULT_QUEUE_MASK.bits(), fault_queue_bits(queue).bits())
    }

    /// Handle a rising or falling edge of the INT pin; `level` is the pin level after it.
    ///
    /// An active (low) level is attributed to the under- or over-temperature limit
    /// from the STATUS register; the following release reports on the same limit. If
    /// the STATUS read fails nothing is dispatched and no state changes. A level equal
    /// to the last dispatched one returns `None` without touching the bus.
    ///
    /// The INT level only means over/under in comparator mode, i.e. while the driver
    /// is [`DriverState::Ready`]; after a reset call `init` before forwarding edges.
    pub fn on_int_edge(&mut self, level: PinState) -> Result<Option<LimitState>, Error<I2C::Error>> {
        if self.int_level == Some(level) {
            return Ok(None);
        }
        let state = LimitState::from_active_low(level);
        let limit = match state {
            LimitState::Exceeded => attribute_int(self.status()?),
            LimitState::FallenBelow => self.int_limit,
        };
        self.dispatch_int(level, limit, state);
        Ok(Some(state))
    }

    fn apply_resolution(&mut self, resolution: Resolution) -> Result<(), Error<I2C::Error>> {
        let config = ConfigBits::from_bits_retain(self.read_reg(addr::CONFIG)?);
        self.write_reg(addr::CONFIG, config_with_resolution(config, resolution).bits())?;
        self.resolution = resolution;
        debug!("resolution set to {}", resolution);
        Ok(())
    }

    fn read_setpoint(&mut self, reg: u8) -> Result<i16, Error<I2C::Error>> {
        self.ensure_ready()?;
        let mut buf = [0u8; 2];
        self.read_regs(reg, &mut buf)?;
        Ok(decode_degrees(buf, self.resolution))
    }

    fn write_setpoint(&mut self, reg: u8, degrees: i16) -> Result<(), Error<I2C::Error>> {
        self.ensure_ready()?;
        self.write_regs(reg, &encode_degrees(degrees, self.resolution))
    }
}

impl<I2C, CT, CX> Adt7410<I2C, CT, CX>
where
    I2C: ErrorType,
    CT: InputPin,
    CX: OwnerContext,
{
    /// Sample the CT pin and report a critical transition if its level changed since
    /// the last tick. Never touches the bus, so it keeps working across I2C failures.
    pub fn tick(&mut self) -> Result<Option<LimitState>, Error<I2C::Error>> {
        let level = sample(&mut self.ct).map_err(Error::<I2C::Error>::Pin)?;
        Ok(self.dispatcher.poll(self.address, Limit::Critical, LimitState::from_active_low(level)))
    }
}

fn sample<P: InputPin>(pin: &mut P) -> Result<PinState, PinErrorKind> {
    match pin.is_low() {
        Ok(true) => Ok(PinState::Low),
        Ok(false) => Ok(PinState::High),
        Err(e) => Err(e.kind()),
    }
}

/// T_LOW set means the INT assertion came from the under-temperature limit.
fn attribute_int(status: StatusBits) -> Limit {
    if status.contains(StatusBits::T_LOW) {
        Limit::Under
    } else {
        Limit::Over
    }
}

#[cfg(feature = "async")]
impl<I2C, CT, CX> Adt7410<I2C, CT, CX>
where
    I2C: embedded_hal_async::i2c::I2c,
    CX: OwnerContext,
{
    /// Async version of [`init`](Self::init).
    pub async fn init_async(&mut self) -> Result<(), Error<I2C::Error>> {
        self.write_reg_async(addr::CONFIG, CONFIG_INIT.bits()).await?;
        self.apply_resolution_async(Resolution::Default).await?;
        self.state = DriverState::Ready;
        debug!("adt7410 {} ready", self.address);
        Ok(())
    }

    pub async fn write_reg_async(&mut self, reg: u8, value: u8) -> Result<(), Error<I2C::Error>> {
        bus::asynch::write(&mut self.i2c, self.address.into(), reg, &[value]).await
    }

    pub async fn read_reg_async(&mut self, reg: u8) -> Result<u8, Error<I2C::Error>> {
        let mut buf = [0u8; 1];
        bus::asynch::read(&mut self.i2c, self.address.into(), reg, &mut buf).await?;
        Ok(buf[0])
    }

    pub async fn update_reg_async(&mut self, reg: u8, mask: u8, value: u8) -> Result<(), Error<I2C::Error>> {
        let cur = self.read_reg_async(reg).await?;
        let new = (cur & !mask) | (value & mask);
        self.write_reg_async(reg, new).await
    }

    pub async fn write_regs_async(&mut self, start_reg: u8, data: &[u8]) -> Result<(), Error<I2C::Error>> {
        bus::asynch::write(&mut self.i2c, self.address.into(), start_reg, data).await
    }

    pub async fn read_regs_async(&mut self, start_reg: u8, data: &mut [u8]) -> Result<(), Error<I2C::Error>> {
        bus::asynch::read(&mut self.i2c, self.address.into(), start_reg, data).await
    }

    pub async fn read_current_async(&mut self, data: &mut [u8]) -> Result<(), Error<I2C::Error>> {
        bus::asynch::read_bare(&mut self.i2c, self.address.into(), data).await
    }

    pub async fn temperature_async(&mut self) -> Result<f32, Error<I2C::Error>> {
        self.ensure_ready()?;
        let mut buf = [0u8; 2];
        self.read_regs_async(addr::TEMP_MSB, &mut buf).await?;
        Ok(decode16(buf[0], buf[1], self.resolution.scale()))
    }

    pub async fn over_temperature_async(&mut self) -> Result<i16, Error<I2C::Error>> {
        self.read_setpoint_async(addr::T_HIGH_MSB).await
    }

    pub async fn set_over_temperature_async(&mut self, degrees: i16) -> Result<(), Error<I2C::Error>> {
        self.write_setpoint_async(addr::T_HIGH_MSB, degrees).await
    }

    pub async fn under_temperature_async(&mut self) -> Result<i16, Error<I2C::Error>> {
        self.read_setpoint_async(addr::T_LOW_MSB).await
    }

    pub async fn set_under_temperature_async(&mut self, degrees: i16) -> Result<(), Error<I2C::Error>> {
        self.write_setpoint_async(addr::T_LOW_MSB, degrees).await
    }

    pub async fn critical_temperature_async(&mut self) -> Result<i16, Error<I2C::Error>> {
        self.read_setpoint_async(addr::T_CRIT_MSB).await
    }

    pub async fn set_critical_temperature_async(&mut self, degrees: i16) -> Result<(), Error<I2C::Error>> {
        self.write_setpoint_async(addr::T_CRIT_MSB, degrees).await
    }

    pub async fn hysteresis_async(&mut self) -> Result<u8, Error<I2C::Error>> {
        self.ensure_ready()?;
        Ok(self.read_reg_async(addr::T_HYST).await? & HYSTERESIS_MASK)
    }

    pub async fn set_hysteresis_async(&mut self, degrees: u8) -> Result<(), Error<I2C::Error>> {
        self.ensure_ready()?;
        if degrees > HYSTERESIS_MAX {
            return Err(Error::OutOfRange);
        }
        self.write_reg_async(addr::T_HYST, degrees).await
    }

    /// Async version of [`set_resolution`](Self::set_resolution); same caveats apply.
    pub async fn set_resolution_async(&mut self, resolution: Resolution) -> Result<(), Error<I2C::Error>> {
        self.ensure_ready()?;
        self.apply_resolution_async(resolution).await
    }

    pub async fn reset_register_values_async(&mut self) -> Result<(), Error<I2C::Error>> {
        self.ensure_ready()?;
        bus::asynch::write_command(&mut self.i2c, self.address.into(), addr::RESET).await?;
        self.after_reset();
        Ok(())
    }

    pub async fn status_async(&mut self) -> Result<StatusBits, Error<I2C::Error>> {
        let val = self.read_reg_async(addr::STATUS).await?;
        Ok(StatusBits::from_bits_truncate(val))
    }

    pub async fn device_id_async(&mut self) -> Result<u8, Error<I2C::Error>> {
        self.read_reg_async(addr::ID).await
    }

    pub async fn set_operation_mode_async(&mut self, mode: OperationMode) -> Result<(), Error<I2C::Error>> {
        self.ensure_ready()?;
        self.update_reg_async(addr::CONFIG, OP_MODE_MASK.bits(), operation_mode_bits(mode).bits())
            .await
    }

    pub async fn set_fault_queue_async(&mut self, queue: FaultQueue) -> Result<(), Error<I2C::Error>> {
        self.ensure_ready()?;
        self.update_reg_async(addr::CONFIG, FAULT_QUEUE_MASK.bits(), fault_queue_bits(queue).bits())
            .await
    }

    /// Async version of [`on_int_edge`](Self::on_int_edge).
    pub async fn on_int_edge_async(&mut self, level: PinState) -> Result<Option<LimitState>, Error<I2C::Error>> {
        if self.int_level == Some(level) {
            return Ok(None);
        }
        let state = LimitState::from_active_low(level);
        let limit = match state {
            LimitState::Exceeded => attribute_int(self.status_async().await?),
            LimitState::FallenBelow => self.int_limit,
        };
        self.dispatch_int(level, limit, state);
        Ok(Some(state))
    }

    /// Wait for the next edge on the INT pin and dispatch it. `None` when the level
    /// sampled after the edge matches the last dispatched one.
    pub async fn wait_int_edge<INT>(&mut self, int: &mut INT) -> Result<Option<LimitState>, Error<I2C::Error>>
    where
        INT: embedded_hal_async::digital::Wait + InputPin,
    {
        int.wait_for_any_edge()
            .await
            .map_err(|e| Error::<I2C::Error>::Pin(e.kind()))?;
        let level = sample(int).map_err(Error::<I2C::Error>::Pin)?;
        self.on_int_edge_async(level).await
    }

    async fn apply_resolution_async(&mut self, resolution: Resolution) -> Result<(), Error<I2C::Error>> {
        let config = ConfigBits::from_bits_retain(self.read_reg_async(addr::CONFIG).await?);
        self.write_reg_async(addr::CONFIG, config_with_resolution(config, resolution).bits())
            .await?;
        self.resolution = resolution;
        debug!("resolution set to {}", resolution);
        Ok(())
    }

    async fn read_setpoint_async(&mut self, reg: u8) -> Result<i16, Error<I2C::Error>> {
        self.ensure_ready()?;
        let mut buf = [0u8; 2];
        self.read_regs_async(reg, &mut buf).await?;
        Ok(decode_degrees(buf, self.resolution))
    }

    async fn write_setpoint_async(&mut self, reg: u8, degrees: i16) -> Result<(), Error<I2C::Error>> {
        self.ensure_ready()?;
        self.write_regs_async(reg, &encode_degrees(degrees, self.resolution)).await
    }
}
