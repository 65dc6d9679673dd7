//! Stateless I2C transaction helpers.
//!
//! Each function is one bus operation: no retries, no buffering between calls.
//! Retry policy, if any, belongs to the caller.

use embedded_hal::i2c::I2c;

use crate::error::Error;

/// Largest payload `write` accepts after the register byte.
pub const MAX_WRITE_PAYLOAD: usize = 8;

/// Frame `[register, payload...]` into `buf`, returning the used length.
fn frame(buf: &mut [u8; MAX_WRITE_PAYLOAD + 1], register: u8, payload: &[u8]) -> Option<usize> {
    if payload.len() > MAX_WRITE_PAYLOAD {
        return None;
    }
    buf[0] = register;
    buf[1..=payload.len()].copy_from_slice(payload);
    Some(payload.len() + 1)
}

/// Write `payload` starting at `register` as a single atomic write.
pub fn write<I2C: I2c>(
    i2c: &mut I2C,
    address: u8,
    register: u8,
    payload: &[u8],
) -> Result<(), Error<I2C::Error>> {
    let mut buf = [0u8; MAX_WRITE_PAYLOAD + 1];
    let len = frame(&mut buf, register, payload).ok_or(Error::<I2C::Error>::InvalidConfig)?;
    trace!("i2c {=u8:#x} write reg {=u8:#x} {=[u8]:#x}", address, register, payload);
    i2c.write(address, &buf[..len]).map_err(|e| {
        warn!("i2c {=u8:#x} write reg {=u8:#x} failed", address, register);
        Error::I2c(e)
    })
}

/// Write a bare command byte with no payload.
pub fn write_command<I2C: I2c>(i2c: &mut I2C, address: u8, command: u8) -> Result<(), Error<I2C::Error>> {
    trace!("i2c {=u8:#x} command {=u8:#x}", address, command);
    i2c.write(address, &[command]).map_err(|e| {
        warn!("i2c {=u8:#x} command {=u8:#x} failed", address, command);
        Error::I2c(e)
    })
}

/// Point at `register` and read `buf.len()` bytes in one repeated-start transaction.
pub fn read<I2C: I2c>(
    i2c: &mut I2C,
    address: u8,
    register: u8,
    buf: &mut [u8],
) -> Result<(), Error<I2C::Error>> {
    i2c.write_read(address, &[register], buf).map_err(|e| {
        warn!("i2c {=u8:#x} read reg {=u8:#x} failed", address, register);
        Error::I2c(e)
    })?;
    trace!("i2c {=u8:#x} read reg {=u8:#x} {=[u8]:#x}", address, register, &buf[..]);
    Ok(())
}

/// Read without an address phase; the device must already point at the right register.
pub fn read_bare<I2C: I2c>(i2c: &mut I2C, address: u8, buf: &mut [u8]) -> Result<(), Error<I2C::Error>> {
    i2c.read(address, buf).map_err(|e| {
        warn!("i2c {=u8:#x} bare read failed", address);
        Error::I2c(e)
    })?;
    trace!("i2c {=u8:#x} bare read {=[u8]:#x}", address, &buf[..]);
    Ok(())
}

/// Async mirrors of the blocking helpers.
#[cfg(feature = "async")]
pub mod asynch {
    use embedded_hal_async::i2c::I2c;

    use super::{MAX_WRITE_PAYLOAD, frame};
    use crate::error::Error;

    pub async fn write<I2C: I2c>(
        i2c: &mut I2C,
        address: u8,
        register: u8,
        payload: &[u8],
    ) -> Result<(), Error<I2C::Error>> {
        let mut buf = [0u8; MAX_WRITE_PAYLOAD + 1];
        let len = frame(&mut buf, register, payload).ok_or(Error::<I2C::Error>::InvalidConfig)?;
        trace!("i2c {=u8:#x} write reg {=u8:#x} {=[u8]:#x}", address, register, payload);
        i2c.write(address, &buf[..len]).await.map_err(|e| {
            warn!("i2c {=u8:#x} write reg {=u8:#x} failed", address, register);
            Error::I2c(e)
        })
    }

    pub async fn write_command<I2C: I2c>(
        i2c: &mut I2C,
        address: u8,
        command: u8,
    ) -> Result<(), Error<I2C::Error>> {
        trace!("i2c {=u8:#x} command {=u8:#x}", address, command);
        i2c.write(address, &[command]).await.map_err(|e| {
            warn!("i2c {=u8:#x} command {=u8:#x} failed", address, command);
            Error::I2c(e)
        })
    }

    pub async fn read<I2C: I2c>(
        i2c: &mut I2C,
        address: u8,
        register: u8,
        buf: &mut [u8],
    ) -> Result<(), Error<I2C::Error>> {
        i2c.write_read(address, &[register], buf).await.map_err(|e| {
            warn!("i2c {=u8:#x} read reg {=u8:#x} failed", address, register);
            Error::I2c(e)
        })?;
        trace!("i2c {=u8:#x} read reg {=u8:#x} {=[u8]:#x}", address, register, &buf[..]);
        Ok(())
    }

    pub async fn read_bare<I2C: I2c>(i2c: &mut I2C, address: u8, buf: &mut [u8]) -> Result<(), Error<I2C::Error>> {
        i2c.read(address, buf).await.map_err(|e| {
            warn!("i2c {=u8:#x} bare read failed", address);
            Error::I2c(e)
        })?;
        trace!("i2c {=u8:#x} bare read {=[u8]:#x}", address, &buf[..]);
        Ok(())
    }
}
