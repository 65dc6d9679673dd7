#![cfg(feature = "async")]

use std::cell::RefCell;

use adt7410_rs::data_types::{DriverState, Limit, LimitState, Resolution};
use adt7410_rs::driver::Adt7410;
use adt7410_rs::ThresholdEvent;
use embedded_hal_mock::eh1::digital::{Edge, Mock as PinMock, State, Transaction as PinTrans};
use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTrans};

thread_local! {
    static EVENTS: RefCell<Vec<ThresholdEvent>> = const { RefCell::new(Vec::new()) };
}

fn record(event: &ThresholdEvent) {
    EVENTS.with(|events| events.borrow_mut().push(*event));
}

fn take_events() -> Vec<ThresholdEvent> {
    EVENTS.with(|events| events.take())
}

fn init_sequence(mut rest: Vec<I2cTrans>) -> Vec<I2cTrans> {
    let mut all = vec![
        I2cTrans::write(0x48, vec![0x03, 0x10]),
        I2cTrans::write_read(0x48, vec![0x03], vec![0x90]),
        I2cTrans::write(0x48, vec![0x03, 0x10]),
    ];
    all.append(&mut rest);
    all
}

fn finish(driver: Adt7410<I2cMock, PinMock>) {
    let (mut i2c, mut ct) = driver.free();
    i2c.done();
    ct.done();
}

#[tokio::test]
async fn init_async_selects_comparator_mode() {
    let mut driver = Adt7410::new(I2cMock::new(&init_sequence(vec![])), PinMock::new(&[]));
    assert_eq!(driver.state(), DriverState::Addressed);
    driver.init_async().await.unwrap();
    assert_eq!(driver.state(), DriverState::Ready);
    assert_eq!(driver.resolution(), Resolution::Default);
    finish(driver);
}

#[tokio::test]
async fn over_setpoint_roundtrip_async() {
    let expectations = init_sequence(vec![
        I2cTrans::write(0x48, vec![0x04, 0x02, 0x00]),
        I2cTrans::write_read(0x48, vec![0x04], vec![0x02, 0x00]),
    ]);
    let mut driver = Adt7410::new(I2cMock::new(&expectations), PinMock::new(&[]));
    driver.init_async().await.unwrap();
    driver.set_over_temperature_async(32).await.unwrap();
    assert_eq!(driver.over_temperature_async().await.unwrap(), 32);
    finish(driver);
}

#[tokio::test]
async fn wait_int_edge_dispatches_the_sampled_level() {
    let expectations = init_sequence(vec![I2cTrans::write_read(0x48, vec![0x02], vec![0x20])]);
    let mut driver = Adt7410::new(I2cMock::new(&expectations), PinMock::new(&[]));
    driver.init_async().await.unwrap();
    driver.subscribe(Limit::Over, record).unwrap();

    let mut int = PinMock::new(&[
        PinTrans::wait_for_edge(Edge::Any),
        PinTrans::get(State::Low),
        // glitch: the level after the edge is still low
        PinTrans::wait_for_edge(Edge::Any),
        PinTrans::get(State::Low),
        PinTrans::wait_for_edge(Edge::Any),
        PinTrans::get(State::High),
    ]);
    assert_eq!(driver.wait_int_edge(&mut int).await.unwrap(), Some(LimitState::Exceeded));
    assert_eq!(driver.wait_int_edge(&mut int).await.unwrap(), None);
    assert_eq!(driver.wait_int_edge(&mut int).await.unwrap(), Some(LimitState::FallenBelow));

    let states: Vec<_> = take_events().iter().map(|e| (e.limit, e.state)).collect();
    assert_eq!(
        states,
        vec![(Limit::Over, LimitState::Exceeded), (Limit::Over, LimitState::FallenBelow)]
    );
    int.done();
    finish(driver);
}
