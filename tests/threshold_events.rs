use std::cell::RefCell;

use adt7410_rs::data_types::{DeviceAddress, Limit, LimitState};
use adt7410_rs::driver::Adt7410;
use adt7410_rs::events::{Dispatcher, MAX_HANDLERS};
use adt7410_rs::{Error, OwnerContext, ThresholdEvent};
use embedded_hal::digital::PinState;
use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction as PinTrans};
use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTrans};

thread_local! {
    static LOG: RefCell<Vec<(u8, ThresholdEvent)>> = const { RefCell::new(Vec::new()) };
}

fn first(event: &ThresholdEvent) {
    LOG.with(|log| log.borrow_mut().push((1, *event)));
}

fn second(event: &ThresholdEvent) {
    LOG.with(|log| log.borrow_mut().push((2, *event)));
}

fn third(event: &ThresholdEvent) {
    LOG.with(|log| log.borrow_mut().push((3, *event)));
}

fn take_log() -> Vec<(u8, ThresholdEvent)> {
    LOG.with(|log| log.take())
}

fn states(log: &[(u8, ThresholdEvent)]) -> Vec<(Limit, LimitState)> {
    log.iter().map(|(_, e)| (e.limit, e.state)).collect()
}

fn finish<CX>(driver: Adt7410<I2cMock, PinMock, CX>) {
    let (mut i2c, mut ct) = driver.free();
    i2c.done();
    ct.done();
}

#[test]
fn int_edges_dispatch_once_per_edge() {
    // STATUS T_HIGH set on the falling edge
    let expectations = [I2cTrans::write_read(0x48, vec![0x02], vec![0x20])];
    let mut driver = Adt7410::new(I2cMock::new(&expectations), PinMock::new(&[]));
    driver.subscribe(Limit::Over, first).unwrap();
    driver.subscribe(Limit::Under, second).unwrap();

    assert_eq!(driver.on_int_edge(PinState::Low).unwrap(), Some(LimitState::Exceeded));
    assert_eq!(states(&take_log()), vec![(Limit::Over, LimitState::Exceeded)]);
    assert_eq!(driver.limit_state(Limit::Over), LimitState::Exceeded);

    assert_eq!(driver.on_int_edge(PinState::High).unwrap(), Some(LimitState::FallenBelow));
    assert_eq!(states(&take_log()), vec![(Limit::Over, LimitState::FallenBelow)]);
    assert_eq!(driver.limit_state(Limit::Over), LimitState::FallenBelow);
    finish(driver);
}

#[test]
fn int_assertion_with_t_low_goes_to_under_channel() {
    let expectations = [I2cTrans::write_read(0x48, vec![0x02], vec![0x10])];
    let mut driver = Adt7410::new(I2cMock::new(&expectations), PinMock::new(&[]));
    driver.subscribe(Limit::Over, first).unwrap();
    driver.subscribe(Limit::Under, second).unwrap();

    driver.on_int_edge(PinState::Low).unwrap();
    driver.on_int_edge(PinState::High).unwrap();
    let log = take_log();
    assert_eq!(
        states(&log),
        vec![(Limit::Under, LimitState::Exceeded), (Limit::Under, LimitState::FallenBelow)]
    );
    assert!(log.iter().all(|(handler, _)| *handler == 2));
    finish(driver);
}

#[test]
fn first_int_edge_is_not_suppressed() {
    // a release edge right after construction still reports
    let mut driver = Adt7410::new(I2cMock::new(&[]), PinMock::new(&[]));
    driver.subscribe(Limit::Over, first).unwrap();
    driver.on_int_edge(PinState::High).unwrap();
    assert_eq!(states(&take_log()), vec![(Limit::Over, LimitState::FallenBelow)]);
    finish(driver);
}

#[test]
fn repeated_int_level_is_dropped() {
    // one STATUS read: the second low is dropped before any bus traffic
    let expectations = [I2cTrans::write_read(0x48, vec![0x02], vec![0x20])];
    let mut driver = Adt7410::new(I2cMock::new(&expectations), PinMock::new(&[]));
    driver.subscribe(Limit::Over, first).unwrap();

    assert_eq!(driver.on_int_edge(PinState::Low).unwrap(), Some(LimitState::Exceeded));
    assert_eq!(driver.on_int_edge(PinState::Low).unwrap(), None);
    assert_eq!(states(&take_log()), vec![(Limit::Over, LimitState::Exceeded)]);

    assert_eq!(driver.on_int_edge(PinState::High).unwrap(), Some(LimitState::FallenBelow));
    assert_eq!(driver.on_int_edge(PinState::High).unwrap(), None);
    assert_eq!(states(&take_log()), vec![(Limit::Over, LimitState::FallenBelow)]);
    finish(driver);
}

#[test]
fn steady_pins_raise_nothing() {
    let pin = [PinTrans::get(State::High), PinTrans::get(State::High), PinTrans::get(State::High)];
    let mut driver = Adt7410::new(I2cMock::new(&[]), PinMock::new(&pin));
    driver.subscribe(Limit::Over, first).unwrap();
    driver.subscribe(Limit::Under, first).unwrap();
    driver.subscribe(Limit::Critical, first).unwrap();
    for _ in 0..3 {
        assert_eq!(driver.tick().unwrap(), None);
    }
    assert!(take_log().is_empty());
    finish(driver);
}

#[test]
fn critical_poll_notifies_only_on_transitions() {
    let pin = [
        PinTrans::get(State::High),
        PinTrans::get(State::Low),
        PinTrans::get(State::Low),
        PinTrans::get(State::Low),
        PinTrans::get(State::High),
        PinTrans::get(State::High),
    ];
    let mut driver = Adt7410::new(I2cMock::new(&[]), PinMock::new(&pin));
    driver.subscribe(Limit::Critical, first).unwrap();

    let results: Vec<_> = (0..6).map(|_| driver.tick().unwrap()).collect();
    assert_eq!(
        results,
        vec![
            None,
            Some(LimitState::Exceeded),
            None,
            None,
            Some(LimitState::FallenBelow),
            None
        ]
    );
    assert_eq!(
        states(&take_log()),
        vec![
            (Limit::Critical, LimitState::Exceeded),
            (Limit::Critical, LimitState::FallenBelow)
        ]
    );
    finish(driver);
}

#[test]
fn handlers_run_in_registration_order() {
    let mut dispatcher = Dispatcher::default();
    dispatcher.subscribe::<()>(Limit::Critical, second).unwrap();
    dispatcher.subscribe::<()>(Limit::Critical, first).unwrap();
    dispatcher.subscribe::<()>(Limit::Critical, third).unwrap();

    dispatcher.edge(DeviceAddress::Addr0x49, Limit::Critical, LimitState::Exceeded);
    let log = take_log();
    let order: Vec<_> = log.iter().map(|(h, _)| *h).collect();
    assert_eq!(order, vec![2, 1, 3]);
    assert!(log.iter().all(|(_, e)| e.source == DeviceAddress::Addr0x49));
}

#[test]
fn unsubscribe_keeps_remaining_order() {
    let mut dispatcher = Dispatcher::default();
    dispatcher.subscribe::<()>(Limit::Over, first).unwrap();
    let middle = dispatcher.subscribe::<()>(Limit::Over, second).unwrap();
    dispatcher.subscribe::<()>(Limit::Over, third).unwrap();

    dispatcher.unsubscribe::<()>(middle).unwrap();
    assert!(matches!(dispatcher.unsubscribe::<()>(middle), Err(Error::UnknownHandler)));
    assert_eq!(dispatcher.handler_count(Limit::Over), 2);

    dispatcher.subscribe::<()>(Limit::Over, second).unwrap();
    dispatcher.edge(DeviceAddress::Addr0x48, Limit::Over, LimitState::Exceeded);
    let order: Vec<_> = take_log().iter().map(|(h, _)| *h).collect();
    assert_eq!(order, vec![1, 3, 2]);
}

#[test]
fn channel_capacity_is_bounded() {
    let mut dispatcher = Dispatcher::default();
    for _ in 0..MAX_HANDLERS {
        dispatcher.subscribe::<()>(Limit::Under, first).unwrap();
    }
    assert!(matches!(
        dispatcher.subscribe::<()>(Limit::Under, first),
        Err(Error::SubscriberLimit)
    ));
    // other channels are independent
    assert!(dispatcher.subscribe::<()>(Limit::Over, first).is_ok());
}

#[test]
fn wrapped_serial_skips_live_handlers() {
    let mut dispatcher = Dispatcher::default();
    let kept = dispatcher.subscribe::<()>(Limit::Over, first).unwrap();
    // walk the serial counter all the way round past `kept`
    for _ in 0..=u16::MAX {
        let id = dispatcher.subscribe::<()>(Limit::Over, second).unwrap();
        assert_ne!(id, kept);
        dispatcher.unsubscribe::<()>(id).unwrap();
    }
    assert_eq!(dispatcher.handler_count(Limit::Over), 1);

    dispatcher.edge(DeviceAddress::Addr0x48, Limit::Over, LimitState::Exceeded);
    let order: Vec<_> = take_log().iter().map(|(h, _)| *h).collect();
    assert_eq!(order, vec![1]);
    dispatcher.unsubscribe::<()>(kept).unwrap();
}

#[derive(Default)]
struct CountingContext {
    runs: usize,
}

impl OwnerContext for CountingContext {
    fn run(&mut self, job: &mut dyn FnMut()) {
        self.runs += 1;
        job();
    }
}

#[test]
fn handlers_are_invoked_through_the_owner_context() {
    let mut dispatcher = Dispatcher::new(CountingContext::default());
    dispatcher.subscribe::<()>(Limit::Critical, first).unwrap();
    dispatcher.subscribe::<()>(Limit::Critical, second).unwrap();

    assert_eq!(dispatcher.poll(DeviceAddress::Addr0x48, Limit::Critical, LimitState::Exceeded), Some(LimitState::Exceeded));
    assert_eq!(dispatcher.poll(DeviceAddress::Addr0x48, Limit::Critical, LimitState::Exceeded), None);
    // one context hop per notification, both handlers inside it
    assert_eq!(dispatcher.context().runs, 1);
    assert_eq!(take_log().len(), 2);
}

#[test]
fn driver_uses_injected_context() {
    let pin = [PinTrans::get(State::Low)];
    let mut driver = Adt7410::with_context(
        I2cMock::new(&[]),
        PinMock::new(&pin),
        DeviceAddress::Addr0x4A,
        CountingContext::default(),
    );
    driver.subscribe(Limit::Critical, first).unwrap();
    driver.tick().unwrap();
    let log = take_log();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].1.source, DeviceAddress::Addr0x4A);
    finish(driver);
}
