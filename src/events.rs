//! Threshold event dispatch.
//!
//! One channel per [`Limit`], each a fixed-size registry of plain function handlers
//! called in registration order. Handlers never run directly: every notification is
//! handed to an [`OwnerContext`] first, so a host can marshal callbacks onto the
//! thread or executor that owns the application state.

use crate::data_types::{DeviceAddress, Limit, LimitState};
use crate::error::Error;

/// Handler slots per channel.
pub const MAX_HANDLERS: usize = 4;

/// Notification payload.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ThresholdEvent {
    /// Address of the sensor that observed the transition.
    pub source: DeviceAddress,
    pub limit: Limit,
    pub state: LimitState,
}

pub type Handler = fn(&ThresholdEvent);

/// Token returned by `subscribe`, needed to unsubscribe.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct HandlerId {
    limit: Limit,
    serial: u16,
}

impl HandlerId {
    pub fn limit(&self) -> Limit {
        self.limit
    }
}

/// Runs notification jobs on the context that owns the registered handlers.
///
/// `run` must execute `job` exactly once before returning.
pub trait OwnerContext {
    fn run(&mut self, job: &mut dyn FnMut());
}

/// Calls handlers immediately on the caller's context.
#[derive(Clone, Copy, Debug, Default)]
pub struct Inline;

impl OwnerContext for Inline {
    fn run(&mut self, job: &mut dyn FnMut()) {
        job()
    }
}

#[derive(Clone, Copy)]
struct Channel {
    slots: [Option<(u16, Handler)>; MAX_HANDLERS],
    len: usize,
}

impl Channel {
    const fn new() -> Self {
        Self {
            slots: [None; MAX_HANDLERS],
            len: 0,
        }
    }

    fn push(&mut self, serial: u16, handler: Handler) -> bool {
        if self.len == MAX_HANDLERS {
            return false;
        }
        self.slots[self.len] = Some((serial, handler));
        self.len += 1;
        true
    }

    fn remove(&mut self, serial: u16) -> bool {
        let Some(pos) = self.slots[..self.len]
            .iter()
            .position(|slot| matches!(slot, Some((s, _)) if *s == serial))
        else {
            return false;
        };
        // Shift the tail down so registration order survives removal.
        self.slots[pos..self.len].rotate_left(1);
        self.len -= 1;
        self.slots[self.len] = None;
        true
    }

    fn holds(&self, serial: u16) -> bool {
        self.slots[..self.len].iter().flatten().any(|(s, _)| *s == serial)
    }

    fn notify(&self, event: &ThresholdEvent) {
        for (_, handler) in self.slots[..self.len].iter().flatten() {
            handler(event);
        }
    }
}

/// Per-limit channels plus the last-known [`LimitState`] of each limit.
pub struct Dispatcher<CX = Inline> {
    context: CX,
    channels: [Channel; 3],
    states: [LimitState; 3],
    next_serial: u16,
}

impl Default for Dispatcher<Inline> {
    fn default() -> Self {
        Self::new(Inline)
    }
}

impl<CX> Dispatcher<CX> {
    /// All limits start out as [`LimitState::FallenBelow`], the power-on state of INT/CT.
    pub const fn new(context: CX) -> Self {
        Self {
            context,
            channels: [Channel::new(); 3],
            states: [LimitState::FallenBelow; 3],
            next_serial: 0,
        }
    }

    pub fn context(&self) -> &CX {
        &self.context
    }

    pub fn state(&self, limit: Limit) -> LimitState {
        self.states[limit.index()]
    }

    pub fn handler_count(&self, limit: Limit) -> usize {
        self.channels[limit.index()].len
    }

    /// Register `handler` on `limit`. Serials wrap, but never onto a live
    /// registration, so two live handlers never share a [`HandlerId`].
    pub fn subscribe<E>(&mut self, limit: Limit, handler: Handler) -> Result<HandlerId, Error<E>> {
        // At most 3 * MAX_HANDLERS serials are live, so this terminates quickly.
        while self.channels.iter().any(|channel| channel.holds(self.next_serial)) {
            self.next_serial = self.next_serial.wrapping_add(1);
        }
        let serial = self.next_serial;
        if !self.channels[limit.index()].push(serial, handler) {
            return Err(Error::SubscriberLimit);
        }
        self.next_serial = self.next_serial.wrapping_add(1);
        Ok(HandlerId { limit, serial })
    }

    pub fn unsubscribe<E>(&mut self, id: HandlerId) -> Result<(), Error<E>> {
        if self.channels[id.limit.index()].remove(id.serial) {
            Ok(())
        } else {
            Err(Error::UnknownHandler)
        }
    }
}

impl<CX: OwnerContext> Dispatcher<CX> {
    /// Report an edge-detected transition. Always notifies; the edge itself is the
    /// transition, so there is nothing to compare against.
    pub fn edge(&mut self, source: DeviceAddress, limit: Limit, state: LimitState) {
        self.states[limit.index()] = state;
        self.notify(ThresholdEvent { source, limit, state });
    }

    /// Report a polled sample. Notifies only when it differs from the stored state,
    /// then stores it. Returns the new state on a transition.
    pub fn poll(&mut self, source: DeviceAddress, limit: Limit, sampled: LimitState) -> Option<LimitState> {
        if self.states[limit.index()] == sampled {
            return None;
        }
        self.notify(ThresholdEvent {
            source,
            limit,
            state: sampled,
        });
        self.states[limit.index()] = sampled;
        Some(sampled)
    }

    fn notify(&mut self, event: ThresholdEvent) {
        debug!("{} {} on {}", event.limit, event.state, event.source);
        let channel = &self.channels[event.limit.index()];
        if channel.len == 0 {
            return;
        }
        self.context.run(&mut || channel.notify(&event));
    }
}
