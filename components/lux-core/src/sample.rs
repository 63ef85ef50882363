//! Single-slot handoff between the sampling and the reporting loop.
//!
//! The token and the payload are one value, [`SampleState`], swapped inside a
//! blocking mutex. A reader therefore sees either `Waiting` or `Ready` with the
//! payload that was published together with it, never a torn pair.

use core::cell::Cell;

use embassy_sync::blocking_mutex::{Mutex, raw::RawMutex};

use crate::Lux;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SampleState {
    /// No unread measurement.
    Waiting,
    /// A measurement not yet taken by the reporter.
    Ready(Lux),
}

pub struct SampleSlot<M: RawMutex> {
    state: Mutex<M, Cell<SampleState>>,
}

impl<M: RawMutex> SampleSlot<M> {
    pub const fn new() -> Self {
        SampleSlot {
            state: Mutex::new(Cell::new(SampleState::Waiting)),
        }
    }

    /// Stores `Ready(lux)` and returns the unread value it replaced, if any.
    ///
    /// Callers that must not lose samples check [`is_waiting`](Self::is_waiting)
    /// first; with a single producer the slot cannot fill up in between.
    pub fn publish(&self, lux: Lux) -> Option<Lux> {
        self.state.lock(|state| match state.replace(SampleState::Ready(lux)) {
            SampleState::Ready(unread) => Some(unread),
            SampleState::Waiting => None,
        })
    }

    /// `Ready(lux) -> Waiting`, handing out the value exactly once.
    pub fn consume(&self) -> Option<Lux> {
        self.state.lock(|state| match state.replace(SampleState::Waiting) {
            SampleState::Ready(lux) => Some(lux),
            SampleState::Waiting => None,
        })
    }

    pub fn state(&self) -> SampleState {
        self.state.lock(|state| state.get())
    }

    pub fn is_waiting(&self) -> bool {
        self.state() == SampleState::Waiting
    }
}

impl<M: RawMutex> Default for SampleSlot<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub mod tests {
    use embassy_sync::blocking_mutex::raw::{CriticalSectionRawMutex, NoopRawMutex};
    use serial_test::serial;

    use super::*;

    static SHARED_SLOT: SampleSlot<CriticalSectionRawMutex> = SampleSlot::new();

    fn drain_shared_slot() {
        while SHARED_SLOT.consume().is_some() {}
    }

    #[test]
    fn starts_waiting() {
        let slot = SampleSlot::<NoopRawMutex>::new();
        assert_eq!(slot.state(), SampleState::Waiting);
        assert!(slot.is_waiting());
    }

    #[test]
    fn consume_on_waiting_is_a_no_op() {
        let slot = SampleSlot::<NoopRawMutex>::new();
        assert_eq!(slot.consume(), None);
        assert_eq!(slot.consume(), None);
        assert_eq!(slot.state(), SampleState::Waiting);
    }

    #[test]
    fn publish_then_consume_once() {
        let slot = SampleSlot::<NoopRawMutex>::new();
        assert_eq!(slot.publish(42.25), None);
        assert_eq!(slot.state(), SampleState::Ready(42.25));
        assert!(!slot.is_waiting());

        assert_eq!(slot.consume(), Some(42.25));
        assert_eq!(slot.state(), SampleState::Waiting);
        assert_eq!(slot.consume(), None);
    }

    #[test]
    fn publish_when_full_replaces_the_unread_value() {
        let slot = SampleSlot::<NoopRawMutex>::new();
        assert_eq!(slot.publish(1.0), None);
        assert_eq!(slot.publish(2.0), Some(1.0));
        assert_eq!(slot.state(), SampleState::Ready(2.0));
        assert_eq!(slot.consume(), Some(2.0));
        assert_eq!(slot.consume(), None);
    }

    #[test]
    fn consume_returns_most_recent_publish_once() {
        let slot = SampleSlot::<NoopRawMutex>::new();
        let mut consumed = std::vec::Vec::new();
        for i in 0..20 {
            // publish on every step, consume on every third step
            slot.publish(i as Lux);
            if i % 3 == 2 {
                consumed.extend(slot.consume());
                consumed.extend(slot.consume());
            }
        }
        assert_eq!(consumed, [2.0, 5.0, 8.0, 11.0, 14.0, 17.0]);
        assert_eq!(slot.state(), SampleState::Ready(19.0));
    }

    #[serial(lux_slot)]
    #[test]
    fn static_slot_is_shared_by_reference() {
        drain_shared_slot();
        let producer: &'static SampleSlot<CriticalSectionRawMutex> = &SHARED_SLOT;
        let consumer: &'static SampleSlot<CriticalSectionRawMutex> = &SHARED_SLOT;
        assert_eq!(producer.publish(321.0), None);
        assert_eq!(consumer.consume(), Some(321.0));
        assert!(producer.is_waiting());
    }

    #[serial(lux_slot)]
    #[test]
    fn concurrent_handoff_neither_loses_nor_duplicates() {
        drain_shared_slot();
        const COUNT: u32 = 5_000;

        let producer = std::thread::spawn(|| {
            for i in 1..=COUNT {
                while !SHARED_SLOT.is_waiting() {
                    std::thread::yield_now();
                }
                assert_eq!(SHARED_SLOT.publish(i as Lux), None);
            }
        });

        let consumer = std::thread::spawn(|| {
            let mut received = std::vec::Vec::with_capacity(COUNT as usize);
            while received.len() < COUNT as usize {
                match SHARED_SLOT.consume() {
                    Some(lux) => received.push(lux),
                    None => std::thread::yield_now(),
                }
            }
            received
        });

        producer.join().unwrap();
        let received = consumer.join().unwrap();
        let expected: std::vec::Vec<Lux> = (1..=COUNT).map(|i| i as Lux).collect();
        assert_eq!(received, expected);
        assert!(SHARED_SLOT.is_waiting());
    }
}
