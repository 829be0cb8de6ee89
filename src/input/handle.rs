//! # Gamepad Handle
//!
//! Connection bookkeeping between the gamepad reader and the control loop.
//!
//! The reader side owns a [`GamepadSlot`] and calls its hooks
//! ([`GamepadSlot::on_connect`], [`GamepadSlot::on_disconnect`],
//! [`GamepadSlot::publish`]). The control loop owns a [`GamepadHandle`] and
//! only ever reads through [`InputSource::poll`].
//!
//! Both sides share a `tokio::sync::watch` cell holding
//! `Option<ActivePad>`. A read takes the cell's lock once, so "is a pad set"
//! and "what does it report" can never tear.
//!
//! The most recently connected pad wins. A disconnect or late publish from
//! an older pad is ignored.

use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tracing::{debug, info};

use super::{InputSnapshot, InputSource};

/// Identity of one connection session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PadId(u64);

impl std::fmt::Display for PadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "pad#{}", self.0)
    }
}

/// The currently connected pad and its latest input.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivePad {
    pub id: PadId,
    pub snapshot: InputSnapshot,
}

/// Creates a connected slot/handle pair with no pad attached.
///
/// # Examples
///
/// ```
/// use animatronic_bridge::input::handle;
/// use animatronic_bridge::input::{InputSnapshot, InputSource};
///
/// let (slot, mut handle) = handle::channel();
/// assert!(handle.poll().is_none());
///
/// let pad = slot.on_connect();
/// slot.publish(pad, InputSnapshot { lock: true, ..Default::default() });
/// assert!(handle.poll().unwrap().lock);
///
/// slot.on_disconnect(pad);
/// assert!(handle.poll().is_none());
/// ```
#[must_use]
pub fn channel() -> (GamepadSlot, GamepadHandle) {
    let (tx, rx) = watch::channel(None);
    (
        GamepadSlot {
            tx,
            next_id: AtomicU64::new(1),
        },
        GamepadHandle { rx },
    )
}

/// Writer side: connect/disconnect hooks for the reader.
#[derive(Debug)]
pub struct GamepadSlot {
    tx: watch::Sender<Option<ActivePad>>,
    next_id: AtomicU64,
}

impl GamepadSlot {
    /// Registers a newly connected pad, replacing any previous one.
    ///
    /// The pad starts with a neutral snapshot until the first publish.
    pub fn on_connect(&self) -> PadId {
        let id = PadId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let previous = self.tx.send_replace(Some(ActivePad {
            id,
            snapshot: InputSnapshot::default(),
        }));

        match previous {
            Some(old) => info!("Gamepad {} connected, replacing {}", id, old.id),
            None => info!("Gamepad {} connected", id),
        }

        id
    }

    /// Clears the slot if `id` is still the active pad.
    pub fn on_disconnect(&self, id: PadId) {
        let cleared = self.tx.send_if_modified(|current| match current {
            Some(pad) if pad.id == id => {
                *current = None;
                true
            }
            _ => false,
        });

        if cleared {
            info!("Gamepad {} disconnected", id);
        } else {
            debug!("Ignoring disconnect from stale {}", id);
        }
    }

    /// Stores the latest input for `id` if it is still the active pad.
    pub fn publish(&self, id: PadId, snapshot: InputSnapshot) {
        self.tx.send_if_modified(|current| match current {
            Some(pad) if pad.id == id => {
                pad.snapshot = snapshot;
                true
            }
            _ => false,
        });
    }

    /// True once the control side has dropped its handle.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Reader side used by the control loop.
#[derive(Debug, Clone)]
pub struct GamepadHandle {
    rx: watch::Receiver<Option<ActivePad>>,
}

impl GamepadHandle {
    /// True if a pad is currently attached.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.rx.borrow().is_some()
    }

    /// Latest input of the attached pad, if any.
    #[must_use]
    pub fn snapshot(&self) -> Option<InputSnapshot> {
        self.rx.borrow().as_ref().map(|pad| pad.snapshot.clone())
    }
}

impl InputSource for GamepadHandle {
    fn poll(&mut self) -> Option<InputSnapshot> {
        self.rx
            .borrow_and_update()
            .as_ref()
            .map(|pad| pad.snapshot.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pressing_lock() -> InputSnapshot {
        InputSnapshot {
            lock: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_starts_disconnected() {
        let (_slot, handle) = channel();
        assert!(!handle.is_connected());
        assert!(handle.snapshot().is_none());
    }

    #[test]
    fn test_connect_gives_neutral_snapshot() {
        let (slot, mut handle) = channel();
        slot.on_connect();
        assert!(handle.is_connected());
        assert_eq!(handle.poll(), Some(InputSnapshot::default()));
    }

    #[test]
    fn test_publish_updates_snapshot() {
        let (slot, mut handle) = channel();
        let id = slot.on_connect();
        slot.publish(id, pressing_lock());
        assert_eq!(handle.poll(), Some(pressing_lock()));
    }

    #[test]
    fn test_publish_after_disconnect_is_ignored() {
        let (slot, handle) = channel();
        let id = slot.on_connect();
        slot.on_disconnect(id);
        slot.publish(id, pressing_lock());
        assert!(!handle.is_connected());
    }

    #[test]
    fn test_most_recent_connection_wins() {
        let (slot, mut handle) = channel();
        let first = slot.on_connect();
        let second = slot.on_connect();
        assert_ne!(first, second);

        // Stale pad can neither publish nor disconnect the new one
        slot.publish(first, pressing_lock());
        assert_eq!(handle.poll(), Some(InputSnapshot::default()));

        slot.on_disconnect(first);
        assert!(handle.is_connected());

        slot.on_disconnect(second);
        assert!(!handle.is_connected());
        assert!(handle.poll().is_none());
    }

    #[test]
    fn test_slot_sees_closed_handle() {
        let (slot, handle) = channel();
        assert!(!slot.is_closed());
        drop(handle);
        assert!(slot.is_closed());
    }

    #[test]
    fn test_pad_id_display() {
        let (slot, _handle) = channel();
        let id = slot.on_connect();
        assert_eq!(id.to_string(), "pad#1");
    }
}
