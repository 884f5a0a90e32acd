//! Blocking channels with explicit close.
//!
//! Built on `crossbeam::channel`. The channel owns its only long-lived
//! `Sender`; `close` drops it, which disconnects the channel so receivers
//! drain the remaining buffer and then observe end-of-stream. Senders
//! blocked on a full buffer also watch a close signal and fail once `close`
//! has run, so nothing is delivered after the close.

use std::fmt;
use std::sync::Arc;

use crossbeam::channel::{self, Receiver, Sender};
use crossbeam::select;
use parking_lot::Mutex;

use super::Value;

struct ChannelInner {
    sender: Mutex<Option<Sender<Value>>>,
    receiver: Receiver<Value>,
    /// Never sent on; dropping it disconnects `closed`.
    close_signal: Mutex<Option<Sender<()>>>,
    closed: Receiver<()>,
    capacity: usize,
}

/// Handle to a channel; clones share the same queue.
#[derive(Clone)]
pub struct ChannelValue(Arc<ChannelInner>);

/// `send` on a channel that has been closed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SendOnClosed;

impl ChannelValue {
    /// Create a channel with `capacity` buffer slots; `0` is a rendezvous channel.
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = channel::bounded(capacity);
        let (signal, closed) = channel::bounded(0);
        ChannelValue(Arc::new(ChannelInner {
            sender: Mutex::new(Some(tx)),
            receiver: rx,
            close_signal: Mutex::new(Some(signal)),
            closed,
            capacity,
        }))
    }

    /// Block until the value is accepted or the channel is closed.
    pub fn send(&self, value: Value) -> Result<(), SendOnClosed> {
        // Clone out of the lock so a blocked sender does not stall `close`.
        let Some(tx) = self.0.sender.lock().clone() else {
            return Err(SendOnClosed);
        };
        select! {
            send(tx, value) -> sent => sent.map_err(|_| SendOnClosed),
            recv(self.0.closed) -> _ => Err(SendOnClosed),
        }
    }

    /// Block until a value arrives; `None` once closed and drained.
    pub fn recv(&self) -> Option<Value> {
        self.0.receiver.recv().ok()
    }

    /// Close the channel. Returns `false` if it was already closed.
    pub fn close(&self) -> bool {
        let was_open = self.0.sender.lock().take().is_some();
        self.0.close_signal.lock().take();
        was_open
    }

    pub fn is_closed(&self) -> bool {
        self.0.sender.lock().is_none()
    }

    /// Number of buffered values.
    pub fn len(&self) -> usize {
        self.0.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.receiver.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.0.capacity
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ChannelValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelValue")
            .field("capacity", &self.0.capacity)
            .field("buffered", &self.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}
