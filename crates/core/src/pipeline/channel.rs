//! Closable, bounded conduits between pipeline stages.
//!
//! Both ends can be cloned: many senders feed a fan-in conduit, and many
//! receivers compete for the items of a fan-out conduit, each item going to
//! exactly one of them. A conduit closes when [`Sender::close`] is called or
//! when the last [`Sender`] is dropped. Queued messages stay receivable after
//! closing; once drained, [`Receiver::recv`] reports end-of-stream.

use super::message::{now_millis, Message};
use async_channel::{RecvError, SendError};
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

pub struct Sender<T> {
    inner: async_channel::Sender<Message<T>>,
    branch: Option<usize>,
}

pub struct Receiver<T> {
    inner: async_channel::Receiver<Message<T>>,
    last_receive_time: Arc<AtomicI64>,
}

// Manual Debug implementations that don't require T: Debug
impl<T> fmt::Debug for Sender<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sender")
            .field("branch", &self.branch)
            .field("len", &self.inner.len())
            .field("closed", &self.inner.is_closed())
            .finish()
    }
}

impl<T> fmt::Debug for Receiver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Receiver")
            .field("len", &self.inner.len())
            .field("last_receive_time", &self.last_receive_time.load(Ordering::Relaxed))
            .finish()
    }
}

// Manual Clone implementations that don't require T: Clone
impl<T> Clone for Sender<T> {
    fn clone(&self) -> Self {
        Sender {
            inner: self.inner.clone(),
            branch: self.branch,
        }
    }
}

impl<T> Clone for Receiver<T> {
    fn clone(&self) -> Self {
        Receiver {
            inner: self.inner.clone(),
            last_receive_time: self.last_receive_time.clone(),
        }
    }
}

impl<T> Sender<T> {
    /// Sends a message, waiting while the conduit is full.
    ///
    /// Conduits created with [`for_branch`] stamp their branch on the message.
    pub async fn send(&self, value: Message<T>) -> Result<(), SendError<Message<T>>> {
        let msg = match self.branch {
            Some(branch) => value.with_branch(branch),
            None => value,
        };
        self.inner.send(msg).await
    }

    pub async fn send_payload(&self, payload: T) -> Result<(), SendError<Message<T>>> {
        self.send(Message::new(payload)).await
    }

    /// Closes the conduit for every sender. Returns `false` if it was already closed.
    pub fn close(&self) -> bool {
        self.inner.close()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.inner.capacity()
    }

    pub fn branch(&self) -> Option<usize> {
        self.branch
    }
}

impl<T> Receiver<T> {
    /// Receives the next message. Fails only once the conduit is closed and drained.
    pub async fn recv(&self) -> Result<Message<T>, RecvError> {
        let msg = self.inner.recv().await?;
        self.last_receive_time.store(now_millis(), Ordering::Relaxed);
        Ok(msg)
    }

    pub fn close(&self) -> bool {
        self.inner.close()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.inner.capacity()
    }

    /// Unix milliseconds of the last successful receive on any clone, or 0.
    pub fn last_receive_time(&self) -> i64 {
        self.last_receive_time.load(Ordering::Relaxed)
    }

    /// A handle that observes the conduit without counting as a receiver.
    pub fn downgrade(&self) -> WeakReceiver<T> {
        WeakReceiver {
            inner: self.inner.downgrade(),
            last_receive_time: self.last_receive_time.clone(),
        }
    }
}

/// Non-owning receiver. Senders see the conduit closed once every strong
/// [`Receiver`] is gone, regardless of how many of these exist.
pub struct WeakReceiver<T> {
    inner: async_channel::WeakReceiver<Message<T>>,
    last_receive_time: Arc<AtomicI64>,
}

impl<T> Clone for WeakReceiver<T> {
    fn clone(&self) -> Self {
        WeakReceiver {
            inner: self.inner.clone(),
            last_receive_time: self.last_receive_time.clone(),
        }
    }
}

impl<T> WeakReceiver<T> {
    /// Returns a strong receiver, or `None` once every strong receiver was dropped.
    pub fn upgrade(&self) -> Option<Receiver<T>> {
        self.inner.upgrade().map(|inner| Receiver {
            inner,
            last_receive_time: self.last_receive_time.clone(),
        })
    }
}

fn build<T>(capacity: usize, branch: Option<usize>) -> (Sender<T>, Receiver<T>) {
    let (s, r) = async_channel::bounded(capacity);
    (
        Sender {
            inner: s,
            branch,
        },
        Receiver {
            inner: r,
            last_receive_time: Arc::new(AtomicI64::new(0)),
        },
    )
}

/// Creates a bounded conduit.
///
/// # Panics
///
/// Panics if `capacity` is zero. [`PipelineConfig::validate`](crate::config::PipelineConfig::validate)
/// rejects zero-sized buffers before any conduit is built.
pub fn bounded<T>(capacity: usize) -> (Sender<T>, Receiver<T>) {
    build(capacity, None)
}

/// Creates a bounded conduit whose sender stamps `branch` on every message.
pub fn for_branch<T>(branch: usize, capacity: usize) -> (Sender<T>, Receiver<T>) {
    build(capacity, Some(branch))
}
