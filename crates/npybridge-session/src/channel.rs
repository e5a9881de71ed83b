//! Single-slot rendezvous between the output reader and a waiting caller.
//!
//! The slot is either EMPTY or FULL. [`TransferChannel::produce`] waits for
//! EMPTY, stores one buffer and wakes one consumer; [`TransferChannel::consume`]
//! waits for FULL, takes the buffer and wakes one producer. A second frame can
//! never overwrite one that has not been taken yet.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use tracing::trace;

#[derive(Debug, Default)]
struct Slot {
    buffer: Mutex<Option<Bytes>>,
    filled: Condvar,
    drained: Condvar,
}

impl Slot {
    fn lock(&self) -> MutexGuard<'_, Option<Bytes>> {
        // Poisoning is ignored: the slot holds a whole buffer or nothing.
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Cloneable handle to a shared one-buffer slot.
#[derive(Debug, Clone, Default)]
pub struct TransferChannel {
    slot: Arc<Slot>,
}

impl TransferChannel {
    /// Create an empty channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store one buffer, blocking while a previous one is still unread.
    pub fn produce(&self, bytes: impl Into<Bytes>) {
        let bytes = bytes.into();
        let mut buffer = self.slot.lock();
        while buffer.is_some() {
            trace!("transfer slot full, producer waiting");
            buffer = self
                .slot
                .drained
                .wait(buffer)
                .unwrap_or_else(PoisonError::into_inner);
        }
        trace!(len = bytes.len(), "transfer slot filled");
        *buffer = Some(bytes);
        drop(buffer);
        self.slot.filled.notify_one();
    }

    /// Take the pending buffer, blocking until one is produced.
    ///
    /// There is no timeout: if nothing is ever produced this never returns.
    pub fn consume(&self) -> Bytes {
        let mut buffer = self.slot.lock();
        loop {
            if let Some(bytes) = buffer.take() {
                drop(buffer);
                trace!(len = bytes.len(), "transfer slot drained");
                self.slot.drained.notify_one();
                return bytes;
            }
            buffer = self
                .slot
                .filled
                .wait(buffer)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Whether a buffer is waiting to be consumed.
    pub fn is_full(&self) -> bool {
        self.slot.lock().is_some()
    }
}
