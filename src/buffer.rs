//! Receive buffers for the server loop.
//!
//! Every datagram is read into a [`RecvBuffer`] checked out of a shared
//! [`BufferPool`]. The buffer moves into the task that answers the query and
//! its allocation goes back to the pool when that task is done with it.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::dns::MAX_UDP_DNS_SIZE;

/// Capacity of every receive buffer: one classic DNS-over-UDP datagram.
pub const MAX_PACKET_SIZE: usize = MAX_UDP_DNS_SIZE;

type FreeList = Arc<Mutex<Vec<Vec<u8>>>>;

/// A datagram-sized buffer on loan from a [`BufferPool`].
pub struct RecvBuffer {
    bytes: Vec<u8>,
    free: FreeList,
    limit: usize,
}

impl RecvBuffer {
    /// The whole zeroed space to receive into.
    pub fn space(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// Shrinks the buffer to the `len` bytes a receive call filled.
    pub fn set_filled(&mut self, len: usize) {
        self.bytes.truncate(len);
    }

    /// The received datagram.
    pub fn datagram(&self) -> &[u8] {
        &self.bytes
    }
}

impl Drop for RecvBuffer {
    fn drop(&mut self) {
        let mut bytes = std::mem::take(&mut self.bytes);
        bytes.clear();
        let mut free = self.free.lock();
        if free.len() < self.limit {
            free.push(bytes);
        }
    }
}

/// Shared pool of receive allocations.
///
/// Holds at most `size` idle allocations; a checkout from an empty pool
/// allocates, and extra buffers are freed on return.
#[derive(Clone)]
pub struct BufferPool {
    free: FreeList,
    limit: usize,
}

impl BufferPool {
    pub fn new(size: usize) -> Self {
        let free = (0..size)
            .map(|_| Vec::with_capacity(MAX_PACKET_SIZE))
            .collect();
        Self {
            free: Arc::new(Mutex::new(free)),
            limit: size,
        }
    }

    /// Hands out a buffer of [`MAX_PACKET_SIZE`] zero bytes.
    pub fn checkout(&self) -> RecvBuffer {
        let mut bytes = self
            .free
            .lock()
            .pop()
            .unwrap_or_else(|| Vec::with_capacity(MAX_PACKET_SIZE));
        bytes.resize(MAX_PACKET_SIZE, 0);
        RecvBuffer {
            bytes,
            free: Arc::clone(&self.free),
            limit: self.limit,
        }
    }

    #[cfg(test)]
    fn idle(&self) -> usize {
        self.free.lock().len()
    }
}
