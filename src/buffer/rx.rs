//! Receive sample buffer pool
//!
//! The network path fills buffers in order; the consumer takes completed
//! buffers out of the pool. A buffer becomes visible to the consumer only
//! when the writer moves on to the next one, so the pool holds at most
//! `size - 1` completed buffers.

use std::sync::Arc;

use crossbeam::queue::ArrayQueue;

use crate::error::ConfigError;

/// A filled buffer of interleaved IQ floats owned by the consumer
///
/// Hand it back with [`RxPool::recycle`] (or the engine's equivalent) to
/// reuse its storage; dropping it is also fine.
#[derive(Debug, Clone, PartialEq)]
pub struct RxBuffer {
    samples: Vec<f32>,
}

impl RxBuffer {
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Number of floats (I and Q counted separately)
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Iterate (I, Q) pairs
    pub fn pairs(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.samples.chunks_exact(2).map(|p| (p[0], p[1]))
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.samples
    }
}

/// Returned when the pool has no free buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolFull;

/// Power-of-two pool of receive buffers with write/read indices
pub struct RxPool {
    slots: Vec<Vec<f32>>,
    mask: usize,
    buffer_len: usize,
    write_index: usize,
    read_index: usize,
    fill: usize,
    /// Storage returned by the consumer, reused on pop
    spares: Arc<ArrayQueue<Vec<f32>>>,
}

impl RxPool {
    /// Create a pool of `size` buffers of `buffer_len` floats
    ///
    /// `size` must be a power of two.
    pub fn new(size: usize, buffer_len: usize) -> Result<Self, ConfigError> {
        if !size.is_power_of_two() {
            return Err(ConfigError::PoolSize(size));
        }
        if buffer_len == 0 || buffer_len % 4 != 0 {
            return Err(ConfigError::BufferLength(buffer_len));
        }

        Ok(Self {
            slots: (0..size).map(|_| vec![0.0; buffer_len]).collect(),
            mask: size - 1,
            buffer_len,
            write_index: 0,
            read_index: 0,
            fill: 0,
            spares: Arc::new(ArrayQueue::new(size)),
        })
    }

    /// Buffer to write into, moving to a fresh one once the current is full
    ///
    /// Returns [`PoolFull`] when advancing would collide with the reader.
    /// The caller should discard the rest of its input.
    pub fn acquire_next(&mut self) -> Result<&mut [f32], PoolFull> {
        self.advance_if_full()?;
        Ok(&mut self.slots[self.write_index][self.fill..])
    }

    /// Mark `count` floats of the acquired space as written
    ///
    /// A buffer this completes is handed to the reader right away. If the
    /// pool is full it stays put and the next acquire reports it.
    pub fn commit(&mut self, count: usize) {
        self.fill = (self.fill + count).min(self.buffer_len);
        let _ = self.advance_if_full();
    }

    /// Append one decoded row
    ///
    /// Rows never straddle buffers: `buffer_len` is a multiple of the row width.
    #[cfg(test)]
    pub fn push_row(&mut self, row: &[f32]) -> Result<(), PoolFull> {
        let dest = self.acquire_next()?;
        dest[..row.len()].copy_from_slice(row);
        self.commit(row.len());
        Ok(())
    }

    fn advance_if_full(&mut self) -> Result<(), PoolFull> {
        if self.fill >= self.buffer_len {
            let next = (self.write_index + 1) & self.mask;
            if next == self.read_index {
                return Err(PoolFull);
            }
            self.write_index = next;
            self.fill = 0;
        }
        Ok(())
    }

    /// Take the oldest completed buffer
    pub fn pop(&mut self) -> Option<RxBuffer> {
        if self.read_index == self.write_index {
            return None;
        }

        let replacement = self
            .spares
            .pop()
            .unwrap_or_else(|| vec![0.0; self.buffer_len]);
        let samples = std::mem::replace(&mut self.slots[self.read_index], replacement);
        self.read_index = (self.read_index + 1) & self.mask;

        Some(RxBuffer { samples })
    }

    /// Return a buffer's storage for reuse
    #[cfg(test)]
    pub fn recycle(&self, buffer: RxBuffer) {
        recycle_into(&self.spares, self.buffer_len, buffer);
    }

    /// Shared handle to the spare-storage queue
    pub fn spares(&self) -> Arc<ArrayQueue<Vec<f32>>> {
        Arc::clone(&self.spares)
    }

    /// Completed buffers waiting for the consumer
    pub fn ready(&self) -> usize {
        self.write_index.wrapping_sub(self.read_index) & self.mask
    }

    /// Whether finishing the current buffer would have nowhere to go
    #[cfg(test)]
    pub fn is_full(&self) -> bool {
        (self.write_index + 1) & self.mask == self.read_index
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn buffer_len(&self) -> usize {
        self.buffer_len
    }

    pub fn write_index(&self) -> usize {
        self.write_index
    }

    pub fn read_index(&self) -> usize {
        self.read_index
    }

    /// Floats written into the current write buffer
    pub fn fill(&self) -> usize {
        self.fill
    }
}

/// Push storage onto a spare queue, dropping it if the size is wrong or the queue is full
pub fn recycle_into(spares: &ArrayQueue<Vec<f32>>, buffer_len: usize, buffer: RxBuffer) {
    let mut samples = buffer.samples;
    if samples.len() != buffer_len {
        return;
    }
    samples.fill(0.0);
    let _ = spares.push(samples);
}
