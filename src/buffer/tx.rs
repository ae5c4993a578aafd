//! Transmit frame pool
//!
//! The consumer encodes frames into slots ahead of the write index; the
//! network path drains them two at a time. The slot under the write index
//! is the one most recently handed out, so a pair is only sent once at
//! least two slots sit between the read and write indices.

use bytes::Bytes;

use crate::error::ConfigError;
use crate::protocol::SUBFRAME_LEN;

type Slot = Box<[u8; SUBFRAME_LEN]>;

pub struct TxPool {
    slots: Vec<Slot>,
    mask: usize,
    write_index: usize,
    read_index: usize,
}

impl TxPool {
    /// Create a pool of `size` zeroed 512-byte frames
    ///
    /// `size` must be a power of two and at least 2.
    pub fn new(size: usize) -> Result<Self, ConfigError> {
        if !size.is_power_of_two() || size < 2 {
            return Err(ConfigError::PoolSize(size));
        }

        Ok(Self {
            slots: (0..size).map(|_| Box::new([0u8; SUBFRAME_LEN])).collect(),
            mask: size - 1,
            write_index: 0,
            read_index: 0,
        })
    }

    /// The slot under the write index, used to prime the pool before streaming
    pub fn current_mut(&mut self) -> &mut [u8] {
        &mut self.slots[self.write_index][..]
    }

    /// Advance the write index and hand out that slot
    ///
    /// `None` when advancing would collide with the reader.
    pub fn acquire_next(&mut self) -> Option<&mut [u8]> {
        let next = (self.write_index + 1) & self.mask;
        if next == self.read_index {
            return None;
        }
        self.write_index = next;
        Some(&mut self.slots[next][..])
    }

    /// Frames between the read and write indices
    pub fn ready(&self) -> usize {
        self.write_index.wrapping_sub(self.read_index) & self.mask
    }

    /// Copy out and release the next two frames
    ///
    /// `None` when fewer than two are ready; nothing is consumed then.
    pub fn take_pair(&mut self) -> Option<[Bytes; 2]> {
        if self.ready() < 2 {
            return None;
        }

        let first = Bytes::copy_from_slice(&self.slots[self.read_index][..]);
        self.read_index = (self.read_index + 1) & self.mask;
        let second = Bytes::copy_from_slice(&self.slots[self.read_index][..]);
        self.read_index = (self.read_index + 1) & self.mask;

        Some([first, second])
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn write_index(&self) -> usize {
        self.write_index
    }

    pub fn read_index(&self) -> usize {
        self.read_index
    }
}
