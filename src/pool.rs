//! Linked-list item pool.
//!
//! The controller fetches linked-list items (LLIs) from bus memory. The pool
//! hands out fixed-size, word-aligned blocks from one contiguous bus region,
//! and tells the caller the bus address of each block.

use alloc::vec::Vec;
use spin::Mutex;

use crate::lli::{self, Lli};
use crate::{BusAddr, Error, Result};

/// Bytes occupied by one LLI in bus memory.
pub const BLOCK_SIZE: usize = core::mem::size_of::<Lli>();

/// Required alignment of every LLI block.
pub const BLOCK_ALIGN: BusAddr = 4;

/// One allocated LLI block.
///
/// A `Block` can only come from [`LliPool::allocate`], and it's consumed by
/// [`LliPool::release`], so a block can't be released twice.
#[derive(Debug, PartialEq, Eq)]
pub struct Block {
    index: u32,
    address: BusAddr,
}

impl Block {
    /// Bus address of this block, as seen by the controller.
    pub fn address(&self) -> BusAddr {
        self.address
    }
}

/// A bounded pool of LLI blocks.
///
/// Allocation never blocks for longer than the pool's own short critical
/// section, so it may be used from deferred-work contexts. The pool is
/// shared by every channel of a [`Dma`](crate::Dma).
pub struct LliPool {
    base: BusAddr,
    capacity: usize,
    free: Mutex<Vec<u32>>,
}

impl LliPool {
    /// Create a pool of `capacity` blocks starting at bus address `base`.
    ///
    /// Returns [`Error::InvalidArgument`] if
    ///
    /// - `base` isn't 4-byte aligned,
    /// - `capacity` is zero,
    /// - the region extends past the controller's addressable range, or
    /// - the region overlaps the link-end marker.
    pub fn new(base: BusAddr, capacity: usize) -> Result<Self> {
        if base % BLOCK_ALIGN != 0 || capacity == 0 || capacity > u32::MAX as usize {
            return Err(Error::InvalidArgument);
        }
        let end = (capacity as BusAddr)
            .checked_mul(BLOCK_SIZE as BusAddr)
            .and_then(|len| base.checked_add(len))
            .ok_or(Error::InvalidArgument)?;
        if end - 1 > lli::MAX_BUS_ADDR {
            return Err(Error::InvalidArgument);
        }
        // The controller treats LINK_END as "no next item".
        let marker = lli::LINK_END as BusAddr;
        if base < (1 << 32) && end > marker {
            return Err(Error::InvalidArgument);
        }

        let free = (0..capacity as u32).rev().collect();
        Ok(Self {
            base,
            capacity,
            free: Mutex::new(free),
        })
    }

    /// Take one block from the pool.
    ///
    /// Returns [`Error::ResourceExhausted`] when every block is in use.
    pub fn allocate(&self) -> Result<Block> {
        let index = self.free.lock().pop().ok_or(Error::ResourceExhausted)?;
        Ok(Block {
            index,
            address: self.address_of(index),
        })
    }

    /// Return a block to the pool.
    pub fn release(&self, block: Block) {
        debug_assert!((block.index as usize) < self.capacity);
        debug_assert_eq!(block.address, self.address_of(block.index));
        let mut free = self.free.lock();
        debug_assert!(!free.contains(&block.index), "LLI block released twice");
        free.push(block.index);
    }

    /// Total number of blocks managed by the pool.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of blocks that can still be allocated.
    pub fn available(&self) -> usize {
        self.free.lock().len()
    }

    /// Bus address of the first block.
    pub fn base(&self) -> BusAddr {
        self.base
    }

    fn address_of(&self, index: u32) -> BusAddr {
        self.base + index as BusAddr * BLOCK_SIZE as BusAddr
    }
}

impl core::fmt::Debug for LliPool {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LliPool")
            .field("base", &self.base)
            .field("capacity", &self.capacity)
            .field("available", &self.available())
            .finish()
    }
}
