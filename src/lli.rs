//! Linked-list items and descriptor chains.

use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::channel::config::SlaveConfig;
use crate::pool::{Block, LliPool};
use crate::{BusAddr, Error, Result};

/// Link value that terminates a non-cyclic chain.
pub const LINK_END: u32 = 0xFFFF_F800;

/// Parameter word wait cycles used for every item.
const NORMAL_WAIT: u32 = 8;

cfg_if::cfg_if! {
    if #[cfg(feature = "high-addr")] {
        /// Highest bus address the controller can reach.
        pub const MAX_BUS_ADDR: BusAddr = (1 << 34) - 1;

        /// Encode a word-aligned bus address as a hardware link.
        ///
        /// Bits 32 and 33 of the address ride in the two low bits.
        pub const fn link_address(address: BusAddr) -> u32 {
            (((address >> 32) & 0x3) | (address & 0xFFFF_FFFC)) as u32
        }

        fn high_address_bits(src: BusAddr, dst: BusAddr) -> u32 {
            ((((dst >> 32) & 0x3) << 18) | (((src >> 32) & 0x3) << 16)) as u32
        }
    } else {
        /// Highest bus address the controller can reach.
        pub const MAX_BUS_ADDR: BusAddr = u32::MAX as BusAddr;

        /// Encode a word-aligned bus address as a hardware link.
        pub const fn link_address(address: BusAddr) -> u32 {
            address as u32
        }

        fn high_address_bits(_: BusAddr, _: BusAddr) -> u32 {
            0
        }
    }
}

/// Check that `len` bytes starting at `address` stay within the bus range.
pub(crate) fn check_span(address: BusAddr, len: usize) -> Result<()> {
    let last = (len as BusAddr)
        .checked_sub(1)
        .and_then(|extent| address.checked_add(extent))
        .ok_or(Error::InvalidArgument)?;
    if last > MAX_BUS_ADDR {
        return Err(Error::InvalidArgument);
    }
    Ok(())
}

/// Configuration word fields.
pub mod cfg {
    /// Request line of the memory ("SDRAM") side.
    pub const DRQ_SDRAM: u32 = 1;

    pub const SRC_DRQ_SHIFT: u32 = 0;
    pub const SRC_BURST_SHIFT: u32 = 6;
    pub const SRC_IO_MODE: u32 = 1 << 8;
    pub const SRC_WIDTH_SHIFT: u32 = 9;

    pub const DST_DRQ_SHIFT: u32 = 16;
    pub const DST_BURST_SHIFT: u32 = 22;
    pub const DST_IO_MODE: u32 = 1 << 24;
    pub const DST_WIDTH_SHIFT: u32 = 25;

    pub const BMODE_SEL: u32 = 1 << 30;

    pub const DRQ_MASK: u32 = 0x3F;

    pub const fn src_drq(drq: u32) -> u32 {
        (drq & DRQ_MASK) << SRC_DRQ_SHIFT
    }

    pub const fn dst_drq(drq: u32) -> u32 {
        (drq & DRQ_MASK) << DST_DRQ_SHIFT
    }
}

/// A linked-list item, laid out the way the controller reads it.
#[repr(C, align(4))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Lli {
    /// Burst, width, addressing mode, and request line selection.
    pub cfg: u32,
    /// Low 32 bits of the source address.
    pub src: u32,
    /// Low 32 bits of the destination address.
    pub dst: u32,
    /// Bytes to move.
    pub len: u32,
    /// Wait cycles, and high address bits in 34-bit mode.
    pub para: u32,
    /// Hardware link to the next item, or [`LINK_END`].
    pub link: u32,
}

impl Lli {
    /// Describe a `len`-byte move from `src` to `dst`, taking burst sizes and
    /// bus widths from `config`.
    ///
    /// The caller ORs in addressing modes and request lines.
    pub fn new(src: BusAddr, dst: BusAddr, len: usize, config: &SlaveConfig) -> Result<Self> {
        if len == 0 || len > u32::MAX as usize {
            return Err(Error::InvalidArgument);
        }
        if src > MAX_BUS_ADDR || dst > MAX_BUS_ADDR {
            return Err(Error::InvalidArgument);
        }
        let cfg = config.src_burst.code() << cfg::SRC_BURST_SHIFT
            | config.src_width.code() << cfg::SRC_WIDTH_SHIFT
            | config.dst_burst.code() << cfg::DST_BURST_SHIFT
            | config.dst_width.code() << cfg::DST_WIDTH_SHIFT;
        Ok(Self {
            cfg,
            src: src as u32,
            dst: dst as u32,
            len: len as u32,
            para: NORMAL_WAIT | high_address_bits(src, dst),
            link: LINK_END,
        })
    }

    /// Set additional configuration bits.
    pub fn with(mut self, bits: u32) -> Self {
        self.cfg |= bits;
        self
    }
}

struct Item {
    lli: Lli,
    block: Block,
}

/// An owned chain of LLIs.
///
/// Items are stored in chain order; item `i + 1` follows item `i`. A cyclic
/// chain links its last item back to its first. Dropping the chain returns
/// every block to the pool.
pub struct Chain {
    pool: Arc<LliPool>,
    items: Vec<Item>,
    cyclic: bool,
}

impl Chain {
    pub(crate) fn new(pool: Arc<LliPool>) -> Self {
        Self {
            pool,
            items: Vec::new(),
            cyclic: false,
        }
    }

    /// Allocate a block for `lli` and link it to the end of the chain.
    pub(crate) fn push(&mut self, mut lli: Lli) -> Result<()> {
        let block = self.pool.allocate().map_err(|err| {
            log::warn!(
                "LLI pool exhausted after {} items ({} blocks in pool)",
                self.items.len(),
                self.pool.capacity()
            );
            err
        })?;
        lli.link = LINK_END;
        if let Some(last) = self.items.last_mut() {
            last.lli.link = link_address(block.address());
        }
        log::trace!(
            "lli @ {:#x}: cfg {:#010x} src {:#010x} dst {:#010x} len {:#x} para {:#x}",
            block.address(),
            lli.cfg,
            lli.src,
            lli.dst,
            lli.len,
            lli.para
        );
        self.items.push(Item { lli, block });
        Ok(())
    }

    /// Point the last item back at the first, forming a ring.
    pub(crate) fn close_ring(&mut self) {
        let head = self.head_address();
        if let Some(last) = self.items.last_mut() {
            last.lli.link = head;
            self.cyclic = true;
        }
    }

    /// Index of the first item, if any.
    pub fn head(&self) -> Option<usize> {
        (!self.items.is_empty()).then_some(0)
    }

    /// Index of the item following `index`.
    ///
    /// For a cyclic chain, the last item is followed by the first.
    pub fn next(&self, index: usize) -> Option<usize> {
        if index + 1 < self.items.len() {
            Some(index + 1)
        } else if self.cyclic && index < self.items.len() {
            Some(0)
        } else {
            None
        }
    }

    /// `true` if the item at `index` ends the chain.
    pub fn is_end(&self, index: usize) -> bool {
        self.items
            .get(index)
            .map_or(true, |item| item.lli.link == LINK_END)
    }

    /// The item at `index`.
    pub fn get(&self, index: usize) -> Option<&Lli> {
        self.items.get(index).map(|item| &item.lli)
    }

    /// Bus address of the item at `index`.
    pub fn address(&self, index: usize) -> Option<BusAddr> {
        self.items.get(index).map(|item| item.block.address())
    }

    /// Hardware link to the first item, or [`LINK_END`] for an empty chain.
    pub fn head_address(&self) -> u32 {
        self.items
            .first()
            .map_or(LINK_END, |item| link_address(item.block.address()))
    }

    /// Iterate over the items once, in chain order.
    pub fn iter(&self) -> impl Iterator<Item = &Lli> + '_ {
        self.items.iter().map(|item| &item.lli)
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// `true` if the chain has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// `true` if the chain is a ring.
    pub fn is_cyclic(&self) -> bool {
        self.cyclic
    }

    /// Sum of all item lengths.
    pub fn total_bytes(&self) -> usize {
        self.iter().map(|lli| lli.len as usize).sum()
    }

    /// Bytes not yet moved, given the controller's live position.
    ///
    /// `position` is the link the controller will load next, and `left` is
    /// its byte counter for the item in flight. Items after the one that
    /// links to `position` haven't started, so they count in full.
    pub fn residue(&self, position: u32, left: u32) -> usize {
        let mut residue = left as usize;
        if position == LINK_END {
            return residue;
        }
        let mut counting = false;
        for lli in self.iter() {
            if lli.link == position {
                counting = true;
                continue;
            }
            if counting {
                residue += lli.len as usize;
            }
        }
        residue
    }
}

impl Drop for Chain {
    fn drop(&mut self) {
        for item in self.items.drain(..) {
            self.pool.release(item.block);
        }
    }
}

impl core::fmt::Debug for Chain {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Chain")
            .field("head", &self.head_address())
            .field("items", &self.items.len())
            .field("cyclic", &self.cyclic)
            .finish()
    }
}
