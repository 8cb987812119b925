//! Linked-list DMA engine for Allwinner-style DMA controllers.
//!
//! `lli-dma` provides
//!
//! - builders that turn memcpy, scatter-gather, device, and cyclic transfer
//!   requests into chains of linked-list items (LLIs).
//! - per-channel transfer queues, with cookies for progress queries.
//! - a scheduler that starts queued channels, and an interrupt handler that
//!   retires transfers and chains the next one.
//!
//! The engine drives the controller through the [`Hardware`] trait. Use
//! [`Mmio`] for the memory-mapped controller, or implement `Hardware` for
//! anything else that behaves like one.
//!
//! # Getting started
//!
//! To allocate a [`Dma`] driver, you'll need
//!
//! 1. a `Hardware` implementation.
//! 2. a bus memory region for LLIs, described by an [`LliPool`].
//! 3. the number of DMA channels supported by your chip.
//!
//! ```no_run
//! use lli_dma::{DescriptorFlags, Dma, LliPool, Mmio};
//! # const DMA_PTR: *const () = core::ptr::null() as _;
//!
//! // Safety: the address points to the DMA controller registers.
//! let mmio = unsafe { Mmio::new(DMA_PTR) };
//! let pool = LliPool::new(0x4300_0000, 256).unwrap();
//! let dma: Dma<Mmio, 8> = Dma::new(mmio, pool);
//!
//! let channel = dma.channel(2);
//! let desc = channel
//!     .prep_memcpy(0x4100_0000, 0x4200_0000, 4096, DescriptorFlags::INTERRUPT)
//!     .unwrap();
//! let cookie = channel.submit(desc).unwrap();
//! channel.issue_pending();
//!
//! // From your deferred-work context...
//! dma.drain_pending();
//! // ...and from your DMA interrupt handler.
//! dma.handle_interrupt(dma.hardware().take_interrupt_status());
//!
//! let progress = channel.query_progress(cookie);
//! ```
//!
//! # Execution contexts
//!
//! Three contexts share a `Dma`: callers preparing and issuing transfers,
//! a deferred-work context calling [`Dma::drain_pending`] whenever
//! [`Dma::has_pending_work`] is set, and the interrupt context calling
//! [`Dma::handle_interrupt`]. Every channel has its own lock, and the
//! pending list has another. A channel lock is never held while a
//! completion callback runs.
//!
//! ### License
//!
//! Licensed under either of
//!
//! - [Apache License, Version 2.0](http://www.apache.org/licenses/LICENSE-2.0) ([LICENSE-APACHE](./LICENSE-APACHE))
//! - [MIT License](http://opensource.org/licenses/MIT) ([LICENSE-MIT](./LICENSE-MIT))
//!
//! at your option.
//!
//! Unless you explicitly state otherwise, any contribution intentionally submitted
//! for inclusion in the work by you, as defined in the Apache-2.0 license, shall be
//! dual licensed as above, without any additional terms or conditions.

#![no_std]

extern crate alloc;
#[cfg(test)]
extern crate std;

pub mod channel;
mod descriptor;
mod error;
mod hardware;
pub mod interrupt;
pub mod lli;
mod memcpy;
mod mmio;
mod peripheral;
pub mod pool;
mod ral;
mod scheduler;

#[cfg(test)]
mod sim;

use alloc::collections::VecDeque;
use alloc::sync::Arc;
use core::sync::atomic::AtomicBool;

use spin::Mutex;

pub use channel::config::{Burst, BusWidth, Direction, SlaveConfig};
pub use channel::Channel;
pub use descriptor::{Callback, Cookie, Descriptor, DescriptorFlags};
pub use error::Error;
pub use hardware::Hardware;
pub use interrupt::{InterruptStatus, IrqType};
pub use memcpy::Segment;
pub use mmio::Mmio;
pub use pool::LliPool;

/// A DMA result
pub type Result<T> = core::result::Result<T, Error>;

/// A bus address, as seen by the DMA controller.
pub type BusAddr = u64;

/// Most channels a controller can have.
///
/// Two interrupt words, eight channels each.
pub const MAX_CHANNELS: usize = 16;

/// A DMA driver.
///
/// `Dma` owns the channel state, the shared LLI pool, and the list of
/// channels waiting to start. It's configured with the controller's
/// [`Hardware`] implementation.
///
/// `Dma` hands out [`Channel`]s. `Channel` provides the interface for
/// preparing and scheduling transfers.
pub struct Dma<H, const CHANNELS: usize> {
    hardware: H,
    pool: Arc<LliPool>,
    channels: [Mutex<channel::State>; CHANNELS],
    pending: Mutex<VecDeque<usize>>,
    work: AtomicBool,
}

impl<H: Hardware, const CHANNELS: usize> Dma<H, CHANNELS> {
    const CHANNELS_FIT: () = assert!(
        CHANNELS > 0 && CHANNELS <= MAX_CHANNELS,
        "Unsupported DMA channel count"
    );

    /// Create the DMA driver.
    ///
    /// `CHANNELS` specifies the total number of channels supported by the DMA
    /// controller. It's referenced when allocating channels.
    pub fn new(hardware: H, pool: LliPool) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::CHANNELS_FIT;
        Self {
            hardware,
            pool: Arc::new(pool),
            channels: core::array::from_fn(|_| Mutex::new(channel::State::new())),
            pending: Mutex::new(VecDeque::with_capacity(CHANNELS)),
            work: AtomicBool::new(false),
        }
    }

    /// Returns a handle to the DMA channel described by `index`.
    ///
    /// Handles are cheap. Any number of them may exist for the same channel,
    /// and they may be used from different execution contexts.
    ///
    /// # Panics
    ///
    /// Panics if `index` is greater than or equal to the maximum number of channels.
    pub fn channel(&self, index: usize) -> Channel<'_, H, CHANNELS> {
        assert!(index < CHANNELS, "DMA channel index {index} exceeds {CHANNELS}");
        Channel::new(self, index)
    }

    /// The controller.
    pub fn hardware(&self) -> &H {
        &self.hardware
    }

    /// The LLI pool shared by all channels.
    pub fn pool(&self) -> &LliPool {
        &self.pool
    }

    pub(crate) fn shared_pool(&self) -> Arc<LliPool> {
        Arc::clone(&self.pool)
    }

    pub(crate) fn state(&self, index: usize) -> &Mutex<channel::State> {
        &self.channels[index]
    }
}
