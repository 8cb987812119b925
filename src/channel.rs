//! DMA channels

pub mod config;

use alloc::collections::VecDeque;
use alloc::vec::Vec;

use crate::descriptor::{Cookie, Descriptor};
use crate::interrupt::IrqType;
use crate::{Dma, Error, Hardware, Result};

use self::config::SlaveConfig;

/// Lock-protected state of one channel.
pub(crate) struct State {
    pub(crate) config: SlaveConfig,
    /// Submitted, but not yet issued.
    pub(crate) submitted: VecDeque<Descriptor>,
    /// Issued, waiting for the controller.
    pub(crate) issued: VecDeque<Descriptor>,
    /// Programmed into the controller.
    pub(crate) active: Option<Descriptor>,
    /// A cyclic transfer was submitted and not yet terminated.
    pub(crate) cyclic: bool,
    /// Interrupt class armed for the active descriptor.
    pub(crate) irq_type: IrqType,
    /// Sitting in the engine's pending list, or in a drain snapshot.
    pub(crate) scheduled: bool,
    pub(crate) paused: bool,
    pub(crate) last_cookie: Cookie,
    pub(crate) completed_cookie: Cookie,
}

impl State {
    pub(crate) fn new() -> Self {
        Self {
            config: SlaveConfig::default(),
            submitted: VecDeque::new(),
            issued: VecDeque::new(),
            active: None,
            cyclic: false,
            irq_type: IrqType::empty(),
            scheduled: false,
            paused: false,
            last_cookie: Cookie::NONE,
            completed_cookie: Cookie::NONE,
        }
    }

    pub(crate) fn active_is_cyclic(&self) -> bool {
        self.active.as_ref().is_some_and(Descriptor::is_cyclic)
    }

    pub(crate) fn complete(&mut self, cookie: Cookie) {
        self.completed_cookie = cookie;
    }

    fn find_queued(&self, cookie: Cookie) -> Option<&Descriptor> {
        self.submitted
            .iter()
            .chain(self.issued.iter())
            .find(|desc| desc.cookie == Some(cookie))
    }

    fn status(&self) -> ChannelStatus {
        if self.active_is_cyclic() {
            ChannelStatus::CyclicActive
        } else if self.active.is_some() {
            ChannelStatus::Active
        } else if !self.issued.is_empty() || !self.submitted.is_empty() {
            ChannelStatus::Queued
        } else {
            ChannelStatus::Idle
        }
    }
}

/// Where a channel is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelStatus {
    /// Nothing queued, nothing running.
    Idle,
    /// Transfers queued, none running.
    Queued,
    /// One transfer running.
    Active,
    /// A cyclic transfer running. It runs until the channel is terminated.
    CyclicActive,
}

/// Status of one transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Complete,
    InProgress,
    /// Running on a paused channel.
    Paused,
}

/// Result of a progress query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub status: Status,
    /// Bytes not yet transferred.
    pub residue: usize,
}

/// What [`Channel::terminate`] did with the channel's transfers.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Terminated {
    /// The cyclic transfer that was running, now complete.
    pub completed: Option<Cookie>,
    /// Transfers discarded without completing, in queue order.
    pub cancelled: Vec<Cookie>,
}

/// A copy of a channel's bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSnapshot {
    pub status: ChannelStatus,
    pub active: Option<Cookie>,
    pub issued: Vec<Cookie>,
    pub submitted: Vec<Cookie>,
    pub cyclic: bool,
    pub irq_type: IrqType,
    pub scheduled: bool,
    pub paused: bool,
    pub last_cookie: Cookie,
    pub completed_cookie: Cookie,
}

/// A DMA channel
///
/// Get a `Channel` from [`Dma::channel`]. A channel prepares transfers
/// into [`Descriptor`]s, queues them, and reports their progress.
///
/// All state lives in the [`Dma`]; a `Channel` is only an index and a
/// reference, so it's cheap to copy and share.
pub struct Channel<'a, H, const CHANNELS: usize> {
    /// Our channel number, expected to be between [0, CHANNELS)
    index: usize,
    pub(crate) dma: &'a Dma<H, CHANNELS>,
}

impl<H, const CHANNELS: usize> Clone for Channel<'_, H, CHANNELS> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<H, const CHANNELS: usize> Copy for Channel<'_, H, CHANNELS> {}

impl<'a, H: Hardware, const CHANNELS: usize> Channel<'a, H, CHANNELS> {
    pub(crate) fn new(dma: &'a Dma<H, CHANNELS>, index: usize) -> Self {
        Self { index, dma }
    }

    /// Returns the DMA channel number
    ///
    /// Channels are unique and numbered within the half-open range `[0, CHANNELS)`.
    pub fn channel(&self) -> usize {
        self.index
    }

    pub(crate) fn lock(&self) -> spin::MutexGuard<'a, State> {
        self.dma.state(self.index).lock()
    }

    /// Set the device configuration used by transfers prepared from now on.
    pub fn configure(&self, config: SlaveConfig) {
        self.lock().config = config;
    }

    /// The current device configuration.
    pub fn configuration(&self) -> SlaveConfig {
        self.lock().config
    }

    /// Queue a prepared transfer, returning its cookie.
    ///
    /// The transfer doesn't start until [`issue_pending`](Self::issue_pending).
    /// Returns [`Error::InvalidArgument`] if another channel prepared `desc`.
    pub fn submit(&self, mut desc: Descriptor) -> Result<Cookie> {
        if desc.channel != self.index {
            return Err(Error::InvalidArgument);
        }
        let mut state = self.lock();
        let cookie = state.last_cookie.following();
        state.last_cookie = cookie;
        desc.cookie = Some(cookie);
        if desc.is_cyclic() {
            state.cyclic = true;
        }
        log::debug!(
            "chan {}: submit cookie {} ({} bytes, {} llis)",
            self.index,
            cookie,
            desc.len(),
            desc.chain.len()
        );
        state.submitted.push_back(desc);
        Ok(cookie)
    }

    /// Make every submitted transfer eligible to start, in submission order.
    ///
    /// If nothing is running, a cyclic channel starts right away. Other
    /// channels join the engine's pending list and start on the next
    /// [`Dma::drain_pending`].
    pub fn issue_pending(&self) {
        let mut state = self.lock();
        let submitted = core::mem::take(&mut state.submitted);
        state.issued.extend(submitted);
        if state.issued.is_empty() || state.active.is_some() {
            return;
        }
        if state.cyclic {
            self.dma.start_next(self.index, &mut state);
        } else {
            self.dma.schedule(self.index, &mut state);
        }
    }

    /// Stop the channel and drop its work.
    ///
    /// Queued transfers are cancelled. A running cyclic transfer becomes
    /// complete; any other running transfer is cancelled. The controller is
    /// paused, stopped, then resumed.
    pub fn terminate(&self) -> Terminated {
        let mut report = Terminated::default();
        let mut dropped = Vec::new();

        let mut state = self.lock();
        if state.scheduled {
            self.dma.unschedule(self.index, &mut state);
        }

        let hardware = self.dma.hardware();
        hardware.pause(self.index);
        hardware.disable(self.index);
        hardware.resume(self.index);

        if let Some(desc) = state.active.take() {
            let cookie = desc.cookie_or_none();
            if desc.is_cyclic() {
                state.complete(cookie);
                report.completed = Some(cookie);
            } else {
                report.cancelled.push(cookie);
            }
            dropped.push(desc);
        }
        state.cyclic = false;
        state.paused = false;
        state.irq_type = IrqType::empty();

        let issued = core::mem::take(&mut state.issued);
        let submitted = core::mem::take(&mut state.submitted);
        for desc in issued.into_iter().chain(submitted) {
            report.cancelled.push(desc.cookie_or_none());
            dropped.push(desc);
        }
        drop(state);

        log::debug!(
            "chan {}: terminated, completed {:?}, cancelled {:?}",
            self.index,
            report.completed,
            report.cancelled
        );
        // LLIs go back to the pool outside of the channel lock.
        drop(dropped);
        report
    }

    /// Pause the running transfer.
    pub fn pause(&self) {
        let mut state = self.lock();
        self.dma.hardware().pause(self.index);
        state.paused = true;
    }

    /// Resume a paused transfer.
    pub fn resume(&self) {
        let mut state = self.lock();
        self.dma.hardware().resume(self.index);
        state.paused = false;
    }

    /// Report the status of the transfer identified by `cookie`.
    ///
    /// The residue of a running transfer comes from the controller's live
    /// position. Queued transfers report their full length. Complete and
    /// unknown transfers report zero.
    pub fn query_progress(&self, cookie: Cookie) -> Progress {
        let state = self.lock();
        if cookie.is_complete(state.completed_cookie, state.last_cookie) {
            return Progress {
                status: Status::Complete,
                residue: 0,
            };
        }

        if let Some(desc) = state.find_queued(cookie) {
            return Progress {
                status: Status::InProgress,
                residue: desc.len(),
            };
        }

        match &state.active {
            Some(desc) if desc.cookie == Some(cookie) => {
                let hardware = self.dma.hardware();
                let position = hardware.current_descriptor(self.index);
                let left = hardware.bytes_left(self.index);
                Progress {
                    status: if state.paused {
                        Status::Paused
                    } else {
                        Status::InProgress
                    },
                    residue: desc.chain.residue(position, left),
                }
            }
            _ => Progress {
                status: Status::InProgress,
                residue: 0,
            },
        }
    }

    /// Drop every transfer that hasn't started.
    ///
    /// The channel leaves the pending list, and it's only cyclic again if a
    /// cyclic transfer is still running.
    pub fn free_resources(&self) {
        let mut state = self.lock();
        let issued = core::mem::take(&mut state.issued);
        let submitted = core::mem::take(&mut state.submitted);
        if state.scheduled {
            self.dma.unschedule(self.index, &mut state);
        }
        state.cyclic = state.active_is_cyclic();
        drop(state);
        log::debug!(
            "chan {}: freed {} queued descriptors",
            self.index,
            issued.len() + submitted.len()
        );
    }

    /// Where the channel is in its lifecycle.
    pub fn status(&self) -> ChannelStatus {
        self.lock().status()
    }

    /// Copy the channel's bookkeeping.
    pub fn snapshot(&self) -> ChannelSnapshot {
        let state = self.lock();
        let cookies = |queue: &VecDeque<Descriptor>| -> Vec<Cookie> {
            queue.iter().map(Descriptor::cookie_or_none).collect()
        };
        ChannelSnapshot {
            status: state.status(),
            active: state.active.as_ref().and_then(Descriptor::cookie),
            issued: cookies(&state.issued),
            submitted: cookies(&state.submitted),
            cyclic: state.cyclic,
            irq_type: state.irq_type,
            scheduled: state.scheduled,
            paused: state.paused,
            last_cookie: state.last_cookie,
            completed_cookie: state.completed_cookie,
        }
    }
}
