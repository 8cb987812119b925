//! Cross-channel pending list, and the start path.

use alloc::vec::Vec;
use core::sync::atomic::Ordering;

use crate::channel::State;
use crate::interrupt::IrqType;
use crate::{Dma, Hardware};

impl<H: Hardware, const CHANNELS: usize> Dma<H, CHANNELS> {
    /// `true` if some channel is waiting for [`drain_pending`](Self::drain_pending).
    ///
    /// This is the deferred-work trigger. Poll it, or call `drain_pending`
    /// after every [`issue_pending`](crate::Channel::issue_pending).
    pub fn has_pending_work(&self) -> bool {
        self.work.load(Ordering::Acquire)
    }

    /// Channels waiting to start, in the order they'll start.
    pub fn pending_channels(&self) -> Vec<usize> {
        self.pending.lock().iter().copied().collect()
    }

    /// Start the head transfer of every channel on the pending list.
    ///
    /// The list is taken as a whole before any channel is started. Channels
    /// issued while the drain runs land on a fresh list, and wait for the
    /// next drain.
    pub fn drain_pending(&self) {
        self.work.store(false, Ordering::Release);
        let snapshot = core::mem::take(&mut *self.pending.lock());

        for index in snapshot {
            let mut state = self.state(index).lock();
            // Terminated since the snapshot.
            if !state.scheduled {
                continue;
            }
            state.scheduled = false;
            if state.active.is_none() {
                self.start_next(index, &mut state);
            }
        }
    }

    /// Put a channel on the pending list. Caller holds the channel lock.
    pub(crate) fn schedule(&self, index: usize, state: &mut State) {
        if !state.scheduled {
            state.scheduled = true;
            self.pending.lock().push_back(index);
        }
        self.work.store(true, Ordering::Release);
    }

    /// Take a channel off the pending list. Caller holds the channel lock.
    pub(crate) fn unschedule(&self, index: usize, state: &mut State) {
        self.pending.lock().retain(|&pending| pending != index);
        state.scheduled = false;
    }

    /// Program the next issued transfer, or stop an idle channel.
    ///
    /// Caller holds the channel lock, and nothing is active on the channel.
    pub(crate) fn start_next(&self, index: usize, state: &mut State) {
        debug_assert!(state.active.is_none());
        let hardware = &self.hardware;

        let Some(desc) = state.issued.pop_front() else {
            while hardware.is_busy(index) {
                core::hint::spin_loop();
            }
            hardware.disable(index);
            state.irq_type = IrqType::empty();
            log::trace!("chan {index}: idle");
            return;
        };

        state.irq_type = if desc.is_cyclic() {
            IrqType::PACKAGE
        } else {
            IrqType::QUEUE
        };
        hardware.enable_interrupt(index, state.irq_type);
        hardware.set_handshake_mode(index);

        let head = desc.chain.head_address();
        hardware.set_descriptor_address(index, head);
        hardware.enable(index);
        log::trace!(
            "chan {index}: start cookie {:?} at {head:#010x}, irq {:?}",
            desc.cookie,
            state.irq_type
        );
        state.active = Some(desc);
    }
}
