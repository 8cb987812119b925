//! Completion interrupts.

use crate::descriptor::Callback;
use crate::{Dma, Hardware, MAX_CHANNELS};

bitflags::bitflags! {
    /// Interrupt classes of one channel.
    ///
    /// Each channel owns a 4-bit field of an interrupt word.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct IrqType: u32 {
        /// Half of an LLI moved.
        const HALF = 0x01;
        /// One LLI ("package") moved. Armed for cyclic transfers.
        const PACKAGE = 0x02;
        /// The whole chain moved. Armed for one-shot transfers.
        const QUEUE = 0x04;
    }
}

/// Channels per interrupt word.
pub const CHANNELS_PER_WORD: usize = 8;

const FIELD_BITS: usize = 4;
const FIELD_MASK: u32 = 0xF;

/// Position of `channel`'s field: interrupt word, and bit shift in that word.
pub const fn field(channel: usize) -> (usize, u32) {
    (
        channel / CHANNELS_PER_WORD,
        ((channel % CHANNELS_PER_WORD) * FIELD_BITS) as u32,
    )
}

/// Which channels raised which interrupt classes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InterruptStatus {
    words: [u32; MAX_CHANNELS / CHANNELS_PER_WORD],
}

impl InterruptStatus {
    /// No channel is signaling.
    pub const fn new() -> Self {
        Self { words: [0; 2] }
    }

    /// Wrap the raw status words for channels 0..8 (`low`) and 8..16 (`high`).
    pub const fn from_raw(low: u32, high: u32) -> Self {
        Self { words: [low, high] }
    }

    /// Add `irq` for `channel`.
    ///
    /// Channels past [`MAX_CHANNELS`] have no field, and are ignored.
    pub fn with(mut self, channel: usize, irq: IrqType) -> Self {
        let (word, shift) = field(channel);
        if let Some(bits) = self.words.get_mut(word) {
            *bits |= (irq.bits() & FIELD_MASK) << shift;
        }
        self
    }

    /// The classes `channel` raised.
    pub fn channel(&self, channel: usize) -> IrqType {
        let (word, shift) = field(channel);
        self.words
            .get(word)
            .map_or(IrqType::empty(), |&bits| {
                IrqType::from_bits_truncate((bits >> shift) & FIELD_MASK)
            })
    }

    /// The raw status words.
    pub fn raw(&self) -> (u32, u32) {
        (self.words[0], self.words[1])
    }

    /// `true` if no channel is signaling.
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&word| word == 0)
    }
}

enum Retired {
    /// A cyclic period ended; the transfer keeps running.
    Period(Option<Callback>),
    /// A one-shot transfer completed. Its LLIs go back to the pool when
    /// this drops.
    Complete(crate::Descriptor),
}

impl<H: Hardware, const CHANNELS: usize> Dma<H, CHANNELS> {
    /// Handle a completion interrupt.
    ///
    /// For every channel whose armed interrupt class is in `status`, and
    /// which has a running transfer:
    ///
    /// - a cyclic transfer runs its callback and keeps running.
    /// - a one-shot transfer completes, and the channel's next issued
    ///   transfer starts right away. The completed transfer's callback runs
    ///   if it was prepared with [`DescriptorFlags::INTERRUPT`](crate::DescriptorFlags::INTERRUPT).
    ///
    /// Other channels are ignored; a late interrupt for a terminated channel
    /// is harmless. Callbacks run without any channel lock held.
    pub fn handle_interrupt(&self, status: InterruptStatus) {
        let (low, high) = status.raw();
        log::debug!("irq status low {low:#010x} high {high:#010x}");

        for index in 0..CHANNELS {
            let raised = status.channel(index);
            if raised.is_empty() {
                continue;
            }

            let mut state = self.state(index).lock();
            if !state.irq_type.intersects(raised) {
                log::trace!("chan {index}: ignoring irq {raised:?}, armed {:?}", state.irq_type);
                continue;
            }
            let Some(active) = state.active.as_ref() else {
                log::trace!("chan {index}: ignoring irq {raised:?}, nothing active");
                continue;
            };

            let retired = if active.is_cyclic() {
                Retired::Period(active.callback.clone())
            } else {
                let Some(desc) = state.active.take() else {
                    continue;
                };
                let cookie = desc.cookie_or_none();
                state.complete(cookie);
                log::trace!("chan {index}: cookie {cookie} complete");
                self.start_next(index, &mut state);
                Retired::Complete(desc)
            };
            drop(state);

            match retired {
                Retired::Period(Some(callback)) => callback(),
                Retired::Period(None) => {}
                Retired::Complete(desc) => {
                    if let Some(callback) = desc.completion_callback() {
                        callback();
                    }
                }
            }
        }
    }
}
