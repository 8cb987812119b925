//! A simulated controller for tests.

use std::sync::Mutex;
use std::vec::Vec;

use crate::channel::Channel;
use crate::interrupt::IrqType;
use crate::{Descriptor, DescriptorFlags, Dma, Hardware, LliPool, MAX_CHANNELS};

/// Base of the LLI pool in simulated bus memory.
pub(crate) const POOL_BASE: u64 = 0x4300_0000;

/// One simulated channel's registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SimChannel {
    pub(crate) enabled: bool,
    pub(crate) paused: bool,
    pub(crate) busy: bool,
    pub(crate) descriptor: u32,
    pub(crate) bytes_left: u32,
    pub(crate) irq: IrqType,
    pub(crate) handshake: bool,
}

impl SimChannel {
    const fn new() -> Self {
        Self {
            enabled: false,
            paused: false,
            busy: false,
            descriptor: 0,
            bytes_left: 0,
            irq: IrqType::empty(),
            handshake: false,
        }
    }
}

struct Registers {
    channels: [SimChannel; MAX_CHANNELS],
    /// (channel, descriptor) for every enable.
    starts: Vec<(usize, u32)>,
}

/// Records what the engine asked of the controller.
pub(crate) struct Sim {
    registers: Mutex<Registers>,
}

impl Sim {
    pub(crate) fn new() -> Self {
        Self {
            registers: Mutex::new(Registers {
                channels: [SimChannel::new(); MAX_CHANNELS],
                starts: Vec::new(),
            }),
        }
    }

    fn with<R>(&self, channel: usize, f: impl FnOnce(&mut SimChannel) -> R) -> R {
        f(&mut self.registers.lock().unwrap().channels[channel])
    }

    /// How many times `channel` was enabled.
    pub(crate) fn starts(&self, channel: usize) -> usize {
        self.registers
            .lock()
            .unwrap()
            .starts
            .iter()
            .filter(|&&(ch, _)| ch == channel)
            .count()
    }

    pub(crate) fn starts_log(&self) -> Vec<(usize, u32)> {
        self.registers.lock().unwrap().starts.clone()
    }

    pub(crate) fn channel(&self, channel: usize) -> SimChannel {
        self.with(channel, |regs| *regs)
    }

    /// Move the channel to the LLI linked by `position`, with `left` bytes
    /// remaining in the item in flight.
    pub(crate) fn set_position(&self, channel: usize, position: u32, left: u32) {
        self.with(channel, |regs| {
            regs.descriptor = position;
            regs.bytes_left = left;
        });
    }
}

impl Hardware for Sim {
    fn set_descriptor_address(&self, channel: usize, link: u32) {
        self.with(channel, |regs| regs.descriptor = link);
    }

    fn enable(&self, channel: usize) {
        let mut registers = self.registers.lock().unwrap();
        let regs = &mut registers.channels[channel];
        regs.enabled = true;
        let descriptor = regs.descriptor;
        registers.starts.push((channel, descriptor));
    }

    fn disable(&self, channel: usize) {
        self.with(channel, |regs| {
            regs.enabled = false;
            regs.busy = false;
        });
    }

    fn pause(&self, channel: usize) {
        self.with(channel, |regs| regs.paused = true);
    }

    fn resume(&self, channel: usize) {
        self.with(channel, |regs| regs.paused = false);
    }

    fn is_busy(&self, channel: usize) -> bool {
        self.with(channel, |regs| regs.busy)
    }

    fn current_descriptor(&self, channel: usize) -> u32 {
        self.with(channel, |regs| regs.descriptor)
    }

    fn bytes_left(&self, channel: usize) -> u32 {
        self.with(channel, |regs| regs.bytes_left)
    }

    fn enable_interrupt(&self, channel: usize, irq: IrqType) {
        self.with(channel, |regs| regs.irq = irq);
    }

    fn set_handshake_mode(&self, channel: usize) {
        self.with(channel, |regs| regs.handshake = true);
    }
}

/// An engine over the simulated controller, with `capacity` LLIs.
pub(crate) fn dma<const CHANNELS: usize>(capacity: usize) -> Dma<Sim, CHANNELS> {
    let pool = LliPool::new(POOL_BASE, capacity).unwrap();
    Dma::new(Sim::new(), pool)
}

/// A one-LLI copy of `len` bytes, with [`DescriptorFlags::INTERRUPT`].
pub(crate) fn memcpy<const CHANNELS: usize>(
    chan: &Channel<'_, Sim, CHANNELS>,
    len: usize,
) -> Descriptor {
    chan.prep_memcpy(0x4000_0000, 0x5000_0000, len, DescriptorFlags::INTERRUPT)
        .unwrap()
}
