//! Memory-mapped controller.

use crate::hardware::Hardware;
use crate::interrupt::{self, InterruptStatus, IrqType};
use crate::ral::{self, dma::RegisterBlock, Static};

use spin::Mutex;

/// The memory-mapped DMA controller.
pub struct Mmio {
    registers: Static<RegisterBlock>,
    /// Serializes read-modify-write of the shared interrupt enable words.
    irq_en: Mutex<()>,
}

// Safety: the controller is a static peripheral. Channel registers are only
// written for the channel being driven, and the shared interrupt enable words
// are written under `irq_en`.
unsafe impl Send for Mmio {}
// Safety: see above.
unsafe impl Sync for Mmio {}

impl Mmio {
    /// Create a controller handle from the register block's base address.
    ///
    /// # Safety
    ///
    /// `base` must point to the DMA controller's registers. The handle may
    /// alias global, mutable state. Create one `Mmio` per controller.
    pub const unsafe fn new(base: *const ()) -> Self {
        Self {
            registers: Static(base.cast()),
            irq_en: Mutex::new(()),
        }
    }

    fn channel(&self, channel: usize) -> &ral::dma::channel::RegisterBlock {
        &self.registers.CHANNEL[channel]
    }

    /// Read and clear the interrupt status.
    ///
    /// Call this from the DMA interrupt handler, and pass the result to
    /// [`Dma::handle_interrupt`](crate::Dma::handle_interrupt).
    pub fn take_interrupt_status(&self) -> InterruptStatus {
        let low = self.registers.IRQ_STAT[0].read();
        let high = self.registers.IRQ_STAT[1].read();
        // Write 1 to clear.
        self.registers.IRQ_STAT[0].write(low);
        self.registers.IRQ_STAT[1].write(high);
        InterruptStatus::from_raw(low, high)
    }
}

impl Hardware for Mmio {
    fn set_descriptor_address(&self, channel: usize, link: u32) {
        let regs = self.channel(channel);
        ral::write_reg!(ral::dma::channel, regs, DESC_ADDR, link);
    }

    fn enable(&self, channel: usize) {
        let regs = self.channel(channel);
        ral::write_reg!(ral::dma::channel, regs, EN, EN: 1);
    }

    fn disable(&self, channel: usize) {
        let regs = self.channel(channel);
        ral::write_reg!(ral::dma::channel, regs, EN, EN: 0);
    }

    fn pause(&self, channel: usize) {
        let regs = self.channel(channel);
        ral::write_reg!(ral::dma::channel, regs, PAUSE, PAUSE: 1);
    }

    fn resume(&self, channel: usize) {
        let regs = self.channel(channel);
        ral::write_reg!(ral::dma::channel, regs, PAUSE, PAUSE: 0);
    }

    fn is_busy(&self, channel: usize) -> bool {
        self.registers.STAT.read() & (1 << channel) != 0
    }

    fn current_descriptor(&self, channel: usize) -> u32 {
        let regs = self.channel(channel);
        ral::read_reg!(ral::dma::channel, regs, DESC_ADDR)
    }

    fn bytes_left(&self, channel: usize) -> u32 {
        let regs = self.channel(channel);
        ral::read_reg!(ral::dma::channel, regs, BCNT_LEFT)
    }

    fn enable_interrupt(&self, channel: usize, irq: IrqType) {
        let (word, shift) = interrupt::field(channel);
        let reg = &self.registers.IRQ_EN[word];
        let _guard = self.irq_en.lock();
        let armed = (reg.read() & !(0xF << shift)) | (irq.bits() << shift);
        reg.write(armed);
    }

    fn set_handshake_mode(&self, channel: usize) {
        let regs = self.channel(channel);
        ral::modify_reg!(ral::dma::channel, regs, MODE, SRC_HS: 1, DST_HS: 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::boxed::Box;

    fn controller() -> (Box<RegisterBlock>, Mmio) {
        // Safety: every register is a plain u32; all zeros is valid.
        let block = Box::new(unsafe { core::mem::zeroed::<RegisterBlock>() });
        let ptr: *const RegisterBlock = &*block;
        // Safety: the box outlives the handle in every test.
        let mmio = unsafe { Mmio::new(ptr.cast()) };
        (block, mmio)
    }

    #[test]
    fn channel_enable_and_descriptor() {
        let (block, mmio) = controller();
        mmio.set_descriptor_address(3, 0x4300_0040);
        mmio.enable(3);
        assert_eq!(block.CHANNEL[3].DESC_ADDR.read(), 0x4300_0040);
        assert_eq!(mmio.current_descriptor(3), 0x4300_0040);
        assert_eq!(block.CHANNEL[3].EN.read(), 1);
        assert_eq!(block.CHANNEL[2].EN.read(), 0);

        mmio.pause(3);
        assert_eq!(block.CHANNEL[3].PAUSE.read(), 1);
        mmio.resume(3);
        mmio.disable(3);
        assert_eq!(block.CHANNEL[3].PAUSE.read(), 0);
        assert_eq!(block.CHANNEL[3].EN.read(), 0);
    }

    #[test]
    fn interrupt_fields_per_channel() {
        let (block, mmio) = controller();
        mmio.enable_interrupt(1, IrqType::QUEUE);
        mmio.enable_interrupt(9, IrqType::PACKAGE);
        assert_eq!(block.IRQ_EN[0].read(), 0x40);
        assert_eq!(block.IRQ_EN[1].read(), 0x20);

        // Re-arming replaces the channel's classes, leaving its neighbors.
        mmio.enable_interrupt(0, IrqType::HALF);
        mmio.enable_interrupt(1, IrqType::PACKAGE);
        assert_eq!(block.IRQ_EN[0].read(), 0x21);
    }

    #[test]
    fn handshake_sets_both_sides() {
        let (block, mmio) = controller();
        mmio.set_handshake_mode(5);
        assert_eq!(block.CHANNEL[5].MODE.read(), 0b1100);
    }
}
