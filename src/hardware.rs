//! The register-level capability the engine drives.

use crate::interrupt::IrqType;

/// Logical register operations for one DMA controller.
///
/// The engine never touches memory-mapped registers directly. [`Mmio`](crate::Mmio)
/// implements this trait for the real controller; tests use a simulated
/// controller. Methods take `&self`, and they may be called concurrently for
/// different channels.
pub trait Hardware {
    /// Program the hardware link of the first LLI to load.
    fn set_descriptor_address(&self, channel: usize, link: u32);

    /// Start the channel.
    fn enable(&self, channel: usize);

    /// Stop the channel.
    fn disable(&self, channel: usize);

    /// Freeze the channel without losing its position.
    fn pause(&self, channel: usize);

    /// Continue a paused channel.
    fn resume(&self, channel: usize);

    /// `true` while the channel is still moving data.
    fn is_busy(&self, channel: usize) -> bool;

    /// The hardware link of the LLI the channel loads next.
    fn current_descriptor(&self, channel: usize) -> u32;

    /// Bytes left in the LLI in flight.
    fn bytes_left(&self, channel: usize) -> u32;

    /// Arm `irq` for this channel, disarming the other classes.
    fn enable_interrupt(&self, channel: usize, irq: IrqType);

    /// Let both sides use the handshake protocol when requesting service.
    ///
    /// Controllers without an operation mode register ignore this.
    fn set_handshake_mode(&self, _channel: usize) {}
}
