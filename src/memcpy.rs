//! Memory-to-memory transfers.

use crate::channel::Channel;
use crate::descriptor::{Descriptor, DescriptorFlags};
use crate::lli::{cfg, check_span, Chain, Lli};
use crate::{BusAddr, Error, Hardware, Result};

/// A contiguous region of bus memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub address: BusAddr,
    pub len: usize,
}

impl Segment {
    pub const fn new(address: BusAddr, len: usize) -> Self {
        Self { address, len }
    }
}

impl<H: Hardware, const CHANNELS: usize> Channel<'_, H, CHANNELS> {
    /// Prepare a copy of `len` bytes from `src` to `dst`.
    ///
    /// The transfer is a single LLI. Returns [`Error::InvalidArgument`] if
    /// `len` is zero, or if either range runs past the bus.
    pub fn prep_memcpy(
        &self,
        dst: BusAddr,
        src: BusAddr,
        len: usize,
        flags: DescriptorFlags,
    ) -> Result<Descriptor> {
        log::debug!(
            "chan {}: memcpy dst {dst:#x} src {src:#x} len {len:#x} flags {flags:?}",
            self.channel()
        );
        if len == 0 {
            log::debug!("chan {}: memcpy length is zero", self.channel());
            return Err(Error::InvalidArgument);
        }

        check_span(src, len)?;
        check_span(dst, len)?;
        let config = self.configuration();
        let lli = Lli::new(src, dst, len, &config)?.with(
            cfg::src_drq(cfg::DRQ_SDRAM) | cfg::dst_drq(cfg::DRQ_SDRAM),
        );
        let mut chain = Chain::new(self.dma.shared_pool());
        chain.push(lli)?;
        Ok(Descriptor::new(self.channel(), chain, flags))
    }

    /// Prepare a scatter-gather copy, pairing `src[i]` with `dst[i]`.
    ///
    /// Each pair becomes one LLI, moving `dst[i].len` bytes. The channel's
    /// request lines select who paces the copy. Returns
    /// [`Error::InvalidArgument`] if the lists are empty or differ in length.
    pub fn prep_sg(
        &self,
        dst: &[Segment],
        src: &[Segment],
        flags: DescriptorFlags,
    ) -> Result<Descriptor> {
        log::debug!(
            "chan {}: sg {} segments flags {flags:?}",
            self.channel(),
            dst.len()
        );
        if dst.len() != src.len() || dst.is_empty() {
            return Err(Error::InvalidArgument);
        }

        let config = self.configuration();
        let mode = cfg::src_drq(config.src_drq.into()) | cfg::dst_drq(config.dst_drq.into());
        let mut chain = Chain::new(self.dma.shared_pool());
        for (d, s) in dst.iter().zip(src) {
            check_span(s.address, d.len)?;
            check_span(d.address, d.len)?;
            chain.push(Lli::new(s.address, d.address, d.len, &config)?.with(mode))?;
        }
        Ok(Descriptor::new(self.channel(), chain, flags))
    }
}
