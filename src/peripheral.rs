//! Device transfers.
//!
//! One side of a device transfer is a fixed device register (I/O addressing);
//! the other side walks through memory (linear addressing). The channel's
//! [`SlaveConfig`] names the device address and request line.

use crate::channel::config::{Direction, SlaveConfig};
use crate::channel::Channel;
use crate::descriptor::{Descriptor, DescriptorFlags};
use crate::lli::{cfg, check_span, Chain, Lli};
use crate::memcpy::Segment;
use crate::{BusAddr, Error, Hardware, Result};

/// Build one LLI moving `len` bytes between `memory` and the device.
fn device_lli(
    memory: BusAddr,
    len: usize,
    direction: Direction,
    config: &SlaveConfig,
) -> Result<Lli> {
    if direction != Direction::DevToDev {
        check_span(memory, len)?;
    }
    let lli = match direction {
        Direction::MemToDev => Lli::new(memory, config.dst_addr, len, config)?.with(
            cfg::DST_IO_MODE
                | cfg::src_drq(cfg::DRQ_SDRAM)
                | cfg::dst_drq(config.dst_drq.into()),
        ),
        Direction::DevToMem => Lli::new(config.src_addr, memory, len, config)?.with(
            cfg::SRC_IO_MODE
                | cfg::dst_drq(cfg::DRQ_SDRAM)
                | cfg::src_drq(config.src_drq.into()),
        ),
        Direction::DevToDev => Lli::new(config.src_addr, config.dst_addr, len, config)?.with(
            cfg::SRC_IO_MODE
                | cfg::DST_IO_MODE
                | cfg::src_drq(config.src_drq.into())
                | cfg::dst_drq(config.dst_drq.into()),
        ),
    };
    Ok(lli)
}

impl<H: Hardware, const CHANNELS: usize> Channel<'_, H, CHANNELS> {
    /// Prepare a transfer between the device and a list of memory segments.
    ///
    /// Each segment becomes one LLI. Returns [`Error::InvalidArgument`] if
    /// `segments` is empty, or for [`Direction::DevToDev`].
    pub fn prep_slave_sg(
        &self,
        segments: &[Segment],
        direction: Direction,
        flags: DescriptorFlags,
    ) -> Result<Descriptor> {
        log::debug!(
            "chan {}: slave sg {} segments {direction:?} flags {flags:?}",
            self.channel(),
            segments.len()
        );
        if segments.is_empty() || direction == Direction::DevToDev {
            return Err(Error::InvalidArgument);
        }

        let config = self.configuration();
        let mut chain = Chain::new(self.dma.shared_pool());
        for segment in segments {
            chain.push(device_lli(segment.address, segment.len, direction, &config)?)?;
        }
        Ok(Descriptor::new(self.channel(), chain, flags))
    }

    /// Prepare a cyclic transfer over `buf_len` bytes at `buf`, split into
    /// `period_len`-byte periods.
    ///
    /// There are `buf_len / period_len` periods; a trailing partial period is
    /// left out. The last LLI links back to the first, so the transfer runs
    /// until the channel is terminated, and the callback runs after every
    /// period.
    ///
    /// Returns [`Error::InvalidState`] while a cyclic transfer is running on
    /// this channel, and [`Error::InvalidArgument`] if there isn't at least
    /// one period or a period runs past the bus.
    pub fn prep_cyclic(
        &self,
        buf: BusAddr,
        buf_len: usize,
        period_len: usize,
        direction: Direction,
        flags: DescriptorFlags,
    ) -> Result<Descriptor> {
        log::debug!(
            "chan {}: cyclic buf {buf:#x} len {buf_len:#x} period {period_len:#x} {direction:?}",
            self.channel()
        );
        let config = {
            let state = self.lock();
            if state.active_is_cyclic() {
                return Err(Error::InvalidState);
            }
            state.config
        };
        if period_len == 0 || buf_len < period_len {
            return Err(Error::InvalidArgument);
        }

        let periods = buf_len / period_len;
        let mut chain = Chain::new(self.dma.shared_pool());
        for period in 0..periods {
            let memory = buf
                .checked_add((period * period_len) as BusAddr)
                .ok_or(Error::InvalidArgument)?;
            let mut lli = device_lli(memory, period_len, direction, &config)?;
            if direction == Direction::DevToMem && config.burst_mode {
                lli = lli.with(cfg::BMODE_SEL);
            }
            chain.push(lli)?;
        }
        chain.close_ring();
        Ok(Descriptor::new(self.channel(), chain, flags))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim;

    fn uart_config() -> SlaveConfig {
        SlaveConfig {
            src_addr: 0x0250_0000,
            dst_addr: 0x0250_0004,
            src_drq: 14,
            dst_drq: 15,
            ..SlaveConfig::default()
        }
    }

    #[test]
    fn slave_sg_to_device_uses_fixed_destination() {
        let dma = sim::dma::<2>(8);
        let chan = dma.channel(0);
        chan.configure(uart_config());
        let segments = [Segment::new(0x4000_0000, 64), Segment::new(0x4000_1000, 32)];
        let desc = chan
            .prep_slave_sg(&segments, Direction::MemToDev, DescriptorFlags::empty())
            .unwrap();

        let items: std::vec::Vec<_> = desc.chain().iter().copied().collect();
        assert_eq!(items.len(), 2);
        for (lli, segment) in items.iter().zip(&segments) {
            assert_eq!(lli.src as BusAddr, segment.address);
            assert_eq!(lli.dst, 0x0250_0004);
            assert_eq!(lli.len as usize, segment.len);
            assert_ne!(lli.cfg & cfg::DST_IO_MODE, 0);
            assert_eq!(lli.cfg & cfg::SRC_IO_MODE, 0);
            assert_eq!((lli.cfg >> cfg::DST_DRQ_SHIFT) & cfg::DRQ_MASK, 15);
            assert_eq!(lli.cfg & cfg::DRQ_MASK, cfg::DRQ_SDRAM);
        }
    }

    #[test]
    fn slave_sg_from_device_uses_fixed_source() {
        let dma = sim::dma::<2>(8);
        let chan = dma.channel(1);
        chan.configure(uart_config());
        let segments = [Segment::new(0x4000_0000, 64)];
        let desc = chan
            .prep_slave_sg(&segments, Direction::DevToMem, DescriptorFlags::empty())
            .unwrap();

        let lli = desc.chain().get(0).unwrap();
        assert_eq!(lli.src, 0x0250_0000);
        assert_eq!(lli.dst, 0x4000_0000);
        assert_ne!(lli.cfg & cfg::SRC_IO_MODE, 0);
        assert_eq!(lli.cfg & cfg::DST_IO_MODE, 0);
        assert_eq!(lli.cfg & cfg::DRQ_MASK, 14);
        assert_eq!((lli.cfg >> cfg::DST_DRQ_SHIFT) & cfg::DRQ_MASK, cfg::DRQ_SDRAM);
    }

    #[test]
    fn slave_sg_rejects_empty_and_device_to_device() {
        let dma = sim::dma::<2>(8);
        let chan = dma.channel(0);
        assert_eq!(
            chan.prep_slave_sg(&[], Direction::MemToDev, DescriptorFlags::empty())
                .unwrap_err(),
            Error::InvalidArgument
        );
        assert_eq!(
            chan.prep_slave_sg(
                &[Segment::new(0x1000, 4)],
                Direction::DevToDev,
                DescriptorFlags::empty()
            )
            .unwrap_err(),
            Error::InvalidArgument
        );
    }

    #[test]
    fn cyclic_ring_closes() {
        let dma = sim::dma::<2>(16);
        let chan = dma.channel(0);
        // One period, two periods, and a total that doesn't divide evenly.
        for (buf_len, period_len, periods) in [(256, 256, 1), (512, 256, 2), (1000, 300, 3)] {
            let desc = chan
                .prep_cyclic(0x8000, buf_len, period_len, Direction::MemToDev, DescriptorFlags::empty())
                .unwrap();
            let chain = desc.chain();
            assert!(desc.is_cyclic());
            assert_eq!(chain.len(), periods);
            let last = chain.get(periods - 1).unwrap();
            assert_eq!(last.link, chain.head_address());
            assert_eq!(chain.next(periods - 1), chain.head());
            for (i, lli) in chain.iter().enumerate() {
                assert_eq!(lli.len as usize, period_len);
                assert_eq!(lli.src as BusAddr, 0x8000 + (i * period_len) as BusAddr);
            }
        }
        assert_eq!(dma.pool().available(), 16);
    }

    #[test]
    fn cyclic_rejects_short_buffers() {
        let dma = sim::dma::<2>(16);
        let chan = dma.channel(0);
        for (buf_len, period_len) in [(100, 0), (100, 200), (0, 16)] {
            assert_eq!(
                chan.prep_cyclic(0x8000, buf_len, period_len, Direction::DevToMem, DescriptorFlags::empty())
                    .unwrap_err(),
                Error::InvalidArgument
            );
        }
    }

    #[test]
    fn cyclic_rejects_buffers_past_the_bus() {
        let dma = sim::dma::<2>(16);
        let chan = dma.channel(0);
        chan.configure(uart_config());
        for direction in [Direction::DevToDev, Direction::MemToDev, Direction::DevToMem] {
            assert_eq!(
                chan.prep_cyclic(BusAddr::MAX, 2, 1, direction, DescriptorFlags::empty())
                    .unwrap_err(),
                Error::InvalidArgument,
                "{direction:?}"
            );
        }
        // The last period runs off the bus.
        let edge = crate::lli::MAX_BUS_ADDR - 0x17F;
        assert_eq!(
            chan.prep_cyclic(edge, 0x200, 0x100, Direction::MemToDev, DescriptorFlags::empty())
                .unwrap_err(),
            Error::InvalidArgument
        );
        assert_eq!(dma.pool().available(), 16);
    }

    #[test]
    fn slave_sg_rejects_segments_past_the_bus() {
        let dma = sim::dma::<2>(8);
        let chan = dma.channel(0);
        chan.configure(uart_config());
        let edge = crate::lli::MAX_BUS_ADDR - 0x7;
        assert_eq!(
            chan.prep_slave_sg(&[Segment::new(edge, 16)], Direction::DevToMem, DescriptorFlags::empty())
                .unwrap_err(),
            Error::InvalidArgument
        );
    }

    #[test]
    fn cyclic_rejects_rearming_running_channel() {
        let dma = sim::dma::<2>(16);
        let chan = dma.channel(1);
        let desc = chan
            .prep_cyclic(0x8000, 512, 128, Direction::MemToDev, DescriptorFlags::empty())
            .unwrap();
        chan.submit(desc).unwrap();
        chan.issue_pending();
        let before = chan.snapshot();
        let available = dma.pool().available();

        assert_eq!(
            chan.prep_cyclic(0x9000, 512, 128, Direction::MemToDev, DescriptorFlags::empty())
                .unwrap_err(),
            Error::InvalidState
        );
        assert_eq!(chan.snapshot(), before);
        assert_eq!(dma.pool().available(), available);

        // Allowed again once terminated.
        chan.terminate();
        assert!(chan
            .prep_cyclic(0x9000, 512, 128, Direction::MemToDev, DescriptorFlags::empty())
            .is_ok());
    }

    #[test]
    fn cyclic_burst_mode_on_capture() {
        let dma = sim::dma::<2>(16);
        let chan = dma.channel(0);
        chan.configure(SlaveConfig {
            burst_mode: true,
            ..uart_config()
        });
        let capture = chan
            .prep_cyclic(0x8000, 512, 256, Direction::DevToMem, DescriptorFlags::empty())
            .unwrap();
        assert!(capture.chain().iter().all(|lli| lli.cfg & cfg::BMODE_SEL != 0));
        let playback = chan
            .prep_cyclic(0x8000, 512, 256, Direction::MemToDev, DescriptorFlags::empty())
            .unwrap();
        assert!(playback.chain().iter().all(|lli| lli.cfg & cfg::BMODE_SEL == 0));
    }

    #[test]
    fn cyclic_device_to_device() {
        let dma = sim::dma::<2>(16);
        let chan = dma.channel(0);
        chan.configure(uart_config());
        let desc = chan
            .prep_cyclic(0, 64, 32, Direction::DevToDev, DescriptorFlags::empty())
            .unwrap();
        for lli in desc.chain().iter() {
            assert_eq!(lli.src, 0x0250_0000);
            assert_eq!(lli.dst, 0x0250_0004);
            assert_ne!(lli.cfg & cfg::SRC_IO_MODE, 0);
            assert_ne!(lli.cfg & cfg::DST_IO_MODE, 0);
        }
    }
}
