//! Per-channel device configuration.

use crate::{BusAddr, Error, Result};

/// Width of one bus access.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum BusWidth {
    #[default]
    One,
    Two,
    Four,
}

impl BusWidth {
    /// Convert a width in bytes. Only 1, 2, and 4 are supported.
    pub const fn from_bytes(bytes: u32) -> Result<Self> {
        match bytes {
            1 => Ok(BusWidth::One),
            2 => Ok(BusWidth::Two),
            4 => Ok(BusWidth::Four),
            _ => Err(Error::InvalidArgument),
        }
    }

    /// Configuration word code.
    pub const fn code(self) -> u32 {
        match self {
            BusWidth::One => 0,
            BusWidth::Two => 1,
            BusWidth::Four => 2,
        }
    }
}

/// Accesses per burst.
///
/// The controller has no two-access burst.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Burst {
    #[default]
    One,
    Four,
    Eight,
    Sixteen,
}

impl Burst {
    /// Convert a `maxburst` value. Only 1, 4, 8, and 16 are supported.
    ///
    /// The controller code is one less than the index of the highest set bit,
    /// floored at zero; values that don't map back to themselves are rejected
    /// rather than rounded.
    pub const fn from_maxburst(maxburst: u32) -> Result<Self> {
        match maxburst {
            1 => Ok(Burst::One),
            4 => Ok(Burst::Four),
            8 => Ok(Burst::Eight),
            16 => Ok(Burst::Sixteen),
            _ => Err(Error::InvalidArgument),
        }
    }

    /// Configuration word code.
    pub const fn code(self) -> u32 {
        match self {
            Burst::One => 0,
            Burst::Four => 1,
            Burst::Eight => 2,
            Burst::Sixteen => 3,
        }
    }
}

/// Which side of a device transfer is the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Memory is read, the device is written.
    MemToDev,
    /// The device is read, memory is written.
    DevToMem,
    /// Both sides are devices. Only cyclic transfers support this.
    DevToDev,
}

/// Device-side settings for a channel.
///
/// Memory-to-memory copies use the burst sizes and bus widths, and the
/// request lines for scatter-gather copies. Device transfers use everything.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SlaveConfig {
    /// Device address read by device-to-memory transfers.
    pub src_addr: BusAddr,
    /// Device address written by memory-to-device transfers.
    pub dst_addr: BusAddr,
    pub src_width: BusWidth,
    pub dst_width: BusWidth,
    pub src_burst: Burst,
    pub dst_burst: Burst,
    /// Source request line.
    pub src_drq: u8,
    /// Destination request line.
    pub dst_drq: u8,
    /// Select burst mode for device-to-memory cyclic transfers.
    pub burst_mode: bool,
}

impl SlaveConfig {
    /// Build a configuration from raw widths (bytes) and burst lengths.
    pub fn from_raw(
        src_addr: BusAddr,
        dst_addr: BusAddr,
        (src_width, dst_width): (u32, u32),
        (src_maxburst, dst_maxburst): (u32, u32),
        (src_drq, dst_drq): (u8, u8),
    ) -> Result<Self> {
        Ok(Self {
            src_addr,
            dst_addr,
            src_width: BusWidth::from_bytes(src_width)?,
            dst_width: BusWidth::from_bytes(dst_width)?,
            src_burst: Burst::from_maxburst(src_maxburst)?,
            dst_burst: Burst::from_maxburst(dst_maxburst)?,
            src_drq,
            dst_drq,
            burst_mode: false,
        })
    }
}
