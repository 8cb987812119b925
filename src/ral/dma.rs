//! DMA register blocks and fields

use super::{RORegister, RWRegister};

/// DMA controller registers.
#[repr(C)]
pub struct RegisterBlock {
    /// Interrupt enable, channels 0..8 then 8..16
    pub IRQ_EN: [RWRegister<u32>; 2],
    _reserved0: [u32; 2],
    /// Interrupt status, write 1 to clear
    pub IRQ_STAT: [RWRegister<u32>; 2],
    _reserved1: [u32; 6],
    /// Channel busy status, one bit per channel
    pub STAT: RORegister<u32>,
    _reserved2: [u32; 51],
    /// Per-channel registers
    pub CHANNEL: [channel::RegisterBlock; 16],
}

const _: () = assert!(core::mem::offset_of!(RegisterBlock, IRQ_STAT) == 0x10);
const _: () = assert!(core::mem::offset_of!(RegisterBlock, STAT) == 0x30);
const _: () = assert!(core::mem::offset_of!(RegisterBlock, CHANNEL) == 0x100);

/// One channel's registers.
pub mod channel {
    use super::{RORegister, RWRegister};

    #[repr(C)]
    pub struct RegisterBlock {
        /// Channel enable
        pub EN: RWRegister<u32>,
        /// Channel pause
        pub PAUSE: RWRegister<u32>,
        /// Address of the first LLI to load
        pub DESC_ADDR: RWRegister<u32>,
        /// Configuration of the LLI in flight
        pub CFG: RORegister<u32>,
        /// Current source address
        pub CUR_SRC: RORegister<u32>,
        /// Current destination address
        pub CUR_DST: RORegister<u32>,
        /// Bytes left in the LLI in flight
        pub BCNT_LEFT: RORegister<u32>,
        /// Parameter of the LLI in flight
        pub PARA: RORegister<u32>,
        _reserved0: [u32; 2],
        /// Operation mode
        pub MODE: RWRegister<u32>,
        _reserved1: [u32; 5],
    }

    const _: () = assert!(core::mem::size_of::<RegisterBlock>() == 0x40);
    const _: () = assert!(core::mem::offset_of!(RegisterBlock, BCNT_LEFT) == 0x18);
    const _: () = assert!(core::mem::offset_of!(RegisterBlock, MODE) == 0x28);

    pub mod EN {
        pub mod EN {
            pub const offset: u32 = 0;
            pub const mask: u32 = 1 << offset;
            pub mod R {}
            pub mod W {}
            pub mod RW {}
        }
    }

    pub mod PAUSE {
        pub mod PAUSE {
            pub const offset: u32 = 0;
            pub const mask: u32 = 1 << offset;
            pub mod R {}
            pub mod W {}
            pub mod RW {}
        }
    }

    pub mod MODE {
        /// Source handshake mode
        pub mod SRC_HS {
            pub const offset: u32 = 2;
            pub const mask: u32 = 1 << offset;
            pub mod R {}
            pub mod W {}
            pub mod RW {}
        }
        /// Destination handshake mode
        pub mod DST_HS {
            pub const offset: u32 = 3;
            pub const mask: u32 = 1 << offset;
            pub mod R {}
            pub mod W {}
            pub mod RW {}
        }
    }
}
