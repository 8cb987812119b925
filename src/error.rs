//! DMA errors

use core::fmt;

/// Errors reported while preparing or scheduling transfers.
///
/// Every error is local to the call that produced it. The driver doesn't
/// retry; callers may fix the request and prepare it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The request can't be described by the controller.
    ///
    /// Zero-length transfers, mismatched scatter-gather lists, empty
    /// segment lists, out-of-table burst sizes and bus widths, and addresses
    /// outside of the bus range all land here.
    InvalidArgument,
    /// The descriptor pool ran out of linked-list items.
    ///
    /// Any items already allocated for the request were returned to the pool.
    ResourceExhausted,
    /// The channel can't accept the request in its current state.
    ///
    /// Returned when preparing a cyclic transfer while another cyclic transfer
    /// is running on the same channel.
    InvalidState,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidArgument => f.write_str("invalid DMA transfer argument"),
            Error::ResourceExhausted => f.write_str("DMA descriptor pool exhausted"),
            Error::InvalidState => f.write_str("DMA channel already runs a cyclic transfer"),
        }
    }
}

impl core::error::Error for Error {}
