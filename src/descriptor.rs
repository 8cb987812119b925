//! Transfer descriptors and cookies.

use alloc::sync::Arc;
use core::fmt;

use crate::lli::Chain;

/// Identifies a submitted transfer on its channel.
///
/// Cookies increase monotonically per channel, wrapping back to
/// [`Cookie::MIN`] after `u32::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cookie(u32);

impl Cookie {
    /// The smallest cookie handed to a transfer.
    pub const MIN: Cookie = Cookie(1);
    /// Channel cookie state before anything was submitted.
    pub(crate) const NONE: Cookie = Cookie(0);

    /// The raw cookie value.
    pub const fn get(self) -> u32 {
        self.0
    }

    pub(crate) fn following(self) -> Cookie {
        match self.0.wrapping_add(1) {
            0 => Cookie::MIN,
            next => Cookie(next),
        }
    }

    /// `true` if this cookie is done, given the channel's last completed and
    /// last assigned cookies. Handles wrap-around.
    pub(crate) fn is_complete(self, last_complete: Cookie, last_used: Cookie) -> bool {
        if last_complete <= last_used {
            self <= last_complete || self > last_used
        } else {
            self <= last_complete && self > last_used
        }
    }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

bitflags::bitflags! {
    /// Transfer preparation flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DescriptorFlags: u32 {
        /// Run the completion callback when the transfer completes.
        const INTERRUPT = 1 << 0;
    }
}

/// A completion callback.
///
/// Capture whatever context the callback needs. Callbacks run without any
/// channel lock held, so they may prepare, submit, and issue transfers.
pub type Callback = Arc<dyn Fn() + Send + Sync>;

/// One logical transfer: a chain of LLIs, plus what to do when it completes.
///
/// Prepare descriptors with the [`Channel`](crate::channel::Channel)
/// `prep_*` methods, then hand them back with
/// [`submit`](crate::channel::Channel::submit). Dropping a descriptor
/// releases its LLIs.
pub struct Descriptor {
    pub(crate) channel: usize,
    pub(crate) cookie: Option<Cookie>,
    pub(crate) chain: Chain,
    pub(crate) flags: DescriptorFlags,
    pub(crate) callback: Option<Callback>,
}

impl Descriptor {
    pub(crate) fn new(channel: usize, chain: Chain, flags: DescriptorFlags) -> Self {
        Self {
            channel,
            cookie: None,
            chain,
            flags,
            callback: None,
        }
    }

    /// Set the completion callback.
    ///
    /// For cyclic transfers the callback runs once per period, regardless of
    /// [`DescriptorFlags::INTERRUPT`].
    pub fn set_callback<F>(&mut self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.callback = Some(Arc::new(callback));
    }

    /// The channel that prepared this descriptor.
    pub fn channel(&self) -> usize {
        self.channel
    }

    /// The cookie, once submitted.
    pub fn cookie(&self) -> Option<Cookie> {
        self.cookie
    }

    /// Preparation flags.
    pub fn flags(&self) -> DescriptorFlags {
        self.flags
    }

    /// The LLI chain.
    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    /// Total bytes described by this transfer.
    pub fn len(&self) -> usize {
        self.chain.total_bytes()
    }

    /// `true` if the transfer moves no bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `true` for a ring of periods.
    pub fn is_cyclic(&self) -> bool {
        self.chain.is_cyclic()
    }

    pub(crate) fn cookie_or_none(&self) -> Cookie {
        self.cookie.unwrap_or(Cookie::NONE)
    }

    /// Completion callback, if one should run when this one-shot transfer retires.
    pub(crate) fn completion_callback(&self) -> Option<Callback> {
        self.flags
            .contains(DescriptorFlags::INTERRUPT)
            .then(|| self.callback.clone())
            .flatten()
    }
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("channel", &self.channel)
            .field("cookie", &self.cookie)
            .field("chain", &self.chain)
            .field("flags", &self.flags)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}
