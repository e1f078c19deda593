#![cfg_attr(not(test), no_std)]
#![cfg_attr(docsrs, feature(doc_cfg))]
//! Clock tree model for the AT91/SAMA7 Power Management Controller (PMC)
//!
//! The PMC is a tree of clock nodes: slow and main oscillators, fractional
//! PLLs with chained integer dividers, master clocks, programmable clock
//! outputs and a large set of per-peripheral gates and generic clocks. This
//! crate owns one [`Pmc`] registry per SoC instance. Nodes are registered
//! once at bring-up from a static topology description (see
//! [`sama7g5`] for a complete one) and are then driven by id:
//!
//! ```rust,ignore
//! use at91_pmc::{bus::Mmio, prelude::*, sama7g5, Pmc};
//!
//! let bus = unsafe { Mmio::new() };
//! let mut pmc: Pmc<_, _, { sama7g5::NODE_COUNT }> = Pmc::new(bus, delay);
//!
//! let config = sama7g5::Config::new().main_xtal(24.MHz());
//! sama7g5::register_all(&mut pmc, &config)?;
//! sama7g5::setup(&mut pmc, &config)?;
//!
//! pmc.set_rate(sama7g5::FLEX0_GCLK, 100.MHz())?;
//! pmc.enable(sama7g5::FLEX0_GCLK)?;
//! ```
//!
//! Every operation is synchronous. Operations that wait for the hardware to
//! acknowledge a change (PLL lock, master clock ready, oscillator
//! stabilisation) busy-poll a status bit with no timeout: a clock that never
//! becomes ready is a hardware fault and hangs visibly. Callers that need a
//! bounded wait must arrange a watchdog around the call.

#[macro_use]
mod macros;

pub mod bus;
pub mod id;
pub mod mux;
pub mod node;
pub mod pmc;
pub mod prelude;
pub mod time;

#[cfg(feature = "sama7g5")]
#[cfg_attr(docsrs, doc(cfg(feature = "sama7g5")))]
pub mod sama7g5;

#[cfg(test)]
mod testing;

pub use id::{ClockId, ClockKind};
pub use mux::MuxTable;
pub use node::{ClockNode, ClockRange, Description, NodeKind};
pub use pmc::Pmc;

use core::fmt::Display;

/// PMC error
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// Malformed clock id, id not registered, or malformed table
    InvalidArgument,
    /// The requested parent is not part of the node's mux table
    UnknownParent,
    /// A hardware select or divisor code has no entry in the node's table
    UnknownSelect,
    /// The requested rate is outside the hardware characteristics, or the
    /// computed divider does not fit its register field
    OutOfRange,
    /// The feature is not implemented by this SoC's register layout
    UnsupportedOnVariant,
    /// The registry has no free slot left
    RegistryFull,
}

impl Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl core::error::Error for Error {}

/// Result type used throughout the crate
pub type Result<T> = core::result::Result<T, Error>;
