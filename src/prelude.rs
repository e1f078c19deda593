//! Prelude

pub use crate::bus::RegisterBus as _at91_pmc_bus_RegisterBus;

pub use fugit::{ExtU32 as _, RateExtU32 as _};
