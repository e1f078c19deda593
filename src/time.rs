//! Time units
//!
//! Rates cross the public API as [`Hertz`]; the per-kind drivers in
//! [`pmc`](crate::pmc) work on raw `u32` Hz.

pub use fugit::{
    HertzU32 as Hertz, KilohertzU32 as KiloHertz, MegahertzU32 as MegaHertz,
    MicrosDurationU32 as MicroSeconds, MillisDurationU32 as MilliSeconds,
    NanosDurationU32 as NanoSeconds,
};
