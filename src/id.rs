//! Clock identifiers
//!
//! A [`ClockId`] packs a kind tag and a local index into one integer:
//! `kind << 8 | index`. The encoding matches the `AT91_TO_CLK_ID` cells used
//! by device trees, so ids coming from firmware tables can be passed through
//! [`ClockId::from_raw`] unchanged.

use core::fmt;

use crate::{Error, Result};

/// Kind tag of a clock id
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ClockKind {
    /// Oscillators, PLLs, master and programmable clocks
    Core = 1,
    /// System clock gates (`PMC_SCER`)
    System = 2,
    /// Peripheral clock gates (`PMC_PCR`)
    Peripheral = 3,
    /// Generic clocks (`PMC_PCR`, GCK fields)
    Generic = 4,
    /// Slow clock domain (`SCKC`)
    Slow = 5,
}

impl ClockKind {
    /// Number of kind tags
    pub const COUNT: usize = 5;

    /// Decode a kind tag
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(ClockKind::Core),
            2 => Some(ClockKind::System),
            3 => Some(ClockKind::Peripheral),
            4 => Some(ClockKind::Generic),
            5 => Some(ClockKind::Slow),
            _ => None,
        }
    }

    /// The raw tag value
    pub const fn tag(self) -> u8 {
        self as u8
    }
}

/// Opaque, globally unique identifier of a clock node
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockId(u16);

/// Constructors per kind: `ClockId::core(7)`, `ClockId::generic(38)`, ...
macro_rules! kind_constructors {
    ($($kind:ident),+) => {
        paste::item! {
            $(
                #[doc = "Id of the " $kind:lower " clock with local index `index`"]
                pub const fn [<$kind:lower>](index: u8) -> Self {
                    ClockId::new(ClockKind::$kind, index)
                }
            )+
        }
    };
}

impl ClockId {
    /// Pack a kind tag and a local index
    pub const fn new(kind: ClockKind, index: u8) -> Self {
        ClockId(((kind as u16) << 8) | index as u16)
    }

    kind_constructors! { Core, System, Peripheral, Generic, Slow }

    /// Validate and wrap a raw packed id
    pub fn from_raw(raw: u32) -> Result<Self> {
        if raw > u32::from(u16::MAX) {
            return Err(Error::InvalidArgument);
        }
        ClockKind::from_tag((raw >> 8) as u8)
            .map(|kind| ClockId::new(kind, raw as u8))
            .ok_or(Error::InvalidArgument)
    }

    /// The packed representation
    pub const fn raw(self) -> u32 {
        self.0 as u32
    }

    /// Kind tag
    pub const fn kind(self) -> ClockKind {
        match ClockKind::from_tag((self.0 >> 8) as u8) {
            Some(kind) => kind,
            // Only constructed through `new` or a validated `from_raw`
            None => ClockKind::Core,
        }
    }

    /// Local index within the kind
    pub const fn index(self) -> u8 {
        self.0 as u8
    }

    /// Dense position of this id among all possible ids, used by the
    /// registry's slot table
    pub(crate) const fn slot(self) -> usize {
        (self.kind() as usize - 1) * 256 + self.index() as usize
    }
}

impl fmt::Debug for ClockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self.kind(), self.index())
    }
}

impl fmt::Display for ClockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ClockId {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}({})", self.kind(), self.index())
    }
}
