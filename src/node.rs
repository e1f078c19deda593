//! Clock nodes
//!
//! A node is created once from a [`Description`] and owned by the
//! [`Pmc`](crate::Pmc) registry. Afterwards only the hardware changes: the
//! node record keeps its kind, its mux table and a weak link to the parent
//! the hardware currently selects. Rates are never cached, every query goes
//! back to the registers.

use crate::mux::MuxTable;
use crate::pmc::{
    generic::Generic,
    main::{MainMux, MainOsc, MainRcOsc},
    master::Master,
    peripheral::Peripheral,
    pll::{DivPll, FracPll},
    programmable::Programmable,
    slow::SlowMux,
    system::System,
    utmi::Utmi,
};
use crate::ClockId;

/// Allowed rates in Hz; a zero bound is unconstrained
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockRange {
    pub min: u32,
    pub max: u32,
}

impl ClockRange {
    /// No constraint on either side
    pub const UNCONSTRAINED: ClockRange = ClockRange { min: 0, max: 0 };

    pub const fn new(min: u32, max: u32) -> Self {
        ClockRange { min, max }
    }

    /// Only an upper bound
    pub const fn up_to(max: u32) -> Self {
        ClockRange { min: 0, max }
    }

    /// Returns `true` if `rate` is above a declared maximum
    pub const fn exceeds_max(&self, rate: u32) -> bool {
        self.max != 0 && rate > self.max
    }

    /// Returns `true` if `rate` is inside both declared bounds
    pub const fn contains(&self, rate: u32) -> bool {
        (self.min == 0 || rate >= self.min) && !self.exceeds_max(rate)
    }
}

/// Behaviour of a node, with the register layout it drives
///
/// The variant carries the hardware handle and the layout constants; the
/// parent set lives in the node's [`MuxTable`].
#[derive(Debug, Copy, Clone)]
pub enum NodeKind {
    /// Crystal or RC oscillator with a declared rate and no parent
    Fixed { rate: u32 },
    /// Slow clock source selector (`SCKC_CR.OSCSEL`)
    SlowMux(SlowMux),
    /// Main RC oscillator gate
    MainRcOsc(MainRcOsc),
    /// Main crystal oscillator gate, or bypass input
    MainOsc(MainOsc),
    /// `MAINCK` selector between RC and crystal
    MainMux(MainMux),
    /// Fractional PLL core
    FracPll(FracPll),
    /// Integer divider after a fractional PLL
    DivPll(DivPll),
    /// Fixed 480 MHz UTMI PLL on the main crystal
    Utmi(Utmi),
    /// Master clock (`MCKR` or `MCR`)
    Master(Master),
    /// Programmable clock output (`PCKR`)
    Programmable(Programmable),
    /// System clock gate (`SCER`/`SCDR`)
    System(System),
    /// Peripheral clock gate (`PCR`)
    Peripheral(Peripheral),
    /// Generic clock (`PCR` GCK fields)
    Generic(Generic),
}

impl NodeKind {
    /// Returns `true` for kinds with a hardware source-select field
    pub const fn has_mux(&self) -> bool {
        matches!(
            self,
            NodeKind::SlowMux(_)
                | NodeKind::MainMux(_)
                | NodeKind::Master(_)
                | NodeKind::Programmable(_)
                | NodeKind::Generic(_)
        )
    }
}

/// Everything needed to register one node
#[derive(Debug, Clone)]
pub struct Description {
    pub(crate) id: ClockId,
    pub(crate) name: &'static str,
    pub(crate) kind: NodeKind,
    pub(crate) parents: MuxTable,
    pub(crate) critical: bool,
}

impl Description {
    /// A root node: no parent until one is declared
    pub fn new(id: ClockId, name: &'static str, kind: NodeKind) -> Self {
        Description {
            id,
            name,
            kind,
            parents: MuxTable::empty(),
            critical: false,
        }
    }

    /// Single fixed parent
    #[must_use]
    pub fn parent(mut self, parent: ClockId) -> Self {
        self.parents = MuxTable::single(parent);
        self
    }

    /// Selectable parents
    #[must_use]
    pub fn parents(mut self, parents: MuxTable) -> Self {
        self.parents = parents;
        self
    }

    /// Mark the node as critical: `disable` requests are ignored
    #[must_use]
    pub fn critical(mut self) -> Self {
        self.critical = true;
        self
    }
}

/// A registered clock node
#[derive(Debug, Clone)]
pub struct ClockNode {
    pub id: ClockId,
    pub name: &'static str,
    pub kind: NodeKind,
    pub parents: MuxTable,
    /// Parent currently selected by hardware; `None` for roots and for
    /// nodes whose hardware select matched no table entry
    pub parent: Option<ClockId>,
    pub critical: bool,
}

impl ClockNode {
    pub(crate) fn from_description(desc: Description, parent: Option<ClockId>) -> Self {
        ClockNode {
            id: desc.id,
            name: desc.name,
            kind: desc.kind,
            parents: desc.parents,
            parent,
            critical: desc.critical,
        }
    }

    /// Rates are recomputed from hardware on every query
    pub const fn rate_is_never_cached(&self) -> bool {
        true
    }

    /// A node that declares parents but has none selected
    pub fn is_orphan(&self) -> bool {
        self.parent.is_none() && !self.parents.is_empty()
    }
}
