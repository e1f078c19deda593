//! Power Management Controller
//!
//! The [`Pmc`] registry owns every clock node of one SoC instance in a
//! fixed-capacity arena. Nodes refer to their parents by [`ClockId`] and
//! the registry resolves those links on demand, so the clock tree is never
//! represented with owning pointers.
//!
//! # Usage
//!
//! Nodes are registered once at bring-up, parents before children, with
//! [`register_node`](Pmc::register_node). Registration reads the hardware
//! source-select field of multiplexed nodes so that the model follows
//! whatever the boot ROM or bootloader left configured.
//!
//! All other operations take a [`ClockId`]:
//!
//! ```rust,ignore
//! let rate = pmc.get_rate(sama7g5::MCK1)?;
//! pmc.set_parent(sama7g5::PROG0, sama7g5::MAINCK)?;
//! pmc.set_rate(sama7g5::PROG0, 12.MHz())?;
//! pmc.enable(sama7g5::PCK0)?;
//! ```
//!
//! Rates are never cached: [`get_rate`](Pmc::get_rate) walks up to the
//! root, reading the divider of every node on the way.
//!
//! # Blocking
//!
//! `enable`, `set_rate` and `set_parent` busy-wait on the relevant PMC
//! status bit (PLL lock, master clock ready, oscillator stable) without a
//! timeout.

pub mod generic;
pub mod main;
pub mod master;
pub mod peripheral;
pub mod pll;
pub mod programmable;
pub mod slow;
pub mod system;
pub mod utmi;

use embedded_hal::delay::DelayNs;
use heapless::Vec;

use crate::bus::RegisterBus;
use crate::id::ClockKind;
use crate::mux::MAX_PARENTS;
use crate::node::{ClockNode, Description, NodeKind};
use crate::time::Hertz;
use crate::{ClockId, Error, Result};

use generic::Candidate;
use pll::PllState;

/// `PMC_SR`, status of oscillators, master clocks and programmable clocks
pub(crate) const PMC_SR: usize = 0x68;

const SLOTS: usize = ClockKind::COUNT * 256;
const EMPTY: u16 = u16::MAX;

pub(crate) fn div_round_closest(n: u64, d: u64) -> u64 {
    (n + d / 2) / d
}

/// Clock registry for one PMC instance
///
/// `N` is the arena capacity, i.e. the number of nodes the topology
/// registers.
pub struct Pmc<B, D, const N: usize> {
    bus: B,
    delay: D,
    nodes: Vec<ClockNode, N>,
    slots: [u16; SLOTS],
}

impl<B: RegisterBus, D: DelayNs, const N: usize> Pmc<B, D, N> {
    /// Create an empty registry on top of `bus`
    ///
    /// `delay` provides the settle times of the oscillators and UTMI bias
    /// circuits.
    pub fn new(bus: B, delay: D) -> Self {
        Pmc {
            bus,
            delay,
            nodes: Vec::new(),
            slots: [EMPTY; SLOTS],
        }
    }

    /// Release the bus and the delay provider
    pub fn free(self) -> (B, D) {
        (self.bus, self.delay)
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Number of registered nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Registered nodes, in registration order
    pub fn iter(&self) -> impl Iterator<Item = &ClockNode> {
        self.nodes.iter()
    }

    fn index(&self, id: ClockId) -> Result<usize> {
        match self.slots[id.slot()] {
            EMPTY => Err(Error::InvalidArgument),
            index => Ok(usize::from(index)),
        }
    }

    /// Look up a registered node
    pub fn resolve(&self, id: ClockId) -> Result<&ClockNode> {
        self.index(id).map(|index| &self.nodes[index])
    }

    /// Parent currently selected by `id`, `None` for roots and orphans
    pub fn parent(&self, id: ClockId) -> Result<Option<ClockId>> {
        self.resolve(id).map(|node| node.parent)
    }

    /// Add a node to the registry
    ///
    /// For multiplexed kinds the current hardware select is read back and
    /// translated through the node's mux table. A select code with no table
    /// entry leaves the node without a parent; it then reports a rate of
    /// zero until [`set_parent`](Self::set_parent) is called.
    pub fn register_node(&mut self, desc: Description) -> Result<ClockId> {
        let id = desc.id;
        let slot = id.slot();
        if self.slots[slot] != EMPTY {
            return Err(Error::InvalidArgument);
        }
        if self.nodes.is_full() || self.nodes.len() >= usize::from(EMPTY) {
            return Err(Error::RegistryFull);
        }

        let parent = match self.hardware_select(&desc.kind) {
            None => desc.parents.parent(0),
            Some(select) => match desc.parents.select_to_parent_index(select) {
                Ok(index) => desc.parents.parent(index),
                Err(_) => {
                    warn!("{}: hardware select {} has no parent", desc.name, select);
                    None
                }
            },
        };
        debug!("{}: registered as {}", desc.name, id);

        let index = self.nodes.len() as u16;
        self.nodes
            .push(ClockNode::from_description(desc, parent))
            .map_err(|_| Error::RegistryFull)?;
        self.slots[slot] = index;
        Ok(id)
    }

    fn hardware_select(&mut self, kind: &NodeKind) -> Option<u32> {
        let bus = &mut self.bus;
        match kind {
            NodeKind::SlowMux(mux) => Some(mux.current_select(bus)),
            NodeKind::MainMux(mux) => Some(mux.current_select(bus)),
            NodeKind::Master(mck) => Some(mck.current_select(bus)),
            NodeKind::Programmable(prog) => Some(prog.current_select(bus)),
            NodeKind::Generic(gck) => Some(gck.current_select(bus)),
            _ => None,
        }
    }

    /// Ungate a node
    ///
    /// Parents are not enabled implicitly. May block until the hardware
    /// reports the clock stable.
    pub fn enable(&mut self, id: ClockId) -> Result<()> {
        let index = self.index(id)?;
        let kind = self.nodes[index].kind;
        trace!("{}: enable", self.nodes[index].name);

        if let NodeKind::Utmi(utmi) = kind {
            let parent_rate = self.parent_rate(index)?;
            return utmi.enable(&mut self.bus, parent_rate);
        }

        let bus = &mut self.bus;
        match kind {
            NodeKind::Fixed { .. }
            | NodeKind::SlowMux(_)
            | NodeKind::MainMux(_)
            | NodeKind::Programmable(_)
            | NodeKind::Utmi(_) => {}
            NodeKind::MainRcOsc(osc) => osc.enable(bus),
            NodeKind::MainOsc(osc) => osc.enable(bus),
            NodeKind::FracPll(pll) => pll.enable(bus, &mut self.delay),
            NodeKind::DivPll(pll) => pll.enable(bus),
            NodeKind::Master(mck) => mck.enable(bus),
            NodeKind::System(sys) => sys.enable(bus),
            NodeKind::Peripheral(periph) => periph.enable(bus),
            NodeKind::Generic(gck) => gck.enable(bus),
        }
        Ok(())
    }

    /// Gate a node. Ignored for critical nodes.
    pub fn disable(&mut self, id: ClockId) -> Result<()> {
        let index = self.index(id)?;
        let node = &self.nodes[index];
        if node.critical {
            warn!("{}: critical, not disabling", node.name);
            return Ok(());
        }
        trace!("{}: disable", node.name);

        let bus = &mut self.bus;
        match node.kind {
            NodeKind::Fixed { .. }
            | NodeKind::SlowMux(_)
            | NodeKind::MainMux(_)
            | NodeKind::Programmable(_)
            | NodeKind::Utmi(_) => {}
            NodeKind::MainRcOsc(osc) => osc.disable(bus),
            NodeKind::MainOsc(osc) => osc.disable(bus),
            NodeKind::FracPll(pll) => pll.disable(bus),
            NodeKind::DivPll(pll) => pll.disable(bus),
            NodeKind::Master(mck) => mck.disable(bus),
            NodeKind::System(sys) => sys.disable(bus),
            NodeKind::Peripheral(periph) => periph.disable(bus),
            NodeKind::Generic(gck) => gck.disable(bus),
        }
        Ok(())
    }

    /// Whether the hardware currently passes the clock
    ///
    /// Kinds without a gate or status of their own report `true`.
    pub fn is_enabled(&mut self, id: ClockId) -> Result<bool> {
        let index = self.index(id)?;
        let kind = self.nodes[index].kind;

        if let NodeKind::Utmi(utmi) = kind {
            let parent_rate = self.parent_rate(index)?;
            return Ok(utmi.is_ready(&mut self.bus, parent_rate));
        }

        let bus = &mut self.bus;
        Ok(match kind {
            NodeKind::Fixed { .. }
            | NodeKind::SlowMux(_)
            | NodeKind::MainMux(_)
            | NodeKind::Programmable(_)
            | NodeKind::Utmi(_) => true,
            NodeKind::MainRcOsc(osc) => osc.is_ready(bus),
            NodeKind::MainOsc(osc) => osc.is_ready(bus),
            NodeKind::FracPll(pll) => pll.state(bus) == PllState::Locked,
            NodeKind::DivPll(pll) => pll.is_enabled(bus),
            NodeKind::Master(mck) => mck.is_enabled(bus),
            NodeKind::System(sys) => sys.is_enabled(bus),
            NodeKind::Peripheral(periph) => periph.is_enabled(bus),
            NodeKind::Generic(gck) => gck.is_enabled(bus),
        })
    }

    /// Current rate of a node, computed from the registers up to the root
    pub fn get_rate(&mut self, id: ClockId) -> Result<Hertz> {
        let index = self.index(id)?;
        let node = &self.nodes[index];
        let (kind, parent, orphan) = (node.kind, node.parent, node.is_orphan());
        let parent_rate = match parent {
            Some(parent) => self.get_rate(parent)?.raw(),
            None if orphan => return Ok(Hertz::from_raw(0)),
            None => 0,
        };

        let bus = &mut self.bus;
        let rate = match kind {
            NodeKind::Fixed { rate } => rate,
            NodeKind::SlowMux(_)
            | NodeKind::MainRcOsc(_)
            | NodeKind::MainOsc(_)
            | NodeKind::MainMux(_)
            | NodeKind::System(_) => parent_rate,
            NodeKind::FracPll(pll) => pll.recalc_rate(bus, parent_rate),
            NodeKind::DivPll(pll) => pll.recalc_rate(bus, parent_rate),
            NodeKind::Utmi(utmi) => utmi.recalc_rate(),
            NodeKind::Master(mck) => mck.recalc_rate(bus, parent_rate)?,
            NodeKind::Programmable(prog) => prog.recalc_rate(bus, parent_rate),
            NodeKind::Peripheral(periph) => periph.recalc_rate(bus, parent_rate),
            NodeKind::Generic(gck) => gck.recalc_rate(bus, parent_rate),
        };
        Ok(Hertz::from_raw(rate))
    }

    /// Program a node for the rate closest to `rate`
    ///
    /// Returns the rate actually achieved. The divider search runs to
    /// completion before any register is written: on error the hardware
    /// is left untouched.
    pub fn set_rate(&mut self, id: ClockId, rate: Hertz) -> Result<Hertz> {
        let index = self.index(id)?;
        let target = rate.raw();
        let kind = self.nodes[index].kind;

        let achieved = match kind {
            NodeKind::Generic(gck) => {
                let candidates = self.generic_candidates(index, gck.base_parents)?;
                let (parent, achieved) = gck.set_rate(&mut self.bus, &candidates, target)?;
                self.nodes[index].parent = Some(parent);
                achieved
            }
            NodeKind::FracPll(pll) => {
                let parent_rate = self.parent_rate(index)?;
                pll.set_rate(&mut self.bus, parent_rate, target)?
            }
            NodeKind::DivPll(pll) => {
                let parent_rate = self.parent_rate(index)?;
                pll.set_rate(&mut self.bus, parent_rate, target)?
            }
            NodeKind::Master(mck) => {
                let parent_rate = self.parent_rate(index)?;
                mck.set_rate(&mut self.bus, parent_rate, target)?
            }
            NodeKind::Programmable(prog) => {
                let parent_rate = self.parent_rate(index)?;
                prog.set_rate(&mut self.bus, parent_rate, target)?
            }
            NodeKind::Peripheral(periph) => {
                let parent_rate = self.parent_rate(index)?;
                periph.set_rate(&mut self.bus, parent_rate, target)?
            }
            NodeKind::Fixed { .. }
            | NodeKind::SlowMux(_)
            | NodeKind::MainRcOsc(_)
            | NodeKind::MainOsc(_)
            | NodeKind::MainMux(_)
            | NodeKind::Utmi(_)
            | NodeKind::System(_) => {
                // No divider: only the current rate can be "set"
                if self.get_rate(id)?.raw() != target {
                    return Err(Error::UnsupportedOnVariant);
                }
                target
            }
        };

        debug!(
            "{}: rate {} requested, {} achieved",
            self.nodes[index].name,
            target,
            achieved
        );
        Ok(Hertz::from_raw(achieved))
    }

    /// Select a new parent
    ///
    /// Fails with [`Error::UnknownParent`] without touching the hardware if
    /// `parent` is not in the node's mux table.
    pub fn set_parent(&mut self, id: ClockId, parent: ClockId) -> Result<()> {
        let index = self.index(id)?;
        let node = &self.nodes[index];
        let select = node.parents.parent_id_to_select(parent)?;

        let bus = &mut self.bus;
        match node.kind {
            NodeKind::SlowMux(mux) => mux.set_parent(bus, &mut self.delay, select),
            NodeKind::MainMux(mux) => mux.set_parent(bus, select),
            NodeKind::Master(mck) => mck.set_parent(bus, select),
            NodeKind::Programmable(prog) => prog.set_parent(bus, select)?,
            NodeKind::Generic(gck) => gck.set_parent(bus, select),
            _ if node.parent == Some(parent) => {}
            _ => return Err(Error::UnsupportedOnVariant),
        }

        debug!("{}: parent {}", node.name, parent);
        self.nodes[index].parent = Some(parent);
        Ok(())
    }

    /// Hardware state of a fractional PLL or PLL divider
    pub fn pll_state(&mut self, id: ClockId) -> Result<PllState> {
        let index = self.index(id)?;
        match self.nodes[index].kind {
            NodeKind::FracPll(pll) => Ok(pll.state(&mut self.bus)),
            NodeKind::DivPll(pll) => Ok(pll.state(&mut self.bus)),
            _ => Err(Error::InvalidArgument),
        }
    }

    fn parent_rate(&mut self, index: usize) -> Result<u32> {
        match self.nodes[index].parent {
            Some(parent) => Ok(self.get_rate(parent)?.raw()),
            None => Ok(0),
        }
    }

    /// Parents a generic clock may switch to while searching for a rate:
    /// the entries after the base set, or the current parent when the node
    /// declares no extra parents
    fn generic_candidates(
        &mut self,
        index: usize,
        base_parents: usize,
    ) -> Result<Vec<Candidate, MAX_PARENTS>> {
        let parents = self.nodes[index].parents.clone();
        let mut candidates = Vec::new();

        for entry in parents.iter().skip(base_parents) {
            let rate = self.get_rate(entry.parent)?.raw();
            candidates
                .push(Candidate {
                    parent: entry.parent,
                    select: entry.select,
                    rate,
                })
                .map_err(|_| Error::InvalidArgument)?;
        }

        if candidates.is_empty() {
            if let Some(parent) = self.nodes[index].parent {
                let select = parents.parent_id_to_select(parent)?;
                let rate = self.get_rate(parent)?.raw();
                candidates
                    .push(Candidate {
                        parent,
                        select,
                        rate,
                    })
                    .map_err(|_| Error::InvalidArgument)?;
            }
        }
        Ok(candidates)
    }
}
