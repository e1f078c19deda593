//! Generic clocks
//!
//! A generic clock is the second output of a `PMC_PCR` slot: its own
//! source select (`GCKCSS`), an 8-bit divider (`GCKDIV`) and gate
//! (`GCKEN`). The rate search may move the clock to a different parent.

use crate::bus::RegisterBus;
use crate::node::ClockRange;
use crate::pmc::peripheral::PcrLayout;
use crate::{ClockId, Error, Result};

/// Largest division of `GCKDIV`
const GCK_DIV_MAX: u32 = 256;

/// A parent the rate search may select
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub parent: ClockId,
    /// `GCKCSS` code of `parent`
    pub select: u32,
    /// Current rate of `parent`
    pub rate: u32,
}

/// Outcome of the rate search
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Choice {
    /// Position in the candidate list
    pub index: usize,
    /// Division, `GCKDIV + 1`
    pub div: u32,
    pub rate: u32,
}

/// Generic clock of one peripheral
#[derive(Debug, Copy, Clone)]
pub struct Generic {
    pub base: usize,
    pub id: u8,
    pub layout: &'static PcrLayout,
    pub range: ClockRange,
    /// Leading mux entries that are always available and never picked by
    /// the rate search
    pub base_parents: usize,
}

/// Best `(parent, divider)` pair for `target`
///
/// Rates above the range maximum are skipped. For each candidate the
/// divider grows until the rate is exact or drops below `target`. The first
/// exact match stops the search; otherwise the closest rate wins, the
/// earliest candidate on ties.
pub fn best_divider(candidates: &[Candidate], target: u32, range: ClockRange) -> Result<Choice> {
    if target == 0 || range.exceeds_max(target) {
        return Err(Error::OutOfRange);
    }

    let mut best: Option<Choice> = None;
    let mut best_diff = u32::MAX;
    for (index, candidate) in candidates.iter().enumerate() {
        if candidate.rate == 0 {
            continue;
        }
        for div in 1..=GCK_DIV_MAX {
            let rate = candidate.rate / div;
            if range.exceeds_max(rate) {
                continue;
            }
            let diff = rate.abs_diff(target);
            if best.is_none() || diff < best_diff {
                best = Some(Choice { index, div, rate });
                best_diff = diff;
            }
            if diff == 0 || rate < target {
                break;
            }
        }
        if best_diff == 0 {
            break;
        }
    }
    best.ok_or(Error::OutOfRange)
}

impl Generic {
    pub fn current_select<B: RegisterBus>(&self, bus: &mut B) -> u32 {
        self.layout
            .gckcss
            .get(self.layout.read(bus, self.base, self.id))
    }

    pub fn recalc_rate<B: RegisterBus>(&self, bus: &mut B, parent: u32) -> u32 {
        let div = self
            .layout
            .gckdiv
            .get(self.layout.read(bus, self.base, self.id));
        parent / (div + 1)
    }

    pub fn set_parent<B: RegisterBus>(&self, bus: &mut B, select: u32) {
        let css = self.layout.gckcss;
        self.layout
            .commit(bus, self.base, self.id, css.mask, css.prep(select), false);
    }

    /// Search `candidates`, then program source and divider in one `PCR`
    /// write
    ///
    /// Returns the selected parent and the achieved rate. Nothing is
    /// committed when `PCR` already holds the chosen source and divider.
    pub fn set_rate<B: RegisterBus>(
        &self,
        bus: &mut B,
        candidates: &[Candidate],
        target: u32,
    ) -> Result<(ClockId, u32)> {
        let choice = best_divider(candidates, target, self.range)?;
        let candidate = candidates[choice.index];
        let (css, div) = (self.layout.gckcss, self.layout.gckdiv);

        let pcr = self.layout.read(bus, self.base, self.id);
        if css.get(pcr) == candidate.select && div.get(pcr) == choice.div - 1 {
            return Ok((candidate.parent, choice.rate));
        }

        trace!(
            "GCK{}: GCKCSS {} GCKDIV {}",
            self.id,
            candidate.select,
            choice.div - 1
        );
        self.layout.commit(
            bus,
            self.base,
            self.id,
            css.mask | div.mask,
            css.prep(candidate.select) | div.prep(choice.div - 1),
            false,
        );
        Ok((candidate.parent, choice.rate))
    }

    pub fn enable<B: RegisterBus>(&self, bus: &mut B) {
        let gcken = self.layout.gcken;
        self.layout
            .commit(bus, self.base, self.id, gcken, gcken, true);
    }

    pub fn disable<B: RegisterBus>(&self, bus: &mut B) {
        self.layout
            .commit(bus, self.base, self.id, self.layout.gcken, 0, false);
    }

    pub fn is_enabled<B: RegisterBus>(&self, bus: &mut B) -> bool {
        self.layout.read(bus, self.base, self.id) & self.layout.gcken != 0
    }
}
