//! System clock gates
//!
//! Write-one-to-set/clear gates in `PMC_SCER`/`PMC_SCDR`, status in
//! `PMC_SCSR`. Ids 8 to 15 gate the programmable clock outputs and report
//! readiness in `PMC_SR`.

use core::ops::RangeInclusive;

use crate::bus::RegisterBus;
use crate::pmc::PMC_SR;

const SCER: usize = 0x00;
const SCDR: usize = 0x04;
const SCSR: usize = 0x08;

/// Ids gating `PCK0`..`PCK7`
const PCK_IDS: RangeInclusive<u8> = 8..=15;

#[derive(Debug, Copy, Clone)]
pub struct System {
    pub base: usize,
    pub id: u8,
}

impl System {
    fn mask(&self) -> u32 {
        1 << self.id
    }

    /// Blocks until `PCKRDY` is set for the programmable clock gates
    pub fn enable<B: RegisterBus>(&self, bus: &mut B) {
        bus.write(self.base, SCER, self.mask());
        if PCK_IDS.contains(&self.id) {
            wait_ready!(bus, self.base, PMC_SR, self.mask());
        }
    }

    pub fn disable<B: RegisterBus>(&self, bus: &mut B) {
        bus.write(self.base, SCDR, self.mask());
    }

    pub fn is_enabled<B: RegisterBus>(&self, bus: &mut B) -> bool {
        bus.read(self.base, SCSR) & self.mask() != 0
    }
}
