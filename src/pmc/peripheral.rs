//! Peripheral clocks
//!
//! Every peripheral has a slot in the indexed `PMC_PCR` register. Writing
//! the peripheral id alone selects the slot; a read then returns that
//! slot's configuration, and a write with `CMD` set applies new values.

use crate::bus::{Field, RegisterBus};
use crate::node::ClockRange;
use crate::{Error, Result};

/// Ids below this one are system peripherals without a gate
const PERIPHERAL_ID_MIN: u8 = 2;
/// Largest shift of the peripheral divider
const PERIPHERAL_MAX_SHIFT: u32 = 3;

/// Bit-fields of `PMC_PCR`, shared by peripheral and generic clocks
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PcrLayout {
    pub offset: usize,
    pub cmd: u32,
    pub pid: Field,
    /// Peripheral divider, a power-of-two shift
    pub div: Field,
    pub gckcss: Field,
    pub gckdiv: Field,
    pub en: u32,
    pub gcken: u32,
    /// Offset of a status bitmap reporting enabled clocks, one bit per id,
    /// polled after enabling
    pub status: Option<usize>,
}

impl PcrLayout {
    /// Configuration of peripheral `id`
    pub(crate) fn read<B: RegisterBus>(&self, bus: &mut B, base: usize, id: u8) -> u32 {
        critical_section::with(|_| {
            bus.write(base, self.offset, self.pid.prep(id.into()));
            bus.read(base, self.offset)
        })
    }

    /// Replace `mask` with `bits` in slot `id`
    ///
    /// Selecting the slot and writing it back happen inside one critical
    /// section. With `wait_enabled`, polls the status bitmap afterwards.
    pub(crate) fn commit<B: RegisterBus>(
        &self,
        bus: &mut B,
        base: usize,
        id: u8,
        mask: u32,
        bits: u32,
        wait_enabled: bool,
    ) {
        let pid = self.pid.prep(id.into());
        critical_section::with(|_| {
            bus.write(base, self.offset, pid);
            bus.update(
                base,
                self.offset,
                mask | self.cmd | self.pid.mask,
                bits | self.cmd | pid,
            );
        });

        if let (true, Some(status)) = (wait_enabled, self.status) {
            let offset = status + 4 * usize::from(id / 32);
            wait_ready!(bus, base, offset, 1 << (id % 32));
        }
    }
}

/// Gate of one peripheral
#[derive(Debug, Copy, Clone)]
pub struct Peripheral {
    pub base: usize,
    pub id: u8,
    pub layout: &'static PcrLayout,
    pub range: ClockRange,
}

impl Peripheral {
    fn is_gated(&self) -> bool {
        self.id >= PERIPHERAL_ID_MIN
    }

    pub fn enable<B: RegisterBus>(&self, bus: &mut B) {
        if self.is_gated() {
            let en = self.layout.en;
            self.layout.commit(bus, self.base, self.id, en, en, true);
        }
    }

    pub fn disable<B: RegisterBus>(&self, bus: &mut B) {
        if self.is_gated() {
            self.layout
                .commit(bus, self.base, self.id, self.layout.en, 0, false);
        }
    }

    pub fn is_enabled<B: RegisterBus>(&self, bus: &mut B) -> bool {
        !self.is_gated() || self.layout.read(bus, self.base, self.id) & self.layout.en != 0
    }

    pub fn recalc_rate<B: RegisterBus>(&self, bus: &mut B, parent: u32) -> u32 {
        let div = self.layout.div;
        if !self.is_gated() || !div.is_present() {
            return parent;
        }
        parent >> div.get(self.layout.read(bus, self.base, self.id))
    }

    /// Only exact power-of-two divisions of the parent, up to the range
    /// maximum, are accepted. Without a declared maximum the parent rate is
    /// the only valid rate.
    pub fn set_rate<B: RegisterBus>(&self, bus: &mut B, parent: u32, target: u32) -> Result<u32> {
        if !self.is_gated() || self.range.max == 0 {
            return if target == parent {
                Ok(parent)
            } else {
                Err(Error::OutOfRange)
            };
        }
        if self.range.exceeds_max(target) {
            return Err(Error::OutOfRange);
        }

        let div = self.layout.div;
        let max_shift = if div.is_present() {
            PERIPHERAL_MAX_SHIFT.min(div.max())
        } else {
            0
        };
        let shift = (0..=max_shift)
            .find(|&shift| parent >> shift == target)
            .ok_or(Error::OutOfRange)?;

        if div.is_present() {
            self.layout
                .commit(bus, self.base, self.id, div.mask, div.prep(shift), false);
        }
        Ok(target)
    }
}
