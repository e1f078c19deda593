//! Programmable clock outputs
//!
//! `PMC_PCKx` has a source select and a prescaler. Gating is done by the
//! matching system clock (`PCKx` in `PMC_SCER`), so enable and disable are
//! no-ops here.

use crate::bus::{Field, RegisterBus};
use crate::{Error, Result};

/// `PMC_PCK0`, followed by one register per output
const PCKR: usize = 0x40;

/// Bit-fields of `PMC_PCKx`
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ProgrammableLayout {
    pub pres: Field,
    pub css: Field,
    /// Extra select bit for sources beyond the `css` field, if any
    pub ext: Field,
    /// `PRES` holds `divider - 1`; otherwise it is a power-of-two shift
    pub pres_direct: bool,
}

/// One programmable clock output
#[derive(Debug, Copy, Clone)]
pub struct Programmable {
    pub base: usize,
    pub id: u8,
    pub layout: &'static ProgrammableLayout,
}

impl Programmable {
    fn offset(&self) -> usize {
        PCKR + 4 * usize::from(self.id)
    }

    pub fn current_select<B: RegisterBus>(&self, bus: &mut B) -> u32 {
        let layout = self.layout;
        let value = bus.read(self.base, self.offset());
        let mut select = layout.css.get(value);
        if layout.ext.is_present() && value & layout.ext.mask != 0 {
            select += layout.css.max() + 1;
        }
        select
    }

    pub fn recalc_rate<B: RegisterBus>(&self, bus: &mut B, parent: u32) -> u32 {
        let pres = self.layout.pres.get(bus.read(self.base, self.offset()));
        if self.layout.pres_direct {
            parent / (pres + 1)
        } else {
            parent.checked_shr(pres).unwrap_or(0)
        }
    }

    /// Fails with [`Error::UnsupportedOnVariant`] if `select` needs the
    /// extension bit and the layout has none
    pub fn set_parent<B: RegisterBus>(&self, bus: &mut B, select: u32) -> Result<()> {
        let (css, ext) = (self.layout.css, self.layout.ext);
        let bits = if select <= css.max() {
            css.prep(select)
        } else if ext.is_present() && select - (css.max() + 1) <= css.max() {
            css.prep(select - (css.max() + 1)) | ext.mask
        } else {
            return Err(Error::UnsupportedOnVariant);
        };
        bus.update(self.base, self.offset(), css.mask | ext.mask, bits);
        Ok(())
    }

    /// `PRES` value giving exactly `target`
    pub fn compute(&self, parent: u32, target: u32) -> Result<u32> {
        if target == 0 || parent < target {
            return Err(Error::OutOfRange);
        }
        let pres = self.layout.pres;
        let ratio = parent / target;

        if self.layout.pres_direct {
            let fits = ratio <= pres.max() + 1;
            if !fits || u64::from(ratio) * u64::from(target) != u64::from(parent) {
                return Err(Error::OutOfRange);
            }
            Ok(ratio - 1)
        } else {
            // ceil(log2(ratio))
            let shift = u32::BITS - (ratio - 1).leading_zeros();
            if shift >= pres.max() || parent >> shift != target {
                return Err(Error::OutOfRange);
            }
            Ok(shift)
        }
    }

    pub fn set_rate<B: RegisterBus>(&self, bus: &mut B, parent: u32, target: u32) -> Result<u32> {
        let value = self.compute(parent, target)?;
        let pres = self.layout.pres;
        bus.update(self.base, self.offset(), pres.mask, pres.prep(value));
        Ok(target)
    }
}
