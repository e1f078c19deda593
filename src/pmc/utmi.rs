//! UTMI clock
//!
//! The SAMA7G5 UTMI PLL has no software-visible multiplier. It is told the
//! main crystal frequency through `PMC_XTALF` and always runs at 480 MHz.

use crate::bus::{Field, RegisterBus};
use crate::{Error, Result};

const XTALF: usize = 0x74;
const XTALF_XTALF: Field = Field::new(2, 0);

/// Output rate of the UTMI PLL
pub const UTMI_RATE: u32 = 480_000_000;

/// `XTALF` code for each supported crystal
const XTAL_CODES: [(u32, u32); 4] = [
    (16_000_000, 0),
    (20_000_000, 2),
    (24_000_000, 3),
    (32_000_000, 5),
];

fn xtal_code(parent: u32) -> Result<u32> {
    XTAL_CODES
        .iter()
        .find(|&&(rate, _)| rate == parent)
        .map(|&(_, code)| code)
        .ok_or(Error::OutOfRange)
}

#[derive(Debug, Copy, Clone)]
pub struct Utmi {
    pub base: usize,
}

impl Utmi {
    /// Program `XTALF` for a crystal running at `parent`
    ///
    /// Fails with [`Error::OutOfRange`], writing nothing, for a crystal
    /// rate the UTMI cannot lock to.
    pub fn enable<B: RegisterBus>(&self, bus: &mut B, parent: u32) -> Result<()> {
        let code = xtal_code(parent)?;
        if !self.is_ready(bus, parent) {
            bus.update(self.base, XTALF, XTALF_XTALF.mask, XTALF_XTALF.prep(code));
        }
        Ok(())
    }

    /// `XTALF` matches the crystal rate
    pub fn is_ready<B: RegisterBus>(&self, bus: &mut B, parent: u32) -> bool {
        match xtal_code(parent) {
            Ok(code) => XTALF_XTALF.get(bus.read(self.base, XTALF)) == code,
            Err(_) => false,
        }
    }

    pub fn recalc_rate(&self) -> u32 {
        UTMI_RATE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockBus;

    const BASE: usize = 0xe001_8000;

    #[test]
    fn crystal_rate_is_encoded_in_xtalf() {
        let mut bus = MockBus::new();
        let utmi = Utmi { base: BASE };

        utmi.enable(&mut bus, 24_000_000).unwrap();
        assert_eq!(bus.writes_to(BASE, XTALF), [3]);
        assert!(utmi.is_ready(&mut bus, 24_000_000));
        assert!(!utmi.is_ready(&mut bus, 16_000_000));

        utmi.enable(&mut bus, 32_000_000).unwrap();
        assert_eq!(bus.get(BASE, XTALF), 5);
        assert_eq!(utmi.recalc_rate(), 480_000_000);
    }

    #[test]
    fn enable_is_skipped_when_already_programmed() {
        let mut bus = MockBus::new();
        bus.set(BASE, XTALF, 2);
        Utmi { base: BASE }.enable(&mut bus, 20_000_000).unwrap();
        assert!(bus.writes().is_empty());
    }

    #[test]
    fn unsupported_crystal_writes_nothing() {
        let mut bus = MockBus::new();
        assert_eq!(
            Utmi { base: BASE }.enable(&mut bus, 25_000_000),
            Err(Error::OutOfRange)
        );
        assert!(bus.writes().is_empty());
    }
}
