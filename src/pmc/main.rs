//! Main clock
//!
//! `MAINCK` is selected in `CKGR_MOR` between the 12 MHz RC oscillator and
//! the crystal oscillator (or an external clock on `XIN` in bypass mode).
//! Every write to `CKGR_MOR` must carry the `KEY` value or it is ignored.

use crate::bus::{Field, RegisterBus};
use crate::pmc::PMC_SR;

pub(crate) const CKGR_MOR: usize = 0x20;

const MOR_KEY: Field = Field::new(23, 16);
const MOR_KEY_PASSWORD: u32 = 0x37;
const MOR_MOSCEN: u32 = 1 << 0;
const MOR_MOSCXTBY: u32 = 1 << 1;
const MOR_MOSCRCEN: u32 = 1 << 3;
pub(crate) const MOR_MOSCSEL: u32 = 1 << 24;

const SR_MOSCS: u32 = 1 << 0;
const SR_MOSCSELS: u32 = 1 << 16;
const SR_MOSCRCS: u32 = 1 << 17;

/// Replace `mask` with `bits` in `CKGR_MOR`, with the write key
fn update_mor<B: RegisterBus>(bus: &mut B, base: usize, mask: u32, bits: u32) {
    let mor = bus.read(base, CKGR_MOR) & !MOR_KEY.mask;
    bus.write(
        base,
        CKGR_MOR,
        (mor & !mask) | (bits & mask) | MOR_KEY.prep(MOR_KEY_PASSWORD),
    );
}

/// 12 MHz RC oscillator
#[derive(Debug, Copy, Clone)]
pub struct MainRcOsc {
    pub base: usize,
}

impl MainRcOsc {
    pub fn enable<B: RegisterBus>(&self, bus: &mut B) {
        if bus.read(self.base, CKGR_MOR) & MOR_MOSCRCEN == 0 {
            update_mor(bus, self.base, MOR_MOSCRCEN, MOR_MOSCRCEN);
        }
        wait_ready!(bus, self.base, PMC_SR, SR_MOSCRCS);
    }

    pub fn disable<B: RegisterBus>(&self, bus: &mut B) {
        update_mor(bus, self.base, MOR_MOSCRCEN, 0);
    }

    pub fn is_ready<B: RegisterBus>(&self, bus: &mut B) -> bool {
        bus.read(self.base, PMC_SR) & SR_MOSCRCS != 0
    }
}

/// Crystal oscillator
#[derive(Debug, Copy, Clone)]
pub struct MainOsc {
    pub base: usize,
    /// External clock on `XIN`: the oscillator is bypassed and no
    /// start-up time applies
    pub bypass: bool,
}

impl MainOsc {
    pub fn enable<B: RegisterBus>(&self, bus: &mut B) {
        let mor = bus.read(self.base, CKGR_MOR);
        if self.bypass {
            if mor & MOR_MOSCXTBY == 0 {
                update_mor(bus, self.base, MOR_MOSCXTBY | MOR_MOSCEN, MOR_MOSCXTBY);
            }
            return;
        }
        if mor & MOR_MOSCEN == 0 {
            update_mor(bus, self.base, MOR_MOSCEN | MOR_MOSCXTBY, MOR_MOSCEN);
        }
        wait_ready!(bus, self.base, PMC_SR, SR_MOSCS);
    }

    pub fn disable<B: RegisterBus>(&self, bus: &mut B) {
        let mask = if self.bypass { MOR_MOSCXTBY } else { MOR_MOSCEN };
        update_mor(bus, self.base, mask, 0);
    }

    /// Stable crystal, or bypass selected
    pub fn is_ready<B: RegisterBus>(&self, bus: &mut B) -> bool {
        if self.bypass {
            bus.read(self.base, CKGR_MOR) & MOR_MOSCXTBY != 0
        } else {
            bus.read(self.base, PMC_SR) & SR_MOSCS != 0
        }
    }
}

/// `MAINCK` source selector: 0 is the RC oscillator, 1 the crystal
#[derive(Debug, Copy, Clone)]
pub struct MainMux {
    pub base: usize,
}

impl MainMux {
    pub fn current_select<B: RegisterBus>(&self, bus: &mut B) -> u32 {
        u32::from(bus.read(self.base, CKGR_MOR) & MOR_MOSCSEL != 0)
    }

    /// Blocks until `MOSCSELS` reports the switch done
    pub fn set_parent<B: RegisterBus>(&self, bus: &mut B, select: u32) {
        if self.current_select(bus) != select {
            let bits = if select != 0 { MOR_MOSCSEL } else { 0 };
            update_mor(bus, self.base, MOR_MOSCSEL, bits);
        }
        wait_ready!(bus, self.base, PMC_SR, SR_MOSCSELS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockBus;

    const BASE: usize = 0xe001_8000;
    const KEY: u32 = 0x37 << 16;

    fn bus() -> MockBus {
        let mut bus = MockBus::new();
        bus.set(BASE, PMC_SR, SR_MOSCS | SR_MOSCSELS | SR_MOSCRCS);
        bus
    }

    #[test]
    fn mor_writes_carry_the_key() {
        let mut bus = bus();
        bus.set(BASE, CKGR_MOR, MOR_MOSCRCEN);
        MainOsc {
            base: BASE,
            bypass: false,
        }
        .enable(&mut bus);

        assert_eq!(
            bus.writes_to(BASE, CKGR_MOR),
            [KEY | MOR_MOSCRCEN | MOR_MOSCEN]
        );
    }

    #[test]
    fn enabled_oscillators_are_not_rewritten() {
        let mut bus = bus();
        bus.set(BASE, CKGR_MOR, MOR_MOSCRCEN | MOR_MOSCEN);
        MainRcOsc { base: BASE }.enable(&mut bus);
        MainOsc {
            base: BASE,
            bypass: false,
        }
        .enable(&mut bus);
        assert!(bus.writes().is_empty());
        assert!(MainRcOsc { base: BASE }.is_ready(&mut bus));
    }

    #[test]
    fn bypass_clears_the_oscillator_enable() {
        let mut bus = bus();
        bus.set(BASE, CKGR_MOR, MOR_MOSCEN);
        // No stabilisation wait in bypass mode
        bus.set(BASE, PMC_SR, 0);

        let osc = MainOsc {
            base: BASE,
            bypass: true,
        };
        osc.enable(&mut bus);
        assert_eq!(bus.get(BASE, CKGR_MOR), KEY | MOR_MOSCXTBY);
        assert!(osc.is_ready(&mut bus));

        osc.disable(&mut bus);
        assert_eq!(bus.get(BASE, CKGR_MOR), KEY);
        assert!(!osc.is_ready(&mut bus));
    }

    #[test]
    fn rc_disable_keeps_other_bits() {
        let mut bus = bus();
        bus.set(BASE, CKGR_MOR, MOR_MOSCRCEN | MOR_MOSCEN | MOR_MOSCSEL);
        MainRcOsc { base: BASE }.disable(&mut bus);
        assert_eq!(bus.get(BASE, CKGR_MOR), KEY | MOR_MOSCEN | MOR_MOSCSEL);
    }

    #[test]
    fn main_mux_switches_to_the_crystal() {
        let mut bus = bus();
        let mux = MainMux { base: BASE };
        assert_eq!(mux.current_select(&mut bus), 0);

        mux.set_parent(&mut bus, 1);
        assert_eq!(mux.current_select(&mut bus), 1);
        assert_ne!(bus.get(BASE, CKGR_MOR) & MOR_KEY.mask, 0);

        // Already selected
        bus.clear_writes();
        mux.set_parent(&mut bus, 1);
        assert!(bus.writes().is_empty());
    }
}
