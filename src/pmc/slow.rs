//! Slow clock
//!
//! The slow clock controller (`SCKC`) sits outside the PMC. `SCKC_CR`
//! enables the 32.768 kHz crystal oscillator and selects it, or the
//! internal RC, as timing-domain slow clock.

use embedded_hal::delay::DelayNs;

use crate::bus::RegisterBus;

const SCKC_CR: usize = 0x0;
const CR_OSC32EN: u32 = 1 << 1;
const CR_OSCSEL: u32 = 1 << 24;

/// Crystal start-up time
const OSC32_STARTUP_US: u32 = 1200;
/// Five slow clock cycles, for the source switch to settle
const SWITCH_SETTLE_US: u32 = (5 * 1_000_000 + 32_767) / 32_768;

/// `td_slck` selector: 0 is the RC oscillator, 1 the crystal
#[derive(Debug, Copy, Clone)]
pub struct SlowMux {
    pub base: usize,
}

impl SlowMux {
    pub fn current_select<B: RegisterBus>(&self, bus: &mut B) -> u32 {
        u32::from(bus.read(self.base, SCKC_CR) & CR_OSCSEL != 0)
    }

    /// Switching to the crystal starts it first if needed. Switching back to
    /// the RC stops the crystal.
    pub fn set_parent<B: RegisterBus, D: DelayNs>(&self, bus: &mut B, delay: &mut D, select: u32) {
        if self.current_select(bus) == select {
            return;
        }

        if select != 0 {
            if bus.read(self.base, SCKC_CR) & CR_OSC32EN == 0 {
                bus.update(self.base, SCKC_CR, CR_OSC32EN, CR_OSC32EN);
                delay.delay_us(OSC32_STARTUP_US);
            }
            bus.update(self.base, SCKC_CR, CR_OSCSEL, CR_OSCSEL);
            delay.delay_us(SWITCH_SETTLE_US);
        } else {
            bus.update(self.base, SCKC_CR, CR_OSCSEL, 0);
            delay.delay_us(SWITCH_SETTLE_US);
            bus.update(self.base, SCKC_CR, CR_OSC32EN, 0);
        }
    }
}
