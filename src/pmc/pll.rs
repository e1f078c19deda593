//! Phase Locked Loop Configuration
//!
//! SAM9X60-style PLLs share one register window: `PLL_UPDT.ID` selects
//! which PLL the `CTRL0`/`CTRL1`/`ACR` registers address, and a write of
//! `PLL_UPDT.UPDATE` latches the staged values into that PLL. Lock status
//! for every PLL is reported in `PLL_ISR0`, one bit per id.
//!
//! The fractional core runs at `parent * (MUL + 1 + FRACR / 2^22)`. Each
//! core feeds one or two integer output dividers (`DIVPMC`, `DIVIO`)
//! running at `core / (DIV + 1)`.

use embedded_hal::delay::DelayNs;

use super::div_round_closest;
use crate::bus::{Field, RegisterBus};
use crate::node::ClockRange;
use crate::{Error, Result};

pub(crate) const PLL_CTRL0: usize = 0x0c;
pub(crate) const PLL_CTRL1: usize = 0x10;
pub(crate) const PLL_ACR: usize = 0x18;
pub(crate) const PLL_UPDT: usize = 0x1c;
pub(crate) const PLL_ISR0: usize = 0xec;

pub(crate) const CTRL0_ENPLL: u32 = 1 << 28;
pub(crate) const CTRL0_ENLOCK: u32 = 1 << 31;
pub(crate) const UPDT_ID: Field = Field::new(3, 0);
pub(crate) const UPDT_UPDATE: u32 = 1 << 8;

const ACR_UTMIVR: u32 = 1 << 12;
const ACR_UTMIBG: u32 = 1 << 13;
/// Recommended analog control values
const ACR_DEFAULT_PLLA: u32 = 0x0002_0010;
const ACR_DEFAULT_UPLL: u32 = 0x1202_0010;

/// Width of `FRACR`
const FRAC_BITS: u32 = 22;
const UTMI_SETTLE_US: u32 = 10;

/// Bit-fields of one PLL stage
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PllLayout {
    /// `CTRL1.MUL`, fractional cores only
    pub mul: Field,
    /// `CTRL1.FRACR`, fractional cores only
    pub frac: Field,
    /// `CTRL0.DIVPMC`/`DIVIO`, dividers only
    pub div: Field,
    /// End-of-divider enable in `CTRL0`, dividers only
    pub endiv: Field,
}

impl PllLayout {
    /// Layout of a fractional core
    pub const fn fractional(mul: Field, frac: Field) -> Self {
        PllLayout {
            mul,
            frac,
            div: Field::none(),
            endiv: Field::none(),
        }
    }

    /// Layout of an output divider
    pub const fn divider(div: Field, endiv: Field) -> Self {
        PllLayout {
            mul: Field::none(),
            frac: Field::none(),
            div,
            endiv,
        }
    }
}

/// Electrical limits of a PLL
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PllCharacteristics {
    /// Reference input
    pub input: ClockRange,
    /// Fractional core output
    pub core: ClockRange,
    /// Divider output
    pub output: ClockRange,
    /// UTMI-style PLL with bandgap and regulator to power up
    pub upll: bool,
}

/// PLL state, derived from `CTRL0.ENPLL` and the lock bit
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PllState {
    Disabled,
    Enabling,
    Locked,
    Disabling,
}

/// Register settings for a fractional core
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FracSetting {
    /// Value of `MUL`, i.e. the integer multiplier minus one
    pub mul: u32,
    /// Value of `FRACR`
    pub frac: u32,
    /// Resulting core rate in Hz
    pub rate: u32,
}

/// Window shared by all PLLs of one PMC
#[derive(Debug, Copy, Clone)]
struct Window {
    base: usize,
    id: u8,
}

impl Window {
    fn lock_bit(&self) -> u32 {
        1 << self.id
    }

    /// Point `CTRL0`/`CTRL1`/`ACR` at this PLL
    fn select<B: RegisterBus>(&self, bus: &mut B) {
        bus.update(
            self.base,
            PLL_UPDT,
            UPDT_ID.mask,
            UPDT_ID.prep(self.id.into()),
        );
    }

    /// Latch the staged registers into this PLL
    fn commit<B: RegisterBus>(&self, bus: &mut B) {
        bus.update(
            self.base,
            PLL_UPDT,
            UPDT_UPDATE | UPDT_ID.mask,
            UPDT_UPDATE | UPDT_ID.prep(self.id.into()),
        );
    }

    fn is_locked<B: RegisterBus>(&self, bus: &mut B) -> bool {
        bus.read(self.base, PLL_ISR0) & self.lock_bit() != 0
    }

    fn wait_lock<B: RegisterBus>(&self, bus: &mut B) {
        wait_ready!(bus, self.base, PLL_ISR0, self.lock_bit());
    }

    fn state<B: RegisterBus>(&self, bus: &mut B) -> PllState {
        self.select(bus);
        let enabled = bus.read(self.base, PLL_CTRL0) & CTRL0_ENPLL != 0;
        match (enabled, self.is_locked(bus)) {
            (false, false) => PllState::Disabled,
            (true, false) => PllState::Enabling,
            (true, true) => PllState::Locked,
            (false, true) => PllState::Disabling,
        }
    }
}

fn saturate(rate: u64) -> u32 {
    u32::try_from(rate).unwrap_or(u32::MAX)
}

/// Fractional PLL core
#[derive(Debug, Copy, Clone)]
pub struct FracPll {
    pub base: usize,
    pub id: u8,
    pub layout: &'static PllLayout,
    pub characteristics: &'static PllCharacteristics,
}

impl FracPll {
    fn window(&self) -> Window {
        Window {
            base: self.base,
            id: self.id,
        }
    }

    /// Multiplier and fraction giving the rate closest to `target`
    ///
    /// Fails with [`Error::OutOfRange`] when `parent` lies outside the input
    /// range, or when `target` or the rate actually achievable lies outside
    /// the core characteristics.
    pub fn compute(&self, parent: u32, target: u32) -> Result<FracSetting> {
        let PllCharacteristics { input, core, .. } = *self.characteristics;
        if parent == 0 || !input.contains(parent) || !core.contains(target) {
            return Err(Error::OutOfRange);
        }

        let parent = u64::from(parent);
        let mut mul = u64::from(target) / parent;
        let remainder = u64::from(target) - mul * parent;
        let mut frac = 0;
        if remainder != 0 {
            frac = div_round_closest(remainder << FRAC_BITS, parent);
            if frac == 1 << FRAC_BITS {
                mul += 1;
                frac = 0;
            }
        }
        let rate = parent * mul + div_round_closest(frac * parent, 1 << FRAC_BITS);

        let rate = u32::try_from(rate).map_err(|_| Error::OutOfRange)?;
        if !core.contains(rate) || mul == 0 || mul - 1 > u64::from(self.layout.mul.max()) {
            return Err(Error::OutOfRange);
        }

        Ok(FracSetting {
            mul: (mul - 1) as u32,
            frac: frac as u32,
            rate,
        })
    }

    pub fn state<B: RegisterBus>(&self, bus: &mut B) -> PllState {
        self.window().state(bus)
    }

    pub fn recalc_rate<B: RegisterBus>(&self, bus: &mut B, parent: u32) -> u32 {
        let window = self.window();
        window.select(bus);
        let ctrl1 = bus.read(self.base, PLL_CTRL1);

        let parent = u64::from(parent);
        let mul = u64::from(self.layout.mul.get(ctrl1)) + 1;
        let frac = u64::from(self.layout.frac.get(ctrl1));
        saturate(parent * mul + ((parent * frac) >> FRAC_BITS))
    }

    /// Program the core for `target` and wait for lock
    ///
    /// Does nothing beyond selecting the PLL when it is already locked with
    /// the same multiplier and fraction. Blocks until the lock bit is set.
    pub fn set_rate<B: RegisterBus>(&self, bus: &mut B, parent: u32, target: u32) -> Result<u32> {
        let setting = self.compute(parent, target)?;
        let window = self.window();

        window.select(bus);
        let ctrl1 = bus.read(self.base, PLL_CTRL1);
        if window.is_locked(bus)
            && self.layout.mul.get(ctrl1) == setting.mul
            && self.layout.frac.get(ctrl1) == setting.frac
        {
            return Ok(setting.rate);
        }

        trace!(
            "PLL{}: MUL {} FRACR {}",
            self.id,
            setting.mul,
            setting.frac
        );
        bus.write(
            self.base,
            PLL_CTRL1,
            self.layout.mul.prep(setting.mul) | self.layout.frac.prep(setting.frac),
        );
        window.commit(bus);
        bus.update(
            self.base,
            PLL_CTRL0,
            CTRL0_ENLOCK | CTRL0_ENPLL,
            CTRL0_ENLOCK | CTRL0_ENPLL,
        );
        window.commit(bus);
        window.wait_lock(bus);

        Ok(setting.rate)
    }

    /// Power up the PLL with its current settings and wait for lock
    pub fn enable<B: RegisterBus, D: DelayNs>(&self, bus: &mut B, delay: &mut D) {
        let window = self.window();
        if window.is_locked(bus) {
            return;
        }
        window.select(bus);

        let upll = self.characteristics.upll;
        let mut acr = if upll {
            ACR_DEFAULT_UPLL
        } else {
            ACR_DEFAULT_PLLA
        };
        bus.write(self.base, PLL_ACR, acr);

        if upll {
            // Bandgap first, then the regulator
            acr |= ACR_UTMIBG;
            bus.write(self.base, PLL_ACR, acr);
            delay.delay_us(UTMI_SETTLE_US);

            acr |= ACR_UTMIVR;
            bus.write(self.base, PLL_ACR, acr);
            delay.delay_us(UTMI_SETTLE_US);
        }

        window.commit(bus);
        bus.update(
            self.base,
            PLL_CTRL0,
            CTRL0_ENLOCK | CTRL0_ENPLL,
            CTRL0_ENLOCK | CTRL0_ENPLL,
        );
        window.commit(bus);
        window.wait_lock(bus);
    }

    pub fn disable<B: RegisterBus>(&self, bus: &mut B) {
        let window = self.window();
        window.select(bus);
        bus.update(self.base, PLL_CTRL0, CTRL0_ENPLL, 0);
        if self.characteristics.upll {
            bus.update(self.base, PLL_ACR, ACR_UTMIBG | ACR_UTMIVR, 0);
        }
        window.commit(bus);
    }
}

/// Integer output divider of a fractional PLL
#[derive(Debug, Copy, Clone)]
pub struct DivPll {
    pub base: usize,
    pub id: u8,
    pub layout: &'static PllLayout,
    pub characteristics: &'static PllCharacteristics,
}

impl DivPll {
    fn window(&self) -> Window {
        Window {
            base: self.base,
            id: self.id,
        }
    }

    /// Divider field value and resulting rate for `target`
    pub fn compute(&self, parent: u32, target: u32) -> Result<(u32, u32)> {
        if target == 0 {
            return Err(Error::OutOfRange);
        }
        let ratio = div_round_closest(u64::from(parent), u64::from(target));
        if ratio == 0 || ratio - 1 > u64::from(self.layout.div.max()) {
            return Err(Error::OutOfRange);
        }
        let rate = (u64::from(parent) / ratio) as u32;
        if !self.characteristics.output.contains(rate) {
            return Err(Error::OutOfRange);
        }
        Ok(((ratio - 1) as u32, rate))
    }

    pub fn state<B: RegisterBus>(&self, bus: &mut B) -> PllState {
        self.window().state(bus)
    }

    pub fn recalc_rate<B: RegisterBus>(&self, bus: &mut B, parent: u32) -> u32 {
        self.window().select(bus);
        let div = self.layout.div.get(bus.read(self.base, PLL_CTRL0));
        parent / (div + 1)
    }

    /// Program the divider for `target` and wait for lock
    pub fn set_rate<B: RegisterBus>(&self, bus: &mut B, parent: u32, target: u32) -> Result<u32> {
        let (div, rate) = self.compute(parent, target)?;
        let window = self.window();

        window.select(bus);
        let ctrl0 = bus.read(self.base, PLL_CTRL0);
        if window.is_locked(bus) && self.layout.div.get(ctrl0) == div {
            return Ok(rate);
        }

        trace!("PLL{}: DIV {}", self.id, div);
        bus.update(self.base, PLL_CTRL0, self.layout.div.mask, self.layout.div.prep(div));
        window.commit(bus);
        window.wait_lock(bus);

        Ok(rate)
    }

    pub fn enable<B: RegisterBus>(&self, bus: &mut B) {
        let window = self.window();
        window.select(bus);
        if bus.read(self.base, PLL_CTRL0) & self.layout.endiv.mask != 0 {
            return;
        }
        bus.update(
            self.base,
            PLL_CTRL0,
            self.layout.endiv.mask,
            self.layout.endiv.mask,
        );
        window.commit(bus);
        window.wait_lock(bus);
    }

    pub fn disable<B: RegisterBus>(&self, bus: &mut B) {
        let window = self.window();
        window.select(bus);
        bus.update(self.base, PLL_CTRL0, self.layout.endiv.mask, 0);
        window.commit(bus);
    }

    /// Divider output enabled
    pub fn is_enabled<B: RegisterBus>(&self, bus: &mut B) -> bool {
        self.window().select(bus);
        bus.read(self.base, PLL_CTRL0) & self.layout.endiv.mask != 0
    }
}
