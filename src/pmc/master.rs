//! Master clocks
//!
//! `MCK0` feeds the CPU bus matrix and is configured directly in
//! `PMC_MCKR`: a source select, a power-of-two prescaler and a divisor
//! chosen from a small table. `MCK1`..`MCK4` share the indexed `PMC_MCR`
//! register: the `ID` field picks the master clock, a write with `CMD` set
//! applies the new fields.

use crate::bus::{Field, RegisterBus};
use crate::node::ClockRange;
use crate::pmc::PMC_SR;
use crate::{Error, Result};

pub(crate) const SR_MCKRDY: u32 = 1 << 3;
pub(crate) const SR_MCKXRDY: u32 = 1 << 7;

const MCR: usize = 0x30;
const MCR_ID: Field = Field::new(3, 0);
const MCR_CMD: u32 = 1 << 7;
const MCR_DIV: Field = Field::new(10, 8);
const MCR_CSS: Field = Field::new(20, 16);
const MCR_EN: u32 = 1 << 28;

/// Bit-fields of a directly configured master clock register
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MasterLayout {
    pub offset: usize,
    pub css: Field,
    pub pres: Field,
    pub mdiv: Field,
}

/// Output limits and divisor table
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MasterCharacteristics {
    /// Allowed output; unconstrained for the indexed masters
    pub output: ClockRange,
    /// Divisor selected by each `MDIV` code
    pub divisors: &'static [u32],
    /// The largest prescaler code divides by three instead of a power of two
    pub have_div3_pres: bool,
}

#[derive(Debug, Copy, Clone)]
pub enum MasterStyle {
    /// Own register (`PMC_MCKR`)
    Direct(&'static MasterLayout),
    /// Slot `id` of `PMC_MCR`
    Indexed { id: u8 },
}

/// A master clock
#[derive(Debug, Copy, Clone)]
pub struct Master {
    pub base: usize,
    pub style: MasterStyle,
    pub characteristics: &'static MasterCharacteristics,
    /// `PMC_SR` bit acknowledging a change
    pub ready: u32,
}

impl Master {
    /// `(css, pres, mdiv)` fields
    fn fields(&self) -> (Field, Field, Field) {
        match self.style {
            MasterStyle::Direct(layout) => (layout.css, layout.pres, layout.mdiv),
            MasterStyle::Indexed { .. } => (MCR_CSS, MCR_DIV, Field::none()),
        }
    }

    fn wait_ready<B: RegisterBus>(&self, bus: &mut B) {
        wait_ready!(bus, self.base, PMC_SR, self.ready);
    }

    fn read_config<B: RegisterBus>(&self, bus: &mut B) -> u32 {
        match self.style {
            MasterStyle::Direct(layout) => bus.read(self.base, layout.offset),
            MasterStyle::Indexed { id } => critical_section::with(|_| {
                bus.write(self.base, MCR, MCR_ID.prep(id.into()));
                bus.read(self.base, MCR)
            }),
        }
    }

    /// Replace `mask` with `bits` and wait for the ready flag
    fn apply<B: RegisterBus>(&self, bus: &mut B, mask: u32, bits: u32) {
        match self.style {
            MasterStyle::Direct(layout) => bus.update(self.base, layout.offset, mask, bits),
            MasterStyle::Indexed { id } => {
                let id = MCR_ID.prep(id.into());
                critical_section::with(|_| {
                    bus.write(self.base, MCR, id);
                    bus.update(
                        self.base,
                        MCR,
                        mask | MCR_CMD | MCR_ID.mask,
                        bits | MCR_CMD | id,
                    );
                });
            }
        }
        self.wait_ready(bus);
    }

    /// Division applied by prescaler code `code`
    fn prescale(&self, code: u32) -> u32 {
        let (_, pres, _) = self.fields();
        if self.characteristics.have_div3_pres && code == pres.max() {
            3
        } else {
            1 << code
        }
    }

    /// Prescaler codes that select a valid division
    fn prescaler_codes(&self) -> impl Iterator<Item = u32> {
        let (_, pres, _) = self.fields();
        let last = if self.characteristics.have_div3_pres {
            pres.max()
        } else {
            pres.max().saturating_sub(1)
        };
        0..=last
    }

    pub fn current_select<B: RegisterBus>(&self, bus: &mut B) -> u32 {
        let (css, _, _) = self.fields();
        css.get(self.read_config(bus))
    }

    /// Fails with [`Error::UnknownSelect`] if `MDIV` holds a code with no
    /// divisor
    pub fn recalc_rate<B: RegisterBus>(&self, bus: &mut B, parent: u32) -> Result<u32> {
        let (_, pres, mdiv) = self.fields();
        let config = self.read_config(bus);
        let divisor = self
            .characteristics
            .divisors
            .get(mdiv.get(config) as usize)
            .copied()
            .ok_or(Error::UnknownSelect)?;
        Ok(parent / self.prescale(pres.get(config)) / divisor)
    }

    pub fn set_parent<B: RegisterBus>(&self, bus: &mut B, select: u32) {
        let (css, _, _) = self.fields();
        self.apply(bus, css.mask, css.prep(select));
    }

    /// Prescaler code, divisor code and rate closest to `target` inside the
    /// output range
    ///
    /// Ties keep the first pair found, smallest prescaler first.
    pub fn compute(&self, parent: u32, target: u32) -> Result<(u32, u32, u32)> {
        if target == 0 {
            return Err(Error::OutOfRange);
        }
        let (_, _, mdiv) = self.fields();
        let divisors = self.characteristics.divisors;
        let codes = if mdiv.is_present() {
            divisors.len().min(mdiv.max() as usize + 1)
        } else {
            1
        };

        let mut best: Option<(u32, u32, u32)> = None;
        let mut best_diff = u32::MAX;
        for pres in self.prescaler_codes() {
            let prescaled = parent / self.prescale(pres);
            for (code, &divisor) in divisors.iter().take(codes).enumerate() {
                let rate = prescaled / divisor;
                if !self.characteristics.output.contains(rate) {
                    continue;
                }
                let diff = rate.abs_diff(target);
                if best.is_none() || diff < best_diff {
                    best = Some((pres, code as u32, rate));
                    best_diff = diff;
                }
            }
        }
        best.ok_or(Error::OutOfRange)
    }

    /// Program prescaler then divisor, waiting for the ready flag after each
    ///
    /// A field already holding its new code is not written.
    pub fn set_rate<B: RegisterBus>(&self, bus: &mut B, parent: u32, target: u32) -> Result<u32> {
        let (pres_code, mdiv_code, rate) = self.compute(parent, target)?;
        let (_, pres, mdiv) = self.fields();

        let config = self.read_config(bus);
        let pres_changed = pres.get(config) != pres_code;
        let mdiv_changed = mdiv.is_present() && mdiv.get(config) != mdiv_code;
        if !pres_changed && !mdiv_changed {
            return Ok(rate);
        }

        trace!("MCK: PRES {} MDIV {}", pres_code, mdiv_code);
        if pres_changed {
            self.apply(bus, pres.mask, pres.prep(pres_code));
        }
        if mdiv_changed {
            self.apply(bus, mdiv.mask, mdiv.prep(mdiv_code));
        }
        Ok(rate)
    }

    /// Direct masters have no gate and always report enabled
    pub fn is_enabled<B: RegisterBus>(&self, bus: &mut B) -> bool {
        match self.style {
            MasterStyle::Direct(_) => true,
            MasterStyle::Indexed { .. } => self.read_config(bus) & MCR_EN != 0,
        }
    }

    /// Only the indexed masters have an enable bit
    pub fn enable<B: RegisterBus>(&self, bus: &mut B) {
        if let MasterStyle::Indexed { .. } = self.style {
            self.apply(bus, MCR_EN, MCR_EN);
        }
    }

    pub fn disable<B: RegisterBus>(&self, bus: &mut B) {
        if let MasterStyle::Indexed { id } = self.style {
            let id = MCR_ID.prep(id.into());
            critical_section::with(|_| {
                bus.write(self.base, MCR, id);
                bus.update(
                    self.base,
                    MCR,
                    MCR_EN | MCR_CMD | MCR_ID.mask,
                    MCR_CMD | id,
                );
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockBus;

    const BASE: usize = 0xe001_8000;
    const MCKR: usize = 0x28;

    static MCK0_LAYOUT: MasterLayout = MasterLayout {
        offset: MCKR,
        css: Field::new(1, 0),
        pres: Field::new(6, 4),
        mdiv: Field::new(10, 8),
    };
    static MCK0_CHARACTERISTICS: MasterCharacteristics = MasterCharacteristics {
        output: ClockRange::new(140_000_000, 200_000_000),
        divisors: &[1, 2, 4, 3, 5],
        have_div3_pres: true,
    };
    static MCKX_CHARACTERISTICS: MasterCharacteristics = MasterCharacteristics {
        output: ClockRange::UNCONSTRAINED,
        divisors: &[1],
        have_div3_pres: false,
    };

    fn mck0() -> Master {
        Master {
            base: BASE,
            style: MasterStyle::Direct(&MCK0_LAYOUT),
            characteristics: &MCK0_CHARACTERISTICS,
            ready: SR_MCKRDY,
        }
    }

    fn mckx(id: u8) -> Master {
        Master {
            base: BASE,
            style: MasterStyle::Indexed { id },
            characteristics: &MCKX_CHARACTERISTICS,
            ready: SR_MCKXRDY,
        }
    }

    fn bus() -> MockBus {
        MockBus::new()
            .latch((BASE, MCKR), 0, (BASE, PMC_SR), SR_MCKRDY)
            .bank_self_indexed(BASE, MCR, MCR_ID, MCR_CMD)
            .latch((BASE, MCR), MCR_CMD, (BASE, PMC_SR), SR_MCKXRDY)
    }

    #[test]
    fn direct_rate_uses_prescaler_and_divisor_table() {
        let mut bus = bus();
        bus.set(BASE, MCKR, 3 << 8);
        assert_eq!(mck0().recalc_rate(&mut bus, 800_000_000), Ok(266_666_666));

        // Largest prescaler code is a division by three
        bus.set(BASE, MCKR, (7 << 4) | (1 << 8));
        assert_eq!(mck0().recalc_rate(&mut bus, 1_200_000_000), Ok(200_000_000));

        bus.set(BASE, MCKR, 5 << 8);
        assert_eq!(
            mck0().recalc_rate(&mut bus, 800_000_000),
            Err(Error::UnknownSelect)
        );
    }

    #[test]
    fn direct_set_rate_writes_prescaler_then_divisor() {
        let mut bus = bus();
        bus.set(BASE, MCKR, 1 | (1 << 4));

        assert_eq!(mck0().set_rate(&mut bus, 1_000_000_000, 200_000_000), Ok(200_000_000));

        let writes = bus.writes_to(BASE, MCKR);
        assert_eq!(writes, [1, 1 | (4 << 8)]);
        assert_eq!(mck0().recalc_rate(&mut bus, 1_000_000_000), Ok(200_000_000));
    }

    #[test]
    fn direct_set_rate_skips_unchanged_fields() {
        let mut bus = bus();
        bus.set(BASE, MCKR, 1);

        // Prescaler already /1, only MDIV differs
        mck0().set_rate(&mut bus, 800_000_000, 200_000_000).unwrap();
        assert_eq!(bus.writes_to(BASE, MCKR), [1 | (2 << 8)]);
        bus.clear_writes();

        mck0().set_rate(&mut bus, 800_000_000, 200_000_000).unwrap();
        assert!(bus.writes().is_empty());
    }

    #[test]
    fn indexed_set_rate_is_idempotent() {
        let mut bus = bus();
        let mck4 = mckx(4);
        mck4.set_rate(&mut bus, 800_000_000, 200_000_000).unwrap();
        bus.clear_writes();

        assert_eq!(mck4.set_rate(&mut bus, 800_000_000, 200_000_000), Ok(200_000_000));
        // Selecting the slot to read it back is the only access
        assert_eq!(bus.writes_to(BASE, MCR), [MCR_ID.prep(4)]);
        assert_eq!(bus.writes().len(), 1);
    }

    #[test]
    fn only_indexed_masters_report_their_gate() {
        let mut bus = bus();
        assert!(mck0().is_enabled(&mut bus));

        let mck2 = mckx(2);
        assert!(!mck2.is_enabled(&mut bus));
        mck2.enable(&mut bus);
        assert!(mck2.is_enabled(&mut bus));
    }

    #[test]
    fn ties_keep_the_smallest_prescaler() {
        // 600 MHz / 1 / 4 and 600 MHz / 2 / 2 are both exact
        assert_eq!(mck0().compute(600_000_000, 150_000_000), Ok((0, 2, 150_000_000)));
    }

    #[test]
    fn rates_outside_the_output_range_are_rejected() {
        let mut bus = bus();
        assert_eq!(
            mck0().set_rate(&mut bus, 24_000_000, 150_000_000),
            Err(Error::OutOfRange)
        );
        assert!(bus.writes().is_empty());

        // Closest in range, not closest overall
        assert_eq!(mck0().compute(800_000_000, 100_000_000), Ok((0, 4, 160_000_000)));
    }

    #[test]
    fn direct_parent_switch_waits_for_ready() {
        let mut bus = bus();
        mck0().set_parent(&mut bus, 2);
        assert_eq!(bus.get(BASE, MCKR), 2);
        assert_ne!(bus.get(BASE, PMC_SR) & SR_MCKRDY, 0);
        assert_eq!(mck0().current_select(&mut bus), 2);
    }

    #[test]
    fn indexed_masters_share_one_register() {
        let mut bus = bus();
        let mck1 = mckx(1);
        let mck3 = mckx(3);

        mck3.set_parent(&mut bus, 7);
        mck3.enable(&mut bus);
        assert_eq!(mck3.current_select(&mut bus), 7);
        assert_eq!(mck1.current_select(&mut bus), 0);

        let stored = bus.get_banked(BASE, MCR, 3);
        assert_eq!(MCR_CSS.get(stored), 7);
        assert_ne!(stored & MCR_EN, 0);

        mck3.disable(&mut bus);
        assert_eq!(bus.get_banked(BASE, MCR, 3) & MCR_EN, 0);
        assert_eq!(MCR_CSS.get(bus.get_banked(BASE, MCR, 3)), 7);
    }

    #[test]
    fn indexed_rate_is_a_power_of_two_division() {
        let mut bus = bus();
        let mck2 = mckx(2);
        bus.set_banked(BASE, MCR, 2, MCR_DIV.prep(2));
        assert_eq!(mck2.recalc_rate(&mut bus, 800_000_000), Ok(200_000_000));

        assert_eq!(mck2.set_rate(&mut bus, 800_000_000, 400_000_000), Ok(400_000_000));
        assert_eq!(MCR_DIV.get(bus.get_banked(BASE, MCR, 2)), 1);
        // Code 7 is reserved without the divide-by-three option
        assert_eq!(mck2.compute(800_000_000, 1), Ok((6, 0, 12_500_000)));
    }
}
