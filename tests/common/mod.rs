//! Register-level model of the SAMA7G5 PMC and SCKC, just detailed enough
//! for the clock drivers to run against it on the host.

#![allow(dead_code)]

use std::collections::HashMap;

use at91_pmc::bus::RegisterBus;
use at91_pmc::sama7g5::{PMC_BASE, SCKC_BASE};
use embedded_hal::delay::DelayNs;

const SCER: usize = 0x00;
const SCDR: usize = 0x04;
const SCSR: usize = 0x08;
const PLL_CTRL0: usize = 0x0c;
const PLL_CTRL1: usize = 0x10;
const PLL_ACR: usize = 0x18;
const PLL_UPDT: usize = 0x1c;
const CKGR_MOR: usize = 0x20;
const MCKR: usize = 0x28;
const MCR: usize = 0x30;
const PMC_SR: usize = 0x68;
const XTALF: usize = 0x74;
const PCR: usize = 0x88;
const PLL_ISR0: usize = 0xec;

const UPDT_ID_MASK: u32 = 0xf;
const UPDT_UPDATE: u32 = 1 << 8;
const MCR_ID_MASK: u32 = 0xf;
const MCR_CMD: u32 = 1 << 7;
const PCR_PID_MASK: u32 = 0x7f;
const PCR_CMD: u32 = 1 << 31;

const SR_MOSCS: u32 = 1 << 0;
const SR_MCKRDY: u32 = 1 << 3;
const SR_MCKXRDY: u32 = 1 << 7;
const SR_PCKRDY: u32 = 0xff << 8;
const SR_MOSCSELS: u32 = 1 << 16;
const SR_MOSCRCS: u32 = 1 << 17;

/// Register file of one PMC plus its slow clock controller
#[derive(Default)]
pub struct Sama7g5Sim {
    pmc: HashMap<usize, u32>,
    sckc: u32,
    pll: HashMap<(u32, usize), u32>,
    mcr: HashMap<u32, u32>,
    pcr: HashMap<u32, u32>,
    pub writes: Vec<(usize, usize, u32)>,
}

impl Sama7g5Sim {
    /// Oscillators stable, main clock on the crystal, every master and
    /// programmable clock ready
    pub fn new() -> Self {
        let mut sim = Sama7g5Sim::default();
        sim.pmc.insert(
            PMC_SR,
            SR_MOSCS | SR_MCKRDY | SR_MCKXRDY | SR_PCKRDY | SR_MOSCSELS | SR_MOSCRCS,
        );
        sim.pmc.insert(CKGR_MOR, (1 << 24) | (1 << 3) | 1);
        sim
    }

    fn reg(&self, offset: usize) -> u32 {
        self.pmc.get(&offset).copied().unwrap_or(0)
    }

    fn pll_id(&self) -> u32 {
        self.reg(PLL_UPDT) & UPDT_ID_MASK
    }

    /// Preset a banked PLL register of PLL `id`
    pub fn set_pll(&mut self, id: u32, offset: usize, value: u32) {
        self.pll.insert((id, offset), value);
    }

    pub fn pll(&self, id: u32, offset: usize) -> u32 {
        self.pll.get(&(id, offset)).copied().unwrap_or(0)
    }

    /// Preset `PMC_MCKR`
    pub fn set_mckr(&mut self, value: u32) {
        self.pmc.insert(MCKR, value);
    }

    /// Preset the `PMC_MCR` slot of `MCKx`
    pub fn set_mcr(&mut self, id: u32, value: u32) {
        self.mcr.insert(id, value & !(MCR_ID_MASK | MCR_CMD));
    }

    pub fn mcr(&self, id: u32) -> u32 {
        self.mcr.get(&id).copied().unwrap_or(0)
    }

    /// Configuration stored for peripheral `id`
    pub fn pcr(&self, id: u32) -> u32 {
        self.pcr.get(&id).copied().unwrap_or(0)
    }

    pub fn set_pcr(&mut self, id: u32, value: u32) {
        self.pcr.insert(id, value & !(PCR_PID_MASK | PCR_CMD));
    }

    pub fn sckc(&self) -> u32 {
        self.sckc
    }

    pub fn scsr(&self) -> u32 {
        self.reg(SCSR)
    }

    pub fn xtalf(&self) -> u32 {
        self.reg(XTALF)
    }

    /// Values written to one PMC register, in order
    pub fn writes_to(&self, offset: usize) -> Vec<u32> {
        self.writes
            .iter()
            .filter(|w| w.0 == PMC_BASE && w.1 == offset)
            .map(|w| w.2)
            .collect()
    }

    pub fn pmc_writes(&self) -> usize {
        self.writes.iter().filter(|w| w.0 == PMC_BASE).count()
    }
}

impl RegisterBus for Sama7g5Sim {
    fn read(&mut self, base: usize, offset: usize) -> u32 {
        if base == SCKC_BASE {
            return self.sckc;
        }
        assert_eq!(base, PMC_BASE, "access outside the PMC");
        match offset {
            PLL_CTRL0 | PLL_CTRL1 | PLL_ACR => self.pll(self.pll_id(), offset),
            MCR => {
                let id = self.reg(MCR) & MCR_ID_MASK;
                self.mcr(id) | id
            }
            PCR => {
                let id = self.reg(PCR) & PCR_PID_MASK;
                self.pcr(id) | id
            }
            _ => self.reg(offset),
        }
    }

    fn write(&mut self, base: usize, offset: usize, value: u32) {
        self.writes.push((base, offset, value));
        if base == SCKC_BASE {
            self.sckc = value;
            return;
        }
        assert_eq!(base, PMC_BASE, "access outside the PMC");
        match offset {
            SCER => *self.pmc.entry(SCSR).or_default() |= value,
            SCDR => *self.pmc.entry(SCSR).or_default() &= !value,
            PLL_CTRL0 | PLL_CTRL1 | PLL_ACR => {
                let id = self.pll_id();
                self.pll.insert((id, offset), value);
            }
            PLL_UPDT => {
                let id = value & UPDT_ID_MASK;
                if value & UPDT_UPDATE != 0 {
                    *self.pmc.entry(PLL_ISR0).or_default() |= 1 << id;
                }
                self.pmc.insert(PLL_UPDT, value & !UPDT_UPDATE);
            }
            MCR => {
                let id = value & MCR_ID_MASK;
                self.pmc.insert(MCR, id);
                if value & MCR_CMD != 0 {
                    self.set_mcr(id, value);
                }
            }
            PCR => {
                let id = value & PCR_PID_MASK;
                self.pmc.insert(PCR, id);
                if value & PCR_CMD != 0 {
                    self.set_pcr(id, value);
                }
            }
            _ => {
                self.pmc.insert(offset, value);
            }
        }
    }
}

/// Delay provider that only adds up the requested time
#[derive(Default)]
pub struct Elapsed {
    pub ns: u64,
}

impl DelayNs for Elapsed {
    fn delay_ns(&mut self, ns: u32) {
        self.ns += u64::from(ns);
    }
}
