//! SAMA7G5 clock tree
//!
//! Register the whole PMC of a SAMA7G5 with [`register_all`], then apply the
//! boot-time defaults with [`setup`]:
//!
//! ```rust,ignore
//! let config = sama7g5::Config::new()
//!     .main_xtal(24.MHz())
//!     .slow_xtal(32_768.Hz());
//! let mut pmc: Pmc<_, _, { sama7g5::NODE_COUNT }> = Pmc::new(bus, delay);
//! sama7g5::register_all(&mut pmc, &config)?;
//! sama7g5::setup(&mut pmc, &config)?;
//! ```
//!
//! Core clocks keep the numbering of the `AT91_TO_CLK_ID(PMC_TYPE_CORE, n)`
//! device tree cells. System, peripheral and generic clocks are numbered by
//! their hardware id.

use embedded_hal::delay::DelayNs;
use heapless::Vec;

use crate::bus::{Field, RegisterBus};
use crate::mux::{MuxTable, MAX_PARENTS};
use crate::node::{ClockRange, Description, NodeKind};
use crate::pmc::generic::Generic;
use crate::pmc::main::{MainMux, MainOsc, MainRcOsc};
use crate::pmc::master::{
    Master, MasterCharacteristics, MasterLayout, MasterStyle, SR_MCKRDY, SR_MCKXRDY,
};
use crate::pmc::peripheral::{PcrLayout, Peripheral};
use crate::pmc::pll::{DivPll, FracPll, PllCharacteristics, PllLayout};
use crate::pmc::programmable::{Programmable, ProgrammableLayout};
use crate::pmc::slow::SlowMux;
use crate::pmc::system::System;
use crate::pmc::utmi::Utmi;
use crate::time::Hertz;
use crate::{ClockId, Error, Pmc, Result};

/// Default PMC base address
pub const PMC_BASE: usize = 0xe001_8000;
/// Default slow clock controller base address
pub const SCKC_BASE: usize = 0xe001_d050;

/// Rate of the 32 kHz RC oscillator
const MD_SLCK_RATE: u32 = 32_000;
const SLOW_XTAL_RATE: u32 = 32_768;
const MAIN_RC_RATE: u32 = 12_000_000;
const MAIN_XTAL_RATE: u32 = 24_000_000;

pub const MD_SLCK: ClockId = ClockId::slow(0);
pub const SLOW_XTAL: ClockId = ClockId::slow(1);
pub const TD_SLCK: ClockId = ClockId::slow(2);

pub const MAIN_XTAL: ClockId = ClockId::core(2);
pub const MAIN_RC: ClockId = ClockId::core(3);
pub const MAIN_RC_OSC: ClockId = ClockId::core(4);
pub const MAIN_OSC: ClockId = ClockId::core(5);
pub const MAINCK: ClockId = ClockId::core(6);

pub const PLL_CPU_FRAC: ClockId = ClockId::core(7);
pub const PLL_CPU_DIV: ClockId = ClockId::core(8);
pub const PLL_SYS_FRAC: ClockId = ClockId::core(9);
pub const PLL_SYS_DIV: ClockId = ClockId::core(10);
pub const PLL_DDR_FRAC: ClockId = ClockId::core(11);
pub const PLL_DDR_DIV: ClockId = ClockId::core(12);
pub const PLL_IMG_FRAC: ClockId = ClockId::core(13);
pub const PLL_IMG_DIV: ClockId = ClockId::core(14);
pub const PLL_BAUD_FRAC: ClockId = ClockId::core(15);
pub const PLL_BAUD_DIV: ClockId = ClockId::core(16);
pub const PLL_AUDIO_FRAC: ClockId = ClockId::core(17);
pub const PLL_AUDIO_DIVPMC: ClockId = ClockId::core(18);
pub const PLL_AUDIO_DIVIO: ClockId = ClockId::core(19);
pub const PLL_ETH_FRAC: ClockId = ClockId::core(20);
pub const PLL_ETH_DIV: ClockId = ClockId::core(21);

pub const MCK0: ClockId = ClockId::core(22);
pub const MCK1: ClockId = ClockId::core(23);
pub const MCK2: ClockId = ClockId::core(24);
pub const MCK3: ClockId = ClockId::core(25);
pub const MCK4: ClockId = ClockId::core(26);

/// 480 MHz USB PHY clock
pub const UTMI: ClockId = ClockId::core(27);

/// Programmable clocks `prog0`..`prog7`
pub const PROG: [ClockId; 8] = prog_ids();
pub const PROG0: ClockId = PROG[0];
/// System gates `pck0`..`pck7` of the programmable clocks
pub const PCK: [ClockId; 8] = pck_ids();
pub const PCK0: ClockId = PCK[0];

pub const FLEX0_CLK: ClockId = ClockId::peripheral(38);
pub const FLEX0_GCLK: ClockId = ClockId::generic(38);

const fn prog_ids() -> [ClockId; 8] {
    let mut ids = [ClockId::core(28); 8];
    let mut i = 0;
    while i < 8 {
        ids[i] = ClockId::core(28 + i as u8);
        i += 1;
    }
    ids
}

const fn pck_ids() -> [ClockId; 8] {
    let mut ids = [ClockId::system(8); 8];
    let mut i = 0;
    while i < 8 {
        ids[i] = ClockId::system(8 + i as u8);
        i += 1;
    }
    ids
}

static PLL_FRAC_LAYOUT: PllLayout = PllLayout::fractional(Field::new(31, 24), Field::new(21, 0));
static PLL_DIVPMC_LAYOUT: PllLayout = PllLayout::divider(Field::new(7, 0), Field::bit(29));
static PLL_DIVIO_LAYOUT: PllLayout = PllLayout::divider(Field::new(19, 12), Field::bit(30));

static PLL_CHARACTERISTICS: PllCharacteristics = PllCharacteristics {
    input: ClockRange::new(12_000_000, 50_000_000),
    core: ClockRange::new(600_000_000, 1_200_000_000),
    output: ClockRange::new(2_343_750, 1_200_000_000),
    upll: false,
};

static MCK0_LAYOUT: MasterLayout = MasterLayout {
    offset: 0x28,
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

static PROGRAMMABLE_LAYOUT: ProgrammableLayout = ProgrammableLayout {
    pres: Field::new(15, 8),
    css: Field::new(4, 0),
    ext: Field::none(),
    pres_direct: true,
};

/// Select codes of the programmable clock parents; code 4 is unused
const PROG_SELECTS: [u32; 10] = [0, 1, 2, 3, 5, 6, 7, 8, 9, 10];

static PCR_LAYOUT: PcrLayout = PcrLayout {
    offset: 0x88,
    cmd: 1 << 31,
    pid: Field::new(6, 0),
    div: Field::new(15, 14),
    gckcss: Field::new(12, 8),
    gckdiv: Field::new(27, 20),
    en: 1 << 28,
    gcken: 1 << 29,
    status: None,
};

/// Parents every `MCKx` and generic clock can select, with codes 0..=3
const BASE_PARENTS: [ClockId; 4] = [MD_SLCK, TD_SLCK, MAINCK, MCK0];

#[derive(Copy, Clone)]
enum PllStage {
    Frac,
    DivPmc,
    DivIo,
}

struct PllDesc {
    name: &'static str,
    id: ClockId,
    parent: ClockId,
    stage: PllStage,
    /// `PLL_UPDT.ID`
    pll: u8,
    critical: bool,
}

const fn pll(
    name: &'static str,
    id: ClockId,
    parent: ClockId,
    stage: PllStage,
    pll: u8,
    critical: bool,
) -> PllDesc {
    PllDesc {
        name,
        id,
        parent,
        stage,
        pll,
        critical,
    }
}

#[rustfmt::skip]
const PLLS: [PllDesc; 15] = [
    pll("cpupll_fracck", PLL_CPU_FRAC, MAINCK, PllStage::Frac, 0, true),
    pll("cpupll_divpmcck", PLL_CPU_DIV, PLL_CPU_FRAC, PllStage::DivPmc, 0, true),
    pll("syspll_fracck", PLL_SYS_FRAC, MAINCK, PllStage::Frac, 1, true),
    pll("syspll_divpmcck", PLL_SYS_DIV, PLL_SYS_FRAC, PllStage::DivPmc, 1, true),
    pll("ddrpll_fracck", PLL_DDR_FRAC, MAINCK, PllStage::Frac, 2, true),
    pll("ddrpll_divpmcck", PLL_DDR_DIV, PLL_DDR_FRAC, PllStage::DivPmc, 2, true),
    pll("imgpll_fracck", PLL_IMG_FRAC, MAINCK, PllStage::Frac, 3, false),
    pll("imgpll_divpmcck", PLL_IMG_DIV, PLL_IMG_FRAC, PllStage::DivPmc, 3, false),
    pll("baudpll_fracck", PLL_BAUD_FRAC, MAINCK, PllStage::Frac, 4, false),
    pll("baudpll_divpmcck", PLL_BAUD_DIV, PLL_BAUD_FRAC, PllStage::DivPmc, 4, false),
    pll("audiopll_fracck", PLL_AUDIO_FRAC, MAIN_OSC, PllStage::Frac, 5, false),
    pll("audiopll_divpmcck", PLL_AUDIO_DIVPMC, PLL_AUDIO_FRAC, PllStage::DivPmc, 5, false),
    pll("audiopll_diviock", PLL_AUDIO_DIVIO, PLL_AUDIO_FRAC, PllStage::DivIo, 5, false),
    pll("ethpll_fracck", PLL_ETH_FRAC, MAIN_OSC, PllStage::Frac, 6, false),
    pll("ethpll_divpmcck", PLL_ETH_DIV, PLL_ETH_FRAC, PllStage::DivPmc, 6, false),
];

/// `(parent, select)` pairs beyond [`BASE_PARENTS`]
type Extra = &'static [(ClockId, u32)];

const SYS: Extra = &[(PLL_SYS_DIV, 5)];
const DDR: Extra = &[(PLL_DDR_DIV, 6)];
const SYS_DDR_IMG: Extra = &[(PLL_SYS_DIV, 5), (PLL_DDR_DIV, 6), (PLL_IMG_DIV, 7)];
const SYS_BAUD: Extra = &[(PLL_SYS_DIV, 5), (PLL_BAUD_DIV, 8)];
const SYS_AUDIO: Extra = &[(PLL_SYS_DIV, 5), (PLL_AUDIO_DIVPMC, 9)];
const SYS_IMG_AUDIO: Extra = &[(PLL_SYS_DIV, 5), (PLL_IMG_DIV, 7), (PLL_AUDIO_DIVPMC, 9)];
const DDR_IMG: Extra = &[(PLL_DDR_DIV, 6), (PLL_IMG_DIV, 7)];
const AUDIO: Extra = &[(PLL_AUDIO_DIVPMC, 9)];
const ETH: Extra = &[(PLL_ETH_DIV, 10)];
const AUDIO_ETH: Extra = &[(PLL_AUDIO_DIVPMC, 9), (PLL_ETH_DIV, 10)];
const ALL_PLLS: Extra = &[
    (PLL_SYS_DIV, 5),
    (PLL_IMG_DIV, 7),
    (PLL_BAUD_DIV, 8),
    (PLL_AUDIO_DIVPMC, 9),
    (PLL_ETH_DIV, 10),
];

struct MckxDesc {
    name: &'static str,
    id: ClockId,
    /// `PMC_MCR.ID`
    index: u8,
    extra: Extra,
    critical: bool,
}

const MCKX: [MckxDesc; 4] = [
    MckxDesc {
        name: "mck1",
        id: MCK1,
        index: 1,
        extra: SYS,
        critical: true,
    },
    MckxDesc {
        name: "mck2",
        id: MCK2,
        index: 2,
        extra: DDR,
        critical: true,
    },
    MckxDesc {
        name: "mck3",
        id: MCK3,
        index: 3,
        extra: SYS_DDR_IMG,
        critical: false,
    },
    MckxDesc {
        name: "mck4",
        id: MCK4,
        index: 4,
        extra: SYS,
        critical: true,
    },
];

static PROG_NAMES: [&str; 8] = [
    "prog0", "prog1", "prog2", "prog3", "prog4", "prog5", "prog6", "prog7",
];
static PCK_NAMES: [&str; 8] = [
    "pck0", "pck1", "pck2", "pck3", "pck4", "pck5", "pck6", "pck7",
];

struct PeriphDesc {
    name: &'static str,
    parent: ClockId,
    id: u8,
    /// Zero when unconstrained
    max: u32,
}

const fn periph(name: &'static str, parent: ClockId, id: u8, max: u32) -> PeriphDesc {
    PeriphDesc {
        name,
        parent,
        id,
        max,
    }
}

const PERIPHERALS: [PeriphDesc; 73] = [
    periph("pioA_clk", MCK0, 11, 0),
    periph("sfr_clk", MCK1, 19, 0),
    periph("hsmc_clk", MCK1, 21, 0),
    periph("xdmac0_clk", MCK1, 22, 0),
    periph("xdmac1_clk", MCK1, 23, 0),
    periph("xdmac2_clk", MCK1, 24, 0),
    periph("acc_clk", MCK1, 25, 0),
    periph("aes_clk", MCK1, 27, 0),
    periph("tzaesbasc_clk", MCK1, 28, 0),
    periph("asrc_clk", MCK1, 30, 200_000_000),
    periph("cpkcc_clk", MCK0, 32, 0),
    periph("csi_clk", MCK3, 33, 266_000_000),
    periph("csi2dc_clk", MCK3, 34, 266_000_000),
    periph("eic_clk", MCK1, 37, 0),
    periph("flex0_clk", MCK1, 38, 0),
    periph("flex1_clk", MCK1, 39, 0),
    periph("flex2_clk", MCK1, 40, 0),
    periph("flex3_clk", MCK1, 41, 0),
    periph("flex4_clk", MCK1, 42, 0),
    periph("flex5_clk", MCK1, 43, 0),
    periph("flex6_clk", MCK1, 44, 0),
    periph("flex7_clk", MCK1, 45, 0),
    periph("flex8_clk", MCK1, 46, 0),
    periph("flex9_clk", MCK1, 47, 0),
    periph("flex10_clk", MCK1, 48, 0),
    periph("flex11_clk", MCK1, 49, 0),
    periph("gmac0_clk", MCK1, 51, 0),
    periph("gmac1_clk", MCK1, 52, 0),
    periph("gmac0_tsu_clk", MCK1, 53, 0),
    periph("gmac1_tsu_clk", MCK1, 54, 0),
    periph("icm_clk", MCK1, 55, 0),
    periph("isc_clk", MCK3, 56, 266_000_000),
    periph("i2smcc0_clk", MCK1, 57, 200_000_000),
    periph("i2smcc1_clk", MCK1, 58, 200_000_000),
    periph("matrix_clk", MCK1, 60, 0),
    periph("mcan0_clk", MCK1, 61, 200_000_000),
    periph("mcan1_clk", MCK1, 62, 200_000_000),
    periph("mcan2_clk", MCK1, 63, 200_000_000),
    periph("mcan3_clk", MCK1, 64, 200_000_000),
    periph("mcan4_clk", MCK1, 65, 200_000_000),
    periph("mcan5_clk", MCK1, 66, 200_000_000),
    periph("pdmc0_clk", MCK1, 68, 200_000_000),
    periph("pdmc1_clk", MCK1, 69, 200_000_000),
    periph("pit64b0_clk", MCK1, 70, 0),
    periph("pit64b1_clk", MCK1, 71, 0),
    periph("pit64b2_clk", MCK1, 72, 0),
    periph("pit64b3_clk", MCK1, 73, 0),
    periph("pit64b4_clk", MCK1, 74, 0),
    periph("pit64b5_clk", MCK1, 75, 0),
    periph("pwm_clk", MCK1, 77, 0),
    periph("qspi0_clk", MCK1, 78, 0),
    periph("qspi1_clk", MCK1, 79, 0),
    periph("sdmmc0_clk", MCK1, 80, 0),
    periph("sdmmc1_clk", MCK1, 81, 0),
    periph("sdmmc2_clk", MCK1, 82, 0),
    periph("sha_clk", MCK1, 83, 0),
    periph("spdifrx_clk", MCK1, 84, 200_000_000),
    periph("spdiftx_clk", MCK1, 85, 200_000_000),
    periph("ssc0_clk", MCK1, 86, 200_000_000),
    periph("ssc1_clk", MCK1, 87, 200_000_000),
    periph("tcb0_ch0_clk", MCK1, 88, 200_000_000),
    periph("tcb0_ch1_clk", MCK1, 89, 200_000_000),
    periph("tcb0_ch2_clk", MCK1, 90, 200_000_000),
    periph("tcb1_ch0_clk", MCK1, 91, 200_000_000),
    periph("tcb1_ch1_clk", MCK1, 92, 200_000_000),
    periph("tcb1_ch2_clk", MCK1, 93, 200_000_000),
    periph("tcpca_clk", MCK1, 94, 0),
    periph("tcpcb_clk", MCK1, 95, 0),
    periph("tdes_clk", MCK1, 96, 0),
    periph("trng_clk", MCK1, 97, 0),
    periph("udphsa_clk", MCK1, 104, 0),
    periph("udphsb_clk", MCK1, 105, 0),
    periph("uhphs_clk", MCK1, 106, 0),
];

struct GckDesc {
    name: &'static str,
    id: u8,
    max: u32,
    extra: Extra,
}

const fn gck(name: &'static str, id: u8, max: u32, extra: Extra) -> GckDesc {
    GckDesc {
        name,
        id,
        max,
        extra,
    }
}

const GENERICS: [GckDesc; 44] = [
    gck("adc_gclk", 26, 100_000_000, SYS_IMG_AUDIO),
    gck("asrc_gclk", 30, 200_000_000, AUDIO),
    gck("csi_gclk", 33, 27_000_000, DDR_IMG),
    gck("flex0_gclk", 38, 200_000_000, SYS_BAUD),
    gck("flex1_gclk", 39, 200_000_000, SYS_BAUD),
    gck("flex2_gclk", 40, 200_000_000, SYS_BAUD),
    gck("flex3_gclk", 41, 200_000_000, SYS_BAUD),
    gck("flex4_gclk", 42, 200_000_000, SYS_BAUD),
    gck("flex5_gclk", 43, 200_000_000, SYS_BAUD),
    gck("flex6_gclk", 44, 200_000_000, SYS_BAUD),
    gck("flex7_gclk", 45, 200_000_000, SYS_BAUD),
    gck("flex8_gclk", 46, 200_000_000, SYS_BAUD),
    gck("flex9_gclk", 47, 200_000_000, SYS_BAUD),
    gck("flex10_gclk", 48, 200_000_000, SYS_BAUD),
    gck("flex11_gclk", 49, 200_000_000, SYS_BAUD),
    gck("gmac0_gclk", 51, 125_000_000, ETH),
    gck("gmac1_gclk", 52, 50_000_000, ETH),
    gck("gmac0_tsu_gclk", 53, 300_000_000, AUDIO_ETH),
    gck("gmac1_tsu_gclk", 54, 300_000_000, AUDIO_ETH),
    gck("i2smcc0_gclk", 57, 100_000_000, SYS_AUDIO),
    gck("i2smcc1_gclk", 58, 100_000_000, SYS_AUDIO),
    gck("mcan0_gclk", 61, 200_000_000, SYS_BAUD),
    gck("mcan1_gclk", 62, 200_000_000, SYS_BAUD),
    gck("mcan2_gclk", 63, 200_000_000, SYS_BAUD),
    gck("mcan3_gclk", 64, 200_000_000, SYS_BAUD),
    gck("mcan4_gclk", 65, 200_000_000, SYS_BAUD),
    gck("mcan5_gclk", 66, 200_000_000, SYS_BAUD),
    gck("pdmc0_gclk", 68, 50_000_000, SYS_BAUD),
    gck("pdmc1_gclk", 69, 50_000_000, SYS_BAUD),
    gck("pit64b0_gclk", 70, 200_000_000, ALL_PLLS),
    gck("pit64b1_gclk", 71, 200_000_000, ALL_PLLS),
    gck("pit64b2_gclk", 72, 200_000_000, ALL_PLLS),
    gck("pit64b3_gclk", 73, 200_000_000, ALL_PLLS),
    gck("pit64b4_gclk", 74, 200_000_000, ALL_PLLS),
    gck("pit64b5_gclk", 75, 200_000_000, ALL_PLLS),
    gck("qspi0_gclk", 78, 200_000_000, SYS_BAUD),
    gck("qspi1_gclk", 79, 200_000_000, SYS_BAUD),
    gck("sdmmc0_gclk", 80, 208_000_000, SYS_BAUD),
    gck("sdmmc1_gclk", 81, 208_000_000, SYS_BAUD),
    gck("sdmmc2_gclk", 82, 208_000_000, SYS_BAUD),
    gck("spdifrx_gclk", 84, 150_000_000, SYS_AUDIO),
    gck("spdiftx_gclk", 85, 25_000_000, SYS_AUDIO),
    gck("tcb0_ch0_gclk", 88, 200_000_000, ALL_PLLS),
    gck("tcb1_ch0_gclk", 91, 200_000_000, ALL_PLLS),
];

/// Rates programmed by [`setup`]
static CLOCK_SETUP: [(ClockId, u32); 2] = [
    (PLL_ETH_FRAC, 625_000_000),
    (PLL_ETH_DIV, 625_000_000),
];

/// Slow clocks, main clock chain, MCK0, MCK1..4 and UTMI
const FIXED_NODES: usize = 3 + 5 + 1 + MCKX.len() + 1;

/// Number of nodes [`register_all`] registers
pub const NODE_COUNT: usize = FIXED_NODES
    + PLLS.len()
    + PROG.len()
    + PCK.len()
    + PERIPHERALS.len()
    + GENERICS.len();

/// Board description
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Config {
    pmc_base: usize,
    sckc_base: usize,
    main_xtal: u32,
    bypass_main_osc: bool,
    slow_xtal: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// 24 MHz main crystal, slow clock from the internal RC
    pub const fn new() -> Self {
        Config {
            pmc_base: PMC_BASE,
            sckc_base: SCKC_BASE,
            main_xtal: MAIN_XTAL_RATE,
            bypass_main_osc: false,
            slow_xtal: None,
        }
    }

    /// Frequency of the main crystal, or of the external clock on `XIN`
    #[must_use]
    pub fn main_xtal(mut self, freq: Hertz) -> Self {
        self.main_xtal = freq.raw();
        self
    }

    /// Use an external clock signal rather than a crystal oscillator,
    /// bypassing the XTAL driver.
    #[must_use]
    pub fn bypass_main_osc(mut self) -> Self {
        self.bypass_main_osc = true;
        self
    }

    /// A 32.768 kHz crystal is fitted; [`setup`] switches the timing
    /// domain slow clock to it
    #[must_use]
    pub fn slow_xtal(mut self, freq: Hertz) -> Self {
        self.slow_xtal = Some(freq.raw());
        self
    }

    #[must_use]
    pub fn pmc_base(mut self, base: usize) -> Self {
        self.pmc_base = base;
        self
    }

    #[must_use]
    pub fn sckc_base(mut self, base: usize) -> Self {
        self.sckc_base = base;
        self
    }
}

fn fixed(id: ClockId, name: &'static str, rate: u32) -> Description {
    Description::new(id, name, NodeKind::Fixed { rate })
}

/// Mux table of the base parents with codes 0..=3, followed by `extra`
fn with_extra(extra: Extra) -> Result<MuxTable> {
    let mut parents: Vec<ClockId, MAX_PARENTS> = Vec::new();
    let mut selects: Vec<u32, MAX_PARENTS> = Vec::new();
    let base = BASE_PARENTS.iter().copied().zip(0..);
    for (parent, select) in base.chain(extra.iter().copied()) {
        parents.push(parent).map_err(|_| Error::InvalidArgument)?;
        selects.push(select).map_err(|_| Error::InvalidArgument)?;
    }
    MuxTable::new(&parents, &selects)
}

/// Register every SAMA7G5 clock, parents first
///
/// `N` must be at least [`NODE_COUNT`].
pub fn register_all<B, D, const N: usize>(pmc: &mut Pmc<B, D, N>, config: &Config) -> Result<()>
where
    B: RegisterBus,
    D: DelayNs,
{
    let base = config.pmc_base;

    pmc.register_node(fixed(MD_SLCK, "md_slck", MD_SLCK_RATE))?;
    pmc.register_node(fixed(
        SLOW_XTAL,
        "slow_xtal",
        config.slow_xtal.unwrap_or(SLOW_XTAL_RATE),
    ))?;
    pmc.register_node(
        Description::new(
            TD_SLCK,
            "td_slck",
            NodeKind::SlowMux(SlowMux {
                base: config.sckc_base,
            }),
        )
        .parents(MuxTable::identity(&[MD_SLCK, SLOW_XTAL])?),
    )?;

    pmc.register_node(fixed(MAIN_XTAL, "main_xtal", config.main_xtal))?;
    pmc.register_node(fixed(MAIN_RC, "main_rc", MAIN_RC_RATE))?;
    pmc.register_node(
        Description::new(MAIN_RC_OSC, "main_rc_osc", NodeKind::MainRcOsc(MainRcOsc { base }))
            .parent(MAIN_RC),
    )?;
    pmc.register_node(
        Description::new(
            MAIN_OSC,
            "main_osc",
            NodeKind::MainOsc(MainOsc {
                base,
                bypass: config.bypass_main_osc,
            }),
        )
        .parent(MAIN_XTAL),
    )?;
    pmc.register_node(
        Description::new(MAINCK, "mainck", NodeKind::MainMux(MainMux { base }))
            .parents(MuxTable::identity(&[MAIN_RC_OSC, MAIN_OSC])?),
    )?;

    for desc in &PLLS {
        let kind = match desc.stage {
            PllStage::Frac => NodeKind::FracPll(FracPll {
                base,
                id: desc.pll,
                layout: &PLL_FRAC_LAYOUT,
                characteristics: &PLL_CHARACTERISTICS,
            }),
            PllStage::DivPmc | PllStage::DivIo => NodeKind::DivPll(DivPll {
                base,
                id: desc.pll,
                layout: match desc.stage {
                    PllStage::DivIo => &PLL_DIVIO_LAYOUT,
                    _ => &PLL_DIVPMC_LAYOUT,
                },
                characteristics: &PLL_CHARACTERISTICS,
            }),
        };
        let mut node = Description::new(desc.id, desc.name, kind).parent(desc.parent);
        if desc.critical {
            node = node.critical();
        }
        pmc.register_node(node)?;
    }

    pmc.register_node(
        Description::new(
            MCK0,
            "mck0",
            NodeKind::Master(Master {
                base,
                style: MasterStyle::Direct(&MCK0_LAYOUT),
                characteristics: &MCK0_CHARACTERISTICS,
                ready: SR_MCKRDY,
            }),
        )
        .parents(MuxTable::identity(&[MD_SLCK, MAINCK, PLL_CPU_DIV, PLL_SYS_DIV])?)
        .critical(),
    )?;

    for desc in &MCKX {
        let kind = NodeKind::Master(Master {
            base,
            style: MasterStyle::Indexed { id: desc.index },
            characteristics: &MCKX_CHARACTERISTICS,
            ready: SR_MCKXRDY,
        });
        let mut node = Description::new(desc.id, desc.name, kind).parents(with_extra(desc.extra)?);
        if desc.critical {
            node = node.critical();
        }
        pmc.register_node(node)?;
    }

    pmc.register_node(
        Description::new(UTMI, "utmick", NodeKind::Utmi(Utmi { base })).parent(MAIN_XTAL),
    )?;

    let prog_parents = [
        MD_SLCK,
        TD_SLCK,
        MAINCK,
        MCK0,
        PLL_SYS_DIV,
        PLL_DDR_DIV,
        PLL_IMG_DIV,
        PLL_BAUD_DIV,
        PLL_AUDIO_DIVPMC,
        PLL_ETH_DIV,
    ];
    for (i, (&id, &name)) in PROG.iter().zip(&PROG_NAMES).enumerate() {
        let kind = NodeKind::Programmable(Programmable {
            base,
            id: i as u8,
            layout: &PROGRAMMABLE_LAYOUT,
        });
        pmc.register_node(
            Description::new(id, name, kind).parents(MuxTable::new(&prog_parents, &PROG_SELECTS)?),
        )?;
    }

    for ((&id, &name), &parent) in PCK.iter().zip(&PCK_NAMES).zip(&PROG) {
        let kind = NodeKind::System(System {
            base,
            id: id.index(),
        });
        pmc.register_node(Description::new(id, name, kind).parent(parent))?;
    }

    for desc in &PERIPHERALS {
        let kind = NodeKind::Peripheral(Peripheral {
            base,
            id: desc.id,
            layout: &PCR_LAYOUT,
            range: ClockRange::up_to(desc.max),
        });
        pmc.register_node(
            Description::new(ClockId::peripheral(desc.id), desc.name, kind).parent(desc.parent),
        )?;
    }

    for desc in &GENERICS {
        let kind = NodeKind::Generic(Generic {
            base,
            id: desc.id,
            layout: &PCR_LAYOUT,
            range: ClockRange::up_to(desc.max),
            base_parents: BASE_PARENTS.len(),
        });
        pmc.register_node(
            Description::new(ClockId::generic(desc.id), desc.name, kind)
                .parents(with_extra(desc.extra)?),
        )?;
    }

    debug!("sama7g5: {} clocks registered", pmc.len());
    Ok(())
}

/// Boot-time clock setup
///
/// Moves the timing domain slow clock to the crystal when one is
/// configured, then runs the Ethernet PLL at 625 MHz.
pub fn setup<B, D, const N: usize>(pmc: &mut Pmc<B, D, N>, config: &Config) -> Result<()>
where
    B: RegisterBus,
    D: DelayNs,
{
    if config.slow_xtal.is_some() {
        pmc.set_parent(TD_SLCK, SLOW_XTAL)?;
    }
    for &(id, rate) in &CLOCK_SETUP {
        pmc.set_rate(id, Hertz::from_raw(rate))?;
    }
    Ok(())
}
