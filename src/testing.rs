//! Mock register bus and delay used by the unit tests

use std::collections::BTreeMap;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;

use crate::bus::{Field, RegisterBus};

/// Registers that hold one value per peripheral/PLL id
enum Bank {
    /// `select` chooses the id, `offsets` are stored per id (PLL_UPDT
    /// style)
    External {
        base: usize,
        select: usize,
        id: Field,
        offsets: Vec<usize>,
    },
    /// The register carries its own id field; a write without `cmd` only
    /// selects, a write with `cmd` stores (PCR/MCR style)
    SelfIndexed {
        base: usize,
        offset: usize,
        id: Field,
        cmd: u32,
    },
}

/// A status bit set as a side-effect of a matching write
struct Latch {
    trigger: (usize, usize),
    trigger_mask: u32,
    status: (usize, usize),
    bits: LatchBits,
}

enum LatchBits {
    Fixed(u32),
    /// One bit per id, the id taken from the triggering write
    PerId(Field),
}

pub struct MockBus {
    regs: BTreeMap<(usize, usize), u32>,
    banked: BTreeMap<(usize, usize, u32), u32>,
    writes: Vec<(usize, usize, u32)>,
    banks: Vec<Bank>,
    latches: Vec<Latch>,
    self_clearing: Vec<((usize, usize), u32)>,
}

impl MockBus {
    pub fn new() -> Self {
        MockBus {
            regs: BTreeMap::new(),
            banked: BTreeMap::new(),
            writes: Vec::new(),
            banks: Vec::new(),
            latches: Vec::new(),
            self_clearing: Vec::new(),
        }
    }

    /// Preset a plain register without logging a write
    pub fn set(&mut self, base: usize, offset: usize, value: u32) {
        self.regs.insert((base, offset), value);
    }

    /// Current raw value of a plain register
    pub fn get(&self, base: usize, offset: usize) -> u32 {
        self.regs.get(&(base, offset)).copied().unwrap_or(0)
    }

    /// Preset the value one id sees in a banked register
    pub fn set_banked(&mut self, base: usize, offset: usize, id: u32, value: u32) {
        self.banked.insert((base, offset, id), value);
    }

    /// Value one id sees in a banked register
    pub fn get_banked(&self, base: usize, offset: usize, id: u32) -> u32 {
        self.banked.get(&(base, offset, id)).copied().unwrap_or(0)
    }

    pub fn bank_by_select(
        mut self,
        base: usize,
        select: usize,
        id: Field,
        offsets: &[usize],
    ) -> Self {
        self.banks.push(Bank::External {
            base,
            select,
            id,
            offsets: offsets.to_vec(),
        });
        self
    }

    pub fn bank_self_indexed(
        mut self,
        base: usize,
        offset: usize,
        id: Field,
        cmd: u32,
    ) -> Self {
        self.banks.push(Bank::SelfIndexed {
            base,
            offset,
            id,
            cmd,
        });
        self
    }

    /// Any write to `trigger` containing all of `trigger_mask` sets `bits`
    /// in `status`
    pub fn latch(
        mut self,
        trigger: (usize, usize),
        trigger_mask: u32,
        status: (usize, usize),
        bits: u32,
    ) -> Self {
        self.latches.push(Latch {
            trigger,
            trigger_mask,
            status,
            bits: LatchBits::Fixed(bits),
        });
        self
    }

    /// Like [`latch`](Self::latch) but sets `1 << id`, with the id read from
    /// the triggering write through `id`
    pub fn latch_per_id(
        mut self,
        trigger: (usize, usize),
        trigger_mask: u32,
        status: (usize, usize),
        id: Field,
    ) -> Self {
        self.latches.push(Latch {
            trigger,
            trigger_mask,
            status,
            bits: LatchBits::PerId(id),
        });
        self
    }

    /// Bits of a plain register that read back as zero after any write
    /// (strobes such as `PLL_UPDT.UPDATE`)
    pub fn self_clearing(mut self, base: usize, offset: usize, mask: u32) -> Self {
        self.self_clearing.push(((base, offset), mask));
        self
    }

    pub fn writes(&self) -> &[(usize, usize, u32)] {
        &self.writes
    }

    pub fn clear_writes(&mut self) {
        self.writes.clear();
    }

    /// Writes to one register, in order
    pub fn writes_to(&self, base: usize, offset: usize) -> Vec<u32> {
        self.writes
            .iter()
            .filter(|w| w.0 == base && w.1 == offset)
            .map(|w| w.2)
            .collect()
    }

    fn current_id(&self, base: usize, select: usize, id: &Field) -> u32 {
        id.get(self.get(base, select))
    }
}

impl Default for MockBus {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterBus for MockBus {
    fn read(&mut self, base: usize, offset: usize) -> u32 {
        for bank in &self.banks {
            match bank {
                Bank::External {
                    base: b,
                    select,
                    id,
                    offsets,
                } if *b == base && offsets.contains(&offset) => {
                    let id = self.current_id(base, *select, id);
                    return self.get_banked(base, offset, id);
                }
                Bank::SelfIndexed {
                    base: b,
                    offset: o,
                    id,
                    ..
                } if *b == base && *o == offset => {
                    let current = self.current_id(base, offset, id);
                    let stored = self.get_banked(base, offset, current);
                    return (stored & !id.mask) | id.prep(current);
                }
                _ => {}
            }
        }
        self.get(base, offset)
    }

    fn write(&mut self, base: usize, offset: usize, value: u32) {
        self.writes.push((base, offset, value));

        let mut handled = false;
        for bank in &self.banks {
            match bank {
                Bank::External {
                    base: b,
                    select,
                    id,
                    offsets,
                } if *b == base && offsets.contains(&offset) => {
                    let id = id.get(self.regs.get(&(base, *select)).copied().unwrap_or(0));
                    self.banked.insert((base, offset, id), value);
                    handled = true;
                }
                Bank::SelfIndexed {
                    base: b,
                    offset: o,
                    id,
                    cmd,
                } if *b == base && *o == offset => {
                    let target = id.get(value);
                    self.regs.insert((base, offset), id.prep(target));
                    if value & cmd != 0 {
                        self.banked.insert((base, offset, target), value & !cmd);
                    }
                    handled = true;
                }
                _ => {}
            }
        }
        if !handled {
            self.regs.insert((base, offset), value);
        }

        for latch in &self.latches {
            if latch.trigger == (base, offset)
                && value & latch.trigger_mask == latch.trigger_mask
            {
                let bits = match &latch.bits {
                    LatchBits::Fixed(bits) => *bits,
                    LatchBits::PerId(id) => 1 << id.get(value),
                };
                let status = self.regs.entry(latch.status).or_insert(0);
                *status |= bits;
            }
        }

        for (reg, mask) in &self.self_clearing {
            if *reg == (base, offset) {
                if let Some(value) = self.regs.get_mut(reg) {
                    *value &= !mask;
                }
            }
        }
    }
}

/// Delay provider that only accumulates the requested time
#[derive(Default)]
pub struct NoDelay {
    pub total_ns: u64,
}

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }
}
