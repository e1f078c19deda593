//! Register access layer
//!
//! Every node reaches the hardware through a [`RegisterBus`]: 32-bit reads
//! and writes at a base address plus a byte offset. The base address is an
//! opaque handle supplied by the topology description. Firmware uses
//! [`Mmio`]; tests substitute a mock that records writes.
//!
//! Bit-fields are described with [`Field`] (mask + shift), mirroring the
//! `GENMASK`/`BIT` style of the reference manuals.

/// Access to 32-bit memory-mapped registers
///
/// No error is returned: a bad address is a contract violation of whoever
/// built the topology description, not a runtime condition.
pub trait RegisterBus {
    /// Read the register at `base + offset`
    fn read(&mut self, base: usize, offset: usize) -> u32;

    /// Write `value` to the register at `base + offset`
    fn write(&mut self, base: usize, offset: usize, value: u32);

    /// Read-modify-write: replace the bits selected by `mask` with the
    /// corresponding bits of `bits`, preserving everything outside `mask`
    fn update(&mut self, base: usize, offset: usize, mask: u32, bits: u32) {
        let value = self.read(base, offset);
        self.write(base, offset, (value & !mask) | (bits & mask));
    }
}

impl<B: RegisterBus + ?Sized> RegisterBus for &mut B {
    fn read(&mut self, base: usize, offset: usize) -> u32 {
        (**self).read(base, offset)
    }

    fn write(&mut self, base: usize, offset: usize, value: u32) {
        (**self).write(base, offset, value)
    }

    fn update(&mut self, base: usize, offset: usize, mask: u32, bits: u32) {
        (**self).update(base, offset, mask, bits)
    }
}

/// Volatile memory-mapped register access
#[derive(Debug)]
pub struct Mmio {
    _private: (),
}

impl Mmio {
    /// Create the memory-mapped bus
    ///
    /// # Safety
    ///
    /// Every `base + offset` later passed to this bus must be the address of
    /// a readable and writable 32-bit device register, and no other code may
    /// be accessing the same registers concurrently.
    pub unsafe fn new() -> Self {
        Mmio { _private: () }
    }
}

impl RegisterBus for Mmio {
    #[inline]
    fn read(&mut self, base: usize, offset: usize) -> u32 {
        // unsafe: address validity is guaranteed by the caller of `new`
        unsafe { core::ptr::read_volatile((base + offset) as *const u32) }
    }

    #[inline]
    fn write(&mut self, base: usize, offset: usize, value: u32) {
        // unsafe: address validity is guaranteed by the caller of `new`
        unsafe {
            core::ptr::write_volatile((base + offset) as *mut u32, value)
        }
    }
}

/// A register bit-field: an in-place mask and the position of its lowest bit
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Field {
    /// Mask of the field, in register position
    pub mask: u32,
    /// Position of the least significant bit of the field
    pub shift: u8,
}

impl Field {
    /// Bits `high..=low`, equivalent to `GENMASK(high, low)`
    pub const fn new(high: u8, low: u8) -> Self {
        assert!(high >= low && high < 32);
        let width = high - low + 1;
        let mask = if width == 32 {
            u32::MAX
        } else {
            ((1u32 << width) - 1) << low
        };
        Field { mask, shift: low }
    }

    /// A single bit, equivalent to `BIT(n)`
    pub const fn bit(n: u8) -> Self {
        Field::new(n, n)
    }

    /// An empty field, for layouts that do not implement it
    pub const fn none() -> Self {
        Field { mask: 0, shift: 0 }
    }

    /// Returns `true` when the layout implements this field
    pub const fn is_present(&self) -> bool {
        self.mask != 0
    }

    /// Largest value the field can hold
    pub const fn max(&self) -> u32 {
        self.mask >> self.shift
    }

    /// Extract the field from a register value
    pub const fn get(&self, reg: u32) -> u32 {
        (reg & self.mask) >> self.shift
    }

    /// Place `value` in register position, truncating to the field width
    pub const fn prep(&self, value: u32) -> u32 {
        (value << self.shift) & self.mask
    }
}
