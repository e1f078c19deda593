//! Parent multiplexer translation
//!
//! A [`MuxTable`] pairs every logical parent of a node with the code the
//! hardware expects in the node's source-select field. Codes are not
//! always the table index: the SAMA7G5 programmable clocks skip code 4,
//! and generic clocks jump from the base parents straight to PLL codes
//! 5..=10.

use heapless::Vec;

use crate::{ClockId, Error, Result};

/// Maximum number of parents a single node can select between
pub const MAX_PARENTS: usize = 10;

/// One `(parent, select)` pair
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MuxEntry {
    /// Logical parent
    pub parent: ClockId,
    /// Hardware select code
    pub select: u32,
}

/// Ordered mapping between logical parents and hardware select codes
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MuxTable {
    entries: Vec<MuxEntry, MAX_PARENTS>,
}

impl MuxTable {
    /// Build a table from parallel parent and select slices
    ///
    /// Fails with [`Error::InvalidArgument`] if the slices differ in length,
    /// hold more than [`MAX_PARENTS`] entries, or repeat a select code.
    pub fn new(parents: &[ClockId], selects: &[u32]) -> Result<Self> {
        if parents.len() != selects.len() {
            return Err(Error::InvalidArgument);
        }
        let mut entries = Vec::new();
        for (&parent, &select) in parents.iter().zip(selects) {
            if entries.iter().any(|e: &MuxEntry| e.select == select) {
                return Err(Error::InvalidArgument);
            }
            entries
                .push(MuxEntry { parent, select })
                .map_err(|_| Error::InvalidArgument)?;
        }
        Ok(MuxTable { entries })
    }

    /// Table where each parent is selected by its own index
    pub fn identity(parents: &[ClockId]) -> Result<Self> {
        let mut entries = Vec::new();
        for (select, &parent) in (0..).zip(parents) {
            entries
                .push(MuxEntry { parent, select })
                .map_err(|_| Error::InvalidArgument)?;
        }
        Ok(MuxTable { entries })
    }

    /// Table for a node with one fixed parent and no select field
    pub fn single(parent: ClockId) -> Self {
        let mut entries = Vec::new();
        // Capacity is at least one
        let _ = entries.push(MuxEntry { parent, select: 0 });
        MuxTable { entries }
    }

    /// Table for a root node
    pub const fn empty() -> Self {
        MuxTable {
            entries: Vec::new(),
        }
    }

    /// Hardware select code of `parent`
    pub fn parent_id_to_select(&self, parent: ClockId) -> Result<u32> {
        self.entries
            .iter()
            .find(|e| e.parent == parent)
            .map(|e| e.select)
            .ok_or(Error::UnknownParent)
    }

    /// Table position of the parent the hardware selects with `select`
    pub fn select_to_parent_index(&self, select: u32) -> Result<usize> {
        self.entries
            .iter()
            .position(|e| e.select == select)
            .ok_or(Error::UnknownSelect)
    }

    /// Parent at table position `index`
    pub fn parent(&self, index: usize) -> Option<ClockId> {
        self.entries.get(index).map(|e| e.parent)
    }

    /// Table position of `parent`
    pub fn index_of(&self, parent: ClockId) -> Option<usize> {
        self.entries.iter().position(|e| e.parent == parent)
    }

    /// Entries in table order
    pub fn iter(&self) -> impl Iterator<Item = &MuxEntry> {
        self.entries.iter()
    }

    /// Number of selectable parents
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` for root nodes
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
