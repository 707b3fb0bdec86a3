//! The interrupt vector table.
//!
//! The vector table maps an interrupt (or system call) number to the address
//! of its interrupt service routine (ISR).
//!
//! A [`VectorTable`] is validated on construction and is never mutated during a run.
//! The built-in table ([`VectorTable::default`]) has 25 entries, but a table
//! can also be created from a list of [`VectorEntry`] or loaded from JSON.
//!
//! ```
//! use irqsim::sim::vector::VectorTable;
//!
//! let table = VectorTable::new([(1, 0x01A3), (2, 0x02F5)]).unwrap();
//! assert_eq!(table.resolve(1).unwrap(), 0x01A3);
//! assert_eq!(table.offset(2), 0x0002);
//! assert!(table.resolve(3).is_err());
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ast::IntVect;

use super::SimErr;

/// The size (in bytes) of one vector table slot.
///
/// This is used to compute the memory position of a vector in the table,
/// which is only used for display.
pub const VECTOR_STRIDE: u32 = 2;

/// The largest interrupt number a table may hold.
pub const MAX_VECTORS: IntVect = 256;

/// The ISR addresses of the built-in vector table,
/// where the `n`-th element (0-indexed) is the ISR address of interrupt `n + 1`.
const DEFAULT_ISRS: [u16; 25] = [
    0x01A3, 0x02F5, 0x04B1, 0x0632, 0x07C4,
    0x0885, 0x0A19, 0x0BDE, 0x0C7B, 0x0E3A,
    0x0F16, 0x10E8, 0x1294, 0x1357, 0x14C2,
    0x1609, 0x17AD, 0x18F3, 0x1A66, 0x1B21,
    0x1CE4, 0x1D8F, 0x1F30, 0x20B7, 0x2245,
];

/// Errors from constructing a vector table.
#[derive(Debug, thiserror::Error)]
pub enum TableErr {
    /// The same interrupt number appeared twice.
    #[error("interrupt {0} appears more than once in the vector table")]
    Duplicate(IntVect),
    /// Interrupt number 0 appeared.
    #[error("interrupt 0 cannot be in the vector table")]
    ZeroVect,
    /// An interrupt number above [`MAX_VECTORS`] appeared.
    #[error("interrupt {0} is out of range of the vector table")]
    OutOfRange(IntVect),
    /// The table's JSON could not be read.
    #[error("could not read vector table: {0}")]
    Json(#[from] serde_json::Error),
}
impl crate::err::Error for TableErr {
    fn help(&self) -> Option<std::borrow::Cow<str>> {
        match self {
            TableErr::Duplicate(_)  => Some("each interrupt number can only map to one ISR".into()),
            TableErr::ZeroVect      => Some("interrupt numbers start at 1".into()),
            TableErr::OutOfRange(_) => Some(format!("interrupt numbers must be between 1 and {MAX_VECTORS}").into()),
            TableErr::Json(_)       => Some("the table should be a JSON array of {\"interrupt\": n, \"isr_address\": a} objects".into()),
        }
    }
}

/// One entry of a vector table.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub struct VectorEntry {
    /// The interrupt number (1-based).
    pub interrupt: IntVect,
    /// The address of the interrupt's ISR.
    pub isr_address: u16
}
impl From<(IntVect, u16)> for VectorEntry {
    fn from((interrupt, isr_address): (IntVect, u16)) -> Self {
        VectorEntry { interrupt, isr_address }
    }
}

/// A static mapping from interrupt number to ISR address.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct VectorTable {
    entries: BTreeMap<IntVect, u16>
}
impl VectorTable {
    /// Creates a vector table out of the given entries.
    ///
    /// # Errors
    ///
    /// This fails if any interrupt number is duplicated, is 0, or exceeds [`MAX_VECTORS`].
    pub fn new<E: Into<VectorEntry>>(entries: impl IntoIterator<Item=E>) -> Result<Self, TableErr> {
        let mut map = BTreeMap::new();
        for VectorEntry { interrupt, isr_address } in entries.into_iter().map(Into::into) {
            match interrupt {
                0 => return Err(TableErr::ZeroVect),
                n if n > MAX_VECTORS => return Err(TableErr::OutOfRange(n)),
                n => if map.insert(n, isr_address).is_some() {
                    return Err(TableErr::Duplicate(n));
                }
            }
        }

        Ok(Self { entries: map })
    }

    /// Reads a vector table from a JSON array of [`VectorEntry`] objects.
    ///
    /// ```
    /// use irqsim::sim::vector::VectorTable;
    ///
    /// let table = VectorTable::from_json(r#"[
    ///     { "interrupt": 7, "isr_address": 14 },
    ///     { "interrupt": 12, "isr_address": 24 }
    /// ]"#).unwrap();
    /// assert_eq!(table.len(), 2);
    /// assert_eq!(table.resolve(12).unwrap(), 24);
    /// ```
    pub fn from_json(src: &str) -> Result<Self, TableErr> {
        let entries: Vec<VectorEntry> = serde_json::from_str(src)?;
        Self::new(entries)
    }

    /// Serializes the table into a JSON array of [`VectorEntry`] objects.
    pub fn to_json(&self) -> Result<String, TableErr> {
        let entries: Vec<_> = self.iter().collect();
        Ok(serde_json::to_string_pretty(&entries)?)
    }

    /// Looks up the ISR address of an interrupt.
    ///
    /// # Errors
    ///
    /// This fails with [`SimErr::UnknownInterrupt`] if the interrupt has no entry.
    pub fn resolve(&self, vect: IntVect) -> Result<u16, SimErr> {
        self.get(vect).ok_or(SimErr::UnknownInterrupt(vect))
    }

    /// Looks up the ISR address of an interrupt, returning `None` if it has no entry.
    pub fn get(&self, vect: IntVect) -> Option<u16> {
        self.entries.get(&vect).copied()
    }

    /// The memory position of the interrupt's slot in the table.
    ///
    /// This is `(vect - 1) * VECTOR_STRIDE`.
    pub fn offset(&self, vect: IntVect) -> u32 {
        u32::from(vect.saturating_sub(1)) * VECTOR_STRIDE
    }

    /// The number of entries in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the entries of the table, in interrupt number order.
    pub fn iter(&self) -> impl Iterator<Item=VectorEntry> + '_ {
        self.entries.iter()
            .map(|(&interrupt, &isr_address)| VectorEntry { interrupt, isr_address })
    }
}
impl Default for VectorTable {
    /// The built-in 25-entry vector table.
    fn default() -> Self {
        let entries = (1..).zip(DEFAULT_ISRS).collect();
        Self { entries }
    }
}

#[cfg(test)]
mod tests {
    use crate::sim::SimErr;

    use super::{TableErr, VectorTable, MAX_VECTORS};

    #[test]
    fn test_default_table() {
        let table = VectorTable::default();
        assert_eq!(table.len(), 25);
        assert_eq!(table.resolve(1), Ok(0x01A3));
        assert!(table.resolve(25).is_ok());
        assert_eq!(table.resolve(26), Err(SimErr::UnknownInterrupt(26)));
        assert_eq!(table.resolve(0), Err(SimErr::UnknownInterrupt(0)));
    }

    #[test]
    fn test_offset() {
        let table = VectorTable::default();
        assert_eq!(table.offset(1), 0x00);
        assert_eq!(table.offset(7), 0x0C);
        assert_eq!(table.offset(20), 0x26);
    }

    #[test]
    fn test_validation() {
        assert!(matches!(VectorTable::new([(1, 0x10), (1, 0x20)]), Err(TableErr::Duplicate(1))));
        assert!(matches!(VectorTable::new([(0, 0x10)]), Err(TableErr::ZeroVect)));
        assert!(matches!(VectorTable::new([(MAX_VECTORS + 1, 0x10)]), Err(TableErr::OutOfRange(257))));
        assert!(VectorTable::new([(MAX_VECTORS, 0x10)]).is_ok());
        assert!(VectorTable::new(Vec::<(u16, u16)>::new()).unwrap().is_empty());
    }

    #[test]
    fn test_json() {
        let table = VectorTable::new([(7, 0x0E), (12, 0x18), (20, 0x28), (22, 0x16)]).unwrap();
        let json = table.to_json().unwrap();
        assert_eq!(VectorTable::from_json(&json).unwrap(), table);

        assert!(matches!(VectorTable::from_json("[{ \"interrupt\": 3 }]"), Err(TableErr::Json(_))));
        assert!(matches!(
            VectorTable::from_json(r#"[{ "interrupt": 3, "isr_address": 1 }, { "interrupt": 3, "isr_address": 2 }]"#),
            Err(TableErr::Duplicate(3))
        ));
    }
}
