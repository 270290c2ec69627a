//! Garbled tables and the translation table, in their flat wire formats.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ErrorKind;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("Row size must be non-zero")]
    ZeroRowSize,
    #[error("Table of {len} bytes is not a whole number of {row_size}-byte rows")]
    PartialRow { len: usize, row_size: usize },
    #[error("Expected {expected} garbled tables, got {actual}")]
    TableCount { expected: usize, actual: usize },
    #[error("Table {index}: expected {expected} rows, got {actual}")]
    RowCount {
        index: usize,
        expected: usize,
        actual: usize,
    },
    #[error("Table {index}: expected {expected}-byte rows, got {actual}")]
    RowSize {
        index: usize,
        expected: usize,
        actual: usize,
    },
    #[error("Serialized tables: expected {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },
    #[error("Translation table: expected {expected} entries, got {actual}")]
    TranslationLength { expected: usize, actual: usize },
    #[error("Translation table byte {index} is {value}, expected 0 or 1")]
    TranslationByte { index: usize, value: u8 },
}
pub type TableError = Error;

impl Error {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::MalformedInput
    }
}

/// `rows × row_size` bytes, row-major by permuted position.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GarbledTable {
    bytes: Vec<u8>,
    row_size: usize,
}

impl GarbledTable {
    pub fn from_bytes(bytes: Vec<u8>, row_size: usize) -> Result<Self, TableError> {
        if row_size == 0 {
            return Err(TableError::ZeroRowSize);
        }
        if bytes.len() % row_size != 0 {
            return Err(TableError::PartialRow {
                len: bytes.len(),
                row_size,
            });
        }
        Ok(Self { bytes, row_size })
    }

    pub fn rows(&self) -> usize {
        self.bytes.len() / self.row_size
    }

    pub fn row_size(&self) -> usize {
        self.row_size
    }

    /// Row at permuted position `position`.
    pub fn row(&self, position: usize) -> Option<&[u8]> {
        let start = position.checked_mul(self.row_size)?;
        self.bytes.get(start..start + self.row_size)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Mutable access for tests that tamper with single bytes.
    #[cfg(test)]
    pub(crate) fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

impl fmt::Debug for GarbledTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GarbledTable")
            .field("rows", &self.rows())
            .field("row_size", &self.row_size)
            .finish()
    }
}

/// One table per gate, in gate order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GarbledTables(Vec<GarbledTable>);

impl GarbledTables {
    pub fn new(tables: Vec<GarbledTable>) -> Self {
        Self(tables)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&GarbledTable> {
        self.0.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GarbledTable> {
        self.0.iter()
    }

    /// Check the tables against the number of rows each gate needs.
    pub fn check_layout(&self, row_counts: &[usize], row_size: usize) -> Result<(), TableError> {
        if self.0.len() != row_counts.len() {
            return Err(TableError::TableCount {
                expected: row_counts.len(),
                actual: self.0.len(),
            });
        }
        for (index, (table, &expected)) in self.0.iter().zip(row_counts).enumerate() {
            if table.row_size != row_size {
                return Err(TableError::RowSize {
                    index,
                    expected: row_size,
                    actual: table.row_size,
                });
            }
            if table.rows() != expected {
                return Err(TableError::RowCount {
                    index,
                    expected,
                    actual: table.rows(),
                });
            }
        }
        Ok(())
    }

    /// Flat concatenation of every table, no headers.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.iter().flat_map(|t| t.bytes.iter().copied()).collect()
    }

    /// Split a flat buffer produced by [`Self::to_bytes`] using the row
    /// count of each gate.
    pub fn from_bytes(
        bytes: &[u8],
        row_counts: &[usize],
        row_size: usize,
    ) -> Result<Self, TableError> {
        if row_size == 0 {
            return Err(TableError::ZeroRowSize);
        }
        let expected = row_counts
            .iter()
            .try_fold(0usize, |total, rows| total.checked_add(rows.checked_mul(row_size)?));
        if expected != Some(bytes.len()) {
            return Err(TableError::Length {
                expected: expected.unwrap_or(usize::MAX),
                actual: bytes.len(),
            });
        }

        let mut offset = 0;
        let tables = row_counts
            .iter()
            .map(|rows| {
                let len = rows * row_size;
                let table = GarbledTable {
                    bytes: bytes[offset..offset + len].to_vec(),
                    row_size,
                };
                offset += len;
                table
            })
            .collect();
        Ok(Self(tables))
    }
}

impl From<Vec<GarbledTable>> for GarbledTables {
    fn from(tables: Vec<GarbledTable>) -> Self {
        Self(tables)
    }
}

/// Signal bit of every output wire, in declared output order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TranslationTable(Vec<bool>);

impl TranslationTable {
    pub fn new(signal_bits: Vec<bool>) -> Self {
        Self(signal_bits)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<bool> {
        self.0.get(index).copied()
    }

    pub fn bits(&self) -> &[bool] {
        &self.0
    }

    /// One byte (`0` or `1`) per output wire.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.iter().map(|bit| *bit as u8).collect()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TableError> {
        bytes
            .iter()
            .enumerate()
            .map(|(index, &value)| match value {
                0 => Ok(false),
                1 => Ok(true),
                _ => Err(TableError::TranslationByte { index, value }),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_row_counts_do_not_overflow() {
        assert_eq!(
            GarbledTables::from_bytes(&[0; 64], &[usize::MAX, 2], 32),
            Err(TableError::Length {
                expected: usize::MAX,
                actual: 64
            })
        );
    }

    #[test]
    fn tables_split_by_row_counts() {
        let a = GarbledTable::from_bytes(vec![1; 4 * 32], 32).unwrap();
        let b = GarbledTable::from_bytes(vec![2; 2 * 32], 32).unwrap();
        let tables = GarbledTables::new(vec![a, b]);

        let flat = tables.to_bytes();
        assert_eq!(flat.len(), 6 * 32);
        assert_eq!(GarbledTables::from_bytes(&flat, &[4, 2], 32).unwrap(), tables);
        assert_eq!(
            GarbledTables::from_bytes(&flat[1..], &[4, 2], 32),
            Err(TableError::Length {
                expected: 192,
                actual: 191
            })
        );
    }

    #[test]
    fn layout_check_reports_first_mismatch() {
        let tables = GarbledTables::new(vec![
            GarbledTable::from_bytes(vec![0; 4 * 32], 32).unwrap(),
            GarbledTable::from_bytes(vec![0; 4 * 32], 32).unwrap(),
        ]);
        assert!(tables.check_layout(&[4, 4], 32).is_ok());
        assert_eq!(
            tables.check_layout(&[4, 2], 32),
            Err(TableError::RowCount {
                index: 1,
                expected: 2,
                actual: 4
            })
        );
        assert_eq!(
            tables.check_layout(&[4], 32),
            Err(TableError::TableCount {
                expected: 1,
                actual: 2
            })
        );
    }

    #[test]
    fn row_lookup_is_bounded() {
        let table = GarbledTable::from_bytes((0..64).collect(), 32).unwrap();
        assert_eq!(table.row(1).unwrap()[0], 32);
        assert!(table.row(2).is_none());
        assert!(GarbledTable::from_bytes(vec![0; 33], 32).is_err());
    }

    #[test]
    fn translation_bytes_are_strict() {
        let table = TranslationTable::new(vec![true, false, true]);
        assert_eq!(table.to_bytes(), [1, 0, 1]);
        assert_eq!(TranslationTable::from_bytes(&[1, 0, 1]).unwrap(), table);
        assert_eq!(
            TranslationTable::from_bytes(&[1, 2]),
            Err(TableError::TranslationByte { index: 1, value: 2 })
        );
    }
}
