//! Storage wire format
//!
//! Storage is the only artifact that leaves the encoding party: `m` rows of
//! exactly `l / 8` bytes each, framed with bincode.

use serde::{Deserialize, Serialize};

use crate::error::{OkvsError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageFrame {
    pub byte_l: usize,
    pub rows: Vec<Vec<u8>>,
}

impl StorageFrame {
    pub fn new(byte_l: usize, rows: Vec<Vec<u8>>) -> Result<Self> {
        let frame = Self { byte_l, rows };
        frame.validate()?;
        Ok(frame)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let frame: Self = bincode::deserialize(data)?;
        frame.validate()?;
        Ok(frame)
    }

    pub fn into_rows(self) -> Vec<Vec<u8>> {
        self.rows
    }

    fn validate(&self) -> Result<()> {
        if let Some((i, row)) = self
            .rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != self.byte_l)
        {
            return Err(OkvsError::PreconditionViolation(format!(
                "row {} has {} bytes, expected {}",
                i,
                row.len(),
                self.byte_l
            )));
        }
        Ok(())
    }
}
