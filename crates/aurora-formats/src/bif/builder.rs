//! BIF archive builder

use super::header::{BifHeader, VariableTableRecord};
use crate::cursor::{ByteWriter, FixedRecord};
use crate::error::{AuroraError, Result};
use crate::resource::{ResourceId, ResourceType};

/// Builder for BIF archives
///
/// Writes header, variable table, then payloads in insertion order, so the
/// result can be read back sequentially or by ascending slot.
pub struct BifBuilder {
    archive_index: u16,
    resources: Vec<(ResourceType, Vec<u8>)>,
}

impl BifBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self {
            archive_index: 0,
            resources: Vec::new(),
        }
    }

    /// Archive index to encode in each table record's identifier
    #[must_use]
    pub fn archive_index(mut self, archive_index: u16) -> Self {
        self.archive_index = archive_index;
        self
    }

    /// Add a resource payload, returning its variable slot
    pub fn add_resource(&mut self, data: Vec<u8>, resource_type: ResourceType) -> u16 {
        self.resources.push((resource_type, data));
        (self.resources.len() - 1) as u16
    }

    /// Number of resources added so far
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether no resources were added
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Serialize the archive
    pub fn build(&self) -> Result<Vec<u8>> {
        if self.resources.len() > usize::from(ResourceId::MAX_VARIABLE_SLOT) + 1 {
            return Err(AuroraError::InvalidFormat(format!(
                "{} resources exceed the variable slot range",
                self.resources.len()
            )));
        }

        let table_offset = BifHeader::SIZE;
        let mut payload_offset = table_offset + self.resources.len() * VariableTableRecord::SIZE;
        let total = payload_offset + self.resources.iter().map(|(_, d)| d.len()).sum::<usize>();

        let mut writer = ByteWriter::new(Vec::with_capacity(total));
        writer.write_record(&BifHeader {
            signature: BifHeader::SIGNATURE,
            version: BifHeader::DEFAULT_VERSION,
            variable_count: self.resources.len() as u32,
            fixed_count: 0,
            variable_table_offset: table_offset as u32,
        })?;

        for (slot, (resource_type, data)) in self.resources.iter().enumerate() {
            writer.write_record(&VariableTableRecord {
                id: ResourceId::new(self.archive_index, slot as u16).pack(),
                offset: to_u32(payload_offset)?,
                size: to_u32(data.len())?,
                resource_type: u32::from(resource_type.id()),
            })?;
            payload_offset += data.len();
        }

        for (_, data) in &self.resources {
            writer.write_bytes(data)?;
        }

        Ok(writer.into_inner())
    }
}

impl Default for BifBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn to_u32(value: usize) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| AuroraError::InvalidFormat(format!("Value {value} does not fit in 32 bits")))
}
