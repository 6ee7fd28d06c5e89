//! KEY file builder

use super::file::KeyFile;
use super::header::{FileTableRecord, KeyHeader, KeyTableRecord};
use crate::cursor::{ByteWriter, FixedRecord};
use crate::error::{AuroraError, Result};
use crate::resource::{ResourceId, ResourceType};
use crate::value::fixed_name;

struct PendingFile {
    name: String,
    size: u32,
    drive_flags: u16,
}

struct PendingKey {
    name: String,
    resource_type: ResourceType,
    id: ResourceId,
}

/// Builder for KEY files
///
/// Lays the file out as header, file table, names region (in file order),
/// then key table.
///
/// # Example
///
/// ```rust
/// use aurora_formats::key::{KeyBuilder, KeyFile};
/// use aurora_formats::resource::ResourceType;
///
/// # fn main() -> aurora_formats::Result<()> {
/// let mut builder = KeyBuilder::new();
/// let bif = builder.add_file("data\\templates.bif", 0);
/// builder.add_key(bif, "geralt", ResourceType::Itp, 0)?;
///
/// let key = KeyFile::read(&builder.build()?[..])?;
/// assert_eq!(key.files[0].keys[0].name, "geralt");
/// # Ok(())
/// # }
/// ```
pub struct KeyBuilder {
    version: [u8; 4],
    build_year: u32,
    build_day: u32,
    files: Vec<PendingFile>,
    keys: Vec<PendingKey>,
}

impl KeyBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self {
            version: KeyHeader::DEFAULT_VERSION,
            build_year: 0,
            build_day: 0,
            files: Vec::new(),
            keys: Vec::new(),
        }
    }

    /// Create a builder that reproduces a parsed KEY file
    pub fn from_key_file(key: &KeyFile) -> Self {
        let mut builder = Self::new()
            .version(key.header.version)
            .build_date(key.header.build_year, key.header.build_day);
        for file in &key.files {
            builder.files.push(PendingFile {
                name: file.name.clone(),
                size: file.size,
                drive_flags: file.drive_flags,
            });
        }
        // Key-table order is not retained per file, so keys are emitted file by file
        for file in &key.files {
            for entry in &file.keys {
                builder.keys.push(PendingKey {
                    name: entry.name.clone(),
                    resource_type: entry.resource_type,
                    id: entry.id,
                });
            }
        }
        builder
    }

    /// Set the version field
    #[must_use]
    pub fn version(mut self, version: [u8; 4]) -> Self {
        self.version = version;
        self
    }

    /// Set the build date (years since 1900, day of year)
    #[must_use]
    pub fn build_date(mut self, year: u32, day: u32) -> Self {
        self.build_year = year;
        self.build_day = day;
        self
    }

    /// Add an archive file, returning its index
    pub fn add_file(&mut self, name: impl Into<String>, size: u32) -> u16 {
        self.files.push(PendingFile {
            name: name.into(),
            size,
            drive_flags: 1,
        });
        (self.files.len() - 1) as u16
    }

    /// Record the final size of an archive added earlier
    pub fn set_file_size(&mut self, file_index: u16, size: u32) -> Result<()> {
        let count = self.files.len() as u64;
        let file = self
            .files
            .get_mut(usize::from(file_index))
            .ok_or_else(|| AuroraError::out_of_bounds("key file table", file_index, count))?;
        file.size = size;
        Ok(())
    }

    /// Add a key pointing at a variable slot of an archive
    pub fn add_key(
        &mut self,
        file_index: u16,
        name: impl Into<String>,
        resource_type: ResourceType,
        variable_slot: u16,
    ) -> Result<()> {
        if usize::from(file_index) >= self.files.len() {
            return Err(AuroraError::ArchiveNotFound(file_index));
        }
        if file_index > ResourceId::MAX_ARCHIVE_INDEX || variable_slot > ResourceId::MAX_VARIABLE_SLOT {
            return Err(AuroraError::InvalidFormat(format!(
                "Resource id {file_index}:{variable_slot} does not fit the composite layout"
            )));
        }
        self.keys.push(PendingKey {
            name: name.into(),
            resource_type,
            id: ResourceId::new(file_index, variable_slot),
        });
        Ok(())
    }

    /// Serialize the KEY file
    pub fn build(&self) -> Result<Vec<u8>> {
        let file_table_offset = KeyHeader::SIZE;
        let names_offset = file_table_offset + self.files.len() * FileTableRecord::SIZE;
        let names_len: usize = self.files.iter().map(|f| f.name.len() + 1).sum();
        let key_table_offset = names_offset + names_len;

        let mut writer = ByteWriter::new(Vec::with_capacity(
            key_table_offset + self.keys.len() * KeyTableRecord::SIZE,
        ));
        writer.write_record(&KeyHeader {
            signature: KeyHeader::SIGNATURE,
            version: self.version,
            file_count: offset_u32(self.files.len())?,
            key_count: offset_u32(self.keys.len())?,
            file_table_offset: offset_u32(file_table_offset)?,
            key_table_offset: offset_u32(key_table_offset)?,
            build_year: self.build_year,
            build_day: self.build_day,
        })?;

        let mut name_offset = names_offset;
        for file in &self.files {
            let name_size = u16::try_from(file.name.len() + 1).map_err(|_| AuroraError::NameTooLong {
                name: file.name.clone(),
                len: file.name.len(),
                max: u16::MAX as usize - 1,
            })?;
            writer.write_record(&FileTableRecord {
                size: file.size,
                name_offset: offset_u32(name_offset)?,
                name_size,
                drive_flags: file.drive_flags,
            })?;
            name_offset += usize::from(name_size);
        }

        for file in &self.files {
            writer.write_bytes(file.name.as_bytes())?;
            writer.write_u8(0)?;
        }

        for key in &self.keys {
            writer.write_record(&KeyTableRecord {
                name: fixed_name(&key.name, 0)?,
                resource_type: key.resource_type.id(),
                resource_id: key.id.pack(),
            })?;
        }

        Ok(writer.into_inner())
    }
}

impl Default for KeyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn offset_u32(value: usize) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| AuroraError::InvalidFormat(format!("Offset {value} does not fit in 32 bits")))
}
