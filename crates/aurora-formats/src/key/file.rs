//! KEY file parsing

use super::header::{FileTableRecord, KeyHeader, KeyTableRecord};
use crate::config::{DecodeOptions, check_signature};
use crate::cursor::{ByteReader, MAX_PREALLOC};
use crate::error::{AuroraError, Result};
use crate::resource::{ResourceId, ResourceKey, ResourceType};
use crate::value::{decode_text, trim_fixed_name};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, trace};

/// One resource listed in a KEY file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEntry {
    /// Resource name, trimmed
    pub name: String,
    /// Resource type
    pub resource_type: ResourceType,
    /// Decoded composite identifier
    pub id: ResourceId,
}

impl KeyEntry {
    /// Lookup key for this entry
    pub fn key(&self) -> ResourceKey {
        ResourceKey::new(&self.name, self.resource_type)
    }
}

/// One archive file listed in a KEY file, with the keys that point into it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyFileEntry {
    /// Archive path as stored (usually backslash separated)
    pub name: String,
    /// Archive size in bytes
    pub size: u32,
    /// Install-location flags
    pub drive_flags: u16,
    /// Keys referencing this archive, in key-table order
    pub keys: Vec<KeyEntry>,
}

/// Parsed KEY file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyFile {
    /// File header
    pub header: KeyHeader,
    /// Archive files in file-table order
    pub files: Vec<KeyFileEntry>,
}

impl KeyFile {
    /// Open and parse a KEY file from disk
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, DecodeOptions::default())
    }

    /// Open and parse a KEY file from disk with explicit options
    pub fn open_with<P: AsRef<Path>>(path: P, options: DecodeOptions) -> Result<Self> {
        let path = path.as_ref();
        debug!("Opening key file: {:?}", path);
        Self::read_with(BufReader::new(File::open(path)?), options)
    }

    /// Parse a KEY file from a forward-only byte source
    pub fn read<R: Read>(reader: R) -> Result<Self> {
        Self::read_with(reader, DecodeOptions::default())
    }

    /// Parse a KEY file from a forward-only byte source with explicit options
    ///
    /// The file table is stored in archive order but the names region is not,
    /// so file-table records are sorted by name offset before the names are
    /// read in one forward pass.
    pub fn read_with<R: Read>(reader: R, options: DecodeOptions) -> Result<Self> {
        let mut reader = ByteReader::new(reader);

        let header: KeyHeader = reader.read_record()?;
        check_signature(&options, KeyHeader::SIGNATURE, header.signature)?;
        debug!(
            "KEY header: {} files, {} keys, file table at {}, key table at {}",
            header.file_count, header.key_count, header.file_table_offset, header.key_table_offset
        );

        reader.seek_to(u64::from(header.file_table_offset))?;
        let mut records = Vec::with_capacity((header.file_count as usize).min(MAX_PREALLOC));
        for _ in 0..header.file_count {
            records.push(reader.read_record::<FileTableRecord>()?);
        }

        let names = read_file_names(&mut reader, &records)?;
        let mut files: Vec<KeyFileEntry> = records
            .iter()
            .zip(names)
            .map(|(record, name)| KeyFileEntry {
                name,
                size: record.size,
                drive_flags: record.drive_flags,
                keys: Vec::new(),
            })
            .collect();

        reader.seek_to(u64::from(header.key_table_offset))?;
        for _ in 0..header.key_count {
            let record: KeyTableRecord = reader.read_record()?;
            let id = ResourceId::unpack(record.resource_id);
            let file_count = files.len() as u64;
            let file = files
                .get_mut(usize::from(id.archive_index))
                .ok_or_else(|| {
                    AuroraError::out_of_bounds("key file table", id.archive_index, file_count)
                })?;
            file.keys.push(KeyEntry {
                name: trim_fixed_name(&record.name),
                resource_type: ResourceType::from_id(record.resource_type),
                id,
            });
        }

        debug!("Parsed key file with {} archives", files.len());
        Ok(Self { header, files })
    }

    /// Every key with the index of the archive it lives in
    pub fn entries(&self) -> impl Iterator<Item = (usize, &KeyEntry)> {
        self.files
            .iter()
            .enumerate()
            .flat_map(|(i, file)| file.keys.iter().map(move |key| (i, key)))
    }

    /// First entry matching a resource key
    pub fn find(&self, key: &ResourceKey) -> Option<&KeyEntry> {
        self.entries()
            .map(|(_, entry)| entry)
            .find(|entry| {
                entry.resource_type == key.resource_type()
                    && entry.name.eq_ignore_ascii_case(key.name())
            })
    }

    /// Total number of keys
    pub fn key_count(&self) -> usize {
        self.files.iter().map(|f| f.keys.len()).sum()
    }
}

/// Read archive names in ascending name-offset order, returning them in file-table order
fn read_file_names<R: Read>(
    reader: &mut ByteReader<R>,
    records: &[FileTableRecord],
) -> Result<Vec<String>> {
    let mut order: Vec<usize> = (0..records.len()).collect();
    order.sort_by_key(|&i| records[i].name_offset);

    let mut names = vec![String::new(); records.len()];
    let mut previous: Option<(u32, String)> = None;
    for i in order {
        let record = &records[i];
        if let Some((offset, name)) = &previous {
            if *offset == record.name_offset {
                names[i] = name.clone();
                continue;
            }
        }
        reader.seek_to(u64::from(record.name_offset))?;
        let raw = reader.read_bytes(usize::from(record.name_size))?;
        let name = decode_text(raw).trim_end_matches('\0').to_string();
        trace!("File {} name at {}: {}", i, record.name_offset, name);
        names[i] = name.clone();
        previous = Some((record.name_offset, name));
    }
    Ok(names)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::cursor::ByteWriter;
    use pretty_assertions::assert_eq;

    /// Two files whose file-table order is the reverse of their name order
    fn reversed_names_key() -> Vec<u8> {
        let mut w = ByteWriter::new(Vec::new());
        w.write_record(&KeyHeader {
            signature: KeyHeader::SIGNATURE,
            version: KeyHeader::DEFAULT_VERSION,
            file_count: 2,
            key_count: 2,
            file_table_offset: 32,
            key_table_offset: 120,
            build_year: 107,
            build_day: 300,
        })
        .unwrap();
        // file 0: name at 100, file 1: name at 60
        w.write_record(&FileTableRecord {
            size: 4096,
            name_offset: 100,
            name_size: 11,
            drive_flags: 1,
        })
        .unwrap();
        w.write_record(&FileTableRecord {
            size: 8192,
            name_offset: 60,
            name_size: 10,
            drive_flags: 1,
        })
        .unwrap();
        w.pad_to(60).unwrap();
        w.write_bytes(b"data\\b.bif").unwrap();
        w.pad_to(100).unwrap();
        w.write_bytes(b"data\\a.bif\0").unwrap();
        w.pad_to(120).unwrap();
        w.write_record(&KeyTableRecord {
            name: *b"geralt\0\0\0\0\0\0\0\0\0\0",
            resource_type: ResourceType::Itp.id(),
            resource_id: 0x0010_0005,
        })
        .unwrap();
        w.write_record(&KeyTableRecord {
            name: *b"items\0\0\0\0\0\0\0\0\0\0\0",
            resource_type: ResourceType::TwoDa.id(),
            resource_id: 0x0000_0000,
        })
        .unwrap();
        w.into_inner()
    }

    #[test]
    fn test_names_read_in_offset_order() {
        let key = KeyFile::read(&reversed_names_key()[..]).unwrap();
        assert_eq!(key.files.len(), 2);
        assert_eq!(key.files[0].name, "data\\a.bif");
        assert_eq!(key.files[0].size, 4096);
        assert_eq!(key.files[1].name, "data\\b.bif");
        assert_eq!(key.files[1].size, 8192);
    }

    #[test]
    fn test_keys_attached_to_files() {
        let key = KeyFile::read(&reversed_names_key()[..]).unwrap();
        assert_eq!(key.key_count(), 2);

        let geralt = &key.files[1].keys[0];
        assert_eq!(geralt.name, "geralt");
        assert_eq!(geralt.resource_type, ResourceType::Itp);
        assert_eq!(geralt.id, ResourceId::new(1, 5));

        let items = &key.files[0].keys[0];
        assert_eq!(items.key(), ResourceKey::new("items", ResourceType::TwoDa));
        assert_eq!(
            key.find(&ResourceKey::new("GERALT", ResourceType::Itp)).unwrap().id.variable_slot,
            5
        );
    }

    #[test]
    fn test_key_referencing_missing_archive() {
        let mut data = reversed_names_key();
        // Point the second key at archive 7
        let id_offset = 120 + 22 + 18;
        data[id_offset..id_offset + 4].copy_from_slice(&0x0070_0000u32.to_le_bytes());
        let err = KeyFile::read(&data[..]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptIndex);
    }

    #[test]
    fn test_key_table_before_names_is_addressing_error() {
        let mut data = reversed_names_key();
        data[20..24].copy_from_slice(&64u32.to_le_bytes());
        let err = KeyFile::read(&data[..]).unwrap_err();
        assert!(matches!(err, AuroraError::BackwardSeek { .. }));
    }

    #[test]
    fn test_signature_checked() {
        let mut data = reversed_names_key();
        data[..4].copy_from_slice(b"BIFF");
        assert!(matches!(
            KeyFile::read(&data[..]),
            Err(AuroraError::InvalidSignature { .. })
        ));
        let lenient = DecodeOptions::default().without_signature_checks();
        assert!(KeyFile::read_with(&data[..], lenient).is_ok());
    }

    #[test]
    fn test_huge_file_count_is_truncation() {
        let mut w = ByteWriter::new(Vec::new());
        w.write_record(&KeyHeader {
            signature: KeyHeader::SIGNATURE,
            version: KeyHeader::DEFAULT_VERSION,
            file_count: 0x4000_0000,
            key_count: 0,
            file_table_offset: 32,
            key_table_offset: 32,
            build_year: 107,
            build_day: 1,
        })
        .unwrap();
        let data = w.into_inner();
        assert_eq!(data.len(), 32);

        let err = KeyFile::read(&data[..]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TruncatedData);
    }

    #[test]
    fn test_truncated_key_table() {
        let data = reversed_names_key();
        let err = KeyFile::read(&data[..data.len() - 5]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TruncatedData);
    }
}
