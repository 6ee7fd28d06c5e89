//! BIF archive reader and bounded resource streams

use super::header::{BifHeader, VariableTableRecord};
use crate::config::{DecodeOptions, check_signature};
use crate::cursor::{ByteReader, MAX_PREALLOC};
use crate::error::{AuroraError, Result};
use crate::resource::{ResourceId, ResourceType};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use tracing::{debug, trace};

/// One variable resource stored in a BIF archive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableEntry {
    /// Decoded identifier from the table record
    pub id: ResourceId,
    /// Absolute payload offset
    pub offset: u32,
    /// Payload size in bytes
    pub size: u32,
    /// Resource type; [`VariableEntry::OUT_OF_RANGE_TYPE`] when the stored
    /// id does not fit the 16-bit type table
    pub resource_type: ResourceType,
}

impl VariableEntry {
    /// Type reported for stored type ids above `u16::MAX`
    pub const OUT_OF_RANGE_TYPE: ResourceType = ResourceType::Unknown(u16::MAX);
}

impl From<VariableTableRecord> for VariableEntry {
    fn from(record: VariableTableRecord) -> Self {
        let resource_type = u16::try_from(record.resource_type).map_or_else(
            |_| {
                trace!(
                    "Resource type {:#x} of {:#010x} is outside the type table",
                    record.resource_type, record.id
                );
                Self::OUT_OF_RANGE_TYPE
            },
            ResourceType::from_id,
        );
        Self {
            id: ResourceId::unpack(record.id),
            offset: record.offset,
            size: record.size,
            resource_type,
        }
    }
}

/// Open BIF archive over a forward-only byte source
///
/// The header and variable table are read once at open time. Payloads are
/// then exposed as [`ResourceReader`]s, which must be opened in
/// non-decreasing payload-offset order on one handle.
///
/// Two access modes share that rule:
/// - random: [`BifArchive::open_resource`] masks an id to its variable slot
///   and indexes the table directly;
/// - sequential: [`BifArchive::next_resource`] walks the table in stored order.
pub struct BifArchive<R> {
    reader: ByteReader<R>,
    header: BifHeader,
    entries: Vec<VariableEntry>,
    last_offset: Option<u64>,
    next: usize,
}

impl BifArchive<BufReader<File>> {
    /// Open a BIF archive from disk
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, DecodeOptions::default())
    }

    /// Open a BIF archive from disk with explicit options
    pub fn open_with<P: AsRef<Path>>(path: P, options: DecodeOptions) -> Result<Self> {
        let path = path.as_ref();
        debug!("Opening archive: {:?}", path);
        Self::read_with(BufReader::new(File::open(path)?), options)
    }
}

impl<R: Read> BifArchive<R> {
    /// Read the header and variable table from a byte source
    pub fn read(reader: R) -> Result<Self> {
        Self::read_with(reader, DecodeOptions::default())
    }

    /// Read the header and variable table with explicit options
    pub fn read_with(reader: R, options: DecodeOptions) -> Result<Self> {
        let mut reader = ByteReader::new(reader);
        let header: BifHeader = reader.read_record()?;
        check_signature(&options, BifHeader::SIGNATURE, header.signature)?;
        debug!(
            "BIF header: {} variable resources, {} fixed, table at {}",
            header.variable_count, header.fixed_count, header.variable_table_offset
        );
        if header.fixed_count > 0 {
            debug!("Ignoring {} fixed resources", header.fixed_count);
        }

        reader.seek_to(u64::from(header.variable_table_offset))?;
        let mut entries = Vec::with_capacity((header.variable_count as usize).min(MAX_PREALLOC));
        for _ in 0..header.variable_count {
            let record: VariableTableRecord = reader.read_record()?;
            entries.push(VariableEntry::from(record));
        }

        Ok(Self {
            reader,
            header,
            entries,
            last_offset: None,
            next: 0,
        })
    }

    /// Archive header
    pub fn header(&self) -> &BifHeader {
        &self.header
    }

    /// Variable table in stored order
    pub fn entries(&self) -> &[VariableEntry] {
        &self.entries
    }

    /// Table entry for an identifier's variable slot
    pub fn entry(&self, id: ResourceId) -> Option<&VariableEntry> {
        self.entries.get(usize::from(id.variable_slot))
    }

    /// Open a resource by identifier (random access)
    ///
    /// Only the 14-bit variable slot is used; the archive index is the
    /// caller's concern.
    pub fn open_resource(&mut self, id: ResourceId) -> Result<ResourceReader<'_, R>> {
        self.open_slot(id.variable_slot)
    }

    /// Open a resource by variable slot (random access)
    pub fn open_slot(&mut self, slot: u16) -> Result<ResourceReader<'_, R>> {
        let index = usize::from(slot & ResourceId::MAX_VARIABLE_SLOT);
        let entry = *self.entries.get(index).ok_or_else(|| {
            AuroraError::out_of_bounds("variable resource table", index as u64, self.entries.len() as u64)
        })?;
        if entry.id.variable_slot != slot {
            trace!(
                "Slot {} holds a record for slot {}",
                slot, entry.id.variable_slot
            );
        }
        self.open_entry(entry)
    }

    /// Open the next resource in stored table order (sequential access)
    ///
    /// Returns `None` once every table entry has been visited.
    pub fn next_resource(&mut self) -> Option<Result<(VariableEntry, ResourceReader<'_, R>)>> {
        let entry = *self.entries.get(self.next)?;
        self.next += 1;
        Some(self.open_entry(entry).map(|reader| (entry, reader)))
    }

    /// Read a whole resource into memory
    pub fn read_resource(&mut self, id: ResourceId) -> Result<Vec<u8>> {
        self.open_resource(id)?.read_to_vec()
    }

    /// Unwrap the underlying source
    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }

    fn open_entry(&mut self, entry: VariableEntry) -> Result<ResourceReader<'_, R>> {
        let offset = u64::from(entry.offset);
        if let Some(previous) = self.last_offset {
            if offset < previous {
                return Err(AuroraError::OutOfOrderResource {
                    previous,
                    requested: offset,
                });
            }
        }
        self.reader.seek_to(offset)?;
        self.last_offset = Some(offset);
        trace!(
            "Opened resource {} at {} ({} bytes)",
            entry.id, entry.offset, entry.size
        );
        Ok(ResourceReader {
            reader: &mut self.reader,
            declared: u64::from(entry.size),
            remaining: u64::from(entry.size),
        })
    }
}

/// Forward-only view of one resource payload
///
/// Reads stop at the declared size even if the archive holds more bytes.
pub struct ResourceReader<'a, R> {
    reader: &'a mut ByteReader<R>,
    declared: u64,
    remaining: u64,
}

impl<R: Read> ResourceReader<'_, R> {
    /// Declared payload size
    pub fn declared_size(&self) -> u64 {
        self.declared
    }

    /// Bytes not yet read
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Read the rest of the payload
    ///
    /// Fails with [`AuroraError::ShortResource`] if the archive ends before the
    /// declared size.
    pub fn read_to_vec(mut self) -> Result<Vec<u8>> {
        let already = self.declared - self.remaining;
        // Declared sizes come from the file; do not trust them for allocation
        let mut data = Vec::with_capacity(self.remaining.min(1 << 20) as usize);
        self.read_to_end(&mut data)?;
        if self.remaining > 0 {
            return Err(AuroraError::ShortResource {
                declared: self.declared,
                actual: already + data.len() as u64,
            });
        }
        Ok(data)
    }
}

impl<R: Read> Read for ResourceReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 {
            return Ok(0);
        }
        let max = buf.len().min(usize::try_from(self.remaining).unwrap_or(usize::MAX));
        let n = self.reader.read(&mut buf[..max])?;
        self.remaining -= n as u64;
        Ok(n)
    }
}
