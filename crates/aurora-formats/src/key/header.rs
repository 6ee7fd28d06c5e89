//! Fixed-size KEY records

use crate::cursor::FixedRecord;
use binrw::{BinRead, BinWrite};

/// KEY file header
///
/// - Signature `"KEY "` (4 bytes)
/// - Version (4 bytes)
/// - File count, key count (u32 each)
/// - File table offset, key table offset (u32 each)
/// - Build year, build day (u32 each)
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[br(little)]
#[bw(little)]
pub struct KeyHeader {
    /// File signature, `"KEY "`
    pub signature: [u8; 4],
    /// Format version, e.g. `"V1  "`
    pub version: [u8; 4],
    /// Number of archive files in the file table
    pub file_count: u32,
    /// Number of records in the key table
    pub key_count: u32,
    /// Absolute offset of the file table
    pub file_table_offset: u32,
    /// Absolute offset of the key table
    pub key_table_offset: u32,
    /// Years since 1900
    pub build_year: u32,
    /// Day of the year
    pub build_day: u32,
}

impl KeyHeader {
    /// Expected signature
    pub const SIGNATURE: [u8; 4] = *b"KEY ";
    /// Version written by [`super::KeyBuilder`]
    pub const DEFAULT_VERSION: [u8; 4] = *b"V1  ";
}

impl FixedRecord for KeyHeader {
    const SIZE: usize = 32;
}

/// File-table record; the name itself lives in a separate names region
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[br(little)]
#[bw(little)]
pub struct FileTableRecord {
    /// Archive file size in bytes
    pub size: u32,
    /// Absolute offset of the file name
    pub name_offset: u32,
    /// Name length in bytes (including any terminator)
    pub name_size: u16,
    /// Install-location bit flags
    pub drive_flags: u16,
}

impl FixedRecord for FileTableRecord {
    const SIZE: usize = 12;
}

/// Key-table record
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[br(little)]
#[bw(little)]
pub struct KeyTableRecord {
    /// Resource name, NUL padded
    pub name: [u8; 16],
    /// Numeric resource type
    pub resource_type: u16,
    /// Packed composite identifier
    pub resource_id: u32,
}

impl FixedRecord for KeyTableRecord {
    const SIZE: usize = 22;
}
