//! Fixed-size BIF records

use crate::cursor::FixedRecord;
use binrw::{BinRead, BinWrite};

/// BIF archive header
///
/// - Signature `"BIFF"` (4 bytes)
/// - Version (4 bytes)
/// - Variable resource count (u32)
/// - Fixed resource count (u32, legacy, always ignored)
/// - Variable table offset (u32)
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[br(little)]
#[bw(little)]
pub struct BifHeader {
    /// File signature, `"BIFF"`
    pub signature: [u8; 4],
    /// Format version, e.g. `"V1  "`
    pub version: [u8; 4],
    /// Number of variable-resource records
    pub variable_count: u32,
    /// Number of fixed-resource records
    pub fixed_count: u32,
    /// Absolute offset of the variable-resource table
    pub variable_table_offset: u32,
}

impl BifHeader {
    /// Expected signature
    pub const SIGNATURE: [u8; 4] = *b"BIFF";
    /// Version written by [`super::BifBuilder`]
    pub const DEFAULT_VERSION: [u8; 4] = *b"V1  ";
}

impl FixedRecord for BifHeader {
    const SIZE: usize = 20;
}

/// Variable-resource table record
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[br(little)]
#[bw(little)]
pub struct VariableTableRecord {
    /// Packed composite identifier
    pub id: u32,
    /// Absolute payload offset
    pub offset: u32,
    /// Payload size in bytes
    pub size: u32,
    /// Numeric resource type
    pub resource_type: u32,
}

impl FixedRecord for VariableTableRecord {
    const SIZE: usize = 16;
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use binrw::io::Cursor;

    #[test]
    fn test_header_parsing() {
        let data = [
            b'B', b'I', b'F', b'F', b'V', b'1', b' ', b' ', // signature + version
            3, 0, 0, 0, // variable count
            0, 0, 0, 0, // fixed count
            20, 0, 0, 0, // variable table offset
        ];
        let header = BifHeader::read(&mut Cursor::new(&data)).expect("Operation should succeed");
        assert_eq!(header.signature, BifHeader::SIGNATURE);
        assert_eq!(header.variable_count, 3);
        assert_eq!(header.fixed_count, 0);
        assert_eq!(header.variable_table_offset, 20);
    }

    #[test]
    fn test_variable_record_layout() {
        let mut out = Cursor::new(Vec::new());
        VariableTableRecord {
            id: 0x0010_0002,
            offset: 68,
            size: 10,
            resource_type: 2030,
        }
        .write(&mut out)
        .unwrap();
        let bytes = out.into_inner();
        assert_eq!(bytes.len(), VariableTableRecord::SIZE);
        assert_eq!(&bytes[..4], &0x0010_0002u32.to_le_bytes());
        assert_eq!(&bytes[12..], &2030u32.to_le_bytes());
    }
}
