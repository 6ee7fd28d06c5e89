//! Fixed-size ITP records

use crate::cursor::FixedRecord;
use binrw::{BinRead, BinWrite};

/// Location of one ITP section
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, BinRead, BinWrite)]
#[br(little)]
#[bw(little)]
pub struct BlockIndex {
    /// Absolute offset of the section
    pub offset: u32,
    /// Record count (stub and name tables) or byte size (data, multimap, lists)
    pub count: u32,
}

impl BlockIndex {
    /// Absolute offset as `u64`
    pub fn start(&self) -> u64 {
        u64::from(self.offset)
    }

    /// Absolute end offset of a byte-sized section
    pub fn byte_end(&self) -> u64 {
        self.start() + u64::from(self.count)
    }
}

/// ITP file header
///
/// - Signature `"ITP "` (4 bytes)
/// - Version (4 bytes)
/// - Six [`BlockIndex`] entries, in file order
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[br(little)]
#[bw(little)]
pub struct ItpHeader {
    /// File signature, `"ITP "`
    pub signature: [u8; 4],
    /// Format version
    pub version: [u8; 4],
    /// Entity stubs (record count)
    pub entities: BlockIndex,
    /// Element stubs (record count)
    pub elements: BlockIndex,
    /// 16-byte variable names (record count)
    pub names: BlockIndex,
    /// Wide-kind payloads (byte size)
    pub data: BlockIndex,
    /// Element index runs of multi-element entities (byte size)
    pub multimap: BlockIndex,
    /// List bodies (byte size)
    pub lists: BlockIndex,
}

impl ItpHeader {
    /// Expected signature
    pub const SIGNATURE: [u8; 4] = *b"ITP ";
    /// Version written by [`super::ItpBuilder`]
    pub const DEFAULT_VERSION: [u8; 4] = *b"V3.2";
}

impl FixedRecord for ItpHeader {
    const SIZE: usize = 56;
}

/// Entity or element stub
///
/// | table    | `kind`       | `index`                         | `aux`                          |
/// |----------|--------------|---------------------------------|--------------------------------|
/// | entities | struct id    | element index or multimap offset | field count                   |
/// | elements | kind tag     | variable-name index             | inline value, data offset, entity index or list offset |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, BinRead, BinWrite)]
#[br(little)]
#[bw(little)]
pub struct Stub {
    /// Kind tag or struct id
    pub kind: u32,
    /// Table index or section offset
    pub index: u32,
    /// Auxiliary value
    pub aux: u32,
}

impl Stub {
    /// Create a stub
    pub fn new(kind: u32, index: u32, aux: u32) -> Self {
        Self { kind, index, aux }
    }
}

impl FixedRecord for Stub {
    const SIZE: usize = 12;
}

/// Width of a variable-name record
pub const NAME_SIZE: usize = 16;
