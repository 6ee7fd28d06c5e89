//! Error types for KEY, BIF and ITP operations

use crate::value::ElementKind;
use std::io;
use thiserror::Error;

/// Broad failure classes every [`AuroraError`] falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Backward seek or out-of-order resource open
    Addressing,
    /// Short read, or a declared size larger than the available bytes
    TruncatedData,
    /// Index or offset outside its table's bounds
    CorruptIndex,
    /// Kind tag or size query the codec cannot handle
    UnsupportedEncoding,
    /// Structurally invalid file (bad signature, oversized field)
    InvalidFormat,
    /// Underlying I/O failure
    Io,
    /// Lookup of something that does not exist
    NotFound,
}

/// Errors raised while decoding or encoding archive resources
#[derive(Error, Debug)]
pub enum AuroraError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Binary record error
    #[error("Binary format error: {0}")]
    BinRw(#[from] binrw::Error),

    /// A seek target lies before the current position
    #[error("Backward seek from position {position} to {target}")]
    BackwardSeek {
        /// Current stream position
        position: u64,
        /// Requested target position
        target: u64,
    },

    /// A resource was opened at an offset before the previous one on the same handle
    #[error("Resource at offset {requested} opened after offset {previous} on the same handle")]
    OutOfOrderResource {
        /// Payload offset of the previously opened resource
        previous: u64,
        /// Payload offset of the requested resource
        requested: u64,
    },

    /// The source ended before a read completed
    #[error("Unexpected end of data at position {position}: needed {needed} more bytes")]
    UnexpectedEof {
        /// Stream position where the read started
        position: u64,
        /// Bytes still missing
        needed: u64,
    },

    /// A resource payload is shorter than its declared size
    #[error("Resource truncated: declared {declared} bytes, got {actual}")]
    ShortResource {
        /// Size from the variable table
        declared: u64,
        /// Bytes actually available
        actual: u64,
    },

    /// A read ran past the end of its ITP section
    #[error("Read past end of {section} section: position {position}, end {end}")]
    SectionOverrun {
        /// Section name
        section: &'static str,
        /// Position after the read
        position: u64,
        /// Absolute end offset of the section
        end: u64,
    },

    /// Index or offset outside the bounds of its table
    #[error("Index {index} out of bounds for {table} (length {len})")]
    IndexOutOfBounds {
        /// Table or section name
        table: &'static str,
        /// Offending index or offset
        index: u64,
        /// Table length (records or bytes)
        len: u64,
    },

    /// Entities reference each other in a loop
    #[error("Cyclic entity reference through entity {0}")]
    CyclicReference(u32),

    /// Element kind tag not recognized
    #[error("Unsupported element kind tag: {0}")]
    UnknownKind(u32),

    /// Serialized size requested for a kind without a length prefix
    #[error("Serialized size is not defined for {0:?} elements")]
    UnsizedKind(ElementKind),

    /// Kind can not be written to the data section
    #[error("{0:?} elements have no data-section encoding")]
    NotWideKind(ElementKind),

    /// Unexpected 4-byte file signature
    #[error("Invalid signature: expected {expected:?}, got {actual:?}")]
    InvalidSignature {
        /// Expected signature
        expected: [u8; 4],
        /// Signature found in the file
        actual: [u8; 4],
    },

    /// A name does not fit in its fixed-width or length-prefixed field
    #[error("Name {name:?} is {len} bytes, limit is {max}")]
    NameTooLong {
        /// Offending name
        name: String,
        /// Encoded length
        len: usize,
        /// Field limit
        max: usize,
    },

    /// A value does not fit the field that encodes it
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// No resource under this key
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// KEY file table has no entry with this index
    #[error("Archive {0} not found in key file")]
    ArchiveNotFound(u16),
}

impl AuroraError {
    /// Failure class of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) => ErrorKind::Io,
            Self::BinRw(e) if is_binrw_eof(e) => ErrorKind::TruncatedData,
            Self::BinRw(_) => ErrorKind::InvalidFormat,
            Self::BackwardSeek { .. } | Self::OutOfOrderResource { .. } => ErrorKind::Addressing,
            Self::UnexpectedEof { .. } | Self::ShortResource { .. } | Self::SectionOverrun { .. } => {
                ErrorKind::TruncatedData
            }
            Self::IndexOutOfBounds { .. } | Self::CyclicReference(_) => ErrorKind::CorruptIndex,
            Self::UnknownKind(_) | Self::UnsizedKind(_) | Self::NotWideKind(_) => {
                ErrorKind::UnsupportedEncoding
            }
            Self::InvalidSignature { .. } | Self::NameTooLong { .. } | Self::InvalidFormat(_) => {
                ErrorKind::InvalidFormat
            }
            Self::ResourceNotFound(_) | Self::ArchiveNotFound(_) => ErrorKind::NotFound,
        }
    }

    /// Whether the input itself is malformed (as opposed to a missing file or lookup miss)
    pub fn is_corrupt_input(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Addressing
                | ErrorKind::TruncatedData
                | ErrorKind::CorruptIndex
                | ErrorKind::UnsupportedEncoding
                | ErrorKind::InvalidFormat
        )
    }

    pub(crate) fn out_of_bounds(table: &'static str, index: impl Into<u64>, len: impl Into<u64>) -> Self {
        Self::IndexOutOfBounds {
            table,
            index: index.into(),
            len: len.into(),
        }
    }
}

fn is_binrw_eof(err: &binrw::Error) -> bool {
    match err {
        binrw::Error::Io(e) => e.kind() == io::ErrorKind::UnexpectedEof,
        binrw::Error::Backtrace(bt) => is_binrw_eof(&bt.error),
        _ => false,
    }
}

/// Result type for archive and format operations
pub type Result<T> = std::result::Result<T, AuroraError>;
