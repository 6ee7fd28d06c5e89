//! Little-endian, position-tracking cursors over byte streams
//!
//! Every format in this crate is read strictly front to back. [`ByteReader`]
//! wraps any [`std::io::Read`] and counts the bytes it has consumed so that
//! absolute offsets from headers and stub tables can be reached with
//! [`ByteReader::seek_to`], which only ever moves forward:
//!
//! ```text
//! delta = target - position
//! delta <  0  → AddressingError (BackwardSeek)
//! delta == 0  → no-op
//! delta >  0  → skip exactly delta bytes (short skip → TruncatedData)
//! ```
//!
//! [`ByteWriter`] is the symmetric writer used by the builders.
//!
//! Fixed-size records are declared with `binrw` and implement [`FixedRecord`];
//! the cursor reads exactly `SIZE` bytes and decodes the record from that
//! span, so the underlying stream never needs to support seeking.

mod reader;
mod writer;

pub use reader::ByteReader;
pub use writer::ByteWriter;

/// Preallocation cap for tables whose record count comes from a header
///
/// Larger tables grow as records are read, so a corrupt count runs into
/// the end of the input instead of a huge allocation.
pub(crate) const MAX_PREALLOC: usize = 4096;

/// A `binrw` record with a constant encoded size
pub trait FixedRecord {
    /// Encoded size in bytes
    const SIZE: usize;
}
