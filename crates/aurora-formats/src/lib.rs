//! Readers and builders for Aurora-family resource archives
//!
#![allow(clippy::cast_possible_truncation)] // Intentional for binary format parsing
#![allow(clippy::cast_possible_wrap)] // Signed kinds are stored as u32 slots
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::uninlined_format_args)] // Backwards compatibility
#![allow(clippy::doc_markdown)] // Format names don't need backticks
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
#![allow(clippy::return_self_not_must_use)] // Builder patterns
#![allow(clippy::redundant_closure_for_method_calls)] // Iterator chains
//! This crate decodes and encodes the packaged-content formats of the
//! Aurora engine family as shipped with The Witcher:
//!
//! - **KEY**: index naming every archive and mapping resource name + type to
//!   a packed [`ResourceId`](resource::ResourceId)
//! - **BIF**: payload archive addressed by the id's variable slot
//! - **ITP**: structured data stored as six flat, offset-addressed sections
//!
//! Every reader is forward-only: it consumes its byte source front to back
//! and never seeks backward, so archives can be decoded straight from a
//! pipe or a bounded resource stream.
//!
//! # Example
//!
//! ```rust
//! use aurora_formats::bif::{BifArchive, BifBuilder};
//! use aurora_formats::itp::{ItpBuilder, ItpDecoder};
//! use aurora_formats::resource::{ResourceId, ResourceType};
//! use aurora_formats::value::{Struct, Value};
//!
//! # fn main() -> aurora_formats::Result<()> {
//! let root = Struct::new(0).with("Tag", Value::ResRef("kaer_morhen".into()));
//! let mut builder = BifBuilder::new();
//! let slot = builder.add_resource(ItpBuilder::new(&root).build()?, ResourceType::Itp);
//! let archive_bytes = builder.build()?;
//!
//! let mut bif = BifArchive::read(&archive_bytes[..])?;
//! let stream = bif.open_resource(ResourceId::new(0, slot))?;
//! let file = ItpDecoder::new(stream).decode()?;
//! assert_eq!(file.root, root);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

/// BIF payload archives
pub mod bif;
/// KEY index and BIF archives on disk
pub mod collection;
/// Decoder options
pub mod config;
/// Forward-only byte cursors
pub mod cursor;
/// Error types
pub mod error;
/// ITP structured-data resources
pub mod itp;
/// KEY index files
pub mod key;
/// Resource identifiers, types and keys
pub mod resource;
/// Element value model
pub mod value;

#[cfg(test)]
pub(crate) mod test_utils;

pub use config::DecodeOptions;
pub use error::{AuroraError, ErrorKind, Result};

/// Common trait for formats that parse from and build to a byte buffer
pub trait AuroraFormat: Sized {
    /// Parse from bytes
    fn parse(data: &[u8]) -> Result<Self>;

    /// Build to bytes
    fn build(&self) -> Result<Vec<u8>>;

    /// Verify that parsing then building reproduces `data` exactly
    fn verify_round_trip(data: &[u8]) -> Result<()> {
        let parsed = Self::parse(data)?;
        let rebuilt = parsed.build()?;
        if data != rebuilt.as_slice() {
            return Err(AuroraError::InvalidFormat(
                "Round-trip verification failed".to_string(),
            ));
        }
        Ok(())
    }
}
