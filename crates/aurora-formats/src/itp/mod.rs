//! ITP structured-data resources
//!
//! ITP stores a [`Struct`](crate::value::Struct) tree as six flat,
//! offset-addressed sections:
//!
//! ```text
//! +-------------+ 0
//! | ItpHeader   | signature, version, 6 × {offset, count}
//! +-------------+
//! | entities    | {struct id, element index | multimap offset, field count}
//! | elements    | {kind tag, name index, inline value | offset | entity index}
//! | names       | 16-byte space-padded field names
//! | data        | wide-kind payloads
//! | multimap    | u32 element-index runs of multi-field entities
//! | lists       | u32 count + count × u32 entity index
//! +-------------+
//! ```
//!
//! [`ItpDecoder`] resolves the sections in three forward-only passes.
//! [`ItpBuilder`] writes the canonical layout back out.
//!
//! # Example
//!
//! ```rust
//! use aurora_formats::itp::{ItpBuilder, ItpFile};
//! use aurora_formats::value::{Struct, Value};
//!
//! # fn main() -> aurora_formats::Result<()> {
//! let root = Struct::new(0)
//!     .with("Tag", Value::ResRef("npc_triss".into()))
//!     .with("Level", Value::U8(8));
//! let bytes = ItpBuilder::new(&root).build()?;
//!
//! let file = ItpFile::read(&bytes[..])?;
//! assert_eq!(file.root().value("Level"), Some(&Value::U8(8)));
//! # Ok(())
//! # }
//! ```

mod builder;
mod decoder;
mod header;

pub use builder::{ItpBuilder, ItpSections};
pub use decoder::{ItpDecoder, ItpFile};
pub use header::{BlockIndex, ItpHeader, NAME_SIZE, Stub};

use crate::AuroraFormat;
use crate::error::Result;

impl AuroraFormat for ItpFile {
    fn parse(data: &[u8]) -> Result<Self> {
        Self::read(data)
    }

    fn build(&self) -> Result<Vec<u8>> {
        ItpBuilder::from_itp_file(self).build()
    }
}
