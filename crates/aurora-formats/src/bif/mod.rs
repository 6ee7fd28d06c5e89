//! BIF payload archives
//!
//! A BIF file stores the raw bytes of many resources. Its variable-resource
//! table maps a 14-bit slot to a payload range:
//!
//! ```text
//! +----------------+ 0
//! | BifHeader      | 20 bytes
//! +----------------+ variable_table_offset
//! | variable table | variable_count × 16 bytes {id, offset, size, type}
//! +----------------+
//! | payloads       |
//! +----------------+
//! ```
//!
//! Resources are handed out as bounded [`ResourceReader`] streams over the
//! archive's single forward-only cursor.
//!
//! # Example
//!
//! ```rust
//! use aurora_formats::bif::{BifArchive, BifBuilder};
//! use aurora_formats::resource::{ResourceId, ResourceType};
//!
//! # fn main() -> aurora_formats::Result<()> {
//! let mut builder = BifBuilder::new();
//! builder.add_resource(b"first".to_vec(), ResourceType::Txt);
//! builder.add_resource(b"second".to_vec(), ResourceType::Txt);
//! let data = builder.build()?;
//!
//! let mut bif = BifArchive::read(&data[..])?;
//! assert_eq!(bif.read_resource(ResourceId::new(0, 1))?, b"second");
//! # Ok(())
//! # }
//! ```

mod archive;
mod builder;
mod header;

pub use archive::{BifArchive, ResourceReader, VariableEntry};
pub use builder::BifBuilder;
pub use header::{BifHeader, VariableTableRecord};
