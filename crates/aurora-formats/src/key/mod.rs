//! KEY index files
//!
//! A KEY file names every archive (BIF) of an installation and lists, for
//! each resource, its name, type and packed [`ResourceId`](crate::resource::ResourceId).
//!
//! ```text
//! +-------------+ 0
//! | KeyHeader   | 32 bytes
//! +-------------+ file_table_offset
//! | file table  | file_count × 12 bytes {size, name_offset, name_size, drive_flags}
//! +-------------+
//! | names       | variable-length archive names, in any order
//! +-------------+ key_table_offset
//! | key table   | key_count × 22 bytes {name[16], type, id}
//! +-------------+
//! ```
//!
//! Parsing is forward-only: the file-table records are sorted by name offset
//! before the names region is read.
//!
//! Duplicate (name, type) pairs are legal; [`KeyFile`] keeps all of them.

mod builder;
mod file;
mod header;

pub use builder::KeyBuilder;
pub use file::{KeyEntry, KeyFile, KeyFileEntry};
pub use header::{FileTableRecord, KeyHeader, KeyTableRecord};

use crate::AuroraFormat;
use crate::error::Result;

impl AuroraFormat for KeyFile {
    fn parse(data: &[u8]) -> Result<Self> {
        Self::read(data)
    }

    fn build(&self) -> Result<Vec<u8>> {
        KeyBuilder::from_key_file(self).build()
    }
}
