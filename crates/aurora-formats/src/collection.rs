//! Resource lookup across a KEY file and the BIF archives it names

use crate::bif::{BifArchive, ResourceReader, VariableEntry};
use crate::config::DecodeOptions;
use crate::error::{AuroraError, Result};
use crate::itp::{ItpDecoder, ItpFile};
use crate::key::KeyFile;
use crate::resource::ResourceKey;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Where a resource lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceLocation {
    /// Index into the KEY file table
    pub file_index: u16,
    /// Variable slot inside that archive
    pub slot: u16,
}

/// KEY index plus its archives on disk
///
/// Every read opens a fresh archive handle, so lookups can happen in any
/// order. Use [`ResourceCollection::for_each_in_archive`] to stream a whole
/// archive through one handle.
pub struct ResourceCollection {
    key: KeyFile,
    archives: Vec<PathBuf>,
    index: HashMap<ResourceKey, ResourceLocation>,
    options: DecodeOptions,
}

impl ResourceCollection {
    /// Open a KEY file; archive paths are resolved against its directory
    pub fn open<P: AsRef<Path>>(key_path: P) -> Result<Self> {
        Self::open_with(key_path, DecodeOptions::default())
    }

    /// Open a KEY file with explicit options
    pub fn open_with<P: AsRef<Path>>(key_path: P, options: DecodeOptions) -> Result<Self> {
        let key_path = key_path.as_ref();
        info!("Loading resource collection from {:?}", key_path);

        let key = KeyFile::open_with(key_path, options)?;
        let base = key_path.parent().unwrap_or_else(|| Path::new(""));
        let archives = key
            .files
            .iter()
            .map(|file| base.join(normalize_archive_name(&file.name)))
            .collect();

        let mut index = HashMap::with_capacity(key.key_count());
        for (file_index, entry) in key.entries() {
            let location = ResourceLocation {
                file_index: file_index as u16,
                slot: entry.id.variable_slot,
            };
            match index.entry(entry.key()) {
                Entry::Vacant(slot) => {
                    slot.insert(location);
                }
                Entry::Occupied(existing) => {
                    debug!(
                        "Duplicate key {} in archive {}, keeping archive {}",
                        existing.key(),
                        file_index,
                        existing.get().file_index
                    );
                }
            }
        }

        info!(
            "Indexed {} resources across {} archives",
            index.len(),
            key.files.len()
        );
        Ok(Self {
            key,
            archives,
            index,
            options,
        })
    }

    /// Parsed KEY file
    pub fn key_file(&self) -> &KeyFile {
        &self.key
    }

    /// Resolved archive paths, in KEY file-table order
    pub fn archive_paths(&self) -> &[PathBuf] {
        &self.archives
    }

    /// Whether a resource is listed
    pub fn contains(&self, key: &ResourceKey) -> bool {
        self.index.contains_key(key)
    }

    /// Location of a resource
    pub fn location(&self, key: &ResourceKey) -> Option<ResourceLocation> {
        self.index.get(key).copied()
    }

    /// Every distinct resource key, in no particular order
    pub fn keys(&self) -> impl Iterator<Item = &ResourceKey> {
        self.index.keys()
    }

    /// Number of distinct resources
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the collection lists no resources
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Read a resource's bytes
    pub fn read(&self, key: &ResourceKey) -> Result<Vec<u8>> {
        let location = self.require(key)?;
        let mut archive = self.open_archive(location.file_index)?;
        archive.open_slot(location.slot)?.read_to_vec()
    }

    /// Decode an ITP resource straight from its archive stream
    pub fn read_itp(&self, key: &ResourceKey) -> Result<ItpFile> {
        let location = self.require(key)?;
        let mut archive = self.open_archive(location.file_index)?;
        let stream = archive.open_slot(location.slot)?;
        ItpDecoder::with_options(stream, self.options).decode()
    }

    /// Visit every resource of one archive in stored order through one handle
    pub fn for_each_in_archive<F>(&self, file_index: u16, mut f: F) -> Result<()>
    where
        F: FnMut(VariableEntry, ResourceReader<'_, BufReader<File>>) -> Result<()>,
    {
        let mut archive = self.open_archive(file_index)?;
        while let Some(next) = archive.next_resource() {
            let (entry, reader) = next?;
            f(entry, reader)?;
        }
        Ok(())
    }

    fn require(&self, key: &ResourceKey) -> Result<ResourceLocation> {
        self.location(key)
            .ok_or_else(|| AuroraError::ResourceNotFound(key.to_string()))
    }

    fn open_archive(&self, file_index: u16) -> Result<BifArchive<BufReader<File>>> {
        let path = self
            .archives
            .get(usize::from(file_index))
            .ok_or(AuroraError::ArchiveNotFound(file_index))?;
        BifArchive::open_with(path, self.options).map_err(|e| {
            warn!("Failed to open archive {:?}: {}", path, e);
            e
        })
    }
}

/// Stored archive names use `\` separators regardless of platform
fn normalize_archive_name(name: &str) -> PathBuf {
    name.split(['\\', '/'])
        .filter(|part| !part.is_empty())
        .collect()
}
