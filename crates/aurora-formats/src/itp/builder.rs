//! ITP encoding

use super::decoder::ItpFile;
use super::header::{BlockIndex, ItpHeader, NAME_SIZE, Stub};
use crate::cursor::{ByteWriter, FixedRecord};
use crate::error::{AuroraError, Result};
use crate::value::{Struct, Value, fixed_name};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Raw six-section image of an ITP file
///
/// Sections are written back to back after the header in the order
/// entities, elements, names, data, multimap, lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItpSections {
    /// Format version
    pub version: Option<[u8; 4]>,
    /// Entity stubs
    pub entities: Vec<Stub>,
    /// Element stubs
    pub elements: Vec<Stub>,
    /// Variable names, space padded to 16 bytes on write
    pub names: Vec<String>,
    /// Wide-kind payloads
    pub data: Vec<u8>,
    /// Element index runs
    pub multimap: Vec<u8>,
    /// List bodies
    pub lists: Vec<u8>,
}

impl ItpSections {
    /// Header describing these sections
    pub fn header(&self) -> Result<ItpHeader> {
        let mut offset = ItpHeader::SIZE;
        let mut block = |count: usize, size: usize| -> Result<BlockIndex> {
            let index = BlockIndex {
                offset: to_u32(offset)?,
                count: to_u32(count)?,
            };
            offset += size;
            Ok(index)
        };
        Ok(ItpHeader {
            signature: ItpHeader::SIGNATURE,
            version: self.version.unwrap_or(ItpHeader::DEFAULT_VERSION),
            entities: block(self.entities.len(), self.entities.len() * Stub::SIZE)?,
            elements: block(self.elements.len(), self.elements.len() * Stub::SIZE)?,
            names: block(self.names.len(), self.names.len() * NAME_SIZE)?,
            data: block(self.data.len(), self.data.len())?,
            multimap: block(self.multimap.len(), self.multimap.len())?,
            lists: block(self.lists.len(), self.lists.len())?,
        })
    }

    /// Serialize header and sections
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let header = self.header()?;
        let mut writer = ByteWriter::new(Vec::with_capacity(header.lists.byte_end() as usize));
        writer.write_record(&header)?;
        for stub in self.entities.iter().chain(&self.elements) {
            writer.write_record(stub)?;
        }
        for name in &self.names {
            writer.write_bytes(&fixed_name::<NAME_SIZE>(name, b' ')?)?;
        }
        writer.write_bytes(&self.data)?;
        writer.write_bytes(&self.multimap)?;
        writer.write_bytes(&self.lists)?;
        Ok(writer.into_inner())
    }
}

/// Encoder from a [`Struct`] tree to ITP bytes
///
/// Entities are numbered breadth first from the root (entity 0) and list
/// members get consecutive indices, so every stub-order scan of the output
/// (data offsets, multimap offsets, list offsets) is ascending and the file
/// decodes with [`DecodeOptions::strict`](crate::DecodeOptions::strict).
///
/// A struct shared through one [`Arc`] is written as a single entity that
/// every referencing element points at, so decoded files with shared
/// entities rebuild to the same size.
pub struct ItpBuilder<'a> {
    root: &'a Struct,
    version: [u8; 4],
}

impl<'a> ItpBuilder<'a> {
    /// Create a builder for a root struct
    pub fn new(root: &'a Struct) -> Self {
        Self {
            root,
            version: ItpHeader::DEFAULT_VERSION,
        }
    }

    /// Create a builder that reproduces a decoded file's root and version
    pub fn from_itp_file(file: &'a ItpFile) -> Self {
        Self::new(&file.root).version(file.header.version)
    }

    /// Set the header version
    #[must_use]
    pub fn version(mut self, version: [u8; 4]) -> Self {
        self.version = version;
        self
    }

    /// Lay out the six sections
    pub fn sections(&self) -> Result<ItpSections> {
        let mut state = LayoutState::default();
        let mut queue = VecDeque::from([self.root]);
        state.next_entity = 1;

        while let Some(entity) = queue.pop_front() {
            state.write_entity(entity, &mut queue)?;
        }

        Ok(ItpSections {
            version: Some(self.version),
            entities: state.entities,
            elements: state.elements,
            names: state.names,
            data: state.data.into_inner(),
            multimap: state.multimap.into_inner(),
            lists: state.lists.into_inner(),
        })
    }

    /// Serialize the root struct
    pub fn build(&self) -> Result<Vec<u8>> {
        self.sections()?.to_bytes()
    }
}

struct LayoutState {
    entities: Vec<Stub>,
    elements: Vec<Stub>,
    names: Vec<String>,
    name_index: HashMap<String, u32>,
    shared: HashMap<*const Struct, u32>,
    data: ByteWriter<Vec<u8>>,
    multimap: ByteWriter<Vec<u8>>,
    lists: ByteWriter<Vec<u8>>,
    next_entity: u32,
}

impl Default for LayoutState {
    fn default() -> Self {
        Self {
            entities: Vec::new(),
            elements: Vec::new(),
            names: Vec::new(),
            name_index: HashMap::new(),
            shared: HashMap::new(),
            data: ByteWriter::new(Vec::new()),
            multimap: ByteWriter::new(Vec::new()),
            lists: ByteWriter::new(Vec::new()),
            next_entity: 0,
        }
    }
}

impl LayoutState {
    /// Write the next queued entity and its element stubs
    fn write_entity<'s>(&mut self, entity: &'s Struct, queue: &mut VecDeque<&'s Struct>) -> Result<()> {
        let first = to_u32(self.elements.len())?;
        let count = to_u32(entity.len())?;
        let stub = match count {
            0 => Stub::new(entity.id, 0, 0),
            1 => Stub::new(entity.id, first, 1),
            _ => {
                let offset = to_u32(self.multimap.position() as usize)?;
                for element in first..first + count {
                    self.multimap.write_u32(element)?;
                }
                Stub::new(entity.id, offset, count)
            }
        };
        self.entities.push(stub);

        for field in entity.fields() {
            let name = self.name(&field.name)?;
            let aux = match &field.value {
                Value::Struct(child) => self.place(child, queue)?,
                Value::List(items) => {
                    let offset = to_u32(self.lists.position() as usize)?;
                    self.lists.write_u32(to_u32(items.len())?)?;
                    for item in items {
                        let index = self.place(item, queue)?;
                        self.lists.write_u32(index)?;
                    }
                    offset
                }
                value => match value.to_inline() {
                    Some(slot) => slot,
                    None => {
                        let offset = to_u32(self.data.position() as usize)?;
                        value.write_wide(&mut self.data)?;
                        offset
                    }
                },
            };
            self.elements.push(Stub::new(field.kind().tag(), name, aux));
        }
        Ok(())
    }

    /// Entity index for a child, queueing it the first time it is seen
    fn place<'s>(&mut self, child: &'s Arc<Struct>, queue: &mut VecDeque<&'s Struct>) -> Result<u32> {
        let key = Arc::as_ptr(child);
        if let Some(&index) = self.shared.get(&key) {
            return Ok(index);
        }
        let index = self.allocate_entity()?;
        self.shared.insert(key, index);
        queue.push_back(child.as_ref());
        Ok(index)
    }

    fn allocate_entity(&mut self) -> Result<u32> {
        let index = self.next_entity;
        self.next_entity = index
            .checked_add(1)
            .ok_or_else(|| AuroraError::InvalidFormat("Too many entities".to_string()))?;
        Ok(index)
    }

    fn name(&mut self, name: &str) -> Result<u32> {
        if let Some(&index) = self.name_index.get(name) {
            return Ok(index);
        }
        // Validate width before it reaches the names section
        fixed_name::<NAME_SIZE>(name, b' ')?;
        let index = to_u32(self.names.len())?;
        self.names.push(name.to_string());
        self.name_index.insert(name.to_string(), index);
        Ok(index)
    }
}

fn to_u32(value: usize) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| AuroraError::InvalidFormat(format!("Value {value} does not fit in 32 bits")))
}
