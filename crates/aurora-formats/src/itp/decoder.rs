//! Multi-pass ITP decoder
//!
//! The six sections are scanned front to back, at most once each:
//!
//! 1. header
//! 2. entity stubs, element stubs, variable names
//! 3. pass 1: scalar elements (inline values and data-section reads)
//! 4. pass 2: entity shapes (single element or multimap run)
//! 5. pass 3: list bodies, sorted by lists-section offset
//!
//! Entities live in an index-addressed arena until the root (entity 0) is
//! materialized into a [`Struct`] tree. Each entity is built once; every
//! struct or list element that references it shares the same [`Arc`].

use super::header::{BlockIndex, ItpHeader, NAME_SIZE, Stub};
use crate::config::{DecodeOptions, check_signature};
use crate::cursor::{ByteReader, MAX_PREALLOC};
use crate::error::{AuroraError, Result};
use crate::value::{Element, ElementKind, Struct, Value, trim_fixed_name};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Deepest struct/list nesting accepted while materializing
const MAX_DEPTH: usize = 512;

/// Decoded ITP resource
///
/// Decode limits beyond what the header declares:
/// - tables sized by the header are preallocated for at most 4096 records
///   and otherwise grow as records are read, so a bogus count fails with
///   a truncation error instead of a huge allocation;
/// - struct and list nesting below the root is capped at 512 levels;
///   deeper input is rejected as an invalid format;
/// - an entity referenced from several elements is decoded once and shared
///   through [`Arc`], so decoded size stays linear in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItpFile {
    /// File header
    pub header: ItpHeader,
    /// Root struct (entity 0)
    pub root: Struct,
    /// Stub order did not match section order and reads were sorted
    pub reordered_reads: bool,
}

impl ItpFile {
    /// Open and decode an ITP file from disk
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, DecodeOptions::default())
    }

    /// Open and decode an ITP file from disk with explicit options
    pub fn open_with<P: AsRef<Path>>(path: P, options: DecodeOptions) -> Result<Self> {
        let path = path.as_ref();
        debug!("Opening ITP file: {:?}", path);
        Self::read_with(BufReader::new(File::open(path)?), options)
    }

    /// Decode from a forward-only byte source
    pub fn read<R: Read>(reader: R) -> Result<Self> {
        Self::read_with(reader, DecodeOptions::default())
    }

    /// Decode from a forward-only byte source with explicit options
    pub fn read_with<R: Read>(reader: R, options: DecodeOptions) -> Result<Self> {
        ItpDecoder::with_options(reader, options).decode()
    }

    /// Root struct
    pub fn root(&self) -> &Struct {
        &self.root
    }

    /// Take the root struct
    pub fn into_root(self) -> Struct {
        self.root
    }
}

/// Element after pass 1
struct PendingElement {
    name: String,
    value: Pending,
}

enum Pending {
    Ready(Value),
    Entity(u32),
    List(ListBuilder),
}

/// List body collected in pass 3, frozen during materialization
#[derive(Default)]
struct ListBuilder {
    entities: Vec<u32>,
}

/// Entity after pass 2: struct id plus element indices in field order
struct EntityShape {
    id: u32,
    elements: Vec<u32>,
}

/// One decode session over a byte source
pub struct ItpDecoder<R> {
    reader: ByteReader<R>,
    options: DecodeOptions,
    reordered: bool,
}

impl<R: Read> ItpDecoder<R> {
    /// Create a decoder with default options
    pub fn new(reader: R) -> Self {
        Self::with_options(reader, DecodeOptions::default())
    }

    /// Create a decoder with explicit options
    pub fn with_options(reader: R, options: DecodeOptions) -> Self {
        Self {
            reader: ByteReader::new(reader),
            options,
            reordered: false,
        }
    }

    /// Run every pass and return the root struct
    pub fn decode(mut self) -> Result<ItpFile> {
        let header: ItpHeader = self.reader.read_record()?;
        check_signature(&self.options, ItpHeader::SIGNATURE, header.signature)?;
        debug!(
            "ITP header: {} entities, {} elements, {} names, data {} bytes, multimap {} bytes, lists {} bytes",
            header.entities.count,
            header.elements.count,
            header.names.count,
            header.data.count,
            header.multimap.count,
            header.lists.count
        );

        let entity_stubs = self.read_stubs(header.entities)?;
        let element_stubs = self.read_stubs(header.elements)?;
        let names = self.read_names(header.names)?;

        let mut elements =
            self.resolve_elements(header.data, &element_stubs, &names, entity_stubs.len())?;
        let shapes = self.resolve_entities(header.multimap, &entity_stubs, elements.len())?;
        self.resolve_lists(header.lists, &element_stubs, &mut elements, shapes.len())?;

        let root = Materializer::new(&shapes, &elements).entity(0, 0)?;
        let root = Arc::unwrap_or_clone(root);
        debug!("Decoded root struct with {} fields", root.len());

        Ok(ItpFile {
            header,
            root,
            reordered_reads: self.reordered,
        })
    }

    fn read_stubs(&mut self, block: BlockIndex) -> Result<Vec<Stub>> {
        self.reader.seek_to(block.start())?;
        let mut stubs = Vec::with_capacity((block.count as usize).min(MAX_PREALLOC));
        for _ in 0..block.count {
            stubs.push(self.reader.read_record::<Stub>()?);
        }
        Ok(stubs)
    }

    fn read_names(&mut self, block: BlockIndex) -> Result<Vec<String>> {
        self.reader.seek_to(block.start())?;
        let mut names = Vec::with_capacity((block.count as usize).min(MAX_PREALLOC));
        for _ in 0..block.count {
            names.push(trim_fixed_name(&self.reader.read_array::<NAME_SIZE>()?));
        }
        Ok(names)
    }

    /// Pass 1
    fn resolve_elements(
        &mut self,
        data: BlockIndex,
        stubs: &[Stub],
        names: &[String],
        entity_count: usize,
    ) -> Result<Vec<PendingElement>> {
        let mut kinds = Vec::with_capacity(stubs.len());
        let mut wide = Vec::new();
        for (i, stub) in stubs.iter().enumerate() {
            let kind = ElementKind::from_tag(stub.kind)?;
            if kind.is_wide() {
                wide.push((i, kind, stub.aux));
            }
            kinds.push(kind);
        }

        self.order_reads("data", &mut wide, |&(_, _, offset)| offset);
        trace!("Pass 1: {} data-section reads", wide.len());

        let mut wide_values: Vec<Option<Value>> = vec![None; stubs.len()];
        let mut last: Option<(u32, ElementKind, Value)> = None;
        for (i, kind, offset) in wide {
            let value = match &last {
                Some((o, k, v)) if *o == offset && *k == kind => v.clone(),
                _ => self.read_value(data, kind, offset)?,
            };
            wide_values[i] = Some(value.clone());
            last = Some((offset, kind, value));
        }

        let mut elements = Vec::with_capacity(stubs.len());
        for ((stub, kind), wide_value) in stubs.iter().zip(kinds).zip(wide_values) {
            let name = names.get(stub.index as usize).cloned().ok_or_else(|| {
                AuroraError::out_of_bounds("variable name table", stub.index, names.len() as u64)
            })?;
            let value = match (kind, wide_value) {
                (_, Some(value)) => Pending::Ready(value),
                (ElementKind::Struct, None) => {
                    check_index("entity table", stub.aux, entity_count)?;
                    Pending::Entity(stub.aux)
                }
                (ElementKind::List, None) => Pending::List(ListBuilder::default()),
                (kind, None) => Value::from_inline(kind, stub.aux)
                    .map(Pending::Ready)
                    .ok_or(AuroraError::NotWideKind(kind))?,
            };
            elements.push(PendingElement { name, value });
        }
        Ok(elements)
    }

    fn read_value(&mut self, data: BlockIndex, kind: ElementKind, offset: u32) -> Result<Value> {
        if offset >= data.count {
            return Err(AuroraError::out_of_bounds("data section", offset, data.count));
        }
        self.reader.seek_to(data.start() + u64::from(offset))?;
        let value = Value::read_wide(kind, &mut self.reader)?;
        if self.reader.position() > data.byte_end() {
            return Err(AuroraError::SectionOverrun {
                section: "data",
                position: self.reader.position(),
                end: data.byte_end(),
            });
        }
        Ok(value)
    }

    /// Pass 2
    fn resolve_entities(
        &mut self,
        multimap: BlockIndex,
        stubs: &[Stub],
        element_count: usize,
    ) -> Result<Vec<EntityShape>> {
        let mut shapes = Vec::with_capacity(stubs.len());
        let mut runs = Vec::new();
        for (i, stub) in stubs.iter().enumerate() {
            let elements = match stub.aux {
                0 => Vec::new(),
                1 => {
                    check_index("element table", stub.index, element_count)?;
                    vec![stub.index]
                }
                _ => {
                    runs.push(i);
                    Vec::new()
                }
            };
            shapes.push(EntityShape {
                id: stub.kind,
                elements,
            });
        }

        self.order_reads("multimap", &mut runs, |&i| stubs[i].index);
        trace!("Pass 2: {} multimap runs", runs.len());

        let mut last: Option<(u32, u32, Vec<u32>)> = None;
        for i in runs {
            let Stub { index: offset, aux: count, .. } = stubs[i];
            let run = match &last {
                Some((o, c, run)) if *o == offset && *c == count => run.clone(),
                _ => self.read_run(multimap, offset, count, element_count)?,
            };
            shapes[i].elements.clone_from(&run);
            last = Some((offset, count, run));
        }
        Ok(shapes)
    }

    fn read_run(
        &mut self,
        multimap: BlockIndex,
        offset: u32,
        count: u32,
        element_count: usize,
    ) -> Result<Vec<u32>> {
        if offset >= multimap.count {
            return Err(AuroraError::out_of_bounds("multimap section", offset, multimap.count));
        }
        let start = multimap.start() + u64::from(offset);
        let end = start + 4 * u64::from(count);
        if end > multimap.byte_end() {
            return Err(AuroraError::SectionOverrun {
                section: "multimap",
                position: end,
                end: multimap.byte_end(),
            });
        }
        self.reader.seek_to(start)?;
        let mut run = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let element = self.reader.read_u32()?;
            check_index("element table", element, element_count)?;
            run.push(element);
        }
        Ok(run)
    }

    /// Pass 3
    ///
    /// List bodies are always read in ascending offset order, whatever the
    /// element-stub order.
    fn resolve_lists(
        &mut self,
        lists: BlockIndex,
        stubs: &[Stub],
        elements: &mut [PendingElement],
        entity_count: usize,
    ) -> Result<()> {
        let list_tag = ElementKind::List.tag();
        let mut refs: Vec<usize> = stubs
            .iter()
            .enumerate()
            .filter(|(_, stub)| stub.kind == list_tag)
            .map(|(i, _)| i)
            .collect();
        refs.sort_by_key(|&i| stubs[i].aux);
        trace!("Pass 3: {} lists", refs.len());

        let mut last: Option<(u32, Vec<u32>)> = None;
        for i in refs {
            let offset = stubs[i].aux;
            let entities = match &last {
                Some((o, entities)) if *o == offset => entities.clone(),
                _ => self.read_list(lists, offset, entity_count)?,
            };
            if let Pending::List(builder) = &mut elements[i].value {
                builder.entities.extend_from_slice(&entities);
            }
            last = Some((offset, entities));
        }
        Ok(())
    }

    fn read_list(&mut self, lists: BlockIndex, offset: u32, entity_count: usize) -> Result<Vec<u32>> {
        if offset >= lists.count {
            return Err(AuroraError::out_of_bounds("lists section", offset, lists.count));
        }
        self.reader.seek_to(lists.start() + u64::from(offset))?;
        let count = self.reader.read_u32()?;
        let end = self.reader.position() + 4 * u64::from(count);
        if end > lists.byte_end() {
            return Err(AuroraError::SectionOverrun {
                section: "lists",
                position: end,
                end: lists.byte_end(),
            });
        }
        let mut entities = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let entity = self.reader.read_u32()?;
            check_index("entity table", entity, entity_count)?;
            entities.push(entity);
        }
        Ok(entities)
    }

    /// Sort section reads by offset when the stored order would need a
    /// backward seek and sorting is enabled
    fn order_reads<T>(&mut self, section: &str, reads: &mut [T], offset: impl Fn(&T) -> u32) {
        let ascending = reads.windows(2).all(|w| offset(&w[0]) <= offset(&w[1]));
        if ascending || !self.options.sort_data_reads {
            return;
        }
        warn!(
            "{} section offsets are not ascending in stub order, reading sorted",
            section
        );
        reads.sort_by_key(|r| offset(r));
        self.reordered = true;
    }
}

fn check_index(table: &'static str, index: u32, len: usize) -> Result<()> {
    if index as usize >= len {
        return Err(AuroraError::out_of_bounds(table, index, len as u64));
    }
    Ok(())
}

/// Turns the entity arena into shared trees, starting from the root
struct Materializer<'a> {
    shapes: &'a [EntityShape],
    elements: &'a [PendingElement],
    memo: Vec<Option<Arc<Struct>>>,
    visiting: Vec<bool>,
}

impl<'a> Materializer<'a> {
    fn new(shapes: &'a [EntityShape], elements: &'a [PendingElement]) -> Self {
        Self {
            shapes,
            elements,
            memo: vec![None; shapes.len()],
            visiting: vec![false; shapes.len()],
        }
    }

    fn entity(&mut self, index: u32, depth: usize) -> Result<Arc<Struct>> {
        let i = index as usize;
        let shapes = self.shapes;
        let shape = shapes
            .get(i)
            .ok_or_else(|| AuroraError::out_of_bounds("entity table", index, shapes.len() as u64))?;
        if let Some(done) = &self.memo[i] {
            return Ok(Arc::clone(done));
        }
        if self.visiting[i] {
            return Err(AuroraError::CyclicReference(index));
        }
        if depth > MAX_DEPTH {
            return Err(AuroraError::InvalidFormat(format!(
                "Nesting deeper than {MAX_DEPTH} levels at entity {index}"
            )));
        }
        self.visiting[i] = true;

        let mut fields = Struct::new(shape.id);
        for &element in &shape.elements {
            let element = self.element(element, depth)?;
            if let Some(replaced) = fields.insert(element) {
                warn!(
                    "Entity {} repeats field {:?}, keeping the later value",
                    index, replaced.name
                );
            }
        }

        self.visiting[i] = false;
        let fields = Arc::new(fields);
        self.memo[i] = Some(Arc::clone(&fields));
        Ok(fields)
    }

    fn element(&mut self, index: u32, depth: usize) -> Result<Element> {
        let elements = self.elements;
        let pending = elements.get(index as usize).ok_or_else(|| {
            AuroraError::out_of_bounds("element table", index, elements.len() as u64)
        })?;
        let value = match &pending.value {
            Pending::Ready(value) => value.clone(),
            Pending::Entity(entity) => Value::Struct(self.entity(*entity, depth + 1)?),
            Pending::List(builder) => Value::List(
                builder
                    .entities
                    .iter()
                    .map(|&entity| self.entity(entity, depth + 1))
                    .collect::<Result<_>>()?,
            ),
        };
        Ok(Element::new(pending.name.clone(), value))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::itp::ItpSections;
    use pretty_assertions::assert_eq;

    const U32: u32 = 4;
    const STRING: u32 = 10;
    const STRUCT: u32 = 14;
    const LIST: u32 = 15;

    fn u32_word(value: u32) -> Vec<u8> {
        value.to_le_bytes().to_vec()
    }

    fn words(values: &[u32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    fn string_at(text: &str) -> Vec<u8> {
        let mut bytes = u32_word(text.len() as u32);
        bytes.extend_from_slice(text.as_bytes());
        bytes
    }

    fn decode(sections: &ItpSections) -> Result<ItpFile> {
        ItpFile::read(&sections.to_bytes().unwrap()[..])
    }

    fn decode_strict(sections: &ItpSections) -> Result<ItpFile> {
        ItpFile::read_with(&sections.to_bytes().unwrap()[..], DecodeOptions::strict())
    }

    /// Root holds one list of two single-element entities (10, 20)
    fn list_of_two() -> ItpSections {
        ItpSections {
            entities: vec![Stub::new(0, 0, 1), Stub::new(1, 1, 1), Stub::new(1, 2, 1)],
            elements: vec![
                Stub::new(LIST, 0, 0),
                Stub::new(U32, 1, 10),
                Stub::new(U32, 1, 20),
            ],
            names: vec!["Items".into(), "Value".into()],
            lists: words(&[2, 1, 2]),
            ..ItpSections::default()
        }
    }

    #[test]
    fn test_list_of_scalar_entities() {
        let file = decode(&list_of_two()).unwrap();
        assert!(!file.reordered_reads);

        let root = file.root();
        assert_eq!(root.len(), 1);
        let items = root.value("Items").unwrap().as_list().unwrap();
        let values: Vec<_> = items
            .iter()
            .map(|s| s.value("Value").unwrap().clone())
            .collect();
        assert_eq!(values, vec![Value::U32(10), Value::U32(20)]);
        assert_eq!(items[0].id, 1);
    }

    #[test]
    fn test_list_offsets_resolved_ascending() {
        // First list stub points at offset 40, second at offset 10
        let mut lists = vec![0u8; 10];
        lists.extend(words(&[1, 2])); // offset 10: [entity 2]
        lists.resize(40, 0);
        lists.extend(words(&[2, 1, 1])); // offset 40: [entity 1, entity 1]
        let sections = ItpSections {
            entities: vec![Stub::new(0, 0, 2), Stub::new(5, 2, 1), Stub::new(6, 3, 1)],
            elements: vec![
                Stub::new(LIST, 0, 40),
                Stub::new(LIST, 1, 10),
                Stub::new(U32, 2, 7),
                Stub::new(U32, 2, 8),
            ],
            names: vec!["Late".into(), "Early".into(), "N".into()],
            multimap: words(&[0, 1]),
            lists,
            ..ItpSections::default()
        };

        // Pass 3 sorts regardless of the data-read option
        let file = decode_strict(&sections).unwrap();
        let late = file.root.value("Late").unwrap().as_list().unwrap();
        let early = file.root.value("Early").unwrap().as_list().unwrap();
        assert_eq!(late.len(), 2);
        assert_eq!(late[0].value("N"), Some(&Value::U32(7)));
        assert_eq!(early.len(), 1);
        assert_eq!(early[0].id, 6);
        assert_eq!(early[0].value("N"), Some(&Value::U32(8)));
    }

    #[test]
    fn test_list_entity_out_of_bounds() {
        let mut sections = list_of_two();
        sections.lists = words(&[2, 1, 3]);
        let err = decode(&sections).unwrap_err();
        assert!(matches!(
            err,
            AuroraError::IndexOutOfBounds { table: "entity table", index: 3, len: 3 }
        ));
        assert_eq!(err.kind(), ErrorKind::CorruptIndex);
    }

    #[test]
    fn test_struct_ref_out_of_bounds() {
        let sections = ItpSections {
            entities: vec![Stub::new(0, 0, 1)],
            elements: vec![Stub::new(STRUCT, 0, 9)],
            names: vec!["Child".into()],
            ..ItpSections::default()
        };
        assert_eq!(decode(&sections).unwrap_err().kind(), ErrorKind::CorruptIndex);
    }

    #[test]
    fn test_unknown_kind_tag() {
        let sections = ItpSections {
            entities: vec![Stub::new(0, 0, 1)],
            elements: vec![Stub::new(16, 0, 0)],
            names: vec!["Odd".into()],
            ..ItpSections::default()
        };
        let err = decode(&sections).unwrap_err();
        assert!(matches!(err, AuroraError::UnknownKind(16)));
        assert_eq!(err.kind(), ErrorKind::UnsupportedEncoding);
    }

    fn unordered_strings() -> ItpSections {
        let mut data = string_at("first");
        let second = data.len() as u32;
        data.extend(string_at("second"));
        ItpSections {
            entities: vec![Stub::new(0, 0, 2)],
            elements: vec![Stub::new(STRING, 0, second), Stub::new(STRING, 1, 0)],
            names: vec!["B".into(), "A".into()],
            data,
            multimap: words(&[0, 1]),
            ..ItpSections::default()
        }
    }

    #[test]
    fn test_unordered_data_reads_sorted_and_flagged() {
        let file = decode(&unordered_strings()).unwrap();
        assert!(file.reordered_reads);
        assert_eq!(file.root.value("A").unwrap().as_str(), Some("first"));
        assert_eq!(file.root.value("B").unwrap().as_str(), Some("second"));
        // Field order follows the multimap, not the read order
        assert_eq!(file.root.fields()[0].name, "B");
    }

    #[test]
    fn test_unordered_data_reads_rejected_in_strict_mode() {
        let err = decode_strict(&unordered_strings()).unwrap_err();
        assert!(matches!(err, AuroraError::BackwardSeek { .. }));
        assert_eq!(err.kind(), ErrorKind::Addressing);
    }

    #[test]
    fn test_shared_data_offset_read_once() {
        let sections = ItpSections {
            entities: vec![Stub::new(0, 0, 2)],
            elements: vec![Stub::new(STRING, 0, 0), Stub::new(STRING, 1, 0)],
            names: vec!["A".into(), "B".into()],
            data: string_at("same"),
            multimap: words(&[0, 1]),
            ..ItpSections::default()
        };
        let file = decode_strict(&sections).unwrap();
        assert_eq!(file.root.value("A"), file.root.value("B"));
        assert!(!file.reordered_reads);
    }

    #[test]
    fn test_data_offset_beyond_section() {
        let sections = ItpSections {
            entities: vec![Stub::new(0, 0, 1)],
            elements: vec![Stub::new(STRING, 0, 4)],
            names: vec!["A".into()],
            data: string_at(""),
            ..ItpSections::default()
        };
        assert_eq!(decode(&sections).unwrap_err().kind(), ErrorKind::CorruptIndex);
    }

    #[test]
    fn test_data_read_past_section_end() {
        let mut data = u32_word(50);
        data.extend_from_slice(b"abc");
        let sections = ItpSections {
            entities: vec![Stub::new(0, 0, 2)],
            elements: vec![Stub::new(STRING, 0, 0), Stub::new(U32, 0, 1)],
            names: vec!["A".into()],
            data,
            // Room for the string body to spill into
            multimap: words(&[0; 16]),
            ..ItpSections::default()
        };
        let err = decode(&sections).unwrap_err();
        assert!(matches!(err, AuroraError::SectionOverrun { section: "data", .. }));
        assert_eq!(err.kind(), ErrorKind::TruncatedData);
    }

    #[test]
    fn test_multimap_run_past_section_end() {
        let sections = ItpSections {
            entities: vec![Stub::new(0, 0, 3)],
            elements: vec![Stub::new(U32, 0, 1)],
            names: vec!["A".into()],
            multimap: words(&[0, 0]),
            ..ItpSections::default()
        };
        let err = decode(&sections).unwrap_err();
        assert!(matches!(err, AuroraError::SectionOverrun { section: "multimap", .. }));
    }

    #[test]
    fn test_empty_entity_and_nested_struct() {
        let sections = ItpSections {
            entities: vec![Stub::new(0, 0, 2), Stub::new(42, 0, 0)],
            elements: vec![Stub::new(STRUCT, 0, 1), Stub::new(U32, 1, 3)],
            names: vec!["Child".into(), "Count".into()],
            multimap: words(&[0, 1]),
            ..ItpSections::default()
        };
        let file = decode(&sections).unwrap();
        let child = file.root.value("Child").unwrap().as_struct().unwrap();
        assert_eq!(child.id, 42);
        assert!(child.is_empty());
        assert_eq!(file.root.value("Count"), Some(&Value::U32(3)));
    }

    #[test]
    fn test_shared_entity_in_two_lists() {
        let sections = ItpSections {
            entities: vec![Stub::new(0, 0, 2), Stub::new(3, 2, 1)],
            elements: vec![
                Stub::new(LIST, 0, 0),
                Stub::new(LIST, 1, 8),
                Stub::new(U32, 2, 99),
            ],
            names: vec!["A".into(), "B".into(), "V".into()],
            multimap: words(&[0, 1]),
            lists: words(&[1, 1, 1, 1]),
            ..ItpSections::default()
        };
        let file = decode(&sections).unwrap();
        assert_eq!(file.root.value("A"), file.root.value("B"));
    }

    #[test]
    fn test_repeated_list_members_are_shared() {
        // Entity k holds a list naming entity k + 1 twice; the last is empty
        const CHAIN: u32 = 40;
        let mut entities: Vec<Stub> = (0..CHAIN - 1).map(|k| Stub::new(0, k, 1)).collect();
        entities.push(Stub::new(9, 0, 0));
        let elements = (0..CHAIN - 1).map(|k| Stub::new(LIST, 0, k * 12)).collect();
        let lists = words(&(1..CHAIN).flat_map(|next| [2, next, next]).collect::<Vec<_>>());
        let sections = ItpSections {
            entities,
            elements,
            names: vec!["Next".into()],
            lists,
            ..ItpSections::default()
        };

        let file = decode_strict(&sections).unwrap();
        let mut current = file.root().clone();
        for _ in 1..CHAIN {
            let items = current.value("Next").unwrap().as_list().unwrap();
            assert_eq!(items.len(), 2);
            assert!(Arc::ptr_eq(&items[0], &items[1]));
            current = items[0].as_ref().clone();
        }
        assert_eq!(current.id, 9);
        assert!(current.is_empty());
    }

    #[test]
    fn test_nesting_deeper_than_cap() {
        let depth = MAX_DEPTH as u32 + 2;
        let mut entities: Vec<Stub> = (0..depth).map(|k| Stub::new(0, k, 1)).collect();
        entities.push(Stub::new(0, 0, 0));
        let elements = (1..=depth).map(|next| Stub::new(STRUCT, 0, next)).collect();
        let sections = ItpSections {
            entities,
            elements,
            names: vec!["Inner".into()],
            ..ItpSections::default()
        };
        let err = decode(&sections).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFormat);
    }

    #[test]
    fn test_cyclic_struct_reference() {
        let sections = ItpSections {
            entities: vec![Stub::new(0, 0, 1), Stub::new(0, 1, 1)],
            elements: vec![Stub::new(STRUCT, 0, 1), Stub::new(STRUCT, 0, 0)],
            names: vec!["Loop".into()],
            ..ItpSections::default()
        };
        let err = decode(&sections).unwrap_err();
        assert!(matches!(err, AuroraError::CyclicReference(_)));
        assert!(err.is_corrupt_input());
    }

    #[test]
    fn test_empty_entity_table() {
        let err = decode(&ItpSections::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptIndex);
    }

    #[test]
    fn test_bad_signature() {
        let mut bytes = list_of_two().to_bytes().unwrap();
        bytes[..4].copy_from_slice(b"GFF ");
        assert!(matches!(
            ItpFile::read(&bytes[..]),
            Err(AuroraError::InvalidSignature { .. })
        ));
        let lenient = DecodeOptions::default().without_signature_checks();
        assert!(ItpFile::read_with(&bytes[..], lenient).is_ok());
    }
}
