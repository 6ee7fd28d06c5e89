//! Typed value model shared by every structured-data format
//!
//! A document is a tree of [`Element`]s: each element is a name plus a
//! [`Value`] of one of seventeen kinds. [`Struct`] values map names to
//! elements, list values hold an ordered sequence of structs.
//!
//! Nested structs are held behind [`Arc`], so a struct referenced from
//! several places in a decoded file is stored once.
//!
//! Small kinds fit in a 32-bit stub slot ([`ElementKind::is_inline`]); wide
//! kinds live in a data section and are read and written through
//! [`Value::read_wide`] and [`Value::write_wide`].

mod codec;

pub(crate) use codec::{decode_text, fixed_name, trim_fixed_name};

use crate::error::{AuroraError, Result};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Element kind tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementKind {
    /// Unsigned 8-bit integer
    U8,
    /// Signed 8-bit integer
    I8,
    /// Unsigned 16-bit integer
    U16,
    /// Signed 16-bit integer
    I16,
    /// Unsigned 32-bit integer
    U32,
    /// Signed 32-bit integer
    I32,
    /// Unsigned 64-bit integer
    U64,
    /// Signed 64-bit integer
    I64,
    /// IEEE-754 single precision
    F32,
    /// IEEE-754 double precision
    F64,
    /// Length-prefixed string
    String,
    /// Short resource reference
    ResRef,
    /// Localized string-table reference
    LocString,
    /// Opaque binary blob
    Binary,
    /// Nested struct
    Struct,
    /// Ordered list of structs
    List,
    /// Bare string-table reference
    StrRef,
}

impl ElementKind {
    /// Every kind, in tag order
    pub const ALL: [Self; 17] = [
        Self::U8,
        Self::I8,
        Self::U16,
        Self::I16,
        Self::U32,
        Self::I32,
        Self::U64,
        Self::I64,
        Self::F32,
        Self::F64,
        Self::String,
        Self::ResRef,
        Self::LocString,
        Self::Binary,
        Self::Struct,
        Self::List,
        Self::StrRef,
    ];

    /// On-disk kind tag
    pub fn tag(self) -> u32 {
        match self {
            Self::U8 => 0,
            Self::I8 => 1,
            Self::U16 => 2,
            Self::I16 => 3,
            Self::U32 => 4,
            Self::I32 => 5,
            Self::U64 => 6,
            Self::I64 => 7,
            Self::F32 => 8,
            Self::F64 => 9,
            Self::String => 10,
            Self::ResRef => 11,
            Self::LocString => 12,
            Self::Binary => 13,
            Self::Struct => 14,
            Self::List => 15,
            Self::StrRef => 18,
        }
    }

    /// Decode an on-disk kind tag
    pub fn from_tag(tag: u32) -> Result<Self> {
        Ok(match tag {
            0 => Self::U8,
            1 => Self::I8,
            2 => Self::U16,
            3 => Self::I16,
            4 => Self::U32,
            5 => Self::I32,
            6 => Self::U64,
            7 => Self::I64,
            8 => Self::F32,
            9 => Self::F64,
            10 => Self::String,
            11 => Self::ResRef,
            12 => Self::LocString,
            13 => Self::Binary,
            14 => Self::Struct,
            15 => Self::List,
            18 => Self::StrRef,
            other => return Err(AuroraError::UnknownKind(other)),
        })
    }

    /// Value fits in a 32-bit stub slot
    pub fn is_inline(self) -> bool {
        matches!(
            self,
            Self::U8
                | Self::I8
                | Self::U16
                | Self::I16
                | Self::U32
                | Self::I32
                | Self::F32
                | Self::StrRef
        )
    }

    /// Value lives in a data section
    pub fn is_wide(self) -> bool {
        matches!(
            self,
            Self::U64
                | Self::I64
                | Self::F64
                | Self::String
                | Self::ResRef
                | Self::LocString
                | Self::Binary
        )
    }
}

/// One language's text inside a [`LocString`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocalizedString {
    /// Language id
    pub language: u32,
    /// Text
    pub text: String,
}

/// Localized string: a string-table id plus per-language overrides
///
/// The first language's text is the default value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LocString {
    /// String-table id, `None` when stored as `0xFFFF_FFFF`
    pub str_ref: Option<u32>,
    strings: Vec<LocalizedString>,
}

impl LocString {
    /// Stored marker for "no string-table entry"
    pub const NO_STR_REF: u32 = 0xFFFF_FFFF;

    /// Create an empty localized string
    pub fn new(str_ref: Option<u32>) -> Self {
        Self {
            str_ref,
            strings: Vec::new(),
        }
    }

    /// Add or replace the text for a language, keeping first-insertion order
    #[must_use]
    pub fn with_text(mut self, language: u32, text: impl Into<String>) -> Self {
        self.insert(language, text);
        self
    }

    /// Add or replace the text for a language
    ///
    /// Replacing the first language's text also replaces the default.
    pub fn insert(&mut self, language: u32, text: impl Into<String>) {
        let text = text.into();
        match self.strings.iter_mut().find(|s| s.language == language) {
            Some(existing) => existing.text = text,
            None => self.strings.push(LocalizedString { language, text }),
        }
    }

    /// Append an entry as stored, even when its language repeats
    ///
    /// The default stays with the first entry; [`LocString::get`] sees the
    /// last entry for a language.
    pub(crate) fn push(&mut self, language: u32, text: String) {
        self.strings.push(LocalizedString { language, text });
    }

    /// Text of the first stored language
    pub fn default_text(&self) -> Option<&str> {
        self.strings.first().map(|s| s.text.as_str())
    }

    /// Text for a given language id
    pub fn get(&self, language: u32) -> Option<&str> {
        self.strings
            .iter()
            .rfind(|s| s.language == language)
            .map(|s| s.text.as_str())
    }

    /// All languages in stored order
    pub fn strings(&self) -> &[LocalizedString] {
        &self.strings
    }
}

/// Typed payload of an [`Element`]
#[derive(Debug, Clone)]
pub enum Value {
    /// Unsigned 8-bit integer
    U8(u8),
    /// Signed 8-bit integer
    I8(i8),
    /// Unsigned 16-bit integer
    U16(u16),
    /// Signed 16-bit integer
    I16(i16),
    /// Unsigned 32-bit integer
    U32(u32),
    /// Signed 32-bit integer
    I32(i32),
    /// Unsigned 64-bit integer
    U64(u64),
    /// Signed 64-bit integer
    I64(i64),
    /// Single precision float
    F32(f32),
    /// Double precision float
    F64(f64),
    /// String
    String(String),
    /// Resource reference (at most 255 bytes)
    ResRef(String),
    /// Localized string
    LocString(LocString),
    /// Binary blob
    Binary(Vec<u8>),
    /// Nested struct
    Struct(Arc<Struct>),
    /// Ordered list of structs
    List(Vec<Arc<Struct>>),
    /// Bare string-table reference
    StrRef(u32),
}

impl Value {
    /// List of owned structs
    pub fn list(items: impl IntoIterator<Item = Struct>) -> Self {
        Self::List(items.into_iter().map(Arc::new).collect())
    }

    /// Kind tag of this value
    pub fn kind(&self) -> ElementKind {
        match self {
            Self::U8(_) => ElementKind::U8,
            Self::I8(_) => ElementKind::I8,
            Self::U16(_) => ElementKind::U16,
            Self::I16(_) => ElementKind::I16,
            Self::U32(_) => ElementKind::U32,
            Self::I32(_) => ElementKind::I32,
            Self::U64(_) => ElementKind::U64,
            Self::I64(_) => ElementKind::I64,
            Self::F32(_) => ElementKind::F32,
            Self::F64(_) => ElementKind::F64,
            Self::String(_) => ElementKind::String,
            Self::ResRef(_) => ElementKind::ResRef,
            Self::LocString(_) => ElementKind::LocString,
            Self::Binary(_) => ElementKind::Binary,
            Self::Struct(_) => ElementKind::Struct,
            Self::List(_) => ElementKind::List,
            Self::StrRef(_) => ElementKind::StrRef,
        }
    }

    /// Decode an inline kind from its 32-bit stub slot
    ///
    /// Narrow integers take the low bits; `F32` reinterprets the slot as an
    /// IEEE-754 bit pattern. Returns `None` for kinds that are not inline.
    pub fn from_inline(kind: ElementKind, slot: u32) -> Option<Self> {
        Some(match kind {
            ElementKind::U8 => Self::U8(slot as u8),
            ElementKind::I8 => Self::I8(slot as i8),
            ElementKind::U16 => Self::U16(slot as u16),
            ElementKind::I16 => Self::I16(slot as i16),
            ElementKind::U32 => Self::U32(slot),
            ElementKind::I32 => Self::I32(slot as i32),
            ElementKind::F32 => Self::F32(f32::from_bits(slot)),
            ElementKind::StrRef => Self::StrRef(slot),
            _ => return None,
        })
    }

    /// Encode an inline kind into a 32-bit stub slot (signed kinds sign-extend)
    pub fn to_inline(&self) -> Option<u32> {
        Some(match *self {
            Self::U8(v) => u32::from(v),
            Self::I8(v) => i32::from(v) as u32,
            Self::U16(v) => u32::from(v),
            Self::I16(v) => i32::from(v) as u32,
            Self::U32(v) | Self::StrRef(v) => v,
            Self::I32(v) => v as u32,
            Self::F32(v) => v.to_bits(),
            _ => return None,
        })
    }

    /// Serialized size of a length-prefixed kind
    ///
    /// Only `String` (4-byte prefix) and `ResRef` (1-byte prefix) have a
    /// defined size; every other kind fails with
    /// [`AuroraError::UnsizedKind`].
    pub fn serialized_size(&self) -> Result<usize> {
        match self {
            Self::String(s) => Ok(4 + s.len()),
            Self::ResRef(s) => Ok(1 + s.len()),
            other => Err(AuroraError::UnsizedKind(other.kind())),
        }
    }

    /// Borrow as a struct
    pub fn as_struct(&self) -> Option<&Struct> {
        match self {
            Self::Struct(s) => Some(s.as_ref()),
            _ => None,
        }
    }

    /// Borrow as a list
    pub fn as_list(&self) -> Option<&[Arc<Struct>]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Borrow string-like payloads
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::ResRef(s) => Some(s),
            Self::LocString(l) => l.default_text(),
            _ => None,
        }
    }

    /// Widen any integer kind
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::U8(v) => Some(v.into()),
            Self::I8(v) => Some(v.into()),
            Self::U16(v) => Some(v.into()),
            Self::I16(v) => Some(v.into()),
            Self::U32(v) | Self::StrRef(v) => Some(v.into()),
            Self::I32(v) => Some(v.into()),
            Self::I64(v) => Some(v),
            Self::U64(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }
}

impl From<Struct> for Value {
    fn from(value: Struct) -> Self {
        Self::Struct(Arc::new(value))
    }
}

// Floats compare by bit pattern so that `Eq` and `Hash` stay consistent.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::U8(a), Self::U8(b)) => a == b,
            (Self::I8(a), Self::I8(b)) => a == b,
            (Self::U16(a), Self::U16(b)) => a == b,
            (Self::I16(a), Self::I16(b)) => a == b,
            (Self::U32(a), Self::U32(b)) | (Self::StrRef(a), Self::StrRef(b)) => a == b,
            (Self::I32(a), Self::I32(b)) => a == b,
            (Self::U64(a), Self::U64(b)) => a == b,
            (Self::I64(a), Self::I64(b)) => a == b,
            (Self::F32(a), Self::F32(b)) => a.to_bits() == b.to_bits(),
            (Self::F64(a), Self::F64(b)) => a.to_bits() == b.to_bits(),
            (Self::String(a), Self::String(b)) | (Self::ResRef(a), Self::ResRef(b)) => a == b,
            (Self::LocString(a), Self::LocString(b)) => a == b,
            (Self::Binary(a), Self::Binary(b)) => a == b,
            (Self::Struct(a), Self::Struct(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

// Lists hash only their kind; the owning element adds its name. Equal lists
// still hash equally, which is all `Hash` requires.
impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind().hash(state);
        match self {
            Self::U8(v) => v.hash(state),
            Self::I8(v) => v.hash(state),
            Self::U16(v) => v.hash(state),
            Self::I16(v) => v.hash(state),
            Self::U32(v) | Self::StrRef(v) => v.hash(state),
            Self::I32(v) => v.hash(state),
            Self::U64(v) => v.hash(state),
            Self::I64(v) => v.hash(state),
            Self::F32(v) => v.to_bits().hash(state),
            Self::F64(v) => v.to_bits().hash(state),
            Self::String(v) | Self::ResRef(v) => v.hash(state),
            Self::LocString(v) => v.hash(state),
            Self::Binary(v) => v.hash(state),
            Self::Struct(v) => v.hash(state),
            Self::List(_) => {}
        }
    }
}

/// Named value node
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Element {
    /// Field name (at most 16 bytes when written)
    pub name: String,
    /// Payload
    pub value: Value,
}

impl Element {
    /// Create an element
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// Kind of the payload
    pub fn kind(&self) -> ElementKind {
        self.value.kind()
    }
}

/// Struct node: an id plus uniquely named fields in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Struct {
    /// Struct type id
    pub id: u32,
    fields: Vec<Element>,
}

impl Struct {
    /// Create an empty struct
    pub fn new(id: u32) -> Self {
        Self {
            id,
            fields: Vec::new(),
        }
    }

    /// Builder-style field insertion
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.insert(Element::new(name, value));
        self
    }

    /// Insert a field, replacing and returning any field with the same name
    pub fn insert(&mut self, element: Element) -> Option<Element> {
        match self.fields.iter_mut().find(|f| f.name == element.name) {
            Some(existing) => Some(std::mem::replace(existing, element)),
            None => {
                self.fields.push(element);
                None
            }
        }
    }

    /// Look up a field by name
    pub fn get(&self, name: &str) -> Option<&Element> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Look up a field's payload by name
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.get(name).map(|f| &f.value)
    }

    /// Fields in stored order
    pub fn fields(&self) -> &[Element] {
        &self.fields
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the struct has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of<T: Hash>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_kind_tags() {
        for kind in ElementKind::ALL {
            assert_eq!(ElementKind::from_tag(kind.tag()).unwrap(), kind);
            assert!(!(kind.is_inline() && kind.is_wide()));
        }
        assert!(matches!(ElementKind::from_tag(16), Err(AuroraError::UnknownKind(16))));
        assert!(matches!(ElementKind::from_tag(17), Err(AuroraError::UnknownKind(17))));
    }

    #[test]
    fn test_inline_slots() {
        assert_eq!(Value::from_inline(ElementKind::I8, 0xFFFF_FFFE), Some(Value::I8(-2)));
        assert_eq!(Value::I16(-3).to_inline(), Some(0xFFFF_FFFD));
        assert_eq!(
            Value::from_inline(ElementKind::F32, 0x3FC0_0000),
            Some(Value::F32(1.5))
        );
        assert_eq!(Value::from_inline(ElementKind::U64, 1), None);
        assert_eq!(Value::String("x".into()).to_inline(), None);
    }

    #[test]
    fn test_serialized_size() {
        assert_eq!(Value::String("abcd".into()).serialized_size().unwrap(), 8);
        assert_eq!(Value::ResRef("it_sword".into()).serialized_size().unwrap(), 9);
        assert!(matches!(
            Value::U32(1).serialized_size(),
            Err(AuroraError::UnsizedKind(ElementKind::U32))
        ));
        assert!(Value::List(Vec::new()).serialized_size().is_err());
    }

    #[test]
    fn test_struct_names_unique() {
        let mut s = Struct::new(7).with("Tag", Value::String("a".into()));
        let replaced = s.insert(Element::new("Tag", Value::String("b".into())));
        assert_eq!(replaced.unwrap().value, Value::String("a".into()));
        assert_eq!(s.len(), 1);
        assert_eq!(s.value("Tag").unwrap().as_str(), Some("b"));
    }

    #[test]
    fn test_float_equality_by_bits() {
        assert_eq!(Value::F32(f32::NAN), Value::F32(f32::NAN));
        assert_ne!(Value::F64(0.0), Value::F64(-0.0));
    }

    #[test]
    fn test_list_hash_ignores_items() {
        let a = Element::new("Items", Value::list([Struct::new(1)]));
        let b = Element::new("Items", Value::list([Struct::new(2), Struct::new(3)]));
        assert_ne!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));

        let c = Element::new("Other", Value::list([Struct::new(1)]));
        assert_ne!(hash_of(&a), hash_of(&c));
    }

    #[test]
    fn test_loc_string_default_is_first_language() {
        let loc = LocString::new(Some(1234))
            .with_text(3, "Hallo")
            .with_text(0, "Hello");
        assert_eq!(loc.default_text(), Some("Hallo"));
        assert_eq!(loc.get(0), Some("Hello"));
        assert_eq!(loc.get(9), None);
    }

    #[test]
    fn test_loc_string_repeated_language_keeps_first_default() {
        let mut loc = LocString::new(None);
        loc.push(0, "A".into());
        loc.push(0, "B".into());
        assert_eq!(loc.default_text(), Some("A"));
        assert_eq!(loc.get(0), Some("B"));
        assert_eq!(loc.strings().len(), 2);
    }

    #[test]
    fn test_shared_struct_compares_by_value() {
        let shared = Arc::new(Struct::new(4).with("Hp", Value::U16(30)));
        let a = Value::List(vec![Arc::clone(&shared), shared]);
        let b = Value::list([
            Struct::new(4).with("Hp", Value::U16(30)),
            Struct::new(4).with("Hp", Value::U16(30)),
        ]);
        assert_eq!(a, b);
        assert_eq!(a.as_list().unwrap()[1].value("Hp"), Some(&Value::U16(30)));
    }
}
