//! Resource identity shared by KEY and BIF files
//!
//! A resource is named by a [`ResourceKey`] (name plus numeric type). The KEY
//! file maps each key to a packed 32-bit identifier:
//!
//! ```text
//!  31          20 19      14 13            0
//! +--------------+----------+---------------+
//! | archive index| fixed    | variable slot |
//! +--------------+----------+---------------+
//! ```
//!
//! The packed form only exists on disk. Readers decode it into a
//! [`ResourceId`] at the boundary.

use std::fmt;

/// Decoded composite resource identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId {
    /// Index of the archive file in the KEY file table (12 bits)
    pub archive_index: u16,
    /// Fixed-resource slot (6 bits, legacy)
    pub fixed_slot: u8,
    /// Variable-resource slot (14 bits)
    pub variable_slot: u16,
}

impl ResourceId {
    /// Largest archive index that fits in the packed form
    pub const MAX_ARCHIVE_INDEX: u16 = 0x0FFF;
    /// Largest fixed slot that fits in the packed form
    pub const MAX_FIXED_SLOT: u8 = 0x3F;
    /// Largest variable slot that fits in the packed form
    pub const MAX_VARIABLE_SLOT: u16 = 0x3FFF;

    /// Build an identifier for a variable resource
    pub fn new(archive_index: u16, variable_slot: u16) -> Self {
        Self {
            archive_index: archive_index & Self::MAX_ARCHIVE_INDEX,
            fixed_slot: 0,
            variable_slot: variable_slot & Self::MAX_VARIABLE_SLOT,
        }
    }

    /// Decompose a packed identifier
    pub fn unpack(raw: u32) -> Self {
        Self {
            archive_index: (raw >> 20) as u16,
            fixed_slot: ((raw >> 14) & 0x3F) as u8,
            variable_slot: (raw & 0x3FFF) as u16,
        }
    }

    /// Pack into the on-disk form, masking each field to its width
    pub fn pack(self) -> u32 {
        (u32::from(self.archive_index & Self::MAX_ARCHIVE_INDEX) << 20)
            | (u32::from(self.fixed_slot & Self::MAX_FIXED_SLOT) << 14)
            | u32::from(self.variable_slot & Self::MAX_VARIABLE_SLOT)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.archive_index, self.fixed_slot, self.variable_slot
        )
    }
}

macro_rules! resource_types {
    ($($variant:ident = $id:literal, $ext:literal;)*) => {
        /// Numeric resource type with its conventional file extension
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum ResourceType {
            $(
                #[allow(missing_docs)]
                $variant,
            )*
            /// Type id with no known extension
            Unknown(u16),
        }

        impl ResourceType {
            /// Numeric type id as stored in KEY and BIF tables
            pub fn id(self) -> u16 {
                match self {
                    $(Self::$variant => $id,)*
                    Self::Unknown(id) => id,
                }
            }

            /// Map a numeric type id
            pub fn from_id(id: u16) -> Self {
                match id {
                    $($id => Self::$variant,)*
                    other => Self::Unknown(other),
                }
            }

            /// Conventional file extension, if the type is known
            pub fn extension(self) -> Option<&'static str> {
                match self {
                    $(Self::$variant => Some($ext),)*
                    Self::Unknown(_) => None,
                }
            }

            /// Map a file extension (case-insensitive)
            pub fn from_extension(ext: &str) -> Option<Self> {
                let ext = ext.to_ascii_lowercase();
                match ext.as_str() {
                    $($ext => Some(Self::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

resource_types! {
    Bmp = 1, "bmp";
    Tga = 3, "tga";
    Wav = 4, "wav";
    Plt = 6, "plt";
    Ini = 7, "ini";
    Txt = 10, "txt";
    Mdl = 2002, "mdl";
    Nss = 2009, "nss";
    Ncs = 2010, "ncs";
    Are = 2012, "are";
    Set = 2013, "set";
    Ifo = 2014, "ifo";
    Bic = 2015, "bic";
    Wok = 2016, "wok";
    TwoDa = 2017, "2da";
    Txi = 2022, "txi";
    Git = 2023, "git";
    Uti = 2025, "uti";
    Utc = 2027, "utc";
    Dlg = 2029, "dlg";
    Itp = 2030, "itp";
    Utt = 2032, "utt";
    Dds = 2033, "dds";
    Uts = 2035, "uts";
    Ltr = 2036, "ltr";
    Gff = 2037, "gff";
    Fac = 2038, "fac";
    Ute = 2040, "ute";
    Utd = 2042, "utd";
    Utp = 2044, "utp";
    Gic = 2046, "gic";
    Gui = 2047, "gui";
    Utm = 2051, "utm";
    Jrl = 2056, "jrl";
    Utw = 2058, "utw";
    Ssf = 2060, "ssf";
    Erf = 9997, "erf";
    Bif = 9998, "bif";
    Key = 9999, "key";
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.extension() {
            Some(ext) => f.write_str(ext),
            None => write!(f, "type{}", self.id()),
        }
    }
}

/// Resource name plus type, the lookup key used by KEY files and collections
///
/// Names compare case-insensitively: they are stored lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey {
    name: String,
    resource_type: ResourceType,
}

impl ResourceKey {
    /// Create a key, normalizing the name to lowercase
    pub fn new(name: impl AsRef<str>, resource_type: ResourceType) -> Self {
        Self {
            name: name.as_ref().to_ascii_lowercase(),
            resource_type,
        }
    }

    /// Parse a `name.ext` file name
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let (name, ext) = file_name.rsplit_once('.')?;
        Some(Self::new(name, ResourceType::from_extension(ext)?))
    }

    /// Resource name without extension
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resource type
    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.name, self.resource_type)
    }
}
