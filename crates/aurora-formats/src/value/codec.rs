//! Data-section encodings of wide element kinds

use super::{ElementKind, LocString, Value};
use crate::cursor::{ByteReader, ByteWriter};
use crate::error::{AuroraError, Result};
use std::io::{Read, Write};
use tracing::trace;

impl Value {
    /// Read a wide kind's payload from the current reader position
    ///
    /// | kind        | encoding                                              |
    /// |-------------|-------------------------------------------------------|
    /// | `U64`/`I64`/`F64` | 8 bytes                                         |
    /// | `String`    | u32 length + bytes                                    |
    /// | `ResRef`    | u8 length + bytes                                     |
    /// | `LocString` | u32 size, u32 str-ref, u32 count, count × (u32 language, u32 length, bytes) |
    /// | `Binary`    | u32 length + bytes                                    |
    pub fn read_wide<R: Read>(kind: ElementKind, reader: &mut ByteReader<R>) -> Result<Self> {
        Ok(match kind {
            ElementKind::U64 => Self::U64(reader.read_u64()?),
            ElementKind::I64 => Self::I64(reader.read_i64()?),
            ElementKind::F64 => Self::F64(reader.read_f64()?),
            ElementKind::String => {
                let len = reader.read_u32()?;
                Self::String(decode_text(reader.read_bytes(len as usize)?))
            }
            ElementKind::ResRef => {
                let len = reader.read_u8()?;
                Self::ResRef(decode_text(reader.read_bytes(len as usize)?))
            }
            ElementKind::LocString => Self::LocString(read_loc_string(reader)?),
            ElementKind::Binary => {
                let len = reader.read_u32()?;
                Self::Binary(reader.read_bytes(len as usize)?)
            }
            other => return Err(AuroraError::NotWideKind(other)),
        })
    }

    /// Write a wide kind's payload
    pub fn write_wide<W: Write>(&self, writer: &mut ByteWriter<W>) -> Result<()> {
        match self {
            Self::U64(v) => writer.write_u64(*v),
            Self::I64(v) => writer.write_i64(*v),
            Self::F64(v) => writer.write_f64(*v),
            Self::String(s) => {
                writer.write_u32(length_u32(s.len())?)?;
                writer.write_bytes(s.as_bytes())
            }
            Self::ResRef(s) => {
                let len = u8::try_from(s.len()).map_err(|_| AuroraError::NameTooLong {
                    name: s.clone(),
                    len: s.len(),
                    max: u8::MAX as usize,
                })?;
                writer.write_u8(len)?;
                writer.write_bytes(s.as_bytes())
            }
            Self::LocString(loc) => write_loc_string(loc, writer),
            Self::Binary(bytes) => {
                writer.write_u32(length_u32(bytes.len())?)?;
                writer.write_bytes(bytes)
            }
            other => Err(AuroraError::NotWideKind(other.kind())),
        }
    }
}

fn read_loc_string<R: Read>(reader: &mut ByteReader<R>) -> Result<LocString> {
    let total = u64::from(reader.read_u32()?);
    let start = reader.position();
    let str_ref = reader.read_u32()?;
    let count = reader.read_u32()?;

    let mut loc = LocString::new((str_ref != LocString::NO_STR_REF).then_some(str_ref));
    for _ in 0..count {
        let language = reader.read_u32()?;
        let len = reader.read_u32()?;
        let text = decode_text(reader.read_bytes(len as usize)?);
        loc.push(language, text);
    }

    let consumed = reader.position() - start;
    if consumed > total {
        return Err(AuroraError::InvalidFormat(format!(
            "Localized string declares {total} bytes but holds {consumed}"
        )));
    }
    if consumed < total {
        trace!("Skipping {} trailing bytes of localized string", total - consumed);
        reader.skip(total - consumed)?;
    }
    Ok(loc)
}

fn write_loc_string<W: Write>(loc: &LocString, writer: &mut ByteWriter<W>) -> Result<()> {
    let body: usize = 8 + loc
        .strings()
        .iter()
        .map(|s| 8 + s.text.len())
        .sum::<usize>();
    writer.write_u32(length_u32(body)?)?;
    writer.write_u32(loc.str_ref.unwrap_or(LocString::NO_STR_REF))?;
    writer.write_u32(length_u32(loc.strings().len())?)?;
    for s in loc.strings() {
        writer.write_u32(s.language)?;
        writer.write_u32(length_u32(s.text.len())?)?;
        writer.write_bytes(s.text.as_bytes())?;
    }
    Ok(())
}

fn length_u32(len: usize) -> Result<u32> {
    u32::try_from(len)
        .map_err(|_| AuroraError::InvalidFormat(format!("Length {len} does not fit in 32 bits")))
}

/// Decode stored text as UTF-8, replacing invalid sequences
pub(crate) fn decode_text(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

/// Decode a fixed-width name field, dropping trailing NUL and space padding
pub(crate) fn trim_fixed_name(bytes: &[u8]) -> String {
    let end = bytes
        .iter()
        .rposition(|&b| b != 0 && b != b' ')
        .map_or(0, |i| i + 1);
    // Some writers terminate with NUL and leave garbage behind it
    let end = bytes[..end].iter().position(|&b| b == 0).unwrap_or(end);
    decode_text(bytes[..end].to_vec())
}

/// Encode a name into a fixed-width field padded with `pad`
pub(crate) fn fixed_name<const N: usize>(name: &str, pad: u8) -> Result<[u8; N]> {
    let bytes = name.as_bytes();
    if bytes.len() > N {
        return Err(AuroraError::NameTooLong {
            name: name.to_string(),
            len: bytes.len(),
            max: N,
        });
    }
    let mut field = [pad; N];
    field[..bytes.len()].copy_from_slice(bytes);
    Ok(field)
}
