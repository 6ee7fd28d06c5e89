//! Little-endian writer used by the builders

use crate::error::{AuroraError, Result};
use binrw::BinWrite;
use byteorder::{LittleEndian, WriteBytesExt};
use std::io::{self, Cursor, Read, Write};

/// Little-endian writer that tracks how many bytes it has produced
#[derive(Debug)]
pub struct ByteWriter<W> {
    inner: W,
    position: u64,
}

impl<W: Write> ByteWriter<W> {
    /// Wrap a byte sink, starting at position 0
    pub fn new(inner: W) -> Self {
        Self { inner, position: 0 }
    }

    /// Bytes produced since construction
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Unwrap the underlying sink
    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Write zero bytes up to an absolute position
    pub fn pad_to(&mut self, target: u64) -> Result<()> {
        if target < self.position {
            return Err(AuroraError::BackwardSeek {
                position: self.position,
                target,
            });
        }
        let count = target - self.position;
        io::copy(&mut io::repeat(0).take(count), &mut self.inner)?;
        self.position = target;
        Ok(())
    }

    /// Write an unsigned byte
    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.track(1, |w| w.write_u8(value))
    }

    /// Write a signed byte
    pub fn write_i8(&mut self, value: i8) -> Result<()> {
        self.track(1, |w| w.write_i8(value))
    }

    /// Write a little-endian `u16`
    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        self.track(2, |w| w.write_u16::<LittleEndian>(value))
    }

    /// Write a little-endian `i16`
    pub fn write_i16(&mut self, value: i16) -> Result<()> {
        self.track(2, |w| w.write_i16::<LittleEndian>(value))
    }

    /// Write a little-endian `u32`
    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.track(4, |w| w.write_u32::<LittleEndian>(value))
    }

    /// Write a little-endian `i32`
    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.track(4, |w| w.write_i32::<LittleEndian>(value))
    }

    /// Write a little-endian `u64`
    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        self.track(8, |w| w.write_u64::<LittleEndian>(value))
    }

    /// Write a little-endian `i64`
    pub fn write_i64(&mut self, value: i64) -> Result<()> {
        self.track(8, |w| w.write_i64::<LittleEndian>(value))
    }

    /// Write a little-endian IEEE-754 `f32`
    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        self.track(4, |w| w.write_f32::<LittleEndian>(value))
    }

    /// Write a little-endian IEEE-754 `f64`
    pub fn write_f64(&mut self, value: f64) -> Result<()> {
        self.track(8, |w| w.write_f64::<LittleEndian>(value))
    }

    /// Write raw bytes
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.track(bytes.len() as u64, |w| w.write_all(bytes))
    }

    /// Write one `binrw` record
    pub fn write_record<T>(&mut self, record: &T) -> Result<()>
    where
        T: for<'a> BinWrite<Args<'a> = ()>,
    {
        let mut buf = Cursor::new(Vec::new());
        record.write_le(&mut buf)?;
        self.write_bytes(&buf.into_inner())
    }

    fn track(&mut self, size: u64, op: impl FnOnce(&mut W) -> io::Result<()>) -> Result<()> {
        op(&mut self.inner)?;
        self.position += size;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cursor::ByteReader;
    use proptest::prelude::*;

    #[test]
    fn test_pad_to() {
        let mut writer = ByteWriter::new(Vec::new());
        writer.write_u16(0xABCD).unwrap();
        writer.pad_to(6).unwrap();
        writer.write_u8(1).unwrap();
        assert_eq!(writer.position(), 7);
        assert_eq!(writer.into_inner(), vec![0xCD, 0xAB, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn test_pad_backward_rejected() {
        let mut writer = ByteWriter::new(Vec::new());
        writer.write_u32(0).unwrap();
        assert!(writer.pad_to(2).is_err());
    }

    proptest! {
        #[test]
        fn primitives_read_back(
            a in any::<u8>(),
            b in any::<i16>(),
            c in any::<u32>(),
            d in any::<i64>(),
            e in any::<f64>(),
        ) {
            let mut writer = ByteWriter::new(Vec::new());
            writer.write_u8(a).unwrap();
            writer.write_i16(b).unwrap();
            writer.write_u32(c).unwrap();
            writer.write_i64(d).unwrap();
            writer.write_f64(e).unwrap();
            let produced = writer.position();
            let bytes = writer.into_inner();

            let mut reader = ByteReader::new(&bytes[..]);
            prop_assert_eq!(reader.read_u8().unwrap(), a);
            prop_assert_eq!(reader.read_i16().unwrap(), b);
            prop_assert_eq!(reader.read_u32().unwrap(), c);
            prop_assert_eq!(reader.read_i64().unwrap(), d);
            prop_assert_eq!(reader.read_f64().unwrap().to_bits(), e.to_bits());
            prop_assert_eq!(reader.position(), produced);
        }
    }
}
