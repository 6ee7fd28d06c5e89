//! Forward-only little-endian reader

use super::FixedRecord;
use crate::error::{AuroraError, Result};
use binrw::BinRead;
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{self, Cursor, Read};

/// Little-endian reader that tracks how many bytes it has consumed
#[derive(Debug)]
pub struct ByteReader<R> {
    inner: R,
    position: u64,
}

impl<R: Read> ByteReader<R> {
    /// Wrap a byte source, starting at position 0
    pub fn new(inner: R) -> Self {
        Self { inner, position: 0 }
    }

    /// Bytes consumed since construction
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Borrow the underlying source
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Unwrap the underlying source
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Advance to an absolute position
    ///
    /// Seeking to the current position is a no-op. Targets before the current
    /// position fail with [`AuroraError::BackwardSeek`].
    pub fn seek_to(&mut self, target: u64) -> Result<()> {
        if target < self.position {
            return Err(AuroraError::BackwardSeek {
                position: self.position,
                target,
            });
        }
        self.skip(target - self.position)
    }

    /// Discard exactly `count` bytes
    pub fn skip(&mut self, count: u64) -> Result<()> {
        if count == 0 {
            return Ok(());
        }
        let start = self.position;
        let skipped = io::copy(&mut (&mut self.inner).take(count), &mut io::sink())?;
        self.position += skipped;
        if skipped < count {
            return Err(AuroraError::UnexpectedEof {
                position: start,
                needed: count - skipped,
            });
        }
        Ok(())
    }

    /// Read an unsigned byte
    pub fn read_u8(&mut self) -> Result<u8> {
        self.track(1, |r| r.read_u8())
    }

    /// Read a signed byte
    pub fn read_i8(&mut self) -> Result<i8> {
        self.track(1, |r| r.read_i8())
    }

    /// Read a little-endian `u16`
    pub fn read_u16(&mut self) -> Result<u16> {
        self.track(2, |r| r.read_u16::<LittleEndian>())
    }

    /// Read a little-endian `i16`
    pub fn read_i16(&mut self) -> Result<i16> {
        self.track(2, |r| r.read_i16::<LittleEndian>())
    }

    /// Read a little-endian `u32`
    pub fn read_u32(&mut self) -> Result<u32> {
        self.track(4, |r| r.read_u32::<LittleEndian>())
    }

    /// Read a little-endian `i32`
    pub fn read_i32(&mut self) -> Result<i32> {
        self.track(4, |r| r.read_i32::<LittleEndian>())
    }

    /// Read a little-endian `u64`
    pub fn read_u64(&mut self) -> Result<u64> {
        self.track(8, |r| r.read_u64::<LittleEndian>())
    }

    /// Read a little-endian `i64`
    pub fn read_i64(&mut self) -> Result<i64> {
        self.track(8, |r| r.read_i64::<LittleEndian>())
    }

    /// Read a little-endian IEEE-754 `f32`
    pub fn read_f32(&mut self) -> Result<f32> {
        self.track(4, |r| r.read_f32::<LittleEndian>())
    }

    /// Read a little-endian IEEE-754 `f64`
    pub fn read_f64(&mut self) -> Result<f64> {
        self.track(8, |r| r.read_f64::<LittleEndian>())
    }

    /// Read a fixed-size byte array
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.track(N as u64, |r| r.read_exact(&mut buf))?;
        Ok(buf)
    }

    /// Read exactly `len` bytes
    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        let start = self.position;
        let got = (&mut self.inner).take(len as u64).read_to_end(&mut buf)?;
        self.position += got as u64;
        if got < len {
            return Err(AuroraError::UnexpectedEof {
                position: start,
                needed: (len - got) as u64,
            });
        }
        Ok(buf)
    }

    /// Read one fixed-size `binrw` record
    pub fn read_record<T>(&mut self) -> Result<T>
    where
        T: FixedRecord + for<'a> BinRead<Args<'a> = ()>,
    {
        let buf = self.read_bytes(T::SIZE)?;
        Ok(T::read_le(&mut Cursor::new(buf))?)
    }

    fn track<T>(&mut self, size: u64, op: impl FnOnce(&mut R) -> io::Result<T>) -> Result<T> {
        match op(&mut self.inner) {
            Ok(value) => {
                self.position += size;
                Ok(value)
            }
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(AuroraError::UnexpectedEof {
                position: self.position,
                needed: size,
            }),
            Err(e) => Err(e.into()),
        }
    }
}

impl<R: Read> Read for ByteReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.position += n as u64;
        Ok(n)
    }
}
