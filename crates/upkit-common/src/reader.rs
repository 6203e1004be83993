//! Binary readers for slices and streams.
//!
//! [`BinaryReader`] walks an in-memory byte slice without copying, while
//! [`ReadExt`] adds fixed-struct and C-string reads to streams.

use std::io::{self, BufRead, Read};

use zerocopy::FromBytes;

use crate::{ansi, Error, Result};

/// A cursor over a byte slice that reads little-endian values.
///
/// # Example
///
/// ```
/// use upkit_common::BinaryReader;
///
/// let data = [0xFF, 0x01, 0x02, 0x03, 0x04];
/// let mut reader = BinaryReader::new_at(&data, 1);
///
/// assert_eq!(reader.read_u32().unwrap(), 0x04030201);
/// assert_eq!(reader.remaining(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> BinaryReader<'a> {
    /// Create a new reader from a byte slice.
    #[inline]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Create a new reader starting at a specific position.
    #[inline]
    pub const fn new_at(data: &'a [u8], position: usize) -> Self {
        Self { data, position }
    }

    /// Get the current position in the buffer.
    #[inline]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Get the number of bytes remaining to read.
    #[inline]
    pub const fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Read bytes and advance the position.
    #[inline]
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        if self.remaining() < count {
            return Err(Error::UnexpectedEof {
                needed: count,
                available: self.remaining(),
            });
        }
        let bytes = &self.data[self.position..self.position + count];
        self.position += count;
        Ok(bytes)
    }

    /// Read a little-endian u32.
    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

/// Struct and string reads for streams.
///
/// Implemented for every [`Read`], so it works equally over a `File`, a
/// `BufReader` or an in-memory `Cursor`.
pub trait ReadExt: Read {
    /// Read a fixed-size structure from the stream.
    fn read_struct<T: FromBytes>(&mut self) -> io::Result<T> {
        let mut bytes = vec![0u8; std::mem::size_of::<T>()];
        self.read_exact(&mut bytes)?;
        T::read_from_bytes(&bytes)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("{:?}", e)))
    }

    /// Read a null-terminated single-byte string, consuming the terminator.
    ///
    /// Bytes are decoded with [`ansi::decode`], so every stored byte survives
    /// and re-encodes to itself. Reaching the end of the stream first is
    /// reported as [`io::ErrorKind::UnexpectedEof`].
    fn read_cstring(&mut self) -> io::Result<String>
    where
        Self: BufRead,
    {
        let mut bytes = Vec::new();
        self.read_until(0, &mut bytes)?;
        if bytes.pop() != Some(0) {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }
        Ok(ansi::decode(&bytes))
    }
}

impl<R: Read + ?Sized> ReadExt for R {}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

    use super::*;

    #[derive(Debug, PartialEq, FromBytes, IntoBytes, Immutable, KnownLayout)]
    #[repr(C)]
    struct Pair {
        a: u32,
        b: u32,
    }

    #[test]
    fn test_read_u32() {
        let data = [0x01u8, 0x02, 0x03, 0x04, 0x2A, 0x00, 0x00, 0x00];
        let mut reader = BinaryReader::new(&data);

        assert_eq!(reader.read_u32().unwrap(), 0x04030201);
        assert_eq!(reader.read_u32().unwrap(), 42);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_new_at_reads_from_offset() {
        let data = [0xAA, 0xBB, 0x2A, 0x00, 0x00, 0x00];
        let mut reader = BinaryReader::new_at(&data, 2);

        assert_eq!(reader.read_u32().unwrap(), 42);
        assert_eq!(reader.position(), 6);
    }

    #[test]
    fn test_eof_error() {
        let data = [0x01, 0x02];
        let mut reader = BinaryReader::new(&data);

        assert!(matches!(
            reader.read_u32(),
            Err(Error::UnexpectedEof { needed: 4, available: 2 })
        ));
    }

    #[test]
    fn test_stream_struct_and_cstring() {
        let mut bytes = Pair { a: 7, b: 9 }.as_bytes().to_vec();
        bytes.extend_from_slice(b"Package\0tail");
        let mut cursor = Cursor::new(bytes);

        assert_eq!(cursor.read_struct::<Pair>().unwrap(), Pair { a: 7, b: 9 });
        assert_eq!(cursor.read_cstring().unwrap(), "Package");
        assert_eq!(cursor.position(), 16);
    }

    #[test]
    fn test_stream_cstring_without_terminator() {
        let mut cursor = Cursor::new(b"unterminated".to_vec());
        let err = cursor.read_cstring().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_stream_cstring_keeps_high_bytes() {
        let mut cursor = Cursor::new(b"Caf\xE9!\0".to_vec());
        let name = cursor.read_cstring().unwrap();

        assert_eq!(name, "Caf\u{e9}!");
        assert_eq!(ansi::encode(&name).unwrap(), b"Caf\xE9!");
    }
}
