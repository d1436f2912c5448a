use std::io::Read;

use byteorder::{BigEndian, ByteOrder};

use crate::error::{Error, Result};

/// Runtime-tunable guards against maliciously oversized headers.
///
/// The defaults match what every RPM in the wild satisfies by a wide margin;
/// override them only if parsing from a source with unusual trust properties.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseLimits {
    pub max_store_size: u32,
    pub max_index_bytes: u32,
}

impl Default for ParseLimits {
    fn default() -> Self {
        ParseLimits {
            max_store_size: 32 * 1024 * 1024,
            max_index_bytes: 32 * 1024 * 1024,
        }
    }
}

/// Reads `len` bytes, mapping an early EOF to [`Error::UnexpectedEnd`] rather
/// than the generic io error `read_exact` produces.
pub(crate) fn read_exact_sized<R: Read>(reader: &mut R, len: usize) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::UnexpectedEnd
        } else {
            Error::Io(e)
        }
    })?;
    Ok(buf)
}

pub(crate) fn skip<R: Read>(reader: &mut R, len: usize) -> Result<()> {
    read_exact_sized(reader, len).map(|_| ())
}

/// Reads a single byte, mapping an early EOF to [`Error::UnexpectedEnd`].
pub(crate) fn read_u8<R: Read>(reader: &mut R) -> Result<u8> {
    let buf = read_exact_sized(reader, 1)?;
    Ok(buf[0])
}

/// Reads a big-endian `u16`, mapping an early EOF to [`Error::UnexpectedEnd`].
pub(crate) fn read_u16<R: Read>(reader: &mut R) -> Result<u16> {
    let buf = read_exact_sized(reader, 2)?;
    Ok(BigEndian::read_u16(&buf))
}

/// Reads a big-endian `u32`, mapping an early EOF to [`Error::UnexpectedEnd`].
pub(crate) fn read_u32<R: Read>(reader: &mut R) -> Result<u32> {
    let buf = read_exact_sized(reader, 4)?;
    Ok(BigEndian::read_u32(&buf))
}
