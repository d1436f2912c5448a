use std::io::Read;

use crate::error::{Error, Result};
use crate::reader::{read_exact_sized, read_u16, read_u8, skip};

pub const LEAD_MAGIC: [u8; 4] = [0xED, 0xAB, 0xEE, 0xDB];
pub const LEAD_SIZE: usize = 96;

/// The 96-byte legacy preamble every RPM package carries for tool compatibility.
///
/// Authoritative package metadata lives in the headers that follow; the lead
/// is kept mostly for historical identification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lead {
    pub version_major: u8,
    pub version_minor: u8,
    pub package_type: u16,
    pub architecture: u16,
    pub name: String,
    pub operating_system: u16,
    pub signature_type: u16,
}

impl Lead {
    pub fn read<R: Read>(reader: &mut R) -> Result<Lead> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                Error::UnexpectedEnd
            } else {
                Error::Io(e)
            }
        })?;
        if magic != LEAD_MAGIC {
            return Err(Error::NotRpmFile);
        }

        let version_major = read_u8(reader)?;
        let version_minor = read_u8(reader)?;
        if version_major < 3 || version_major > 4 {
            return Err(Error::UnsupportedVersion(version_major, version_minor));
        }

        let package_type = read_u16(reader)?;
        let architecture = read_u16(reader)?;

        let name_bytes = read_exact_sized(reader, 66)?;
        let nul = name_bytes.iter().position(|&b| b == 0).unwrap_or(66);
        let name = String::from_utf8_lossy(&name_bytes[..nul]).into_owned();

        let operating_system = read_u16(reader)?;
        let signature_type = read_u16(reader)?;

        // 16 reserved bytes, always zero in practice.
        skip(reader, 16)?;

        Ok(Lead {
            version_major,
            version_minor,
            package_type,
            architecture,
            name,
            operating_system,
            signature_type,
        })
    }
}
