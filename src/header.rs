use std::io::Read;

use indexmap::IndexMap;
use log::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::reader::{read_exact_sized, read_u32, read_u8, skip, ParseLimits};
use crate::tag::{Tag, TagType, TagValue};

pub const HEADER_MAGIC: [u8; 3] = [0x8E, 0xAD, 0xE8];

/// One of the two tagged-value sections of an RPM package (signature header
/// or main header); both share this wire format.
#[derive(Clone, Debug, Default)]
pub struct Header {
    pub version: u8,
    pub tags: IndexMap<u32, Tag>,
}

impl Header {
    pub fn tag(&self, id: u32) -> Option<&Tag> {
        self.tags.get(&id)
    }

    /// Reads one header from `reader`. `align` should be `true` for the
    /// signature header (padded to 8 bytes) and `false` for the main header,
    /// whose end is the start of the payload.
    pub fn read<R: Read>(reader: &mut R, align: bool, limits: ParseLimits) -> Result<Header> {
        let mut magic = [0u8; 3];
        reader.read_exact(&mut magic).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                Error::UnexpectedEnd
            } else {
                Error::Io(e)
            }
        })?;
        if magic != HEADER_MAGIC {
            return Err(Error::HeaderMagicWrong);
        }
        let version = read_u8(reader)?;
        skip(reader, 4)?; // reserved

        let index_count = read_u32(reader)?;
        let store_size = read_u32(reader)?;

        let index_bytes = index_count
            .checked_mul(16)
            .ok_or(Error::HeaderTooLarge(u32::MAX))?;
        if index_bytes > limits.max_index_bytes {
            return Err(Error::HeaderTooLarge(index_bytes));
        }
        if store_size > limits.max_store_size {
            return Err(Error::HeaderTooLarge(store_size));
        }

        debug!(
            "reading header: version={} index_count={} store_size={}",
            version, index_count, store_size
        );

        let index_raw = read_exact_sized(reader, index_bytes as usize)?;
        let mut entries = Vec::with_capacity(index_count as usize);
        for chunk in index_raw.chunks_exact(16) {
            let tag_id = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            let type_code = u32::from_be_bytes([chunk[4], chunk[5], chunk[6], chunk[7]]);
            let offset = u32::from_be_bytes([chunk[8], chunk[9], chunk[10], chunk[11]]);
            let value_count = u32::from_be_bytes([chunk[12], chunk[13], chunk[14], chunk[15]]);
            if offset >= store_size {
                return Err(Error::OutOfRange {
                    tag_id,
                    offset,
                    store_size,
                });
            }
            entries.push((tag_id, type_code, offset, value_count));
        }

        let store = read_exact_sized(reader, store_size as usize)?;

        let mut tags = IndexMap::with_capacity(entries.len());
        for (tag_id, type_code, offset, value_count) in entries {
            let ty = TagType::from_code(type_code).ok_or(Error::UnknownTagType {
                tag_id,
                type_code,
            })?;
            let value = decode_value(tag_id, ty, offset, value_count, &store)?;
            trace!("tag {} type={:?} offset={} count={}", tag_id, ty, offset, value_count);
            tags.insert(tag_id, Tag { id: tag_id, ty, value });
        }

        if align && store_size % 8 != 0 {
            let pad = 8 - (store_size % 8);
            skip(reader, pad as usize)?;
        }

        Ok(Header { version, tags })
    }
}

fn decode_value(
    tag_id: u32,
    ty: TagType,
    offset: u32,
    value_count: u32,
    store: &[u8],
) -> Result<TagValue> {
    let store_size = store.len() as u32;
    let out_of_range = || Error::OutOfRange {
        tag_id,
        offset,
        store_size,
    };

    match ty {
        TagType::Null => Ok(TagValue::Null),
        TagType::Char | TagType::Int8 | TagType::Bin => {
            let len = value_count as usize;
            let start = offset as usize;
            let end = start.checked_add(len).ok_or_else(out_of_range)?;
            let slice = store.get(start..end).ok_or_else(out_of_range)?;
            Ok(TagValue::Bytes(slice.to_vec()))
        }
        TagType::Int16 | TagType::Int32 | TagType::Int64 => {
            let width = ty.element_width();
            let len = (value_count as usize)
                .checked_mul(width)
                .ok_or_else(out_of_range)?;
            let start = offset as usize;
            let end = start.checked_add(len).ok_or_else(out_of_range)?;
            let slice = store.get(start..end).ok_or_else(out_of_range)?;
            let mut values = Vec::with_capacity(value_count as usize);
            for chunk in slice.chunks_exact(width) {
                let v: i64 = match width {
                    2 => u16::from_be_bytes([chunk[0], chunk[1]]) as i64,
                    4 => u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) as i64,
                    8 => i64::from_be_bytes(chunk.try_into().unwrap()),
                    _ => unreachable!(),
                };
                values.push(v);
            }
            Ok(TagValue::I64s(values))
        }
        TagType::String | TagType::StringArray | TagType::I18NString => {
            let mut strings = Vec::with_capacity(value_count.max(1) as usize);
            let mut cursor = offset as usize;
            let count = if ty == TagType::String { 1 } else { value_count };
            for _ in 0..count {
                let rest = store.get(cursor..).ok_or_else(out_of_range)?;
                let nul = rest.iter().position(|&b| b == 0).ok_or_else(out_of_range)?;
                let s = String::from_utf8_lossy(&rest[..nul]).into_owned();
                strings.push(s);
                cursor += nul + 1;
            }
            Ok(TagValue::Strings(strings))
        }
    }
}

pub(crate) fn warn_length_mismatch(kind: &str, lengths: &[usize]) {
    if lengths.windows(2).any(|w| w[0] != w[1]) {
        warn!("{} parallel arrays have mismatched lengths: {:?}", kind, lengths);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_header(entries: &[(u32, u32, &[u8])], align: bool) -> Vec<u8> {
        let mut store = Vec::new();
        let mut index = Vec::new();
        for (tag_id, type_code, bytes) in entries {
            let offset = store.len() as u32;
            store.extend_from_slice(bytes);
            index.extend_from_slice(&tag_id.to_be_bytes());
            index.extend_from_slice(&type_code.to_be_bytes());
            index.extend_from_slice(&offset.to_be_bytes());
            index.extend_from_slice(&1u32.to_be_bytes());
        }
        let mut buf = Vec::new();
        buf.extend_from_slice(&HEADER_MAGIC);
        buf.push(1);
        buf.extend_from_slice(&[0u8; 4]);
        buf.extend_from_slice(&(entries.len() as u32).to_be_bytes());
        buf.extend_from_slice(&(store.len() as u32).to_be_bytes());
        buf.extend_from_slice(&index);
        buf.extend_from_slice(&store);
        if align && store.len() % 8 != 0 {
            buf.extend(std::iter::repeat(0u8).take(8 - store.len() % 8));
        }
        buf
    }

    #[test]
    fn decodes_a_string_tag() {
        let bytes = build_header(&[(1000, 6, b"hello\0")], false);
        let header = Header::read(&mut bytes.as_slice(), false, ParseLimits::default()).unwrap();
        assert_eq!(header.tag(1000).unwrap().as_string(), "hello");
    }

    #[test]
    fn decodes_an_int32_tag() {
        let bytes = build_header(&[(1003, 4, &1u32.to_be_bytes())], false);
        let header = Header::read(&mut bytes.as_slice(), false, ParseLimits::default()).unwrap();
        assert_eq!(header.tag(1003).unwrap().as_i64(), 1);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = build_header(&[(1000, 6, b"hello\0")], false);
        bytes[0] = 0;
        let err = Header::read(&mut bytes.as_slice(), false, ParseLimits::default()).unwrap_err();
        assert!(matches!(err, Error::HeaderMagicWrong));
    }

    #[test]
    fn rejects_store_size_over_limit() {
        let bytes = build_header(&[(1000, 6, b"hello\0")], false);
        let tiny = ParseLimits {
            max_store_size: 2,
            max_index_bytes: 32 * 1024 * 1024,
        };
        let err = Header::read(&mut bytes.as_slice(), false, tiny).unwrap_err();
        assert!(matches!(err, Error::HeaderTooLarge(_)));
    }

    #[test]
    fn applies_alignment_padding() {
        let bytes = build_header(&[(1000, 6, b"hi\0")], true);
        assert_eq!(bytes.len() % 8, 0);
        let header = Header::read(&mut bytes.as_slice(), true, ParseLimits::default()).unwrap();
        assert_eq!(header.tag(1000).unwrap().as_string(), "hi");
    }

    #[test]
    fn unknown_type_code_is_an_error() {
        let bytes = build_header(&[(1000, 99, b"xx")], false);
        let err = Header::read(&mut bytes.as_slice(), false, ParseLimits::default()).unwrap_err();
        assert!(matches!(err, Error::UnknownTagType { .. }));
    }
}
