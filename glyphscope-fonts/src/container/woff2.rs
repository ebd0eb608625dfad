//! WOFF2 decompression.
//!
//! WOFF2 replaces the table directory with a variable-length encoding and
//! compresses all table data as one brotli stream. Tables stored with the
//! null transform are reconstructed byte-for-byte; the optional `glyf`/`loca`
//! preprocessing transform is not reconstructed here (fonts using it fail
//! with [`ContainerError::UnsupportedTransform`]), and WOFF2 collections are
//! rejected.

use std::io::Read;

use super::{assemble_sfnt, be_u16, be_u32, woff::display_tag, RawTable};
use crate::error::ContainerError;

/// Fixed WOFF2 header size; the table directory follows immediately.
const HEADER_LEN: usize = 48;

/// Flag value signalling an explicit (arbitrary) tag in the directory.
const ARBITRARY_TAG: u8 = 63;

/// Known table tags, indexed by the directory entry's flag bits 0-5.
const KNOWN_TAGS: [[u8; 4]; 63] = [
    *b"cmap", *b"head", *b"hhea", *b"hmtx", *b"maxp", *b"name", *b"OS/2", *b"post",
    *b"cvt ", *b"fpgm", *b"glyf", *b"loca", *b"prep", *b"CFF ", *b"VORG", *b"EBDT",
    *b"EBLC", *b"gasp", *b"hdmx", *b"kern", *b"LTSH", *b"PCLT", *b"VDMX", *b"vhea",
    *b"vmtx", *b"BASE", *b"GDEF", *b"GPOS", *b"GSUB", *b"EBSC", *b"JSTF", *b"MATH",
    *b"CBDT", *b"CBLC", *b"COLR", *b"CPAL", *b"SVG ", *b"sbix", *b"acnt", *b"avar",
    *b"bdat", *b"bloc", *b"bsln", *b"cvar", *b"fdsc", *b"feat", *b"fmtx", *b"fond",
    *b"gcid", *b"just", *b"lcar", *b"ltag", *b"mort", *b"morx", *b"opbd", *b"prop",
    *b"trak", *b"Zapf", *b"Silf", *b"Glat", *b"Gloc", *b"Feat", *b"Sill",
];

pub(crate) fn decompress(data: &[u8]) -> Result<Vec<u8>, ContainerError> {
    if data.len() < HEADER_LEN {
        return Err(ContainerError::Truncated("WOFF2 header"));
    }
    let flavor = be_u32(data, 4).expect("header length checked");
    if flavor.to_be_bytes() == *b"ttcf" {
        return Err(ContainerError::CollectionNotSupported);
    }
    let num_tables = be_u16(data, 12).expect("header length checked") as usize;
    if num_tables == 0 {
        return Err(ContainerError::Empty);
    }
    let compressed_len = be_u32(data, 20).expect("header length checked") as usize;

    // Variable-length table directory.
    let mut pos = HEADER_LEN;
    let mut entries = Vec::with_capacity(num_tables);
    for _ in 0..num_tables {
        let flags = *data
            .get(pos)
            .ok_or(ContainerError::Truncated("WOFF2 table directory"))?;
        pos += 1;

        let tag = match flags & 0x3F {
            ARBITRARY_TAG => {
                let bytes = data
                    .get(pos..pos + 4)
                    .ok_or(ContainerError::Truncated("WOFF2 table directory"))?;
                pos += 4;
                <[u8; 4]>::try_from(bytes).expect("slice of length 4")
            }
            known => KNOWN_TAGS[known as usize],
        };

        let orig_len = read_base128(data, &mut pos)?;

        // For glyf and loca, transform version 3 is the null transform;
        // for every other table version 0 is.
        let version = (flags >> 6) & 0x03;
        let transformed = if tag == *b"glyf" || tag == *b"loca" {
            version != 3
        } else {
            version != 0
        };
        if transformed {
            return Err(ContainerError::UnsupportedTransform { tag: display_tag(tag) });
        }
        entries.push((tag, orig_len));
    }

    let stream = data
        .get(pos..pos + compressed_len)
        .ok_or(ContainerError::Truncated("WOFF2 compressed stream"))?;
    let decompressed = inflate_brotli(stream).map_err(|err| ContainerError::BadStream {
        tag: String::from("<stream>"),
        detail: err.to_string(),
    })?;

    let expected: usize = entries.iter().map(|&(_, len)| len as usize).sum();
    if decompressed.len() != expected {
        return Err(ContainerError::LengthMismatch {
            tag: String::from("<stream>"),
            expected: expected as u32,
            actual: decompressed.len(),
        });
    }

    let mut tables = Vec::with_capacity(entries.len());
    let mut at = 0usize;
    for (tag, len) in entries {
        let end = at + len as usize;
        tables.push(RawTable { tag, data: decompressed[at..end].to_vec() });
        at = end;
    }

    log::debug!("WOFF2 container decompressed: {num_tables} tables");
    assemble_sfnt(flavor, tables)
}

fn inflate_brotli(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    brotli::Decompressor::new(bytes, 4096).read_to_end(&mut out)?;
    Ok(out)
}

/// Reads one UIntBase128 value: up to five bytes of seven value bits each,
/// most significant first. Leading zero bytes and 32-bit overflow are
/// encoding errors.
fn read_base128(data: &[u8], pos: &mut usize) -> Result<u32, ContainerError> {
    let mut value: u32 = 0;
    for i in 0..5 {
        let byte = *data.get(*pos).ok_or(ContainerError::BadVarInt)?;
        *pos += 1;
        if i == 0 && byte == 0x80 {
            return Err(ContainerError::BadVarInt);
        }
        if value & 0xFE00_0000 != 0 {
            return Err(ContainerError::BadVarInt);
        }
        value = (value << 7) | u32::from(byte & 0x7F);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(ContainerError::BadVarInt)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base128(bytes: &[u8]) -> Result<u32, ContainerError> {
        let mut pos = 0;
        let value = read_base128(bytes, &mut pos)?;
        assert_eq!(pos, bytes.len(), "all bytes consumed");
        Ok(value)
    }

    #[test]
    fn base128_single_byte() {
        assert_eq!(base128(&[0x3F]).unwrap(), 63);
    }

    #[test]
    fn base128_multi_byte() {
        // 0x81 0x02 => (1 << 7) | 2
        assert_eq!(base128(&[0x81, 0x02]).unwrap(), 130);
        assert_eq!(base128(&[0x8F, 0xFF, 0x7F]).unwrap(), 0x3FFFF);
    }

    #[test]
    fn base128_rejects_leading_zero() {
        assert!(base128(&[0x80, 0x01]).is_err());
    }

    #[test]
    fn base128_rejects_overflow() {
        assert!(base128(&[0x90, 0x80, 0x80, 0x80, 0x00]).is_err());
    }

    #[test]
    fn base128_rejects_truncation() {
        let mut pos = 0;
        assert!(read_base128(&[0xFF], &mut pos).is_err());
    }

    #[test]
    fn known_tag_indices_match_the_specified_order() {
        assert_eq!(KNOWN_TAGS[0], *b"cmap");
        assert_eq!(KNOWN_TAGS[10], *b"glyf");
        assert_eq!(KNOWN_TAGS[11], *b"loca");
        assert_eq!(KNOWN_TAGS[62], *b"Sill");
    }

    #[test]
    fn collections_are_rejected() {
        let mut header = vec![0u8; HEADER_LEN];
        header[..4].copy_from_slice(b"wOF2");
        header[4..8].copy_from_slice(b"ttcf");
        assert!(matches!(
            decompress(&header),
            Err(ContainerError::CollectionNotSupported)
        ));
    }
}
