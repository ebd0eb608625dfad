//! WOFF (version 1) decompression.
//!
//! WOFF keeps the original table directory but compresses each table with
//! zlib individually. Reconstruction inflates every compressed table,
//! verifies the recorded original length and reassembles a canonical
//! container; checksums are recomputed rather than trusted.

use std::io::Read;

use flate2::read::ZlibDecoder;

use super::{assemble_sfnt, be_u16, be_u32, RawTable};
use crate::error::ContainerError;

/// Fixed WOFF header size; the table directory follows immediately.
const HEADER_LEN: usize = 44;
/// Size of one WOFF table directory entry.
const ENTRY_LEN: usize = 20;

pub(crate) fn decompress(data: &[u8]) -> Result<Vec<u8>, ContainerError> {
    if data.len() < HEADER_LEN {
        return Err(ContainerError::Truncated("WOFF header"));
    }
    let flavor = be_u32(data, 4).expect("header length checked");
    let num_tables = be_u16(data, 12).expect("header length checked") as usize;
    if num_tables == 0 {
        return Err(ContainerError::Empty);
    }

    let mut tables = Vec::with_capacity(num_tables);
    for i in 0..num_tables {
        let entry = HEADER_LEN + i * ENTRY_LEN;
        let tag_bytes = data
            .get(entry..entry + 4)
            .ok_or(ContainerError::Truncated("WOFF table directory"))?;
        let tag = <[u8; 4]>::try_from(tag_bytes).expect("slice of length 4");
        let offset = be_u32(data, entry + 4).ok_or(ContainerError::Truncated("WOFF table directory"))?;
        let comp_len = be_u32(data, entry + 8).ok_or(ContainerError::Truncated("WOFF table directory"))?;
        let orig_len = be_u32(data, entry + 12).ok_or(ContainerError::Truncated("WOFF table directory"))?;

        let start = offset as usize;
        let end = start
            .checked_add(comp_len as usize)
            .ok_or_else(|| out_of_bounds(tag))?;
        let raw = data.get(start..end).ok_or_else(|| out_of_bounds(tag))?;

        let table = if comp_len < orig_len {
            let inflated = inflate(raw).map_err(|err| ContainerError::BadStream {
                tag: display_tag(tag),
                detail: err.to_string(),
            })?;
            if inflated.len() != orig_len as usize {
                return Err(ContainerError::LengthMismatch {
                    tag: display_tag(tag),
                    expected: orig_len,
                    actual: inflated.len(),
                });
            }
            inflated
        } else if comp_len == orig_len {
            // stored uncompressed
            raw.to_vec()
        } else {
            return Err(ContainerError::LengthMismatch {
                tag: display_tag(tag),
                expected: orig_len,
                actual: comp_len as usize,
            });
        };
        tables.push(RawTable { tag, data: table });
    }

    log::debug!("WOFF container decompressed: {num_tables} tables");
    assemble_sfnt(flavor, tables)
}

fn inflate(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    ZlibDecoder::new(bytes).read_to_end(&mut out)?;
    Ok(out)
}

fn out_of_bounds(tag: [u8; 4]) -> ContainerError {
    ContainerError::OutOfBounds { tag: display_tag(tag) }
}

pub(crate) fn display_tag(tag: [u8; 4]) -> String {
    tag.iter()
        .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '?' })
        .collect()
}
