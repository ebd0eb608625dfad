//! Font container normalization.
//!
//! Downstream consumers (the table parser, the rasterizer and the shaping
//! engine) all expect the canonical uncompressed table-directory container.
//! This module detects compressed distribution flavors by their leading
//! four-byte tag and rewrites them into that canonical form:
//!
//! - `wOFF`: per-table zlib compression ([`woff`])
//! - `wOF2`: whole-font brotli compression ([`woff2`])
//!
//! Already-canonical containers are passed through untouched (and
//! unallocated). Normalization must run before any other component of this
//! crate touches the bytes.

pub(crate) mod woff;
pub(crate) mod woff2;

use std::borrow::Cow;

use crate::error::ContainerError;

/// TrueType-flavored canonical container.
const SFNT_TRUETYPE: [u8; 4] = [0x00, 0x01, 0x00, 0x00];
/// CFF-flavored canonical container.
const SFNT_CFF: [u8; 4] = *b"OTTO";
/// Legacy Apple TrueType tag.
const SFNT_APPLE: [u8; 4] = *b"true";
/// Legacy Apple Type 1 wrapper tag.
const SFNT_TYP1: [u8; 4] = *b"typ1";
/// Font collection container.
const SFNT_COLLECTION: [u8; 4] = *b"ttcf";
/// Zlib-compressed distribution container.
const WOFF_SIGNATURE: [u8; 4] = *b"wOFF";
/// Brotli-compressed distribution container.
const WOFF2_SIGNATURE: [u8; 4] = *b"wOF2";

/// Rewrites a compressed font container into the canonical uncompressed
/// form.
///
/// Canonical input is returned borrowed and byte-identical. Unknown leading
/// tags also pass through unchanged; the table parser reports those
/// downstream.
///
/// # Errors
/// [`ContainerError`] when a compressed payload is truncated, fails to
/// decompress, or decompresses into an inconsistent table directory.
pub fn normalize(data: &[u8]) -> Result<Cow<'_, [u8]>, ContainerError> {
    let Some(tag) = data.get(..4) else {
        return Err(ContainerError::Truncated("container signature"));
    };

    match <[u8; 4]>::try_from(tag).expect("slice of length 4") {
        WOFF_SIGNATURE => {
            log::debug!("normalizing WOFF container ({} bytes)", data.len());
            woff::decompress(data).map(Cow::Owned)
        }
        WOFF2_SIGNATURE => {
            log::debug!("normalizing WOFF2 container ({} bytes)", data.len());
            woff2::decompress(data).map(Cow::Owned)
        }
        SFNT_TRUETYPE | SFNT_CFF | SFNT_APPLE | SFNT_TYP1 | SFNT_COLLECTION => {
            Ok(Cow::Borrowed(data))
        }
        _ => Ok(Cow::Borrowed(data)),
    }
}

/// Returns true when the bytes already carry a canonical container tag.
pub fn is_canonical(data: &[u8]) -> bool {
    let Some(tag) = data.get(..4) else {
        return false;
    };
    matches!(
        <[u8; 4]>::try_from(tag).expect("slice of length 4"),
        SFNT_TRUETYPE | SFNT_CFF | SFNT_APPLE | SFNT_TYP1 | SFNT_COLLECTION
    )
}

/// One decompressed table ready for reassembly.
pub(crate) struct RawTable {
    pub tag: [u8; 4],
    pub data: Vec<u8>,
}

/// Big-endian `u16` read with bounds checking.
pub(crate) fn be_u16(data: &[u8], at: usize) -> Option<u16> {
    let bytes = data.get(at..at + 2)?;
    Some(u16::from_be_bytes([bytes[0], bytes[1]]))
}

/// Big-endian `u32` read with bounds checking.
pub(crate) fn be_u32(data: &[u8], at: usize) -> Option<u32> {
    let bytes = data.get(at..at + 4)?;
    Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Table checksum: the big-endian `u32` sum over the data, zero-padded to a
/// four-byte boundary.
pub(crate) fn checksum(data: &[u8]) -> u32 {
    let mut sum = 0u32;
    let mut chunks = data.chunks_exact(4);
    for chunk in &mut chunks {
        sum = sum.wrapping_add(u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }
    let rest = chunks.remainder();
    if !rest.is_empty() {
        let mut tail = [0u8; 4];
        tail[..rest.len()].copy_from_slice(rest);
        sum = sum.wrapping_add(u32::from_be_bytes(tail));
    }
    sum
}

/// Value that `head.checkSumAdjustment` must bring the whole-font checksum
/// up to.
const CHECKSUM_MAGIC: u32 = 0xB1B0_AFBA;

/// Byte offset of `checkSumAdjustment` within the `head` table.
const HEAD_ADJUSTMENT_OFFSET: usize = 8;

/// Reassembles decompressed tables into a canonical single-font container.
///
/// Records are sorted by tag, table data is aligned to four bytes, the
/// binary-search fields are recomputed, per-table checksums are taken from
/// the actual data and `head.checkSumAdjustment` is recomputed over the
/// finished font.
pub(crate) fn assemble_sfnt(flavor: u32, mut tables: Vec<RawTable>) -> Result<Vec<u8>, ContainerError> {
    if tables.is_empty() {
        return Err(ContainerError::Empty);
    }
    tables.sort_by_key(|table| table.tag);

    let num_tables = tables.len() as u16;
    let entry_selector = 15 - num_tables.leading_zeros() as u16;
    let search_range = (1u16 << entry_selector) * 16;
    let range_shift = num_tables * 16 - search_range;

    let directory_len = 12 + tables.len() * 16;
    let total_len: usize = directory_len
        + tables.iter().map(|table| table.data.len().next_multiple_of(4)).sum::<usize>();

    let mut font = Vec::with_capacity(total_len);
    font.extend_from_slice(&flavor.to_be_bytes());
    font.extend_from_slice(&num_tables.to_be_bytes());
    font.extend_from_slice(&search_range.to_be_bytes());
    font.extend_from_slice(&entry_selector.to_be_bytes());
    font.extend_from_slice(&range_shift.to_be_bytes());

    let mut offset = directory_len;
    let mut head_offset = None;
    for table in &mut tables {
        if table.tag == *b"head" && table.data.len() >= HEAD_ADJUSTMENT_OFFSET + 4 {
            // head checksums are defined with a zeroed adjustment field
            table.data[HEAD_ADJUSTMENT_OFFSET..HEAD_ADJUSTMENT_OFFSET + 4].fill(0);
            head_offset = Some(offset);
        }
        font.extend_from_slice(&table.tag);
        font.extend_from_slice(&checksum(&table.data).to_be_bytes());
        font.extend_from_slice(&(offset as u32).to_be_bytes());
        font.extend_from_slice(&(table.data.len() as u32).to_be_bytes());
        offset += table.data.len().next_multiple_of(4);
    }

    for table in &tables {
        font.extend_from_slice(&table.data);
        font.resize(font.len().next_multiple_of(4), 0);
    }

    if let Some(head) = head_offset {
        let adjustment = CHECKSUM_MAGIC.wrapping_sub(checksum(&font));
        let at = head + HEAD_ADJUSTMENT_OFFSET;
        font[at..at + 4].copy_from_slice(&adjustment.to_be_bytes());
    }

    Ok(font)
}
