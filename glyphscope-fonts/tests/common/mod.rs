//! Shared test fixtures: a deterministic minimal TrueType font builder.
//!
//! Builds small but structurally valid fonts (head, hhea, maxp, hmtx, cmap,
//! glyf/loca, post with real glyph names) plus font collections and
//! WOFF/WOFF2 wrappings of them, so container and shaping tests never
//! depend on fonts from disk.

#![allow(dead_code)]

use std::io::Write;

/// One glyph of a test font.
#[derive(Debug, Clone)]
pub struct GlyphSpec {
    pub name: &'static str,
    pub advance: u16,
    pub codepoint: Option<char>,
    /// Emit a simple rectangular contour for this glyph.
    pub boxed: bool,
}

pub fn glyph(name: &'static str, advance: u16, codepoint: Option<char>) -> GlyphSpec {
    GlyphSpec { name, advance, codepoint, boxed: false }
}

/// The default five-glyph test font: `.notdef`, `space`, `A` (with a real
/// outline), `B` and `dollar`.
pub fn default_glyphs() -> Vec<GlyphSpec> {
    vec![
        glyph(".notdef", 500, None),
        glyph("space", 250, Some(' ')),
        GlyphSpec { name: "A", advance: 600, codepoint: Some('A'), boxed: true },
        glyph("B", 650, Some('B')),
        glyph("dollar", 550, Some('$')),
    ]
}

/// An alternative glyph set with names and mappings disjoint from
/// [`default_glyphs`], for collection tests.
pub fn alternate_glyphs() -> Vec<GlyphSpec> {
    vec![
        glyph(".notdef", 400, None),
        glyph("one", 450, Some('1')),
        glyph("two", 460, Some('2')),
    ]
}

fn w16(buf: &mut Vec<u8>, value: u16) {
    buf.extend_from_slice(&value.to_be_bytes());
}

fn wi16(buf: &mut Vec<u8>, value: i16) {
    buf.extend_from_slice(&value.to_be_bytes());
}

fn w32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_be_bytes());
}

fn head_table() -> Vec<u8> {
    let mut t = Vec::new();
    w32(&mut t, 0x0001_0000); // version
    w32(&mut t, 0x0001_0000); // fontRevision
    w32(&mut t, 0); // checkSumAdjustment
    w32(&mut t, 0x5F0F_3CF5); // magicNumber
    w16(&mut t, 0x0003); // flags
    w16(&mut t, 1000); // unitsPerEm
    t.extend_from_slice(&0i64.to_be_bytes()); // created
    t.extend_from_slice(&0i64.to_be_bytes()); // modified
    wi16(&mut t, 0); // xMin
    wi16(&mut t, 0); // yMin
    wi16(&mut t, 1000); // xMax
    wi16(&mut t, 1000); // yMax
    w16(&mut t, 0); // macStyle
    w16(&mut t, 8); // lowestRecPPEM
    wi16(&mut t, 2); // fontDirectionHint
    wi16(&mut t, 0); // indexToLocFormat: short loca
    wi16(&mut t, 0); // glyphDataFormat
    t
}

fn hhea_table(glyphs: &[GlyphSpec]) -> Vec<u8> {
    let mut t = Vec::new();
    w32(&mut t, 0x0001_0000); // version
    wi16(&mut t, 800); // ascender
    wi16(&mut t, -200); // descender
    wi16(&mut t, 0); // lineGap
    w16(&mut t, glyphs.iter().map(|g| g.advance).max().unwrap_or(0)); // advanceWidthMax
    wi16(&mut t, 0); // minLeftSideBearing
    wi16(&mut t, 0); // minRightSideBearing
    wi16(&mut t, 1000); // xMaxExtent
    wi16(&mut t, 1); // caretSlopeRise
    wi16(&mut t, 0); // caretSlopeRun
    wi16(&mut t, 0); // caretOffset
    for _ in 0..4 {
        wi16(&mut t, 0); // reserved
    }
    wi16(&mut t, 0); // metricDataFormat
    w16(&mut t, glyphs.len() as u16); // numberOfHMetrics
    t
}

fn maxp_table(glyphs: &[GlyphSpec]) -> Vec<u8> {
    let mut t = Vec::new();
    w32(&mut t, 0x0001_0000); // version
    w16(&mut t, glyphs.len() as u16); // numGlyphs
    w16(&mut t, 4); // maxPoints
    w16(&mut t, 1); // maxContours
    w16(&mut t, 0); // maxCompositePoints
    w16(&mut t, 0); // maxCompositeContours
    w16(&mut t, 2); // maxZones
    for _ in 0..8 {
        w16(&mut t, 0); // twilight/storage/fpgm/stack/instruction fields
    }
    t
}

fn hmtx_table(glyphs: &[GlyphSpec]) -> Vec<u8> {
    let mut t = Vec::new();
    for g in glyphs {
        w16(&mut t, g.advance);
        wi16(&mut t, 0); // left side bearing
    }
    t
}

/// A single rectangular contour from (100,0) to (500,700).
fn box_glyph() -> Vec<u8> {
    let mut t = Vec::new();
    wi16(&mut t, 1); // numberOfContours
    wi16(&mut t, 100); // xMin
    wi16(&mut t, 0); // yMin
    wi16(&mut t, 500); // xMax
    wi16(&mut t, 700); // yMax
    w16(&mut t, 3); // endPtsOfContours
    w16(&mut t, 0); // instructionLength
    t.extend_from_slice(&[0x01; 4]); // flags: four on-curve points
    for dx in [100i16, 400, 0, -400] {
        wi16(&mut t, dx);
    }
    for dy in [0i16, 0, 700, 0] {
        wi16(&mut t, dy);
    }
    while t.len() % 4 != 0 {
        t.push(0);
    }
    t
}

fn glyf_and_loca(glyphs: &[GlyphSpec]) -> (Vec<u8>, Vec<u8>) {
    let mut glyf = Vec::new();
    let mut loca = Vec::new();
    w16(&mut loca, 0);
    for g in glyphs {
        if g.boxed {
            glyf.extend_from_slice(&box_glyph());
        }
        w16(&mut loca, (glyf.len() / 2) as u16);
    }
    (glyf, loca)
}

fn cmap_table(glyphs: &[GlyphSpec]) -> Vec<u8> {
    let mut mappings: Vec<(u16, u16)> = glyphs
        .iter()
        .enumerate()
        .filter_map(|(id, g)| g.codepoint.map(|c| (c as u16, id as u16)))
        .collect();
    mappings.sort();

    let seg_count = (mappings.len() + 1) as u16;
    let floor_log2 = 15 - seg_count.leading_zeros() as u16;
    let search_range = 2 * (1u16 << floor_log2);
    let entry_selector = floor_log2;
    let range_shift = 2 * seg_count - search_range;

    let mut sub = Vec::new();
    w16(&mut sub, 4); // format
    let length = 14 + 2 + 8 * seg_count as usize;
    w16(&mut sub, length as u16);
    w16(&mut sub, 0); // language
    w16(&mut sub, seg_count * 2);
    w16(&mut sub, search_range);
    w16(&mut sub, entry_selector);
    w16(&mut sub, range_shift);
    for &(code, _) in &mappings {
        w16(&mut sub, code); // endCode
    }
    w16(&mut sub, 0xFFFF);
    w16(&mut sub, 0); // reservedPad
    for &(code, _) in &mappings {
        w16(&mut sub, code); // startCode
    }
    w16(&mut sub, 0xFFFF);
    for &(code, gid) in &mappings {
        w16(&mut sub, gid.wrapping_sub(code)); // idDelta
    }
    w16(&mut sub, 1);
    for _ in 0..seg_count {
        w16(&mut sub, 0); // idRangeOffset
    }

    let mut t = Vec::new();
    w16(&mut t, 0); // version
    w16(&mut t, 1); // numTables
    w16(&mut t, 3); // platformID: Windows
    w16(&mut t, 1); // encodingID: Unicode BMP
    w32(&mut t, 12); // subtable offset
    t.extend_from_slice(&sub);
    t
}

fn post_table(glyphs: &[GlyphSpec]) -> Vec<u8> {
    let mut t = Vec::new();
    w32(&mut t, 0x0002_0000); // version 2.0
    w32(&mut t, 0); // italicAngle
    wi16(&mut t, -100); // underlinePosition
    wi16(&mut t, 50); // underlineThickness
    w32(&mut t, 0); // isFixedPitch
    for _ in 0..4 {
        w32(&mut t, 0); // memory usage hints
    }
    w16(&mut t, glyphs.len() as u16);
    for i in 0..glyphs.len() {
        w16(&mut t, (258 + i) as u16); // all names are custom
    }
    for g in glyphs {
        t.push(g.name.len() as u8);
        t.extend_from_slice(g.name.as_bytes());
    }
    t
}

/// Table checksum as defined by the canonical container format.
pub fn checksum(data: &[u8]) -> u32 {
    let mut sum = 0u32;
    for chunk in data.chunks(4) {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum = sum.wrapping_add(u32::from_be_bytes(word));
    }
    sum
}

/// Assembles tagged tables into a canonical single-font container.
pub fn assemble(tables: Vec<([u8; 4], Vec<u8>)>) -> Vec<u8> {
    let mut tables = tables;
    tables.sort_by_key(|&(tag, _)| tag);
    let num = tables.len() as u16;
    let entry_selector = 15 - num.leading_zeros() as u16;
    let search_range = (1u16 << entry_selector) * 16;

    let mut font = Vec::new();
    w32(&mut font, 0x0001_0000);
    w16(&mut font, num);
    w16(&mut font, search_range);
    w16(&mut font, entry_selector);
    w16(&mut font, num * 16 - search_range);

    let mut offset = 12 + tables.len() * 16;
    for (tag, data) in &tables {
        font.extend_from_slice(tag);
        w32(&mut font, checksum(data));
        w32(&mut font, offset as u32);
        w32(&mut font, data.len() as u32);
        offset += data.len().next_multiple_of(4);
    }
    for (_, data) in &tables {
        font.extend_from_slice(data);
        while font.len() % 4 != 0 {
            font.push(0);
        }
    }
    font
}

/// Builds a complete single-font TrueType container.
pub fn build_font(glyphs: &[GlyphSpec]) -> Vec<u8> {
    let (glyf, loca) = glyf_and_loca(glyphs);
    assemble(vec![
        (*b"head", head_table()),
        (*b"hhea", hhea_table(glyphs)),
        (*b"maxp", maxp_table(glyphs)),
        (*b"hmtx", hmtx_table(glyphs)),
        (*b"cmap", cmap_table(glyphs)),
        (*b"glyf", glyf),
        (*b"loca", loca),
        (*b"post", post_table(glyphs)),
    ])
}

/// Builds a two-or-more-font collection from standalone fonts, patching
/// every table offset to its absolute file position.
pub fn build_collection(fonts: &[Vec<u8>]) -> Vec<u8> {
    let header_len = 12 + 4 * fonts.len();
    let mut out = Vec::new();
    out.extend_from_slice(b"ttcf");
    w32(&mut out, 0x0001_0000);
    w32(&mut out, fonts.len() as u32);
    let mut base = header_len;
    for font in fonts {
        w32(&mut out, base as u32);
        base += font.len();
    }
    for font in fonts {
        let base = out.len();
        let mut patched = font.clone();
        let num_tables = u16::from_be_bytes([patched[4], patched[5]]) as usize;
        for i in 0..num_tables {
            let at = 12 + i * 16 + 8;
            let offset = u32::from_be_bytes([
                patched[at],
                patched[at + 1],
                patched[at + 2],
                patched[at + 3],
            ]);
            patched[at..at + 4].copy_from_slice(&(offset + base as u32).to_be_bytes());
        }
        out.extend_from_slice(&patched);
    }
    out
}

/// Reads (tag, recorded checksum, data) for every table of a single-font
/// container.
pub fn read_directory(sfnt: &[u8]) -> Vec<([u8; 4], u32, Vec<u8>)> {
    let num_tables = u16::from_be_bytes([sfnt[4], sfnt[5]]) as usize;
    (0..num_tables)
        .map(|i| {
            let at = 12 + i * 16;
            let tag = <[u8; 4]>::try_from(&sfnt[at..at + 4]).unwrap();
            let sum = u32::from_be_bytes([sfnt[at + 4], sfnt[at + 5], sfnt[at + 6], sfnt[at + 7]]);
            let offset =
                u32::from_be_bytes([sfnt[at + 8], sfnt[at + 9], sfnt[at + 10], sfnt[at + 11]])
                    as usize;
            let len =
                u32::from_be_bytes([sfnt[at + 12], sfnt[at + 13], sfnt[at + 14], sfnt[at + 15]])
                    as usize;
            (tag, sum, sfnt[offset..offset + len].to_vec())
        })
        .collect()
}

/// Wraps a single-font container as WOFF, zlib-compressing each table.
pub fn wrap_woff(sfnt: &[u8]) -> Vec<u8> {
    let tables = read_directory(sfnt);
    let total_sfnt_size: usize =
        12 + 16 * tables.len() + tables.iter().map(|(_, _, d)| d.len().next_multiple_of(4)).sum::<usize>();

    let mut compressed: Vec<Vec<u8>> = Vec::new();
    for (_, _, data) in &tables {
        let mut enc = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        enc.write_all(data).unwrap();
        let packed = enc.finish().unwrap();
        compressed.push(if packed.len() < data.len() { packed } else { data.clone() });
    }

    let header_len = 44;
    let dir_len = 20 * tables.len();
    let mut out = Vec::new();
    out.extend_from_slice(b"wOFF");
    out.extend_from_slice(&sfnt[..4]); // flavor
    let total_len = header_len
        + dir_len
        + compressed.iter().map(|c| c.len().next_multiple_of(4)).sum::<usize>();
    w32(&mut out, total_len as u32);
    w16(&mut out, tables.len() as u16);
    w16(&mut out, 0); // reserved
    w32(&mut out, total_sfnt_size as u32);
    w16(&mut out, 1); // majorVersion
    w16(&mut out, 0); // minorVersion
    for _ in 0..5 {
        w32(&mut out, 0); // metadata and private blocks: absent
    }

    let mut offset = header_len + dir_len;
    for ((tag, sum, data), packed) in tables.iter().zip(&compressed) {
        out.extend_from_slice(tag);
        w32(&mut out, offset as u32);
        w32(&mut out, packed.len() as u32);
        w32(&mut out, data.len() as u32);
        w32(&mut out, *sum);
        offset += packed.len().next_multiple_of(4);
    }
    for packed in &compressed {
        out.extend_from_slice(packed);
        while out.len() % 4 != 0 {
            out.push(0);
        }
    }
    out
}

fn known_woff2_index(tag: [u8; 4]) -> Option<u8> {
    match &tag {
        b"cmap" => Some(0),
        b"head" => Some(1),
        b"hhea" => Some(2),
        b"hmtx" => Some(3),
        b"maxp" => Some(4),
        b"name" => Some(5),
        b"OS/2" => Some(6),
        b"post" => Some(7),
        b"glyf" => Some(10),
        b"loca" => Some(11),
        _ => None,
    }
}

fn write_base128(out: &mut Vec<u8>, mut value: u32) {
    let mut bytes = [0u8; 5];
    let mut n = 0;
    loop {
        bytes[n] = (value & 0x7F) as u8;
        value >>= 7;
        n += 1;
        if value == 0 {
            break;
        }
    }
    for i in (0..n).rev() {
        let mut byte = bytes[i];
        if i != 0 {
            byte |= 0x80;
        }
        out.push(byte);
    }
}

/// Wraps a single-font container as WOFF2 with null transforms only
/// (`glyf`/`loca` carry transform version 3).
pub fn wrap_woff2(sfnt: &[u8]) -> Vec<u8> {
    let tables = read_directory(sfnt);
    let total_sfnt_size: usize =
        12 + 16 * tables.len() + tables.iter().map(|(_, _, d)| d.len().next_multiple_of(4)).sum::<usize>();

    let mut directory = Vec::new();
    let mut stream = Vec::new();
    for (tag, _, data) in &tables {
        let null_transform = if tag == b"glyf" || tag == b"loca" { 3u8 << 6 } else { 0 };
        match known_woff2_index(*tag) {
            Some(index) => directory.push(index | null_transform),
            None => {
                directory.push(63 | null_transform);
                directory.extend_from_slice(tag);
            }
        }
        write_base128(&mut directory, data.len() as u32);
        stream.extend_from_slice(data);
    }

    let mut compressed = Vec::new();
    {
        let mut enc = brotli::CompressorWriter::new(&mut compressed, 4096, 9, 22);
        enc.write_all(&stream).unwrap();
    }

    let mut out = Vec::new();
    out.extend_from_slice(b"wOF2");
    out.extend_from_slice(&sfnt[..4]); // flavor
    let total_len = 48 + directory.len() + compressed.len();
    w32(&mut out, total_len as u32);
    w16(&mut out, tables.len() as u16);
    w16(&mut out, 0); // reserved
    w32(&mut out, total_sfnt_size as u32);
    w32(&mut out, compressed.len() as u32);
    w16(&mut out, 1); // majorVersion
    w16(&mut out, 0); // minorVersion
    for _ in 0..5 {
        w32(&mut out, 0); // metadata and private blocks: absent
    }
    out.extend_from_slice(&directory);
    out.extend_from_slice(&compressed);
    out
}
