//! Glyph identity: glyph order, character mapping and static metrics.
//!
//! [`ParsedFont`] extracts everything the shaping pipeline needs to reason
//! about glyphs *by name* from a canonical font: the glyph order, a
//! best-effort Unicode-codepoint-to-glyph-name mapping and the static
//! horizontal advances. Extraction is eager so no borrow of the font bytes
//! outlives construction; raw table bytes remain reachable by tag for
//! callers that need them.
//!
//! The two resolver functions consumed by the shaping adapter are built
//! here. Both are plain boxed closures and can be replaced by callers (for
//! example with instance-specific metrics for a variable font) without
//! touching the rest of the pipeline.

mod order;

pub use order::GlyphOrder;

use std::collections::HashMap;
use std::sync::Arc;

use ttf_parser::{cmap, Face, GlyphId, PlatformId, RawFace, Tag};

use crate::error::FontError;

/// Resolves a Unicode scalar value to a glyph name, or `None` when the font
/// has no default mapping for it.
pub type CodepointResolver = Box<dyn Fn(u32) -> Option<String> + Send + Sync>;

/// Resolves a glyph name to a horizontal advance in font units, or `None`
/// to fall back to the font's static value.
pub type AdvanceResolver = Box<dyn Fn(&str) -> Option<u16> + Send + Sync>;

/// Synthesized name for glyphs the font does not name.
pub(crate) fn synthesized_name(id: u32) -> String {
    format!("glyph{id:05}")
}

/// Glyph identity data extracted from one font of a canonical container.
pub struct ParsedFont {
    data: Arc<[u8]>,
    index: u32,
    units_per_em: u16,
    order: GlyphOrder,
    /// Codepoint to glyph id, from the broadest Unicode cmap subtable.
    char_map: HashMap<u32, u32>,
    /// Static horizontal advances indexed by glyph id.
    advances: Vec<u16>,
}

impl ParsedFont {
    /// Parses glyph identity data from canonical font bytes.
    ///
    /// `index` selects the font within a collection; pass 0 for single-font
    /// containers. The bytes must already be normalized (see
    /// [`crate::container::normalize`]).
    pub fn parse(data: Arc<[u8]>, index: u32) -> Result<Self, FontError> {
        let face = Face::parse(&data, index).map_err(|err| FontError::Parse(err.to_string()))?;
        let glyph_count = face.number_of_glyphs();
        let units_per_em = face.units_per_em();

        let names = (0..glyph_count)
            .map(|id| {
                face.glyph_name(GlyphId(id))
                    .map(str::to_owned)
                    .unwrap_or_else(|| synthesized_name(u32::from(id)))
            })
            .collect();
        let order = GlyphOrder::new(names);

        let mut char_map = HashMap::new();
        if let Some(subtable) = best_unicode_subtable(&face) {
            subtable.codepoints(|codepoint| {
                if let Some(glyph) = subtable.glyph_index(codepoint) {
                    char_map.insert(codepoint, u32::from(glyph.0));
                }
            });
        } else {
            log::debug!("font {index} has no Unicode cmap subtable");
        }

        let advances = (0..glyph_count)
            .map(|id| face.glyph_hor_advance(GlyphId(id)).unwrap_or(0))
            .collect();

        Ok(Self { data, index, units_per_em, order, char_map, advances })
    }

    /// The shared canonical font bytes this font was parsed from.
    pub fn data(&self) -> &Arc<[u8]> {
        &self.data
    }

    /// Index of this font within its collection.
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn units_per_em(&self) -> u16 {
        self.units_per_em
    }

    /// The glyph order, fixed for this font's lifetime.
    pub fn glyph_order(&self) -> &GlyphOrder {
        &self.order
    }

    /// Default glyph name for a Unicode scalar value, per the font's
    /// preferred character map.
    pub fn glyph_name_for_codepoint(&self, codepoint: u32) -> Option<&str> {
        let id = *self.char_map.get(&codepoint)?;
        self.order.name(id)
    }

    /// Static horizontal advance for a glyph name, in font units.
    pub fn advance_width(&self, glyph_name: &str) -> Option<u16> {
        let id = self.order.id(glyph_name)?;
        self.advances.get(id as usize).copied()
    }

    /// Number of codepoints with a default glyph mapping.
    pub fn mapped_codepoint_count(&self) -> usize {
        self.char_map.len()
    }

    /// Raw bytes of a table by tag, if the font carries it.
    ///
    /// The table directory is re-read transiently; the returned slice
    /// borrows from the shared font bytes.
    pub fn table_data(&self, tag: [u8; 4]) -> Option<&[u8]> {
        let raw = RawFace::parse(&self.data, self.index).ok()?;
        raw.table(Tag::from_bytes(&tag))
    }
}

impl std::fmt::Debug for ParsedFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsedFont")
            .field("index", &self.index)
            .field("units_per_em", &self.units_per_em)
            .field("glyph_count", &self.order.len())
            .field("mapped_codepoints", &self.char_map.len())
            .finish()
    }
}

/// Default codepoint resolver: the font's preferred character map.
pub fn default_codepoint_resolver(parsed: &Arc<ParsedFont>) -> CodepointResolver {
    let parsed = Arc::clone(parsed);
    Box::new(move |codepoint| parsed.glyph_name_for_codepoint(codepoint).map(str::to_owned))
}

/// Default advance resolver: the font's static horizontal metrics.
///
/// Variable-font instances need a caller-supplied replacement; the static
/// table does not reflect an axis location.
pub fn default_advance_resolver(parsed: &Arc<ParsedFont>) -> AdvanceResolver {
    let parsed = Arc::clone(parsed);
    Box::new(move |glyph_name| parsed.advance_width(glyph_name))
}

/// Picks the broadest-coverage Unicode cmap subtable.
///
/// Preference follows full-repertoire subtables over BMP-only ones:
/// Windows/10, Unicode/6, Unicode/4, then Windows/1 and the legacy Unicode
/// encodings. Returns `None` when the font has no Unicode subtable at all.
fn best_unicode_subtable<'a>(face: &Face<'a>) -> Option<cmap::Subtable<'a>> {
    let cmap = face.tables().cmap?;
    let mut best: Option<(u8, cmap::Subtable<'a>)> = None;
    for subtable in cmap.subtables {
        let Some(rank) = subtable_rank(subtable.platform_id, subtable.encoding_id) else {
            continue;
        };
        if best.as_ref().is_none_or(|&(current, _)| rank < current) {
            best = Some((rank, subtable));
        }
    }
    best.map(|(_, subtable)| subtable)
}

fn subtable_rank(platform_id: PlatformId, encoding_id: u16) -> Option<u8> {
    match (platform_id, encoding_id) {
        (PlatformId::Windows, 10) => Some(0),
        (PlatformId::Unicode, 6) => Some(1),
        (PlatformId::Unicode, 4) => Some(2),
        (PlatformId::Windows, 1) => Some(3),
        (PlatformId::Unicode, 3) => Some(4),
        (PlatformId::Unicode, 2) => Some(5),
        (PlatformId::Unicode, 1) => Some(6),
        (PlatformId::Unicode, 0) => Some(7),
        _ => None,
    }
}
