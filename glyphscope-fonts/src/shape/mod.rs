//! Text shaping: adapting the glyph-name-indexed font model to the numeric
//! shaping engine.
//!
//! The engine operates purely on numeric code units and glyph identifiers.
//! [`Shaper`] teaches it to resolve glyph identity and horizontal advances
//! through this crate's name-indexed model by binding two resolver closures
//! onto a fresh engine sub-font on every [`Shaper::shape`] call; there is no
//! ambient registration and nothing outlives the call.
//!
//! Input is dual-mode: literal text, or an explicit sequence of
//! [`GlyphSelector`]s mixing raw codepoints with pre-chosen glyph names.
//! Explicit glyph names are carried across the numeric-only engine boundary
//! by biasing their glyph id with [`GLYPH_ID_BIAS`], a value above any legal
//! Unicode scalar; the bias exists only at that boundary and is undone by
//! the nominal-glyph resolver on the way in.

pub(crate) mod hb;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::FontError;
use crate::glyphs::{
    default_advance_resolver, default_codepoint_resolver, synthesized_name, AdvanceResolver,
    CodepointResolver, GlyphOrder, ParsedFont,
};
use crate::VarLocation;

/// Bias added to glyph identifiers carried through the engine's numeric
/// input buffer. Larger than any legal Unicode scalar value, so biased and
/// unbiased code units cannot collide.
pub const GLYPH_ID_BIAS: u32 = 0x8000_0000;

/// One positioned glyph of a shaped run.
///
/// `cluster` indexes the original input (characters of the text, or entries
/// of the glyph-selector sequence) that produced this glyph; offsets and
/// advances are in font units. Records are produced fresh per shaping call
/// and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlyphPlacement {
    /// Dense glyph identifier within the font.
    pub glyph_id: u32,
    /// Glyph name per the font's glyph order.
    pub name: String,
    /// Index into the original input that produced this glyph.
    pub cluster: u32,
    /// Horizontal positioning offset.
    pub x_offset: i32,
    /// Vertical positioning offset.
    pub y_offset: i32,
    /// Horizontal pen advance after drawing.
    pub x_advance: i32,
    /// Vertical pen advance after drawing.
    pub y_advance: i32,
}

/// Resolved writing direction of a shaping request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "ltr")]
    LeftToRight,
    #[serde(rename = "rtl")]
    RightToLeft,
    #[serde(rename = "ttb")]
    TopToBottom,
    #[serde(rename = "btt")]
    BottomToTop,
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ltr" => Ok(Self::LeftToRight),
            "rtl" => Ok(Self::RightToLeft),
            "ttb" => Ok(Self::TopToBottom),
            "btt" => Ok(Self::BottomToTop),
            other => Err(format!("unknown direction '{other}', expected ltr|rtl|ttb|btt")),
        }
    }
}

/// What to shape: literal text, or an explicit glyph sequence.
#[derive(Debug, Clone, Copy)]
pub enum ShapeInput<'a> {
    /// Unicode text; the engine chooses glyphs through the codepoint
    /// resolver.
    Text(&'a str),
    /// Pre-chosen glyph names, optionally mixed with raw codepoints.
    Glyphs(&'a [GlyphSelector]),
}

/// One entry of an explicit glyph sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GlyphSelector {
    /// A Unicode scalar value resolved through the codepoint resolver.
    CodePoint(u32),
    /// A glyph name taken literally; unknown names fall back to `.notdef`.
    GlyphName(String),
}

/// Per-call shaping parameters.
///
/// Feature tags absent from `features` keep the engine's default activation
/// state; an empty `variations` map selects the font's default instance.
/// Explicit `direction`/`script`/`language` values take precedence over the
/// engine's segment-property inference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShapeOptions {
    /// OpenType feature toggles, 4-letter tag to value.
    pub features: BTreeMap<String, u32>,
    /// Variable-design-axis location, axis tag to value.
    pub variations: VarLocation,
    /// Writing direction override.
    pub direction: Option<Direction>,
    /// ISO 15924 script tag override, e.g. `"Arab"`.
    pub script: Option<String>,
    /// BCP 47 language override, e.g. `"tr"`.
    pub language: Option<String>,
}

/// OpenType layout table selector for introspection queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutTable {
    /// `GSUB`
    Substitution,
    /// `GPOS`
    Positioning,
}

impl LayoutTable {
    fn tag(self) -> [u8; 4] {
        match self {
            Self::Substitution => *b"GSUB",
            Self::Positioning => *b"GPOS",
        }
    }
}

/// Default language-system slot in the engine's layout tables.
const DEFAULT_LANGUAGE_INDEX: u32 = 0xFFFF;

/// The shaping adapter for one font of a canonical container.
///
/// Owns its engine handles and resolver bindings exclusively. Repeated
/// [`Shaper::shape`] calls with different parameters are fine; concurrent
/// calls on one instance are not (the type is `!Send` by construction).
/// Callers that need concurrent shaping of the same bytes construct
/// independent instances over the same shared buffer.
pub struct Shaper {
    face: hb::Face,
    font: hb::Font,
    parsed: Arc<ParsedFont>,
    codepoint_resolver: CodepointResolver,
    advance_resolver: AdvanceResolver,
}

impl Shaper {
    /// Opens a shaper over canonical font bytes, parsing glyph identity
    /// data on the way.
    pub fn new(data: Arc<[u8]>, index: u32) -> Result<Self, FontError> {
        let parsed = Arc::new(ParsedFont::parse(Arc::clone(&data), index)?);
        Self::with_parsed(data, parsed)
    }

    /// Opens a shaper reusing an already-parsed font, avoiding a second
    /// pass over the tables. The parsed font must come from the same bytes
    /// and index.
    pub fn with_parsed(data: Arc<[u8]>, parsed: Arc<ParsedFont>) -> Result<Self, FontError> {
        let index = parsed.index();
        let face = hb::Face::from_data(data, index).ok_or(FontError::InvalidFont { index })?;
        let font = hb::Font::new(&face);
        let codepoint_resolver = default_codepoint_resolver(&parsed);
        let advance_resolver = default_advance_resolver(&parsed);
        Ok(Self { face, font, parsed, codepoint_resolver, advance_resolver })
    }

    /// Reads a font file and opens a shaper over it.
    pub fn from_path(path: impl AsRef<Path>, index: u32) -> Result<Self, FontError> {
        let data = std::fs::read(path)?;
        Self::new(Arc::from(data), index)
    }

    /// Replaces the codepoint resolver, e.g. with a character map that is
    /// fresher than the compiled font's.
    pub fn set_codepoint_resolver(&mut self, resolver: CodepointResolver) {
        self.codepoint_resolver = resolver;
    }

    /// Replaces the advance resolver, e.g. with instance metrics for a
    /// variable font's current axis location.
    pub fn set_advance_resolver(&mut self, resolver: AdvanceResolver) {
        self.advance_resolver = resolver;
    }

    /// The parsed glyph identity data backing this shaper.
    pub fn parsed(&self) -> &Arc<ParsedFont> {
        &self.parsed
    }

    /// The font's glyph order.
    pub fn glyph_order(&self) -> &GlyphOrder {
        self.parsed.glyph_order()
    }

    /// Glyph identifier for a name, `.notdef` (0) when unknown.
    pub fn glyph_id(&self, glyph_name: &str) -> u32 {
        self.glyph_order().id(glyph_name).unwrap_or(0)
    }

    pub fn units_per_em(&self) -> u32 {
        self.face.upem()
    }

    /// Shapes the input into a positioned glyph run.
    ///
    /// Output records come back in the engine's output order, which follows
    /// the resolved writing direction. Unmapped codepoints yield `.notdef`
    /// records rather than errors. Two calls with identical arguments
    /// produce identical runs.
    pub fn shape(&mut self, input: ShapeInput<'_>, options: &ShapeOptions) -> Vec<GlyphPlacement> {
        let upem = self.face.upem() as i32;
        let order = self.parsed.glyph_order();

        // fresh sub-font per call: scale, variation location and resolver
        // bindings never leak between calls
        let mut font = self.font.sub_font();
        font.set_scale(upem, upem);
        let variations: Vec<(u32, f32)> = options
            .variations
            .iter()
            .map(|(axis, &value)| (hb::tag_from_str(axis), value))
            .collect();
        font.set_variations(&variations);

        let codepoint_resolver = &self.codepoint_resolver;
        let advance_resolver = &self.advance_resolver;
        let parsed = &self.parsed;
        let nominal = move |unit: u32| -> u32 {
            if unit >= GLYPH_ID_BIAS {
                return unit - GLYPH_ID_BIAS;
            }
            codepoint_resolver(unit)
                .and_then(|name| order.id(&name))
                .unwrap_or(0)
        };
        let advance = move |glyph_id: u32| -> i32 {
            let Some(name) = order.name(glyph_id) else { return 0 };
            advance_resolver(name)
                .or_else(|| parsed.advance_width(name))
                .map(i32::from)
                .unwrap_or(0)
        };
        let hooks = hb::ResolverHooks { nominal: &nominal, advance: &advance };
        // `hooks` lives on this stack frame until after the engine runs;
        // dropping the sub-font does not call back into it
        unsafe { font.bind_resolvers(&hooks) };

        let mut buffer = hb::Buffer::new();
        buffer.add_code_units(&flatten_input(input, order));
        buffer.guess_segment_properties();
        if let Some(direction) = options.direction {
            buffer.set_direction(hb::direction_raw(direction));
        }
        if let Some(script) = &options.script {
            buffer.set_script(script);
        }
        if let Some(language) = &options.language {
            buffer.set_language(language);
        }

        let features: Vec<_> = options
            .features
            .iter()
            .map(|(feature_tag, &value)| hb::feature(hb::tag_from_str(feature_tag), value))
            .collect();
        hb::shape(&font, &mut buffer, &features);

        buffer
            .glyph_infos()
            .iter()
            .zip(buffer.glyph_positions())
            .map(|(info, position)| GlyphPlacement {
                glyph_id: info.codepoint,
                name: order
                    .name(info.codepoint)
                    .map(str::to_owned)
                    .unwrap_or_else(|| synthesized_name(info.codepoint)),
                cluster: info.cluster,
                x_offset: position.x_offset,
                y_offset: position.y_offset,
                x_advance: position.x_advance,
                y_advance: position.y_advance,
            })
            .collect()
    }

    /// Script tags present in one of the font's layout tables.
    pub fn script_tags(&self, table: LayoutTable) -> Vec<String> {
        hb::layout_script_tags(&self.face, hb::tag(&table.tag()))
            .into_iter()
            .map(hb::tag_to_string)
            .collect()
    }

    /// Language tags of one script of a layout table.
    pub fn language_tags(&self, table: LayoutTable, script_index: u32) -> Vec<String> {
        hb::layout_language_tags(&self.face, hb::tag(&table.tag()), script_index)
            .into_iter()
            .map(hb::tag_to_string)
            .collect()
    }

    /// Feature tags of one script/language system of a layout table.
    /// `language_index` of `None` queries the default language system.
    pub fn feature_tags(
        &self,
        table: LayoutTable,
        script_index: u32,
        language_index: Option<u32>,
    ) -> Vec<String> {
        hb::layout_feature_tags(
            &self.face,
            hb::tag(&table.tag()),
            script_index,
            language_index.unwrap_or(DEFAULT_LANGUAGE_INDEX),
        )
        .into_iter()
        .map(hb::tag_to_string)
        .collect()
    }
}

impl std::fmt::Debug for Shaper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shaper")
            .field("index", &self.parsed.index())
            .field("glyph_count", &self.glyph_order().len())
            .finish()
    }
}

/// Flattens dual-mode input into the engine's numeric code units. This is
/// the only place the bias encoding exists.
fn flatten_input(input: ShapeInput<'_>, order: &GlyphOrder) -> Vec<u32> {
    match input {
        ShapeInput::Text(text) => text.chars().map(u32::from).collect(),
        ShapeInput::Glyphs(selectors) => selectors
            .iter()
            .map(|selector| match selector {
                GlyphSelector::CodePoint(codepoint) => *codepoint,
                GlyphSelector::GlyphName(name) => order.id(name).unwrap_or(0) + GLYPH_ID_BIAS,
            })
            .collect(),
    }
}
