//! Font container normalization, glyph identity and text shaping for
//! glyphscope.
//!
//! This crate provides:
//! - Transparent normalization of compressed font containers (WOFF/WOFF2)
//!   into the canonical table-directory form
//! - A glyph-name-indexed font model: glyph order, codepoint-to-name
//!   mapping and static metrics, with replaceable resolver functions
//! - HarfBuzz-based shaping of text *or* explicit glyph sequences into
//!   positioned glyph runs
//! - Font handles over binary data (ready immediately) or textual sources
//!   compiled asynchronously by an external compiler
//!
//! # Architecture
//!
//! Data flows raw bytes → [`container::normalize`] → [`glyphs::ParsedFont`]
//! → {[`outline::RasterFont`], [`shape::Shaper`]} → [`handle::LoadedFont`].
//! One normalized byte buffer is shared read-only by all components of a
//! handle; the glyph order is identical across them by construction.
//!
//! Shaping input is dual-mode: literal text, or glyph names mixed with raw
//! codepoints ([`shape::GlyphSelector`]). Unmapped codepoints degrade to
//! the font's `.notdef` glyph instead of failing the run.
//!
//! Handles and shapers are deliberately single-threaded (`!Send`): at most
//! one operation per handle is in flight at a time. Concurrent shaping of
//! the same bytes means independent [`shape::Shaper`] instances over the
//! same shared buffer.

pub mod container;
pub mod error;
pub mod glyphs;
pub mod handle;
pub mod outline;
pub mod shape;

// Re-export main types for convenience
pub use error::{ContainerError, FontError};
pub use glyphs::{
    default_advance_resolver, default_codepoint_resolver, AdvanceResolver, CodepointResolver,
    GlyphOrder, ParsedFont,
};
pub use handle::{CommandCompiler, CompileOutput, LoadedFont, SourceCompiler, SourceFont};
pub use outline::RasterFont;
pub use shape::{
    Direction, GlyphPlacement, GlyphSelector, LayoutTable, ShapeInput, ShapeOptions, Shaper,
    GLYPH_ID_BIAS,
};

/// Re-export of the outline type returned by glyph queries.
pub use swash::scale::outline::Outline;

/// A variable-design-axis location: axis tag to axis value. An empty map
/// selects the font's default instance.
pub type VarLocation = std::collections::BTreeMap<String, f32>;
