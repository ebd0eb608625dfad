//! Font handles: the public facade over normalization, glyph identity,
//! outlines and shaping.
//!
//! Two construction variants expose the same operation set once usable:
//!
//! - [`LoadedFont`] opens binary font data synchronously and is ready
//!   immediately.
//! - [`SourceFont`] references a textual font source that must first pass
//!   through an external compiler; it is an explicit state machine
//!   (pending → ready | failed) whose single async [`SourceFont::load`]
//!   drives the transition. "Not yet loaded" is a state, never a
//!   half-initialized object.

mod compile;

pub use compile::{CommandCompiler, CompileOutput, SourceCompiler};

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use swash::scale::outline::Outline;

use crate::container;
use crate::error::FontError;
use crate::glyphs::{GlyphOrder, ParsedFont};
use crate::outline::RasterFont;
use crate::shape::{GlyphPlacement, ShapeInput, ShapeOptions, Shaper};
use crate::VarLocation;

/// A ready-to-use font: parsed glyph identity, outline access and shaping
/// over one shared, normalized byte buffer.
///
/// The parsed font, the raster handle and the shaper are all constructed
/// from the same bytes and collection index, so their glyph orders are
/// identical by construction. Operations take `&mut self`; at most one is
/// in flight at a time.
pub struct LoadedFont {
    data: Arc<[u8]>,
    index: u32,
    parsed: Arc<ParsedFont>,
    raster: RasterFont,
    shaper: Shaper,
    location: VarLocation,
}

impl LoadedFont {
    /// Builds a font from binary container data.
    ///
    /// Runs the container normalizer first, then opens the parser, the
    /// rasterizer and the shaper over the normalized bytes. Any failure
    /// aborts the whole construction; no partial handle is returned.
    pub fn from_data(data: Vec<u8>, index: u32) -> Result<Self, FontError> {
        let normalized = match container::normalize(&data)? {
            Cow::Owned(bytes) => Some(bytes),
            Cow::Borrowed(_) => None,
        };
        let data: Arc<[u8]> = match normalized {
            Some(bytes) => Arc::from(bytes),
            None => Arc::from(data),
        };

        let parsed = Arc::new(ParsedFont::parse(Arc::clone(&data), index)?);
        let raster = RasterFont::from_data(Arc::clone(&data), index)?;
        let shaper = Shaper::with_parsed(Arc::clone(&data), Arc::clone(&parsed))?;
        log::debug!(
            "loaded font index {index}: {} glyphs, {} upem",
            parsed.glyph_order().len(),
            parsed.units_per_em()
        );
        Ok(Self { data, index, parsed, raster, shaper, location: VarLocation::new() })
    }

    /// Reads a font file and builds a font from it.
    pub fn from_path(path: impl AsRef<Path>, index: u32) -> Result<Self, FontError> {
        let data = std::fs::read(path)?;
        Self::from_data(data, index)
    }

    /// The shared normalized bytes backing every component of this handle.
    pub fn data(&self) -> &Arc<[u8]> {
        &self.data
    }

    /// Index of this font within its collection.
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn parsed(&self) -> &Arc<ParsedFont> {
        &self.parsed
    }

    pub fn glyph_order(&self) -> &GlyphOrder {
        self.parsed.glyph_order()
    }

    pub fn units_per_em(&self) -> u16 {
        self.parsed.units_per_em()
    }

    /// Unscaled outline for a glyph name at the current axis location.
    pub fn outline(&mut self, glyph_name: &str) -> Option<Outline> {
        let glyph_id = self.parsed.glyph_order().id(glyph_name)?;
        self.raster.outline(glyph_id as u16)
    }

    /// Outline wrapped as color layers.
    ///
    /// This core does not interpret multi-layer color glyph tables; the
    /// flat outline comes back as a single synthetic layer at index 0.
    pub fn color_layers(&mut self, glyph_name: &str) -> Option<Vec<(Outline, usize)>> {
        Some(vec![(self.outline(glyph_name)?, 0)])
    }

    /// Moves the font to a variable-design-axis location (empty restores
    /// the default instance).
    ///
    /// Only outline queries reflect the new location. Shaping keeps using
    /// the static advances until the caller installs an advance-resolver
    /// override for the instance; outline rendering and shaping-time
    /// metrics are allowed to diverge in the meantime.
    pub fn set_variable_location(&mut self, location: &VarLocation) {
        self.location = location.clone();
        self.raster.set_variable_location(location);
    }

    /// The currently-set axis location.
    pub fn variable_location(&self) -> &VarLocation {
        &self.location
    }

    /// Shapes text or an explicit glyph sequence with this font.
    pub fn shape(&mut self, input: ShapeInput<'_>, options: &ShapeOptions) -> Vec<GlyphPlacement> {
        self.shaper.shape(input, options)
    }

    pub fn shaper(&self) -> &Shaper {
        &self.shaper
    }

    pub fn shaper_mut(&mut self) -> &mut Shaper {
        &mut self.shaper
    }
}

impl std::fmt::Debug for LoadedFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedFont")
            .field("index", &self.index)
            .field("glyph_count", &self.parsed.glyph_order().len())
            .field("data_len", &self.data.len())
            .finish()
    }
}

/// Lifecycle of a source-backed font.
#[derive(Debug)]
enum LoadState {
    /// Construction finished, [`SourceFont::load`] not yet driven.
    Pending,
    /// Compilation and the binary build steps succeeded.
    Ready(Box<LoadedFont>),
    /// Compilation (or the subsequent build) failed; terminal.
    Failed(String),
}

/// A font backed by a textual source that an external compiler must turn
/// into binary data before any font operation is possible.
///
/// The single async [`SourceFont::load`] call is the only suspension point
/// in this crate. It runs at most once into `Ready` or `Failed`; a failed
/// load is terminal (callers retry by constructing a fresh instance).
/// Accessors return `None` until `Ready`; serializing operations against
/// load completion is the caller's responsibility.
#[derive(Debug)]
pub struct SourceFont {
    source: PathBuf,
    index: u32,
    state: LoadState,
}

impl SourceFont {
    /// References a font source; no I/O happens until [`SourceFont::load`].
    pub fn new(source: impl Into<PathBuf>, index: u32) -> Self {
        Self { source: source.into(), index, state: LoadState::Pending }
    }

    /// Path of the font source.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Index the compiled font will be opened at.
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, LoadState::Pending)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, LoadState::Ready(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.state, LoadState::Failed(_))
    }

    /// The failure message of a terminal failed state, if any.
    pub fn failure(&self) -> Option<&str> {
        match &self.state {
            LoadState::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// Compiles the source and builds the font, transitioning pending →
    /// ready | failed exactly once.
    ///
    /// Compiler diagnostics are logged even when compilation succeeds; a
    /// compiler may warn and still emit a usable font. An empty output with
    /// a non-empty error stream (or a compiler invocation error) fails the
    /// load as [`FontError::CompileFailure`].
    pub async fn load(&mut self, compiler: &impl SourceCompiler) -> Result<(), FontError> {
        match &self.state {
            LoadState::Ready(_) => return Ok(()),
            LoadState::Failed(message) => {
                return Err(FontError::CompileFailure { message: message.clone() });
            }
            LoadState::Pending => {}
        }

        let output = match compiler.compile(&self.source).await {
            Ok(output) => output,
            Err(err) => {
                let message = format!("compiler failed to run: {err}");
                log::warn!("{}: {message}", self.source.display());
                self.state = LoadState::Failed(message.clone());
                return Err(FontError::CompileFailure { message });
            }
        };

        if !output.stdout.is_empty() {
            log::info!("font compiler output for {}:\n{}", self.source.display(), output.stdout.trim_end());
        }
        if !output.stderr.is_empty() {
            log::warn!("font compiler diagnostics for {}:\n{}", self.source.display(), output.stderr.trim_end());
        }

        if output.font_data.is_empty() {
            let message = if output.stderr.trim().is_empty() {
                String::from("compiler produced no font data")
            } else {
                output.stderr.trim().to_string()
            };
            self.state = LoadState::Failed(message.clone());
            return Err(FontError::CompileFailure { message });
        }

        match LoadedFont::from_data(output.font_data, self.index) {
            Ok(font) => {
                self.state = LoadState::Ready(Box::new(font));
                Ok(())
            }
            Err(err) => {
                self.state = LoadState::Failed(err.to_string());
                Err(err)
            }
        }
    }

    /// The loaded font, once ready.
    pub fn font(&self) -> Option<&LoadedFont> {
        match &self.state {
            LoadState::Ready(font) => Some(font),
            _ => None,
        }
    }

    /// Mutable access to the loaded font, once ready.
    pub fn font_mut(&mut self) -> Option<&mut LoadedFont> {
        match &mut self.state {
            LoadState::Ready(font) => Some(font),
            _ => None,
        }
    }

    /// Consumes the handle, yielding the loaded font once ready.
    pub fn into_font(self) -> Option<LoadedFont> {
        match self.state {
            LoadState::Ready(font) => Some(*font),
            _ => None,
        }
    }
}
