//! Glyph outline access through the rasterization engine.
//!
//! [`RasterFont`] is the crate's handle onto the outline collaborator: it
//! owns a scaling context over the shared canonical bytes and answers
//! outline queries in font units at the currently-set variable-design-axis
//! location. It deliberately knows nothing about glyph names; the font
//! handle translates names to identifiers before asking.

use std::sync::Arc;

use swash::scale::outline::Outline;
use swash::scale::ScaleContext;
use swash::{tag_from_str_lossy, CacheKey, FontRef, Setting};

use crate::error::FontError;
use crate::VarLocation;

/// Outline and variation handle for one font of a canonical container.
pub struct RasterFont {
    data: Arc<[u8]>,
    offset: u32,
    key: CacheKey,
    context: ScaleContext,
    /// Current axis location; empty means the default instance.
    location: Vec<Setting<f32>>,
}

impl RasterFont {
    /// Opens font `index` of the canonical container bytes.
    pub fn from_data(data: Arc<[u8]>, index: u32) -> Result<Self, FontError> {
        let font = FontRef::from_index(&data, index as usize)
            .ok_or(FontError::InvalidFont { index })?;
        let (offset, key) = (font.offset, font.key);
        Ok(Self { data, offset, key, context: ScaleContext::new(), location: Vec::new() })
    }

    /// Replaces the variable-design-axis location used for subsequent
    /// outline queries. An empty map restores the default instance.
    /// Axis tags unknown to the font are ignored by the scaler.
    pub fn set_variable_location(&mut self, location: &VarLocation) {
        self.location = location
            .iter()
            .map(|(axis, &value)| Setting { tag: tag_from_str_lossy(axis), value })
            .collect();
    }

    /// Unscaled outline (font units) for a glyph identifier at the current
    /// axis location. `None` when the identifier is out of range or the
    /// glyph has no outline data.
    pub fn outline(&mut self, glyph_id: u16) -> Option<Outline> {
        let font = FontRef { data: &self.data, offset: self.offset, key: self.key };
        let mut scaler = self
            .context
            .builder(font)
            .size(0.0)
            .hint(false)
            .variations(self.location.iter().cloned())
            .build();
        scaler.scale_outline(glyph_id)
    }
}

impl std::fmt::Debug for RasterFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterFont")
            .field("offset", &self.offset)
            .field("axis_settings", &self.location.len())
            .finish()
    }
}
