//! The glyph order: a font's glyph names in identifier order.

use std::collections::HashMap;

/// Bidirectional mapping between dense glyph identifiers and glyph names.
///
/// Fixed for the font's lifetime once parsed; identifiers are the zero-based
/// positions in the name sequence. Duplicate names in broken fonts resolve
/// to the first identifier carrying the name.
#[derive(Debug, Clone)]
pub struct GlyphOrder {
    names: Vec<String>,
    ids: HashMap<String, u32>,
}

impl GlyphOrder {
    pub fn new(names: Vec<String>) -> Self {
        let mut ids = HashMap::with_capacity(names.len());
        for (id, name) in names.iter().enumerate() {
            ids.entry(name.clone()).or_insert(id as u32);
        }
        Self { names, ids }
    }

    /// Number of glyphs in the font.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Name for a glyph identifier, if the identifier is in range.
    pub fn name(&self, id: u32) -> Option<&str> {
        self.names.get(id as usize).map(String::as_str)
    }

    /// Identifier for a glyph name.
    pub fn id(&self, name: &str) -> Option<u32> {
        self.ids.get(name).copied()
    }

    /// All glyph names in identifier order.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}
