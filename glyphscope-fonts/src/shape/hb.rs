//! Minimal RAII layer over the native HarfBuzz shaping engine.
//!
//! Only the slice of the engine this crate drives is wrapped: blob/face
//! lifetime, fonts with per-call resolver overrides, input buffers and the
//! shaping invocation itself. All raw handles are owned here and released on
//! `Drop`; nothing is registered globally. The wrapper types hold raw
//! pointers and are therefore `!Send`/`!Sync`, matching the crate's
//! single-threaded ownership model.

use std::ffi::{c_char, c_void, CString};
use std::sync::Arc;

use harfbuzz_sys as sys;

/// Packs a 4-byte OpenType tag into the engine's integer form.
pub(crate) const fn tag(bytes: &[u8; 4]) -> sys::hb_tag_t {
    ((bytes[0] as u32) << 24)
        | ((bytes[1] as u32) << 16)
        | ((bytes[2] as u32) << 8)
        | (bytes[3] as u32)
}

/// Packs a tag string, space-padding short input and truncating long input.
pub(crate) fn tag_from_str(s: &str) -> sys::hb_tag_t {
    let mut bytes = [b' '; 4];
    for (slot, byte) in bytes.iter_mut().zip(s.bytes()) {
        *slot = byte;
    }
    tag(&bytes)
}

/// Unpacks a tag into a trimmed printable string.
pub(crate) fn tag_to_string(value: sys::hb_tag_t) -> String {
    let printable: String = value
        .to_be_bytes()
        .iter()
        .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '?' })
        .collect();
    printable.trim_end().to_string()
}

/// An opened font face: the engine's view of one font in a (possibly
/// multi-font) byte container. Keeps the shared byte buffer alive for as
/// long as the engine may reference it.
pub(crate) struct Face {
    raw: *mut sys::hb_face_t,
    _data: Arc<[u8]>,
}

impl Face {
    /// Opens font `index` of the container. Returns `None` when the engine
    /// cannot find a glyph table there.
    pub(crate) fn from_data(data: Arc<[u8]>, index: u32) -> Option<Self> {
        let raw = unsafe {
            let blob = sys::hb_blob_create(
                data.as_ptr() as *const c_char,
                data.len() as u32,
                sys::HB_MEMORY_MODE_READONLY,
                std::ptr::null_mut(),
                None,
            );
            let face = sys::hb_face_create(blob, index);
            // the face holds its own blob reference from here on
            sys::hb_blob_destroy(blob);
            face
        };
        let face = Self { raw, _data: data };
        if face.glyph_count() == 0 {
            return None;
        }
        Some(face)
    }

    pub(crate) fn upem(&self) -> u32 {
        unsafe { sys::hb_face_get_upem(self.raw) }
    }

    pub(crate) fn glyph_count(&self) -> u32 {
        unsafe { sys::hb_face_get_glyph_count(self.raw) }
    }
}

impl Drop for Face {
    fn drop(&mut self) {
        unsafe { sys::hb_face_destroy(self.raw) };
    }
}

/// Resolver callbacks bound onto a font for the duration of one shaping
/// call. The referenced closures map through the glyph-name model owned by
/// the caller.
pub(crate) struct ResolverHooks<'a> {
    /// Input code unit (biased glyph id or Unicode scalar) to glyph id.
    pub(crate) nominal: &'a dyn Fn(u32) -> u32,
    /// Glyph id to horizontal advance in scaled units.
    pub(crate) advance: &'a dyn Fn(u32) -> i32,
}

unsafe extern "C" fn nominal_glyph_trampoline(
    _font: *mut sys::hb_font_t,
    font_data: *mut c_void,
    unicode: sys::hb_codepoint_t,
    glyph: *mut sys::hb_codepoint_t,
    _user_data: *mut c_void,
) -> sys::hb_bool_t {
    let hooks = unsafe { &*(font_data as *const ResolverHooks<'_>) };
    unsafe { *glyph = (hooks.nominal)(unicode) };
    // always resolved: unmapped input degrades to glyph 0 inside the hook
    1
}

unsafe extern "C" fn glyph_h_advance_trampoline(
    _font: *mut sys::hb_font_t,
    font_data: *mut c_void,
    glyph: sys::hb_codepoint_t,
    _user_data: *mut c_void,
) -> sys::hb_position_t {
    let hooks = unsafe { &*(font_data as *const ResolverHooks<'_>) };
    (hooks.advance)(glyph)
}

/// A shaping font over a [`Face`].
///
/// The base font keeps the engine's table-driven behavior; resolver
/// overrides go onto a fresh [`Font::sub_font`] so everything not
/// overridden (vertical metrics in particular) falls through to the base.
pub(crate) struct Font {
    raw: *mut sys::hb_font_t,
}

impl Font {
    pub(crate) fn new(face: &Face) -> Self {
        Self { raw: unsafe { sys::hb_font_create(face.raw) } }
    }

    /// Child font inheriting everything from `self` until overridden.
    pub(crate) fn sub_font(&self) -> Font {
        Font { raw: unsafe { sys::hb_font_create_sub_font(self.raw) } }
    }

    pub(crate) fn set_scale(&mut self, x: i32, y: i32) {
        unsafe { sys::hb_font_set_scale(self.raw, x, y) };
    }

    /// Applies a variable-design-axis location. An empty slice selects the
    /// default instance.
    pub(crate) fn set_variations(&mut self, variations: &[(sys::hb_tag_t, f32)]) {
        let raw: Vec<sys::hb_variation_t> = variations
            .iter()
            .map(|&(tag, value)| sys::hb_variation_t { tag, value })
            .collect();
        unsafe { sys::hb_font_set_variations(self.raw, raw.as_ptr(), raw.len() as u32) };
    }

    /// Binds the nominal-glyph and horizontal-advance resolvers.
    ///
    /// # Safety
    /// `hooks` must stay alive and unmoved until the last shaping call on
    /// this font returns; destroying the font does not call back into it.
    pub(crate) unsafe fn bind_resolvers(&mut self, hooks: *const ResolverHooks<'_>) {
        unsafe {
            let funcs = sys::hb_font_funcs_create();
            sys::hb_font_funcs_set_nominal_glyph_func(
                funcs,
                Some(nominal_glyph_trampoline),
                std::ptr::null_mut(),
                None,
            );
            sys::hb_font_funcs_set_glyph_h_advance_func(
                funcs,
                Some(glyph_h_advance_trampoline),
                std::ptr::null_mut(),
                None,
            );
            sys::hb_font_set_funcs(self.raw, funcs, hooks as *mut c_void, None);
            // the font took its own reference
            sys::hb_font_funcs_destroy(funcs);
        }
    }
}

impl Drop for Font {
    fn drop(&mut self) {
        unsafe { sys::hb_font_destroy(self.raw) };
    }
}

/// An engine input buffer of raw numeric code units.
pub(crate) struct Buffer {
    raw: *mut sys::hb_buffer_t,
}

impl Buffer {
    pub(crate) fn new() -> Self {
        Self { raw: unsafe { sys::hb_buffer_create() } }
    }

    /// Appends code units; cluster values are the unit positions.
    pub(crate) fn add_code_units(&mut self, units: &[u32]) {
        unsafe {
            sys::hb_buffer_add_codepoints(
                self.raw,
                units.as_ptr(),
                units.len() as i32,
                0,
                units.len() as i32,
            );
        }
    }

    pub(crate) fn guess_segment_properties(&mut self) {
        unsafe { sys::hb_buffer_guess_segment_properties(self.raw) };
    }

    pub(crate) fn set_direction(&mut self, direction: sys::hb_direction_t) {
        unsafe { sys::hb_buffer_set_direction(self.raw, direction) };
    }

    /// Sets the script from an ISO 15924 tag such as `"Arab"`.
    pub(crate) fn set_script(&mut self, script: &str) {
        let Ok(cstr) = CString::new(script) else { return };
        unsafe {
            sys::hb_buffer_set_script(self.raw, sys::hb_script_from_string(cstr.as_ptr(), -1));
        }
    }

    /// Sets the language from a BCP 47 string such as `"tr"`.
    pub(crate) fn set_language(&mut self, language: &str) {
        let Ok(cstr) = CString::new(language) else { return };
        unsafe {
            sys::hb_buffer_set_language(self.raw, sys::hb_language_from_string(cstr.as_ptr(), -1));
        }
    }

    /// Per-position glyph info after shaping, in output order.
    pub(crate) fn glyph_infos(&self) -> &[sys::hb_glyph_info_t] {
        unsafe {
            let mut len: u32 = 0;
            let ptr = sys::hb_buffer_get_glyph_infos(self.raw, &mut len);
            if ptr.is_null() || len == 0 {
                return &[];
            }
            std::slice::from_raw_parts(ptr, len as usize)
        }
    }

    /// Per-position placement after shaping, in output order.
    pub(crate) fn glyph_positions(&self) -> &[sys::hb_glyph_position_t] {
        unsafe {
            let mut len: u32 = 0;
            let ptr = sys::hb_buffer_get_glyph_positions(self.raw, &mut len);
            if ptr.is_null() || len == 0 {
                return &[];
            }
            std::slice::from_raw_parts(ptr, len as usize)
        }
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        unsafe { sys::hb_buffer_destroy(self.raw) };
    }
}

/// Maps the crate's direction enum onto the engine's constants.
pub(crate) fn direction_raw(direction: super::Direction) -> sys::hb_direction_t {
    match direction {
        super::Direction::LeftToRight => sys::HB_DIRECTION_LTR,
        super::Direction::RightToLeft => sys::HB_DIRECTION_RTL,
        super::Direction::TopToBottom => sys::HB_DIRECTION_TTB,
        super::Direction::BottomToTop => sys::HB_DIRECTION_BTT,
    }
}

/// A feature toggle applied over the whole buffer.
pub(crate) fn feature(tag: sys::hb_tag_t, value: u32) -> sys::hb_feature_t {
    sys::hb_feature_t { tag, value, start: 0, end: u32::MAX }
}

/// Runs the engine over the buffer with the given feature toggles.
pub(crate) fn shape(font: &Font, buffer: &mut Buffer, features: &[sys::hb_feature_t]) {
    unsafe {
        sys::hb_shape(
            font.raw,
            buffer.raw,
            if features.is_empty() { std::ptr::null() } else { features.as_ptr() },
            features.len() as u32,
        );
    }
}

/// Chunk size for the engine's paged tag-listing calls.
const TAG_CHUNK: usize = 32;

/// Script tags present in a layout table (`GSUB`/`GPOS`).
pub(crate) fn layout_script_tags(face: &Face, table: sys::hb_tag_t) -> Vec<sys::hb_tag_t> {
    let mut tags = Vec::new();
    let mut start = 0u32;
    loop {
        let mut chunk = [0 as sys::hb_tag_t; TAG_CHUNK];
        let mut count = chunk.len() as u32;
        let total = unsafe {
            sys::hb_ot_layout_table_get_script_tags(
                face.raw,
                table,
                start,
                &mut count,
                chunk.as_mut_ptr(),
            )
        };
        tags.extend_from_slice(&chunk[..count as usize]);
        start += count;
        if count == 0 || start >= total {
            return tags;
        }
    }
}

/// Language tags of one script of a layout table.
pub(crate) fn layout_language_tags(
    face: &Face,
    table: sys::hb_tag_t,
    script_index: u32,
) -> Vec<sys::hb_tag_t> {
    let mut tags = Vec::new();
    let mut start = 0u32;
    loop {
        let mut chunk = [0 as sys::hb_tag_t; TAG_CHUNK];
        let mut count = chunk.len() as u32;
        let total = unsafe {
            sys::hb_ot_layout_script_get_language_tags(
                face.raw,
                table,
                script_index,
                start,
                &mut count,
                chunk.as_mut_ptr(),
            )
        };
        tags.extend_from_slice(&chunk[..count as usize]);
        start += count;
        if count == 0 || start >= total {
            return tags;
        }
    }
}

/// Feature tags of one script/language system of a layout table.
pub(crate) fn layout_feature_tags(
    face: &Face,
    table: sys::hb_tag_t,
    script_index: u32,
    language_index: u32,
) -> Vec<sys::hb_tag_t> {
    let mut tags = Vec::new();
    let mut start = 0u32;
    loop {
        let mut chunk = [0 as sys::hb_tag_t; TAG_CHUNK];
        let mut count = chunk.len() as u32;
        let total = unsafe {
            sys::hb_ot_layout_language_get_feature_tags(
                face.raw,
                table,
                script_index,
                language_index,
                start,
                &mut count,
                chunk.as_mut_ptr(),
            )
        };
        tags.extend_from_slice(&chunk[..count as usize]);
        start += count;
        if count == 0 || start >= total {
            return tags;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_pack_big_endian() {
        assert_eq!(tag(b"liga"), 0x6C69_6761);
        assert_eq!(tag_from_str("liga"), tag(b"liga"));
    }

    #[test]
    fn short_tags_are_space_padded() {
        assert_eq!(tag_from_str("SVG"), tag(b"SVG "));
        assert_eq!(tag_to_string(tag(b"SVG ")), "SVG");
    }

    #[test]
    fn tag_strings_round_trip() {
        for name in ["GSUB", "GPOS", "wght", "cv01"] {
            assert_eq!(tag_to_string(tag_from_str(name)), name);
        }
    }
}
