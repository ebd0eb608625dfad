//! Typed error types for glyphscope-fonts.
//!
//! This module provides structured error types so callers at the crate
//! boundary can match on specific failure categories instead of relying on
//! opaque strings. Unresolvable characters during shaping are deliberately
//! not represented here: they degrade to the font's `.notdef` glyph and
//! never abort a shaping call.

use thiserror::Error;

/// Top-level error type for font construction and loading.
///
/// Covers the failure categories callers may want to distinguish:
/// - Container normalization (compressed distribution formats)
/// - Table parsing / engine rejection of the font data
/// - External source compilation
/// - File access
#[derive(Debug, Error)]
pub enum FontError {
    /// The font container claims a compressed distribution format but could
    /// not be normalized into the canonical table directory.
    ///
    /// Fatal to construction: no font handle is produced.
    #[error("malformed font container: {0}")]
    MalformedContainer(#[from] ContainerError),

    /// The table directory or a required table could not be parsed.
    #[error("font table parsing failed: {0}")]
    Parse(String),

    /// The rasterizer or shaping engine rejected the font data at the given
    /// collection index.
    #[error("font data rejected at collection index {index}")]
    InvalidFont {
        /// Index into the font collection that failed to open.
        index: u32,
    },

    /// The external source compiler reported errors and produced no usable
    /// font data. Compiler diagnostics are logged before this is returned.
    #[error("font source compilation failed: {message}")]
    CompileFailure {
        /// Compiler error stream, or a placeholder when it was empty.
        message: String,
    },

    /// Reading the font file or font source failed.
    #[error("font I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while normalizing a compressed font container.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// The container is shorter than its fixed header or directory require.
    #[error("container truncated while reading {0}")]
    Truncated(&'static str),

    /// The container directory declares no tables.
    #[error("container declares no tables")]
    Empty,

    /// A directory entry points outside the container bytes.
    #[error("table '{tag}' is out of bounds")]
    OutOfBounds {
        /// Tag of the offending table.
        tag: String,
    },

    /// A compressed table stream failed to decompress.
    #[error("table '{tag}' has a corrupt compressed stream: {detail}")]
    BadStream {
        /// Tag of the offending table, or a stream-level placeholder.
        tag: String,
        /// Human-readable decoder error.
        detail: String,
    },

    /// A table decompressed to a different size than the directory records.
    #[error("table '{tag}' decompressed to {actual} bytes, directory says {expected}")]
    LengthMismatch {
        /// Tag of the offending table.
        tag: String,
        /// Length recorded in the container directory.
        expected: u32,
        /// Length actually produced by decompression.
        actual: usize,
    },

    /// A length field uses an invalid variable-length integer encoding.
    #[error("invalid variable-length integer in container directory")]
    BadVarInt,

    /// The table uses a WOFF2 preprocessing transform this crate does not
    /// reconstruct. Fonts stored with the null transform normalize fully.
    #[error("unsupported WOFF2 transform on table '{tag}'")]
    UnsupportedTransform {
        /// Tag of the transformed table.
        tag: String,
    },

    /// WOFF2 font collections are not supported.
    #[error("WOFF2 font collections are not supported")]
    CollectionNotSupported,
}
