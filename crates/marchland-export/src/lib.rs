//! marchland-export: Pure format serializers (sans-IO)
//!
//! Converts traced borders into output formats: SVG for viewing and
//! JSON border records for host applications.

pub mod json;
pub mod svg;

pub use json::{BorderDocument, BorderRecord, from_json, to_json};
pub use svg::{SvgMetadata, SvgRenderer, SvgStyle, build_path_data, to_svg};

/// Errors from the serializers.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// JSON serialization or parsing failed.
    #[error("JSON export failed: {0}")]
    Json(#[from] serde_json::Error),
}
