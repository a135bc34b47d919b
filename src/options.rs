use serde::Deserialize;

/// Options for route to GPX conversion.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertOptions {
    /// Reject non-numeric or out-of-range coordinates instead of writing
    /// them verbatim, and omit `<ele>` for points without elevation
    /// (default: false)
    #[serde(default)]
    pub validate_coordinates: bool,
}
