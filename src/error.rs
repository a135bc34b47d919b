use std::string::FromUtf8Error;
use wasm_bindgen::JsValue;

/// Errors raised while reading route data or writing the GPX document.
#[derive(Debug, thiserror::Error)]
pub enum RouteGpxError {
    /// Required structure is missing (route data itself, or `track_points`).
    #[error("Invalid JSON data: {reason}")]
    InvalidInput { reason: &'static str },

    /// The route data has a shape that cannot be read.
    #[error("Malformed route data: {0}")]
    Malformed(String),

    /// Only raised when coordinate validation is enabled.
    #[error("Invalid value '{value}' for {field} of {element} #{index}")]
    InvalidCoordinate {
        element: &'static str,
        index: usize,
        field: &'static str,
        value: String,
    },

    #[error("XML write error: {0}")]
    XmlWrite(#[from] std::io::Error),

    #[error("GPX output is not valid UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),
}

impl RouteGpxError {
    pub(crate) const fn missing_route_data() -> Self {
        Self::InvalidInput {
            reason: "missing route data",
        }
    }

    pub(crate) const fn route_not_object() -> Self {
        Self::InvalidInput {
            reason: "route data is not an object",
        }
    }

    pub(crate) const fn missing_track_points() -> Self {
        Self::InvalidInput {
            reason: "missing track_points array",
        }
    }

    /// True for the structural errors a caller should report as bad input.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput { .. } | Self::Malformed(_))
    }
}

impl From<serde_json::Error> for RouteGpxError {
    fn from(e: serde_json::Error) -> Self {
        Self::Malformed(e.to_string())
    }
}

impl From<serde_wasm_bindgen::Error> for RouteGpxError {
    fn from(e: serde_wasm_bindgen::Error) -> Self {
        Self::Malformed(e.to_string())
    }
}

impl From<RouteGpxError> for JsValue {
    fn from(e: RouteGpxError) -> Self {
        JsValue::from_str(&e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RouteGpxError>;
