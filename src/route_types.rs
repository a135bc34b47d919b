use std::fmt;

use serde::{Deserialize, Deserializer};
use serde_json::{Number, Value};

/// A scalar exactly as the route service sent it.
///
/// Coordinates are not coerced to `f64`: a JSON number keeps its own
/// spelling, so `10` is written back as `10` and `37.7` as `37.7`. An
/// explicit `null` is kept apart from an absent key, and anything that is
/// not a scalar at all is carried as raw JSON.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Number(Number),
    Text(String),
    Flag(bool),
    Null,
    Other(Value),
}

impl ScalarValue {
    /// The value as a number, if it was sent as one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    /// Interpret the value as display text. Empty strings, zero, `false`
    /// and `null` count as absent.
    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Text(s) if s.is_empty() => None,
            Self::Text(s) => Some(s),
            Self::Number(n) if n.as_f64() == Some(0.0) => None,
            Self::Number(n) => Some(n.to_string()),
            Self::Flag(true) => Some("true".to_string()),
            Self::Flag(false) | Self::Null => None,
            Self::Other(v) => Some(v.to_string()),
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::Flag(b) => write!(f, "{b}"),
            Self::Null => f.write_str("null"),
            Self::Other(v) => write!(f, "{v}"),
        }
    }
}

/// Keep a present `null` as `Some(ScalarValue::Null)`; only a missing key
/// falls back to `None` through `#[serde(default)]`.
fn present<'de, D>(deserializer: D) -> Result<Option<ScalarValue>, D::Error>
where
    D: Deserializer<'de>,
{
    ScalarValue::deserialize(deserializer).map(Some)
}

// ---- wire schema ----

/// Route record as served by `https://ridewithgps.com/routes/<id>.json`.
#[derive(Debug, Default, Deserialize)]
pub struct RawRoute {
    #[serde(default)]
    pub name: Option<ScalarValue>,
    #[serde(default)]
    pub description: Option<ScalarValue>,
    #[serde(default)]
    pub track_points: Option<Vec<RawTrackPoint>>,
    #[serde(default)]
    pub points_of_interest: Option<Vec<RawPointOfInterest>>,
}

/// Track point with the service's short keys.
#[derive(Debug, Default, Deserialize)]
pub struct RawTrackPoint {
    /// Longitude.
    #[serde(default, deserialize_with = "present")]
    pub x: Option<ScalarValue>,
    /// Latitude.
    #[serde(default, deserialize_with = "present")]
    pub y: Option<ScalarValue>,
    /// Elevation in meters.
    #[serde(default, deserialize_with = "present")]
    pub e: Option<ScalarValue>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawPointOfInterest {
    #[serde(default, deserialize_with = "present")]
    pub lat: Option<ScalarValue>,
    #[serde(default, deserialize_with = "present")]
    pub lng: Option<ScalarValue>,
    #[serde(default)]
    pub name: Option<ScalarValue>,
    #[serde(default)]
    pub description: Option<ScalarValue>,
    #[serde(default)]
    pub poi_type_name: Option<ScalarValue>,
}

// ---- domain ----

/// A route ready for conversion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteData {
    pub name: Option<String>,
    pub description: Option<String>,
    pub track_points: Vec<TrackPoint>,
    pub points_of_interest: Vec<PointOfInterest>,
}

/// One sample of the route path (WGS84 degrees, meters).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackPoint {
    pub longitude: Option<ScalarValue>,
    pub latitude: Option<ScalarValue>,
    pub elevation: Option<ScalarValue>,
}

/// A labelled location off the path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointOfInterest {
    pub latitude: Option<ScalarValue>,
    pub longitude: Option<ScalarValue>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
}

impl From<RawTrackPoint> for TrackPoint {
    fn from(raw: RawTrackPoint) -> Self {
        Self {
            longitude: raw.x,
            latitude: raw.y,
            elevation: raw.e,
        }
    }
}

impl From<RawPointOfInterest> for PointOfInterest {
    fn from(raw: RawPointOfInterest) -> Self {
        Self {
            latitude: raw.lat,
            longitude: raw.lng,
            name: raw.name.and_then(ScalarValue::into_text),
            description: raw.description.and_then(ScalarValue::into_text),
            category: raw.poi_type_name.and_then(ScalarValue::into_text),
        }
    }
}
