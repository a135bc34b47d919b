use serde::Deserialize;
use serde_json::{Map, Value};
use wasm_bindgen::JsValue;

use crate::error::{Result, RouteGpxError};
use crate::route_types::*;

/// Read route data from a parsed JSON value.
///
/// The route and each entry of `track_points` and `points_of_interest` must
/// be JSON objects; serde would otherwise fill their fields from an array by
/// position.
pub fn parse_route_value(value: &Value) -> Result<RouteData> {
    let fields = match value {
        Value::Object(fields) => fields,
        Value::Null => return Err(RouteGpxError::missing_route_data()),
        _ => return Err(RouteGpxError::route_not_object()),
    };
    require_objects(fields, "track_points", "track point")?;
    require_objects(fields, "points_of_interest", "point of interest")?;

    let raw = RawRoute::deserialize(value)?;
    route_from_raw(raw)
}

/// Read route data from JSON text.
pub fn parse_route_json(json: &str) -> Result<RouteData> {
    let value: Value = serde_json::from_str(json)?;
    parse_route_value(&value)
}

/// Read route data from a JS object handed over by the extension.
pub fn parse_route_js(value: JsValue) -> Result<RouteData> {
    if value.is_undefined() || value.is_null() {
        return Err(RouteGpxError::missing_route_data());
    }
    let value: Value = serde_wasm_bindgen::from_value(value)?;
    parse_route_value(&value)
}

fn require_objects(fields: &Map<String, Value>, key: &str, what: &str) -> Result<()> {
    if let Some(Value::Array(items)) = fields.get(key) {
        if let Some(index) = items.iter().position(|item| !item.is_object()) {
            return Err(RouteGpxError::Malformed(format!(
                "{what} #{index} is not an object"
            )));
        }
    }
    Ok(())
}

/// Map the service schema onto the domain types.
///
/// `track_points` is the only required key; a missing or null array is
/// rejected while an empty one is accepted.
fn route_from_raw(raw: RawRoute) -> Result<RouteData> {
    let track_points = raw
        .track_points
        .ok_or_else(RouteGpxError::missing_track_points)?;

    Ok(RouteData {
        name: raw.name.and_then(ScalarValue::into_text),
        description: raw.description.and_then(ScalarValue::into_text),
        track_points: track_points.into_iter().map(TrackPoint::from).collect(),
        points_of_interest: raw
            .points_of_interest
            .unwrap_or_default()
            .into_iter()
            .map(PointOfInterest::from)
            .collect(),
    })
}
