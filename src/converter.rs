use std::borrow::Cow;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use serde_json::Value;

use crate::error::{Result, RouteGpxError};
use crate::options::ConvertOptions;
use crate::parser::parse_route_value;
use crate::route_types::*;

pub const GPX_NAMESPACE: &str = "http://www.topografix.com/GPX/1/1";
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
pub const GPX_SCHEMA_LOCATION: &str =
    "http://www.topografix.com/GPX/1/1 http://www.topografix.com/GPX/1/1/gpx.xsd";
pub const CREATOR: &str = "RideWithGPS GPX Converter Extension";

/// Display name used when the route has none.
pub const DEFAULT_ROUTE_NAME: &str = "RideWithGPS Route";
/// Category label used for points of interest without a type.
pub const DEFAULT_POI_TYPE: &str = "waypoint";

type XmlWriter = Writer<Vec<u8>>;

/// Convert a route JSON object to a GPX 1.1 document with default options.
pub fn convert(route: &Value) -> Result<String> {
    convert_with_options(route, &ConvertOptions::default())
}

pub fn convert_with_options(route: &Value, opts: &ConvertOptions) -> Result<String> {
    let data = parse_route_value(route)?;
    to_gpx(&data, opts)
}

/// Escape the five XML metacharacters. Absent or empty text yields `""`.
///
/// `&` is replaced before the others, so the entities introduced for `<`,
/// `>`, `"` and `'` are never escaped a second time.
pub fn escape_text(text: Option<&str>) -> Cow<'_, str> {
    match text {
        None | Some("") => Cow::Borrowed(""),
        Some(t) => quick_xml::escape::escape(t),
    }
}

/// Write `route` as a GPX document.
///
/// Track points go into a single `<trk>`/`<trkseg>` and points of interest
/// become `<wpt>` elements after the track, both in input order. Coordinates
/// are written as sent unless `opts.validate_coordinates` is set, in which
/// case the whole route is checked before anything is written.
pub fn to_gpx(route: &RouteData, opts: &ConvertOptions) -> Result<String> {
    if opts.validate_coordinates {
        validate_coordinates(route)?;
    }

    tracing::debug!(
        track_points = route.track_points.len(),
        points_of_interest = route.points_of_interest.len(),
        "Writing GPX document"
    );

    let route_name = escape_text(Some(route.name.as_deref().unwrap_or(DEFAULT_ROUTE_NAME)));

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(BytesStart::new("gpx").with_attributes([
        ("xmlns", GPX_NAMESPACE),
        ("xmlns:xsi", XSI_NAMESPACE),
        ("xsi:schemaLocation", GPX_SCHEMA_LOCATION),
        ("version", "1.1"),
        ("creator", CREATOR),
    ])))?;

    writer.write_event(Event::Start(BytesStart::new("metadata")))?;
    write_text_element(&mut writer, "name", &route_name)?;
    write_text_element(
        &mut writer,
        "desc",
        &escape_text(route.description.as_deref()),
    )?;
    writer.write_event(Event::End(BytesEnd::new("metadata")))?;

    writer.write_event(Event::Start(BytesStart::new("trk")))?;
    write_text_element(&mut writer, "name", &route_name)?;
    writer.write_event(Event::Start(BytesStart::new("trkseg")))?;
    for pt in &route.track_points {
        write_track_point(&mut writer, pt, opts)?;
    }
    writer.write_event(Event::End(BytesEnd::new("trkseg")))?;
    writer.write_event(Event::End(BytesEnd::new("trk")))?;

    for poi in &route.points_of_interest {
        write_waypoint(&mut writer, poi)?;
    }

    writer.write_event(Event::End(BytesEnd::new("gpx")))?;

    Ok(String::from_utf8(writer.into_inner())?)
}

fn write_track_point(writer: &mut XmlWriter, pt: &TrackPoint, opts: &ConvertOptions) -> Result<()> {
    let lat = scalar_text(pt.latitude.as_ref());
    let lon = scalar_text(pt.longitude.as_ref());
    writer.write_event(Event::Start(
        BytesStart::new("trkpt").with_attributes([("lat", lat.as_str()), ("lon", lon.as_str())]),
    ))?;

    match &pt.elevation {
        None | Some(ScalarValue::Null) if opts.validate_coordinates => {}
        ele => {
            let ele = scalar_text(ele.as_ref());
            write_text_element(writer, "ele", &escape_text(Some(ele.as_str())))?;
        }
    }

    writer.write_event(Event::End(BytesEnd::new("trkpt")))?;
    Ok(())
}

fn write_waypoint(writer: &mut XmlWriter, poi: &PointOfInterest) -> Result<()> {
    let lat = scalar_text(poi.latitude.as_ref());
    let lon = scalar_text(poi.longitude.as_ref());
    let category = escape_text(Some(poi.category.as_deref().unwrap_or(DEFAULT_POI_TYPE)));
    let desc = format!("{} ({})", escape_text(poi.description.as_deref()), category);

    writer.write_event(Event::Start(
        BytesStart::new("wpt").with_attributes([("lat", lat.as_str()), ("lon", lon.as_str())]),
    ))?;
    write_text_element(writer, "name", &escape_text(poi.name.as_deref()))?;
    write_text_element(writer, "desc", &desc)?;
    write_text_element(writer, "type", &category)?;
    writer.write_event(Event::End(BytesEnd::new("wpt")))?;
    Ok(())
}

/// Write `<name>escaped</name>`. The content must already be escaped.
fn write_text_element(writer: &mut XmlWriter, name: &str, escaped: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::from_escaped(escaped)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Text written for a coordinate or elevation. An absent key reads as
/// `undefined`, matching what the extension's JavaScript would print.
fn scalar_text(value: Option<&ScalarValue>) -> String {
    value.map_or_else(|| "undefined".to_string(), ToString::to_string)
}

fn validate_coordinates(route: &RouteData) -> Result<()> {
    for (index, pt) in route.track_points.iter().enumerate() {
        check_range("trkpt", index, "lat", pt.latitude.as_ref(), 90.0)?;
        check_range("trkpt", index, "lon", pt.longitude.as_ref(), 180.0)?;
        if let Some(ele) = pt.elevation.as_ref().filter(|e| **e != ScalarValue::Null) {
            if !ele.as_f64().is_some_and(f64::is_finite) {
                return Err(RouteGpxError::InvalidCoordinate {
                    element: "trkpt",
                    index,
                    field: "ele",
                    value: ele.to_string(),
                });
            }
        }
    }

    for (index, poi) in route.points_of_interest.iter().enumerate() {
        check_range("wpt", index, "lat", poi.latitude.as_ref(), 90.0)?;
        check_range("wpt", index, "lon", poi.longitude.as_ref(), 180.0)?;
    }

    Ok(())
}

fn check_range(
    element: &'static str,
    index: usize,
    field: &'static str,
    value: Option<&ScalarValue>,
    limit: f64,
) -> Result<()> {
    match value.and_then(ScalarValue::as_f64) {
        Some(v) if v.is_finite() && v.abs() <= limit => Ok(()),
        _ => Err(RouteGpxError::InvalidCoordinate {
            element,
            index,
            field,
            value: scalar_text(value),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(None, "")]
    #[case(Some(""), "")]
    #[case(Some("plain text"), "plain text")]
    #[case(Some("Fish & Chips"), "Fish &amp; Chips")]
    #[case(Some("<b>"), "&lt;b&gt;")]
    #[case(Some(r#"say "hi""#), "say &quot;hi&quot;")]
    #[case(Some("it's"), "it&apos;s")]
    #[case(Some("&lt;"), "&amp;lt;")]
    fn test_escape_text(#[case] input: Option<&str>, #[case] expected: &str) {
        assert_eq!(escape_text(input), expected);
    }

    #[test]
    fn test_escape_text_borrows_safe_text() {
        assert!(matches!(escape_text(Some("Loop 42")), Cow::Borrowed(_)));
    }

    #[test]
    fn test_minimal_route() {
        let gpx = convert(&json!({
            "name": "Test & Loop",
            "track_points": [{"x": -122.4, "y": 37.7, "e": 10}],
            "points_of_interest": []
        }))
        .unwrap();

        assert!(gpx.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert_eq!(gpx.matches("<name>Test &amp; Loop</name>").count(), 2);
        assert!(gpx.contains(r#"<trkpt lat="37.7" lon="-122.4">"#));
        assert!(gpx.contains("<ele>10</ele>"));
        assert!(!gpx.contains("<wpt"));
        assert!(gpx.trim_end().ends_with("</gpx>"));
    }

    #[test]
    fn test_root_attributes() {
        let gpx = convert(&json!({"track_points": []})).unwrap();
        assert!(gpx.contains(r#"xmlns="http://www.topografix.com/GPX/1/1""#));
        assert!(gpx.contains(r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance""#));
        assert!(gpx.contains(
            r#"xsi:schemaLocation="http://www.topografix.com/GPX/1/1 http://www.topografix.com/GPX/1/1/gpx.xsd""#
        ));
        assert!(gpx.contains(r#"version="1.1""#));
        assert!(gpx.contains(r#"creator="RideWithGPS GPX Converter Extension""#));
    }

    #[test]
    fn test_point_of_interest() {
        let gpx = convert(&json!({
            "track_points": [],
            "points_of_interest": [
                {"lat": 1, "lng": 2, "name": "A", "description": "B", "poi_type_name": "Food"}
            ]
        }))
        .unwrap();

        assert_eq!(gpx.matches("<wpt ").count(), 1);
        assert!(gpx.contains(r#"<wpt lat="1" lon="2">"#));
        assert!(gpx.contains("<name>A</name>"));
        assert!(gpx.contains("<desc>B (Food)</desc>"));
        assert!(gpx.contains("<type>Food</type>"));
    }

    #[test]
    fn test_defaults() {
        let gpx = convert(&json!({
            "track_points": [],
            "points_of_interest": [{"lat": 1, "lng": 2}]
        }))
        .unwrap();

        assert_eq!(gpx.matches("<name>RideWithGPS Route</name>").count(), 2);
        assert!(gpx.contains("<desc></desc>"));
        assert!(gpx.contains("<name></name>"));
        assert!(gpx.contains("<desc> (waypoint)</desc>"));
        assert!(gpx.contains("<type>waypoint</type>"));
    }

    #[test]
    fn test_category_is_escaped() {
        let gpx = convert(&json!({
            "track_points": [],
            "points_of_interest": [{"lat": 1, "lng": 2, "poi_type_name": "Bar & Grill"}]
        }))
        .unwrap();

        assert!(gpx.contains("<type>Bar &amp; Grill</type>"));
        assert!(gpx.contains("<desc> (Bar &amp; Grill)</desc>"));
    }

    #[test]
    fn test_null_and_absent_passthrough() {
        let gpx = convert(&json!({
            "track_points": [{"x": 1, "y": 2, "e": null}, {"x": 1, "y": 2}, {"x": 1, "e": 0}],
            "points_of_interest": [{"lat": null}]
        }))
        .unwrap();

        assert!(gpx.contains("<ele>null</ele>"));
        assert!(gpx.contains("<ele>undefined</ele>"));
        assert!(gpx.contains(r#"<trkpt lat="undefined" lon="1">"#));
        assert!(gpx.contains(r#"<wpt lat="null" lon="undefined">"#));
        assert!(!gpx.contains("<ele></ele>"));
    }

    #[test]
    fn test_non_scalar_values_passthrough() {
        let gpx = convert(&json!({
            "track_points": [{"x": [1, 2], "y": 2, "e": {"v": 3}}]
        }))
        .unwrap();

        assert!(gpx.contains(r#"lon="[1,2]""#));
        assert!(gpx.contains("<ele>{&quot;v&quot;:3}</ele>"));
    }

    #[test]
    fn test_string_coordinates_passthrough() {
        let gpx = convert(&json!({"track_points": [{"x": "1.5\"", "y": "abc", "e": "<high>"}]}))
            .unwrap();
        assert!(gpx.contains(r#"lat="abc""#));
        assert!(gpx.contains(r#"lon="1.5&quot;""#));
        assert!(gpx.contains("<ele>&lt;high&gt;</ele>"));
    }

    #[test]
    fn test_track_point_order() {
        let gpx = convert(&json!({
            "track_points": [
                {"x": 3, "y": 30, "e": 0},
                {"x": 1, "y": 10, "e": 0},
                {"x": 2, "y": 20, "e": 0}
            ]
        }))
        .unwrap();

        let first = gpx.find(r#"lat="30""#).unwrap();
        let second = gpx.find(r#"lat="10""#).unwrap();
        let third = gpx.find(r#"lat="20""#).unwrap();
        assert!(first < second && second < third);
    }

    #[test]
    fn test_waypoints_follow_track() {
        let gpx = convert(&json!({
            "track_points": [{"x": 1, "y": 2, "e": 3}],
            "points_of_interest": [{"lat": 1, "lng": 2}]
        }))
        .unwrap();
        assert!(gpx.find("</trk>").unwrap() < gpx.find("<wpt").unwrap());
    }

    #[test]
    fn test_missing_track_points_error() {
        let err = convert(&json!({"name": "x"})).unwrap_err();
        assert!(matches!(err, RouteGpxError::InvalidInput { .. }));
        assert!(convert(&Value::Null).is_err());
    }

    // ---- coordinate validation ----

    fn strict() -> ConvertOptions {
        ConvertOptions {
            validate_coordinates: true,
        }
    }

    #[test]
    fn test_validation_accepts_good_route() {
        let gpx = convert_with_options(
            &json!({
                "track_points": [{"x": -122.4, "y": 37.7, "e": 10}, {"x": 180, "y": -90}],
                "points_of_interest": [{"lat": 1, "lng": 2}]
            }),
            &strict(),
        )
        .unwrap();

        // second point has no elevation and gets no <ele>
        assert_eq!(gpx.matches("<ele>").count(), 1);
    }

    #[test]
    fn test_validation_omits_null_elevation() {
        let gpx = convert_with_options(
            &json!({"track_points": [{"x": 1, "y": 2, "e": null}]}),
            &strict(),
        )
        .unwrap();
        assert!(!gpx.contains("<ele>"));
    }

    #[rstest]
    #[case(json!({"x": 0, "y": 91, "e": 0}), "lat")]
    #[case(json!({"x": -180.5, "y": 0, "e": 0}), "lon")]
    #[case(json!({"x": "1", "y": 0, "e": 0}), "lon")]
    #[case(json!({"y": 0, "e": 0}), "lon")]
    #[case(json!({"x": 0, "y": 0, "e": "high"}), "ele")]
    fn test_validation_rejects_track_point(#[case] point: Value, #[case] bad_field: &str) {
        let route = json!({"track_points": [{"x": 0, "y": 0}, point]});
        match convert_with_options(&route, &strict()) {
            Err(RouteGpxError::InvalidCoordinate {
                element,
                index,
                field,
                ..
            }) => {
                assert_eq!(element, "trkpt");
                assert_eq!(index, 1);
                assert_eq!(field, bad_field);
            }
            other => panic!("Expected InvalidCoordinate, got {other:?}"),
        }
    }

    #[test]
    fn test_validation_rejects_waypoint() {
        let route = json!({
            "track_points": [],
            "points_of_interest": [{"lat": 1, "lng": 2}, {"lat": "north", "lng": 2}]
        });
        let err = convert_with_options(&route, &strict()).unwrap_err();
        assert_eq!(err.to_string(), "Invalid value 'north' for lat of wpt #1");
    }
}
