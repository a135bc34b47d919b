pub mod converter;
pub mod error;
pub mod file_name;
pub mod options;
pub mod parser;
pub mod route_types;

use wasm_bindgen::prelude::*;

use crate::error::RouteGpxError;
use crate::options::ConvertOptions;

pub use crate::converter::{convert, convert_with_options, escape_text, to_gpx};
pub use crate::route_types::{PointOfInterest, RouteData, TrackPoint};

/// Convert a RideWithGPS route object to a GPX document string.
#[wasm_bindgen(js_name = convertToGpx)]
pub fn convert_to_gpx(route_data: JsValue, options: JsValue) -> Result<String, JsValue> {
    console_error_panic_hook::set_once();

    let opts = parse_options(options)?;
    let route = parser::parse_route_js(route_data).map_err(log_failure)?;
    converter::to_gpx(&route, &opts)
        .map_err(log_failure)
        .map_err(JsValue::from)
}

/// Convert RideWithGPS route JSON text to a GPX document string.
#[wasm_bindgen(js_name = convertJsonToGpx)]
pub fn convert_json_to_gpx(json: &str, options: JsValue) -> Result<String, JsValue> {
    console_error_panic_hook::set_once();

    let opts = parse_options(options)?;
    let route = parser::parse_route_json(json).map_err(log_failure)?;
    converter::to_gpx(&route, &opts)
        .map_err(log_failure)
        .map_err(JsValue::from)
}

/// Escape XML metacharacters in `text`.
#[wasm_bindgen(js_name = escapeXml)]
pub fn escape_xml(text: Option<String>) -> String {
    escape_text(text.as_deref()).into_owned()
}

/// File name for the download, falling back to a timestamped name.
#[wasm_bindgen(js_name = gpxFileName)]
pub fn gpx_file_name(route_name: Option<String>) -> String {
    // Date.now() is a whole number of milliseconds.
    let now = js_sys::Date::now() as u64;
    file_name::suggested_file_name(route_name.as_deref(), now)
}

#[wasm_bindgen(js_name = routeIdFromUrl)]
pub fn route_id_from_url(url: &str) -> Option<String> {
    file_name::route_id_from_url(url).map(str::to_string)
}

#[wasm_bindgen(js_name = routeJsonUrl)]
pub fn route_json_url(route_id: &str) -> String {
    file_name::route_json_url(route_id)
}

/// Route `tracing` output to the browser console.
///
/// `level` is one of `TRACE`, `DEBUG`, `INFO`, `WARN`, `ERROR`; anything
/// else uses `DEBUG` in debug builds and `INFO` in release builds.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging(level: Option<String>) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_wasm::WASMLayerConfigBuilder;

    let default_level = if cfg!(debug_assertions) {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let max_level = match level.as_deref().map(str::to_uppercase).as_deref() {
        Some("TRACE") => tracing::Level::TRACE,
        Some("DEBUG") => tracing::Level::DEBUG,
        Some("INFO") => tracing::Level::INFO,
        Some("WARN") => tracing::Level::WARN,
        Some("ERROR") => tracing::Level::ERROR,
        _ => default_level,
    };

    let mut builder = WASMLayerConfigBuilder::new();
    builder.set_max_level(max_level);
    // A second call keeps the subscriber that is already installed.
    let _ = tracing_subscriber::registry()
        .with(tracing_wasm::WASMLayer::new(builder.build()))
        .try_init();
    console_error_panic_hook::set_once();
}

fn parse_options(options: JsValue) -> Result<ConvertOptions, JsValue> {
    if options.is_undefined() || options.is_null() {
        Ok(ConvertOptions::default())
    } else {
        serde_wasm_bindgen::from_value(options).map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

fn log_failure(e: RouteGpxError) -> RouteGpxError {
    tracing::error!("Error converting route to GPX: {e}");
    e
}
