//! Export colours from the active CSS theme.

use wasm_bindgen::JsValue;

use footprint_export::{MapColors, parse_css_hex};

/// Errors that can occur while reading theme colours.
#[derive(Debug, thiserror::Error)]
pub enum ThemeError {
    /// A browser API call returned an error or a required object was missing.
    #[error("browser API error: {0}")]
    JsError(String),
}

impl From<JsValue> for ThemeError {
    fn from(value: JsValue) -> Self {
        Self::JsError(format!("{value:?}"))
    }
}

/// Read the map palette from CSS custom properties on the root element:
/// `--map-bg`, `--map-land`, `--map-visited`, `--map-border` and
/// `--map-label`.
///
/// A property that is unset or not a hex colour keeps the
/// [`MapColors::default`] value.
///
/// # Errors
///
/// Returns [`ThemeError::JsError`] if the computed style cannot be read.
pub fn read_map_colors() -> Result<MapColors, ThemeError> {
    let window = web_sys::window().ok_or_else(|| ThemeError::JsError("no global window".into()))?;
    let doc = window
        .document()
        .ok_or_else(|| ThemeError::JsError("no document".into()))?;
    let el = doc
        .document_element()
        .ok_or_else(|| ThemeError::JsError("no document element".into()))?;
    let style = window
        .get_computed_style(&el)?
        .ok_or_else(|| ThemeError::JsError("no computed style".into()))?;

    let read = |property: &str| -> Result<Option<[u8; 3]>, ThemeError> {
        let value = style.get_property_value(property)?;
        let parsed = parse_css_hex(&value);
        if parsed.is_none() && !value.trim().is_empty() {
            tracing::warn!(property, value, "ignoring non-hex theme colour");
        }
        Ok(parsed)
    };

    let defaults = MapColors::default();
    Ok(MapColors {
        background: read("--map-bg")?.or(defaults.background),
        land: read("--map-land")?.unwrap_or(defaults.land),
        visited: read("--map-visited")?.unwrap_or(defaults.visited),
        border: read("--map-border")?.unwrap_or(defaults.border),
        label: read("--map-label")?.unwrap_or(defaults.label),
    })
}
