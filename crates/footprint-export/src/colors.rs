//! Export palette.
//!
//! The browser reads these from CSS custom properties so exports match
//! the active theme; the CLI uses [`MapColors::default`].

/// An sRGB colour without alpha.
pub type Rgb = [u8; 3];

/// Colours used when drawing a map into a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapColors {
    /// Canvas fill behind the shapes. `None` leaves the PNG transparent
    /// and omits the SVG background rectangle.
    pub background: Option<Rgb>,
    /// Fill for regions not yet visited.
    pub land: Rgb,
    /// Fill for visited regions.
    pub visited: Rgb,
    /// Region outline.
    pub border: Rgb,
    /// Label text.
    pub label: Rgb,
}

impl Default for MapColors {
    fn default() -> Self {
        Self {
            background: Some([0xff, 0xff, 0xff]),
            land: [0xd9, 0xd9, 0xd9],
            visited: [0x2e, 0x8b, 0x57],
            border: [0x8a, 0x8a, 0x8a],
            label: [0x1a, 0x1a, 0x1a],
        }
    }
}

/// Parse a CSS hex colour (`#rgb` or `#rrggbb`) into an RGB triple.
///
/// Surrounding whitespace is ignored, since `getPropertyValue` keeps the
/// space after the colon in a custom property declaration.
#[must_use]
pub fn parse_css_hex(s: &str) -> Option<Rgb> {
    let hex = s.trim().strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    match hex.len() {
        3 => {
            let mut rgb = [0u8; 3];
            for (slot, digit) in rgb.iter_mut().zip(hex.chars()) {
                let v = u8::try_from(digit.to_digit(16)?).ok()?;
                *slot = v * 17;
            }
            Some(rgb)
        }
        6 => Some([
            u8::from_str_radix(&hex[0..2], 16).ok()?,
            u8::from_str_radix(&hex[2..4], 16).ok()?,
            u8::from_str_radix(&hex[4..6], 16).ok()?,
        ]),
        _ => None,
    }
}

/// Format an RGB triple as `#rrggbb`.
#[must_use]
pub fn css_hex(rgb: Rgb) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb[0], rgb[1], rgb[2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_long_and_short_forms() {
        assert_eq!(parse_css_hex("#2e8b57"), Some([0x2e, 0x8b, 0x57]));
        assert_eq!(parse_css_hex(" #FFF "), Some([255, 255, 255]));
        assert_eq!(parse_css_hex("#0a0"), Some([0, 0xaa, 0]));
    }

    #[test]
    fn rejects_other_syntax() {
        assert_eq!(parse_css_hex("2e8b57"), None);
        assert_eq!(parse_css_hex("#2e8b5"), None);
        assert_eq!(parse_css_hex("#ggg"), None);
        assert_eq!(parse_css_hex("rgb(1, 2, 3)"), None);
        assert_eq!(parse_css_hex("#éé"), None);
    }

    #[test]
    fn hex_formatting_round_trips() {
        let c = [0x01, 0xab, 0xff];
        assert_eq!(css_hex(c), "#01abff");
        assert_eq!(parse_css_hex(&css_hex(c)), Some(c));
    }
}
