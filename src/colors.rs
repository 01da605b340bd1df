use regex_lite::Regex;
use static_init::dynamic;

use crate::constants::DIET_COLOR_SWATCHES;

#[dynamic]
static HEX_RE: Regex = Regex::new(r"^#([0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").unwrap();
#[dynamic]
static RGB_RE: Regex = Regex::new(r"^(?i)rgba?\(([^)]+)\)$").unwrap();

pub fn is_hex_color(txt: &str) -> bool {
    HEX_RE.is_match(txt.trim())
}

/// CSS background for a row tinted with `color`. Accepts `#rgb`, `#rrggbb`,
/// `rgb(..)` and `rgba(..)`; anything else yields `None`.
pub fn to_rgba(color: &str, alpha: f64) -> Option<String> {
    let color = color.trim();
    if color.is_empty() {
        return None;
    }

    if let Some(caps) = HEX_RE.captures(color) {
        let mut hex = caps.get(1)?.as_str().to_string();
        if hex.len() == 3 {
            hex = hex.chars().flat_map(|c| [c, c]).collect();
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        return Some(format!("rgba({}, {}, {}, {})", r, g, b, alpha));
    }

    if let Some(caps) = RGB_RE.captures(color) {
        let parts: Vec<&str> = caps.get(1)?.as_str().split(',').map(|p| p.trim()).collect();
        let part = |i: usize| parts.get(i).copied().filter(|p| !p.is_empty()).unwrap_or("0");
        return Some(format!("rgba({}, {}, {}, {})", part(0), part(1), part(2), alpha));
    }

    None
}

/// Resolves a palette slot (`1` to `6`) to its hex color; anything else is
/// returned as given.
pub fn swatch(txt: &str) -> &str {
    match txt.trim().parse::<usize>() {
        Ok(slot) if (1..=DIET_COLOR_SWATCHES.len()).contains(&slot) => DIET_COLOR_SWATCHES[slot - 1],
        _ => txt,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors() {
        assert_eq!(
            to_rgba("#971d1f", 0.5).as_deref(),
            Some("rgba(151, 29, 31, 0.5)")
        );
        assert_eq!(to_rgba("#fff", 0.5).as_deref(), Some("rgba(255, 255, 255, 0.5)"));
        assert!(is_hex_color("#ABCDEF"));
        assert!(!is_hex_color("#abcd"));
    }

    #[test]
    fn rgb_colors_keep_channels() {
        assert_eq!(
            to_rgba("rgb(1, 2, 3)", 0.5).as_deref(),
            Some("rgba(1, 2, 3, 0.5)")
        );
        assert_eq!(
            to_rgba("RGBA(10,20,30,0.9)", 0.25).as_deref(),
            Some("rgba(10, 20, 30, 0.25)")
        );
    }

    #[test]
    fn palette_slots() {
        assert_eq!(swatch("1"), "#971d1f");
        assert_eq!(swatch("6"), "#375875");
        assert_eq!(swatch("7"), "7");
        assert_eq!(swatch("#123456"), "#123456");
    }

    #[test]
    fn unknown_colors_have_no_background() {
        assert_eq!(to_rgba("", 0.5), None);
        assert_eq!(to_rgba("tomato", 0.5), None);
    }
}
