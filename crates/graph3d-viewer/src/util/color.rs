use bevy::color::{Color, Srgba};

/// Parses `#rrggbb`/`#rgb` (with or without `#`), falling back when the
/// string is not a color.
pub fn parse_or(hex: Option<&str>, fallback: Color) -> Color {
    hex.and_then(|s| Srgba::hex(s.trim()).ok())
        .map(Color::from)
        .unwrap_or(fallback)
}

/// Stable material cache key.
pub fn color_key(c: Color) -> String {
    c.to_srgba().to_hex()
}
