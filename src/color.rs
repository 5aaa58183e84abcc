//! Hex color helpers for squad rows.

/// A fixed squad color with the text color it is paired with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteColor {
    pub name: &'static str,
    pub value: &'static str,
    pub text_color: &'static str,
}

/// Preset squad colors. A custom hex entry is offered separately by the color picker.
pub static PALETTE: [PaletteColor; 7] = [
    PaletteColor {
        name: "Blue",
        value: "#3498db",
        text_color: "#ffffff",
    },
    PaletteColor {
        name: "Red",
        value: "#e74c3c",
        text_color: "#ffffff",
    },
    PaletteColor {
        name: "Green",
        value: "#2ecc71",
        text_color: "#ffffff",
    },
    PaletteColor {
        name: "Yellow",
        value: "#f1c40f",
        text_color: "#000000",
    },
    PaletteColor {
        name: "Purple",
        value: "#9b59b6",
        text_color: "#ffffff",
    },
    PaletteColor {
        name: "Orange",
        value: "#e67e22",
        text_color: "#ffffff",
    },
    PaletteColor {
        name: "Turquoise",
        value: "#1abc9c",
        text_color: "#ffffff",
    },
];

pub const WHITE: &str = "#ffffff";
pub const BLACK: &str = "#000000";

/// Parse `#rrggbb`, `rrggbb` or the 3-digit shorthand into RGB channels.
pub fn parse_hex(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.trim().strip_prefix('#').unwrap_or(color.trim());
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let expanded: String = match hex.len() {
        3 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 => hex.to_string(),
        _ => return None,
    };

    let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

/// Whether `color` is a `#`-prefixed 3- or 6-digit hex color.
pub fn is_hex_color(color: &str) -> bool {
    color.starts_with('#') && parse_hex(color).is_some()
}

/// Strict `#RRGGBB` check used for custom color input.
pub fn is_custom_hex(input: &str) -> bool {
    input.len() == 7 && input.starts_with('#') && input[1..].chars().all(|c| c.is_ascii_hexdigit())
}

fn to_hex(r: u8, g: u8, b: u8) -> String {
    format!("#{:02x}{:02x}{:02x}", r, g, b)
}

/// Lighten each channel by `round(2.55 * percentage)`, clamped to `[0, 255]`.
///
/// Unparsable input yields white.
pub fn lighten(color: &str, percentage: f64) -> String {
    let Some((r, g, b)) = parse_hex(color) else {
        return WHITE.to_string();
    };

    let amount = (2.55 * percentage).round() as i32;
    let shift = |channel: u8| (i32::from(channel) + amount).clamp(0, 255) as u8;
    to_hex(shift(r), shift(g), shift(b))
}

/// Black text on light backgrounds, white text on dark ones.
///
/// Unparsable input yields black.
pub fn contrast_of(color: &str) -> String {
    let Some((r, g, b)) = parse_hex(color) else {
        return BLACK.to_string();
    };

    let luminance =
        (0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b)) / 255.0;
    if luminance > 0.5 {
        BLACK.to_string()
    } else {
        WHITE.to_string()
    }
}

/// Palette entry for the n-th new squad, cycling through the presets.
pub fn palette_for_index(index: usize) -> &'static PaletteColor {
    &PALETTE[index % PALETTE.len()]
}
