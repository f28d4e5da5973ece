//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color,
//! plus the per-session colour table figures are painted with.

use crate::figure::PieceKind;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// One Dark piece colours, in piece-code order (O, I, L, J, Z, S, T).
const ONEDARK_PIECES: [(Color, &str); 7] = [
    (Color::Rgb(0xE5, 0xC0, 0x7B), "Yellow"),
    (Color::Rgb(0x56, 0xB6, 0xC2), "Cyan"),
    (Color::Rgb(0xD1, 0x9A, 0x66), "Orange"),
    (Color::Rgb(0x61, 0xAF, 0xEF), "Blue"),
    (Color::Rgb(0xE0, 0x6C, 0x75), "Red"),
    (Color::Rgb(0x98, 0xC3, 0x79), "Green"),
    (Color::Rgb(0xC6, 0x78, 0xDD), "Magenta"),
];

const HIGH_CONTRAST_PIECES: [Color; 7] = [
    Color::Rgb(0xFF, 0xFF, 0x00),
    Color::Rgb(0x00, 0xFF, 0xFF),
    Color::Rgb(0xFF, 0x88, 0x00),
    Color::Rgb(0x00, 0x88, 0xFF),
    Color::Rgb(0xFF, 0x00, 0x00),
    Color::Rgb(0x00, 0xFF, 0x00),
    Color::Rgb(0xFF, 0x00, 0xFF),
];

// Paul Tol's bright/vibrant sets; no red/green pair carries meaning alone.
const COLORBLIND_PIECES: [Color; 7] = [
    Color::Rgb(0xBB, 0xBB, 0x00),
    Color::Rgb(0x33, 0xBB, 0xEE),
    Color::Rgb(0xEE, 0x77, 0x33),
    Color::Rgb(0x00, 0x77, 0xBB),
    Color::Rgb(0xCC, 0x33, 0x11),
    Color::Rgb(0x00, 0x99, 0x88),
    Color::Rgb(0xEE, 0x33, 0x77),
];

/// Colours for the board chrome and the default piece palette.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Piece colours indexed by piece code.
    pub pieces: [Color; 7],
    /// Board background.
    pub bg: Color,
    /// Grid / border.
    pub div_line: Color,
    /// Text (score, speed).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    /// Secondary text (hints, empty table rows).
    pub inactive_fg: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("cannot read theme file: {0}")]
    Io(#[from] std::io::Error),
    #[error("`{0}` is not a hex colour")]
    InvalidHex(String),
    #[error("invalid colour override `{0}` (expected KIND=#RRGGBB, e.g. T=#AA00FF)")]
    InvalidOverride(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::onedark_default()
    }
}

impl Theme {
    pub fn onedark_default() -> Self {
        Self {
            pieces: ONEDARK_PIECES.map(|(c, _)| c),
            bg: Color::Rgb(0x28, 0x2C, 0x34),
            div_line: Color::Rgb(0x3F, 0x44, 0x4F),
            main_fg: Color::Rgb(0xAB, 0xB2, 0xBF),
            title: Color::Rgb(0xE5, 0xC0, 0x7B),
            inactive_fg: Color::Rgb(0x5C, 0x63, 0x70),
        }
    }

    /// Read a btop-style theme file (`theme[key]="value"`), then apply `palette`.
    /// No path, or a path that does not exist, gives One Dark.
    pub fn load(path: Option<&Path>, palette: crate::Palette) -> Result<Self, ThemeError> {
        let mut theme = match path.filter(|p| p.exists()) {
            Some(p) => Self::from_map(&parse_theme_file(&std::fs::read_to_string(p)?)),
            None => Self::onedark_default(),
        };
        theme.apply_palette(palette);
        Ok(theme)
    }

    pub fn apply_palette(&mut self, palette: crate::Palette) {
        match palette {
            crate::Palette::Normal => {}
            crate::Palette::HighContrast => {
                self.pieces = HIGH_CONTRAST_PIECES;
                self.bg = Color::Black;
            }
            crate::Palette::Colorblind => self.pieces = COLORBLIND_PIECES,
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| map.get(key).and_then(|v| parse_hex(v).ok());
        let defaults = Self::onedark_default();
        // piece_* keys win; otherwise borrow the btop keys that carry the same hue.
        let fallbacks: [&[&str]; 7] = [
            &["piece_o", "title", "cpu_mid"],
            &["piece_i", "hi_fg", "proc_misc"],
            &["piece_l", "temp_mid"],
            &["piece_j", "cpu_box"],
            &["piece_z", "cpu_end", "temp_end"],
            &["piece_s", "mem_box", "cpu_start"],
            &["piece_t", "net_box"],
        ];
        let mut pieces = defaults.pieces;
        for (slot, keys) in pieces.iter_mut().zip(fallbacks) {
            if let Some(c) = keys.iter().find_map(|&k| get(k)) {
                *slot = c;
            }
        }
        Self {
            pieces,
            bg: get("main_bg").or_else(|| get("meter_bg")).unwrap_or(defaults.bg),
            div_line: get("div_line").unwrap_or(defaults.div_line),
            main_fg: get("main_fg").unwrap_or(defaults.main_fg),
            title: get("title").unwrap_or(defaults.title),
            inactive_fg: get("inactive_fg").unwrap_or(defaults.inactive_fg),
        }
    }
}

/// A palette slot: colour plus the name shown in the preferences panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedColor {
    pub color: Color,
    pub name: String,
}

/// Per-session colour slots, one per piece kind. Locked cells keep their slot
/// index, so remapping a slot repaints every figure of that kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorTable {
    slots: Vec<NamedColor>,
}

impl Default for ColorTable {
    fn default() -> Self {
        Self::from_theme(&Theme::default())
    }
}

impl ColorTable {
    pub fn from_theme(theme: &Theme) -> Self {
        let slots = theme
            .pieces
            .iter()
            .zip(ONEDARK_PIECES)
            .map(|(&color, (default, name))| NamedColor {
                color,
                name: if color == default {
                    name.to_string()
                } else {
                    hex_name(color)
                },
            })
            .collect();
        Self { slots }
    }

    /// Replace slot `index`. Out-of-range indices are ignored.
    pub fn set(&mut self, index: u8, color: Color, name: impl Into<String>) {
        if let Some(slot) = self.slots.get_mut(usize::from(index)) {
            *slot = NamedColor {
                color,
                name: name.into(),
            };
        }
    }

    pub fn color(&self, index: u8) -> Color {
        self.slots
            .get(usize::from(index))
            .map_or(Color::Gray, |s| s.color)
    }

    pub fn name(&self, index: u8) -> &str {
        self.slots
            .get(usize::from(index))
            .map_or("?", |s| s.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &NamedColor> {
        self.slots.iter()
    }

    /// Built-in colours the preferences panel cycles through.
    pub fn presets() -> impl Iterator<Item = (Color, &'static str)> {
        ONEDARK_PIECES.into_iter()
    }
}

/// `#RRGGBB` label for colours that have no preset name.
pub fn hex_name(color: Color) -> String {
    match color {
        Color::Rgb(r, g, b) => format!("#{r:02X}{g:02X}{b:02X}"),
        other => format!("{other:?}"),
    }
}

/// Parse a `KIND=#RRGGBB` command-line colour override.
pub fn parse_color_override(s: &str) -> Result<(PieceKind, Color), ThemeError> {
    let invalid = || ThemeError::InvalidOverride(s.to_string());
    let (kind, hex) = s.split_once('=').ok_or_else(invalid)?;
    let kind = PieceKind::ALL
        .into_iter()
        .find(|k| k.name().eq_ignore_ascii_case(kind.trim()))
        .ok_or_else(invalid)?;
    let color = parse_hex(hex).map_err(|_| invalid())?;
    Ok((kind, color))
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    s.lines()
        .map(str::trim)
        .filter(|l| !l.starts_with('#'))
        .filter_map(|l| {
            let (key, value) = l.strip_prefix("theme[")?.split_once(']')?;
            let value = value.trim().strip_prefix('=')?.trim();
            let value = value.trim_matches(|c| c == '"' || c == '\'');
            (!value.is_empty()).then(|| (key.trim().to_string(), value.to_string()))
        })
        .collect()
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let channel = |range: std::ops::Range<usize>| {
        s.get(range)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .ok_or_else(|| ThemeError::InvalidHex(s.to_string()))
    };
    let (r, g, b) = match s.len() {
        6 => (channel(0..2)?, channel(2..4)?, channel(4..6)?),
        3 => (
            channel(0..1)? * 17,
            channel(1..2)? * 17,
            channel(2..3)? * 17,
        ),
        _ => return Err(ThemeError::InvalidHex(s.to_string())),
    };
    Ok(Color::Rgb(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_long_and_short() {
        assert_eq!(parse_hex("#98C379").unwrap(), Color::Rgb(0x98, 0xC3, 0x79));
        assert_eq!(parse_hex(" #0F8 ").unwrap(), Color::Rgb(0x00, 0xFF, 0x88));
    }

    #[test]
    fn test_parse_hex_rejects_garbage() {
        assert!(parse_hex("#12345").is_err());
        assert!(parse_hex("#GGGGGG").is_err());
    }

    #[test]
    fn test_theme_file_skips_comments_and_empty_values() {
        let map = parse_theme_file("# comment\ntheme[bg] = \"#101010\"\ntheme[title]=\"\"\nnoise");
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("bg").map(String::as_str), Some("#101010"));
    }

    #[test]
    fn test_piece_keys_override_btop_keys() {
        let map = parse_theme_file(
            "theme[net_box]=\"#112233\"\ntheme[piece_t]='#445566'\ntheme[cpu_box]=\"#010203\"",
        );
        let theme = Theme::from_map(&map);
        assert_eq!(theme.pieces[PieceKind::T.code() as usize], Color::Rgb(0x44, 0x55, 0x66));
        assert_eq!(theme.pieces[PieceKind::J.code() as usize], Color::Rgb(1, 2, 3));
    }

    #[test]
    fn test_color_table_set() {
        let mut table = ColorTable::default();
        assert_eq!(table.name(PieceKind::S.color_index()), "Green");
        table.set(5, Color::Rgb(1, 1, 1), "Ink");
        assert_eq!(table.color(5), Color::Rgb(1, 1, 1));
        assert_eq!(table.name(5), "Ink");
        table.set(40, Color::Red, "ignored");
        assert_eq!(table.iter().count(), 7);
        assert_eq!(table.name(40), "?");
    }

    #[test]
    fn test_palette_renames_changed_slots() {
        let mut theme = Theme::default();
        theme.apply_palette(crate::Palette::HighContrast);
        let table = ColorTable::from_theme(&theme);
        assert_eq!(table.name(0), "#FFFF00");
    }

    #[test]
    fn test_parse_color_override() {
        let (kind, color) = parse_color_override("t=#AA00FF").unwrap();
        assert_eq!(kind, PieceKind::T);
        assert_eq!(color, Color::Rgb(0xAA, 0x00, 0xFF));
        assert!(parse_color_override("X=#AA00FF").is_err());
        assert!(parse_color_override("T#AA00FF").is_err());
    }
}
