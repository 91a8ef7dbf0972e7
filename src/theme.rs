//! Theme loading: `key = #RRGGBB` lines → ratatui colours for tiles and chrome.

use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Built-in tile faces, one per kind; kinds beyond this wrap around.
const TILE_PALETTE: [Color; 14] = [
    Color::Rgb(0xE0, 0x6C, 0x75),
    Color::Rgb(0x98, 0xC3, 0x79),
    Color::Rgb(0xE5, 0xC0, 0x7B),
    Color::Rgb(0x61, 0xAF, 0xEF),
    Color::Rgb(0xC6, 0x78, 0xDD),
    Color::Rgb(0x56, 0xB6, 0xC2),
    Color::Rgb(0xD1, 0x9A, 0x66),
    Color::Rgb(0xBE, 0x50, 0x46),
    Color::Rgb(0x7E, 0xC8, 0x9B),
    Color::Rgb(0xF2, 0xA3, 0xC7),
    Color::Rgb(0x9D, 0xA5, 0xF4),
    Color::Rgb(0xFF, 0xD7, 0x00),
    Color::Rgb(0x4E, 0xCC, 0xA3),
    Color::Rgb(0xB0, 0xB8, 0xC4),
];

#[derive(Debug, Clone)]
pub struct Theme {
    /// Face colour per tile kind.
    pub tiles: Vec<Color>,
    /// Board background.
    pub bg: Color,
    /// Borders and dividers.
    pub div_line: Color,
    /// Text (score, labels).
    pub main_fg: Color,
    /// Titles and highlights.
    pub title: Color,
    /// Face of a covered tile.
    pub covered: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            tiles: TILE_PALETTE.to_vec(),
            bg: Color::Rgb(0x28, 0x2C, 0x34),
            div_line: Color::Rgb(0x3F, 0x44, 0x4F),
            main_fg: Color::Rgb(0xAB, 0xB2, 0xBF),
            title: Color::Rgb(0x4E, 0xCC, 0xA3),
            covered: Color::Rgb(0x5C, 0x63, 0x70),
        }
    }
}

impl Theme {
    /// Load a theme file and apply `palette`. No path means the built-in theme.
    pub fn load(path: Option<&Path>, palette: crate::Palette) -> Result<Self, ThemeError> {
        let Some(path) = path else {
            return Ok(Self::default_for_palette(palette));
        };
        let map = parse_theme_file(&std::fs::read_to_string(path)?);
        let mut theme = Self::from_map(&map)?;
        theme.apply_palette(palette);
        Ok(theme)
    }

    pub fn default_for_palette(palette: crate::Palette) -> Self {
        let mut t = Self::default();
        t.apply_palette(palette);
        t
    }

    /// Replace tile faces for high-contrast or colorblind play. Chrome colours are kept.
    pub fn apply_palette(&mut self, palette: crate::Palette) {
        match palette {
            crate::Palette::Normal => {}
            crate::Palette::HighContrast => {
                self.tiles = vec![
                    Color::Red,
                    Color::Green,
                    Color::Yellow,
                    Color::Blue,
                    Color::Magenta,
                    Color::Cyan,
                    Color::White,
                    Color::LightRed,
                    Color::LightGreen,
                    Color::LightYellow,
                    Color::LightBlue,
                    Color::LightMagenta,
                    Color::LightCyan,
                    Color::Gray,
                ];
                self.covered = Color::DarkGray;
            }
            crate::Palette::Colorblind => {
                // Paul Tol's muted scheme, safe for the common colour-vision deficiencies.
                self.tiles = [
                    "#332288", "#88CCEE", "#44AA99", "#117733", "#999933", "#DDCC77", "#CC6677",
                    "#882255", "#AA4499", "#0077BB", "#EE7733", "#009988", "#EE3377", "#BBBBBB",
                ]
                .iter()
                .filter_map(|h| parse_hex(h).ok())
                .collect();
            }
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Result<Self, ThemeError> {
        let mut theme = Self::default();
        for (key, value) in map {
            let color = parse_hex(value)?;
            match key.as_str() {
                "bg" => theme.bg = color,
                "border" => theme.div_line = color,
                "fg" => theme.main_fg = color,
                "title" => theme.title = color,
                "covered" => theme.covered = color,
                other => {
                    // tile_1 .. tile_N, one-based like the catalog shown to players.
                    let slot = other
                        .strip_prefix("tile_")
                        .and_then(|n| n.parse::<usize>().ok())
                        .and_then(|n| n.checked_sub(1));
                    match slot {
                        Some(i) if i < theme.tiles.len() => theme.tiles[i] = color,
                        _ => log::warn!("unknown theme key {}", other),
                    }
                }
            }
        }
        Ok(theme)
    }

    /// Face colour for a tile kind.
    #[inline]
    pub fn tile_color(&self, kind: u8) -> Color {
        self.tiles
            .get(kind as usize % self.tiles.len().max(1))
            .copied()
            .unwrap_or(self.main_fg)
    }
}

/// `key = value` per line; blank lines and lines starting with `;` or `//` are skipped.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    s.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with(';') && !l.starts_with("//"))
        .filter_map(|l| l.split_once('='))
        .map(|(k, v)| {
            let v = v.trim().trim_matches('"').trim_matches('\'');
            (k.trim().to_string(), v.to_string())
        })
        .filter(|(k, v)| !k.is_empty() && !v.is_empty())
        .collect()
}

/// Parse "#RRGGBB" or "#RGB".
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let hex = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.to_string());
    let channel = |range: std::ops::Range<usize>, scale: u8| {
        hex.get(range)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .map(|v| v * scale)
            .ok_or_else(invalid)
    };
    match hex.len() {
        6 => Ok(Color::Rgb(channel(0..2, 1)?, channel(2..4, 1)?, channel(4..6, 1)?)),
        3 => Ok(Color::Rgb(channel(0..1, 17)?, channel(1..2, 17)?, channel(2..3, 17)?)),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hex_long_and_short() {
        assert_eq!(parse_hex("#98C379").unwrap(), Color::Rgb(0x98, 0xC3, 0x79));
        assert_eq!(parse_hex("#FFF").unwrap(), Color::Rgb(255, 255, 255));
        assert!(parse_hex("#12345").is_err());
        assert!(parse_hex("#GGGGGG").is_err());
    }

    #[test]
    fn theme_file_overrides_keys() {
        let map = parse_theme_file("; comment\nbg = \"#000000\"\ntile_2 = #FF0000\n\n");
        let theme = Theme::from_map(&map).unwrap();
        assert_eq!(theme.bg, Color::Rgb(0, 0, 0));
        assert_eq!(theme.tile_color(1), Color::Rgb(255, 0, 0));
        assert_eq!(theme.tile_color(0), TILE_PALETTE[0]);
    }

    #[test]
    fn bad_colour_in_file_is_an_error() {
        let map = parse_theme_file("fg = nope");
        assert!(matches!(Theme::from_map(&map), Err(ThemeError::InvalidHex(_))));
    }

    #[test]
    fn palettes_cover_the_default_catalog() {
        for palette in [crate::Palette::Normal, crate::Palette::HighContrast, crate::Palette::Colorblind] {
            let theme = Theme::default_for_palette(palette);
            assert_eq!(theme.tiles.len(), 14);
        }
        assert_eq!(Theme::default().tile_color(14), Theme::default().tile_color(0));
    }
}
