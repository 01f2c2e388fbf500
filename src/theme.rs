//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Palette slots: empty cell, then 2, 4, 8, …, 2048.
pub const TILE_COLORS: usize = 12;

/// One Dark palette and UI colours loaded from a theme file.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Tile backgrounds indexed by `tile_index`.
    pub tiles: [Color; TILE_COLORS],
    /// Board background.
    pub bg: Color,
    /// Grid / border.
    pub div_line: Color,
    /// Text (score, moves).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    /// Key hints.
    pub inactive_fg: Color,
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
        Self::onedark_default()
    }
}

const ONEDARK_TILES: [&str; TILE_COLORS] = [
    "#3F444F", // empty
    "#ABB2BF", "#E5C07B", "#D19A66", "#E06C75", "#BE5046", "#C678DD",
    "#61AFEF", "#56B6C2", "#98C379", "#7EC16E", "#FFD75F", // 2048
];

const HIGH_CONTRAST_TILES: [&str; TILE_COLORS] = [
    "#202020", "#FFFFFF", "#FFFF00", "#FF8800", "#FF0000", "#FF00FF", "#8800FF",
    "#0088FF", "#00FFFF", "#00FF00", "#88FF88", "#FFD700",
];

/// Okabe-Ito style: avoids red/green pairs between neighbouring values.
const COLORBLIND_TILES: [&str; TILE_COLORS] = [
    "#3F444F", "#BBBBBB", "#EE7733", "#0077BB", "#33BBEE", "#EE3377", "#CC3311",
    "#009988", "#BBBB00", "#AA4499", "#44AA99", "#FFDD55",
];

impl Theme {
    /// Hardcoded One Dark defaults.
    pub fn onedark_default() -> Self {
        Self {
            tiles: hex_palette(&ONEDARK_TILES),
            bg: parse_hex("#282C34").unwrap(),
            div_line: parse_hex("#3F444F").unwrap(),
            main_fg: parse_hex("#ABB2BF").unwrap(),
            title: parse_hex("#E5C07B").unwrap(),
            inactive_fg: parse_hex("#5C6370").unwrap(),
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to One Dark defaults if path is None or file is missing.
    /// `palette` then overrides tile colours: Normal keeps the file's.
    pub fn load(path: Option<&Path>, palette: crate::Palette) -> Result<Self, ThemeError> {
        let path = match path {
            Some(p) if p.exists() => p,
            _ => return Ok(Self::default_for_palette(palette)),
        };
        let s = std::fs::read_to_string(path)?;
        let map = parse_theme_file(&s);
        let mut theme = Self::from_map(&map);
        theme.apply_palette(palette);
        Ok(theme)
    }

    fn default_for_palette(palette: crate::Palette) -> Self {
        let mut t = Self::onedark_default();
        t.apply_palette(palette);
        t
    }

    pub fn apply_palette(&mut self, palette: crate::Palette) {
        match palette {
            crate::Palette::Normal => {}
            crate::Palette::HighContrast => {
                self.tiles = hex_palette(&HIGH_CONTRAST_TILES);
                self.bg = Color::Black;
            }
            crate::Palette::Colorblind => {
                self.tiles = hex_palette(&COLORBLIND_TILES);
            }
            crate::Palette::Ansi => {
                // Terminal's own 256-colour table: slot i is colour index i, background 0.
                self.tiles = std::array::from_fn(|i| Color::Indexed(i as u8));
                self.bg = Color::Indexed(0);
            }
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let defaults = Self::onedark_default();
        let get = |key: &str| {
            map.get(key)
                .and_then(|v| parse_hex(v.trim_matches('"').trim_matches('\'').trim()).ok())
        };
        let mut tiles = defaults.tiles;
        for (i, slot) in tiles.iter_mut().enumerate() {
            if let Some(c) = get(&tile_key(i)) {
                *slot = c;
            }
        }
        Self {
            tiles,
            bg: get("main_bg").or_else(|| get("meter_bg")).unwrap_or(defaults.bg),
            div_line: get("div_line").unwrap_or(defaults.div_line),
            main_fg: get("main_fg").unwrap_or(defaults.main_fg),
            title: get("title").unwrap_or(defaults.title),
            inactive_fg: get("inactive_fg").unwrap_or(defaults.inactive_fg),
        }
    }

    /// Background colour for a tile value (0 = empty).
    #[inline]
    pub fn tile_color(&self, value: u32) -> Color {
        self.tiles[tile_index(value)]
    }

    /// Readable text colour on top of `tile_color(value)`.
    pub fn tile_fg(&self, value: u32) -> Color {
        match self.tile_color(value) {
            Color::Rgb(r, g, b) => {
                let luma = 299 * u32::from(r) + 587 * u32::from(g) + 114 * u32::from(b);
                if luma > 140_000 { Color::Black } else { Color::White }
            }
            _ => Color::White,
        }
    }
}

/// Palette slot for a tile value: 0 for empty, log2(value) otherwise, capped at 2048's slot.
pub fn tile_index(value: u32) -> usize {
    if value == 0 {
        0
    } else {
        (value.ilog2() as usize).clamp(1, TILE_COLORS - 1)
    }
}

/// Theme file key for palette slot `i`: `tile_0`, `tile_2`, `tile_4`, …
fn tile_key(i: usize) -> String {
    if i == 0 {
        "tile_0".to_string()
    } else {
        format!("tile_{}", 1u32 << i)
    }
}

fn hex_palette(hex: &[&str; TILE_COLORS]) -> [Color; TILE_COLORS] {
    std::array::from_fn(|i| parse_hex(hex[i]).unwrap_or(Color::Reset))
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(stripped) = line.strip_prefix("theme[") {
            if let Some(end) = stripped.find(']') {
                let key = stripped[..end].trim();
                let rest = stripped[end + 1..].trim();
                if let Some(eq) = rest.find('=') {
                    let value = rest[eq + 1..]
                        .trim()
                        .trim_matches('"')
                        .trim_matches('\'')
                        .to_string();
                    if !value.is_empty() {
                        map.insert(key.to_string(), value);
                    }
                }
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let channel = |digits: &str| {
        u8::from_str_radix(digits, 16).map_err(|_| ThemeError::InvalidHex(s.to_string()))
    };
    let (r, g, b) = match s.len() {
        6 => (channel(&s[0..2])?, channel(&s[2..4])?, channel(&s[4..6])?),
        3 => (
            channel(&s[0..1])? * 17,
            channel(&s[1..2])? * 17,
            channel(&s[2..3])? * 17,
        ),
        _ => return Err(ThemeError::InvalidHex(s.to_string())),
    };
    Ok(Color::Rgb(r, g, b))
}
