//! Attribute value grammars.
//!
//! Each grammar turns raw attribute text into a typed value, or `None` when
//! the text does not match. Matching is case-insensitive throughout.
//!
//! - `#COLOR`: a color name, `D` + decimal 256-color index, or `X` + hex triplet.
//! - `#FONTWEIGHT`: `BOLD`, `NORMAL`, `LIGHT`.
//! - `#BOOL`: truthy/falsy words.
//! - `#SCREENMODE`: a named BIOS-style display mode.

use std::collections::HashMap;

/// Surface form a color value was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorKind {
    Named,
    Decimal,
    Hex,
}

/// A validated `#COLOR` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    /// One of the eight ANSI colors or `default`, with its SGR fg/bg codes.
    Named { fg: u8, bg: u8 },
    /// 256-color palette index.
    Decimal(u8),
    /// 24-bit RGB.
    Hex { r: u8, g: u8, b: u8 },
}

const COLOR_NAMES: &[(&str, u8, u8)] = &[
    // name      fg  bg
    ("black", 30, 40),
    ("red", 31, 41),
    ("green", 32, 42),
    ("yellow", 33, 43),
    ("blue", 34, 44),
    ("magenta", 35, 45),
    ("cyan", 36, 46),
    ("white", 37, 47),
    ("default", 39, 49),
];

impl Color {
    /// Parse a raw `#COLOR` string without memoization.
    pub fn parse(value: &str) -> Option<Color> {
        let value = value.to_ascii_lowercase();

        if let Some(&(_, fg, bg)) = COLOR_NAMES.iter().find(|(name, _, _)| *name == value) {
            return Some(Color::Named { fg, bg });
        }
        if let Some(digits) = value.strip_prefix('d') {
            return parse_decimal(digits).map(Color::Decimal);
        }
        if let Some(hex) = value.strip_prefix('x') {
            return parse_hex(hex).map(|[r, g, b]| Color::Hex { r, g, b });
        }
        None
    }

    pub fn kind(&self) -> ColorKind {
        match self {
            Color::Named { .. } => ColorKind::Named,
            Color::Decimal(_) => ColorKind::Decimal,
            Color::Hex { .. } => ColorKind::Hex,
        }
    }

    /// Foreground payload: the SGR code for named colors, the palette index
    /// for decimal colors, the lower-case `rrggbb` string for hex colors.
    pub fn fg_payload(&self) -> String {
        match self {
            Color::Named { fg, .. } => fg.to_string(),
            _ => self.shared_payload(),
        }
    }

    /// Background payload, see [`Color::fg_payload`].
    pub fn bg_payload(&self) -> String {
        match self {
            Color::Named { bg, .. } => bg.to_string(),
            _ => self.shared_payload(),
        }
    }

    fn shared_payload(&self) -> String {
        match self {
            Color::Named { fg, .. } => fg.to_string(),
            Color::Decimal(index) => index.to_string(),
            Color::Hex { r, g, b } => format!("{r:02x}{g:02x}{b:02x}"),
        }
    }

    /// Escape sequence selecting this color as the foreground.
    pub fn fg_sequence(&self) -> String {
        match self {
            Color::Named { fg, .. } => format!("\x1b[{fg}m"),
            Color::Decimal(index) => format!("\x1b[38;5;{index}m"),
            Color::Hex { r, g, b } => format!("\x1b[38;2;{r};{g};{b}m"),
        }
    }

    /// Escape sequence selecting this color as the background.
    pub fn bg_sequence(&self) -> String {
        match self {
            Color::Named { bg, .. } => format!("\x1b[{bg}m"),
            Color::Decimal(index) => format!("\x1b[48;5;{index}m"),
            Color::Hex { r, g, b } => format!("\x1b[48;2;{r};{g};{b}m"),
        }
    }
}

fn parse_decimal(digits: &str) -> Option<u8> {
    if digits.is_empty() || digits.len() > 3 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<u16>().ok().and_then(|n| u8::try_from(n).ok())
}

fn parse_hex(hex: &str) -> Option<[u8; 3]> {
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let expanded: String = match hex.len() {
        3 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 => hex.to_string(),
        _ => return None,
    };
    let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}

/// Memoized `#COLOR` lookups, keyed by the lower-cased raw string.
///
/// Invalid values are cached too. Entries live until [`ColorCache::clear`].
#[derive(Debug, Default)]
pub struct ColorCache {
    entries: HashMap<String, Option<Color>>,
}

impl ColorCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(&mut self, value: &str) -> Option<Color> {
        let key = value.to_ascii_lowercase();
        if let Some(cached) = self.entries.get(&key) {
            return *cached;
        }
        let parsed = Color::parse(&key);
        self.entries.insert(key, parsed);
        parsed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A validated `#FONTWEIGHT` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Bold,
    Normal,
    Light,
}

impl FontWeight {
    /// `default` is accepted as a synonym for `normal`.
    pub fn parse(value: &str) -> Option<FontWeight> {
        match value.to_ascii_lowercase().as_str() {
            "bold" => Some(FontWeight::Bold),
            "normal" | "default" => Some(FontWeight::Normal),
            "light" => Some(FontWeight::Light),
            _ => None,
        }
    }

    /// SGR parameter for this weight.
    pub fn code(self) -> u8 {
        match self {
            FontWeight::Bold => 1,
            FontWeight::Normal => 22,
            FontWeight::Light => 2,
        }
    }
}

/// `#BOOL` values.
pub struct Boolean;

impl Boolean {
    /// `Some(true)` for truthy words, `Some(false)` for falsy ones, `None`
    /// for anything else.
    pub fn parse(value: &str) -> Option<bool> {
        match value.to_ascii_lowercase().as_str() {
            "1" | "yes" | "on" | "true" => Some(true),
            "0" | "no" | "off" | "false" => Some(false),
            _ => None,
        }
    }
}

/// A named `#SCREENMODE` and its terminal mode code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenMode {
    pub name: &'static str,
    pub code: u8,
    pub description: &'static str,
}

pub const SCREEN_MODES: &[ScreenMode] = &[
    ScreenMode { name: "40x25m", code: 0, description: "40 x 25 monochrome text" },
    ScreenMode { name: "40x24m", code: 0, description: "40 x 25 monochrome text (legacy name)" },
    ScreenMode { name: "40x25c", code: 1, description: "40 x 25 color text" },
    ScreenMode { name: "80x25m", code: 2, description: "80 x 25 monochrome text" },
    ScreenMode { name: "80x25c", code: 3, description: "80 x 25 color text" },
    ScreenMode { name: "320x200c4", code: 4, description: "320 x 200 4-color graphics" },
    ScreenMode { name: "320x200m", code: 5, description: "320 x 200 monochrome graphics" },
    ScreenMode { name: "640x200m", code: 6, description: "640 x 200 monochrome graphics" },
    ScreenMode { name: "320x200c16", code: 13, description: "320 x 200 16-color graphics" },
    ScreenMode { name: "640x200c", code: 14, description: "640 x 200 16-color graphics" },
    ScreenMode { name: "640x350m", code: 15, description: "640 x 350 monochrome 2-color graphics" },
    ScreenMode { name: "640x350c", code: 16, description: "640 x 350 16-color graphics" },
    ScreenMode { name: "640x480m", code: 17, description: "640 x 480 monochrome 2-color graphics" },
    ScreenMode { name: "640x480c", code: 18, description: "640 x 480 16-color graphics" },
    ScreenMode { name: "320x200c", code: 19, description: "320 x 200 256-color graphics" },
];

impl ScreenMode {
    pub fn parse(value: &str) -> Option<ScreenMode> {
        let value = value.to_ascii_lowercase();
        SCREEN_MODES.iter().find(|mode| mode.name == value).copied()
    }
}
