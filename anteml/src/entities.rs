//! Default entity table.
//!
//! Names are case-sensitive. Besides the usual markup escapes, the table
//! exposes the C0 and C1 control characters so documents can embed raw
//! control sequences (`&ESC;[2J`).

use std::collections::HashMap;

pub const DEFAULT_ENTITIES: &[(&str, &str)] = &[
    ("ESC", "\x1b"),
    ("CSI", "\u{9b}"),
    ("DCS", "\u{90}"),
    ("OSC", "\u{9d}"),
    ("ST", "\u{9c}"),
    ("SOS", "\u{98}"),
    ("PM", "\u{9e}"),
    ("APC", "\u{9f}"),
    ("BEL", "\x07"),
    ("BS", "\x08"),
    ("HT", "\x09"),
    ("LF", "\x0a"),
    ("VT", "\x0b"),
    ("FF", "\x0c"),
    ("CR", "\x0d"),
    ("DEL", "\x7f"),
    ("amp", "&"),
    ("lt", "<"),
    ("gt", ">"),
    ("nbsp", " "),
];

pub fn default_entities() -> HashMap<String, String> {
    DEFAULT_ENTITIES
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_are_case_sensitive() {
        let entities = default_entities();
        assert_eq!(entities.get("ESC").map(String::as_str), Some("\x1b"));
        assert_eq!(entities.get("amp").map(String::as_str), Some("&"));
        assert!(entities.get("esc").is_none());
        assert!(entities.get("AMP").is_none());
    }
}
