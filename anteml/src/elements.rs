//! Element handlers.
//!
//! Unlike a DOM, an AnTeML element handler does not represent one occurrence
//! of a tag. There is a single handler per tag name for the whole lifetime
//! of a parser, and it keeps a stack of presentation states for every open
//! occurrence of that tag. This is what allows a document to be streamed: a
//! tag may be opened in one chunk and closed many chunks later, and closing
//! it restores whatever was in effect before it was opened.
//!
//! Most handlers work the same way:
//!
//! - On open, the attributes are validated and turned into an escape
//!   sequence, which is pushed onto the stack and returned for output. The
//!   very first open pushes the handler's `default` underneath it.
//! - On close, the top of the stack is popped and returned, so the previous
//!   state is re-established. Closing more often than opening yields
//!   `default`.
//!
//! `screen` is the exception: mode and wrap are global terminal settings
//! with no meaningful previous value, so it pushes the sequence that resets
//! what it changed and emits that on close.

use crate::attributes::{Boolean, ColorCache, FontWeight, ScreenMode};
use crate::error::AttributeError;

/// An attribute as delivered by the tokenizer: name and optional value.
pub type Attribute = (String, Option<String>);

/// Stack of presentation codes for one tag type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateStack {
    stack: Vec<String>,
    current: Option<String>,
    default: &'static str,
}

impl StateStack {
    pub fn new(default: &'static str) -> Self {
        Self {
            stack: Vec::new(),
            current: None,
            default,
        }
    }

    /// Save the current state and make `code` current.
    pub fn push(&mut self, code: String) -> String {
        let previous = self
            .current
            .take()
            .unwrap_or_else(|| self.default.to_string());
        self.stack.push(previous);
        self.current = Some(code.clone());
        code
    }

    /// Restore the most recently saved state, or `default` if none is left.
    pub fn pop(&mut self) -> String {
        let state = self
            .stack
            .pop()
            .unwrap_or_else(|| self.default.to_string());
        self.current = Some(state.clone());
        state
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn clear(&mut self) {
        self.stack.clear();
        self.current = None;
    }
}

/// The element types a tag name can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// `<ANTEML>`: optional document wrapper with no presentation effect.
    Anteml,
    /// `<BR>`: line break.
    Br,
    /// `<FW weight>`: font weight.
    Fw,
    /// `<FG color>`: foreground color.
    Fg,
    /// `<BG color>`: background color.
    Bg,
    Italic,
    Underline,
    Strikethrough,
    Blink,
    Invert,
    Hide,
    /// `<SCREEN MODE=.. WRAP=..>`: screen mode and line wrapping.
    Screen,
}

impl ElementKind {
    pub const ALL: [ElementKind; 12] = [
        ElementKind::Anteml,
        ElementKind::Br,
        ElementKind::Fw,
        ElementKind::Fg,
        ElementKind::Bg,
        ElementKind::Italic,
        ElementKind::Underline,
        ElementKind::Strikethrough,
        ElementKind::Blink,
        ElementKind::Invert,
        ElementKind::Hide,
        ElementKind::Screen,
    ];

    /// The tag name this element is registered under by default.
    pub fn tag(self) -> &'static str {
        match self {
            ElementKind::Anteml => "anteml",
            ElementKind::Br => "br",
            ElementKind::Fw => "fw",
            ElementKind::Fg => "fg",
            ElementKind::Bg => "bg",
            ElementKind::Italic => "i",
            ElementKind::Underline => "u",
            ElementKind::Strikethrough => "s",
            ElementKind::Blink => "blink",
            ElementKind::Invert => "invert",
            ElementKind::Hide => "hide",
            ElementKind::Screen => "screen",
        }
    }

    /// Baseline code restored when nothing else is on the stack.
    pub fn default_code(self) -> &'static str {
        match self {
            ElementKind::Anteml | ElementKind::Screen => "",
            ElementKind::Br => "\n",
            ElementKind::Fw => "\x1b[22m",
            ElementKind::Fg => "\x1b[39m",
            ElementKind::Bg => "\x1b[49m",
            ElementKind::Italic => "\x1b[23m",
            ElementKind::Underline => "\x1b[24m",
            ElementKind::Strikethrough => "\x1b[29m",
            ElementKind::Blink => "\x1b[25m",
            ElementKind::Invert => "\x1b[27m",
            ElementKind::Hide => "\x1b[28m",
        }
    }
}

/// Live handler for one tag name.
#[derive(Debug, Clone)]
pub struct Element {
    kind: ElementKind,
    tag: String,
    state: StateStack,
}

impl Element {
    /// `tag` is the name the handler is registered under; it only appears
    /// in error messages.
    pub fn new(kind: ElementKind, tag: impl Into<String>) -> Self {
        Self {
            kind,
            tag: tag.into(),
            state: StateStack::new(kind.default_code()),
        }
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn state(&self) -> &StateStack {
        &self.state
    }

    pub fn reset(&mut self) {
        self.state.clear();
    }

    /// Handle an opening tag and return the fragment to emit.
    pub fn open(
        &mut self,
        attrs: &[Attribute],
        colors: &mut ColorCache,
    ) -> Result<String, AttributeError> {
        match self.kind {
            ElementKind::Anteml => Ok(String::new()),
            ElementKind::Br => {
                self.expect_none(attrs)?;
                Ok(self.kind.default_code().to_string())
            }
            ElementKind::Fw => {
                let value = self.expect_one(attrs)?;
                let weight = FontWeight::parse(value)
                    .ok_or_else(|| self.invalid(value, "#FONTWEIGHT"))?;
                let code = format!("{}\x1b[{}m", self.kind.default_code(), weight.code());
                Ok(self.state.push(code))
            }
            ElementKind::Fg | ElementKind::Bg => {
                let value = self.expect_one(attrs)?;
                let color = colors
                    .parse(value)
                    .ok_or_else(|| self.invalid(value, "#COLOR"))?;
                let code = if self.kind == ElementKind::Fg {
                    color.fg_sequence()
                } else {
                    color.bg_sequence()
                };
                Ok(self.state.push(code))
            }
            ElementKind::Screen => self.open_screen(attrs),
            ElementKind::Italic => self.open_toggle(attrs, "\x1b[3m"),
            ElementKind::Underline => self.open_toggle(attrs, "\x1b[4m"),
            ElementKind::Strikethrough => self.open_toggle(attrs, "\x1b[9m"),
            ElementKind::Blink => self.open_toggle(attrs, "\x1b[5m"),
            ElementKind::Invert => self.open_toggle(attrs, "\x1b[7m"),
            ElementKind::Hide => self.open_toggle(attrs, "\x1b[8m"),
        }
    }

    /// Attribute-less style switch: push its SGR code.
    fn open_toggle(&mut self, attrs: &[Attribute], code: &str) -> Result<String, AttributeError> {
        self.expect_none(attrs)?;
        Ok(self.state.push(code.to_string()))
    }

    /// Handle a closing tag and return the fragment to emit.
    pub fn close(&mut self) -> String {
        match self.kind {
            ElementKind::Anteml | ElementKind::Br => String::new(),
            _ => self.state.pop(),
        }
    }

    fn open_screen(&mut self, attrs: &[Attribute]) -> Result<String, AttributeError> {
        if attrs.len() > 2 {
            return Err(AttributeError::TooMany {
                tag: self.tag.clone(),
                max: 2,
                given: attrs.len(),
            });
        }

        let mut mode: Option<ScreenMode> = None;
        let mut wrap: Option<bool> = None;
        for (name, value) in attrs {
            match name.to_ascii_lowercase().as_str() {
                "mode" => {
                    if mode.is_some() {
                        return Err(self.duplicate("mode"));
                    }
                    let value = self.required_value("mode", value)?;
                    mode = Some(
                        ScreenMode::parse(value)
                            .ok_or_else(|| self.invalid_named("mode", value, "#SCREENMODE"))?,
                    );
                }
                "wrap" => {
                    if wrap.is_some() {
                        return Err(self.duplicate("wrap"));
                    }
                    let value = self.required_value("wrap", value)?;
                    wrap = Some(
                        Boolean::parse(value)
                            .ok_or_else(|| self.invalid_named("wrap", value, "#BOOL"))?,
                    );
                }
                _ => {
                    return Err(AttributeError::Unknown {
                        tag: self.tag.clone(),
                        attribute: name.clone(),
                    });
                }
            }
        }

        let mut open = String::new();
        let mut close = String::new();
        if let Some(mode) = mode {
            open.push_str(&format!("\x1b[={}h", mode.code));
        }
        match wrap {
            // Line wrapping is assumed to be on when the screen tag closes.
            Some(true) => {
                open.push_str("\x1b[=7h");
                close.push_str("\x1b[=7h");
            }
            Some(false) => {
                open.push_str("\x1b[=7l");
                close.push_str("\x1b[=7h");
            }
            None => {}
        }
        if let Some(mode) = mode {
            close.push_str(&format!("\x1b[={}l", mode.code));
        }

        self.state.push(close);
        Ok(open)
    }

    fn expect_none(&self, attrs: &[Attribute]) -> Result<(), AttributeError> {
        if attrs.is_empty() {
            Ok(())
        } else {
            Err(AttributeError::WrongCount {
                tag: self.tag.clone(),
                expected: "0",
                given: attrs.len(),
            })
        }
    }

    /// Single bare attribute: the attribute name is the value (`<FG RED>`).
    fn expect_one<'a>(&self, attrs: &'a [Attribute]) -> Result<&'a str, AttributeError> {
        match attrs {
            [(value, _)] => Ok(value.as_str()),
            _ => Err(AttributeError::WrongCount {
                tag: self.tag.clone(),
                expected: "exactly 1",
                given: attrs.len(),
            }),
        }
    }

    fn required_value<'a>(
        &self,
        attribute: &str,
        value: &'a Option<String>,
    ) -> Result<&'a str, AttributeError> {
        value.as_deref().ok_or_else(|| AttributeError::MissingValue {
            tag: self.tag.clone(),
            attribute: attribute.to_string(),
        })
    }

    fn invalid(&self, value: &str, grammar: &'static str) -> AttributeError {
        self.invalid_named(value, value, grammar)
    }

    fn invalid_named(&self, attribute: &str, value: &str, grammar: &'static str) -> AttributeError {
        AttributeError::InvalidValue {
            tag: self.tag.clone(),
            attribute: attribute.to_string(),
            value: value.to_string(),
            grammar,
        }
    }

    fn duplicate(&self, attribute: &str) -> AttributeError {
        AttributeError::Duplicate {
            tag: self.tag.clone(),
            attribute: attribute.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn bare(values: &[&str]) -> Vec<Attribute> {
        values.iter().map(|v| (v.to_string(), None)).collect()
    }

    fn named(pairs: &[(&str, Option<&str>)]) -> Vec<Attribute> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
            .collect()
    }

    #[test]
    fn stack_restores_in_reverse_order() {
        let mut stack = StateStack::new("D");
        assert_eq!(stack.current(), None);
        assert_eq!(stack.push("a".into()), "a");
        assert_eq!(stack.push("b".into()), "b");
        assert_eq!(stack.push("c".into()), "c");
        assert_eq!(stack.depth(), 3);
        assert_eq!(stack.current(), Some("c"));
        assert_eq!(stack.pop(), "b");
        assert_eq!(stack.pop(), "a");
        assert_eq!(stack.pop(), "D");
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn empty_pop_yields_default() {
        let mut stack = StateStack::new("D");
        assert_eq!(stack.pop(), "D");
        assert_eq!(stack.pop(), "D");
        assert_eq!(stack.current(), Some("D"));
        stack.push("x".into());
        assert_eq!(stack.pop(), "D");
    }

    #[test]
    fn fg_nesting() {
        let mut colors = ColorCache::new();
        let mut fg = Element::new(ElementKind::Fg, "fg");
        assert_eq!(fg.open(&bare(&["green"]), &mut colors).unwrap(), "\x1b[32m");
        assert_eq!(fg.open(&bare(&["D10"]), &mut colors).unwrap(), "\x1b[38;5;10m");
        assert_eq!(fg.close(), "\x1b[32m");
        assert_eq!(fg.close(), "\x1b[39m");
        assert_eq!(fg.close(), "\x1b[39m");
    }

    #[test]
    fn bg_uses_background_forms() {
        let mut colors = ColorCache::new();
        let mut bg = Element::new(ElementKind::Bg, "bg");
        assert_eq!(bg.open(&bare(&["yellow"]), &mut colors).unwrap(), "\x1b[43m");
        assert_eq!(
            bg.open(&bare(&["x4169e1"]), &mut colors).unwrap(),
            "\x1b[48;2;65;105;225m"
        );
        assert_eq!(bg.close(), "\x1b[43m");
        assert_eq!(bg.close(), "\x1b[49m");
    }

    #[test]
    fn fw_prefixes_reset() {
        let mut colors = ColorCache::new();
        let mut fw = Element::new(ElementKind::Fw, "fw");
        assert_eq!(fw.open(&bare(&["bold"]), &mut colors).unwrap(), "\x1b[22m\x1b[1m");
        assert_eq!(fw.open(&bare(&["light"]), &mut colors).unwrap(), "\x1b[22m\x1b[2m");
        assert_eq!(fw.close(), "\x1b[22m\x1b[1m");
        assert_eq!(fw.close(), "\x1b[22m");
    }

    #[test]
    fn toggles_push_their_codes() {
        let mut colors = ColorCache::new();
        for (kind, set, reset) in [
            (ElementKind::Italic, "\x1b[3m", "\x1b[23m"),
            (ElementKind::Underline, "\x1b[4m", "\x1b[24m"),
            (ElementKind::Strikethrough, "\x1b[9m", "\x1b[29m"),
            (ElementKind::Blink, "\x1b[5m", "\x1b[25m"),
            (ElementKind::Invert, "\x1b[7m", "\x1b[27m"),
            (ElementKind::Hide, "\x1b[8m", "\x1b[28m"),
        ] {
            let mut element = Element::new(kind, kind.tag());
            assert_eq!(element.open(&[], &mut colors).unwrap(), set);
            assert_eq!(element.close(), reset);
            assert!(matches!(
                element.open(&bare(&["on"]), &mut colors),
                Err(AttributeError::WrongCount { given: 1, .. })
            ));
            assert_eq!(element.state().depth(), 0);
        }
    }

    #[test]
    fn br_and_anteml_leave_the_stack_alone() {
        let mut colors = ColorCache::new();
        let mut br = Element::new(ElementKind::Br, "br");
        assert_eq!(br.open(&[], &mut colors).unwrap(), "\n");
        assert_eq!(br.close(), "");
        assert_eq!(br.state().depth(), 0);

        let mut anteml = Element::new(ElementKind::Anteml, "anteml");
        assert_eq!(anteml.open(&bare(&["version"]), &mut colors).unwrap(), "");
        assert_eq!(anteml.close(), "");
    }

    #[test]
    fn arity_errors_name_the_tag() {
        let mut colors = ColorCache::new();
        let mut fg = Element::new(ElementKind::Fg, "fg");
        let err = fg.open(&[], &mut colors).unwrap_err();
        assert_eq!(
            err,
            AttributeError::WrongCount {
                tag: "fg".into(),
                expected: "exactly 1",
                given: 0
            }
        );
        assert!(fg.open(&bare(&["red", "blue"]), &mut colors).is_err());

        let mut italic = Element::new(ElementKind::Italic, "i");
        assert_eq!(italic.open(&bare(&["x"]), &mut colors).unwrap_err().tag(), "i");
        assert_eq!(italic.state().depth(), 0);
    }

    #[test]
    fn grammar_errors_name_the_value() {
        let mut colors = ColorCache::new();
        let mut fg = Element::new(ElementKind::Fg, "fg");
        let err = fg.open(&bare(&["d256"]), &mut colors).unwrap_err();
        assert_eq!(err.attribute(), Some("d256"));

        let mut fw = Element::new(ElementKind::Fw, "fw");
        assert!(matches!(
            fw.open(&bare(&["heavy"]), &mut colors),
            Err(AttributeError::InvalidValue { grammar: "#FONTWEIGHT", .. })
        ));
    }

    #[test]
    fn screen_pushes_its_reset() {
        let mut colors = ColorCache::new();
        let mut screen = Element::new(ElementKind::Screen, "screen");
        let open = screen
            .open(&named(&[("mode", Some("80x25m")), ("wrap", Some("off"))]), &mut colors)
            .unwrap();
        assert_eq!(open, "\x1b[=2h\x1b[=7l");
        let inner = screen.open(&named(&[("wrap", Some("yes"))]), &mut colors).unwrap();
        assert_eq!(inner, "\x1b[=7h");
        assert_eq!(screen.close(), "\x1b[=7h");
        assert_eq!(screen.close(), "\x1b[=7h\x1b[=2l");
        assert_eq!(screen.close(), "");
    }

    #[test]
    fn screen_without_attributes_is_silent() {
        let mut colors = ColorCache::new();
        let mut screen = Element::new(ElementKind::Screen, "screen");
        assert_eq!(screen.open(&[], &mut colors).unwrap(), "");
        assert_eq!(screen.state().depth(), 1);
        assert_eq!(screen.close(), "");
    }

    #[test]
    fn screen_attribute_errors() {
        let mut colors = ColorCache::new();
        let mut screen = Element::new(ElementKind::Screen, "screen");
        assert!(matches!(
            screen.open(&named(&[("mode", None)]), &mut colors),
            Err(AttributeError::MissingValue { .. })
        ));
        assert!(matches!(
            screen.open(&named(&[("wrap", Some("1")), ("wrap", Some("0"))]), &mut colors),
            Err(AttributeError::Duplicate { .. })
        ));
        assert!(matches!(
            screen.open(&named(&[("wrap", Some("maybe"))]), &mut colors),
            Err(AttributeError::InvalidValue { grammar: "#BOOL", .. })
        ));
        assert!(matches!(
            screen.open(&named(&[("mode", Some("9x9"))]), &mut colors),
            Err(AttributeError::InvalidValue { grammar: "#SCREENMODE", .. })
        ));
        assert!(matches!(
            screen.open(&named(&[("size", Some("big"))]), &mut colors),
            Err(AttributeError::Unknown { .. })
        ));
        assert!(matches!(
            screen.open(
                &named(&[("mode", Some("80x25c")), ("wrap", Some("1")), ("x", None)]),
                &mut colors
            ),
            Err(AttributeError::TooMany { max: 2, given: 3, .. })
        ));
        assert_eq!(screen.state().depth(), 0);
    }
}
