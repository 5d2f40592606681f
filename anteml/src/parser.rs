//! The AnTeML parser: dispatches markup events to element handlers and
//! forwards the resulting fragments to a sink.

use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::LazyLock;

use log::{debug, error, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::alias::Alias;
use crate::attributes::ColorCache;
use crate::elements::{Attribute, Element, ElementKind};
use crate::entities::default_entities;
use crate::error::{AttributeError, ParseError};
use crate::tokenizer::{Token, Tokenizer};
use crate::whitespace::WhitespaceFilter;

static ANTEML_DOCTYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\ADOCTYPE\s+AnTeML.*\z").expect("valid regex"));

/// Receives every fragment the parser produces, in order.
pub type Sink = Box<dyn FnMut(&str)>;

/// What a tag name is bound to, as written in an `elementMap`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagKind {
    Anteml,
    Br,
    Fw,
    Fg,
    Bg,
    I,
    U,
    S,
    Blink,
    Invert,
    Hide,
    Screen,
    B,
    L,
}

impl TagKind {
    fn handler(self, tag: &str) -> Handler {
        let element = match self {
            TagKind::B => return Handler::Alias(Alias::Bold),
            TagKind::L => return Handler::Alias(Alias::Light),
            TagKind::Anteml => ElementKind::Anteml,
            TagKind::Br => ElementKind::Br,
            TagKind::Fw => ElementKind::Fw,
            TagKind::Fg => ElementKind::Fg,
            TagKind::Bg => ElementKind::Bg,
            TagKind::I => ElementKind::Italic,
            TagKind::U => ElementKind::Underline,
            TagKind::S => ElementKind::Strikethrough,
            TagKind::Blink => ElementKind::Blink,
            TagKind::Invert => ElementKind::Invert,
            TagKind::Hide => ElementKind::Hide,
            TagKind::Screen => ElementKind::Screen,
        };
        Handler::Element(Element::new(element, tag))
    }
}

impl From<ElementKind> for TagKind {
    fn from(kind: ElementKind) -> Self {
        match kind {
            ElementKind::Anteml => TagKind::Anteml,
            ElementKind::Br => TagKind::Br,
            ElementKind::Fw => TagKind::Fw,
            ElementKind::Fg => TagKind::Fg,
            ElementKind::Bg => TagKind::Bg,
            ElementKind::Italic => TagKind::I,
            ElementKind::Underline => TagKind::U,
            ElementKind::Strikethrough => TagKind::S,
            ElementKind::Blink => TagKind::Blink,
            ElementKind::Invert => TagKind::Invert,
            ElementKind::Hide => TagKind::Hide,
            ElementKind::Screen => TagKind::Screen,
        }
    }
}

impl From<Alias> for TagKind {
    fn from(alias: Alias) -> Self {
        match alias {
            Alias::Bold => TagKind::B,
            Alias::Light => TagKind::L,
        }
    }
}

/// The built-in tag registry.
pub fn default_element_map() -> HashMap<String, TagKind> {
    ElementKind::ALL
        .iter()
        .map(|kind| (kind.tag().to_string(), TagKind::from(*kind)))
        .chain(
            Alias::ALL
                .iter()
                .map(|alias| (alias.tag().to_string(), TagKind::from(*alias))),
        )
        .collect()
}

/// Parser configuration.
///
/// `element_map` and `entity_map` are layered over the built-in tables:
/// entries add new names or replace existing ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParserOptions {
    /// Collapse redundant whitespace in fed text before tokenizing.
    pub strip_whitespace: bool,
    /// Drop unknown tags, entities and declarations instead of passing
    /// their source text through.
    pub strip_unknown: bool,
    /// Drop comments instead of passing them through.
    pub strip_comments: bool,
    pub element_map: HashMap<String, TagKind>,
    pub entity_map: HashMap<String, String>,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            strip_whitespace: true,
            strip_unknown: false,
            strip_comments: false,
            element_map: HashMap::new(),
            entity_map: HashMap::new(),
        }
    }
}

enum Handler {
    Element(Element),
    Alias(Alias),
}

/// One parsing session.
///
/// Handlers are created once, when the parser is, and live as long as it
/// does, so tags may open in one [`Parser::feed`] call and close in a later
/// one. Invalid markup aborts the document: every later `feed` fails with
/// [`ParseError::Aborted`] until [`Parser::reset`].
pub struct Parser {
    handlers: HashMap<String, Handler>,
    entities: HashMap<String, String>,
    options: ParserOptions,
    colors: ColorCache,
    tokenizer: Tokenizer,
    whitespace: WhitespaceFilter,
    sink: Sink,
    aborted: bool,
}

impl Parser {
    pub fn new(sink: impl FnMut(&str) + 'static, options: ParserOptions) -> Self {
        let mut element_map = default_element_map();
        element_map.extend(
            options
                .element_map
                .iter()
                .map(|(tag, kind)| (tag.to_ascii_lowercase(), *kind)),
        );
        let handlers = element_map
            .into_iter()
            .map(|(tag, kind)| {
                let handler = kind.handler(&tag);
                (tag, handler)
            })
            .collect();

        let mut entities = default_entities();
        entities.extend(options.entity_map.clone());

        Self {
            handlers,
            entities,
            options,
            colors: ColorCache::new(),
            tokenizer: Tokenizer::new(),
            whitespace: WhitespaceFilter::new(),
            sink: Box::new(sink),
            aborted: false,
        }
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Replace the receiver of produced fragments.
    pub fn set_sink(&mut self, sink: impl FnMut(&str) + 'static) {
        self.sink = Box::new(sink);
    }

    /// Feed the next chunk of the document.
    ///
    /// With `strip_whitespace` on, whitespace and the markup right after it
    /// may be held back until later text or [`Parser::close`] decides it.
    pub fn feed(&mut self, chunk: &str) -> Result<(), ParseError> {
        if self.aborted {
            return Err(ParseError::Aborted);
        }
        let mut tokens = self.tokenizer.push(chunk);
        if self.options.strip_whitespace {
            tokens = self.whitespace.push(tokens);
        }
        self.dispatch_all(tokens)
    }

    /// Signal the end of the document, flushing any buffered input.
    ///
    /// Handler stacks are left as they are; call [`Parser::reset`] to start
    /// a fresh document.
    pub fn close(&mut self) -> Result<(), ParseError> {
        if self.aborted {
            return Err(ParseError::Aborted);
        }
        let mut tokens = self.tokenizer.finish();
        if self.options.strip_whitespace {
            tokens = self.whitespace.push(tokens);
            tokens.extend(self.whitespace.finish());
        }
        self.dispatch_all(tokens)
    }

    /// Forget all element state and buffered input.
    pub fn reset(&mut self) {
        for handler in self.handlers.values_mut() {
            if let Handler::Element(element) = handler {
                element.reset();
            }
        }
        self.tokenizer.clear();
        self.whitespace.clear();
        self.aborted = false;
    }

    pub fn clear_color_cache(&mut self) {
        self.colors.clear();
    }

    pub fn color_cache(&self) -> &ColorCache {
        &self.colors
    }

    /// The live handler registered for `tag`, if it is an element.
    pub fn element(&self, tag: &str) -> Option<&Element> {
        match self.handlers.get(&tag.to_ascii_lowercase()) {
            Some(Handler::Element(element)) => Some(element),
            _ => None,
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    fn dispatch_all(&mut self, tokens: Vec<Token>) -> Result<(), ParseError> {
        for token in tokens {
            if let Err(err) = self.dispatch(token) {
                warn!("aborting document: {err}");
                self.aborted = true;
                self.tokenizer.clear();
                self.whitespace.clear();
                return Err(err.into());
            }
        }
        Ok(())
    }

    fn dispatch(&mut self, token: Token) -> Result<(), AttributeError> {
        match token {
            Token::StartTag {
                name,
                attributes,
                self_closing: false,
                raw,
            } => self.on_start_tag(&name, &attributes, &raw)?,
            Token::StartTag {
                name,
                attributes,
                self_closing: true,
                raw,
            } => self.on_self_closing_tag(&name, &attributes, &raw)?,
            Token::EndTag { name, raw } => self.on_end_tag(&name, &raw),
            Token::Text(text) => self.on_data(&text),
            Token::EntityRef(name) => self.on_entity(&name),
            Token::CharRef(reference) => self.on_char_ref(&reference),
            Token::Comment(text) => self.on_comment(&text),
            Token::Declaration(text) => self.on_declaration(&text),
            Token::ProcessingInstruction(text) => self.on_processing_instruction(&text),
        }
        Ok(())
    }

    /// Handle an opening tag. `raw` is its source text, passed through when
    /// the tag is unknown.
    pub fn on_start_tag(
        &mut self,
        name: &str,
        attrs: &[Attribute],
        raw: &str,
    ) -> Result<(), AttributeError> {
        self.start(name, attrs, raw, false)
    }

    /// Handle `<tag .../>`: the open fragment immediately followed by the
    /// close fragment, emitted together.
    pub fn on_self_closing_tag(
        &mut self,
        name: &str,
        attrs: &[Attribute],
        raw: &str,
    ) -> Result<(), AttributeError> {
        self.start(name, attrs, raw, true)
    }

    fn start(
        &mut self,
        name: &str,
        attrs: &[Attribute],
        raw: &str,
        self_closing: bool,
    ) -> Result<(), AttributeError> {
        let (tag, attrs) = self.resolve_start_alias(name.to_ascii_lowercase(), attrs)?;
        if !self.handlers.contains_key(&tag) {
            warn!("unknown start tag <{tag}> (attrs: {attrs:?})");
            if !self.options.strip_unknown {
                self.output(raw);
            }
            return Ok(());
        }

        let fragment = match self.handlers.get_mut(&tag) {
            Some(Handler::Element(element)) => {
                debug!("start tag <{tag}> (attrs: {attrs:?}, self-closing: {self_closing})");
                let mut fragment = element.open(&attrs, &mut self.colors)?;
                if self_closing {
                    fragment.push_str(&element.close());
                }
                fragment
            }
            _ => {
                error!("handler registered for <{tag}> is not an element");
                return Ok(());
            }
        };
        debug!("start tag value: {fragment:?}");
        self.output(&fragment);
        Ok(())
    }

    /// Handle a closing tag. Closing a tag that is not open is not an error:
    /// the element falls back to its default.
    pub fn on_end_tag(&mut self, name: &str, raw: &str) {
        let tag = self.resolve_end_alias(name.to_ascii_lowercase());
        if !self.handlers.contains_key(&tag) {
            warn!("unknown end tag </{tag}>");
            if !self.options.strip_unknown {
                self.output(raw);
            }
            return;
        }

        let fragment = match self.handlers.get_mut(&tag) {
            Some(Handler::Element(element)) => element.close(),
            _ => {
                error!("handler registered for </{tag}> is not an element");
                return;
            }
        };
        debug!("end tag </{tag}> value: {fragment:?}");
        self.output(&fragment);
    }

    pub fn on_data(&mut self, text: &str) {
        debug!("data: {text:?}");
        self.output(text);
    }

    /// Resolve `&name;`. An unknown name passes through as its source text,
    /// or, under `strip_unknown`, produces no output at all, the same as an
    /// invalid character reference.
    pub fn on_entity(&mut self, name: &str) {
        let value = match self.entities.get(name) {
            Some(value) => {
                debug!("entity &{name}; -> {value:?}");
                value.clone()
            }
            None if !self.options.strip_unknown => {
                debug!("unknown entity &{name}; passed through");
                format!("&{name};")
            }
            None => {
                warn!("dropping unresolvable entity &{name};");
                return;
            }
        };
        self.output(&value);
    }

    /// Handle `&#NNN;` (`"NNN"`) or `&#xHH;` (`"xHH"`).
    pub fn on_char_ref(&mut self, reference: &str) {
        let code = match reference.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => reference.parse::<u32>().ok(),
        };
        match code.and_then(char::from_u32) {
            Some(c) => {
                debug!("char ref &#{reference}; -> {c:?}");
                self.output(c.encode_utf8(&mut [0; 4]));
            }
            None => {
                warn!("invalid character reference &#{reference};");
                if !self.options.strip_unknown {
                    self.output(&format!("&#{reference};"));
                }
            }
        }
    }

    pub fn on_comment(&mut self, text: &str) {
        debug!("comment: {text:?}");
        if !self.options.strip_comments {
            self.output(&format!("<!-- {text} -->"));
        }
    }

    pub fn on_declaration(&mut self, text: &str) {
        if ANTEML_DOCTYPE.is_match(text) {
            debug!("doctype declaration: {text:?}");
            return;
        }
        warn!("unknown declaration <!{text}>");
        if !self.options.strip_unknown {
            self.output(&format!("<!{text}>"));
        }
    }

    /// Processing instructions are not supported and produce no output.
    pub fn on_processing_instruction(&mut self, text: &str) {
        warn!("processing instructions are not supported, dropping <?{text}>");
    }

    fn resolve_start_alias<'a>(
        &self,
        tag: String,
        attrs: &'a [Attribute],
    ) -> Result<(String, Cow<'a, [Attribute]>), AttributeError> {
        match self.handlers.get(&tag) {
            Some(Handler::Alias(alias)) => {
                let (canonical, rewritten) = alias.open(&tag, attrs)?;
                debug!("rewriting alias <{tag}> -> <{canonical}> (attrs: {rewritten:?})");
                Ok((canonical.to_string(), Cow::Owned(rewritten)))
            }
            _ => Ok((tag, Cow::Borrowed(attrs))),
        }
    }

    fn resolve_end_alias(&self, tag: String) -> String {
        match self.handlers.get(&tag) {
            Some(Handler::Alias(alias)) => {
                let canonical = alias.close();
                debug!("rewriting alias </{tag}> -> </{canonical}>");
                canonical.to_string()
            }
            _ => tag,
        }
    }

    fn output(&mut self, fragment: &str) {
        (self.sink)(fragment);
    }
}

/// Render a complete document to a string.
pub fn render(input: &str, options: ParserOptions) -> Result<String, ParseError> {
    let buffer = Rc::new(RefCell::new(String::new()));
    let sink = Rc::clone(&buffer);
    let mut parser = Parser::new(
        move |fragment: &str| sink.borrow_mut().push_str(fragment),
        options,
    );
    parser.feed(input)?;
    parser.close()?;
    drop(parser);
    Ok(buffer.take())
}
