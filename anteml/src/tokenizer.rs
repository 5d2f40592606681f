//! Streaming markup tokenizer.
//!
//! Splits SGML-like source into tags, text, references, comments,
//! declarations and processing instructions. Input may arrive in arbitrary
//! chunks: a construct that is cut off at the end of a chunk (`<fg re`,
//! `&ES`, `<!-- ...`) stays buffered until the next [`Tokenizer::push`] or
//! until [`Tokenizer::finish`] flushes it.
//!
//! Tag and attribute names are lower-cased; attribute order is preserved.
//! Every tag token carries its verbatim source text so unknown tags can be
//! passed through untouched.
//!
//! Known limitations:
//! - Tag names are restricted to ASCII `[A-Za-z0-9:._-]`.
//! - Attribute values are taken literally; references inside them are not
//!   decoded.

use memchr::memchr2;

use crate::elements::Attribute;

const COMMENT_START: &str = "<!--";
const COMMENT_END: &str = "-->";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    StartTag {
        name: String,
        attributes: Vec<Attribute>,
        self_closing: bool,
        raw: String,
    },
    EndTag {
        name: String,
        raw: String,
    },
    Text(String),
    /// `&name;` without the delimiters.
    EntityRef(String),
    /// `&#NNN;` / `&#xHH;` without the `&#` and `;`: `"65"` or `"x41"`.
    CharRef(String),
    Comment(String),
    /// `<!...>` without the delimiters.
    Declaration(String),
    /// `<?...>` without the delimiters.
    ProcessingInstruction(String),
}

enum Scan {
    Token(Token, usize),
    /// Not markup after all: this many bytes are literal text.
    Literal(usize),
    Incomplete,
}

#[derive(Debug, Default)]
pub struct Tokenizer {
    buffer: String,
}

impl Tokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `chunk` and return every token that is complete so far.
    pub fn push(&mut self, chunk: &str) -> Vec<Token> {
        self.buffer.push_str(chunk);
        self.drain(false)
    }

    /// Flush everything still buffered at the end of the input.
    pub fn finish(&mut self) -> Vec<Token> {
        self.drain(true)
    }

    /// Input held back waiting for the rest of a construct.
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    fn drain(&mut self, at_eof: bool) -> Vec<Token> {
        let input = std::mem::take(&mut self.buffer);
        let bytes = input.as_bytes();
        let mut out = Vec::new();
        let mut pos = 0;

        // Slice endpoints always fall on ASCII structural bytes, so they are
        // valid UTF-8 boundaries.
        while pos < bytes.len() {
            let scan = match bytes[pos] {
                b'<' => scan_markup(&input[pos..], at_eof),
                b'&' => scan_reference(&input[pos..], at_eof),
                _ => {
                    let end = memchr2(b'<', b'&', &bytes[pos..])
                        .map(|rel| pos + rel)
                        .unwrap_or(bytes.len());
                    Scan::Literal(end - pos)
                }
            };
            match scan {
                Scan::Token(token, consumed) => {
                    out.push(token);
                    pos += consumed;
                }
                Scan::Literal(len) => {
                    out.push(Token::Text(input[pos..pos + len].to_string()));
                    pos += len;
                }
                Scan::Incomplete if at_eof => {
                    out.push(Token::Text(input[pos..].to_string()));
                    pos = bytes.len();
                }
                Scan::Incomplete => break,
            }
        }

        self.buffer = input[pos..].to_string();
        out
    }
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':' | b'.')
}

fn is_attribute_name_byte(b: u8) -> bool {
    !b.is_ascii_whitespace() && !matches!(b, b'=' | b'/' | b'>' | b'"' | b'\'')
}

fn scan_markup(s: &str, at_eof: bool) -> Scan {
    let bytes = s.as_bytes();
    if bytes.len() < 2 {
        return Scan::Incomplete;
    }

    if s.starts_with(COMMENT_START) {
        return match s[COMMENT_START.len()..].find(COMMENT_END) {
            Some(end) => {
                let body_end = COMMENT_START.len() + end;
                Scan::Token(
                    Token::Comment(s[COMMENT_START.len()..body_end].to_string()),
                    body_end + COMMENT_END.len(),
                )
            }
            None => Scan::Incomplete,
        };
    }

    match bytes[1] {
        b'!' => {
            if COMMENT_START.starts_with(s) {
                return Scan::Incomplete;
            }
            match s.find('>') {
                Some(end) => Scan::Token(Token::Declaration(s[2..end].to_string()), end + 1),
                None => Scan::Incomplete,
            }
        }
        b'?' => match s.find('>') {
            Some(end) => Scan::Token(
                Token::ProcessingInstruction(s[2..end].to_string()),
                end + 1,
            ),
            None => Scan::Incomplete,
        },
        b'/' => {
            if bytes.len() == 2 {
                return Scan::Incomplete;
            }
            if !bytes[2].is_ascii_alphabetic() {
                return Scan::Literal(2);
            }
            match s.find('>') {
                Some(end) => {
                    let name_end = 2 + bytes[2..end]
                        .iter()
                        .take_while(|b| is_name_byte(**b))
                        .count();
                    Scan::Token(
                        Token::EndTag {
                            name: s[2..name_end].to_ascii_lowercase(),
                            raw: s[..=end].to_string(),
                        },
                        end + 1,
                    )
                }
                None => Scan::Incomplete,
            }
        }
        b if b.is_ascii_alphabetic() => match find_tag_end(bytes) {
            Some(end) => Scan::Token(parse_start_tag(s, end), end + 1),
            None if at_eof => Scan::Literal(1),
            None => Scan::Incomplete,
        },
        _ => Scan::Literal(1),
    }
}

/// Index of the `>` closing a start tag, skipping over quoted values.
fn find_tag_end(bytes: &[u8]) -> Option<usize> {
    let mut quote: Option<u8> = None;
    let mut after_equals = false;
    for (i, &b) in bytes.iter().enumerate().skip(1) {
        match quote {
            Some(q) => {
                if b == q {
                    quote = None;
                }
            }
            None => match b {
                b'>' => return Some(i),
                b'"' | b'\'' if after_equals => quote = Some(b),
                _ => {}
            },
        }
        if !b.is_ascii_whitespace() {
            after_equals = b == b'=';
        }
    }
    None
}

fn parse_start_tag(s: &str, end: usize) -> Token {
    let bytes = s.as_bytes();
    let name_end = 1 + bytes[1..end].iter().take_while(|b| is_name_byte(**b)).count();
    let name = s[1..name_end].to_ascii_lowercase();

    let mut attributes: Vec<Attribute> = Vec::new();
    let mut self_closing = false;
    let mut k = name_end;
    let skip_whitespace = |k: &mut usize| {
        while *k < end && bytes[*k].is_ascii_whitespace() {
            *k += 1;
        }
    };

    loop {
        skip_whitespace(&mut k);
        if k >= end {
            break;
        }
        if bytes[k] == b'/' {
            if k + 1 == end {
                self_closing = true;
            }
            k += 1;
            continue;
        }
        let attr_start = k;
        while k < end && is_attribute_name_byte(bytes[k]) {
            k += 1;
        }
        if attr_start == k {
            k += 1;
            continue;
        }
        let attr_name = s[attr_start..k].to_ascii_lowercase();

        skip_whitespace(&mut k);
        let value = if k < end && bytes[k] == b'=' {
            k += 1;
            skip_whitespace(&mut k);
            if k < end && (bytes[k] == b'"' || bytes[k] == b'\'') {
                let quote = bytes[k];
                k += 1;
                let value_start = k;
                while k < end && bytes[k] != quote {
                    k += 1;
                }
                let value = s[value_start..k].to_string();
                if k < end {
                    k += 1;
                }
                Some(value)
            } else {
                let value_start = k;
                while k < end && !bytes[k].is_ascii_whitespace() {
                    if bytes[k] == b'/' && k + 1 == end {
                        break;
                    }
                    k += 1;
                }
                Some(s[value_start..k].to_string())
            }
        } else {
            None
        };
        attributes.push((attr_name, value));
    }

    Token::StartTag {
        name,
        attributes,
        self_closing,
        raw: s[..=end].to_string(),
    }
}

#[derive(Clone, Copy)]
enum Reference {
    Decimal,
    Hex,
    Named,
}

impl Reference {
    fn accepts(self, b: u8) -> bool {
        match self {
            Reference::Decimal => b.is_ascii_digit(),
            Reference::Hex => b.is_ascii_hexdigit(),
            Reference::Named => b.is_ascii_alphanumeric() || b == b'-' || b == b'.',
        }
    }
}

fn scan_reference(s: &str, at_eof: bool) -> Scan {
    let bytes = s.as_bytes();
    if bytes.len() < 2 {
        return if at_eof { Scan::Literal(1) } else { Scan::Incomplete };
    }

    let (start, kind) = match bytes[1] {
        b'#' => match bytes.get(2) {
            Some(b'x' | b'X') => (3, Reference::Hex),
            Some(_) => (2, Reference::Decimal),
            None if at_eof => return Scan::Literal(1),
            None => return Scan::Incomplete,
        },
        b if b.is_ascii_alphabetic() => (1, Reference::Named),
        _ => return Scan::Literal(1),
    };

    let run = bytes[start..].iter().take_while(|b| kind.accepts(**b)).count();
    let end = start + run;
    if end == bytes.len() && !at_eof {
        return Scan::Incomplete;
    }
    if run == 0 {
        return Scan::Literal(1);
    }

    let consumed = if bytes.get(end) == Some(&b';') { end + 1 } else { end };
    let token = match kind {
        Reference::Named => Token::EntityRef(s[1..end].to_string()),
        Reference::Decimal | Reference::Hex => Token::CharRef(s[2..end].to_string()),
    };
    Scan::Token(token, consumed)
}
