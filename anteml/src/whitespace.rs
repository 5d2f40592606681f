//! Whitespace stripping for markup documents.
//!
//! Markup is usually written indented and wrapped for readability, which
//! would otherwise end up verbatim on the terminal. [`WhitespaceFilter`]
//! sits between the tokenizer and dispatch and rewrites the whitespace in
//! text tokens:
//!
//! - a run of two or more whitespace characters becomes one space,
//! - whitespace right before a tag that is itself followed by whitespace is
//!   dropped (`a <b> c` becomes `a<b> c`),
//! - at the start of the document, the first whitespace after the leading
//!   tags is dropped,
//! - at the end of the document, the first whitespace followed only by tags
//!   and whitespace is dropped.
//!
//! Whitespace inside tags, comments and attribute values is left alone.
//! Whether a piece of whitespace survives depends on what comes after it,
//! so whitespace and any markup behind it are held back until the next text
//! arrives or the document ends. The output is the same however the input
//! was split into chunks.

use crate::tokenizer::Token;

#[derive(Debug)]
enum Piece {
    Space(String),
    /// Tags, comments, declarations and processing instructions.
    Markup(Token),
    /// Non-whitespace text and references.
    Content(Token),
}

impl Piece {
    fn into_token(self) -> Token {
        match self {
            Piece::Space(space) => Token::Text(space),
            Piece::Markup(token) | Piece::Content(token) => token,
        }
    }
}

#[derive(Debug)]
pub struct WhitespaceFilter {
    held: Vec<Piece>,
    /// Nothing but markup has been released yet.
    at_start: bool,
}

impl Default for WhitespaceFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl WhitespaceFilter {
    pub fn new() -> Self {
        Self {
            held: Vec::new(),
            at_start: true,
        }
    }

    /// Filter the next tokens of the document, returning those that are
    /// decided.
    pub fn push(&mut self, tokens: Vec<Token>) -> Vec<Token> {
        let mut out = Vec::new();
        for token in tokens {
            match token {
                Token::Text(text) => {
                    for (is_space, run) in runs(&text) {
                        if is_space {
                            self.hold_space(run);
                        } else {
                            self.held.push(Piece::Content(Token::Text(run.to_string())));
                            self.release(&mut out, false);
                        }
                    }
                }
                Token::EntityRef(_) | Token::CharRef(_) => {
                    self.held.push(Piece::Content(token));
                    self.release(&mut out, false);
                }
                markup if self.held.is_empty() => out.push(markup),
                markup => self.held.push(Piece::Markup(markup)),
            }
        }
        coalesce(out)
    }

    /// End of document: release everything held back.
    pub fn finish(&mut self) -> Vec<Token> {
        let mut out = Vec::new();
        self.release(&mut out, true);
        self.at_start = true;
        coalesce(out)
    }

    /// Whitespace and markup waiting for a decision.
    pub fn pending(&self) -> usize {
        self.held.len()
    }

    pub fn clear(&mut self) {
        self.held.clear();
        self.at_start = true;
    }

    fn hold_space(&mut self, run: &str) {
        match self.held.last_mut() {
            Some(Piece::Space(space)) => space.push_str(run),
            _ => self.held.push(Piece::Space(run.to_string())),
        }
    }

    /// Decide every held piece. Unless `at_end`, the last held piece is
    /// content, so each lookahead below stays inside `held`.
    fn release(&mut self, out: &mut Vec<Token>, at_end: bool) {
        let pieces = std::mem::take(&mut self.held);
        let mut keep = vec![true; pieces.len()];

        for i in 0..pieces.len() {
            if matches!(pieces[i], Piece::Space(_))
                && matches!(pieces.get(i + 1), Some(Piece::Markup(_)))
                && matches!(pieces.get(i + 2), Some(Piece::Space(_)))
            {
                keep[i] = false;
            }
        }

        if self.at_start {
            let first = (0..pieces.len())
                .find(|&i| keep[i] && !matches!(pieces[i], Piece::Markup(_)));
            if let Some(i) = first {
                if matches!(pieces[i], Piece::Space(_)) {
                    keep[i] = false;
                }
                self.at_start = false;
            }
        }

        if at_end {
            let trailing = (0..pieces.len()).find(|&i| {
                keep[i]
                    && matches!(pieces[i], Piece::Space(_))
                    && pieces[i + 1..].iter().all(|p| !matches!(p, Piece::Content(_)))
            });
            if let Some(i) = trailing {
                keep[i] = false;
            }
        }

        for (piece, kept) in pieces.into_iter().zip(keep) {
            match piece {
                _ if !kept => {}
                Piece::Space(space) if space.chars().nth(1).is_some() => {
                    out.push(Token::Text(" ".to_string()));
                }
                piece => out.push(piece.into_token()),
            }
        }
    }
}

/// Split text into alternating whitespace and non-whitespace runs.
fn runs(text: &str) -> impl Iterator<Item = (bool, &str)> {
    let mut rest = text;
    std::iter::from_fn(move || {
        let space = rest.chars().next()?.is_whitespace();
        let end = rest
            .find(|c: char| c.is_whitespace() != space)
            .unwrap_or(rest.len());
        let (run, tail) = rest.split_at(end);
        rest = tail;
        Some((space, run))
    })
}

/// Merge adjacent text tokens.
fn coalesce(tokens: Vec<Token>) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());
    for token in tokens {
        match (out.last_mut(), token) {
            (Some(Token::Text(previous)), Token::Text(text)) => previous.push_str(&text),
            (_, token) => out.push(token),
        }
    }
    out
}
