//! `anteml`: ANSI Terminal Markup Language.
//!
//! AnTeML is a small SGML-like vocabulary (`<FG RED>`, `<B>`, `<SCREEN
//! WRAP=OFF>`, ...) that this crate translates into ANSI/VT escape
//! sequences. Every tag type keeps a stack of presentation states, so nested
//! and interleaved tags restore exactly what was in effect before them, even
//! when the document is fed in pieces.
//!
//! # Quick start
//!
//! ```
//! use anteml::ParserOptions;
//!
//! let out = anteml::render("<fg red>Hi <b>there</b></fg>", ParserOptions::default()).unwrap();
//! assert_eq!(out, "\x1b[31mHi \x1b[22m\x1b[1mthere\x1b[22m\x1b[39m");
//! ```
//!
//! For streaming, create a [`Parser`] with a sink and call
//! [`Parser::feed`] for every chunk, then [`Parser::close`].

pub mod alias;
pub mod attributes;
pub mod elements;
pub mod entities;
pub mod error;
pub mod parser;
pub mod tokenizer;
pub mod whitespace;

pub use alias::Alias;
pub use attributes::{Boolean, Color, ColorCache, ColorKind, FontWeight, ScreenMode};
pub use elements::{Attribute, Element, ElementKind, StateStack};
pub use error::*;
pub use parser::{Parser, ParserOptions, Sink, TagKind, default_element_map, render};
pub use tokenizer::{Token, Tokenizer};
pub use whitespace::WhitespaceFilter;
