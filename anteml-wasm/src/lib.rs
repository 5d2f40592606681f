//! WASM bindings for `anteml`.
//!
//! Exposes the AnTeML renderer to JavaScript via wasm-bindgen.
//! Call `render()` to turn markup into ANSI sequences (for example to feed
//! xterm.js), or `check()` to validate markup without rendering it.

use anteml::{AttributeError, ParseError, ParserOptions};
use serde::Serialize;
use wasm_bindgen::prelude::*;

#[derive(Serialize)]
struct Diagnostic {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<AttributeError>,
}

fn options(strip_unknown: bool, strip_comments: bool) -> ParserOptions {
    ParserOptions {
        strip_unknown,
        strip_comments,
        ..ParserOptions::default()
    }
}

/// Render AnTeML markup to a string of ANSI escape sequences.
///
/// Invalid markup raises a JavaScript exception carrying the error message.
#[wasm_bindgen]
pub fn render(input: &str, strip_unknown: bool, strip_comments: bool) -> Result<String, JsError> {
    anteml::render(input, options(strip_unknown, strip_comments))
        .map_err(|e| JsError::new(&e.to_string()))
}

/// Validate AnTeML markup and return diagnostics as JSON.
///
/// Returns a JSON array of `{ message, error }` objects, where `error` is the
/// structured invalid-markup error (`kind`, `tag`, ...). An empty array means
/// the markup is valid.
#[wasm_bindgen]
pub fn check(input: &str) -> String {
    check_json(input)
}

fn check_json(input: &str) -> String {
    let diagnostics = match anteml::render(input, ParserOptions::default()) {
        Ok(_) => Vec::new(),
        Err(err) => {
            let error = match &err {
                ParseError::InvalidMarkup(inner) => Some(inner.clone()),
                ParseError::Aborted => None,
            };
            vec![Diagnostic {
                message: err.to_string(),
                error,
            }]
        }
    };
    serde_json::to_string(&diagnostics).unwrap_or_else(|_| "[]".to_string())
}
