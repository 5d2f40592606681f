//! Shorthand tags.
//!
//! An alias owns no state. Opening one rewrites it into its canonical tag
//! plus synthesized attributes, closing one rewrites it into the canonical
//! tag name, and the canonical element's handler does the rest. `<B>` and
//! `<FW BOLD>` therefore share one stack, and `<B>..</FW>` nests correctly.

use crate::elements::{Attribute, ElementKind};
use crate::error::AttributeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alias {
    /// `<B>` → `<FW BOLD>`
    Bold,
    /// `<L>` → `<FW LIGHT>`
    Light,
}

impl Alias {
    pub const ALL: [Alias; 2] = [Alias::Bold, Alias::Light];

    pub fn tag(self) -> &'static str {
        match self {
            Alias::Bold => "b",
            Alias::Light => "l",
        }
    }

    /// The element this alias stands for.
    ///
    /// The rewrite targets the tag name `fw`, not the element itself: if an
    /// `elementMap` binds `fw` to something else, the alias follows it.
    pub fn resolves_to(self) -> ElementKind {
        ElementKind::Fw
    }

    /// Rewrite an opening alias tag into `(canonical tag, attributes)`.
    pub fn open(
        self,
        tag: &str,
        attrs: &[Attribute],
    ) -> Result<(&'static str, Vec<Attribute>), AttributeError> {
        if !attrs.is_empty() {
            return Err(AttributeError::WrongCount {
                tag: tag.to_string(),
                expected: "0",
                given: attrs.len(),
            });
        }
        let weight = match self {
            Alias::Bold => "bold",
            Alias::Light => "light",
        };
        Ok((self.resolves_to().tag(), vec![(weight.to_string(), None)]))
    }

    /// Rewrite a closing alias tag into the canonical tag name.
    pub fn close(self) -> &'static str {
        self.resolves_to().tag()
    }
}
