use serde::Serialize;

/// Invalid markup on an element or alias tag.
///
/// These are never recovered from inside the parser: the document that
/// produced one is abandoned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttributeError {
    #[error("<{tag}> tag has the incorrect number of attributes ({expected} expected, {given} given)")]
    WrongCount {
        tag: String,
        expected: &'static str,
        given: usize,
    },

    #[error("<{tag}> tag has too many attributes (max. {max} expected, {given} given)")]
    TooMany { tag: String, max: usize, given: usize },

    #[error("Attribute '{attribute}' specified without value on <{tag}> tag")]
    MissingValue { tag: String, attribute: String },

    #[error("Invalid {grammar} value '{value}' for attribute '{attribute}' on <{tag}> tag")]
    InvalidValue {
        tag: String,
        attribute: String,
        value: String,
        grammar: &'static str,
    },

    #[error("Attribute '{attribute}' specified more than once on <{tag}> tag")]
    Duplicate { tag: String, attribute: String },

    #[error("Unknown attribute '{attribute}' on <{tag}> tag")]
    Unknown { tag: String, attribute: String },
}

impl AttributeError {
    /// Name of the tag the error was raised on.
    pub fn tag(&self) -> &str {
        match self {
            Self::WrongCount { tag, .. }
            | Self::TooMany { tag, .. }
            | Self::MissingValue { tag, .. }
            | Self::InvalidValue { tag, .. }
            | Self::Duplicate { tag, .. }
            | Self::Unknown { tag, .. } => tag,
        }
    }

    /// The offending attribute, when the error concerns a single one.
    pub fn attribute(&self) -> Option<&str> {
        match self {
            Self::WrongCount { .. } | Self::TooMany { .. } => None,
            Self::MissingValue { attribute, .. }
            | Self::InvalidValue { attribute, .. }
            | Self::Duplicate { attribute, .. }
            | Self::Unknown { attribute, .. } => Some(attribute),
        }
    }
}

/// Errors returned while feeding a document to the parser.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid markup: {0}")]
    InvalidMarkup(#[from] AttributeError),

    #[error("Document processing was aborted by an earlier error; reset the parser to continue")]
    Aborted,
}
