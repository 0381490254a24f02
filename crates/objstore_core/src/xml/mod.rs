//! XML transport layer for object store components.
//!
//! # Responsibility
//! - Hold parsed documents as a small owned element tree.
//! - Give component `from_xml` code a strict, error-reporting walker.
//!
//! # Invariants
//! - Parsing never panics; malformed input maps to `XmlError::Parse`.
//! - Serialized output always escapes attribute and text values.

use crate::model::component::ComponentError;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod element;
mod walker;

pub use element::{XmlElement, XmlFormat};
pub use walker::TreeWalker;

pub type XmlResult<T> = Result<T, XmlError>;

/// Errors raised while reading or writing component XML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlError {
    Parse {
        position: u64,
        message: String,
    },
    Write(String),
    UnexpectedElement {
        expected: String,
        found: String,
    },
    MissingElement {
        parent: String,
        name: String,
    },
    MissingAttribute {
        element: String,
        name: String,
    },
    InvalidValue {
        element: String,
        name: String,
        value: String,
    },
    Component(ComponentError),
}

impl Display for XmlError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse { position, message } => {
                write!(f, "xml parse error at byte {position}: {message}")
            }
            Self::Write(message) => write!(f, "xml write error: {message}"),
            Self::UnexpectedElement { expected, found } => {
                write!(f, "expected element <{expected}>, found <{found}>")
            }
            Self::MissingElement { parent, name } => {
                write!(f, "element <{parent}> is missing required child <{name}>")
            }
            Self::MissingAttribute { element, name } => {
                write!(f, "element <{element}> is missing required attribute `{name}`")
            }
            Self::InvalidValue {
                element,
                name,
                value,
            } => write!(f, "invalid value `{value}` for `{name}` in <{element}>"),
            Self::Component(err) => write!(f, "{err}"),
        }
    }
}

impl Error for XmlError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Component(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ComponentError> for XmlError {
    fn from(value: ComponentError) -> Self {
        Self::Component(value)
    }
}

/// Formats a boolean the way component attributes store flags.
pub fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
