//! Read-side cursor used by component `from_xml` implementations.

use super::{XmlElement, XmlError, XmlResult};
use std::str::FromStr;

/// Strict accessor over one element.
///
/// Every lookup that fails names the element and the missing piece, so a
/// rejected document can be traced without re-reading it.
#[derive(Debug, Clone, Copy)]
pub struct TreeWalker<'a> {
    element: &'a XmlElement,
}

impl<'a> TreeWalker<'a> {
    pub fn new(element: &'a XmlElement) -> Self {
        Self { element }
    }

    pub fn element(&self) -> &'a XmlElement {
        self.element
    }

    pub fn name(&self) -> &'a str {
        self.element.name()
    }

    pub fn expect_name(&self, expected: &str) -> XmlResult<()> {
        if self.element.name() == expected {
            return Ok(());
        }
        Err(XmlError::UnexpectedElement {
            expected: expected.to_string(),
            found: self.element.name().to_string(),
        })
    }

    pub fn optional_attr(&self, name: &str) -> Option<&'a str> {
        self.element.attr(name)
    }

    pub fn required_attr(&self, name: &str) -> XmlResult<&'a str> {
        self.element
            .attr(name)
            .ok_or_else(|| XmlError::MissingAttribute {
                element: self.element.name().to_string(),
                name: name.to_string(),
            })
    }

    /// Reads a `yes|no|true|false` attribute, falling back to `default` when
    /// the attribute is absent.
    pub fn attr_flag(&self, name: &str, default: bool) -> XmlResult<bool> {
        match self.element.attr(name) {
            None => Ok(default),
            Some(raw) => parse_flag(raw).ok_or_else(|| self.invalid(name, raw)),
        }
    }

    pub fn attr_parsed<T: FromStr>(&self, name: &str) -> XmlResult<Option<T>> {
        match self.element.attr(name) {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|_| self.invalid(name, raw)),
        }
    }

    pub fn optional_child(&self, name: &str) -> Option<TreeWalker<'a>> {
        self.element.child(name).map(TreeWalker::new)
    }

    pub fn required_child(&self, name: &str) -> XmlResult<TreeWalker<'a>> {
        self.optional_child(name)
            .ok_or_else(|| XmlError::MissingElement {
                parent: self.element.name().to_string(),
                name: name.to_string(),
            })
    }

    pub fn children<'n>(&self, name: &'n str) -> impl Iterator<Item = TreeWalker<'a>> + 'n
    where
        'a: 'n,
    {
        self.element.children_named(name).map(TreeWalker::new)
    }

    /// Text of this element, empty when the element has none.
    pub fn text(&self) -> &'a str {
        self.element.text().unwrap_or("")
    }

    /// Text of a required child; the child must exist and be non-empty.
    pub fn required_text(&self, name: &str) -> XmlResult<&'a str> {
        let child = self.required_child(name)?;
        let text = child.text();
        if text.trim().is_empty() {
            return Err(self.invalid(name, text));
        }
        Ok(text)
    }

    /// Text of an optional child; absent and empty children both read as `None`.
    pub fn optional_text(&self, name: &str) -> Option<&'a str> {
        self.optional_child(name)
            .map(|child| child.text())
            .filter(|text| !text.is_empty())
    }

    pub fn text_parsed<T: FromStr>(&self, name: &str) -> XmlResult<Option<T>> {
        match self.optional_text(name) {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|_| self.invalid(name, raw)),
        }
    }

    pub fn invalid(&self, name: &str, value: &str) -> XmlError {
        XmlError::InvalidValue {
            element: self.element.name().to_string(),
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "yes" | "true" => Some(true),
        "no" | "false" => Some(false),
        _ => None,
    }
}
