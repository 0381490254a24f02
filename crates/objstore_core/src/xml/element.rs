//! Owned XML element tree backed by `quick-xml` events.

use super::{XmlError, XmlResult};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde::{Deserialize, Serialize};

/// Output options for `XmlElement::to_xml_string`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct XmlFormat {
    /// Spaces per nesting level; `0` writes a single line.
    pub indent: usize,
    /// Emit `<?xml version="1.0" encoding="UTF-8"?>` before the root.
    pub declaration: bool,
}

impl XmlFormat {
    /// Single-line output without declaration, used for stored records.
    pub fn compact() -> Self {
        Self {
            indent: 0,
            declaration: false,
        }
    }
}

impl Default for XmlFormat {
    fn default() -> Self {
        Self {
            indent: 2,
            declaration: true,
        }
    }
}

/// One element with ordered attributes, child elements and optional text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<XmlElement>,
    text: Option<String>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Sets an attribute, replacing any existing value under the same name.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn children(&self) -> &[XmlElement] {
        &self.children
    }

    /// First direct child with the given name.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|child| child.name == name)
    }

    pub fn children_named<'s, 'n>(
        &'s self,
        name: &'n str,
    ) -> impl Iterator<Item = &'s XmlElement> + 'n
    where
        's: 'n,
    {
        self.children.iter().filter(move |child| child.name == name)
    }

    pub fn push_child(&mut self, child: XmlElement) {
        self.children.push(child);
    }

    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.push_child(child);
        self
    }

    /// Appends `<name>text</name>`.
    pub fn push_text_child(&mut self, name: impl Into<String>, text: impl Into<String>) {
        let mut child = XmlElement::new(name);
        child.set_text(text);
        self.push_child(child);
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.text = if text.is_empty() { None } else { Some(text) };
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.set_text(text);
        self
    }

    /// Parses a complete document and returns its root element.
    ///
    /// # Errors
    /// - Malformed markup, unbalanced tags, more than one root element or
    ///   non-whitespace text outside the root.
    pub fn parse(input: &str) -> XmlResult<Self> {
        let mut reader = Reader::from_str(input);
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            let position = reader.buffer_position() as u64;
            let event = reader.read_event().map_err(|err| XmlError::Parse {
                position: reader.buffer_position() as u64,
                message: err.to_string(),
            })?;

            match event {
                Event::Start(start) => {
                    if root.is_some() && stack.is_empty() {
                        return Err(parse_error(position, "document has more than one root"));
                    }
                    stack.push(element_from_start(&start, position)?);
                }
                Event::Empty(start) => {
                    let element = element_from_start(&start, position)?;
                    attach(&mut stack, &mut root, element, position)?;
                }
                Event::End(_) => {
                    let mut element = stack
                        .pop()
                        .ok_or_else(|| parse_error(position, "closing tag without opening tag"))?;
                    element.finish_text();
                    attach(&mut stack, &mut root, element, position)?;
                }
                Event::Text(text) => {
                    let value = text.unescape().map_err(|err| XmlError::Parse {
                        position,
                        message: err.to_string(),
                    })?;
                    append_text(&mut stack, &value, position)?;
                }
                Event::CData(data) => {
                    let value = String::from_utf8(data.into_inner().into_owned())
                        .map_err(|err| parse_error(position, &err.to_string()))?;
                    append_text(&mut stack, &value, position)?;
                }
                Event::Eof => break,
                // Declarations, comments, processing instructions and doctype
                // carry nothing a component reads.
                _ => {}
            }
        }

        let position = reader.buffer_position() as u64;
        if let Some(open) = stack.last() {
            return Err(parse_error(
                position,
                &format!("element <{}> is not closed", open.name),
            ));
        }
        root.ok_or_else(|| parse_error(position, "document has no root element"))
    }

    /// Serializes this element as a document.
    pub fn to_xml_string(&self, format: &XmlFormat) -> XmlResult<String> {
        let mut writer = if format.indent > 0 {
            Writer::new_with_indent(Vec::new(), b' ', format.indent)
        } else {
            Writer::new(Vec::new())
        };

        if format.declaration {
            writer
                .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
                .map_err(write_error)?;
        }
        self.write_into(&mut writer)?;

        String::from_utf8(writer.into_inner()).map_err(write_error)
    }

    fn write_into<W: std::io::Write>(&self, writer: &mut Writer<W>) -> XmlResult<()> {
        let mut start = BytesStart::new(self.name.as_str());
        for (name, value) in &self.attributes {
            start.push_attribute((name.as_str(), value.as_str()));
        }

        let text = self.text.as_deref().filter(|text| !text.is_empty());
        if self.children.is_empty() && text.is_none() {
            return writer.write_event(Event::Empty(start)).map_err(write_error);
        }

        writer.write_event(Event::Start(start)).map_err(write_error)?;
        if let Some(text) = text {
            writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(write_error)?;
        }
        for child in &self.children {
            child.write_into(writer)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(self.name.as_str())))
            .map_err(write_error)
    }

    fn finish_text(&mut self) {
        let blank = self
            .text
            .as_deref()
            .map_or(true, |text| text.trim().is_empty());
        if !self.children.is_empty() && blank {
            self.text = None;
        }
    }
}

fn element_from_start(start: &BytesStart<'_>, position: u64) -> XmlResult<XmlElement> {
    let name = std::str::from_utf8(start.name().as_ref())
        .map_err(|err| parse_error(position, &err.to_string()))?
        .to_string();
    let mut element = XmlElement::new(name);

    for attribute in start.attributes() {
        let attribute = attribute.map_err(|err| parse_error(position, &err.to_string()))?;
        let key = std::str::from_utf8(attribute.key.as_ref())
            .map_err(|err| parse_error(position, &err.to_string()))?
            .to_string();
        let value = attribute
            .unescape_value()
            .map_err(|err| parse_error(position, &err.to_string()))?
            .into_owned();
        element.attributes.push((key, value));
    }

    Ok(element)
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
    position: u64,
) -> XmlResult<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(parse_error(position, "document has more than one root"));
    }
    *root = Some(element);
    Ok(())
}

fn append_text(stack: &mut [XmlElement], value: &str, position: u64) -> XmlResult<()> {
    match stack.last_mut() {
        Some(parent) => {
            parent.text.get_or_insert_with(String::new).push_str(value);
            Ok(())
        }
        None if value.trim().is_empty() => Ok(()),
        None => Err(parse_error(position, "text outside of the root element")),
    }
}

fn parse_error(position: u64, message: &str) -> XmlError {
    XmlError::Parse {
        position,
        message: message.to_string(),
    }
}

fn write_error(err: impl std::fmt::Display) -> XmlError {
    XmlError::Write(err.to_string())
}
