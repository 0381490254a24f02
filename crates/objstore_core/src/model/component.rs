//! The keyed, stateful, XML-serializable component contract.
//!
//! # Responsibility
//! - Track identity (`Key`) and persistence state (`DbState`) for every
//!   object store record.
//! - Provide the shared XML envelope: root node, `state` attribute, optional
//!   `version` attribute and the leading `PSXKey` child.
//!
//! # Invariants
//! - Component equality is driven by key and content; state and version
//!   never participate.
//! - Natural-key components keep their key in sync with the content fields
//!   it is derived from.

use super::key::Key;
use super::versioned::VersionStamp;
use crate::xml::{TreeWalker, XmlElement, XmlError, XmlFormat, XmlResult};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};

/// Semantic errors raised by component mutation and validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentError {
    KeyArity { expected: usize, actual: usize },
    KeyNotAssigned(String),
    VersionAlreadySet(u32),
    InvalidName { kind: &'static str, value: String },
    Duplicate { kind: &'static str, name: String },
    NotFound { kind: &'static str, name: String },
    InvalidValue { field: &'static str, message: String },
}

impl Display for ComponentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::KeyArity { expected, actual } => {
                write!(f, "key expects {expected} value(s), got {actual}")
            }
            Self::KeyNotAssigned(component) => {
                write!(f, "key of {component} is not assigned")
            }
            Self::VersionAlreadySet(version) => {
                write!(f, "version is already set to {version}; clear it first")
            }
            Self::InvalidName { kind, value } => write!(f, "invalid {kind} name: `{value}`"),
            Self::Duplicate { kind, name } => write!(f, "duplicate {kind}: `{name}`"),
            Self::NotFound { kind, name } => write!(f, "{kind} not found: `{name}`"),
            Self::InvalidValue { field, message } => write!(f, "invalid {field}: {message}"),
        }
    }
}

impl Error for ComponentError {}

/// Persistence state of one component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DbState {
    /// Never persisted.
    New,
    /// Persisted, then changed in memory.
    Modified,
    /// Matches the persisted copy.
    Unmodified,
    /// Will be removed on the next save.
    MarkedForDelete,
}

impl DbState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Modified => "modified",
            Self::Unmodified => "unmodified",
            Self::MarkedForDelete => "markedForDelete",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "new" => Some(Self::New),
            "modified" => Some(Self::Modified),
            "unmodified" => Some(Self::Unmodified),
            "markedForDelete" => Some(Self::MarkedForDelete),
            _ => None,
        }
    }
}

/// Key and state shared by every component.
///
/// Equality and hashing look at the key only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentBase {
    key: Key,
    state: DbState,
}

impl ComponentBase {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            state: DbState::New,
        }
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn key_mut(&mut self) -> &mut Key {
        &mut self.key
    }

    pub fn state(&self) -> DbState {
        self.state
    }

    /// Records an in-memory change.
    ///
    /// `New` and `MarkedForDelete` are sticky; only `Unmodified` moves.
    pub fn set_modified(&mut self) {
        if self.state == DbState::Unmodified {
            self.state = DbState::Modified;
        }
    }

    pub fn mark_for_delete(&mut self) {
        self.state = DbState::MarkedForDelete;
    }

    /// Marks the row as stored; only an assigned key becomes persisted.
    pub fn mark_persisted(&mut self) {
        self.state = DbState::Unmodified;
        let assigned = self.key.is_assigned();
        self.key.set_persisted(assigned);
    }

    /// Resets to a never-persisted record; generated keys lose their values.
    pub fn reset_as_new(&mut self, clear_key: bool) {
        self.state = DbState::New;
        if clear_key {
            self.key.clear();
        } else {
            self.key.set_persisted(false);
        }
    }

    /// Re-derives a natural key from content values.
    pub fn rekey<V, T>(&mut self, values: V) -> Result<(), ComponentError>
    where
        V: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.key.assign(values)
    }

    fn write_xml(&self, element: &mut XmlElement) {
        element.set_attr("state", self.state.as_str());
        element.push_child(self.key.to_xml());
    }

    fn read_xml(walker: &TreeWalker<'_>, key_names: &[&str]) -> XmlResult<Self> {
        let state = match walker.optional_attr("state") {
            None => DbState::New,
            Some(raw) => DbState::parse(raw).ok_or_else(|| walker.invalid("state", raw))?,
        };
        let key = Key::from_xml(&walker.required_child(Key::NODE_NAME)?)?;
        if !key.has_names(key_names) {
            return Err(walker.invalid(Key::NODE_NAME, &key.names().join(",")));
        }
        Ok(Self { key, state })
    }
}

impl PartialEq for ComponentBase {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for ComponentBase {}

impl Hash for ComponentBase {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

/// Contract implemented by every object store record.
pub trait DbComponent: Clone + Debug + Sized {
    /// Root element name used for XML transport.
    const NODE_NAME: &'static str;

    /// Whether the store assigns the key on first save.
    const GENERATED_KEY: bool = false;

    /// Part names of this component's key.
    fn key_names() -> &'static [&'static str];

    fn base(&self) -> &ComponentBase;

    fn base_mut(&mut self) -> &mut ComponentBase;

    /// Appends component-specific attributes and children.
    fn write_content(&self, element: &mut XmlElement);

    /// Builds the component from its XML envelope.
    fn read_content(base: ComponentBase, walker: &TreeWalker<'_>) -> XmlResult<Self>;

    fn validate(&self) -> Result<(), ComponentError> {
        Ok(())
    }

    fn version_stamp(&self) -> Option<&VersionStamp> {
        None
    }

    fn version_stamp_mut(&mut self) -> Option<&mut VersionStamp> {
        None
    }

    /// Hook for components that own children, called by `duplicate`.
    fn reset_children_as_new(&mut self) {}

    fn key(&self) -> &Key {
        self.base().key()
    }

    fn state(&self) -> DbState {
        self.base().state()
    }

    fn mark_for_delete(&mut self) {
        self.base_mut().mark_for_delete();
    }

    /// Marks this component (and owned children, when overridden) as
    /// matching the stored copy.
    fn mark_persisted(&mut self) {
        self.base_mut().mark_persisted();
    }

    /// Copy that the store will treat as a brand-new record.
    fn duplicate(&self) -> Self {
        let mut copy = self.clone();
        copy.base_mut().reset_as_new(Self::GENERATED_KEY);
        if let Some(stamp) = copy.version_stamp_mut() {
            stamp.clear();
        }
        copy.reset_children_as_new();
        copy
    }

    fn to_xml(&self) -> XmlElement {
        let mut element = XmlElement::new(Self::NODE_NAME);
        if let Some(stamp) = self.version_stamp() {
            stamp.write_xml(&mut element);
        }
        self.base().write_xml(&mut element);
        self.write_content(&mut element);
        element
    }

    /// Reads and validates a component.
    ///
    /// # Errors
    /// - Wrong root node, malformed key, unknown state, or a component that
    ///   fails `validate`.
    fn from_xml(element: &XmlElement) -> XmlResult<Self> {
        let walker = TreeWalker::new(element);
        walker.expect_name(Self::NODE_NAME)?;
        let base = ComponentBase::read_xml(&walker, Self::key_names())?;
        let mut component = Self::read_content(base, &walker)?;
        if let Some(stamp) = component.version_stamp_mut() {
            *stamp = VersionStamp::read_xml(&walker)?;
        }
        component.validate().map_err(XmlError::Component)?;
        Ok(component)
    }

    fn to_xml_string(&self, format: &XmlFormat) -> XmlResult<String> {
        self.to_xml().to_xml_string(format)
    }

    fn from_xml_str(input: &str) -> XmlResult<Self> {
        Self::from_xml(&XmlElement::parse(input)?)
    }
}
