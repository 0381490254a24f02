//! Visibility contexts: where an action is hidden.
//!
//! Each entry pairs a context name (for example a content type or workflow
//! state category) with one value in that context. An action is visible in a
//! context/value pair unless an entry lists it.

use super::component::{ComponentBase, ComponentError, DbComponent};
use super::dependent_set::DependentSet;
use super::key::Key;
use super::names::require_label;
use crate::xml::{TreeWalker, XmlElement, XmlResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

const ENTRY_KEY: &[&str] = &["VISIBILITYCONTEXT", "VALUE"];

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VisibilityContextEntry {
    base: ComponentBase,
    context: String,
    value: String,
}

impl VisibilityContextEntry {
    pub fn new(context: impl Into<String>, value: impl Into<String>) -> Result<Self, ComponentError> {
        let context = context.into();
        let value = value.into();
        require_label("visibility context", &context)?;
        require_label("visibility value", &value)?;
        let key = Key::assigned(ENTRY_KEY.iter().copied(), [context.as_str(), value.as_str()])?;
        Ok(Self {
            base: ComponentBase::new(key),
            context,
            value,
        })
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl DbComponent for VisibilityContextEntry {
    const NODE_NAME: &'static str = "PSXVisibilityContextEntry";

    fn key_names() -> &'static [&'static str] {
        ENTRY_KEY
    }

    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn validate(&self) -> Result<(), ComponentError> {
        require_label("visibility context", &self.context)?;
        require_label("visibility value", &self.value)
    }

    fn write_content(&self, element: &mut XmlElement) {
        element.set_attr("context", self.context.as_str());
        element.push_text_child("Value", self.value.as_str());
    }

    fn read_content(mut base: ComponentBase, walker: &TreeWalker<'_>) -> XmlResult<Self> {
        let context = walker.required_attr("context")?.to_string();
        let value = walker.required_text("Value")?.to_string();
        base.rekey([context.as_str(), value.as_str()])?;
        Ok(Self {
            base,
            context,
            value,
        })
    }
}

/// All visibility entries of one action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityContexts {
    entries: DependentSet<VisibilityContextEntry>,
}

impl VisibilityContexts {
    pub const NODE_NAME: &'static str = "PSXVisibilityContexts";

    pub fn new() -> Self {
        Self::default()
    }

    /// Hides the action for `value` in `context`.
    ///
    /// Returns `false` when the entry already exists.
    pub fn add(&mut self, context: &str, value: &str) -> Result<bool, ComponentError> {
        let entry = VisibilityContextEntry::new(context, value)?;
        if self.entries.get(entry.key()).is_some() {
            return Ok(false);
        }
        self.entries.add(entry)?;
        Ok(true)
    }

    pub fn values(&self, context: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|entry| entry.context == context)
            .map(VisibilityContextEntry::value)
            .collect()
    }

    /// Distinct context names in sorted order.
    pub fn contexts(&self) -> Vec<&str> {
        self.entries
            .iter()
            .map(VisibilityContextEntry::context)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn remove_value(&mut self, context: &str, value: &str) -> bool {
        self.entries
            .remove_where(|entry| entry.context == context && entry.value == value)
            .is_some()
    }

    /// Removes every entry of `context`, returning how many were removed.
    pub fn remove_context(&mut self, context: &str) -> usize {
        let mut removed = 0;
        while self
            .entries
            .remove_where(|entry| entry.context == context)
            .is_some()
        {
            removed += 1;
        }
        removed
    }

    pub fn is_visible(&self, context: &str, value: &str) -> bool {
        !self
            .entries
            .iter()
            .any(|entry| entry.context == context && entry.value == value)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, VisibilityContextEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn deleted(&self) -> &[VisibilityContextEntry] {
        self.entries.deleted()
    }

    pub fn is_modified(&self) -> bool {
        self.entries.is_modified()
    }

    pub fn mark_persisted(&mut self) {
        self.entries.mark_persisted();
    }

    pub fn reset_as_new(&mut self) {
        self.entries.reset_as_new();
    }

    pub fn to_xml(&self) -> XmlElement {
        self.entries.to_xml(Self::NODE_NAME)
    }

    pub fn from_xml(walker: &TreeWalker<'_>) -> XmlResult<Self> {
        walker.expect_name(Self::NODE_NAME)?;
        Ok(Self {
            entries: DependentSet::from_xml(walker)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{VisibilityContextEntry, VisibilityContexts};
    use crate::model::component::{ComponentError, DbComponent};
    use crate::xml::{TreeWalker, XmlElement, XmlError};

    #[test]
    fn add_is_idempotent_per_pair() {
        let mut contexts = VisibilityContexts::new();
        assert!(contexts.add("ContentType", "301").expect("valid entry"));
        assert!(!contexts.add("ContentType", "301").expect("valid entry"));
        assert!(contexts.add("ContentType", "302").expect("valid entry"));
        assert!(contexts.add("AssignmentType", "Reader").expect("valid entry"));

        assert_eq!(contexts.len(), 3);
        assert_eq!(contexts.values("ContentType"), vec!["301", "302"]);
        assert_eq!(contexts.contexts(), vec!["AssignmentType", "ContentType"]);
        assert!(!contexts.is_visible("ContentType", "301"));
        assert!(contexts.is_visible("ContentType", "999"));
    }

    #[test]
    fn remove_context_drops_all_values() {
        let mut contexts = VisibilityContexts::new();
        contexts.add("ContentType", "301").expect("valid entry");
        contexts.add("ContentType", "302").expect("valid entry");
        contexts.add("Workflow", "5").expect("valid entry");
        contexts.mark_persisted();

        assert_eq!(contexts.remove_context("ContentType"), 2);
        assert_eq!(contexts.deleted().len(), 2);
        assert!(contexts.remove_value("Workflow", "5"));
        assert!(!contexts.remove_value("Workflow", "5"));
        assert!(contexts.is_empty());
    }

    #[test]
    fn rejects_blank_entries() {
        let mut contexts = VisibilityContexts::new();
        assert!(contexts.add(" ", "1").is_err());
        assert!(contexts.add("ContentType", "").is_err());
    }

    #[test]
    fn blank_entries_are_rejected_on_read() {
        let valid = VisibilityContextEntry::new("ContentType", "301").expect("valid entry");
        for blank in ["", "  "] {
            let mut entry = valid.to_xml();
            entry.set_attr("context", blank);
            let set = XmlElement::new(VisibilityContexts::NODE_NAME).with_child(entry);
            assert!(matches!(
                VisibilityContexts::from_xml(&TreeWalker::new(&set)),
                Err(XmlError::Component(ComponentError::InvalidValue {
                    field: "visibility context",
                    ..
                }))
            ));
        }

        let mut entry = valid.to_xml();
        entry.set_attr("context", "Workflow");
        let set = XmlElement::new(VisibilityContexts::NODE_NAME).with_child(entry);
        let read = VisibilityContexts::from_xml(&TreeWalker::new(&set)).expect("valid entry");
        assert!(!read.is_visible("Workflow", "301"));
    }
}
