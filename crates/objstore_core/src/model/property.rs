//! Name/value properties attached to searches, actions and display formats.

use super::component::{ComponentBase, ComponentError, DbComponent};
use super::dependent_set::DependentSet;
use super::key::Key;
use super::names::validate_name;
use crate::xml::{TreeWalker, XmlElement, XmlResult};
use serde::{Deserialize, Serialize};

const PROPERTY_KEY: &[&str] = &["PROPERTYNAME"];

/// One named property; the name is its natural key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Property {
    base: ComponentBase,
    name: String,
    value: String,
    description: Option<String>,
}

impl Property {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Result<Self, ComponentError> {
        let name = name.into();
        validate_name("property", &name)?;
        let key = Key::assigned(PROPERTY_KEY.iter().copied(), [name.as_str()])?;
        Ok(Self {
            base: ComponentBase::new(key),
            name,
            value: value.into(),
            description: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.base.set_modified();
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
        self.base.set_modified();
    }
}

impl DbComponent for Property {
    const NODE_NAME: &'static str = "PSXProperty";

    fn key_names() -> &'static [&'static str] {
        PROPERTY_KEY
    }

    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn write_content(&self, element: &mut XmlElement) {
        element.set_attr("name", self.name.as_str());
        element.push_text_child("Value", self.value.as_str());
        if let Some(description) = &self.description {
            element.push_text_child("Description", description.as_str());
        }
    }

    fn read_content(mut base: ComponentBase, walker: &TreeWalker<'_>) -> XmlResult<Self> {
        let name = walker.required_attr("name")?.to_string();
        validate_name("property", &name)?;
        base.rekey([name.as_str()])?;
        Ok(Self {
            base,
            name,
            value: walker.optional_text("Value").unwrap_or("").to_string(),
            description: walker.optional_text("Description").map(str::to_string),
        })
    }
}

/// Properties keyed by case-insensitive name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySet {
    items: DependentSet<Property>,
}

impl PropertySet {
    pub const NODE_NAME: &'static str = "PSXPropertySet";

    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a property or updates the value of an existing one.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> Result<(), ComponentError> {
        if let Some(existing) = self
            .items
            .find_mut(|property| property.name.eq_ignore_ascii_case(name))
        {
            existing.set_value(value);
            return Ok(());
        }
        self.items.add(Property::new(name, value)?)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.property(name).map(Property::value)
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.items
            .find(|property| property.name.eq_ignore_ascii_case(name))
    }

    pub fn remove(&mut self, name: &str) -> Option<Property> {
        self.items
            .remove_where(|property| property.name.eq_ignore_ascii_case(name))
    }

    pub fn names(&self) -> Vec<&str> {
        self.items.iter().map(Property::name).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Property> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn deleted(&self) -> &[Property] {
        self.items.deleted()
    }

    pub fn is_modified(&self) -> bool {
        self.items.is_modified()
    }

    pub fn mark_persisted(&mut self) {
        self.items.mark_persisted();
    }

    pub fn reset_as_new(&mut self) {
        self.items.reset_as_new();
    }

    pub fn to_xml(&self) -> XmlElement {
        self.items.to_xml(Self::NODE_NAME)
    }

    /// Reads the set; names colliding case-insensitively are rejected.
    pub fn from_xml(walker: &TreeWalker<'_>) -> XmlResult<Self> {
        walker.expect_name(Self::NODE_NAME)?;
        let read = DependentSet::<Property>::from_xml(walker)?;
        let mut set = Self::new();
        for property in read.iter() {
            if set.property(&property.name).is_some() {
                return Err(ComponentError::Duplicate {
                    kind: "property",
                    name: property.name.clone(),
                }
                .into());
            }
            set.items.add(property.clone())?;
        }
        for gone in read.deleted() {
            set.items.push_deleted(gone.clone());
        }
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::{Property, PropertySet};
    use crate::model::component::{ComponentError, DbComponent, DbState};

    #[test]
    fn new_property_rejects_invalid_names() {
        assert!(matches!(
            Property::new("max rows", "10"),
            Err(ComponentError::InvalidName { .. })
        ));
    }

    #[test]
    fn set_updates_case_insensitively() {
        let mut set = PropertySet::new();
        set.set("maxRows", "10").expect("insert");
        set.set("MAXROWS", "25").expect("update");

        assert_eq!(set.len(), 1);
        assert_eq!(set.get("maxrows"), Some("25"));
        assert_eq!(set.names(), vec!["maxRows"]);
    }

    #[test]
    fn removing_persisted_property_tracks_deletion() {
        let mut set = PropertySet::new();
        set.set("a", "1").expect("insert");
        set.set("b", "2").expect("insert");
        set.mark_persisted();
        assert!(!set.is_modified());

        let removed = set.remove("A").expect("property exists");
        assert_eq!(removed.name(), "a");
        assert_eq!(set.deleted().len(), 1);
        assert_eq!(set.deleted()[0].state(), DbState::MarkedForDelete);
        assert!(set.is_modified());

        let xml = set.to_xml();
        let read = PropertySet::from_xml(&crate::xml::TreeWalker::new(&xml)).expect("read back");
        assert_eq!(read, set);
        assert_eq!(read.deleted().len(), 1);
    }
}
