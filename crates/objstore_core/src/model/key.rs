//! Composite component identity.
//!
//! # Invariants
//! - An assigned key holds exactly one value per part name.
//! - Part names compare case-insensitively; values compare exactly.
//! - The persisted flag never participates in equality or hashing.

use super::component::ComponentError;
use crate::xml::{yes_no, TreeWalker, XmlElement, XmlError, XmlResult};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};

/// Identity of one component row, possibly assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawKey")]
pub struct Key {
    names: Vec<String>,
    values: Option<Vec<String>>,
    persisted: bool,
}

/// Unchecked serde shape of `Key`.
#[derive(Deserialize)]
struct RawKey {
    names: Vec<String>,
    values: Option<Vec<String>>,
    #[serde(default)]
    persisted: bool,
}

impl TryFrom<RawKey> for Key {
    type Error = ComponentError;

    fn try_from(raw: RawKey) -> Result<Self, Self::Error> {
        let mut key = Self::new(raw.names);
        if let Some(values) = raw.values {
            key.assign(values)?;
        }
        key.persisted = raw.persisted && key.is_assigned();
        Ok(key)
    }
}

impl Key {
    pub const NODE_NAME: &'static str = "PSXKey";

    /// Creates an unassigned key with the given part names.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            values: None,
            persisted: false,
        }
    }

    /// Creates an assigned key.
    ///
    /// # Errors
    /// - `KeyArity` when the value count differs from the name count.
    pub fn assigned<I, S, V, T>(names: I, values: V) -> Result<Self, ComponentError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        V: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut key = Self::new(names);
        key.assign(values)?;
        Ok(key)
    }

    /// Assigns (or reassigns) all part values at once.
    pub fn assign<V, T>(&mut self, values: V) -> Result<(), ComponentError>
    where
        V: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        if values.len() != self.names.len() {
            return Err(ComponentError::KeyArity {
                expected: self.names.len(),
                actual: values.len(),
            });
        }
        self.values = Some(values);
        Ok(())
    }

    pub fn is_assigned(&self) -> bool {
        self.values.is_some()
    }

    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    pub fn set_persisted(&mut self, persisted: bool) {
        self.persisted = persisted;
    }

    /// Drops values and the persisted flag, keeping part names.
    pub fn clear(&mut self) {
        self.values = None;
        self.persisted = false;
    }

    pub fn part_count(&self) -> usize {
        self.names.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> Option<&[String]> {
        self.values.as_deref()
    }

    /// Value of one part, looked up case-insensitively by part name.
    pub fn value(&self, name: &str) -> Option<&str> {
        let index = self
            .names
            .iter()
            .position(|part| part.eq_ignore_ascii_case(name))?;
        self.values
            .as_ref()
            .map(|values| values[index].as_str())
    }

    /// Numeric value of a single-part key.
    pub fn numeric_value(&self) -> Option<i64> {
        match self.values.as_deref() {
            Some([only]) => only.trim().parse().ok(),
            _ => None,
        }
    }

    /// Returns whether the part names match `expected` (case-insensitive).
    pub fn has_names(&self, expected: &[&str]) -> bool {
        self.names.len() == expected.len()
            && self
                .names
                .iter()
                .zip(expected)
                .all(|(name, other)| name.eq_ignore_ascii_case(other))
    }

    pub fn to_xml(&self) -> XmlElement {
        let mut element =
            XmlElement::new(Self::NODE_NAME).with_attr("isPersisted", yes_no(self.persisted));
        for (index, name) in self.names.iter().enumerate() {
            let mut part = XmlElement::new(name.as_str());
            if let Some(values) = &self.values {
                part.set_text(values[index].as_str());
            }
            element.push_child(part);
        }
        element
    }

    /// Reads a key; a key whose parts are all empty reads as unassigned.
    ///
    /// # Errors
    /// - Keys without parts, or with only some parts filled in.
    pub fn from_xml(walker: &TreeWalker<'_>) -> XmlResult<Self> {
        walker.expect_name(Self::NODE_NAME)?;
        let persisted = walker.attr_flag("isPersisted", false)?;

        let parts = walker.element().children();
        if parts.is_empty() {
            return Err(XmlError::MissingElement {
                parent: Self::NODE_NAME.to_string(),
                name: "key part".to_string(),
            });
        }

        let names: Vec<String> = parts.iter().map(|part| part.name().to_string()).collect();
        let values: Vec<String> = parts
            .iter()
            .map(|part| part.text().unwrap_or("").to_string())
            .collect();
        let filled = values.iter().filter(|value| !value.is_empty()).count();

        let mut key = Self::new(names);
        if filled == values.len() {
            key.values = Some(values);
        } else if filled > 0 {
            let missing = parts
                .iter()
                .find(|part| part.text().unwrap_or("").is_empty())
                .map_or("", XmlElement::name);
            return Err(walker.invalid(missing, ""));
        }
        key.persisted = persisted && key.is_assigned();
        Ok(key)
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.names.len() == other.names.len()
            && self
                .names
                .iter()
                .zip(&other.names)
                .all(|(left, right)| left.eq_ignore_ascii_case(right))
            && self.values == other.values
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.names.len().hash(state);
        for name in &self.names {
            name.to_ascii_lowercase().hash(state);
        }
        self.values.hash(state);
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[", Self::NODE_NAME)?;
        for (index, name) in self.names.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            match &self.values {
                Some(values) => write!(f, "{name}={}", values[index])?,
                None => write!(f, "{name}=?")?,
            }
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::Key;
    use crate::model::component::ComponentError;
    use crate::xml::{TreeWalker, XmlElement};
    use std::collections::HashSet;

    #[test]
    fn deserialize_rejects_mismatched_arity() {
        let err = serde_json::from_str::<Key>(
            r#"{"names":["A","B"],"values":["1"],"persisted":false}"#,
        )
        .expect_err("one value for two parts must fail");
        assert!(err.to_string().contains("key expects 2 value(s), got 1"));

        let key: Key = serde_json::from_str(r#"{"names":["A"],"values":null,"persisted":true}"#)
            .expect("unassigned key");
        assert!(!key.is_persisted());

        let key: Key = serde_json::from_str(r#"{"names":["A","B"],"values":["1","2"]}"#)
            .expect("assigned key");
        assert_eq!(key.to_xml().children().len(), 2);
        assert_eq!(key.to_string(), "PSXKey[A=1, B=2]");
    }

    #[test]
    fn assign_checks_arity() {
        let mut key = Key::new(["VISIBILITYCONTEXT", "VALUE"]);
        assert_eq!(
            key.assign(["1"]),
            Err(ComponentError::KeyArity {
                expected: 2,
                actual: 1
            })
        );
        assert!(!key.is_assigned());

        key.assign(["1", "Folder"]).expect("arity matches");
        assert_eq!(key.value("value"), Some("Folder"));
        assert_eq!(key.numeric_value(), None);
    }

    #[test]
    fn equality_ignores_name_case_and_persisted_flag() {
        let mut left = Key::assigned(["SEARCHID"], ["7"]).expect("valid key");
        let right = Key::assigned(["searchid"], ["7"]).expect("valid key");
        left.set_persisted(true);

        assert_eq!(left, right);
        let set: HashSet<Key> = [left, right].into_iter().collect();
        assert_eq!(set.len(), 1);

        assert_ne!(
            Key::assigned(["SEARCHID"], ["7"]).expect("valid key"),
            Key::assigned(["SEARCHID"], ["8"]).expect("valid key")
        );
        assert_ne!(Key::new(["SEARCHID"]), Key::assigned(["SEARCHID"], ["7"]).expect("valid key"));
    }

    #[test]
    fn xml_keeps_assignment_and_persisted_flag() {
        let mut key = Key::assigned(["ACTIONID"], ["42"]).expect("valid key");
        key.set_persisted(true);

        let element = key.to_xml();
        assert_eq!(element.attr("isPersisted"), Some("yes"));
        let read = Key::from_xml(&TreeWalker::new(&element)).expect("key should read");
        assert_eq!(read, key);
        assert!(read.is_persisted());
        assert_eq!(read.numeric_value(), Some(42));

        let unassigned = Key::new(["ACTIONID"]).to_xml();
        let read = Key::from_xml(&TreeWalker::new(&unassigned)).expect("key should read");
        assert!(!read.is_assigned());
    }

    #[test]
    fn from_xml_rejects_partial_keys() {
        let element = XmlElement::parse(
            "<PSXKey isPersisted=\"no\"><VISIBILITYCONTEXT>1</VISIBILITYCONTEXT><VALUE/></PSXKey>",
        )
        .expect("xml should parse");
        assert!(Key::from_xml(&TreeWalker::new(&element)).is_err());

        let empty = XmlElement::new("PSXKey");
        assert!(Key::from_xml(&TreeWalker::new(&empty)).is_err());
    }

    #[test]
    fn display_shows_unassigned_parts() {
        assert_eq!(Key::new(["A", "B"]).to_string(), "PSXKey[A=?, B=?]");
        assert_eq!(
            Key::assigned(["A"], ["1"]).expect("valid key").to_string(),
            "PSXKey[A=1]"
        );
    }
}
