//! Component record repository and its in-memory implementation.

use crate::model::component::ComponentError;
use crate::model::key::Key;
use crate::xml::XmlError;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, MutexGuard};

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors raised by repositories and the object store.
#[derive(Debug)]
pub enum RepoError {
    Component(ComponentError),
    Xml(XmlError),
    NotFound {
        component: String,
        key: Key,
    },
    VersionConflict {
        component: String,
        key: Key,
        expected: u32,
        actual: u32,
    },
    KeyConflict {
        component: String,
        key: Key,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Component(err) => write!(f, "{err}"),
            Self::Xml(err) => write!(f, "{err}"),
            Self::NotFound { component, key } => write!(f, "{component} not found: {key}"),
            Self::VersionConflict {
                component,
                key,
                expected,
                actual,
            } => write!(
                f,
                "{component} {key} was changed by someone else: expected version {expected}, stored version {actual}"
            ),
            Self::KeyConflict { component, key } => {
                write!(f, "{component} already exists: {key}")
            }
            Self::InvalidData(message) => write!(f, "invalid stored component data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Component(err) => Some(err),
            Self::Xml(err) => Some(err),
            Self::NotFound { .. } => None,
            Self::VersionConflict { .. } => None,
            Self::KeyConflict { .. } => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<ComponentError> for RepoError {
    fn from(value: ComponentError) -> Self {
        Self::Component(value)
    }
}

impl From<XmlError> for RepoError {
    fn from(value: XmlError) -> Self {
        Self::Xml(value)
    }
}

/// One stored component row: node name, identity, version and XML payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentRecord {
    pub component: String,
    pub key: Key,
    pub version: u32,
    pub xml: String,
}

/// Storage contract for serialized components.
pub trait ComponentRepository {
    /// Next generated id for `component` keys; ids start at 1.
    fn next_id(&self, component: &str) -> RepoResult<i64>;
    /// Inserts a new record; fails with `KeyConflict` when the key exists.
    fn insert(&self, record: ComponentRecord) -> RepoResult<()>;
    /// Replaces a record and returns its new version.
    fn update(&self, record: ComponentRecord, expected_version: Option<u32>) -> RepoResult<u32>;
    fn get(&self, component: &str, key: &Key) -> RepoResult<Option<ComponentRecord>>;
    /// Records of one component type in insertion order.
    fn list(&self, component: &str) -> RepoResult<Vec<ComponentRecord>>;
    fn delete(&self, component: &str, key: &Key) -> RepoResult<()>;
}

impl<R: ComponentRepository + ?Sized> ComponentRepository for &R {
    fn next_id(&self, component: &str) -> RepoResult<i64> {
        (**self).next_id(component)
    }

    fn insert(&self, record: ComponentRecord) -> RepoResult<()> {
        (**self).insert(record)
    }

    fn update(&self, record: ComponentRecord, expected_version: Option<u32>) -> RepoResult<u32> {
        (**self).update(record, expected_version)
    }

    fn get(&self, component: &str, key: &Key) -> RepoResult<Option<ComponentRecord>> {
        (**self).get(component, key)
    }

    fn list(&self, component: &str) -> RepoResult<Vec<ComponentRecord>> {
        (**self).list(component)
    }

    fn delete(&self, component: &str, key: &Key) -> RepoResult<()> {
        (**self).delete(component, key)
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    records: Vec<ComponentRecord>,
    sequences: HashMap<String, i64>,
}

impl MemoryState {
    fn position(&self, component: &str, key: &Key) -> Option<usize> {
        self.records
            .iter()
            .position(|record| record.component == component && record.key == *key)
    }
}

/// Thread-safe repository keeping records in process memory.
#[derive(Debug, Default)]
pub struct InMemoryComponentRepository {
    state: Mutex<MemoryState>,
}

impl InMemoryComponentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored records across component types.
    pub fn len(&self) -> RepoResult<usize> {
        Ok(self.lock()?.records.len())
    }

    pub fn is_empty(&self) -> RepoResult<bool> {
        Ok(self.lock()?.records.is_empty())
    }

    fn lock(&self) -> RepoResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| RepoError::InvalidData("repository lock poisoned".to_string()))
    }
}

impl ComponentRepository for InMemoryComponentRepository {
    fn next_id(&self, component: &str) -> RepoResult<i64> {
        let mut state = self.lock()?;
        let next = state.sequences.entry(component.to_string()).or_insert(0);
        *next += 1;
        Ok(*next)
    }

    fn insert(&self, record: ComponentRecord) -> RepoResult<()> {
        let mut state = self.lock()?;
        if !record.key.is_assigned() {
            return Err(ComponentError::KeyNotAssigned(record.component).into());
        }
        if state.position(&record.component, &record.key).is_some() {
            return Err(RepoError::KeyConflict {
                component: record.component,
                key: record.key,
            });
        }
        state.records.push(record);
        Ok(())
    }

    fn update(&self, record: ComponentRecord, expected_version: Option<u32>) -> RepoResult<u32> {
        let mut state = self.lock()?;
        let index = state
            .position(&record.component, &record.key)
            .ok_or_else(|| RepoError::NotFound {
                component: record.component.clone(),
                key: record.key.clone(),
            })?;

        let stored = &mut state.records[index];
        if let Some(expected) = expected_version {
            if stored.version != expected {
                return Err(RepoError::VersionConflict {
                    component: record.component,
                    key: record.key,
                    expected,
                    actual: stored.version,
                });
            }
        }

        let version = stored.version + 1;
        *stored = ComponentRecord { version, ..record };
        Ok(version)
    }

    fn get(&self, component: &str, key: &Key) -> RepoResult<Option<ComponentRecord>> {
        let state = self.lock()?;
        Ok(state
            .position(component, key)
            .map(|index| state.records[index].clone()))
    }

    fn list(&self, component: &str) -> RepoResult<Vec<ComponentRecord>> {
        let state = self.lock()?;
        Ok(state
            .records
            .iter()
            .filter(|record| record.component == component)
            .cloned()
            .collect())
    }

    fn delete(&self, component: &str, key: &Key) -> RepoResult<()> {
        let mut state = self.lock()?;
        let index = state
            .position(component, key)
            .ok_or_else(|| RepoError::NotFound {
                component: component.to_string(),
                key: key.clone(),
            })?;
        state.records.remove(index);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ComponentRecord, ComponentRepository, InMemoryComponentRepository, RepoError};
    use crate::model::key::Key;

    fn record(id: &str, xml: &str) -> ComponentRecord {
        ComponentRecord {
            component: "PSXSearch".to_string(),
            key: Key::assigned(["SEARCHID"], [id]).expect("valid key"),
            version: 0,
            xml: xml.to_string(),
        }
    }

    #[test]
    fn ids_are_sequential_per_component() {
        let repo = InMemoryComponentRepository::new();
        assert_eq!(repo.next_id("PSXSearch").expect("id"), 1);
        assert_eq!(repo.next_id("PSXSearch").expect("id"), 2);
        assert_eq!(repo.next_id("PSXAction").expect("id"), 1);
    }

    #[test]
    fn update_checks_expected_version() {
        let repo = InMemoryComponentRepository::new();
        repo.insert(record("1", "<a/>")).expect("insert");

        assert_eq!(repo.update(record("1", "<b/>"), Some(0)).expect("update"), 1);
        let err = repo
            .update(record("1", "<c/>"), Some(0))
            .expect_err("stale version must fail");
        assert!(matches!(
            err,
            RepoError::VersionConflict {
                expected: 0,
                actual: 1,
                ..
            }
        ));

        let stored = repo
            .get("PSXSearch", &Key::assigned(["SEARCHID"], ["1"]).expect("valid key"))
            .expect("get")
            .expect("record exists");
        assert_eq!(stored.xml, "<b/>");
        assert_eq!(stored.version, 1);
    }

    #[test]
    fn insert_rejects_existing_and_unassigned_keys() {
        let repo = InMemoryComponentRepository::new();
        repo.insert(record("1", "<a/>")).expect("insert");
        assert!(matches!(
            repo.insert(record("1", "<a/>")),
            Err(RepoError::KeyConflict { .. })
        ));

        let unassigned = ComponentRecord {
            key: Key::new(["SEARCHID"]),
            ..record("1", "<a/>")
        };
        assert!(matches!(
            repo.insert(unassigned),
            Err(RepoError::Component(_))
        ));
    }

    #[test]
    fn delete_missing_returns_not_found() {
        let repo = InMemoryComponentRepository::new();
        let key = Key::assigned(["SEARCHID"], ["9"]).expect("valid key");
        assert!(matches!(
            repo.delete("PSXSearch", &key),
            Err(RepoError::NotFound { .. })
        ));
        assert!(repo.is_empty().expect("lock"));
    }
}
