//! Typed object store over a component repository.
//!
//! # Responsibility
//! - Save components according to their `DbState`.
//! - Assign generated keys and maintain optimistic-locking versions.
//! - Rebuild typed components from stored XML.
//!
//! # Invariants
//! - A successful save leaves the component and all owned children
//!   `Unmodified`, with a persisted key.
//! - A failed save leaves the component's state untouched.
//! - Loaded components always carry the stored version, not the one embedded
//!   in the payload.

use crate::model::component::{ComponentError, DbComponent, DbState};
use crate::model::key::Key;
use crate::repo::component_repo::{ComponentRecord, ComponentRepository, RepoError, RepoResult};
use crate::xml::XmlFormat;
use log::{debug, error, info};

/// Object store entry point for typed component persistence.
pub struct ObjectStore<R: ComponentRepository> {
    repo: R,
    format: XmlFormat,
}

impl<R: ComponentRepository> ObjectStore<R> {
    /// Creates a store writing compact XML records.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            format: XmlFormat::compact(),
        }
    }

    pub fn with_format(repo: R, format: XmlFormat) -> Self {
        Self { repo, format }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Persists one component according to its state.
    ///
    /// # Contract
    /// - `New`: validates, assigns a generated key when needed, inserts with
    ///   version 0.
    /// - `Modified`: validates and updates; versionable components must carry
    ///   the stored version or the save fails with `VersionConflict`.
    /// - `Unmodified`: no-op.
    /// - `MarkedForDelete`: deletes the stored row if there is one.
    pub fn save<T: DbComponent>(&self, component: &mut T) -> RepoResult<()> {
        let result = match component.state() {
            DbState::Unmodified => {
                debug!(
                    "event=component_save module=store status=skipped component={} key={}",
                    T::NODE_NAME,
                    component.key()
                );
                return Ok(());
            }
            DbState::New => self.insert(component),
            DbState::Modified => self.update(component),
            DbState::MarkedForDelete => self.remove(component),
        };

        match &result {
            Ok(()) => info!(
                "event=component_save module=store status=ok component={} key={} version={}",
                T::NODE_NAME,
                component.key(),
                component
                    .version_stamp()
                    .and_then(|stamp| stamp.get())
                    .map_or_else(|| "none".to_string(), |version| version.to_string())
            ),
            Err(err) => error!(
                "event=component_save module=store status=error component={} key={} error={}",
                T::NODE_NAME,
                component.key(),
                err
            ),
        }
        result
    }

    /// Loads one component by key.
    pub fn load<T: DbComponent>(&self, key: &Key) -> RepoResult<Option<T>> {
        match self.repo.get(T::NODE_NAME, key)? {
            Some(record) => Ok(Some(self.decode(&record)?)),
            None => Ok(None),
        }
    }

    /// Loads every stored component of type `T` in insertion order.
    pub fn list<T: DbComponent>(&self) -> RepoResult<Vec<T>> {
        let records = self.repo.list(T::NODE_NAME)?;
        let mut components = Vec::with_capacity(records.len());
        for record in &records {
            components.push(self.decode(record)?);
        }
        debug!(
            "event=component_list module=store status=ok component={} count={}",
            T::NODE_NAME,
            components.len()
        );
        Ok(components)
    }

    /// Deletes a stored component by key.
    pub fn delete<T: DbComponent>(&self, key: &Key) -> RepoResult<()> {
        self.repo.delete(T::NODE_NAME, key)?;
        info!(
            "event=component_delete module=store status=ok component={} key={}",
            T::NODE_NAME,
            key
        );
        Ok(())
    }

    fn insert<T: DbComponent>(&self, component: &mut T) -> RepoResult<()> {
        component.validate()?;

        let mut key = component.key().clone();
        if !key.is_assigned() {
            if !(T::GENERATED_KEY && key.part_count() == 1) {
                return Err(ComponentError::KeyNotAssigned(T::NODE_NAME.to_string()).into());
            }
            let id = self.repo.next_id(T::NODE_NAME)?;
            key.assign([id.to_string()])?;
        }

        let mut staged = component.clone();
        *staged.base_mut().key_mut() = key.clone();
        if let Some(stamp) = staged.version_stamp_mut() {
            stamp.force(0);
        }
        staged.mark_persisted();

        self.repo.insert(ComponentRecord {
            component: T::NODE_NAME.to_string(),
            key,
            version: 0,
            xml: staged.to_xml_string(&self.format)?,
        })?;

        *component = staged;
        Ok(())
    }

    fn update<T: DbComponent>(&self, component: &mut T) -> RepoResult<()> {
        component.validate()?;

        let key = component.key().clone();
        if !key.is_assigned() {
            return Err(ComponentError::KeyNotAssigned(T::NODE_NAME.to_string()).into());
        }
        let expected = component.version_stamp().and_then(|stamp| stamp.get());
        if component.version_stamp().is_some() && expected.is_none() {
            return Err(RepoError::InvalidData(format!(
                "{} {key} has no version; load it before updating",
                T::NODE_NAME
            )));
        }

        let mut staged = component.clone();
        staged.mark_persisted();
        let version = self.repo.update(
            ComponentRecord {
                component: T::NODE_NAME.to_string(),
                key,
                version: expected.unwrap_or(0),
                xml: staged.to_xml_string(&self.format)?,
            },
            expected,
        )?;

        if let Some(stamp) = staged.version_stamp_mut() {
            stamp.force(version);
        }
        *component = staged;
        Ok(())
    }

    fn remove<T: DbComponent>(&self, component: &mut T) -> RepoResult<()> {
        let key = component.key().clone();
        if key.is_assigned() && key.is_persisted() {
            self.repo.delete(T::NODE_NAME, &key)?;
        }
        component.base_mut().key_mut().set_persisted(false);
        Ok(())
    }

    fn decode<T: DbComponent>(&self, record: &ComponentRecord) -> RepoResult<T> {
        let mut component = T::from_xml_str(&record.xml)?;
        if component.key() != &record.key {
            return Err(RepoError::InvalidData(format!(
                "{} record {} holds payload for {}",
                record.component,
                record.key,
                component.key()
            )));
        }
        if let Some(stamp) = component.version_stamp_mut() {
            stamp.force(record.version);
        }
        component.mark_persisted();
        Ok(component)
    }
}
