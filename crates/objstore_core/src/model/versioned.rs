//! Optimistic-locking version carried by versionable components.

use super::component::{ComponentError, DbComponent};
use crate::xml::{TreeWalker, XmlElement, XmlResult};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Stored row version; unset until the component is first saved or read.
///
/// Persistence metadata: two stamps always compare equal so that component
/// equality stays content-only.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct VersionStamp(Option<u32>);

impl VersionStamp {
    pub fn get(&self) -> Option<u32> {
        self.0
    }

    /// Sets the version once.
    ///
    /// # Errors
    /// - `VersionAlreadySet` when a version is present; call `clear` first.
    pub fn set(&mut self, version: u32) -> Result<(), ComponentError> {
        if let Some(current) = self.0 {
            return Err(ComponentError::VersionAlreadySet(current));
        }
        self.0 = Some(version);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.0 = None;
    }

    pub(crate) fn force(&mut self, version: u32) {
        self.0 = Some(version);
    }

    pub(crate) fn write_xml(&self, element: &mut XmlElement) {
        if let Some(version) = self.0 {
            element.set_attr("version", version.to_string());
        }
    }

    pub(crate) fn read_xml(walker: &TreeWalker<'_>) -> XmlResult<Self> {
        Ok(Self(walker.attr_parsed::<u32>("version")?))
    }
}

impl PartialEq for VersionStamp {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl Eq for VersionStamp {}

impl Hash for VersionStamp {
    fn hash<H: Hasher>(&self, _state: &mut H) {}
}

/// Components whose stored rows carry a version for optimistic locking.
pub trait VersionableDbComponent: DbComponent {
    fn stamp(&self) -> &VersionStamp;

    fn stamp_mut(&mut self) -> &mut VersionStamp;

    fn version(&self) -> Option<u32> {
        self.stamp().get()
    }

    fn set_version(&mut self, version: u32) -> Result<(), ComponentError> {
        self.stamp_mut().set(version)
    }

    fn clear_version(&mut self) {
        self.stamp_mut().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::VersionStamp;
    use crate::model::component::ComponentError;

    #[test]
    fn version_is_set_once_until_cleared() {
        let mut stamp = VersionStamp::default();
        assert_eq!(stamp.get(), None);

        stamp.set(3).expect("first set succeeds");
        assert_eq!(stamp.set(4), Err(ComponentError::VersionAlreadySet(3)));

        stamp.clear();
        stamp.set(4).expect("set after clear succeeds");
        assert_eq!(stamp.get(), Some(4));
    }

    #[test]
    fn stamps_never_affect_equality() {
        let mut left = VersionStamp::default();
        left.force(9);
        assert_eq!(left, VersionStamp::default());
    }
}
