//! Owned child components with deletion tracking.
//!
//! # Invariants
//! - No two live items share an assigned key.
//! - A removed item that had been persisted stays in `deleted()`, marked for
//!   delete, until the owner is saved.
//! - Items never persisted simply disappear on removal.

use super::component::{ComponentError, DbComponent, DbState};
use super::key::Key;
use crate::xml::{TreeWalker, XmlElement, XmlResult};
use serde::{Deserialize, Serialize};

/// Ordered set of child components owned by one parent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependentSet<T> {
    items: Vec<T>,
    deleted: Vec<T>,
}

impl<T> Default for DependentSet<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            deleted: Vec::new(),
        }
    }
}

/// Live items only; pending deletions are bookkeeping.
impl<T: PartialEq> PartialEq for DependentSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl<T: Eq> Eq for DependentSet<T> {}

impl<T: DbComponent> DependentSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an item.
    ///
    /// # Errors
    /// - `Duplicate` when the item's assigned key is already present.
    pub fn add(&mut self, item: T) -> Result<(), ComponentError> {
        let index = self.items.len();
        self.insert_at(index, item)
    }

    /// Inserts an item at `index` (clamped to the end).
    pub fn insert_at(&mut self, index: usize, item: T) -> Result<(), ComponentError> {
        if item.key().is_assigned() && self.position(item.key()).is_some() {
            return Err(ComponentError::Duplicate {
                kind: T::NODE_NAME,
                name: item.key().to_string(),
            });
        }
        if item.key().is_assigned() {
            self.deleted.retain(|gone| gone.key() != item.key());
        }
        let index = index.min(self.items.len());
        self.items.insert(index, item);
        Ok(())
    }

    /// Removes the live item with an assigned `key`.
    pub fn remove(&mut self, key: &Key) -> Option<T> {
        let index = self.position(key)?;
        Some(self.remove_at(index))
    }

    /// Removes the first live item matching `pred`.
    pub fn remove_where(&mut self, pred: impl Fn(&T) -> bool) -> Option<T> {
        let index = self.items.iter().position(pred)?;
        Some(self.remove_at(index))
    }

    fn remove_at(&mut self, index: usize) -> T {
        let item = self.items.remove(index);
        if item.state() != DbState::New {
            let mut gone = item.clone();
            gone.mark_for_delete();
            self.deleted.push(gone);
        }
        item
    }

    /// Index of the live item with an assigned `key`.
    pub fn position(&self, key: &Key) -> Option<usize> {
        if !key.is_assigned() {
            return None;
        }
        self.items.iter().position(|item| item.key() == key)
    }

    pub fn get(&self, key: &Key) -> Option<&T> {
        self.position(key).map(|index| &self.items[index])
    }

    /// Mutable access; the item is marked modified.
    pub fn get_mut(&mut self, key: &Key) -> Option<&mut T> {
        let index = self.position(key)?;
        let item = &mut self.items[index];
        item.base_mut().set_modified();
        Some(item)
    }

    pub fn find(&self, pred: impl Fn(&T) -> bool) -> Option<&T> {
        self.items.iter().find(|item| pred(item))
    }

    /// Mutable access to the first match; the item is marked modified.
    pub fn find_mut(&mut self, pred: impl Fn(&T) -> bool) -> Option<&mut T> {
        let item = self.items.iter_mut().find(|item| pred(item))?;
        item.base_mut().set_modified();
        Some(item)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn deleted(&self) -> &[T] {
        &self.deleted
    }

    /// Removes every live item (tracking persisted ones as deleted).
    pub fn clear(&mut self) {
        while !self.items.is_empty() {
            self.remove_at(self.items.len() - 1);
        }
    }

    pub fn is_modified(&self) -> bool {
        !self.deleted.is_empty() || self.items.iter().any(|item| item.state() != DbState::Unmodified)
    }

    pub fn mark_persisted(&mut self) {
        self.deleted.clear();
        for item in &mut self.items {
            item.mark_persisted();
        }
    }

    /// Turns every live item into a new record and forgets deletions.
    pub fn reset_as_new(&mut self) {
        self.deleted.clear();
        for item in &mut self.items {
            *item = item.duplicate();
        }
    }

    pub(crate) fn clear_deleted(&mut self) {
        self.deleted.clear();
    }

    pub(crate) fn items_mut(&mut self) -> &mut Vec<T> {
        &mut self.items
    }

    pub(crate) fn push_deleted(&mut self, mut item: T) {
        item.mark_for_delete();
        self.deleted.push(item);
    }

    /// Writes live items followed by pending deletions.
    pub fn to_xml(&self, wrapper: &str) -> XmlElement {
        let mut element = XmlElement::new(wrapper);
        for item in self.items.iter().chain(&self.deleted) {
            element.push_child(item.to_xml());
        }
        element
    }

    /// Reads items of type `T`; children marked for delete become pending
    /// deletions. Other child nodes are ignored.
    pub fn from_xml(walker: &TreeWalker<'_>) -> XmlResult<Self> {
        let mut set = Self::new();
        for child in walker.children(T::NODE_NAME) {
            let item = T::from_xml(child.element())?;
            if item.state() == DbState::MarkedForDelete {
                set.deleted.push(item);
            } else {
                set.add(item)?;
            }
        }
        Ok(set)
    }
}

impl<'a, T> IntoIterator for &'a DependentSet<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
