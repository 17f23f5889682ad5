use indexmap::IndexMap;
use std::cmp::Ordering;
use std::fmt;
use std::hash::Hash;
use std::ops::{Bound, RangeBounds};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HierarchyError {
    #[error("Entity '{child}' already exists in '{parent}'")]
    DuplicateId { parent: String, child: String },

    #[error("Entity '{child}' does not exist in '{parent}'")]
    MissingId { parent: String, child: String },

    #[error("Child at position {position} of '{parent}' has no value for the sort key")]
    MissingSortKey { parent: String, position: usize },
}

/// A value that can live inside an [`Entity`].
///
/// Every child exposes the key it is stored under and a back-reference to the
/// identifier of the container that currently owns it. The key must never
/// change while the child is held by a container.
pub trait Node: Clone {
    type Key: Clone + Eq + Hash + fmt::Debug;

    fn key(&self) -> &Self::Key;

    fn parent(&self) -> Option<&str>;

    fn set_parent(&mut self, parent: Option<String>);

    /// Produces a copy in which every descendant is cloned independently.
    fn deep_copy(&self) -> Self {
        self.clone()
    }
}

/// An ordered, keyed collection of children with parent back-references.
///
/// Children are kept in insertion order and indexed by their key, so both
/// positional and keyed access are available. Identifiers are unique among
/// siblings; adding a child stamps it with this container's id and removing it
/// clears that reference again.
#[derive(Debug, Clone)]
pub struct Entity<T: Node> {
    /// Identifier of this container.
    id: String,
    /// Identifier of the container holding this one, if any.
    parent: Option<String>,
    /// Children in insertion order, keyed by their identifier.
    children: IndexMap<T::Key, T>,
}

impl<T: Node> Entity<T> {
    /// Creates an empty, root-level container.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent: None,
            children: IndexMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn contains(&self, key: &T::Key) -> bool {
        self.children.contains_key(key)
    }

    /// Returns the keys of all children in insertion order.
    pub fn ids(&self) -> impl DoubleEndedIterator<Item = &T::Key> + ExactSizeIterator {
        self.children.keys()
    }

    /// Iterates over children in insertion order; call `.rev()` for reverse order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.children.values()
    }

    pub fn iter_mut(&mut self) -> impl DoubleEndedIterator<Item = &mut T> + ExactSizeIterator {
        self.children.values_mut()
    }

    pub fn get_by_id(&self, key: &T::Key) -> Option<&T> {
        self.children.get(key)
    }

    pub fn get_by_id_mut(&mut self, key: &T::Key) -> Option<&mut T> {
        self.children.get_mut(key)
    }

    /// Looks up a child by position. Negative positions count from the end.
    pub fn get_by_position(&self, position: isize) -> Option<&T> {
        let index = self.resolve_position(position)?;
        self.children.get_index(index).map(|(_, child)| child)
    }

    pub fn get_by_position_mut(&mut self, position: isize) -> Option<&mut T> {
        let index = self.resolve_position(position)?;
        self.children.get_index_mut(index).map(|(_, child)| child)
    }

    pub fn position_of(&self, key: &T::Key) -> Option<usize> {
        self.children.get_index_of(key)
    }

    /// Returns a new root-level container with the same id holding copies of
    /// the children selected by `range`.
    ///
    /// Bounds follow slice semantics with negative values counting from the
    /// end; out-of-range bounds are clamped and an inverted range yields an
    /// empty container.
    pub fn slice<R: RangeBounds<isize>>(&self, range: R) -> Self {
        let len = self.children.len() as isize;
        let normalize = |value: isize| if value < 0 { value + len } else { value };
        let start = match range.start_bound() {
            Bound::Included(&s) => normalize(s),
            Bound::Excluded(&s) => normalize(s).saturating_add(1),
            Bound::Unbounded => 0,
        }
        .clamp(0, len);
        let end = match range.end_bound() {
            Bound::Included(&e) => normalize(e).saturating_add(1),
            Bound::Excluded(&e) => normalize(e),
            Bound::Unbounded => len,
        }
        .clamp(0, len);

        let mut sliced = Self::new(self.id.clone());
        let count = (end - start).max(0) as usize;
        for child in self.children.values().skip(start as usize).take(count) {
            sliced.attach(child.clone());
        }
        sliced
    }

    /// Appends a child and makes this container its parent.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyError::DuplicateId`] if a child with the same key is
    /// already present; the container is left untouched in that case.
    pub fn add(&mut self, child: T) -> Result<(), HierarchyError> {
        if self.children.contains_key(child.key()) {
            return Err(HierarchyError::DuplicateId {
                parent: self.id.clone(),
                child: format!("{:?}", child.key()),
            });
        }
        self.attach(child);
        Ok(())
    }

    /// Detaches a child, clearing its parent reference, and hands it back.
    pub fn remove(&mut self, key: &T::Key) -> Result<T, HierarchyError> {
        let mut child = self
            .children
            .shift_remove(key)
            .ok_or_else(|| HierarchyError::MissingId {
                parent: self.id.clone(),
                child: format!("{key:?}"),
            })?;
        child.set_parent(None);
        Ok(child)
    }

    /// Keeps only the children for which `keep` returns `true`, preserving order.
    pub fn retain<F: FnMut(&T) -> bool>(&mut self, mut keep: F) {
        self.children.retain(|_, child| keep(child));
    }

    pub fn clear(&mut self) {
        self.children.clear();
    }

    /// Creates a root-level container with the same id whose children are
    /// independent copies re-added to the new container.
    pub fn copy(&self) -> Self {
        let mut copied = Self::new(self.id.clone());
        for child in self.children.values() {
            copied.attach(child.clone());
        }
        copied
    }

    /// Like [`Entity::copy`], but every descendant is deep-copied through
    /// [`Node::deep_copy`].
    pub fn deep_copy(&self) -> Self {
        let mut copied = Self::new(self.id.clone());
        for child in self.children.values() {
            copied.attach(child.deep_copy());
        }
        copied
    }

    /// Stable sort of the children with a caller supplied comparator.
    pub fn sort_by<F>(&mut self, mut compare: F, reverse: bool)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        if reverse {
            self.children.sort_by(|_, a, _, b| compare(b, a));
        } else {
            self.children.sort_by(|_, a, _, b| compare(a, b));
        }
    }

    /// Stable sort of the children by a key selector.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyError::MissingSortKey`] without reordering anything
    /// if the selector yields `None` for any child.
    pub fn sort_by_key<K, F>(&mut self, mut key: F, reverse: bool) -> Result<(), HierarchyError>
    where
        K: PartialOrd,
        F: FnMut(&T) -> Option<K>,
    {
        let mut keys = Vec::with_capacity(self.children.len());
        for (position, child) in self.children.values().enumerate() {
            match key(child) {
                Some(k) => keys.push(k),
                None => {
                    return Err(HierarchyError::MissingSortKey {
                        parent: self.id.clone(),
                        position,
                    });
                }
            }
        }

        let mut order: Vec<usize> = (0..keys.len()).collect();
        order.sort_by(|&a, &b| {
            let ordering = keys[a].partial_cmp(&keys[b]).unwrap_or(Ordering::Equal);
            if reverse { ordering.reverse() } else { ordering }
        });

        let mut entries: Vec<Option<(T::Key, T)>> =
            std::mem::take(&mut self.children).into_iter().map(Some).collect();
        self.children = order
            .into_iter()
            .filter_map(|index| entries[index].take())
            .collect();
        Ok(())
    }

    fn attach(&mut self, mut child: T) {
        child.set_parent(Some(self.id.clone()));
        self.children.insert(child.key().clone(), child);
    }

    fn resolve_position(&self, position: isize) -> Option<usize> {
        let len = self.children.len() as isize;
        let index = if position < 0 { position + len } else { position };
        (0..len).contains(&index).then_some(index as usize)
    }
}

impl<T: Node> Node for Entity<T> {
    type Key = String;

    fn key(&self) -> &String {
        &self.id
    }

    fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    fn set_parent(&mut self, parent: Option<String>) {
        self.parent = parent;
    }

    fn deep_copy(&self) -> Self {
        Entity::deep_copy(self)
    }
}

impl<'a, T: Node> IntoIterator for &'a Entity<T> {
    type Item = &'a T;
    type IntoIter = indexmap::map::Values<'a, T::Key, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.children.values()
    }
}
