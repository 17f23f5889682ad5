use super::contact::{Contact, ContactError, ContactId};
use super::entity::{Entity, HierarchyError, Node};
use super::sequence::{Sequence, SequenceError};
use crate::core::utils::residues::GAP_CHAR;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::ops::RangeBounds;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ContactMapError {
    #[error("Contact map '{map}' has no sequence attached")]
    MissingSequence { map: String },

    #[error("Residue {index} lies outside the sequence of contact map '{map}' (length {length})")]
    ResidueOutOfRange {
        map: String,
        index: isize,
        length: usize,
    },

    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),

    #[error(transparent)]
    Contact(#[from] ContactError),

    #[error(transparent)]
    Sequence(#[from] SequenceError),
}

/// An ordered collection of contacts that belong to one sequence.
///
/// Contacts are keyed by their [`ContactId`], so the same residue pair can only
/// appear once. The attached [`Sequence`] is optional while the map is being
/// populated but is required by every sequence-aware operation.
#[derive(Debug, Clone)]
pub struct ContactMap {
    contacts: Entity<Contact>,
    sequence: Option<Sequence>,
}

impl ContactMap {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            contacts: Entity::new(id),
            sequence: None,
        }
    }

    pub fn id(&self) -> &str {
        self.contacts.id()
    }

    pub fn sequence(&self) -> Option<&Sequence> {
        self.sequence.as_ref()
    }

    pub fn set_sequence(&mut self, sequence: Option<Sequence>) {
        self.sequence = sequence;
    }

    pub fn with_sequence(mut self, sequence: Sequence) -> Self {
        self.sequence = Some(sequence);
        self
    }

    /// The attached sequence, or [`ContactMapError::MissingSequence`].
    pub fn require_sequence(&self) -> Result<&Sequence, ContactMapError> {
        self.sequence
            .as_ref()
            .ok_or_else(|| ContactMapError::MissingSequence {
                map: self.id().to_string(),
            })
    }

    /// Read access to the underlying container.
    pub fn contacts(&self) -> &Entity<Contact> {
        &self.contacts
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    pub fn contains(&self, id: &ContactId) -> bool {
        self.contacts.contains(id)
    }

    pub fn ids(&self) -> impl DoubleEndedIterator<Item = &ContactId> + ExactSizeIterator {
        self.contacts.ids()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Contact> + ExactSizeIterator {
        self.contacts.iter()
    }

    pub fn iter_mut(&mut self) -> impl DoubleEndedIterator<Item = &mut Contact> + ExactSizeIterator {
        self.contacts.iter_mut()
    }

    pub fn get(&self, id: &ContactId) -> Option<&Contact> {
        self.contacts.get_by_id(id)
    }

    pub fn get_mut(&mut self, id: &ContactId) -> Option<&mut Contact> {
        self.contacts.get_by_id_mut(id)
    }

    pub fn get_by_position(&self, position: isize) -> Option<&Contact> {
        self.contacts.get_by_position(position)
    }

    /// A new map with the same id and sequence holding copies of the selected contacts.
    pub fn slice<R: RangeBounds<isize>>(&self, range: R) -> Self {
        Self {
            contacts: self.contacts.slice(range),
            sequence: self.sequence.clone(),
        }
    }

    pub fn add(&mut self, contact: Contact) -> Result<(), HierarchyError> {
        self.contacts.add(contact)
    }

    pub fn remove(&mut self, id: &ContactId) -> Result<Contact, HierarchyError> {
        self.contacts.remove(id)
    }

    pub fn retain<F: FnMut(&Contact) -> bool>(&mut self, keep: F) {
        self.contacts.retain(keep);
    }

    /// Root-level copy with independently re-added contacts.
    pub fn copy(&self) -> Self {
        Self {
            contacts: self.contacts.copy(),
            sequence: self.sequence.clone(),
        }
    }

    pub fn deep_copy(&self) -> Self {
        Self {
            contacts: self.contacts.deep_copy(),
            sequence: self.sequence.clone(),
        }
    }

    pub fn sort_by<F>(&mut self, compare: F, reverse: bool)
    where
        F: FnMut(&Contact, &Contact) -> Ordering,
    {
        self.contacts.sort_by(compare, reverse);
    }

    pub fn sort_by_score(&mut self, reverse: bool) {
        self.contacts.sort_by(
            |a, b| {
                a.raw_score()
                    .partial_cmp(&b.raw_score())
                    .unwrap_or(Ordering::Equal)
            },
            reverse,
        );
    }

    /// The `count` highest scoring contacts, in descending score order.
    pub fn highest_scoring(&self, count: usize) -> Self {
        let mut sorted = self.copy();
        sorted.sort_by_score(true);
        sorted.slice(..count.min(isize::MAX as usize) as isize)
    }

    /// Residue pairs of all contacts, using the current primary numbering.
    pub fn as_list(&self) -> Vec<(isize, isize)> {
        self.contacts
            .iter()
            .map(|c| (c.res1_seq, c.res2_seq))
            .collect()
    }

    /// Sorted set of residue numbers referenced by at least one contact.
    pub fn residue_positions(&self) -> BTreeSet<isize> {
        self.contacts
            .iter()
            .flat_map(|c| [c.res1_seq, c.res2_seq])
            .collect()
    }

    /// Sorted set of alternate residue numbers referenced by at least one contact.
    pub fn alt_residue_positions(&self) -> BTreeSet<isize> {
        self.contacts
            .iter()
            .flat_map(|c| [c.res1_altseq, c.res2_altseq])
            .collect()
    }

    /// The attached sequence with every residue not referenced by a contact
    /// replaced by the gap character.
    pub fn repr_sequence(&self) -> Result<Sequence, ContactMapError> {
        self.masked_sequence(&self.residue_positions())
    }

    /// Like [`ContactMap::repr_sequence`], but positions are taken from the
    /// alternate numbering.
    pub fn repr_sequence_altloc(&self) -> Result<Sequence, ContactMapError> {
        self.masked_sequence(&self.alt_residue_positions())
    }

    fn masked_sequence(&self, touched: &BTreeSet<isize>) -> Result<Sequence, ContactMapError> {
        let sequence = self.require_sequence()?;
        let masked: String = sequence
            .seq()
            .chars()
            .enumerate()
            .map(|(i, c)| {
                if touched.contains(&(i as isize + 1)) {
                    c
                } else {
                    GAP_CHAR
                }
            })
            .collect();
        let mut repr = Sequence::new(format!("{}_repr", sequence.id()), &masked)?;
        repr.remarks = sequence.remarks.clone();
        Ok(repr)
    }

    /// Copies amino acid codes from the attached sequence onto every contact.
    ///
    /// With `use_altseq` the alternate numbering is used to index the sequence.
    pub fn set_sequence_register(&mut self, use_altseq: bool) -> Result<(), ContactMapError> {
        let sequence = self.require_sequence()?.clone();
        let map = self.id().to_string();
        let lookup = |index: isize| -> Result<String, ContactMapError> {
            sequence
                .residue_at(index)
                .filter(|&c| c != GAP_CHAR)
                .map(String::from)
                .ok_or_else(|| ContactMapError::ResidueOutOfRange {
                    map: map.clone(),
                    index,
                    length: sequence.seq_len(),
                })
        };
        for contact in self.contacts.iter_mut() {
            let (i, j) = if use_altseq {
                (contact.res1_altseq, contact.res2_altseq)
            } else {
                (contact.res1_seq, contact.res2_seq)
            };
            contact.set_res1(&lookup(i)?)?;
            contact.set_res2(&lookup(j)?)?;
        }
        Ok(())
    }

    /// Shifts primary and alternate numbering so the lowest referenced residue
    /// becomes `start`. Identifiers are left untouched.
    pub fn reindex(&mut self, start: isize) {
        let Some(&lowest) = self.residue_positions().first() else {
            return;
        };
        let offset = start - lowest;
        for contact in self.contacts.iter_mut() {
            contact.res1_seq += offset;
            contact.res2_seq += offset;
            contact.res1_altseq += offset;
            contact.res2_altseq += offset;
        }
    }
}

impl Node for ContactMap {
    type Key = String;

    fn key(&self) -> &String {
        self.contacts.key()
    }

    fn parent(&self) -> Option<&str> {
        Node::parent(&self.contacts)
    }

    fn set_parent(&mut self, parent: Option<String>) {
        self.contacts.set_parent(parent);
    }

    fn deep_copy(&self) -> Self {
        ContactMap::deep_copy(self)
    }
}

impl<'a> IntoIterator for &'a ContactMap {
    type Item = &'a Contact;
    type IntoIter = <&'a Entity<Contact> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        (&self.contacts).into_iter()
    }
}
