use super::error::MatchError;
use crate::core::models::contact_map::ContactMap;
use crate::core::models::sequence::Sequence;
use crate::core::utils::residues::{GAP_CHAR, UNKNOWN_RESIDUE};
use std::collections::{BTreeMap, HashMap};

/// Primary index carried by gap columns. No real residue is numbered this way.
pub const GAP_INDEX: isize = -999_999;

/// Which numbering of a contact map a keymap is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyBy {
    Primary,
    Alternate,
}

/// A residue referenced by at least one contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResiduePosition {
    pub res_seq: isize,
    pub res_altseq: isize,
    pub res_name: char,
    pub res_chain: String,
}

impl ResiduePosition {
    // Two descriptors agree if they only differ in a residue code one of them
    // does not know yet.
    fn merge(&mut self, other: &ResiduePosition) -> bool {
        let names_agree = self.res_name == other.res_name
            || self.res_name == UNKNOWN_RESIDUE
            || other.res_name == UNKNOWN_RESIDUE;
        if !names_agree
            || self.res_seq != other.res_seq
            || self.res_altseq != other.res_altseq
            || self.res_chain != other.res_chain
        {
            return false;
        }
        if self.res_name == UNKNOWN_RESIDUE {
            self.res_name = other.res_name;
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeymapEntry {
    Residue(ResiduePosition),
    Gap { res_altseq: isize },
}

impl KeymapEntry {
    pub fn is_gap(&self) -> bool {
        matches!(self, KeymapEntry::Gap { .. })
    }

    pub fn res_seq(&self) -> isize {
        match self {
            KeymapEntry::Residue(residue) => residue.res_seq,
            KeymapEntry::Gap { .. } => GAP_INDEX,
        }
    }

    pub fn res_altseq(&self) -> isize {
        match self {
            KeymapEntry::Residue(residue) => residue.res_altseq,
            KeymapEntry::Gap { res_altseq } => *res_altseq,
        }
    }

    pub fn res_chain(&self) -> &str {
        match self {
            KeymapEntry::Residue(residue) => &residue.res_chain,
            KeymapEntry::Gap { .. } => "",
        }
    }

    fn set_res_altseq(&mut self, index: isize) {
        match self {
            KeymapEntry::Residue(residue) => residue.res_altseq = index,
            KeymapEntry::Gap { res_altseq } => *res_altseq = index,
        }
    }
}

/// Position-ordered list of the residues a contact map references.
///
/// A keymap starts out holding only residues, sorted by the numbering it was
/// built from. [`Keymap::insert_states`] then lays it over an aligned sequence
/// so that entry `i` describes alignment column `i + 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keymap {
    key_by: KeyBy,
    entries: Vec<KeymapEntry>,
    // Numbering the keymap was built from -> column index (0-based).
    columns: HashMap<isize, usize>,
}

impl Keymap {
    /// Collects every residue referenced by a contact of `map`.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::ConflictingResidue`] if two contacts describe the
    /// same residue differently.
    pub fn from_contacts(map: &ContactMap, key_by: KeyBy) -> Result<Self, MatchError> {
        let mut residues: BTreeMap<isize, ResiduePosition> = BTreeMap::new();
        for contact in map {
            let endpoints = [
                ResiduePosition {
                    res_seq: contact.res1_seq,
                    res_altseq: contact.res1_altseq,
                    res_name: contact.res1(),
                    res_chain: contact.res1_chain.clone(),
                },
                ResiduePosition {
                    res_seq: contact.res2_seq,
                    res_altseq: contact.res2_altseq,
                    res_name: contact.res2(),
                    res_chain: contact.res2_chain.clone(),
                },
            ];
            for residue in endpoints {
                let key = match key_by {
                    KeyBy::Primary => residue.res_seq,
                    KeyBy::Alternate => residue.res_altseq,
                };
                match residues.get_mut(&key) {
                    Some(known) => {
                        if !known.merge(&residue) {
                            return Err(MatchError::ConflictingResidue {
                                map: map.id().to_string(),
                                index: key,
                            });
                        }
                    }
                    None => {
                        residues.insert(key, residue);
                    }
                }
            }
        }

        let entries = residues.into_values().map(KeymapEntry::Residue).collect();
        Ok(Self::with_entries(key_by, entries))
    }

    fn with_entries(key_by: KeyBy, entries: Vec<KeymapEntry>) -> Self {
        let columns = entries
            .iter()
            .enumerate()
            .filter_map(|(column, entry)| match entry {
                KeymapEntry::Residue(residue) => {
                    let key = match key_by {
                        KeyBy::Primary => residue.res_seq,
                        KeyBy::Alternate => residue.res_altseq,
                    };
                    Some((key, column))
                }
                KeymapEntry::Gap { .. } => None,
            })
            .collect();
        Self {
            key_by,
            entries,
            columns,
        }
    }

    pub fn key_by(&self) -> KeyBy {
        self.key_by
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[KeymapEntry] {
        &self.entries
    }

    /// Entry at a 1-based column.
    pub fn get(&self, column: isize) -> Option<&KeymapEntry> {
        if column < 1 {
            return None;
        }
        self.entries.get(column as usize - 1)
    }

    /// 1-based column of the residue with the given key, as built.
    pub fn column_of(&self, key: isize) -> Option<isize> {
        self.columns.get(&key).map(|&column| column as isize + 1)
    }

    pub fn residue_count(&self) -> usize {
        self.columns.len()
    }

    /// Interleaves gap entries wherever `aligned` holds the gap character.
    ///
    /// Every other character consumes the next residue, so the aligned
    /// sequence must hold exactly as many residues as the keymap.
    pub fn insert_states(&self, aligned: &Sequence, map_id: &str) -> Result<Self, MatchError> {
        let positions = aligned.seq().chars().filter(|&c| c != GAP_CHAR).count();
        let residues = self.entries.iter().filter(|e| !e.is_gap()).count();
        if positions != residues {
            return Err(MatchError::KeymapMismatch {
                map: map_id.to_string(),
                residues,
                positions,
            });
        }

        let mut remaining = self.entries.iter().filter(|e| !e.is_gap());
        let mut entries = Vec::with_capacity(aligned.seq_len());
        for c in aligned.seq().chars() {
            if c == GAP_CHAR {
                entries.push(KeymapEntry::Gap {
                    res_altseq: GAP_INDEX,
                });
            } else if let Some(entry) = remaining.next() {
                entries.push(entry.clone());
            }
        }
        Ok(Self::with_entries(self.key_by, entries))
    }

    /// Numbers every column 1..=N in its alternate index, gaps included.
    pub fn reindex(&mut self) {
        for (column, entry) in self.entries.iter_mut().enumerate() {
            entry.set_res_altseq(column as isize + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::contact::Contact;

    fn contact_map(pairs: &[(isize, isize)]) -> ContactMap {
        let mut map = ContactMap::new("map");
        for &(i, j) in pairs {
            map.add(Contact::new(i, j, 1.0)).unwrap();
        }
        map
    }

    fn residue_keys(keymap: &Keymap) -> Vec<isize> {
        keymap.entries().iter().map(KeymapEntry::res_seq).collect()
    }

    mod construction {
        use super::*;

        #[test]
        fn keymap_is_sorted_and_deduplicated() {
            let map = contact_map(&[(5, 9), (1, 5), (3, 9)]);
            let keymap = Keymap::from_contacts(&map, KeyBy::Primary).unwrap();
            assert_eq!(residue_keys(&keymap), vec![1, 3, 5, 9]);
            assert_eq!(keymap.column_of(5), Some(3));
            assert_eq!(keymap.column_of(4), None);
        }

        #[test]
        fn alternate_keymap_orders_by_alternate_index() {
            let mut map = contact_map(&[(10, 20)]);
            let contact = map.iter_mut().next().unwrap();
            contact.res1_altseq = 7;
            contact.res2_altseq = 2;
            let keymap = Keymap::from_contacts(&map, KeyBy::Alternate).unwrap();
            assert_eq!(residue_keys(&keymap), vec![20, 10]);
            assert_eq!(keymap.column_of(2), Some(1));
        }

        #[test]
        fn conflicting_chains_are_rejected() {
            let mut map = contact_map(&[(1, 5), (1, 9)]);
            map.iter_mut().next().unwrap().res1_chain = "A".to_string();
            let err = Keymap::from_contacts(&map, KeyBy::Primary).unwrap_err();
            assert!(matches!(err, MatchError::ConflictingResidue { index: 1, .. }));
        }

        #[test]
        fn unknown_residue_codes_merge_with_known_ones() {
            let mut map = contact_map(&[(1, 5), (1, 9)]);
            map.iter_mut().nth(1).unwrap().set_res1("LYS").unwrap();
            let keymap = Keymap::from_contacts(&map, KeyBy::Primary).unwrap();
            match keymap.get(1) {
                Some(KeymapEntry::Residue(residue)) => assert_eq!(residue.res_name, 'K'),
                other => panic!("unexpected entry {other:?}"),
            }
        }
    }

    mod alignment_states {
        use super::*;

        #[test]
        fn insert_states_places_gaps_at_gap_columns() {
            let map = contact_map(&[(1, 5)]);
            let keymap = Keymap::from_contacts(&map, KeyBy::Primary).unwrap();
            let aligned = Sequence::new("a", "A---E---").unwrap();
            let mut states = keymap.insert_states(&aligned, map.id()).unwrap();
            assert_eq!(states.len(), 8);
            assert_eq!(
                residue_keys(&states),
                vec![1, GAP_INDEX, GAP_INDEX, GAP_INDEX, 5, GAP_INDEX, GAP_INDEX, GAP_INDEX]
            );
            assert_eq!(states.column_of(5), Some(5));

            states.reindex();
            let dense: Vec<isize> = states.entries().iter().map(KeymapEntry::res_altseq).collect();
            assert_eq!(dense, (1..=8).collect::<Vec<_>>());
            assert_eq!(states.get(2).unwrap().res_seq(), GAP_INDEX);
            assert_eq!(states.get(2).unwrap().res_chain(), "");
        }

        #[test]
        fn insert_states_rejects_residue_count_mismatch() {
            let map = contact_map(&[(1, 5)]);
            let keymap = Keymap::from_contacts(&map, KeyBy::Primary).unwrap();
            let aligned = Sequence::new("a", "AB--E---").unwrap();
            let err = keymap.insert_states(&aligned, map.id()).unwrap_err();
            assert!(matches!(
                err,
                MatchError::KeymapMismatch {
                    residues: 2,
                    positions: 3,
                    ..
                }
            ));
        }
    }
}
