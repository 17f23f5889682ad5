use super::config::MatchConfig;
use super::error::MatchError;
use super::keymap::{KeyBy, Keymap, KeymapEntry};
use crate::core::align::AlignmentScores;
use crate::core::models::contact::{Contact, ContactId, ContactStatus};
use crate::core::models::contact_map::ContactMap;
use crate::core::models::sequence::Sequence;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, instrument, trace};

/// Counts collected while matching a contact map against a reference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchSummary {
    pub true_positives: usize,
    pub false_positives: usize,
    pub unknown: usize,
    pub false_negatives_added: usize,
    pub removed_unmatched: usize,
    pub renumbered: usize,
}

/// A contact together with the alignment columns of its two residues.
#[derive(Debug, Clone, Copy)]
struct ColumnPair {
    id: ContactId,
    first: isize,
    second: isize,
}

impl ColumnPair {
    fn columns(&self) -> (isize, isize) {
        (self.first, self.second)
    }
}

/// Matches `map` against `reference`, updating both in place.
///
/// Every contact of `map` is classified against `reference`; the reference
/// contacts get their alternate numbering rewritten to the shared alignment
/// frame. Both maps need a sequence attached. Nothing is modified if an error
/// is returned.
#[instrument(skip_all, name = "match_contacts", fields(map = %map.id(), reference = %reference.id()))]
pub fn run(
    map: &mut ContactMap,
    reference: &mut ContactMap,
    config: &MatchConfig,
) -> Result<MatchSummary, MatchError> {
    info!(
        contacts = map.len(),
        reference_contacts = reference.len(),
        "Matching contact map against reference."
    );

    let (keymap, reference_keymap) = aligned_keymaps(map, reference, config)?;

    // === Stage 7: Place both maps' contacts in the shared column frame ===
    let map_columns = column_pairs(map, &keymap)?;
    let reference_columns = column_pairs(reference, &reference_keymap)?;
    let reference_pairs: HashSet<(isize, isize)> =
        reference_columns.iter().map(ColumnPair::columns).collect();

    // === Stage 8: Classify ===
    let mut summary = MatchSummary::default();
    let mut statuses = Vec::with_capacity(map_columns.len());
    for pair in &map_columns {
        let in_gap = [pair.first, pair.second]
            .into_iter()
            .any(|column| reference_keymap.get(column).is_none_or(KeymapEntry::is_gap));
        let found = reference_pairs.contains(&pair.columns());
        let status = match (found, in_gap) {
            (true, true) => return Err(MatchError::Inconsistent { contact: pair.id }),
            (true, false) => {
                summary.true_positives += 1;
                ContactStatus::TruePositive
            }
            (false, false) => {
                summary.false_positives += 1;
                ContactStatus::FalsePositive
            }
            (false, true) => {
                summary.unknown += 1;
                ContactStatus::Unknown
            }
        };
        trace!(contact = %pair.id, %status, "Classified contact.");
        statuses.push((pair.id, status));
    }

    // === Stage 9: Collect false negatives ===
    let false_negatives = if config.add_false_negatives {
        collect_false_negatives(map, reference, &keymap, &map_columns, &reference_columns)
    } else {
        Vec::new()
    };
    let reference_numbered: HashSet<ContactId> = false_negatives
        .iter()
        .filter(|(_, translated)| !translated)
        .map(|(contact, _)| contact.id())
        .collect();

    // Everything below only mutates.
    for (contact, pair) in reference.iter_mut().zip(&reference_columns) {
        contact.res1_altseq = pair.first;
        contact.res2_altseq = pair.second;
    }
    for (id, status) in statuses {
        if let Some(contact) = map.get_mut(&id) {
            apply_status(contact, status);
        }
    }

    summary.false_negatives_added = false_negatives.len();
    for (contact, _) in false_negatives {
        map.add(contact)?;
    }

    // === Stage 10: Drop unmatched contacts ===
    if config.remove_unmatched {
        let before = map.len();
        map.retain(|c| !c.is_unknown());
        summary.removed_unmatched = before - map.len();
    }

    // === Stage 11: Renumber into the reference numbering ===
    if config.renumber {
        summary.renumbered = renumber(map, &keymap, &reference_keymap, &reference_numbered);
    }

    debug!(
        true_positives = summary.true_positives,
        false_positives = summary.false_positives,
        unknown = summary.unknown,
        false_negatives = summary.false_negatives_added,
        removed = summary.removed_unmatched,
        renumbered = summary.renumbered,
        "Matching complete."
    );
    Ok(summary)
}

/// Matches copies of both maps and returns the updated copy of `map`.
pub fn matched(
    map: &ContactMap,
    reference: &ContactMap,
    config: &MatchConfig,
) -> Result<(ContactMap, MatchSummary), MatchError> {
    let mut map = map.deep_copy();
    let mut reference = reference.deep_copy();
    let summary = run(&mut map, &mut reference, config)?;
    Ok((map, summary))
}

impl ContactMap {
    /// Matches this map against `reference` in place. See [`run`].
    pub fn match_with(
        &mut self,
        reference: &mut ContactMap,
        config: &MatchConfig,
    ) -> Result<MatchSummary, MatchError> {
        run(self, reference, config)
    }
}

/// Runs the four alignment stages and lays both keymaps over the result.
///
/// The returned keymaps have equal length and their alternate indices are
/// the dense column numbers 1..=N.
fn aligned_keymaps(
    map: &ContactMap,
    reference: &ContactMap,
    config: &MatchConfig,
) -> Result<(Keymap, Keymap), MatchError> {
    let sequence = map.require_sequence()?;
    let reference_sequence = reference.require_sequence()?;

    // === Stage 1: Align the full sequences ===
    let (aligned, reference_aligned) =
        align_stage("sequence", sequence, reference_sequence, &config.sequence)?;

    // === Stage 2: Representative sequences ===
    let repr = map.repr_sequence()?;
    let reference_repr = reference.repr_sequence_altloc()?;

    // === Stage 3: Project each representative onto its aligned sequence ===
    let (_, projected) = align_stage("projection", &aligned, &repr, &config.projection)?;
    let (_, reference_projected) = align_stage(
        "projection",
        &reference_aligned,
        &reference_repr,
        &config.projection,
    )?;

    // === Stage 4: Align the projected representatives ===
    let (final_map, final_reference) = align_stage(
        "representative",
        &projected,
        &reference_projected,
        &config.representative,
    )?;
    trace!(map = final_map.seq(), reference = final_reference.seq(), "Final alignment.");

    // === Stage 5: Keymaps with insert states ===
    let mut keymap = Keymap::from_contacts(map, KeyBy::Primary)?
        .insert_states(&final_map, map.id())?;
    let mut reference_keymap = Keymap::from_contacts(reference, KeyBy::Alternate)?
        .insert_states(&final_reference, reference.id())?;
    if keymap.len() != reference_keymap.len() {
        return Err(MatchError::LengthMismatch {
            left: keymap.len(),
            right: reference_keymap.len(),
        });
    }

    // === Stage 6: Dense column numbering ===
    keymap.reindex();
    reference_keymap.reindex();
    debug!(
        columns = keymap.len(),
        residues = keymap.residue_count(),
        reference_residues = reference_keymap.residue_count(),
        "Keymaps aligned."
    );

    Ok((keymap, reference_keymap))
}

fn align_stage(
    stage: &'static str,
    x: &Sequence,
    y: &Sequence,
    scores: &AlignmentScores,
) -> Result<(Sequence, Sequence), MatchError> {
    x.align_local(y, scores)
        .map_err(|source| MatchError::Alignment { stage, source })
}

fn column_pairs(map: &ContactMap, keymap: &Keymap) -> Result<Vec<ColumnPair>, MatchError> {
    let column = |key: isize, id: ContactId| {
        keymap
            .column_of(key)
            .ok_or(MatchError::Inconsistent { contact: id })
    };
    map.iter()
        .map(|contact| -> Result<ColumnPair, MatchError> {
            let id = contact.id();
            let (first, second) = match keymap.key_by() {
                KeyBy::Primary => (contact.res1_seq, contact.res2_seq),
                KeyBy::Alternate => (contact.res1_altseq, contact.res2_altseq),
            };
            Ok(ColumnPair {
                id,
                first: column(first, id)?,
                second: column(second, id)?,
            })
        })
        .collect()
}

fn apply_status(contact: &mut Contact, status: ContactStatus) {
    match status {
        ContactStatus::TruePositive => contact.define_true_positive(),
        ContactStatus::FalsePositive => contact.define_false_positive(),
        ContactStatus::FalseNegative => contact.define_false_negative(),
        ContactStatus::Unknown => contact.define_unknown(),
    }
}

/// Reference contacts without a counterpart in `map`, rekeyed into the
/// numbering of `map` where both residues exist there.
///
/// The flag is `false` for contacts that keep the reference numbering because
/// one of their residues has no counterpart in `map`.
fn collect_false_negatives(
    map: &ContactMap,
    reference: &ContactMap,
    keymap: &Keymap,
    map_columns: &[ColumnPair],
    reference_columns: &[ColumnPair],
) -> Vec<(Contact, bool)> {
    let matched: HashSet<(isize, isize)> = map_columns.iter().map(ColumnPair::columns).collect();
    let mut seen = HashSet::new();
    let mut false_negatives = Vec::new();

    for (contact, pair) in reference.iter().zip(reference_columns) {
        if matched.contains(&pair.columns()) {
            continue;
        }
        let translated = match (keymap.get(pair.first), keymap.get(pair.second)) {
            (Some(KeymapEntry::Residue(first)), Some(KeymapEntry::Residue(second))) => {
                Some((first, second))
            }
            _ => None,
        };
        let id = translated
            .map(|(first, second)| ContactId(first.res_seq, second.res_seq))
            .unwrap_or(pair.id);
        if map.contains(&id) || !seen.insert(id) {
            continue;
        }

        let mut missing = contact.rekeyed(id);
        missing.res1_altseq = pair.first;
        missing.res2_altseq = pair.second;
        if let Some((first, second)) = translated {
            missing.res1_chain = first.res_chain.clone();
            missing.res2_chain = second.res_chain.clone();
        }
        missing.define_false_negative();
        trace!(contact = %id, reference_contact = %pair.id, "Adding false negative.");
        false_negatives.push((missing, translated.is_some()));
    }
    false_negatives
}

/// Rewrites primary indices and chains of `map` into the numbering of the
/// reference, column by column. Residues without a reference counterpart get
/// [`GAP_INDEX`](super::keymap::GAP_INDEX) and an empty chain.
///
/// Endpoints are looked up by their current `res1_seq` / `res2_seq`, not by
/// the contact identifier. The two agree unless the map was renumbered or
/// [`reindex`](ContactMap::reindex)ed before matching, in which case the
/// current primary indices are the ones the keymap was built from. Contacts in
/// `skip` already carry reference numbering and are left alone.
///
/// Returns the number of contacts that had at least one residue rewritten.
fn renumber(
    map: &mut ContactMap,
    keymap: &Keymap,
    reference_keymap: &Keymap,
    skip: &HashSet<ContactId>,
) -> usize {
    let lookup: HashMap<isize, (isize, String)> = keymap
        .entries()
        .iter()
        .zip(reference_keymap.entries())
        .filter(|(entry, _)| !entry.is_gap())
        .map(|(entry, other)| {
            (
                entry.res_seq(),
                (other.res_seq(), other.res_chain().to_string()),
            )
        })
        .collect();

    let mut renumbered = 0;
    for contact in map.iter_mut() {
        if skip.contains(&contact.id()) {
            continue;
        }
        let (res1_seq, res2_seq) = (contact.res1_seq, contact.res2_seq);
        let mut touched = false;
        if let Some((index, chain)) = lookup.get(&res1_seq) {
            contact.res1_seq = *index;
            contact.res1_chain = chain.clone();
            touched = true;
        }
        if let Some((index, chain)) = lookup.get(&res2_seq) {
            contact.res2_seq = *index;
            contact.res2_chain = chain.clone();
            touched = true;
        }
        if touched {
            renumbered += 1;
        }
    }
    renumbered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact_map(id: &str, seq: &str, pairs: &[(isize, isize)]) -> ContactMap {
        let mut map = ContactMap::new(id);
        for &(i, j) in pairs {
            map.add(Contact::new(i, j, 1.0)).unwrap();
        }
        map.with_sequence(Sequence::new(format!("{id}_seq"), seq).unwrap())
    }

    fn statuses(map: &ContactMap) -> Vec<(ContactId, ContactStatus)> {
        map.iter().map(|c| (c.id(), c.status())).collect()
    }

    mod classification {
        use super::*;

        #[test]
        fn contact_present_in_both_maps_is_a_true_positive() {
            let mut map = contact_map("a", "ABCDEFGH", &[(1, 5)]);
            let mut reference =
                contact_map("b", "ABCDEFG", &[(1, 5), (1, 6), (2, 7), (3, 5)]);
            let summary = run(&mut map, &mut reference, &MatchConfig::default()).unwrap();
            assert!(map.get(&ContactId(1, 5)).unwrap().is_true_positive());
            assert_eq!(summary.true_positives, 1);
            assert_eq!(summary.false_positives, 0);

            let columns: Vec<(isize, isize)> = reference
                .iter()
                .map(|c| (c.res1_altseq, c.res2_altseq))
                .collect();
            assert_eq!(columns, vec![(1, 5), (1, 6), (2, 7), (3, 5)]);
        }

        #[test]
        fn contact_on_residues_without_counterpart_stays_unknown() {
            let mut map = contact_map("a", "MKVLAT", &[(1, 4), (2, 5), (3, 6)]);
            let mut reference = contact_map("b", "MKVLAT", &[(1, 4), (2, 6), (3, 6)]);
            let summary = run(&mut map, &mut reference, &MatchConfig::default()).unwrap();
            assert_eq!(
                statuses(&map),
                vec![
                    (ContactId(1, 4), ContactStatus::TruePositive),
                    (ContactId(2, 5), ContactStatus::Unknown),
                    (ContactId(3, 6), ContactStatus::TruePositive),
                ]
            );
            assert_eq!(summary.unknown, 1);
        }

        #[test]
        fn absent_pair_between_known_residues_is_a_false_positive() {
            let mut map = contact_map("a", "MKVLAT", &[(1, 4), (2, 6)]);
            let mut reference = contact_map("b", "MKVLAT", &[(1, 4), (1, 6), (2, 5)]);
            run(&mut map, &mut reference, &MatchConfig::default()).unwrap();
            assert!(map.get(&ContactId(1, 4)).unwrap().is_true_positive());
            assert!(map.get(&ContactId(2, 6)).unwrap().is_false_positive());
        }

        #[test]
        fn reference_alternate_indices_move_to_the_column_frame() {
            let mut map = contact_map("a", "MKVLATPQ", &[(1, 5), (2, 6), (3, 7), (4, 8)]);
            let mut reference = contact_map("b", "VLATPQ", &[(1, 3), (2, 4), (3, 5), (4, 6)]);
            let summary = run(&mut map, &mut reference, &MatchConfig::default()).unwrap();

            let contact = reference.get(&ContactId(1, 3)).unwrap();
            assert_eq!((contact.res1_seq, contact.res2_seq), (1, 3));
            assert_eq!((contact.res1_altseq, contact.res2_altseq), (3, 5));
            assert_eq!(
                statuses(&map),
                vec![
                    (ContactId(1, 5), ContactStatus::Unknown),
                    (ContactId(2, 6), ContactStatus::Unknown),
                    (ContactId(3, 7), ContactStatus::FalsePositive),
                    (ContactId(4, 8), ContactStatus::FalsePositive),
                ]
            );
            assert_eq!(
                (summary.true_positives, summary.false_positives, summary.unknown),
                (0, 2, 2)
            );
        }

        #[test]
        fn internal_deletion_shifts_downstream_columns() {
            let mut map = contact_map(
                "a",
                "ACDEFGHIKLMN",
                &[(1, 7), (2, 8), (3, 9), (4, 10), (5, 11), (6, 12), (1, 9), (3, 11)],
            );
            let mut reference =
                contact_map("b", "ACDEFKLMN", &[(1, 6), (2, 7), (3, 8), (4, 9), (5, 9)]);
            let summary = run(&mut map, &mut reference, &MatchConfig::default()).unwrap();

            assert_eq!(
                statuses(&map),
                vec![
                    (ContactId(1, 7), ContactStatus::Unknown),
                    (ContactId(2, 8), ContactStatus::Unknown),
                    (ContactId(3, 9), ContactStatus::FalsePositive),
                    (ContactId(4, 10), ContactStatus::FalsePositive),
                    (ContactId(5, 11), ContactStatus::FalsePositive),
                    (ContactId(6, 12), ContactStatus::Unknown),
                    (ContactId(1, 9), ContactStatus::TruePositive),
                    (ContactId(3, 11), ContactStatus::TruePositive),
                ]
            );
            assert_eq!(
                (summary.true_positives, summary.false_positives, summary.unknown),
                (2, 3, 3)
            );
            let columns: Vec<(isize, isize)> = reference
                .iter()
                .map(|c| (c.res1_altseq, c.res2_altseq))
                .collect();
            assert_eq!(columns, vec![(1, 9), (2, 10), (3, 11), (4, 12), (5, 12)]);
        }
    }

    mod options {
        use super::*;
        use crate::core::models::entity::Node;

        #[test]
        fn false_negatives_are_added_in_map_numbering() {
            let mut map = contact_map("a", "MKVLAT", &[(1, 4), (2, 5), (3, 6)]);
            let mut reference = contact_map("b", "MKVLAT", &[(1, 4), (2, 6), (3, 6)]);
            let config = MatchConfig {
                add_false_negatives: true,
                ..MatchConfig::default()
            };
            let summary = run(&mut map, &mut reference, &config).unwrap();
            assert_eq!(summary.false_negatives_added, 1);
            let added = map.get(&ContactId(2, 6)).unwrap();
            assert!(added.is_false_negative());
            assert_eq!(added.parent(), Some("a"));
            assert_eq!(map.len(), 4);
        }

        #[test]
        fn unmatched_contacts_can_be_removed() {
            let mut map = contact_map("a", "MKVLAT", &[(1, 4), (2, 5), (3, 6)]);
            let mut reference = contact_map("b", "MKVLAT", &[(1, 4), (2, 6), (3, 6)]);
            let config = MatchConfig {
                remove_unmatched: true,
                ..MatchConfig::default()
            };
            let summary = run(&mut map, &mut reference, &config).unwrap();
            assert_eq!(summary.removed_unmatched, 1);
            assert_eq!(map.as_list(), vec![(1, 4), (3, 6)]);
        }

        #[test]
        fn renumber_uses_reference_numbering_and_gap_index() {
            let mut map = contact_map("a", "MKVLATPQ", &[(1, 5), (2, 6), (3, 7), (4, 8)]);
            let mut reference = contact_map("b", "VLATPQ", &[(1, 3), (2, 4), (3, 5), (4, 6)]);
            for contact in reference.iter_mut() {
                contact.res1_chain = "B".to_string();
                contact.res2_chain = "B".to_string();
            }
            let config = MatchConfig {
                renumber: true,
                ..MatchConfig::default()
            };
            let summary = run(&mut map, &mut reference, &config).unwrap();
            assert_eq!(summary.renumbered, 4);

            let gap = crate::engine::keymap::GAP_INDEX;
            assert_eq!(map.as_list(), vec![(gap, 3), (gap, 4), (1, 5), (2, 6)]);
            let first = map.get(&ContactId(1, 5)).unwrap();
            assert_eq!((first.res1_chain.as_str(), first.res2_chain.as_str()), ("", "B"));
            let ids: Vec<ContactId> = map.ids().copied().collect();
            assert_eq!(
                ids,
                vec![ContactId(1, 5), ContactId(2, 6), ContactId(3, 7), ContactId(4, 8)]
            );
        }

        #[test]
        fn renumber_across_an_internal_deletion() {
            let mut map = contact_map(
                "a",
                "ACDEFGHIKLMN",
                &[(1, 7), (2, 8), (3, 9), (4, 10), (5, 11), (6, 12), (1, 9), (3, 11)],
            );
            let mut reference =
                contact_map("b", "ACDEFKLMN", &[(1, 6), (2, 7), (3, 8), (4, 9), (5, 9)]);
            let config = MatchConfig {
                renumber: true,
                ..MatchConfig::default()
            };
            let summary = run(&mut map, &mut reference, &config).unwrap();
            assert_eq!(summary.renumbered, 8);

            let gap = crate::engine::keymap::GAP_INDEX;
            assert_eq!(
                map.as_list(),
                vec![
                    (1, gap),
                    (2, gap),
                    (3, 6),
                    (4, 7),
                    (5, 8),
                    (gap, 9),
                    (1, 6),
                    (3, 8)
                ]
            );
        }

        #[test]
        fn false_negative_kept_in_reference_numbering_is_not_renumbered() {
            let mut map = contact_map("a", "MKVLATPQ", &[(1, 5), (3, 7), (3, 6), (2, 8)]);
            let mut reference = contact_map("b", "VLATPQ", &[(1, 5), (2, 4), (3, 5)]);
            let config = MatchConfig {
                add_false_negatives: true,
                renumber: true,
                ..MatchConfig::default()
            };
            run(&mut map, &mut reference, &config).unwrap();

            let missing = map.get(&ContactId(2, 4)).unwrap();
            assert!(missing.is_false_negative());
            assert_eq!((missing.res1_seq, missing.res2_seq), (2, 4));
            let renumbered = map.get(&ContactId(2, 8)).unwrap();
            let gap = crate::engine::keymap::GAP_INDEX;
            assert_eq!((renumbered.res1_seq, renumbered.res2_seq), (gap, gap));
        }

        #[test]
        fn matched_leaves_inputs_untouched() {
            let map = contact_map("a", "ABCDEFGH", &[(1, 5)]);
            let reference = contact_map("b", "ABCDEFG", &[(1, 5)]);
            let (result, summary) = matched(&map, &reference, &MatchConfig::default()).unwrap();
            assert!(result.get(&ContactId(1, 5)).unwrap().is_true_positive());
            assert!(map.get(&ContactId(1, 5)).unwrap().is_unknown());
            assert_eq!(summary.true_positives, 1);
        }
    }

    mod failures {
        use super::*;
        use crate::core::models::contact_map::ContactMapError;

        #[test]
        fn missing_sequence_is_reported_and_nothing_changes() {
            let mut map = contact_map("a", "ABCDEFGH", &[(1, 5)]);
            let mut reference = ContactMap::new("b");
            reference.add(Contact::new(1, 5, 1.0)).unwrap();
            let err = run(&mut map, &mut reference, &MatchConfig::default()).unwrap_err();
            assert!(matches!(
                err,
                MatchError::ContactMap {
                    source: ContactMapError::MissingSequence { .. }
                }
            ));
            assert!(map.get(&ContactId(1, 5)).unwrap().is_unknown());
        }

        #[test]
        fn contacts_outside_the_sequence_are_rejected() {
            let mut map = contact_map("a", "MKV", &[(1, 9)]);
            let mut reference = contact_map("b", "MKV", &[(1, 3)]);
            let err = run(&mut map, &mut reference, &MatchConfig::default()).unwrap_err();
            assert!(matches!(err, MatchError::KeymapMismatch { .. }));
        }

        #[test]
        fn conflicting_residue_descriptions_abort_the_run() {
            let mut map = contact_map("a", "MKVLATPQ", &[(1, 5), (1, 6)]);
            map.iter_mut().next().unwrap().res1_chain = "A".to_string();
            let mut reference = contact_map("b", "MKVLATPQ", &[(1, 5)]);
            let err = run(&mut map, &mut reference, &MatchConfig::default()).unwrap_err();
            assert!(matches!(
                err,
                MatchError::ConflictingResidue { map: ref id, index: 1 } if id == "a"
            ));
            assert!(map.iter().all(Contact::is_unknown));
            let contact = reference.get(&ContactId(1, 5)).unwrap();
            assert_eq!((contact.res1_altseq, contact.res2_altseq), (1, 5));
        }
    }
}
