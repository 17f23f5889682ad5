use super::contact::ContactId;
use super::contact_map::{ContactMap, ContactMapError};
use std::collections::HashSet;
use std::fmt;
use tracing::warn;

/// Sequence separation band of short-range contacts.
pub const SHORT_RANGE: (isize, isize) = (6, 11);
/// Sequence separation band of medium-range contacts.
pub const MEDIUM_RANGE: (isize, isize) = (12, 23);
/// Sequence separation band of long-range contacts.
pub const LONG_RANGE: (isize, isize) = (24, isize::MAX);

/// A condition under which a metric could not be computed meaningfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegenerateMetric {
    /// The contact map holds no contacts.
    EmptyMap,
    /// No contact carries the status the metric is built from.
    NoEvidence,
    /// Some contacts were never matched against a reference.
    UnmatchedContacts(usize),
}

impl fmt::Display for DegenerateMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DegenerateMetric::EmptyMap => write!(f, "contact map is empty"),
            DegenerateMetric::NoEvidence => {
                write!(f, "no matched contacts, has the map been matched to a reference?")
            }
            DegenerateMetric::UnmatchedContacts(n) => {
                write!(f, "{n} contacts are still unmatched and were ignored")
            }
        }
    }
}

/// A metric value together with the degenerate conditions met computing it.
///
/// The value is always usable; it is `0.0` whenever the metric is undefined.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricOutcome {
    pub value: f64,
    pub warnings: Vec<DegenerateMetric>,
}

impl MetricOutcome {
    pub fn is_degenerate(&self) -> bool {
        !self.warnings.is_empty()
    }

    fn reported(self, metric: &'static str, map: &str) -> f64 {
        for warning in &self.warnings {
            warn!(metric, map, "{warning}");
        }
        self.value
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct StatusCounts {
    true_positives: usize,
    false_positives: usize,
    false_negatives: usize,
    unknown: usize,
}

impl ContactMap {
    fn status_counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for contact in self.iter() {
            if contact.is_true_positive() {
                counts.true_positives += 1;
            } else if contact.is_false_positive() {
                counts.false_positives += 1;
            } else if contact.is_false_negative() {
                counts.false_negatives += 1;
            } else {
                counts.unknown += 1;
            }
        }
        counts
    }

    fn ratio_outcome(&self, numerator: usize, other: usize) -> MetricOutcome {
        let counts = self.status_counts();
        let mut warnings = Vec::new();
        if self.is_empty() {
            warnings.push(DegenerateMetric::EmptyMap);
        }
        if counts.unknown > 0 {
            warnings.push(DegenerateMetric::UnmatchedContacts(counts.unknown));
        }
        let denominator = numerator + other;
        let value = if denominator == 0 {
            if !self.is_empty() {
                warnings.push(DegenerateMetric::NoEvidence);
            }
            0.0
        } else {
            numerator as f64 / denominator as f64
        };
        MetricOutcome { value, warnings }
    }

    /// Precision, `TP / (TP + FP)`, with any degenerate conditions.
    pub fn precision_outcome(&self) -> MetricOutcome {
        let counts = self.status_counts();
        self.ratio_outcome(counts.true_positives, counts.false_positives)
    }

    /// Recall, `TP / (TP + FN)`, with any degenerate conditions.
    pub fn recall_outcome(&self) -> MetricOutcome {
        let counts = self.status_counts();
        self.ratio_outcome(counts.true_positives, counts.false_negatives)
    }

    /// Precision of the matched contacts. Degenerate conditions are logged as
    /// warnings and yield `0.0`.
    pub fn precision(&self) -> f64 {
        self.precision_outcome().reported("precision", self.id())
    }

    /// Recall of the matched contacts. Degenerate conditions are logged as
    /// warnings and yield `0.0`.
    pub fn recall(&self) -> f64 {
        self.recall_outcome().reported("recall", self.id())
    }

    /// Fraction of sequence positions referenced by at least one contact.
    pub fn coverage(&self) -> Result<f64, ContactMapError> {
        let length = self.require_sequence()?.seq_len();
        if length == 0 {
            return Ok(0.0);
        }
        let covered = self
            .residue_positions()
            .into_iter()
            .filter(|&position| position >= 1 && position <= length as isize)
            .count();
        Ok(covered as f64 / length as f64)
    }

    /// Intersection over union of the contact identifiers of two maps.
    ///
    /// Two empty maps are considered identical.
    pub fn jaccard_index(&self, other: &ContactMap) -> f64 {
        let mine: HashSet<ContactId> = self.ids().copied().collect();
        let theirs: HashSet<ContactId> = other.ids().copied().collect();
        let union = mine.union(&theirs).count();
        if union == 0 {
            return 1.0;
        }
        mine.intersection(&theirs).count() as f64 / union as f64
    }

    /// Sets every contact's scalar score to its raw score divided by the mean
    /// raw score of the map.
    pub fn calculate_scalar_score(&mut self) {
        if self.is_empty() {
            return;
        }
        let mean = self.iter().map(|c| c.raw_score()).sum::<f64>() / self.len() as f64;
        if mean == 0.0 || !mean.is_finite() {
            warn!(map = self.id(), mean, "cannot rescale scores against this mean");
            return;
        }
        for contact in self.iter_mut() {
            contact.scalar_score = contact.raw_score() / mean;
        }
    }

    /// Keeps only contacts with `min_distance <= separation <= max_distance`.
    pub fn retain_by_separation(&mut self, min_distance: isize, max_distance: isize) {
        self.retain(|c| {
            let separation = c.sequence_separation();
            separation >= min_distance && separation <= max_distance
        });
    }

    /// A copy holding only contacts within the given separation band.
    pub fn filter_by_separation(&self, min_distance: isize, max_distance: isize) -> ContactMap {
        let mut filtered = self.copy();
        filtered.retain_by_separation(min_distance, max_distance);
        filtered
    }

    pub fn short_range(&self) -> ContactMap {
        self.filter_by_separation(SHORT_RANGE.0, SHORT_RANGE.1)
    }

    pub fn medium_range(&self) -> ContactMap {
        self.filter_by_separation(MEDIUM_RANGE.0, MEDIUM_RANGE.1)
    }

    pub fn long_range(&self) -> ContactMap {
        self.filter_by_separation(LONG_RANGE.0, LONG_RANGE.1)
    }
}
