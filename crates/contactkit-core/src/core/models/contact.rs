use super::entity::Node;
use crate::core::utils::residues::{UNKNOWN_RESIDUE, to_one_letter};
use std::fmt;
use thiserror::Error;

/// Default lower/upper distance bound of a contact, in Angstroms.
pub const DEFAULT_DISTANCE_BOUND: (f64, f64) = (0.0, 8.0);

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ContactError {
    #[error("Invalid distance bound ({lower}, {upper}): bounds must be non-negative with lower < upper")]
    InvalidDistanceBound { lower: f64, upper: f64 },

    #[error("Unrecognised amino acid code '{0}'")]
    UnknownResidue(String),
}

/// Identity of a contact: the pair of residue indices it was created with.
///
/// The pair keeps the order it was constructed in, so `(1, 5)` and `(5, 1)`
/// are different identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContactId(pub isize, pub isize);

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.0, self.1)
    }
}

impl From<(isize, isize)> for ContactId {
    fn from((res1, res2): (isize, isize)) -> Self {
        Self(res1, res2)
    }
}

/// Classification of a contact after it has been compared to a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ContactStatus {
    /// Not yet classified, or no counterpart exists in the reference.
    #[default]
    Unknown,
    /// Present in both this map and the reference.
    TruePositive,
    /// Both residues exist in the reference, but the pair does not.
    FalsePositive,
    /// Present in the reference only.
    FalseNegative,
}

impl fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ContactStatus::Unknown => "unknown",
                ContactStatus::TruePositive => "true_positive",
                ContactStatus::FalsePositive => "false_positive",
                ContactStatus::FalseNegative => "false_negative",
            }
        )
    }
}

/// A predicted or observed contact between two residues.
///
/// The identifier is fixed at construction. Everything else, including the
/// displayed residue numbering, may be rewritten by the owning contact map
/// during matching.
#[derive(Debug, Clone, PartialEq)]
pub struct Contact {
    id: ContactId,
    parent: Option<String>,
    /// Residue number of the first residue.
    pub res1_seq: isize,
    /// Residue number of the second residue.
    pub res2_seq: isize,
    /// Alternate numbering of the first residue.
    pub res1_altseq: isize,
    /// Alternate numbering of the second residue.
    pub res2_altseq: isize,
    /// Chain label of the first residue.
    pub res1_chain: String,
    /// Chain label of the second residue.
    pub res2_chain: String,
    /// Score rescaled against the map average.
    pub scalar_score: f64,
    /// Weight applied to this contact by downstream consumers.
    pub weight: f64,
    res1: char,
    res2: char,
    raw_score: f64,
    distance_bound: (f64, f64),
    status: ContactStatus,
}

impl Contact {
    /// Creates a contact between `res1_seq` and `res2_seq`.
    ///
    /// Alternate indices start equal to the primary ones, residue codes are
    /// unknown and the status is [`ContactStatus::Unknown`].
    pub fn new(res1_seq: isize, res2_seq: isize, raw_score: impl Into<f64>) -> Self {
        let raw_score = raw_score.into();
        Self {
            id: ContactId(res1_seq, res2_seq),
            parent: None,
            res1_seq,
            res2_seq,
            res1_altseq: res1_seq,
            res2_altseq: res2_seq,
            res1_chain: String::new(),
            res2_chain: String::new(),
            scalar_score: 0.0,
            weight: 1.0,
            res1: UNKNOWN_RESIDUE,
            res2: UNKNOWN_RESIDUE,
            raw_score,
            distance_bound: DEFAULT_DISTANCE_BOUND,
            status: ContactStatus::Unknown,
        }
    }

    pub fn id(&self) -> ContactId {
        self.id
    }

    pub fn raw_score(&self) -> f64 {
        self.raw_score
    }

    pub fn set_raw_score(&mut self, score: impl Into<f64>) {
        self.raw_score = score.into();
    }

    pub fn distance_bound(&self) -> (f64, f64) {
        self.distance_bound
    }

    /// Sets the lower and upper distance bound.
    ///
    /// # Errors
    ///
    /// Fails unless both values are finite, non-negative and `lower < upper`.
    pub fn set_distance_bound(&mut self, lower: f64, upper: f64) -> Result<(), ContactError> {
        let valid = lower.is_finite() && upper.is_finite() && lower >= 0.0 && lower < upper;
        if !valid {
            return Err(ContactError::InvalidDistanceBound { lower, upper });
        }
        self.distance_bound = (lower, upper);
        Ok(())
    }

    /// One-letter amino acid code of the first residue.
    pub fn res1(&self) -> char {
        self.res1
    }

    pub fn res2(&self) -> char {
        self.res2
    }

    /// Sets the first residue's amino acid from a one- or three-letter code.
    pub fn set_res1(&mut self, code: &str) -> Result<(), ContactError> {
        self.res1 = parse_code(code)?;
        Ok(())
    }

    pub fn set_res2(&mut self, code: &str) -> Result<(), ContactError> {
        self.res2 = parse_code(code)?;
        Ok(())
    }

    pub fn status(&self) -> ContactStatus {
        self.status
    }

    pub fn define_true_positive(&mut self) {
        self.status = ContactStatus::TruePositive;
    }

    pub fn define_false_positive(&mut self) {
        self.status = ContactStatus::FalsePositive;
    }

    pub fn define_false_negative(&mut self) {
        self.status = ContactStatus::FalseNegative;
    }

    pub fn define_unknown(&mut self) {
        self.status = ContactStatus::Unknown;
    }

    pub fn is_true_positive(&self) -> bool {
        self.status == ContactStatus::TruePositive
    }

    pub fn is_false_positive(&self) -> bool {
        self.status == ContactStatus::FalsePositive
    }

    pub fn is_false_negative(&self) -> bool {
        self.status == ContactStatus::FalseNegative
    }

    pub fn is_unknown(&self) -> bool {
        self.status == ContactStatus::Unknown
    }

    /// Distance along the sequence between the two residues, using the
    /// current (possibly renumbered) primary indices.
    pub fn sequence_separation(&self) -> isize {
        (self.res1_seq - self.res2_seq).abs()
    }

    /// Builds a contact with a new identifier that carries over every
    /// attribute of `self` except the status and parent.
    pub(crate) fn rekeyed(&self, id: ContactId) -> Self {
        Self {
            id,
            parent: None,
            res1_seq: id.0,
            res2_seq: id.1,
            status: ContactStatus::Unknown,
            res1_chain: self.res1_chain.clone(),
            res2_chain: self.res2_chain.clone(),
            ..*self
        }
    }
}

fn parse_code(code: &str) -> Result<char, ContactError> {
    to_one_letter(code).ok_or_else(|| ContactError::UnknownResidue(code.to_string()))
}

impl Node for Contact {
    type Key = ContactId;

    fn key(&self) -> &ContactId {
        &self.id
    }

    fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    fn set_parent(&mut self, parent: Option<String>) {
        self.parent = parent;
    }
}
