use crate::core::align::{self, AlignmentError, AlignmentMode, AlignmentScores};
use crate::core::utils::residues::{GAP_CHAR, is_residue_char};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SequenceError {
    #[error("Invalid residue '{character}' at position {position} of sequence '{id}'")]
    InvalidCharacter {
        id: String,
        character: char,
        position: usize,
    },
}

/// An amino acid sequence, possibly containing alignment gaps.
///
/// Residues are stored upper-case. Every non-gap character must be a
/// recognised one-letter amino acid code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    id: String,
    seq: String,
    /// Free-text annotations carried along with the sequence.
    pub remarks: Vec<String>,
}

impl Sequence {
    pub fn new(id: impl Into<String>, seq: &str) -> Result<Self, SequenceError> {
        let mut sequence = Self {
            id: id.into(),
            seq: String::new(),
            remarks: Vec::new(),
        };
        sequence.set_seq(seq)?;
        Ok(sequence)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    pub fn seq(&self) -> &str {
        &self.seq
    }

    /// Replaces the residues, validating every character first.
    pub fn set_seq(&mut self, seq: &str) -> Result<(), SequenceError> {
        let normalised = seq.trim().to_ascii_uppercase();
        if let Some((position, character)) = normalised
            .chars()
            .enumerate()
            .find(|&(_, c)| c != GAP_CHAR && !is_residue_char(c))
        {
            return Err(SequenceError::InvalidCharacter {
                id: self.id.clone(),
                character,
                position: position + 1,
            });
        }
        self.seq = normalised;
        Ok(())
    }

    /// Number of characters, gaps included.
    pub fn seq_len(&self) -> usize {
        self.seq.len()
    }

    /// Character at a 1-based residue position.
    pub fn residue_at(&self, position: isize) -> Option<char> {
        if position < 1 {
            return None;
        }
        self.seq.as_bytes().get(position as usize - 1).map(|&b| b as char)
    }

    pub fn add_remark(&mut self, remark: impl Into<String>) {
        self.remarks.push(remark.into());
    }

    /// Locally aligns this sequence against `other`, returning both re-gapped.
    pub fn align_local(
        &self,
        other: &Sequence,
        scores: &AlignmentScores,
    ) -> Result<(Sequence, Sequence), AlignmentError> {
        self.align(other, scores, AlignmentMode::Local)
    }

    /// Globally aligns this sequence against `other`, returning both re-gapped.
    pub fn align_global(
        &self,
        other: &Sequence,
        scores: &AlignmentScores,
    ) -> Result<(Sequence, Sequence), AlignmentError> {
        self.align(other, scores, AlignmentMode::Global)
    }

    fn align(
        &self,
        other: &Sequence,
        scores: &AlignmentScores,
        mode: AlignmentMode,
    ) -> Result<(Sequence, Sequence), AlignmentError> {
        let result = align::align(&self.seq, &other.seq, scores, mode)?;
        Ok((
            self.with_residues(result.aligned_x),
            other.with_residues(result.aligned_y),
        ))
    }

    // Alignment output only ever contains characters from the inputs plus gaps.
    fn with_residues(&self, seq: String) -> Sequence {
        Sequence {
            id: self.id.clone(),
            seq,
            remarks: self.remarks.clone(),
        }
    }
}
