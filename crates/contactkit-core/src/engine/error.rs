use thiserror::Error;

use crate::core::align::AlignmentError;
use crate::core::models::contact::ContactId;
use crate::core::models::contact_map::ContactMapError;
use crate::core::models::entity::HierarchyError;

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Contact map error: {source}")]
    ContactMap {
        #[from]
        source: ContactMapError,
    },

    #[error("Alignment failed during the {stage} stage: {source}")]
    Alignment {
        stage: &'static str,
        source: AlignmentError,
    },

    #[error("Residue {index} of contact map '{map}' is described inconsistently by its contacts")]
    ConflictingResidue { map: String, index: isize },

    #[error(
        "Keymap of contact map '{map}' holds {residues} residues but its aligned sequence has {positions} residue positions"
    )]
    KeymapMismatch {
        map: String,
        residues: usize,
        positions: usize,
    },

    #[error("Aligned keymaps differ in length ({left} vs {right})")]
    LengthMismatch { left: usize, right: usize },

    #[error("Contact {contact} is matched in the reference while one of its residues lies in a gap")]
    Inconsistent { contact: ContactId },

    #[error("Failed to add contact: {source}")]
    Hierarchy {
        #[from]
        source: HierarchyError,
    },
}
