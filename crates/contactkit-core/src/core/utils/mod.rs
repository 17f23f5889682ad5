//! Shared lookup tables and small helpers used across the data model.

pub mod residues;
