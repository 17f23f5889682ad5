//! # Core Module
//!
//! Stateless building blocks of contactkit: the contact data model, amino acid
//! code tables, the pairwise alignment primitive and the file boundary to the
//! external contact-map aligner.
//!
//! ## Architecture
//!
//! - **Data Model** ([`models`]) - Containers, contacts, sequences and contact maps
//! - **Alignment** ([`align`]) - Local and global pairwise alignment with affine gaps
//! - **File I/O** ([`io`]) - Line formats consumed and produced by external tools
//! - **Utilities** ([`utils`]) - Residue code lookup tables
//!
//! Nothing in this module keeps state between calls. The stateful matching of
//! two contact maps lives in [`crate::engine`].

pub mod align;
pub mod io;
pub mod models;
pub mod utils;
