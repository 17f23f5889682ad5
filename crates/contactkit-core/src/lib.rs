//! # contactkit
//!
//! A library for comparing residue contact maps, typically a predicted map
//! against one observed in an experimental structure.
//!
//! ## Architectural Philosophy
//!
//! The library is split into two layers:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Contact`, `ContactMap`,
//!   `Sequence`), derived metrics such as precision and coverage, the pairwise
//!   alignment primitive and the file format shared with external aligners.
//!
//! - **[`engine`]: The Matching Core.** Aligns the sequences of two contact maps
//!   in several stages, builds position keymaps from the alignment and uses
//!   them to classify every contact as a true positive, false positive or
//!   unknown. Optional passes add false negatives, drop unmatched contacts and
//!   renumber contacts into the reference numbering.
//!
//! The library reports progress through `tracing` events and never installs a
//! subscriber itself.

pub mod core;
pub mod engine;
