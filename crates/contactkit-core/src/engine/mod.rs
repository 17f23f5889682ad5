//! # Engine Module
//!
//! Matching of a contact map against a reference map.
//!
//! ## Overview
//!
//! Two contact maps rarely share a residue numbering: a prediction is numbered
//! along the target sequence while an observed map follows the numbering of a
//! structure file, which may cover only part of the protein. The engine
//! reconciles the two by aligning their sequences and building a keymap per
//! map, an ordered list of the residues each map references laid over a shared
//! alignment frame. Contacts are then compared column by column.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Alignment scores per stage and optional passes
//! - **Keymaps** ([`keymap`]) - Residue descriptors aligned to alignment columns
//! - **Matching** ([`matching`]) - The staged matching procedure itself
//! - **Error Handling** ([`error`]) - Engine-specific error types
//!
//! ## Usage
//!
//! ```
//! use contactkit::core::models::{contact::Contact, contact_map::ContactMap, sequence::Sequence};
//! use contactkit::engine::config::MatchConfig;
//!
//! let mut prediction = ContactMap::new("prediction");
//! prediction.add(Contact::new(1, 5, 1.0)).unwrap();
//! prediction.set_sequence(Some(Sequence::new("target", "ABCDEFGH").unwrap()));
//!
//! let mut observed = ContactMap::new("observed");
//! for (i, j) in [(1, 5), (1, 6), (2, 7), (3, 5)] {
//!     observed.add(Contact::new(i, j, 1.0)).unwrap();
//! }
//! observed.set_sequence(Some(Sequence::new("structure", "ABCDEFG").unwrap()));
//!
//! let summary = prediction.match_with(&mut observed, &MatchConfig::default()).unwrap();
//! assert_eq!(summary.true_positives, 1);
//! ```

pub mod config;
pub mod error;
pub mod keymap;
pub mod matching;
