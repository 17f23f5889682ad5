//! # Core Models Module
//!
//! Data structures describing residue contacts and the sequences they refer to.
//!
//! ## Key Components
//!
//! - [`entity`] - Generic ordered, id-keyed container shared by every collection type
//! - [`contact`] - A single residue pair with its score, numbering and match status
//! - [`sequence`] - Validated amino acid sequences and pairwise alignment of them
//! - [`contact_map`] - A collection of contacts attached to one sequence
//! - [`metrics`] - Read-only statistics over a contact map (precision, coverage, ...)
//!
//! ## Usage
//!
//! ```
//! use contactkit::core::models::{contact::Contact, contact_map::ContactMap, sequence::Sequence};
//!
//! let mut map = ContactMap::new("prediction");
//! map.add(Contact::new(1, 5, 0.9)).unwrap();
//! map.set_sequence(Some(Sequence::new("target", "ACDEFGH").unwrap()));
//!
//! assert_eq!(map.repr_sequence().unwrap().seq(), "A---F--");
//! ```

pub mod contact;
pub mod contact_map;
pub mod entity;
pub mod metrics;
pub mod sequence;
