//! Boundary to the `map_align` contact-map aligner.
//!
//! `map_align` reads contact maps in a simple line format with 0-based
//! residue offsets:
//!
//! ```text
//! LEN 120
//! CON 0 4 0.950000
//! CON 2 30 0.412000
//! ```
//!
//! Its standard output reports the residue correspondence it found on a line
//! starting with `MAX`, as whitespace separated `a:b` pairs (also 0-based).

use crate::core::models::contact_map::{ContactMap, ContactMapError};
use indexmap::IndexMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

const LENGTH_RECORD: &str = "LEN";
const CONTACT_RECORD: &str = "CON";
const SENTINEL: &str = "MAX";

#[derive(Debug, Error)]
pub enum MapAlignError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    ContactMap(#[from] ContactMapError),

    #[error("Parse error on line {line}: invalid residue pair '{token}'")]
    Parse { line: usize, token: String },

    #[error("Output contains no 'MAX' line")]
    MissingSentinel,
}

/// Writes `map` in the input format of `map_align`.
///
/// The sequence length is taken from the attached sequence, which must be set.
pub fn write_map(map: &ContactMap, writer: &mut impl Write) -> Result<(), MapAlignError> {
    let length = map.require_sequence()?.seq_len();
    writeln!(writer, "{LENGTH_RECORD} {length}")?;
    for contact in map {
        writeln!(
            writer,
            "{CONTACT_RECORD} {} {} {:.6}",
            contact.res1_seq - 1,
            contact.res2_seq - 1,
            contact.raw_score()
        )?;
    }
    Ok(())
}

pub fn write_map_to_path<P: AsRef<Path>>(map: &ContactMap, path: P) -> Result<(), MapAlignError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_map(map, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Parses the standard output of `map_align`.
///
/// Only the first line starting with `MAX` is read. Offsets are converted
/// back to 1-based residue numbers.
pub fn parse_output(reader: &mut impl BufRead) -> Result<ResidueMapping, MapAlignError> {
    for (line_num, line_res) in reader.lines().enumerate() {
        let line = line_res?;
        let mut tokens = line.split_whitespace();
        if tokens.next() != Some(SENTINEL) {
            continue;
        }

        let mut pairs = IndexMap::new();
        for token in tokens.filter(|t| t.contains(':')) {
            let (from, to) = parse_pair(token).ok_or_else(|| MapAlignError::Parse {
                line: line_num + 1,
                token: token.to_string(),
            })?;
            pairs.insert(from + 1, to + 1);
        }
        return Ok(ResidueMapping { pairs });
    }
    Err(MapAlignError::MissingSentinel)
}

pub fn read_output_from_path<P: AsRef<Path>>(path: P) -> Result<ResidueMapping, MapAlignError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    parse_output(&mut reader)
}

fn parse_pair(token: &str) -> Option<(isize, isize)> {
    let (from, to) = token.split_once(':')?;
    Some((from.trim().parse().ok()?, to.trim().parse().ok()?))
}

/// Correspondence from the residue numbering of one map to another, in the
/// order it was reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResidueMapping {
    pairs: IndexMap<isize, isize>,
}

impl ResidueMapping {
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn get(&self, residue: isize) -> Option<isize> {
        self.pairs.get(&residue).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (isize, isize)> + '_ {
        self.pairs.iter().map(|(&from, &to)| (from, to))
    }

    /// Pairs that would change a residue's number.
    pub fn suggestions(&self) -> Vec<(isize, isize)> {
        self.iter().filter(|(from, to)| from != to).collect()
    }

    /// Renumbers the primary indices of every contact whose residues appear in
    /// the mapping. Identifiers are left untouched.
    ///
    /// Returns the number of contacts that changed.
    pub fn apply(&self, map: &mut ContactMap) -> usize {
        let mut changed = 0;
        for contact in map.iter_mut() {
            let res1 = self.get(contact.res1_seq).unwrap_or(contact.res1_seq);
            let res2 = self.get(contact.res2_seq).unwrap_or(contact.res2_seq);
            if (res1, res2) != (contact.res1_seq, contact.res2_seq) {
                contact.res1_seq = res1;
                contact.res2_seq = res2;
                changed += 1;
            }
        }
        changed
    }
}

impl FromIterator<(isize, isize)> for ResidueMapping {
    fn from_iter<I: IntoIterator<Item = (isize, isize)>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().collect(),
        }
    }
}
