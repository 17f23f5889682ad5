//! # Pairwise Alignment
//!
//! Thin wrapper around the dynamic-programming aligner of the `bio` crate that
//! returns the two input sequences re-gapped into a common frame.
//!
//! Scores are configured as floating point values and converted to the
//! aligner's integer scoring with a fixed scale factor. Gaps follow an affine
//! model where a gap of length `k` costs `gap_open + (k - 1) * gap_extend`.
//!
//! Local alignments keep the unaligned flanks of both inputs: the leading
//! flanks are right-aligned against each other and the trailing flanks are
//! left-aligned, with the shorter side padded by gap characters. Both outputs
//! therefore always have the same length and contain every input character.

use crate::core::utils::residues::GAP_CHAR;
use bio::alignment::AlignmentOperation;
use bio::alignment::pairwise::Aligner;
use serde::Deserialize;
use thiserror::Error;
use tracing::{instrument, trace};

const SCORE_SCALE: f64 = 100.0;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AlignmentError {
    #[error("Alignment score '{name}' must be finite (got {value})")]
    NonFinite { name: &'static str, value: f64 },

    #[error("Gap penalty '{name}' must not be positive (got {value})")]
    PositiveGapPenalty { name: &'static str, value: f64 },

    #[error("Gap extension penalty ({extend}) must not be harsher than the gap opening penalty ({open})")]
    ExtendHarsherThanOpen { open: f64, extend: f64 },
}

/// Scoring parameters for one pairwise alignment.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AlignmentScores {
    pub match_score: f64,
    pub mismatch_score: f64,
    pub gap_open: f64,
    pub gap_extend: f64,
}

impl Default for AlignmentScores {
    fn default() -> Self {
        Self::new(2.0, 1.0, -0.5, -0.1)
    }
}

impl AlignmentScores {
    pub const fn new(match_score: f64, mismatch_score: f64, gap_open: f64, gap_extend: f64) -> Self {
        Self {
            match_score,
            mismatch_score,
            gap_open,
            gap_extend,
        }
    }

    pub fn validate(&self) -> Result<(), AlignmentError> {
        for (name, value) in [
            ("match_score", self.match_score),
            ("mismatch_score", self.mismatch_score),
            ("gap_open", self.gap_open),
            ("gap_extend", self.gap_extend),
        ] {
            if !value.is_finite() {
                return Err(AlignmentError::NonFinite { name, value });
            }
        }
        if self.gap_open > 0.0 {
            return Err(AlignmentError::PositiveGapPenalty {
                name: "gap_open",
                value: self.gap_open,
            });
        }
        if self.gap_extend > 0.0 {
            return Err(AlignmentError::PositiveGapPenalty {
                name: "gap_extend",
                value: self.gap_extend,
            });
        }
        if self.gap_open > self.gap_extend {
            return Err(AlignmentError::ExtendHarsherThanOpen {
                open: self.gap_open,
                extend: self.gap_extend,
            });
        }
        Ok(())
    }

    /// Integer parameters for the aligner as `(match, mismatch, open, extend)`.
    ///
    /// The aligner charges `open + k * extend` for a gap of length `k`, so the
    /// opening penalty handed over is `gap_open - gap_extend`.
    fn scaled(&self) -> Result<(i32, i32, i32, i32), AlignmentError> {
        self.validate()?;
        let scale = |value: f64| (value * SCORE_SCALE).round() as i32;
        Ok((
            scale(self.match_score),
            scale(self.mismatch_score),
            scale(self.gap_open - self.gap_extend),
            scale(self.gap_extend),
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignmentMode {
    Local,
    Global,
}

/// Result of aligning `x` against `y`.
#[derive(Debug, Clone, PartialEq)]
pub struct PairwiseAlignment {
    /// `x` with gap characters inserted.
    pub aligned_x: String,
    /// `y` with gap characters inserted.
    pub aligned_y: String,
    /// Alignment score in the units of [`AlignmentScores`].
    pub score: f64,
}

impl PairwiseAlignment {
    pub fn len(&self) -> usize {
        self.aligned_x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aligned_x.is_empty()
    }
}

/// Aligns two character sequences.
///
/// Gap characters already present in the inputs are treated as ordinary
/// symbols, so a gap scores as a match against a gap. Ties between equally
/// scoring paths are resolved by the traceback order of the aligner.
#[instrument(level = "trace", skip_all, fields(x_len = x.len(), y_len = y.len(), ?mode))]
pub fn align(
    x: &str,
    y: &str,
    scores: &AlignmentScores,
    mode: AlignmentMode,
) -> Result<PairwiseAlignment, AlignmentError> {
    let (match_score, mismatch_score, gap_open, gap_extend) = scores.scaled()?;
    let (xs, ys) = (x.as_bytes(), y.as_bytes());

    if xs.is_empty() || ys.is_empty() {
        let (aligned_x, aligned_y) = match mode {
            AlignmentMode::Local => overlay_flanks(xs, ys, 0, 0, &[]),
            AlignmentMode::Global => {
                let gaps = |n: usize| std::iter::repeat_n(GAP_CHAR, n).collect::<String>();
                let ax = format!("{}{}", to_string(xs), gaps(ys.len()));
                let ay = format!("{}{}", gaps(xs.len()), to_string(ys));
                (ax, ay)
            }
        };
        return Ok(PairwiseAlignment {
            aligned_x,
            aligned_y,
            score: 0.0,
        });
    }

    let score_fn = |a: u8, b: u8| if a == b { match_score } else { mismatch_score };
    let mut aligner = Aligner::with_capacity(xs.len(), ys.len(), gap_open, gap_extend, score_fn);
    let alignment = match mode {
        AlignmentMode::Local => aligner.local(xs, ys),
        AlignmentMode::Global => aligner.global(xs, ys),
    };

    let (aligned_x, aligned_y) = overlay_flanks(
        xs,
        ys,
        alignment.xstart,
        alignment.ystart,
        &alignment.operations,
    );
    let score = alignment.score as f64 / SCORE_SCALE;
    trace!(score, columns = aligned_x.len(), "pairwise alignment finished");

    Ok(PairwiseAlignment {
        aligned_x,
        aligned_y,
        score,
    })
}

fn overlay_flanks(
    x: &[u8],
    y: &[u8],
    xstart: usize,
    ystart: usize,
    operations: &[AlignmentOperation],
) -> (String, String) {
    let mut ax = String::with_capacity(x.len() + y.len());
    let mut ay = String::with_capacity(x.len() + y.len());

    let lead = xstart.max(ystart);
    pad(&mut ax, lead - xstart);
    ax.push_str(&to_string(&x[..xstart]));
    pad(&mut ay, lead - ystart);
    ay.push_str(&to_string(&y[..ystart]));

    let (mut i, mut j) = (xstart, ystart);
    for op in operations {
        match op {
            AlignmentOperation::Match | AlignmentOperation::Subst => {
                ax.push(x[i] as char);
                ay.push(y[j] as char);
                i += 1;
                j += 1;
            }
            AlignmentOperation::Ins => {
                ax.push(x[i] as char);
                ay.push(GAP_CHAR);
                i += 1;
            }
            AlignmentOperation::Del => {
                ax.push(GAP_CHAR);
                ay.push(y[j] as char);
                j += 1;
            }
            AlignmentOperation::Xclip(_) | AlignmentOperation::Yclip(_) => {}
        }
    }

    let (x_tail, y_tail) = (&x[i..], &y[j..]);
    let trail = x_tail.len().max(y_tail.len());
    ax.push_str(&to_string(x_tail));
    pad(&mut ax, trail - x_tail.len());
    ay.push_str(&to_string(y_tail));
    pad(&mut ay, trail - y_tail.len());

    (ax, ay)
}

fn pad(target: &mut String, count: usize) {
    target.extend(std::iter::repeat_n(GAP_CHAR, count));
}

fn to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}
