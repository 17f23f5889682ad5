//! Line formats exchanged with external tools.
//!
//! The core never launches other programs. It only writes the files they
//! consume and parses the text they print.

pub mod map_align;
