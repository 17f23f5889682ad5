use phf::{Map, Set, phf_map, phf_set};

/// Symbol used for alignment gaps and masked positions.
pub const GAP_CHAR: char = '-';

/// One-letter code assigned to residues whose identity is not known.
pub const UNKNOWN_RESIDUE: char = 'X';

static ONE_LETTER_CODES: Set<char> = phf_set! {
    'A', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'K', 'L',
    'M', 'N', 'P', 'Q', 'R', 'S', 'T', 'V', 'W', 'Y',
    // IUPAC extended and ambiguity codes
    'B', 'Z', 'J', 'U', 'O', 'X',
};

static THREE_TO_ONE: Map<&'static str, char> = phf_map! {
    "ALA" => 'A', "CYS" => 'C', "ASP" => 'D', "GLU" => 'E', "PHE" => 'F',
    "GLY" => 'G', "HIS" => 'H', "ILE" => 'I', "LYS" => 'K', "LEU" => 'L',
    "MET" => 'M', "ASN" => 'N', "PRO" => 'P', "GLN" => 'Q', "ARG" => 'R',
    "SER" => 'S', "THR" => 'T', "VAL" => 'V', "TRP" => 'W', "TYR" => 'Y',
    "ASX" => 'B', "GLX" => 'Z', "XLE" => 'J', "SEC" => 'U', "PYL" => 'O',
    "UNK" => 'X',
    // Common protonation-state aliases
    "HSE" => 'H', "HSD" => 'H', "HSP" => 'H', "HIE" => 'H', "HID" => 'H', "HIP" => 'H',
    "CYX" => 'C', "MSE" => 'M',
};

pub fn is_residue_char(c: char) -> bool {
    ONE_LETTER_CODES.contains(&c.to_ascii_uppercase())
}

/// Normalises a one- or three-letter amino acid code to its one-letter form.
///
/// Surrounding whitespace is ignored and the lookup is case-insensitive.
/// Returns `None` for anything that is not a recognised code.
pub fn to_one_letter(code: &str) -> Option<char> {
    let code = code.trim().to_ascii_uppercase();
    let mut chars = code.chars();
    match (chars.next(), code.len()) {
        (Some(c), 1) if ONE_LETTER_CODES.contains(&c) => Some(c),
        (_, 3) => THREE_TO_ONE.get(code.as_str()).copied(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_one_letter_accepts_one_letter_codes() {
        assert_eq!(to_one_letter("A"), Some('A'));
        assert_eq!(to_one_letter("w"), Some('W'));
        assert_eq!(to_one_letter("X"), Some('X'));
    }

    #[test]
    fn to_one_letter_converts_three_letter_codes() {
        assert_eq!(to_one_letter("ALA"), Some('A'));
        assert_eq!(to_one_letter("trp"), Some('W'));
        assert_eq!(to_one_letter(" HSE "), Some('H'));
        assert_eq!(to_one_letter("UNK"), Some('X'));
    }

    #[test]
    fn to_one_letter_rejects_unrecognised_codes() {
        assert_eq!(to_one_letter(""), None);
        assert_eq!(to_one_letter("1"), None);
        assert_eq!(to_one_letter("AL"), None);
        assert_eq!(to_one_letter("FOO"), None);
        assert_eq!(to_one_letter("ALAN"), None);
        assert_eq!(to_one_letter("-"), None);
    }

    #[test]
    fn is_residue_char_excludes_gap_and_digits() {
        assert!(is_residue_char('A'));
        assert!(is_residue_char('y'));
        assert!(is_residue_char('B'));
        assert!(!is_residue_char(GAP_CHAR));
        assert!(!is_residue_char('5'));
        assert!(!is_residue_char('*'));
    }
}
