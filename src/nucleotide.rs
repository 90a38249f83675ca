//! Nucleotide alphabet helpers.

/// Strand complement of a single nucleotide symbol.
///
/// Case is preserved. Symbols outside `acgt` (`n`, `x`, `z`, `o`, gaps)
/// complement to themselves.
#[must_use]
pub fn complement(symbol: u8) -> u8 {
    match symbol {
        b'a' => b't',
        b't' => b'a',
        b'c' => b'g',
        b'g' => b'c',
        b'A' => b'T',
        b'T' => b'A',
        b'C' => b'G',
        b'G' => b'C',
        other => other,
    }
}

/// Reverse complement of a nucleotide sequence.
#[must_use]
pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter().rev().map(|&b| complement(b)).collect()
}

/// Lower-case a base sequence, rejecting anything that is not an ASCII letter.
pub fn normalize(seq: &[u8]) -> Option<Vec<u8>> {
    if seq.iter().all(u8::is_ascii_alphabetic) {
        Some(seq.to_ascii_lowercase())
    } else {
        None
    }
}
