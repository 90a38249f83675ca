//! Codon translation tables.

use std::str::FromStr;

use crate::error::Error;

/// Three nucleotides read in transcription direction.
pub type Codon = [u8; 3];

/// Amino acid symbol used for stop codons in GARC.
pub const STOP: u8 = b'!';

/// Amino acid symbol for codons containing a non-ACGT base.
pub const UNKNOWN: u8 = b'X';

/// Lookup table for translating codons to amino acids.
///
/// Indexed by 6-bit codon encoding: A=0, C=1, G=2, T/U=3.
/// Index = first*16 + second*4 + third.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodonTable {
    table: [u8; 64],
}

fn base_to_index(b: u8) -> Option<usize> {
    match b {
        b'A' | b'a' => Some(0),
        b'C' | b'c' => Some(1),
        b'G' | b'g' => Some(2),
        b'T' | b't' | b'U' | b'u' => Some(3),
        _ => None,
    }
}

impl CodonTable {
    /// Standard genetic code (NCBI translation table 1).
    #[must_use]
    pub fn standard() -> Self {
        #[rustfmt::skip]
        let table: [u8; 64] = [
            b'K', b'N', b'K', b'N',  // AA*
            b'T', b'T', b'T', b'T',  // AC*
            b'R', b'S', b'R', b'S',  // AG*
            b'I', b'I', b'M', b'I',  // AT*
            b'Q', b'H', b'Q', b'H',  // CA*
            b'P', b'P', b'P', b'P',  // CC*
            b'R', b'R', b'R', b'R',  // CG*
            b'L', b'L', b'L', b'L',  // CT*
            b'E', b'D', b'E', b'D',  // GA*
            b'A', b'A', b'A', b'A',  // GC*
            b'G', b'G', b'G', b'G',  // GG*
            b'V', b'V', b'V', b'V',  // GT*
            STOP, b'Y', STOP, b'Y',  // TA*
            b'S', b'S', b'S', b'S',  // TC*
            STOP, b'C', b'W', b'C',  // TG*
            b'L', b'F', b'L', b'F',  // TT*
        ];
        Self { table }
    }

    /// Bacterial, archaeal and plant plastid code (NCBI translation table 11).
    /// Amino acid assignments match table 1; only the start codon set differs.
    #[must_use]
    pub fn bacterial() -> Self {
        Self::standard()
    }

    /// Vertebrate mitochondrial genetic code (NCBI translation table 2).
    /// Differences from standard: UGA→W, AGA→stop, AGG→stop, AUA→M.
    #[must_use]
    pub fn mitochondrial() -> Self {
        let mut table = Self::standard().table;
        table[56] = b'W'; // TGA
        table[8] = STOP; // AGA
        table[10] = STOP; // AGG
        table[12] = b'M'; // ATA
        Self { table }
    }

    /// Translate a single codon to an amino acid.
    #[must_use]
    pub fn translate_codon(&self, codon: &Codon) -> u8 {
        match (
            base_to_index(codon[0]),
            base_to_index(codon[1]),
            base_to_index(codon[2]),
        ) {
            (Some(a), Some(b), Some(c)) => self.table[a * 16 + b * 4 + c],
            _ => UNKNOWN,
        }
    }
}

impl Default for CodonTable {
    fn default() -> Self {
        Self::bacterial()
    }
}

impl FromStr for CodonTable {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "standard" | "1" => Ok(Self::standard()),
            "bacterial" | "11" => Ok(Self::bacterial()),
            "mitochondrial" | "2" => Ok(Self::mitochondrial()),
            _ => Err(Error::Parse(format!("unknown codon table: '{s}'"))),
        }
    }
}

/// Split a coding sequence into complete codons; a trailing partial codon is dropped.
#[must_use]
pub fn codons(cds: &[u8]) -> Vec<Codon> {
    cds.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect()
}
