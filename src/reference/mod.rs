//! Reference model consumed by the encoder.
//!
//! The encoder only ever reads the reference: gene coordinates, the base at a
//! genome position and the codons of a gene rebuilt from a nucleotide window.
//! Every encoding call works on its own copy of a gene window, so one
//! reference can be shared by reference across threads.

pub mod genome;

use crate::codon::Codon;
use crate::error::Error;
use crate::gene::GeneRecord;
use crate::mask::GeneMask;
use crate::nucleotide;

pub use genome::{Genome, GenomeBuilder};

/// Read-only view of a reference genome and its gene annotations.
pub trait ReferenceModel {
    /// Coordinates of a gene by name.
    fn gene(&self, name: &str) -> Result<&GeneRecord, Error>;

    /// Reference base at a 1-based genome position.
    fn nucleotide_at(&self, position: i64) -> Option<u8>;

    /// Names of the genes (promoters included) covering a position, sorted.
    fn genes_overlapping(&self, position: i64) -> Vec<&str>;

    /// Amino acid for a codon.
    fn translate(&self, codon: &Codon) -> u8;

    /// Selection of a gene within the reference's stacked tables.
    fn select_gene(&self, name: &str) -> Result<GeneMask, Error>;

    /// Codons of a coding gene rebuilt from `window`, a nucleotide window laid
    /// out like [`ReferenceModel::gene_window`] for the same mask.
    /// Non-coding genes have no codons.
    fn rebuild_codons(&self, name: &str, mask: &GeneMask, window: &[u8])
    -> Result<Vec<Codon>, Error>;

    /// Reference bases at the columns selected by `mask`, in column order.
    fn gene_window(&self, mask: &GeneMask) -> Vec<u8> {
        mask.columns
            .iter()
            .map(|&column| self.nucleotide_at(column as i64 + 1).unwrap_or(b'n'))
            .collect()
    }

    fn complement(&self, symbol: u8) -> u8 {
        nucleotide::complement(symbol)
    }
}
