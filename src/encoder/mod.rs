//! Variant-call to GARC notation encoder.
//!
//! [`MutationEncoder`] is the single entry point. Same-length calls go through
//! the SNP path ([`snp`]); length-changing calls go through the indel aligner
//! ([`indel`]), which places the inserted or deleted bases and hands any
//! leftover point differences back to the SNP path.

pub mod indel;
pub mod snp;

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::error::Error;
use crate::gene::GeneRecord;
use crate::mask::{GeneMask, MaskCache};
use crate::nucleotide;
use crate::reference::ReferenceModel;
use crate::token::{self, MutationToken};

pub use indel::{IndelKind, encode_indel, mismatch_count};
pub use snp::encode_snp;

/// A reference/alternate pair anchored at the genome position of its first base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantCall {
    pub gene: String,
    pub position: i64,
    pub reference: Vec<u8>,
    pub alternate: Vec<u8>,
}

impl VariantCall {
    /// Validated call with lower-cased alleles.
    pub fn new(gene: &str, position: i64, reference: &[u8], alternate: &[u8]) -> Result<Self, Error> {
        if reference.is_empty() || alternate.is_empty() {
            return Err(Error::Validation(format!(
                "empty allele in call at {position} for {gene}"
            )));
        }
        let normalized = |allele: &[u8]| {
            nucleotide::normalize(allele).ok_or_else(|| {
                Error::Validation(format!(
                    "allele '{}' at {position} is not a nucleotide sequence",
                    String::from_utf8_lossy(allele)
                ))
            })
        };
        let reference = normalized(reference)?;
        let alternate = normalized(alternate)?;
        if reference == alternate {
            return Err(Error::Validation(format!(
                "no-op call at {position} for {gene}: ref equals alt"
            )));
        }
        Ok(Self {
            gene: gene.to_string(),
            position,
            reference,
            alternate,
        })
    }

    #[must_use]
    pub fn is_snp(&self) -> bool {
        self.reference.len() == self.alternate.len()
    }
}

/// Non-fatal diagnostics raised while encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// The call's reference base disagrees with the reference model.
    ReferenceMismatch {
        gene: String,
        position: i64,
        expected: u8,
        supplied: u8,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReferenceMismatch {
                gene,
                position,
                expected,
                supplied,
            } => write!(
                f,
                "{gene}: reference base at {position} is '{}' but the call says '{}'",
                char::from(*expected),
                char::from(*supplied)
            ),
        }
    }
}

/// Receiver of encoder warnings.
pub trait DiagnosticSink {
    fn warn(&mut self, warning: Warning);
}

impl DiagnosticSink for Vec<Warning> {
    fn warn(&mut self, warning: Warning) {
        self.push(warning);
    }
}

/// Forwards warnings to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn warn(&mut self, warning: Warning) {
        log::warn!("{warning}");
    }
}

/// Tokens produced for one gene, with the warnings raised on the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Encoded {
    pub gene: String,
    pub tokens: Vec<MutationToken>,
    pub warnings: Vec<Warning>,
}

impl Encoded {
    /// The GARC mutation row for these tokens.
    #[must_use]
    pub fn row(&self) -> String {
        token::render_row(&self.tokens)
    }
}

/// Relative positions have no zero; anything at or below it moves one further.
pub(crate) fn skip_zero(position: i64) -> i64 {
    if position <= 0 { position - 1 } else { position }
}

/// Everything an encoding call needs to know about its gene.
pub struct GeneContext<'a, R: ReferenceModel + ?Sized> {
    pub reference: &'a R,
    pub gene: &'a GeneRecord,
    pub mask: &'a GeneMask,
}

/// Encodes variant calls against a shared reference.
pub struct MutationEncoder<'r, R: ReferenceModel + ?Sized> {
    reference: &'r R,
    masks: MaskCache,
}

impl<'r, R: ReferenceModel + ?Sized> MutationEncoder<'r, R> {
    #[must_use]
    pub fn new(reference: &'r R) -> Self {
        Self {
            reference,
            masks: MaskCache::new(),
        }
    }

    #[must_use]
    pub fn reference(&self) -> &'r R {
        self.reference
    }

    #[must_use]
    pub fn masks(&self) -> &MaskCache {
        &self.masks
    }

    /// Precompute masks for `genes` so later calls only read the cache.
    pub fn warm<'g, I: IntoIterator<Item = &'g str>>(&self, genes: I) -> Result<usize, Error> {
        self.masks.warm(self.reference, genes)
    }

    /// Encode a call, collecting its warnings alongside the tokens.
    pub fn to_notation(&self, call: &VariantCall) -> Result<Encoded, Error> {
        let mut warnings = Vec::new();
        let tokens = self.to_notation_with(call, &mut warnings)?;
        Ok(Encoded {
            gene: call.gene.clone(),
            tokens,
            warnings,
        })
    }

    /// Encode a call, delivering warnings to `sink`.
    pub fn to_notation_with(
        &self,
        call: &VariantCall,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Vec<MutationToken>, Error> {
        let gene = self.reference.gene(&call.gene)?;
        let mask: Arc<GeneMask> = self.masks.get(self.reference, &call.gene)?;
        let context = GeneContext {
            reference: self.reference,
            gene,
            mask: &mask,
        };

        match call.reference.len().cmp(&call.alternate.len()) {
            Ordering::Equal => {
                let reference: Vec<Option<u8>> = call.reference.iter().copied().map(Some).collect();
                let alternate: Vec<Option<u8>> = call.alternate.iter().copied().map(Some).collect();
                encode_snp(&context, call.position, &reference, &alternate, sink)
            }
            Ordering::Greater => encode_indel(&context, call, IndelKind::Deletion, sink),
            Ordering::Less => encode_indel(&context, call, IndelKind::Insertion, sink),
        }
    }

    /// Encode a call against every gene whose body or promoter covers one of
    /// its reference bases. Genes yielding no tokens are left out.
    pub fn annotate(
        &self,
        position: i64,
        reference: &[u8],
        alternate: &[u8],
    ) -> Result<Vec<Encoded>, Error> {
        let span = position..position + reference.len() as i64;
        let mut genes: Vec<&str> = span
            .flat_map(|p| self.reference.genes_overlapping(p))
            .collect();
        genes.sort_unstable();
        genes.dedup();

        let mut encoded = Vec::with_capacity(genes.len());
        for gene in genes {
            let call = VariantCall::new(gene, position, reference, alternate)?;
            let result = self.to_notation(&call)?;
            if !result.tokens.is_empty() {
                encoded.push(result);
            }
        }
        Ok(encoded)
    }
}
