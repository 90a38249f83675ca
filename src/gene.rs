//! Gene coordinate records supplied by the reference model.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::strand::Strand;

/// Feature kind a gene was annotated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeneKind {
    Coding,
    Rrna,
    Trna,
    Ncrna,
    MiscRna,
}

impl GeneKind {
    #[must_use]
    pub fn codes_protein(self) -> bool {
        self == Self::Coding
    }
}

impl FromStr for GeneKind {
    type Err = Error;

    /// Parse a GenBank feature key.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CDS" => Ok(Self::Coding),
            "rRNA" => Ok(Self::Rrna),
            "tRNA" => Ok(Self::Trna),
            "ncRNA" => Ok(Self::Ncrna),
            "misc_RNA" => Ok(Self::MiscRna),
            _ => Err(Error::Parse(format!("unsupported gene feature key: '{s}'"))),
        }
    }
}

impl fmt::Display for GeneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = match self {
            Self::Coding => "CDS",
            Self::Rrna => "rRNA",
            Self::Trna => "tRNA",
            Self::Ncrna => "ncRNA",
            Self::MiscRna => "misc_RNA",
        };
        write!(f, "{key}")
    }
}

/// Coordinates and coding status of one gene.
///
/// `start` is the genome position immediately before the gene's first
/// forward-strand base and `end` is the position of its last base, so the
/// body occupies `start+1 ..= end` (a GenBank `a..b` location gives
/// `start = a - 1`, `end = b`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneRecord {
    pub name: String,
    pub start: i64,
    pub end: i64,
    pub strand: Strand,
    pub codes_protein: bool,
    pub kind: GeneKind,
}

impl GeneRecord {
    #[must_use]
    pub fn new(name: &str, start: i64, end: i64, strand: Strand, kind: GeneKind) -> Self {
        Self {
            name: name.to_string(),
            start,
            end,
            strand,
            codes_protein: kind.codes_protein(),
            kind,
        }
    }

    /// Number of bases in the gene body.
    #[must_use]
    pub fn len(&self) -> i64 {
        self.end - self.start
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() <= 0
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.name.is_empty() {
            return Err(Error::Validation("gene with empty name".to_string()));
        }
        if self.start < 0 || self.is_empty() {
            return Err(Error::Validation(format!(
                "gene {} has invalid coordinates ({}, {}]",
                self.name, self.start, self.end
            )));
        }
        if self.codes_protein && self.len() % 3 != 0 {
            log::debug!(
                "coding gene {} length {} is not a multiple of 3",
                self.name,
                self.len()
            );
        }
        Ok(())
    }
}
