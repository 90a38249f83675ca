//! Strand orientation of a gene relative to the genome-forward sequence.

use std::fmt;

/// Strand a gene is transcribed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Strand {
    #[default]
    Forward,
    /// Transcribed from the opposite strand; `start`/`end` stay in
    /// genome-forward coordinates.
    ReverseComplement,
}

impl Strand {
    /// Strand of a GenBank feature location. Any `complement(...)`, including
    /// one nested in `join(...)`, is reverse; everything else is forward.
    #[must_use]
    pub fn from_location(location: &str) -> Self {
        if location.contains("complement(") {
            Self::ReverseComplement
        } else {
            Self::Forward
        }
    }

    #[must_use]
    pub fn is_reverse(self) -> bool {
        self == Self::ReverseComplement
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forward => write!(f, "+"),
            Self::ReverseComplement => write!(f, "-"),
        }
    }
}
