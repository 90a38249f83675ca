//! GARC mutation tokens and their text form.
//!
//! Tokens stay structured inside the encoder and are only rendered when a
//! mutation row is written:
//!
//! ```text
//! katG@a-15g      promoter or nucleotide SNP
//! katG@S315T      amino-acid SNP ('!' is stop)
//! rpoB@1296_ins_ttc
//! pncA@-3_del_a
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// One canonical mutation named against a gene.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MutationToken {
    NucleotideSnp {
        gene: String,
        position: i64,
        reference: u8,
        alternate: u8,
    },
    AminoAcidSnp {
        gene: String,
        /// 1-based codon index.
        codon: usize,
        reference: u8,
        alternate: u8,
    },
    Insertion {
        gene: String,
        position: i64,
        bases: Vec<u8>,
    },
    Deletion {
        gene: String,
        position: i64,
        bases: Vec<u8>,
    },
}

impl fmt::Display for MutationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NucleotideSnp {
                gene,
                position,
                reference,
                alternate,
            } => write!(
                f,
                "{gene}@{}{position}{}",
                char::from(*reference),
                char::from(*alternate)
            ),
            Self::AminoAcidSnp {
                gene,
                codon,
                reference,
                alternate,
            } => write!(
                f,
                "{gene}@{}{codon}{}",
                char::from(*reference),
                char::from(*alternate)
            ),
            Self::Insertion {
                gene,
                position,
                bases,
            } => write!(f, "{gene}@{position}_ins_{}", String::from_utf8_lossy(bases)),
            Self::Deletion {
                gene,
                position,
                bases,
            } => write!(f, "{gene}@{position}_del_{}", String::from_utf8_lossy(bases)),
        }
    }
}

impl FromStr for MutationToken {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |why: &str| Error::Parse(format!("invalid GARC token '{s}': {why}"));

        let (gene, body) = s.split_once('@').ok_or_else(|| invalid("missing '@'"))?;
        if gene.is_empty() {
            return Err(invalid("empty gene name"));
        }
        let gene = gene.to_string();

        if let Some((position, rest)) = body.split_once('_') {
            let position = parse_position(position).ok_or_else(|| invalid("bad position"))?;
            let (kind, bases) = rest.split_once('_').ok_or_else(|| invalid("missing bases"))?;
            if bases.is_empty() || !bases.bytes().all(|b| b.is_ascii_lowercase()) {
                return Err(invalid("bases must be lowercase nucleotides"));
            }
            let bases = bases.as_bytes().to_vec();
            return match kind {
                "ins" => Ok(Self::Insertion {
                    gene,
                    position,
                    bases,
                }),
                "del" => Ok(Self::Deletion {
                    gene,
                    position,
                    bases,
                }),
                _ => Err(invalid("expected 'ins' or 'del'")),
            };
        }

        let bytes = body.as_bytes();
        if bytes.len() < 3 || !body.is_ascii() {
            return Err(invalid("too short"));
        }
        let (reference, alternate) = (bytes[0], bytes[bytes.len() - 1]);
        let number = &body[1..body.len() - 1];

        if reference.is_ascii_lowercase() {
            if !alternate.is_ascii_lowercase() {
                return Err(invalid("mixed nucleotide and amino-acid symbols"));
            }
            let position = parse_position(number).ok_or_else(|| invalid("bad position"))?;
            Ok(Self::NucleotideSnp {
                gene,
                position,
                reference,
                alternate,
            })
        } else if is_amino_acid(reference) {
            if !is_amino_acid(alternate) {
                return Err(invalid("mixed nucleotide and amino-acid symbols"));
            }
            let codon = number
                .parse::<usize>()
                .ok()
                .filter(|&codon| codon > 0)
                .ok_or_else(|| invalid("bad codon index"))?;
            Ok(Self::AminoAcidSnp {
                gene,
                codon,
                reference,
                alternate,
            })
        } else {
            Err(invalid("unrecognised reference symbol"))
        }
    }
}

fn is_amino_acid(symbol: u8) -> bool {
    symbol.is_ascii_uppercase() || symbol == crate::codon::STOP
}

/// Signed relative position; zero is never valid.
fn parse_position(text: &str) -> Option<i64> {
    let digits = text.strip_prefix('-').unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok().filter(|&position: &i64| position != 0)
}

/// Render tokens as one mutation row, sorted by their text and joined by `&`.
#[must_use]
pub fn render_row(tokens: &[MutationToken]) -> String {
    let mut rendered: Vec<String> = tokens.iter().map(ToString::to_string).collect();
    rendered.sort_unstable();
    rendered.join("&")
}

/// Parse a mutation row back into its tokens.
pub fn parse_row(text: &str) -> Result<Vec<MutationToken>, Error> {
    text.split('&').map(str::parse).collect()
}
