//! Placement of inserted or deleted bases within repetitive flanks.
//!
//! The `k` extra bases of the longer allele could sit at any offset of the
//! shorter one. Every split `x` in `0..=len(shorter)` is tried by opening a
//! `k`-base gap in the shorter allele at `x`; the split with the fewest
//! mismatches against the longer allele wins, and on ties the last one does.

use std::fmt;

use crate::encoder::snp::encode_snp;
use crate::encoder::{DiagnosticSink, GeneContext, VariantCall, skip_zero};
use crate::error::Error;
use crate::gene::GeneRecord;
use crate::nucleotide;
use crate::reference::ReferenceModel;
use crate::token::MutationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndelKind {
    Insertion,
    Deletion,
}

impl fmt::Display for IndelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Insertion => write!(f, "ins"),
            Self::Deletion => write!(f, "del"),
        }
    }
}

/// Positions where both windows hold a base and the bases differ.
/// Gaps match anything.
#[must_use]
pub fn mismatch_count(a: &[Option<u8>], b: &[Option<u8>]) -> usize {
    a.iter()
        .zip(b)
        .filter(|pair| matches!(pair, (Some(x), Some(y)) if x != y))
        .count()
}

/// Winning placement of the gap in the shorter allele.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alignment {
    /// Offset in the shorter allele where the gap opens.
    pub split: usize,
    pub mismatches: usize,
    /// Shorter allele with the gap opened, as long as the longer allele.
    pub gapped: Vec<Option<u8>>,
}

fn gapped(shorter: &[u8], split: usize, gap: usize) -> Vec<Option<u8>> {
    let mut window = Vec::with_capacity(shorter.len() + gap);
    window.extend(shorter[..split].iter().copied().map(Some));
    window.extend(std::iter::repeat_n(None, gap));
    window.extend(shorter[split..].iter().copied().map(Some));
    window
}

/// Minimal-mismatch split of `shorter` against `longer`, last one on ties.
#[must_use]
pub fn align(longer: &[u8], shorter: &[u8]) -> Alignment {
    let gap = longer.len().saturating_sub(shorter.len());
    let longer: Vec<Option<u8>> = longer.iter().copied().map(Some).collect();

    let candidate = |split: usize| {
        let window = gapped(shorter, split, gap);
        Alignment {
            split,
            mismatches: mismatch_count(&window, &longer),
            gapped: window,
        }
    };

    let mut best = candidate(0);
    for split in 1..=shorter.len() {
        let next = candidate(split);
        if next.mismatches <= best.mismatches {
            best = next;
        }
    }
    best
}

/// Encode a length-changing call: residual point differences first, then the
/// insertion or deletion itself.
///
/// When the indel anchor lies past the gene's far boundary only the residual
/// tokens are returned.
pub fn encode_indel<R: ReferenceModel + ?Sized>(
    context: &GeneContext<'_, R>,
    call: &VariantCall,
    kind: IndelKind,
    sink: &mut dyn DiagnosticSink,
) -> Result<Vec<MutationToken>, Error> {
    let (longer, shorter) = match kind {
        IndelKind::Deletion => (&call.reference, &call.alternate),
        IndelKind::Insertion => (&call.alternate, &call.reference),
    };
    if longer.len() <= shorter.len() {
        return Err(Error::InvariantViolation(format!(
            "{kind} at {} for {} has ref length {} and alt length {}",
            call.position,
            call.gene,
            call.reference.len(),
            call.alternate.len()
        )));
    }
    let length = longer.len() - shorter.len();
    let alignment = align(longer, shorter);
    let split = alignment.split;

    let mut tokens = match kind {
        IndelKind::Deletion => {
            let reference: Vec<Option<u8>> = longer.iter().copied().map(Some).collect();
            encode_snp(context, call.position, &reference, &alignment.gapped, sink)?
        }
        IndelKind::Insertion => {
            let reference: Vec<Option<u8>> = shorter.iter().copied().map(Some).collect();
            let alternate: Vec<Option<u8>> = longer[..split]
                .iter()
                .chain(&longer[split + length..])
                .copied()
                .map(Some)
                .collect();
            encode_snp(context, call.position, &reference, &alternate, sink)?
        }
    };

    let gene = context.gene;
    let abs = call.position + split as i64;
    let Some(position) = anchor(gene, abs, length, kind) else {
        log::debug!(
            "{}: {kind} at {abs} lies past the gene boundary, keeping residual SNPs only",
            gene.name
        );
        return Ok(tokens);
    };

    let bases = &longer[split..split + length];
    let bases = if gene.strand.is_reverse() {
        nucleotide::reverse_complement(bases)
    } else {
        bases.to_vec()
    };
    tokens.push(match kind {
        IndelKind::Insertion => MutationToken::Insertion {
            gene: gene.name.clone(),
            position,
            bases,
        },
        IndelKind::Deletion => MutationToken::Deletion {
            gene: gene.name.clone(),
            position,
            bases,
        },
    });
    Ok(tokens)
}

/// Gene-relative anchor of an indel whose first affected base is at `abs`,
/// or `None` past the gene's far boundary.
fn anchor(gene: &GeneRecord, abs: i64, length: usize, kind: IndelKind) -> Option<i64> {
    let span = gene.end - gene.start;

    if !gene.strand.is_reverse() {
        let position = abs - gene.start;
        if position > span {
            return None;
        }
        return Some(skip_zero(position));
    }

    let position = gene.end - abs;
    if position - 1 > span {
        return None;
    }
    match kind {
        // reported at the 5' end of the deleted run in transcript order
        IndelKind::Deletion => Some(skip_zero(position - length as i64 + 1)),
        IndelKind::Insertion => {
            let position = if position <= 0 { position - 1 } else { position + 1 };
            Some(skip_zero(position))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::Warning;
    use crate::reference::Genome;
    use crate::reference::genome::fixtures;
    use crate::token::render_row;

    fn window(bases: &str) -> Vec<Option<u8>> {
        bases.bytes().map(Some).collect()
    }

    fn encode(genome: &Genome, gene: &str, position: i64, r: &str, a: &str) -> Result<String, Error> {
        let mask = genome.select_gene(gene)?;
        let context = GeneContext {
            reference: genome,
            gene: genome.gene(gene)?,
            mask: &mask,
        };
        let call = VariantCall::new(gene, position, r.as_bytes(), a.as_bytes())?;
        let kind = if r.len() > a.len() {
            IndelKind::Deletion
        } else {
            IndelKind::Insertion
        };
        let tokens = encode_indel(&context, &call, kind, &mut Vec::<Warning>::new())?;
        Ok(render_row(&tokens))
    }

    fn row(gene: &str, position: i64, r: &str, a: &str) -> String {
        encode(&fixtures::genome(), gene, position, r, a).unwrap()
    }

    #[test]
    fn mismatch_count_is_symmetric() {
        let pairs = [
            ("acgt", "acgt"),
            ("acgt", "tgca"),
            ("aaaa", "aaat"),
            ("ctgt", "cggc"),
        ];
        for (a, b) in pairs {
            let (a, b) = (window(a), window(b));
            assert_eq!(mismatch_count(&a, &b), mismatch_count(&b, &a));
        }
        let gapped = vec![Some(b'c'), None, Some(b'g')];
        assert_eq!(mismatch_count(&gapped, &window("ctg")), 0);
        assert_eq!(mismatch_count(&window("ctg"), &gapped), 0);
    }

    #[test]
    fn ties_keep_the_last_split() {
        let alignment = align(b"aaa", b"aa");
        assert_eq!(alignment.split, 2);
        assert_eq!(alignment.mismatches, 0);
        assert_eq!(alignment.gapped, vec![Some(b'a'), Some(b'a'), None]);

        assert_eq!(align(b"acac", b"ac").split, 2);
    }

    #[test]
    fn chosen_split_is_minimal() {
        for (longer, shorter) in [("ctgt", "cgc"), ("gaag", "caa"), ("ggt", "g"), ("tacgt", "tgt")] {
            let (longer, shorter) = (longer.as_bytes(), shorter.as_bytes());
            let best = align(longer, shorter);
            let gap = longer.len() - shorter.len();
            let full = window(std::str::from_utf8(longer).unwrap());
            for split in 0..=shorter.len() {
                let candidate = gapped(shorter, split, gap);
                let mismatches = mismatch_count(&candidate, &full);
                assert!(best.mismatches <= mismatches);
                if split > best.split {
                    assert!(mismatches > best.mismatches);
                }
            }
        }
    }

    #[test]
    fn repeated_base_deletion() {
        assert_eq!(row("fwdA", 24, "aaa", "aa"), "fwdA@6_del_a");
    }

    #[test]
    fn deletion_in_coding_region() {
        assert_eq!(row("fwdA", 27, "ctg", "cg"), "fwdA@8_del_t");
    }

    #[test]
    fn deletion_with_residual_snp() {
        assert_eq!(row("fwdA", 27, "ctgt", "cgc"), "fwdA@!4Q&fwdA@8_del_t");
    }

    #[test]
    fn forward_insertions() {
        assert_eq!(row("fwdA", 24, "aa", "aaa"), "fwdA@6_ins_a");
        assert_eq!(row("fwdA", 15, "t", "tg"), "fwdA@-5_ins_g");
    }

    #[test]
    fn promoter_boundary_skips_zero() {
        assert_eq!(row("fwdA", 19, "ta", "t"), "fwdA@-1_del_a");
    }

    #[test]
    fn truncated_indel_keeps_residuals() {
        assert_eq!(row("rrsC", 70, "gaag", "caa"), "rrsC@g10c");
    }

    #[test]
    fn truncated_insertion_past_gene_end() {
        assert_eq!(row("rrsC", 72, "a", "ag"), "");
    }

    #[test]
    fn reverse_indels_past_gene_start_keep_residuals() {
        // four g deleted at 77..=80, c -> g residual at 84
        assert_eq!(row("revD", 77, "ggggaacc", "aacg"), "revD@g7c");
        // t inserted before 78, c -> g residual at 83
        assert_eq!(row("revD", 78, "ggaacc", "tggaacg"), "revD@g8c");
        // nothing left once the indel is dropped
        assert_eq!(row("revD", 77, "g", "gc"), "");
    }

    #[test]
    fn reverse_deletions() {
        assert_eq!(row("revD", 87, "tt", "t"), "revD@4_del_a");
        assert_eq!(row("revD", 85, "ggt", "g"), "revD@5_del_ac");
    }

    #[test]
    fn reverse_insertions() {
        assert_eq!(row("revD", 87, "t", "tc"), "revD@5_ins_g");
        assert_eq!(row("revB", 55, "a", "ag"), "revB@-6_ins_c");
    }

    #[test]
    fn equal_lengths_are_an_invariant_violation() {
        let genome = fixtures::genome();
        let mask = genome.select_gene("fwdA").unwrap();
        let context = GeneContext {
            reference: &genome,
            gene: genome.gene("fwdA").unwrap(),
            mask: &mask,
        };
        let call = VariantCall::new("fwdA", 24, b"a", b"g").unwrap();
        for kind in [IndelKind::Insertion, IndelKind::Deletion] {
            assert!(matches!(
                encode_indel(&context, &call, kind, &mut Vec::<Warning>::new()),
                Err(Error::InvariantViolation(_))
            ));
        }
        // a deletion call routed as an insertion is also rejected
        let call = VariantCall::new("fwdA", 24, b"aa", b"a").unwrap();
        assert!(matches!(
            encode_indel(&context, &call, IndelKind::Insertion, &mut Vec::<Warning>::new()),
            Err(Error::InvariantViolation(_))
        ));
    }
}
