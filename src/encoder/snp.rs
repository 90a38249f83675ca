//! Same-length ref/alt windows to nucleotide and amino-acid SNP tokens.

use crate::encoder::{DiagnosticSink, GeneContext, Warning, skip_zero};
use crate::error::Error;
use crate::reference::ReferenceModel;
use crate::token::MutationToken;

/// Where a mismatching base falls relative to its gene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    /// Past the gene's far end in scan direction; stop scanning.
    Truncated,
    /// Emitted immediately at this relative position.
    Eager(i64),
    /// Applied to the working window, reported through codons.
    Coding,
}

/// Encode a window of point differences for one gene.
///
/// `reference` and `alternate` are aligned windows starting at genome
/// position `position`; `None` marks a gap and is skipped. Promoter and
/// non-coding bases are emitted as they are found. Coding bases are applied
/// to a private copy of the gene window, then every codon that changed is
/// reported as an amino-acid SNP, together with its nucleotide SNPs when the
/// amino acid is unchanged.
///
/// Scanning stops at the first difference past the gene's far boundary and
/// the tokens found up to that point are returned as they stand.
pub fn encode_snp<R: ReferenceModel + ?Sized>(
    context: &GeneContext<'_, R>,
    position: i64,
    reference: &[Option<u8>],
    alternate: &[Option<u8>],
    sink: &mut dyn DiagnosticSink,
) -> Result<Vec<MutationToken>, Error> {
    let GeneContext {
        reference: model,
        gene,
        mask,
    } = *context;
    let reverse = gene.strand.is_reverse();
    let mut tokens = Vec::new();
    let mut working: Option<Vec<u8>> = None;

    for (offset, pair) in reference.iter().zip(alternate).enumerate() {
        let (Some(ref_base), Some(alt_base)) = pair else {
            continue;
        };
        let (ref_base, alt_base) = (*ref_base, *alt_base);
        if ref_base == alt_base {
            continue;
        }
        let abs = position + offset as i64;

        let placement = if reverse {
            if abs < gene.start {
                Placement::Truncated
            } else if abs >= gene.end {
                Placement::Eager(skip_zero(gene.end - abs))
            } else if !gene.codes_protein {
                Placement::Eager(gene.end - abs - 1)
            } else {
                Placement::Coding
            }
        } else if abs >= gene.end {
            Placement::Truncated
        } else if abs <= gene.start {
            // the base at `start` precedes the body and is promoter -1
            Placement::Eager(skip_zero(abs - gene.start))
        } else if !gene.codes_protein {
            Placement::Eager(abs - gene.start)
        } else {
            Placement::Coding
        };

        if placement == Placement::Truncated {
            log::debug!(
                "{}: difference at {abs} lies past the gene boundary, truncating",
                gene.name
            );
            return Ok(tokens);
        }

        if let Some(expected) = model.nucleotide_at(abs)
            && expected != ref_base
        {
            sink.warn(Warning::ReferenceMismatch {
                gene: gene.name.clone(),
                position: abs,
                expected,
                supplied: ref_base,
            });
        }

        match placement {
            Placement::Eager(relative) => {
                let (reference, alternate) = if reverse {
                    (model.complement(ref_base), model.complement(alt_base))
                } else {
                    (ref_base, alt_base)
                };
                tokens.push(MutationToken::NucleotideSnp {
                    gene: gene.name.clone(),
                    position: relative,
                    reference,
                    alternate,
                });
            }
            Placement::Coding => {
                if let Some(index) = mask.window_index(abs) {
                    working.get_or_insert_with(|| model.gene_window(mask))[index] = alt_base;
                }
            }
            Placement::Truncated => {}
        }
    }

    if let Some(window) = working {
        let original = model.rebuild_codons(&gene.name, mask, &model.gene_window(mask))?;
        let mutated = model.rebuild_codons(&gene.name, mask, &window)?;

        for (k, (before, after)) in original.iter().zip(&mutated).enumerate() {
            if before == after {
                continue;
            }
            let ref_aa = model.translate(before);
            let alt_aa = model.translate(after);
            tokens.push(MutationToken::AminoAcidSnp {
                gene: gene.name.clone(),
                codon: k + 1,
                reference: ref_aa,
                alternate: alt_aa,
            });
            if ref_aa == alt_aa {
                for j in (0..3).filter(|&j| before[j] != after[j]) {
                    tokens.push(MutationToken::NucleotideSnp {
                        gene: gene.name.clone(),
                        position: (k * 3 + j + 1) as i64,
                        reference: before[j],
                        alternate: after[j],
                    });
                }
            }
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codon;
    use crate::reference::Genome;
    use crate::reference::genome::fixtures;
    use crate::token::{parse_row, render_row};

    fn window(bases: &str) -> Vec<Option<u8>> {
        bases.bytes().map(Some).collect()
    }

    fn encode(genome: &Genome, gene: &str, position: i64, r: &str, a: &str) -> (String, Vec<Warning>) {
        let mask = genome.select_gene(gene).unwrap();
        let context = GeneContext {
            reference: genome,
            gene: genome.gene(gene).unwrap(),
            mask: &mask,
        };
        let mut warnings = Vec::new();
        let tokens = encode_snp(&context, position, &window(r), &window(a), &mut warnings).unwrap();
        (render_row(&tokens), warnings)
    }

    fn row(gene: &str, position: i64, r: &str, a: &str) -> String {
        encode(&fixtures::genome(), gene, position, r, a).0
    }

    #[test]
    fn forward_promoter() {
        assert_eq!(row("fwdA", 15, "t", "c"), "fwdA@t-5c");
    }

    #[test]
    fn forward_missense() {
        assert_eq!(row("fwdA", 24, "a", "g"), "fwdA@K2E");
    }

    #[test]
    fn synonymous_emits_both() {
        assert_eq!(row("fwdA", 29, "g", "a"), "fwdA@L3L&fwdA@g9a");
    }

    #[test]
    fn stop_lost() {
        assert_eq!(row("fwdA", 31, "a", "c"), "fwdA@!4S");
    }

    #[test]
    fn forward_truncation_at_gene_end() {
        assert_eq!(row("fwdA", 32, "a", "c"), "");
        assert_eq!(row("rrsC", 71, "aag", "ttc"), "rrsC@a11t");
    }

    #[test]
    fn forward_non_coding() {
        assert_eq!(row("rrsC", 65, "a", "g"), "rrsC@a5g");
    }

    #[test]
    fn two_bases_in_one_codon() {
        // aaa -> gga (K -> G)
        assert_eq!(row("fwdA", 24, "aa", "gg"), "fwdA@K2G");
    }

    #[test]
    fn gaps_are_skipped() {
        let genome = fixtures::genome();
        let mask = genome.select_gene("fwdA").unwrap();
        let context = GeneContext {
            reference: &genome,
            gene: genome.gene("fwdA").unwrap(),
            mask: &mask,
        };
        let tokens = encode_snp(
            &context,
            24,
            &[Some(b'a'), Some(b'a')],
            &[None, Some(b'c')],
            &mut Vec::<Warning>::new(),
        )
        .unwrap();
        assert_eq!(render_row(&tokens), "fwdA@K2T");
    }

    #[test]
    fn reference_mismatch_warns_and_continues() {
        let (row, warnings) = encode(&fixtures::genome(), "fwdA", 24, "c", "g");
        assert_eq!(row, "fwdA@K2E");
        assert_eq!(warnings.len(), 1);
        assert!(matches!(
            warnings[0],
            Warning::ReferenceMismatch {
                position: 24,
                expected: b'a',
                supplied: b'c',
                ..
            }
        ));
    }

    #[test]
    fn reverse_promoter_is_complemented() {
        assert_eq!(row("revB", 55, "a", "g"), "revB@t-3c");
    }

    #[test]
    fn reverse_coding() {
        assert_eq!(row("revB", 47, "g", "t"), "revB@A2A&revB@c6a");
        assert_eq!(row("revB", 43, "a", "g"), "revB@!4R");
        assert_eq!(row("revB", 49, "c", "a"), "revB@A2S");
    }

    #[test]
    fn reverse_coding_uses_complemented_bases() {
        // g -> a on the genome is c -> t on the transcript
        let (row, _) = encode(&fixtures::genome(), "revB", 47, "g", "a");
        // gcc -> gct keeps alanine
        assert_eq!(row, "revB@A2A&revB@c6t");
    }

    #[test]
    fn reverse_non_coding() {
        assert_eq!(row("revD", 89, "a", "g"), "revD@t2c");
    }

    #[test]
    fn promoter_boundary_base_skips_zero() {
        // reverse: the base at `end` is promoter -1
        assert_eq!(row("revB", 52, "t", "a"), "revB@a-1t");
        assert_eq!(row("revD", 92, "c", "a"), "revD@g-1t");
        // forward: the base at `start` is promoter -1
        assert_eq!(row("rrsC", 60, "c", "a"), "rrsC@c-1a");
        assert_eq!(row("fwdA", 20, "a", "c"), "fwdA@a-1c");
        for text in ["revB@a-1t", "revD@g-1t", "rrsC@c-1a", "fwdA@a-1c"] {
            assert!(parse_row(text).is_ok());
        }
    }

    #[test]
    fn reverse_non_coding_last_body_base_keeps_offset() {
        // end - abs - 1 is 0 for the body base next to the promoter
        assert_eq!(row("revD", 91, "c", "a"), "revD@g0t");
        assert_ne!(row("revD", 91, "c", "a"), row("revD", 92, "c", "a"));
    }

    #[test]
    fn reverse_truncation_before_gene_start() {
        assert_eq!(row("revD", 79, "gga", "cgt"), "");
    }

    #[test]
    fn coding_round_trip() {
        let genome = fixtures::genome();
        let reference_cds = &genome.sequence()[20..32];

        // synonymous: nucleotide tokens rebuild the alternate coding sequence
        let (row, _) = encode(&genome, "fwdA", 29, "g", "a");
        let mut cds = reference_cds.to_vec();
        for token in parse_row(&row).unwrap() {
            match token {
                MutationToken::NucleotideSnp {
                    position,
                    reference,
                    alternate,
                    ..
                } => {
                    let i = (position - 1) as usize;
                    assert_eq!(cds[i], reference);
                    cds[i] = alternate;
                }
                MutationToken::AminoAcidSnp {
                    reference,
                    alternate,
                    ..
                } => assert_eq!(reference, alternate),
                other => panic!("unexpected token {other}"),
            }
        }
        let mut expected = reference_cds.to_vec();
        expected[29 - 21] = b'a';
        assert_eq!(cds, expected);

        // missense: the amino-acid token matches the alternate codon
        let (row, _) = encode(&genome, "fwdA", 27, "ctg", "tag");
        assert_eq!(row, "fwdA@L3!");
        let mut codons = codon::codons(reference_cds);
        codons[2] = *b"tag";
        let tokens = parse_row(&row).unwrap();
        let [MutationToken::AminoAcidSnp {
            codon: 3,
            alternate,
            ..
        }] = tokens.as_slice()
        else {
            panic!("expected one amino-acid token");
        };
        assert_eq!(genome.translate(&codons[2]), *alternate);
    }
}
