//! GenBank flat file parser for reference sequences and gene features.

use std::collections::HashSet;
use std::io::{BufRead, BufReader, Read};

use flate2::read::GzDecoder;

use crate::codon::CodonTable;
use crate::error::Error;
use crate::gene::{GeneKind, GeneRecord};
use crate::reference::{Genome, GenomeBuilder};
use crate::strand::Strand;

/// Column where feature locations and qualifiers begin.
const FEATURE_COLUMN: usize = 21;

/// First record of a GenBank file: accession, genes and sequence.
#[derive(Debug, Clone, Default)]
pub struct GenbankRecord {
    pub accession: String,
    pub genes: Vec<GeneRecord>,
    pub sequence: Vec<u8>,
}

impl GenbankRecord {
    /// Build an in-memory reference from this record.
    pub fn into_genome(self, promoter_length: u32, table: CodonTable) -> Result<Genome, Error> {
        GenomeBuilder::new(&self.accession, &self.sequence)
            .genes(self.genes)
            .promoter_length(promoter_length)
            .codon_table(table)
            .build()
    }
}

impl Genome {
    pub fn from_genbank(
        record: GenbankRecord,
        promoter_length: u32,
        table: CodonTable,
    ) -> Result<Self, Error> {
        record.into_genome(promoter_length, table)
    }
}

/// Parse a gzip-compressed GenBank flat file.
pub fn parse_genbank_gz<R: Read>(reader: R) -> Result<GenbankRecord, Error> {
    let decoder = GzDecoder::new(reader);
    parse_genbank(BufReader::new(decoder))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Header,
    Features,
    Origin,
}

/// Feature being accumulated across continuation lines.
#[derive(Debug, Default)]
struct PendingFeature {
    key: String,
    location: String,
    qualifiers: Vec<(String, String)>,
}

impl PendingFeature {
    fn push_continuation(&mut self, content: &str) {
        if let Some(qualifier) = content.strip_prefix('/') {
            let (name, value) = qualifier.split_once('=').unwrap_or((qualifier, ""));
            self.qualifiers
                .push((name.to_string(), value.trim_matches('"').to_string()));
        } else if let Some((_, value)) = self.qualifiers.last_mut() {
            value.push_str(content.trim_matches('"'));
        } else {
            self.location.push_str(content);
        }
    }

    fn qualifier(&self, name: &str) -> Option<&str> {
        self.qualifiers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Gene described by this feature, if it is a gene-like feature.
    fn into_gene(self) -> Result<Option<GeneRecord>, Error> {
        let Ok(kind) = self.key.parse::<GeneKind>() else {
            return Ok(None);
        };
        let Some(name) = self.qualifier("gene").or_else(|| self.qualifier("locus_tag")) else {
            log::debug!("skipping unnamed {} feature at {}", self.key, self.location);
            return Ok(None);
        };
        let (start, end) = parse_location(&self.location)?;
        let strand = Strand::from_location(&self.location);
        Ok(Some(GeneRecord::new(name, start, end, strand, kind)))
    }
}

/// Parse the first record of a GenBank flat file.
pub fn parse_genbank<R: BufRead>(reader: R) -> Result<GenbankRecord, Error> {
    let mut record = GenbankRecord::default();
    let mut section = Section::Header;
    let mut seen_locus = false;
    let mut pending: Option<PendingFeature> = None;
    let mut names = HashSet::new();

    let mut finish = |feature: Option<PendingFeature>,
                      record: &mut GenbankRecord|
     -> Result<(), Error> {
        let Some(gene) = feature.map(PendingFeature::into_gene).transpose()?.flatten() else {
            return Ok(());
        };
        if names.insert(gene.name.clone()) {
            record.genes.push(gene);
        } else {
            log::debug!("skipping repeated feature for gene {}", gene.name);
        }
        Ok(())
    };

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        if line.starts_with("//") {
            break;
        }

        match section {
            Section::Header => {
                if line.starts_with("LOCUS") {
                    seen_locus = true;
                } else if !seen_locus {
                    return Err(Error::Parse(format!(
                        "expected LOCUS, got: '{}'",
                        &line[..line.len().min(20)]
                    )));
                } else if let Some(rest) = line.strip_prefix("VERSION") {
                    record.accession = rest.split_whitespace().next().unwrap_or("").to_string();
                } else if line.starts_with("FEATURES") {
                    section = Section::Features;
                } else if line.starts_with("ORIGIN") {
                    section = Section::Origin;
                }
            }
            Section::Features => {
                if line.starts_with("ORIGIN") {
                    finish(pending.take(), &mut record)?;
                    section = Section::Origin;
                    continue;
                }
                if !line.starts_with(' ') {
                    // another top-level keyword such as CONTIG or BASE COUNT
                    finish(pending.take(), &mut record)?;
                    continue;
                }
                let (tag, content) = split_feature_line(&line);
                if tag.is_empty() {
                    if let Some(feature) = pending.as_mut() {
                        feature.push_continuation(content);
                    }
                } else {
                    finish(pending.take(), &mut record)?;
                    pending = Some(PendingFeature {
                        key: tag.to_string(),
                        location: content.to_string(),
                        qualifiers: Vec::new(),
                    });
                }
            }
            Section::Origin => {
                record.sequence.extend(
                    line.bytes()
                        .filter(u8::is_ascii_alphabetic)
                        .map(|base| base.to_ascii_lowercase()),
                );
            }
        }
    }
    finish(pending.take(), &mut record)?;

    if !seen_locus {
        return Err(Error::Parse("no GenBank record found".to_string()));
    }
    if record.accession.is_empty() {
        return Err(Error::Parse("VERSION not found in GenBank header".to_string()));
    }
    if record.sequence.is_empty() {
        return Err(Error::Parse(format!(
            "no ORIGIN sequence in GenBank record {}",
            record.accession
        )));
    }

    log::debug!(
        "parsed GenBank record {}: {} bp, {} genes",
        record.accession,
        record.sequence.len(),
        record.genes.len()
    );
    Ok(record)
}

fn split_feature_line(line: &str) -> (&str, &str) {
    if line.len() >= FEATURE_COLUMN && line.is_char_boundary(FEATURE_COLUMN) {
        (line[..FEATURE_COLUMN].trim(), line[FEATURE_COLUMN..].trim())
    } else {
        (line.trim(), "")
    }
}

/// Gene coordinates `(start, end)` of a feature location.
///
/// Handles simple ranges "142..1621", single bases, partial markers "<1..>90",
/// `complement(...)` and `join(...)`/`order(...)`, taking the outermost bounds.
/// `start` is the base before the first one, matching [`GeneRecord`].
fn parse_location(location: &str) -> Result<(i64, i64), Error> {
    let mut bounds: Option<(i64, i64)> = None;
    for token in location
        .split(|c: char| !c.is_ascii_digit())
        .filter(|token| !token.is_empty())
    {
        let value: i64 = token
            .parse()
            .map_err(|e| Error::Parse(format!("invalid location '{location}': {e}")))?;
        bounds = Some(match bounds {
            Some((lo, hi)) => (lo.min(value), hi.max(value)),
            None => (value, value),
        });
    }
    let (lo, hi) = bounds.ok_or_else(|| Error::Parse(format!("empty location: '{location}'")))?;
    if lo < 1 {
        return Err(Error::Parse(format!("location starts before 1: '{location}'")));
    }
    Ok((lo - 1, hi))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    use flate2::Compression;
    use flate2::write::GzEncoder;

    use crate::reference::ReferenceModel;

    const RECORD: &str = "\
LOCUS       TEST                      40 bp    DNA     circular BCT 01-JAN-2024
DEFINITION  Synthetic test reference.
ACCESSION   TEST
VERSION     TEST.3
FEATURES             Location/Qualifiers
     source          1..40
                     /organism=\"synthetic\"
     gene            4..15
                     /gene=\"alpA\"
     CDS             4..15
                     /gene=\"alpA\"
                     /locus_tag=\"T0001\"
                     /product=\"alpha
                     protein\"
     CDS             complement(join(<20..25,
                     27..>30))
                     /locus_tag=\"T0002\"
     rRNA            31..38
                     /gene=\"rrs\"
     CDS             4..15
                     /gene=\"alpA\"
     tRNA            39..40
ORIGIN
        1 gggatgaaac tgtaaccccc ccccccccca ttgcaagtcg
//
";

    fn parse(data: &str) -> Result<GenbankRecord, Error> {
        parse_genbank(Cursor::new(data.as_bytes()))
    }

    #[test]
    fn record_contents() {
        let record = parse(RECORD).unwrap();
        assert_eq!(record.accession, "TEST.3");
        assert_eq!(record.sequence.len(), 40);
        assert!(record.sequence.starts_with(b"gggatgaaac"));

        let names: Vec<&str> = record.genes.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["alpA", "T0002", "rrs"]);

        let alpa = &record.genes[0];
        assert_eq!((alpa.start, alpa.end), (3, 15));
        assert_eq!(alpa.strand, Strand::Forward);
        assert!(alpa.codes_protein);

        let t2 = &record.genes[1];
        assert_eq!((t2.start, t2.end), (19, 30));
        assert_eq!(t2.strand, Strand::ReverseComplement);

        let rrs = &record.genes[2];
        assert_eq!(rrs.kind, GeneKind::Rrna);
        assert!(!rrs.codes_protein);
    }

    #[test]
    fn location_forms() {
        assert_eq!(parse_location("142..1621").unwrap(), (141, 1621));
        assert_eq!(parse_location("join(142..516,609..1621)").unwrap(), (141, 1621));
        assert_eq!(parse_location("complement(<5..>90)").unwrap(), (4, 90));
        assert_eq!(parse_location("77").unwrap(), (76, 77));
        assert!(parse_location("complement()").is_err());
    }

    #[test]
    fn missing_locus() {
        assert!(parse("VERSION     X.1\n").is_err());
        assert!(parse("").is_err());
    }

    #[test]
    fn missing_sequence() {
        let data = "\
LOCUS       X   10 bp
VERSION     X.1
FEATURES             Location/Qualifiers
     CDS             1..9
                     /gene=\"a\"
//
";
        assert!(parse(data).is_err());
    }

    #[test]
    fn gzip_input() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(RECORD.as_bytes()).unwrap();
        let compressed = encoder.finish().unwrap();
        let record = parse_genbank_gz(Cursor::new(compressed)).unwrap();
        assert_eq!(record.genes.len(), 3);
    }

    #[test]
    fn record_into_genome() {
        let genome = Genome::from_genbank(parse(RECORD).unwrap(), 3, CodonTable::bacterial())
            .unwrap();
        assert_eq!(genome.accession(), "TEST.3");
        assert_eq!(genome.gene("alpA").unwrap().end, 15);
        assert_eq!(genome.genes_overlapping(2), vec!["alpA"]);
        let mask = genome.select_gene("alpA").unwrap();
        let window = genome.gene_window(&mask);
        let codons = genome.rebuild_codons("alpA", &mask, &window).unwrap();
        assert_eq!(codons, vec![*b"atg", *b"aaa", *b"ctg", *b"taa"]);
    }
}
