//! In-memory reference genome with stacked per-row gene tables.
//!
//! Genes (with their promoters) are packed into the fewest rows such that no
//! two genes in a row overlap. Each row is a genome-length array, so a column
//! holds every gene covering that position. The stacked tables carry, per
//! cell, the owning gene, its gene-relative nucleotide number and whether the
//! cell is coding sequence or promoter.

use std::collections::HashMap;

use ndarray::{Array2, Axis, s};

use crate::codon::{self, Codon, CodonTable};
use crate::error::Error;
use crate::gene::GeneRecord;
use crate::mask::GeneMask;
use crate::nucleotide;
use crate::reference::ReferenceModel;

/// Promoter span attached to each gene unless configured otherwise.
pub const DEFAULT_PROMOTER_LENGTH: u32 = 100;

/// Reference genome sequence and gene annotations.
#[derive(Debug)]
pub struct Genome {
    accession: String,
    sequence: Vec<u8>,
    genes: Vec<GeneRecord>,
    index: HashMap<String, usize>,
    /// Inclusive column range (promoter and body) of each gene.
    spans: Vec<(usize, usize)>,
    /// Gene index + 1 per cell; 0 marks an empty cell.
    stacked_gene: Array2<u32>,
    stacked_number: Array2<i64>,
    stacked_is_cds: Array2<bool>,
    stacked_is_promoter: Array2<bool>,
    codon_table: CodonTable,
}

impl Genome {
    #[must_use]
    pub fn accession(&self) -> &str {
        &self.accession
    }

    #[must_use]
    pub fn sequence(&self) -> &[u8] {
        &self.sequence
    }

    #[must_use]
    pub fn genes(&self) -> &[GeneRecord] {
        &self.genes
    }

    #[must_use]
    pub fn codon_table(&self) -> &CodonTable {
        &self.codon_table
    }

    /// Number of stacked rows needed to hold all overlapping genes.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stacked_gene.nrows()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Whether a position lies in the promoter of `gene`.
    #[must_use]
    pub fn is_promoter(&self, gene: &str, position: i64) -> bool {
        let (Some(&id), Some(column)) = (self.index.get(gene), self.column(position)) else {
            return false;
        };
        self.stacked_gene
            .column(column)
            .iter()
            .zip(self.stacked_is_promoter.column(column))
            .any(|(&tag, &promoter)| promoter && tag as usize == id + 1)
    }

    fn gene_index(&self, name: &str) -> Result<usize, Error> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownGene(name.to_string()))
    }

    fn column(&self, position: i64) -> Option<usize> {
        let column = usize::try_from(position.checked_sub(1)?).ok()?;
        (column < self.sequence.len()).then_some(column)
    }
}

impl ReferenceModel for Genome {
    fn gene(&self, name: &str) -> Result<&GeneRecord, Error> {
        Ok(&self.genes[self.gene_index(name)?])
    }

    fn nucleotide_at(&self, position: i64) -> Option<u8> {
        self.column(position).map(|column| self.sequence[column])
    }

    fn genes_overlapping(&self, position: i64) -> Vec<&str> {
        let Some(column) = self.column(position) else {
            return Vec::new();
        };
        let mut names: Vec<&str> = self
            .stacked_gene
            .column(column)
            .iter()
            .filter(|&&tag| tag != 0)
            .map(|&tag| self.genes[tag as usize - 1].name.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    fn translate(&self, codon: &Codon) -> u8 {
        self.codon_table.translate_codon(codon)
    }

    fn select_gene(&self, name: &str) -> Result<GeneMask, Error> {
        let id = self.gene_index(name)?;
        let tag = id as u32 + 1;
        let (first, last) = self.spans[id];

        let selected = self
            .stacked_gene
            .slice(s![.., first..=last])
            .mapv(|cell| cell == tag);
        let collapsed = selected.map_axis(Axis(0), |column| column.iter().any(|&hit| hit));

        let stacked = selected
            .indexed_iter()
            .filter(|&(_, &hit)| hit)
            .map(|((row, column), _)| (row, column + first))
            .collect();
        let columns = collapsed
            .iter()
            .enumerate()
            .filter(|&(_, &hit)| hit)
            .map(|(column, _)| column + first)
            .collect();

        Ok(GeneMask { stacked, columns })
    }

    fn rebuild_codons(
        &self,
        name: &str,
        mask: &GeneMask,
        window: &[u8],
    ) -> Result<Vec<Codon>, Error> {
        let gene = &self.genes[self.gene_index(name)?];
        if !gene.codes_protein {
            return Ok(Vec::new());
        }
        if window.len() != mask.columns.len() {
            return Err(Error::InvariantViolation(format!(
                "window of {} bases does not match the {}-column mask of {name}",
                window.len(),
                mask.columns.len()
            )));
        }

        let mut cds: Vec<(i64, u8)> = mask
            .stacked
            .iter()
            .filter(|&&(row, column)| {
                self.stacked_is_cds
                    .get((row, column))
                    .copied()
                    .unwrap_or(false)
            })
            .filter_map(|&(row, column)| {
                let i = mask.columns.binary_search(&column).ok()?;
                Some((self.stacked_number[[row, column]], window[i]))
            })
            .collect();
        cds.sort_unstable_by_key(|&(number, _)| number);

        let reverse = gene.strand.is_reverse();
        let bases: Vec<u8> = cds
            .into_iter()
            .map(|(_, base)| {
                if reverse {
                    nucleotide::complement(base)
                } else {
                    base
                }
            })
            .collect();
        Ok(codon::codons(&bases))
    }
}

/// Builder for [`Genome`].
#[derive(Debug)]
pub struct GenomeBuilder {
    accession: String,
    sequence: Vec<u8>,
    genes: Vec<GeneRecord>,
    promoter_length: u32,
    codon_table: CodonTable,
}

impl GenomeBuilder {
    #[must_use]
    pub fn new(accession: &str, sequence: &[u8]) -> Self {
        Self {
            accession: accession.to_string(),
            sequence: sequence.to_vec(),
            genes: Vec::new(),
            promoter_length: DEFAULT_PROMOTER_LENGTH,
            codon_table: CodonTable::default(),
        }
    }

    #[must_use]
    pub fn gene(mut self, gene: GeneRecord) -> Self {
        self.genes.push(gene);
        self
    }

    #[must_use]
    pub fn genes<I: IntoIterator<Item = GeneRecord>>(mut self, genes: I) -> Self {
        self.genes.extend(genes);
        self
    }

    #[must_use]
    pub fn promoter_length(mut self, length: u32) -> Self {
        self.promoter_length = length;
        self
    }

    #[must_use]
    pub fn codon_table(mut self, table: CodonTable) -> Self {
        self.codon_table = table;
        self
    }

    pub fn build(self) -> Result<Genome, Error> {
        if self.sequence.is_empty() {
            return Err(Error::Validation(format!(
                "reference {} has an empty sequence",
                self.accession
            )));
        }
        let sequence = nucleotide::normalize(&self.sequence).ok_or_else(|| {
            Error::Validation(format!(
                "reference {} contains non-nucleotide symbols",
                self.accession
            ))
        })?;
        let length = sequence.len() as i64;
        let genes = self.genes;
        if u32::try_from(genes.len()).is_err() {
            return Err(Error::Validation(format!(
                "too many genes ({}) for the stacked gene table",
                genes.len()
            )));
        }

        let mut index = HashMap::with_capacity(genes.len());
        for (i, gene) in genes.iter().enumerate() {
            gene.validate()?;
            if gene.end > length {
                return Err(Error::Validation(format!(
                    "gene {} ends at {} past the reference length {length}",
                    gene.name, gene.end
                )));
            }
            if index.insert(gene.name.clone(), i).is_some() {
                return Err(Error::Validation(format!(
                    "duplicate gene name: {}",
                    gene.name
                )));
            }
        }

        let promoters: Vec<Option<(i64, i64)>> = genes
            .iter()
            .map(|gene| promoter_range(gene, &genes, i64::from(self.promoter_length), length))
            .collect();

        // Inclusive position span of promoter plus body, as columns.
        let spans: Vec<(usize, usize)> = genes
            .iter()
            .zip(&promoters)
            .map(|(gene, promoter)| {
                let (mut first, mut last) = (gene.start + 1, gene.end);
                if let Some((lo, hi)) = *promoter {
                    first = first.min(lo);
                    last = last.max(hi);
                }
                ((first - 1) as usize, (last - 1) as usize)
            })
            .collect();

        let (rows, depth) = pack_rows(&spans);
        let shape = (depth, sequence.len());
        let mut stacked_gene = Array2::<u32>::zeros(shape);
        let mut stacked_number = Array2::<i64>::zeros(shape);
        let mut stacked_is_cds = Array2::<bool>::from_elem(shape, false);
        let mut stacked_is_promoter = Array2::<bool>::from_elem(shape, false);

        for (i, gene) in genes.iter().enumerate() {
            let row = rows[i];
            let tag = i as u32 + 1;
            let reverse = gene.strand.is_reverse();

            for position in gene.start + 1..=gene.end {
                let cell = (row, (position - 1) as usize);
                stacked_gene[cell] = tag;
                stacked_number[cell] = if reverse {
                    gene.end - position + 1
                } else {
                    position - gene.start
                };
                stacked_is_cds[cell] = gene.codes_protein;
            }

            if let Some((lo, hi)) = promoters[i] {
                for position in lo..=hi {
                    let cell = (row, (position - 1) as usize);
                    stacked_gene[cell] = tag;
                    stacked_number[cell] = if reverse {
                        gene.end - position
                    } else {
                        position - gene.start - 1
                    };
                    stacked_is_promoter[cell] = true;
                }
            }
        }

        log::debug!(
            "built reference {} ({} bp, {} genes, {depth} rows)",
            self.accession,
            sequence.len(),
            genes.len()
        );

        Ok(Genome {
            accession: self.accession,
            sequence,
            genes,
            index,
            spans,
            stacked_gene,
            stacked_number,
            stacked_is_cds,
            stacked_is_promoter,
            codon_table: self.codon_table,
        })
    }
}

/// Promoter positions of `gene` (inclusive), upstream in transcription
/// direction, stopping short of any gene body lying wholly on that side and
/// of the sequence ends.
fn promoter_range(
    gene: &GeneRecord,
    genes: &[GeneRecord],
    length: i64,
    sequence_length: i64,
) -> Option<(i64, i64)> {
    if length == 0 {
        return None;
    }
    let others = genes.iter().filter(|other| other.name != gene.name);
    let (lo, hi) = if gene.strand.is_reverse() {
        let ceiling = others
            .filter(|other| other.start >= gene.end)
            .map(|other| other.start)
            .min()
            .unwrap_or(sequence_length);
        (gene.end + 1, (gene.end + length).min(ceiling).min(sequence_length))
    } else {
        let floor = others
            .filter(|other| other.end <= gene.start)
            .map(|other| other.end)
            .max()
            .unwrap_or(0);
        ((gene.start - length + 1).max(floor + 1).max(1), gene.start)
    };
    (lo <= hi).then_some((lo, hi))
}

/// Assign each span to the first row whose previous span ends before it.
fn pack_rows(spans: &[(usize, usize)]) -> (Vec<usize>, usize) {
    let mut order: Vec<usize> = (0..spans.len()).collect();
    order.sort_by_key(|&i| spans[i]);

    let mut rows = vec![0; spans.len()];
    let mut row_ends: Vec<usize> = Vec::new();
    for i in order {
        let (first, last) = spans[i];
        match row_ends.iter().position(|&end| end < first) {
            Some(row) => {
                rows[i] = row;
                row_ends[row] = last;
            }
            None => {
                rows[i] = row_ends.len();
                row_ends.push(last);
            }
        }
    }
    (rows, row_ends.len().max(1))
}
