//! Parallel encoding of independent variant calls.
//!
//! Masks are computed up front for every gene the batch touches, so the
//! worker threads only ever read the cache. Results keep the input order and
//! each call fails on its own.

use std::collections::BTreeSet;

use rayon::prelude::*;

use crate::encoder::{Encoded, MutationEncoder, VariantCall};
use crate::error::Error;
use crate::reference::ReferenceModel;
use crate::variants::VariantRecord;

/// Warm the mask cache for `genes`, skipping names the reference does not
/// know (those calls fail individually later). Returns the number of masks held.
fn warm_known<'g, R, I>(encoder: &MutationEncoder<'_, R>, genes: I) -> usize
where
    R: ReferenceModel + Sync + ?Sized,
    I: IntoIterator<Item = &'g str>,
{
    for gene in genes {
        if let Err(e) = encoder.masks().get(encoder.reference(), gene) {
            log::debug!("not warming {gene}: {e}");
        }
    }
    encoder.masks().len()
}

/// Encode calls in parallel, one result per call in input order.
pub fn encode_batch<R>(
    encoder: &MutationEncoder<'_, R>,
    calls: &[VariantCall],
) -> Vec<Result<Encoded, Error>>
where
    R: ReferenceModel + Sync + ?Sized,
{
    let genes: BTreeSet<&str> = calls.iter().map(|call| call.gene.as_str()).collect();
    let warmed = warm_known(encoder, genes);
    log::debug!("encoding {} calls with {warmed} cached masks", calls.len());

    calls
        .par_iter()
        .map(|call| encoder.to_notation(call))
        .collect()
}

/// Encode table rows in parallel. Rows naming a gene are encoded against it;
/// rows without one are annotated against every gene they touch.
pub fn encode_records<R>(
    encoder: &MutationEncoder<'_, R>,
    records: &[VariantRecord],
) -> Vec<Result<Vec<Encoded>, Error>>
where
    R: ReferenceModel + Sync + ?Sized,
{
    let reference = encoder.reference();
    let mut genes: BTreeSet<&str> = BTreeSet::new();
    for record in records {
        match &record.gene {
            Some(gene) => {
                genes.insert(gene.as_str());
            }
            None => {
                let span = record.position..record.position + record.reference.len() as i64;
                genes.extend(span.flat_map(|p| reference.genes_overlapping(p)));
            }
        }
    }
    let warmed = warm_known(encoder, genes);
    log::debug!("encoding {} records with {warmed} cached masks", records.len());

    records
        .par_iter()
        .map(|record| match &record.gene {
            Some(gene) => {
                let call =
                    VariantCall::new(gene, record.position, &record.reference, &record.alternate)?;
                encoder.to_notation(&call).map(|encoded| vec![encoded])
            }
            None => encoder.annotate(record.position, &record.reference, &record.alternate),
        })
        .collect()
}
