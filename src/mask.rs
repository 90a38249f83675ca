//! Per-gene selection masks over the genome-wide stacked arrays.
//!
//! Selecting a gene means scanning the stacked gene table, so the result is
//! computed once per gene name and shared for the rest of the run. The cache
//! is read-mostly: warm it for every gene of interest before fanning calls out
//! across threads and it is never written again.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::Error;
use crate::reference::ReferenceModel;

/// Selection of one gene within the stacked reference tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneMask {
    /// `(row, column)` cells of the stacked tables that belong to the gene.
    pub stacked: Vec<(usize, usize)>,
    /// Columns where any row belongs to the gene, ascending.
    pub columns: Vec<usize>,
}

impl GeneMask {
    /// Index into the gene window of a 1-based genome position.
    #[must_use]
    pub fn window_index(&self, position: i64) -> Option<usize> {
        let column = usize::try_from(position.checked_sub(1)?).ok()?;
        self.columns.binary_search(&column).ok()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Memoized gene masks keyed by gene name.
#[derive(Debug, Default)]
pub struct MaskCache {
    masks: RwLock<HashMap<String, Arc<GeneMask>>>,
}

impl MaskCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mask for `gene`, computing it from `reference` on first use.
    pub fn get<R: ReferenceModel + ?Sized>(
        &self,
        reference: &R,
        gene: &str,
    ) -> Result<Arc<GeneMask>, Error> {
        if let Some(mask) = self.read().get(gene) {
            return Ok(Arc::clone(mask));
        }

        let mask = Arc::new(reference.select_gene(gene)?);
        log::debug!("cached mask for {gene}: {} columns", mask.len());

        // Another thread may have raced us here; keep whichever landed first.
        let mut masks = self.write();
        Ok(Arc::clone(masks.entry(gene.to_string()).or_insert(mask)))
    }

    /// Populate the cache for every listed gene. Returns the number of masks held.
    pub fn warm<'g, R, I>(&self, reference: &R, genes: I) -> Result<usize, Error>
    where
        R: ReferenceModel + ?Sized,
        I: IntoIterator<Item = &'g str>,
    {
        for gene in genes {
            self.get(reference, gene)?;
        }
        Ok(self.len())
    }

    #[must_use]
    pub fn contains(&self, gene: &str) -> bool {
        self.read().contains_key(gene)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<GeneMask>>> {
        self.masks.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<GeneMask>>> {
        self.masks.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::genome::fixtures;

    #[test]
    fn window_index_lookup() {
        let mask = GeneMask {
            stacked: vec![(0, 4), (0, 5), (0, 7)],
            columns: vec![4, 5, 7],
        };
        assert_eq!(mask.window_index(5), Some(0));
        assert_eq!(mask.window_index(6), Some(1));
        assert_eq!(mask.window_index(7), None);
        assert_eq!(mask.window_index(8), Some(2));
        assert_eq!(mask.window_index(0), None);
        assert_eq!(mask.window_index(-3), None);
    }

    #[test]
    fn computed_once_per_gene() {
        let genome = fixtures::genome();
        let cache = MaskCache::new();
        assert!(cache.is_empty());

        let first = cache.get(&genome, "fwdA").unwrap();
        let second = cache.get(&genome, "fwdA").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
        assert!(cache.contains("fwdA"));
    }

    #[test]
    fn warm_populates_all() {
        let genome = fixtures::genome();
        let cache = MaskCache::new();
        let held = cache.warm(&genome, ["fwdA", "revB", "rrsC"]).unwrap();
        assert_eq!(held, 3);
        assert!(cache.contains("revB"));
        assert!(!cache.contains("revD"));
    }

    #[test]
    fn unknown_gene_is_not_cached() {
        let genome = fixtures::genome();
        let cache = MaskCache::new();
        assert!(matches!(
            cache.get(&genome, "nope"),
            Err(Error::UnknownGene(_))
        ));
        assert!(cache.is_empty());
    }

    #[test]
    fn shared_across_threads() {
        let genome = fixtures::genome();
        let cache = MaskCache::new();
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    cache.get(&genome, "revB").unwrap();
                });
            }
        });
        assert_eq!(cache.len(), 1);
    }
}
