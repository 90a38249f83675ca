use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::codon::CodonTable;
use crate::reference::genome::DEFAULT_PROMOTER_LENGTH;

/// Longest promoter span accepted from a config file.
pub const MAX_PROMOTER_LENGTH: u32 = 100_000;

fn default_promoter_length() -> u32 {
    DEFAULT_PROMOTER_LENGTH
}

fn default_codon_table() -> String {
    "bacterial".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EncoderConfig {
    /// GenBank reference, optionally gzip-compressed. Relative paths are
    /// resolved against the config file's directory.
    pub reference: PathBuf,
    #[serde(default = "default_promoter_length")]
    pub promoter_length: u32,
    #[serde(default = "default_codon_table")]
    pub codon_table: String,
    /// Restricts warm-up and encoding to these genes when present.
    #[serde(default)]
    pub genes: Option<Vec<String>>,
}

impl EncoderConfig {
    /// Config for a reference path with every other setting at its default.
    #[must_use]
    pub fn for_reference(reference: &Path) -> Self {
        Self {
            reference: reference.to_path_buf(),
            promoter_length: default_promoter_length(),
            codon_table: default_codon_table(),
            genes: None,
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let mut config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        if config.reference.is_relative()
            && let Some(dir) = path.parent()
        {
            config.reference = dir.join(&config.reference);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.promoter_length > MAX_PROMOTER_LENGTH {
            bail!(
                "promoter length {} exceeds the maximum of {MAX_PROMOTER_LENGTH}",
                self.promoter_length
            );
        }
        self.codon_table()?;
        if let Some(genes) = &self.genes
            && genes.iter().any(|gene| gene.trim().is_empty())
        {
            bail!("gene list contains an empty name");
        }
        Ok(())
    }

    pub fn codon_table(&self) -> Result<CodonTable> {
        self.codon_table
            .parse::<CodonTable>()
            .with_context(|| format!("invalid codon table: '{}'", self.codon_table))
    }

    /// Whether `gene` passes the configured gene filter.
    #[must_use]
    pub fn includes(&self, gene: &str) -> bool {
        self.genes
            .as_ref()
            .is_none_or(|genes| genes.iter().any(|name| name == gene))
    }
}
