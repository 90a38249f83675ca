use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::Parser;

use garc::batch::encode_records;
use garc::cli::{self, RunCounts};
use garc::config::EncoderConfig;
use garc::encoder::MutationEncoder;
use garc::genbank::{parse_genbank, parse_genbank_gz};
use garc::input;
use garc::reference::Genome;
use garc::variants::read_variants;

#[derive(Parser)]
#[command(name = "garc", about = "Encode variant calls as GARC mutation notation")]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(short = 'c', long = "config", conflicts_with = "reference")]
    config: Option<PathBuf>,

    /// GenBank reference (plain or gzip), used with default settings
    #[arg(short = 'r', long = "reference")]
    reference: Option<PathBuf>,

    /// Tab-separated variant table: position, ref, alt and an optional gene
    #[arg(short = 'v', long = "variants")]
    variants: PathBuf,
}

fn load_genome(config: &EncoderConfig) -> Result<Genome> {
    let path = &config.reference;
    let file = File::open(path)
        .with_context(|| format!("failed to open reference: {}", path.display()))?;
    let record = if input::is_gzip(path) {
        parse_genbank_gz(file)
    } else {
        parse_genbank(BufReader::new(file))
    }
    .with_context(|| format!("failed to parse reference: {}", path.display()))?;
    let genome = Genome::from_genbank(record, config.promoter_length, config.codon_table()?)
        .with_context(|| format!("invalid reference: {}", path.display()))?;
    Ok(genome)
}

fn main() -> Result<()> {
    pretty_env_logger::init();
    let start = Instant::now();
    let cli_args = Cli::parse();

    cli::banner("Mutation Encoder");

    // ── Configuration ────────────────────────────────────
    cli::section("Configuration");

    let config = match (&cli_args.config, &cli_args.reference) {
        (Some(path), _) => {
            cli::kv("Config", &path.display().to_string());
            EncoderConfig::from_file(path)?
        }
        (None, Some(reference)) => EncoderConfig::for_reference(reference),
        (None, None) => bail!("either --config or --reference is required"),
    };
    config.validate()?;

    cli::kv("Reference", &config.reference.display().to_string());
    cli::kv("Promoter length", &config.promoter_length.to_string());
    cli::kv("Codon table", &config.codon_table);
    if let Some(genes) = &config.genes {
        cli::kv("Genes", &genes.join(", "));
    }
    eprintln!();

    // ── Reference ────────────────────────────────────────
    cli::section("Reference");

    let genome = load_genome(&config)?;
    cli::kv("Accession", genome.accession());
    cli::kv("Length", &format!("{} bp", genome.len()));
    cli::kv("Genes", &genome.genes().len().to_string());
    cli::kv("Stacked rows", &genome.depth().to_string());
    if let Some(genes) = &config.genes {
        for gene in genes {
            if !genome.genes().iter().any(|record| &record.name == gene) {
                cli::warning(&format!("'{gene}' is not annotated in the reference"));
            }
        }
    }
    eprintln!();

    // ── Variants ─────────────────────────────────────────
    cli::section("Variants");

    let mut records = read_variants(&cli_args.variants)
        .with_context(|| format!("failed to read variants: {}", cli_args.variants.display()))?;
    let total = records.len();
    records.retain(|record| {
        record
            .gene
            .as_deref()
            .is_none_or(|gene| config.includes(gene))
    });
    cli::kv("Rows", &total.to_string());
    if records.len() < total {
        cli::kv("Filtered out", &(total - records.len()).to_string());
    }
    eprintln!();

    // ── Encoding ─────────────────────────────────────────
    cli::section("Encoding");

    let encoder = MutationEncoder::new(&genome);
    let results = encode_records(&encoder, &records);
    cli::kv("Cached masks", &encoder.masks().len().to_string());

    let mut counts = RunCounts {
        rows: records.len(),
        ..RunCounts::default()
    };
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    for (record, result) in records.iter().zip(results) {
        let encoded = match result {
            Ok(encoded) => encoded,
            Err(e) => {
                counts.failed += 1;
                cli::error(&format!("line {}: {e}", record.line));
                continue;
            }
        };

        let reference = String::from_utf8_lossy(&record.reference);
        let alternate = String::from_utf8_lossy(&record.alternate);
        let mut any = false;
        for gene in encoded.iter().filter(|e| config.includes(&e.gene)) {
            for warning in &gene.warnings {
                counts.warnings += 1;
                cli::warning(&format!("line {}: {warning}", record.line));
            }
            if gene.tokens.is_empty() {
                continue;
            }
            any = true;
            writeln!(
                out,
                "{}\t{reference}\t{alternate}\t{}\t{}",
                record.position,
                gene.gene,
                gene.row()
            )?;
        }
        if any {
            counts.encoded += 1;
        } else {
            counts.empty += 1;
        }
    }
    out.flush().context("failed to write mutation rows")?;

    if counts.failed == 0 {
        cli::success(&format!("{} rows encoded", counts.encoded));
    } else {
        cli::warning(&format!("{} rows failed", counts.failed));
    }

    cli::print_summary(start, &counts);
    Ok(())
}
