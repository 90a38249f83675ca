//! Tab-separated variant call tables.
//!
//! ```text
//! # comment
//! position	ref	alt	gene
//! 761155	c	t	rpoB
//! 2155168	c	g
//! ```
//!
//! The gene column is optional; rows without one are annotated against every
//! gene covering the call.

use std::io::BufRead;
use std::path::Path;

use crate::error::Error;
use crate::input;

/// One row of a variant table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantRecord {
    /// 1-based line number in the source table.
    pub line: usize,
    pub position: i64,
    pub reference: Vec<u8>,
    pub alternate: Vec<u8>,
    pub gene: Option<String>,
}

/// Parse a variant table from a buffered reader.
pub fn parse_variants<R: BufRead>(reader: R) -> Result<Vec<VariantRecord>, Error> {
    let mut records = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let number = index + 1;
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.trim().is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = trimmed.split('\t').map(str::trim).collect();
        if fields[0].eq_ignore_ascii_case("position") {
            continue;
        }
        if !(3..=4).contains(&fields.len()) {
            return Err(Error::Parse(format!(
                "line {number}: expected 3 or 4 tab-separated columns, found {}",
                fields.len()
            )));
        }

        let position: i64 = fields[0]
            .parse()
            .map_err(|e| Error::Parse(format!("line {number}: invalid position '{}': {e}", fields[0])))?;
        if position < 1 {
            return Err(Error::Parse(format!(
                "line {number}: position must be at least 1, got {position}"
            )));
        }

        let gene = fields
            .get(3)
            .filter(|gene| !gene.is_empty())
            .map(|gene| (*gene).to_string());

        records.push(VariantRecord {
            line: number,
            position,
            reference: fields[1].to_ascii_lowercase().into_bytes(),
            alternate: fields[2].to_ascii_lowercase().into_bytes(),
            gene,
        });
    }

    log::debug!("parsed {} variant records", records.len());
    Ok(records)
}

/// Read a variant table from a plain or gzip-compressed file.
pub fn read_variants(path: &Path) -> Result<Vec<VariantRecord>, Error> {
    parse_variants(input::open(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    fn parse(text: &str) -> Result<Vec<VariantRecord>, Error> {
        parse_variants(Cursor::new(text.as_bytes()))
    }

    #[test]
    fn header_comments_and_optional_gene() {
        let records = parse("# calls\nposition\tref\talt\tgene\n24\tA\tG\tfwdA\n55\ta\tg\n\n").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].line, 3);
        assert_eq!(records[0].position, 24);
        assert_eq!(records[0].reference, b"a");
        assert_eq!(records[0].alternate, b"g");
        assert_eq!(records[0].gene.as_deref(), Some("fwdA"));
        assert_eq!(records[1].gene, None);
    }

    #[test]
    fn empty_gene_column_is_none() {
        let records = parse("24\ta\tg\t\n").unwrap();
        assert_eq!(records[0].gene, None);
    }

    #[test]
    fn crlf_line_endings() {
        let records = parse("24\ta\tg\tfwdA\r\n").unwrap();
        assert_eq!(records[0].gene.as_deref(), Some("fwdA"));
    }

    #[test]
    fn malformed_rows() {
        assert!(parse("24\ta\n").is_err());
        assert!(parse("x\ta\tg\n").is_err());
        assert!(parse("0\ta\tg\n").is_err());
        assert!(parse("24\ta\tg\tfwdA\textra\n").is_err());
    }

    #[test]
    fn from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"24\ta\tg\tfwdA\n").unwrap();
        let records = read_variants(file.path()).unwrap();
        assert_eq!(records.len(), 1);
    }
}
