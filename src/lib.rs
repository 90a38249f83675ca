//! GARC: encoder from reference-anchored variant calls to canonical mutation notation.

pub mod error;

pub mod batch;
pub mod cli;
pub mod codon;
pub mod config;
pub mod encoder;
pub mod genbank;
pub mod gene;
pub mod input;
pub mod mask;
pub mod nucleotide;
pub mod reference;
pub mod strand;
pub mod token;
pub mod variants;
