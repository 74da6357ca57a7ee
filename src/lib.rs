//! Treeaug: secondary parses for elided-token dependency treebanks
//!
//! Reads tab-separated treebank sentences whose tokens are flagged as kept
//! (`O`) or omitted (`I`), parses each sentence twice with a CoreNLP server
//! (once in full, once with the omitted tokens removed) and writes both
//! parses back alongside the original columns. Also computes POS and
//! dependency-pattern statistics over such files.

pub mod annotate; // CoreNLP client and response table parsing
pub mod augment; // Full/reduced parse alignment
pub mod bytes;
pub mod conll; // Token table reader
pub mod stats; // Dependency-pattern and POS counts
pub mod tagset; // CTB to Universal POS mapping
pub mod token; // Token and sentence data structures

// Python bindings
#[cfg(feature = "pyo3")]
pub mod python;

// Re-exports for convenience
pub use annotate::{AnnotateError, Annotator, CoreNlpClient, CoreNlpConfig, ResponseRow};
pub use augment::{AugmentError, AugmentSummary, augment, augment_file, output_path};
pub use conll::{Block, ParseError, Schema, SentenceReader};
pub use stats::{
    DepPattern, DepReport, PosColumn, PosHistogram, PosQuery, StatsError, check_dependencies,
    pos_histogram,
};
pub use tagset::{UnmappedTag, to_universal};
pub use token::{Omit, Parse, SecondaryParse, Sentence, Token};
