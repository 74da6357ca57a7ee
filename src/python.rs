//! Python bindings for treeaug
//!
//! This module provides PyO3-based Python bindings for the Rust core.

use pyo3::exceptions::{PyIOError, PyKeyError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use crate::annotate::{CoreNlpClient, CoreNlpConfig};
use crate::augment::{AugmentError, augment_file as rust_augment_file};
use crate::conll::{self, Schema, SentenceReader};
use crate::stats::{
    DepPattern, PosColumn, PosQuery, StatsError, check_dependencies as rust_check_dependencies,
    pos_histogram as rust_pos_histogram,
};
use crate::token::Omit;

/// Convert AugmentError to Python exception
impl From<AugmentError> for PyErr {
    fn from(err: AugmentError) -> PyErr {
        match err {
            AugmentError::Io { .. } => PyIOError::new_err(err.to_string()),
            AugmentError::Parse(e) => PyValueError::new_err(format!("Parse error: {}", e)),
            other => PyRuntimeError::new_err(other.to_string()),
        }
    }
}

/// Convert StatsError to Python exception
impl From<StatsError> for PyErr {
    fn from(err: StatsError) -> PyErr {
        match err {
            StatsError::Io(e) => PyIOError::new_err(e.to_string()),
            StatsError::Unmapped(e) => PyKeyError::new_err(e.to_string()),
            other => PyValueError::new_err(other.to_string()),
        }
    }
}

fn parse_omit(omit: &str) -> PyResult<Omit> {
    omit.parse()
        .map_err(|e| PyValueError::new_err(format!("{}", e)))
}

/// Augment a treebank file with full and reduced CoreNLP parses.
///
/// Args:
///     host: CoreNLP server host, e.g. "http://localhost"
///     port: CoreNLP server port
///     path: File to augment; output goes to the ".aug" sibling
///     augmented_input: If True, read the 12-column augmented layout
///     lang: CoreNLP pipeline language
///     timeout: Request timeout in seconds, or None to wait forever
///
/// Returns:
///     (output path, sentence count, token count)
#[pyfunction]
#[pyo3(signature = (host, port, path, augmented_input=false, lang="zh", timeout=None))]
fn augment_file(
    host: &str,
    port: u16,
    path: PathBuf,
    augmented_input: bool,
    lang: &str,
    timeout: Option<u64>,
) -> PyResult<(String, usize, usize)> {
    let mut config = CoreNlpConfig::new(host, port);
    config.language = lang.to_string();
    config.timeout = timeout.map(Duration::from_secs);
    let schema = if augmented_input {
        Schema::Augmented
    } else {
        Schema::Plain
    };

    let client = CoreNlpClient::new(config);
    let summary = rust_augment_file(&path, schema, &client)?;
    Ok((
        summary.output.display().to_string(),
        summary.sentences,
        summary.tokens,
    ))
}

/// Count sentences containing a dependency with the given omit flags.
///
/// Matching "parent -> child" pairs are printed to stdout.
///
/// Args:
///     path: Unaugmented (4-column) treebank file
///     pattern: One of "e2e", "e2o", "o2e", "o2o"
///
/// Returns:
///     (matched sentences, total sentences)
#[pyfunction]
#[pyo3(signature = (path, pattern="e2e"))]
fn check_dependencies(path: PathBuf, pattern: &str) -> PyResult<(usize, usize)> {
    let pattern = <DepPattern as clap::ValueEnum>::from_str(pattern, true)
        .map_err(|e| PyValueError::new_err(format!("Unknown pattern {}: {}", pattern, e)))?;
    let reader = SentenceReader::from_file(&path, Schema::Plain)
        .map_err(|e| PyIOError::new_err(format!("Failed to open {}: {}", path.display(), e)))?;

    let mut out = std::io::stdout().lock();
    let report = rust_check_dependencies(reader, pattern, &mut out)?;
    out.flush()
        .map_err(|e| PyIOError::new_err(e.to_string()))?;
    Ok((report.matched, report.total))
}

/// POS tag frequencies of tokens with the given omit flag.
///
/// Args:
///     path: Augmented (12-column) treebank file
///     omit: "I" or "O"
///     ud: If True, map CTB tags to Universal POS (unknown tags raise KeyError)
///     column: "ppos" (default), "pos" or "no-ppos"
///
/// Returns:
///     List of (tag, count), most frequent first
#[pyfunction]
#[pyo3(signature = (path, omit="O", ud=false, column="ppos"))]
fn pos_histogram(
    path: PathBuf,
    omit: &str,
    ud: bool,
    column: &str,
) -> PyResult<Vec<(String, usize)>> {
    let column = <PosColumn as clap::ValueEnum>::from_str(column, true)
        .map_err(|e| PyValueError::new_err(format!("Unknown column {}: {}", column, e)))?;
    let query = PosQuery {
        omit: parse_omit(omit)?,
        column,
        universal: ud,
    };
    let reader = conll::open(&path)
        .map_err(|e| PyIOError::new_err(format!("Failed to open {}: {}", path.display(), e)))?;
    Ok(rust_pos_histogram(reader, query)?.counts)
}

#[pyfunction]
fn __version__() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[pymodule]
fn treeaug(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(augment_file, m)?)?;
    m.add_function(wrap_pyfunction!(check_dependencies, m)?)?;
    m.add_function(wrap_pyfunction!(pos_histogram, m)?)?;
    m.add_function(wrap_pyfunction!(__version__, m)?)?;

    Ok(())
}
