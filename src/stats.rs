//! Corpus statistics
//!
//! Two independent counting passes:
//! - [`check_dependencies`] counts sentences containing a dependency whose
//!   child and parent have a given pair of omit flags (unaugmented files)
//! - [`pos_histogram`] counts POS tags of tokens with a given omit flag
//!   (augmented files)

use crate::bytes::{optional, split_tabs};
use crate::conll::{ParseError, Schema, SentenceReader};
use crate::tagset::{UnmappedTag, to_universal};
use crate::token::{Omit, Sentence, Token};
use bstr::ByteSlice;
use bstr::io::BufReadExt;
use lasso::Rodeo;
use rustc_hash::FxHashMap;
use std::fmt;
use std::io::{BufRead, Write};
use thiserror::Error;

/// Error during a statistics pass
#[derive(Debug, Error)]
pub enum StatsError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Unmapped(#[from] UnmappedTag),

    #[error("sentence {sentence}: token {token} has head {head} past the end of the sentence")]
    HeadOutOfRange {
        sentence: usize,
        token: usize,
        head: usize,
    },
}

/// Omit flags of a (child, parent) dependency
///
/// Named from the parent's point of view: `e` is an elided (`I`) token,
/// `o` an overt (`O`) one, so `E2o` is an elided parent with an overt child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum DepPattern {
    /// Parent I, child I
    E2e,
    /// Parent I, child O
    E2o,
    /// Parent O, child I
    O2e,
    /// Parent O, child O
    O2o,
}

impl DepPattern {
    /// The (parent, child) omit flags this pattern selects
    pub fn flags(self) -> (Omit, Omit) {
        match self {
            DepPattern::E2e => (Omit::Inside, Omit::Inside),
            DepPattern::E2o => (Omit::Inside, Omit::Outside),
            DepPattern::O2e => (Omit::Outside, Omit::Inside),
            DepPattern::O2o => (Omit::Outside, Omit::Outside),
        }
    }

    pub fn matches(self, parent: &Token, child: &Token) -> bool {
        self.flags() == (parent.omit, child.omit)
    }
}

impl fmt::Display for DepPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DepPattern::E2e => "e2e",
            DepPattern::E2o => "e2o",
            DepPattern::O2e => "o2e",
            DepPattern::O2o => "o2o",
        })
    }
}

/// Result of a dependency-pattern pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepReport {
    pub pattern: DepPattern,
    /// Sentences with at least one matching dependency
    pub matched: usize,
    pub total: usize,
}

impl fmt::Display for DepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "matched ({}): {}/{}", self.pattern, self.matched, self.total)
    }
}

/// Matching (parent, child) pairs of one sentence, in token order
pub fn matching_pairs<'a>(
    sentence: &'a Sentence,
    index: usize,
    pattern: DepPattern,
) -> Result<Vec<(&'a Token, &'a Token)>, StatsError> {
    let mut pairs = Vec::new();
    for child in &sentence.tokens {
        if child.is_root() {
            continue;
        }
        let parent = sentence
            .parent(child)
            .ok_or(StatsError::HeadOutOfRange {
                sentence: index,
                token: child.id,
                head: child.head,
            })?;
        if pattern.matches(parent, child) {
            pairs.push((parent, child));
        }
    }
    Ok(pairs)
}

/// Count sentences containing a dependency of the given pattern
///
/// Each matching pair is written to `out` as `parent -> child`.
pub fn check_dependencies<R: BufRead, W: Write>(
    reader: SentenceReader<R>,
    pattern: DepPattern,
    out: &mut W,
) -> Result<DepReport, StatsError> {
    let mut report = DepReport {
        pattern,
        matched: 0,
        total: 0,
    };

    for sentence in reader.sentences() {
        let sentence = sentence?;
        report.total += 1;
        let pairs = matching_pairs(&sentence, report.total, pattern)?;
        for (parent, child) in &pairs {
            writeln!(out, "{} -> {}", parent.form, child.form)?;
        }
        if !pairs.is_empty() {
            report.matched += 1;
        }
    }

    tracing::debug!(%pattern, matched = report.matched, total = report.total, "dependency check");
    Ok(report)
}

/// Which POS column of an augmented file to count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum PosColumn {
    /// Gold tag
    Pos,
    /// Tag from the reduced-sentence parse
    NoPpos,
    /// Tag from the full-sentence parse
    #[default]
    Ppos,
}

impl PosColumn {
    fn index(self) -> usize {
        match self {
            PosColumn::Pos => 3,
            PosColumn::NoPpos => 6,
            PosColumn::Ppos => 9,
        }
    }
}

/// Parameters of a POS histogram pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PosQuery {
    pub omit: Omit,
    pub column: PosColumn,
    /// Remap tags to universal categories
    pub universal: bool,
}

impl PosQuery {
    pub fn new(omit: Omit) -> Self {
        Self {
            omit,
            column: PosColumn::default(),
            universal: false,
        }
    }
}

/// Tag frequencies, most frequent first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PosHistogram {
    pub omit: Omit,
    pub counts: Vec<(String, usize)>,
}

impl PosHistogram {
    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, n)| n).sum()
    }

    pub fn get(&self, tag: &str) -> Option<usize> {
        self.counts.iter().find(|(t, _)| t == tag).map(|(_, n)| *n)
    }
}

impl fmt::Display for PosHistogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "POS ({})", self.omit)?;
        for (tag, count) in &self.counts {
            writeln!(f, "{}:\t{}", tag, count)?;
        }
        write!(f, "total: {}", self.total())
    }
}

/// Count POS tags of tokens whose omit flag matches the query
///
/// Reads an augmented file line by line; comment and blank lines are
/// skipped, as are tokens whose selected column holds the `_` placeholder
/// (omitted tokens have no reduced-sentence tag). With `universal` set, a
/// tag missing from the mapping table aborts the pass.
pub fn pos_histogram<R: BufRead>(reader: R, query: PosQuery) -> Result<PosHistogram, StatsError> {
    let columns = Schema::Augmented.columns();
    let wanted = query.omit.as_str();
    let mut tags = Rodeo::default();
    let mut counts = FxHashMap::default();

    for (line_idx, line) in reader.byte_lines().enumerate() {
        let line = line?;
        let line_num = line_idx + 1;
        let line = line.trim();
        if line.is_empty() || line[0] == b'#' {
            continue;
        }

        let line = line.to_str().map_err(|e| ParseError {
            line_num,
            message: format!("invalid UTF-8: {}", e),
        })?;
        let fields = split_tabs(line);
        if fields.len() != columns {
            return Err(ParseError {
                line_num,
                message: format!("Expected {} fields, found {}", columns, fields.len()),
            }
            .into());
        }
        if fields[2] != wanted {
            continue;
        }

        let Some(tag) = optional(fields[query.column.index()]) else {
            continue;
        };
        let tag = if query.universal {
            to_universal(tag)?
        } else {
            tag
        };
        *counts.entry(tags.get_or_intern(tag)).or_insert(0usize) += 1;
    }

    let mut counts: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(key, n)| (tags.resolve(&key).to_string(), n))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    Ok(PosHistogram {
        omit: query.omit,
        counts,
    })
}
