//! Sentence augmentation
//!
//! Each sentence is parsed twice by an [`Annotator`]:
//!
//! 1. the full sentence, whose rows map one-to-one onto the tokens and whose
//!    heads already use the sentence's own numbering;
//! 2. the reduced sentence (tokens with `omit=I` removed), whose heads are
//!    positions within the reduced sequence and must be translated back to
//!    the original token ids.

use crate::annotate::{AnnotateError, Annotator, ResponseRow, parse_response};
use crate::conll::{Block, ParseError, Schema, SentenceReader, is_gzip};
use crate::token::{Omit, Parse, Sentence, Token, join_forms};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Segment inserted before the extension of the output file
pub const OUTPUT_SUFFIX: &str = "aug";

/// Sentences between progress log lines
const PROGRESS_EVERY: usize = 1000;

/// Which of the two parses of a sentence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    Full,
    Reduced,
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pass::Full => f.write_str("full"),
            Pass::Reduced => f.write_str("reduced"),
        }
    }
}

/// Error during augmentation
#[derive(Debug, Error)]
pub enum AugmentError {
    #[error(transparent)]
    Annotate(#[from] AnnotateError),

    #[error("{pass} parse returned {found} rows for {expected} tokens")]
    RowCountMismatch {
        pass: Pass,
        expected: usize,
        found: usize,
    },

    #[error("reduced parse head {head} is outside the {len}-token reduced sentence")]
    HeadOutOfRange { head: usize, len: usize },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Counts from one augmented file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AugmentSummary {
    pub output: PathBuf,
    pub sentences: usize,
    pub tokens: usize,
}

/// Annotate `tokens` and check that one row came back per token
fn annotate_rows<'a, A: Annotator + ?Sized>(
    annotator: &A,
    tokens: impl Iterator<Item = &'a Token>,
    expected: usize,
    pass: Pass,
) -> Result<Vec<ResponseRow>, AugmentError> {
    let text = join_forms(tokens);
    let rows = parse_response(&annotator.annotate(&text)?)?;
    if rows.len() != expected {
        return Err(AugmentError::RowCountMismatch {
            pass,
            expected,
            found: rows.len(),
        });
    }
    Ok(rows)
}

/// Fill in both secondary parses of a sentence
///
/// On error the sentence may be left with only the full parse filled in.
pub fn augment<A: Annotator + ?Sized>(
    sentence: &mut Sentence,
    annotator: &A,
) -> Result<(), AugmentError> {
    if sentence.is_empty() {
        return Ok(());
    }

    // Full sentence: row i belongs to token i, heads need no translation
    let rows = annotate_rows(annotator, sentence.tokens.iter(), sentence.len(), Pass::Full)?;
    for (token, row) in sentence.tokens.iter_mut().zip(&rows) {
        token.secondary.full = Some(Parse::new(&row.pos, row.head, &row.rel));
    }

    // Reduced sentence: positions of the kept tokens in the full sentence
    let kept: Vec<usize> = sentence
        .tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| t.omit != Omit::Inside)
        .map(|(i, _)| i)
        .collect();
    if kept.is_empty() {
        return Ok(());
    }

    let rows = annotate_rows(annotator, sentence.reduced(), kept.len(), Pass::Reduced)?;
    for (&idx, row) in kept.iter().zip(&rows) {
        let head = if row.head == 0 {
            0
        } else {
            let target = kept.get(row.head - 1).ok_or(AugmentError::HeadOutOfRange {
                head: row.head,
                len: kept.len(),
            })?;
            sentence.tokens[*target].id
        };
        sentence.tokens[idx].secondary.reduced = Some(Parse::new(&row.pos, head, &row.rel));
    }

    Ok(())
}

/// Derive the output path by inserting `.aug` before the extension
///
/// `data/train.tsv` becomes `data/train.aug.tsv`; a path with no extension
/// gets `.aug` appended.
pub fn output_path(input: &Path) -> PathBuf {
    match (input.file_stem(), input.extension()) {
        (Some(stem), Some(ext)) => {
            let mut name = stem.to_os_string();
            name.push(".");
            name.push(OUTPUT_SUFFIX);
            name.push(".");
            name.push(ext);
            input.with_file_name(name)
        }
        _ => {
            let mut name = input.as_os_str().to_os_string();
            name.push(".");
            name.push(OUTPUT_SUFFIX);
            PathBuf::from(name)
        }
    }
}

/// Augment every sentence read from `reader`, writing the 12-column format
///
/// Blank lines are reproduced one for one. Returns `(sentences, tokens)`.
pub fn augment_stream<R: BufRead, W: Write, A: Annotator + ?Sized>(
    reader: SentenceReader<R>,
    out: &mut W,
    annotator: &A,
) -> Result<(usize, usize), AugmentError> {
    let io_err = |source: std::io::Error| AugmentError::Io {
        path: PathBuf::from("<output>"),
        source,
    };
    let mut sentences = 0;
    let mut tokens = 0;

    for block in reader {
        match block? {
            Block::Sentence(mut sentence) => {
                augment(&mut sentence, annotator)?;
                tracing::debug!(
                    sentence = sentences + 1,
                    tokens = sentence.len(),
                    reduced = sentence.reduced().count(),
                    "augmented"
                );
                write!(out, "{}", sentence).map_err(io_err)?;

                sentences += 1;
                tokens += sentence.len();
                if sentences % PROGRESS_EVERY == 0 {
                    tracing::info!(sentences, tokens, "progress");
                }
            }
            Block::Blank => writeln!(out).map_err(io_err)?,
        }
    }

    Ok((sentences, tokens))
}

/// Augment a file, writing the result next to it (see [`output_path`])
///
/// A gzip input produces a gzip output.
pub fn augment_file<A: Annotator + ?Sized>(
    input: &Path,
    schema: Schema,
    annotator: &A,
) -> Result<AugmentSummary, AugmentError> {
    let output = output_path(input);
    tracing::info!(input = %input.display(), output = %output.display(), "augmenting");

    let reader = SentenceReader::from_file(input, schema).map_err(|source| AugmentError::Io {
        path: input.to_path_buf(),
        source,
    })?;
    let with_output = |source: std::io::Error| AugmentError::Io {
        path: output.clone(),
        source,
    };

    let on_output = |result: Result<(usize, usize), AugmentError>| match result {
        Err(AugmentError::Io { source, .. }) => Err(with_output(source)),
        other => other,
    };

    let file = BufWriter::new(File::create(&output).map_err(with_output)?);
    let (sentences, tokens) = if is_gzip(input) {
        let mut out = GzEncoder::new(file, Compression::default());
        let counts = on_output(augment_stream(reader, &mut out, annotator))?;
        out.finish()
            .and_then(|mut file| file.flush())
            .map_err(with_output)?;
        counts
    } else {
        let mut out = file;
        let counts = on_output(augment_stream(reader, &mut out, annotator))?;
        out.flush().map_err(with_output)?;
        counts
    };

    tracing::info!(sentences, tokens, output = %output.display(), "done");
    Ok(AugmentSummary {
        output,
        sentences,
        tokens,
    })
}
