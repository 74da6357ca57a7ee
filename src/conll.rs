//! Token table parsing
//!
//! Reads blank-line-delimited blocks of tab-separated token lines into
//! [`Sentence`]s. Two column layouts are supported:
//!
//! - [`Schema::Plain`]: `id form omit head`
//! - [`Schema::Augmented`]: `id form omit pos head rel no_ppos no_phead no_prel ppos phead prel`
//!
//! Blank lines are reported as [`Block::Blank`] so a writer can reproduce
//! the original spacing between sentences. Lines starting with `#` are
//! comments and are skipped.

use crate::bytes::{optional, parse_index, split_tabs};
use crate::token::{Omit, Parse, Sentence, Token};
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;
use thiserror::Error;

/// Error during token table parsing
#[derive(Debug, Error)]
#[error("Parse error at line {line_num}: {message}")]
pub struct ParseError {
    pub line_num: usize,
    pub message: String,
}

impl ParseError {
    fn new(line_num: usize, message: impl Into<String>) -> Self {
        Self {
            line_num,
            message: message.into(),
        }
    }
}

/// Column layout of a token table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Schema {
    /// `id form omit head`
    #[default]
    Plain,
    /// The 12-column output of augmentation
    Augmented,
}

impl Schema {
    pub fn columns(self) -> usize {
        match self {
            Schema::Plain => 4,
            Schema::Augmented => 12,
        }
    }
}

/// One item of a token table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Sentence(Sentence),
    /// A blank line; the one closing a sentence is yielded right after it
    Blank,
}

/// Whether `path` names a gzip file
pub fn is_gzip(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz")
}

/// Open a file for reading, transparently decompressing `.gz` files
pub fn open(path: &Path) -> std::io::Result<Box<dyn BufRead>> {
    let file = File::open(path)?;
    if is_gzip(path) {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Token table reader that iterates over blocks
pub struct SentenceReader<R: BufRead> {
    lines: Lines<R>,
    line_num: usize,
    schema: Schema,
    pending_blank: bool,
    done: bool,
}

impl SentenceReader<Box<dyn BufRead>> {
    /// Create a reader from a file path
    pub fn from_file(path: &Path, schema: Schema) -> std::io::Result<Self> {
        Ok(Self::new(open(path)?, schema))
    }
}

impl SentenceReader<BufReader<std::io::Cursor<String>>> {
    /// Create a reader from a string
    pub fn from_string(text: &str, schema: Schema) -> Self {
        let cursor = std::io::Cursor::new(text.to_string());
        Self::new(BufReader::new(cursor), schema)
    }
}

impl<R: BufRead> SentenceReader<R> {
    pub fn new(reader: R, schema: Schema) -> Self {
        Self {
            lines: reader.lines(),
            line_num: 0,
            schema,
            pending_blank: false,
            done: false,
        }
    }

    pub fn schema(&self) -> Schema {
        self.schema
    }

    /// Iterate over sentences only, dropping blank-line markers
    pub fn sentences(self) -> impl Iterator<Item = Result<Sentence, ParseError>> {
        self.filter_map(|block| match block {
            Ok(Block::Sentence(sentence)) => Some(Ok(sentence)),
            Ok(Block::Blank) => None,
            Err(e) => Some(Err(e)),
        })
    }
}

impl<R: BufRead> Iterator for SentenceReader<R> {
    type Item = Result<Block, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pending_blank {
            self.pending_blank = false;
            return Some(Ok(Block::Blank));
        }
        if self.done {
            return None;
        }

        let mut tokens = Vec::new();

        loop {
            self.line_num += 1;
            match self.lines.next() {
                None => {
                    self.done = true;
                    if tokens.is_empty() {
                        return None;
                    }
                    // Last sentence without a closing blank line: close it
                    self.pending_blank = true;
                    return Some(Ok(Block::Sentence(Sentence::new(tokens))));
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(ParseError::new(
                        self.line_num,
                        format!("IO error: {}", e),
                    )));
                }
                Some(Ok(line)) => {
                    let line = line.trim();

                    if line.is_empty() {
                        if tokens.is_empty() {
                            return Some(Ok(Block::Blank));
                        }
                        self.pending_blank = true;
                        return Some(Ok(Block::Sentence(Sentence::new(tokens))));
                    }

                    if line.starts_with('#') {
                        continue;
                    }

                    match parse_line(line, self.line_num, self.schema) {
                        Ok(token) => tokens.push(token),
                        Err(e) => {
                            self.done = true;
                            return Some(Err(e));
                        }
                    }
                }
            }
        }
    }
}

/// Parse a single token line
pub fn parse_line(line: &str, line_num: usize, schema: Schema) -> Result<Token, ParseError> {
    let fields = split_tabs(line);

    if fields.len() != schema.columns() {
        return Err(ParseError::new(
            line_num,
            format!(
                "Expected {} fields, found {}",
                schema.columns(),
                fields.len()
            ),
        ));
    }

    let id = parse_id(fields[0], line_num)?;
    let omit: Omit = fields[2]
        .parse()
        .map_err(|e| ParseError::new(line_num, format!("{}", e)))?;

    match schema {
        Schema::Plain => {
            let head = parse_head(fields[3], line_num)?;
            Ok(Token::new(id, fields[1], omit, head))
        }
        Schema::Augmented => {
            let mut token = Token::new(id, fields[1], omit, parse_head(fields[4], line_num)?);
            token.pos = optional(fields[3]).map(str::to_string);
            token.rel = optional(fields[5]).map(str::to_string);
            token.secondary.reduced = parse_secondary(&fields[6..9], line_num)?;
            token.secondary.full = parse_secondary(&fields[9..12], line_num)?;

            if token.omit == Omit::Inside && token.secondary.reduced.is_some() {
                return Err(ParseError::new(
                    line_num,
                    "Omitted token carries a reduced-sentence parse",
                ));
            }
            Ok(token)
        }
    }
}

/// Parse ID field (1-based integer, no leading zeros)
fn parse_id(s: &str, line_num: usize) -> Result<usize, ParseError> {
    match parse_index(s) {
        Some(id) if id > 0 && is_canonical(s) => Ok(id),
        _ => Err(ParseError::new(line_num, format!("Invalid ID: {}", s))),
    }
}

/// Parse HEAD field (0 for root, or integer, no leading zeros)
fn parse_head(s: &str, line_num: usize) -> Result<usize, ParseError> {
    match parse_index(s) {
        Some(head) if is_canonical(s) => Ok(head),
        _ => Err(ParseError::new(line_num, format!("Invalid HEAD: {}", s))),
    }
}

/// Numbers are written back without padding, so `007` would not survive
/// a round trip
fn is_canonical(s: &str) -> bool {
    s == "0" || !s.starts_with('0')
}

/// Parse a `pos head rel` triple; all three `_` means absent
fn parse_secondary(fields: &[&str], line_num: usize) -> Result<Option<Parse>, ParseError> {
    match (optional(fields[0]), optional(fields[1]), optional(fields[2])) {
        (None, None, None) => Ok(None),
        (Some(pos), Some(head), Some(rel)) => {
            Ok(Some(Parse::new(pos, parse_head(head, line_num)?, rel)))
        }
        _ => Err(ParseError::new(
            line_num,
            format!("Incomplete secondary parse: {}", fields.join("\t")),
        )),
    }
}
