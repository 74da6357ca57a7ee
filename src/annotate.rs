//! CoreNLP annotation client
//!
//! The augmenter only needs one operation from the remote service: turn a
//! whitespace-tokenized sentence into a dependency-parse table. That
//! operation is the [`Annotator`] trait; [`CoreNlpClient`] implements it
//! over HTTP and tests implement it with canned tables.

use crate::bytes::{parse_index, split_tabs};
use std::time::Duration;
use thiserror::Error;

/// Pipeline properties sent with every request
///
/// Whitespace-only tokenization and end-of-line sentence splitting keep the
/// response rows aligned one-to-one with the tokens sent.
pub const PIPELINE_PROPERTIES: &[(&str, &str)] = &[
    ("annotators", "tokenize,ssplit,pos,depparse"),
    ("outputFormat", "conllu"),
    ("tokenize.language", "Whitespace"),
    ("ssplit.eolonly", "true"),
];

/// Minimum number of columns in a response row (through DEPREL)
const RESPONSE_COLUMNS: usize = 8;

/// Error from the annotation service
#[derive(Debug, Error)]
pub enum AnnotateError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("failed to read response body: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed response at row {row}: {message}")]
    MalformedResponse { row: usize, message: String },
}

/// Something that can dependency-parse a sentence
pub trait Annotator {
    /// Parse `text` (tokens joined by single spaces) and return the raw
    /// response table
    fn annotate(&self, text: &str) -> Result<String, AnnotateError>;
}

impl<A: Annotator + ?Sized> Annotator for &A {
    fn annotate(&self, text: &str) -> Result<String, AnnotateError> {
        (**self).annotate(text)
    }
}

/// One line of a parse table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseRow {
    /// 1-based position, equal to the row's place in the table
    pub id: usize,
    pub pos: String,
    /// Head position local to the sentence that was sent, `0` for root
    pub head: usize,
    pub rel: String,
}

/// Parse a response table into rows
///
/// Reading stops at the first blank line, which ends the sentence.
/// Comment lines are skipped. Rows must be numbered 1, 2, 3, ...
pub fn parse_response(text: &str) -> Result<Vec<ResponseRow>, AnnotateError> {
    let mut rows = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if line.starts_with('#') {
            continue;
        }

        let row = rows.len() + 1;
        let fields = split_tabs(line);
        if fields.len() < RESPONSE_COLUMNS {
            return Err(AnnotateError::MalformedResponse {
                row,
                message: format!(
                    "expected at least {} fields, found {}",
                    RESPONSE_COLUMNS,
                    fields.len()
                ),
            });
        }

        if parse_index(fields[0]) != Some(row) {
            return Err(AnnotateError::MalformedResponse {
                row,
                message: format!("expected id {}, found {:?}", row, fields[0]),
            });
        }
        let head = parse_index(fields[6]).ok_or_else(|| AnnotateError::MalformedResponse {
            row,
            message: format!("invalid head {:?}", fields[6]),
        })?;

        rows.push(ResponseRow {
            id: row,
            pos: fields[4].to_string(),
            head,
            rel: fields[7].to_string(),
        });
    }

    Ok(rows)
}

/// Connection settings for a CoreNLP server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreNlpConfig {
    /// Host, with or without scheme; `http://` is assumed when absent
    pub host: String,
    pub port: u16,
    pub language: String,
    /// `None` waits forever
    pub timeout: Option<Duration>,
}

impl CoreNlpConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            host: host.trim_end_matches('/').to_string(),
            port,
            language: "zh".to_string(),
            timeout: None,
        }
    }

    pub fn url(&self) -> String {
        if self.host.contains("://") {
            format!("{}:{}/", self.host, self.port)
        } else {
            format!("http://{}:{}/", self.host, self.port)
        }
    }

    /// The `properties` query parameter, a JSON object
    pub fn properties(&self) -> String {
        let properties: serde_json::Map<String, serde_json::Value> = PIPELINE_PROPERTIES
            .iter()
            .map(|(key, value)| (key.to_string(), serde_json::Value::from(*value)))
            .collect();
        serde_json::Value::Object(properties).to_string()
    }
}

/// Blocking HTTP client for a CoreNLP server
pub struct CoreNlpClient {
    agent: ureq::Agent,
    config: CoreNlpConfig,
    url: String,
    properties: String,
}

impl CoreNlpClient {
    pub fn new(config: CoreNlpConfig) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Self {
            agent: builder.build(),
            url: config.url(),
            properties: config.properties(),
            config,
        }
    }

    pub fn config(&self) -> &CoreNlpConfig {
        &self.config
    }
}

impl Annotator for CoreNlpClient {
    fn annotate(&self, text: &str) -> Result<String, AnnotateError> {
        if text.is_empty() {
            return Ok(String::new());
        }

        tracing::trace!(url = %self.url, chars = text.len(), "annotating");
        let response = self
            .agent
            .post(&self.url)
            .query("properties", &self.properties)
            .query("pipelineLanguage", &self.config.language)
            .set("Connection", "close")
            .set("Content-Type", "text/plain; charset=utf-8")
            .send_bytes(text.as_bytes());

        match response {
            Ok(response) => Ok(response.into_string()?),
            Err(ureq::Error::Status(status, _)) => Err(AnnotateError::Status {
                url: self.url.clone(),
                status,
            }),
            Err(e) => Err(AnnotateError::Transport {
                url: self.url.clone(),
                source: Box::new(e),
            }),
        }
    }
}
