//! Token and sentence data structures
//!
//! A [`Sentence`] is an ordered run of [`Token`]s read from one
//! blank-line-delimited block. Each token carries its original parse plus
//! up to two secondary parses: one computed over the full sentence and one
//! computed over the reduced sentence (with `omit=I` tokens removed).

use crate::bytes::PLACEHOLDER;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Whether a token is elided from the reduced sentence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Omit {
    /// `I`: inside the omitted span, removed from the reduced sentence
    Inside,
    /// `O`: outside the omitted span, kept
    Outside,
}

impl Omit {
    pub fn as_str(self) -> &'static str {
        match self {
            Omit::Inside => "I",
            Omit::Outside => "O",
        }
    }
}

impl fmt::Display for Omit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid omit flag {0:?} (expected I or O)")]
pub struct OmitParseError(pub String);

impl FromStr for Omit {
    type Err = OmitParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "I" => Ok(Omit::Inside),
            "O" => Ok(Omit::Outside),
            other => Err(OmitParseError(other.to_string())),
        }
    }
}

/// One secondary parse assignment: POS tag, head id and relation
///
/// `head` always refers to the full sentence's 1-based numbering; `0` is root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parse {
    pub pos: String,
    pub head: usize,
    pub rel: String,
}

impl Parse {
    pub fn new(pos: &str, head: usize, rel: &str) -> Self {
        Self {
            pos: pos.to_string(),
            head,
            rel: rel.to_string(),
        }
    }
}

/// Secondary parses attached to a token
///
/// `reduced` is only ever populated for `omit=O` tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecondaryParse {
    /// Parse over the full sentence (`ppos`, `phead`, `prel`)
    pub full: Option<Parse>,
    /// Parse over the reduced sentence (`no_ppos`, `no_phead`, `no_prel`)
    pub reduced: Option<Parse>,
}

/// A token in a dependency tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// 1-based position in the sentence
    pub id: usize,
    pub form: String,
    pub omit: Omit,
    /// Gold POS tag; absent in the 4-column schema
    pub pos: Option<String>,
    /// Gold head id, `0` for root
    pub head: usize,
    /// Gold relation; absent in the 4-column schema
    pub rel: Option<String>,
    pub secondary: SecondaryParse,
}

impl Token {
    /// Create a token with no POS, relation or secondary parses
    pub fn new(id: usize, form: &str, omit: Omit, head: usize) -> Self {
        Self {
            id,
            form: form.to_string(),
            omit,
            pos: None,
            head,
            rel: None,
            secondary: SecondaryParse::default(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.head == 0
    }

    /// Surface form as shown in the sentence comment line
    ///
    /// Omitted tokens are bracketed with underscores: `_form_`.
    pub fn marked_form(&self) -> String {
        match self.omit {
            Omit::Outside => self.form.clone(),
            Omit::Inside => format!("_{}_", self.form),
        }
    }
}

fn opt(field: &Option<String>) -> &str {
    field.as_deref().unwrap_or(PLACEHOLDER)
}

fn write_parse(f: &mut fmt::Formatter<'_>, parse: Option<&Parse>) -> fmt::Result {
    match parse {
        Some(p) => write!(f, "{}\t{}\t{}", p.pos, p.head, p.rel),
        None => write!(f, "{PLACEHOLDER}\t{PLACEHOLDER}\t{PLACEHOLDER}"),
    }
}

/// Serializes as one 12-column line (without trailing newline):
/// `id form omit pos head rel no_ppos no_phead no_prel ppos phead prel`
impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t",
            self.id,
            self.form,
            self.omit,
            opt(&self.pos),
            self.head,
            opt(&self.rel)
        )?;
        write_parse(f, self.secondary.reduced.as_ref())?;
        f.write_str("\t")?;
        write_parse(f, self.secondary.full.as_ref())
    }
}

/// A sentence (one blank-line-delimited block)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sentence {
    pub tokens: Vec<Token>,
}

impl Sentence {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Get the parent of a token by its gold head, `None` for root
    pub fn parent(&self, token: &Token) -> Option<&Token> {
        if token.is_root() {
            None
        } else {
            self.tokens.get(token.head - 1)
        }
    }

    /// Tokens kept in the reduced sentence, in order
    pub fn reduced(&self) -> impl Iterator<Item = &Token> {
        self.tokens.iter().filter(|t| t.omit != Omit::Inside)
    }

    /// Whitespace-joined forms of every token
    pub fn text(&self) -> String {
        join_forms(self.tokens.iter())
    }

    /// Whitespace-joined forms of the reduced sentence
    pub fn reduced_text(&self) -> String {
        join_forms(self.reduced())
    }

    /// The `# ...` header line written before each augmented sentence
    pub fn comment_line(&self) -> String {
        let marked: Vec<String> = self.tokens.iter().map(Token::marked_form).collect();
        format!("# {}", marked.join(" "))
    }
}

pub(crate) fn join_forms<'a>(tokens: impl Iterator<Item = &'a Token>) -> String {
    let mut text = String::new();
    for (i, token) in tokens.enumerate() {
        if i > 0 {
            text.push(' ');
        }
        text.push_str(&token.form);
    }
    text
}

/// Serializes as the comment line followed by one line per token,
/// each terminated by a newline
impl fmt::Display for Sentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.comment_line())?;
        for token in &self.tokens {
            writeln!(f, "{}", token)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_tokens() -> Sentence {
        Sentence::new(vec![
            Token::new(1, "我", Omit::Outside, 3),
            Token::new(2, "也", Omit::Inside, 3),
            Token::new(3, "去", Omit::Outside, 0),
        ])
    }

    #[test]
    fn test_omit_from_str() {
        assert_eq!("I".parse::<Omit>(), Ok(Omit::Inside));
        assert_eq!("O".parse::<Omit>(), Ok(Omit::Outside));
        assert_eq!(
            "X".parse::<Omit>(),
            Err(OmitParseError("X".to_string()))
        );
        assert!("i".parse::<Omit>().is_err());
    }

    #[test]
    fn test_texts() {
        let sent = three_tokens();
        assert_eq!(sent.text(), "我 也 去");
        assert_eq!(sent.reduced_text(), "我 去");
        assert_eq!(sent.comment_line(), "# 我 _也_ 去");
    }

    #[test]
    fn test_parent() {
        let sent = three_tokens();
        assert_eq!(sent.parent(&sent.tokens[0]).unwrap().form, "去");
        assert!(sent.parent(&sent.tokens[2]).is_none());
    }

    #[test]
    fn test_display_unannotated() {
        let token = Token::new(2, "也", Omit::Inside, 3);
        assert_eq!(token.to_string(), "2\t也\tI\t_\t3\t_\t_\t_\t_\t_\t_\t_");
    }

    #[test]
    fn test_display_annotated() {
        let mut token = Token::new(1, "我", Omit::Outside, 3);
        token.pos = Some("PN".to_string());
        token.rel = Some("nsubj".to_string());
        token.secondary.full = Some(Parse::new("PN", 3, "nsubj"));
        token.secondary.reduced = Some(Parse::new("PN", 3, "nsubj"));
        assert_eq!(
            token.to_string(),
            "1\t我\tO\tPN\t3\tnsubj\tPN\t3\tnsubj\tPN\t3\tnsubj"
        );
    }

    #[test]
    fn test_sentence_display() {
        let sent = Sentence::new(vec![Token::new(1, "走", Omit::Outside, 0)]);
        assert_eq!(sent.to_string(), "# 走\n1\t走\tO\t_\t0\t_\t_\t_\t_\t_\t_\t_\n");
    }
}
