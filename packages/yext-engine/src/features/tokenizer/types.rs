//! Tokenizer data types

use std::ops::Range;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Literal text between interpolations
    Text,
    /// Expression source (`${...}` content or a free expression)
    Expr,
    /// Expression base (`this`, `import`, `param`, `local`)
    Base,
    /// One `.`-delimited path segment
    Path,
    /// Content of the parenthesized argument list
    Args,
    /// Trailing type annotation
    Type,
    /// One comma-separated argument
    Arg,
    Key,
    Value,
    /// Whitespace-delimited directive part
    Part,
}

/// Byte range of a token, relative to the tokenized input and absolute in
/// the document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TokenRange {
    pub relative: Range<usize>,
    pub absolute: Range<usize>,
}

impl TokenRange {
    pub fn new(start: usize, end: usize, offset: usize) -> Self {
        Self {
            relative: start..end,
            absolute: offset + start..offset + end,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Unescaped value (for `Expr`, `Args`, `Arg` and `Value` tokens the raw
    /// source, which a later stage tokenizes again)
    pub text: String,
    /// Source text exactly as written
    pub raw: String,
    /// Whether the token was written in quotes
    pub quoted: bool,
    pub range: TokenRange,
}

impl Token {
    pub(crate) fn new(
        kind: TokenKind,
        text: impl Into<String>,
        raw: &str,
        quoted: bool,
        start: usize,
        end: usize,
        offset: usize,
    ) -> Self {
        Self {
            kind,
            text: text.into(),
            raw: raw.to_string(),
            quoted,
            range: TokenRange::new(start, end, offset),
        }
    }

    /// Absolute offset of the token's source, the base offset for the next
    /// stage.
    pub fn offset(&self) -> usize {
        self.range.absolute.start
    }
}

/// Output of the expression stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpressionTokens {
    pub base: Token,
    pub path: Vec<Token>,
    pub args: Option<Token>,
    pub type_annotation: Option<Token>,
}

/// Output of the key/value stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: Token,
    /// `None` for an argument without `=`
    pub value: Option<Token>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenizeError {
    #[error("unterminated {what} starting at byte {offset}")]
    Unterminated { what: &'static str, offset: usize },
}

impl TokenizeError {
    /// Absolute offset of the opening delimiter
    pub fn offset(&self) -> usize {
        match self {
            TokenizeError::Unterminated { offset, .. } => *offset,
        }
    }
}

pub type TokenizeResult<T> = Result<T, TokenizeError>;
