//! Lexical tokenizer
//!
//! Five stages, each operating on the output of the previous one:
//!
//! 1. [`tokenize_text`]: literal text runs and `${...}` / free expressions
//! 2. [`tokenize_expression`]: base, path segments, argument span, type
//! 3. [`tokenize_arguments`]: top-level comma split
//! 4. [`tokenize_key_value`]: `key=value`
//! 5. [`tokenize_directive`]: parts of a `%` directive line
//!
//! Every token carries its range relative to the stage input and absolute in
//! the document, so diagnostics point at the exact source text.

mod arguments;
mod directive;
mod escape;
mod expression;
mod key_value;
mod text;
mod types;

pub use arguments::tokenize_arguments;
pub use directive::tokenize_directive;
pub use escape::unescape;
pub use expression::{tokenize_expression, Expression, ExpressionKind};
pub use key_value::tokenize_key_value;
pub use text::{is_free_expression, tokenize_text};
pub use types::{
    ExpressionTokens, KeyValue, Token, TokenKind, TokenRange, TokenizeError, TokenizeResult,
};
