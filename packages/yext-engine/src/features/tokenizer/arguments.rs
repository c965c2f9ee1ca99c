//! Argument stage: split an argument list on top-level commas

use super::escape::{is_quote, Cursor};
use super::types::{Token, TokenKind, TokenizeResult};

/// Split the content of `( ... )` into `Arg` tokens. Empty arguments are
/// dropped.
pub fn tokenize_arguments(input: &str, offset: usize) -> TokenizeResult<Vec<Token>> {
    let mut cursor = Cursor::new(input, offset);
    let mut tokens = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    while let Some(c) = cursor.peek() {
        match c {
            '\\' => cursor.skip_escape(),
            c if is_quote(c) => {
                cursor.read_quoted()?;
            }
            '(' | '[' | '{' => {
                depth += 1;
                cursor.bump();
            }
            ')' | ']' | '}' => {
                depth = depth.saturating_sub(1);
                cursor.bump();
            }
            ',' if depth == 0 => {
                let end = cursor.offset();
                push_argument(&mut tokens, input, start, end, offset);
                cursor.bump();
                start = cursor.offset();
            }
            _ => {
                cursor.bump();
            }
        }
    }
    push_argument(&mut tokens, input, start, input.len(), offset);

    Ok(tokens)
}

fn push_argument(tokens: &mut Vec<Token>, input: &str, start: usize, end: usize, offset: usize) {
    let piece = &input[start..end];
    let trimmed = piece.trim();
    if trimmed.is_empty() {
        return;
    }
    let lead = piece.len() - piece.trim_start().len();
    let s = start + lead;
    tokens.push(Token::new(
        TokenKind::Arg,
        trimmed,
        trimmed,
        false,
        s,
        s + trimmed.len(),
        offset,
    ));
}
