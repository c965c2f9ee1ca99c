//! Key/value stage: split one argument at its first unescaped `=`

use super::escape::{is_quote, unescape, Cursor};
use super::types::{KeyValue, Token, TokenKind, TokenizeResult};

pub fn tokenize_key_value(input: &str, offset: usize) -> TokenizeResult<KeyValue> {
    let mut cursor = Cursor::new(input, offset);
    let mut eq = None;
    while let Some(c) = cursor.peek() {
        match c {
            '\\' => cursor.skip_escape(),
            c if is_quote(c) => {
                cursor.read_quoted()?;
            }
            '=' => {
                eq = Some(cursor.offset());
                break;
            }
            _ => {
                cursor.bump();
            }
        }
    }

    let key_end = eq.unwrap_or(input.len());
    let key = key_token(input, 0, key_end, offset)?;
    let value = match eq {
        Some(eq) => Some(value_token(input, eq + 1, input.len(), offset)),
        None => None,
    };
    Ok(KeyValue { key, value })
}

fn trimmed_bounds(input: &str, start: usize, end: usize) -> (usize, usize) {
    let piece = &input[start..end];
    let s = start + (piece.len() - piece.trim_start().len());
    let e = end - (piece.len() - piece.trim_end().len());
    (s, e.max(s))
}

fn key_token(input: &str, start: usize, end: usize, offset: usize) -> TokenizeResult<Token> {
    let (s, e) = trimmed_bounds(input, start, end);
    let raw = &input[s..e];
    if raw.starts_with(|c| is_quote(c)) {
        let mut cursor = Cursor::new(raw, offset + s);
        let text = cursor.read_quoted()?;
        if cursor.is_eof() {
            return Ok(Token::new(TokenKind::Key, text, raw, true, s, e, offset));
        }
    }
    Ok(Token::new(TokenKind::Key, unescape(raw), raw, false, s, e, offset))
}

/// Surrounding quotes are removed; the content stays raw for the text stage.
fn value_token(input: &str, start: usize, end: usize, offset: usize) -> Token {
    let (s, e) = trimmed_bounds(input, start, end);
    let raw = &input[s..e];
    let mut chars = raw.chars();
    if let (Some(first), Some(last)) = (chars.next(), chars.next_back()) {
        if is_quote(first) && first == last {
            let inner = &input[s + 1..e - 1];
            return Token::new(TokenKind::Value, inner, inner, true, s + 1, e - 1, offset);
        }
    }
    Token::new(TokenKind::Value, raw, raw, false, s, e, offset)
}
