//! Text stage: literal runs and `${...}` / free expressions

use super::escape::{escaped_char, Cursor};
use super::types::{Token, TokenKind, TokenizeError, TokenizeResult};

/// Whether a scalar as a whole is a free expression: it starts with `$`
/// that is followed by something other than `{` or `$`.
pub fn is_free_expression(value: &str) -> bool {
    let mut chars = value.trim().chars();
    match (chars.next(), chars.next()) {
        (Some('$'), Some(next)) => next != '{' && next != '$' && !next.is_whitespace(),
        _ => false,
    }
}

/// Split `input` into `Text` and `Expr` tokens.
///
/// `offset` is the absolute position of `input` in its document.
pub fn tokenize_text(input: &str, offset: usize) -> TokenizeResult<Vec<Token>> {
    if is_free_expression(input) {
        let start = input.len() - input.trim_start().len();
        let trimmed = input.trim();
        let end = start + trimmed.len();
        return Ok(vec![Token::new(
            TokenKind::Expr,
            trimmed,
            trimmed,
            false,
            start,
            end,
            offset,
        )]);
    }

    let mut tokens = Vec::new();
    let mut cursor = Cursor::new(input, offset);
    let mut text = String::new();
    let mut text_start = 0;

    while let Some(c) = cursor.peek() {
        match c {
            '\\' => {
                cursor.bump();
                match cursor.bump() {
                    Some(e) => text.push(escaped_char(e)),
                    None => text.push('\\'),
                }
            }
            '$' if cursor.peek_at(1) == Some('$') && cursor.peek_at(2) == Some('{') => {
                cursor.advance(3);
                text.push_str("${");
            }
            '$' if cursor.peek_at(1) == Some('{') => {
                let open = cursor.offset();
                if open > text_start {
                    tokens.push(Token::new(
                        TokenKind::Text,
                        std::mem::take(&mut text),
                        &input[text_start..open],
                        false,
                        text_start,
                        open,
                        offset,
                    ));
                }
                cursor.advance(2);
                let content_start = cursor.offset();
                let content_end =
                    cursor
                        .scan_balanced('{', '}')
                        .ok_or(TokenizeError::Unterminated {
                            what: "interpolation",
                            offset: offset + open,
                        })?;
                let content = &input[content_start..content_end];
                tokens.push(Token::new(
                    TokenKind::Expr,
                    content,
                    content,
                    false,
                    content_start,
                    content_end,
                    offset,
                ));
                text_start = cursor.offset();
            }
            _ => {
                cursor.bump();
                text.push(c);
            }
        }
    }

    let end = cursor.offset();
    if end > text_start {
        tokens.push(Token::new(
            TokenKind::Text,
            text,
            &input[text_start..end],
            false,
            text_start,
            end,
            offset,
        ));
    }

    Ok(tokens)
}
