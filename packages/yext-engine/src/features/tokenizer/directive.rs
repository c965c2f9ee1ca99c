//! Directive stage: whitespace-delimited parts with quoting

use super::escape::{is_quote, Cursor};
use super::types::{Token, TokenKind, TokenizeResult};

/// Split a directive line into `Part` tokens. A part written entirely in
/// quotes is unquoted and unescaped; any other part is kept verbatim so the
/// key/value stage can process it. A `#` at the start of a part begins a
/// comment.
pub fn tokenize_directive(line: &str, offset: usize) -> TokenizeResult<Vec<Token>> {
    let mut cursor = Cursor::new(line, offset);
    let mut parts = Vec::new();

    loop {
        cursor.skip_whitespace();
        match cursor.peek() {
            None | Some('#') => break,
            Some(_) => {}
        }

        let start = cursor.offset();
        while let Some(c) = cursor.peek() {
            match c {
                c if c.is_whitespace() => break,
                '\\' => cursor.skip_escape(),
                c if is_quote(c) => {
                    cursor.read_quoted()?;
                }
                _ => {
                    cursor.bump();
                }
            }
        }
        let end = cursor.offset();
        let raw = &line[start..end];

        let mut token = Token::new(TokenKind::Part, raw, raw, false, start, end, offset);
        if raw.starts_with(|c| is_quote(c)) {
            let mut inner = Cursor::new(raw, offset + start);
            let text = inner.read_quoted()?;
            if inner.is_eof() {
                token.text = text;
                token.quoted = true;
            }
        }
        parts.push(token);
    }

    Ok(parts)
}
