//! Escape handling and the character cursor shared by all stages

use super::types::{TokenizeError, TokenizeResult};

/// Character produced by `\<c>`
pub(crate) fn escaped_char(c: char) -> char {
    match c {
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        other => other,
    }
}

/// Unescape a whole string; a trailing lone backslash is kept.
pub fn unescape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(e) => out.push(escaped_char(e)),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

pub(crate) fn is_quote(c: char) -> bool {
    c == '"' || c == '\''
}

pub(crate) struct Cursor<'a> {
    input: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
    base: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(input: &'a str, base: usize) -> Self {
        Self {
            input,
            chars: input.char_indices().collect(),
            pos: 0,
            base,
        }
    }

    pub(crate) fn peek(&self) -> Option<char> {
        self.peek_at(0)
    }

    pub(crate) fn peek_at(&self, n: usize) -> Option<char> {
        self.chars.get(self.pos + n).map(|(_, c)| *c)
    }

    pub(crate) fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    pub(crate) fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.chars.len());
    }

    /// Byte offset of the current position, relative to the input
    pub(crate) fn offset(&self) -> usize {
        self.chars
            .get(self.pos)
            .map(|(i, _)| *i)
            .unwrap_or(self.input.len())
    }

    pub(crate) fn absolute(&self, relative: usize) -> usize {
        self.base + relative
    }

    pub(crate) fn is_eof(&self) -> bool {
        self.pos >= self.chars.len()
    }

    pub(crate) fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.input[start..end]
    }

    pub(crate) fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    /// Read a quoted string starting at the opening quote; returns the
    /// unescaped content.
    pub(crate) fn read_quoted(&mut self) -> TokenizeResult<String> {
        let start = self.offset();
        let unterminated = TokenizeError::Unterminated {
            what: "quoted string",
            offset: self.absolute(start),
        };
        let quote = self.bump().ok_or_else(|| unterminated.clone())?;
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(unterminated),
                Some('\\') => match self.bump() {
                    Some(e) => out.push(escaped_char(e)),
                    None => return Err(unterminated),
                },
                Some(c) if c == quote => return Ok(out),
                Some(c) => out.push(c),
            }
        }
    }

    /// Skip over an escape sequence starting at `\`.
    pub(crate) fn skip_escape(&mut self) {
        self.advance(2);
    }

    /// Scan to the delimiter closing an already consumed `open`, respecting
    /// nesting, escapes and quotes. Returns the relative offset of the
    /// closing delimiter and leaves the cursor after it.
    pub(crate) fn scan_balanced(&mut self, open: char, close: char) -> Option<usize> {
        let mut depth = 1usize;
        while let Some(c) = self.peek() {
            match c {
                '\\' => self.skip_escape(),
                c if is_quote(c) => {
                    self.read_quoted().ok()?;
                }
                c if c == open => {
                    depth += 1;
                    self.pos += 1;
                }
                c if c == close => {
                    let at = self.offset();
                    self.pos += 1;
                    depth -= 1;
                    if depth == 0 {
                        return Some(at);
                    }
                }
                _ => self.pos += 1,
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r"a\nb"), "a\nb");
        assert_eq!(unescape(r#"say \"hi\""#), "say \"hi\"");
        assert_eq!(unescape(r"\$x"), "$x");
        assert_eq!(unescape(r"tail\"), "tail\\");
        assert_eq!(unescape(r"c:\\dir"), "c:\\dir");
    }

    #[test]
    fn test_read_quoted() {
        let mut cursor = Cursor::new(r#"'it\'s' rest"#, 0);
        assert_eq!(cursor.read_quoted().unwrap(), "it's");
        assert_eq!(cursor.peek(), Some(' '));

        let mut cursor = Cursor::new("\"open", 10);
        assert_eq!(
            cursor.read_quoted(),
            Err(TokenizeError::Unterminated {
                what: "quoted string",
                offset: 10
            })
        );
    }

    #[test]
    fn test_scan_balanced_nesting() {
        let mut cursor = Cursor::new("a{b}\"}\"c}tail", 0);
        assert_eq!(cursor.scan_balanced('{', '}'), Some(8));
        assert_eq!(cursor.peek(), Some('t'));
    }
}
