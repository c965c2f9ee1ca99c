//! Expression stage and the parsed [`Expression`] model

use super::arguments::tokenize_arguments;
use super::escape::{escaped_char, is_quote, Cursor};
use super::key_value::tokenize_key_value;
use super::types::{ExpressionTokens, KeyValue, Token, TokenKind, TokenizeError, TokenizeResult};
use crate::shared::models::DeclaredType;

/// Split an expression into base, path segments, argument span and type.
pub fn tokenize_expression(input: &str, offset: usize) -> TokenizeResult<ExpressionTokens> {
    let mut cursor = Cursor::new(input, offset);
    cursor.skip_whitespace();
    if cursor.peek() == Some('$') {
        cursor.bump();
    }

    let mut base = read_segment(&mut cursor, TokenKind::Base)?;
    let mut path: Vec<Token> = Vec::new();
    let mut args = None;
    let mut type_annotation = None;

    while let Some(c) = cursor.peek() {
        match c {
            '.' => {
                cursor.bump();
                path.push(read_segment(&mut cursor, TokenKind::Path)?);
            }
            '(' if args.is_none() => {
                let open = cursor.offset();
                cursor.bump();
                let start = cursor.offset();
                let end = cursor
                    .scan_balanced('(', ')')
                    .ok_or(TokenizeError::Unterminated {
                        what: "argument list",
                        offset: offset + open,
                    })?;
                let content = &input[start..end];
                args = Some(Token::new(
                    TokenKind::Args,
                    content,
                    content,
                    false,
                    start,
                    end,
                    offset,
                ));
            }
            c if c.is_whitespace() => {
                cursor.skip_whitespace();
                let start = cursor.offset();
                let rest = input[start..].trim_end();
                let (skip, name) = strip_as_keyword(rest);
                if !name.is_empty() {
                    type_annotation = Some(Token::new(
                        TokenKind::Type,
                        name,
                        name,
                        false,
                        start + skip,
                        start + skip + name.len(),
                        offset,
                    ));
                }
                break;
            }
            _ => {
                // Stray character glued to the previous segment
                cursor.bump();
                let end = cursor.offset();
                let last = path.last_mut().unwrap_or(&mut base);
                last.text.push(c);
                last.range.relative.end = end;
                last.range.absolute.end = offset + end;
                last.raw = input[last.range.relative.clone()].to_string();
            }
        }
    }

    Ok(ExpressionTokens {
        base,
        path,
        args,
        type_annotation,
    })
}

fn strip_as_keyword(rest: &str) -> (usize, &str) {
    if let Some(after) = rest.strip_prefix("as") {
        if after.is_empty() {
            return (2, "");
        }
        if after.starts_with(char::is_whitespace) {
            let name = after.trim_start();
            return (rest.len() - name.len(), name);
        }
    }
    (0, rest)
}

/// Quoted or bare run up to `.`, `(` or whitespace
fn read_segment(cursor: &mut Cursor<'_>, kind: TokenKind) -> TokenizeResult<Token> {
    let start = cursor.offset();
    if matches!(cursor.peek(), Some(c) if is_quote(c)) {
        let text = cursor.read_quoted()?;
        let end = cursor.offset();
        return Ok(Token::new(
            kind,
            text,
            cursor.slice(start, end),
            true,
            start,
            end,
            cursor.absolute(0),
        ));
    }

    let mut text = String::new();
    while let Some(c) = cursor.peek() {
        match c {
            '.' | '(' => break,
            c if c.is_whitespace() => break,
            '\\' => {
                cursor.bump();
                match cursor.bump() {
                    Some(e) => text.push(escaped_char(e)),
                    None => text.push('\\'),
                }
            }
            _ => {
                cursor.bump();
                text.push(c);
            }
        }
    }
    let end = cursor.offset();
    Ok(Token::new(
        kind,
        text,
        cursor.slice(start, end),
        false,
        start,
        end,
        cursor.absolute(0),
    ))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpressionKind {
    This,
    Import,
    Param,
    Local,
}

impl ExpressionKind {
    pub fn from_base(base: &str) -> Option<Self> {
        match base {
            "this" => Some(ExpressionKind::This),
            "import" => Some(ExpressionKind::Import),
            "param" => Some(ExpressionKind::Param),
            "local" => Some(ExpressionKind::Local),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExpressionKind::This => "this",
            ExpressionKind::Import => "import",
            ExpressionKind::Param => "param",
            ExpressionKind::Local => "local",
        }
    }
}

/// A fully tokenized expression, arguments split into key/value pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    /// `None` when the base is not one of the four known bases
    pub kind: Option<ExpressionKind>,
    pub base: Token,
    pub path: Vec<Token>,
    pub args: Vec<KeyValue>,
    /// Whether an argument list was written, even an empty one
    pub has_args: bool,
    pub type_annotation: Option<Token>,
    /// Absolute range of the whole expression source
    pub range: std::ops::Range<usize>,
}

impl Expression {
    /// Run the expression, argument and key/value stages over `input`.
    pub fn parse(input: &str, offset: usize) -> TokenizeResult<Expression> {
        let tokens = tokenize_expression(input, offset)?;
        let mut args = Vec::new();
        if let Some(span) = &tokens.args {
            for arg in tokenize_arguments(&span.text, span.offset())? {
                args.push(tokenize_key_value(&arg.text, arg.offset())?);
            }
        }
        Ok(Expression {
            kind: ExpressionKind::from_base(&tokens.base.text),
            has_args: tokens.args.is_some(),
            base: tokens.base,
            path: tokens.path,
            args,
            type_annotation: tokens.type_annotation,
            range: offset..offset + input.len(),
        })
    }

    pub fn path_segments(&self) -> impl Iterator<Item = &str> {
        self.path.iter().map(|t| t.text.as_str())
    }

    /// Declared type, `Err` carrying the annotation text if it names no
    /// known type.
    pub fn declared_type(&self) -> Option<Result<DeclaredType, &str>> {
        self.type_annotation
            .as_ref()
            .map(|t| DeclaredType::parse(&t.text).ok_or(t.text.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_path_args_type() {
        let tokens = tokenize_expression("$this.templates.user(name=x, age=2) as map", 10).unwrap();
        assert_eq!(tokens.base.text, "this");
        let path: Vec<&str> = tokens.path.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(path, vec!["templates", "user"]);
        assert_eq!(tokens.args.as_ref().unwrap().text, "name=x, age=2");
        assert_eq!(tokens.args.as_ref().unwrap().range.absolute, 31..44);
        assert_eq!(tokens.type_annotation.as_ref().unwrap().text, "map");
    }

    #[test]
    fn test_type_without_as_keyword() {
        let tokens = tokenize_expression("param.items seq", 0).unwrap();
        assert_eq!(tokens.type_annotation.unwrap().text, "seq");
    }

    #[test]
    fn test_quoted_segment() {
        let tokens = tokenize_expression("this.\"a.b\".c", 0).unwrap();
        let path: Vec<&str> = tokens.path.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(path, vec!["a.b", "c"]);
        assert!(tokens.path[0].quoted);
    }

    #[test]
    fn test_unterminated_args() {
        let err = tokenize_expression("this.t(a=1", 5).unwrap_err();
        assert_eq!(
            err,
            TokenizeError::Unterminated {
                what: "argument list",
                offset: 11
            }
        );
    }

    #[test]
    fn test_parse_expression() {
        let expr = Expression::parse("$import.db.hosts(env=prod) as seq", 0).unwrap();
        assert_eq!(expr.kind, Some(ExpressionKind::Import));
        assert_eq!(expr.path_segments().collect::<Vec<_>>(), vec!["db", "hosts"]);
        assert_eq!(expr.args.len(), 1);
        assert_eq!(expr.args[0].key.text, "env");
        assert_eq!(expr.args[0].value.as_ref().unwrap().text, "prod");
        assert_eq!(expr.declared_type(), Some(Ok(DeclaredType::Seq)));

        let expr = Expression::parse("$nope.x as thing", 0).unwrap();
        assert_eq!(expr.kind, None);
        assert_eq!(expr.declared_type(), Some(Err("thing")));
    }
}
