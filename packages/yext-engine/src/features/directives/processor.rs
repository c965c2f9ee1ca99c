//! Directive processor
//!
//! Scans the lines preceding the first `---`, builds the [`DirectiveTable`]
//! and blanks custom directive lines. Never fails: every problem becomes a
//! diagnostic.

use std::path::Path;

use serde_yaml::Value;

use super::types::{DirectiveTable, ImportDecl, PrivatePath, ProcessedDirectives, VariableDecl};
use crate::features::tokenizer::{tokenize_directive, tokenize_key_value, Token};
use crate::shared::models::{DeclaredType, Diagnostic, DiagnosticKind, Span};

const YAML_EXTENSIONS: &[&str] = &["yaml", "yml"];

pub fn has_yaml_extension(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| YAML_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Parse a directive default the way a YAML scalar would be read; quoted
/// defaults are always strings.
fn parse_default(token: &Token) -> Value {
    if token.quoted {
        return Value::String(token.text.clone());
    }
    serde_yaml::from_str::<Value>(&token.text).unwrap_or_else(|_| Value::String(token.text.clone()))
}

struct DirectiveProcessor<'a> {
    path: &'a Path,
    source: &'a str,
    table: DirectiveTable,
}

impl<'a> DirectiveProcessor<'a> {
    fn span(&self, start: usize, end: usize) -> Span {
        Span::locate(self.source, start, end)
    }

    fn token_span(&self, token: &Token) -> Span {
        self.span(token.range.absolute.start, token.range.absolute.end)
    }

    fn report(&mut self, span: Span, message: impl Into<String>) {
        let diagnostic = Diagnostic::directive(self.path, message).with_span(span);
        self.table.diagnostics.push(diagnostic);
    }

    fn warn(&mut self, span: Span, message: impl Into<String>) {
        let diagnostic = Diagnostic::directive(self.path, message)
            .with_span(span)
            .as_warning();
        self.table.diagnostics.push(diagnostic);
    }

    /// Handle one directive line. Returns whether it should be blanked.
    fn directive(&mut self, line: &str, start: usize) -> bool {
        let parts = match tokenize_directive(line, start) {
            Ok(parts) => parts,
            Err(err) => {
                let span = self.span(err.offset(), start + line.len());
                self.report(span, err.to_string());
                return !line.starts_with("%TAG") && !line.starts_with("%YAML");
            }
        };
        let Some(name) = parts.first() else {
            return false;
        };
        let line_span = self.span(start, start + line.len());

        match name.text.as_str() {
            "%YAML" => false,
            "%TAG" => {
                self.tag(&parts, line_span);
                false
            }
            "%PARAM" => {
                self.variable(&parts, line_span, false);
                true
            }
            "%LOCAL" => {
                self.variable(&parts, line_span, true);
                true
            }
            "%IMPORT" => {
                self.import(&parts, line_span);
                true
            }
            "%PRIVATE" => {
                self.private(&parts, line_span);
                true
            }
            "%FILENAME" => {
                self.filename(&parts, line_span);
                true
            }
            other => {
                let span = self.token_span(name);
                self.warn(span, format!("unknown directive '{}' ignored", other));
                true
            }
        }
    }

    fn tag(&mut self, parts: &[Token], line_span: Span) {
        let (Some(handle), Some(prefix)) = (parts.get(1), parts.get(2)) else {
            self.report(line_span, "%TAG requires a handle and a prefix");
            return;
        };
        if self.table.tags.contains_key(&handle.text) {
            let span = self.token_span(handle);
            self.report(span, format!("duplicate tag handle '{}'", handle.text));
            return;
        }
        self.table
            .tags
            .insert(handle.text.clone(), prefix.text.clone());
    }

    fn variable(&mut self, parts: &[Token], line_span: Span, local: bool) {
        let directive = if local { "%LOCAL" } else { "%PARAM" };
        let Some(alias) = parts.get(1) else {
            self.report(line_span, format!("{} requires an alias", directive));
            return;
        };

        let mut declared_type = None;
        let mut default_token = None;
        match &parts[2..] {
            [] => {}
            [only] => match DeclaredType::parse(&only.text) {
                Some(ty) if !only.quoted => declared_type = Some(ty),
                _ => default_token = Some(only),
            },
            [ty, default, rest @ ..] => {
                match DeclaredType::parse(&ty.text) {
                    Some(parsed) if !ty.quoted => declared_type = Some(parsed),
                    _ => {
                        let span = self.token_span(ty);
                        self.warn(
                            span,
                            format!(
                                "unknown type '{}' discarded (expected scalar, map or seq)",
                                ty.text
                            ),
                        );
                    }
                }
                default_token = Some(default);
                if let Some(extra) = rest.first() {
                    let span = self.token_span(extra);
                    self.warn(span, format!("unexpected extra arguments to {}", directive));
                }
            }
        }

        let default = default_token.map(parse_default).unwrap_or(Value::Null);
        if let (Some(ty), Some(token)) = (declared_type, default_token) {
            if !ty.matches(&default) {
                let span = self.token_span(token);
                self.report(
                    span,
                    format!("default of '{}' is not of declared type {}", alias.text, ty),
                );
            }
        }

        let decl = VariableDecl {
            alias: alias.text.clone(),
            default,
            declared_type,
            span: line_span,
        };
        let exists = if local {
            self.table.locals.contains_key(&alias.text)
        } else {
            self.table.params.contains_key(&alias.text)
        };
        if exists {
            let span = self.token_span(alias);
            self.report(
                span,
                format!("duplicate {} alias '{}'", directive, alias.text),
            );
            return;
        }
        if local {
            self.table.locals.insert(alias.text.clone(), decl);
        } else {
            self.table.params.insert(alias.text.clone(), decl);
        }
    }

    fn import(&mut self, parts: &[Token], line_span: Span) {
        let (Some(alias), Some(target)) = (parts.get(1), parts.get(2)) else {
            self.report(line_span, "%IMPORT requires an alias and a path");
            return;
        };
        if !has_yaml_extension(&target.text) {
            let diagnostic = Diagnostic::new(
                DiagnosticKind::Path,
                self.path,
                format!(
                    "import '{}' is not a YAML document (expected .yaml or .yml)",
                    target.text
                ),
            )
            .with_span(self.token_span(target));
            self.table.diagnostics.push(diagnostic);
            return;
        }
        if self.table.imports.contains_key(&alias.text) {
            let span = self.token_span(alias);
            self.report(span, format!("duplicate %IMPORT alias '{}'", alias.text));
            return;
        }

        let mut defaults = Vec::new();
        for part in &parts[3..] {
            match tokenize_key_value(&part.raw, part.offset()) {
                Ok(kv) if kv.value.is_some() => defaults.push(kv),
                Ok(_) => {
                    let span = self.token_span(part);
                    self.report(span, format!("import parameter '{}' has no value", part.text));
                }
                Err(err) => {
                    let span = self.token_span(part);
                    self.report(span, err.to_string());
                }
            }
        }

        self.table.imports.insert(
            alias.text.clone(),
            ImportDecl {
                alias: alias.text.clone(),
                path: target.text.clone(),
                defaults,
                span: line_span,
            },
        );
    }

    fn private(&mut self, parts: &[Token], line_span: Span) {
        if parts.len() < 2 {
            self.report(line_span, "%PRIVATE requires at least one path");
            return;
        }
        for part in &parts[1..] {
            let segments: Vec<String> = part.text.split('.').map(str::to_string).collect();
            if segments.iter().any(|s| s.is_empty()) {
                let span = self.token_span(part);
                self.report(span, format!("invalid private path '{}'", part.text));
                continue;
            }
            let span = self.token_span(part);
            self.table.private.push(PrivatePath { segments, span });
        }
    }

    fn filename(&mut self, parts: &[Token], line_span: Span) {
        let Some(name) = parts.get(1) else {
            self.report(line_span, "%FILENAME requires a name");
            return;
        };
        if self.table.filename.is_some() {
            let span = self.token_span(name);
            self.report(span, "%FILENAME may only be declared once");
            return;
        }
        self.table.filename = Some(name.text.clone());
    }
}

fn is_document_start(line: &str) -> bool {
    line.starts_with("---")
        && line[3..]
            .chars()
            .next()
            .map_or(true, char::is_whitespace)
}

/// Process the directive region of `source`.
pub fn process_directives(path: &Path, source: &str) -> ProcessedDirectives {
    let mut processor = DirectiveProcessor {
        path,
        source,
        table: DirectiveTable::default(),
    };
    let mut body = source.to_string();
    let mut offset = 0;

    for raw_line in source.split_inclusive('\n') {
        let line_start = offset;
        offset += raw_line.len();
        let line = raw_line.trim_end_matches(['\n', '\r']);

        if is_document_start(line) {
            break;
        }
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if !line.starts_with('%') {
            // Document content without a `---` marker: no directive region
            break;
        }

        if processor.directive(line, line_start) {
            body.replace_range(
                line_start..line_start + line.len(),
                &" ".repeat(line.len()),
            );
        }
    }

    if !processor.table.diagnostics.is_empty() {
        tracing::debug!(
            path = %path.display(),
            count = processor.table.diagnostics.len(),
            "directive diagnostics"
        );
    }

    let filename = processor.table.filename.clone();
    for diagnostic in &mut processor.table.diagnostics {
        diagnostic.filename = filename.clone();
    }

    ProcessedDirectives {
        table: processor.table,
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::Severity;

    fn process(source: &str) -> ProcessedDirectives {
        process_directives(Path::new("/docs/main.yaml"), source)
    }

    #[test]
    fn test_param_and_local_parsing() {
        let processed = process(
            "%PARAM host\n%PARAM port scalar 8080\n%PARAM name \"Ada\"\n%LOCAL items seq\n---\na: 1\n",
        );
        let table = &processed.table;
        assert!(table.diagnostics.is_empty(), "{:?}", table.diagnostics);

        assert_eq!(table.params["host"].default, Value::Null);
        assert_eq!(table.params["port"].declared_type, Some(DeclaredType::Scalar));
        assert_eq!(table.params["port"].default, Value::from(8080));
        assert_eq!(table.params["name"].default, Value::from("Ada"));
        assert_eq!(table.locals["items"].declared_type, Some(DeclaredType::Seq));
    }

    #[test]
    fn test_single_optional_part_is_type_or_default() {
        let processed = process("%PARAM a map\n%PARAM b 12\n%PARAM c 'seq'\n---\n");
        let table = &processed.table;
        assert_eq!(table.params["a"].declared_type, Some(DeclaredType::Map));
        assert_eq!(table.params["b"].default, Value::from(12));
        assert_eq!(table.params["c"].default, Value::from("seq"));
        assert_eq!(table.params["c"].declared_type, None);
    }

    #[test]
    fn test_custom_lines_blanked_offsets_preserved() {
        let source = "%TAG !e! tag:example.com,2024:\n%PARAM x\n---\nv: 1\n";
        let processed = process(source);

        assert_eq!(processed.body.len(), source.len());
        assert!(processed.body.starts_with("%TAG !e! tag:example.com,2024:\n        \n---"));
        assert_eq!(processed.table.tags["!e!"], "tag:example.com,2024:");
    }

    #[test]
    fn test_import_declaration() {
        let processed = process("%IMPORT db ./db.yaml env=prod region=\"eu west\"\n%IMPORT bad ./x.json\n---\n");
        let table = &processed.table;

        let db = &table.imports["db"];
        assert_eq!(db.path, "./db.yaml");
        assert_eq!(db.defaults.len(), 2);
        assert_eq!(db.defaults[1].key.text, "region");
        assert_eq!(db.defaults[1].value.as_ref().unwrap().text, "eu west");

        assert!(!table.imports.contains_key("bad"));
        assert_eq!(table.diagnostics.len(), 1);
        assert_eq!(table.diagnostics[0].kind, DiagnosticKind::Path);
    }

    #[test]
    fn test_duplicates_and_unknown() {
        let processed = process(
            "%PARAM a 1\n%PARAM a 2\n%FILENAME first\n%FILENAME second\n%BOGUS x\n---\n",
        );
        let table = &processed.table;

        assert_eq!(table.params["a"].default, Value::from(1));
        assert_eq!(table.filename.as_deref(), Some("first"));

        let errors: Vec<_> = table.diagnostics.iter().filter(|d| d.is_error()).collect();
        assert_eq!(errors.len(), 2);
        let warnings: Vec<_> = table
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .collect();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("%BOGUS"));
        assert_eq!(warnings[0].span.unwrap().line, 5);
        assert_eq!(warnings[0].filename.as_deref(), Some("first"));
    }

    #[test]
    fn test_invalid_type_discarded_with_warning() {
        let processed = process("%LOCAL x list 3\n---\n");
        let table = &processed.table;
        assert_eq!(table.locals["x"].declared_type, None);
        assert_eq!(table.locals["x"].default, Value::from(3));
        assert_eq!(table.diagnostics[0].severity, Severity::Warning);
    }

    #[test]
    fn test_private_paths_and_no_marker() {
        let processed = process("%PRIVATE secret.key other\n---\n");
        let dotted: Vec<String> = processed.table.private.iter().map(|p| p.dotted()).collect();
        assert_eq!(dotted, vec!["secret.key", "other"]);

        // Content before any `---`: nothing is a directive
        let processed = process("a: 1\n%PARAM x\n");
        assert!(processed.table.params.is_empty());
        assert_eq!(processed.body, "a: 1\n%PARAM x\n");
    }
}
