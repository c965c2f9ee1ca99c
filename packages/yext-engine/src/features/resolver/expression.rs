//! Expression evaluation: `$this`, `$import`, `$param`, `$local`

use super::context::{Resolver, MAX_CALL_DEPTH};
use super::stringify::value_to_text;
use super::traverse::traverse_value;
use crate::features::syntax::{plain_scalar_value, NodeId, NodeKind};
use crate::features::tokenizer::{
    is_free_expression, tokenize_text, unescape, Expression, ExpressionKind, Token, TokenKind,
};
use crate::shared::models::{DeclaredType, Params, Value};

/// Where a `$this` path lands
enum Target {
    /// A node of the syntax tree, possibly not resolved yet
    Node(NodeId),
    /// Inside an already computed value
    Value(Value),
}

impl Resolver<'_> {
    /// Evaluate text containing `$`. A free expression yields its value
    /// unchanged unless `force_string`; anything else is interpolated.
    pub(crate) fn evaluate_fragment(&mut self, text: &str, offset: usize, force_string: bool) -> Value {
        let tokens = match tokenize_text(text, offset) {
            Ok(tokens) => tokens,
            Err(err) => {
                self.expression_error(err.offset(), offset + text.len(), err.to_string());
                return Value::Null;
            }
        };

        if let [token] = tokens.as_slice() {
            if token.kind == TokenKind::Expr && is_free_expression(text) {
                let value = self.evaluate_expression(token);
                return if force_string {
                    Value::String(value_to_text(&value))
                } else {
                    value
                };
            }
        }

        let mut out = String::new();
        for token in &tokens {
            match token.kind {
                TokenKind::Expr => {
                    let value = self.evaluate_expression(token);
                    out.push_str(&value_to_text(&value));
                }
                _ => out.push_str(&token.text),
            }
        }
        Value::String(out)
    }

    /// Value of a `key=value` argument; quoted values are always strings.
    pub(crate) fn evaluate_argument(&mut self, token: &Token) -> Value {
        if !token.text.contains('$') {
            let text = unescape(&token.text);
            return if token.quoted {
                Value::String(text)
            } else {
                plain_scalar_value(&text)
            };
        }
        self.evaluate_fragment(&token.text, token.offset(), token.quoted)
    }

    fn evaluate_arguments(&mut self, expr: &Expression) -> Params {
        let mut params = Params::new();
        for kv in &expr.args {
            match &kv.value {
                Some(value) => {
                    let value = self.evaluate_argument(value);
                    params.insert(kv.key.text.clone(), value);
                }
                None => {
                    let range = &kv.key.range.absolute;
                    self.expression_error(
                        range.start,
                        range.end,
                        format!("argument '{}' has no value", kv.key.text),
                    );
                }
            }
        }
        params
    }

    /// Evaluate one `Expr` token. Errors are recorded and yield null.
    pub(crate) fn evaluate_expression(&mut self, token: &Token) -> Value {
        let expr = match Expression::parse(&token.text, token.offset()) {
            Ok(expr) => expr,
            Err(err) => {
                let range = &token.range.absolute;
                self.expression_error(err.offset(), range.end, err.to_string());
                return Value::Null;
            }
        };

        let value = match expr.kind {
            Some(ExpressionKind::This) => self.eval_this(&expr),
            Some(ExpressionKind::Import) => self.eval_import(&expr),
            Some(ExpressionKind::Param) => self.eval_variable(&expr, false),
            Some(ExpressionKind::Local) => self.eval_variable(&expr, true),
            None => {
                let range = &expr.base.range.absolute;
                self.expression_error(
                    range.start,
                    range.end,
                    format!(
                        "unknown expression base '{}' (expected this, import, param or local)",
                        expr.base.text
                    ),
                );
                None
            }
        };
        let Some(value) = value else {
            return Value::Null;
        };

        match expr.declared_type() {
            None => value,
            Some(Ok(ty)) if ty.matches(&value) => value,
            Some(Ok(ty)) => {
                self.expression_error(
                    expr.range.start,
                    expr.range.end,
                    format!("expected {}, found {}", ty, DeclaredType::of(&value)),
                );
                Value::Null
            }
            Some(Err(name)) => {
                let message = format!("unknown type '{}' (expected scalar, map or seq)", name);
                self.expression_error(expr.range.start, expr.range.end, message);
                Value::Null
            }
        }
    }

    fn segments(tokens: &[Token]) -> Vec<String> {
        tokens.iter().map(|t| t.text.clone()).collect()
    }

    fn eval_this(&mut self, expr: &Expression) -> Option<Value> {
        let segments = Self::segments(&expr.path);
        if segments.is_empty() {
            self.expression_error(expr.range.start, expr.range.end, "$this requires a path");
            return None;
        }

        let target = match self.locate(&segments, expr.has_args) {
            Ok(target) => target,
            Err(message) => {
                self.expression_error(expr.range.start, expr.range.end, message);
                return None;
            }
        };

        if !expr.has_args {
            return match target {
                Target::Value(value) => Some(value),
                Target::Node(id) => match self.resolve_on_demand(id) {
                    Ok(value) => Some(value),
                    Err(message) => {
                        self.expression_error(expr.range.start, expr.range.end, message);
                        None
                    }
                },
            };
        }

        let args = self.evaluate_arguments(expr);
        match target {
            Target::Value(_) => {
                self.expression_error(
                    expr.range.start,
                    expr.range.end,
                    format!(
                        "call arguments apply only to document nodes; '{}' lies inside an alias or scalar value",
                        segments.join(".")
                    ),
                );
                None
            }
            Target::Node(id) => {
                if self.locals.depth() >= MAX_CALL_DEPTH {
                    self.expression_error(
                        expr.range.start,
                        expr.range.end,
                        format!("template calls nested deeper than {}", MAX_CALL_DEPTH),
                    );
                    return None;
                }
                let saved = self.scratch.clone();
                self.transient += 1;
                self.locals.push(args);
                let value = self.resolve_node(id);
                self.locals.pop();
                self.transient -= 1;
                self.scratch = saved;
                Some(value)
            }
        }
    }

    /// Text of a mapping key, resolving it if it holds an expression
    fn key_text(&mut self, key: NodeId) -> Result<String, String> {
        let tree = self.input.tree;
        match &tree.node(key).kind {
            NodeKind::Scalar { value, .. } if !value.contains('$') => Ok(value.clone()),
            _ => {
                let value = self.resolve_on_demand(key)?;
                Ok(value_to_text(&value))
            }
        }
    }

    /// Walk the syntax tree by path, switching to value traversal as soon
    /// as a computed value is reached. A template `call` keeps walking
    /// collections structurally so the target node can be re-evaluated.
    fn locate(&mut self, segments: &[String], call: bool) -> Result<Target, String> {
        let tree = self.input.tree;
        let Some(mut id) = tree.root else {
            return Err("document is empty".to_string());
        };
        let not_found = |segment: &str, within: &str| {
            format!(
                "path '{}' not found (no '{}' in {})",
                segments.join("."),
                segment,
                within
            )
        };

        for (i, segment) in segments.iter().enumerate() {
            if !call {
                if let Some(value) = self.known_value(id) {
                    return traverse_value(&value, &segments[i..]).map(Target::Value);
                }
            }
            match &tree.node(id).kind {
                NodeKind::Mapping { entries, .. } => {
                    let mut found = None;
                    for (key, value) in entries {
                        if self.key_text(*key)? == *segment {
                            found = Some(*value);
                            break;
                        }
                    }
                    id = found.ok_or_else(|| not_found(segment, "map"))?;
                }
                NodeKind::Sequence { items, .. } => {
                    let found = match segment.parse::<usize>() {
                        Ok(index) => items.get(index).copied(),
                        Err(_) => items
                            .iter()
                            .copied()
                            .find(|item| tree.scalar(*item) == Some(segment.as_str())),
                    };
                    id = found.ok_or_else(|| not_found(segment, "sequence"))?;
                }
                NodeKind::Alias { target, name } => {
                    let value = target.and_then(|t| self.known_value(t)).ok_or_else(|| {
                        format!("alias '*{}' is accessed before its anchor is defined", name)
                    })?;
                    return traverse_value(&value, &segments[i..]).map(Target::Value);
                }
                NodeKind::Scalar { .. } => {
                    let value = self.resolve_on_demand(id)?;
                    return traverse_value(&value, &segments[i..]).map(Target::Value);
                }
            }
        }
        Ok(Target::Node(id))
    }

    fn eval_import(&mut self, expr: &Expression) -> Option<Value> {
        let Some(alias) = expr.path.first() else {
            self.expression_error(expr.range.start, expr.range.end, "$import requires an import alias");
            return None;
        };
        let directives = self.input.directives;
        let Some(decl) = directives.imports.get(&alias.text) else {
            let range = &alias.range.absolute;
            self.expression_error(
                range.start,
                range.end,
                format!("unknown import alias '{}'", alias.text),
            );
            return None;
        };

        let mut defaults = Params::new();
        for kv in &decl.defaults {
            if let Some(value) = &kv.value {
                let value = self.evaluate_argument(value);
                defaults.insert(kv.key.text.clone(), value);
            }
        }
        let call = self.evaluate_arguments(expr);
        let params = defaults.merged_with(&call);

        let from = self.input.path;
        match self.host.resolve_import(from, &decl.path, params) {
            Ok(document) => {
                self.add_import_errors(document.diagnostics());
                let rest = Self::segments(&expr.path[1..]);
                if rest.is_empty() {
                    return Some(document.value.clone());
                }
                match traverse_value(&document.full, &rest) {
                    Ok(value) => Some(value),
                    Err(message) => {
                        self.expression_error(expr.range.start, expr.range.end, message);
                        None
                    }
                }
            }
            Err(diagnostic) => {
                let span = self.span(expr.range.start, expr.range.end);
                let diagnostic = diagnostic
                    .with_span(span)
                    .with_filename(directives.filename.as_deref());
                self.errors.push(diagnostic);
                None
            }
        }
    }

    fn eval_variable(&mut self, expr: &Expression, local: bool) -> Option<Value> {
        let kind = if local { "$local" } else { "$param" };
        let Some(alias) = expr.path.first() else {
            self.expression_error(
                expr.range.start,
                expr.range.end,
                format!("{} requires an alias", kind),
            );
            return None;
        };

        let directives = self.input.directives;
        let table = if local {
            &directives.locals
        } else {
            &directives.params
        };
        let Some(decl) = table.get(&alias.text) else {
            let range = &alias.range.absolute;
            self.expression_error(
                range.start,
                range.end,
                format!("unknown {} alias '{}'", kind, alias.text),
            );
            return None;
        };

        let bound = if local {
            self.locals.lookup(&alias.text).cloned()
        } else {
            self.input.params.get(&alias.text).cloned()
        };
        let value = bound.unwrap_or_else(|| decl.default.clone());

        if let Some(ty) = decl.declared_type {
            if !value.is_null() && !ty.matches(&value) {
                self.expression_error(
                    expr.range.start,
                    expr.range.end,
                    format!(
                        "{} '{}' must be a {}, found {}",
                        kind,
                        alias.text,
                        ty,
                        DeclaredType::of(&value)
                    ),
                );
                return None;
            }
        }

        let rest = Self::segments(&expr.path[1..]);
        if rest.is_empty() {
            return Some(value);
        }
        match traverse_value(&value, &rest) {
            Ok(value) => Some(value),
            Err(message) => {
                self.expression_error(expr.range.start, expr.range.end, message);
                None
            }
        }
    }
}
