//! Resolver core: tree walk and node state

use std::collections::HashMap;
use std::path::Path;

use super::host::ImportHost;
use super::output::ResolvedDocument;
use super::private::remove_private;
use super::stringify::value_to_text;
use crate::features::directives::{DirectiveTable, CORE_TAG_PREFIX};
use crate::features::syntax::{
    coerce_core_tag, plain_scalar_value, NodeId, NodeKind, ScalarStyle, SyntaxTree,
};
use crate::features::tags::TagRegistry;
use crate::features::tokenizer::is_free_expression;
use crate::shared::models::{DeclaredType, Diagnostic, DiagnosticKind, Mapping, Params, Span, Value};
use crate::shared::utils::LocalsStack;

/// Nested template calls allowed before a call is reported as runaway
pub(crate) const MAX_CALL_DEPTH: usize = 64;

/// Resolution state of one node in the current pass
#[derive(Debug, Clone, PartialEq)]
pub enum NodeState {
    Unresolved,
    InProgress,
    Resolved(Value),
}

/// Everything one resolve pass reads
pub struct ResolveInput<'a> {
    pub path: &'a Path,
    pub source: &'a str,
    pub tree: &'a SyntaxTree,
    pub directives: &'a DirectiveTable,
    /// Diagnostics already found by the directive processor and the parser
    pub diagnostics: &'a [Diagnostic],
    pub params: &'a Params,
    pub tags: &'a TagRegistry,
    pub ignore_tags: bool,
    pub filter_private: bool,
}

pub struct Resolver<'a> {
    pub(crate) input: ResolveInput<'a>,
    pub(crate) host: &'a mut dyn ImportHost,
    pub(crate) states: Vec<NodeState>,
    pub(crate) locals: LocalsStack,
    /// Values computed during template calls, never written to `states`
    pub(crate) scratch: HashMap<NodeId, Value>,
    /// > 0 while evaluating a template call
    pub(crate) transient: usize,
    pub(crate) errors: Vec<Diagnostic>,
    pub(crate) import_errors: Vec<Diagnostic>,
}

/// Resolve one document: tree walk, expression evaluation, private
/// filtering.
pub fn resolve_document(input: ResolveInput<'_>, host: &mut dyn ImportHost) -> ResolvedDocument {
    Resolver::new(input, host).run()
}

impl<'a> Resolver<'a> {
    pub fn new(input: ResolveInput<'a>, host: &'a mut dyn ImportHost) -> Self {
        let states = vec![NodeState::Unresolved; input.tree.len()];
        Self {
            errors: input.diagnostics.to_vec(),
            input,
            host,
            states,
            locals: LocalsStack::new(),
            scratch: HashMap::new(),
            transient: 0,
            import_errors: Vec::new(),
        }
    }

    pub fn run(mut self) -> ResolvedDocument {
        let full = match self.input.tree.root {
            Some(root) => self.resolve_node(root),
            None => Value::Null,
        };

        let mut value = full.clone();
        if self.input.filter_private {
            remove_private(&mut value, &self.input.directives.private);
        }

        ResolvedDocument {
            path: self.input.path.to_path_buf(),
            filename: self.input.directives.filename.clone(),
            value,
            full,
            errors: self.errors,
            import_errors: self.import_errors,
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Diagnostics
    // ═══════════════════════════════════════════════════════════════════

    pub(crate) fn span(&self, start: usize, end: usize) -> Span {
        Span::locate(self.input.source, start, end)
    }

    pub(crate) fn report(&mut self, kind: DiagnosticKind, span: Span, message: impl Into<String>) {
        let diagnostic = Diagnostic::new(kind, self.input.path, message)
            .with_span(span)
            .with_filename(self.input.directives.filename.as_deref());
        self.errors.push(diagnostic);
    }

    pub(crate) fn expression_error(&mut self, start: usize, end: usize, message: impl Into<String>) {
        let span = self.span(start, end);
        self.report(DiagnosticKind::Expression, span, message);
    }

    /// Imported diagnostics are kept once each
    pub(crate) fn add_import_errors<'d>(&mut self, diagnostics: impl Iterator<Item = &'d Diagnostic>) {
        for diagnostic in diagnostics {
            if !self.import_errors.contains(diagnostic) {
                self.import_errors.push(diagnostic.clone());
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Node walk
    // ═══════════════════════════════════════════════════════════════════

    /// Value already computed for `id` in this pass (template scratch first)
    pub(crate) fn known_value(&self, id: NodeId) -> Option<Value> {
        if let Some(value) = self.scratch.get(&id) {
            return Some(value.clone());
        }
        match &self.states[id] {
            NodeState::Resolved(value) => Some(value.clone()),
            _ => None,
        }
    }

    pub(crate) fn resolve_node(&mut self, id: NodeId) -> Value {
        if self.transient == 0 {
            if let NodeState::Resolved(value) = &self.states[id] {
                return value.clone();
            }
            self.states[id] = NodeState::InProgress;
        }

        let tree = self.input.tree;
        let value = match &tree.node(id).kind {
            NodeKind::Scalar { .. } => self.resolve_scalar(id),
            NodeKind::Alias { target, name } => self.resolve_alias(id, *target, name),
            NodeKind::Mapping { entries, flow } => self.resolve_mapping(id, entries, *flow),
            NodeKind::Sequence { items, flow } => self.resolve_sequence(id, items, *flow),
        };
        let value = self.apply_tag(id, value);

        if self.transient == 0 {
            self.states[id] = NodeState::Resolved(value.clone());
        } else {
            self.scratch.insert(id, value.clone());
        }
        value
    }

    /// Resolve `id` unless it is still being resolved (a self-reference).
    pub(crate) fn resolve_on_demand(&mut self, id: NodeId) -> Result<Value, String> {
        if let Some(value) = self.known_value(id) {
            return Ok(value);
        }
        if self.states[id] == NodeState::InProgress {
            return Err("self-reference: the target is still being resolved".to_string());
        }
        Ok(self.resolve_node(id))
    }

    fn resolve_alias(&mut self, id: NodeId, target: Option<NodeId>, name: &str) -> Value {
        if let Some(value) = target.and_then(|t| self.known_value(t)) {
            return value;
        }
        let span = self.input.tree.node(id).span;
        self.report(
            DiagnosticKind::Expression,
            span,
            format!("alias '*{}' is accessed before its anchor is defined", name),
        );
        Value::Null
    }

    /// Core tag suffix (`str`, `int`, ...) of a node, if tagged with one
    fn core_tag(&self, id: NodeId) -> Option<String> {
        let tag = self.input.tree.node(id).tag.as_ref()?;
        let full = self.input.directives.expand_tag(&tag.handle, &tag.suffix);
        full.strip_prefix(CORE_TAG_PREFIX).map(str::to_string)
    }

    fn resolve_scalar(&mut self, id: NodeId) -> Value {
        let tree = self.input.tree;
        let NodeKind::Scalar {
            value: raw,
            style,
            content_offset,
        } = &tree.node(id).kind
        else {
            return Value::Null;
        };

        if raw.contains('$') {
            return self.evaluate_fragment(raw, *content_offset, false);
        }
        if *style != ScalarStyle::Plain || self.core_tag(id).is_some() {
            return Value::String(raw.clone());
        }
        plain_scalar_value(raw)
    }

    /// `{ $expr }`: a single-entry flow mapping whose key is an expression
    /// and whose value is empty
    fn wrapped_map_expression(&self, entries: &[(NodeId, NodeId)], flow: bool) -> Option<NodeId> {
        let [(key, value)] = entries else {
            return None;
        };
        if !flow || !self.is_empty_scalar(*value) {
            return None;
        }
        self.is_expression_scalar(*key).then_some(*key)
    }

    /// `[ $expr ]`
    fn wrapped_seq_expression(&self, items: &[NodeId], flow: bool) -> Option<NodeId> {
        let [item] = items else {
            return None;
        };
        (flow && self.is_expression_scalar(*item)).then_some(*item)
    }

    fn is_empty_scalar(&self, id: NodeId) -> bool {
        let node = self.input.tree.node(id);
        node.tag.is_none()
            && matches!(
                &node.kind,
                NodeKind::Scalar { value, style: ScalarStyle::Plain, .. }
                    if matches!(value.as_str(), "" | "~" | "null")
            )
    }

    fn is_expression_scalar(&self, id: NodeId) -> bool {
        self.input
            .tree
            .scalar(id)
            .map(is_free_expression)
            .unwrap_or(false)
    }

    fn resolve_wrapped(&mut self, expr: NodeId, expected: DeclaredType) -> Value {
        let value = self.resolve_node(expr);
        if expected.matches(&value) {
            return value;
        }
        let span = self.input.tree.node(expr).span;
        self.report(
            DiagnosticKind::Expression,
            span,
            format!(
                "expression must produce a {}, found {}",
                expected,
                DeclaredType::of(&value)
            ),
        );
        Value::Null
    }

    fn resolve_mapping(&mut self, _id: NodeId, entries: &[(NodeId, NodeId)], flow: bool) -> Value {
        if let Some(expr) = self.wrapped_map_expression(entries, flow) {
            return self.resolve_wrapped(expr, DeclaredType::Map);
        }

        let mut map = Mapping::new();
        for (key, value) in entries {
            let key = self.resolve_node(*key);
            let value = self.resolve_node(*value);
            map.insert(Value::String(value_to_text(&key)), value);
        }
        Value::Mapping(map)
    }

    fn resolve_sequence(&mut self, _id: NodeId, items: &[NodeId], flow: bool) -> Value {
        if let Some(expr) = self.wrapped_seq_expression(items, flow) {
            return self.resolve_wrapped(expr, DeclaredType::Seq);
        }
        Value::Sequence(items.iter().map(|item| self.resolve_node(*item)).collect())
    }

    /// A failing tag keeps the value computed before the tag.
    fn apply_tag(&mut self, id: NodeId, value: Value) -> Value {
        let tree = self.input.tree;
        let node = tree.node(id);
        let Some(tag) = &node.tag else {
            return value;
        };
        let span = node.span;
        let full = self.input.directives.expand_tag(&tag.handle, &tag.suffix);

        if let Some(suffix) = full.strip_prefix(CORE_TAG_PREFIX) {
            return match coerce_core_tag(suffix, value.clone()) {
                Some(Ok(coerced)) => coerced,
                Some(Err(message)) => {
                    self.report(DiagnosticKind::Tag, span, message);
                    value
                }
                None => {
                    self.report(DiagnosticKind::Tag, span, format!("unknown tag {}", full));
                    value
                }
            };
        }
        if full == "!" || self.input.ignore_tags {
            return value;
        }

        match self.input.tags.apply(&full, value.clone()) {
            Some(Ok(constructed)) => constructed,
            Some(Err(message)) => {
                self.report(DiagnosticKind::Tag, span, message);
                value
            }
            None => {
                self.report(DiagnosticKind::Tag, span, format!("unknown tag {}", full));
                value
            }
        }
    }
}
