//! Event-stream adapter: builds a [`SyntaxTree`] from `yaml-rust2`'s marked
//! parser events.

use std::collections::HashMap;
use std::path::Path;

use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser, Tag};
use yaml_rust2::scanner::{Marker, TScalarStyle};

use super::node::{NodeId, NodeKind, NodeTag, ScalarStyle, SyntaxNode, SyntaxTree};
use crate::shared::models::{Diagnostic, Span};

/// Upper bound on aliases that refer to anchors defined later in the text
const MAX_FORWARD_ALIASES: usize = 256;

/// Char index -> byte offset table; parser marks count chars.
struct CharIndex {
    offsets: Vec<usize>,
}

impl CharIndex {
    fn new(text: &str) -> Self {
        let mut offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        offsets.push(text.len());
        Self { offsets }
    }

    fn byte(&self, char_index: usize) -> usize {
        self.offsets
            .get(char_index)
            .copied()
            .unwrap_or_else(|| self.offsets.last().copied().unwrap_or(0))
    }
}

fn is_flow_indicator(c: char) -> bool {
    matches!(c, ',' | '[' | ']' | '{' | '}')
}

/// `*name` at `byte`: the alias name and the byte length of the token
fn alias_at(text: &str, byte: usize) -> Option<(String, usize)> {
    let rest = text.get(byte..)?.strip_prefix('*')?;
    let name: String = rest
        .chars()
        .take_while(|c| !c.is_whitespace() && !is_flow_indicator(*c))
        .collect();
    let len = 1 + name.len();
    Some((name, len))
}

/// Skip `&anchor` and `!tag` properties preceding a node
fn skip_properties(text: &str, mut byte: usize) -> usize {
    loop {
        let rest = &text[byte..];
        let trimmed = rest.trim_start_matches([' ', '\t']);
        let skipped = rest.len() - trimmed.len();
        if trimmed.starts_with('&') || trimmed.starts_with('!') {
            let prop = trimmed
                .find(char::is_whitespace)
                .unwrap_or(trimmed.len());
            byte += skipped + prop;
        } else {
            return byte;
        }
    }
}

fn scalar_end(text: &str, start: usize, value: &str, style: ScalarStyle) -> usize {
    let rest = &text[start..];
    let line_end = || start + rest.find('\n').unwrap_or(rest.len());
    match style {
        ScalarStyle::Plain if rest.starts_with(value) => start + value.len(),
        ScalarStyle::SingleQuoted => {
            let mut chars = rest.char_indices().skip(1).peekable();
            while let Some((i, c)) = chars.next() {
                if c == '\'' {
                    if matches!(chars.peek(), Some((_, '\''))) {
                        chars.next();
                    } else {
                        return start + i + 1;
                    }
                }
            }
            start + rest.len()
        }
        ScalarStyle::DoubleQuoted => {
            let mut chars = rest.char_indices().skip(1);
            while let Some((i, c)) = chars.next() {
                match c {
                    '\\' => {
                        chars.next();
                    }
                    '"' => return start + i + 1,
                    _ => {}
                }
            }
            start + rest.len()
        }
        _ => line_end(),
    }
}

fn scalar_style(style: TScalarStyle) -> ScalarStyle {
    match style {
        TScalarStyle::SingleQuoted => ScalarStyle::SingleQuoted,
        TScalarStyle::DoubleQuoted => ScalarStyle::DoubleQuoted,
        TScalarStyle::Literal => ScalarStyle::Literal,
        TScalarStyle::Folded => ScalarStyle::Folded,
        _ => ScalarStyle::Plain,
    }
}

fn node_tag(tag: Option<Tag>) -> Option<NodeTag> {
    tag.map(|t| NodeTag {
        handle: t.handle,
        suffix: t.suffix,
    })
}

struct Frame {
    id: NodeId,
    pending_key: Option<NodeId>,
}

struct TreeBuilder<'a> {
    text: &'a str,
    index: &'a CharIndex,
    /// Placeholders standing in for aliases to later anchors, by byte offset
    forward: &'a HashMap<usize, String>,
    nodes: Vec<SyntaxNode>,
    stack: Vec<Frame>,
    anchors: HashMap<usize, NodeId>,
    root: Option<NodeId>,
}

impl<'a> TreeBuilder<'a> {
    fn new(text: &'a str, index: &'a CharIndex, forward: &'a HashMap<usize, String>) -> Self {
        Self {
            text,
            index,
            forward,
            nodes: Vec::new(),
            stack: Vec::new(),
            anchors: HashMap::new(),
            root: None,
        }
    }

    fn push(&mut self, kind: NodeKind, tag: Option<Tag>, span: Span, anchor: usize) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(SyntaxNode {
            kind,
            tag: node_tag(tag),
            span,
        });
        if anchor > 0 {
            self.anchors.insert(anchor, id);
        }
        self.attach(id);
        id
    }

    fn attach(&mut self, id: NodeId) {
        let Some(frame) = self.stack.last_mut() else {
            if self.root.is_none() {
                self.root = Some(id);
            }
            return;
        };
        match &mut self.nodes[frame.id].kind {
            NodeKind::Sequence { items, .. } => items.push(id),
            NodeKind::Mapping { entries, .. } => match frame.pending_key.take() {
                Some(key) => entries.push((key, id)),
                None => frame.pending_key = Some(id),
            },
            _ => {}
        }
    }

    fn starts_flow(&self, byte: usize, open: char) -> bool {
        let at = skip_properties(self.text, byte);
        self.text[at..].starts_with(open)
    }

    fn finish(self) -> SyntaxTree {
        SyntaxTree {
            nodes: self.nodes,
            root: self.root,
        }
    }
}

impl MarkedEventReceiver for TreeBuilder<'_> {
    fn on_event(&mut self, event: Event, mark: Marker) {
        let start = self.index.byte(mark.index());
        let line = mark.line() as u32;
        let column = mark.col() as u32 + 1;

        match event {
            Event::Scalar(value, style, anchor, tag) => {
                if let Some(name) = self.forward.get(&start) {
                    let span = Span::new(start, start + 1 + name.len(), line, column);
                    let kind = NodeKind::Alias {
                        target: None,
                        name: name.clone(),
                    };
                    self.push(kind, None, span, 0);
                    return;
                }
                let style = scalar_style(style);
                let start = skip_properties(self.text, start);
                let end = scalar_end(self.text, start, &value, style);
                let content_offset = if style.is_quoted() { start + 1 } else { start };
                let kind = NodeKind::Scalar {
                    value,
                    style,
                    content_offset,
                };
                self.push(kind, tag, Span::new(start, end, line, column), anchor);
            }
            Event::Alias(anchor) => {
                let (name, len) = alias_at(self.text, start).unwrap_or_default();
                let kind = NodeKind::Alias {
                    target: self.anchors.get(&anchor).copied(),
                    name,
                };
                self.push(kind, None, Span::new(start, start + len, line, column), 0);
            }
            Event::SequenceStart(anchor, tag) => {
                let kind = NodeKind::Sequence {
                    items: Vec::new(),
                    flow: self.starts_flow(start, '['),
                };
                let id = self.push(kind, tag, Span::new(start, start, line, column), anchor);
                self.stack.push(Frame {
                    id,
                    pending_key: None,
                });
            }
            Event::MappingStart(anchor, tag) => {
                let kind = NodeKind::Mapping {
                    entries: Vec::new(),
                    flow: self.starts_flow(start, '{'),
                };
                let id = self.push(kind, tag, Span::new(start, start, line, column), anchor);
                self.stack.push(Frame {
                    id,
                    pending_key: None,
                });
            }
            Event::SequenceEnd | Event::MappingEnd => {
                if let Some(frame) = self.stack.pop() {
                    let node = &mut self.nodes[frame.id];
                    let flow = matches!(
                        node.kind,
                        NodeKind::Mapping { flow: true, .. } | NodeKind::Sequence { flow: true, .. }
                    );
                    let end = if flow { start + 1 } else { start };
                    node.span.end = end.max(node.span.start);
                }
            }
            _ => {}
        }
    }
}

/// Parse the first document of `text` into an arena.
///
/// Aliases whose anchor appears later in the text are kept as unresolved
/// alias nodes instead of failing the parse. Any other parser error yields
/// an empty tree and a `Parse` diagnostic.
pub fn load_tree(path: &Path, text: &str) -> (SyntaxTree, Vec<Diagnostic>) {
    let mut text = text.to_string();
    let mut forward: HashMap<usize, String> = HashMap::new();

    loop {
        let index = CharIndex::new(&text);
        let outcome = {
            let mut builder = TreeBuilder::new(&text, &index, &forward);
            let mut parser = Parser::new(text.chars());
            match parser.load(&mut builder, false) {
                Ok(()) => Ok(builder.finish()),
                Err(err) => Err(err),
            }
        };

        let err = match outcome {
            Ok(tree) => return (tree, Vec::new()),
            Err(err) => err,
        };

        let marker = err.marker();
        let byte = index.byte(marker.index());
        let message = err.to_string();
        if message.contains("unknown anchor") && forward.len() < MAX_FORWARD_ALIASES {
            if let Some((name, len)) = alias_at(&text, byte) {
                if !forward.contains_key(&byte) {
                    let placeholder = format!("~{}", " ".repeat(len - 1));
                    text.replace_range(byte..byte + len, &placeholder);
                    forward.insert(byte, name);
                    continue;
                }
            }
        }

        let span = Span::new(byte, byte, marker.line() as u32, marker.col() as u32 + 1);
        tracing::debug!(path = %path.display(), error = %message, "YAML parse failed");
        return (
            SyntaxTree::default(),
            vec![Diagnostic::parse(path, message).with_span(span)],
        );
    }
}
