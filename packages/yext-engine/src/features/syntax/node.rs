//! Syntax tree arena

use crate::shared::models::Span;

/// Index into [`SyntaxTree::nodes`]
pub type NodeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarStyle {
    Plain,
    SingleQuoted,
    DoubleQuoted,
    Literal,
    Folded,
}

impl ScalarStyle {
    pub fn is_quoted(&self) -> bool {
        matches!(self, ScalarStyle::SingleQuoted | ScalarStyle::DoubleQuoted)
    }
}

/// Tag as written: handle plus suffix, expanded against the directive table
/// by the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeTag {
    pub handle: String,
    pub suffix: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Scalar {
        value: String,
        style: ScalarStyle,
        /// Absolute offset of the first content character (after an opening
        /// quote), used to place expression diagnostics.
        content_offset: usize,
    },
    Mapping {
        entries: Vec<(NodeId, NodeId)>,
        flow: bool,
    },
    Sequence {
        items: Vec<NodeId>,
        flow: bool,
    },
    /// Back-reference to an anchored node. `target` is `None` when the
    /// anchor is not defined before the alias.
    Alias {
        target: Option<NodeId>,
        name: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxNode {
    pub kind: NodeKind,
    pub tag: Option<NodeTag>,
    pub span: Span,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyntaxTree {
    pub nodes: Vec<SyntaxNode>,
    pub root: Option<NodeId>,
}

impl SyntaxTree {
    pub fn node(&self, id: NodeId) -> &SyntaxNode {
        &self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Value of a scalar node, if it is one
    pub fn scalar(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id].kind {
            NodeKind::Scalar { value, .. } => Some(value),
            _ => None,
        }
    }
}
