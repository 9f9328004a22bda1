/// Typed syntax tree for one Python source file.
///
/// Nodes live in a single arena owned by [`SourceUnit`] and refer to each
/// other by [`NodeId`]. Parent links are not stored; traversal keeps whatever
/// context it needs on its own stack.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// 1-based source position of a node's first character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// A constant `str`, already unescaped and concatenated
    Str(String),
    /// Any other constant (numbers, bytes, booleans, `None`), kept as source text
    Other(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Module {
        body: Vec<NodeId>,
    },
    /// `import a.b as c, d` -> modules `["a.b", "d"]`
    Import {
        modules: Vec<String>,
    },
    /// `from m import x, y` -> module `m`, names `["x", "y"]`
    ImportFrom {
        module: String,
        names: Vec<String>,
    },
    /// `a = b = value` keeps every target in source order
    Assign {
        targets: Vec<NodeId>,
        value: NodeId,
    },
    Call {
        func: NodeId,
        args: Vec<NodeId>,
        keywords: Vec<NodeId>,
    },
    /// Keyword argument; `arg` is `None` for `**kwargs`
    Keyword {
        arg: Option<String>,
        value: NodeId,
    },
    Attribute {
        value: NodeId,
        attr: String,
    },
    Name(String),
    Literal(Literal),
    /// Every construct the extractor does not look into directly
    Other {
        kind: String,
        children: Vec<NodeId>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxNode {
    pub kind: NodeKind,
    pub position: Position,
}

#[derive(Debug, Clone)]
pub struct SourceUnit {
    nodes: Vec<SyntaxNode>,
    root: NodeId,
}

impl SourceUnit {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &SyntaxNode {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Top-level statements of the module
    pub fn body(&self) -> &[NodeId] {
        match self.kind(self.root) {
            NodeKind::Module { body } => body,
            _ => &[],
        }
    }

    /// Direct children in source order
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        match self.kind(id) {
            NodeKind::Module { body } => body.clone(),
            NodeKind::Import { .. } | NodeKind::ImportFrom { .. } => Vec::new(),
            NodeKind::Assign { targets, value } => {
                let mut children = targets.clone();
                children.push(*value);
                children
            }
            NodeKind::Call {
                func,
                args,
                keywords,
            } => {
                let mut children = Vec::with_capacity(1 + args.len() + keywords.len());
                children.push(*func);
                children.extend(args);
                children.extend(keywords);
                children
            }
            NodeKind::Keyword { value, .. } => vec![*value],
            NodeKind::Attribute { value, .. } => vec![*value],
            NodeKind::Name(_) | NodeKind::Literal(_) => Vec::new(),
            NodeKind::Other { children, .. } => children.clone(),
        }
    }

    /// Depth-first pre-order walk over every node reachable from the root
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            unit: self,
            stack: vec![self.root],
        }
    }

    /// Constant string value of a literal node, if it is one
    pub fn string_value(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Literal(Literal::Str(value)) => Some(value),
            _ => None,
        }
    }
}

pub struct Walk<'a> {
    unit: &'a SourceUnit,
    stack: Vec<NodeId>,
}

impl Iterator for Walk<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        let children = self.unit.children(id);
        self.stack.extend(children.into_iter().rev());
        Some(id)
    }
}

/// Appends nodes while lowering; children are pushed before their parents,
/// so the root is whatever id the builder returns last.
#[derive(Default)]
pub(crate) struct ArenaBuilder {
    nodes: Vec<SyntaxNode>,
}

impl ArenaBuilder {
    pub(crate) fn push(&mut self, kind: NodeKind, position: Position) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(SyntaxNode { kind, position });
        id
    }

    pub(crate) fn finish(self, root: NodeId) -> SourceUnit {
        SourceUnit {
            nodes: self.nodes,
            root,
        }
    }
}
