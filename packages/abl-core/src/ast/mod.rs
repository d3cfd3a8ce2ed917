//! Syntax tree of a compilation unit, stored as an arena of nodes.

pub mod attr;
pub mod node_type;

use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Index of a node in its [`Ast`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// One syntax node.
///
/// Links to other nodes are arena indexes. `text` is `None` for nodes whose
/// text is the default text of their type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    /// Node class index assigned by the parser, 0 for plain nodes
    pub subtype: i32,
    pub node_type: i32,
    pub file_index: i16,
    pub line: i32,
    pub column: i16,
    /// Position of the node's token in the macro event source array
    pub source_index: i32,
    pub text: Option<String>,
    pub comments: Option<String>,
    /// Text after `&ANALYZE-SUSPEND`-style directives
    pub directive_text: Option<String>,
    /// Resolved class of a type name node
    pub qualified_class: Option<String>,
    attrs: BTreeMap<i32, i32>,
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    last_child: Option<NodeId>,
    next_sibling: Option<NodeId>,
}

impl Node {
    pub fn new(node_type: i32) -> Self {
        Self {
            node_type,
            ..Default::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn at(mut self, file_index: i16, line: i32, column: i16) -> Self {
        self.file_index = file_index;
        self.line = line;
        self.column = column;
        self
    }

    /// The node's text, falling back to the default text of its type.
    pub fn text(&self) -> &str {
        self.text
            .as_deref()
            .or_else(|| node_type::default_text(self.node_type))
            .unwrap_or("")
    }

    /// Returns an attribute value, 0 when unset.
    pub fn attr(&self, key: i32) -> i32 {
        self.attrs.get(&key).copied().unwrap_or(0)
    }

    pub fn set_attr(&mut self, key: i32, value: i32) {
        self.attrs.insert(key, value);
    }

    pub(crate) fn take_attr(&mut self, key: i32) -> Option<i32> {
        self.attrs.remove(&key)
    }

    /// Attributes in key order.
    pub fn attrs(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.attrs.iter().map(|(&k, &v)| (k, v))
    }

    pub fn is_state_head(&self) -> bool {
        self.attr(attr::STATEHEAD) == attr::TRUE
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn first_child(&self) -> Option<NodeId> {
        self.first_child
    }

    pub fn next_sibling(&self) -> Option<NodeId> {
        self.next_sibling
    }
}

/// Arena holding every node of one tree. The root is always node 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ast {
    nodes: Vec<Node>,
    file_names: Vec<String>,
}

impl Ast {
    /// Creates a tree containing only `root`.
    pub fn new(root: Node) -> Self {
        Self {
            nodes: vec![root],
            file_names: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Names of the files the tree's file indexes refer to.
    pub fn file_names(&self) -> &[String] {
        &self.file_names
    }

    pub fn set_file_names(&mut self, names: Vec<String>) {
        self.file_names = names;
    }

    /// Appends `node` as the last child of `parent`.
    pub fn add_child(&mut self, parent: NodeId, mut node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        node.parent = Some(parent);
        node.first_child = None;
        node.last_child = None;
        node.next_sibling = None;
        self.nodes.push(node);
        match self.nodes[parent.0].last_child.replace(id) {
            Some(prev) => self.nodes[prev.0].next_sibling = Some(id),
            None => self.nodes[parent.0].first_child = Some(id),
        }
        id
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.node(id).first_child, move |&c| self.node(c).next_sibling)
    }

    /// Every node below and including `from`, in pre-order.
    pub fn descendants(&self, from: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            out.push(id);
            let children: Vec<NodeId> = self.children(id).collect();
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// Indented listing of the tree, one node per line.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let mut stack = vec![(self.root(), 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let node = self.node(id);
            let name = node_type::type_name(node.node_type).unwrap_or("?");
            let _ = writeln!(
                out,
                "{:indent$}{} \"{}\" {}:{}:{}",
                "",
                name,
                node.text(),
                node.file_index,
                node.line,
                node.column,
                indent = depth * 2
            );
            let children: Vec<NodeId> = self.children(id).collect();
            stack.extend(children.into_iter().rev().map(|c| (c, depth + 1)));
        }
        out
    }
}
