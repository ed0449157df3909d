use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;

/// A listener-bearing node an event can travel through.
///
/// Names are `Arc<str>` because nodes come from the static route table and
/// are cloned into every request's path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Node {
    Router(Arc<str>),
    Controller(Arc<str>),
    Action(Arc<str>),
}

impl Node {
    #[must_use]
    pub fn router(name: &str) -> Self {
        Node::Router(Arc::from(name))
    }

    #[must_use]
    pub fn controller(name: &str) -> Self {
        Node::Controller(Arc::from(name))
    }

    #[must_use]
    pub fn action(name: &str) -> Self {
        Node::Action(Arc::from(name))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Node::Router(n) | Node::Controller(n) | Node::Action(n) => n,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Router(n) => write!(f, "router:{n}"),
            Node::Controller(n) => write!(f, "controller:{n}"),
            Node::Action(n) => write!(f, "action:{n}"),
        }
    }
}

/// Ordered node sequence, outermost first.
///
/// For an HTTP request this is `[Router, Controller, Action]`. Most paths
/// have at most four nodes, so they stay on the stack.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropagationPath {
    nodes: SmallVec<[Node; 4]>,
}

impl PropagationPath {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: Node) {
        self.nodes.push(node);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    #[must_use]
    pub fn contains(&self, node: &Node) -> bool {
        self.nodes.contains(node)
    }

    /// Nodes in DOWN order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Node> {
        self.nodes.iter()
    }

    /// The innermost node.
    #[must_use]
    pub fn terminal(&self) -> Option<&Node> {
        self.nodes.last()
    }

    /// The node immediately outside `node`, e.g. the controller of an action.
    #[must_use]
    pub fn prev_node(&self, node: &Node) -> Option<&Node> {
        let index = self.nodes.iter().position(|n| n == node)?;
        index.checked_sub(1).and_then(|i| self.nodes.get(i))
    }
}

impl FromIterator<Node> for PropagationPath {
    fn from_iter<I: IntoIterator<Item = Node>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for PropagationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{node}")?;
        }
        Ok(())
    }
}
