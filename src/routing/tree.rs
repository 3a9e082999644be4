//! Arena-backed routing tree.
//!
//! Nodes live in one `Vec` and refer to their children by [`NodeId`]. A tree
//! is immutable once built and is shared behind an `Arc` between requests.

use std::fmt;
use std::sync::Arc;

use crate::model::{Resource, ResourceMethod};
use crate::uri::{PathPattern, UriTemplate};

use super::method::MethodRouter;

/// Index of a node in its [`RoutingTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// What a node does once its pattern matched.
#[derive(Debug, Clone)]
pub enum Terminal {
    /// Select a resource method when the path is fully consumed.
    Methods(MethodRouter),
    /// Invoke a sub-resource locator when no child matches the rest of the path.
    Locator(Arc<ResourceMethod>),
}

/// The resources sharing one path template at one level of the tree.
///
/// Usually a single resource; several when sibling resources with the same
/// template are merged.
#[derive(Debug)]
pub struct RuntimeResource {
    template: UriTemplate,
    resources: Vec<Arc<Resource>>,
}

impl RuntimeResource {
    pub fn new(template: UriTemplate, resources: Vec<Arc<Resource>>) -> Self {
        Self { template, resources }
    }

    pub fn template(&self) -> &UriTemplate {
        &self.template
    }

    pub fn resources(&self) -> &[Arc<Resource>] {
        &self.resources
    }

    /// Name of the first resource.
    pub fn name(&self) -> &str {
        self.resources.first().map(|r| r.name()).unwrap_or_default()
    }
}

#[derive(Debug)]
pub struct RouterNode {
    pattern: PathPattern,
    children: Vec<NodeId>,
    terminal: Option<Terminal>,
    resource: Option<Arc<RuntimeResource>>,
}

impl RouterNode {
    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    /// Children in registration order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn terminal(&self) -> Option<&Terminal> {
        self.terminal.as_ref()
    }

    /// The runtime resource this node represents, if it is a resource node.
    pub fn resource(&self) -> Option<&Arc<RuntimeResource>> {
        self.resource.as_ref()
    }
}

/// A tree of path-pattern guarded nodes.
///
/// ```
/// use jersey_router::routing::RoutingTree;
/// use jersey_router::uri::PathPattern;
///
/// let mut tree = RoutingTree::new();
/// let a = tree.add_node(PathPattern::new("a").unwrap());
/// let b = tree.add_node(PathPattern::new("b").unwrap());
/// tree.add_root(a);
/// tree.add_child(a, b);
/// assert_eq!(tree.node(a).children(), &[b]);
/// ```
#[derive(Default)]
pub struct RoutingTree {
    nodes: Vec<RouterNode>,
    roots: Vec<NodeId>,
}

impl RoutingTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a detached node.
    pub fn add_node(&mut self, pattern: PathPattern) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(RouterNode {
            pattern,
            children: Vec::new(),
            terminal: None,
            resource: None,
        });
        id
    }

    pub fn add_root(&mut self, node: NodeId) {
        self.roots.push(node);
    }

    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.0].children.push(child);
    }

    pub fn set_terminal(&mut self, node: NodeId, terminal: Terminal) {
        self.nodes[node.0].terminal = Some(terminal);
    }

    pub fn set_resource(&mut self, node: NodeId, resource: Arc<RuntimeResource>) {
        self.nodes[node.0].resource = Some(resource);
    }

    /// # Panics
    ///
    /// When `id` was not allocated by this tree.
    pub fn node(&self, id: NodeId) -> &RouterNode {
        &self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&RouterNode> {
        self.nodes.get(id.0)
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl fmt::Debug for RoutingTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_node(
            tree: &RoutingTree,
            id: NodeId,
            depth: usize,
            f: &mut fmt::Formatter<'_>,
        ) -> fmt::Result {
            let node = tree.node(id);
            let terminal = match node.terminal() {
                Some(Terminal::Methods(router)) => format!(" -> methods {:?}", router.allow()),
                Some(Terminal::Locator(locator)) => format!(" -> locator {}", locator.name()),
                None => String::new(),
            };
            writeln!(f, "{:indent$}{}{}", "", node.pattern(), terminal, indent = depth * 2)?;
            for child in node.children() {
                write_node(tree, *child, depth + 1, f)?;
            }
            Ok(())
        }

        for root in &self.roots {
            write_node(self, *root, 0, f)?;
        }
        Ok(())
    }
}
