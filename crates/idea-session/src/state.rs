//! Untyped state snapshots as a closed node graph.
//!
//! Nodes live in an arena and refer to their children by `NodeId`, so the
//! same node may be reachable from several parents and a child may point back
//! at an ancestor. Snapshots decoded from JSON are always trees; shared and
//! cyclic shapes come from `StateGraph::push` and `StateGraph::attach`.

/// Index of a node inside a `StateGraph`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// One node of a state snapshot.
#[derive(Clone, Debug, PartialEq)]
pub enum StateNode {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    Array(Vec<NodeId>),
    /// Entries in their original key order.
    Object(Vec<(String, NodeId)>),
}

/// Arena-backed snapshot with a single root.
#[derive(Clone, Debug)]
pub struct StateGraph {
    nodes: Vec<StateNode>,
    root: NodeId,
}

impl StateGraph {
    /// Creates a graph whose root is `root`.
    pub fn new(root: StateNode) -> Self {
        Self {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    /// Decodes a JSON value, preserving object key order.
    pub fn from_json(value: &serde_json::Value) -> Self {
        let mut graph = Self::new(StateNode::Null);
        let root = graph.insert_json(value);
        graph.root = root;
        graph
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&StateNode> {
        self.nodes.get(id.0)
    }

    /// Adds a detached node and returns its id.
    pub fn push(&mut self, node: StateNode) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Links `child` under `parent`.
    ///
    /// Objects receive the child under `key`; arrays append it and ignore the
    /// key. Returns `false` when `parent` is missing or not a container.
    pub fn attach(&mut self, parent: NodeId, key: impl Into<String>, child: NodeId) -> bool {
        match self.nodes.get_mut(parent.0) {
            Some(StateNode::Object(entries)) => {
                entries.push((key.into(), child));
                true
            }
            Some(StateNode::Array(items)) => {
                items.push(child);
                true
            }
            _ => false,
        }
    }

    /// Returns the value stored under `key` when `id` is an object.
    pub fn field(&self, id: NodeId, key: &str) -> Option<&StateNode> {
        match self.get(id)? {
            StateNode::Object(entries) => entries
                .iter()
                .find(|(k, _)| k == key)
                .and_then(|(_, child)| self.get(*child)),
            _ => None,
        }
    }

    /// Returns the string stored under `key` when `id` is an object.
    pub fn str_field(&self, id: NodeId, key: &str) -> Option<&str> {
        match self.field(id, key)? {
            StateNode::String(s) => Some(s),
            _ => None,
        }
    }

    fn insert_json(&mut self, value: &serde_json::Value) -> NodeId {
        let node = match value {
            serde_json::Value::Null => StateNode::Null,
            serde_json::Value::Bool(b) => StateNode::Bool(*b),
            serde_json::Value::Number(n) => StateNode::Number(n.clone()),
            serde_json::Value::String(s) => StateNode::String(s.clone()),
            serde_json::Value::Array(items) => {
                StateNode::Array(items.iter().map(|item| self.insert_json(item)).collect())
            }
            serde_json::Value::Object(map) => StateNode::Object(
                map.iter()
                    .map(|(key, item)| (key.clone(), self.insert_json(item)))
                    .collect(),
            ),
        };
        self.push(node)
    }
}
