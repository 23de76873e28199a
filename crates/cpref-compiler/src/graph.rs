use std::collections::HashMap;
use std::hash::Hash;

pub type NodeId = u32;

/// A directed graph over arbitrary hashable vertices, used to prove the
/// absence of preference cycles.
#[derive(Debug, Clone)]
pub struct ConsistencyGraph<V> {
    pub nodes: Vec<V>,
    pub edges: Vec<(NodeId, NodeId)>,
    index: HashMap<V, NodeId>,
    successors: Vec<Vec<NodeId>>,
}

impl<V: Hash + Eq + Clone> ConsistencyGraph<V> {
    pub fn new() -> Self {
        ConsistencyGraph {
            nodes: Vec::new(),
            edges: Vec::new(),
            index: HashMap::new(),
            successors: Vec::new(),
        }
    }

    /// Returns the id of `vertex`, inserting it on first sight.
    pub fn add_node(&mut self, vertex: V) -> NodeId {
        if let Some(&id) = self.index.get(&vertex) {
            return id;
        }
        let id = self.nodes.len() as NodeId;
        self.nodes.push(vertex.clone());
        self.index.insert(vertex, id);
        self.successors.push(Vec::new());
        id
    }

    pub fn add_edge(&mut self, from: V, to: V) {
        let from = self.add_node(from);
        let to = self.add_node(to);
        if !self.successors[from as usize].contains(&to) {
            self.successors[from as usize].push(to);
            self.edges.push((from, to));
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_acyclic(&self) -> bool {
        self.cyclic_vertex().is_none()
    }

    /// The first vertex, in insertion order, that can reach itself.
    pub fn cyclic_vertex(&self) -> Option<&V> {
        (0..self.nodes.len() as NodeId)
            .find(|&id| self.reaches(id, id))
            .map(|id| &self.nodes[id as usize])
    }

    /// Depth-first search for a non-empty path from `from` to `to`.
    fn reaches(&self, from: NodeId, to: NodeId) -> bool {
        let mut visited = vec![false; self.nodes.len()];
        let mut stack: Vec<NodeId> = self.successors[from as usize].clone();
        while let Some(id) = stack.pop() {
            if id == to {
                return true;
            }
            if std::mem::replace(&mut visited[id as usize], true) {
                continue;
            }
            stack.extend(&self.successors[id as usize]);
        }
        false
    }
}

impl<V: Hash + Eq + Clone> Default for ConsistencyGraph<V> {
    fn default() -> Self {
        Self::new()
    }
}
