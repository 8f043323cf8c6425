use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashMap, HashSet, VecDeque};

use petgraph::algo::{has_path_connecting, tarjan_scc};
use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;

use crate::error::GraphError;
use crate::types::ObjectId;

/// Directed "depends on" graph over document objects
///
/// An edge `A -> B` means A references B, so B must be executed before A.
/// Edge weights count how many references produce the edge; the OutList of A
/// is its successors and the InList of B is its predecessors, both derived
/// from the same adjacency so they can never disagree.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    inner: DiGraphMap<ObjectId, u32>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, id: ObjectId) {
        self.inner.add_node(id);
    }

    /// Remove a node and every edge touching it, returning its former InList
    pub fn remove_node(&mut self, id: ObjectId) -> Vec<ObjectId> {
        let in_list = self.in_list(id);
        self.inner.remove_node(id);
        in_list
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.inner.contains_node(id)
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Replace every outgoing edge of `id`
    ///
    /// Self references and targets that are not nodes are ignored; repeated
    /// targets raise the edge weight. Returns true if the OutList changed.
    pub fn set_out_edges(
        &mut self,
        id: ObjectId,
        targets: impl IntoIterator<Item = ObjectId>,
    ) -> Result<bool, GraphError> {
        if !self.inner.contains_node(id) {
            return Err(GraphError::NodeNotFound(id));
        }
        let mut counts: HashMap<ObjectId, u32> = HashMap::new();
        for target in targets {
            if target != id && self.inner.contains_node(target) {
                *counts.entry(target).or_default() += 1;
            }
        }

        let before: BTreeSet<ObjectId> = self.out_list(id).into_iter().collect();
        for old in &before {
            self.inner.remove_edge(id, *old);
        }
        for (target, weight) in &counts {
            self.inner.add_edge(id, *target, *weight);
        }
        let after: BTreeSet<ObjectId> = counts.into_keys().collect();
        Ok(before != after)
    }

    /// Objects `id` references, ordered by id
    pub fn out_list(&self, id: ObjectId) -> Vec<ObjectId> {
        self.neighbors(id, Direction::Outgoing)
    }

    /// Objects referencing `id`, ordered by id
    pub fn in_list(&self, id: ObjectId) -> Vec<ObjectId> {
        self.neighbors(id, Direction::Incoming)
    }

    /// Number of references from `from` to `to`
    pub fn edge_weight(&self, from: ObjectId, to: ObjectId) -> u32 {
        self.inner.edge_weight(from, to).copied().unwrap_or(0)
    }

    /// Everything reachable through OutList edges, excluding `id` itself
    pub fn out_list_recursive(&self, id: ObjectId) -> Vec<ObjectId> {
        self.reachable(id, Direction::Outgoing)
    }

    /// Everything reaching `id` through OutList edges, excluding `id` itself
    pub fn in_list_recursive(&self, id: ObjectId) -> Vec<ObjectId> {
        self.reachable(id, Direction::Incoming)
    }

    /// True if `from` depends on `to`, directly or transitively
    pub fn depends_on(&self, from: ObjectId, to: ObjectId) -> bool {
        from != to
            && self.inner.contains_node(from)
            && self.inner.contains_node(to)
            && has_path_connecting(&self.inner, from, to, None)
    }

    /// True if adding an edge `from -> to` would close a cycle
    pub fn would_cycle(&self, from: ObjectId, to: ObjectId) -> bool {
        from != to && self.depends_on(to, from)
    }

    /// Objects nothing depends on, ordered by id
    pub fn roots(&self) -> Vec<ObjectId> {
        let mut roots: Vec<ObjectId> = self
            .inner
            .nodes()
            .filter(|n| {
                self.inner
                    .neighbors_directed(*n, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .collect();
        roots.sort_unstable();
        roots
    }

    /// Members of dependency cycles
    pub fn cyclic_nodes(&self) -> BTreeSet<ObjectId> {
        tarjan_scc(&self.inner)
            .into_iter()
            .filter(|scc| scc.len() > 1)
            .flatten()
            .collect()
    }

    /// Stable topological order over every node
    ///
    /// Dependents come before their dependencies; ties are broken by the
    /// smaller id, which is creation order. When only cycle members (or their
    /// dependencies) remain, the smallest id among the least-constrained nodes
    /// is emitted next, so the result always has one entry per node.
    pub fn topological_order(&self) -> Vec<ObjectId> {
        let mut in_degree: HashMap<ObjectId, usize> = self
            .inner
            .nodes()
            .map(|n| (n, self.in_list(n).len()))
            .collect();
        let mut ready: BinaryHeap<Reverse<ObjectId>> = in_degree
            .iter()
            .filter(|(_, d)| **d == 0)
            .map(|(n, _)| Reverse(*n))
            .collect();
        let mut emitted: HashSet<ObjectId> = HashSet::with_capacity(in_degree.len());
        let mut order = Vec::with_capacity(in_degree.len());

        while order.len() < in_degree.len() {
            let next = match ready.pop() {
                Some(Reverse(n)) => n,
                None => match in_degree
                    .iter()
                    .filter(|(n, _)| !emitted.contains(*n))
                    .min_by_key(|(n, d)| (**d, **n))
                {
                    Some((n, _)) => *n,
                    None => break,
                },
            };
            if !emitted.insert(next) {
                continue;
            }
            order.push(next);
            for succ in self.out_list(next) {
                if emitted.contains(&succ) {
                    continue;
                }
                if let Some(d) = in_degree.get_mut(&succ) {
                    *d = d.saturating_sub(1);
                    if *d == 0 {
                        ready.push(Reverse(succ));
                    }
                }
            }
        }
        order
    }

    /// Topological order that refuses cyclic graphs
    pub fn topological_order_strict(&self) -> Result<Vec<ObjectId>, GraphError> {
        let cyclic = self.cyclic_nodes();
        if cyclic.is_empty() {
            Ok(self.topological_order())
        } else {
            Err(GraphError::CycleDetected(cyclic.into_iter().collect()))
        }
    }

    /// Order in which objects must execute: dependencies first
    pub fn execution_order(&self) -> Vec<ObjectId> {
        let mut order = self.topological_order();
        order.reverse();
        order
    }

    fn neighbors(&self, id: ObjectId, dir: Direction) -> Vec<ObjectId> {
        if !self.inner.contains_node(id) {
            return Vec::new();
        }
        let mut list: Vec<ObjectId> = self.inner.neighbors_directed(id, dir).collect();
        list.sort_unstable();
        list
    }

    fn reachable(&self, id: ObjectId, dir: Direction) -> Vec<ObjectId> {
        let mut visited: BTreeSet<ObjectId> = BTreeSet::new();
        let mut queue: VecDeque<ObjectId> = self.neighbors(id, dir).into();
        while let Some(n) = queue.pop_front() {
            if n == id || !visited.insert(n) {
                continue;
            }
            queue.extend(self.neighbors(n, dir));
        }
        visited.into_iter().collect()
    }
}
