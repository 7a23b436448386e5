//! Knowledge Model - The shared, deduplicating graph built during a scan
//!
//! Nodes are keyed by [`EntityKey`]; edges are keyed by `(source, target, kind)`.
//! Both only ever grow. The model is shared by every walker of a scan, so all
//! mutation goes through one coarse lock that makes get-or-insert atomic.

use crate::edge::{Confidence, Edge, EdgeKind};
use crate::entity::Entity;
use crate::identity::{EntityKey, EntityKind};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Opaque handle to a node of one [`KnowledgeModel`].
///
/// Handles are only meaningful for the model that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeHandle(usize);

#[derive(Debug, Default)]
struct Inner {
    nodes: Vec<Entity>,
    index: HashMap<EntityKey, NodeHandle>,
    edges: HashMap<(NodeHandle, NodeHandle, EdgeKind), Confidence>,
}

impl Inner {
    fn insert_or_get(&mut self, entity: Entity) -> NodeHandle {
        if let Some(&handle) = self.index.get(&entity.key) {
            self.nodes[handle.0].merge(&entity);
            return handle;
        }
        let handle = NodeHandle(self.nodes.len());
        self.index.insert(entity.key.clone(), handle);
        self.nodes.push(entity);
        handle
    }
}

/// Append-only graph of declarations and their relationships.
#[derive(Debug, Default)]
pub struct KnowledgeModel {
    inner: Mutex<Inner>,
}

impl KnowledgeModel {
    /// Create a new empty model
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node, or merge its attributes into the existing node with the same key.
    pub fn insert_or_get_node(&self, entity: Entity) -> NodeHandle {
        self.inner.lock().insert_or_get(entity)
    }

    /// Handle of the synthetic root for unscoped calls, created on first use.
    pub fn unscoped_root(&self) -> NodeHandle {
        self.insert_or_get_node(Entity::referenced(EntityKey::unscoped_root()))
    }

    /// Record an edge.
    ///
    /// Returns true if the `(source, target, kind)` triple was new. Repeated
    /// observations keep the highest confidence seen.
    pub fn insert_edge(
        &self,
        source: NodeHandle,
        target: NodeHandle,
        kind: EdgeKind,
        confidence: Confidence,
    ) -> bool {
        let mut inner = self.inner.lock();
        debug_assert!(source.0 < inner.nodes.len() && target.0 < inner.nodes.len());
        match inner.edges.get_mut(&(source, target, kind)) {
            Some(existing) => {
                *existing = (*existing).max(confidence);
                false
            }
            None => {
                inner.edges.insert((source, target, kind), confidence);
                true
            }
        }
    }

    /// Insert the target node, then the edge pointing at it.
    pub fn record(
        &self,
        source: NodeHandle,
        target: Entity,
        kind: EdgeKind,
        confidence: Confidence,
    ) -> NodeHandle {
        let target = self.insert_or_get_node(target);
        self.insert_edge(source, target, kind, confidence);
        target
    }

    /// Key of the node behind a handle
    pub fn key(&self, handle: NodeHandle) -> Option<EntityKey> {
        self.inner.lock().nodes.get(handle.0).map(|e| e.key.clone())
    }

    pub fn node_count(&self) -> usize {
        self.inner.lock().nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.lock().edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_count() == 0
    }

    /// Sorted, read-only copy of the model for serialization.
    pub fn snapshot(&self) -> Snapshot {
        let inner = self.inner.lock();
        let nodes = inner.nodes.clone();
        let edges = inner
            .edges
            .iter()
            .map(|(&(source, target, kind), &confidence)| {
                Edge::with_confidence(
                    inner.nodes[source.0].key.clone(),
                    inner.nodes[target.0].key.clone(),
                    kind,
                    confidence,
                )
            })
            .collect();
        Snapshot::from_parts(nodes, edges)
    }

    /// Get statistics about the model
    pub fn stats(&self) -> ModelStats {
        self.snapshot().stats()
    }
}

/// Frozen view of a model: nodes sorted by key, edges by `(source, kind, target)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub nodes: Vec<Entity>,
    pub edges: Vec<Edge>,
}

impl Snapshot {
    pub fn from_parts(mut nodes: Vec<Entity>, mut edges: Vec<Edge>) -> Self {
        nodes.sort_by(|a, b| a.key.cmp(&b.key));
        edges.sort();
        Self { nodes, edges }
    }

    /// Get a node by its key
    pub fn node(&self, key: &EntityKey) -> Option<&Entity> {
        self.nodes
            .binary_search_by(|e| e.key.cmp(key))
            .ok()
            .map(|idx| &self.nodes[idx])
    }

    /// Get outgoing edges of a specific kind
    pub fn edges_from(&self, key: &EntityKey, kind: EdgeKind) -> Vec<&Edge> {
        self.edges
            .iter()
            .filter(|e| e.kind == kind && &e.source == key)
            .collect()
    }

    /// Get incoming edges of a specific kind
    pub fn edges_to(&self, key: &EntityKey, kind: EdgeKind) -> Vec<&Edge> {
        self.edges
            .iter()
            .filter(|e| e.kind == kind && &e.target == key)
            .collect()
    }

    /// Find all callers of a method
    pub fn callers(&self, key: &EntityKey) -> Vec<&Entity> {
        self.edges_to(key, EdgeKind::Calls)
            .iter()
            .filter_map(|edge| self.node(&edge.source))
            .collect()
    }

    /// Find all callees of a method
    pub fn callees(&self, key: &EntityKey) -> Vec<&Entity> {
        self.edges_from(key, EdgeKind::Calls)
            .iter()
            .filter_map(|edge| self.node(&edge.target))
            .collect()
    }

    /// Check that every edge endpoint is a node of the snapshot
    pub fn is_closed(&self) -> bool {
        self.edges
            .iter()
            .all(|e| self.node(&e.source).is_some() && self.node(&e.target).is_some())
    }

    pub fn stats(&self) -> ModelStats {
        let count_kind = |kind: EntityKind| self.nodes.iter().filter(|n| n.kind() == kind).count();
        let count_edges = |kind: EdgeKind| self.edges.iter().filter(|e| e.kind == kind).count();

        ModelStats {
            classes: count_kind(EntityKind::Class),
            methods: count_kind(EntityKind::Method),
            declared: self.nodes.iter().filter(|n| n.declared).count(),
            calls: count_edges(EdgeKind::Calls),
            instantiations: count_edges(EdgeKind::Instantiates),
            low_confidence: self.edges.iter().filter(|e| e.confidence.is_low()).count(),
            unscoped: self.edges.iter().filter(|e| e.is_unscoped()).count(),
            routes: self.nodes.iter().map(|n| n.routes.len()).sum(),
            configs: self
                .nodes
                .iter()
                .flat_map(|n| n.configs.iter().map(|c| c.qualifier.as_str()))
                .collect::<BTreeSet<_>>()
                .len(),
        }
    }
}

/// Statistics about a knowledge model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ModelStats {
    pub classes: usize,
    pub methods: usize,
    pub declared: usize,
    pub calls: usize,
    pub instantiations: usize,
    pub low_confidence: usize,
    pub unscoped: usize,
    pub routes: usize,
    /// Distinct event processor configuration qualifiers
    pub configs: usize,
}

impl ModelStats {
    pub fn nodes(&self) -> usize {
        self.classes + self.methods
    }

    pub fn edges(&self) -> usize {
        self.calls + self.instantiations
    }
}

impl std::fmt::Display for ModelStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} nodes ({} classes, {} methods), {} edges ({} calls, {} instantiates), {} low confidence, {} routes, {} configs",
            self.nodes(), self.classes, self.methods,
            self.edges(), self.calls, self.instantiations,
            self.low_confidence, self.routes, self.configs)
    }
}
