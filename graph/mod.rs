/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Graph store for the blueprint editor.
//!
//! Core structures:
//! - `Graph`: arena container backed by petgraph::StableGraph with
//!   UUID identity indexes layered on top
//! - `Node`: a blueprint node owning an ordered list of `Port`s
//! - `Edge`: a port-to-port connection, addressed by id
//! - `SubGraphFrame`: a collapsible frame standing for a node subset,
//!   fronted by a boundary-typed representative node
//!
//! Boundary: mutation primitives here are direct and unvalidated beyond
//! referential integrity — undo bookkeeping belongs to the command
//! layer, which snapshots state before calling in.

use std::collections::{HashMap, HashSet};

use euclid::default::{Box2D, Point2D, Size2D};
use log::warn;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use petgraph::{Directed, Direction};
use uuid::Uuid;

pub mod ids;

pub use ids::IdGen;

/// Stable node handle (petgraph NodeIndex — survives other deletions).
/// Internal to the store; public identity is always the UUID.
pub(crate) type NodeKey = NodeIndex;

/// Stable edge handle (petgraph EdgeIndex).
pub(crate) type EdgeKey = EdgeIndex;

/// Reserved `type_id` of subgraph representative nodes. Nodes of this
/// type are never eligible for grouping themselves.
pub const BOUNDARY_TYPE_ID: &str = "core/subgraph-boundary";

/// Default footprint for nodes created without an explicit size.
pub const DEFAULT_NODE_SIZE: Size2D<f32> = Size2D::new(180.0, 72.0);

/// How a node is drawn on the canvas. Cosmetic only; toggled by a
/// style-class command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    #[default]
    Expanded,
    Compact,
}

/// Which side of a node a port sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortDirection {
    Input,
    Output,
}

/// Payload class carried by a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortKind {
    Data,
    Control,
    Event,
}

/// Whether a port accepts one or many simultaneous edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortCapacity {
    Single,
    Multiple,
}

/// A connection point owned by exactly one node. Ports never outlive
/// their node.
#[derive(Debug, Clone, PartialEq)]
pub struct Port {
    pub id: Uuid,
    pub node_id: Uuid,
    pub name: String,
    pub direction: PortDirection,
    pub kind: PortKind,
    /// Data-type tag used for connection compatibility and boundary
    /// port merging. Opaque to the core.
    pub data_type: String,
    pub capacity: PortCapacity,
    pub sort_order: i32,
}

/// A blueprint node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Stable node identity.
    pub id: Uuid,

    /// Domain node type (spawn rule, trigger, behavior step, ...).
    pub type_id: String,

    /// Position in canvas space (top-left corner).
    pub position: Point2D<f32>,

    pub size: Size2D<f32>,

    pub display_mode: DisplayMode,

    /// Ordered owned ports.
    pub ports: Vec<Port>,

    /// Opaque domain payload; round-tripped, never interpreted.
    pub user_data: Option<serde_json::Value>,
}

impl Node {
    pub fn new(id: Uuid, type_id: impl Into<String>, position: Point2D<f32>) -> Self {
        Self {
            id,
            type_id: type_id.into(),
            position,
            size: DEFAULT_NODE_SIZE,
            display_mode: DisplayMode::default(),
            ports: Vec::new(),
            user_data: None,
        }
    }

    pub fn port(&self, port_id: Uuid) -> Option<&Port> {
        self.ports.iter().find(|port| port.id == port_id)
    }

    /// Canvas-space bounds of the node body.
    pub fn bounds(&self) -> Box2D<f32> {
        Box2D::new(
            self.position,
            Point2D::new(
                self.position.x + self.size.width,
                self.position.y + self.size.height,
            ),
        )
    }
}

/// A port-to-port connection. Edges reference ports by id (relation +
/// lookup, no ownership); removing a port requires removing its edges
/// first.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub id: Uuid,
    pub source_port: Uuid,
    pub target_port: Uuid,
    /// Opaque domain payload; round-tripped, never interpreted.
    pub user_data: Option<serde_json::Value>,
}

/// A collapsible subgraph frame. The representative node is a regular
/// node of [`BOUNDARY_TYPE_ID`] holding the inferred boundary ports.
///
/// `contained_nodes` entries are weak references: a contained id that no
/// longer resolves is harmless (ids are never reused) and simply drops
/// out of containment queries.
#[derive(Debug, Clone, PartialEq)]
pub struct SubGraphFrame {
    pub id: Uuid,
    pub title: String,
    pub representative_node: Uuid,
    pub bounds: Box2D<f32>,
    pub is_collapsed: bool,
    pub contained_nodes: HashSet<Uuid>,
}

/// Free-floating annotation on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub id: Uuid,
    pub text: String,
    pub position: Point2D<f32>,
    pub size: Size2D<f32>,
}

/// Result of [`Graph::connect`].
#[derive(Debug, Clone, Default)]
pub struct ConnectOutcome {
    /// The new edge, or `None` when the connect was a no-op.
    pub created: Option<Edge>,
    /// Edge removed to make room on a single-capacity target port.
    pub displaced: Option<Edge>,
}

/// Everything [`Graph::remove_node`] took out of the graph: the node
/// (ports included) and every edge that touched its ports.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedNode {
    pub node: Node,
    pub edges: Vec<Edge>,
}

/// The graph store. Owns all entities; mutation happens through the
/// primitives below, queries reflect the graph at call time.
#[derive(Clone)]
pub struct Graph {
    inner: StableGraph<Node, Edge, Directed>,

    /// Stable UUID to node mapping.
    id_to_node: HashMap<Uuid, NodeKey>,

    /// Stable UUID to edge mapping.
    id_to_edge: HashMap<Uuid, EdgeKey>,

    /// Port id to owning node id.
    port_owner: HashMap<Uuid, Uuid>,

    frames: HashMap<Uuid, SubGraphFrame>,

    comments: HashMap<Uuid, Comment>,

    ids: IdGen,
}

impl Graph {
    pub fn new(ids: IdGen) -> Self {
        Self {
            inner: StableGraph::new(),
            id_to_node: HashMap::new(),
            id_to_edge: HashMap::new(),
            port_owner: HashMap::new(),
            frames: HashMap::new(),
            comments: HashMap::new(),
            ids,
        }
    }

    /// Mint a fresh entity id from the injected generator.
    pub fn mint_id(&mut self) -> Uuid {
        self.ids.next_id()
    }

    // --- mutation primitives ---

    /// Insert a fully-formed node, ports included. Returns false (and
    /// leaves the graph untouched) when the id is already taken.
    pub fn add_node_direct(&mut self, node: Node) -> bool {
        if self.id_to_node.contains_key(&node.id) {
            warn!("add_node_direct: node id {} already present", node.id);
            return false;
        }
        debug_assert!(node.ports.iter().all(|port| port.node_id == node.id));
        let node_id = node.id;
        for port in &node.ports {
            self.port_owner.insert(port.id, node_id);
        }
        let key = self.inner.add_node(node);
        self.id_to_node.insert(node_id, key);
        true
    }

    /// Remove a node, cascading to its ports and every edge touching
    /// them. Returns what was removed so callers can snapshot it.
    pub fn remove_node(&mut self, node_id: Uuid) -> Option<RemovedNode> {
        let key = *self.id_to_node.get(&node_id)?;
        let edges = self.edges_for_node(node_id);
        for edge in &edges {
            let _ = self.remove_edge(edge.id);
        }
        let node = self.inner.remove_node(key)?;
        self.id_to_node.remove(&node_id);
        for port in &node.ports {
            self.port_owner.remove(&port.id);
        }
        Some(RemovedNode { node, edges })
    }

    /// Append a port to its owning node. No-op (false) when the node is
    /// missing or the port id is already taken.
    pub fn add_port_direct(&mut self, port: Port) -> bool {
        if self.port_owner.contains_key(&port.id) {
            warn!("add_port_direct: port id {} already present", port.id);
            return false;
        }
        let Some(&key) = self.id_to_node.get(&port.node_id) else {
            warn!("add_port_direct: owning node {} not found", port.node_id);
            return false;
        };
        self.port_owner.insert(port.id, port.node_id);
        self.inner[key].ports.push(port);
        true
    }

    /// Detach a port from its node. The caller must have removed every
    /// edge referencing the port first.
    pub fn remove_port(&mut self, port_id: Uuid) -> Option<Port> {
        let node_id = *self.port_owner.get(&port_id)?;
        debug_assert!(
            self.edges_for_port(port_id).is_empty(),
            "remove_port called with live edges on {port_id}"
        );
        let key = *self.id_to_node.get(&node_id)?;
        let node = &mut self.inner[key];
        let index = node.ports.iter().position(|port| port.id == port_id)?;
        self.port_owner.remove(&port_id);
        Some(node.ports.remove(index))
    }

    /// Create an edge between two ports, displacing the existing edge on
    /// a single-capacity target. Silent no-op (`created: None`) when a
    /// port is missing or source and target are the same port.
    pub fn connect(&mut self, source_port: Uuid, target_port: Uuid) -> ConnectOutcome {
        if source_port == target_port {
            return ConnectOutcome::default();
        }
        if !self.port_owner.contains_key(&source_port)
            || !self.port_owner.contains_key(&target_port)
        {
            return ConnectOutcome::default();
        }

        let displaced = if self
            .port(target_port)
            .is_some_and(|port| port.capacity == PortCapacity::Single)
        {
            self.edges_for_port(target_port)
                .into_iter()
                .find(|edge| edge.target_port == target_port)
        } else {
            None
        };
        if let Some(edge) = &displaced {
            let _ = self.remove_edge(edge.id);
        }

        let edge = Edge {
            id: self.mint_id(),
            source_port,
            target_port,
            user_data: None,
        };
        self.add_edge_direct(edge.clone());
        ConnectOutcome {
            created: Some(edge),
            displaced,
        }
    }

    /// Remove an edge by id; no-op if absent.
    pub fn disconnect(&mut self, edge_id: Uuid) -> Option<Edge> {
        self.remove_edge(edge_id)
    }

    /// Insert a fully-formed edge. Both ports must resolve; capacity is
    /// not enforced here (commands pre-validate via [`Graph::connect`]).
    pub fn add_edge_direct(&mut self, edge: Edge) -> bool {
        if self.id_to_edge.contains_key(&edge.id) {
            warn!("add_edge_direct: edge id {} already present", edge.id);
            return false;
        }
        let (Some(source_node), Some(target_node)) = (
            self.port_owner.get(&edge.source_port).copied(),
            self.port_owner.get(&edge.target_port).copied(),
        ) else {
            warn!("add_edge_direct: dangling port on edge {}", edge.id);
            return false;
        };
        let (Some(&source_key), Some(&target_key)) = (
            self.id_to_node.get(&source_node),
            self.id_to_node.get(&target_node),
        ) else {
            return false;
        };
        let edge_id = edge.id;
        let key = self.inner.add_edge(source_key, target_key, edge);
        self.id_to_edge.insert(edge_id, key);
        true
    }

    pub fn remove_edge(&mut self, edge_id: Uuid) -> Option<Edge> {
        let key = self.id_to_edge.remove(&edge_id)?;
        self.inner.remove_edge(key)
    }

    /// Register a frame. Contained ids are taken as given — eligibility
    /// filtering happens in the grouping path before this is called.
    pub fn add_frame_direct(&mut self, frame: SubGraphFrame) -> bool {
        if self.frames.contains_key(&frame.id) {
            warn!("add_frame_direct: frame id {} already present", frame.id);
            return false;
        }
        self.frames.insert(frame.id, frame);
        true
    }

    /// Remove a frame and its containment record only; contained nodes
    /// stay in the graph.
    pub fn remove_frame(&mut self, frame_id: Uuid) -> Option<SubGraphFrame> {
        self.frames.remove(&frame_id)
    }

    pub fn add_comment_direct(&mut self, comment: Comment) -> bool {
        if self.comments.contains_key(&comment.id) {
            return false;
        }
        self.comments.insert(comment.id, comment);
        true
    }

    pub fn remove_comment(&mut self, comment_id: Uuid) -> Option<Comment> {
        self.comments.remove(&comment_id)
    }

    // --- queries ---

    pub fn node(&self, node_id: Uuid) -> Option<&Node> {
        let key = *self.id_to_node.get(&node_id)?;
        self.inner.node_weight(key)
    }

    pub fn node_mut(&mut self, node_id: Uuid) -> Option<&mut Node> {
        let key = *self.id_to_node.get(&node_id)?;
        self.inner.node_weight_mut(key)
    }

    pub fn port(&self, port_id: Uuid) -> Option<&Port> {
        let node_id = *self.port_owner.get(&port_id)?;
        self.node(node_id)?.port(port_id)
    }

    /// Owning node id for a port.
    pub fn port_node(&self, port_id: Uuid) -> Option<Uuid> {
        self.port_owner.get(&port_id).copied()
    }

    pub fn edge(&self, edge_id: Uuid) -> Option<&Edge> {
        let key = *self.id_to_edge.get(&edge_id)?;
        self.inner.edge_weight(key)
    }

    pub fn frame(&self, frame_id: Uuid) -> Option<&SubGraphFrame> {
        self.frames.get(&frame_id)
    }

    pub fn frame_mut(&mut self, frame_id: Uuid) -> Option<&mut SubGraphFrame> {
        self.frames.get_mut(&frame_id)
    }

    pub fn comment(&self, comment_id: Uuid) -> Option<&Comment> {
        self.comments.get(&comment_id)
    }

    pub fn comment_mut(&mut self, comment_id: Uuid) -> Option<&mut Comment> {
        self.comments.get_mut(&comment_id)
    }

    /// Every edge touching any port of a node, deduplicated (a self-loop
    /// appears once). Cloned so the caller holds a stable snapshot.
    pub fn edges_for_node(&self, node_id: Uuid) -> Vec<Edge> {
        let Some(&key) = self.id_to_node.get(&node_id) else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        let mut edges = Vec::new();
        for edge in self
            .inner
            .edges_directed(key, Direction::Outgoing)
            .chain(self.inner.edges_directed(key, Direction::Incoming))
        {
            if seen.insert(edge.weight().id) {
                edges.push(edge.weight().clone());
            }
        }
        edges
    }

    /// Every edge whose source or target is the given port.
    pub fn edges_for_port(&self, port_id: Uuid) -> Vec<Edge> {
        let Some(node_id) = self.port_node(port_id) else {
            return Vec::new();
        };
        self.edges_for_node(node_id)
            .into_iter()
            .filter(|edge| edge.source_port == port_id || edge.target_port == port_id)
            .collect()
    }

    /// The frame containing a node, if any. Frames are disjoint, so
    /// there is at most one.
    pub fn find_container_frame(&self, node_id: Uuid) -> Option<&SubGraphFrame> {
        self.frames
            .values()
            .find(|frame| frame.contained_nodes.contains(&node_id))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.inner
            .node_indices()
            .filter_map(|key| self.inner.node_weight(key))
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.inner.edge_references().map(|edge| edge.weight())
    }

    pub fn frames(&self) -> impl Iterator<Item = &SubGraphFrame> {
        self.frames.values()
    }

    pub fn comments(&self) -> impl Iterator<Item = &Comment> {
        self.comments.values()
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn comment_count(&self) -> usize {
        self.comments.len()
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new(IdGen::random())
    }
}
