/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Serializable types for graph persistence.
//!
//! The core does not own a durable format; an external collaborator
//! reads [`GraphSnapshot`] (via [`Graph::to_snapshot`]) and writes one
//! back (via [`Graph::from_snapshot`], which goes through the same
//! direct primitives used internally — load is not undoable).
//!
//! Snapshots are deterministically ordered (entities sorted by id), so
//! equality on `GraphSnapshot` doubles as observational equality on
//! graphs — the undo/redo tests lean on this.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use euclid::default::{Box2D, Point2D, Size2D};

use crate::graph::{
    Comment, DisplayMode, Edge, Graph, IdGen, Node, Port, PortCapacity, PortDirection, PortKind,
    SubGraphFrame,
};

/// Mirrors `DisplayMode` in the graph model.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PersistedDisplayMode {
    #[default]
    Expanded,
    Compact,
}

/// Mirrors `PortDirection` in the graph model.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PersistedPortDirection {
    Input,
    Output,
}

/// Mirrors `PortKind` in the graph model.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PersistedPortKind {
    Data,
    Control,
    Event,
}

/// Mirrors `PortCapacity` in the graph model.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PersistedPortCapacity {
    Single,
    Multiple,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PersistedPort {
    pub id: Uuid,
    pub name: String,
    pub direction: PersistedPortDirection,
    pub kind: PersistedPortKind,
    pub data_type: String,
    pub capacity: PersistedPortCapacity,
    pub sort_order: i32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PersistedNode {
    pub id: Uuid,
    pub type_id: String,
    pub position_x: f32,
    pub position_y: f32,
    pub width: f32,
    pub height: f32,
    pub display_mode: PersistedDisplayMode,
    /// Ports in owner order — the order is part of the node's shape.
    pub ports: Vec<PersistedPort>,
    pub user_data: Option<Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PersistedEdge {
    pub id: Uuid,
    pub source_port: Uuid,
    pub target_port: Uuid,
    pub user_data: Option<Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PersistedFrame {
    pub id: Uuid,
    pub title: String,
    pub representative_node: Uuid,
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
    pub is_collapsed: bool,
    /// Sorted for deterministic output.
    pub contained_nodes: Vec<Uuid>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PersistedComment {
    pub id: Uuid,
    pub text: String,
    pub position_x: f32,
    pub position_y: f32,
    pub width: f32,
    pub height: f32,
}

/// Full persistable graph state.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct GraphSnapshot {
    pub nodes: Vec<PersistedNode>,
    pub edges: Vec<PersistedEdge>,
    pub frames: Vec<PersistedFrame>,
    pub comments: Vec<PersistedComment>,
}

impl Graph {
    /// Serialize the graph to a persistable, deterministically ordered
    /// snapshot.
    pub fn to_snapshot(&self) -> GraphSnapshot {
        let mut nodes: Vec<PersistedNode> = self
            .nodes()
            .map(|node| PersistedNode {
                id: node.id,
                type_id: node.type_id.clone(),
                position_x: node.position.x,
                position_y: node.position.y,
                width: node.size.width,
                height: node.size.height,
                display_mode: match node.display_mode {
                    DisplayMode::Expanded => PersistedDisplayMode::Expanded,
                    DisplayMode::Compact => PersistedDisplayMode::Compact,
                },
                ports: node
                    .ports
                    .iter()
                    .map(|port| PersistedPort {
                        id: port.id,
                        name: port.name.clone(),
                        direction: match port.direction {
                            PortDirection::Input => PersistedPortDirection::Input,
                            PortDirection::Output => PersistedPortDirection::Output,
                        },
                        kind: match port.kind {
                            PortKind::Data => PersistedPortKind::Data,
                            PortKind::Control => PersistedPortKind::Control,
                            PortKind::Event => PersistedPortKind::Event,
                        },
                        data_type: port.data_type.clone(),
                        capacity: match port.capacity {
                            PortCapacity::Single => PersistedPortCapacity::Single,
                            PortCapacity::Multiple => PersistedPortCapacity::Multiple,
                        },
                        sort_order: port.sort_order,
                    })
                    .collect(),
                user_data: node.user_data.clone(),
            })
            .collect();
        nodes.sort_by_key(|node| node.id);

        let mut edges: Vec<PersistedEdge> = self
            .edges()
            .map(|edge| PersistedEdge {
                id: edge.id,
                source_port: edge.source_port,
                target_port: edge.target_port,
                user_data: edge.user_data.clone(),
            })
            .collect();
        edges.sort_by_key(|edge| edge.id);

        let mut frames: Vec<PersistedFrame> = self
            .frames()
            .map(|frame| {
                let mut contained_nodes: Vec<Uuid> =
                    frame.contained_nodes.iter().copied().collect();
                contained_nodes.sort();
                PersistedFrame {
                    id: frame.id,
                    title: frame.title.clone(),
                    representative_node: frame.representative_node,
                    min_x: frame.bounds.min.x,
                    min_y: frame.bounds.min.y,
                    max_x: frame.bounds.max.x,
                    max_y: frame.bounds.max.y,
                    is_collapsed: frame.is_collapsed,
                    contained_nodes,
                }
            })
            .collect();
        frames.sort_by_key(|frame| frame.id);

        let mut comments: Vec<PersistedComment> = self
            .comments()
            .map(|comment| PersistedComment {
                id: comment.id,
                text: comment.text.clone(),
                position_x: comment.position.x,
                position_y: comment.position.y,
                width: comment.size.width,
                height: comment.size.height,
            })
            .collect();
        comments.sort_by_key(|comment| comment.id);

        GraphSnapshot {
            nodes,
            edges,
            frames,
            comments,
        }
    }

    /// Rebuild a graph from a persisted snapshot. Edges whose ports do
    /// not resolve are silently dropped, mirroring the store's
    /// missing-reference policy.
    pub fn from_snapshot(snapshot: &GraphSnapshot, ids: IdGen) -> Self {
        let mut graph = Graph::new(ids);

        for pnode in &snapshot.nodes {
            let mut node = Node::new(
                pnode.id,
                pnode.type_id.clone(),
                Point2D::new(pnode.position_x, pnode.position_y),
            );
            node.size = Size2D::new(pnode.width, pnode.height);
            node.display_mode = match pnode.display_mode {
                PersistedDisplayMode::Expanded => DisplayMode::Expanded,
                PersistedDisplayMode::Compact => DisplayMode::Compact,
            };
            node.user_data = pnode.user_data.clone();
            node.ports = pnode
                .ports
                .iter()
                .map(|pport| Port {
                    id: pport.id,
                    node_id: pnode.id,
                    name: pport.name.clone(),
                    direction: match pport.direction {
                        PersistedPortDirection::Input => PortDirection::Input,
                        PersistedPortDirection::Output => PortDirection::Output,
                    },
                    kind: match pport.kind {
                        PersistedPortKind::Data => PortKind::Data,
                        PersistedPortKind::Control => PortKind::Control,
                        PersistedPortKind::Event => PortKind::Event,
                    },
                    data_type: pport.data_type.clone(),
                    capacity: match pport.capacity {
                        PersistedPortCapacity::Single => PortCapacity::Single,
                        PersistedPortCapacity::Multiple => PortCapacity::Multiple,
                    },
                    sort_order: pport.sort_order,
                })
                .collect();
            graph.add_node_direct(node);
        }

        for pedge in &snapshot.edges {
            graph.add_edge_direct(Edge {
                id: pedge.id,
                source_port: pedge.source_port,
                target_port: pedge.target_port,
                user_data: pedge.user_data.clone(),
            });
        }

        for pframe in &snapshot.frames {
            graph.add_frame_direct(SubGraphFrame {
                id: pframe.id,
                title: pframe.title.clone(),
                representative_node: pframe.representative_node,
                bounds: Box2D::new(
                    Point2D::new(pframe.min_x, pframe.min_y),
                    Point2D::new(pframe.max_x, pframe.max_y),
                ),
                is_collapsed: pframe.is_collapsed,
                contained_nodes: pframe.contained_nodes.iter().copied().collect(),
            });
        }

        for pcomment in &snapshot.comments {
            graph.add_comment_direct(Comment {
                id: pcomment.id,
                text: pcomment.text.clone(),
                position: Point2D::new(pcomment.position_x, pcomment.position_y),
                size: Size2D::new(pcomment.width, pcomment.height),
            });
        }

        graph
    }
}
