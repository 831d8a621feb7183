/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Undoable mutation commands over the graph store.
//!
//! `Command` is a tagged union dispatched by pattern matching: each
//! variant carries its immutable intent parameters plus the undo
//! snapshot `execute` populates. `undo` restores the exact prior state,
//! ids included — node/port/edge identity is observable state that
//! selection and external references key off.
//!
//! Replay discipline: a redone `execute` re-applies its recorded
//! snapshot through direct store primitives instead of re-deriving it,
//! so ids stay stable across undo/redo. `CreateSubgraph` is the one
//! exception — instantiation re-runs and re-captures its id set every
//! time, so redo may mint different ids (structure is preserved).
//!
//! Commands that reference state that no longer resolves execute as
//! logged no-ops; their undo is guarded by the same empty snapshot.

use euclid::default::Point2D;
use log::warn;
use uuid::Uuid;

use crate::graph::{Comment, DisplayMode, Edge, Graph, Node, Port, RemovedNode};
use crate::subgraph::{
    self, DissolutionRecord, EncapsulationRecord, Instantiation, SubgraphTemplate,
};

pub mod history;

/// Structural changes invalidate dependent analysis; style changes only
/// need a repaint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeClass {
    Structural,
    Style,
}

/// Snapshot taken by `RemovePort`: the port plus the edges it
/// explicitly disconnected first.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedPort {
    pub port: Port,
    pub edges: Vec<Edge>,
}

/// An atomic group of commands that undo/redo as one unit.
#[derive(Debug, Clone, Default)]
pub struct CompoundCommand {
    pub description: String,
    pub commands: Vec<Command>,
}

#[derive(Debug, Clone)]
pub enum Command {
    AddNode {
        node: Node,
        placed: bool,
    },
    RemoveNode {
        node_id: Uuid,
        removed: Option<RemovedNode>,
    },
    Connect {
        source_port: Uuid,
        target_port: Uuid,
        created: Option<Edge>,
        displaced: Option<Edge>,
    },
    Disconnect {
        edge_id: Uuid,
        removed: Option<Edge>,
    },
    AddPort {
        port: Port,
        added: bool,
    },
    RemovePort {
        port_id: Uuid,
        removed: Option<RemovedPort>,
    },
    MoveNode {
        node_id: Uuid,
        to: Point2D<f32>,
        from: Option<Point2D<f32>>,
    },
    SetDisplayMode {
        node_id: Uuid,
        mode: DisplayMode,
        previous: Option<DisplayMode>,
    },
    SetFrameTitle {
        frame_id: Uuid,
        title: String,
        previous: Option<String>,
    },
    SetFrameCollapsed {
        frame_id: Uuid,
        collapsed: bool,
        previous: Option<bool>,
    },
    AddComment {
        comment: Comment,
        placed: bool,
    },
    RemoveComment {
        comment_id: Uuid,
        removed: Option<Comment>,
    },
    SetCommentText {
        comment_id: Uuid,
        text: String,
        previous: Option<String>,
    },
    Group {
        selection: Vec<Uuid>,
        title: String,
        record: Option<EncapsulationRecord>,
    },
    Ungroup {
        frame_id: Uuid,
        record: Option<DissolutionRecord>,
    },
    CreateSubgraph {
        template: SubgraphTemplate,
        origin: Point2D<f32>,
        title: String,
        created: Option<Instantiation>,
    },
    Compound(CompoundCommand),
}

impl Command {
    // Intent constructors — snapshot fields start empty.

    pub fn add_node(node: Node) -> Self {
        Self::AddNode {
            node,
            placed: false,
        }
    }

    pub fn remove_node(node_id: Uuid) -> Self {
        Self::RemoveNode {
            node_id,
            removed: None,
        }
    }

    pub fn connect(source_port: Uuid, target_port: Uuid) -> Self {
        Self::Connect {
            source_port,
            target_port,
            created: None,
            displaced: None,
        }
    }

    pub fn disconnect(edge_id: Uuid) -> Self {
        Self::Disconnect {
            edge_id,
            removed: None,
        }
    }

    pub fn add_port(port: Port) -> Self {
        Self::AddPort { port, added: false }
    }

    pub fn remove_port(port_id: Uuid) -> Self {
        Self::RemovePort {
            port_id,
            removed: None,
        }
    }

    pub fn move_node(node_id: Uuid, to: Point2D<f32>) -> Self {
        Self::MoveNode {
            node_id,
            to,
            from: None,
        }
    }

    pub fn group(selection: Vec<Uuid>, title: impl Into<String>) -> Self {
        Self::Group {
            selection,
            title: title.into(),
            record: None,
        }
    }

    pub fn ungroup(frame_id: Uuid) -> Self {
        Self::Ungroup {
            frame_id,
            record: None,
        }
    }

    pub fn create_subgraph(
        template: SubgraphTemplate,
        origin: Point2D<f32>,
        title: impl Into<String>,
    ) -> Self {
        Self::CreateSubgraph {
            template,
            origin,
            title: title.into(),
            created: None,
        }
    }

    /// Structural vs cosmetic, for the notification sink.
    pub fn change_class(&self) -> ChangeClass {
        match self {
            Command::MoveNode { .. }
            | Command::SetDisplayMode { .. }
            | Command::SetFrameTitle { .. }
            | Command::SetFrameCollapsed { .. }
            | Command::AddComment { .. }
            | Command::RemoveComment { .. }
            | Command::SetCommentText { .. } => ChangeClass::Style,
            Command::Compound(compound) => {
                if compound
                    .commands
                    .iter()
                    .any(|command| command.change_class() == ChangeClass::Structural)
                {
                    ChangeClass::Structural
                } else {
                    ChangeClass::Style
                }
            },
            _ => ChangeClass::Structural,
        }
    }

    /// Fold a just-executed command into this one. Default is to
    /// reject; only consecutive moves of the same node coalesce (drag
    /// paths become a single history entry).
    pub fn try_merge(&mut self, incoming: &Command) -> bool {
        match (self, incoming) {
            (
                Command::MoveNode { node_id, to, .. },
                Command::MoveNode {
                    node_id: other,
                    to: latest,
                    ..
                },
            ) if node_id == other => {
                *to = *latest;
                true
            },
            _ => false,
        }
    }

    /// Run the mutation and capture the undo snapshot. Re-running after
    /// an undo replays the recorded snapshot (see module docs).
    pub fn execute(&mut self, graph: &mut Graph) {
        match self {
            Command::AddNode { node, placed } => {
                *placed = graph.add_node_direct(node.clone());
                if !*placed {
                    warn!("AddNode: node {} could not be placed", node.id);
                }
            },
            Command::RemoveNode { node_id, removed } => {
                *removed = graph.remove_node(*node_id);
                if removed.is_none() {
                    warn!("RemoveNode: node {node_id} not found");
                }
            },
            Command::Connect {
                source_port,
                target_port,
                created,
                displaced,
            } => {
                if let Some(edge) = created {
                    // Replay: keep the recorded edge identity.
                    if let Some(old) = displaced {
                        let _ = graph.remove_edge(old.id);
                    }
                    graph.add_edge_direct(edge.clone());
                } else {
                    let outcome = graph.connect(*source_port, *target_port);
                    if outcome.created.is_none() {
                        warn!("Connect: {source_port} -> {target_port} was a no-op");
                    }
                    *created = outcome.created;
                    *displaced = outcome.displaced;
                }
            },
            Command::Disconnect { edge_id, removed } => {
                *removed = graph.disconnect(*edge_id);
                if removed.is_none() {
                    warn!("Disconnect: edge {edge_id} not found");
                }
            },
            Command::AddPort { port, added } => {
                *added = graph.add_port_direct(port.clone());
                if !*added {
                    warn!("AddPort: port {} could not be added", port.id);
                }
            },
            Command::RemovePort { port_id, removed } => {
                if graph.port(*port_id).is_some() {
                    // Edges referencing the port go first, explicitly.
                    let edges = graph.edges_for_port(*port_id);
                    for edge in &edges {
                        let _ = graph.disconnect(edge.id);
                    }
                    *removed = graph
                        .remove_port(*port_id)
                        .map(|port| RemovedPort { port, edges });
                } else {
                    warn!("RemovePort: port {port_id} not found");
                    *removed = None;
                }
            },
            Command::MoveNode { node_id, to, from } => match graph.node_mut(*node_id) {
                Some(node) => {
                    *from = Some(node.position);
                    node.position = *to;
                },
                None => {
                    warn!("MoveNode: node {node_id} not found");
                    *from = None;
                },
            },
            Command::SetDisplayMode {
                node_id,
                mode,
                previous,
            } => match graph.node_mut(*node_id) {
                Some(node) => {
                    *previous = Some(node.display_mode);
                    node.display_mode = *mode;
                },
                None => *previous = None,
            },
            Command::SetFrameTitle {
                frame_id,
                title,
                previous,
            } => match graph.frame_mut(*frame_id) {
                Some(frame) => {
                    *previous = Some(std::mem::replace(&mut frame.title, title.clone()));
                },
                None => *previous = None,
            },
            Command::SetFrameCollapsed {
                frame_id,
                collapsed,
                previous,
            } => match graph.frame_mut(*frame_id) {
                Some(frame) => {
                    *previous = Some(frame.is_collapsed);
                    frame.is_collapsed = *collapsed;
                },
                None => *previous = None,
            },
            Command::AddComment { comment, placed } => {
                *placed = graph.add_comment_direct(comment.clone());
            },
            Command::RemoveComment {
                comment_id,
                removed,
            } => {
                *removed = graph.remove_comment(*comment_id);
            },
            Command::SetCommentText {
                comment_id,
                text,
                previous,
            } => match graph.comment_mut(*comment_id) {
                Some(comment) => {
                    *previous = Some(std::mem::replace(&mut comment.text, text.clone()));
                },
                None => *previous = None,
            },
            Command::Group {
                selection,
                title,
                record,
            } => {
                if let Some(record) = record {
                    subgraph::reapply_encapsulation(graph, record);
                } else {
                    *record = subgraph::encapsulate(graph, selection, title);
                }
            },
            Command::Ungroup { frame_id, record } => {
                if let Some(record) = record {
                    for edge in &record.bypass {
                        graph.add_edge_direct(edge.clone());
                    }
                    let _ = graph.remove_node(record.representative.id);
                    let _ = graph.remove_frame(record.frame.id);
                } else {
                    *record = subgraph::dissolve(graph, *frame_id);
                }
            },
            Command::CreateSubgraph {
                template,
                origin,
                title,
                created,
            } => {
                // Instantiation is re-run on every execute; the created
                // id set is re-captured so undo targets the latest run.
                *created = subgraph::instantiate(graph, template, *origin, title);
            },
            Command::Compound(compound) => {
                for command in &mut compound.commands {
                    command.execute(graph);
                }
            },
        }
    }

    /// Restore the state `execute` observed, ids included. A command
    /// whose execute was a no-op undoes as a no-op.
    pub fn undo(&mut self, graph: &mut Graph) {
        match self {
            Command::AddNode { node, placed } => {
                if *placed {
                    let _ = graph.remove_node(node.id);
                }
            },
            Command::RemoveNode { removed, .. } => {
                if let Some(removed) = removed {
                    graph.add_node_direct(removed.node.clone());
                    for edge in &removed.edges {
                        graph.add_edge_direct(edge.clone());
                    }
                }
            },
            Command::Connect {
                created, displaced, ..
            } => {
                if let Some(edge) = created {
                    let _ = graph.remove_edge(edge.id);
                }
                if let Some(edge) = displaced {
                    graph.add_edge_direct(edge.clone());
                }
            },
            Command::Disconnect { removed, .. } => {
                if let Some(edge) = removed {
                    graph.add_edge_direct(edge.clone());
                }
            },
            Command::AddPort { port, added } => {
                if *added {
                    let _ = graph.remove_port(port.id);
                }
            },
            Command::RemovePort { removed, .. } => {
                if let Some(removed) = removed {
                    graph.add_port_direct(removed.port.clone());
                    for edge in &removed.edges {
                        graph.add_edge_direct(edge.clone());
                    }
                }
            },
            Command::MoveNode { node_id, from, .. } => {
                if let Some(previous) = from
                    && let Some(node) = graph.node_mut(*node_id)
                {
                    node.position = *previous;
                }
            },
            Command::SetDisplayMode {
                node_id, previous, ..
            } => {
                if let Some(previous) = previous
                    && let Some(node) = graph.node_mut(*node_id)
                {
                    node.display_mode = *previous;
                }
            },
            Command::SetFrameTitle {
                frame_id, previous, ..
            } => {
                if let Some(previous) = previous
                    && let Some(frame) = graph.frame_mut(*frame_id)
                {
                    frame.title = previous.clone();
                }
            },
            Command::SetFrameCollapsed {
                frame_id, previous, ..
            } => {
                if let Some(previous) = previous
                    && let Some(frame) = graph.frame_mut(*frame_id)
                {
                    frame.is_collapsed = *previous;
                }
            },
            Command::AddComment { comment, placed } => {
                if *placed {
                    let _ = graph.remove_comment(comment.id);
                }
            },
            Command::RemoveComment { removed, .. } => {
                if let Some(comment) = removed {
                    graph.add_comment_direct(comment.clone());
                }
            },
            Command::SetCommentText {
                comment_id,
                previous,
                ..
            } => {
                if let Some(previous) = previous
                    && let Some(comment) = graph.comment_mut(*comment_id)
                {
                    comment.text = previous.clone();
                }
            },
            Command::Group { record, .. } => {
                if let Some(record) = record {
                    subgraph::revert_encapsulation(graph, record);
                }
            },
            Command::Ungroup { record, .. } => {
                if let Some(record) = record {
                    subgraph::revert_dissolution(graph, record);
                }
            },
            Command::CreateSubgraph { created, .. } => {
                if let Some(instantiation) = created {
                    subgraph::revert_encapsulation(graph, &instantiation.record);
                    for node_id in instantiation.node_ids.iter().rev() {
                        let _ = graph.remove_node(*node_id);
                    }
                }
            },
            Command::Compound(compound) => {
                for command in compound.commands.iter_mut().rev() {
                    command.undo(graph);
                }
            },
        }
    }
}
