/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Subgraph encapsulation: fold a node selection behind a single
//! boundary node, and unfold it again.
//!
//! Two symmetric operations over the store:
//! - [`encapsulate`]: infer boundary ports from cross-boundary edges,
//!   rewire every crossing edge through the new representative node,
//!   and wrap the selection in a [`SubGraphFrame`]
//! - [`dissolve`]: remove a frame's representative node and reconnect
//!   the fan-in/fan-out straight through
//!
//! Both return a record holding everything their exact inverse needs
//! ([`revert_encapsulation`], [`revert_dissolution`]); undo in the
//! command layer is a pure order-reversed replay of those records.
//!
//! Boundary ports are many-to-one on purpose: crossing edges that share
//! `(direction, kind, data_type)` merge into one port, so grouping N
//! nodes with N same-shape links to one external node yields one port,
//! not N. The shape key is a deliberately coarse classifier — bounded,
//! predictable port count over per-edge precision.

use std::collections::{HashMap, HashSet};

use euclid::default::{Box2D, Point2D, Size2D};
use log::warn;
use uuid::Uuid;

use crate::graph::{
    BOUNDARY_TYPE_ID, Edge, Graph, Node, Port, PortCapacity, PortDirection, PortKind,
    SubGraphFrame,
};

/// Clearance added around the selection bounds on every side.
const FRAME_PADDING: f32 = 32.0;

/// Extra headroom above the contents for the frame's title bar.
const FRAME_TITLE_ALLOWANCE: f32 = 28.0;

/// Vertical gap between the representative node and the frame.
const REPRESENTATIVE_GAP: f32 = 24.0;

const REPRESENTATIVE_SIZE: Size2D<f32> = Size2D::new(160.0, 56.0);

/// Data-type tag used for synthesized default control ports.
const DEFAULT_CONTROL_TYPE: &str = "exec";

/// One crossing edge's rewrite: the original edge, the boundary port it
/// was funneled through, and the replacement segments created for it.
/// Segments are deduplicated per (boundary port, far port) pair — a
/// rewire whose segment already exists carries `None`, so grouping and
/// ungrouping round-trip without multiplying parallel edges. The
/// original edges themselves are all recorded, which is what undo
/// restores.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRewire {
    pub original: Edge,
    pub boundary_port: Uuid,
    pub inner: Option<Edge>,
    pub outer: Option<Edge>,
}

/// Everything [`encapsulate`] did, in replayable form.
#[derive(Debug, Clone, PartialEq)]
pub struct EncapsulationRecord {
    pub frame: SubGraphFrame,
    pub representative: Node,
    pub rewires: Vec<EdgeRewire>,
}

/// Everything [`dissolve`] did, in replayable form.
#[derive(Debug, Clone, PartialEq)]
pub struct DissolutionRecord {
    pub frame: SubGraphFrame,
    pub representative: Node,
    /// Every edge that touched the representative node, as found.
    pub representative_edges: Vec<Edge>,
    /// Direct edges created to bypass the removed boundary node.
    pub bypass: Vec<Edge>,
}

/// Source content for [`instantiate`]: nodes and edges captured from a
/// separate graph (a template library, a prefab, ...). Edges whose
/// ports are not part of the captured nodes are dropped at
/// instantiation time.
#[derive(Debug, Clone, PartialEq)]
pub struct SubgraphTemplate {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl SubgraphTemplate {
    /// Capture a whole source graph as a template.
    pub fn from_graph(source: &Graph) -> Self {
        Self {
            nodes: source.nodes().cloned().collect(),
            edges: source.edges().cloned().collect(),
        }
    }
}

/// One instantiation run of a template: the minted node ids plus the
/// encapsulation built around them.
#[derive(Debug, Clone, PartialEq)]
pub struct Instantiation {
    pub node_ids: Vec<Uuid>,
    pub record: EncapsulationRecord,
}

/// A crossing edge found during the boundary scan, with the shape of
/// its inside-the-selection port.
struct Crossing {
    edge: Edge,
    /// `Input` for external→internal edges, `Output` for
    /// internal→external ones; doubles as the boundary port direction.
    direction: PortDirection,
    kind: PortKind,
    data_type: String,
    inner_port: Uuid,
    outer_port: Uuid,
}

/// Group a node selection into a subgraph frame.
///
/// The selection is narrowed before any mutation: ids that do not
/// resolve, boundary nodes, and nodes already contained in a frame are
/// dropped. Returns `None` (graph untouched) when nothing remains.
pub fn encapsulate(graph: &mut Graph, selection: &[Uuid], title: &str) -> Option<EncapsulationRecord> {
    let mut inside = HashSet::new();
    let mut contained = Vec::new();
    for &id in selection {
        let Some(node) = graph.node(id) else { continue };
        if node.type_id == BOUNDARY_TYPE_ID {
            continue;
        }
        if graph.find_container_frame(id).is_some() {
            continue;
        }
        if inside.insert(id) {
            contained.push(id);
        }
    }
    if contained.is_empty() {
        warn!("encapsulate: selection narrowed to nothing, no frame created");
        return None;
    }

    let crossings = collect_crossings(graph, &inside);

    // Allocate one boundary port per distinct crossing shape. Control
    // ports carry fixed entry/exit names; the rest are numbered per
    // direction.
    let representative_id = graph.mint_id();
    let mut ports: Vec<Port> = Vec::new();
    let mut port_for_shape: HashMap<(PortDirection, PortKind, String), Uuid> = HashMap::new();
    let mut input_seq = 0u32;
    let mut output_seq = 0u32;
    let mut boundary_for: Vec<Uuid> = Vec::with_capacity(crossings.len());
    for crossing in &crossings {
        let shape = (
            crossing.direction,
            crossing.kind,
            crossing.data_type.clone(),
        );
        let port_id = match port_for_shape.get(&shape) {
            Some(&existing) => existing,
            None => {
                let name = match (crossing.kind, crossing.direction) {
                    (PortKind::Control, PortDirection::Input) => "activate".to_string(),
                    (PortKind::Control, PortDirection::Output) => "complete".to_string(),
                    (_, PortDirection::Input) => {
                        input_seq += 1;
                        format!("in_{input_seq}")
                    },
                    (_, PortDirection::Output) => {
                        output_seq += 1;
                        format!("out_{output_seq}")
                    },
                };
                let id = graph.mint_id();
                ports.push(Port {
                    id,
                    node_id: representative_id,
                    name,
                    direction: crossing.direction,
                    kind: crossing.kind,
                    data_type: crossing.data_type.clone(),
                    capacity: PortCapacity::Multiple,
                    sort_order: ports.len() as i32,
                });
                port_for_shape.insert(shape, id);
                id
            },
        };
        boundary_for.push(port_id);
    }

    // A frame always exposes at least one entry and one exit.
    if !ports.iter().any(|port| port.direction == PortDirection::Input) {
        let id = graph.mint_id();
        ports.push(default_control_port(id, representative_id, PortDirection::Input, ports.len()));
    }
    if !ports.iter().any(|port| port.direction == PortDirection::Output) {
        let id = graph.mint_id();
        ports.push(default_control_port(id, representative_id, PortDirection::Output, ports.len()));
    }

    let bounds = selection_bounds(graph, &contained);
    let representative = Node {
        id: representative_id,
        type_id: BOUNDARY_TYPE_ID.to_string(),
        position: Point2D::new(
            bounds.min.x,
            bounds.min.y - REPRESENTATIVE_SIZE.height - REPRESENTATIVE_GAP,
        ),
        size: REPRESENTATIVE_SIZE,
        display_mode: Default::default(),
        ports,
        user_data: None,
    };
    graph.add_node_direct(representative.clone());

    // Rewire. Both segment kinds are deduplicated per (boundary port,
    // far port) pair; the many-to-one merge must not manufacture
    // parallel duplicates.
    let mut rewires = Vec::with_capacity(crossings.len());
    let mut internal_links: HashSet<(Uuid, Uuid)> = HashSet::new();
    let mut external_links: HashSet<(Uuid, Uuid)> = HashSet::new();
    for (crossing, &boundary_port) in crossings.iter().zip(&boundary_for) {
        let _ = graph.remove_edge(crossing.edge.id);
        let inner = if internal_links.insert((boundary_port, crossing.inner_port)) {
            let edge = match crossing.direction {
                PortDirection::Output => Edge {
                    id: graph.mint_id(),
                    source_port: crossing.inner_port,
                    target_port: boundary_port,
                    user_data: None,
                },
                PortDirection::Input => Edge {
                    id: graph.mint_id(),
                    source_port: boundary_port,
                    target_port: crossing.inner_port,
                    user_data: None,
                },
            };
            graph.add_edge_direct(edge.clone());
            Some(edge)
        } else {
            None
        };

        let outer = if external_links.insert((boundary_port, crossing.outer_port)) {
            let edge = match crossing.direction {
                PortDirection::Output => Edge {
                    id: graph.mint_id(),
                    source_port: boundary_port,
                    target_port: crossing.outer_port,
                    user_data: None,
                },
                PortDirection::Input => Edge {
                    id: graph.mint_id(),
                    source_port: crossing.outer_port,
                    target_port: boundary_port,
                    user_data: None,
                },
            };
            graph.add_edge_direct(edge.clone());
            Some(edge)
        } else {
            None
        };

        rewires.push(EdgeRewire {
            original: crossing.edge.clone(),
            boundary_port,
            inner,
            outer,
        });
    }

    let frame = SubGraphFrame {
        id: graph.mint_id(),
        title: title.to_string(),
        representative_node: representative_id,
        bounds,
        is_collapsed: false,
        contained_nodes: inside,
    };
    graph.add_frame_direct(frame.clone());

    Some(EncapsulationRecord {
        frame,
        representative,
        rewires,
    })
}

/// Replay a recorded encapsulation verbatim (redo path): same node,
/// port, edge, and frame ids as the original run.
pub fn reapply_encapsulation(graph: &mut Graph, record: &EncapsulationRecord) {
    graph.add_node_direct(record.representative.clone());
    for rewire in &record.rewires {
        let _ = graph.remove_edge(rewire.original.id);
        if let Some(inner) = &rewire.inner {
            graph.add_edge_direct(inner.clone());
        }
        if let Some(outer) = &rewire.outer {
            graph.add_edge_direct(outer.clone());
        }
    }
    graph.add_frame_direct(record.frame.clone());
}

/// Exact inverse of [`encapsulate`]: the frame goes away, every
/// crossing edge comes back with its original identity, the
/// representative node is removed last (cascading the synthesized-port
/// leftovers, if any).
pub fn revert_encapsulation(graph: &mut Graph, record: &EncapsulationRecord) {
    let _ = graph.remove_frame(record.frame.id);
    for rewire in &record.rewires {
        if let Some(inner) = &rewire.inner {
            let _ = graph.remove_edge(inner.id);
        }
        if let Some(outer) = &rewire.outer {
            let _ = graph.remove_edge(outer.id);
        }
        graph.add_edge_direct(rewire.original.clone());
    }
    let _ = graph.remove_node(record.representative.id);
}

/// Ungroup: remove a frame and its representative node, reconnecting
/// straight through. For every boundary port with traffic on both
/// sides, one direct edge is created per (incoming source, outgoing
/// target) pair — the mirror of the grouping fan-in/fan-out merge.
/// Contained nodes are not deleted; they become top-level again.
pub fn dissolve(graph: &mut Graph, frame_id: Uuid) -> Option<DissolutionRecord> {
    let frame = graph.frame(frame_id)?.clone();
    let Some(representative) = graph.node(frame.representative_node).cloned() else {
        warn!("dissolve: frame {frame_id} lost its representative node");
        return None;
    };
    let representative_edges = graph.edges_for_node(representative.id);

    let mut bypass = Vec::new();
    for port in &representative.ports {
        let incoming: Vec<&Edge> = representative_edges
            .iter()
            .filter(|edge| edge.target_port == port.id)
            .collect();
        let outgoing: Vec<&Edge> = representative_edges
            .iter()
            .filter(|edge| edge.source_port == port.id)
            .collect();
        for inbound in &incoming {
            for outbound in &outgoing {
                let edge = Edge {
                    id: graph.mint_id(),
                    source_port: inbound.source_port,
                    target_port: outbound.target_port,
                    user_data: None,
                };
                if graph.add_edge_direct(edge.clone()) {
                    bypass.push(edge);
                }
            }
        }
    }

    let _ = graph.remove_node(representative.id);
    let _ = graph.remove_frame(frame.id);

    Some(DissolutionRecord {
        frame,
        representative,
        representative_edges,
        bypass,
    })
}

/// Exact inverse of [`dissolve`].
pub fn revert_dissolution(graph: &mut Graph, record: &DissolutionRecord) {
    for edge in &record.bypass {
        let _ = graph.remove_edge(edge.id);
    }
    graph.add_node_direct(record.representative.clone());
    for edge in &record.representative_edges {
        graph.add_edge_direct(edge.clone());
    }
    graph.add_frame_direct(record.frame.clone());
}

/// Copy a template into the graph and group the copy. Fresh node, port,
/// and edge ids are minted on every run — re-instantiation never reuses
/// a previous run's ids.
pub fn instantiate(
    graph: &mut Graph,
    template: &SubgraphTemplate,
    origin: Point2D<f32>,
    title: &str,
) -> Option<Instantiation> {
    if template.nodes.is_empty() {
        warn!("instantiate: empty template");
        return None;
    }

    let template_min = template
        .nodes
        .iter()
        .fold(Point2D::new(f32::MAX, f32::MAX), |min, node| {
            Point2D::new(min.x.min(node.position.x), min.y.min(node.position.y))
        });
    let offset = origin - template_min;

    let mut port_map: HashMap<Uuid, Uuid> = HashMap::new();
    let mut node_ids = Vec::with_capacity(template.nodes.len());
    for node in &template.nodes {
        let node_id = graph.mint_id();
        let ports = node
            .ports
            .iter()
            .map(|port| {
                let id = graph.mint_id();
                port_map.insert(port.id, id);
                Port {
                    id,
                    node_id,
                    ..port.clone()
                }
            })
            .collect();
        graph.add_node_direct(Node {
            id: node_id,
            position: node.position + offset,
            ports,
            ..node.clone()
        });
        node_ids.push(node_id);
    }

    for edge in &template.edges {
        let (Some(&source), Some(&target)) = (
            port_map.get(&edge.source_port),
            port_map.get(&edge.target_port),
        ) else {
            // Template edge pointing outside the captured content.
            continue;
        };
        let edge_id = graph.mint_id();
        graph.add_edge_direct(Edge {
            id: edge_id,
            source_port: source,
            target_port: target,
            user_data: edge.user_data.clone(),
        });
    }

    let record = encapsulate(graph, &node_ids, title)?;
    Some(Instantiation { node_ids, record })
}

fn collect_crossings(graph: &Graph, inside: &HashSet<Uuid>) -> Vec<Crossing> {
    let mut crossings = Vec::new();
    for edge in graph.edges() {
        let (Some(source_node), Some(target_node)) = (
            graph.port_node(edge.source_port),
            graph.port_node(edge.target_port),
        ) else {
            continue;
        };
        let (direction, inner_port, outer_port) = match (
            inside.contains(&source_node),
            inside.contains(&target_node),
        ) {
            (true, false) => (PortDirection::Output, edge.source_port, edge.target_port),
            (false, true) => (PortDirection::Input, edge.target_port, edge.source_port),
            _ => continue,
        };
        let Some(port) = graph.port(inner_port) else {
            continue;
        };
        crossings.push(Crossing {
            edge: edge.clone(),
            direction,
            kind: port.kind,
            data_type: port.data_type.clone(),
            inner_port,
            outer_port,
        });
    }
    crossings
}

fn default_control_port(id: Uuid, node_id: Uuid, direction: PortDirection, sort: usize) -> Port {
    Port {
        id,
        node_id,
        name: match direction {
            PortDirection::Input => "activate".to_string(),
            PortDirection::Output => "complete".to_string(),
        },
        direction,
        kind: PortKind::Control,
        data_type: DEFAULT_CONTROL_TYPE.to_string(),
        capacity: PortCapacity::Multiple,
        sort_order: sort as i32,
    }
}

/// Bounding box of the selection's node bounds, padded, with title-bar
/// headroom at the top.
fn selection_bounds(graph: &Graph, contained: &[Uuid]) -> Box2D<f32> {
    let mut min = Point2D::new(f32::MAX, f32::MAX);
    let mut max = Point2D::new(f32::MIN, f32::MIN);
    for &id in contained {
        let Some(node) = graph.node(id) else { continue };
        let bounds = node.bounds();
        min.x = min.x.min(bounds.min.x);
        min.y = min.y.min(bounds.min.y);
        max.x = max.x.max(bounds.max.x);
        max.y = max.y.max(bounds.max.y);
    }
    Box2D::new(
        Point2D::new(min.x - FRAME_PADDING, min.y - FRAME_PADDING - FRAME_TITLE_ALLOWANCE),
        Point2D::new(max.x + FRAME_PADDING, max.y + FRAME_PADDING),
    )
}
