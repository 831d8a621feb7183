use blueprint_graph::commands::Command;
use blueprint_graph::commands::history::CommandHistory;
use blueprint_graph::graph::{
    Graph, IdGen, Node, Port, PortCapacity, PortDirection, PortKind,
};
use blueprint_graph::persistence::GraphSnapshot;
use euclid::default::Point2D;
use uuid::Uuid;

/// One editing session: a deterministic-id graph plus its history.
/// Helpers route everything through the command layer, the way the
/// editor shell does.
pub(crate) struct TestSession {
    pub(crate) graph: Graph,
    pub(crate) history: CommandHistory,
}

impl TestSession {
    pub(crate) fn new() -> Self {
        Self {
            graph: Graph::new(IdGen::sequential()),
            history: CommandHistory::new(),
        }
    }

    pub(crate) fn add_node(&mut self, type_id: &str, at: (f32, f32)) -> Uuid {
        let id = self.graph.mint_id();
        let node = Node::new(id, type_id, Point2D::new(at.0, at.1));
        self.history
            .execute(&mut self.graph, Command::add_node(node));
        id
    }

    pub(crate) fn add_port(
        &mut self,
        node_id: Uuid,
        name: &str,
        direction: PortDirection,
        kind: PortKind,
        data_type: &str,
        capacity: PortCapacity,
    ) -> Uuid {
        let id = self.graph.mint_id();
        let sort_order = self.graph.node(node_id).map_or(0, |node| node.ports.len()) as i32;
        let port = Port {
            id,
            node_id,
            name: name.to_string(),
            direction,
            kind,
            data_type: data_type.to_string(),
            capacity,
            sort_order,
        };
        self.history
            .execute(&mut self.graph, Command::add_port(port));
        id
    }

    pub(crate) fn add_control_out(&mut self, node_id: Uuid, name: &str) -> Uuid {
        self.add_port(
            node_id,
            name,
            PortDirection::Output,
            PortKind::Control,
            "exec",
            PortCapacity::Multiple,
        )
    }

    pub(crate) fn add_control_in(&mut self, node_id: Uuid, name: &str) -> Uuid {
        self.add_port(
            node_id,
            name,
            PortDirection::Input,
            PortKind::Control,
            "exec",
            PortCapacity::Multiple,
        )
    }

    pub(crate) fn connect(&mut self, source_port: Uuid, target_port: Uuid) {
        self.history
            .execute(&mut self.graph, Command::connect(source_port, target_port));
    }

    /// Id of the first edge running source → target, if any.
    pub(crate) fn edge_between(&self, source_port: Uuid, target_port: Uuid) -> Option<Uuid> {
        self.graph
            .edges()
            .find(|edge| edge.source_port == source_port && edge.target_port == target_port)
            .map(|edge| edge.id)
    }

    pub(crate) fn edge_count_between(&self, source_port: Uuid, target_port: Uuid) -> usize {
        self.graph
            .edges()
            .filter(|edge| edge.source_port == source_port && edge.target_port == target_port)
            .count()
    }

    pub(crate) fn group(&mut self, selection: Vec<Uuid>, title: &str) -> Option<Uuid> {
        self.history
            .execute(&mut self.graph, Command::group(selection, title));
        self.graph
            .frames()
            .find(|frame| frame.title == title)
            .map(|frame| frame.id)
    }

    pub(crate) fn undo(&mut self) -> bool {
        self.history.undo(&mut self.graph)
    }

    pub(crate) fn redo(&mut self) -> bool {
        self.history.redo(&mut self.graph)
    }

    pub(crate) fn snapshot(&self) -> GraphSnapshot {
        self.graph.to_snapshot()
    }
}
