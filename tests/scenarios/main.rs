mod encapsulation;
mod harness;
mod transactions;

use blueprint_graph::graph::{Graph, IdGen};

#[test]
fn scenarios_smoke_empty_graph() {
    let graph = Graph::new(IdGen::sequential());
    assert_eq!(graph.node_count(), 0);
    assert_eq!(graph.edge_count(), 0);
    assert_eq!(graph.to_snapshot(), Default::default());
}
