use blueprint_graph::commands::Command;
use blueprint_graph::graph::{BOUNDARY_TYPE_ID, PortDirection};

use crate::harness::TestSession;

/// The canonical walk-through: A fans out to B and C, A is grouped.
/// One inferred "complete" output, one internal segment per original
/// edge, one external segment per distinct external target — and undo
/// brings back the original two edges with their original ids.
#[test]
fn grouping_a_fanout_source_routes_through_one_complete_port() {
    let mut session = TestSession::new();
    let a = session.add_node("emitter", (0.0, 0.0));
    let b = session.add_node("sink", (300.0, 0.0));
    let c = session.add_node("sink", (300.0, 160.0));
    let a_out = session.add_control_out(a, "o");
    let b_in = session.add_control_in(b, "i");
    let c_in = session.add_control_in(c, "i2");
    session.connect(a_out, b_in);
    session.connect(a_out, c_in);
    let original_to_b = session.edge_between(a_out, b_in).unwrap();
    let original_to_c = session.edge_between(a_out, c_in).unwrap();
    let before = session.snapshot();

    let frame_id = session.group(vec![a], "emitter group").unwrap();

    let frame = session.graph.frame(frame_id).unwrap().clone();
    let representative = session.graph.node(frame.representative_node).unwrap().clone();
    assert_eq!(representative.type_id, BOUNDARY_TYPE_ID);
    assert_eq!(frame.contained_nodes.len(), 1);
    assert!(frame.contained_nodes.contains(&a));
    assert!(!frame.is_collapsed);

    let outputs: Vec<_> = representative
        .ports
        .iter()
        .filter(|port| port.direction == PortDirection::Output)
        .collect();
    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs[0].name, "complete");
    let complete = outputs[0].id;

    assert!(session.graph.edge(original_to_b).is_none());
    assert!(session.graph.edge(original_to_c).is_none());
    assert_eq!(session.edge_count_between(a_out, complete), 1);
    assert_eq!(session.edge_count_between(complete, b_in), 1);
    assert_eq!(session.edge_count_between(complete, c_in), 1);

    assert!(session.undo());
    assert_eq!(session.snapshot(), before);
    assert!(session.graph.edge(original_to_b).is_some());
    assert!(session.graph.edge(original_to_c).is_some());
    assert!(session.graph.node(frame.representative_node).is_none());
    assert!(session.graph.frame(frame_id).is_none());
}

#[test]
fn n_same_shape_crossings_merge_into_one_boundary_input() {
    let mut session = TestSession::new();
    let trigger = session.add_node("trigger", (0.0, 0.0));
    let trigger_out = session.add_control_out(trigger, "fire");
    let mut selection = Vec::new();
    for i in 0..4 {
        let step = session.add_node("step", (250.0, 120.0 * i as f32));
        let step_in = session.add_control_in(step, "run");
        session.connect(trigger_out, step_in);
        selection.push(step);
    }

    let frame_id = session.group(selection, "steps").unwrap();

    let frame = session.graph.frame(frame_id).unwrap();
    let representative = session.graph.node(frame.representative_node).unwrap();
    let inputs: Vec<_> = representative
        .ports
        .iter()
        .filter(|port| port.direction == PortDirection::Input)
        .collect();
    assert_eq!(inputs.len(), 1, "four same-shape crossings, one port");
    let activate = inputs[0].id;

    // N internal segments, one deduplicated external segment.
    assert_eq!(
        session
            .graph
            .edges()
            .filter(|edge| edge.source_port == activate)
            .count(),
        4
    );
    assert_eq!(session.edge_count_between(trigger_out, activate), 1);
}

#[test]
fn grouping_excludes_already_contained_nodes() {
    let mut session = TestSession::new();
    let a = session.add_node("step", (0.0, 0.0));
    let b = session.add_node("step", (120.0, 0.0));
    let c = session.add_node("step", (240.0, 0.0));
    session.group(vec![a, b], "first").unwrap();

    let second = session.group(vec![a, b, c], "second").unwrap();

    let frame = session.graph.frame(second).unwrap();
    // |selection| - |already contained| = 3 - 2.
    assert_eq!(frame.contained_nodes.len(), 1);
    assert!(frame.contained_nodes.contains(&c));
}

#[test]
fn group_undo_redo_reproduces_identical_state() {
    let mut session = TestSession::new();
    let producer = session.add_node("producer", (0.0, 0.0));
    let consumer = session.add_node("consumer", (300.0, 0.0));
    let out = session.add_control_out(producer, "done");
    let input = session.add_control_in(consumer, "run");
    session.connect(out, input);

    session.group(vec![producer], "half");
    let after_group = session.snapshot();

    assert!(session.undo());
    assert!(session.redo());
    assert_eq!(
        session.snapshot(),
        after_group,
        "group redo must reuse recorded ids, boundary ports included"
    );
}

#[test]
fn ungroup_bypasses_the_boundary_node_with_cross_product_edges() {
    let mut session = TestSession::new();
    let trigger = session.add_node("trigger", (0.0, 0.0));
    let trigger_out = session.add_control_out(trigger, "fire");
    let left = session.add_node("step", (250.0, 0.0));
    let right = session.add_node("step", (250.0, 140.0));
    let left_in = session.add_control_in(left, "run");
    let right_in = session.add_control_in(right, "run");
    session.connect(trigger_out, left_in);
    session.connect(trigger_out, right_in);

    let frame_id = session.group(vec![left, right], "steps").unwrap();
    let representative = session.graph.frame(frame_id).unwrap().representative_node;
    let grouped = session.snapshot();

    session
        .history
        .execute(&mut session.graph, Command::ungroup(frame_id));

    assert!(session.graph.frame(frame_id).is_none());
    assert!(session.graph.node(representative).is_none());
    // Contained nodes survive and are directly wired again.
    assert!(session.graph.node(left).is_some());
    assert!(session.graph.node(right).is_some());
    assert_eq!(session.edge_count_between(trigger_out, left_in), 1);
    assert_eq!(session.edge_count_between(trigger_out, right_in), 1);

    assert!(session.undo());
    assert_eq!(session.snapshot(), grouped);
}

#[test]
fn lone_node_group_synthesizes_entry_and_exit() {
    let mut session = TestSession::new();
    let island = session.add_node("island", (50.0, 50.0));

    let frame_id = session.group(vec![island], "isolated").unwrap();

    let frame = session.graph.frame(frame_id).unwrap();
    let representative = session.graph.node(frame.representative_node).unwrap();
    let names: Vec<&str> = representative
        .ports
        .iter()
        .map(|port| port.name.as_str())
        .collect();
    assert_eq!(names, vec!["activate", "complete"]);

    // The frame bounds wrap the contained node.
    let node_bounds = session.graph.node(island).unwrap().bounds();
    assert!(frame.bounds.min.x < node_bounds.min.x);
    assert!(frame.bounds.min.y < node_bounds.min.y);
    assert!(frame.bounds.max.x > node_bounds.max.x);
    assert!(frame.bounds.max.y > node_bounds.max.y);
    // Representative sits above the frame.
    assert!(representative.position.y < frame.bounds.min.y);
}

#[test]
fn frame_collapse_and_retitle_round_trip_through_history() {
    let mut session = TestSession::new();
    let a = session.add_node("step", (0.0, 0.0));
    let frame_id = session.group(vec![a], "draft").unwrap();
    let before = session.snapshot();

    session.history.execute(
        &mut session.graph,
        Command::SetFrameTitle {
            frame_id,
            title: "final".to_string(),
            previous: None,
        },
    );
    session.history.execute(
        &mut session.graph,
        Command::SetFrameCollapsed {
            frame_id,
            collapsed: true,
            previous: None,
        },
    );

    let frame = session.graph.frame(frame_id).unwrap();
    assert_eq!(frame.title, "final");
    assert!(frame.is_collapsed);

    assert!(session.undo());
    assert!(session.undo());
    assert_eq!(session.snapshot(), before);
}
