use blueprint_graph::commands::history::{ChangeNotice, NoticeOrigin};
use blueprint_graph::commands::{ChangeClass, Command};
use euclid::default::Point2D;
use rstest::rstest;
use uuid::Uuid;

use crate::harness::TestSession;

#[test]
fn five_wiring_commands_commit_as_one_atomic_entry() {
    let mut session = TestSession::new();
    let a = session.add_node("a", (0.0, 0.0));
    let b = session.add_node("b", (300.0, 0.0));
    let a_out = session.add_control_out(a, "out");
    let b_in = session.add_control_in(b, "in");
    session.connect(a_out, b_in);
    let first_edge = session.edge_between(a_out, b_in).unwrap();
    let before = session.snapshot();
    let depth_before = session.history.undo_stack_len();

    session.history.begin_transaction("rewire batch");
    session
        .history
        .execute(&mut session.graph, Command::disconnect(first_edge));
    session
        .history
        .execute(&mut session.graph, Command::connect(a_out, b_in));
    session
        .history
        .execute(&mut session.graph, Command::connect(a_out, b_in));
    let replacement = session.edge_between(a_out, b_in).unwrap();
    session
        .history
        .execute(&mut session.graph, Command::disconnect(replacement));
    session
        .history
        .execute(&mut session.graph, Command::connect(a_out, b_in));
    session.history.commit_transaction();

    assert_eq!(
        session.history.undo_stack_len(),
        depth_before + 1,
        "five sub-commands, one undo entry"
    );

    // One undo unwinds all five in strict reverse order.
    assert!(session.undo());
    assert_eq!(session.snapshot(), before);
    assert_eq!(session.graph.edge(first_edge).map(|edge| edge.id), Some(first_edge));
}

#[test]
fn scoped_transaction_commits_on_early_return() {
    let mut session = TestSession::new();
    let a = session.add_node("a", (0.0, 0.0));
    let depth_before = session.history.undo_stack_len();

    let TestSession { graph, history } = &mut session;
    let result: Option<()> = history.transaction("bail out", |history| {
        history.execute(graph, Command::move_node(a, Point2D::new(99.0, 0.0)));
        None::<()>?;
        unreachable!();
    });

    assert!(result.is_none());
    assert_eq!(
        session.history.undo_stack_len(),
        depth_before + 1,
        "the early return still commits the scope"
    );
    assert_eq!(session.graph.node(a).unwrap().position.x, 99.0);
}

#[test]
fn transaction_wrapping_group_and_moves_is_atomic() {
    let mut session = TestSession::new();
    let a = session.add_node("step", (0.0, 0.0));
    let b = session.add_node("step", (150.0, 0.0));
    let before = session.snapshot();

    let TestSession { graph, history } = &mut session;
    history.transaction("group and tidy", |history| {
        history.execute(graph, Command::group(vec![a, b], "tidy"));
        history.execute(graph, Command::move_node(a, Point2D::new(10.0, 10.0)));
    });

    assert_eq!(session.graph.frame_count(), 1);
    assert!(session.undo());
    assert_eq!(session.snapshot(), before);
    assert_eq!(session.graph.frame_count(), 0);
}

#[rstest]
#[case::connect_is_structural(
    Command::connect(Uuid::from_u128(1), Uuid::from_u128(2)),
    ChangeClass::Structural
)]
#[case::disconnect_is_structural(Command::disconnect(Uuid::from_u128(3)), ChangeClass::Structural)]
#[case::move_is_style(
    Command::move_node(Uuid::from_u128(4), Point2D::new(1.0, 1.0)),
    ChangeClass::Style
)]
#[case::group_is_structural(Command::group(vec![Uuid::from_u128(5)], "g"), ChangeClass::Structural)]
#[case::ungroup_is_structural(Command::ungroup(Uuid::from_u128(6)), ChangeClass::Structural)]
fn change_class_per_command(#[case] command: Command, #[case] expected: ChangeClass) {
    assert_eq!(command.change_class(), expected);
}

#[test]
fn notification_sink_distinguishes_recompute_from_repaint() {
    let (sender, receiver) = crossbeam_channel::unbounded();
    let mut session = TestSession::new();
    session.history.set_notice_sender(sender);

    let a = session.add_node("a", (0.0, 0.0));
    session
        .history
        .execute(&mut session.graph, Command::move_node(a, Point2D::new(4.0, 4.0)));

    let notices: Vec<ChangeNotice> = receiver.try_iter().collect();
    assert_eq!(notices.len(), 2);
    assert_eq!(notices[0].class, ChangeClass::Structural);
    assert_eq!(notices[0].origin, NoticeOrigin::Execute);
    assert_eq!(notices[1].class, ChangeClass::Style);
}

#[test]
fn transaction_emits_a_single_notice_for_the_whole_batch() {
    let (sender, receiver) = crossbeam_channel::unbounded();
    let mut session = TestSession::new();
    let a = session.add_node("a", (0.0, 0.0));
    session.history.set_notice_sender(sender);

    let TestSession { graph, history } = &mut session;
    history.transaction("nudges", |history| {
        history.execute(graph, Command::move_node(a, Point2D::new(1.0, 0.0)));
        history.execute(graph, Command::move_node(a, Point2D::new(2.0, 0.0)));
    });

    let notices: Vec<ChangeNotice> = receiver.try_iter().collect();
    assert_eq!(notices.len(), 1);
    // All-style batch stays a repaint-only notice.
    assert_eq!(notices[0].class, ChangeClass::Style);
}
