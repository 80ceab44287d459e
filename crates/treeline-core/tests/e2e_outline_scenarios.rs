#![forbid(unsafe_code)]

//! End-to-end reconciliation scenarios, driven through the harness fixtures:
//! a recording widget sink with an explicit visible-row table and a
//! map-backed children provider with injectable failures.

use treeline_core::{
    OutlineDataSource, ReconcileError, ReconcileOptions, SinkCapabilities, TreeReconciler,
};
use treeline_harness::{RecordingOutline, SinkCommand, StaticTree};

fn leaves() -> StaticTree<&'static str> {
    StaticTree::new()
}

// =============================================================================
// Cold start
// =============================================================================

#[test]
fn cold_start_inserts_both_roots_inside_one_batch() {
    let mut rec = TreeReconciler::new(leaves());
    let mut sink = RecordingOutline::new();
    rec.apply(&["A", "B"], &mut sink).unwrap();

    assert_eq!(sink.inserts(), vec![(0, None), (1, None)]);
    assert!(sink.batch_balanced());
    assert!(sink.inserts_inside_batch());

    // Reloads follow the batch: one per reconciled position, then one per
    // top-level element.
    assert_eq!(sink.reloaded_items(), vec!["A", "B", "A", "B"]);

    // Nothing was marked visible, so the refresh ends in a full reload.
    assert_eq!(sink.last_command(), Some(&SinkCommand::ReloadAll));
}

#[test]
fn reloads_never_precede_an_insert() {
    let mut rec = TreeReconciler::new(leaves());
    let mut sink = RecordingOutline::new();
    rec.apply(&["A", "B", "C"], &mut sink).unwrap();

    let commands = sink.commands();
    let last_insert = commands
        .iter()
        .rposition(|c| matches!(c, SinkCommand::InsertChild { .. }))
        .unwrap();
    let first_reload = commands
        .iter()
        .position(|c| matches!(c, SinkCommand::ReloadItem(_)))
        .unwrap();
    assert!(last_insert < first_reload);
}

// =============================================================================
// Value replacement
// =============================================================================

#[test]
fn replacing_a_value_reloads_the_item_the_widget_still_shows() {
    let mut rec = TreeReconciler::new(leaves());
    rec.apply(&["A", "B"], &mut RecordingOutline::new()).unwrap();

    let mut sink = RecordingOutline::new();
    rec.apply(&["A", "C"], &mut sink).unwrap();

    assert!(sink.inserts().is_empty(), "both positions already existed");
    let reloaded = sink.reloaded_items();
    assert!(
        reloaded.contains(&"B"),
        "the widget still displays B at position 1: {reloaded:?}"
    );
    assert!(
        reloaded.contains(&"A"),
        "top-level refresh covers unchanged roots too: {reloaded:?}"
    );
}

// =============================================================================
// Nested expansion
// =============================================================================

#[test]
fn nested_children_insert_under_their_parent_before_its_reload() {
    let provider = StaticTree::new().child("A", vec!["X", "Y"]);
    let mut rec = TreeReconciler::new(provider);
    let mut sink = RecordingOutline::new();
    rec.apply(&["A"], &mut sink).unwrap();

    assert_eq!(
        sink.inserts(),
        vec![(0, None), (0, Some("A")), (1, Some("A"))],
        "A's children insert under A's position, in order"
    );
    // All three inserts happen before any reload-item for "A".
    let commands = sink.commands();
    let first_reload = commands
        .iter()
        .position(|c| c == &SinkCommand::ReloadItem("A"))
        .unwrap();
    assert!(
        commands[..first_reload]
            .iter()
            .filter(|c| matches!(c, SinkCommand::InsertChild { .. }))
            .count()
            == 3
    );
}

// =============================================================================
// Row-range coalescing
// =============================================================================

#[test]
fn resolved_reload_rows_coalesce_to_min_max() {
    let mut rec = TreeReconciler::new(leaves());
    rec.apply(&["A", "B", "C"], &mut RecordingOutline::new())
        .unwrap();

    let mut sink = RecordingOutline::new();
    sink.set_row("A", 3);
    sink.set_row("B", 5);
    sink.set_row("C", 4);
    rec.apply(&["A", "B", "C"], &mut sink).unwrap();

    assert_eq!(
        sink.last_command(),
        Some(&SinkCommand::ReloadRows { first: 3, last: 5 })
    );
    assert!(
        !sink.commands().contains(&SinkCommand::ReloadAll),
        "a resolved range replaces the full reload"
    );
}

#[test]
fn collapsed_items_do_not_contribute_to_the_range() {
    let mut rec = TreeReconciler::new(leaves());
    rec.apply(&["A", "B"], &mut RecordingOutline::new()).unwrap();

    let mut sink = RecordingOutline::new();
    sink.set_row("A", 7); // B stays collapsed/unresolvable
    rec.apply(&["A", "B"], &mut sink).unwrap();

    assert_eq!(
        sink.last_command(),
        Some(&SinkCommand::ReloadRows { first: 7, last: 7 })
    );
}

// =============================================================================
// Partial failure
// =============================================================================

#[test]
fn provider_failure_leaves_completed_siblings_intact() {
    let provider = StaticTree::new()
        .child("A", vec!["X"])
        .fail_on("B");
    let mut rec = TreeReconciler::new(provider);
    let mut sink = RecordingOutline::new();

    let err = rec.apply(&["A", "B"], &mut sink).unwrap_err();
    assert!(matches!(err, ReconcileError::Provider(_)));

    // A's subtree reconciled fully and its commands were delivered.
    assert!(sink.inserts().contains(&(0, Some("A"))));
    assert!(sink.batch_balanced(), "batch closes even on failure");
    assert!(
        sink.reloaded_items().is_empty(),
        "refresh phase is skipped after a failed walk"
    );

    // The shadow tree kept A's subtree.
    let a = rec.root().child(0).unwrap();
    assert_eq!(a.value(), Some(&"A"));
    assert_eq!(a.child_count(), 1);

    // A later, clean snapshot recovers.
    let mut sink = RecordingOutline::new();
    rec.apply(&["A"], &mut sink).unwrap();
    assert!(sink.last_command().is_some());
}

// =============================================================================
// Capability degradation
// =============================================================================

#[test]
fn variant_a_sink_sees_only_reload_all_on_structural_change() {
    let mut rec = TreeReconciler::new(leaves());
    let mut sink = RecordingOutline::with_capabilities(SinkCapabilities::ROW_RANGE_RELOAD);
    rec.apply(&["A", "B"], &mut sink).unwrap();

    assert_eq!(sink.commands(), &[SinkCommand::ReloadAll]);
}

#[test]
fn variant_a_sink_gets_fine_reloads_once_structure_settles() {
    let mut rec = TreeReconciler::new(leaves());
    rec.apply(
        &["A"],
        &mut RecordingOutline::with_capabilities(SinkCapabilities::ROW_RANGE_RELOAD),
    )
    .unwrap();

    let mut sink = RecordingOutline::with_capabilities(SinkCapabilities::ROW_RANGE_RELOAD);
    sink.set_row("A", 0);
    rec.apply(&["A"], &mut sink).unwrap();
    assert_eq!(
        sink.commands(),
        &[
            SinkCommand::ReloadItem("A"),
            SinkCommand::ReloadItem("A"),
            SinkCommand::ReloadRows { first: 0, last: 0 },
        ]
    );
}

// =============================================================================
// Facade round trip
// =============================================================================

#[test]
fn widget_queries_reflect_the_applied_snapshot() {
    let provider = StaticTree::new().child("A", vec!["X", "Y"]);
    let source = OutlineDataSource::new(provider);
    let mut sink = RecordingOutline::new();
    source.apply(&["A", "B"], &mut sink).unwrap();

    assert_eq!(source.child_count(None).unwrap(), 2);
    assert_eq!(source.child(0, None).unwrap(), Some("A"));
    assert!(source.is_expandable(&"A").unwrap());
    assert!(!source.is_expandable(&"B").unwrap());
    assert_eq!(source.child(0, Some(&"A")).unwrap(), Some("X"));
}

#[test]
fn depth_limit_contains_a_cyclic_provider() {
    // "A" lists itself as its only child.
    let provider = StaticTree::new().child("A", vec!["A"]);
    let mut rec = TreeReconciler::with_options(
        provider,
        ReconcileOptions {
            max_depth: 16,
            ..ReconcileOptions::default()
        },
    );
    let mut sink = RecordingOutline::new();
    let err = rec.apply(&["A"], &mut sink).unwrap_err();
    assert!(matches!(err, ReconcileError::DepthLimit { limit: 16 }));
    assert!(sink.batch_balanced());
}
