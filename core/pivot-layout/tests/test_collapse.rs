//! FILENAME: tests/test_collapse.rs
//! Integration tests for tree-mode expand/collapse.

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::{tree_options, SalesFixture, TestHarness};
use pivot_layout::{HierarchyType, LayoutEvent, LayoutEventKind, SheetOptions};

const HANGZHOU_FURNITURE: &str = "root[&]zhejiang[&]hangzhou[&]furniture";

#[test]
fn test_fully_expanded_by_default() {
    let h = TestHarness::sales_tree();
    assert_eq!(h.engine.visible_row_count(), 8);
    assert_eq!(h.engine.content_height(), 240.0);
    assert_eq!(h.engine.is_row_visible(HANGZHOU_FURNITURE), Some(true));
}

#[test]
fn test_collapse_all_folds_to_top_level() {
    let mut h = TestHarness::sales_tree();
    h.engine.collapse_all(true);

    assert_eq!(h.engine.visible_row_count(), 2);
    assert_eq!(h.engine.content_height(), 60.0);
    assert_eq!(h.engine.is_row_visible(HANGZHOU_FURNITURE), Some(false));
    assert_eq!(
        h.engine.nearest_visible_row(HANGZHOU_FURNITURE).map(|n| n.id.as_str()),
        Some("root[&]zhejiang")
    );

    // A collapsed node fills every band of the row header
    let zhejiang = h.row("root[&]zhejiang");
    assert!(zhejiang.is_collapsed);
    assert_eq!((zhejiang.x, zhejiang.width), (0.0, 288.0));
    assert_eq!((zhejiang.y, zhejiang.height), (0.0, 30.0));
    assert!(!h.row("root[&]zhejiang[&]hangzhou").has_geometry());
}

#[test]
fn test_collapse_all_round_trip() {
    let mut h = TestHarness::sales_tree();
    let expanded = h.row_leaf_ids();

    h.engine.set_collapsed("root[&]sichuan[&]chengdu", true);
    h.engine.collapse_all(true);
    h.engine.collapse_all(false);

    assert!(h.engine.collapse_state().collapsed_rows().is_empty());
    assert_eq!(h.engine.visible_row_count(), 8);
    assert_eq!(h.row_leaf_ids(), expanded);
    assert!(h.engine.rows().nodes().iter().all(|n| !n.is_collapsed));
}

#[test]
fn test_explicit_entry_beats_hierarchy_flag() {
    let mut h = TestHarness::sales_tree();
    h.engine.collapse_all(true);
    h.engine.set_collapsed("root[&]zhejiang", false);

    // zhejiang opens onto its collapsed cities; sichuan stays folded
    assert_eq!(h.engine.visible_row_count(), 3);
    assert_eq!(
        h.engine.nearest_visible_row(HANGZHOU_FURNITURE).map(|n| n.id.as_str()),
        Some("root[&]zhejiang[&]hangzhou")
    );
}

#[test]
fn test_collapsing_never_adds_rows() {
    let mut h = TestHarness::sales_tree();
    let internal: Vec<String> = h
        .engine
        .row_nodes(None)
        .into_iter()
        .filter(|n| !n.is_leaf())
        .map(|n| n.id.clone())
        .collect();
    assert_eq!(internal.len(), 6);

    for id in &internal {
        let before = h.engine.visible_row_count();
        h.engine.set_collapsed(id, true);
        assert!(h.engine.visible_row_count() <= before, "collapsing {} added rows", id);
        h.engine.set_collapsed(id, false);
        assert_eq!(h.engine.visible_row_count(), before);
    }
}

#[test]
fn test_collapse_one_province() {
    let mut h = TestHarness::sales_tree();
    h.engine.set_collapsed("root[&]zhejiang", true);

    assert_eq!(h.engine.visible_row_count(), 5);
    assert_eq!(h.engine.content_height(), 150.0);
    assert_eq!(h.engine.layout().rows.len(), 5);
    // sichuan now starts right below the folded zhejiang row
    assert_eq!(h.row("root[&]sichuan").y, 30.0);
    assert_eq!(h.row("root[&]sichuan[&]chengdu[&]furniture").y, 30.0);
}

#[test]
fn test_toggle_flips_state() {
    let mut h = TestHarness::sales_tree();
    assert!(h.engine.toggle_collapsed("root[&]zhejiang"));
    assert_eq!(h.engine.visible_row_count(), 5);
    assert!(!h.engine.toggle_collapsed("root[&]zhejiang"));
    assert_eq!(h.engine.visible_row_count(), 8);
}

#[test]
fn test_leaves_never_collapse() {
    let mut h = TestHarness::sales_tree();
    h.engine.set_collapsed(HANGZHOU_FURNITURE, true);
    assert_eq!(h.engine.visible_row_count(), 8);
    assert!(!h.row(HANGZHOU_FURNITURE).is_collapsed);
}

#[test]
fn test_unknown_id_is_stored() {
    let mut h = TestHarness::sales_tree();
    h.engine.set_collapsed("testId", true);

    assert_eq!(h.engine.collapse_state().collapsed_rows().get("testId"), Some(&true));
    assert_eq!(h.engine.options().collapsed_rows.get("testId"), Some(&true));
    assert_eq!(h.engine.visible_row_count(), 8);
    assert_eq!(h.engine.is_row_visible("testId"), None);
}

#[test]
fn test_expand_depth() {
    let options = SheetOptions {
        expand_depth: Some(2),
        ..tree_options()
    };
    let mut h = TestHarness::new(SalesFixture::dataset(), SalesFixture::tree_config(), options);

    // Cities fold; provinces stay open
    assert_eq!(h.engine.visible_row_count(), 4);
    assert!(h.row("root[&]zhejiang[&]hangzhou").is_collapsed);
    assert!(!h.row("root[&]zhejiang").is_collapsed);

    h.engine.set_expand_depth(None);
    assert_eq!(h.engine.visible_row_count(), 8);
}

#[test]
fn test_collapse_event_carries_state() {
    let mut h = TestHarness::sales_tree();
    h.take_events();
    h.engine.set_collapsed("root[&]sichuan", true);

    assert_eq!(
        h.take_events(),
        vec![
            LayoutEventKind::BeforeLayout,
            LayoutEventKind::AfterLayout,
            LayoutEventKind::CollapseChanged,
        ]
    );
}

#[test]
fn test_collapse_listener_sees_revealed_geometry() {
    let mut h = TestHarness::sales_tree();
    h.engine.collapse_all(true);
    let seen: Rc<RefCell<Vec<(String, f64)>>> = Rc::default();
    let sink = Rc::clone(&seen);
    h.engine.subscribe_to(
        LayoutEventKind::CollapseChanged,
        Box::new(move |event| {
            if let LayoutEvent::CollapseChanged { rows, .. } = event {
                let placed = rows
                    .nodes()
                    .iter()
                    .filter(|n| n.level == 2 && n.has_geometry())
                    .map(|n| (n.id.clone(), n.y));
                sink.borrow_mut().extend(placed);
            }
        }),
    );

    h.engine.set_collapsed("root[&]sichuan", false);
    // Cities of sichuan now show below the folded zhejiang
    assert_eq!(
        *seen.borrow(),
        vec![
            ("root[&]sichuan[&]chengdu".to_string(), 30.0),
            ("root[&]sichuan[&]mianyang".to_string(), 60.0),
        ]
    );
}

#[test]
fn test_grid_mode_ignores_collapse() {
    let options = SheetOptions {
        hierarchy_type: HierarchyType::Grid,
        ..SheetOptions::default()
    };
    let mut h = TestHarness::new(SalesFixture::dataset(), SalesFixture::tree_config(), options);
    h.take_events();

    h.engine.collapse_all(true);
    assert_eq!(h.engine.visible_row_count(), 8);
    assert_eq!(h.engine.content_height(), 240.0);
    assert!(h.engine.rows().nodes().iter().all(|n| !n.is_collapsed));
    assert_eq!(h.engine.is_row_visible(HANGZHOU_FURNITURE), Some(true));
    // The state is kept and reported, but no layout runs
    assert!(h.engine.options().hierarchy_collapse);
    assert_eq!(h.take_events(), vec![LayoutEventKind::CollapseChanged]);
}

#[test]
fn test_collapse_survives_sort() {
    let mut h = TestHarness::sales_tree();
    h.engine.set_collapsed("root[&]zhejiang", true);
    h.engine
        .set_sort_params(vec![pivot_layout::SortParam::new(
            "province",
            pivot_layout::SortMethod::Asc,
        )])
        .unwrap();

    assert!(h.row("root[&]zhejiang").is_collapsed);
    assert_eq!(h.engine.visible_row_count(), 5);
    // sichuan (4 rows) now comes first
    assert_eq!(h.row("root[&]zhejiang").y, 120.0);
}
