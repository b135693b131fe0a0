//! FILENAME: tests/test_viewport.rs
//! Integration tests for scrolling, pagination and visible slices.

mod common;

use common::{numbered_dataset, SalesFixture, TestHarness};
use pivot_layout::{
    DataConfig, FrozenOptions, LayoutError, LayoutEventKind, Pagination, ScrollOffset,
    SheetOptions, Sizing,
};

/// 30 rows of 30 px under a 30 px column header; 170 px of rows in view.
fn numbered(options: SheetOptions) -> TestHarness {
    TestHarness::new(
        numbered_dataset(30),
        DataConfig::new(&["id"], &[], &["value"]),
        SheetOptions {
            height: 200.0,
            ..options
        },
    )
}

fn ids(h: &TestHarness, leaves: &[usize]) -> Vec<String> {
    leaves
        .iter()
        .map(|&idx| h.engine.rows().node(idx).id.clone())
        .collect()
}

// ============================================================================
// PAGINATION
// ============================================================================

#[test]
fn test_page_change_resets_scroll() {
    let mut h = numbered(SheetOptions {
        col_sizing: Sizing::Fixed { size: 1000.0 },
        pagination: Some(Pagination::new(1, 10)),
        ..SheetOptions::default()
    });
    assert!(h.engine.scroll_to(50.0, 100.0));
    assert_eq!(h.engine.scroll(), ScrollOffset::new(50.0, 100.0));
    h.take_events();

    h.engine.set_pagination(Some(Pagination::new(2, 5))).unwrap();
    assert_eq!(h.engine.scroll(), ScrollOffset::default());
    assert_eq!(h.engine.page_count(), 6);
    assert_eq!(h.take_events(), vec![LayoutEventKind::PaginationChanged]);

    let slice = h.engine.visible();
    assert_eq!(slice.page, 5..10);
    assert_eq!(
        ids(&h, &slice.row_leaves),
        vec!["root[&]r5", "root[&]r6", "root[&]r7", "root[&]r8", "root[&]r9"]
    );
}

#[test]
fn test_paged_scroll_is_bounded_by_page() {
    let mut h = numbered(SheetOptions {
        pagination: Some(Pagination::new(1, 10)),
        ..SheetOptions::default()
    });
    // 300 px page in a 170 px view
    h.engine.scroll_to(0.0, 10_000.0);
    assert_eq!(h.engine.scroll().y, 130.0);

    h.engine.set_pagination(Some(Pagination::new(2, 5))).unwrap();
    // 150 px page fits
    assert!(!h.engine.scroll_to(0.0, 10.0));
    assert_eq!(h.engine.scroll().y, 0.0);

    // Row coordinates on screen restart at the page
    let slice = h.engine.visible();
    let first = h.engine.rows().node(slice.row_leaves[0]);
    assert_eq!(first.y, 150.0);
    assert_eq!(slice.transform.to_screen(pivot_layout::Axis::Row, first).1, 30.0);
}

#[test]
fn test_page_past_end_is_empty() {
    let mut h = numbered(SheetOptions::default());
    h.engine.set_pagination(Some(Pagination::new(10, 5))).unwrap();
    let slice = h.engine.visible();
    assert_eq!(slice.page, 30..30);
    assert!(slice.is_empty());
    assert_eq!(h.engine.page_count(), 6);
}

#[test]
fn test_invalid_pagination_is_rejected() {
    let mut h = numbered(SheetOptions::default());
    h.engine.scroll_to(0.0, 40.0);
    assert!(matches!(
        h.engine.set_pagination(Some(Pagination::new(0, 5))),
        Err(LayoutError::InvalidPagination { current: 0, page_size: 5 })
    ));
    assert_eq!(h.engine.pagination(), None);
    assert_eq!(h.engine.scroll().y, 40.0);
}

#[test]
fn test_without_pagination_one_page() {
    let h = numbered(SheetOptions::default());
    assert_eq!(h.engine.page_count(), 1);
    assert_eq!(h.engine.visible().page, 0..30);
}

// ============================================================================
// SCROLLING
// ============================================================================

#[test]
fn test_scroll_window() {
    let mut h = numbered(SheetOptions::default());
    assert_eq!(h.engine.visible().rows, 0..6);

    h.engine.scroll_to(0.0, 45.0);
    let slice = h.engine.visible();
    assert_eq!(slice.rows, 1..8);
    assert_eq!(slice.row_leaves.len(), 7);
    assert_eq!(ids(&h, &slice.row_leaves)[0], "root[&]r1");
}

#[test]
fn test_scroll_is_clamped() {
    let mut h = numbered(SheetOptions::default());
    h.engine.scroll_to(0.0, 10_000.0);
    assert_eq!(h.engine.scroll().y, 730.0);
    assert_eq!(h.engine.visible().rows, 24..30);

    h.engine.scroll_to(-5.0, -5.0);
    assert_eq!(h.engine.scroll(), ScrollOffset::default());

    h.engine.scroll_to(f64::NAN, 60.0);
    assert_eq!(h.engine.scroll(), ScrollOffset::new(0.0, 60.0));
}

#[test]
fn test_scroll_by() {
    let mut h = numbered(SheetOptions::default());
    h.take_events();
    assert!(h.engine.scroll_by(0.0, 30.0));
    assert!(h.engine.scroll_by(0.0, 30.0));
    assert_eq!(h.engine.scroll().y, 60.0);
    assert!(!h.engine.scroll_by(0.0, 0.0));
    assert_eq!(
        h.take_events(),
        vec![LayoutEventKind::ScrollChanged, LayoutEventKind::ScrollChanged]
    );
}

#[test]
fn test_frozen_rows_stay_in_view() {
    let mut h = numbered(SheetOptions {
        frozen: FrozenOptions {
            row_count: 2,
            ..FrozenOptions::default()
        },
        ..SheetOptions::default()
    });
    h.engine.scroll_to(0.0, 45.0);

    let slice = h.engine.visible();
    assert_eq!(slice.frozen_rows, 0..2);
    assert_eq!(slice.rows, 3..8);
    assert_eq!(
        ids(&h, &slice.row_leaves[..3]),
        vec!["root[&]r0", "root[&]r1", "root[&]r3"]
    );
}

#[test]
fn test_shrinking_content_reclamps_scroll() {
    let mut h = numbered(SheetOptions::default());
    h.engine.scroll_to(0.0, 500.0);
    h.take_events();

    h.engine.resize(600.0, 2000.0).unwrap();
    assert_eq!(h.engine.scroll().y, 0.0);
    assert_eq!(
        h.take_events(),
        vec![
            LayoutEventKind::BeforeLayout,
            LayoutEventKind::ScrollChanged,
            LayoutEventKind::AfterLayout,
        ]
    );
}

#[test]
fn test_no_room_for_rows() {
    // Shorter than the column header
    let h = TestHarness::new(
        numbered_dataset(30),
        DataConfig::new(&["id"], &[], &["value"]),
        SheetOptions {
            height: 20.0,
            ..SheetOptions::default()
        },
    );
    let slice = h.engine.visible();
    assert!(slice.row_leaves.is_empty());
    assert!(slice.is_empty());
}

// ============================================================================
// HEADERS
// ============================================================================

#[test]
fn test_spanning_headers_follow_scroll() {
    let options = SheetOptions {
        height: 120.0,
        ..SheetOptions::default()
    };
    let mut h = TestHarness::new(SalesFixture::dataset(), SalesFixture::grid_config(), options);

    let slice = h.engine.visible();
    let header_ids = |slice: &pivot_layout::ViewportSlice, h: &TestHarness| -> Vec<String> {
        slice
            .row_headers
            .iter()
            .map(|&idx| h.engine.rows().node(idx).id.clone())
            .collect()
    };
    assert_eq!(header_ids(&slice, &h), vec!["root[&]zhejiang"]);

    h.engine.scroll_to(0.0, 60.0);
    let slice = h.engine.visible();
    assert_eq!(slice.rows, 2..4);
    assert_eq!(header_ids(&slice, &h), vec!["root[&]sichuan"]);

    let col_headers: Vec<&str> = slice
        .col_headers
        .iter()
        .map(|&idx| h.engine.columns().node(idx).id.as_str())
        .collect();
    assert_eq!(col_headers, vec!["root[&]furniture", "root[&]office"]);
}
