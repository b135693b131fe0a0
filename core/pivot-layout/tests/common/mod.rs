//! FILENAME: tests/common/mod.rs
//! Test harness and fixtures for pivot layout integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use dataset::{Dataset, FieldValue};
use pivot_layout::{
    DataConfig, HierarchyType, LayoutEventKind, Node, PivotLayoutEngine, SheetOptions,
};

// ============================================================================
// FIXTURES
// ============================================================================

/// Sales fixture: (province, city, type, sub_type, price, cost)
pub struct SalesFixture;

impl SalesFixture {
    pub fn headers() -> Vec<&'static str> {
        vec!["province", "city", "type", "sub_type", "price", "cost"]
    }

    pub fn data() -> Vec<(&'static str, &'static str, &'static str, &'static str, f64, f64)> {
        vec![
            ("zhejiang", "hangzhou", "furniture", "table", 10.0, 7.0),
            ("zhejiang", "hangzhou", "office", "pen", 3.0, 1.0),
            ("zhejiang", "ningbo", "furniture", "sofa", 20.0, 15.0),
            ("zhejiang", "ningbo", "office", "paper", 2.0, 1.5),
            ("sichuan", "chengdu", "furniture", "table", 12.0, 8.0),
            ("sichuan", "chengdu", "office", "pen", 4.0, 2.0),
            ("sichuan", "mianyang", "furniture", "sofa", 25.0, 18.0),
            ("sichuan", "mianyang", "office", "paper", 1.0, 0.5),
        ]
    }

    pub fn dataset() -> Dataset {
        let mut ds = Dataset::with_fields(Self::headers());
        for (province, city, kind, sub_type, price, cost) in Self::data() {
            ds.add_record(&[
                FieldValue::from(province),
                FieldValue::from(city),
                FieldValue::from(kind),
                FieldValue::from(sub_type),
                FieldValue::from(price),
                FieldValue::from(cost),
            ]);
        }
        ds
    }

    /// rows [province, city], columns [type], values [price]
    pub fn grid_config() -> DataConfig {
        DataConfig::new(&["province", "city"], &["type"], &["price"])
    }

    /// rows [province, city, type], values [price]
    pub fn tree_config() -> DataConfig {
        DataConfig::new(&["province", "city", "type"], &[], &["price"])
    }
}

/// `count` records: id = "r<i>", group = "g<i / 10>", value = i.
pub fn numbered_dataset(count: usize) -> Dataset {
    let mut ds = Dataset::with_fields(["id", "group", "value"]);
    for i in 0..count {
        ds.add_record(&[
            FieldValue::from(format!("r{}", i)),
            FieldValue::from(format!("g{}", i / 10)),
            FieldValue::from(i as f64),
        ]);
    }
    ds
}

pub fn tree_options() -> SheetOptions {
    SheetOptions {
        hierarchy_type: HierarchyType::Tree,
        ..SheetOptions::default()
    }
}

// ============================================================================
// HARNESS
// ============================================================================

/// Engine plus a log of every emitted event kind.
pub struct TestHarness {
    pub engine: PivotLayoutEngine,
    pub events: Rc<RefCell<Vec<LayoutEventKind>>>,
}

impl TestHarness {
    pub fn new(dataset: Dataset, config: DataConfig, options: SheetOptions) -> Self {
        let mut engine = PivotLayoutEngine::new(dataset, config, options).unwrap();
        let events: Rc<RefCell<Vec<LayoutEventKind>>> = Rc::default();
        let sink = Rc::clone(&events);
        engine.subscribe(Box::new(move |event| sink.borrow_mut().push(event.kind())));
        TestHarness { engine, events }
    }

    pub fn sales_grid() -> Self {
        Self::new(SalesFixture::dataset(), SalesFixture::grid_config(), SheetOptions::default())
    }

    pub fn sales_tree() -> Self {
        Self::new(SalesFixture::dataset(), SalesFixture::tree_config(), tree_options())
    }

    pub fn take_events(&self) -> Vec<LayoutEventKind> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    pub fn row_leaf_ids(&self) -> Vec<String> {
        self.engine.rows().leaf_ids().into_iter().map(String::from).collect()
    }

    pub fn column_leaf_ids(&self) -> Vec<String> {
        self.engine.columns().leaf_ids().into_iter().map(String::from).collect()
    }

    pub fn row(&self, id: &str) -> &Node {
        self.engine.rows().get(id).unwrap()
    }

    pub fn column(&self, id: &str) -> &Node {
        self.engine.columns().get(id).unwrap()
    }
}

/// Leaf ordinals must be exactly 0..N-1 in display order.
pub fn assert_dense_leaf_indices(hierarchy: &pivot_layout::Hierarchy) {
    let ordinals: Vec<Option<usize>> = hierarchy.leaf_nodes().map(|n| n.leaf_index).collect();
    let expected: Vec<Option<usize>> = (0..hierarchy.leaf_count()).map(Some).collect();
    assert_eq!(ordinals, expected);
}

/// (x, y, width, height) of a node.
pub fn geometry(node: &Node) -> (f64, f64, f64, f64) {
    (node.x, node.y, node.width, node.height)
}
