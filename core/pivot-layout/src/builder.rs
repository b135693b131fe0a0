//! FILENAME: core/pivot-layout/src/builder.rs
//! Hierarchy Builder - turns the dataset plus field lists into header trees.
//!
//! Pivot mode partitions record indices recursively: the records are grouped
//! by the first field, each group by the second, and so on. Siblings appear
//! in first-seen record order. The measure level (`$$extra$$`) reuses the
//! parent's record partition under every measure node.
//!
//! Table mode produces a flat column level (one node per field) and one row
//! leaf per record.

use dataset::{Condition, Dataset, FieldIndex, FieldValue};

use crate::definition::{DataConfig, SheetMode};
use crate::error::LayoutError;
use crate::hierarchy::Hierarchy;
use crate::log_debug;
use crate::node::{Axis, Node, NodeIdx, EXTRA_FIELD, ROOT_IDX, SERIES_NUMBER_FIELD};

/// One level of a header tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Level {
    Field { name: String, index: FieldIndex },
    Measures,
}

/// Builds the row and column hierarchies for `config`.
///
/// Unknown fields and measures are reported when the dataset declares a
/// schema. A dataset with no schema yields root-only hierarchies.
pub fn build_hierarchies(
    dataset: &Dataset,
    config: &DataConfig,
    mode: SheetMode,
) -> Result<(Hierarchy, Hierarchy), LayoutError> {
    config.validate()?;

    if !dataset.has_schema() {
        log_debug!("HIERARCHY", "dataset has no schema, building empty hierarchies");
        return Ok((sealed(Axis::Row), sealed(Axis::Column)));
    }

    let (rows, columns) = match mode {
        SheetMode::Pivot => {
            let (row_levels, col_levels) = resolve_levels(dataset, config)?;
            let measures = &config.fields.values;
            (
                build_pivot_axis(dataset, Axis::Row, &row_levels, measures),
                build_pivot_axis(dataset, Axis::Column, &col_levels, measures),
            )
        }
        SheetMode::Table => build_table(dataset, config)?,
    };

    log_debug!(
        "HIERARCHY",
        "built mode={:?} rows: {} leaves / depth {}, columns: {} leaves / depth {}",
        mode,
        rows.leaf_count(),
        rows.max_level(),
        columns.leaf_count(),
        columns.max_level()
    );
    Ok((rows, columns))
}

fn sealed(axis: Axis) -> Hierarchy {
    let mut hierarchy = Hierarchy::new(axis);
    hierarchy.seal();
    hierarchy
}

// ============================================================================
// LEVEL RESOLUTION
// ============================================================================

/// Resolves both field lists into levels, placing the measure level.
///
/// An explicit `$$extra$$` entry keeps its position. Otherwise the measure
/// level is appended innermost on the column axis (`value_in_cols`) or the
/// row axis. Without measures, the sentinel is dropped.
pub fn resolve_levels(
    dataset: &Dataset,
    config: &DataConfig,
) -> Result<(Vec<Level>, Vec<Level>), LayoutError> {
    let fields = &config.fields;
    for measure in &fields.values {
        if dataset.field_index(measure).is_none() {
            return Err(LayoutError::UnknownMeasure(measure.clone()));
        }
    }

    let has_measures = !fields.values.is_empty();
    let mut rows = field_levels(dataset, Axis::Row, &fields.rows, has_measures)?;
    let mut columns = field_levels(dataset, Axis::Column, &fields.columns, has_measures)?;

    let placed = rows.contains(&Level::Measures) || columns.contains(&Level::Measures);
    if has_measures && !placed {
        if fields.value_in_cols {
            columns.push(Level::Measures);
        } else {
            rows.push(Level::Measures);
        }
    }
    Ok((rows, columns))
}

fn field_levels(
    dataset: &Dataset,
    axis: Axis,
    names: &[String],
    keep_measures: bool,
) -> Result<Vec<Level>, LayoutError> {
    let mut levels = Vec::with_capacity(names.len() + 1);
    for name in names {
        if name == EXTRA_FIELD {
            if keep_measures {
                levels.push(Level::Measures);
            }
            continue;
        }
        let index = dataset.field_index(name).ok_or_else(|| LayoutError::UnknownField {
            axis,
            field: name.clone(),
        })?;
        levels.push(Level::Field {
            name: name.clone(),
            index,
        });
    }
    Ok(levels)
}

// ============================================================================
// PIVOT MODE
// ============================================================================

fn build_pivot_axis(
    dataset: &Dataset,
    axis: Axis,
    levels: &[Level],
    measures: &[String],
) -> Hierarchy {
    let mut hierarchy = Hierarchy::new(axis);
    if !dataset.is_empty() && !levels.is_empty() {
        let all: Vec<usize> = (0..dataset.record_count()).collect();
        build_level(dataset, &mut hierarchy, ROOT_IDX, &all, levels, measures);
    }
    hierarchy.seal();
    hierarchy
}

fn build_level(
    dataset: &Dataset,
    hierarchy: &mut Hierarchy,
    parent: NodeIdx,
    records: &[usize],
    levels: &[Level],
    measures: &[String],
) {
    let Some((level, rest)) = levels.split_first() else {
        return;
    };

    match level {
        Level::Measures => {
            for measure in measures {
                let node = measure_node(hierarchy.node(parent), measure);
                let idx = hierarchy.push_node(parent, node);
                build_level(dataset, hierarchy, idx, records, rest, measures);
            }
        }
        Level::Field { name, index } => {
            for (value_id, group) in dataset.partition(records, *index) {
                let value = dataset.value(*index, value_id).clone();
                let id = unique_child_id(hierarchy, parent, &value.to_string());
                let node = value_node(hierarchy.node(parent), id, name, value);
                let idx = hierarchy.push_node(parent, node);
                build_level(dataset, hierarchy, idx, &group, rest, measures);
            }
        }
    }
}

/// Values of different types can print alike (`1` and `"1"`); later
/// siblings get a `#n` suffix so ids stay unique.
fn unique_child_id(hierarchy: &Hierarchy, parent: NodeIdx, segment: &str) -> String {
    let parent_id = &hierarchy.node(parent).id;
    let id = Node::child_id(parent_id, segment);
    if hierarchy.index_of(&id).is_none() {
        return id;
    }
    (1..)
        .map(|n| Node::child_id(parent_id, &format!("{}#{}", segment, n)))
        .find(|candidate| hierarchy.index_of(candidate).is_none())
        .unwrap_or(id)
}

fn value_node(parent: &Node, id: String, field: &str, value: FieldValue) -> Node {
    let mut node = Node::new(
        id,
        field.to_string(),
        value.clone(),
        value.label(),
    );
    node.query = parent.query.clone();
    node.query.push(Condition::new(field, value));
    node.measure = parent.measure.clone();
    node
}

fn measure_node(parent: &Node, measure: &str) -> Node {
    let mut node = Node::new(
        Node::child_id(&parent.id, measure),
        EXTRA_FIELD.to_string(),
        FieldValue::text(measure),
        measure.to_string(),
    );
    node.query = parent.query.clone();
    node.measure = Some(measure.to_string());
    node
}

// ============================================================================
// TABLE MODE
// ============================================================================

fn build_table(dataset: &Dataset, config: &DataConfig) -> Result<(Hierarchy, Hierarchy), LayoutError> {
    let mut columns = Hierarchy::new(Axis::Column);
    for field in &config.fields.columns {
        if field == EXTRA_FIELD {
            continue;
        }
        if dataset.field_index(field).is_none() {
            return Err(LayoutError::UnknownField {
                axis: Axis::Column,
                field: field.clone(),
            });
        }
        let node = Node::new(
            Node::child_id(&columns.root().id, field),
            field.clone(),
            FieldValue::text(field.as_str()),
            field.clone(),
        );
        columns.push_node(ROOT_IDX, node);
    }
    columns.seal();

    let mut rows = Hierarchy::new(Axis::Row);
    for record in 0..dataset.record_count() {
        let number = record + 1;
        let mut node = Node::new(
            Node::child_id(&rows.root().id, &record.to_string()),
            SERIES_NUMBER_FIELD.to_string(),
            FieldValue::from(number as f64),
            number.to_string(),
        );
        node.record_index = Some(record);
        rows.push_node(ROOT_IDX, node);
    }
    rows.seal();

    Ok((rows, columns))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Dataset {
        let mut ds = Dataset::with_fields(["province", "city", "type", "price"]);
        ds.add_record(&["zj".into(), "hz".into(), "pen".into(), 1.0.into()]);
        ds.add_record(&["sc".into(), "cd".into(), "paper".into(), 2.0.into()]);
        ds.add_record(&["zj".into(), "nb".into(), "pen".into(), 3.0.into()]);
        ds
    }

    #[test]
    fn test_measure_level_defaults_to_columns() {
        let config = DataConfig::new(&["province"], &["type"], &["price"]);
        let (rows, columns) = resolve_levels(&dataset(), &config).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(columns.last(), Some(&Level::Measures));

        let mut config = config;
        config.fields.value_in_cols = false;
        let (rows, columns) = resolve_levels(&dataset(), &config).unwrap();
        assert_eq!(rows.last(), Some(&Level::Measures));
        assert_eq!(columns.len(), 1);
    }

    #[test]
    fn test_sentinel_dropped_without_measures() {
        let config = DataConfig::new(&["province", EXTRA_FIELD], &[], &[]);
        let (rows, _) = resolve_levels(&dataset(), &config).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_pivot_nodes_carry_query() {
        let config = DataConfig::new(&["province", "city"], &[], &[]);
        let (rows, _) = build_hierarchies(&dataset(), &config, SheetMode::Pivot).unwrap();
        let leaf = rows.get("root[&]zj[&]nb").unwrap();
        assert_eq!(leaf.level, 2);
        assert_eq!(
            leaf.query.as_slice(),
            &[Condition::new("province", "zj"), Condition::new("city", "nb")]
        );
    }

    #[test]
    fn test_measure_nodes() {
        let config = DataConfig::new(&[], &["type"], &["price"]);
        let (_, columns) = build_hierarchies(&dataset(), &config, SheetMode::Pivot).unwrap();
        let node = columns.get("root[&]pen[&]price").unwrap();
        assert!(node.is_measure());
        assert_eq!(node.measure.as_deref(), Some("price"));
        assert_eq!(node.query.as_slice(), &[Condition::new("type", "pen")]);
    }

    #[test]
    fn test_values_printing_alike_get_distinct_ids() {
        let mut ds = Dataset::with_fields(["k"]);
        ds.add_record(&[1.0.into()]);
        ds.add_record(&["1".into()]);
        let config = DataConfig::new(&["k"], &[], &[]);
        let (rows, _) = build_hierarchies(&ds, &config, SheetMode::Pivot).unwrap();
        assert_eq!(rows.leaf_ids(), vec!["root[&]1", "root[&]1#1"]);
    }

    #[test]
    fn test_unknown_fields() {
        let ds = dataset();
        let config = DataConfig::new(&["country"], &[], &[]);
        assert!(matches!(
            build_hierarchies(&ds, &config, SheetMode::Pivot),
            Err(LayoutError::UnknownField { axis: Axis::Row, field }) if field == "country"
        ));
        let config = DataConfig::new(&["province"], &[], &["cost"]);
        assert!(matches!(
            build_hierarchies(&ds, &config, SheetMode::Pivot),
            Err(LayoutError::UnknownMeasure(m)) if m == "cost"
        ));
    }
}
