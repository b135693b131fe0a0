//! FILENAME: core/pivot-layout/src/sort.rs
//! Sort Engine - reorders sibling groups of a hierarchy.
//!
//! Every pass starts from the base order captured when the hierarchy was
//! built, so applying the same parameters twice gives the same result and
//! changing parameters never compounds earlier sorts.

use std::cmp::Ordering;

use dataset::{Condition, Dataset, FieldIndex, FieldValue, MeasureQuery, OrderedFloat};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::definition::{SortMethod, SortParam};
use crate::hierarchy::Hierarchy;
use crate::log_debug;
use crate::node::{Node, NodeIdx, ROOT_IDX, SERIES_NUMBER_FIELD};

/// Keeps the last param for each field, in the order those last entries appear.
pub fn effective_params(params: &[SortParam]) -> Vec<&SortParam> {
    let mut last: FxHashMap<&str, usize> = FxHashMap::default();
    for (i, param) in params.iter().enumerate() {
        last.insert(param.sort_field_id.as_str(), i);
    }
    params
        .iter()
        .enumerate()
        .filter(|(i, p)| last.get(p.sort_field_id.as_str()) == Some(i))
        .map(|(_, p)| p)
        .collect()
}

/// Reorders `hierarchy` per `params`, starting from its base order.
///
/// Returns the ids of the fields that matched at least one sibling group.
/// Params for fields absent from this hierarchy are skipped.
pub fn apply_sort(
    hierarchy: &mut Hierarchy,
    params: &[SortParam],
    query: &dyn MeasureQuery,
) -> Vec<String> {
    hierarchy.restore_base_order();

    let mut applied = Vec::new();
    for param in effective_params(params) {
        let parents = sibling_groups(hierarchy, &param.sort_field_id);
        if parents.is_empty() {
            log_debug!(
                "SORT",
                "{} axis has no level for '{}'",
                hierarchy.axis(),
                param.sort_field_id
            );
            continue;
        }
        for parent in &parents {
            let order = sorted_children(hierarchy, *parent, param, query);
            hierarchy.set_children(*parent, order);
        }
        log_debug!(
            "SORT",
            "{} axis: sorted {} group(s) of '{}' {:?}",
            hierarchy.axis(),
            parents.len(),
            param.sort_field_id,
            param.sort_method
        );
        applied.push(param.sort_field_id.clone());
    }

    hierarchy.reindex_leaves();
    hierarchy.bump_revision();
    applied
}

/// Reorders the record rows of a table-mode hierarchy, starting from its
/// base order.
///
/// Each param names a record field (or `$$series_number$$`); the first
/// effective param is the primary key and later ones break ties. Params
/// for fields the dataset does not know are skipped.
pub fn apply_table_sort(rows: &mut Hierarchy, params: &[SortParam], dataset: &Dataset) -> Vec<String> {
    rows.restore_base_order();

    let keyed: Vec<(&SortParam, Option<FieldIndex>)> = effective_params(params)
        .into_iter()
        .filter_map(|param| {
            let field = param.sort_by_measure.as_deref().unwrap_or(&param.sort_field_id);
            if field == SERIES_NUMBER_FIELD {
                Some((param, None))
            } else {
                dataset.field_index(field).map(|index| (param, Some(index)))
            }
        })
        .collect();

    let mut order = rows.root().children.clone();
    // Stable passes from the last key to the first
    for (param, field) in keyed.iter().rev() {
        let cell = |idx: NodeIdx| table_cell(rows, dataset, *field, idx);
        match param.sort_method {
            SortMethod::Custom => {
                let listed = param.sort_by.as_deref().unwrap_or_default();
                let rank: FxHashMap<String, usize> = listed
                    .iter()
                    .enumerate()
                    .rev()
                    .map(|(i, v)| (v.clone(), i))
                    .collect();
                order.sort_by_key(|&idx| {
                    rank.get(&cell(idx).to_string()).copied().unwrap_or(listed.len())
                });
            }
            SortMethod::Asc | SortMethod::Desc => {
                let descending = param.sort_method == SortMethod::Desc;
                order.sort_by(|&a, &b| directed(cell(a).cmp(cell(b)), descending));
            }
        }
    }
    if !keyed.is_empty() {
        rows.set_children(ROOT_IDX, order);
        log_debug!("SORT", "table rows sorted by {} key(s)", keyed.len());
    }

    rows.reindex_leaves();
    rows.bump_revision();
    keyed.into_iter().map(|(param, _)| param.sort_field_id.clone()).collect()
}

/// The record value behind a row, or the row number when `field` is `None`.
fn table_cell<'a>(
    rows: &'a Hierarchy,
    dataset: &'a Dataset,
    field: Option<FieldIndex>,
    idx: NodeIdx,
) -> &'a FieldValue {
    let node = rows.node(idx);
    match (field, node.record_index) {
        (Some(field), Some(record)) => dataset.record_value(record, field),
        _ => &node.value,
    }
}

/// Parents whose children represent `field`.
fn sibling_groups(hierarchy: &Hierarchy, field: &str) -> Vec<NodeIdx> {
    hierarchy
        .nodes()
        .iter()
        .enumerate()
        .filter(|(_, node)| {
            node.children
                .first()
                .is_some_and(|&child| hierarchy.node(child).key == field)
        })
        .map(|(idx, _)| idx)
        .collect()
}

fn sorted_children(
    hierarchy: &Hierarchy,
    parent: NodeIdx,
    param: &SortParam,
    query: &dyn MeasureQuery,
) -> Vec<NodeIdx> {
    let mut children = hierarchy.node(parent).children.clone();

    match param.sort_method {
        SortMethod::Custom => {
            let order = param.sort_by.as_deref().unwrap_or_default();
            let rank: FxHashMap<&str, usize> = order
                .iter()
                .enumerate()
                .rev()
                .map(|(i, v)| (v.as_str(), i))
                .collect();
            // Unlisted values sort after listed ones; the sort is stable
            children.sort_by_key(|&idx| {
                let node = hierarchy.node(idx);
                rank.get(node.value.to_string().as_str())
                    .copied()
                    .unwrap_or(order.len())
            });
        }
        SortMethod::Asc | SortMethod::Desc => {
            let descending = param.sort_method == SortMethod::Desc;
            match &param.sort_by_measure {
                Some(measure) => {
                    let keyed: FxHashMap<NodeIdx, Option<OrderedFloat>> = children
                        .iter()
                        .map(|&idx| {
                            let value = measure_key(hierarchy.node(idx), param, measure, query);
                            (idx, value.map(OrderedFloat))
                        })
                        .collect();
                    children.sort_by(|a, b| directed(keyed[a].cmp(&keyed[b]), descending));
                }
                None => {
                    children.sort_by(|&a, &b| {
                        let ord = hierarchy.node(a).value.cmp(&hierarchy.node(b).value);
                        directed(ord, descending)
                    });
                }
            }
        }
    }
    children
}

fn directed(ord: Ordering, descending: bool) -> Ordering {
    if descending {
        ord.reverse()
    } else {
        ord
    }
}

/// Aggregated measure for `node`'s path plus the param's extra conditions.
/// `None` sorts lowest.
fn measure_key(
    node: &Node,
    param: &SortParam,
    measure: &str,
    query: &dyn MeasureQuery,
) -> Option<f64> {
    let mut path: SmallVec<[Condition; 8]> = node.query.iter().cloned().collect();
    if let Some(extra) = &param.query {
        path.extend(extra.iter().cloned());
    }
    query.query(&path, measure)
}
