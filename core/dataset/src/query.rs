//! FILENAME: core/dataset/src/query.rs
//! PURPOSE: Aggregated measure lookups for a grouping path.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::aggregate::Accumulator;
use crate::store::{AggregateKey, Dataset, FieldIndex, Record, ValueId};
use crate::value::FieldValue;

/// One `field == value` restriction of a grouping path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub field: String,
    pub value: FieldValue,
}

impl Condition {
    pub fn new(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Condition {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Read-only query interface used to sort headers by an aggregated measure.
pub trait MeasureQuery {
    /// Aggregated value of `measure` over the records matching every condition
    /// in `path`. `None` when the measure is unknown or nothing matches.
    fn query(&self, path: &[Condition], measure: &str) -> Option<f64>;
}

impl MeasureQuery for Dataset {
    fn query(&self, path: &[Condition], measure: &str) -> Option<f64> {
        let measure_idx = self.field_index(measure)?;

        let mut conditions: SmallVec<[(FieldIndex, ValueId); 4]> = SmallVec::new();
        for condition in path {
            let field = self.field_index(&condition.field)?;
            // A value never seen in the field cannot match any record
            let id = self.lookup_value(field, &condition.value)?;
            conditions.push((field, id));
        }
        conditions.sort_unstable();
        conditions.dedup();

        let key = AggregateKey {
            measure: measure_idx,
            aggregation: self.aggregation(measure_idx),
            conditions,
        };
        if let Some(cached) = self.aggregate_memo.borrow().get(&key) {
            return *cached;
        }

        let result = aggregate(self, &key);
        self.aggregate_memo.borrow_mut().insert(key, result);
        result
    }
}

/// Walks the shortest posting list among the conditions and checks the
/// rest per record. An empty path covers every record.
fn aggregate(dataset: &Dataset, key: &AggregateKey) -> Option<f64> {
    for &(field, _) in &key.conditions {
        dataset.ensure_value_index(field);
    }
    let index = dataset.value_index.borrow();
    let narrowest: Option<&[usize]> = key
        .conditions
        .iter()
        .map(|(field, id)| {
            index
                .get(field)
                .and_then(|postings| postings.get(id))
                .map_or(&[][..], Vec::as_slice)
        })
        .min_by_key(|postings| postings.len());

    let records = dataset.records();
    let mut acc = Accumulator::new();
    let mut matched = false;
    let mut visit = |record: &Record| {
        let hit = key
            .conditions
            .iter()
            .all(|&(field, id)| record.value_id(field) == id);
        if !hit {
            return;
        }
        matched = true;
        match dataset.value(key.measure, record.value_id(key.measure)) {
            FieldValue::Number(n) => acc.add_number(n.0),
            FieldValue::Empty => {}
            _ => acc.add_non_number(),
        }
    };
    match narrowest {
        Some(postings) => postings.iter().for_each(|&idx| visit(&records[idx])),
        None => records.iter().for_each(|record| visit(record)),
    }

    if !matched {
        return None;
    }
    acc.compute(key.aggregation)
}
