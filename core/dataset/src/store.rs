//! FILENAME: core/dataset/src/store.rs
//! Dataset store - interned, column-oriented view of the source rows.
//!
//! The store is designed for:
//! - O(n) build from source rows
//! - Cheap regrouping when the dimension layout changes (no re-parse)
//! - Memory efficiency via value interning
//!
//! Each distinct value of a field is stored once and referenced by a
//! `ValueId`. Ids are assigned in first-seen order, which is also the
//! default display order of header nodes.

use std::cell::RefCell;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::aggregate::AggregationType;
use crate::error::DatasetError;
use crate::value::{FieldValue, EMPTY_VALUE};

/// Index of a field in the dataset schema (0-based).
pub type FieldIndex = usize;

/// Interned value reference within one field.
pub type ValueId = u32;

/// Represents an empty or missing value.
pub const VALUE_ID_EMPTY: ValueId = u32::MAX;

// ============================================================================
// FIELD STORE
// ============================================================================

/// Distinct values of a single field.
#[derive(Debug, Clone)]
pub struct FieldStore {
    pub name: String,
    value_to_id: FxHashMap<FieldValue, ValueId>,
    id_to_value: Vec<FieldValue>,
}

impl FieldStore {
    pub fn new(name: String) -> Self {
        FieldStore {
            name,
            value_to_id: FxHashMap::default(),
            id_to_value: Vec::new(),
        }
    }

    /// Interns a value and returns its id. Empty values map to `VALUE_ID_EMPTY`.
    pub fn intern(&mut self, value: FieldValue) -> ValueId {
        if value.is_empty() {
            return VALUE_ID_EMPTY;
        }
        if let Some(&id) = self.value_to_id.get(&value) {
            return id;
        }
        let id = self.id_to_value.len() as ValueId;
        self.id_to_value.push(value.clone());
        self.value_to_id.insert(value, id);
        id
    }

    /// Looks up an existing id without interning.
    pub fn lookup(&self, value: &FieldValue) -> Option<ValueId> {
        if value.is_empty() {
            return Some(VALUE_ID_EMPTY);
        }
        self.value_to_id.get(value).copied()
    }

    pub fn get_value(&self, id: ValueId) -> Option<&FieldValue> {
        if id == VALUE_ID_EMPTY {
            return Some(&EMPTY_VALUE);
        }
        self.id_to_value.get(id as usize)
    }

    /// Number of distinct non-empty values.
    pub fn unique_count(&self) -> usize {
        self.id_to_value.len()
    }
}

// ============================================================================
// RECORD
// ============================================================================

/// One source row stored as interned ids, indexed by `FieldIndex`.
/// Rows created before a field was added are shorter; missing slots are empty.
#[derive(Debug, Clone)]
pub struct Record {
    pub values: SmallVec<[ValueId; 8]>,
}

impl Record {
    pub fn value_id(&self, field: FieldIndex) -> ValueId {
        self.values.get(field).copied().unwrap_or(VALUE_ID_EMPTY)
    }
}

/// Memo key for aggregated measure lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct AggregateKey {
    pub measure: FieldIndex,
    pub aggregation: AggregationType,
    pub conditions: SmallVec<[(FieldIndex, ValueId); 4]>,
}

// ============================================================================
// DATASET
// ============================================================================

/// The in-memory dataset the layout engine groups and queries.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    fields: Vec<FieldStore>,
    field_lookup: FxHashMap<String, FieldIndex>,
    records: Vec<Record>,
    /// Per-measure aggregation; measures not listed use `Sum`.
    aggregations: FxHashMap<FieldIndex, AggregationType>,
    pub(crate) aggregate_memo: RefCell<FxHashMap<AggregateKey, Option<f64>>>,
    /// Record indices per value id, built per field on first query.
    pub(crate) value_index: RefCell<FxHashMap<FieldIndex, FxHashMap<ValueId, Vec<usize>>>>,
}

impl Dataset {
    /// Creates an empty dataset with no schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty dataset with a declared schema.
    pub fn with_fields<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut dataset = Self::new();
        for name in names {
            dataset.add_field(name);
        }
        dataset
    }

    /// Parses a JSON array of row objects. Fields are added to the schema in
    /// the order they are first seen.
    pub fn from_json(text: &str) -> Result<Self, DatasetError> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        Self::from_json_value(&value)
    }

    pub fn from_json_value(value: &serde_json::Value) -> Result<Self, DatasetError> {
        let rows = value.as_array().ok_or(DatasetError::NotAnArray)?;
        let mut dataset = Self::new();
        dataset.records.reserve(rows.len());
        for (row_idx, row) in rows.iter().enumerate() {
            let object = row.as_object().ok_or(DatasetError::RowNotObject(row_idx))?;
            dataset.push_row(object.iter().map(|(k, v)| (k.as_str(), FieldValue::from(v))));
        }
        Ok(dataset)
    }

    /// Adds a field to the schema (no-op if it already exists).
    pub fn add_field(&mut self, name: impl Into<String>) -> FieldIndex {
        let name = name.into();
        if let Some(&idx) = self.field_lookup.get(&name) {
            return idx;
        }
        let idx = self.fields.len();
        self.field_lookup.insert(name.clone(), idx);
        self.fields.push(FieldStore::new(name));
        idx
    }

    /// Adds a record given values in schema order. Extra values are ignored,
    /// missing trailing values are empty.
    pub fn add_record(&mut self, values: &[FieldValue]) -> usize {
        let mut interned: SmallVec<[ValueId; 8]> = SmallVec::with_capacity(self.fields.len());
        for (store, value) in self.fields.iter_mut().zip(values) {
            interned.push(store.intern(value.clone()));
        }
        while interned.len() < self.fields.len() {
            interned.push(VALUE_ID_EMPTY);
        }
        self.push_interned(interned)
    }

    /// Adds a record from `(field, value)` pairs, growing the schema as needed.
    pub fn push_row<I, K, V>(&mut self, row: I) -> usize
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<FieldValue>,
    {
        let mut interned: SmallVec<[ValueId; 8]> = SmallVec::new();
        for (name, value) in row {
            let field = self.add_field(name.as_ref());
            if interned.len() <= field {
                interned.resize(field + 1, VALUE_ID_EMPTY);
            }
            interned[field] = self.fields[field].intern(value.into());
        }
        self.push_interned(interned)
    }

    fn push_interned(&mut self, values: SmallVec<[ValueId; 8]>) -> usize {
        let idx = self.records.len();
        self.records.push(Record { values });
        self.aggregate_memo.get_mut().clear();
        self.value_index.get_mut().clear();
        idx
    }

    /// Builds the posting lists for `field` unless they already exist.
    pub(crate) fn ensure_value_index(&self, field: FieldIndex) {
        let mut index = self.value_index.borrow_mut();
        if index.contains_key(&field) {
            return;
        }
        let mut postings: FxHashMap<ValueId, Vec<usize>> = FxHashMap::default();
        for (idx, record) in self.records.iter().enumerate() {
            postings.entry(record.value_id(field)).or_default().push(idx);
        }
        index.insert(field, postings);
    }

    /// Sets the aggregation used when `measure` is queried.
    pub fn set_aggregation(&mut self, measure: &str, aggregation: AggregationType) {
        if let Some(idx) = self.field_index(measure) {
            self.aggregations.insert(idx, aggregation);
            self.aggregate_memo.get_mut().clear();
        }
    }

    pub fn aggregation(&self, measure: FieldIndex) -> AggregationType {
        self.aggregations.get(&measure).copied().unwrap_or_default()
    }

    pub fn field_index(&self, name: &str) -> Option<FieldIndex> {
        self.field_lookup.get(name).copied()
    }

    pub fn field_name(&self, field: FieldIndex) -> Option<&str> {
        self.fields.get(field).map(|f| f.name.as_str())
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn field(&self, field: FieldIndex) -> Option<&FieldStore> {
        self.fields.get(field)
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Whether any field has been declared.
    pub fn has_schema(&self) -> bool {
        !self.fields.is_empty()
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// True when there are no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Resolved value of `field` in record `record`.
    pub fn record_value(&self, record: usize, field: FieldIndex) -> &FieldValue {
        let id = self
            .records
            .get(record)
            .map_or(VALUE_ID_EMPTY, |r| r.value_id(field));
        self.value(field, id)
    }

    /// Value behind an interned id; unknown ids resolve to empty.
    pub fn value(&self, field: FieldIndex, id: ValueId) -> &FieldValue {
        self.fields
            .get(field)
            .and_then(|f| f.get_value(id))
            .unwrap_or(&EMPTY_VALUE)
    }

    /// Id of `value` in `field` if it was ever seen.
    pub fn lookup_value(&self, field: FieldIndex, value: &FieldValue) -> Option<ValueId> {
        self.fields.get(field).and_then(|f| f.lookup(value))
    }

    /// Partitions `records` by their value of `field`, keeping partitions in
    /// first-seen order and record order inside each partition.
    pub fn partition(&self, records: &[usize], field: FieldIndex) -> Vec<(ValueId, Vec<usize>)> {
        let mut slots: FxHashMap<ValueId, usize> = FxHashMap::default();
        let mut groups: Vec<(ValueId, Vec<usize>)> = Vec::new();
        for &record_idx in records {
            let Some(record) = self.records.get(record_idx) else {
                continue;
            };
            let id = record.value_id(field);
            let slot = *slots.entry(id).or_insert_with(|| {
                groups.push((id, Vec::new()));
                groups.len() - 1
            });
            groups[slot].1.push(record_idx);
        }
        groups
    }
}
