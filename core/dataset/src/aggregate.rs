//! FILENAME: core/dataset/src/aggregate.rs
//! PURPOSE: Aggregation of measure values over a group of records.

use serde::{Deserialize, Serialize};

/// Supported aggregation functions for measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum AggregationType {
    #[default]
    Sum,
    Count,
    CountNumbers,
    Average,
    Min,
    Max,
    Product,
    StdDev,
    StdDevP,
    Var,
    VarP,
}

/// Incremental accumulator holding enough state for every aggregation type.
/// Variance uses Welford's online update.
#[derive(Debug, Clone, Default)]
pub struct Accumulator {
    /// Non-empty values seen (numbers and non-numbers).
    pub count: u64,
    /// Numeric values seen.
    pub count_numbers: u64,
    pub sum: f64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    product: Option<f64>,
    mean: f64,
    m2: f64,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_number(&mut self, value: f64) {
        self.count += 1;
        self.count_numbers += 1;
        self.sum += value;
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
        self.product = Some(self.product.map_or(value, |p| p * value));

        let delta = value - self.mean;
        self.mean += delta / self.count_numbers as f64;
        self.m2 += delta * (value - self.mean);
    }

    /// Counts a non-numeric, non-empty value.
    pub fn add_non_number(&mut self) {
        self.count += 1;
    }

    /// Final value, or `None` when the aggregation has nothing to report
    /// (no numbers for numeric aggregations).
    pub fn compute(&self, aggregation: AggregationType) -> Option<f64> {
        let n = self.count_numbers as f64;
        match aggregation {
            AggregationType::Count => Some(self.count as f64),
            AggregationType::CountNumbers => Some(n),
            _ if self.count_numbers == 0 => None,
            AggregationType::Sum => Some(self.sum),
            AggregationType::Average => Some(self.sum / n),
            AggregationType::Min => self.min,
            AggregationType::Max => self.max,
            AggregationType::Product => self.product,
            AggregationType::Var | AggregationType::StdDev if self.count_numbers < 2 => Some(0.0),
            AggregationType::Var => Some(self.m2 / (n - 1.0)),
            AggregationType::StdDev => Some((self.m2 / (n - 1.0)).sqrt()),
            AggregationType::VarP => Some(self.m2 / n),
            AggregationType::StdDevP => Some((self.m2 / n).sqrt()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(values: &[f64]) -> Accumulator {
        let mut acc = Accumulator::new();
        for &v in values {
            acc.add_number(v);
        }
        acc
    }

    #[test]
    fn test_basic_aggregations() {
        let acc = filled(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(acc.compute(AggregationType::Sum), Some(10.0));
        assert_eq!(acc.compute(AggregationType::Average), Some(2.5));
        assert_eq!(acc.compute(AggregationType::Min), Some(1.0));
        assert_eq!(acc.compute(AggregationType::Max), Some(4.0));
        assert_eq!(acc.compute(AggregationType::Product), Some(24.0));
        assert_eq!(acc.compute(AggregationType::Count), Some(4.0));
    }

    #[test]
    fn test_variance() {
        let acc = filled(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        let varp = acc.compute(AggregationType::VarP).unwrap_or_default();
        let stdp = acc.compute(AggregationType::StdDevP).unwrap_or_default();
        assert!((varp - 4.0).abs() < 1e-9);
        assert!((stdp - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_accumulator_reports_nothing_numeric() {
        let mut acc = Accumulator::new();
        acc.add_non_number();
        assert_eq!(acc.compute(AggregationType::Sum), None);
        assert_eq!(acc.compute(AggregationType::Max), None);
        assert_eq!(acc.compute(AggregationType::Count), Some(1.0));
        assert_eq!(acc.compute(AggregationType::CountNumbers), Some(0.0));
    }
}
