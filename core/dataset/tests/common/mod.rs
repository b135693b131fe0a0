//! FILENAME: tests/common/mod.rs
//! Fixtures for dataset integration tests.

use dataset::{Dataset, FieldValue};

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
}
