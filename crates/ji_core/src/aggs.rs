//! Read-only accessors over the `aggregations` object of a search response.
//! Missing aggregations read as zero or as no buckets.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub key: String,
    pub doc_count: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct Aggs<'a> {
    root: Option<&'a Value>,
}

impl<'a> Aggs<'a> {
    pub fn new(root: Option<&'a Value>) -> Self {
        Self { root }
    }

    pub fn get(&self, name: &str) -> Option<&'a Value> {
        self.root.and_then(|r| r.get(name))
    }

    /// Descends into a named sub-aggregation.
    pub fn sub(&self, name: &str) -> Aggs<'a> {
        Aggs::new(self.get(name))
    }

    /// `doc_count` of a single-bucket (filter) aggregation.
    pub fn doc_count(&self, name: &str) -> u64 {
        self.get(name)
            .and_then(|a| a.get("doc_count"))
            .and_then(Value::as_u64)
            .unwrap_or(0)
    }

    /// `value` of a metric aggregation (sum, avg, cardinality). Null reads as zero.
    pub fn value(&self, name: &str) -> f64 {
        self.get(name)
            .and_then(|a| a.get("value"))
            .and_then(Value::as_f64)
            .unwrap_or(0.0)
    }

    /// Raw bucket list of a multi-bucket aggregation.
    pub fn raw_buckets(&self, name: &str) -> &'a [Value] {
        self.get(name)
            .and_then(|a| a.get("buckets"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Keyed buckets of a `filters` aggregation, in response order.
    pub fn keyed_buckets(&self, name: &str) -> Vec<Bucket> {
        self.get(name)
            .and_then(|a| a.get("buckets"))
            .and_then(Value::as_object)
            .map(|buckets| {
                buckets
                    .iter()
                    .map(|(key, b)| Bucket {
                        key: key.clone(),
                        doc_count: b.get("doc_count").and_then(Value::as_u64).unwrap_or(0),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Terms buckets flattened to key/doc_count pairs.
    pub fn buckets(&self, name: &str) -> Vec<Bucket> {
        self.raw_buckets(name).iter().map(bucket_of).collect()
    }
}

pub fn bucket_of(raw: &Value) -> Bucket {
    let key = raw
        .get("key_as_string")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| {
            raw.get("key").map(|k| match k {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
        })
        .unwrap_or_default();
    Bucket {
        key,
        doc_count: raw.get("doc_count").and_then(Value::as_u64).unwrap_or(0),
    }
}
