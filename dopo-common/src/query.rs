//! CMS item queries
//!
//! [`ItemQuery`] describes a field selection, filter, sort and page window
//! in the CMS REST dialect. [`Filter`] serializes to the CMS filter JSON
//! (`{"status": {"_eq": "published"}}`) and can also be evaluated against
//! a JSON record, which is how nested relations fetched without a filter
//! get narrowed in-process.

use serde_json::{json, Map, Value};
use std::cmp::Ordering;

use crate::models::STATUS_PUBLISHED;
use crate::time::parse_cms_datetime;

/// Filter expression over record fields; dotted paths address relations
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    Neq(String, Value),
    NotNull(String),
    Contains(String, String),
    Between(String, Value, Value),
    And(Vec<Filter>),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq(field.into(), value.into())
    }

    pub fn neq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Neq(field.into(), value.into())
    }

    pub fn not_null(field: impl Into<String>) -> Self {
        Filter::NotNull(field.into())
    }

    pub fn contains(field: impl Into<String>, needle: impl Into<String>) -> Self {
        Filter::Contains(field.into(), needle.into())
    }

    pub fn between(field: impl Into<String>, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        Filter::Between(field.into(), low.into(), high.into())
    }

    /// Episodes visible to the public: published with audio attached
    pub fn publicly_visible() -> Self {
        Filter::And(vec![
            Filter::eq("status", STATUS_PUBLISHED),
            Filter::not_null("audio"),
        ])
    }

    /// Conjunction, flattening nested `And`s
    pub fn and(self, other: Filter) -> Self {
        let mut clauses = match self {
            Filter::And(clauses) => clauses,
            single => vec![single],
        };
        match other {
            Filter::And(more) => clauses.extend(more),
            single => clauses.push(single),
        }
        Filter::And(clauses)
    }

    /// CMS filter JSON
    pub fn to_json(&self) -> Value {
        match self {
            Filter::Eq(field, value) => nest(field, json!({ "_eq": value })),
            Filter::Neq(field, value) => nest(field, json!({ "_neq": value })),
            Filter::NotNull(field) => nest(field, json!({ "_nnull": true })),
            Filter::Contains(field, needle) => nest(field, json!({ "_contains": needle })),
            Filter::Between(field, low, high) => nest(field, json!({ "_between": [low, high] })),
            Filter::And(clauses) => {
                json!({ "_and": clauses.iter().map(Filter::to_json).collect::<Vec<_>>() })
            }
        }
    }

    /// Evaluate against a JSON record
    pub fn matches(&self, record: &Value) -> bool {
        match self {
            Filter::Eq(field, expected) => {
                lookup(record, field).is_some_and(|actual| loosely_equal(actual, expected))
            }
            Filter::Neq(field, expected) => {
                !lookup(record, field).is_some_and(|actual| loosely_equal(actual, expected))
            }
            Filter::NotNull(field) => lookup(record, field).is_some_and(|v| !v.is_null()),
            Filter::Contains(field, needle) => lookup(record, field)
                .and_then(Value::as_str)
                .is_some_and(|haystack| haystack.contains(needle.as_str())),
            Filter::Between(field, low, high) => lookup(record, field).is_some_and(|actual| {
                matches!(compare(actual, low), Some(Ordering::Greater | Ordering::Equal))
                    && matches!(compare(actual, high), Some(Ordering::Less | Ordering::Equal))
            }),
            Filter::And(clauses) => clauses.iter().all(|clause| clause.matches(record)),
        }
    }
}

/// Follow a dotted path through nested objects
pub fn lookup<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(record, |current, key| current.get(key))
}

fn nest(path: &str, leaf: Value) -> Value {
    path.rsplit('.').fold(leaf, |inner, key| {
        let mut object = Map::new();
        object.insert(key.to_string(), inner);
        Value::Object(object)
    })
}

fn loosely_equal(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::String(a), Value::Number(b)) | (Value::Number(b), Value::String(a)) => {
            *a == b.to_string()
        }
        _ => actual == expected,
    }
}

fn compare(actual: &Value, bound: &Value) -> Option<Ordering> {
    match (actual, bound) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => {
            match (parse_cms_datetime(a), parse_cms_datetime(b)) {
                (Some(a), Some(b)) => Some(a.cmp(&b)),
                _ => Some(a.cmp(b)),
            }
        }
        _ => None,
    }
}

/// Field selection, filter, sort and window for one CMS read
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemQuery {
    pub fields: Vec<String>,
    pub filter: Option<Filter>,
    /// Field names, `-` prefix for descending
    pub sort: Vec<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl ItemQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn sort(mut self, key: impl Into<String>) -> Self {
        self.sort.push(key.into());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    /// URL query parameters in CMS REST form
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if !self.fields.is_empty() {
            pairs.push(("fields".to_string(), self.fields.join(",")));
        }
        if let Some(filter) = &self.filter {
            pairs.push(("filter".to_string(), filter.to_json().to_string()));
        }
        if !self.sort.is_empty() {
            pairs.push(("sort".to_string(), self.sort.join(",")));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(offset) = self.offset {
            pairs.push(("offset".to_string(), offset.to_string()));
        }
        pairs
    }
}
