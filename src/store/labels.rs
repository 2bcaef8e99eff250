//! Label canonicalization.
//!
//! A series is identified by its metric name plus its label set. Labels are
//! sorted by key before joining, so `{a=1,b=2}` and `{b=2,a=1}` are the same
//! series. When a key repeats, the last value wins.

use std::collections::BTreeMap;

pub type LabelSet = BTreeMap<String, String>;

/// Sorted, de-duplicated label set.
pub fn label_set(labels: &[(&str, &str)]) -> LabelSet {
    labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// `name` for an empty label set, otherwise `name{k1=v1,k2=v2}`.
pub fn canonical_key(name: &str, labels: &LabelSet) -> String {
    if labels.is_empty() {
        return name.to_string();
    }
    let joined = labels
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(",");
    format!("{name}{{{joined}}}")
}

/// Prometheus-style series name: `name{k1="v1",k2="v2"}`.
pub fn exposition_key(name: &str, labels: &LabelSet) -> String {
    if labels.is_empty() {
        return name.to_string();
    }
    let joined = labels
        .iter()
        .map(|(k, v)| format!("{k}=\"{}\"", escape_label_value(v)))
        .collect::<Vec<_>>()
        .join(",");
    format!("{name}{{{joined}}}")
}

fn escape_label_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
