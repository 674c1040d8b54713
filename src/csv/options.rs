//! Caller-supplied CSV export/import options.

use ahash::AHashMap;
use indexmap::IndexMap;

/// `attribute -> locale -> label -> integer`. The locale level is an
/// [`IndexMap`] because [`label_for`](CsvOptions::label_for)/
/// [`value_for`](CsvOptions::value_for) resolve conflicts between locales by
/// insertion order — an `AHashMap` here would make that resolution
/// nondeterministic.
pub type EnumLabels = AHashMap<String, IndexMap<String, AHashMap<String, i64>>>;

#[derive(Debug, Clone, Default)]
pub struct CsvOptions {
    /// strftime pattern applied to `DateTime` columns on export. Empty
    /// means "emit canonical ISO-8601".
    pub date_time_format: String,
    pub enum_labels: EnumLabels,
}

impl CsvOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_date_time_format(mut self, format: impl Into<String>) -> Self {
        self.date_time_format = format.into();
        self
    }

    pub fn with_enum_labels(mut self, enum_labels: EnumLabels) -> Self {
        self.enum_labels = enum_labels;
        self
    }

    /// Reverse lookup: the label for `value` under `attribute`, trying each
    /// locale in insertion order, the first match wins.
    pub fn label_for(&self, attribute: &str, value: i64) -> Option<&str> {
        let locales = self.enum_labels.get(attribute)?;
        for labels in locales.values() {
            if let Some((label, _)) = labels.iter().find(|(_, v)| **v == value) {
                return Some(label.as_str());
            }
        }
        None
    }

    /// Forward lookup: the integer for `label` under `attribute`, searched
    /// case-insensitively across every locale.
    pub fn value_for(&self, attribute: &str, label: &str) -> Option<i64> {
        let locales = self.enum_labels.get(attribute)?;
        for labels in locales.values() {
            if let Some((_, v)) = labels.iter().find(|(l, _)| l.eq_ignore_ascii_case(label)) {
                return Some(*v);
            }
        }
        None
    }

    pub fn has_enum(&self, attribute: &str) -> bool {
        self.enum_labels.contains_key(attribute)
    }
}
