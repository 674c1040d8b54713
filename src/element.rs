//! The caller-facing builder: a two-map bundle of scalar and array
//! attribute values, addressed by bare attribute name.

use indexmap::IndexMap;

use crate::value::Value;

/// An in-memory bundle of attribute values for one row.
///
/// An `Element` never carries a row id — ids are assigned by the writer on
/// insert. Insertion order of both maps is preserved (an `IndexMap`), which
/// keeps error messages and `Debug` output deterministic but is not itself
/// load-bearing for correctness: attributes are always routed by name.
#[derive(Debug, Clone, Default)]
pub struct Element {
    scalars: IndexMap<String, Value>,
    arrays: IndexMap<String, Vec<Value>>,
}

impl Element {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scalar(mut self, attribute: impl Into<String>, value: Value) -> Self {
        self.set_scalar(attribute, value);
        self
    }

    pub fn with_array(mut self, attribute: impl Into<String>, values: Vec<Value>) -> Self {
        self.set_array(attribute, values);
        self
    }

    pub fn set_scalar(&mut self, attribute: impl Into<String>, value: Value) {
        self.scalars.insert(attribute.into(), value);
    }

    pub fn set_array(&mut self, attribute: impl Into<String>, values: Vec<Value>) {
        self.arrays.insert(attribute.into(), values);
    }

    pub fn scalars(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.scalars.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn arrays(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.arrays.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn scalar(&self, attribute: &str) -> Option<&Value> {
        self.scalars.get(attribute)
    }

    pub fn array(&self, attribute: &str) -> Option<&[Value]> {
        self.arrays.get(attribute).map(|v| v.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.scalars.is_empty() && self.arrays.is_empty()
    }

    pub fn clear(&mut self) {
        self.scalars.clear();
        self.arrays.clear();
    }

    /// Replace `attribute`'s scalar value in place (used by FK label
    /// pre-resolution to rewrite a `Text` label into its resolved `Integer`
    /// id without disturbing insertion order).
    pub(crate) fn replace_scalar(&mut self, attribute: &str, value: Value) {
        if let Some(slot) = self.scalars.get_mut(attribute) {
            *slot = value;
        }
    }

    pub(crate) fn replace_array_value(&mut self, attribute: &str, index: usize, value: Value) {
        if let Some(values) = self.arrays.get_mut(attribute) {
            if let Some(slot) = values.get_mut(index) {
                *slot = value;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_element_is_empty() {
        assert!(Element::new().is_empty());
    }

    #[test]
    fn builder_preserves_values() {
        let e = Element::new()
            .with_scalar("label", Value::Text("Plant 1".into()))
            .with_array("cost", vec![Value::Real(1.0), Value::Real(2.0)]);
        assert!(!e.is_empty());
        assert_eq!(e.scalar("label"), Some(&Value::Text("Plant 1".into())));
        assert_eq!(e.array("cost").unwrap().len(), 2);
    }

    #[test]
    fn clear_empties_both_maps() {
        let mut e = Element::new().with_scalar("label", Value::Text("x".into()));
        e.clear();
        assert!(e.is_empty());
    }
}
