use crate::error::ArgumentError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One unit of input for the worker callback.
///
/// The shape is decided once, when the work collection is built. Pools never
/// look inside an item; the callback reads it through [`WorkItem::value`] or
/// [`WorkItem::arg`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WorkItem<V> {
    /// Parameter name to value, passed to the callback as named arguments
    Named(BTreeMap<String, V>),
    /// A single value passed as the only argument
    Positional(V),
}

impl<V> WorkItem<V> {
    pub fn positional(value: V) -> Self {
        WorkItem::Positional(value)
    }

    /// Build a named item from `(name, value)` pairs
    pub fn named<K, I>(params: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        WorkItem::Named(params.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn is_named(&self) -> bool {
        matches!(self, WorkItem::Named(_))
    }

    /// The positional argument of this item
    pub fn value(&self) -> Result<&V, ArgumentError> {
        match self {
            WorkItem::Positional(value) => Ok(value),
            WorkItem::Named(_) => Err(ArgumentError::ExpectedPositional),
        }
    }

    /// A named argument of this item
    pub fn arg(&self, name: &str) -> Result<&V, ArgumentError> {
        match self {
            WorkItem::Named(params) => params
                .get(name)
                .ok_or_else(|| ArgumentError::Missing(name.to_string())),
            WorkItem::Positional(_) => Err(ArgumentError::ExpectedNamed),
        }
    }

    /// All named arguments, in name order
    pub fn args(&self) -> Result<&BTreeMap<String, V>, ArgumentError> {
        match self {
            WorkItem::Named(params) => Ok(params),
            WorkItem::Positional(_) => Err(ArgumentError::ExpectedNamed),
        }
    }
}

impl<V> From<V> for WorkItem<V> {
    fn from(value: V) -> Self {
        WorkItem::Positional(value)
    }
}

/// Wrap every value of a plain collection as a positional item
pub fn positional_work<V, I>(values: I) -> Vec<WorkItem<V>>
where
    I: IntoIterator<Item = V>,
{
    values.into_iter().map(WorkItem::Positional).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_access() {
        let item = WorkItem::positional(7);
        assert_eq!(item.value(), Ok(&7));
        assert_eq!(item.arg("x"), Err(ArgumentError::ExpectedNamed));
        assert!(!item.is_named());
    }

    #[test]
    fn test_named_access() {
        let item = WorkItem::named([("num1", 3), ("num2", 13)]);
        assert!(item.is_named());
        assert_eq!(item.arg("num1"), Ok(&3));
        assert_eq!(item.arg("num2"), Ok(&13));
        assert_eq!(item.arg("num3"), Err(ArgumentError::Missing("num3".into())));
        assert_eq!(item.value(), Err(ArgumentError::ExpectedPositional));
        assert_eq!(item.args().unwrap().len(), 2);
    }

    #[test]
    fn test_deserialize_decides_shape_once() {
        let items: Vec<WorkItem<serde_json::Value>> =
            serde_json::from_str(r#"[1, {"num1": 2, "num2": 3}, "text"]"#).unwrap();

        assert!(matches!(items[0], WorkItem::Positional(_)));
        assert!(items[1].is_named());
        assert_eq!(items[1].arg("num2").unwrap(), &serde_json::json!(3));
        assert_eq!(items[2].value().unwrap(), &serde_json::json!("text"));
    }

    #[test]
    fn test_positional_work() {
        let work = positional_work(1..=3);
        assert_eq!(
            work,
            vec![WorkItem::Positional(1), WorkItem::Positional(2), WorkItem::Positional(3)]
        );
    }
}
