//! Property value types for protein nodes
//!
//! Node payloads are stored as loosely typed property maps, the way a
//! property graph stores them. Older records may hold a list-valued field
//! as a plain string, so readers must check the variant before use.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Property value type supporting the data types a protein node carries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    String(String),
    Integer(i64),
    Array(Vec<PropertyValue>),
    Null,
}

impl PropertyValue {
    /// Get string value if this is a string
    pub fn as_string(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get integer value if this is an integer
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            PropertyValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get array value if this is an array
    pub fn as_array(&self) -> Option<&Vec<PropertyValue>> {
        match self {
            PropertyValue::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// String members of an array value; non-string members are skipped.
    /// Returns `None` when the value is not an array.
    pub fn as_string_list(&self) -> Option<Vec<String>> {
        self.as_array().map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_string().map(str::to_string))
                .collect()
        })
    }
}

// Convenience conversions
impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        PropertyValue::Integer(i)
    }
}

impl From<usize> for PropertyValue {
    fn from(i: usize) -> Self {
        PropertyValue::Integer(i as i64)
    }
}

impl From<Vec<PropertyValue>> for PropertyValue {
    fn from(arr: Vec<PropertyValue>) -> Self {
        PropertyValue::Array(arr)
    }
}

impl From<Vec<String>> for PropertyValue {
    fn from(items: Vec<String>) -> Self {
        PropertyValue::Array(items.into_iter().map(PropertyValue::String).collect())
    }
}

/// Property map for storing node properties
pub type PropertyMap = HashMap<String, PropertyValue>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_value_conversions() {
        let string_prop: PropertyValue = "hello".into();
        assert_eq!(string_prop.as_string(), Some("hello"));

        let len_prop: PropertyValue = 42usize.into();
        assert_eq!(len_prop.as_integer(), Some(42));
        assert_eq!(len_prop.as_string(), None);
    }

    #[test]
    fn test_string_list() {
        let list: PropertyValue = vec!["IPR000001".to_string(), "IPR000002".to_string()].into();
        assert_eq!(
            list.as_string_list(),
            Some(vec!["IPR000001".to_string(), "IPR000002".to_string()])
        );

        // Legacy string values are not lists
        let legacy = PropertyValue::String("['IPR000001']".to_string());
        assert_eq!(legacy.as_string_list(), None);
    }
}
