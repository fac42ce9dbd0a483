//! Projection, paging and sort options for reads.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ValidationError;

/// A list of fields to return. The record id is always returned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Projection(Vec<String>);

impl Projection {
    /// Creates a projection over the given fields.
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(fields.into_iter().map(Into::into).collect())
    }

    /// Returns the projected field names.
    pub fn fields(&self) -> &[String] {
        &self.0
    }

    /// Returns `true` if no field is projected.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the native projection document (`{field: 1, ...}`).
    pub fn to_document(&self) -> Map<String, Value> {
        self.0
            .iter()
            .map(|field| (field.clone(), Value::from(1)))
            .collect()
    }
}

/// Sort direction of one sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Smallest first.
    Ascending,
    /// Largest first.
    Descending,
}

impl SortDirection {
    /// Returns the native direction value (`1` / `-1`).
    pub fn as_i32(&self) -> i32 {
        match self {
            SortDirection::Ascending => 1,
            SortDirection::Descending => -1,
        }
    }

    fn parse(field: &str, value: &Value) -> Result<Self, ValidationError> {
        let direction = match value {
            Value::Number(n) if n.as_f64().is_some_and(|n| n > 0.0) => Some(Self::Ascending),
            Value::Number(n) if n.as_f64().is_some_and(|n| n < 0.0) => Some(Self::Descending),
            Value::String(s) => match s.to_ascii_lowercase().as_str() {
                "asc" | "ascending" | "1" => Some(Self::Ascending),
                "desc" | "descending" | "-1" => Some(Self::Descending),
                _ => None,
            },
            _ => None,
        };
        direction.ok_or_else(|| ValidationError::InvalidSort {
            message: format!("unrecognized direction {} for field '{}'", value, field),
        })
    }
}

/// One sort key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    /// The field to sort on.
    pub field: String,
    /// The direction.
    pub direction: SortDirection,
}

/// An ordered list of sort keys.
///
/// Accepts either an object (`{"total": -1, "name": "asc"}`) or a list of
/// pairs (`[["total", "desc"], ["name", 1]]`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct SortSpec(Vec<SortKey>);

impl SortSpec {
    /// Creates an empty sort.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a sort key.
    pub fn then(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.0.push(SortKey {
            field: field.into(),
            direction,
        });
        self
    }

    /// Returns the sort keys in priority order.
    pub fn keys(&self) -> &[SortKey] {
        &self.0
    }

    /// Returns `true` if there are no sort keys.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the native sort document (`{field: 1|-1, ...}`).
    pub fn to_document(&self) -> Map<String, Value> {
        self.0
            .iter()
            .map(|key| (key.field.clone(), Value::from(key.direction.as_i32())))
            .collect()
    }
}

impl TryFrom<Value> for SortSpec {
    type Error = ValidationError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let mut spec = SortSpec::new();
        match value {
            Value::Object(object) => {
                for (field, direction) in &object {
                    spec = spec.then(field.clone(), SortDirection::parse(field, direction)?);
                }
            }
            Value::Array(pairs) => {
                for pair in &pairs {
                    match pair.as_array().map(Vec::as_slice) {
                        Some([Value::String(field), direction]) => {
                            spec =
                                spec.then(field.clone(), SortDirection::parse(field, direction)?);
                        }
                        _ => {
                            return Err(ValidationError::InvalidSort {
                                message: format!("expected [field, direction], found {}", pair),
                            });
                        }
                    }
                }
            }
            other => {
                return Err(ValidationError::InvalidSort {
                    message: format!("expected an object or array, found {}", other),
                });
            }
        }
        Ok(spec)
    }
}

impl From<SortSpec> for Value {
    fn from(spec: SortSpec) -> Self {
        Value::Object(spec.to_document())
    }
}

/// Options applied to a find.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    /// Fields to return.
    pub projection: Option<Projection>,
    /// Number of matching documents to skip.
    pub skip: Option<u64>,
    /// Maximum number of documents to return.
    pub limit: Option<u64>,
    /// Result order; store natural order when absent.
    pub sort: Option<SortSpec>,
}

impl FindOptions {
    /// Creates empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the projection.
    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = Some(projection);
        self
    }

    /// Sets the skip.
    pub fn with_skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Sets the limit.
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the sort.
    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_projection_document() {
        let projection = Projection::new(["name", "total"]);
        assert_eq!(
            Value::Object(projection.to_document()),
            json!({"name": 1, "total": 1})
        );
    }

    #[test]
    fn test_sort_from_object() {
        let sort: SortSpec = serde_json::from_value(json!({"total": -1, "name": "asc"})).unwrap();
        assert_eq!(
            Value::Object(sort.to_document()),
            json!({"total": -1, "name": 1})
        );
    }

    #[test]
    fn test_sort_from_pairs_keeps_order() {
        let sort: SortSpec =
            serde_json::from_value(json!([["b", "desc"], ["a", 1]])).unwrap();
        assert_eq!(sort.keys()[0].field, "b");
        assert_eq!(sort.keys()[0].direction, SortDirection::Descending);
        assert_eq!(sort.keys()[1].field, "a");
        assert_eq!(sort.keys()[1].direction, SortDirection::Ascending);
    }

    #[test]
    fn test_sort_rejects_garbage() {
        assert!(serde_json::from_value::<SortSpec>(json!("total")).is_err());
        assert!(serde_json::from_value::<SortSpec>(json!({"total": "sideways"})).is_err());
        assert!(serde_json::from_value::<SortSpec>(json!([["total"]])).is_err());
    }

    #[test]
    fn test_find_options_builder() {
        let options = FindOptions::new()
            .with_skip(5)
            .with_limit(10)
            .with_sort(SortSpec::new().then("a", SortDirection::Descending));
        assert_eq!(options.skip, Some(5));
        assert_eq!(options.limit, Some(10));
        assert!(options.projection.is_none());
    }
}
