//! Index specifications.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Direction of one indexed field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IndexDirection {
    /// `ASC` (and every unrecognized token).
    #[default]
    Ascending,
    /// `DESC`.
    Descending,
    /// `2D`: a planar geospatial index.
    Geo2d,
}

impl IndexDirection {
    /// Parses a direction token.
    ///
    /// The token is stringified and upper-cased before matching, so `"asc"`
    /// and `"Desc"` are recognized. Anything that does not spell `ASC`,
    /// `DESC` or `2D` (numbers included) falls back to ascending.
    pub fn from_token(token: &Value) -> Self {
        let text = match token {
            Value::String(s) => s.to_uppercase(),
            other => other.to_string().to_uppercase(),
        };
        match text.as_str() {
            "DESC" => IndexDirection::Descending,
            "2D" => IndexDirection::Geo2d,
            _ => IndexDirection::Ascending,
        }
    }

    /// Returns the canonical token.
    pub fn token(&self) -> &'static str {
        match self {
            IndexDirection::Ascending => "ASC",
            IndexDirection::Descending => "DESC",
            IndexDirection::Geo2d => "2D",
        }
    }

    /// Returns the native key value (`1`, `-1` or `"2d"`).
    pub fn native_value(&self) -> Value {
        match self {
            IndexDirection::Ascending => Value::from(1),
            IndexDirection::Descending => Value::from(-1),
            IndexDirection::Geo2d => Value::from("2d"),
        }
    }

    /// Returns the suffix used in generated index names.
    pub fn name_suffix(&self) -> &'static str {
        match self {
            IndexDirection::Ascending => "1",
            IndexDirection::Descending => "-1",
            IndexDirection::Geo2d => "2d",
        }
    }
}

/// Ordered mapping of field name to index direction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct IndexSpec(Vec<(String, IndexDirection)>);

impl IndexSpec {
    /// Creates an empty specification.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field.
    pub fn field(mut self, name: impl Into<String>, direction: IndexDirection) -> Self {
        self.0.push((name.into(), direction));
        self
    }

    /// Returns the indexed fields in order.
    pub fn fields(&self) -> &[(String, IndexDirection)] {
        &self.0
    }

    /// Returns `true` if no field is indexed.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the native index key document.
    pub fn to_document(&self) -> Map<String, Value> {
        self.0
            .iter()
            .map(|(field, direction)| (field.clone(), direction.native_value()))
            .collect()
    }

    /// Returns the store-style default index name (`a_1_b_-1`).
    pub fn default_name(&self) -> String {
        self.0
            .iter()
            .map(|(field, direction)| format!("{}_{}", field, direction.name_suffix()))
            .collect::<Vec<_>>()
            .join("_")
    }
}

impl From<Map<String, Value>> for IndexSpec {
    fn from(map: Map<String, Value>) -> Self {
        Self(
            map.iter()
                .map(|(field, token)| (field.clone(), IndexDirection::from_token(token)))
                .collect(),
        )
    }
}

impl From<IndexSpec> for Map<String, Value> {
    fn from(spec: IndexSpec) -> Self {
        spec.0
            .into_iter()
            .map(|(field, direction)| (field, Value::from(direction.token())))
            .collect()
    }
}
