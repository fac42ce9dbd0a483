//! Translation of operator groups into a native filter.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::ValidationError;

use super::{GeoRadius, Operator, QuerySpec};

/// Mean Earth radius used to turn kilometres into radians.
pub const EARTH_RADIUS_KM: f64 = 6378.0;

/// A native document-store filter: field name to value or operator document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filter(Map<String, Value>);

impl Filter {
    /// The empty filter, matching every document.
    pub fn all() -> Self {
        Self::default()
    }

    /// Wraps an already-native filter document.
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Returns the filter clauses.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Returns the filter as a JSON value.
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    /// Returns `true` if the filter matches everything.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consumes the filter and returns its clauses.
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

/// Builds the native filter for a query specification.
///
/// Groups are applied in [`Operator::ALL`] order. Every operator other than
/// `eq` adds a key to the field's operator document, so `gt` and `lt` on one
/// field yield `{"$gt": .., "$lt": ..}`. Combining `eq` with another
/// operator on the same field is rejected.
pub fn translate(spec: &QuerySpec) -> Result<Filter, ValidationError> {
    let mut filter = Map::new();
    let mut equality_fields: HashSet<&str> = HashSet::new();

    for op in Operator::ALL {
        let Some(group) = spec.group(op) else {
            continue;
        };
        for (field, operand) in group {
            match op {
                Operator::Eq => {
                    if filter.contains_key(field) {
                        return Err(conflict(field, op));
                    }
                    equality_fields.insert(field.as_str());
                    filter.insert(field.clone(), operand.clone());
                }
                Operator::Geo => {
                    let geo = GeoRadius::parse(field, operand)?;
                    let clause = json!({
                        "$centerSphere": [geo.center, geo.radius / EARTH_RADIUS_KM]
                    });
                    operator_document(&mut filter, &equality_fields, field, op)?
                        .insert("$within".to_string(), clause);
                }
                Operator::Ne
                | Operator::Lt
                | Operator::Le
                | Operator::Gt
                | Operator::Ge
                | Operator::Like
                | Operator::In => {
                    check_operand(field, op, operand)?;
                    let Some(symbol) = op.symbol() else {
                        continue;
                    };
                    operator_document(&mut filter, &equality_fields, field, op)?
                        .insert(symbol.to_string(), operand.clone());
                }
            }
        }
    }

    Ok(Filter(filter))
}

/// Returns the operator document for `field`, creating it if needed.
fn operator_document<'a>(
    filter: &'a mut Map<String, Value>,
    equality_fields: &HashSet<&str>,
    field: &str,
    op: Operator,
) -> Result<&'a mut Map<String, Value>, ValidationError> {
    if equality_fields.contains(field) {
        return Err(conflict(field, op));
    }
    filter
        .entry(field.to_string())
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| conflict(field, op))
}

fn check_operand(field: &str, op: Operator, operand: &Value) -> Result<(), ValidationError> {
    let message = match op {
        Operator::In if !operand.is_array() => "expected an array",
        Operator::Like if !operand.is_string() => "expected a pattern string",
        _ => return Ok(()),
    };
    Err(ValidationError::InvalidOperand {
        operator: op.name().to_string(),
        field: field.to_string(),
        message: message.to_string(),
    })
}

fn conflict(field: &str, op: Operator) -> ValidationError {
    ValidationError::ConflictingOperators {
        field: field.to_string(),
        operator: op.name().to_string(),
    }
}
