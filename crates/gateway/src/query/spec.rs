//! Request-side query specification.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ValidationError;

use super::Operator;

/// Named operator groups of a list request.
///
/// Deserializes from the flat parameter bag; keys that are not operator
/// names are ignored, so callers may pass unrelated parameters alongside.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuerySpec {
    /// Plain equality.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eq: Option<Map<String, Value>>,
    /// Not equal (`$ne`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ne: Option<Map<String, Value>>,
    /// Less than (`$lt`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lt: Option<Map<String, Value>>,
    /// Less than or equal (`$lte`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub le: Option<Map<String, Value>>,
    /// Greater than (`$gt`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gt: Option<Map<String, Value>>,
    /// Greater than or equal (`$gte`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ge: Option<Map<String, Value>>,
    /// Regular expression (`$regex`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub like: Option<Map<String, Value>>,
    /// Set membership (`$in`).
    #[serde(default, rename = "in", skip_serializing_if = "Option::is_none")]
    pub in_: Option<Map<String, Value>>,
    /// Radius search, see [`GeoRadius`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo: Option<Map<String, Value>>,
}

impl QuerySpec {
    /// Creates an empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `field: operand` to the given operator group.
    pub fn with(mut self, op: Operator, field: impl Into<String>, operand: Value) -> Self {
        self.group_mut(op)
            .get_or_insert_with(Map::new)
            .insert(field.into(), operand);
        self
    }

    /// Returns the operand map of an operator group, if present.
    pub fn group(&self, op: Operator) -> Option<&Map<String, Value>> {
        match op {
            Operator::Eq => self.eq.as_ref(),
            Operator::Ne => self.ne.as_ref(),
            Operator::Lt => self.lt.as_ref(),
            Operator::Le => self.le.as_ref(),
            Operator::Gt => self.gt.as_ref(),
            Operator::Ge => self.ge.as_ref(),
            Operator::Like => self.like.as_ref(),
            Operator::In => self.in_.as_ref(),
            Operator::Geo => self.geo.as_ref(),
        }
    }

    fn group_mut(&mut self, op: Operator) -> &mut Option<Map<String, Value>> {
        match op {
            Operator::Eq => &mut self.eq,
            Operator::Ne => &mut self.ne,
            Operator::Lt => &mut self.lt,
            Operator::Le => &mut self.le,
            Operator::Gt => &mut self.gt,
            Operator::Ge => &mut self.ge,
            Operator::Like => &mut self.like,
            Operator::In => &mut self.in_,
            Operator::Geo => &mut self.geo,
        }
    }

    /// Returns `true` if no operator group carries any field.
    pub fn is_empty(&self) -> bool {
        Operator::ALL
            .iter()
            .all(|op| self.group(*op).is_none_or(|g| g.is_empty()))
    }
}

/// Operand of the `geo` operator: a point and a radius in kilometres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoRadius {
    /// The centre point, as stored (`[longitude, latitude]`).
    pub center: Value,
    /// The search radius in kilometres.
    pub radius: f64,
}

impl GeoRadius {
    /// Parses a `geo` operand for the given field.
    pub fn parse(field: &str, operand: &Value) -> Result<Self, ValidationError> {
        let invalid = |message: &str| ValidationError::InvalidOperand {
            operator: Operator::Geo.name().to_string(),
            field: field.to_string(),
            message: message.to_string(),
        };

        let object = operand
            .as_object()
            .ok_or_else(|| invalid("expected an object with 'center' and 'radius'"))?;
        let center = object
            .get("center")
            .filter(|c| !c.is_null())
            .ok_or_else(|| invalid("missing 'center'"))?;
        let radius = object
            .get("radius")
            .and_then(Value::as_f64)
            .ok_or_else(|| invalid("'radius' must be a number"))?;

        Ok(Self {
            center: center.clone(),
            radius,
        })
    }
}
