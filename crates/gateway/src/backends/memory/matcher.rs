//! Evaluation of the native filter language over JSON documents.

use std::cmp::Ordering;

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::{StoreError, StoreResult};
use crate::query::{Projection, SortSpec};
use crate::types::{Document, ID_FIELD};

/// A filter compiled once per query.
#[derive(Debug)]
pub(super) struct CompiledFilter {
    clauses: Vec<(String, Vec<Predicate>)>,
}

#[derive(Debug)]
enum Predicate {
    Eq(Value),
    Ne(Value),
    Compare(Comparison, Value),
    Regex(Regex),
    In(Vec<Value>),
    WithinSphere { center: (f64, f64), radians: f64 },
}

#[derive(Debug, Clone, Copy)]
enum Comparison {
    Lt,
    Lte,
    Gt,
    Gte,
}

impl CompiledFilter {
    pub(super) fn compile(filter: &Map<String, Value>) -> StoreResult<Self> {
        let clauses = filter
            .iter()
            .map(|(field, condition)| Ok((field.clone(), compile_condition(field, condition)?)))
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(Self { clauses })
    }

    pub(super) fn matches(&self, document: &Document) -> bool {
        self.clauses.iter().all(|(field, predicates)| {
            let value = lookup(document, field);
            predicates.iter().all(|predicate| predicate.matches(value))
        })
    }
}

fn is_operator_document(condition: &Value) -> bool {
    match condition {
        Value::Object(ops) => !ops.is_empty() && ops.keys().all(|k| k.starts_with('$')),
        _ => false,
    }
}

fn compile_condition(field: &str, condition: &Value) -> StoreResult<Vec<Predicate>> {
    let Value::Object(ops) = condition else {
        return Ok(vec![Predicate::Eq(condition.clone())]);
    };
    if !is_operator_document(condition) {
        return Ok(vec![Predicate::Eq(condition.clone())]);
    }

    ops.iter()
        .map(|(op, operand)| {
            let predicate = match op.as_str() {
                "$eq" => Predicate::Eq(operand.clone()),
                "$ne" => Predicate::Ne(operand.clone()),
                "$lt" => Predicate::Compare(Comparison::Lt, operand.clone()),
                "$lte" => Predicate::Compare(Comparison::Lte, operand.clone()),
                "$gt" => Predicate::Compare(Comparison::Gt, operand.clone()),
                "$gte" => Predicate::Compare(Comparison::Gte, operand.clone()),
                "$regex" => {
                    let pattern = operand.as_str().ok_or_else(|| bad_operand(field, op))?;
                    let regex = Regex::new(pattern).map_err(|e| StoreError::Query {
                        message: format!("invalid $regex on '{}': {}", field, e),
                    })?;
                    Predicate::Regex(regex)
                }
                "$in" => {
                    let values = operand.as_array().ok_or_else(|| bad_operand(field, op))?;
                    Predicate::In(values.clone())
                }
                "$within" | "$geoWithin" => compile_within(field, operand)?,
                other => {
                    return Err(StoreError::Query {
                        message: format!("unknown operator: {}", other),
                    });
                }
            };
            Ok(predicate)
        })
        .collect()
}

fn compile_within(field: &str, operand: &Value) -> StoreResult<Predicate> {
    let sphere = operand
        .get("$centerSphere")
        .and_then(Value::as_array)
        .ok_or_else(|| bad_operand(field, "$within"))?;
    let (center, radians) = match sphere.as_slice() {
        [center, radians] => (
            point(center).ok_or_else(|| bad_operand(field, "$centerSphere"))?,
            radians
                .as_f64()
                .ok_or_else(|| bad_operand(field, "$centerSphere"))?,
        ),
        _ => return Err(bad_operand(field, "$centerSphere")),
    };
    Ok(Predicate::WithinSphere { center, radians })
}

fn bad_operand(field: &str, op: &str) -> StoreError {
    StoreError::Query {
        message: format!("invalid operand for {} on '{}'", op, field),
    }
}

impl Predicate {
    fn matches(&self, value: Option<&Value>) -> bool {
        match self {
            Predicate::Eq(expected) => equals(value, expected),
            Predicate::Ne(expected) => !equals(value, expected),
            Predicate::Compare(comparison, operand) => {
                candidates(value).any(|v| compare(v, operand).is_some_and(|o| comparison.holds(o)))
            }
            Predicate::Regex(regex) => {
                candidates(value).any(|v| v.as_str().is_some_and(|s| regex.is_match(s)))
            }
            Predicate::In(values) => values.iter().any(|expected| equals(value, expected)),
            Predicate::WithinSphere { center, radians } => value
                .and_then(point)
                .is_some_and(|p| angular_distance(*center, p) <= *radians),
        }
    }
}

impl Comparison {
    fn holds(&self, ordering: Ordering) -> bool {
        match self {
            Comparison::Lt => ordering == Ordering::Less,
            Comparison::Lte => ordering != Ordering::Greater,
            Comparison::Gt => ordering == Ordering::Greater,
            Comparison::Gte => ordering != Ordering::Less,
        }
    }
}

/// The value itself, plus its elements when it is an array.
fn candidates(value: Option<&Value>) -> impl Iterator<Item = &Value> {
    let elements = match value {
        Some(Value::Array(items)) => items.as_slice(),
        _ => &[],
    };
    value.into_iter().chain(elements)
}

/// Missing fields equal `null`; arrays match any of their elements.
fn equals(value: Option<&Value>, expected: &Value) -> bool {
    match value {
        None => expected.is_null(),
        Some(actual) => {
            values_equal(actual, expected)
                || actual
                    .as_array()
                    .is_some_and(|items| items.iter().any(|item| values_equal(item, expected)))
        }
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Same-type comparison; values of different types do not compare.
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Resolves a possibly dotted field path.
pub(super) fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = document.get(parts.next()?)?;
    for part in parts {
        current = match current {
            Value::Object(map) => map.get(part)?,
            Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// `[lng, lat]` or a GeoJSON point.
fn point(value: &Value) -> Option<(f64, f64)> {
    let coordinates = match value {
        Value::Array(_) => value,
        Value::Object(map) => map.get("coordinates")?,
        _ => return None,
    };
    match coordinates.as_array()?.as_slice() {
        [lng, lat] => Some((lng.as_f64()?, lat.as_f64()?)),
        _ => None,
    }
}

/// Great-circle distance between two `[lng, lat]` points, in radians.
fn angular_distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (lng1, lat1) = (a.0.to_radians(), a.1.to_radians());
    let (lng2, lat2) = (b.0.to_radians(), b.1.to_radians());
    let h = ((lat2 - lat1) / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * ((lng2 - lng1) / 2.0).sin().powi(2);
    2.0 * h.sqrt().min(1.0).asin()
}

/// Keeps `_id` and the projected fields.
pub(super) fn project(document: &Document, projection: &Projection) -> Document {
    let mut projected = Map::new();
    if let Some(id) = document.get(ID_FIELD) {
        projected.insert(ID_FIELD.to_string(), id.clone());
    }
    for field in projection.fields() {
        if let Some(value) = document.get(field) {
            projected.insert(field.clone(), value.clone());
        }
    }
    projected
}

/// Cross-type ordering: missing/null, numbers, strings, objects, arrays,
/// booleans.
fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Number(_)) => 1,
        Some(Value::String(_)) => 2,
        Some(Value::Object(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Bool(_)) => 5,
    }
}

fn sort_order(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    type_rank(a).cmp(&type_rank(b)).then_with(|| match (a, b) {
        (Some(x), Some(y)) => compare(x, y).unwrap_or(Ordering::Equal),
        _ => Ordering::Equal,
    })
}

/// Stable multi-key sort.
pub(super) fn sort(documents: &mut [Document], spec: &SortSpec) {
    documents.sort_by(|a, b| {
        spec.keys()
            .iter()
            .map(|key| {
                let ordering = sort_order(lookup(a, &key.field), lookup(b, &key.field));
                if key.direction.as_i32() < 0 {
                    ordering.reverse()
                } else {
                    ordering
                }
            })
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
}
