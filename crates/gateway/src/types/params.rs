//! The request parameter bag.
//!
//! Every gateway operation takes a [`Params`]. Presence is explicit: each
//! field is optional and the operation that reads it decides what absence
//! means (see the per-field docs).

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::core::ArchiveUpload;
use crate::error::ValidationError;
use crate::query::{FindOptions, Projection, QuerySpec, SortSpec};
use crate::tenant::{TenancyMode, TenantId};

use super::{Document, IndexSpec};

/// Parameters of one gateway request.
///
/// Deserializes from a flat JSON object. Operator groups (`eq`, `gt`, ...)
/// sit at the top level next to the other keys; unknown keys are ignored.
///
/// ```
/// use helios_gateway::types::Params;
/// use serde_json::json;
///
/// let params: Params = serde_json::from_value(json!({
///     "tenant": "acme-1234567890abcdef12345678-",
///     "type": "orders",
///     "gt": { "total": 5 },
///     "limit": 20,
///     "fields": ["total"]
/// })).unwrap();
///
/// assert_eq!(params.entity_type.as_deref(), Some("orders"));
/// assert_eq!(params.find_options().limit, Some(20));
/// assert!(params.projection().is_some());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Params {
    /// Tenant identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<TenantId>,

    /// Whether the tenant owns a dedicated database.
    #[serde(default)]
    pub dedicated: bool,

    /// Entity type. List without one lists collections instead of records.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,

    /// Record identifier. An empty string counts as absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,

    /// Payload for create/update, or a projection list for read/list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Value>,

    /// Operator groups for list.
    #[serde(flatten)]
    pub query: QuerySpec,

    /// Number of records to skip; honoured when `>= 0`.
    #[serde(default, deserialize_with = "lenient_integer", skip_serializing_if = "Option::is_none")]
    pub skip: Option<i64>,

    /// Maximum number of records; honoured when `> 0`.
    #[serde(default, deserialize_with = "lenient_integer", skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,

    /// Result order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortSpec>,

    /// Index specification for index creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<IndexSpec>,

    /// Export format; the configured default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Uploaded archives for import.
    #[serde(skip)]
    pub files: Vec<ArchiveUpload>,
}

/// Non-integer paging values are treated as absent.
fn lenient_integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_i64()))
}

/// A create/update payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// A single document.
    One(Document),
    /// A batch of documents.
    Many(Vec<Document>),
}

impl Payload {
    /// Returns every document in the payload.
    pub fn into_documents(self) -> Vec<Document> {
        match self {
            Payload::One(document) => vec![document],
            Payload::Many(documents) => documents,
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl Params {
    /// Creates parameters for a tenant.
    pub fn new(tenant: impl Into<TenantId>) -> Self {
        Self {
            tenant: Some(tenant.into()),
            ..Self::default()
        }
    }

    /// Sets the entity type.
    pub fn with_type(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type.into());
        self
    }

    /// Marks the tenant as owning a dedicated database.
    pub fn dedicated(mut self) -> Self {
        self.dedicated = true;
        self
    }

    /// Sets the record identifier.
    pub fn with_guid(mut self, guid: impl Into<String>) -> Self {
        self.guid = Some(guid.into());
        self
    }

    /// Sets the `fields` value.
    pub fn with_fields(mut self, fields: Value) -> Self {
        self.fields = Some(fields);
        self
    }

    /// Sets the operator groups.
    pub fn with_query(mut self, query: QuerySpec) -> Self {
        self.query = query;
        self
    }

    /// Sets the skip.
    pub fn with_skip(mut self, skip: i64) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Sets the limit.
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the sort.
    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Sets the index specification.
    pub fn with_index(mut self, index: IndexSpec) -> Self {
        self.index = Some(index);
        self
    }

    /// Sets the export format.
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Adds an uploaded archive.
    pub fn with_file(mut self, file: ArchiveUpload) -> Self {
        self.files.push(file);
        self
    }

    /// Returns the tenancy mode.
    pub fn mode(&self) -> TenancyMode {
        TenancyMode::from_dedicated(self.dedicated)
    }

    /// Returns the tenant, or `MissingParameter("tenant")`.
    pub fn require_tenant(&self) -> Result<&TenantId, ValidationError> {
        self.tenant
            .as_ref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| missing("tenant"))
    }

    /// Returns the entity type, or `MissingParameter("type")`.
    pub fn require_entity_type(&self) -> Result<&str, ValidationError> {
        self.entity_type
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| missing("type"))
    }

    /// Returns the guid if present and non-empty.
    pub fn guid(&self) -> Option<&str> {
        self.guid.as_deref().filter(|g| !g.is_empty())
    }

    /// Returns the guid, or `MissingParameter("guid")`.
    pub fn require_guid(&self) -> Result<&str, ValidationError> {
        self.guid().ok_or_else(|| missing("guid"))
    }

    /// Interprets `fields` as a create/update payload.
    ///
    /// Absent or `null` means no payload. An object is one document; an
    /// array must hold only objects. Anything else is rejected.
    pub fn payload(&self) -> Result<Option<Payload>, ValidationError> {
        match &self.fields {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Object(document)) => Ok(Some(Payload::One(document.clone()))),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::Object(document) => Ok(document.clone()),
                    other => Err(ValidationError::InvalidFieldsType {
                        found: format!("array containing {}", json_type(other)),
                    }),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(|documents| Some(Payload::Many(documents))),
            Some(other) => Err(ValidationError::InvalidFieldsType {
                found: json_type(other).to_string(),
            }),
        }
    }

    /// Interprets `fields` as a projection list.
    ///
    /// Only an array is a projection; string entries are taken verbatim and
    /// numbers are stringified. Any other shape means "all fields".
    pub fn projection(&self) -> Option<Projection> {
        let Some(Value::Array(items)) = &self.fields else {
            return None;
        };
        let fields: Vec<String> = items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect();
        if fields.is_empty() {
            None
        } else {
            Some(Projection::new(fields))
        }
    }

    /// Builds the find options for list.
    pub fn find_options(&self) -> FindOptions {
        FindOptions {
            projection: self.projection(),
            skip: self.skip.filter(|s| *s >= 0).map(|s| s as u64),
            limit: self.limit.filter(|l| *l > 0).map(|l| l as u64),
            sort: self.sort.clone().filter(|s| !s.is_empty()),
        }
    }
}

fn missing(name: &str) -> ValidationError {
    ValidationError::MissingParameter {
        name: name.to_string(),
    }
}
