//! Parsed resource provider schema documents.

use std::collections::HashSet;
use std::sync::OnceLock;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SchemaValidationError;
use crate::pattern::PatternCache;
use crate::types::{PropertyCategory, SchemaNode, SchemaType};

/// Top-level fields without which a document is rejected.
const REQUIRED_FIELDS: &[&str] = &["typeName", "properties"];

/// Declared pointer list with constant-time membership.
///
/// Serializes back to the original list, order and duplicates included.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct PointerSet {
    declared: Vec<String>,
    index: HashSet<String>,
}

impl PointerSet {
    pub fn contains(&self, pointer: &str) -> bool {
        self.index.contains(pointer)
    }

    pub fn is_empty(&self) -> bool {
        self.declared.is_empty()
    }

    /// Pointers in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.declared.iter().map(String::as_str)
    }
}

impl From<Vec<String>> for PointerSet {
    fn from(declared: Vec<String>) -> Self {
        let index = declared.iter().cloned().collect();
        Self { declared, index }
    }
}

impl From<PointerSet> for Vec<String> {
    fn from(set: PointerSet) -> Self {
        set.declared
    }
}

/// The `tagging` block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tagging {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taggable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_on_create: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_updatable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_formation_system_tags: Option<bool>,
    /// Pointer to the property holding the resource's tags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_property: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// One entry of the `handlers` block (`create`, `read`, `update`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handler {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_in_minutes: Option<u32>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// A resource type's full provider schema.
///
/// Immutable once parsed; every query is a pure read, so a document can be
/// shared behind an `Arc` by any number of concurrent callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDocument {
    type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    documentation_url: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    definitions: IndexMap<String, SchemaNode>,
    properties: IndexMap<String, SchemaNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    required: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    additional_properties: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    primary_identifier: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    additional_identifiers: Vec<Vec<String>>,
    #[serde(default, skip_serializing_if = "PointerSet::is_empty")]
    read_only_properties: PointerSet,
    #[serde(default, skip_serializing_if = "PointerSet::is_empty")]
    write_only_properties: PointerSet,
    #[serde(default, skip_serializing_if = "PointerSet::is_empty")]
    create_only_properties: PointerSet,
    #[serde(default, skip_serializing_if = "PointerSet::is_empty")]
    deprecated_properties: PointerSet,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    conditional_create_only_properties: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    non_public_properties: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    taggable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tagging: Option<Tagging>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    handlers: IndexMap<String, Handler>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    one_of: Option<Vec<SchemaNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    any_of: Option<Vec<SchemaNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    all_of: Option<Vec<SchemaNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    resource_link: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    property_transform: Option<IndexMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    type_configuration: Option<Value>,
    #[serde(flatten)]
    extra: IndexMap<String, Value>,

    #[serde(skip)]
    structural: OnceLock<Value>,
    #[serde(skip)]
    patterns: PatternCache,
}

impl SchemaDocument {
    /// Parse a resource schema from raw JSON text.
    ///
    /// # Errors
    ///
    /// Returns `SchemaValidationError::InvalidJson` if the text is not JSON
    /// of the expected shape, or `MissingField` if `typeName` or
    /// `properties` is absent.
    pub fn parse(text: &str) -> Result<Self, SchemaValidationError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|source| SchemaValidationError::InvalidJson { source })?;
        Self::from_value(value)
    }

    /// Build a document from an already parsed JSON value.
    pub fn from_value(value: Value) -> Result<Self, SchemaValidationError> {
        for &field in REQUIRED_FIELDS {
            if value.get(field).is_none() {
                return Err(SchemaValidationError::MissingField { field });
            }
        }
        serde_json::from_value(value).map_err(|source| SchemaValidationError::InvalidJson { source })
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn source_url(&self) -> Option<&str> {
        self.source_url.as_deref()
    }

    pub fn documentation_url(&self) -> Option<&str> {
        self.documentation_url.as_deref()
    }

    pub fn properties(&self) -> &IndexMap<String, SchemaNode> {
        &self.properties
    }

    pub fn definitions(&self) -> &IndexMap<String, SchemaNode> {
        &self.definitions
    }

    pub fn definition(&self, name: &str) -> Option<&SchemaNode> {
        self.definitions.get(name)
    }

    pub fn required(&self) -> &[String] {
        &self.required
    }

    pub fn additional_properties(&self) -> Option<bool> {
        self.additional_properties
    }

    pub fn primary_identifier(&self) -> &[String] {
        &self.primary_identifier
    }

    pub fn additional_identifiers(&self) -> &[Vec<String>] {
        &self.additional_identifiers
    }

    pub fn conditional_create_only_properties(&self) -> &[String] {
        &self.conditional_create_only_properties
    }

    pub fn non_public_properties(&self) -> &[String] {
        &self.non_public_properties
    }

    /// Whether the resource supports tags.
    ///
    /// The `tagging.taggable` flag wins over the legacy top-level `taggable`.
    pub fn taggable(&self) -> Option<bool> {
        self.tagging
            .as_ref()
            .and_then(|t| t.taggable)
            .or(self.taggable)
    }

    pub fn tagging(&self) -> Option<&Tagging> {
        self.tagging.as_ref()
    }

    pub fn handlers(&self) -> &IndexMap<String, Handler> {
        &self.handlers
    }

    pub fn one_of(&self) -> Option<&[SchemaNode]> {
        self.one_of.as_deref()
    }

    pub fn any_of(&self) -> Option<&[SchemaNode]> {
        self.any_of.as_deref()
    }

    pub fn all_of(&self) -> Option<&[SchemaNode]> {
        self.all_of.as_deref()
    }

    pub fn resource_link(&self) -> Option<&Value> {
        self.resource_link.as_ref()
    }

    pub fn property_transform(&self) -> Option<&IndexMap<String, String>> {
        self.property_transform.as_ref()
    }

    pub fn type_configuration(&self) -> Option<&Value> {
        self.type_configuration.as_ref()
    }

    /// Declared pointers for a property category.
    pub fn category(&self, category: PropertyCategory) -> &PointerSet {
        match category {
            PropertyCategory::ReadOnly => &self.read_only_properties,
            PropertyCategory::WriteOnly => &self.write_only_properties,
            PropertyCategory::CreateOnly => &self.create_only_properties,
            PropertyCategory::Deprecated => &self.deprecated_properties,
        }
    }

    /// Exact membership of an already normalized path (indices as `*`).
    pub fn is_in_category(&self, category: PropertyCategory, path: &str) -> bool {
        self.category(category).contains(path)
    }

    pub fn is_read_only(&self, path: &str) -> bool {
        self.is_in_category(PropertyCategory::ReadOnly, path)
    }

    pub fn is_write_only(&self, path: &str) -> bool {
        self.is_in_category(PropertyCategory::WriteOnly, path)
    }

    pub fn is_create_only(&self, path: &str) -> bool {
        self.is_in_category(PropertyCategory::CreateOnly, path)
    }

    pub fn is_deprecated(&self, path: &str) -> bool {
        self.is_in_category(PropertyCategory::Deprecated, path)
    }

    /// Every category the path is declared in.
    pub fn categories_of(&self, path: &str) -> Vec<PropertyCategory> {
        PropertyCategory::ALL
            .into_iter()
            .filter(|c| self.is_in_category(*c, path))
            .collect()
    }

    /// Direct lookup in the document's structural form.
    ///
    /// No `$ref`, composition, or wildcard handling: `/properties/Tags/items`
    /// works, `/properties/Tags/*` does not. Array elements are addressed by
    /// index.
    pub fn get_by_path(&self, path: &str) -> Option<Value> {
        let mut current = self.structural();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(arr) => arr.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current.clone())
    }

    /// Serialize back to a plain JSON value equivalent to the input.
    pub fn to_json(&self) -> Value {
        self.structural().clone()
    }

    pub(crate) fn patterns(&self) -> &PatternCache {
        &self.patterns
    }

    fn structural(&self) -> &Value {
        self.structural
            .get_or_init(|| serde_json::to_value(self).unwrap_or_default())
    }

    /// The resource itself as a schema node: an object holding the top-level
    /// properties, required list, and root composition.
    pub(crate) fn root_node(&self) -> SchemaNode {
        SchemaNode {
            schema_type: Some(SchemaType::Single("object".to_string())),
            description: self.description.clone(),
            properties: Some(self.properties.clone()),
            required: (!self.required.is_empty()).then(|| self.required.clone()),
            additional_properties: self
                .additional_properties
                .map(crate::types::AdditionalProperties::Bool),
            one_of: self.one_of.clone(),
            any_of: self.any_of.clone(),
            all_of: self.all_of.clone(),
            ..SchemaNode::default()
        }
    }
}
