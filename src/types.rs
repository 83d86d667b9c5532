//! Core types for resource schema resolution.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Path token standing for "any element" of an array.
pub const WILDCARD: &str = "*";

/// Prefix every internal `$ref` must carry.
pub const DEFINITIONS_REF_PREFIX: &str = "#/definitions/";

/// Extract the definition name from a `#/definitions/<name>` reference.
///
/// Returns `None` for any other shape: external files, URLs, nested
/// pointers, or an empty name.
pub fn definition_name(reference: &str) -> Option<&str> {
    let name = reference.strip_prefix(DEFINITIONS_REF_PREFIX)?;
    if name.is_empty() || name.contains('/') {
        return None;
    }
    Some(name)
}

/// Rewrite every numeric segment of a property path to the wildcard token.
///
/// `/properties/Tags/0/Key` becomes `/properties/Tags/*/Key`, the form used
/// by the category lists of a resource schema.
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if is_index(segment) {
                WILDCARD
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

pub(crate) fn is_index(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

/// The `type` keyword: a single type name or a small union of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaType {
    Single(String),
    Union(Vec<String>),
}

impl SchemaType {
    /// Iterate the declared type names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        let names: &[String] = match self {
            SchemaType::Single(name) => std::slice::from_ref(name),
            SchemaType::Union(names) => names,
        };
        names.iter().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names().any(|n| n == name)
    }

    /// True when more than one type is admitted, e.g. `["object", "string"]`.
    pub fn is_union(&self) -> bool {
        match self {
            SchemaType::Single(_) => false,
            SchemaType::Union(names) => names.len() > 1,
        }
    }
}

/// The `additionalProperties` keyword on a nested schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Bool(bool),
    Schema(Box<SchemaNode>),
}

/// One schema location inside a resource schema.
///
/// Covers the subset of the JSON-Schema dialect that resource provider
/// schemas actually use. Anything else lands in `extra` and is written back
/// unchanged by serialization.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaNode {
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, SchemaNode>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaNode>>,

    /// Regex source → schema, in declaration order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_properties: Option<IndexMap<String, SchemaNode>>,

    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<SchemaNode>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub any_of: Option<Vec<SchemaNode>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_of: Option<Vec<SchemaNode>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<AdditionalProperties>,

    /// `Some(Value::Null)` for an explicit `"default": null`.
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub default: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,

    /// Unrecognized keywords (`title`, `insertionOrder`, `pattern`, ...).
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl SchemaNode {
    /// True when the node declares a shape the path resolver can descend into.
    pub fn has_structure(&self) -> bool {
        self.properties.is_some() || self.items.is_some() || self.pattern_properties.is_some()
    }

    pub fn has_composition(&self) -> bool {
        self.one_of.is_some() || self.any_of.is_some() || self.all_of.is_some()
    }

    /// True when the node is an array or at least declares array items.
    pub fn is_array_like(&self) -> bool {
        self.items.is_some()
            || self
                .schema_type
                .as_ref()
                .map(|t| t.contains("array"))
                .unwrap_or(false)
    }

    /// True when nothing about the node says how to continue a path through it:
    /// no `type` (or several) and no properties/items to descend into.
    pub fn is_ambiguous(&self) -> bool {
        let untyped = match &self.schema_type {
            None => true,
            Some(t) => t.is_union(),
        };
        untyped && !self.has_structure()
    }

    /// Property names this node declares, in declaration order.
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties
            .iter()
            .flat_map(|props| props.keys().map(String::as_str))
    }

    /// Opaque stand-in for a branch that could not be resolved.
    ///
    /// Only descriptive metadata of `local` survives.
    pub(crate) fn placeholder(local: &SchemaNode) -> SchemaNode {
        SchemaNode {
            description: local.description.clone(),
            default: local.default.clone(),
            read_only: local.read_only,
            extra: local.extra.clone(),
            ..SchemaNode::default()
        }
    }
}

/// A present field is always `Some`, even when its value is `null`.
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Property categories a resource schema declares as pointer lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PropertyCategory {
    ReadOnly,
    WriteOnly,
    CreateOnly,
    Deprecated,
}

impl PropertyCategory {
    pub const ALL: [PropertyCategory; 4] = [
        PropertyCategory::ReadOnly,
        PropertyCategory::WriteOnly,
        PropertyCategory::CreateOnly,
        PropertyCategory::Deprecated,
    ];

    /// Returns the top-level schema key holding this category's pointers.
    pub fn schema_key(&self) -> &'static str {
        match self {
            PropertyCategory::ReadOnly => "readOnlyProperties",
            PropertyCategory::WriteOnly => "writeOnlyProperties",
            PropertyCategory::CreateOnly => "createOnlyProperties",
            PropertyCategory::Deprecated => "deprecatedProperties",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyCategory::ReadOnly => "read-only",
            PropertyCategory::WriteOnly => "write-only",
            PropertyCategory::CreateOnly => "create-only",
            PropertyCategory::Deprecated => "deprecated",
        }
    }
}

/// Options for path resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Drop properties declared in `readOnlyProperties` from the resolved
    /// shapes, at every depth. Defaults to false.
    pub exclude_read_only: bool,
    /// Return nothing at all when a branch reaches an untyped node it cannot
    /// continue through, instead of dropping only that branch.
    pub require_fully_resolved: bool,
}

impl ResolveOptions {
    /// Create options with both switches off.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exclude_read_only(mut self, exclude: bool) -> Self {
        self.exclude_read_only = exclude;
        self
    }

    pub fn require_fully_resolved(mut self, require: bool) -> Self {
        self.require_fully_resolved = require;
        self
    }
}
