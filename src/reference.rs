//! `$ref` resolution against a document's `definitions`.

use tracing::debug;

use crate::document::SchemaDocument;
use crate::types::{definition_name, SchemaNode};

/// Definition names currently being resolved, innermost last.
///
/// Passed through every recursive call; a name already on the stack marks a
/// reference cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct RefStack {
    names: Vec<String>,
}

impl RefStack {
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn push(&mut self, name: &str) {
        self.names.push(name.to_string());
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Pop everything pushed after `mark`.
    pub fn truncate(&mut self, mark: usize) {
        self.names.truncate(mark);
    }

    /// Names pushed after `mark`.
    pub fn since(&self, mark: usize) -> &[String] {
        &self.names[mark.min(self.names.len())..]
    }
}

impl From<Vec<String>> for RefStack {
    fn from(names: Vec<String>) -> Self {
        Self { names }
    }
}

impl SchemaDocument {
    /// Resolve a `#/definitions/<name>` reference to an independent copy of
    /// the definition, with nested references inlined.
    ///
    /// Returns `None` for any other reference shape and for missing targets.
    /// Reference cycles inside the definition are cut with an opaque
    /// placeholder.
    pub fn resolve_ref(&self, reference: &str) -> Option<SchemaNode> {
        let name = definition_name(reference)?;
        self.definition(name)?;

        let local = SchemaNode {
            reference: Some(reference.to_string()),
            ..SchemaNode::default()
        };
        let mut stack = RefStack::default();
        let node = self.dereference(&local, &mut stack);
        Some(self.materialize(node, &format!("/definitions/{name}"), &mut stack, false))
    }

    /// Follow the `$ref` chain at the top of `node`.
    ///
    /// Every inlined definition name is pushed on `stack`; the caller owns
    /// popping them. Malformed or dangling references are dropped and the
    /// local fields kept.
    pub(crate) fn dereference(&self, node: &SchemaNode, stack: &mut RefStack) -> SchemaNode {
        let mut current = node.clone();
        while let Some(reference) = current.reference.take() {
            let Some(name) = definition_name(&reference) else {
                debug!(%reference, "unsupported $ref shape, keeping local fields");
                break;
            };
            if stack.contains(name) {
                debug!(%reference, "circular $ref, substituting placeholder");
                return SchemaNode::placeholder(&current);
            }
            let Some(target) = self.definition(name) else {
                debug!(%reference, "dangling $ref, keeping local fields");
                break;
            };
            stack.push(name);
            current = merge_reference(current, target.clone());
        }
        current
    }
}

/// Combine a referencing node with its target.
///
/// Structural keywords come from the target when it declares them; the
/// referencing site keeps its own description, default, `readOnly` and extra
/// keywords.
pub(crate) fn merge_reference(local: SchemaNode, target: SchemaNode) -> SchemaNode {
    let mut extra = target.extra;
    for (key, value) in local.extra {
        extra.insert(key, value);
    }

    SchemaNode {
        reference: target.reference,
        schema_type: target.schema_type.or(local.schema_type),
        description: local.description.or(target.description),
        properties: target.properties.or(local.properties),
        items: target.items.or(local.items),
        pattern_properties: target.pattern_properties.or(local.pattern_properties),
        enum_values: target.enum_values.or(local.enum_values),
        required: target.required.or(local.required),
        one_of: target.one_of.or(local.one_of),
        any_of: target.any_of.or(local.any_of),
        all_of: target.all_of.or(local.all_of),
        additional_properties: target.additional_properties.or(local.additional_properties),
        default: local.default.or(target.default),
        read_only: local.read_only.or(target.read_only),
        extra,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(definitions: serde_json::Value) -> SchemaDocument {
        SchemaDocument::from_value(json!({
            "typeName": "Test::Ref::Resource",
            "definitions": definitions,
            "properties": {}
        }))
        .unwrap()
    }

    fn node(value: serde_json::Value) -> SchemaNode {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn resolve_ref_returns_definition() {
        let doc = doc(json!({
            "Tag": {
                "type": "object",
                "properties": { "Key": { "type": "string" }, "Value": { "type": "string" } }
            }
        }));
        let tag = doc.resolve_ref("#/definitions/Tag").unwrap();
        assert_eq!(tag.property_names().collect::<Vec<_>>(), ["Key", "Value"]);
    }

    #[test]
    fn resolve_ref_rejects_other_shapes() {
        let doc = doc(json!({ "Tag": { "type": "object" } }));
        assert!(doc.resolve_ref("#/definitions/Missing").is_none());
        assert!(doc.resolve_ref("#/$defs/Tag").is_none());
        assert!(doc.resolve_ref("tag.json").is_none());
    }

    #[test]
    fn resolve_ref_is_idempotent() {
        let doc = doc(json!({
            "Rule": {
                "type": "object",
                "properties": { "Filter": { "$ref": "#/definitions/Filter" } }
            },
            "Filter": { "type": "object", "properties": { "Prefix": { "type": "string" } } }
        }));
        let first = doc.resolve_ref("#/definitions/Rule").unwrap();
        let second = doc.resolve_ref("#/definitions/Rule").unwrap();
        assert_eq!(first, second);
        let filter = &first.properties.as_ref().unwrap()["Filter"];
        assert!(filter.reference.is_none());
        assert!(filter.properties.as_ref().unwrap().contains_key("Prefix"));
    }

    #[test]
    fn resolve_ref_follows_alias_chains() {
        let doc = doc(json!({
            "Alias": { "$ref": "#/definitions/Target", "description": "alias" },
            "Target": { "type": "string", "description": "target" }
        }));
        let resolved = doc.resolve_ref("#/definitions/Alias").unwrap();
        assert_eq!(resolved.schema_type, Some(crate::types::SchemaType::Single("string".into())));
        assert_eq!(resolved.description.as_deref(), Some("alias"));
    }

    #[test]
    fn mutual_cycle_terminates_with_placeholder() {
        let doc = doc(json!({
            "X": { "type": "object", "properties": { "Y": { "$ref": "#/definitions/Y" } } },
            "Y": { "type": "object", "properties": { "X": { "$ref": "#/definitions/X" } } }
        }));
        let x = doc.resolve_ref("#/definitions/X").unwrap();
        let y = &x.properties.as_ref().unwrap()["Y"];
        let inner_x = &y.properties.as_ref().unwrap()["X"];
        assert!(inner_x.reference.is_none());
        assert!(!inner_x.has_structure());
    }

    #[test]
    fn pure_alias_cycle_terminates() {
        let doc = doc(json!({
            "A": { "$ref": "#/definitions/B" },
            "B": { "$ref": "#/definitions/A" }
        }));
        let a = doc.resolve_ref("#/definitions/A").unwrap();
        assert!(a.reference.is_none());
        assert!(!a.has_structure());
    }

    #[test]
    fn dereference_keeps_local_fields_on_dangling_ref() {
        let doc = doc(json!({}));
        let local = node(json!({
            "$ref": "#/definitions/Nowhere",
            "description": "kept",
            "type": "string"
        }));
        let resolved = doc.dereference(&local, &mut RefStack::default());
        assert!(resolved.reference.is_none());
        assert_eq!(resolved.description.as_deref(), Some("kept"));
        assert!(resolved.schema_type.is_some());
    }

    #[test]
    fn dereference_pushes_inlined_names() {
        let doc = doc(json!({ "Tag": { "type": "object" } }));
        let mut stack = RefStack::default();
        doc.dereference(&node(json!({ "$ref": "#/definitions/Tag" })), &mut stack);
        assert!(stack.contains("Tag"));
        assert_eq!(stack.since(0), ["Tag".to_string()]);
    }

    #[test]
    fn merge_reference_precedence() {
        let local = node(json!({
            "description": "local description",
            "type": "string",
            "title": "Local",
            "insertionOrder": true
        }));
        let target = node(json!({
            "description": "target description",
            "type": "object",
            "properties": { "A": { "type": "string" } },
            "title": "Target",
            "additionalProperties": false
        }));
        let merged = merge_reference(local, target);
        assert_eq!(merged.description.as_deref(), Some("local description"));
        assert_eq!(
            merged.schema_type,
            Some(crate::types::SchemaType::Single("object".into()))
        );
        assert!(merged.properties.is_some());
        assert_eq!(merged.extra["title"], json!("Local"));
        assert_eq!(merged.extra["insertionOrder"], json!(true));
        assert!(merged.additional_properties.is_some());
    }

    #[test]
    fn merge_reference_keeps_local_structure_missing_from_target() {
        let local = node(json!({ "enum": ["a", "b"] }));
        let target = node(json!({ "type": "string" }));
        let merged = merge_reference(local, target);
        assert_eq!(merged.enum_values, Some(vec![json!("a"), json!("b")]));
    }
}
