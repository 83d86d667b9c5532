//! Materialization of resolved nodes: nested `$ref` inlining and read-only
//! pruning keyed on the wildcard-normalized property path.

use indexmap::IndexMap;
use tracing::trace;

use crate::document::SchemaDocument;
use crate::reference::RefStack;
use crate::types::{AdditionalProperties, SchemaNode, WILDCARD};

impl SchemaDocument {
    /// Produce an independent copy of `node`, located at `path`, with every
    /// nested reference inlined.
    ///
    /// When `exclude_read_only` is set, a property whose `path/<name>` is
    /// declared read-only is dropped from `properties` and from `required`.
    /// Composition members are materialized at the same path as their owner,
    /// array items at `path/*`.
    pub(crate) fn materialize(
        &self,
        node: SchemaNode,
        path: &str,
        stack: &mut RefStack,
        exclude_read_only: bool,
    ) -> SchemaNode {
        let mark = stack.len();
        let mut node = self.dereference(&node, stack);

        if let Some(properties) = node.properties.take() {
            let mut kept = IndexMap::with_capacity(properties.len());
            for (name, child) in properties {
                let child_path = format!("{}/{}", path, name);
                if exclude_read_only && self.is_read_only(&child_path) {
                    trace!(path = %child_path, "excluding read-only property");
                    if let Some(required) = node.required.as_mut() {
                        required.retain(|r| r != &name);
                    }
                    continue;
                }
                let child = self.materialize(child, &child_path, stack, exclude_read_only);
                kept.insert(name, child);
            }
            node.properties = Some(kept);
        }

        if let Some(items) = node.items.take() {
            let item_path = format!("{}/{}", path, WILDCARD);
            node.items = Some(Box::new(self.materialize(
                *items,
                &item_path,
                stack,
                exclude_read_only,
            )));
        }

        if let Some(patterns) = node.pattern_properties.take() {
            let mut resolved = IndexMap::with_capacity(patterns.len());
            for (pattern, child) in patterns {
                let child_path = format!("{}/{}", path, pattern);
                let child = self.materialize(child, &child_path, stack, exclude_read_only);
                resolved.insert(pattern, child);
            }
            node.pattern_properties = Some(resolved);
        }

        node.additional_properties = match node.additional_properties.take() {
            Some(AdditionalProperties::Schema(schema)) => {
                let child_path = format!("{}/additionalProperties", path);
                Some(AdditionalProperties::Schema(Box::new(self.materialize(
                    *schema,
                    &child_path,
                    stack,
                    exclude_read_only,
                ))))
            }
            other => other,
        };

        for members in [&mut node.one_of, &mut node.any_of, &mut node.all_of]
            .into_iter()
            .flatten()
        {
            let taken = std::mem::take(members);
            *members = taken
                .into_iter()
                .map(|member| self.materialize(member, path, stack, exclude_read_only))
                .collect();
        }

        stack.truncate(mark);
        node
    }
}
