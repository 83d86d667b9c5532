//! Composition expansion: `oneOf`/`anyOf` unions and `allOf` intersections.
//!
//! A node with composition keywords stands for several possible shapes.
//! [`SchemaDocument::expand`] enumerates them as independent [`Branch`]
//! snapshots:
//!
//! - `allOf` members are merged into the enclosing node. A member that is
//!   itself a union contributes one merged branch per alternative.
//! - `oneOf` and `anyOf` multiply the branch set, one branch per
//!   alternative, in declaration order.
//!
//! # Merge rules
//!
//! | Keyword | `allOf` member | `oneOf`/`anyOf` alternative |
//! |---------|----------------|-----------------------------|
//! | `properties`, `patternProperties` | union, first declaration wins | union, shared entries merged with the alternative winning |
//! | `required` | union, declaration order | union, enclosing node first |
//! | everything else | first declaration wins | alternative wins |

use indexmap::IndexMap;

use crate::document::SchemaDocument;
use crate::reference::RefStack;
use crate::types::SchemaNode;

/// One fully expanded alternative of a schema node.
///
/// The node carries no top-level `$ref`, `oneOf`, `anyOf` or `allOf`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Branch {
    pub node: SchemaNode,
    /// Definitions inlined to produce this branch.
    pub lineage: Vec<String>,
}

/// Which side of a merge wins on conflicting keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Precedence {
    /// `allOf`: the accumulated node, i.e. the first declaration.
    Base,
    /// `oneOf`/`anyOf`: the alternative refines the enclosing node.
    Alternative,
}

impl Branch {
    fn merged_with(&self, other: &Branch, precedence: Precedence) -> Branch {
        let mut lineage = self.lineage.clone();
        for name in &other.lineage {
            if !lineage.contains(name) {
                lineage.push(name.clone());
            }
        }
        let node = match precedence {
            Precedence::Base => merge_nodes(self.node.clone(), other.node.clone()),
            Precedence::Alternative => overlay(self.node.clone(), other.node.clone()),
        };
        Branch { node, lineage }
    }
}

impl SchemaDocument {
    /// Resolve the `$ref` chain at the top of `node` and expand its
    /// composition keywords into independent branches.
    ///
    /// Nested properties are left untouched; they are expanded when the path
    /// walk reaches them.
    pub(crate) fn expand(&self, node: &SchemaNode, stack: &mut RefStack) -> Vec<Branch> {
        let mark = stack.len();
        let mut base = self.dereference(node, stack);
        let lineage = stack.since(mark).to_vec();

        let one_of = base.one_of.take();
        let any_of = base.any_of.take();
        let all_of = base.all_of.take();

        let mut branches = vec![Branch {
            node: base,
            lineage,
        }];

        for member in all_of.iter().flatten() {
            let alternatives = self.expand(member, stack);
            branches = combine(&branches, &alternatives, Precedence::Base);
        }

        for union in [one_of, any_of].into_iter().flatten() {
            let alternatives: Vec<Branch> = union
                .iter()
                .flat_map(|alternative| self.expand(alternative, stack))
                .collect();
            branches = combine(&branches, &alternatives, Precedence::Alternative);
        }

        stack.truncate(mark);
        branches
    }
}

/// Cross product of `bases` and `alternatives`, base-major.
///
/// An empty alternative list leaves the bases untouched.
fn combine(bases: &[Branch], alternatives: &[Branch], precedence: Precedence) -> Vec<Branch> {
    if alternatives.is_empty() {
        return bases.to_vec();
    }
    bases
        .iter()
        .flat_map(|base| {
            alternatives
                .iter()
                .map(move |alt| base.merged_with(alt, precedence))
        })
        .collect()
}

/// Merge `second` into `first`; on conflict `first` wins.
pub(crate) fn merge_nodes(mut first: SchemaNode, second: SchemaNode) -> SchemaNode {
    first.reference = first.reference.or(second.reference);
    first.schema_type = first.schema_type.or(second.schema_type);
    first.description = first.description.or(second.description);
    first.properties = merge_maps(first.properties, second.properties);
    first.items = first.items.or(second.items);
    first.pattern_properties = merge_maps(first.pattern_properties, second.pattern_properties);
    first.enum_values = first.enum_values.or(second.enum_values);
    first.required = merge_required(first.required, second.required);
    first.one_of = first.one_of.or(second.one_of);
    first.any_of = first.any_of.or(second.any_of);
    first.all_of = first.all_of.or(second.all_of);
    first.additional_properties = first.additional_properties.or(second.additional_properties);
    first.default = first.default.or(second.default);
    first.read_only = first.read_only.or(second.read_only);
    for (key, value) in second.extra {
        first.extra.entry(key).or_insert(value);
    }
    first
}

/// Lay a union alternative over its enclosing node; the alternative wins.
///
/// A property declared by both sides is merged rather than replaced, so an
/// alternative that only narrows `enum` keeps the enclosing `type`.
pub(crate) fn overlay(mut base: SchemaNode, mut alt: SchemaNode) -> SchemaNode {
    let properties = overlay_maps(base.properties.take(), alt.properties.take());
    let pattern_properties =
        overlay_maps(base.pattern_properties.take(), alt.pattern_properties.take());
    let required = merge_required(base.required.take(), alt.required.take());

    let mut merged = merge_nodes(alt, base);
    merged.properties = properties;
    merged.pattern_properties = pattern_properties;
    merged.required = required;
    merged
}

fn overlay_maps(
    base: Option<IndexMap<String, SchemaNode>>,
    alt: Option<IndexMap<String, SchemaNode>>,
) -> Option<IndexMap<String, SchemaNode>> {
    match (base, alt) {
        (Some(mut base), Some(alt)) => {
            for (name, node) in alt {
                match base.get_mut(&name) {
                    Some(existing) => {
                        *existing = merge_nodes(node, std::mem::take(existing));
                    }
                    None => {
                        base.insert(name, node);
                    }
                }
            }
            Some(base)
        }
        (base, alt) => base.or(alt),
    }
}

fn merge_maps(
    first: Option<IndexMap<String, SchemaNode>>,
    second: Option<IndexMap<String, SchemaNode>>,
) -> Option<IndexMap<String, SchemaNode>> {
    match (first, second) {
        (Some(mut first), Some(second)) => {
            for (name, node) in second {
                first.entry(name).or_insert(node);
            }
            Some(first)
        }
        (first, second) => first.or(second),
    }
}

fn merge_required(first: Option<Vec<String>>, second: Option<Vec<String>>) -> Option<Vec<String>> {
    match (first, second) {
        (Some(mut first), Some(second)) => {
            for name in second {
                if !first.contains(&name) {
                    first.push(name);
                }
            }
            Some(first)
        }
        (first, second) => first.or(second),
    }
}
