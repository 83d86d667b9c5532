//! Path resolution - enumerates every shape a property path can take.

use tracing::debug;

use crate::document::SchemaDocument;
use crate::reference::RefStack;
use crate::types::{is_index, ResolveOptions, SchemaNode, WILDCARD};

/// A node reached by the path walk and the normalized path consumed so far.
#[derive(Debug, Clone)]
struct Candidate {
    node: SchemaNode,
    path: String,
}

/// Outcome of applying one path segment to one expanded branch.
enum Step {
    Found(Candidate),
    Missing,
    /// The branch is untyped and has nothing to descend into.
    Ambiguous,
}

impl SchemaDocument {
    /// Resolve a property path to every structurally valid shape at it.
    ///
    /// `path` is `/`-delimited. `/properties/<Name>/...` walks resource
    /// properties, `*` walks into array items, and `/definitions/<Name>/...`
    /// starts from a named definition. `""`, `/` and `/properties` address
    /// the resource itself.
    ///
    /// Each returned node is an independent copy with `$ref`s inlined and
    /// top-level composition expanded: one entry per `oneOf`/`anyOf`
    /// alternative, in declaration order, with `allOf` members merged.
    /// An unknown path yields an empty vector. A branch that reaches a
    /// free-form node (untyped, or a type union with nothing to descend
    /// into) returns that node, unless `require_fully_resolved` is set, in
    /// which case the whole result is empty.
    pub fn resolve_json_pointer_path(&self, path: &str, options: &ResolveOptions) -> Vec<SchemaNode> {
        let Some((mut candidates, segments)) = self.start(path) else {
            debug!(path, "path does not address properties or definitions");
            return Vec::new();
        };

        // Branches that stopped at a free-form node, kept as the deepest shape known
        let mut settled = Vec::new();
        for segment in segments {
            let mut next = Vec::new();
            for candidate in &candidates {
                for branch in self.expand(&candidate.node, &mut RefStack::default()) {
                    match self.step(&branch.node, segment, &candidate.path) {
                        Step::Found(found) => next.push(found),
                        Step::Missing => {}
                        Step::Ambiguous if options.require_fully_resolved => {
                            debug!(path, at = %candidate.path, segment, "ambiguous node, refusing to guess");
                            return Vec::new();
                        }
                        Step::Ambiguous => {
                            debug!(path, at = %candidate.path, segment, "ambiguous node, stopping at matched prefix");
                            settled.push(Candidate {
                                node: branch.node,
                                path: candidate.path.clone(),
                            });
                        }
                    }
                }
            }
            candidates = next;
            if candidates.is_empty() {
                break;
            }
        }
        candidates.extend(settled);

        let mut resolved = Vec::new();
        for candidate in candidates {
            for branch in self.expand(&candidate.node, &mut RefStack::default()) {
                let mut stack = RefStack::from(branch.lineage);
                resolved.push(self.materialize(
                    branch.node,
                    &candidate.path,
                    &mut stack,
                    options.exclude_read_only,
                ));
            }
        }
        resolved
    }

    /// Starting candidate and the segments left to walk.
    fn start<'p>(&self, path: &'p str) -> Option<(Vec<Candidate>, Vec<&'p str>)> {
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        let start = match segments.next() {
            None | Some("properties") => Candidate {
                node: self.root_node(),
                path: "/properties".to_string(),
            },
            Some("definitions") => {
                let name = segments.next()?;
                Candidate {
                    node: self.definition(name)?.clone(),
                    path: format!("/definitions/{}", name),
                }
            }
            Some(_) => return None,
        };
        Some((vec![start], segments.collect()))
    }
}

impl SchemaDocument {
    /// Apply one segment to an expanded branch.
    ///
    /// A numeric segment on an array-shaped node is treated as `*`, so the
    /// accumulated path stays wildcard-normalized.
    fn step(&self, node: &SchemaNode, segment: &str, path: &str) -> Step {
        if segment == WILDCARD || (is_index(segment) && node.is_array_like()) {
            return match &node.items {
                Some(items) => Step::Found(Candidate {
                    node: (**items).clone(),
                    path: format!("{}/{}", path, WILDCARD),
                }),
                None if node.is_ambiguous() => Step::Ambiguous,
                None => Step::Missing,
            };
        }

        let child_path = format!("{}/{}", path, segment);
        if let Some(child) = node.properties.as_ref().and_then(|p| p.get(segment)) {
            return Step::Found(Candidate {
                node: child.clone(),
                path: child_path,
            });
        }

        // First matching pattern wins; invalid ones are skipped
        for (pattern, child) in node.pattern_properties.iter().flatten() {
            if self.pattern(pattern).is_ok_and(|re| re.is_match(segment)) {
                return Step::Found(Candidate {
                    node: child.clone(),
                    path: child_path,
                });
            }
        }

        if node.is_ambiguous() {
            Step::Ambiguous
        } else {
            Step::Missing
        }
    }
}
