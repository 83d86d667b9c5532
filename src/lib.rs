//! CloudFormation Resource Schema Core
//!
//! Structural typing over CloudFormation resource provider schemas.
//!
//! This library parses a resource schema into a [`SchemaDocument`] and answers
//! "what shapes can the value at this property path take?" with `$ref`s
//! inlined and `oneOf`/`anyOf`/`allOf` expanded into concrete alternatives.
//!
//! # Example
//!
//! ```
//! use cfn_schema::{ResolveOptions, SchemaDocument};
//!
//! let doc = SchemaDocument::parse(r##"{
//!     "typeName": "AWS::S3::Bucket",
//!     "definitions": {
//!         "Tag": {
//!             "type": "object",
//!             "properties": {
//!                 "Key": { "type": "string" },
//!                 "Value": { "type": "string" }
//!             }
//!         }
//!     },
//!     "properties": {
//!         "Arn": { "type": "string" },
//!         "Tags": { "type": "array", "items": { "$ref": "#/definitions/Tag" } }
//!     },
//!     "readOnlyProperties": ["/properties/Arn"]
//! }"##).unwrap();
//!
//! // Array elements are addressed with `*`; the Tag definition is inlined
//! let tags = doc.resolve_json_pointer_path("/properties/Tags/*", &ResolveOptions::new());
//! assert_eq!(tags.len(), 1);
//! assert!(tags[0].properties.as_ref().unwrap().contains_key("Key"));
//!
//! assert!(doc.is_read_only("/properties/Arn"));
//!
//! // Read-only properties can be pruned from resolved shapes
//! let root = doc.resolve_json_pointer_path("", &ResolveOptions::new().exclude_read_only(true));
//! assert!(!root[0].properties.as_ref().unwrap().contains_key("Arn"));
//! ```
//!
//! # Path Grammar
//!
//! | Path | Addresses |
//! |------|-----------|
//! | `""`, `/`, `/properties` | the resource itself |
//! | `/properties/<Name>/...` | a resource property, then nested properties |
//! | `.../*` or `.../<index>` | array items |
//! | `/definitions/<Name>/...` | a named definition |
//!
//! Category lookups such as [`SchemaDocument::is_read_only`] match declared
//! pointers exactly; use [`normalize_path`] to turn concrete indices into `*`
//! first.

mod compose;
mod document;
mod error;
mod filter;
mod linter;
mod loader;
mod pattern;
mod reference;
mod registry;
mod resolver;
mod types;

pub use document::{Handler, PointerSet, SchemaDocument, Tagging};
pub use error::{LoadError, SchemaValidationError};
pub use linter::{lint, lint_file, Diagnostic, FileResult, FileStatus, LintResult, Severity};
pub use loader::{load_document, load_document_str, schema_file_name};
pub use registry::{DirectorySource, MemorySource, SchemaRegistry, SchemaSource};
pub use types::{
    definition_name, normalize_path, AdditionalProperties, PropertyCategory, ResolveOptions,
    SchemaNode, SchemaType, DEFINITIONS_REF_PREFIX, WILDCARD,
};
