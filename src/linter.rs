//! Schema linting - static analysis of resource schema files.
//!
//! Validates schema files for:
//! - JSON syntax and shape errors
//! - Missing `typeName` / `properties`
//! - Broken or unsupported `$ref` references
//! - Category and identifier pointers that resolve to no property
//! - `patternProperties` keys the resolver cannot compile

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::document::SchemaDocument;
use crate::error::{LoadError, SchemaValidationError};
use crate::loader::load_document;
use crate::types::{definition_name, AdditionalProperties, PropertyCategory, ResolveOptions, SchemaNode};

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single diagnostic message from linting.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    pub file: PathBuf,
    /// JSON path to the issue (e.g., "/properties/Tags/items/$ref")
    pub path: String,
    pub message: String,
}

/// Result of linting a single file.
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub file: PathBuf,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

/// Status of a linted file, ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Ok,
    Warning,
    Error,
}

/// Aggregate result of linting a file or directory.
#[derive(Debug, Clone, Serialize)]
pub struct LintResult {
    pub path: PathBuf,
    pub files_checked: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub warnings: usize,
    pub results: Vec<FileResult>,
}

impl LintResult {
    /// True when no file produced an error. Warnings alone do not count.
    pub fn is_ok(&self) -> bool {
        self.errors == 0
    }
}

impl FileResult {
    fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    /// Whether this file fails the run; in strict mode warnings fail too.
    fn fails(&self, strict: bool) -> bool {
        match self.status {
            FileStatus::Ok => false,
            FileStatus::Warning => strict,
            FileStatus::Error => true,
        }
    }
}

/// Lint a schema file, or every `.json` file under a directory.
///
/// With `strict`, a file with only warnings counts as failed.
pub fn lint(path: &Path, strict: bool) -> LintResult {
    let results: Vec<FileResult> = collect_schema_files(path)
        .iter()
        .map(|file| lint_file(file, path))
        .collect();

    let failed = results.iter().filter(|r| r.fails(strict)).count();

    LintResult {
        path: path.to_path_buf(),
        files_checked: results.len(),
        passed: results.len() - failed,
        failed,
        errors: results.iter().map(|r| r.count(Severity::Error)).sum(),
        warnings: results.iter().map(|r| r.count(Severity::Warning)).sum(),
        results,
    }
}

/// Lint a single schema file.
pub fn lint_file(file: &Path, base_path: &Path) -> FileResult {
    let mut diagnostics = Vec::new();
    let display = display_path(file, base_path);

    let doc = match load_document(file) {
        Ok(doc) => doc,
        Err(e) => {
            let code = match e {
                LoadError::Invalid(SchemaValidationError::MissingField { .. }) => "E002",
                _ => "E001",
            };
            diagnostics.push(Diagnostic {
                severity: Severity::Error,
                code: code.to_string(),
                file: display.clone(),
                path: "/".to_string(),
                message: e.to_string(),
            });
            return FileResult {
                file: display,
                status: FileStatus::Error,
                diagnostics,
            };
        }
    };

    let mut checker = Checker {
        doc: &doc,
        file: &display,
        diagnostics: &mut diagnostics,
    };
    checker.check_nodes();
    checker.check_pointers();

    let status = diagnostics
        .iter()
        .map(|d| match d.severity {
            Severity::Error => FileStatus::Error,
            Severity::Warning => FileStatus::Warning,
        })
        .max()
        .unwrap_or(FileStatus::Ok);

    FileResult {
        file: display,
        status,
        diagnostics,
    }
}

/// Path reported for `file`: relative to `base_path`, or the file name when
/// the file itself was linted.
fn display_path(file: &Path, base_path: &Path) -> PathBuf {
    match file.strip_prefix(base_path) {
        Ok(rel) if rel.as_os_str().is_empty() => file
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| file.to_path_buf()),
        Ok(rel) => rel.to_path_buf(),
        Err(_) => file.to_path_buf(),
    }
}

struct Checker<'a> {
    doc: &'a SchemaDocument,
    file: &'a Path,
    diagnostics: &'a mut Vec<Diagnostic>,
}

impl Checker<'_> {
    fn push(&mut self, severity: Severity, code: &str, path: String, message: String) {
        self.diagnostics.push(Diagnostic {
            severity,
            code: code.to_string(),
            file: self.file.to_path_buf(),
            path,
            message,
        });
    }

    /// Walk every schema node in the document.
    fn check_nodes(&mut self) {
        let doc = self.doc;
        for (name, node) in doc.definitions() {
            self.check_node(node, &format!("/definitions/{}", name));
        }
        for (name, node) in doc.properties() {
            self.check_node(node, &format!("/properties/{}", name));
        }
        for (key, members) in [
            ("oneOf", doc.one_of()),
            ("anyOf", doc.any_of()),
            ("allOf", doc.all_of()),
        ] {
            for (i, member) in members.into_iter().flatten().enumerate() {
                self.check_node(member, &format!("/{}/{}", key, i));
            }
        }
    }

    fn check_node(&mut self, node: &SchemaNode, path: &str) {
        if let Some(reference) = &node.reference {
            self.check_ref(reference, &format!("{}/$ref", path));
        }

        for (name, child) in node.properties.iter().flatten() {
            self.check_node(child, &format!("{}/properties/{}", path, name));
        }
        if let Some(items) = &node.items {
            self.check_node(items, &format!("{}/items", path));
        }
        for (pattern, child) in node.pattern_properties.iter().flatten() {
            let child_path = format!("{}/patternProperties/{}", path, pattern);
            if let Err(e) = self.doc.pattern(pattern) {
                self.push(
                    Severity::Warning,
                    "W002",
                    child_path.clone(),
                    format!("pattern \"{}\" is not supported: {}", pattern, e),
                );
            }
            self.check_node(child, &child_path);
        }
        if let Some(AdditionalProperties::Schema(schema)) = &node.additional_properties {
            self.check_node(schema, &format!("{}/additionalProperties", path));
        }
        for (key, members) in [
            ("oneOf", &node.one_of),
            ("anyOf", &node.any_of),
            ("allOf", &node.all_of),
        ] {
            for (i, member) in members.iter().flatten().enumerate() {
                self.check_node(member, &format!("{}/{}/{}", path, key, i));
            }
        }
    }

    fn check_ref(&mut self, reference: &str, path: &str) {
        match definition_name(reference) {
            None => self.push(
                Severity::Error,
                "E004",
                path.to_string(),
                format!(
                    "unsupported $ref \"{}\": expected #/definitions/<name>",
                    reference
                ),
            ),
            Some(name) if self.doc.definition(name).is_none() => self.push(
                Severity::Error,
                "E003",
                path.to_string(),
                format!("definition not found: {}", name),
            ),
            Some(_) => {}
        }
    }

    /// Every declared category and identifier pointer must reach a property.
    fn check_pointers(&mut self) {
        let doc = self.doc;
        let mut declared: Vec<(String, &str)> = Vec::new();
        for category in PropertyCategory::ALL {
            for (i, pointer) in doc.category(category).iter().enumerate() {
                declared.push((format!("/{}/{}", category.schema_key(), i), pointer));
            }
        }
        for (i, pointer) in doc.primary_identifier().iter().enumerate() {
            declared.push((format!("/primaryIdentifier/{}", i), pointer.as_str()));
        }
        for (i, identifier) in doc.additional_identifiers().iter().enumerate() {
            for (j, pointer) in identifier.iter().enumerate() {
                declared.push((format!("/additionalIdentifiers/{}/{}", i, j), pointer.as_str()));
            }
        }

        let options = ResolveOptions::new();
        for (path, pointer) in declared {
            if doc.resolve_json_pointer_path(pointer, &options).is_empty() {
                self.push(
                    Severity::Warning,
                    "W001",
                    path,
                    format!("pointer \"{}\" does not resolve to a property", pointer),
                );
            }
        }
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == "json")
}

/// Schema files under `path`, sorted. A single non-JSON file yields nothing.
fn collect_schema_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        return if is_json(path) {
            vec![path.to_path_buf()]
        } else {
            Vec::new()
        };
    }

    let mut files = Vec::new();
    let mut pending = vec![path.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let entry_path = entry.path();
            if entry_path.is_dir() {
                pending.push(entry_path);
            } else if is_json(&entry_path) {
                files.push(entry_path);
            }
        }
    }
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    fn lint_str(content: &str) -> FileResult {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        lint_file(file.path(), file.path().parent().unwrap())
    }

    #[test]
    fn lint_valid_schema() {
        let result = lint_str(
            r##"{
            "typeName": "AWS::SQS::Queue",
            "definitions": { "Tag": { "type": "object" } },
            "properties": {
                "Arn": { "type": "string" },
                "Tags": { "type": "array", "items": { "$ref": "#/definitions/Tag" } }
            },
            "readOnlyProperties": ["/properties/Arn"],
            "primaryIdentifier": ["/properties/Arn"]
        }"##,
        );
        assert_eq!(result.status, FileStatus::Ok);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn lint_invalid_json_syntax() {
        let result = lint_str("{ not valid json }");
        assert_eq!(result.status, FileStatus::Error);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code, "E001");
    }

    #[test]
    fn lint_missing_type_name() {
        let result = lint_str(r#"{ "properties": {} }"#);
        assert_eq!(result.status, FileStatus::Error);
        assert_eq!(result.diagnostics[0].code, "E002");
    }

    #[test]
    fn lint_dangling_ref() {
        let result = lint_str(
            r##"{
            "typeName": "AWS::SQS::Queue",
            "properties": { "Policy": { "$ref": "#/definitions/Missing" } }
        }"##,
        );
        assert_eq!(result.status, FileStatus::Error);
        let diag = result.diagnostics.iter().find(|d| d.code == "E003").unwrap();
        assert_eq!(diag.path, "/properties/Policy/$ref");
    }

    #[test]
    fn lint_unsupported_ref_shape() {
        let result = lint_str(
            r##"{
            "typeName": "AWS::SQS::Queue",
            "properties": {
                "Policy": { "oneOf": [{ "$ref": "policy.json#/definitions/Policy" }] }
            }
        }"##,
        );
        let diag = result.diagnostics.iter().find(|d| d.code == "E004").unwrap();
        assert_eq!(diag.path, "/properties/Policy/oneOf/0/$ref");
    }

    #[test]
    fn lint_unresolvable_category_pointer() {
        let result = lint_str(
            r#"{
            "typeName": "AWS::SQS::Queue",
            "properties": { "Arn": { "type": "string" } },
            "createOnlyProperties": ["/properties/QueueName"]
        }"#,
        );
        assert_eq!(result.status, FileStatus::Warning);
        let diag = result.diagnostics.iter().find(|d| d.code == "W001").unwrap();
        assert_eq!(diag.path, "/createOnlyProperties/0");
    }

    #[test]
    fn lint_unsupported_pattern() {
        let result = lint_str(
            r#"{
            "typeName": "AWS::SQS::Queue",
            "properties": {
                "Labels": { "type": "object", "patternProperties": { "(?!aws:)": { "type": "string" } } }
            }
        }"#,
        );
        assert_eq!(result.status, FileStatus::Warning);
        assert!(result.diagnostics.iter().any(|d| d.code == "W002"));
    }

    #[test]
    fn lint_directory() {
        let dir = tempdir().unwrap();

        std::fs::write(
            dir.path().join("valid.json"),
            r#"{"typeName": "AWS::SQS::Queue", "properties": {}}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("invalid.json"), "{ not json }").unwrap();

        let result = lint(dir.path(), false);
        assert_eq!(result.files_checked, 2);
        assert_eq!(result.passed, 1);
        assert_eq!(result.failed, 1);
        assert!(!result.is_ok());
    }

    #[test]
    fn diagnostics_report_the_same_path_as_their_file() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("aws");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(
            nested.join("broken.json"),
            r##"{"typeName": "AWS::SQS::Queue", "properties": {"P": {"$ref": "#/definitions/Gone"}}}"##,
        )
        .unwrap();
        std::fs::write(nested.join("bad.json"), "{ not json }").unwrap();

        let result = lint(dir.path(), false);
        assert_eq!(result.files_checked, 2);
        for file in &result.results {
            assert!(file.file.is_relative());
            assert!(file.file.starts_with("aws"));
            for diag in &file.diagnostics {
                assert_eq!(diag.file, file.file);
            }
        }

        let single = lint(&nested.join("bad.json"), false);
        assert_eq!(single.results[0].file, PathBuf::from("bad.json"));
        assert_eq!(single.results[0].diagnostics[0].file, PathBuf::from("bad.json"));
    }

    #[test]
    fn lint_strict_mode() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("queue.json");
        // Warning only: pointer to a missing property
        std::fs::write(
            &file_path,
            r#"{"typeName": "AWS::SQS::Queue", "properties": {}, "readOnlyProperties": ["/properties/Arn"]}"#,
        )
        .unwrap();

        let result = lint(&file_path, false);
        assert_eq!(result.files_checked, 1);
        assert_eq!(result.passed, 1);
        assert_eq!(result.failed, 0);

        let result = lint(&file_path, true);
        assert_eq!(result.passed, 0);
        assert_eq!(result.failed, 1);
    }
}
