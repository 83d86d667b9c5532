//! Schema loading from files and strings.

use std::path::Path;

use crate::document::SchemaDocument;
use crate::error::LoadError;

/// Load a resource schema from a file path.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` if the file doesn't exist,
/// `LoadError::ReadError` if it can't be read, or `LoadError::Invalid` if
/// its content is not a valid resource schema.
pub fn load_document(path: &Path) -> Result<SchemaDocument, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| LoadError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    load_document_str(&content)
}

/// Load a resource schema from a JSON string.
///
/// # Errors
///
/// Returns `LoadError::Invalid` if the string isn't a valid resource schema.
pub fn load_document_str(content: &str) -> Result<SchemaDocument, LoadError> {
    Ok(SchemaDocument::parse(content)?)
}

/// File name CloudFormation uses for a type's published schema.
///
/// `AWS::S3::Bucket` becomes `aws-s3-bucket.json`.
pub fn schema_file_name(type_name: &str) -> String {
    format!("{}.json", type_name.to_lowercase().replace("::", "-"))
}
