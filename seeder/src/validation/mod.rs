//! JSON Schema validation for model documents.
//!
//! A model document is checked against the embedded draft-7 schema
//! `schemas/csn-model.json` before it is deserialized, so that a malformed
//! catalog is reported with every offending path instead of the first serde
//! error.
//!
//! # Example
//!
//! ```rust,ignore
//! use serde_json::json;
//! use seedload::validation::validate_model_document;
//!
//! let document = json!({
//!     "$sources": ["db/schema.cds"],
//!     "definitions": { "Books": { "name": "Books" } }
//! });
//! assert!(validate_model_document(&document).is_ok());
//! ```

use serde_json::Value;

const MODEL_SCHEMA: &str = include_str!("../../schemas/csn-model.json");

/// Validate a JSON value against a JSON schema.
///
/// # Returns
/// * `Ok(())` if valid
/// * `Err(Vec<String>)` with every violation otherwise
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator = jsonschema::draft7::new(schema)
        .map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator
        .iter_errors(data)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate a model document against the embedded model schema.
pub fn validate_model_document(data: &Value) -> Result<(), Vec<String>> {
    let schema: Value = serde_json::from_str(MODEL_SCHEMA)
        .map_err(|e| vec![format!("Invalid embedded schema: {}", e)])?;
    validate(&schema, data)
}
