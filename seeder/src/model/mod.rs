//! Data model consumed by the loader.
//!
//! The model is owned by the caller and only ever read here:
//!
//! - [`Model`] - Read-only lookup capability (sources + name → definition)
//! - [`EntityDef`] - Table or view definition in CSN shape
//! - [`JsonModel`] - In-memory catalog, built in code or read from a CSN JSON document

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{ModelError, ModelResult};
use crate::validation::validate_model_document;

/// Name of the element that links an entity to its localization table.
pub const TEXTS_ELEMENT: &str = "texts";

/// Read-only view of a data model.
pub trait Model {
    /// Source locations the model was compiled from.
    fn sources(&self) -> &[String];

    /// Look up a definition by its logical name.
    fn definition(&self, name: &str) -> Option<&EntityDef>;
}

// =============================================================================
// Definitions
// =============================================================================

/// A modeled table or view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityDef {
    /// Canonical dot-separated identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub elements: BTreeMap<String, Element>,

    /// Present when the entity is a view.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<Query>,

    /// The entity must never be written to.
    #[serde(rename = "@cds.persistence.skip", default)]
    pub persistence_skip: bool,
}

/// A field of an entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Target entity of an association or composition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

/// View query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    #[serde(rename = "SELECT", default, skip_serializing_if = "Option::is_none")]
    pub select: Option<Select>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Select {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<FromClause>,

    /// Explicit column projection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FromClause {
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<Vec<Value>>,
}

impl EntityDef {
    /// Create a named table definition.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Declare a `texts` element pointing at a localization entity.
    pub fn with_texts(mut self, target: impl Into<String>) -> Self {
        self.elements.insert(
            TEXTS_ELEMENT.to_string(),
            Element {
                target: Some(target.into()),
            },
        );
        self
    }

    /// Turn the definition into a `SELECT * FROM <source>` view.
    pub fn with_view_of(mut self, source: impl Into<String>) -> Self {
        self.query = Some(Query {
            select: Some(Select {
                from: Some(FromClause {
                    reference: Some(vec![Value::String(source.into())]),
                }),
                columns: None,
            }),
        });
        self
    }

    pub fn with_persistence_skip(mut self, skip: bool) -> Self {
        self.persistence_skip = skip;
        self
    }

    /// Target of the `texts` element, if declared.
    pub fn texts_target(&self) -> Option<&str> {
        self.elements
            .get(TEXTS_ELEMENT)
            .and_then(|e| e.target.as_deref())
    }

    pub fn is_view(&self) -> bool {
        self.query.is_some()
    }

    /// Source of a pass-through view: no projection and exactly one `from` reference.
    pub fn simple_view_source(&self) -> Option<&str> {
        let select = self.query.as_ref()?.select.as_ref()?;
        if select.columns.is_some() {
            return None;
        }
        match select.from.as_ref()?.reference.as_deref()? {
            [single] => single.as_str(),
            _ => None,
        }
    }
}

// =============================================================================
// JSON Model
// =============================================================================

/// In-memory catalog in CSN document shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JsonModel {
    #[serde(rename = "$sources", default)]
    pub sources: Vec<String>,

    #[serde(default)]
    pub definitions: BTreeMap<String, EntityDef>,
}

impl JsonModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.sources.push(source.into());
        self
    }

    pub fn with_entity(mut self, name: impl Into<String>, def: EntityDef) -> Self {
        self.definitions.insert(name.into(), def);
        self
    }

    /// Parse and validate a CSN JSON document.
    pub fn parse(content: &str) -> ModelResult<Self> {
        let document: Value = serde_json::from_str(content)?;
        validate_model_document(&document).map_err(ModelError::Invalid)?;
        Ok(serde_json::from_value(document)?)
    }

    /// Read a model document; relative `$sources` are taken relative to its directory.
    pub fn from_file<P: AsRef<Path>>(path: P) -> ModelResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let mut model = Self::parse(&content)?;

        if let Some(dir) = path.parent() {
            for source in &mut model.sources {
                if Path::new(source.as_str()).is_relative() {
                    *source = dir.join(source.as_str()).to_string_lossy().into_owned();
                }
            }
        }

        Ok(model)
    }
}

impl Model for JsonModel {
    fn sources(&self) -> &[String] {
        &self.sources
    }

    fn definition(&self, name: &str) -> Option<&EntityDef> {
        self.definitions.get(name)
    }
}
