//! Entity resolution: logical file name → writable definition.
//!
//! A name is looked up directly first. Localized seed files are named after
//! their base entity (`Books_texts`, `Books_texts_de`) while the model only
//! declares a `texts` element on `Books`, so a miss on such a name is
//! redirected to that element's target.
//!
//! ```text
//!   Books_texts_de ──miss──▶ Books ──texts.target──▶ Books.texts ──hit──▶ Found
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::model::{EntityDef, Model};

/// Lookups allowed per name; a texts redirect needs two.
pub const MAX_RESOLUTION_STEPS: usize = 3;

/// `<Base>_texts` or `<Base>_texts_<locale>`
static TEXTS_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<base>.+)_texts(?:_.+)?$").expect("valid texts pattern")
});

/// Shape of a resolved definition with respect to writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ViewShape {
    /// Plain entity.
    Table,
    /// View without projection over a single source.
    PassThrough { source: String, source_known: bool },
    /// Any other view.
    Projection,
}

impl ViewShape {
    fn of<M: Model + ?Sized>(model: &M, def: &EntityDef) -> Self {
        if !def.is_view() {
            return ViewShape::Table;
        }
        match def.simple_view_source() {
            Some(source) => ViewShape::PassThrough {
                source: source.to_string(),
                source_known: model.definition(source).is_some(),
            },
            None => ViewShape::Projection,
        }
    }
}

/// A definition the loader may write to.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEntity<'m> {
    /// Canonical name, or the name it was found under when the definition has none.
    pub name: String,
    /// Logical name derived from the file.
    pub derived_from: String,
    pub definition: &'m EntityDef,
    pub view: ViewShape,
    /// Found through a texts redirect.
    pub redirected: bool,
}

impl ResolvedEntity<'_> {
    /// Database table name: `my.bookshop.Books` → `my_bookshop_Books`.
    pub fn table_name(&self) -> String {
        self.name.replace('.', "_")
    }

    pub fn persistence_skip(&self) -> bool {
        self.definition.persistence_skip
    }

    /// A pass-through view whose source is not part of the model.
    pub fn has_unknown_view_source(&self) -> bool {
        matches!(self.view, ViewShape::PassThrough { source_known: false, .. })
    }
}

/// Outcome of one lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<'m> {
    Found { name: String, definition: &'m EntityDef, view: ViewShape },
    RedirectTo(String),
    NotFound,
}

/// Perform a single lookup of `name`.
pub fn resolve_step<'m, M: Model + ?Sized>(model: &'m M, name: &str) -> Resolution<'m> {
    if let Some(definition) = model.definition(name) {
        return Resolution::Found {
            name: definition.name.clone().unwrap_or_else(|| name.to_string()),
            definition,
            view: ViewShape::of(model, definition),
        };
    }

    let Some(captures) = TEXTS_NAME.captures(name) else {
        return Resolution::NotFound;
    };
    match model
        .definition(&captures["base"])
        .and_then(EntityDef::texts_target)
    {
        Some(target) => Resolution::RedirectTo(target.to_string()),
        None => Resolution::NotFound,
    }
}

/// Resolve a logical name, following texts redirects.
///
/// `None` means the file has no matching table; it is not an error.
pub fn resolve_entity<'m, M: Model + ?Sized>(
    model: &'m M,
    derived_name: &str,
) -> Option<ResolvedEntity<'m>> {
    let mut current = derived_name.to_string();

    for step in 0..MAX_RESOLUTION_STEPS {
        match resolve_step(model, &current) {
            Resolution::Found { name, definition, view } => {
                return Some(ResolvedEntity {
                    name,
                    derived_from: derived_name.to_string(),
                    definition,
                    view,
                    redirected: step > 0,
                });
            }
            Resolution::RedirectTo(target) => current = target,
            Resolution::NotFound => return None,
        }
    }

    None
}
