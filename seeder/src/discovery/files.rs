//! Seed file selection.
//!
//! A folder may hold both an untranslated `Books_texts.csv` and locale
//! variants named after the full file name (`Books_texts.csv_de`). When such
//! a variant exists the base file is left out.

use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};

/// Extension of seed files.
pub const SEED_EXTENSION: &str = ".csv";

/// Leading character that excludes a file from loading.
pub const EXCLUDE_MARKER: char = '-';

const TEXTS_BASE_SUFFIX: &str = "_texts.csv";

/// A selected seed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeedFile {
    pub path: PathBuf,
    pub name: String,
}

impl SeedFile {
    pub fn new(folder: &Path, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            path: folder.join(&name),
            name,
        }
    }

    /// Logical entity name: dashes become dots, the extension is dropped.
    pub fn logical_name(&self) -> String {
        logical_name(&self.name)
    }
}

/// `Books-authors.csv` → `Books.authors`
pub fn logical_name(file_name: &str) -> String {
    let dotted = file_name.replace('-', ".");
    match dotted.rfind('.') {
        Some(i) if i > 0 => dotted[..i].to_string(),
        _ => dotted,
    }
}

/// Filter directory entries down to the files to load, keeping their order.
pub fn select_seed_files<S: AsRef<str>>(entries: &[S]) -> Vec<String> {
    entries
        .iter()
        .map(AsRef::<str>::as_ref)
        .filter(|name| is_seed_file(name, entries))
        .map(str::to_string)
        .collect()
}

fn is_seed_file<S: AsRef<str>>(name: &str, siblings: &[S]) -> bool {
    if name.starts_with(EXCLUDE_MARKER) || !name.ends_with(SEED_EXTENSION) {
        return false;
    }
    if name.ends_with(TEXTS_BASE_SUFFIX) && has_locale_variant(name, siblings) {
        return false;
    }
    true
}

/// True if a sibling starts with the full base name followed by `_`
/// (`Books_texts.csv_de` for `Books_texts.csv`).
fn has_locale_variant<S: AsRef<str>>(name: &str, siblings: &[S]) -> bool {
    let prefix = format!("{}_", name);
    siblings
        .iter()
        .map(AsRef::<str>::as_ref)
        .any(|sibling| sibling.starts_with(&prefix))
}

/// Names of all entries in `folder`, sorted. Non-UTF-8 names are left out.
pub async fn list_entries(folder: &Path) -> io::Result<Vec<String>> {
    let mut dir = tokio::fs::read_dir(folder).await?;
    let mut names = Vec::new();

    while let Some(entry) = dir.next_entry().await? {
        if let Ok(name) = entry.file_name().into_string() {
            names.push(name);
        }
    }

    names.sort();
    Ok(names)
}

/// False for directories, dangling links and anything unreadable.
pub async fn is_regular_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}

/// Seed files of `folder`: selection runs over every entry, then entries
/// that are not regular files are dropped.
pub async fn seed_files_in(folder: &Path) -> io::Result<Vec<SeedFile>> {
    let entries = list_entries(folder).await?;
    let mut files = Vec::new();

    for name in select_seed_files(&entries) {
        let file = SeedFile::new(folder, name);
        if is_regular_file(&file.path).await {
            files.push(file);
        }
    }

    Ok(files)
}
