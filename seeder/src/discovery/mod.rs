//! Seed discovery: folders next to the model sources, and the files in them.

pub mod files;
pub mod folders;

pub use files::{
    is_regular_file, list_entries, logical_name, seed_files_in, select_seed_files, SeedFile,
    SEED_EXTENSION,
};
pub use folders::{resolve_folders, SEED_LOCATIONS};
