//! Core functionality: the document model, bulk frontmatter editing, and the filesystem backend

pub mod archive;
pub mod backend;
pub mod config;
pub mod document;
pub mod error;
pub mod file_tree;
pub mod frontmatter;
pub mod relative_path;
pub mod spreadsheet;
pub mod store;
