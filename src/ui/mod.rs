//! UI components for Frontmatter Studio

pub mod bulk_edit;
pub mod file_tree;
pub mod frontmatter;
pub mod sidebar;
pub mod status_bar;
