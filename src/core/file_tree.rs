//! Folder/file tree built from the relative paths of the loaded documents

use std::cmp::Ordering;

/// A node in the navigation tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeNode {
    /// A document; `path` is the full relative path it was built from
    File { name: String, path: String },
    /// A directory segment shared by one or more documents
    Folder { name: String, children: Vec<TreeNode> },
}

impl TreeNode {
    pub fn name(&self) -> &str {
        match self {
            Self::File { name, .. } | Self::Folder { name, .. } => name,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Self::File { .. })
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, Self::Folder { .. })
    }

    /// Children of a folder; files have none
    pub fn children(&self) -> &[TreeNode] {
        match self {
            Self::Folder { children, .. } => children,
            Self::File { .. } => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<TreeNode>> {
        match self {
            Self::Folder { children, .. } => Some(children),
            Self::File { .. } => None,
        }
    }

    /// Number of file nodes at or below this node
    pub fn file_count(&self) -> usize {
        match self {
            Self::File { .. } => 1,
            Self::Folder { children, .. } => children.iter().map(TreeNode::file_count).sum(),
        }
    }
}

/// Build an ordered tree from `/`-separated relative paths.
///
/// Paths sharing a prefix converge on the same folder nodes. Empty segments
/// are ignored. A path that is also the prefix of another yields a file and
/// a folder with the same name side by side.
pub fn build_file_tree<S: AsRef<str>>(paths: &[S]) -> Vec<TreeNode> {
    let mut root: Vec<TreeNode> = Vec::new();

    for path in paths {
        let path = path.as_ref();
        let parts: Vec<&str> = path.split('/').filter(|part| !part.is_empty()).collect();
        let Some((file_name, folders)) = parts.split_last() else {
            continue;
        };

        let mut level = &mut root;
        for folder in folders {
            level = folder_children(level, folder);
        }

        let exists = level
            .iter()
            .any(|node| node.is_file() && node.name() == *file_name);
        if !exists {
            level.push(TreeNode::File {
                name: file_name.to_string(),
                path: path.to_string(),
            });
        }
    }

    sort_tree(&mut root);
    root
}

/// Children of the folder named `name` in `level`, created if missing
fn folder_children<'a>(level: &'a mut Vec<TreeNode>, name: &str) -> &'a mut Vec<TreeNode> {
    let idx = match level
        .iter()
        .position(|node| node.is_folder() && node.name() == name)
    {
        Some(idx) => idx,
        None => {
            level.push(TreeNode::Folder {
                name: name.to_string(),
                children: Vec::new(),
            });
            level.len() - 1
        }
    };
    match &mut level[idx] {
        TreeNode::Folder { children, .. } => children,
        TreeNode::File { .. } => unreachable!("index always points at a folder"),
    }
}

/// Sort every sibling list: files first, then folders, each by name
pub fn sort_tree(nodes: &mut [TreeNode]) {
    nodes.sort_by(compare_nodes);
    for node in nodes.iter_mut() {
        if let Some(children) = node.children_mut() {
            sort_tree(children);
        }
    }
}

fn compare_nodes(a: &TreeNode, b: &TreeNode) -> Ordering {
    match (a.is_file(), b.is_file()) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => locale_cmp(a.name(), b.name()),
    }
}

/// Case-insensitive name order; on a tie, lowercase sorts first
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
        .then_with(|| b.cmp(a))
}
