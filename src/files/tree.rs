use crate::security::{Extensions, Sandbox};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TreeNode {
    Dir { name: String, children: Vec<TreeNode> },
    File { name: String, path: String },
}

pub fn build_tree(sandbox: &Sandbox, allowed: &Extensions) -> io::Result<Vec<TreeNode>> {
    walk(sandbox, sandbox.root(), allowed)
}

/// An empty result means the directory has nothing worth showing.
fn walk(sandbox: &Sandbox, dir: &Path, allowed: &Extensions) -> io::Result<Vec<TreeNode>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        let file_type = entry.file_type()?;
        let is_dir = if file_type.is_symlink() {
            // linked directories are not descended into
            match fs::metadata(entry.path()) {
                Ok(meta) if meta.is_file() => false,
                _ => continue,
            }
        } else {
            file_type.is_dir()
        };
        entries.push((is_dir, name, entry.path()));
    }
    entries.sort_by_cached_key(|(is_dir, name, _)| (!is_dir, name.to_lowercase()));

    let mut nodes = Vec::new();
    for (is_dir, name, path) in entries {
        if is_dir {
            let children = walk(sandbox, &path, allowed)?;
            if !children.is_empty() {
                nodes.push(TreeNode::Dir { name, children });
            }
        } else if allowed.matches(&path) {
            let Some(rel) = sandbox.relative(&path) else { continue };
            nodes.push(TreeNode::File { name, path: rel });
        }
    }
    Ok(nodes)
}
