//! Slab-resident tree nodes.
//!
//! A node stores only its own name, never a full path: the full path is
//! reconstructed on demand by walking `parent` links (see
//! `DirectoryTree::path_of`). That is what makes a subtree move an O(1)
//! re-parent instead of an O(subtree size) path rewrite.

use chrono::{DateTime, Utc};
use thin_vec::ThinVec;

use crate::tree::arena::{NodeIndex, OptionNodeIndex};
use crate::tree::sorter::SortKind;
use crate::types::AssetType;

#[derive(Debug)]
pub enum Node {
    Directory(DirectoryNode),
    File(FileNode),
}

#[derive(Debug)]
pub struct DirectoryNode {
    pub name: &'static str,
    pub parent: OptionNodeIndex,
    pub directories: ThinVec<NodeIndex>,
    pub files: ThinVec<NodeIndex>,
    pub sort_kind: SortKind,
    pub last_write_time: DateTime<Utc>,
}

#[derive(Debug)]
pub struct FileNode {
    pub name: &'static str,
    pub parent: OptionNodeIndex,
    pub asset_type: AssetType,
    pub last_write_time: DateTime<Utc>,
}

impl Node {
    pub fn name(&self) -> &'static str {
        match self {
            Node::Directory(d) => d.name,
            Node::File(f) => f.name,
        }
    }

    pub fn parent(&self) -> OptionNodeIndex {
        match self {
            Node::Directory(d) => d.parent,
            Node::File(f) => f.parent,
        }
    }

    pub fn set_parent(&mut self, parent: OptionNodeIndex) {
        match self {
            Node::Directory(d) => d.parent = parent,
            Node::File(f) => f.parent = parent,
        }
    }

    pub fn set_name(&mut self, name: &'static str) {
        match self {
            Node::Directory(d) => d.name = name,
            Node::File(f) => f.name = name,
        }
    }

    pub fn last_write_time(&self) -> DateTime<Utc> {
        match self {
            Node::Directory(d) => d.last_write_time,
            Node::File(f) => f.last_write_time,
        }
    }

    pub fn touch(&mut self, when: DateTime<Utc>) {
        match self {
            Node::Directory(d) => d.last_write_time = when,
            Node::File(f) => f.last_write_time = when,
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, Node::Directory(_))
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Node::File(_))
    }

    pub fn as_directory(&self) -> Option<&DirectoryNode> {
        match self {
            Node::Directory(d) => Some(d),
            Node::File(_) => None,
        }
    }

    pub fn as_directory_mut(&mut self) -> Option<&mut DirectoryNode> {
        match self {
            Node::Directory(d) => Some(d),
            Node::File(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileNode> {
        match self {
            Node::File(f) => Some(f),
            Node::Directory(_) => None,
        }
    }
}

impl DirectoryNode {
    pub fn new(name: &'static str, parent: OptionNodeIndex, when: DateTime<Utc>) -> Self {
        Self {
            name,
            parent,
            directories: ThinVec::new(),
            files: ThinVec::new(),
            sort_kind: SortKind::default(),
            last_write_time: when,
        }
    }

    pub fn remove_child_directory(&mut self, index: NodeIndex) {
        self.directories.retain(|&i| i != index);
    }

    pub fn remove_child_file(&mut self, index: NodeIndex) {
        self.files.retain(|&i| i != index);
    }
}

impl FileNode {
    pub fn new(
        name: &'static str,
        parent: OptionNodeIndex,
        asset_type: AssetType,
        when: DateTime<Utc>,
    ) -> Self {
        Self { name, parent, asset_type, last_write_time: when }
    }
}
