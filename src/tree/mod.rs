//! The directory tree model: an ordered, path-indexed, arena-backed
//! representation of a watched subtree, with a listener multicast for
//! incremental mutations.

mod arena;
mod listener;
mod node;
mod sorter;
mod tree;

pub use arena::{NodeIndex, OptionNodeIndex};
pub use listener::{DirectoryTreeListener, ListenerId};
pub use node::{DirectoryNode, FileNode, Node};
pub use sorter::{SortKey, SortKind};
pub use tree::DirectoryTree;
