//! The ordered, path-indexed directory tree.
//!
//! Nodes live in a slab (`Vec<Option<Node>>`); parent/child links are
//! `NodeIndex`es into that slab, never `Rc`/`RefCell`. A `FnvHashMap`
//! keyed by absolute path gives O(1) directory lookup without walking
//! from the root; it only indexes directories, matching the original's
//! `unordered_map<path, shared_ptr<Directory>>`.
//!
//! Every mutation method takes `&mut self` and listener callbacks only
//! ever receive `&Path` arguments, never a handle back into the tree:
//! the borrow checker rules out a listener re-entering a mutation while
//! one is already in progress, so no runtime re-entrancy guard is
//! needed (see SPEC_FULL.md's resolution of the "global mutable state"
//! design note).

use std::path::{Path, PathBuf};

use chrono::Utc;
use fnv::FnvHashMap;

use crate::config::WatchConfig;
use crate::error::{Result, WatchError};
use crate::tree::arena::{NodeIndex, OptionNodeIndex};
use crate::tree::listener::{DirectoryTreeListener, ListenerId};
use crate::tree::node::{DirectoryNode, FileNode, Node};
use crate::tree::sorter::{SortKey, SortKind};

pub struct DirectoryTree {
    nodes: Vec<Option<Node>>,
    free_list: Vec<usize>,
    root: OptionNodeIndex,
    root_path: Option<PathBuf>,
    /// Directories only, keyed by absolute path.
    path_index: FnvHashMap<PathBuf, NodeIndex>,
    listeners: Vec<(u64, Box<dyn DirectoryTreeListener>)>,
    next_listener_id: u64,
    config: WatchConfig,
}

impl DirectoryTree {
    pub fn new(config: WatchConfig) -> Self {
        Self {
            nodes: Vec::new(),
            free_list: Vec::new(),
            root: OptionNodeIndex::none(),
            root_path: None,
            path_index: FnvHashMap::default(),
            listeners: Vec::new(),
            next_listener_id: 1,
            config,
        }
    }

    // ---- slab plumbing ----

    fn node(&self, index: NodeIndex) -> &Node {
        self.nodes[index.get()].as_ref().expect("dangling NodeIndex")
    }

    fn node_mut(&mut self, index: NodeIndex) -> &mut Node {
        self.nodes[index.get()].as_mut().expect("dangling NodeIndex")
    }

    fn alloc(&mut self, node: Node) -> NodeIndex {
        if let Some(slot) = self.free_list.pop() {
            self.nodes[slot] = Some(node);
            NodeIndex::new(slot)
        } else {
            self.nodes.push(Some(node));
            NodeIndex::new(self.nodes.len() - 1)
        }
    }

    fn free(&mut self, index: NodeIndex) {
        self.nodes[index.get()] = None;
        self.free_list.push(index.get());
    }

    /// Reconstructs the absolute path of a node by walking its parent
    /// chain. O(depth), never cached on the node itself.
    pub fn path_of(&self, index: NodeIndex) -> PathBuf {
        if self.root.to_option() == Some(index) {
            return self.root_path.clone().unwrap_or_default();
        }
        let mut names = Vec::new();
        let mut current = index;
        loop {
            names.push(self.node(current).name());
            match self.node(current).parent().to_option() {
                Some(parent) if self.root.to_option() != Some(parent) => current = parent,
                _ => break,
            }
        }
        names.reverse();
        let mut path = self.root_path.clone().unwrap_or_default();
        for name in names {
            path.push(name);
        }
        path
    }

    fn find_child_directory(&self, parent: NodeIndex, name: &str) -> Option<NodeIndex> {
        let dir = self.node(parent).as_directory()?;
        dir.directories.iter().copied().find(|&idx| self.node(idx).name() == name)
    }

    fn find_child_file(&self, parent: NodeIndex, name: &str) -> Option<NodeIndex> {
        let dir = self.node(parent).as_directory()?;
        dir.files.iter().copied().find(|&idx| self.node(idx).name() == name)
    }

    fn insert_child_directory_sorted(&mut self, parent: NodeIndex, child: NodeIndex) {
        let sort_kind = self
            .node(parent)
            .as_directory()
            .map(|d| d.sort_kind)
            .unwrap_or_default();
        let new_key = SortKey { name: self.node(child).name(), last_write_time: self.node(child).last_write_time() };
        let dir = self.node(parent).as_directory().expect("parent is a directory");
        let siblings: Vec<NodeIndex> = dir.directories.to_vec();
        let key_of = |idx: &NodeIndex| {
            let node = self.node(*idx);
            SortKey { name: node.name(), last_write_time: node.last_write_time() }
        };
        let position = sort_kind.insertion_index(&siblings, new_key, key_of);
        let dir = self.node_mut(parent).as_directory_mut().expect("parent is a directory");
        dir.directories.insert(position, child);
    }

    fn insert_child_file_sorted(&mut self, parent: NodeIndex, child: NodeIndex) {
        let sort_kind = self
            .node(parent)
            .as_directory()
            .map(|d| d.sort_kind)
            .unwrap_or_default();
        let new_key = SortKey { name: self.node(child).name(), last_write_time: self.node(child).last_write_time() };
        let dir = self.node(parent).as_directory().expect("parent is a directory");
        let siblings: Vec<NodeIndex> = dir.files.to_vec();
        let key_of = |idx: &NodeIndex| {
            let node = self.node(*idx);
            SortKey { name: node.name(), last_write_time: node.last_write_time() }
        };
        let position = sort_kind.insertion_index(&siblings, new_key, key_of);
        let dir = self.node_mut(parent).as_directory_mut().expect("parent is a directory");
        dir.files.insert(position, child);
    }

    // ---- construction ----

    /// Walks `root_path` on disk and builds the initial tree. Resets any
    /// previously built tree first.
    pub fn build_root_tree(&mut self, root_path: &Path) -> Result<()> {
        self.clear_tree();

        let metadata = std::fs::symlink_metadata(root_path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                WatchError::PathNotFound(root_path.to_path_buf())
            } else if err.kind() == std::io::ErrorKind::PermissionDenied {
                WatchError::AccessDenied(root_path.to_path_buf())
            } else {
                WatchError::Io(err)
            }
        })?;
        if !metadata.is_dir() {
            return Err(WatchError::TreeContractViolation(format!(
                "{} is not a directory",
                root_path.display()
            )));
        }

        let name = self.intern_name(root_path.file_name().and_then(|n| n.to_str()).unwrap_or("/"));
        let when = metadata.modified().map(chrono::DateTime::<Utc>::from).unwrap_or_else(Utc::now);
        let root_index = self.alloc(Node::Directory(DirectoryNode::new(name, OptionNodeIndex::none(), when)));
        self.root = OptionNodeIndex::some(root_index);
        self.root_path = Some(root_path.to_path_buf());
        self.path_index.insert(root_path.to_path_buf(), root_index);

        self.build_subtree(root_index, root_path)?;
        self.notify_directory_added(root_path);
        Ok(())
    }

    /// Builds the on-disk subtree under `parent_index`, emitting
    /// `on_file_added`/`on_directory_added` post-order: a directory's
    /// children are notified before the directory itself (the root is
    /// notified separately, by `build_root_tree`, after this returns).
    fn build_subtree(&mut self, parent_index: NodeIndex, parent_path: &Path) -> Result<()> {
        let entries = std::fs::read_dir(parent_path).map_err(WatchError::Io)?;
        for entry in entries {
            let entry = entry.map_err(WatchError::Io)?;
            let path = entry.path();
            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(_) => continue,
            };
            let when = metadata.modified().map(chrono::DateTime::<Utc>::from).unwrap_or_else(Utc::now);
            let file_name = entry.file_name().to_string_lossy().into_owned();
            let name = self.intern_name(&file_name);

            if metadata.is_dir() {
                let child = self.alloc(Node::Directory(DirectoryNode::new(
                    name,
                    OptionNodeIndex::some(parent_index),
                    when,
                )));
                self.insert_child_directory_sorted(parent_index, child);
                self.path_index.insert(path.clone(), child);
                self.build_subtree(child, &path)?;
                self.notify_directory_added(&path);
            } else if metadata.is_file() {
                let asset_type = self.config.extensions.classify(&file_name);
                let child = self.alloc(Node::File(FileNode::new(
                    name,
                    OptionNodeIndex::some(parent_index),
                    asset_type,
                    when,
                )));
                self.insert_child_file_sorted(parent_index, child);
                self.notify_file_added(&path);
            }
        }
        Ok(())
    }

    fn intern_name(&self, name: &str) -> &'static str {
        crate::namepool::NAME_POOL.intern(name)
    }

    /// Discards the entire tree and path index without firing any
    /// listener notifications (see SPEC_FULL.md Open Question 1).
    pub fn clear_tree(&mut self) {
        self.nodes.clear();
        self.free_list.clear();
        self.root = OptionNodeIndex::none();
        self.root_path = None;
        self.path_index.clear();
    }

    // ---- queries ----

    pub fn get_directory(&self, path: &Path) -> Option<NodeIndex> {
        self.path_index.get(path).copied()
    }

    pub fn get_root_directory(&self) -> Option<NodeIndex> {
        self.root.to_option()
    }

    pub fn root_path(&self) -> Option<&Path> {
        self.root_path.as_deref()
    }

    /// Pre-order traversal of the whole tree, visiting each entry's
    /// reconstructed path alongside its node.
    pub fn process_directory_tree(&self, mut visit: impl FnMut(&Path, &Node)) {
        if let Some(root) = self.root.to_option() {
            self.visit_subtree(root, &mut visit);
        }
    }

    fn visit_subtree(&self, index: NodeIndex, visit: &mut impl FnMut(&Path, &Node)) {
        let path = self.path_of(index);
        visit(&path, self.node(index));
        if let Some(dir) = self.node(index).as_directory() {
            let directories = dir.directories.clone();
            let files = dir.files.clone();
            for child in directories {
                self.visit_subtree(child, visit);
            }
            for child in files {
                let child_path = self.path_of(child);
                visit(&child_path, self.node(child));
            }
        }
    }

    // ---- mutation ----

    pub fn add_new_directory(&mut self, parent_path: &Path, name: &str) -> Result<()> {
        let parent = self
            .get_directory(parent_path)
            .ok_or_else(|| WatchError::PathNotFound(parent_path.to_path_buf()))?;
        if self.find_child_directory(parent, name).is_some() {
            // Redundant ADDED for an existing name is a no-op (idempotence).
            return Ok(());
        }
        let interned = self.intern_name(name);
        let child = self.alloc(Node::Directory(DirectoryNode::new(
            interned,
            OptionNodeIndex::some(parent),
            Utc::now(),
        )));
        self.insert_child_directory_sorted(parent, child);
        let child_path = parent_path.join(name);
        self.path_index.insert(child_path.clone(), child);
        self.notify_directory_added(&child_path);
        Ok(())
    }

    pub fn add_new_file(&mut self, parent_path: &Path, name: &str) -> Result<()> {
        let parent = self
            .get_directory(parent_path)
            .ok_or_else(|| WatchError::PathNotFound(parent_path.to_path_buf()))?;
        if self.find_child_file(parent, name).is_some() {
            return Ok(());
        }
        let asset_type = self.config.extensions.classify(name);
        let interned = self.intern_name(name);
        let child = self.alloc(Node::File(FileNode::new(
            interned,
            OptionNodeIndex::some(parent),
            asset_type,
            Utc::now(),
        )));
        self.insert_child_file_sorted(parent, child);
        let child_path = parent_path.join(name);
        self.notify_file_added(&child_path);
        Ok(())
    }

    pub fn remove_file(&mut self, path: &Path) -> Result<()> {
        let Some(parent_path) = path.parent() else { return Ok(()) };
        let Some(parent) = self.get_directory(parent_path) else { return Ok(()) };
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        // REMOVED for a name that is no longer present is a no-op (idempotence).
        let Some(index) = self.find_child_file(parent, name) else { return Ok(()) };

        if let Some(dir) = self.node_mut(parent).as_directory_mut() {
            dir.remove_child_file(index);
        }
        self.free(index);
        self.notify_file_removed(path);
        Ok(())
    }

    pub fn remove_directory(&mut self, path: &Path) -> Result<()> {
        // REMOVED for a directory that is no longer present is a no-op.
        let Some(index) = self.get_directory(path) else { return Ok(()) };

        if let Some(parent) = self.node(index).parent().to_option() {
            if let Some(dir) = self.node_mut(parent).as_directory_mut() {
                dir.remove_child_directory(index);
            }
        }
        self.free_subtree(index);
        self.notify_directory_removed(path);
        Ok(())
    }

    fn free_subtree(&mut self, index: NodeIndex) {
        let (directories, files, path) = match self.node(index).as_directory() {
            Some(dir) => (dir.directories.to_vec(), dir.files.to_vec(), self.path_of(index)),
            None => (Vec::new(), Vec::new(), PathBuf::new()),
        };
        for child in directories {
            self.free_subtree(child);
        }
        for child in files {
            self.free(child);
        }
        self.path_index.remove(&path);
        self.free(index);
    }

    pub fn move_file(&mut self, old_path: &Path, new_path: &Path) -> Result<()> {
        let old_parent_path = old_path.parent().ok_or_else(|| WatchError::PathNotFound(old_path.to_path_buf()))?;
        let new_parent_path = new_path.parent().ok_or_else(|| WatchError::PathNotFound(new_path.to_path_buf()))?;
        let old_parent = self
            .get_directory(old_parent_path)
            .ok_or_else(|| WatchError::PathNotFound(old_path.to_path_buf()))?;
        let new_parent = self
            .get_directory(new_parent_path)
            .ok_or_else(|| WatchError::PathNotFound(new_path.to_path_buf()))?;
        let old_name = old_path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        let new_name = new_path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        let index = self
            .find_child_file(old_parent, old_name)
            .ok_or_else(|| WatchError::PathNotFound(old_path.to_path_buf()))?;

        if let Some(dir) = self.node_mut(old_parent).as_directory_mut() {
            dir.remove_child_file(index);
        }
        let interned = self.intern_name(new_name);
        self.node_mut(index).set_name(interned);
        self.node_mut(index).set_parent(OptionNodeIndex::some(new_parent));
        self.insert_child_file_sorted(new_parent, index);

        self.notify_file_path_changed(old_path, new_path);
        Ok(())
    }

    pub fn move_directory(&mut self, old_path: &Path, new_path: &Path) -> Result<()> {
        let index = self.get_directory(old_path).ok_or_else(|| WatchError::PathNotFound(old_path.to_path_buf()))?;
        let new_parent_path = new_path.parent().ok_or_else(|| WatchError::PathNotFound(new_path.to_path_buf()))?;
        let new_parent = self
            .get_directory(new_parent_path)
            .ok_or_else(|| WatchError::PathNotFound(new_path.to_path_buf()))?;
        let new_name = new_path.file_name().and_then(|n| n.to_str()).unwrap_or_default();

        // Collect the subtree's directories (including itself) before
        // reparenting, so their stale path-index entries can be dropped.
        let subtree = self.collect_subtree_directories(index);
        let old_paths: Vec<PathBuf> = subtree.iter().map(|&idx| self.path_of(idx)).collect();
        for old in &old_paths {
            self.path_index.remove(old);
        }

        if let Some(old_parent) = self.node(index).parent().to_option() {
            if let Some(dir) = self.node_mut(old_parent).as_directory_mut() {
                dir.remove_child_directory(index);
            }
        }
        let interned = self.intern_name(new_name);
        self.node_mut(index).set_name(interned);
        self.node_mut(index).set_parent(OptionNodeIndex::some(new_parent));
        self.insert_child_directory_sorted(new_parent, index);

        for &idx in &subtree {
            let new_entry_path = self.path_of(idx);
            self.path_index.insert(new_entry_path, idx);
        }

        self.notify_directory_path_changed(old_path, new_path);
        Ok(())
    }

    fn collect_subtree_directories(&self, index: NodeIndex) -> Vec<NodeIndex> {
        let mut out = vec![index];
        if let Some(dir) = self.node(index).as_directory() {
            for &child in dir.directories.iter() {
                out.extend(self.collect_subtree_directories(child));
            }
        }
        out
    }

    pub fn rename_file(&mut self, old_path: &Path, new_name: &str) -> Result<()> {
        let new_path = old_path.parent().unwrap_or_else(|| Path::new("")).join(new_name);
        self.move_file(old_path, &new_path)
    }

    pub fn rename_directory(&mut self, old_path: &Path, new_name: &str) -> Result<()> {
        let new_path = old_path.parent().unwrap_or_else(|| Path::new("")).join(new_name);
        self.move_directory(old_path, &new_path)
    }

    /// Records a MODIFIED event against an existing file or directory,
    /// updating its last-write-time and notifying listeners.
    pub fn mark_modified(&mut self, path: &Path) -> Result<()> {
        if let Some(index) = self.get_directory(path) {
            self.node_mut(index).touch(Utc::now());
            for (_, listener) in self.listeners.iter_mut() {
                listener.on_directory_modified(path);
            }
            return Ok(());
        }

        let parent_path = path.parent().ok_or_else(|| WatchError::PathNotFound(path.to_path_buf()))?;
        let parent = self
            .get_directory(parent_path)
            .ok_or_else(|| WatchError::PathNotFound(path.to_path_buf()))?;
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        let index = self
            .find_child_file(parent, name)
            .ok_or_else(|| WatchError::PathNotFound(path.to_path_buf()))?;
        self.node_mut(index).touch(Utc::now());
        for (_, listener) in self.listeners.iter_mut() {
            listener.on_file_modified(path);
        }
        Ok(())
    }

    pub fn set_sort_kind(&mut self, directory_path: &Path, sort_kind: SortKind) -> Result<()> {
        let index = self
            .get_directory(directory_path)
            .ok_or_else(|| WatchError::PathNotFound(directory_path.to_path_buf()))?;
        let dir = self
            .node_mut(index)
            .as_directory_mut()
            .ok_or_else(|| WatchError::TreeContractViolation("not a directory".into()))?;
        dir.sort_kind = sort_kind;
        Ok(())
    }

    // ---- listeners ----

    pub fn add_listener(&mut self, listener: Box<dyn DirectoryTreeListener>) -> ListenerId {
        let id = self.next_listener_id;
        self.next_listener_id += 1;
        self.listeners.push((id, listener));
        ListenerId(id)
    }

    pub fn remove_listener(&mut self, id: ListenerId) {
        self.listeners.retain(|(existing, _)| *existing != id.0);
    }

    fn notify_directory_added(&mut self, path: &Path) {
        for (_, listener) in self.listeners.iter_mut() {
            listener.on_directory_added(path);
        }
    }

    fn notify_directory_removed(&mut self, path: &Path) {
        for (_, listener) in self.listeners.iter_mut() {
            listener.on_directory_removed(path);
        }
    }

    fn notify_file_added(&mut self, path: &Path) {
        for (_, listener) in self.listeners.iter_mut() {
            listener.on_file_added(path);
        }
    }

    fn notify_file_removed(&mut self, path: &Path) {
        for (_, listener) in self.listeners.iter_mut() {
            listener.on_file_removed(path);
        }
    }

    fn notify_file_path_changed(&mut self, old_path: &Path, new_path: &Path) {
        for (_, listener) in self.listeners.iter_mut() {
            listener.on_file_path_changed(old_path, new_path);
        }
    }

    fn notify_directory_path_changed(&mut self, old_path: &Path, new_path: &Path) {
        for (_, listener) in self.listeners.iter_mut() {
            listener.on_directory_path_changed(old_path, new_path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;

    #[derive(Default)]
    struct Recorder {
        directory_added: Vec<PathBuf>,
        directory_removed: Vec<PathBuf>,
        file_added: Vec<PathBuf>,
        file_removed: Vec<PathBuf>,
        file_path_changed: Vec<(PathBuf, PathBuf)>,
        directory_path_changed: Vec<(PathBuf, PathBuf)>,
    }

    struct SharedRecorder(Arc<Mutex<Recorder>>);

    impl DirectoryTreeListener for SharedRecorder {
        fn on_directory_added(&mut self, path: &Path) {
            self.0.lock().unwrap().directory_added.push(path.to_path_buf());
        }
        fn on_directory_removed(&mut self, path: &Path) {
            self.0.lock().unwrap().directory_removed.push(path.to_path_buf());
        }
        fn on_file_added(&mut self, path: &Path) {
            self.0.lock().unwrap().file_added.push(path.to_path_buf());
        }
        fn on_file_removed(&mut self, path: &Path) {
            self.0.lock().unwrap().file_removed.push(path.to_path_buf());
        }
        fn on_file_path_changed(&mut self, old_path: &Path, new_path: &Path) {
            self.0.lock().unwrap().file_path_changed.push((old_path.to_path_buf(), new_path.to_path_buf()));
        }
        fn on_directory_path_changed(&mut self, old_path: &Path, new_path: &Path) {
            self.0.lock().unwrap().directory_path_changed.push((old_path.to_path_buf(), new_path.to_path_buf()));
        }
    }

    fn build_empty_tree(root: &Path) -> DirectoryTree {
        let mut tree = DirectoryTree::new(WatchConfig::default());
        tree.build_root_tree(root).unwrap();
        tree
    }

    #[test]
    fn build_root_tree_indexes_nested_directories() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("assets")).unwrap();
        std::fs::write(dir.path().join("assets/tex.png"), b"x").unwrap();

        let tree = build_empty_tree(dir.path());
        assert!(tree.get_directory(&dir.path().join("assets")).is_some());
    }

    #[test]
    fn add_new_file_fires_listener_and_is_sorted() {
        let dir = tempdir().unwrap();
        let mut tree = build_empty_tree(dir.path());
        let recorder = Arc::new(Mutex::new(Recorder::default()));
        tree.add_listener(Box::new(SharedRecorder(recorder.clone())));

        tree.add_new_file(dir.path(), "b.txt").unwrap();
        tree.add_new_file(dir.path(), "a.txt").unwrap();

        let root = tree.get_root_directory().unwrap();
        let names: Vec<&str> = tree.node(root).as_directory().unwrap().files.iter().map(|&i| tree.node(i).name()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
        assert_eq!(recorder.lock().unwrap().file_added.len(), 2);
    }

    #[test]
    fn remove_directory_cascades_and_clears_path_index() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/child.txt"), b"x").unwrap();
        let mut tree = build_empty_tree(dir.path());

        tree.remove_directory(&dir.path().join("sub")).unwrap();
        assert!(tree.get_directory(&dir.path().join("sub")).is_none());
    }

    #[test]
    fn move_directory_rewrites_descendant_path_index_entries() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("src")).unwrap();
        std::fs::create_dir(dir.path().join("src/nested")).unwrap();
        std::fs::create_dir(dir.path().join("dst")).unwrap();
        let mut tree = build_empty_tree(dir.path());

        let old_nested = dir.path().join("src/nested");
        let new_src = dir.path().join("dst/src");
        let new_nested = dir.path().join("dst/src/nested");

        tree.move_directory(&dir.path().join("src"), &new_src).unwrap();

        assert!(tree.get_directory(&old_nested).is_none());
        assert!(tree.get_directory(&new_nested).is_some());
    }

    #[test]
    fn rename_file_updates_name_and_notifies() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("old.txt"), b"x").unwrap();
        let mut tree = build_empty_tree(dir.path());
        let recorder = Arc::new(Mutex::new(Recorder::default()));
        tree.add_listener(Box::new(SharedRecorder(recorder.clone())));

        tree.rename_file(&dir.path().join("old.txt"), "new.txt").unwrap();

        assert_eq!(recorder.lock().unwrap().file_path_changed.len(), 1);
        let root = tree.get_root_directory().unwrap();
        let names: Vec<&str> = tree.node(root).as_directory().unwrap().files.iter().map(|&i| tree.node(i).name()).collect();
        assert_eq!(names, vec!["new.txt"]);
    }

    #[test]
    fn clear_tree_fires_no_notifications() {
        let dir = tempdir().unwrap();
        let mut tree = build_empty_tree(dir.path());
        let recorder = Arc::new(Mutex::new(Recorder::default()));
        tree.add_listener(Box::new(SharedRecorder(recorder.clone())));

        tree.clear_tree();

        let r = recorder.lock().unwrap();
        assert!(r.directory_added.is_empty());
        assert!(r.directory_removed.is_empty());
        assert!(tree.get_root_directory().is_none());
    }

    #[test]
    fn remove_listener_stops_future_notifications() {
        let dir = tempdir().unwrap();
        let mut tree = build_empty_tree(dir.path());
        let recorder = Arc::new(Mutex::new(Recorder::default()));
        let id = tree.add_listener(Box::new(SharedRecorder(recorder.clone())));
        tree.remove_listener(id);

        tree.add_new_file(dir.path(), "a.txt").unwrap();
        assert!(recorder.lock().unwrap().file_added.is_empty());
    }

    #[test]
    fn add_new_file_is_idempotent() {
        let dir = tempdir().unwrap();
        let mut tree = build_empty_tree(dir.path());
        let recorder = Arc::new(Mutex::new(Recorder::default()));
        tree.add_listener(Box::new(SharedRecorder(recorder.clone())));

        tree.add_new_file(dir.path(), "a.txt").unwrap();
        tree.add_new_file(dir.path(), "a.txt").unwrap();

        let root = tree.get_root_directory().unwrap();
        assert_eq!(tree.node(root).as_directory().unwrap().files.len(), 1);
        assert_eq!(recorder.lock().unwrap().file_added.len(), 1);
    }

    #[test]
    fn add_new_directory_is_idempotent() {
        let dir = tempdir().unwrap();
        let mut tree = build_empty_tree(dir.path());

        tree.add_new_directory(dir.path(), "sub").unwrap();
        tree.add_new_directory(dir.path(), "sub").unwrap();

        let root = tree.get_root_directory().unwrap();
        assert_eq!(tree.node(root).as_directory().unwrap().directories.len(), 1);
    }

    #[test]
    fn remove_file_on_missing_name_is_a_no_op() {
        let dir = tempdir().unwrap();
        let mut tree = build_empty_tree(dir.path());
        assert!(tree.remove_file(&dir.path().join("ghost.txt")).is_ok());
    }

    #[test]
    fn remove_directory_on_missing_path_is_a_no_op() {
        let dir = tempdir().unwrap();
        let mut tree = build_empty_tree(dir.path());
        assert!(tree.remove_directory(&dir.path().join("ghost")).is_ok());
    }

    #[test]
    fn move_directory_round_trip_restores_structure() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("src")).unwrap();
        std::fs::create_dir(dir.path().join("src/nested")).unwrap();
        std::fs::create_dir(dir.path().join("dst")).unwrap();
        let mut tree = build_empty_tree(dir.path());

        let src = dir.path().join("src");
        let moved = dir.path().join("dst/src");
        let nested_index = tree.get_directory(&dir.path().join("src/nested")).unwrap();

        tree.move_directory(&src, &moved).unwrap();
        tree.move_directory(&moved, &src).unwrap();

        assert!(tree.get_directory(&src).is_some());
        assert!(tree.get_directory(&dir.path().join("src/nested")).is_some());
        assert!(tree.get_directory(&moved).is_none());
        // Node identity (slab index) survived the round trip.
        assert_eq!(tree.get_directory(&dir.path().join("src/nested")).unwrap(), nested_index);
    }

    #[test]
    fn build_root_tree_notifies_post_order() {
        // Assets/{a.png, b/, b/c.txt} -> two OnFileAdded, one
        // OnDirectoryAdded for "b" after its child, then OnDirectoryAdded
        // for the root itself last.
        struct OrderRecorder(Arc<Mutex<Vec<String>>>);
        impl DirectoryTreeListener for OrderRecorder {
            fn on_directory_added(&mut self, path: &Path) {
                self.0.lock().unwrap().push(format!("dir:{}", path.file_name().unwrap().to_string_lossy()));
            }
            fn on_file_added(&mut self, path: &Path) {
                self.0.lock().unwrap().push(format!("file:{}", path.file_name().unwrap().to_string_lossy()));
            }
        }

        let dir = tempdir().unwrap();
        let assets = dir.path().join("Assets");
        std::fs::create_dir(&assets).unwrap();
        std::fs::write(assets.join("a.png"), b"x").unwrap();
        std::fs::create_dir(assets.join("b")).unwrap();
        std::fs::write(assets.join("b/c.txt"), b"x").unwrap();

        let log = Arc::new(Mutex::new(Vec::new()));
        let mut tree = DirectoryTree::new(WatchConfig::default());
        tree.add_listener(Box::new(OrderRecorder(log.clone())));
        tree.build_root_tree(&assets).unwrap();

        let events = log.lock().unwrap();
        let file_events: Vec<&String> = events.iter().filter(|e| e.starts_with("file:")).collect();
        assert_eq!(file_events.len(), 2);
        // "b" is notified only after its child "c.txt" has been.
        let c_txt = events.iter().position(|e| e == "file:c.txt").unwrap();
        let b = events.iter().position(|e| e == "dir:b").unwrap();
        assert!(c_txt < b);
        // The root itself is notified last, after every descendant.
        assert_eq!(events.last().unwrap(), "dir:Assets");
    }

    #[test]
    fn move_file_round_trip_restores_structure() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("a")).unwrap();
        std::fs::create_dir(dir.path().join("b")).unwrap();
        std::fs::write(dir.path().join("a/f.txt"), b"x").unwrap();
        let mut tree = build_empty_tree(dir.path());

        let old_path = dir.path().join("a/f.txt");
        let new_path = dir.path().join("b/f.txt");

        tree.move_file(&old_path, &new_path).unwrap();
        tree.move_file(&new_path, &old_path).unwrap();

        let a = tree.get_directory(&dir.path().join("a")).unwrap();
        let names: Vec<&str> = tree.node(a).as_directory().unwrap().files.iter().map(|&i| tree.node(i).name()).collect();
        assert_eq!(names, vec!["f.txt"]);
        let b = tree.get_directory(&dir.path().join("b")).unwrap();
        assert!(tree.node(b).as_directory().unwrap().files.is_empty());
    }
}
