//! Injectable configuration: the asset-type extension table and the
//! MOVED-synthesis window.
//!
//! Neither of these is a process-wide global (see the "Global mutable
//! state" design note): callers construct a `WatchConfig` and hand it to
//! the tree / watcher explicitly.

use std::collections::HashMap;
use std::time::Duration;

use crate::types::AssetType;

/// Default MOVED-synthesis window, matching the literal scenarios in the
/// testable properties.
pub const DEFAULT_MOVED_WINDOW: Duration = Duration::from_millis(100);

/// Extension (lowercase, leading dot) to asset type table.
#[derive(Debug, Clone)]
pub struct ExtensionTable {
    entries: HashMap<String, AssetType>,
}

impl ExtensionTable {
    pub fn new(entries: HashMap<String, AssetType>) -> Self {
        Self { entries }
    }

    /// Looks up the asset type for a file name, by its (lowercased)
    /// extension. Files without a recognized extension are `Undefined`.
    pub fn classify(&self, file_name: &str) -> AssetType {
        let Some(dot) = file_name.rfind('.') else {
            return AssetType::Undefined;
        };
        if dot == 0 {
            // A leading-dot name like ".gitignore" has no extension.
            return AssetType::Undefined;
        }
        let ext = file_name[dot..].to_ascii_lowercase();
        self.entries.get(&ext).copied().unwrap_or(AssetType::Undefined)
    }
}

impl Default for ExtensionTable {
    /// The default table used by the tests (see the spec's external
    /// interfaces section).
    fn default() -> Self {
        use AssetType::*;
        let pairs: &[(&str, AssetType)] = &[
            (".png", Texture),
            (".jpg", Texture),
            (".jpeg", Texture),
            (".hdr", Texture),
            (".glb", Model),
            (".gltf", Model),
            (".mtl", Model),
            (".obj", Model),
            (".stl", Model),
            (".shader", Shader),
            (".txt", TextDoc),
        ];
        Self::new(pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect())
    }
}

/// Configuration for a watch session.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    pub extensions: ExtensionTable,
    pub moved_window: Duration,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            extensions: ExtensionTable::default(),
            moved_window: DEFAULT_MOVED_WINDOW,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_extensions() {
        let table = ExtensionTable::default();
        assert_eq!(table.classify("rock.png"), AssetType::Texture);
        assert_eq!(table.classify("MESH.OBJ"), AssetType::Model);
        assert_eq!(table.classify("lit.shader"), AssetType::Shader);
        assert_eq!(table.classify("readme.txt"), AssetType::TextDoc);
    }

    #[test]
    fn unknown_extension_is_undefined() {
        let table = ExtensionTable::default();
        assert_eq!(table.classify("data.bin"), AssetType::Undefined);
        assert_eq!(table.classify("noext"), AssetType::Undefined);
        assert_eq!(table.classify(".gitignore"), AssetType::Undefined);
    }
}
