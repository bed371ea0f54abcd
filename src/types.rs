//! Core value types shared across the crate.

/// Asset type tag assigned to a file from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetType {
    Model,
    Shader,
    Texture,
    TextDoc,
    Undefined,
}

impl AssetType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Shader => "shader",
            Self::Texture => "texture",
            Self::TextDoc => "text_doc",
            Self::Undefined => "undefined",
        }
    }
}
