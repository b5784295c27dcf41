use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FolderType {
    Chat,
    Prompt,
    File,
}

/// Hierarchical container for conversations, prompts or files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderInterface {
    pub id: String,
    pub name: String,
    /// Parent folder, `None` at the top level
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
    #[serde(rename = "type")]
    pub folder_type: FolderType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_synced: Option<bool>,
}

impl FolderInterface {
    pub fn new(id: impl Into<String>, name: impl Into<String>, folder_type: FolderType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            folder_id: None,
            folder_type,
            server_synced: None,
        }
    }

    pub fn with_parent(mut self, folder_id: impl Into<String>) -> Self {
        self.folder_id = Some(folder_id.into());
        self
    }
}
