//! Local Store Backend
//!
//! Information Hiding:
//! - Keeps whole collections under single keys of the local store
//! - Conversation and prompt folders share the `folders` key and are told
//!   apart by their `type`

use super::local::LocalStore;
use super::DialStorage;
use crate::error::Result;
use crate::models::{Conversation, FolderInterface, FolderType, Prompt};
use async_trait::async_trait;
use std::sync::Arc;

const CONVERSATIONS_KEY: &str = "conversationHistory";
const PROMPTS_KEY: &str = "prompts";
const FOLDERS_KEY: &str = "folders";

pub struct BrowserStorage {
    store: Arc<LocalStore>,
}

impl BrowserStorage {
    pub fn new(store: Arc<LocalStore>) -> Self {
        Self { store }
    }

    fn folders_of(&self, folder_type: FolderType) -> Vec<FolderInterface> {
        let folders: Vec<FolderInterface> = self.store.get_data(FOLDERS_KEY, Vec::new());
        folders
            .into_iter()
            .filter(|f| f.folder_type == folder_type)
            .collect()
    }

    /// Replaces the folders of one type, leaving the others untouched
    fn replace_folders(&self, folder_type: FolderType, folders: &[FolderInterface]) -> Result<()> {
        let stored: Vec<FolderInterface> = self.store.get_data(FOLDERS_KEY, Vec::new());
        let merged: Vec<FolderInterface> = stored
            .into_iter()
            .filter(|f| f.folder_type != folder_type)
            .chain(folders.iter().cloned())
            .collect();

        self.store.set_data(FOLDERS_KEY, &merged)?;
        tracing::debug!(
            "[BrowserStorage] Stored {} {:?} folders ({} total)",
            folders.len(),
            folder_type,
            merged.len()
        );
        Ok(())
    }
}

#[async_trait]
impl DialStorage for BrowserStorage {
    fn name(&self) -> &'static str {
        "browserStorage"
    }

    async fn get_conversations_folders(&self) -> Result<Vec<FolderInterface>> {
        Ok(self.folders_of(FolderType::Chat))
    }

    async fn set_conversations_folders(&self, folders: &[FolderInterface]) -> Result<()> {
        self.replace_folders(FolderType::Chat, folders)
    }

    async fn get_prompts_folders(&self) -> Result<Vec<FolderInterface>> {
        Ok(self.folders_of(FolderType::Prompt))
    }

    async fn set_prompts_folders(&self, folders: &[FolderInterface]) -> Result<()> {
        self.replace_folders(FolderType::Prompt, folders)
    }

    async fn get_conversations(&self) -> Result<Vec<Conversation>> {
        Ok(self.store.get_data(CONVERSATIONS_KEY, Vec::new()))
    }

    async fn set_conversations(&self, conversations: &[Conversation]) -> Result<()> {
        self.store.set_data(CONVERSATIONS_KEY, conversations)?;
        tracing::debug!("[BrowserStorage] Stored {} conversations", conversations.len());
        Ok(())
    }

    async fn get_prompts(&self) -> Result<Vec<Prompt>> {
        Ok(self.store.get_data(PROMPTS_KEY, Vec::new()))
    }

    async fn set_prompts(&self, prompts: &[Prompt]) -> Result<()> {
        self.store.set_data(PROMPTS_KEY, prompts)?;
        tracing::debug!("[BrowserStorage] Stored {} prompts", prompts.len());
        Ok(())
    }
}
