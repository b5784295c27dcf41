//! Mock API Storage
//!
//! Information Hiding:
//! - In-memory collections hidden behind the same traits as `ApiStorage`
//! - Optional JSON fixture seeds the initial state
//! - File tree is kept as a flat map keyed by absolute path; folders are
//!   derived from it on listing

use super::{normalize_parent, DialStorage, FileStorage, UploadFile, UploadStream};
use crate::error::{Result, StorageError};
use crate::models::{
    get_relative_path, BackendFile, BackendFileFolder, Conversation, DialFile,
    FileFolderInterface, FolderInterface, Prompt,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Initial contents of an `ApiMockStorage`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MockFixture {
    pub conversations: Vec<Conversation>,
    pub conversation_folders: Vec<FolderInterface>,
    pub prompts: Vec<Prompt>,
    pub prompt_folders: Vec<FolderInterface>,
    pub files: Vec<BackendFile>,
}

impl MockFixture {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = tokio::fs::read_to_string(path.as_ref()).await?;
        Ok(serde_json::from_str(&json)?)
    }
}

#[derive(Default)]
struct MockState {
    conversations: Vec<Conversation>,
    conversation_folders: Vec<FolderInterface>,
    prompts: Vec<Prompt>,
    prompt_folders: Vec<FolderInterface>,
    files: BTreeMap<String, BackendFile>,
}

#[derive(Clone, Default)]
pub struct ApiMockStorage {
    state: Arc<RwLock<MockState>>,
}

impl ApiMockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixture(fixture: MockFixture) -> Self {
        let files = fixture
            .files
            .into_iter()
            .map(|f| (f.path.clone(), f))
            .collect();

        let state = MockState {
            conversations: fixture.conversations,
            conversation_folders: fixture.conversation_folders,
            prompts: fixture.prompts,
            prompt_folders: fixture.prompt_folders,
            files,
        };
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }
}

fn child_folders(files: &BTreeMap<String, BackendFile>, parent: Option<&str>) -> Vec<BackendFileFolder> {
    let prefix = format!("{}/", parent.unwrap_or(""));
    let names: BTreeSet<&str> = files
        .keys()
        .filter_map(|path| path.strip_prefix(&prefix))
        .filter_map(|rest| rest.split_once('/').map(|(dir, _)| dir))
        .collect();

    names
        .into_iter()
        .map(|name| BackendFileFolder {
            name: name.to_string(),
            path: format!("{}{}", prefix, name),
        })
        .collect()
}

#[async_trait]
impl FileStorage for ApiMockStorage {
    fn send_file(&self, file: UploadFile, path: Option<&str>) -> UploadStream {
        let state = self.state.clone();
        let parent = normalize_parent(path).unwrap_or("").to_string();

        UploadStream::new(move |progress| async move {
            let created = BackendFile {
                path: format!("{}/{}", parent, file.file_name),
                content_length: file.bytes.len() as u64,
                content_type: file
                    .content_type
                    .unwrap_or_else(|| "application/octet-stream".to_string()),
                name: file.file_name,
            };

            progress.report(50.0);
            state
                .write()
                .await
                .files
                .insert(created.path.clone(), created.clone());
            progress.report(100.0);

            tracing::debug!("[ApiMockStorage] Stored file {}", created.path);
            Ok::<_, StorageError>(DialFile::from(created))
        })
    }

    async fn get_files(&self, parent_path: Option<&str>) -> Result<Vec<DialFile>> {
        let parent = normalize_parent(parent_path);
        let state = self.state.read().await;
        let files: Vec<DialFile> = state
            .files
            .values()
            .filter(|f| get_relative_path(&f.path).as_deref() == parent)
            .cloned()
            .map(DialFile::from)
            .collect();

        tracing::debug!("[ApiMockStorage] Listed {} files under {:?}", files.len(), parent);
        Ok(files)
    }

    async fn get_file_folders(&self, parent_path: Option<&str>) -> Result<Vec<FileFolderInterface>> {
        let parent = normalize_parent(parent_path);
        let state = self.state.read().await;
        Ok(child_folders(&state.files, parent)
            .into_iter()
            .map(FileFolderInterface::from)
            .collect())
    }

    async fn remove_file(&self, path: &str) -> Result<()> {
        let mut state = self.state.write().await;
        match state.files.remove(path) {
            Some(_) => {
                tracing::debug!("[ApiMockStorage] Removed file {}", path);
                Ok(())
            }
            None => Err(StorageError::NotFound(path.to_string())),
        }
    }
}

#[async_trait]
impl DialStorage for ApiMockStorage {
    fn name(&self) -> &'static str {
        "apiMock"
    }

    async fn get_conversations_folders(&self) -> Result<Vec<FolderInterface>> {
        Ok(self.state.read().await.conversation_folders.clone())
    }

    async fn set_conversations_folders(&self, folders: &[FolderInterface]) -> Result<()> {
        self.state.write().await.conversation_folders = folders.to_vec();
        Ok(())
    }

    async fn get_prompts_folders(&self) -> Result<Vec<FolderInterface>> {
        Ok(self.state.read().await.prompt_folders.clone())
    }

    async fn set_prompts_folders(&self, folders: &[FolderInterface]) -> Result<()> {
        self.state.write().await.prompt_folders = folders.to_vec();
        Ok(())
    }

    async fn get_conversations(&self) -> Result<Vec<Conversation>> {
        Ok(self.state.read().await.conversations.clone())
    }

    async fn set_conversations(&self, conversations: &[Conversation]) -> Result<()> {
        self.state.write().await.conversations = conversations.to_vec();
        tracing::debug!("[ApiMockStorage] Stored {} conversations", conversations.len());
        Ok(())
    }

    async fn get_prompts(&self) -> Result<Vec<Prompt>> {
        Ok(self.state.read().await.prompts.clone())
    }

    async fn set_prompts(&self, prompts: &[Prompt]) -> Result<()> {
        self.state.write().await.prompts = prompts.to_vec();
        Ok(())
    }
}
