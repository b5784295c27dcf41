//! Storage Abstraction
//!
//! Information Hiding:
//! - Backend implementation details hidden behind `DialStorage`
//! - Local store, remote API and mock are swappable without caller changes
//! - File operations live on a separate `FileStorage` capability, since the
//!   local backend cannot hold files

use crate::error::Result;
use crate::models::{Conversation, DialFile, FileFolderInterface, FolderInterface, Prompt};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod api;
pub mod browser;
pub mod local;
pub mod mock;
pub mod upload;

pub use upload::{ProgressReporter, UploadEvent, UploadFile, UploadStream};

/// Conversations, prompts and their folders
#[async_trait]
pub trait DialStorage: Send + Sync {
    /// Short backend name, for logs and diagnostics
    fn name(&self) -> &'static str;

    async fn get_conversations_folders(&self) -> Result<Vec<FolderInterface>>;

    async fn set_conversations_folders(&self, folders: &[FolderInterface]) -> Result<()>;

    async fn get_prompts_folders(&self) -> Result<Vec<FolderInterface>>;

    async fn set_prompts_folders(&self, folders: &[FolderInterface]) -> Result<()>;

    async fn get_conversations(&self) -> Result<Vec<Conversation>>;

    async fn set_conversations(&self, conversations: &[Conversation]) -> Result<()>;

    async fn get_prompts(&self) -> Result<Vec<Prompt>>;

    async fn set_prompts(&self, prompts: &[Prompt]) -> Result<()>;
}

/// Upload, listing and deletion of remote files
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Starts nothing until the returned stream is polled
    fn send_file(&self, file: UploadFile, path: Option<&str>) -> UploadStream;

    async fn get_files(&self, parent_path: Option<&str>) -> Result<Vec<DialFile>>;

    async fn get_file_folders(&self, parent_path: Option<&str>) -> Result<Vec<FileFolderInterface>>;

    async fn remove_file(&self, path: &str) -> Result<()>;
}

/// Which backend a `DataService` talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StorageType {
    Api,
    ApiMock,
    #[default]
    BrowserStorage,
}

impl StorageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageType::Api => "api",
            StorageType::ApiMock => "apiMock",
            StorageType::BrowserStorage => "browserStorage",
        }
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown names select the default backend
impl From<&str> for StorageType {
    fn from(value: &str) -> Self {
        match value {
            "api" => StorageType::Api,
            "apiMock" => StorageType::ApiMock,
            "browserStorage" => StorageType::BrowserStorage,
            other => {
                tracing::warn!("Unknown storage type '{}', using browserStorage", other);
                StorageType::BrowserStorage
            }
        }
    }
}

impl From<String> for StorageType {
    fn from(value: String) -> Self {
        StorageType::from(value.as_str())
    }
}

impl From<StorageType> for String {
    fn from(value: StorageType) -> Self {
        value.as_str().to_string()
    }
}

impl FromStr for StorageType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(StorageType::from(s))
    }
}

/// `filter` query parameter of the listing endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingFilter {
    File,
    Folder,
}

impl ListingFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingFilter::File => "FILE",
            ListingFilter::Folder => "FOLDER",
        }
    }
}

/// Treats `None`, `""` and `"/"` alike as the storage root
pub(crate) fn normalize_parent(parent_path: Option<&str>) -> Option<&str> {
    parent_path
        .map(|p| p.trim_end_matches('/'))
        .filter(|p| !p.is_empty())
}
