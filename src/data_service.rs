//! Storage facade
//!
//! `DataService` is built once at startup and handed to whatever needs
//! persistence. It owns the local store (preferences always live there)
//! and exactly one `DialStorage` backend chosen at construction.

use crate::config::Settings;
use crate::error::Result;
use crate::models::{
    AppSettings, Conversation, DialFile, FileFolderInterface, FolderInterface, Prompt, Theme,
};
use crate::storage::api::ApiStorage;
use crate::storage::browser::BrowserStorage;
use crate::storage::local::LocalStore;
use crate::storage::mock::{ApiMockStorage, MockFixture};
use crate::storage::{DialStorage, FileStorage, StorageType, UploadFile, UploadStream};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Local store keys for user preferences
pub mod keys {
    pub const SELECTED_CONVERSATION_IDS: &str = "selectedConversationIds";
    pub const RECENT_MODELS_IDS: &str = "recentModelsIds";
    pub const RECENT_ADDONS_IDS: &str = "recentAddonsIds";
    pub const SETTINGS: &str = "settings";
    pub const SHOW_CHATBAR: &str = "showChatbar";
    pub const SHOW_PROMPTBAR: &str = "showPromptbar";
    pub const OPENED_FOLDERS_IDS: &str = "openedFoldersIds";
}

/// What the non-local backends need to be built
#[derive(Clone)]
pub struct BackendOptions {
    pub api_base_url: String,
    pub client: Client,
    pub mock_fixture: Option<MockFixture>,
}

impl BackendOptions {
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            client: Client::new(),
            mock_fixture: None,
        }
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_mock_fixture(mut self, fixture: MockFixture) -> Self {
        self.mock_fixture = Some(fixture);
        self
    }
}

pub struct DataService {
    local: Arc<LocalStore>,
    options: BackendOptions,
    storage_type: StorageType,
    storage: Arc<dyn DialStorage>,
    files: Arc<dyn FileStorage>,
}

impl DataService {
    /// Fails with `InvalidUrl` when the selected backend needs the remote API
    /// and `options.api_base_url` is not usable
    pub fn new(
        local: LocalStore,
        storage_type: StorageType,
        options: BackendOptions,
    ) -> Result<Self> {
        let local = Arc::new(local);
        let (storage, files) = select_storage(storage_type, &local, &options)?;
        tracing::info!("[DataService] Using {} storage", storage.name());

        Ok(Self {
            local,
            options,
            storage_type,
            storage,
            files,
        })
    }

    /// Builds the service described by `settings`, opening the local store
    /// on disk and loading the mock fixture if one is configured
    pub async fn from_settings(settings: &Settings) -> Result<Self> {
        let storage = &settings.storage;
        let local = LocalStore::open(&storage.local_db_path)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(storage.request_timeout_secs))
            .build()?;
        let mut options = BackendOptions::new(&storage.api_base_url).with_client(client);
        if let Some(path) = &storage.mock_fixture {
            options = options.with_mock_fixture(MockFixture::load(path).await?);
        }

        Self::new(local, storage.storage_type, options)
    }

    /// Swaps the backend. Data written through the previous backend is not
    /// carried over; the new one starts from its own state. On error the
    /// current backend stays in place.
    pub fn reinit(&mut self, storage_type: StorageType) -> Result<()> {
        let (storage, files) = select_storage(storage_type, &self.local, &self.options)?;
        tracing::info!(
            "[DataService] Switching storage {} -> {}",
            self.storage_type,
            storage_type
        );
        self.storage_type = storage_type;
        self.storage = storage;
        self.files = files;
        Ok(())
    }

    pub fn storage_type(&self) -> StorageType {
        self.storage_type
    }

    pub fn backend_name(&self) -> &'static str {
        self.storage.name()
    }

    pub fn local_store(&self) -> &LocalStore {
        &self.local
    }

    // Conversations and prompts

    pub async fn get_conversations_folders(&self) -> Result<Vec<FolderInterface>> {
        self.storage.get_conversations_folders().await
    }

    pub async fn set_conversation_folders(&self, folders: &[FolderInterface]) -> Result<()> {
        self.storage.set_conversations_folders(folders).await
    }

    pub async fn get_prompts_folders(&self) -> Result<Vec<FolderInterface>> {
        self.storage.get_prompts_folders().await
    }

    pub async fn set_prompt_folders(&self, folders: &[FolderInterface]) -> Result<()> {
        self.storage.set_prompts_folders(folders).await
    }

    pub async fn get_prompts(&self) -> Result<Vec<Prompt>> {
        self.storage.get_prompts().await
    }

    pub async fn set_prompts(&self, prompts: &[Prompt]) -> Result<()> {
        self.storage.set_prompts(prompts).await
    }

    pub async fn get_conversations(&self) -> Result<Vec<Conversation>> {
        self.storage.get_conversations().await
    }

    pub async fn set_conversations(&self, conversations: &[Conversation]) -> Result<()> {
        self.storage.set_conversations(conversations).await
    }

    // Preferences

    pub async fn get_selected_conversations_ids(&self) -> Vec<String> {
        self.local.get_data(keys::SELECTED_CONVERSATION_IDS, Vec::new())
    }

    pub async fn set_selected_conversations_ids(&self, ids: &[String]) -> Result<()> {
        self.local.set_data(keys::SELECTED_CONVERSATION_IDS, ids)
    }

    pub async fn get_recent_models_ids(&self) -> Vec<String> {
        self.local.get_data(keys::RECENT_MODELS_IDS, Vec::new())
    }

    pub async fn set_recent_models_ids(&self, ids: &[String]) -> Result<()> {
        self.local.set_data(keys::RECENT_MODELS_IDS, ids)
    }

    pub async fn get_recent_addons_ids(&self) -> Vec<String> {
        self.local.get_data(keys::RECENT_ADDONS_IDS, Vec::new())
    }

    pub async fn set_recent_addons_ids(&self, ids: &[String]) -> Result<()> {
        self.local.set_data(keys::RECENT_ADDONS_IDS, ids)
    }

    pub async fn get_theme(&self) -> Theme {
        self.local
            .get_data(keys::SETTINGS, AppSettings::default())
            .theme
    }

    pub async fn set_theme(&self, theme: Theme) -> Result<()> {
        self.local.set_data(keys::SETTINGS, &AppSettings { theme })
    }

    pub async fn get_show_chatbar(&self) -> bool {
        self.local.get_data(keys::SHOW_CHATBAR, true)
    }

    pub async fn set_show_chatbar(&self, show: bool) -> Result<()> {
        self.local.set_data(keys::SHOW_CHATBAR, &show)
    }

    pub async fn get_show_promptbar(&self) -> bool {
        self.local.get_data(keys::SHOW_PROMPTBAR, true)
    }

    pub async fn set_show_promptbar(&self, show: bool) -> Result<()> {
        self.local.set_data(keys::SHOW_PROMPTBAR, &show)
    }

    pub async fn get_opened_folder_ids(&self) -> Vec<String> {
        self.local.get_data(keys::OPENED_FOLDERS_IDS, Vec::new())
    }

    pub async fn set_opened_folder_ids(&self, ids: &[String]) -> Result<()> {
        self.local.set_data(keys::OPENED_FOLDERS_IDS, ids)
    }

    // Files

    pub fn send_file(&self, file: UploadFile, path: Option<&str>) -> UploadStream {
        self.files.send_file(file, path)
    }

    pub async fn get_files(&self, parent_path: Option<&str>) -> Result<Vec<DialFile>> {
        self.files.get_files(parent_path).await
    }

    pub async fn get_file_folders(&self, parent_path: Option<&str>) -> Result<Vec<FileFolderInterface>> {
        self.files.get_file_folders(parent_path).await
    }

    pub async fn remove_file(&self, path: &str) -> Result<()> {
        self.files.remove_file(path).await
    }
}

/// The local backend has no file capability, so it pairs with the remote
/// file API
fn select_storage(
    storage_type: StorageType,
    local: &Arc<LocalStore>,
    options: &BackendOptions,
) -> Result<(Arc<dyn DialStorage>, Arc<dyn FileStorage>)> {
    let api = || -> Result<Arc<ApiStorage>> {
        ApiStorage::with_client(options.client.clone(), &options.api_base_url).map(Arc::new)
    };

    let selected = match storage_type {
        StorageType::Api => {
            let api = api()?;
            (api.clone() as Arc<dyn DialStorage>, api as Arc<dyn FileStorage>)
        }
        StorageType::ApiMock => {
            let mock = Arc::new(
                options
                    .mock_fixture
                    .clone()
                    .map(ApiMockStorage::from_fixture)
                    .unwrap_or_default(),
            );
            (mock.clone() as Arc<dyn DialStorage>, mock as Arc<dyn FileStorage>)
        }
        StorageType::BrowserStorage => (
            Arc::new(BrowserStorage::new(local.clone())) as Arc<dyn DialStorage>,
            api()? as Arc<dyn FileStorage>,
        ),
    };
    Ok(selected)
}
