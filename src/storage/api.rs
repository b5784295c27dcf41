//! Remote API Storage
//!
//! Information Hiding:
//! - Endpoint layout and query encoding hidden behind the storage traits
//! - Backend-native file records normalized into `DialFile` here
//! - Non-success responses surface as `StorageError::Http` with the status
//!   intact; nothing is retried at this layer

use super::{normalize_parent, DialStorage, FileStorage, ListingFilter, UploadFile, UploadStream};
use crate::error::{Result, StorageError};
use crate::models::{
    BackendFile, BackendFileFolder, Conversation, DialFile, FileFolderInterface, FolderInterface,
    Prompt,
};
use async_trait::async_trait;
use futures::{stream, StreamExt};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

const FILES_ENDPOINT: &str = "api/files";
const LISTING_ENDPOINT: &str = "api/files/listing";
const CONVERSATIONS_ENDPOINT: &str = "api/conversations";
const CONVERSATION_FOLDERS_ENDPOINT: &str = "api/conversations/folders";
const PROMPTS_ENDPOINT: &str = "api/prompts";
const PROMPT_FOLDERS_ENDPOINT: &str = "api/prompts/folders";

const UPLOAD_FIELD: &str = "attachment";
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

#[derive(Clone)]
pub struct ApiStorage {
    client: Client,
    base_url: String,
}

impl ApiStorage {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_client(Client::new(), base_url)
    }

    /// Fails with `InvalidUrl` unless `base_url` is an absolute http(s) URL
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        match Url::parse(&base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(Self { client, base_url }),
            _ => Err(StorageError::InvalidUrl(base_url)),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn send(request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        tracing::warn!("[ApiStorage] Backend returned {}: {}", status, body);
        Err(StorageError::Http {
            status: status.as_u16(),
            body,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        tracing::debug!("[ApiStorage] GET {}", path);
        let response = Self::send(self.client.get(self.endpoint(path))).await?;
        Ok(response.json::<T>().await?)
    }

    async fn put_json<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<()> {
        tracing::debug!("[ApiStorage] PUT {}", path);
        Self::send(self.client.put(self.endpoint(path)).json(body)).await?;
        Ok(())
    }

    async fn listing<T: DeserializeOwned>(
        &self,
        filter: ListingFilter,
        parent_path: Option<&str>,
    ) -> Result<Vec<T>> {
        let mut query = vec![("filter", filter.as_str())];
        if let Some(path) = normalize_parent(parent_path) {
            query.push(("path", path));
        }

        tracing::debug!("[ApiStorage] Listing {} under {:?}", filter.as_str(), parent_path);
        let request = self.client.get(self.endpoint(LISTING_ENDPOINT)).query(&query);
        let response = Self::send(request).await?;
        Ok(response.json::<Vec<T>>().await?)
    }
}

/// Splits the payload into chunks and reports progress as each one is
/// pulled by the transport
fn progress_body(bytes: Vec<u8>, progress: super::ProgressReporter) -> Body {
    let total = bytes.len().max(1) as f32;
    let chunks: Vec<Vec<u8>> = bytes.chunks(UPLOAD_CHUNK_SIZE).map(<[u8]>::to_vec).collect();
    let mut sent = 0usize;

    let body = stream::iter(chunks).map(move |chunk| {
        sent += chunk.len();
        progress.report(sent as f32 / total * 100.0);
        Ok::<_, std::io::Error>(chunk)
    });
    Body::wrap_stream(body)
}

#[async_trait]
impl FileStorage for ApiStorage {
    fn send_file(&self, file: UploadFile, path: Option<&str>) -> UploadStream {
        let client = self.client.clone();
        let url = self.endpoint(FILES_ENDPOINT);
        let path = normalize_parent(path).map(str::to_string);

        UploadStream::new(move |progress| async move {
            let UploadFile {
                file_name,
                content_type,
                bytes,
            } = file;
            let length = bytes.len() as u64;
            tracing::debug!(
                "[ApiStorage] Uploading '{}' ({} bytes) to {:?}",
                file_name,
                length,
                path
            );

            let mut part = Part::stream_with_length(progress_body(bytes, progress), length)
                .file_name(file_name);
            if let Some(content_type) = content_type {
                part = part.mime_str(&content_type)?;
            }
            let form = Form::new().part(UPLOAD_FIELD, part);

            let mut request = client.post(url).multipart(form);
            if let Some(path) = &path {
                request = request.query(&[("path", path)]);
            }

            let response = ApiStorage::send(request).await?;
            let created: BackendFile = response.json().await?;
            tracing::debug!("[ApiStorage] Uploaded {}", created.path);
            Ok::<_, StorageError>(DialFile::from(created))
        })
    }

    async fn get_files(&self, parent_path: Option<&str>) -> Result<Vec<DialFile>> {
        let files: Vec<BackendFile> = self.listing(ListingFilter::File, parent_path).await?;
        Ok(files.into_iter().map(DialFile::from).collect())
    }

    async fn get_file_folders(&self, parent_path: Option<&str>) -> Result<Vec<FileFolderInterface>> {
        let folders: Vec<BackendFileFolder> =
            self.listing(ListingFilter::Folder, parent_path).await?;
        Ok(folders.into_iter().map(FileFolderInterface::from).collect())
    }

    async fn remove_file(&self, path: &str) -> Result<()> {
        tracing::debug!("[ApiStorage] DELETE {}", path);
        let request = self
            .client
            .delete(self.endpoint(FILES_ENDPOINT))
            .query(&[("path", path)])
            .header("Content-Type", "application/json");
        Self::send(request).await?;
        Ok(())
    }
}

#[async_trait]
impl DialStorage for ApiStorage {
    fn name(&self) -> &'static str {
        "api"
    }

    async fn get_conversations_folders(&self) -> Result<Vec<FolderInterface>> {
        self.get_json(CONVERSATION_FOLDERS_ENDPOINT).await
    }

    async fn set_conversations_folders(&self, folders: &[FolderInterface]) -> Result<()> {
        self.put_json(CONVERSATION_FOLDERS_ENDPOINT, folders).await
    }

    async fn get_prompts_folders(&self) -> Result<Vec<FolderInterface>> {
        self.get_json(PROMPT_FOLDERS_ENDPOINT).await
    }

    async fn set_prompts_folders(&self, folders: &[FolderInterface]) -> Result<()> {
        self.put_json(PROMPT_FOLDERS_ENDPOINT, folders).await
    }

    async fn get_conversations(&self) -> Result<Vec<Conversation>> {
        self.get_json(CONVERSATIONS_ENDPOINT).await
    }

    async fn set_conversations(&self, conversations: &[Conversation]) -> Result<()> {
        self.put_json(CONVERSATIONS_ENDPOINT, conversations).await
    }

    async fn get_prompts(&self) -> Result<Vec<Prompt>> {
        self.get_json(PROMPTS_ENDPOINT).await
    }

    async fn set_prompts(&self, prompts: &[Prompt]) -> Result<()> {
        self.put_json(PROMPTS_ENDPOINT, prompts).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::get_path_name_id;
    use crate::storage::UploadEvent;
    use futures::StreamExt;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_base_url_must_be_absolute_http() {
        let storage = ApiStorage::new("https://dial.example.com/").unwrap();
        assert_eq!(storage.base_url(), "https://dial.example.com");

        for bad in ["", "dial.example.com", "ftp://dial.example.com", "http//missing-colon"] {
            let err = ApiStorage::new(bad).err().unwrap();
            assert!(matches!(err, StorageError::InvalidUrl(_)), "accepted {:?}", bad);
        }
    }

    #[tokio::test]
    async fn test_upload_emits_progress_then_result() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/files"))
            .and(query_param("path", "/docs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "readme.txt",
                "path": "/docs/readme.txt",
                "contentLength": 120,
                "contentType": "text/plain"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let storage = ApiStorage::new(mock_server.uri()).unwrap();
        let upload = UploadFile::new("readme.txt", vec![b'x'; 120]).with_content_type("text/plain");
        let events: Vec<UploadEvent> = storage
            .send_file(upload, Some("/docs"))
            .map(|e| e.unwrap())
            .collect()
            .await;

        let (last, progress) = events.split_last().unwrap();
        assert!(!progress.is_empty());
        assert!(progress.iter().all(|e| !e.is_terminal()));
        match last {
            UploadEvent::Result(file) => {
                assert_eq!(file.id, get_path_name_id("readme.txt", Some("/docs")));
                assert_eq!(file.content_length, 120);
                assert!(file.server_synced);
            }
            other => panic!("expected result, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_upload_failure_carries_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/files"))
            .respond_with(ResponseTemplate::new(413).set_body_string("too large"))
            .mount(&mock_server)
            .await;

        let storage = ApiStorage::new(mock_server.uri()).unwrap();
        let err = storage
            .send_file(UploadFile::new("big.bin", vec![0u8; 10]), None)
            .into_result()
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(413));
    }

    #[tokio::test]
    async fn test_listing_files_and_folders() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/files/listing"))
            .and(query_param("filter", "FILE"))
            .and(query_param("path", "/docs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"name": "a.txt", "path": "/docs/a.txt", "contentLength": 1, "contentType": "text/plain"}
            ])))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/files/listing"))
            .and(query_param("filter", "FOLDER"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"name": "docs", "path": "/docs"}
            ])))
            .mount(&mock_server)
            .await;

        let storage = ApiStorage::new(format!("{}/", mock_server.uri())).unwrap();

        let files = storage.get_files(Some("/docs")).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].id, "/docs/a.txt");
        assert_eq!(files[0].folder_id.as_deref(), Some("/docs"));

        let folders = storage.get_file_folders(None).await.unwrap();
        assert_eq!(folders[0].id, "docs");
        assert_eq!(folders[0].folder_id, None);
        assert!(folders[0].server_synced);
    }

    #[tokio::test]
    async fn test_remove_passes_backend_errors_through() {
        let mock_server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/files"))
            .and(query_param("path", "/docs/a.txt"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/files"))
            .and(query_param("path", "/missing.txt"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no such file"))
            .mount(&mock_server)
            .await;

        let storage = ApiStorage::new(mock_server.uri()).unwrap();
        storage.remove_file("/docs/a.txt").await.unwrap();

        let err = storage.remove_file("/missing.txt").await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert!(err.to_string().contains("no such file"));
    }

    #[tokio::test]
    async fn test_conversations_round_trip_through_api() {
        let mock_server = MockServer::start().await;
        let conv = Conversation::new("c1", "Chat", "gpt-4", "", 1.0);

        Mock::given(method("PUT"))
            .and(path("/api/conversations"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/conversations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([conv])))
            .mount(&mock_server)
            .await;

        let storage = ApiStorage::new(mock_server.uri()).unwrap();
        storage.set_conversations(&[conv.clone()]).await.unwrap();
        assert_eq!(storage.get_conversations().await.unwrap(), vec![conv]);
    }
}
