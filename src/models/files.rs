//! Remote file and file-folder records
//!
//! The backend reports `name` + absolute `path`; everything else (id,
//! relative path, folder id) is derived here so that a file gets the same id
//! whether it came back from an upload or from a listing.

use super::folder::FolderType;
use serde::{Deserialize, Serialize};

/// File as returned by the files API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendFile {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub content_length: u64,
    #[serde(default)]
    pub content_type: String,
}

/// Folder as returned by the files API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendFileFolder {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialFile {
    pub id: String,
    pub name: String,
    pub absolute_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relative_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
    pub content_length: u64,
    pub content_type: String,
    #[serde(default)]
    pub server_synced: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileFolderInterface {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub folder_type: FolderType,
    pub absolute_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relative_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
    #[serde(default)]
    pub server_synced: bool,
}

/// Parent directory of an absolute path; `None` for entries at the root.
///
/// `/docs/readme.txt` -> `/docs`, `/readme.txt` -> `None`
pub fn get_relative_path(absolute_path: &str) -> Option<String> {
    let trimmed = absolute_path.trim_end_matches('/');
    let (parent, _) = trimmed.rsplit_once('/')?;
    if parent.is_empty() {
        None
    } else {
        Some(parent.to_string())
    }
}

/// Stable id for a file or folder: its relative path joined with its name
pub fn get_path_name_id(name: &str, relative_path: Option<&str>) -> String {
    match relative_path.map(|p| p.trim_end_matches('/')) {
        Some(parent) if !parent.is_empty() => format!("{}/{}", parent, name),
        _ => name.to_string(),
    }
}

impl From<BackendFile> for DialFile {
    fn from(file: BackendFile) -> Self {
        let relative_path = get_relative_path(&file.path);
        DialFile {
            id: get_path_name_id(&file.name, relative_path.as_deref()),
            name: file.name,
            absolute_path: file.path,
            folder_id: relative_path.clone(),
            relative_path,
            content_length: file.content_length,
            content_type: file.content_type,
            server_synced: true,
        }
    }
}

impl From<BackendFileFolder> for FileFolderInterface {
    fn from(folder: BackendFileFolder) -> Self {
        let relative_path = get_relative_path(&folder.path);
        FileFolderInterface {
            id: get_path_name_id(&folder.name, relative_path.as_deref()),
            name: folder.name,
            folder_type: FolderType::File,
            absolute_path: folder.path,
            folder_id: relative_path.clone(),
            relative_path,
            server_synced: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_path() {
        assert_eq!(get_relative_path("/docs/readme.txt").as_deref(), Some("/docs"));
        assert_eq!(get_relative_path("/a/b/c/").as_deref(), Some("/a/b"));
        assert_eq!(get_relative_path("/readme.txt"), None);
        assert_eq!(get_relative_path("readme.txt"), None);
    }

    #[test]
    fn test_path_name_id_is_deterministic() {
        let first = get_path_name_id("readme.txt", Some("/docs"));
        let second = get_path_name_id("readme.txt", Some("/docs/"));
        assert_eq!(first, "/docs/readme.txt");
        assert_eq!(first, second);
        assert_eq!(get_path_name_id("readme.txt", None), "readme.txt");
        assert_eq!(get_path_name_id("readme.txt", Some("")), "readme.txt");
    }

    #[test]
    fn test_backend_file_conversion() {
        let file: DialFile = BackendFile {
            name: "readme.txt".to_string(),
            path: "/docs/readme.txt".to_string(),
            content_length: 120,
            content_type: "text/plain".to_string(),
        }
        .into();

        assert_eq!(file.id, get_path_name_id("readme.txt", Some("/docs")));
        assert_eq!(file.folder_id, file.relative_path);
        assert!(file.server_synced);
    }

    #[test]
    fn test_backend_folder_conversion() {
        let folder: FileFolderInterface = BackendFileFolder {
            name: "images".to_string(),
            path: "/docs/images".to_string(),
        }
        .into();

        assert_eq!(folder.id, "/docs/images");
        assert_eq!(folder.folder_id.as_deref(), Some("/docs"));
        assert_eq!(folder.folder_type, FolderType::File);
        assert!(folder.server_synced);
    }
}
