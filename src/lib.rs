//! Dialstore - persistence layer for AI chat conversations
//!
//! This library provides the data model of a chat application and a
//! storage facade over three interchangeable backends: a local SQLite
//! key/value store, a remote HTTP API, and an in-memory mock.

mod config;
pub mod data_service;
pub mod error;
pub mod models;
pub mod storage;
pub mod utils;

pub mod cli;

pub use config::{LoggingConfig, Settings, StorageConfig};
pub use data_service::{BackendOptions, DataService};
pub use error::{ModelError, Result, StorageError};
pub use storage::{StorageType, UploadEvent, UploadFile, UploadStream};
