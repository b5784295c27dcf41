//! Entities that flow through the persistence layer

pub mod casing;
pub mod chat;
pub mod files;
pub mod folder;
pub mod prompt;
pub mod settings;

pub use casing::{camel2snake, snake2camel, WireAction, WireActionCall};
pub use chat::{
    Action, ActionCall, ActionParameter, Attachment, Conversation, ConversationEntityModel,
    CustomContent, LikeState, Message, MessageSettings, Playback, Replay, Role, Stage,
    StageStatus,
};
pub use files::{
    get_path_name_id, get_relative_path, BackendFile, BackendFileFolder, DialFile,
    FileFolderInterface,
};
pub use folder::{FolderInterface, FolderType};
pub use prompt::Prompt;
pub use settings::{AppSettings, Theme};
