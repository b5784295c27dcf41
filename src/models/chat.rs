//! Conversation and message schema
//!
//! Field names follow the camelCase JSON layout the chat frontend persists,
//! except for the handful of fields (`custom_content`, `action_call`,
//! `reference_url`, ...) that arrive from the model API in snake_case.

use crate::error::ModelError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Assistant,
    User,
    System,
    Action,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Assistant => "assistant",
            Role::User => "user",
            Role::System => "system",
            Role::Action => "action",
        };
        f.write_str(name)
    }
}

/// Rating of an assistant response, stored as -1 / 1 / 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LikeState {
    Disliked,
    Liked,
    #[default]
    NoState,
}

impl LikeState {
    pub fn as_i8(self) -> i8 {
        match self {
            LikeState::Disliked => -1,
            LikeState::Liked => 1,
            LikeState::NoState => 0,
        }
    }
}

impl From<i8> for LikeState {
    fn from(value: i8) -> Self {
        match value {
            v if v < 0 => LikeState::Disliked,
            0 => LikeState::NoState,
            _ => LikeState::Liked,
        }
    }
}

impl Serialize for LikeState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i8(self.as_i8())
    }
}

impl<'de> Deserialize<'de> for LikeState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        i8::deserialize(deserializer).map(LikeState::from)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Completed,
    Failed,
}

/// One step of a multi-stage execution trace; `status: None` means in progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub index: u32,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Attachment>>,
    pub status: Option<StageStatus>,
}

impl Stage {
    pub fn is_in_progress(&self) -> bool {
        self.status.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CustomContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Attachment>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stages: Option<Vec<Stage>>,
    /// Opaque state blob owned by the model/addon
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionParameter {
    #[serde(rename = "type")]
    pub param_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// An invocable operation offered by a message.
///
/// Accepts both `actionId` and the `action_id` spelling the model API sends,
/// always writes `actionId`. See [`crate::models::casing::WireAction`] for
/// the outbound snake_case form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    #[serde(alias = "action_id")]
    pub action_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<BTreeMap<String, ActionParameter>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionCall {
    pub action_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

/// Settings in effect when a message was sent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageSettings {
    pub prompt: String,
    pub temperature: f32,
    #[serde(default)]
    pub selected_addons: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assistant_model_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationEntityModel {
    pub id: String,
}

impl ConversationEntityModel {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(rename = "custom_content", skip_serializing_if = "Option::is_none")]
    pub custom_content: Option<CustomContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub like: Option<LikeState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<ConversationEntityModel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<MessageSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_mapping: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<Action>>,
    #[serde(rename = "action_call", skip_serializing_if = "Option::is_none")]
    pub action_call: Option<ActionCall>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            custom_content: None,
            like: None,
            error_message: None,
            model: None,
            settings: None,
            response_id: None,
            template_mapping: None,
            actions: None,
            action_call: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Action message invoking a previously declared action
    pub fn action(action_id: impl Into<String>, arguments: Option<String>) -> Self {
        let mut message = Self::new(Role::Action, "");
        message.action_call = Some(ActionCall {
            action_id: action_id.into(),
            arguments,
        });
        message
    }

    pub fn with_actions(mut self, actions: Vec<Action>) -> Self {
        self.actions = Some(actions);
        self
    }

    pub fn with_settings(mut self, settings: MessageSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn attachments(&self) -> &[Attachment] {
        self.custom_content
            .as_ref()
            .and_then(|c| c.attachments.as_deref())
            .unwrap_or_default()
    }

    pub fn stages(&self) -> &[Stage] {
        self.custom_content
            .as_ref()
            .and_then(|c| c.stages.as_deref())
            .unwrap_or_default()
    }

    /// Checks that an action message calls one of `declared`.
    /// Messages with any other role always pass.
    pub fn validate_action_call<'a>(
        &self,
        mut declared: impl Iterator<Item = &'a Action>,
    ) -> Result<(), ModelError> {
        if self.role != Role::Action {
            return Ok(());
        }
        let call = self
            .action_call
            .as_ref()
            .ok_or(ModelError::MissingActionCall)?;

        if declared.any(|a| a.action_id == call.action_id) {
            Ok(())
        } else {
            Err(ModelError::UndeclaredAction(call.action_id.clone()))
        }
    }
}

/// Live re-submission of recorded user messages
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Replay {
    pub is_replay: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replay_as_is: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replay_user_messages_stack: Option<Vec<Message>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_replay_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

impl Replay {
    pub fn new(messages: Vec<Message>, replay_as_is: bool) -> Self {
        Self {
            is_replay: true,
            replay_as_is: Some(replay_as_is),
            replay_user_messages_stack: Some(messages),
            active_replay_index: Some(0),
            is_error: Some(false),
        }
    }

    fn stack(&self) -> &[Message] {
        self.replay_user_messages_stack.as_deref().unwrap_or_default()
    }

    fn index(&self) -> usize {
        self.active_replay_index.unwrap_or(0)
    }

    pub fn current_message(&self) -> Option<&Message> {
        self.stack().get(self.index())
    }

    pub fn advance(&mut self) {
        if !self.is_finished() {
            self.active_replay_index = Some(self.index() + 1);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.index() >= self.stack().len()
    }
}

/// Stepping through already received messages without calling the model
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playback {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_playback: Option<bool>,
    pub messages_stack: Vec<Message>,
    pub active_playback_index: usize,
}

impl Playback {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            is_playback: Some(true),
            messages_stack: messages,
            active_playback_index: 0,
        }
    }

    pub fn current_message(&self) -> Option<&Message> {
        self.messages_stack.get(self.active_playback_index)
    }

    pub fn advance(&mut self) {
        if !self.is_finished() {
            self.active_playback_index += 1;
        }
    }

    pub fn is_finished(&self) -> bool {
        self.active_playback_index >= self.messages_stack.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub name: String,
    pub model: ConversationEntityModel,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub prompt: String,
    pub temperature: f32,
    #[serde(default)]
    pub selected_addons: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assistant_model_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replay: Option<Replay>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playback: Option<Playback>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_activity_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_playback: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_replay: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_message_streaming: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_name_changed: Option<bool>,
}

impl Conversation {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        model_id: impl Into<String>,
        prompt: impl Into<String>,
        temperature: f32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            model: ConversationEntityModel::new(model_id),
            messages: Vec::new(),
            prompt: prompt.into(),
            temperature,
            selected_addons: Vec::new(),
            assistant_model_id: None,
            replay: None,
            playback: None,
            folder_id: None,
            last_activity_date: None,
            is_playback: None,
            is_replay: None,
            is_message_streaming: None,
            is_name_changed: None,
        }
    }

    /// A conversation nobody has written to yet; rendered as a settings view
    pub fn is_new(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn declared_actions(&self) -> impl Iterator<Item = &Action> {
        self.messages
            .iter()
            .filter_map(|m| m.actions.as_deref())
            .flatten()
    }

    /// Appends a message, rejecting action calls to undeclared actions
    pub fn push_message(&mut self, message: Message) -> Result<(), ModelError> {
        message.validate_action_call(self.declared_actions())?;
        self.messages.push(message);
        Ok(())
    }

    /// Snapshot of the current settings, for stamping onto an outgoing message
    pub fn message_settings(&self) -> MessageSettings {
        MessageSettings {
            prompt: self.prompt.clone(),
            temperature: self.temperature,
            selected_addons: self.selected_addons.clone(),
            assistant_model_id: self.assistant_model_id.clone(),
        }
    }

    pub fn apply_settings(&mut self, settings: &MessageSettings) {
        self.prompt = settings.prompt.clone();
        self.temperature = settings.temperature;
        self.selected_addons = settings.selected_addons.clone();
        self.assistant_model_id = settings.assistant_model_id.clone();
    }

    pub fn user_messages(&self) -> Vec<Message> {
        self.messages
            .iter()
            .filter(|m| m.role == Role::User)
            .cloned()
            .collect()
    }

    pub fn start_replay(&mut self, replay_as_is: bool) {
        self.replay = Some(Replay::new(self.user_messages(), replay_as_is));
        self.is_replay = Some(true);
    }

    pub fn start_playback(&mut self) {
        self.playback = Some(Playback::new(self.messages.clone()));
        self.is_playback = Some(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_action() -> Action {
        Action {
            action_id: "summarize".to_string(),
            name: "Summarize".to_string(),
            label: None,
            description: None,
            parameters: None,
            required: None,
        }
    }

    #[test]
    fn test_new_conversation_is_new() {
        let mut conv = Conversation::new("c1", "New chat", "gpt-4", "", 1.0);
        assert!(conv.is_new());

        conv.push_message(Message::user("hi")).unwrap();
        assert!(!conv.is_new());
    }

    #[test]
    fn test_messages_keep_insertion_order() {
        let mut conv = Conversation::new("c1", "Chat", "gpt-4", "", 0.5);
        conv.push_message(Message::user("first")).unwrap();
        conv.push_message(Message::assistant("second")).unwrap();
        conv.push_message(Message::user("third")).unwrap();

        let contents: Vec<_> = conv.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_action_message_requires_declared_action() {
        let mut conv = Conversation::new("c1", "Chat", "gpt-4", "", 0.5);

        let err = conv
            .push_message(Message::action("summarize", None))
            .unwrap_err();
        assert_eq!(err, ModelError::UndeclaredAction("summarize".to_string()));

        conv.push_message(Message::assistant("done").with_actions(vec![sample_action()]))
            .unwrap();
        conv.push_message(Message::action("summarize", Some("{}".to_string())))
            .unwrap();
        assert_eq!(conv.messages.len(), 2);
    }

    #[test]
    fn test_action_message_without_call_is_rejected() {
        let message = Message::new(Role::Action, "");
        let declared = [sample_action()];
        assert_eq!(
            message.validate_action_call(declared.iter()),
            Err(ModelError::MissingActionCall)
        );
    }

    #[test]
    fn test_message_wire_layout() {
        let value = json!({
            "role": "assistant",
            "content": "Here you go",
            "custom_content": {
                "attachments": [{"type": "text/plain", "title": "notes", "reference_url": "files/a"}],
                "stages": [{"index": 0, "name": "search", "status": null}]
            },
            "like": -1,
            "responseId": "r-1",
            "actions": [{"action_id": "retry", "name": "Retry"}]
        });

        let message: Message = serde_json::from_value(value).unwrap();
        assert_eq!(message.like, Some(LikeState::Disliked));
        assert_eq!(message.response_id.as_deref(), Some("r-1"));
        assert_eq!(message.attachments()[0].reference_url.as_deref(), Some("files/a"));
        assert!(message.stages()[0].is_in_progress());
        assert_eq!(message.actions.as_ref().unwrap()[0].action_id, "retry");

        let out = serde_json::to_value(&message).unwrap();
        assert_eq!(out["actions"][0]["actionId"], "retry");
        assert_eq!(out["custom_content"]["stages"][0]["status"], Value::Null);
        assert_eq!(out["like"], -1);
    }

    #[test]
    fn test_replay_walks_user_messages() {
        let mut conv = Conversation::new("c1", "Chat", "gpt-4", "be brief", 0.2);
        conv.push_message(Message::user("one")).unwrap();
        conv.push_message(Message::assistant("reply")).unwrap();
        conv.push_message(Message::user("two")).unwrap();

        conv.start_replay(true);
        let replay = conv.replay.as_mut().unwrap();
        assert_eq!(replay.current_message().unwrap().content, "one");
        replay.advance();
        assert_eq!(replay.current_message().unwrap().content, "two");
        replay.advance();
        assert!(replay.is_finished());
        assert!(replay.current_message().is_none());

        replay.advance();
        assert_eq!(replay.active_replay_index, Some(2));
    }

    #[test]
    fn test_playback_stops_at_end() {
        let mut playback = Playback::new(vec![Message::user("a"), Message::assistant("b")]);
        playback.advance();
        playback.advance();
        playback.advance();
        assert_eq!(playback.active_playback_index, 2);
        assert!(playback.is_finished());
    }

    #[test]
    fn test_settings_snapshot_is_independent() {
        let mut conv = Conversation::new("c1", "Chat", "gpt-4", "old", 0.7);
        conv.selected_addons = vec!["search".to_string()];
        let snapshot = conv.message_settings();

        conv.prompt = "new".to_string();
        conv.selected_addons.clear();

        assert_eq!(snapshot.prompt, "old");
        assert_eq!(snapshot.selected_addons, vec!["search".to_string()]);

        conv.apply_settings(&snapshot);
        assert_eq!(conv.prompt, "old");
    }
}
