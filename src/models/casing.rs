//! snake_case <-> camelCase key conversion
//!
//! Two layers:
//! - [`WireAction`] / [`WireActionCall`] give the model API's snake_case
//!   action records an explicit schema with `From` conversions.
//! - [`snake2camel`] / [`camel2snake`] rewrite object keys of opaque JSON
//!   (action parameter values, custom state) where no schema exists.
//!
//! The key rewrite is only a two-sided inverse for `word_word` / `wordWord`
//! keys. Lossy shapes:
//! - digits after an underscore: `item_2_name` -> `item2Name` -> `item2_name`
//! - a capital after an underscore: `already_Mixed` -> `alreadyMixed` -> `already_mixed`
//! - a leading underscore: `_private` -> `Private` -> `_private` round trips,
//!   but `Private` on its own maps to `_private`
//!
//! Only ASCII word characters follow an underscore in a match; `name_é` is
//! left as is in both directions.

use super::chat::{Action, ActionCall, ActionParameter};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

static SNAKE_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"_([A-Za-z0-9_])").unwrap());
static UPPER_LETTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Z]").unwrap());

pub fn snake_to_camel_key(key: &str) -> String {
    SNAKE_SEGMENT
        .replace_all(key, |caps: &Captures| caps[1].to_uppercase())
        .into_owned()
}

pub fn camel_to_snake_key(key: &str) -> String {
    UPPER_LETTER
        .replace_all(key, |caps: &Captures| format!("_{}", caps[0].to_lowercase()))
        .into_owned()
}

fn rewrite_keys(value: Value, rename: &impl Fn(&str) -> String) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| rewrite_keys(item, rename))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, item)| (rename(&key), rewrite_keys(item, rename)))
                .collect::<Map<String, Value>>(),
        ),
        other => other,
    }
}

/// Recursively renames every object key from snake_case to camelCase
pub fn snake2camel(value: Value) -> Value {
    rewrite_keys(value, &snake_to_camel_key)
}

/// Recursively renames every object key from camelCase to snake_case
pub fn camel2snake(value: Value) -> Value {
    rewrite_keys(value, &camel_to_snake_key)
}

/// Action record as the model API sends and expects it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireAction {
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

impl From<WireAction> for Action {
    fn from(wire: WireAction) -> Self {
        Action {
            action_id: wire.action_id,
            name: wire.name,
            label: wire.label,
            description: wire.description,
            parameters: wire.parameters,
            required: wire.required,
        }
    }
}

impl From<Action> for WireAction {
    fn from(action: Action) -> Self {
        WireAction {
            action_id: action.action_id,
            name: action.name,
            label: action.label,
            description: action.description,
            parameters: action.parameters,
            required: action.required,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireActionCall {
    pub action_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

impl From<WireActionCall> for ActionCall {
    fn from(wire: WireActionCall) -> Self {
        ActionCall {
            action_id: wire.action_id,
            arguments: wire.arguments,
        }
    }
}

impl From<ActionCall> for WireActionCall {
    fn from(call: ActionCall) -> Self {
        WireActionCall {
            action_id: call.action_id,
            arguments: call.arguments,
        }
    }
}
