// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outbound chat request: conversation turns and the multipart field set.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CHAT_STYLE: &str = "chat";
pub const DEFAULT_MODEL: &str = "standard";

/// Speaker of a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Caller-selectable model and tool options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled_tools: Option<Vec<String>>,
}

/// Value of one multipart field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Json(serde_json::Value),
}

impl FieldValue {
    /// Wire form of the field body.
    pub fn render(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Json(v) => v.to_string(),
        }
    }
}

/// Ordered form fields for one upstream call. Built fresh per call.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    pub fields: IndexMap<String, FieldValue>,
}

impl OutboundRequest {
    /// Build the request for `message` following `history`.
    ///
    /// `history` is copied; the new user turn is appended to the copy only.
    pub fn build(message: &str, history: &[ChatTurn], options: &ChatOptions) -> Self {
        let mut turns = Vec::with_capacity(history.len() + 1);
        turns.extend_from_slice(history);
        turns.push(ChatTurn::user(message));

        let chat_style = options.chat_style.as_deref().unwrap_or(DEFAULT_CHAT_STYLE);
        let model = options.model.as_deref().unwrap_or(DEFAULT_MODEL);
        let tools = options.enabled_tools.clone().unwrap_or_default();

        let mut fields = IndexMap::new();
        fields.insert("chat_style".to_owned(), FieldValue::Text(chat_style.to_owned()));
        fields.insert(
            "chatHistory".to_owned(),
            FieldValue::Json(serde_json::to_value(&turns).unwrap_or_default()),
        );
        fields.insert("model".to_owned(), FieldValue::Text(model.to_owned()));
        fields.insert("enabled_tools".to_owned(), FieldValue::Json(serde_json::json!(tools)));

        Self { fields }
    }

    /// The conversation carried in `chatHistory`, if well formed.
    pub fn history(&self) -> Option<Vec<ChatTurn>> {
        match self.fields.get("chatHistory")? {
            FieldValue::Json(v) => serde_json::from_value(v.clone()).ok(),
            FieldValue::Text(s) => serde_json::from_str(s).ok(),
        }
    }
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
