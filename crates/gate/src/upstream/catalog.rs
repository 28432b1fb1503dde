// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Models, tools, and chat styles the upstream is known to accept.
//!
//! Requests are not validated against these lists; they are advertised on
//! `/status` and `/info` so clients can pick sensible values.

pub const MODELS: &[&str] = &["standard", "online", "math", "genius"];

pub const TOOLS: &[&str] = &["image_generator", "image_editor"];

pub const CHAT_STYLES: &[&str] = &["chat", "ai-code", "free-chatgpt"];

pub const FEATURES: &[&str] = &[
    "chat",
    "single-message",
    "conversation-continue",
    "cookie-refresh",
    "api-key-extraction",
    "plain-text-fallback",
];
