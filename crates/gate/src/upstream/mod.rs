// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Forwarding to the upstream chat API.

pub mod catalog;
pub mod client;
pub mod multipart;
pub mod request;
