// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `multipart/form-data` encoding of an [`OutboundRequest`].

use reqwest::multipart::{Form, Part};

use crate::upstream::request::OutboundRequest;

/// One text part per field, in field order. reqwest picks a fresh random
/// boundary for every form.
pub fn to_form(req: &OutboundRequest) -> Form {
    req.fields
        .iter()
        .fold(Form::new(), |form, (name, value)| form.part(name.clone(), Part::text(value.render())))
}

#[cfg(test)]
#[path = "multipart_tests.rs"]
mod tests;
