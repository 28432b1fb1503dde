// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use proptest::prelude::*;

use super::*;

#[test]
fn empty_history_yields_single_user_turn() -> anyhow::Result<()> {
    let req = OutboundRequest::build("hello there", &[], &ChatOptions::default());
    let history = req.history().ok_or_else(|| anyhow::anyhow!("missing chatHistory"))?;
    assert_eq!(history, vec![ChatTurn::user("hello there")]);
    Ok(())
}

#[test]
fn fields_use_defaults_in_fixed_order() {
    let req = OutboundRequest::build("hi", &[], &ChatOptions::default());
    let names: Vec<&str> = req.fields.keys().map(String::as_str).collect();
    assert_eq!(names, ["chat_style", "chatHistory", "model", "enabled_tools"]);
    assert_eq!(req.fields["chat_style"], FieldValue::Text("chat".to_owned()));
    assert_eq!(req.fields["model"], FieldValue::Text("standard".to_owned()));
    assert_eq!(req.fields["enabled_tools"], FieldValue::Json(serde_json::json!([])));
}

#[test]
fn options_override_defaults() {
    let options = ChatOptions {
        model: Some("online".to_owned()),
        chat_style: Some("ai-code".to_owned()),
        enabled_tools: Some(vec!["image_generator".to_owned()]),
    };
    let req = OutboundRequest::build("hi", &[], &options);
    assert_eq!(req.fields["model"], FieldValue::Text("online".to_owned()));
    assert_eq!(req.fields["chat_style"], FieldValue::Text("ai-code".to_owned()));
    assert_eq!(req.fields["enabled_tools"].render(), r#"["image_generator"]"#);
}

#[test]
fn chat_history_renders_as_role_content_objects() {
    let history = [ChatTurn::user("a"), ChatTurn::assistant("b")];
    let req = OutboundRequest::build("c", &history, &ChatOptions::default());
    assert_eq!(
        req.fields["chatHistory"].render(),
        r#"[{"role":"user","content":"a"},{"role":"assistant","content":"b"},{"role":"user","content":"c"}]"#
    );
}

#[test]
fn options_deserialize_from_camel_case() -> anyhow::Result<()> {
    let options: ChatOptions = serde_json::from_str(
        r#"{"model":"math","chatStyle":"chat","enabledTools":["image_editor"]}"#,
    )?;
    assert_eq!(options.model.as_deref(), Some("math"));
    assert_eq!(options.chat_style.as_deref(), Some("chat"));
    assert_eq!(options.enabled_tools, Some(vec!["image_editor".to_owned()]));
    Ok(())
}

fn arb_turn() -> impl Strategy<Value = ChatTurn> {
    (any::<bool>(), ".{0,40}").prop_map(|(is_user, content)| {
        if is_user {
            ChatTurn::user(content)
        } else {
            ChatTurn::assistant(content)
        }
    })
}

proptest! {
    #[test]
    fn history_is_input_plus_one_user_turn(
        history in proptest::collection::vec(arb_turn(), 0..12),
        message in ".{1,40}",
    ) {
        let before = history.clone();
        let req = OutboundRequest::build(&message, &history, &ChatOptions::default());

        prop_assert_eq!(&history, &before);

        let sent = req.history().unwrap_or_default();
        prop_assert_eq!(sent.len(), history.len() + 1);
        prop_assert_eq!(&sent[..history.len()], &history[..]);
        prop_assert_eq!(&sent[history.len()], &ChatTurn::user(message.clone()));
    }
}
