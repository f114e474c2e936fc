use proptest::prelude::*;
use sdk::envelope::{Action, RequestEnvelope, RequestPayload, ResponseEnvelope};

// The relay protocol requires camelCase keys and clean omission of unset
// optional fields; a stray null or snake_case key breaks foreign relays.
proptest! {
    #[test]
    fn test_request_wire_format_is_stable(
        model in "[a-z0-9.:-]{1,32}",
        prompt in "\\PC{0,200}",
        token in "[a-z0-9-]{1,48}",
        conversation in proptest::option::of("[a-z0-9-]{1,32}"),
    ) {
        let mut payload = RequestPayload::new(model, prompt);
        payload.conversation_id = conversation.clone();
        payload.is_initial = conversation.as_ref().map(|_| false);

        let mut envelope =
            RequestEnvelope::new(Action::Translate, payload, "http://localhost:11434");
        envelope.correlation_token = token;

        let json = serde_json::to_string(&envelope).unwrap();

        prop_assert!(json.contains("correlationToken"));
        prop_assert!(!json.contains("correlation_token"));
        if conversation.is_none() {
            prop_assert!(!json.contains("conversationId"));
            prop_assert!(!json.contains("isInitial"));
        }

        let back: RequestEnvelope = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, envelope);
    }
}

proptest! {
    // Whatever subset of fields a relay sends back, deserialization must not
    // fail; classification of incomplete responses happens upstream.
    #[test]
    fn test_sparse_responses_always_deserialize(
        token in "[a-z0-9-]{1,48}",
        text in proptest::option::of("\\PC{0,100}"),
        error in proptest::option::of("\\PC{0,100}"),
    ) {
        let mut body = serde_json::json!({ "correlationToken": token });
        if let Some(text) = &text {
            body["data"] = serde_json::json!({ "response": text });
        }
        if let Some(error) = &error {
            body["error"] = serde_json::json!(error);
        }

        let envelope: ResponseEnvelope = serde_json::from_value(body).unwrap();
        prop_assert_eq!(envelope.correlation_token, token);
        prop_assert_eq!(envelope.data.map(|d| d.response), text);
        prop_assert_eq!(envelope.error, error);
    }
}
