//! Request and response envelopes exchanged with the relay.
//!
//! The engine never opens a network connection itself. It builds a
//! [`RequestEnvelope`], hands it to a [`crate::relay::Relay`], and waits for
//! the one [`ResponseEnvelope`] carrying the same correlation token. Field
//! names are camelCase on the wire to match the relay protocol.

use serde::{Deserialize, Serialize};

/// The two request shapes understood by the relay.
///
/// Modeled as two variants of one envelope type rather than two independent
/// protocols; correlation is per-token, so mixing actions concurrently is
/// safe.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    /// Bare translation request
    Translate,
    /// Translation request whose prompt embeds surrounding context
    TranslateWithContext,
}

/// Sampling parameters forwarded to the text-generation backend.
///
/// Option keys stay snake_case on the wire; backends expect them that way.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f64,
    pub top_p: f64,
    pub max_tokens: u32,
}

/// Body of a request envelope: everything the backend needs to generate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RequestPayload {
    /// Backend model name
    pub model: String,

    /// The fully built prompt text
    pub prompt: String,

    /// Optional system prompt (sent on initial conversation turns)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// Always false; the engine consumes complete responses only
    pub stream: bool,

    /// Optional sampling parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<GenerationOptions>,

    /// Session id echoed on continuation turns
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,

    /// True when this exchange opens a new conversation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_initial: Option<bool>,
}

impl RequestPayload {
    /// Create a non-conversational payload with the given prompt.
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system_prompt: None,
            stream: false,
            options: None,
            conversation_id: None,
            is_initial: None,
        }
    }
}

/// One outbound request to the relay.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RequestEnvelope {
    pub action: Action,
    pub payload: RequestPayload,

    /// Backend endpoint the relay should call
    pub url: String,

    /// Unique token pairing this request with its response.
    /// Assigned by the correlator at send time; empty until then.
    pub correlation_token: String,
}

impl RequestEnvelope {
    /// Build an envelope without a correlation token. The correlator fills
    /// the token in when the envelope is actually sent.
    pub fn new(action: Action, payload: RequestPayload, url: impl Into<String>) -> Self {
        Self {
            action,
            payload,
            url: url.into(),
            correlation_token: String::new(),
        }
    }
}

/// Payload of a successful response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResponseData {
    pub response: String,
}

/// One inbound response from the relay, matched to its request by token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub correlation_token: String,

    /// Present on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,

    /// Present when the relay reports an explicit error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Session id assigned or echoed by the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

impl ResponseEnvelope {
    /// Build a successful response carrying the given text.
    pub fn success(token: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            correlation_token: token.into(),
            data: Some(ResponseData {
                response: response.into(),
            }),
            error: None,
            conversation_id: None,
        }
    }

    /// Build an error response with the relay's message.
    pub fn failure(token: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            correlation_token: token.into(),
            data: None,
            error: Some(message.into()),
            conversation_id: None,
        }
    }

    /// Attach a conversation id to this response.
    pub fn with_conversation(mut self, id: impl Into<String>) -> Self {
        self.conversation_id = Some(id.into());
        self
    }
}

/// Fire-and-forget notice asking the relay to close a conversation.
/// No response envelope is awaited for these.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CloseNotice {
    pub conversation_id: String,
    pub close_conversation: bool,
}

impl CloseNotice {
    /// Create a close notice for the given session id.
    pub fn new(conversation_id: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            close_conversation: true,
        }
    }
}
