//! Reference HTTP relay.
//!
//! The engine core only speaks [`Relay`]; this adapter carries envelopes to
//! a text-generation backend over HTTP (an Ollama-style generate endpoint).
//! Each dispatch performs one POST of the envelope payload to the envelope's
//! URL and delivers exactly one response envelope — success, backend error,
//! or transport failure — back on the sink.

use async_trait::async_trait;
use reqwest::Client;
use sdk::envelope::{CloseNotice, RequestEnvelope, ResponseEnvelope};
use sdk::errors::ExchangeError;
use sdk::relay::{Relay, ResponseSink};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Backend reply to one generate call.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BackendResponse {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    conversation_id: Option<String>,
}

/// Relay that performs the outbound call over HTTP.
pub struct HttpRelay {
    client: Client,
    /// Endpoint for fire-and-forget conversation close notices
    close_url: String,
}

impl HttpRelay {
    /// Create a relay. `close_url` receives conversation close notices;
    /// regular dispatches go to each envelope's own URL.
    ///
    /// The client timeout is a generous transport bound; the engine's
    /// per-exchange deadline is enforced by the correlator.
    pub fn new(close_url: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .expect("Failed to create HTTP client"),
            close_url: close_url.into(),
        }
    }

    /// Perform the POST and shape the outcome into a response envelope.
    async fn exchange(client: &Client, envelope: &RequestEnvelope) -> ResponseEnvelope {
        let token = envelope.correlation_token.clone();

        let response = match client
            .post(&envelope.url)
            .json(&envelope.payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let message = if e.is_timeout() {
                    format!("backend timed out: {}", e)
                } else if e.is_connect() {
                    format!("cannot connect to backend at {}: {}", envelope.url, e)
                } else {
                    format!("network error: {}", e)
                };
                return ResponseEnvelope::failure(token, message);
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return ResponseEnvelope::failure(
                token,
                format!("backend error ({}): {}", status, body),
            );
        }

        let parsed: BackendResponse = match response.json().await {
            Ok(parsed) => parsed,
            Err(e) => {
                return ResponseEnvelope::failure(
                    token,
                    format!("failed to parse backend response: {}", e),
                )
            }
        };

        if let Some(message) = parsed.error {
            return ResponseEnvelope::failure(token, message);
        }
        match parsed.response {
            Some(text) => {
                let mut reply = ResponseEnvelope::success(token, text);
                reply.conversation_id = parsed.conversation_id;
                reply
            }
            // Neither field present: let the correlator classify it.
            None => ResponseEnvelope {
                correlation_token: token,
                data: None,
                error: None,
                conversation_id: parsed.conversation_id,
            },
        }
    }
}

#[async_trait]
impl Relay for HttpRelay {
    async fn dispatch(
        &self,
        envelope: RequestEnvelope,
        replies: ResponseSink,
    ) -> Result<(), ExchangeError> {
        debug!("POST {} ({})", envelope.url, envelope.correlation_token);
        let client = self.client.clone();
        tokio::spawn(async move {
            let reply = Self::exchange(&client, &envelope).await;
            // Send failure means the engine stopped listening; nothing to do.
            let _ = replies.send(reply).await;
        });
        Ok(())
    }

    async fn notify(&self, notice: CloseNotice) {
        debug!("Closing conversation {}", notice.conversation_id);
        let result = self.client.post(&self.close_url).json(&notice).send().await;
        if let Err(e) = result {
            warn!("Failed to deliver close notice: {}", e);
        }
    }
}
