//! Strategy cascade.
//!
//! The [`Translator`] turns one [`TranslationRequest`] into a string result:
//! cache first, then each strategy of the ladder strictly in order until one
//! yields an acceptable response. Exhaustion returns a sentinel embedding
//! the original text rather than an error, so batch callers never deal with
//! a throwing path. Accepted results are cached before being returned.

use crate::cache::TranslationCache;
use crate::classify::{cache_key, clean_response, is_refusal};
use crate::conversation::ConversationState;
use crate::correlate::Correlator;
use crate::retry::RetryExecutor;
use crate::strategy::{default_ladder, StrategyDescriptor};
use sdk::envelope::{RequestEnvelope, RequestPayload, ResponseEnvelope};
use sdk::relay::Relay;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// One translation request. Immutable once issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    /// Text fragment to translate
    pub text: String,
    /// Surrounding context, empty when absent
    pub context: String,
    /// Caller instructions (target language etc.), empty when absent
    pub instructions: String,
    /// Whether this request may use the shared conversation session
    pub allow_conversation: bool,
}

impl TranslationRequest {
    /// A bare request for the given text.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            context: String::new(),
            instructions: String::new(),
            allow_conversation: true,
        }
    }

    /// Attach surrounding context.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    /// Attach caller instructions.
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    /// Opt this request out of the shared conversation session.
    pub fn without_conversation(mut self) -> Self {
        self.allow_conversation = false;
        self
    }
}

/// Sentinel returned when every strategy has been rejected.
pub fn failure_sentinel(text: &str) -> String {
    format!("[translation failed: {}]", text)
}

/// True when a result string is the cascade-exhaustion sentinel.
pub fn is_failure_sentinel(result: &str) -> bool {
    result.starts_with("[translation failed: ") && result.ends_with(']')
}

/// Drives requests through the strategy ladder.
pub struct Translator {
    correlator: Correlator,
    retry: RetryExecutor,
    cache: TranslationCache,
    conversation: Arc<ConversationState>,
    strategies: Vec<StrategyDescriptor>,
    backend_url: String,
    model: String,
    system_prompt: String,
    conversation_mode: bool,
}

impl Translator {
    /// Create a translator with fresh cache and conversation state.
    pub fn new(relay: Arc<dyn Relay>, config: &crate::config::Config) -> Self {
        Self::with_state(
            relay,
            config,
            TranslationCache::new(),
            Arc::new(ConversationState::new()),
        )
    }

    /// Create a translator around externally owned cache and conversation
    /// state, so several translators (or tests) can share them.
    pub fn with_state(
        relay: Arc<dyn Relay>,
        config: &crate::config::Config,
        cache: TranslationCache,
        conversation: Arc<ConversationState>,
    ) -> Self {
        Self {
            correlator: Correlator::new(relay, config.exchange_deadline()),
            retry: RetryExecutor::new(config.retry.max_retries, config.backoff_base()),
            cache,
            conversation,
            strategies: default_ladder(config.translation.aggressive_fallbacks),
            backend_url: config.backend.url.clone(),
            model: config.backend.model.clone(),
            system_prompt: config.translation.system_prompt.clone(),
            conversation_mode: config.translation.conversation_mode,
        }
    }

    /// Replace the strategy ladder (test seam; the production ladder comes
    /// from [`default_ladder`]).
    pub fn with_ladder(mut self, strategies: Vec<StrategyDescriptor>) -> Self {
        self.strategies = strategies;
        self
    }

    /// The shared result cache.
    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    /// The shared conversation state.
    pub fn conversation(&self) -> &ConversationState {
        &self.conversation
    }

    /// Translate one request.
    ///
    /// Always returns a string: the cached or newly accepted translation,
    /// or the failure sentinel after cascade exhaustion. Failures are never
    /// cached.
    pub async fn translate(&self, request: &TranslationRequest) -> String {
        let key = cache_key(&request.text, &request.context, &request.instructions);
        if let Some(hit) = self.cache.get(&key) {
            debug!("Cache hit for {:?}", request.text);
            return hit;
        }

        for strategy in &self.strategies {
            let accepted = if strategy.is_conversational() {
                if !(request.allow_conversation && self.conversation_mode) {
                    continue;
                }
                self.attempt_conversational(strategy, request).await
            } else {
                if strategy.resets_conversation {
                    self.conversation
                        .reset(self.correlator.relay().as_ref())
                        .await;
                }
                self.attempt_direct(strategy, request).await
            };

            if let Some(result) = accepted {
                info!("Strategy '{}' accepted for {:?}", strategy.name, request.text);
                // First write wins if another worker raced us here.
                return self.cache.insert_if_absent(&key, result);
            }
        }

        error!("All strategies exhausted for {:?}", request.text);
        failure_sentinel(&request.text)
    }

    /// One direct (non-conversational) strategy attempt, retry-wrapped.
    async fn attempt_direct(
        &self,
        strategy: &StrategyDescriptor,
        request: &TranslationRequest,
    ) -> Option<String> {
        let prompt = strategy.build_prompt(&request.instructions, &request.text, &request.context);
        let action = strategy.action(&request.context);
        let build = || {
            let mut payload = RequestPayload::new(self.model.clone(), prompt.clone());
            payload.options = Some(strategy.options);
            RequestEnvelope::new(action, payload, self.backend_url.clone())
        };

        match self.retry.execute(&self.correlator, build).await {
            Ok(response) => self.evaluate(strategy.name, response),
            Err(e) => {
                warn!("Strategy '{}' failed: {}", strategy.name, e);
                None
            }
        }
    }

    /// The conversational strategy attempt. Holds the conversation turn for
    /// the whole exchange so concurrent workers cannot interleave session
    /// state; any failure or refusal resets the session before advancing.
    async fn attempt_conversational(
        &self,
        strategy: &StrategyDescriptor,
        request: &TranslationRequest,
    ) -> Option<String> {
        let mut turn = self.conversation.turn().await;
        let plan = turn.plan();

        let prompt = strategy.build_prompt(&request.instructions, &request.text, &request.context);
        let system_prompt = plan
            .is_initial
            .then(|| self.initial_system_prompt(&request.instructions));
        let build = || {
            let mut payload = RequestPayload::new(self.model.clone(), prompt.clone());
            payload.options = Some(strategy.options);
            payload.conversation_id = plan.conversation_id.clone();
            payload.is_initial = Some(plan.is_initial);
            payload.system_prompt = system_prompt.clone();
            RequestEnvelope::new(strategy.action(&request.context), payload, self.backend_url.clone())
        };

        match self.retry.execute(&self.correlator, build).await {
            Ok(response) => {
                let session_id = response.conversation_id.clone();
                match self.evaluate(strategy.name, response) {
                    Some(result) => {
                        if let Some(id) = session_id {
                            turn.activate(id);
                        }
                        Some(result)
                    }
                    None => {
                        // Refusal or unusable payload: the session may be
                        // poisoned, start over next time.
                        turn.reset(self.correlator.relay().as_ref()).await;
                        None
                    }
                }
            }
            Err(e) => {
                warn!("Strategy '{}' failed: {}", strategy.name, e);
                turn.reset(self.correlator.relay().as_ref()).await;
                None
            }
        }
    }

    /// System prompt for the first turn of a session: the engine-wide
    /// instructions plus whatever the request adds.
    fn initial_system_prompt(&self, instructions: &str) -> String {
        if instructions.is_empty() {
            self.system_prompt.clone()
        } else {
            format!("{}\n\n{}", self.system_prompt, instructions)
        }
    }

    /// Acceptance rule: raw non-empty AND cleaned non-empty AND not a
    /// refusal. Returns the cleaned text on acceptance.
    fn evaluate(&self, strategy_name: &str, response: ResponseEnvelope) -> Option<String> {
        let raw = response.data.map(|d| d.response).unwrap_or_default();
        if raw.is_empty() {
            debug!("Strategy '{}' returned an empty response", strategy_name);
            return None;
        }

        let cleaned = clean_response(&raw);
        if cleaned.is_empty() {
            debug!("Strategy '{}' cleaned down to nothing", strategy_name);
            return None;
        }
        if is_refusal(&cleaned) {
            info!("Strategy '{}' was refused, advancing", strategy_name);
            return None;
        }

        Some(cleaned)
    }
}
