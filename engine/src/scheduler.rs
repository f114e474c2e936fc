//! Batch scheduler.
//!
//! Applies the strategy cascade to a list of text fragments using a fixed
//! pool of workers. Workers claim items from a shared atomic cursor, so each
//! item is processed exactly once; results land at the item's own index, so
//! out-of-order completion is harmless. Per-item failures are recorded as
//! sentinel strings and never stop the other workers.

use crate::cascade::{failure_sentinel, TranslationRequest, Translator};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info};

/// Runs many translations through a shared [`Translator`].
pub struct BatchScheduler {
    translator: Arc<Translator>,
    concurrency: usize,
    inter_item_delay: Duration,
}

impl BatchScheduler {
    /// Create a scheduler over the given translator.
    pub fn new(translator: Arc<Translator>, config: &crate::config::Config) -> Self {
        Self {
            translator,
            concurrency: config.batch.concurrency,
            inter_item_delay: config.inter_item_delay(),
        }
    }

    /// Translate every item, applying the same instructions to each.
    ///
    /// Completes only once every worker has exhausted the list. The returned
    /// vector is index-aligned with `items`; failed items carry the
    /// [`failure_sentinel`] for their text.
    pub async fn run(&self, items: Vec<String>, instructions: &str) -> Vec<String> {
        let total = items.len();
        if total == 0 {
            return Vec::new();
        }

        let items = Arc::new(items);
        let cursor = Arc::new(AtomicUsize::new(0));
        let results: Arc<Mutex<Vec<Option<String>>>> = Arc::new(Mutex::new(vec![None; total]));
        let workers = self.concurrency.min(total);

        info!("Translating {} items with {} workers", total, workers);

        let mut handles = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let items = Arc::clone(&items);
            let cursor = Arc::clone(&cursor);
            let results = Arc::clone(&results);
            let translator = Arc::clone(&self.translator);
            let instructions = instructions.to_string();
            let delay = self.inter_item_delay;

            handles.push(tokio::spawn(async move {
                loop {
                    // fetch_add hands each index to exactly one worker.
                    let index = cursor.fetch_add(1, Ordering::SeqCst);
                    if index >= total {
                        break;
                    }

                    debug!("Worker {} claimed item {}", worker_id, index);
                    let request = TranslationRequest::new(items[index].clone())
                        .with_instructions(instructions.clone());
                    let result = translator.translate(&request).await;

                    {
                        let mut results = results.lock().expect("results lock poisoned");
                        results[index] = Some(result);
                    }

                    tokio::time::sleep(delay).await;
                }
            }));
        }

        for handle in handles {
            // A panicked worker loses its in-flight item; the sentinel
            // fallback below keeps the output index-aligned.
            let _ = handle.await;
        }

        let mut results = results.lock().expect("results lock poisoned");
        results
            .drain(..)
            .enumerate()
            .map(|(index, slot)| slot.unwrap_or_else(|| failure_sentinel(&items[index])))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::strategy::{PromptStyle, StrategyDescriptor, STRICTEST_OPTIONS};
    use async_trait::async_trait;
    use sdk::envelope::{RequestEnvelope, ResponseEnvelope};
    use sdk::errors::ExchangeError;
    use sdk::relay::{Relay, ResponseSink};
    use std::time::Instant;

    /// Relay that uppercases the text after the minimal-prompt marker and
    /// tracks how many exchanges are in flight at once.
    struct UppercaseRelay {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        dispatches: AtomicUsize,
        fail_for: Option<&'static str>,
    }

    impl UppercaseRelay {
        fn new(fail_for: Option<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                dispatches: AtomicUsize::new(0),
                fail_for,
            })
        }
    }

    #[async_trait]
    impl Relay for UppercaseRelay {
        async fn dispatch(
            &self,
            envelope: RequestEnvelope,
            replies: ResponseSink,
        ) -> Result<(), ExchangeError> {
            self.dispatches.fetch_add(1, Ordering::SeqCst);
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);

            let text = envelope
                .payload
                .prompt
                .strip_prefix("Translate: ")
                .unwrap_or(&envelope.payload.prompt)
                .to_string();
            let failing = self.fail_for.map(|t| t == text).unwrap_or(false);
            let token = envelope.correlation_token;

            // Hold the exchange open briefly so concurrency is observable.
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let reply = if failing {
                ResponseEnvelope::failure(token, "backend down")
            } else {
                ResponseEnvelope::success(token, text.to_uppercase())
            };
            tokio::spawn(async move {
                let _ = replies.send(reply).await;
            });
            Ok(())
        }
    }

    /// Minimal-only ladder so each item costs exactly one exchange.
    fn minimal_ladder() -> Vec<StrategyDescriptor> {
        vec![StrategyDescriptor {
            name: "minimal",
            prompt: PromptStyle::Minimal,
            options: STRICTEST_OPTIONS,
            resets_conversation: false,
        }]
    }

    fn test_config(concurrency: usize, delay_ms: u64) -> Config {
        let mut config = Config::default();
        config.retry.max_retries = 0;
        config.retry.base_delay_ms = 1;
        config.backend.timeout_secs = 1;
        config.batch.concurrency = concurrency;
        config.batch.inter_item_delay_ms = delay_ms;
        config
    }

    fn scheduler(relay: Arc<UppercaseRelay>, config: &Config) -> BatchScheduler {
        let translator =
            Translator::new(relay as Arc<dyn Relay>, config).with_ladder(minimal_ladder());
        BatchScheduler::new(Arc::new(translator), config)
    }

    #[tokio::test]
    async fn test_all_items_processed_exactly_once_in_order() {
        let relay = UppercaseRelay::new(None);
        let config = test_config(3, 1);
        let scheduler = scheduler(Arc::clone(&relay), &config);

        let items: Vec<String> = (0..10).map(|i| format!("item-{}", i)).collect();
        let results = scheduler.run(items, "").await;

        assert_eq!(results.len(), 10);
        for (i, result) in results.iter().enumerate() {
            assert_eq!(result, &format!("ITEM-{}", i));
        }
        // One exchange per item: no double-processing.
        assert_eq!(relay.dispatches.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let relay = UppercaseRelay::new(None);
        let config = test_config(3, 1);
        let scheduler = scheduler(Arc::clone(&relay), &config);

        let items: Vec<String> = (0..10).map(|i| format!("item-{}", i)).collect();
        let _ = scheduler.run(items, "").await;

        let max = relay.max_in_flight.load(Ordering::SeqCst);
        assert!(max <= 3, "observed {} exchanges in flight", max);
        assert!(max >= 2, "workers never overlapped");
    }

    #[tokio::test]
    async fn test_item_failure_does_not_stop_the_batch() {
        let relay = UppercaseRelay::new(Some("item-2"));
        let config = test_config(2, 1);
        let scheduler = scheduler(Arc::clone(&relay), &config);

        let items: Vec<String> = (0..5).map(|i| format!("item-{}", i)).collect();
        let results = scheduler.run(items, "").await;

        assert_eq!(results[2], "[translation failed: item-2]");
        for i in [0usize, 1, 3, 4] {
            assert_eq!(results[i], format!("ITEM-{}", i));
        }
    }

    #[tokio::test]
    async fn test_inter_item_delay_paces_workers() {
        let relay = UppercaseRelay::new(None);
        let config = test_config(1, 40);
        let scheduler = scheduler(Arc::clone(&relay), &config);

        let start = Instant::now();
        let _ = scheduler
            .run(vec!["a".to_string(), "b".to_string(), "c".to_string()], "")
            .await;

        // One worker, three items, a pause after each.
        assert!(start.elapsed() >= Duration::from_millis(120));
    }

    #[tokio::test]
    async fn test_empty_batch_returns_empty() {
        let relay = UppercaseRelay::new(None);
        let config = test_config(3, 1);
        let scheduler = scheduler(Arc::clone(&relay), &config);

        let results = scheduler.run(Vec::new(), "").await;
        assert!(results.is_empty());
    }
}
