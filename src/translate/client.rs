//! Translation client adapter: rate limiting and bounded retries around a
//! [`Translator`].
//!
//! Calls are issued strictly sequentially, so a minimum inter-call delay is
//! enough to respect provider limits; no token bucket needed.

use crate::error::{Result, VidsubError};
use crate::translate::Translator;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Initial backoff before the first retry; doubles on each attempt.
const INITIAL_BACKOFF: Duration = Duration::from_millis(500);

/// Result of translating one batch. Fatal errors (bad credentials) are not an
/// outcome, they propagate as `Err` and abort the whole run.
#[derive(Debug)]
pub enum BatchOutcome {
    Translated(Vec<String>),
    /// Retries exhausted; the orchestrator falls back to original text.
    Failed { attempts: u32, reason: String },
}

pub struct TranslationClient {
    translator: Box<dyn Translator>,
    rate_limit_delay: Duration,
    max_retries: u32,
    last_call_end: Option<Instant>,
}

impl TranslationClient {
    pub fn new(
        translator: Box<dyn Translator>,
        rate_limit_delay: Duration,
        max_retries: u32,
    ) -> Self {
        Self {
            translator,
            rate_limit_delay,
            max_retries,
            last_call_end: None,
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.translator.name()
    }

    /// Translate one batch, enforcing the inter-call delay and retrying
    /// transient failures with doubling backoff. The response must have
    /// exactly as many entries as the request; a mismatch counts as a failed
    /// attempt. Never fabricates translations.
    pub async fn translate_batch(
        &mut self,
        texts: &[&str],
        target_language: &str,
    ) -> Result<BatchOutcome> {
        if texts.is_empty() {
            return Ok(BatchOutcome::Translated(vec![]));
        }

        let mut backoff = INITIAL_BACKOFF;
        let mut last_error = String::new();

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                debug!("Retry {attempt}/{} after {backoff:?}", self.max_retries);
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }

            self.wait_for_slot().await;
            let result = self.translator.translate_batch(texts, target_language).await;
            // The delay is measured from the end of the call, success or not.
            self.last_call_end = Some(Instant::now());

            match result {
                Ok(translations) if translations.len() == texts.len() => {
                    return Ok(BatchOutcome::Translated(translations));
                }
                Ok(translations) => {
                    last_error = format!(
                        "length mismatch: sent {}, received {}",
                        texts.len(),
                        translations.len()
                    );
                    warn!("Batch attempt {attempt} violated contract: {last_error}");
                }
                Err(e) if e.is_transient() => {
                    last_error = e.to_string();
                    warn!("Batch attempt {attempt} failed: {last_error}");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(BatchOutcome::Failed {
            attempts: self.max_retries + 1,
            reason: last_error,
        })
    }

    async fn wait_for_slot(&self) {
        if let Some(last_end) = self.last_call_end {
            let elapsed = last_end.elapsed();
            if elapsed < self.rate_limit_delay {
                tokio::time::sleep(self.rate_limit_delay - elapsed).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Scripted translator: each call pops the next canned result.
    struct ScriptedTranslator {
        calls: Arc<AtomicUsize>,
        script: Mutex<Vec<Result<Vec<String>>>>,
    }

    impl ScriptedTranslator {
        fn new(script: Vec<Result<Vec<String>>>) -> Self {
            Self {
                calls: Arc::new(AtomicUsize::new(0)),
                script: Mutex::new(script),
            }
        }
    }

    #[async_trait]
    impl Translator for ScriptedTranslator {
        async fn translate_batch(&self, texts: &[&str], _target: &str) -> Result<Vec<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut script = self.script.lock().unwrap();
            if script.is_empty() {
                return Ok(texts.iter().map(|t| format!("[x] {t}")).collect());
            }
            script.remove(0)
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    fn client(script: Vec<Result<Vec<String>>>, retries: u32) -> TranslationClient {
        TranslationClient::new(
            Box::new(ScriptedTranslator::new(script)),
            Duration::from_millis(1),
            retries,
        )
    }

    #[tokio::test]
    async fn test_success_first_try() {
        let mut client = client(vec![Ok(vec!["xin chào".to_string()])], 2);
        let outcome = client.translate_batch(&["hello"], "Vietnamese").await.unwrap();
        match outcome {
            BatchOutcome::Translated(t) => assert_eq!(t, vec!["xin chào"]),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_retries_transient_then_succeeds() {
        let mut client = client(
            vec![
                Err(VidsubError::Api("throttled".to_string())),
                Ok(vec!["ok".to_string()]),
            ],
            2,
        );
        let outcome = client.translate_batch(&["hi"], "Spanish").await.unwrap();
        assert!(matches!(outcome, BatchOutcome::Translated(_)));
    }

    #[tokio::test]
    async fn test_exhausted_retries_reports_failure() {
        let mut client = client(
            vec![
                Err(VidsubError::Api("boom 1".to_string())),
                Err(VidsubError::Api("boom 2".to_string())),
                Err(VidsubError::Api("boom 3".to_string())),
            ],
            2,
        );
        let outcome = client.translate_batch(&["hi"], "Spanish").await.unwrap();
        match outcome {
            BatchOutcome::Failed { attempts, reason } => {
                assert_eq!(attempts, 3);
                assert!(reason.contains("boom 3"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_length_mismatch_is_a_failed_attempt() {
        let mut client = client(
            vec![
                Ok(vec!["only one".to_string()]),
                Ok(vec!["a".to_string(), "b".to_string()]),
            ],
            1,
        );
        let outcome = client.translate_batch(&["x", "y"], "French").await.unwrap();
        match outcome {
            BatchOutcome::Translated(t) => assert_eq!(t.len(), 2),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_auth_failure_propagates_immediately() {
        let mut client = client(
            vec![
                Err(VidsubError::Auth("bad key".to_string())),
                Ok(vec!["never reached".to_string()]),
            ],
            3,
        );
        let result = client.translate_batch(&["hi"], "German").await;
        assert!(matches!(result, Err(VidsubError::Auth(_))));
    }

    #[tokio::test]
    async fn test_empty_batch_needs_no_call() {
        let translator = ScriptedTranslator::new(vec![]);
        let calls = translator.calls.clone();
        let mut client =
            TranslationClient::new(Box::new(translator), Duration::from_millis(1), 0);
        let outcome = client.translate_batch(&[], "Korean").await.unwrap();
        assert!(matches!(outcome, BatchOutcome::Translated(t) if t.is_empty()));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_enforces_minimum_delay_between_calls() {
        let mut client = TranslationClient::new(
            Box::new(ScriptedTranslator::new(vec![])),
            Duration::from_millis(50),
            0,
        );

        let start = Instant::now();
        client.translate_batch(&["a"], "Japanese").await.unwrap();
        client.translate_batch(&["b"], "Japanese").await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
