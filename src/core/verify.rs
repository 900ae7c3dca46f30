//! Online Word Verification
//!
//! Asks an external dictionary whether a word exists before it is ingested.
//! The oracle may answer "still searching"; such answers are retried after a
//! settle delay, up to a bounded number of attempts.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::core::error::VerifyError;

/// Body text the dictionary returns for an unknown word.
pub const NOT_FOUND_TEXT: &str = "404: 유효하지 않은 단어입니다.";
/// Body text the dictionary returns while a lookup is still in flight.
pub const SEARCHING_TEXT: &str = "검색 중";

/// Oracle answer for a single lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Found,
    NotFound,
    /// Ambiguous; ask again later.
    Searching,
}

/// Map the dictionary's output text to a verdict.
pub fn classify_output(text: &str) -> Verdict {
    let text = text.trim();
    if text.is_empty() || text == NOT_FOUND_TEXT {
        Verdict::NotFound
    } else if text.contains(SEARCHING_TEXT) {
        Verdict::Searching
    } else {
        Verdict::Found
    }
}

/// External existence oracle.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WordVerifier: Send + Sync {
    async fn lookup(&self, word: &str) -> Result<Verdict, VerifyError>;
}

/// Retry bound and pacing for verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub settle_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            settle_delay: Duration::from_millis(1500),
        }
    }
}

/// Look `word` up until the oracle gives a definite answer.
///
/// Returns `Ok(true)` if the word exists, `Ok(false)` if it does not.
pub async fn verify_word(
    verifier: &dyn WordVerifier,
    word: &str,
    policy: RetryPolicy,
) -> Result<bool, VerifyError> {
    let attempts = policy.max_attempts.max(1);
    for attempt in 1..=attempts {
        match verifier.lookup(word).await? {
            Verdict::Found => return Ok(true),
            Verdict::NotFound => return Ok(false),
            Verdict::Searching => {
                debug!(word, attempt, "Dictionary still searching");
                if attempt < attempts && !policy.settle_delay.is_zero() {
                    tokio::time::sleep(policy.settle_delay).await;
                }
            }
        }
    }
    warn!(word, attempts, "Verification gave no definite answer");
    Err(VerifyError::Exhausted {
        word: word.to_string(),
        attempts,
    })
}

// ============================================================================
// HTTP Verifier
// ============================================================================

/// Verifier backed by an HTTP dictionary endpoint: `GET {base_url}/dict/{word}`.
pub struct HttpDictionaryVerifier {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDictionaryVerifier {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, VerifyError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url_for(&self, word: &str) -> String {
        format!("{}/dict/{}", self.base_url, urlencoding::encode(word))
    }
}

#[async_trait]
impl WordVerifier for HttpDictionaryVerifier {
    async fn lookup(&self, word: &str) -> Result<Verdict, VerifyError> {
        let response = self.client.get(self.url_for(word)).send().await?;
        let status = response.status();

        let verdict = if status == StatusCode::NOT_FOUND {
            Verdict::NotFound
        } else if status.is_success() {
            classify_output(&response.text().await?)
        } else {
            return Err(VerifyError::Transport(format!("dictionary returned {status}")));
        };

        debug!(word, ?verdict, "Dictionary lookup");
        Ok(verdict)
    }
}
