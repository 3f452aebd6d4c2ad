/*!
 * Mock provider implementation for testing.
 *
 * Returns scripted responses without any network access, and tracks every
 * call so tests can assert on dispatch counts and prompt contents.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

use super::Provider;
use crate::errors::ProviderError;

/// Tracks calls made against a mock provider
#[derive(Debug, Default)]
pub struct CallTracker {
    /// Count of calls made
    pub call_count: usize,
    /// The most recent prompt received
    pub last_prompt: Option<String>,
}

/// Type of error to simulate
#[derive(Debug, Clone, Copy)]
pub enum MockErrorKind {
    /// Rate limit / server overload (transient)
    RateLimit,
    /// Per-call timeout (transient)
    Timeout,
    /// Prompt blocked as prohibited content
    Prohibited,
    /// Prompt blocked as copyrighted content
    Copyrighted,
    /// Generic API error
    Api,
}

impl MockErrorKind {
    fn into_error(self) -> ProviderError {
        match self {
            Self::RateLimit => ProviderError::RateLimitExceeded("429 too many requests".into()),
            Self::Timeout => ProviderError::Timeout(180),
            Self::Prohibited => ProviderError::PromptBlocked("prohibited content (SAFETY)".into()),
            Self::Copyrighted => {
                ProviderError::PromptBlocked("copyrighted content (recitation)".into())
            }
            Self::Api => ProviderError::ApiError {
                status_code: 400,
                message: "Bad request".into(),
            },
        }
    }
}

/// One scripted reply
#[derive(Debug, Clone)]
enum MockReply {
    Text(String),
    Error(MockErrorKind),
}

/// Default behavior once the scripted queue is drained
#[derive(Clone)]
enum DefaultReply {
    /// Echo the prompt body back (identity translation)
    Identity,
    /// Always return the same text
    Fixed(String),
    /// Apply a caller-supplied transformation to the prompt
    Handler(Arc<dyn Fn(&str) -> String + Send + Sync>),
}

impl std::fmt::Debug for DefaultReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Identity => write!(f, "Identity"),
            Self::Fixed(text) => write!(f, "Fixed({:?})", text),
            Self::Handler(_) => write!(f, "Handler(..)"),
        }
    }
}

/// Mock implementation of the Provider trait
#[derive(Debug)]
pub struct MockProvider {
    model: String,
    queue: Mutex<VecDeque<MockReply>>,
    default: DefaultReply,
    tracker: Arc<Mutex<CallTracker>>,
}

impl MockProvider {
    /// A mock that echoes the prompt back unchanged
    pub fn identity(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            queue: Mutex::new(VecDeque::new()),
            default: DefaultReply::Identity,
            tracker: Arc::new(Mutex::new(CallTracker::default())),
        }
    }

    /// A mock that always returns the given text
    pub fn returning(model: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            queue: Mutex::new(VecDeque::new()),
            default: DefaultReply::Fixed(text.into()),
            tracker: Arc::new(Mutex::new(CallTracker::default())),
        }
    }

    /// A mock that applies a transformation to every prompt
    pub fn with_handler(
        model: impl Into<String>,
        handler: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Self {
        Self {
            model: model.into(),
            queue: Mutex::new(VecDeque::new()),
            default: DefaultReply::Handler(Arc::new(handler)),
            tracker: Arc::new(Mutex::new(CallTracker::default())),
        }
    }

    /// Queue a scripted text reply, consumed before the default behavior
    pub fn push_text(&self, text: impl Into<String>) {
        self.queue.lock().push_back(MockReply::Text(text.into()));
    }

    /// Queue a scripted error reply
    pub fn push_error(&self, kind: MockErrorKind) {
        self.queue.lock().push_back(MockReply::Error(kind));
    }

    /// The call tracker for assertions
    pub fn tracker(&self) -> Arc<Mutex<CallTracker>> {
        self.tracker.clone()
    }

    /// Number of calls made so far
    pub fn call_count(&self) -> usize {
        self.tracker.lock().call_count
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        {
            let mut tracker = self.tracker.lock();
            tracker.call_count += 1;
            tracker.last_prompt = Some(prompt.to_string());
        }

        if let Some(reply) = self.queue.lock().pop_front() {
            return match reply {
                MockReply::Text(text) => Ok(text),
                MockReply::Error(kind) => Err(kind.into_error()),
            };
        }

        match &self.default {
            DefaultReply::Identity => Ok(prompt.to_string()),
            DefaultReply::Fixed(text) => Ok(text.clone()),
            DefaultReply::Handler(handler) => Ok(handler(prompt)),
        }
    }
}
