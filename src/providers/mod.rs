/*!
 * Provider implementations for generative model APIs.
 *
 * This module contains the client seam the translation tiers are built on:
 * - Gemini: Google generative language REST API
 * - Mock: scripted in-process provider for tests
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Common trait for all generative model providers.
///
/// Object-safe so the three tiers can share `Arc<dyn Provider>` instances
/// that differ only in configuration. Failures are classified here, at the
/// single boundary where the model call happens.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// The model identity this provider is configured for. Rate-limit
    /// buckets are keyed by this value.
    fn model_id(&self) -> &str;

    /// Generate a completion for a prompt
    ///
    /// # Arguments
    /// * `prompt` - The full prompt text to send
    ///
    /// # Returns
    /// * `Result<String, ProviderError>` - The completion text or a classified error
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}

pub mod gemini;
pub mod mock;
