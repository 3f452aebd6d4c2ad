/*!
 * Model tier registry.
 *
 * Three fixed tiers back the translation phases: a primary model for fresh
 * shards, a lite model for residue cleanup passes, and a pro model for
 * retries of previously failed shards. Each tier pairs a provider client
 * with the batch size its quota tolerates.
 */

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::app_config::Config;
use crate::providers::{gemini::Gemini, Provider};

/// Which of the three model tiers a batch is dispatched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierKind {
    /// First-pass translation of new shards.
    Primary,
    /// Cheap, high-throughput cleanup of partially translated shards.
    Lite,
    /// Stronger model used to retry shards that failed outright.
    Pro,
}

/// A provider client plus the dispatch width its rate limits tolerate.
#[derive(Debug, Clone)]
pub struct ModelTier {
    pub kind: TierKind,
    pub provider: Arc<dyn Provider>,
    pub batch_size: usize,
}

impl ModelTier {
    pub fn model_id(&self) -> &str {
        self.provider.model_id()
    }
}

/// Holds the three tiers and decides which one serves a given phase.
#[derive(Debug, Clone)]
pub struct ModelTierRegistry {
    primary: ModelTier,
    lite: ModelTier,
    pro: ModelTier,
}

impl ModelTierRegistry {
    /// Build Gemini-backed tiers from the application configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.api_key()?;
        let timeout = Duration::from_secs(config.request_timeout_secs);

        let client = |settings: &crate::app_config::ModelSettings| -> Arc<dyn Provider> {
            Arc::new(Gemini::new(settings, &api_key, &config.endpoint, timeout))
        };

        Ok(Self {
            primary: ModelTier {
                kind: TierKind::Primary,
                provider: client(&config.tiers.primary),
                batch_size: config.tiers.primary.batch_size,
            },
            lite: ModelTier {
                kind: TierKind::Lite,
                provider: client(&config.tiers.lite),
                batch_size: config.tiers.lite.batch_size,
            },
            pro: ModelTier {
                kind: TierKind::Pro,
                provider: client(&config.tiers.pro),
                batch_size: config.tiers.pro.batch_size,
            },
        })
    }

    /// Build a registry from pre-constructed providers. Used by tests to
    /// substitute scripted providers for the real API clients.
    pub fn with_providers(
        primary: (Arc<dyn Provider>, usize),
        lite: (Arc<dyn Provider>, usize),
        pro: (Arc<dyn Provider>, usize),
    ) -> Self {
        Self {
            primary: ModelTier {
                kind: TierKind::Primary,
                provider: primary.0,
                batch_size: primary.1,
            },
            lite: ModelTier {
                kind: TierKind::Lite,
                provider: lite.0,
                batch_size: lite.1,
            },
            pro: ModelTier {
                kind: TierKind::Pro,
                provider: pro.0,
                batch_size: pro.1,
            },
        }
    }

    /// Select the tier for a pass. Residue cleanup always goes to the lite
    /// tier; other retries go to the pro tier; fresh work to the primary.
    pub fn select(&self, is_retry: bool, is_residue_pass: bool) -> &ModelTier {
        if is_residue_pass {
            &self.lite
        } else if is_retry {
            &self.pro
        } else {
            &self.primary
        }
    }

}
