/*!
 * Translation engine: tier selection, prompt assembly, task planning,
 * verdict classification, output post-processing and the batch orchestrator.
 */

pub mod classify;
pub mod orchestrator;
pub mod postprocess;
pub mod prompts;
pub mod tasks;
pub mod tiers;

pub use classify::{classify_error, classify_response, Verdict};
pub use orchestrator::{CancellationToken, RunOutcome, TranslationOrchestrator};
pub use prompts::{PromptBuilder, PromptStyle};
pub use tasks::{TaskManager, TranslationTask};
pub use tiers::{ModelTier, ModelTierRegistry, TierKind};
