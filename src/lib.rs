/*!
 * # yantwai - Yet Another Novel Translator with AI
 *
 * A Rust library for batch translation of book chapters using hosted
 * generative models.
 *
 * ## Features
 *
 * - Split chapters into bounded shards for prompt-sized work units
 * - Dispatch shards through three model tiers (primary, lite, pro)
 *   with per-model rate limiting
 * - Classify every result into success / partial / failure categories
 * - Persist crash-safe, resumable progress per book
 * - Retry failures through escalating strategies
 * - Reassemble finished chapters into one file per chapter
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `book`: Book directory layout and shard file access
 * - `sharding`: Chapter splitting into bounded shards
 * - `translation`: The batch translation engine:
 *   - `translation::orchestrator`: Phase loop and verdict handling
 *   - `translation::tasks`: Per-phase work planning
 *   - `translation::tiers`: Model tier registry
 *   - `translation::prompts`: Prompt templates and assembly
 *   - `translation::classify`: Residue thresholds and error taxonomy
 *   - `translation::postprocess`: Degenerate-output cleanup
 * - `progress_store`: Durable progress document
 * - `rate_limiter`: Per-model batch interval gate
 * - `combine`: Chapter reassembly from shard outputs
 * - `glossary`: Recurring-name harvest fed back into prompts
 * - `status`: Read-only per-chapter progress view
 * - `providers`: Client implementations for model APIs
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod book;
pub mod combine;
pub mod errors;
pub mod file_utils;
pub mod glossary;
pub mod progress_store;
pub mod providers;
pub mod rate_limiter;
pub mod sharding;
pub mod status;
pub mod text_utils;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use book::BookWorkspace;
pub use progress_store::ProgressStore;
pub use translation::{PromptStyle, RunOutcome, TranslationOrchestrator};
