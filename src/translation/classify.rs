/*!
 * Response classification.
 *
 * Every model call funnels through exactly one of the two functions here:
 * [`classify_response`] for text a provider returned, [`classify_error`]
 * for a call that failed. The resulting [`Verdict`] fully determines what
 * the orchestrator writes to disk and records in the progress store, so
 * the threshold policy lives in one place.
 */

use crate::app_config::ResidueThresholds;
use crate::errors::ProviderError;
use crate::progress_store::FailureKind;
use crate::text_utils::residue_ratio;

/// Outcome of a single translation attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// Output accepted as-is.
    Success { text: String },
    /// Output kept, but enough source characters survived that a cleanup
    /// pass must run before the shard counts as done.
    PartialResidue { text: String, ratio: f64 },
    /// Output dominated by untranslated source characters. Discarded.
    ExcessiveResidue { ratio: f64 },
    /// The attempt failed for a reason worth recording durably.
    Failed { kind: FailureKind, description: String },
    /// A quota or availability hiccup. Nothing is recorded; the shard is
    /// picked up again on the next pass.
    Transient { description: String },
}

/// Classify normalized output text by its untranslated-character ratio.
///
/// A cleanup pass uses a single stricter bound: at or below
/// `retry_success_max_pct` the cleaned text is accepted, above it the
/// shard fails for good. First passes grade on two bounds, with the band
/// between them kept as partial output for the cleanup pass.
pub fn classify_response(
    text: String,
    thresholds: &ResidueThresholds,
    residue_pass: bool,
) -> Verdict {
    let ratio = residue_ratio(&text);

    if residue_pass {
        if ratio <= thresholds.retry_success_max_pct {
            return Verdict::Success { text };
        }
        return Verdict::ExcessiveResidue { ratio };
    }

    if ratio <= thresholds.success_max_pct {
        Verdict::Success { text }
    } else if ratio <= thresholds.partial_max_pct {
        Verdict::PartialResidue { text, ratio }
    } else {
        Verdict::ExcessiveResidue { ratio }
    }
}

/// Classify a provider error. Transient failures (quota, availability,
/// timeouts) are never recorded; refusals map to their dedicated failure
/// kinds so they can be excluded from retries that would refuse again.
pub fn classify_error(err: &ProviderError) -> Verdict {
    if err.is_transient() {
        return Verdict::Transient {
            description: err.to_string(),
        };
    }

    let description = err.to_string().to_lowercase();
    let kind = match err {
        ProviderError::PromptBlocked(_) => FailureKind::from_description(&description),
        _ => FailureKind::Generic,
    };
    Verdict::Failed { kind, description }
}
