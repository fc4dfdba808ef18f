//! Token estimation.
//!
//! The estimator is injected; the pipeline assumes nothing about it beyond
//! determinism per input. Large outlines are estimated from a line sample
//! and scaled by length ratio so repeated budget-search probes stay cheap.

/// Estimates the token count of a text. Implementations must be
/// deterministic for identical input.
pub trait TokenEstimator: Send + Sync {
    fn estimate(&self, text: &str) -> usize;
}

/// Naive bytes/4 estimator, good enough for budget trimming when no real
/// tokenizer is wired in.
#[derive(Debug, Default, Clone, Copy)]
pub struct CharEstimator;

impl TokenEstimator for CharEstimator {
    fn estimate(&self, text: &str) -> usize {
        text.len() / 4
    }
}

/// Inputs below this size skip sampling and hit the estimator directly.
const SAMPLING_THRESHOLD: usize = 200;

/// Estimate tokens, sampling every `len/100`-th line for large inputs and
/// scaling the sample estimate by the length ratio.
pub fn sampled_token_count(estimator: &dyn TokenEstimator, text: &str) -> f64 {
    if text.len() < SAMPLING_THRESHOLD {
        return estimator.estimate(text) as f64;
    }

    let lines: Vec<&str> = text.split_inclusive('\n').collect();
    let step = (lines.len() / 100).max(1);
    let sample: String = lines.iter().step_by(step).copied().collect();
    if sample.is_empty() {
        return 0.0;
    }

    let sample_tokens = estimator.estimate(&sample) as f64;
    let ratio = sample_tokens / sample.len() as f64;
    ratio * text.len() as f64
}
