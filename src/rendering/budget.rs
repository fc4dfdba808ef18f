//! Token-budget search over the ranked tag list.
//!
//! Binary search for the prefix length whose rendered outline best fits
//! the budget. The initial midpoint of 30 reflects the empirical knee of
//! the size curve; the 15% tolerance stops the search once an estimate is
//! close enough, saving render/estimate round trips.

use tracing::debug;

use super::context::{ContextRenderer, RenderOptions};
use super::tokens::{sampled_token_count, TokenEstimator};
use super::tree::to_tree;
use crate::cancel::CancelToken;
use crate::error::Result;
use crate::types::Tag;

/// Relative error under which a candidate is accepted outright.
const ERROR_TOLERANCE: f64 = 0.15;

/// Initial probe size; caps the first render when the budget is large.
const INITIAL_MIDPOINT: isize = 30;

/// Render the best-fitting prefix of `tags` for `budget` tokens.
///
/// Keeps the largest within-budget tree seen; accepts immediately when the
/// estimate lands within 15% of the budget. The token is checked once per
/// probe.
pub fn best_tree_for_budget(
    tags: &[Tag],
    budget: usize,
    estimator: &dyn TokenEstimator,
    renderer: &dyn ContextRenderer,
    options: &RenderOptions,
    cancel: &CancelToken,
) -> Result<String> {
    if tags.is_empty() || budget == 0 {
        return Ok(String::new());
    }

    let budget = budget as f64;
    let mut lower: isize = 0;
    let mut upper: isize = tags.len() as isize;
    let mut middle: isize = upper.min(INITIAL_MIDPOINT);

    let mut best_tree = String::new();
    let mut best_tokens = 0.0_f64;

    while lower <= upper {
        cancel.check()?;

        let tree = to_tree(&tags[..middle as usize], renderer, options);
        let num_tokens = sampled_token_count(estimator, &tree);

        let pct_err = (num_tokens - budget).abs() / budget;
        if (num_tokens <= budget && num_tokens > best_tokens) || pct_err < ERROR_TOLERANCE {
            best_tree = tree;
            best_tokens = num_tokens;
            if pct_err < ERROR_TOLERANCE {
                debug!(tags = middle, tokens = num_tokens, "budget search hit tolerance");
                break;
            }
        }

        if num_tokens < budget {
            lower = middle + 1;
        } else {
            upper = middle - 1;
        }
        middle = (lower + upper) / 2;
    }

    Ok(best_tree)
}
