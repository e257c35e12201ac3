//! Token cost estimation for agent budgeting.
//!
//! Uses the common ~4 characters per token approximation. A manual
//! `token_cost` in document metadata always wins over this estimate.

/// Default characters per token.
pub const DEFAULT_CHARS_PER_TOKEN: usize = 4;

/// Estimate the token count of `text` as `ceil(chars / chars_per_token)`.
///
/// Returns `0` for empty text or a zero divisor.
pub fn estimate_token_cost(text: &str, chars_per_token: usize) -> u64 {
    if text.is_empty() || chars_per_token == 0 {
        return 0;
    }
    let len = text.chars().count();
    len.div_ceil(chars_per_token) as u64
}
