//! Internal helpers for presence checks.
//!
//! These utilities are **not** part of the public API.

/// Trimmed value, or `None` when nothing is left.
pub(crate) fn required(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
