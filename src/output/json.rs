//! JSON serialization for allocations.

use crate::result::Allocation;

/// Serialize an Allocation to a compact JSON string.
///
/// # Errors
///
/// Returns an error if serialization fails.
///
/// An infinite `se` (no gold labels affordable) is written as `null` and
/// reads back as infinity.
pub fn to_json(allocation: &Allocation) -> Result<String, serde_json::Error> {
    serde_json::to_string(allocation)
}

/// Serialize an Allocation to a pretty-printed JSON string.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json_pretty(allocation: &Allocation) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(allocation)
}
