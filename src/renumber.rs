//! Shared sequential ID assignment over the two merged collections.
//!
//! By the time renumbering runs, the two output collections are positionally
//! aligned: index *i* in each refers to the same logical finding. A length
//! mismatch means an upstream invariant broke and the run must stop.

use tracing::{debug, info};

use crate::error::ReconcileError;
use crate::model::Finding;

/// Assign `start_id, start_id + 1, …` to both collections in lockstep, so
/// each logical finding carries the same ID on both sides.
///
/// # Errors
/// Returns [`ReconcileError::LengthMismatch`] when the collections are not
/// the same length.
pub fn renumber(
    left: &mut [Finding],
    right: &mut [Finding],
    start_id: i64,
) -> Result<(), ReconcileError> {
    if left.len() != right.len() {
        return Err(ReconcileError::LengthMismatch {
            left: left.len(),
            right: right.len(),
        });
    }

    for (offset, (left_out, right_out)) in left.iter_mut().zip(right.iter_mut()).enumerate() {
        let id = start_id + offset as i64;
        debug!(
            id,
            was_left = left_out.id,
            was_right = right_out.id,
            "renumbered pair"
        );
        left_out.id = id;
        right_out.id = id;
    }

    info!(records = left.len(), start_id, "renumbering complete");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
