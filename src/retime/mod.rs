//! §4.D Retiming core.
//!
//! Ties the L-value fixpoint, binary-search feasibility, lag→moves
//! translation, and move application together into one entry point.

pub mod apply;
pub mod lvalue;
pub mod moves;
pub mod search;

pub use apply::InitStatus;
pub use moves::Move;
pub use search::SearchResult;

use crate::seq::SeqAig;

/// Summary of a completed `retime()` call (§4.D, "retiming for minimum
/// clock period").
#[derive(Debug)]
pub struct RetimeSummary {
    /// The minimum feasible clock period found by binary search.
    pub period: i64,
    /// The validated move sequence that was replayed.
    pub moves: Vec<Move>,
    /// Whether backward-retimed initial values were fully reconstructed.
    pub init_status: InitStatus,
}

/// Retime `seq` in place for minimum clock period (§4.D end to end):
/// binary-search the feasible period, derive the lag vector, translate it
/// into a validated move sequence, then replay that sequence with
/// value-preserving forward steps and SAT-reconstructed backward steps.
pub fn retime(seq: &mut SeqAig) -> RetimeSummary {
    let result = search::minimal_feasible_period(seq);
    let move_seq = moves::translate(seq, &result);
    tracing::debug!(period = result.period, moves = move_seq.len(), "retiming plan computed");
    let init_status = apply::apply_moves(seq, &move_seq);
    RetimeSummary {
        period: result.period,
        moves: move_seq,
        init_status,
    }
}
