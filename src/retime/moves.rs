//! Lag → moves translation (§4.D, "Lag → moves").

use std::collections::HashMap;

use crate::aig::node::NodeKind;
use crate::arena::Id;
use crate::seq::SeqAig;

use super::search::SearchResult;

/// A single validated retiming step, in application order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    /// Move one latch forward past `n` (toward its fanouts).
    Forward(Id),
    /// Move one latch backward past `n` (toward its fanins).
    Backward(Id),
}

/// `lag(n)` for every internal (AND) node, derived from the L-values found
/// at the minimal feasible period (§4.D, "Lag from L").
pub fn lag_vector(seq: &SeqAig, result: &SearchResult) -> HashMap<Id, i64> {
    let mut lags = HashMap::new();
    for (id, node) in seq.aig().raw_nodes().iter() {
        if !node.is_and() {
            continue;
        }
        let l_n = *result.l_values.get(&id).unwrap_or(&0);
        lags.insert(id, super::lvalue::lag(l_n, result.period));
    }
    lags
}

/// Worklist translation of a lag vector into a concrete, legality-checked
/// sequence of try-moves (§4.D). Runs against a scratch clone of `seq` so
/// the original is left untouched; callers replay the returned sequence
/// through [`super::apply::apply_moves`] to get value-preserving semantics.
///
/// Termination: each successful step strictly decreases the sum of
/// outstanding residuals, so the loop cannot run longer than
/// `sum(|lag(n)|)` iterations. A full scan that performs no step despite
/// outstanding residual is a stall ("strange steps", §4.D) and is reported
/// via `tracing::warn!` with the residual left in place; the caller
/// receives the moves applied so far.
pub fn translate(seq: &SeqAig, result: &SearchResult) -> Vec<Move> {
    let lags = lag_vector(seq, result);
    let mut forward_residual: HashMap<Id, u32> = HashMap::new();
    let mut backward_residual: HashMap<Id, u32> = HashMap::new();
    for (&id, &lag) in &lags {
        if lag < 0 {
            forward_residual.insert(id, (-lag) as u32);
        } else if lag > 0 {
            backward_residual.insert(id, lag as u32);
        }
    }

    let mut scratch = seq.clone();
    let mut moves = Vec::new();

    loop {
        let mut progressed = false;

        let forward_ids: Vec<Id> = forward_residual
            .iter()
            .filter(|&(_, &r)| r > 0)
            .map(|(&id, _)| id)
            .collect();
        for id in forward_ids {
            let fanins = scratch.fanin_edges_of(id);
            if scratch.min_k(&fanins).unwrap_or(0) >= 1 && scratch.retime_try_forward(id).is_ok() {
                moves.push(Move::Forward(id));
                *forward_residual.get_mut(&id).unwrap() -= 1;
                progressed = true;
            }
        }

        let backward_ids: Vec<Id> = backward_residual
            .iter()
            .filter(|&(_, &r)| r > 0)
            .map(|(&id, _)| id)
            .collect();
        for id in backward_ids {
            let fanouts = scratch.fanout_edges_of(id);
            if scratch.min_k(&fanouts).unwrap_or(0) >= 1 && scratch.retime_try_backward(id).is_ok() {
                moves.push(Move::Backward(id));
                *backward_residual.get_mut(&id).unwrap() -= 1;
                progressed = true;
            }
        }

        let outstanding: u32 = forward_residual.values().sum::<u32>() + backward_residual.values().sum::<u32>();
        if outstanding == 0 {
            break;
        }
        if !progressed {
            tracing::warn!(
                outstanding,
                "retiming worklist stalled before exhausting residual (strange steps)"
            );
            break;
        }
    }

    moves
}

/// True iff `id` names a PO (used by `apply` to separate PO edges from
/// internal AND edges when rebuilding the init-reconstruction network).
pub(crate) fn is_po(seq: &SeqAig, id: Id) -> bool {
    matches!(seq.aig().node(id).kind, NodeKind::Po { .. })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::aig::Manager;
    use crate::retime::search::minimal_feasible_period;
    use crate::seq::SeqAig;

    #[test]
    fn four_stage_chain_lags_are_all_negative_one() {
        // Scenario 4 (§8).
        let mut m = Manager::new();
        let mut cur = m.create_pi();
        let mut ids = Vec::new();
        for _ in 0..3 {
            let next = m.create_pi();
            cur = m.make_and(cur, next);
            ids.push(crate::aig::var_of(cur));
        }
        let po = m.create_po(cur);
        let mut seq = SeqAig::new(m);
        for _ in 0..4 {
            seq.insert_first((po, 0), crate::seq::InitVal::Zero).unwrap();
        }
        let result = minimal_feasible_period(&seq);
        assert_eq!(result.period, 1);
        let lags = lag_vector(&seq, &result);
        for id in ids {
            assert_eq!(lags[&id], -1);
        }
    }

    #[test]
    fn translate_produces_only_forward_moves_for_negative_lags() {
        let mut m = Manager::new();
        let a = m.create_pi();
        let b = m.create_pi();
        let c = m.make_and(a, b);
        let po = m.create_po(c);
        let mut seq = SeqAig::new(m);
        for _ in 0..2 {
            seq.insert_first((po, 0), crate::seq::InitVal::Zero).unwrap();
        }
        let result = minimal_feasible_period(&seq);
        let moves = translate(&seq, &result);
        assert!(moves.iter().all(|m| matches!(m, Move::Forward(_))));
        assert!(!moves.is_empty());
    }
}
