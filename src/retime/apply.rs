//! Realizing a retiming: replay validated moves with value-preserving
//! semantics and reconstruct backward-retimed initial values via a derived
//! SAT instance (§4.D, "Implementing a retiming").

use std::collections::HashMap;

use crate::aig::{not, sign_of};
use crate::sat::{Lit as SatLit, SolveStatus, Solver};
use crate::seq::{EdgeKey, InitVal, SeqAig};

use super::moves::Move;

/// Outcome of [`apply_moves`]'s init-reconstruction phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStatus {
    /// Every symbolic init bit was resolved by the SAT core.
    Reconstructed,
    /// The reconstruction problem was UNSAT, timed out, or a top-level
    /// conflict occurred during construction; every symbolic init bit was
    /// demoted to `DC` instead (§7, "solver local conflict during
    /// construction").
    AllDc,
}

/// Apply a validated move sequence to `seq` in place.
///
/// Forward moves are real, value-preserving [`SeqAig::retime_forward_step`]
/// calls. Backward moves are applied as count-only
/// [`SeqAig::retime_try_backward`] calls while this function accumulates a
/// "problem network" (§4.D) tying each freshly inserted fanin latch's
/// unknown init bit to the known (or still-symbolic) head-init of the
/// fanout latch it replaced. The problem network reuses the SAT core's own
/// literal encoding directly -- each symbolic init bit is simply a fresh
/// SAT variable, and the AND relation between a node's two fanin inits and
/// its own prior value is Tseitin-encoded straight into clauses, since the
/// SAT core would immediately re-derive that CNF from an intermediate AIG
/// anyway. Once every move has been replayed, the accumulated problem is
/// solved once; a model assigns each symbolic init bit a concrete
/// `ZERO`/`ONE`, while UNSAT or no outstanding symbolic bits at all
/// collapses to [`InitStatus::AllDc`] / [`InitStatus::Reconstructed`]
/// respectively.
pub fn apply_moves(seq: &mut SeqAig, moves: &[Move]) -> InitStatus {
    let mut solver = Solver::new();
    // One companion literal per edge that has received a fresh NONE-valued
    // latch from a backward move (§4.C: "fanin inits of n are demoted to
    // symbolic NONE handles").
    let mut companions: HashMap<EdgeKey, SatLit> = HashMap::new();
    // (literal, required boolean) unit constraints from known fanout inits.
    let mut unit_constraints: Vec<(SatLit, bool)> = Vec::new();
    let mut pending_resolution: Vec<EdgeKey> = Vec::new();

    for &mv in moves {
        match mv {
            Move::Forward(id) => {
                seq.retime_forward_step(id)
                    .expect("forward move should remain legal when replayed in translate() order");
            }
            Move::Backward(id) => {
                let fanout_edges = seq.fanout_edges_of(id);
                // Snapshot what each fanout latch's head init (and, if
                // symbolic, its companion literal) was, before the tentative
                // move deletes it.
                let mut fanout_info = Vec::with_capacity(fanout_edges.len());
                for &e @ (consumer, slot) in &fanout_edges {
                    let inverted = sign_of(seq.fanin_literal(consumer, slot));
                    let head = seq.init_at(e, 0);
                    let companion = companions.remove(&e);
                    fanout_info.push((inverted, head, companion));
                }

                if seq.retime_try_backward(id).is_err() {
                    // A top-level conflict during construction: spec says
                    // abort backward retiming with all-DC (§7).
                    tracing::warn!(node = id, "backward move became illegal during replay; init reconstruction aborted to all-DC");
                    return InitStatus::AllDc;
                }

                let fanin_edges = seq.fanin_edges_of(id);
                let lits: Vec<SatLit> = fanin_edges
                    .iter()
                    .map(|&e| *companions.entry(e).or_insert_with(|| solver.new_var_lit()))
                    .collect();
                let b = tseitin_and(&mut solver, lits[0], lits[1]);

                for (inverted, head, companion) in fanout_info {
                    let b_signed = if inverted { not(b) } else { b };
                    match head {
                        Some(InitVal::Zero) => unit_constraints.push((b_signed, false)),
                        Some(InitVal::One) => unit_constraints.push((b_signed, true)),
                        Some(InitVal::Dc) | None => {}
                        Some(InitVal::Unknown) => {
                            if let Some(prev) = companion {
                                assert_equal(&mut solver, b_signed, prev);
                            }
                        }
                    }
                }
                pending_resolution.extend(fanin_edges);
            }
        }
    }

    if pending_resolution.is_empty() {
        return InitStatus::Reconstructed;
    }
    for (lit, required) in &unit_constraints {
        solver.add_clause(&[if *required { *lit } else { not(*lit) }]);
    }

    match solver.solve() {
        SolveStatus::Sat => {
            for edge in &pending_resolution {
                if let Some(&lit) = companions.get(edge) {
                    let value = solver.value(lit).unwrap_or(false);
                    set_resolved_init(seq, *edge, if value { InitVal::One } else { InitVal::Zero });
                }
            }
            InitStatus::Reconstructed
        }
        SolveStatus::Unsat | SolveStatus::Undecided => {
            tracing::warn!("init reconstruction SAT problem did not resolve; falling back to all-DC");
            for edge in &pending_resolution {
                set_resolved_init(seq, *edge, InitVal::Dc);
            }
            InitStatus::AllDc
        }
    }
}

/// Overwrite the head init of `edge` with a resolved concrete value,
/// replacing the `Unknown` placeholder [`SeqAig::retime_try_backward`] left
/// behind.
fn set_resolved_init(seq: &mut SeqAig, edge: EdgeKey, value: InitVal) {
    if seq.k(edge) == 0 {
        return;
    }
    let _ = seq.delete_first(edge);
    let _ = seq.insert_first(edge, value);
}

/// Tseitin-encode `c <-> (a AND b)`, returning `c`.
fn tseitin_and(solver: &mut Solver, a: SatLit, b: SatLit) -> SatLit {
    let c = solver.new_var_lit();
    solver.add_clause(&[not(a), not(b), c]);
    solver.add_clause(&[a, not(c)]);
    solver.add_clause(&[b, not(c)]);
    c
}

/// Assert `a <-> b`.
fn assert_equal(solver: &mut Solver, a: SatLit, b: SatLit) {
    solver.add_clause(&[not(a), b]);
    solver.add_clause(&[a, not(b)]);
}
