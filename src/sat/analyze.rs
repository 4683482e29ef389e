//! First-UIP conflict analysis (§4.G, "Conflict analysis").
//!
//! A standard resolution walk over the trail: start from the conflicting
//! clause/binary, repeatedly resolve away the most-recently-assigned
//! literal at the current decision level until exactly one remains (the
//! UIP), then minimize the learned clause by dropping literals already
//! implied by others in it.

use super::{Conflict, Lit, Reason, Solver};
use crate::aig::{not, var_of};

fn reason_lits(solver: &Solver, conflict: &Conflict) -> Vec<Lit> {
    match conflict {
        Conflict::Binary(p, q) => vec![*p, *q],
        Conflict::Clause(cref) => solver.clauses.get(*cref).lits.clone(),
    }
}

/// Resolve the conflict down to a first-UIP clause, returning `(learnt,
/// backtrack_level)`. `learnt[0]` is the asserting (UIP) literal.
pub(crate) fn analyze(solver: &mut Solver, conflict: Conflict) -> (Vec<Lit>, u32) {
    let num_vars = solver.num_vars as usize;
    let mut seen = vec![false; num_vars + 1];
    let mut learnt: Vec<Lit> = vec![0]; // slot 0 reserved for the UIP literal
    let mut counter = 0u32;
    let mut p: Option<Lit> = None;
    let mut idx = solver.trail.len();
    let current_level = solver.trail_lim.len() as u32;

    let mut clause_lits = reason_lits(solver, &conflict);

    loop {
        for &q in clause_lits.iter().filter(|&&q| Some(q) != p.map(not)) {
            let v = var_of(q) as usize;
            if seen[v] {
                continue;
            }
            seen[v] = true;
            let lvl = solver.level[v];
            if lvl == 0 {
                continue;
            }
            if lvl >= current_level {
                counter += 1;
            } else {
                learnt.push(not(q));
            }
        }

        // Find the next seen variable walking backward through the trail.
        loop {
            idx -= 1;
            let lit = solver.trail[idx];
            if seen[var_of(lit) as usize] {
                break;
            }
        }
        let lit = solver.trail[idx];
        let v = var_of(lit) as usize;
        seen[v] = false;
        counter -= 1;
        if counter == 0 {
            p = Some(lit);
            break;
        }
        p = Some(lit);
        clause_lits = match solver.reason[v] {
            Reason::Binary(other) => vec![lit, other],
            Reason::Clause(cref) => solver.clauses.get(cref).lits.clone(),
            Reason::Decision | Reason::Unit => unreachable!("seen trail literal must have a reason"),
        };
    }

    learnt[0] = not(p.expect("first-UIP loop always terminates with a UIP literal"));
    minimize(solver, &mut learnt, &seen);

    let backtrack_level = if learnt.len() == 1 {
        0
    } else {
        let mut max_idx = 1;
        let mut max_level = solver.level[var_of(learnt[1]) as usize];
        for i in 2..learnt.len() {
            let lvl = solver.level[var_of(learnt[i]) as usize];
            if lvl > max_level {
                max_level = lvl;
                max_idx = i;
            }
        }
        learnt.swap(1, max_idx);
        max_level
    };
    (learnt, backtrack_level)
}

/// Drop literals from `learnt` whose assignment is already implied by the
/// rest of the clause (self-subsuming resolution against each literal's
/// reason clause), the "clause shrinking" of §4.G.
fn minimize(solver: &Solver, learnt: &mut Vec<Lit>, top_level_seen: &[bool]) {
    let mut seen = top_level_seen.to_vec();
    for &l in learnt.iter() {
        seen[var_of(l) as usize] = true;
    }
    let mut keep = vec![true; learnt.len()];
    for i in 1..learnt.len() {
        let v = var_of(learnt[i]) as usize;
        let redundant = match solver.reason[v] {
            Reason::Decision | Reason::Unit => false,
            Reason::Binary(other) => seen[var_of(other) as usize] && solver.level[v] != 0,
            Reason::Clause(cref) => solver
                .clauses
                .get(cref)
                .lits
                .iter()
                .skip(1)
                .all(|&q| seen[var_of(q) as usize]),
        };
        keep[i] = !redundant || solver.level[v] == 0;
    }
    let mut out = vec![learnt[0]];
    for i in 1..learnt.len() {
        if keep[i] {
            out.push(learnt[i]);
        }
    }
    *learnt = out;
}

/// Glue (LBD): number of distinct decision levels represented in `lits`,
/// used to tier the clause in the learned-clause database (§4.G).
pub(crate) fn glue_of(solver: &Solver, lits: &[Lit]) -> u32 {
    let mut levels: Vec<u32> = lits
        .iter()
        .map(|&l| solver.level[var_of(l) as usize])
        .collect();
    levels.sort_unstable();
    levels.dedup();
    levels.len() as u32
}
