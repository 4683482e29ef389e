//! Glue-tiered learned-clause management (§4.G, "Clause database reduction").
//!
//! Learned clauses are conceptually bucketed into four tiers by glue: core
//! (never removed), tier1/tier2 (removed by periodic sweeps once stale),
//! tier3 (removed aggressively). The tier boundaries are recomputed
//! periodically from the observed glue distribution rather than fixed, so a
//! run dominated by low-glue conflicts doesn't starve its own core tier.

use super::Solver;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Tier {
    Core,
    Tier1,
    Tier2,
    Tier3,
}

fn tier_of(glue: u32, tier1_glue: u32, tier2_glue: u32) -> Tier {
    if glue <= 2 {
        Tier::Core
    } else if glue <= tier1_glue {
        Tier::Tier1
    } else if glue <= tier2_glue {
        Tier::Tier2
    } else {
        Tier::Tier3
    }
}

/// Recompute `tier1_glue`/`tier2_glue` from the current glue quantiles of
/// live redundant clauses (§4.G: "periodic threshold recomputation from
/// observed glue quantiles").
pub(crate) fn recompute_tiers(solver: &mut Solver) {
    let mut glues: Vec<u32> = solver
        .clauses
        .iter()
        .filter(|(_, c)| c.redundant && !c.garbage)
        .map(|(_, c)| c.glue)
        .collect();
    if glues.is_empty() {
        return;
    }
    glues.sort_unstable();
    let q50 = glues[glues.len() / 2];
    let q85 = glues[(glues.len() * 85 / 100).min(glues.len() - 1)];
    solver.tier1_glue = q50.max(3);
    solver.tier2_glue = q85.max(solver.tier1_glue + 1);
}

/// Sweep the clause database, marking tier2/tier3 clauses with low recent
/// `used` counts as garbage and detaching their watches. Core and tier1
/// clauses, and any clause currently serving as an assignment's reason, are
/// never removed (§4.G: "a clause currently serving as a reason is locked").
pub(crate) fn reduce(solver: &mut Solver) {
    let locked: std::collections::HashSet<_> = solver
        .reason
        .iter()
        .filter_map(|r| match r {
            super::Reason::Clause(cref) => Some(*cref),
            _ => None,
        })
        .collect();

    let (tier1_glue, tier2_glue) = (solver.tier1_glue, solver.tier2_glue);
    let mut to_remove = Vec::new();
    for (id, clause) in solver.clauses.iter() {
        if clause.garbage || !clause.redundant || clause.lits.len() <= 2 {
            continue;
        }
        if locked.contains(&id) {
            continue;
        }
        let tier = tier_of(clause.glue, tier1_glue, tier2_glue);
        let should_remove = match tier {
            Tier::Core | Tier::Tier1 => false,
            Tier::Tier2 => clause.used == 0,
            Tier::Tier3 => true,
        };
        if should_remove {
            to_remove.push(id);
        }
    }
    for id in to_remove {
        remove_clause(solver, id);
    }
    for (_, clause) in solver.clauses.iter_mut() {
        clause.used = clause.used.saturating_sub(1);
    }
}

fn remove_clause(solver: &mut Solver, id: super::ClauseRef) {
    let lits = solver.clauses.get(id).lits.clone();
    solver.clauses.get_mut(id).garbage = true;
    for w in &mut solver.watches_large {
        w.retain(|&(_, cref)| cref != id);
    }
    let _ = lits;
}

#[cfg(test)]
mod test {
    use super::super::{Clause, Solver};
    use super::*;

    #[test]
    fn tiers_are_monotone_in_glue() {
        let t = |g| tier_of(g, 4, 10);
        assert!(t(1) <= t(3));
        assert!(t(3) <= t(6));
        assert!(t(6) <= t(20));
    }

    #[test]
    fn reduce_never_removes_locked_reason_clauses() {
        let mut s = Solver::new();
        let a = s.new_var_lit();
        let b = s.new_var_lit();
        let c = s.new_var_lit();
        let cref = s.clauses.new_object(Clause::new(vec![a, b, c], true, 50));
        s.reason[crate::aig::var_of(a) as usize] = super::super::Reason::Clause(cref);
        s.tier2_glue = 10;
        reduce(&mut s);
        assert!(!s.clauses.get(cref).garbage);
    }
}
