//! §4.G CDCL SAT core.
//!
//! Literal encoding is deliberately identical to [`crate::aig::Lit`]
//! (`2*var + sign`, §4.G: "A literal is `2·var + sign`"), so the two layers
//! share `not`/`var_of`/`sign_of`/`mk_lit`. Variable `0` is reserved exactly
//! as [`crate::aig::CONST0_LIT`]'s variable is -- the solver never allocates
//! it as a real decision variable.

pub mod analyze;
pub mod clause;
pub mod db;
pub mod heuristic;
pub mod restart;
pub mod transitive;

use std::collections::VecDeque;

use crate::aig::{mk_lit, not, var_of};
use crate::arena::{Arena, Id};
use crate::consts::{DEFAULT_GLUE_TIER1, DEFAULT_GLUE_TIER2, TIER_RECOMPUTE_PERIOD};

pub use clause::{Clause, ClauseRef};
pub use heuristic::VarHeap;
pub use restart::PhaseTracker;

/// A SAT literal: `2*var + sign`, shared with [`crate::aig::Lit`].
pub type Lit = crate::aig::Lit;
/// A SAT variable id.
pub type Var = Id;

/// Outcome of a [`Solver::solve`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    Sat,
    Unsat,
    /// The conflict/tick/wall-clock budget was exhausted before a verdict
    /// was reached (§7: "not an error").
    Undecided,
}

/// Why a variable holds its current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    Decision,
    Unit,
    Binary(Lit),
    Clause(ClauseRef),
}

pub(crate) enum Conflict {
    Binary(Lit, Lit),
    Clause(ClauseRef),
}

/// Optional resource budget for one `solve()` call (§5, "conflict budget
/// and wall-clock deadline... polled synchronously").
#[derive(Debug, Clone, Copy)]
pub struct Budget {
    pub max_conflicts: Option<u64>,
}

impl Default for Budget {
    fn default() -> Self {
        Budget { max_conflicts: None }
    }
}

/// The CDCL solver (§3, "SAT manager").
pub struct Solver {
    pub(crate) num_vars: u32,
    pub(crate) clauses: Arena<Clause>,

    pub(crate) value: Vec<i8>,
    pub(crate) level: Vec<u32>,
    pub(crate) reason: Vec<Reason>,
    pub(crate) trail: Vec<Lit>,
    pub(crate) trail_lim: Vec<usize>,
    pub(crate) qhead: usize,

    pub(crate) watches_bin: Vec<Vec<Lit>>,
    pub(crate) watches_large: Vec<Vec<(Lit, ClauseRef)>>,

    pub(crate) activity: Vec<f64>,
    pub(crate) var_inc: f64,
    pub(crate) heap: VarHeap,
    pub(crate) queue: VecDeque<Var>,
    pub(crate) stable: bool,
    pub(crate) phases: PhaseTracker,

    pub(crate) conflicts: u64,
    pub(crate) conflicts_since_flip: u64,
    pub(crate) restart_count: u64,
    pub(crate) conflicts_since_tier_recompute: u64,
    pub(crate) tier1_glue: u32,
    pub(crate) tier2_glue: u32,

    /// Units fixed at decision level 0, kept across future incremental
    /// `add_clause` calls (§4.G, "externally exported units").
    pub(crate) exported_units: Vec<Lit>,
    pub(crate) inconsistent: bool,

    pub(crate) budget: Budget,
}

impl Default for Solver {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver {
    pub fn new() -> Self {
        let mut clauses = Arena::new();
        // Reserve id 0 the same way the AIG arena reserves CONST0; no
        // clause ever lives there.
        let _ = clauses.new_object(Clause::new(vec![], false, 0));
        Solver {
            num_vars: 0,
            clauses,
            value: vec![0],
            level: vec![0],
            reason: vec![Reason::Decision],
            trail: Vec::new(),
            trail_lim: Vec::new(),
            qhead: 0,
            watches_bin: vec![Vec::new(), Vec::new()],
            watches_large: vec![Vec::new(), Vec::new()],
            activity: vec![0.0],
            var_inc: 1.0,
            heap: VarHeap::new(),
            queue: VecDeque::new(),
            stable: true,
            phases: PhaseTracker::default(),
            conflicts: 0,
            conflicts_since_flip: 0,
            restart_count: 0,
            conflicts_since_tier_recompute: 0,
            tier1_glue: DEFAULT_GLUE_TIER1,
            tier2_glue: DEFAULT_GLUE_TIER2,
            exported_units: Vec::new(),
            inconsistent: false,
            budget: Budget::default(),
        }
    }

    pub fn with_budget(budget: Budget) -> Self {
        let mut s = Self::new();
        s.budget = budget;
        s
    }

    /// Allocate a fresh variable.
    pub fn new_var(&mut self) -> Var {
        self.num_vars += 1;
        let v = self.num_vars;
        self.value.push(0);
        self.level.push(0);
        self.reason.push(Reason::Decision);
        self.activity.push(0.0);
        self.watches_bin.push(Vec::new());
        self.watches_bin.push(Vec::new());
        self.watches_large.push(Vec::new());
        self.watches_large.push(Vec::new());
        self.phases.ensure_capacity(v as usize);
        self.heap.insert(v, &self.activity);
        self.queue.push_back(v);
        v
    }

    /// Allocate a fresh variable and return its non-inverted literal,
    /// mirroring [`crate::aig::Manager::create_pi`].
    pub fn new_var_lit(&mut self) -> Lit {
        mk_lit(self.new_var(), false)
    }

    fn decision_level(&self) -> u32 {
        self.trail_lim.len() as u32
    }

    fn value_of(&self, lit: Lit) -> i8 {
        let v = self.value[var_of(lit) as usize];
        if crate::aig::sign_of(lit) {
            -v
        } else {
            v
        }
    }

    /// Add a clause over the solver's literal encoding. Unit and empty
    /// clauses are handled immediately; empty clause sets `inconsistent`
    /// (§7, "Root-level empty clauses set the `inconsistent` flag").
    pub fn add_clause(&mut self, lits: &[Lit]) {
        if self.inconsistent {
            return;
        }
        let mut lits: Vec<Lit> = lits.to_vec();
        lits.sort_unstable();
        lits.dedup();
        // tautology check a OR NOT a
        for w in lits.windows(2) {
            if w[0] == not(w[1]) {
                return;
            }
        }
        match lits.len() {
            0 => {
                self.inconsistent = true;
            }
            1 => {
                self.enqueue_root_unit(lits[0]);
            }
            2 => {
                self.watches_bin[not(lits[0]) as usize].push(lits[1]);
                self.watches_bin[not(lits[1]) as usize].push(lits[0]);
                let clause_ref = self.clauses.new_object(Clause::new(lits, false, 0));
                let _ = clause_ref;
            }
            _ => {
                let c = Clause::new(lits.clone(), false, 0);
                let cref = self.clauses.new_object(c);
                self.watches_large[not(lits[0]) as usize].push((lits[1], cref));
                self.watches_large[not(lits[1]) as usize].push((lits[0], cref));
            }
        }
    }

    fn enqueue_root_unit(&mut self, lit: Lit) {
        let cur = self.value_of(lit);
        if cur > 0 {
            return;
        }
        if cur < 0 {
            self.inconsistent = true;
            return;
        }
        self.exported_units.push(lit);
        self.assign(lit, Reason::Unit, 0);
    }

    fn assign(&mut self, lit: Lit, reason: Reason, level: u32) {
        let v = var_of(lit);
        self.value[v as usize] = if crate::aig::sign_of(lit) { -1 } else { 1 };
        self.level[v as usize] = level;
        self.reason[v as usize] = reason;
        self.trail.push(lit);
    }

    /// Unit propagation (§4.G, "Propagation"): walk the watch lists of
    /// `NOT(l)` for every newly assigned `l`. Returns the conflicting
    /// clause/binary on failure.
    fn propagate(&mut self) -> Option<Conflict> {
        while self.qhead < self.trail.len() {
            let p = self.trail[self.qhead];
            self.qhead += 1;
            let np = not(p);

            let bins = self.watches_bin[np as usize].clone();
            for other in bins {
                let val = self.value_of(other);
                if val > 0 {
                    continue;
                }
                if val < 0 {
                    return Some(Conflict::Binary(np, other));
                }
                let lvl = self.decision_level();
                self.assign(other, Reason::Binary(np), lvl);
            }

            let watch_list = std::mem::take(&mut self.watches_large[np as usize]);
            let mut kept = Vec::with_capacity(watch_list.len());
            let mut conflict = None;
            'watches: for (blocking, cref) in watch_list {
                if conflict.is_some() {
                    kept.push((blocking, cref));
                    continue;
                }
                if self.value_of(blocking) > 0 {
                    kept.push((blocking, cref));
                    continue;
                }
                let clause = self.clauses.get(cref).clone();
                if clause.garbage {
                    continue;
                }
                let lits = clause.lits.clone();
                // Ensure np occupies lits[1] for the search below.
                let mut lits = lits;
                if lits[0] == np {
                    lits.swap(0, 1);
                }
                debug_assert_eq!(lits[1], np);
                if self.value_of(lits[0]) > 0 {
                    kept.push((lits[0], cref));
                    self.clauses.get_mut(cref).lits = lits;
                    continue;
                }
                let mut found = false;
                for k in 2..lits.len() {
                    if self.value_of(lits[k]) != -1 {
                        lits.swap(1, k);
                        found = true;
                        break;
                    }
                }
                if found {
                    self.watches_large[not(lits[1]) as usize].push((lits[0], cref));
                    self.clauses.get_mut(cref).lits = lits;
                    continue;
                }
                // No replacement found: lits[0] is either unit or conflict.
                kept.push((lits[0], cref));
                self.clauses.get_mut(cref).lits = lits.clone();
                if self.value_of(lits[0]) < 0 {
                    conflict = Some(Conflict::Clause(cref));
                    continue 'watches;
                }
                let lvl = self.decision_level();
                self.assign(lits[0], Reason::Clause(cref), lvl);
            }
            kept.extend(std::mem::take(&mut self.watches_large[np as usize]));
            self.watches_large[np as usize] = kept;
            if let Some(c) = conflict {
                return Some(c);
            }
        }
        None
    }

    fn backtrack_to(&mut self, level: u32) {
        if self.decision_level() <= level {
            return;
        }
        let target = self.trail_lim[level as usize];
        for i in (target..self.trail.len()).rev() {
            let lit = self.trail[i];
            let v = var_of(lit);
            self.phases.save(v, self.value[v as usize]);
            self.value[v as usize] = 0;
            if !self.heap.contains(v) {
                self.heap.insert(v, &self.activity);
            }
        }
        self.trail.truncate(target);
        self.trail_lim.truncate(level as usize);
        self.qhead = self.trail.len();
    }

    fn decide(&mut self) -> Option<Lit> {
        let v = if self.stable {
            loop {
                let v = self.heap.pop_max(&self.activity)?;
                if self.value[v as usize] == 0 {
                    break v;
                }
            }
        } else {
            heuristic::pick_from_queue(&self.queue, &self.value)?
        };
        let phase = self.phases.saved.get(v as usize).copied().unwrap_or(0);
        let sign = phase < 0;
        Some(mk_lit(v, sign))
    }

    /// Run the search to completion, subject to [`Budget`] (§4.G / §7).
    pub fn solve(&mut self) -> SolveStatus {
        if self.inconsistent {
            return SolveStatus::Unsat;
        }
        transitive::reduce(self);
        if self.inconsistent {
            return SolveStatus::Unsat;
        }

        loop {
            match self.propagate() {
                Some(confl) => {
                    if self.decision_level() == 0 {
                        self.inconsistent = true;
                        return SolveStatus::Unsat;
                    }
                    self.conflicts += 1;
                    self.conflicts_since_flip += 1;
                    self.conflicts_since_tier_recompute += 1;
                    if let Some(max) = self.budget.max_conflicts {
                        if self.conflicts > max {
                            return SolveStatus::Undecided;
                        }
                    }
                    let (learnt, backtrack_level) = analyze::analyze(self, confl);
                    self.backtrack_to(backtrack_level);
                    let glue = analyze::glue_of(self, &learnt);
                    self.install_learnt(learnt, glue);
                    heuristic::decay_var_inc(&mut self.var_inc, 1.0 / 0.95);
                    if restart::should_flip_mode(self.conflicts_since_flip) {
                        self.stable = !self.stable;
                        self.conflicts_since_flip = 0;
                        self.phases.reset_best_height();
                    }
                    if self.conflicts_since_tier_recompute >= TIER_RECOMPUTE_PERIOD {
                        db::recompute_tiers(self);
                        db::reduce(self);
                        self.conflicts_since_tier_recompute = 0;
                    }
                }
                None => {
                    self.phases.ensure_capacity(self.num_vars as usize);
                    self.phases.maybe_snapshot_best(self.trail.len());
                    match self.decide() {
                        Some(lit) => {
                            self.trail_lim.push(self.trail.len());
                            let lvl = self.decision_level();
                            self.assign(lit, Reason::Decision, lvl);
                        }
                        None => return SolveStatus::Sat,
                    }
                }
            }
        }
    }

    fn install_learnt(&mut self, learnt: Vec<Lit>, glue: u32) {
        if learnt.len() == 1 {
            let lvl = self.decision_level();
            debug_assert_eq!(lvl, 0);
            self.exported_units.push(learnt[0]);
            self.assign(learnt[0], Reason::Unit, 0);
            return;
        }
        if learnt.len() == 2 {
            self.watches_bin[not(learnt[0]) as usize].push(learnt[1]);
            self.watches_bin[not(learnt[1]) as usize].push(learnt[0]);
            let lvl = self.decision_level();
            self.assign(learnt[0], Reason::Binary(not(learnt[1])), lvl);
            let _ = self.clauses.new_object(Clause::new(learnt, true, glue));
            return;
        }
        let cref = self.clauses.new_object(Clause::new(learnt.clone(), true, glue));
        self.watches_large[not(learnt[0]) as usize].push((learnt[1], cref));
        self.watches_large[not(learnt[1]) as usize].push((learnt[0], cref));
        let lvl = self.decision_level();
        self.assign(learnt[0], Reason::Clause(cref), lvl);
    }

    /// Read the value of `lit` after a SAT result (`true`/`false`), or
    /// `None` if `lit`'s variable was never assigned (can only happen for
    /// variables with no remaining clauses, e.g. pure/unused).
    pub fn value(&self, lit: Lit) -> Option<bool> {
        let raw = self.value[var_of(lit) as usize];
        if raw == 0 {
            return None;
        }
        let v = raw > 0;
        Some(if crate::aig::sign_of(lit) { !v } else { v })
    }

    /// The persistent root-level units discovered so far (§4.G, "externally
    /// exported units").
    pub fn exported_units(&self) -> &[Lit] {
        &self.exported_units
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::aig::not;

    #[test]
    fn unit_propagation_resolves_simple_chain() {
        let mut s = Solver::new();
        let a = s.new_var_lit();
        let b = s.new_var_lit();
        s.add_clause(&[a]);
        s.add_clause(&[not(a), b]);
        assert_eq!(s.solve(), SolveStatus::Sat);
        assert_eq!(s.value(a), Some(true));
        assert_eq!(s.value(b), Some(true));
    }

    #[test]
    fn contradictory_units_are_unsat() {
        let mut s = Solver::new();
        let a = s.new_var_lit();
        s.add_clause(&[a]);
        s.add_clause(&[not(a)]);
        assert_eq!(s.solve(), SolveStatus::Unsat);
    }

    #[test]
    fn simple_two_clause_sat_instance() {
        let mut s = Solver::new();
        let a = s.new_var_lit();
        let b = s.new_var_lit();
        s.add_clause(&[a, b]);
        s.add_clause(&[not(a), not(b)]);
        assert_eq!(s.solve(), SolveStatus::Sat);
        assert_ne!(s.value(a), s.value(b));
    }

    #[test]
    fn pigeonhole_php_3_4_is_unsat() {
        // Scenario 5 (§8): PHP(3,4) -- 4 pigeons, 3 holes.
        let mut s = Solver::new();
        let pigeons = 4;
        let holes = 3;
        let mut vars = vec![vec![0u32; holes]; pigeons];
        for p in 0..pigeons {
            for h in 0..holes {
                vars[p][h] = var_of(s.new_var_lit());
            }
        }
        let lit = |p: usize, h: usize, neg: bool| mk_lit(vars[p][h], neg);
        for p in 0..pigeons {
            let clause: Vec<Lit> = (0..holes).map(|h| lit(p, h, false)).collect();
            s.add_clause(&clause);
        }
        for h in 0..holes {
            for p1 in 0..pigeons {
                for p2 in (p1 + 1)..pigeons {
                    s.add_clause(&[lit(p1, h, true), lit(p2, h, true)]);
                }
            }
        }
        assert_eq!(s.solve(), SolveStatus::Unsat);
    }
}
