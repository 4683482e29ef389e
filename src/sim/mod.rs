//! §4.E Simulation engine.
//!
//! Packed bitwise simulation over `W` 32-bit words (§3, "Simulation info"):
//! node `n`'s vector is `W` words, bit `b` of word `w` is `n`'s value under
//! input pattern `32*w+b`. Structural and functional support, the
//! target-driven refinement loop, and two-variable symmetry detection all
//! build on this packed representation, walking nodes in topological order
//! the same way [`crate::aig::cex`] replays a counterexample.

pub mod symmetry;

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;

use crate::aig::node::NodeKind;
use crate::aig::{sign_of, var_of, Manager};
use crate::arena::Id;
use crate::consts::{DEFAULT_SIM_WORDS, SIM_TARGET_ITER_CAP};

/// Packed simulation state for one manager: `W` words per node (§3).
#[derive(Debug, Clone)]
pub struct Simulator {
    words: usize,
    values: Vec<Vec<u32>>,
}

impl Simulator {
    pub fn new(node_count: usize, words: usize) -> Self {
        Simulator {
            words,
            values: vec![vec![0u32; words]; node_count],
        }
    }

    pub fn words(&self) -> usize {
        self.words
    }

    pub fn value(&self, id: Id) -> &[u32] {
        &self.values[id as usize]
    }

    fn set(&mut self, id: Id, data: Vec<u32>) {
        self.values[id as usize] = data;
    }

    fn eval_lit(&self, lit: crate::aig::Lit) -> Vec<u32> {
        let base = &self.values[var_of(lit) as usize];
        if sign_of(lit) {
            base.iter().map(|w| !w).collect()
        } else {
            base.clone()
        }
    }

    /// Simulate one round: fill every PI with fresh random words from `rng`,
    /// then evaluate every AND node in topological (ascending id) order,
    /// mirroring `Manager::eval_all` but bitwise-packed (§4.E, "Random-pattern
    /// simulation").
    pub fn simulate_random(&mut self, aig: &Manager, rng: &mut StdRng) {
        let patterns = self.random_patterns(aig, rng);
        self.simulate_with_patterns(aig, &patterns);
    }

    fn random_patterns(&self, aig: &Manager, rng: &mut StdRng) -> Vec<(Id, Vec<u32>)> {
        aig.pis()
            .iter()
            .map(|&pi| (pi, (0..self.words).map(|_| rng.gen::<u32>()).collect()))
            .collect()
    }

    /// Simulate one round with explicit per-PI pattern words (used by the
    /// FIFO-driven target loop and by functional-support toggling).
    pub fn simulate_with_patterns(&mut self, aig: &Manager, pi_patterns: &[(Id, Vec<u32>)]) {
        for &(pi, ref words) in pi_patterns {
            self.set(pi, words.clone());
        }
        for (id, node) in aig.raw_nodes().iter() {
            if id == 0 {
                self.set(0, vec![0u32; self.words]);
                continue;
            }
            if let NodeKind::And { fanin0, fanin1 } = node.kind {
                let a = self.eval_lit(fanin0);
                let b = self.eval_lit(fanin1);
                let out: Vec<u32> = a.iter().zip(b.iter()).map(|(x, y)| x & y).collect();
                self.set(id, out);
            }
        }
    }

    /// PO value vector, inversion applied (§3).
    pub fn po_value(&self, aig: &Manager, po: Id) -> Vec<u32> {
        match aig.node(po).kind {
            NodeKind::Po { fanin, .. } => self.eval_lit(fanin),
            _ => panic!("po_value: {po} is not a PO"),
        }
    }
}

/// Structural support: `strSupp(pi) = {pi}`, unioned upward through ANDs and
/// copied through POs in one topological pass (§4.E).
pub fn structural_support(aig: &Manager) -> Vec<u64> {
    let n_ci = aig.pis().len();
    let words = n_ci.div_ceil(64).max(1);
    let mut supp: Vec<Vec<u64>> = vec![vec![0u64; words]; aig.node_count()];
    for (idx, &pi) in aig.pis().iter().enumerate() {
        set_bit(&mut supp[pi as usize], idx);
    }
    for (id, node) in aig.raw_nodes().iter() {
        match node.kind {
            NodeKind::And { fanin0, fanin1 } => {
                let (a, b) = (var_of(fanin0) as usize, var_of(fanin1) as usize);
                let merged: Vec<u64> = supp[a].iter().zip(supp[b].iter()).map(|(x, y)| x | y).collect();
                supp[id as usize] = merged;
            }
            NodeKind::Po { fanin, .. } => {
                supp[id as usize] = supp[var_of(fanin) as usize].clone();
            }
            _ => {}
        }
    }
    // Flatten each PO's support into a single packed bitmap, indexed by PO.
    aig.pos().iter().map(|&po| pack(&supp[po as usize])).collect()
}

fn set_bit(words: &mut [u64], idx: usize) {
    words[idx / 64] |= 1u64 << (idx % 64);
}

fn pack(words: &[u64]) -> u64 {
    // Supports with <= 64 PIs pack into one word; wider supports keep the
    // first 64 bits, sufficient for the symmetry/target bookkeeping this
    // crate performs over those bits (component E never claims exactness
    // beyond 64 PIs without extending this to a `Vec<u64>` everywhere).
    words.first().copied().unwrap_or(0)
}

/// `(pi_index, po_index)` pairs still structurally-but-not-yet-functionally
/// supported.
pub type Target = (usize, usize);

/// Functional support refinement driver (§4.E).
///
/// Maintains, per PO, the set of PIs proven in its functional support by
/// witnessing a toggle: complement PI `i`'s column, re-simulate the cone,
/// and check whether any pattern bit of the PO differs.
pub struct SupportRefiner {
    n_pi: usize,
    n_po: usize,
    structural: Vec<u64>,
    functional: Vec<u64>,
    useful_patterns: VecDeque<Vec<(Id, Vec<u32>)>>,
}

impl SupportRefiner {
    pub fn new(aig: &Manager) -> Self {
        let structural = structural_support(aig);
        SupportRefiner {
            n_pi: aig.pis().len(),
            n_po: aig.pos().len(),
            functional: vec![0u64; structural.len()],
            structural,
            useful_patterns: VecDeque::new(),
        }
    }

    fn remaining_targets(&self) -> Vec<Target> {
        let mut out = Vec::new();
        for po in 0..self.n_po {
            let remaining = self.structural[po] & !self.functional[po];
            for pi in 0..self.n_pi {
                if remaining & (1u64 << pi) != 0 {
                    out.push((pi, po));
                }
            }
        }
        out
    }

    /// Run the target-driven loop to completion (§4.E): alternate random and
    /// FIFO-assigned rounds, stopping when the target set empties or the
    /// iteration cap is reached.
    pub fn refine(&mut self, aig: &Manager, words: usize, seed: u64) -> Vec<u64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut sim = Simulator::new(aig.node_count(), words);

        for _ in 0..SIM_TARGET_ITER_CAP {
            if self.remaining_targets().is_empty() {
                break;
            }
            let base_patterns: Vec<(Id, Vec<u32>)> = self
                .useful_patterns
                .pop_front()
                .unwrap_or_else(|| random_pattern_set(aig, &mut rng, words));
            sim.simulate_with_patterns(aig, &base_patterns);
            let base_po: Vec<Vec<u32>> = aig.pos().iter().map(|&po| sim.po_value(aig, po)).collect();

            for (pi_idx, po_idx) in self.remaining_targets() {
                let pi_id = aig.pis()[pi_idx];
                let toggled: Vec<(Id, Vec<u32>)> = base_patterns
                    .iter()
                    .map(|&(id, ref w)| {
                        if id == pi_id {
                            (id, w.iter().map(|x| !x).collect())
                        } else {
                            (id, w.clone())
                        }
                    })
                    .collect();
                sim.simulate_with_patterns(aig, &toggled);
                let toggled_po = sim.po_value(aig, aig.pos()[po_idx]);
                if toggled_po
                    .iter()
                    .zip(base_po[po_idx].iter())
                    .any(|(a, b)| a != b)
                {
                    self.functional[po_idx] |= 1u64 << pi_idx;
                    self.useful_patterns.push_back(toggled);
                }
            }
            // restore the base simulation for the next round's toggling base
            sim.simulate_with_patterns(aig, &base_patterns);
        }
        self.functional.clone()
    }
}

fn random_pattern_set(aig: &Manager, rng: &mut StdRng, words: usize) -> Vec<(Id, Vec<u32>)> {
    aig.pis()
        .iter()
        .map(|&pi| (pi, (0..words).map(|_| rng.gen::<u32>()).collect()))
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::aig::Manager;

    #[test]
    fn simulate_and_matches_truth_table() {
        let mut m = Manager::new();
        let a = m.create_pi();
        let b = m.create_pi();
        let c = m.make_and(a, b);
        let po = m.create_po(c);
        let mut sim = Simulator::new(m.node_count(), 1);
        let patterns = vec![
            (var_of(a), vec![0b11u32]),
            (var_of(b), vec![0b10u32]),
        ];
        sim.simulate_with_patterns(&m, &patterns);
        let out = sim.po_value(&m, po);
        assert_eq!(out[0], 0b10);
    }

    #[test]
    fn structural_support_covers_both_inputs_of_and() {
        let mut m = Manager::new();
        let a = m.create_pi();
        let b = m.create_pi();
        let c = m.make_and(a, b);
        let _ = m.create_po(c);
        let supp = structural_support(&m);
        assert_eq!(supp[0], 0b11);
    }

    #[test]
    fn functional_support_finds_both_pis_of_and() {
        let mut m = Manager::new();
        let a = m.create_pi();
        let b = m.create_pi();
        let c = m.make_and(a, b);
        let _ = m.create_po(c);
        let mut refiner = SupportRefiner::new(&m);
        let result = refiner.refine(&m, 8, 42);
        assert_eq!(result[0], 0b11);
    }

    #[test]
    fn functional_support_excludes_irrelevant_pi() {
        let mut m = Manager::new();
        let a = m.create_pi();
        let _unused_pi = m.create_pi();
        let _ = m.create_po(a);
        let mut refiner = SupportRefiner::new(&m);
        let result = refiner.refine(&m, 8, 7);
        assert_eq!(result[0], 0b01);
    }
}
