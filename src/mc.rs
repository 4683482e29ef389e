//! §4.I Model-checking driver.
//!
//! Orchestrates a fixed five-stage pipeline over a sequential AIG under a
//! wall-clock budget, each stage able to short-circuit with a decided
//! status (§5: "Control flow in I is a sequential pipeline of incremental
//! simplifications, each of which may short-circuit on a decided status").
//!
//! Stage 2 (bounded model checking) builds CNF incrementally against
//! [`crate::sat::Solver`] frame by frame rather than through an intermediate
//! AIG. Stage 3 threads [`crate::seq::SeqAig::sequential_cleanup`],
//! [`crate::seq::SeqAig::phase_abstract`], [`crate::retime::retime`] and
//! [`latch_correspondence`] in a loop until none of them make further
//! progress. Stage 4 stands in for Craig interpolation/BDD reachability
//! (§1 rules BDDs out explicitly, and no interpolating SAT core exists in
//! this crate) with [`one_step_induction`], a bounded inductive check over
//! the property itself built from the same frame encoder stage 2 uses.

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::aig::node::NodeKind;
use crate::aig::{mk_lit, not, sign_of, var_of, Lit as AigLit};
use crate::consts::{
    BDD_REGISTER_LIMIT, DEFAULT_BMC_FRAMES, DEFAULT_SEQ_SIMPLIFY_FRAME_LIMIT, DEFAULT_WALLCLOCK_BUDGET_MS,
    LATCH_CORRESPONDENCE_ROUNDS,
};
use crate::sat::{Lit as SatLit, SolveStatus, Solver};
use crate::seq::{EdgeKey, InitVal, SeqAig};

/// Final verdict of a model-checking run (§4.I: "{SAT+cex, UNSAT, UNDECIDED}").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// A counterexample was found: `frame` is the first frame the property
    /// PO evaluates true, `pi_frames[f][i]` is PI `i`'s value at frame `f`.
    SatWithCex { frame: u32, pi_frames: Vec<Vec<bool>> },
    Unsat,
    Undecided,
}

/// Wall-clock/frame budget for one [`Driver::run`] call.
#[derive(Debug, Clone, Copy)]
pub struct Budget {
    pub wallclock: Duration,
    pub bmc_frames: u32,
    pub seq_simplify_frames: u32,
}

impl Default for Budget {
    fn default() -> Self {
        Budget {
            wallclock: Duration::from_millis(DEFAULT_WALLCLOCK_BUDGET_MS),
            bmc_frames: DEFAULT_BMC_FRAMES,
            seq_simplify_frames: DEFAULT_SEQ_SIMPLIFY_FRAME_LIMIT,
        }
    }
}

pub struct Driver {
    budget: Budget,
    started: Option<Instant>,
}

impl Driver {
    pub fn new(budget: Budget) -> Self {
        Driver { budget, started: None }
    }

    fn expired(&self) -> bool {
        self.started.map(|s| s.elapsed() >= self.budget.wallclock).unwrap_or(false)
    }

    /// Run the full pipeline on `seq` for property output `po_index`
    /// (§4.I). Every PI of `seq` is treated as free per frame; this checks
    /// reachability of `po_index` evaluating to `1`.
    pub fn run(&mut self, seq: &SeqAig, po_index: usize) -> Status {
        self.started = Some(Instant::now());

        // Stage 1: combinational simplification of the miter. A full
        // cleanup/fraig pass is out of reach here; the cheap, always-correct
        // special case is a structurally constant PO.
        if let Some(status) = trivial_po_status(seq, po_index) {
            return status;
        }
        if self.expired() {
            return Status::Undecided;
        }

        // Stage 2: bounded model checking.
        match run_bmc(seq, po_index, self.budget.bmc_frames) {
            Status::Undecided => {}
            decided => return decided,
        }
        if self.expired() {
            return Status::Undecided;
        }

        // Stage 3: sequential simplification loop up to a frame limit,
        // threading sequential cleanup, phase abstraction, forward/
        // min-register retiming (§4.D) and bounded latch correspondence
        // (§4.I) until a round makes no further progress.
        let mut simplified = seq.clone();
        for _ in 0..self.budget.seq_simplify_frames.min(4) {
            if self.expired() {
                return Status::Undecided;
            }
            let cleaned = simplified.sequential_cleanup();
            let recomplemented = simplified.phase_abstract();
            let summary = crate::retime::retime(&mut simplified);
            let corresponded = latch_correspondence(&mut simplified, LATCH_CORRESPONDENCE_ROUNDS);
            if cleaned == 0 && recomplemented == 0 && summary.moves.is_empty() && corresponded == 0 {
                break;
            }
        }
        match run_bmc(&simplified, po_index, self.budget.bmc_frames) {
            Status::Undecided => {}
            decided => return decided,
        }
        if self.expired() {
            return Status::Undecided;
        }

        // Stage 4: single-output bounded induction in place of Craig
        // interpolation/BDD reachability. Neither an interpolating SAT core
        // nor a BDD package is part of this crate (§1's out-of-scope list
        // names BDD operations explicitly); within the same register-count
        // ceiling this stage would have gated BDD reachability on, it tries
        // one inductive step over the property instead of fabricating a
        // verdict outright.
        if simplified.register_count() <= BDD_REGISTER_LIMIT {
            if let Status::Unsat = one_step_induction(&simplified, po_index) {
                return Status::Unsat;
            }
        }

        // Stage 5: per-PO retry on the reduced miter is a no-op for a
        // single requested `po_index`; multi-PO orchestration is the
        // caller's responsibility (one `Driver::run` per PO).
        Status::Undecided
    }
}

fn trivial_po_status(seq: &SeqAig, po_index: usize) -> Option<Status> {
    let po = seq.aig().pos()[po_index];
    let fanin = match seq.aig().node(po).kind {
        crate::aig::node::NodeKind::Po { fanin, .. } => fanin,
        _ => return None,
    };
    if var_of(fanin) != 0 {
        return None;
    }
    if sign_of(fanin) {
        Some(Status::SatWithCex { frame: 0, pi_frames: vec![vec![false; seq.aig().pis().len()]] })
    } else {
        Some(Status::Unsat)
    }
}

/// Bounded model checking core (§4.I step 2).
///
/// Rebuilds the full `0..=f` unrolling from scratch for each candidate depth
/// `f` (simpler and still correct at the frame caps this driver uses, in
/// exchange for `O(frames^2)` encoding work rather than incremental
/// assumption literals).
fn run_bmc(seq: &SeqAig, po_index: usize, max_frames: u32) -> Status {
    for f in 0..max_frames {
        let mut solver = Solver::new();
        let const_false = solver.new_var_lit();
        solver.add_clause(&[not(const_false)]);

        let mut pi_lits_per_frame: Vec<Vec<SatLit>> = Vec::new();
        let mut chains: std::collections::HashMap<EdgeKey, Vec<SatLit>> = initial_chains(seq, &mut solver, const_false);

        let mut po_lit_this_frame = const_false;
        for _frame in 0..=f {
            let (node_lits, pi_lits) = encode_frame(seq, &mut solver, &chains, const_false);
            pi_lits_per_frame.push(pi_lits);
            // Advance every chain with this frame's own combinational
            // update before reading the property literal: the latch
            // feeding the PO becomes observable the same frame its new
            // value is clocked in, rather than only on the following
            // frame's encode (§8 scenario 3: a three-register chain's PO
            // must read `1` at frame 2, not frame 3).
            chains = advance_chains(seq, &chains, &node_lits);
            po_lit_this_frame = po_lit_of(seq, &chains, &node_lits, po_index);
        }
        solver.add_clause(&[po_lit_this_frame]);

        match solver.solve() {
            SolveStatus::Sat => {
                let pi_frames = pi_lits_per_frame
                    .iter()
                    .map(|lits| lits.iter().map(|&l| solver.value(l).unwrap_or(false)).collect())
                    .collect();
                return Status::SatWithCex { frame: f, pi_frames };
            }
            SolveStatus::Unsat => continue,
            SolveStatus::Undecided => return Status::Undecided,
        }
    }
    Status::Unsat
}

fn initial_chains(seq: &SeqAig, solver: &mut Solver, const_false: SatLit) -> std::collections::HashMap<EdgeKey, Vec<SatLit>> {
    let mut chains = std::collections::HashMap::new();
    for (id, _) in seq.aig().raw_nodes().iter() {
        for edge in seq.fanin_edges_of(id) {
            let k = seq.k(edge) as usize;
            if k == 0 {
                continue;
            }
            let mut lits = Vec::with_capacity(k);
            for i in 0..k {
                let lit = match seq.init_at(edge, i) {
                    Some(InitVal::Zero) | None => const_false,
                    Some(InitVal::One) => not(const_false),
                    Some(InitVal::Dc) | Some(InitVal::Unknown) => solver.new_var_lit(),
                };
                lits.push(lit);
            }
            chains.insert(edge, lits);
        }
    }
    chains
}

/// Encode one combinational frame: every AND node gets a fresh Tseitin
/// variable, PIs get fresh free variables, and `k>0` fanin edges read their
/// chain head instead of the driver's frame literal.
fn encode_frame(
    seq: &SeqAig,
    solver: &mut Solver,
    chains: &std::collections::HashMap<EdgeKey, Vec<SatLit>>,
    const_false: SatLit,
) -> (std::collections::HashMap<u32, SatLit>, Vec<SatLit>) {
    let aig = seq.aig();
    let mut node_lits: std::collections::HashMap<u32, SatLit> = std::collections::HashMap::new();
    node_lits.insert(0, const_false);
    let mut pi_lits = Vec::with_capacity(aig.pis().len());

    for &pi in aig.pis() {
        let lit = solver.new_var_lit();
        node_lits.insert(pi, lit);
        pi_lits.push(lit);
    }

    // A latch output's value this frame is the head of its paired latch
    // input's own chain (§3, "CI is either a PI or a latch output" --
    // paired index-for-index with `Manager::latch_ins`): whatever is
    // presently stored in that register, not an independent free variable.
    for (i, &lo) in aig.latch_outs().iter().enumerate() {
        let li = aig.latch_ins()[i];
        let lit = chains.get(&(li, 0)).map(|c| c[0]).unwrap_or(const_false);
        node_lits.insert(lo, lit);
    }

    for (id, node) in aig.raw_nodes().iter() {
        if let Some((f0, f1)) = node.and_fanins() {
            let a = fanin_frame_lit(seq, chains, &node_lits, id, 0, f0);
            let b = fanin_frame_lit(seq, chains, &node_lits, id, 1, f1);
            let c = solver.new_var_lit();
            solver.add_clause(&[not(a), not(b), c]);
            solver.add_clause(&[a, not(c)]);
            solver.add_clause(&[b, not(c)]);
            node_lits.insert(id, c);
        }
    }
    (node_lits, pi_lits)
}

fn fanin_frame_lit(
    seq: &SeqAig,
    chains: &std::collections::HashMap<EdgeKey, Vec<SatLit>>,
    node_lits: &std::collections::HashMap<u32, SatLit>,
    consumer: u32,
    slot: u8,
    fanin: AigLit,
) -> SatLit {
    let edge = (consumer, slot);
    if let Some(chain) = chains.get(&edge) {
        return chain[0];
    }
    let driver = *node_lits.get(&var_of(fanin)).expect("fanins are visited in topological order");
    if sign_of(fanin) {
        not(driver)
    } else {
        driver
    }
}

/// Shift every latch chain by one frame: the head is consumed (it already
/// fed `fanin_frame_lit` this frame), every other entry shifts down, and the
/// tail receives this frame's driver value under the edge's inversion bit --
/// the same polarity convention [`SeqAig::retime_forward_step`] uses when it
/// inserts a value-preserving tail latch.
fn advance_chains(
    seq: &SeqAig,
    chains: &std::collections::HashMap<EdgeKey, Vec<SatLit>>,
    node_lits: &std::collections::HashMap<u32, SatLit>,
) -> std::collections::HashMap<EdgeKey, Vec<SatLit>> {
    let mut next = chains.clone();
    for (&(consumer, slot), chain) in chains.iter() {
        let fanin = seq.fanin_literal(consumer, slot);
        let driver = *node_lits.get(&var_of(fanin)).expect("fanins visited in topological order");
        let tail_value = if sign_of(fanin) { not(driver) } else { driver };
        let mut shifted = chain[1..].to_vec();
        shifted.push(tail_value);
        next.insert((consumer, slot), shifted);
    }
    next
}

fn po_lit_of(
    seq: &SeqAig,
    chains: &std::collections::HashMap<EdgeKey, Vec<SatLit>>,
    node_lits: &std::collections::HashMap<u32, SatLit>,
    po_index: usize,
) -> SatLit {
    let po = seq.aig().pos()[po_index];
    let fanin = match seq.aig().node(po).kind {
        crate::aig::node::NodeKind::Po { fanin, .. } => fanin,
        _ => panic!("po_lit_of: {po} is not a PO"),
    };
    fanin_frame_lit(seq, chains, node_lits, po, 0, fanin)
}

/// Build a chains map where every edge position is a fresh symbolic
/// variable, regardless of its real init value: induction reasons about an
/// arbitrary, not necessarily reachable, state, so fixing any position to
/// the real reset constant would just repeat what [`initial_chains`]
/// already lets `run_bmc`'s frame-0 check see, rather than generalizing
/// over every state the property is hypothesized to hold in. Used by
/// [`one_step_induction`] and [`induction_holds`].
fn free_chains(seq: &SeqAig, solver: &mut Solver) -> std::collections::HashMap<EdgeKey, Vec<SatLit>> {
    let mut chains = std::collections::HashMap::new();
    for (id, _) in seq.aig().raw_nodes().iter() {
        for edge in seq.fanin_edges_of(id) {
            let k = seq.k(edge) as usize;
            if k == 0 {
                continue;
            }
            let lits: Vec<SatLit> = (0..k).map(|_| solver.new_var_lit()).collect();
            chains.insert(edge, lits);
        }
    }
    chains
}

/// Stage 4's bounded-induction stand-in for single-output interpolation
/// (§4.I): assume the property holds in an arbitrary symbolic state and ask
/// whether one further frame can falsify it. An `UNSAT` answer proves the
/// property is inductively invariant, which combined with stage 2's clean
/// pass through `bmc_frames` (the base case) proves it holds at every later
/// frame too.
fn one_step_induction(seq: &SeqAig, po_index: usize) -> Status {
    let mut solver = Solver::new();
    let const_false = solver.new_var_lit();
    solver.add_clause(&[not(const_false)]);

    let chains0 = free_chains(seq, &mut solver);
    let (node_lits0, _) = encode_frame(seq, &mut solver, &chains0, const_false);
    let po0 = po_lit_of(seq, &chains0, &node_lits0, po_index);
    solver.add_clause(&[po0]);

    let chains1 = advance_chains(seq, &chains0, &node_lits0);
    let (node_lits1, _) = encode_frame(seq, &mut solver, &chains1, const_false);
    let po1 = po_lit_of(seq, &chains1, &node_lits1, po_index);
    solver.add_clause(&[not(po1)]);

    match solver.solve() {
        SolveStatus::Unsat => Status::Unsat,
        _ => Status::Undecided,
    }
}

/// Dense combinational evaluation with latch outputs seeded as free inputs,
/// mirroring [`crate::aig::Manager::eval_all`] but for a state that isn't
/// reset, used by [`latch_correspondence`]'s seeding simulation.
fn eval_with_latches(aig: &crate::aig::Manager, pi_values: &[bool], latch_outs: &[u32], latch_out_values: &[bool]) -> Vec<bool> {
    let mut values = vec![false; aig.node_count()];
    for (pos, &pi_id) in aig.pis().iter().enumerate() {
        values[pi_id as usize] = pi_values[pos];
    }
    for (i, &lo) in latch_outs.iter().enumerate() {
        values[lo as usize] = latch_out_values[i];
    }
    for (id, node) in aig.raw_nodes().iter() {
        if let Some((f0, f1)) = node.and_fanins() {
            let a = values[var_of(f0) as usize] ^ sign_of(f0);
            let b = values[var_of(f1) as usize] ^ sign_of(f1);
            values[id as usize] = a && b;
        }
    }
    values
}

/// One-step inductive SAT query for a latch-correspondence candidate pair
/// (§4.I stage 3): assume `lo_a`/`lo_b` agree in an arbitrary symbolic state
/// and ask whether their drivers can be forced to disagree one frame later.
/// `UNSAT` proves the pair stays equal once it's ever equal.
fn induction_holds(seq: &SeqAig, lo_a: u32, lo_b: u32) -> bool {
    let mut solver = Solver::new();
    let const_false = solver.new_var_lit();
    solver.add_clause(&[not(const_false)]);

    let chains0 = free_chains(seq, &mut solver);
    let (node_lits0, _) = encode_frame(seq, &mut solver, &chains0, const_false);
    let a0 = *node_lits0.get(&lo_a).expect("latch_outs always get a frame literal");
    let b0 = *node_lits0.get(&lo_b).expect("latch_outs always get a frame literal");
    solver.add_clause(&[not(a0), b0]);
    solver.add_clause(&[a0, not(b0)]);

    let chains1 = advance_chains(seq, &chains0, &node_lits0);
    let (node_lits1, _) = encode_frame(seq, &mut solver, &chains1, const_false);
    let a1 = *node_lits1.get(&lo_a).expect("latch_outs always get a frame literal");
    let b1 = *node_lits1.get(&lo_b).expect("latch_outs always get a frame literal");
    let disagree = solver.new_var_lit();
    solver.add_clause(&[not(disagree), a1, b1]);
    solver.add_clause(&[not(disagree), not(a1), not(b1)]);
    solver.add_clause(&[disagree]);

    matches!(solver.solve(), SolveStatus::Unsat)
}

/// Redirect every reader of `lo_drop` onto `lo_keep`, reporting whether the
/// merge was safe to apply. Like `seq::phase_abstract`, a register with any
/// AND-gate reader is left alone: rewriting that fanin in place would
/// desynchronize the structural-hash table from the node's real contents
/// (§4.B).
fn merge_registers(seq: &mut SeqAig, lo_keep: u32, lo_drop: u32) -> bool {
    let readers = seq.fanout_edges_of(lo_drop);
    if readers
        .iter()
        .any(|&(consumer, _)| matches!(seq.aig().node(consumer).kind, NodeKind::And { .. }))
    {
        return false;
    }
    for &(consumer, slot) in &readers {
        let sign = sign_of(seq.fanin_literal(consumer, slot));
        let new_lit = mk_lit(lo_keep, sign);
        match seq.aig().node(consumer).kind {
            NodeKind::Po { .. } => seq.aig_mut().set_po_fanin(consumer, new_lit),
            NodeKind::LatchIn { .. } => seq.aig_mut().set_latchin_fanin(consumer, new_lit),
            _ => unreachable!("readers filtered to Po/LatchIn above"),
        }
    }
    true
}

/// Latch correspondence via bounded k-step induction (§4.I stage 3): seeds
/// candidate equivalence classes with one random simulation round over
/// `rounds` frames, then discharges each candidate pair with
/// [`induction_holds`] and merges provably-equivalent pairs via
/// [`merge_registers`]. Only single-stage (`k == 1`) registers participate --
/// a register retiming has built up into a multi-position chain isn't
/// simulated here, since the point-in-time state it represents isn't a
/// single boolean. Returns the number of registers merged away.
pub fn latch_correspondence(seq: &mut SeqAig, rounds: u32) -> usize {
    let latch_outs = seq.aig().latch_outs().to_vec();
    let latch_ins = seq.aig().latch_ins().to_vec();
    if latch_outs.len() < 2 {
        return 0;
    }

    let mut rng = StdRng::seed_from_u64(0x4c61_7463_6843_6f72);
    let mut state: Vec<bool> = latch_ins
        .iter()
        .map(|&li| matches!(seq.init_at((li, 0), 0), Some(InitVal::One)))
        .collect();
    let mut traces: Vec<Vec<bool>> = state.iter().map(|&v| vec![v]).collect();

    for _ in 0..rounds {
        let pi_values: Vec<bool> = seq.aig().pis().iter().map(|_| rng.gen::<bool>()).collect();
        let values = eval_with_latches(seq.aig(), &pi_values, &latch_outs, &state);
        let mut next_state = state.clone();
        for (i, &li) in latch_ins.iter().enumerate() {
            if seq.k((li, 0)) != 1 {
                continue;
            }
            let driver = seq.fanin_literal(li, 0);
            next_state[i] = values[var_of(driver) as usize] ^ sign_of(driver);
        }
        for (i, v) in next_state.iter().enumerate() {
            traces[i].push(*v);
        }
        state = next_state;
    }

    let mut merged = 0usize;
    let mut absorbed = vec![false; latch_outs.len()];
    for i in 0..latch_outs.len() {
        if absorbed[i] || seq.k((latch_ins[i], 0)) != 1 {
            continue;
        }
        for j in (i + 1)..latch_outs.len() {
            if absorbed[j] || seq.k((latch_ins[j], 0)) != 1 {
                continue;
            }
            if traces[i] != traces[j] {
                continue;
            }
            if induction_holds(seq, latch_outs[i], latch_outs[j]) && merge_registers(seq, latch_outs[i], latch_outs[j]) {
                absorbed[j] = true;
                merged += 1;
            }
        }
    }
    merged
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::aig::Manager;

    /// Scenario 3 (§8): three-register shift chain, PO = register 3, zero
    /// initial state. `encode_frame`/`advance_chains` clock the PO's latch
    /// chain forward with each frame's own combinational update before the
    /// property literal is read, so the value injected at frame 0 surfaces
    /// at the PO at frame 2, matching the scenario's "PO=0 at frames 0..1,
    /// PO=1 at frame 2".
    #[test]
    fn shift_chain_reaches_po_after_three_edges() {
        let mut m = Manager::new();
        let pi = m.create_pi();
        let po = m.create_po(pi);
        let mut seq = SeqAig::new(m);
        seq.insert_first((po, 0), InitVal::Zero).unwrap();
        seq.insert_first((po, 0), InitVal::Zero).unwrap();
        seq.insert_first((po, 0), InitVal::Zero).unwrap();
        let mut driver = Driver::new(Budget::default());
        match driver.run(&seq, 0) {
            Status::SatWithCex { frame, .. } => assert_eq!(frame, 2),
            other => panic!("expected SatWithCex at frame 2, got {other:?}"),
        }
    }

    #[test]
    fn unreachable_po_under_constant_false_driver_is_unsat() {
        let mut m = Manager::new();
        let pi = m.create_pi();
        let and_with_its_negation = m.make_and(pi, not(pi));
        let po = m.create_po(and_with_its_negation);
        let seq = SeqAig::new(m);
        let mut driver = Driver::new(Budget {
            wallclock: Duration::from_millis(DEFAULT_WALLCLOCK_BUDGET_MS),
            bmc_frames: 4,
            seq_simplify_frames: 1,
        });
        assert_eq!(driver.run(&seq, 0), Status::Unsat);
    }

    #[test]
    fn one_step_induction_proves_a_constant_register_property_is_invariant() {
        let mut m = Manager::new();
        let lo = m.create_latch_out();
        let li = m.create_latch_in(lo);
        let po = m.create_po(not(lo));
        let mut seq = SeqAig::new(m);
        seq.insert_first((li, 0), InitVal::Zero).unwrap();
        assert_eq!(one_step_induction(&seq, 0), Status::Unsat);
        let _ = po;
    }

    #[test]
    fn latch_correspondence_merges_two_redundant_registers() {
        let mut m = Manager::new();
        let pi = m.create_pi();
        let lo_a = m.create_latch_out();
        let li_a = m.create_latch_in(pi);
        let lo_b = m.create_latch_out();
        let li_b = m.create_latch_in(pi);
        let lo_a_id = var_of(lo_a);
        let po_a = m.create_po(lo_a);
        let po_b = m.create_po(lo_b);
        let mut seq = SeqAig::new(m);
        seq.insert_first((li_a, 0), InitVal::Zero).unwrap();
        seq.insert_first((li_b, 0), InitVal::Zero).unwrap();
        seq.bump_register_count(2);

        let merged = latch_correspondence(&mut seq, 8);
        assert_eq!(merged, 1);
        assert_eq!(var_of(seq.fanin_literal(po_a, 0)), lo_a_id);
        assert_eq!(var_of(seq.fanin_literal(po_b, 0)), lo_a_id);
    }
}
