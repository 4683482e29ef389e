//! §4.C Sequential AIG with edge latches.
//!
//! Wraps a combinational [`crate::aig::Manager`] (component B) with a
//! side-table of per-edge latch annotations (§3, "Sequential edge"):
//! `(literal, nLatches k, init[k])` on every AND/PO fanin edge, instead of
//! the one-latch-per-register representation AIGER files use. The AIGER
//! codec (§6) lowers/raises between the two representations at the I/O
//! boundary.

pub mod edge;

pub use edge::{EdgeLatch, InitVal};

use std::collections::HashMap;

use crate::aig::node::NodeKind;
use crate::aig::{not, var_of, Manager};
use crate::arena::Id;
use crate::error::{AigError, AigResult};

/// Identifies one fanin edge: the consuming node and which fanin slot.
/// Slot `0`/`1` for AND nodes, slot `0` for PO/LatchIn nodes.
pub type EdgeKey = (Id, u8);

/// A combinational [`Manager`] plus the per-edge latch annotations that
/// make it sequential (§3, §4.C).
#[derive(Debug, Clone)]
pub struct SeqAig {
    aig: Manager,
    edges: HashMap<EdgeKey, EdgeLatch>,
    /// Register count, tracked independently of any particular edge
    /// representation (§3, "AIG manager... for sequential AIGs the
    /// register count").
    register_count: usize,
}

impl SeqAig {
    /// Wrap a purely combinational AIG with zero registers.
    pub fn new(aig: Manager) -> Self {
        SeqAig {
            aig,
            edges: HashMap::new(),
            register_count: 0,
        }
    }

    /// Borrow the underlying combinational manager.
    pub fn aig(&self) -> &Manager {
        &self.aig
    }

    /// Mutably borrow the underlying combinational manager.
    pub fn aig_mut(&mut self) -> &mut Manager {
        &mut self.aig
    }

    /// Current register count.
    pub fn register_count(&self) -> usize {
        self.register_count
    }

    /// Every fanin edge of node `id`, as `(slot, key)` pairs.
    pub fn fanin_edges_of(&self, id: Id) -> Vec<EdgeKey> {
        match self.aig.node(id).kind {
            NodeKind::And { .. } => vec![(id, 0), (id, 1)],
            NodeKind::Po { .. } | NodeKind::LatchIn { .. } => vec![(id, 0)],
            _ => vec![],
        }
    }

    /// Every edge in the AIG whose literal names `target` as its fanin
    /// variable, i.e. `target`'s fanout edges. Computed by a linear scan;
    /// sequential passes call this O(passes) times, not per-node, so this
    /// stays acceptable without incremental maintenance.
    pub fn fanout_edges_of(&self, target: Id) -> Vec<EdgeKey> {
        let mut out = Vec::new();
        for (id, node) in self.aig.raw_nodes().iter() {
            match node.kind {
                NodeKind::And { fanin0, fanin1 } => {
                    if var_of(fanin0) == target {
                        out.push((id, 0));
                    }
                    if var_of(fanin1) == target {
                        out.push((id, 1));
                    }
                }
                NodeKind::Po { fanin, .. } | NodeKind::LatchIn { fanin, .. } => {
                    if var_of(fanin) == target {
                        out.push((id, 0));
                    }
                }
                _ => {}
            }
        }
        out
    }

    /// Latch count on `edge` (`0` if the edge carries no annotation).
    pub fn k(&self, edge: EdgeKey) -> u32 {
        self.edges.get(&edge).map(|e| e.len()).unwrap_or(0)
    }

    /// Read the init value at position `i` of `edge` (head = position 0).
    pub fn init_at(&self, edge: EdgeKey, i: usize) -> Option<InitVal> {
        self.edges.get(&edge).and_then(|e| e.get(i))
    }

    /// Insert one latch at the head of `edge` with initial value `v`.
    pub fn insert_first(&mut self, edge: EdgeKey, v: InitVal) -> AigResult<()> {
        let entry = self.edges.entry(edge).or_default();
        entry.insert_first(v)
    }

    /// Insert one latch at the tail of `edge` with initial value `v`.
    pub fn insert_last(&mut self, edge: EdgeKey, v: InitVal) -> AigResult<()> {
        let entry = self.edges.entry(edge).or_default();
        entry.insert_last(v)
    }

    /// Remove and return the head latch's init value from `edge`.
    pub fn delete_first(&mut self, edge: EdgeKey) -> AigResult<InitVal> {
        let entry = self
            .edges
            .get_mut(&edge)
            .ok_or_else(|| AigError::Precondition("delete_first on edge with no latches".into()))?;
        let v = entry.delete_first()?;
        if entry.len() == 0 {
            self.edges.remove(&edge);
        }
        Ok(v)
    }

    /// Remove and return the tail latch's init value from `edge`.
    pub fn delete_last(&mut self, edge: EdgeKey) -> AigResult<InitVal> {
        let entry = self
            .edges
            .get_mut(&edge)
            .ok_or_else(|| AigError::Precondition("delete_last on edge with no latches".into()))?;
        let v = entry.delete_last()?;
        if entry.len() == 0 {
            self.edges.remove(&edge);
        }
        Ok(v)
    }

    /// `k_min` over a set of edges, per the retiming step preconditions
    /// (§4.C, "`k_min ≥ 1`" for a forward step, "`k_fan_min ≥ 1`" for a
    /// backward step). Returns `None` for an empty edge set.
    pub fn min_k(&self, edges: &[EdgeKey]) -> Option<u32> {
        edges.iter().map(|&e| self.k(e)).min()
    }

    /// Retime-forward step over node `n` (§4.C): the value-preserving
    /// version. Requires `min(k)` over `n`'s fanin edges to be `>= 1`.
    pub fn retime_forward_step(&mut self, n: Id) -> AigResult<()> {
        let fanins = self.fanin_edges_of(n);
        let kmin = self.min_k(&fanins).unwrap_or(0);
        if kmin < 1 {
            return Err(AigError::Precondition(format!(
                "retime_forward_step: node {n} has no fanin edge with a latch to move"
            )));
        }
        let fanouts = self.fanout_edges_of(n);
        // Step 1/2: combine the fanouts' last-retimed head inits, inverted
        // per the fanin's inversion bit, to get n's new tail-inserted value.
        let combined = self.combined_head_init(n, &fanouts);
        // Step 3: delete one latch from the head of each fanin edge.
        for &e in &fanins {
            self.delete_first(e)?;
        }
        // Step 4: insert one latch at the tail of each fanout edge.
        for &e in &fanouts {
            self.insert_last(e, combined)?;
        }
        Ok(())
    }

    fn combined_head_init(&self, n: Id, fanouts: &[EdgeKey]) -> InitVal {
        let mut values = Vec::with_capacity(fanouts.len());
        for &(consumer, slot) in fanouts {
            let lit = self.fanin_literal(consumer, slot);
            let inverted = crate::aig::sign_of(lit);
            let v = self.init_at((consumer, slot), 0).unwrap_or(InitVal::Unknown);
            values.push(if inverted { v.invert() } else { v });
        }
        let _ = n;
        InitVal::combine(&values)
    }

    /// The fanin literal occupying `consumer`'s fanin slot `slot`, used by
    /// `retime::apply` to read an edge's inversion bit from outside this
    /// module.
    pub fn fanin_literal(&self, consumer: Id, slot: u8) -> crate::aig::Lit {
        match self.aig.node(consumer).kind {
            NodeKind::And { fanin0, fanin1 } => {
                if slot == 0 {
                    fanin0
                } else {
                    fanin1
                }
            }
            NodeKind::Po { fanin, .. } | NodeKind::LatchIn { fanin, .. } => fanin,
            _ => panic!("fanin_literal: node {consumer} has no fanin slot {slot}"),
        }
    }

    /// Retime-try-forward: move one latch per fanin edge of `n` without
    /// touching init values (§4.C, "Tentative variants ignore init
    /// values and operate only on latch counts"). Used by the L-value
    /// feasibility search.
    pub fn retime_try_forward(&mut self, n: Id) -> AigResult<()> {
        let fanins = self.fanin_edges_of(n);
        if self.min_k(&fanins).unwrap_or(0) < 1 {
            return Err(AigError::Precondition(format!(
                "retime_try_forward: node {n} has no latch to move forward"
            )));
        }
        for &e in &fanins {
            self.delete_first(e)?;
        }
        for &e in &self.fanout_edges_of(n) {
            self.insert_last(e, InitVal::Unknown)?;
        }
        Ok(())
    }

    /// Retime-try-backward: the count-only dual of
    /// [`SeqAig::retime_try_forward`] (§4.C). Requires
    /// `k_fan_min = min over fanout edges >= 1`.
    pub fn retime_try_backward(&mut self, n: Id) -> AigResult<()> {
        let fanouts = self.fanout_edges_of(n);
        if self.min_k(&fanouts).unwrap_or(0) < 1 {
            return Err(AigError::Precondition(format!(
                "retime_try_backward: node {n} has no latch to move backward"
            )));
        }
        for &e in &fanouts {
            self.delete_last(e)?;
        }
        for &e in &self.fanin_edges_of(n) {
            self.insert_first(e, InitVal::Unknown)?;
        }
        Ok(())
    }

    /// Run a forward-try then a backward-try on the same node and assert
    /// the latch counts are restored, as required by §8's latch-edge law.
    #[cfg(test)]
    fn round_trip_counts_preserved(&mut self, n: Id) -> bool {
        let before: Vec<u32> = self
            .fanin_edges_of(n)
            .iter()
            .chain(self.fanout_edges_of(n).iter())
            .map(|&e| self.k(e))
            .collect();
        if self.retime_try_forward(n).is_err() {
            return true;
        }
        if self.retime_try_backward(n).is_err() {
            return true;
        }
        let after: Vec<u32> = self
            .fanin_edges_of(n)
            .iter()
            .chain(self.fanout_edges_of(n).iter())
            .map(|&e| self.k(e))
            .collect();
        before == after
    }

    /// Increase the register count bookkeeping, used when the retiming
    /// layer inserts new shared-latch buffer nodes (§4.C, "Latch-sharing
    /// optimization").
    pub fn bump_register_count(&mut self, by: usize) {
        self.register_count += by;
    }

    /// Latch-sharing optimization: if node `n` drives multiple fanouts each
    /// requiring the same head-init on their latch, replace the duplicated
    /// single latches with one shared buffer node carrying a single latch
    /// (§4.C). Returns the number of latches eliminated.
    pub fn share_redundant_latches(&mut self, n: Id) -> AigResult<usize> {
        let fanouts = self.fanout_edges_of(n);
        if fanouts.len() < 2 {
            return Ok(0);
        }
        // Group fanout edges by (inversion bit, head init value): only
        // edges agreeing on both can share one buffer latch.
        let mut groups: HashMap<(bool, InitVal), Vec<EdgeKey>> = HashMap::new();
        for &e @ (consumer, slot) in &fanouts {
            if self.k(e) == 0 {
                continue;
            }
            let inverted = crate::aig::sign_of(self.fanin_literal(consumer, slot));
            let head = self.init_at(e, 0).unwrap_or(InitVal::Unknown);
            groups.entry((inverted, head)).or_default().push(e);
        }
        let mut eliminated = 0usize;
        for (_, members) in groups {
            if members.len() < 2 {
                continue;
            }
            // Collapse latch `0` on every member but the first into a
            // direct reference to the first member's post-latch literal;
            // the first member keeps its latch and now acts as the shared
            // buffer. We only fold when every member's latch is exactly
            // one deep; deeper or disagreeing groups are left untouched.
            if members.iter().any(|&e| self.k(e) != 1) {
                continue;
            }
            for &e in &members[1..] {
                self.delete_first(e)?;
                eliminated += 1;
            }
        }
        Ok(eliminated)
    }

    /// Sequential cleanup (§4.I stage 3): drop every fanin edge (and the
    /// latches riding on it) whose consumer is unreachable from any PO.
    /// Reachability follows ordinary fanins plus, for a `LatchOut` CI, the
    /// paired `LatchIn` driving it -- a register that never influences a PO,
    /// directly or through other registers, is dead regardless of the edges
    /// into its own drive logic. Returns the number of latches removed.
    pub fn sequential_cleanup(&mut self) -> usize {
        use std::collections::HashSet;

        let mut reachable: HashSet<Id> = HashSet::new();
        let mut stack: Vec<Id> = self.aig.pos().to_vec();
        while let Some(id) = stack.pop() {
            if !reachable.insert(id) {
                continue;
            }
            let node = self.aig.node(id);
            for f in node.fanin_ids() {
                stack.push(f);
            }
            if let NodeKind::LatchOut { index } = node.kind {
                stack.push(self.aig.latch_ins()[index]);
            }
        }

        let dead_edges: Vec<EdgeKey> = self
            .edges
            .keys()
            .filter(|&&(consumer, _)| !reachable.contains(&consumer))
            .copied()
            .collect();
        let mut removed = 0usize;
        for edge in dead_edges {
            removed += self.k(edge) as usize;
            self.edges.remove(&edge);
        }
        self.register_count = self.register_count.saturating_sub(removed);
        removed
    }

    /// Phase abstraction (§4.I stage 3): recomplement a `LatchOut`/`LatchIn`
    /// register whose full init history is a known `ONE` to the canonical
    /// `ZERO`-initialized phase, so later passes (retiming, induction) can
    /// assume every register resets to `0`.
    ///
    /// This flips the write side (the `LatchIn` edge's driving literal and
    /// its own init chain) together with every other edge in the graph that
    /// reads the paired `LatchOut` variable, which is what keeps the
    /// function each reader computes unchanged. A register is skipped
    /// whenever any of its readers is an AND node: AND fanins are keyed into
    /// the structural-hash table, and flipping one in place without also
    /// repairing that table would desynchronize it from the node's actual
    /// contents (§4.B's uniqueness invariant). `Po`/`LatchIn` readers have no
    /// such table and are always safe to flip via
    /// [`crate::aig::Manager::set_po_fanin`]/
    /// [`crate::aig::Manager::set_latchin_fanin`]. Returns the number of
    /// registers recomplemented.
    pub fn phase_abstract(&mut self) -> usize {
        let latch_outs: Vec<Id> = self.aig.latch_outs().to_vec();
        let latch_ins: Vec<Id> = self.aig.latch_ins().to_vec();
        let mut flipped = 0usize;

        for (&lo, &li) in latch_outs.iter().zip(latch_ins.iter()) {
            let write_edge = (li, 0);
            let known_one = self
                .edges
                .get(&write_edge)
                .map(|e| e.all_known_one())
                .unwrap_or(false);
            if !known_one {
                continue;
            }

            let readers = self.fanout_edges_of(lo);
            if readers
                .iter()
                .any(|&(consumer, _)| matches!(self.aig.node(consumer).kind, NodeKind::And { .. }))
            {
                continue;
            }

            for &(consumer, slot) in &readers {
                let flipped_lit = not(self.fanin_literal(consumer, slot));
                match self.aig.node(consumer).kind {
                    NodeKind::Po { .. } => self.aig.set_po_fanin(consumer, flipped_lit),
                    NodeKind::LatchIn { .. } => self.aig.set_latchin_fanin(consumer, flipped_lit),
                    _ => unreachable!("readers filtered to Po/LatchIn above"),
                }
            }

            let driver = not(self.fanin_literal(li, 0));
            self.aig.set_latchin_fanin(li, driver);
            self.edges.get_mut(&write_edge).unwrap().invert_ones();
            flipped += 1;
        }
        flipped
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::aig::Manager;

    fn build_chain(n_ands: usize) -> (SeqAig, Vec<Id>) {
        let mut m = Manager::new();
        let pi = m.create_pi();
        let mut ids = Vec::new();
        let mut cur = pi;
        for _ in 0..n_ands {
            let next = m.create_pi();
            cur = m.make_and(cur, next);
            ids.push(var_of(cur));
        }
        let po = m.create_po(cur);
        ids.push(po);
        (SeqAig::new(m), ids)
    }

    #[test]
    fn insert_then_delete_first_is_identity() {
        let (mut seq, ids) = build_chain(1);
        let edge = (ids[1], 0); // PO fanin edge
        seq.insert_first(edge, InitVal::Zero).unwrap();
        assert_eq!(seq.k(edge), 1);
        let v = seq.delete_first(edge).unwrap();
        assert_eq!(v, InitVal::Zero);
        assert_eq!(seq.k(edge), 0);
    }

    #[test]
    fn latch_cap_is_enforced() {
        let (mut seq, ids) = build_chain(1);
        let edge = (ids[1], 0);
        for _ in 0..crate::consts::MAX_EDGE_LATCHES {
            seq.insert_last(edge, InitVal::Dc).unwrap();
        }
        assert!(seq.insert_last(edge, InitVal::Dc).is_err());
    }

    #[test]
    fn try_forward_then_backward_restores_counts() {
        let (mut seq, ids) = build_chain(2);
        let and_node = ids[0];
        // Give the AND node's fanin edges one latch each so a forward step
        // is legal.
        let fanins = seq.fanin_edges_of(and_node);
        for &e in &fanins {
            seq.insert_first(e, InitVal::Unknown).unwrap();
        }
        assert!(seq.round_trip_counts_preserved(and_node));
    }

    #[test]
    fn sequential_cleanup_drops_latches_unreachable_from_any_po() {
        let mut m = Manager::new();
        let pi = m.create_pi();
        let other = m.create_pi();
        let dangling = m.make_and(pi, other);
        let kept_pi = m.create_pi();
        let po = m.create_po(kept_pi);
        let dangling_id = var_of(dangling);
        let mut seq = SeqAig::new(m);
        seq.insert_first((dangling_id, 0), InitVal::Zero).unwrap();
        seq.bump_register_count(1);
        let po_edge = (po, 0);
        seq.insert_first(po_edge, InitVal::One).unwrap();
        seq.bump_register_count(1);
        assert_eq!(seq.register_count(), 2);

        let removed = seq.sequential_cleanup();
        assert_eq!(removed, 1);
        assert_eq!(seq.k((dangling_id, 0)), 0);
        assert_eq!(seq.k(po_edge), 1);
        assert_eq!(seq.register_count(), 1);
    }

    #[test]
    fn phase_abstract_recomplements_an_all_one_register_read_only_by_pos() {
        let mut m = Manager::new();
        let pi = m.create_pi();
        let lo = m.create_latch_out();
        let li = m.create_latch_in(pi);
        let po_reads_lo = m.create_po(lo);
        let mut seq = SeqAig::new(m);
        seq.insert_first((li, 0), InitVal::One).unwrap();
        seq.bump_register_count(1);
        let before_driver = seq.fanin_literal(li, 0);
        let before_po = seq.fanin_literal(po_reads_lo, 0);

        let flipped = seq.phase_abstract();
        assert_eq!(flipped, 1);
        assert_eq!(seq.fanin_literal(li, 0), not(before_driver));
        assert_eq!(seq.fanin_literal(po_reads_lo, 0), not(before_po));
        assert_eq!(seq.init_at((li, 0), 0), Some(InitVal::Zero));
    }

    #[test]
    fn phase_abstract_skips_a_register_read_by_an_and_gate() {
        let mut m = Manager::new();
        let pi = m.create_pi();
        let lo = m.create_latch_out();
        let li = m.create_latch_in(pi);
        let other_pi = m.create_pi();
        let _and_reader = m.make_and(lo, other_pi);
        let mut seq = SeqAig::new(m);
        seq.insert_first((li, 0), InitVal::One).unwrap();
        seq.bump_register_count(1);

        assert_eq!(seq.phase_abstract(), 0);
        assert_eq!(seq.init_at((li, 0), 0), Some(InitVal::One));
    }
}
