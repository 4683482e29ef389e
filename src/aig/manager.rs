//! The structural AIG manager: strashing, derived gates, and traversal
//! utilities (§4.B, §3 "AIG manager").

use std::collections::HashMap;

use crate::arena::{Arena, Id};
use crate::error::{AigError, AigResult};

use super::node::{Node, NodeKind};
use super::{is_const, mk_lit, not, sign_of, var_of, Lit, CONST0_LIT, CONST1_LIT};

/// Owns the node pool, PI/PO ordering, and the structural-hash table that
/// guarantees "no two structurally identical AND nodes exist" (§4.B).
#[derive(Debug, Clone)]
pub struct Manager {
    nodes: Arena<Node>,
    /// Structural-hash table keyed on the ordered fanin literal pair.
    strash: HashMap<(Lit, Lit), Id>,
    pis: Vec<Id>,
    pos: Vec<Id>,
    /// Latch output (CI) ids, in register order. A latch output behaves
    /// like a PI to every other node's fanins (§3, "CI is either a PI or a
    /// latch output").
    latch_outs: Vec<Id>,
    /// Latch input (CO) ids, in register order, paired index-for-index with
    /// `latch_outs` (§3, "CO is either a PO or a latch input").
    latch_ins: Vec<Id>,
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}

impl Manager {
    /// A manager with only the constant-0 node (§3, "created empty").
    pub fn new() -> Self {
        let mut nodes = Arena::new();
        let id = nodes.new_object(Node::const0());
        debug_assert_eq!(id, 0);
        Manager {
            nodes,
            strash: HashMap::new(),
            pis: Vec::new(),
            pos: Vec::new(),
            latch_outs: Vec::new(),
            latch_ins: Vec::new(),
        }
    }

    /// Number of nodes, including the constant and all terminals.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Primary input literals, in declaration order.
    pub fn pi_lits(&self) -> Vec<Lit> {
        self.pis.iter().map(|&id| mk_lit(id, false)).collect()
    }

    /// Primary input ids, in declaration order.
    pub fn pis(&self) -> &[Id] {
        &self.pis
    }

    /// Primary output ids, in declaration order.
    pub fn pos(&self) -> &[Id] {
        &self.pos
    }

    /// Latch output (CI) ids, in register order.
    pub fn latch_outs(&self) -> &[Id] {
        &self.latch_outs
    }

    /// Latch input (CO) ids, in register order, index-paired with
    /// [`Manager::latch_outs`].
    pub fn latch_ins(&self) -> &[Id] {
        &self.latch_ins
    }

    /// Number of registers (§3, "for sequential AIGs the register count").
    pub fn register_count(&self) -> usize {
        self.latch_outs.len()
    }

    /// Borrow a node by id.
    pub fn node(&self, id: Id) -> &Node {
        self.nodes.get(id)
    }

    /// Number of AND nodes that are reachable from at least one fanin edge.
    pub fn and_count(&self) -> usize {
        self.nodes.iter().filter(|(_, n)| n.is_and()).count()
    }

    fn level_of(&self, lit: Lit) -> u32 {
        self.nodes.get(var_of(lit)).level
    }

    fn bump_fanout(&mut self, lit: Lit) {
        self.nodes.get_mut(var_of(lit)).fanout_count += 1;
    }

    /// Create a new primary input, returning its non-inverted literal.
    pub fn create_pi(&mut self) -> Lit {
        let index = self.pis.len();
        let id = self.nodes.new_object(Node {
            kind: NodeKind::Pi { index },
            fanout_count: 0,
            level: 0,
            phase: false,
            scratch: 0,
        });
        self.pis.push(id);
        mk_lit(id, false)
    }

    /// Create a new primary output observing `fanin`, returning its id.
    pub fn create_po(&mut self, fanin: Lit) -> Id {
        let index = self.pos.len();
        let id = self.nodes.new_object(Node {
            kind: NodeKind::Po { index, fanin },
            fanout_count: 0,
            level: self.level_of(fanin),
            phase: false,
            scratch: 0,
        });
        self.pos.push(id);
        self.bump_fanout(fanin);
        id
    }

    /// Re-point an existing PO's fanin (used by duplication/cleanup passes).
    pub fn set_po_fanin(&mut self, po_id: Id, fanin: Lit) {
        let index = match self.nodes.get(po_id).kind {
            NodeKind::Po { index, .. } => index,
            _ => panic!("set_po_fanin: {po_id} is not a PO"),
        };
        self.bump_fanout(fanin);
        self.nodes.get_mut(po_id).kind = NodeKind::Po { index, fanin };
    }

    /// Re-point an existing latch input's driving literal (used by
    /// `seq::phase_abstract` to recomplement a register's write side). Like
    /// [`Manager::set_po_fanin`], this never touches the strash table: latch
    /// inputs are COs, never a key in `(Lit, Lit)` pairs.
    pub fn set_latchin_fanin(&mut self, latch_in_id: Id, fanin: Lit) {
        let index = match self.nodes.get(latch_in_id).kind {
            NodeKind::LatchIn { index, .. } => index,
            _ => panic!("set_latchin_fanin: {latch_in_id} is not a latch input"),
        };
        self.bump_fanout(fanin);
        self.nodes.get_mut(latch_in_id).kind = NodeKind::LatchIn { index, fanin };
    }

    /// Create a new latch output (a CI that is not a PI), returning its
    /// non-inverted literal. The matching latch input must be created
    /// separately via [`Manager::create_latch_in`]; the caller is
    /// responsible for keeping register order aligned between the two
    /// (§3, "Sequential edge", and the AIGER lowering in `crate::io::aiger`).
    pub fn create_latch_out(&mut self) -> Lit {
        let index = self.latch_outs.len();
        let id = self.nodes.new_object(Node {
            kind: NodeKind::LatchOut { index },
            fanout_count: 0,
            level: 0,
            phase: false,
            scratch: 0,
        });
        self.latch_outs.push(id);
        mk_lit(id, false)
    }

    /// Create a new latch input (a CO that is not a PO) observing `fanin`,
    /// returning its id. Latch inputs may reference fanin variables with a
    /// *higher* id than their own: sequential feedback breaks the purely
    /// combinational "topological ids" invariant by design (§9, latches are
    /// exempt from `check_topological_ids`).
    pub fn create_latch_in(&mut self, fanin: Lit) -> Id {
        let index = self.latch_ins.len();
        let id = self.nodes.new_object(Node {
            kind: NodeKind::LatchIn { index, fanin },
            fanout_count: 0,
            level: 0,
            phase: false,
            scratch: 0,
        });
        self.latch_ins.push(id);
        self.bump_fanout(fanin);
        id
    }

    /// Strashing core: `make_and(a, b)` normalizes, short-circuits trivial
    /// cases, looks the pair up in the hash table, and allocates a fresh AND
    /// node on miss (§4.B). This is the only way AND nodes are created.
    pub fn make_and(&mut self, a: Lit, b: Lit) -> Lit {
        let (a, b) = if a <= b { (a, b) } else { (b, a) };
        if a == CONST0_LIT {
            return CONST0_LIT;
        }
        if a == CONST1_LIT {
            return b;
        }
        if a == b {
            return a;
        }
        if a == not(b) {
            return CONST0_LIT;
        }
        if let Some(&id) = self.strash.get(&(a, b)) {
            return mk_lit(id, false);
        }
        let level = 1 + self.level_of(a).max(self.level_of(b));
        let id = self.nodes.new_object(Node {
            kind: NodeKind::And {
                fanin0: a,
                fanin1: b,
            },
            fanout_count: 0,
            level,
            phase: false,
            scratch: 0,
        });
        self.strash.insert((a, b), id);
        self.bump_fanout(a);
        self.bump_fanout(b);
        mk_lit(id, false)
    }

    /// `or(a, b) = NOT(AND(NOT a, NOT b))` (§4.B).
    pub fn or(&mut self, a: Lit, b: Lit) -> Lit {
        not(self.make_and(not(a), not(b)))
    }

    /// `xor(a, b) = OR(AND(a, NOT b), AND(NOT a, b))` (§4.B).
    pub fn xor(&mut self, a: Lit, b: Lit) -> Lit {
        let p = self.make_and(a, not(b));
        let q = self.make_and(not(a), b);
        self.or(p, q)
    }

    /// `mux(c, t, e) = OR(AND(c, t), AND(NOT c, e))` (§4.B).
    pub fn mux(&mut self, c: Lit, t: Lit, e: Lit) -> Lit {
        let p = self.make_and(c, t);
        let q = self.make_and(not(c), e);
        self.or(p, q)
    }

    /// Variadic AND reduction built on [`Manager::make_and`].
    pub fn and_many(&mut self, lits: impl IntoIterator<Item = Lit>) -> Lit {
        lits.into_iter().fold(CONST1_LIT, |acc, l| self.make_and(acc, l))
    }

    /// Variadic OR reduction built on [`Manager::or`].
    pub fn or_many(&mut self, lits: impl IntoIterator<Item = Lit>) -> Lit {
        lits.into_iter().fold(CONST0_LIT, |acc, l| self.or(acc, l))
    }

    /// Mark every node reachable from the current POs, returning the marked
    /// ids in topological (ascending id) order. Uses the arena's traversal
    /// counter (§4.A), so no extra allocation beyond the output vec.
    pub fn mark_reachable_from_pos(&mut self) -> Vec<Id> {
        self.nodes.increment_traversal();
        let mut stack: Vec<Id> = self.pos.iter().copied().collect();
        let mut order = Vec::new();
        while let Some(id) = stack.pop() {
            if self.nodes.is_marked(id) {
                continue;
            }
            self.nodes.mark(id);
            order.push(id);
            let fanins = self.nodes.get(id).fanin_ids();
            for f in fanins {
                if !self.nodes.is_marked(f) {
                    stack.push(f);
                }
            }
        }
        order.sort_unstable();
        order
    }

    /// Topological-ids invariant check (§4.A/§8): every AND/PO fanin id is
    /// strictly less than the consumer's own id. Latch inputs are exempt:
    /// sequential feedback is legal and routinely produces a latch input
    /// whose fanin id exceeds its own (§9).
    pub fn check_topological_ids(&self) -> bool {
        crate::arena::topological_ids_invariant_check(&self.nodes, |n: &Node| {
            if matches!(n.kind, NodeKind::LatchIn { .. }) {
                Vec::new()
            } else {
                n.fanin_ids()
            }
        })
    }

    /// Validate structural uniqueness: every `(a, b)` pair present in the
    /// hash table still resolves to the node that created it (§8).
    pub fn check_strash_uniqueness(&self) -> bool {
        self.strash
            .iter()
            .all(|(&(a, b), &id)| matches!(self.nodes.get(id).and_fanins(), Some((f0, f1)) if (f0, f1) == (a, b)))
    }

    /// Evaluate a literal given a full variable-value assignment (by id).
    /// Used by duplication equivalence tests and simple verification.
    pub fn eval(&self, lit: Lit, values: &[bool]) -> bool {
        let v = values[var_of(lit) as usize];
        v ^ sign_of(lit)
    }

    /// Evaluate every node's value given PI values (indexed by PI order),
    /// returning a dense `values[var_id] = value` table plus the PO values.
    pub fn eval_all(&self, pi_values: &[bool]) -> (Vec<bool>, Vec<bool>) {
        let mut values = vec![false; self.nodes.len()];
        for (pos, &pi_id) in self.pis.iter().enumerate() {
            values[pi_id as usize] = pi_values[pos];
        }
        for (id, node) in self.nodes.iter() {
            if id == 0 {
                continue;
            }
            match node.kind {
                NodeKind::And { fanin0, fanin1 } => {
                    let a = self.eval(fanin0, &values);
                    let b = self.eval(fanin1, &values);
                    values[id as usize] = a && b;
                }
                _ => {}
            }
        }
        let po_values = self
            .pos
            .iter()
            .map(|&id| match self.nodes.get(id).kind {
                NodeKind::Po { fanin, .. } => self.eval(fanin, &values),
                _ => unreachable!(),
            })
            .collect();
        (values, po_values)
    }

    /// Internal: used by `dup` to append a pre-built node directly (only
    /// for terminals whose identity cannot be produced through
    /// `make_and`/`create_pi`/`create_po`, i.e. latch terminals owned by
    /// `crate::seq`).
    pub(crate) fn raw_nodes(&self) -> &Arena<Node> {
        &self.nodes
    }

    /// Assert a cheap, always-checked invariant used throughout duplication
    /// passes: `lit` must name an id within range.
    pub fn require_valid_lit(&self, lit: Lit) -> AigResult<()> {
        if !is_const(lit) && (var_of(lit) as usize) >= self.nodes.len() {
            return Err(AigError::Precondition(format!(
                "literal {lit} references out-of-range variable {}",
                var_of(lit)
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn make_and_is_commutative_and_unique() {
        let mut m = Manager::new();
        let a = m.create_pi();
        let b = m.create_pi();
        let l1 = m.make_and(a, b);
        let l2 = m.make_and(b, a);
        assert_eq!(l1, l2);
        assert_eq!(m.and_count(), 1);
    }

    #[test]
    fn make_and_short_circuits() {
        let mut m = Manager::new();
        let a = m.create_pi();
        assert_eq!(m.make_and(CONST0_LIT, a), CONST0_LIT);
        assert_eq!(m.make_and(CONST1_LIT, a), a);
        assert_eq!(m.make_and(a, a), a);
        assert_eq!(m.make_and(a, not(a)), CONST0_LIT);
    }

    #[test]
    fn topological_ids_hold_for_every_and() {
        let mut m = Manager::new();
        let a = m.create_pi();
        let b = m.create_pi();
        let c = m.make_and(a, b);
        let _ = m.create_po(c);
        assert!(m.check_topological_ids());
        assert!(m.check_strash_uniqueness());
    }

    #[test]
    fn eval_matches_truth_table_for_and() {
        let mut m = Manager::new();
        let a = m.create_pi();
        let b = m.create_pi();
        let c = m.make_and(a, b);
        let _ = m.create_po(c);
        let (_, pos) = m.eval_all(&[true, true]);
        assert_eq!(pos, vec![true]);
        let (_, pos) = m.eval_all(&[true, false]);
        assert_eq!(pos, vec![false]);
    }

    #[test]
    fn mark_reachable_excludes_dangling_nodes() {
        let mut m = Manager::new();
        let a = m.create_pi();
        let b = m.create_pi();
        let _dangling = m.make_and(a, b);
        let c = m.create_pi();
        let d = m.make_and(a, c);
        let _ = m.create_po(d);
        let reachable = m.mark_reachable_from_pos();
        assert!(reachable.contains(&var_of(d)));
    }
}
