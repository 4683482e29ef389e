//! AIG node records (§3, "AIG node").

use crate::arena::Id;

/// The tagged variant of an AIG object (§9, "Polymorphism by type tag").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// The single constant-false source, always id 0.
    Const0,
    /// A primary input. Carries no fanins.
    Pi {
        /// Index into the manager's PI order.
        index: usize,
    },
    /// A primary output. Carries one fanin literal (the driver) and no
    /// fanout; POs are never shared/strashed.
    Po {
        /// Index into the manager's PO order.
        index: usize,
        /// The literal this PO observes.
        fanin: super::Lit,
    },
    /// A two-input AND gate, canonically ordered `fanin0 <= fanin1`.
    And {
        /// Smaller-or-equal fanin literal.
        fanin0: super::Lit,
        /// Greater-or-equal fanin literal.
        fanin1: super::Lit,
    },
    /// A latch output (a CI that is not a PI): the register's current-state
    /// terminal.
    LatchOut {
        /// Index into the manager's latch order.
        index: usize,
    },
    /// A latch input (a CO that is not a PO): the register's next-state
    /// terminal. Carries the literal driving the latch.
    LatchIn {
        /// Index into the manager's latch order.
        index: usize,
        /// The literal driving this latch's next state.
        fanin: super::Lit,
    },
}

/// A single AIG node record (§3).
#[derive(Debug, Clone)]
pub struct Node {
    /// Tagged payload; see [`NodeKind`].
    pub kind: NodeKind,
    /// Number of fanins (PO/PI/AND/etc) that reference this node's literal.
    pub fanout_count: u32,
    /// Topological level: `0` for PI/Const0, `1 + max(level(fanins))` for
    /// AND nodes.
    pub level: u32,
    /// Compile-time canonical polarity bit, set by constructors that fold
    /// double negation; purely advisory, never read by strashing itself.
    pub phase: bool,
    /// Transient scratch field used by passes; never valid across pass
    /// boundaries (§3).
    pub scratch: i64,
}

impl Node {
    /// Construct the implicit node for id 0.
    pub fn const0() -> Self {
        Node {
            kind: NodeKind::Const0,
            fanout_count: 0,
            level: 0,
            phase: false,
            scratch: 0,
        }
    }

    /// True iff this node is an AND gate.
    pub fn is_and(&self) -> bool {
        matches!(self.kind, NodeKind::And { .. })
    }

    /// True iff this node is a primary or latch input (a CI).
    pub fn is_ci(&self) -> bool {
        matches!(self.kind, NodeKind::Pi { .. } | NodeKind::LatchOut { .. })
    }

    /// True iff this node is a primary or latch output (a CO).
    pub fn is_co(&self) -> bool {
        matches!(self.kind, NodeKind::Po { .. } | NodeKind::LatchIn { .. })
    }

    /// The two fanin literals of an AND node, if applicable.
    pub fn and_fanins(&self) -> Option<(super::Lit, super::Lit)> {
        match self.kind {
            NodeKind::And { fanin0, fanin1 } => Some((fanin0, fanin1)),
            _ => None,
        }
    }

    /// All fanin ids this node structurally depends on (for invariant
    /// checks); terminals return an empty vec.
    pub fn fanin_ids(&self) -> Vec<Id> {
        match self.kind {
            NodeKind::And { fanin0, fanin1 } => {
                vec![super::var_of(fanin0), super::var_of(fanin1)]
            }
            NodeKind::Po { fanin, .. } | NodeKind::LatchIn { fanin, .. } => {
                vec![super::var_of(fanin)]
            }
            _ => vec![],
        }
    }
}
