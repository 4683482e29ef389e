//! Feasibility search over candidate clock periods (§4.D).

use std::collections::HashMap;

use crate::aig::node::NodeKind;
use crate::arena::Id;
use crate::seq::SeqAig;

use super::lvalue;

/// `max_level(N)`: the greatest combinational level among nodes reachable
/// from a PO (§4.D, `Fi_max := max_level(N)+2`).
pub fn max_level(seq: &SeqAig) -> u32 {
    seq.aig()
        .raw_nodes()
        .iter()
        .filter(|(_, n)| n.is_and() || matches!(n.kind, NodeKind::Po { .. }))
        .map(|(_, n)| n.level)
        .max()
        .unwrap_or(0)
}

/// True iff every PO fanin edge satisfies `L(u) - Fi*k_u <= Fi` (§4.D).
pub fn is_feasible(seq: &SeqAig, fi: i64) -> bool {
    let Some(l) = lvalue::compute(seq, fi) else {
        return false;
    };
    feasible_given_l(seq, fi, &l)
}

fn feasible_given_l(seq: &SeqAig, fi: i64, l: &HashMap<Id, i64>) -> bool {
    for &po in seq.aig().pos() {
        let fanin = match seq.aig().node(po).kind {
            NodeKind::Po { fanin, .. } => fanin,
            _ => unreachable!(),
        };
        let k = seq.k((po, 0)) as i64;
        let lu = *l.get(&crate::aig::var_of(fanin)).unwrap_or(&0);
        if lu - fi * k > fi {
            return false;
        }
    }
    true
}

/// Result of a completed feasibility search: the minimum feasible period and
/// the L-value table computed at that period, ready for
/// [`super::moves::lag_vector`].
pub struct SearchResult {
    pub period: i64,
    pub l_values: HashMap<Id, i64>,
}

/// Binary-search the smallest feasible `Fi` in `(0, Fi_max]`
/// (§4.D, "feasibility search"). `Fi_max` is always feasible by
/// construction (§8), so the search is total.
pub fn minimal_feasible_period(seq: &SeqAig) -> SearchResult {
    let fi_max = max_level(seq) as i64 + 2;
    debug_assert!(is_feasible(seq, fi_max), "Fi_max must always be feasible");

    let mut lo: i64 = 1;
    let mut hi: i64 = fi_max;
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if is_feasible(seq, mid) {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    let l_values = lvalue::compute(seq, lo).expect("minimal feasible period must converge");
    SearchResult { period: lo, l_values }
}
