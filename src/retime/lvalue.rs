//! Leiserson–Saxe L-value fixpoint (§4.D).

use std::collections::HashMap;

use crate::aig::node::NodeKind;
use crate::aig::var_of;
use crate::arena::Id;
use crate::consts::LVALUE_RELAX_PASSES;
use crate::seq::SeqAig;

/// `L(n)` for every node reachable from a PO, at candidate period `Fi`, or
/// `None` if the relaxation failed to converge within
/// [`LVALUE_RELAX_PASSES`] passes (§4.D, "non-convergence").
///
/// Because the underlying AIG is a DAG ordered by ascending id, a single
/// ascending pass already propagates every fanin's final value before its
/// consumer is visited, so convergence in practice takes one pass; the
/// multi-pass cap exists to bound pathological or partially-restructured
/// inputs, matching the relaxation the original algorithm performs over a
/// general node order.
pub fn compute(seq: &SeqAig, fi: i64) -> Option<HashMap<Id, i64>> {
    assert!(fi > 0, "compute: candidate period must be positive");
    let aig = seq.aig();
    let mut l: HashMap<Id, i64> = HashMap::new();
    l.insert(0, 0);
    for &pi in aig.pis() {
        l.insert(pi, 0);
    }

    let and_ids: Vec<Id> = aig
        .raw_nodes()
        .iter()
        .filter(|(_, n)| n.is_and())
        .map(|(id, _)| id)
        .collect();

    for _pass in 0..LVALUE_RELAX_PASSES {
        let mut changed = false;
        for &id in &and_ids {
            let (f0, f1) = match aig.node(id).kind {
                NodeKind::And { fanin0, fanin1 } => (fanin0, fanin1),
                _ => unreachable!(),
            };
            let k0 = seq.k((id, 0)) as i64;
            let k1 = seq.k((id, 1)) as i64;
            let l0 = *l.get(&var_of(f0)).unwrap_or(&0);
            let l1 = *l.get(&var_of(f1)).unwrap_or(&0);
            let candidate = 1 + (l0 - fi * k0).max(l1 - fi * k1);
            match l.get(&id).copied() {
                None => {
                    l.insert(id, candidate);
                    changed = true;
                }
                Some(current) if candidate > current => {
                    l.insert(id, candidate);
                    changed = true;
                }
                _ => {}
            }
        }
        if !changed {
            return Some(l);
        }
    }
    None
}

/// `lag(n) := floor((L(n) + 256*Fi)/Fi) - 256 - (L(n) mod Fi == 0 ? 1 : 0)`
/// (§4.D). Positive ⇒ backward retiming past `n`; negative ⇒ forward.
pub fn lag(l_n: i64, fi: i64) -> i64 {
    use crate::consts::LAG_BIAS;
    let biased = (l_n + LAG_BIAS * fi).div_euclid(fi) - LAG_BIAS;
    if l_n.rem_euclid(fi) == 0 {
        biased - 1
    } else {
        biased
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::aig::Manager;
    use crate::seq::SeqAig;

    #[test]
    fn pis_and_const_are_zero() {
        let mut m = Manager::new();
        let a = m.create_pi();
        let b = m.create_pi();
        let c = m.make_and(a, b);
        m.create_po(c);
        let seq = SeqAig::new(m);
        let l = compute(&seq, 3).expect("should converge");
        assert_eq!(l[&0], 0);
    }

    #[test]
    fn chain_without_latches_grows_by_one_level_per_and() {
        let mut m = Manager::new();
        let a = m.create_pi();
        let b = m.create_pi();
        let c = m.create_pi();
        let ab = m.make_and(a, b);
        let ab_id = crate::aig::var_of(ab);
        let abc = m.make_and(ab, c);
        let abc_id = crate::aig::var_of(abc);
        m.create_po(abc);
        let seq = SeqAig::new(m);
        let l = compute(&seq, 10).unwrap();
        assert_eq!(l[&ab_id], 1);
        assert_eq!(l[&abc_id], 2);
    }

    #[test]
    fn latches_on_fanin_reduce_l_value() {
        let mut m = Manager::new();
        let a = m.create_pi();
        let b = m.create_pi();
        let ab = m.make_and(a, b);
        let ab_id = crate::aig::var_of(ab);
        m.create_po(ab);
        let mut seq = SeqAig::new(m);
        let fanins = seq.fanin_edges_of(ab_id);
        seq.insert_first(fanins[0], crate::seq::InitVal::Zero).unwrap();
        let l = compute(&seq, 2).unwrap();
        // l0 = 0 - 2*1 = -2; l1 = 0 - 2*0 = 0; L = 1 + max(-2, 0) = 1.
        assert_eq!(l[&ab_id], 1);
    }

    #[test]
    fn lag_sign_matches_direction() {
        // L(n) well below Fi ⇒ negative lag (forward retiming).
        assert!(lag(0, 4) < 0);
        // L(n) large relative to Fi ⇒ positive lag (backward retiming).
        assert!(lag(20, 4) > 0);
    }
}
