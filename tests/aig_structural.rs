//! Structural AIG invariants and duplication-variant equivalence (§8).

use aig_toolkit::aig::dup::{self, MiterOp};
use aig_toolkit::aig::muxxor::{is_mux_type, recognize_exor};
use aig_toolkit::aig::{not, var_of, Manager};

fn build_miter_and_or() -> (Manager, Manager) {
    let mut and_m = Manager::new();
    let a0 = and_m.create_pi();
    let b0 = and_m.create_pi();
    let out0 = and_m.make_and(a0, b0);
    and_m.create_po(out0);

    let mut or_m = Manager::new();
    let a1 = or_m.create_pi();
    let b1 = or_m.create_pi();
    let out1 = or_m.or(a1, b1);
    or_m.create_po(out1);

    (and_m, or_m)
}

#[test]
fn strashing_deduplicates_identical_ands_across_orders() {
    let mut m = Manager::new();
    let a = m.create_pi();
    let b = m.create_pi();
    let c = m.create_pi();
    let ab1 = m.make_and(a, b);
    let abc1 = m.make_and(ab1, c);
    let ab2 = m.make_and(b, a);
    let abc2 = m.make_and(c, ab2);
    assert_eq!(ab1, ab2);
    assert_eq!(abc1, abc2);
    assert_eq!(m.and_count(), 2);
    assert!(m.check_strash_uniqueness());
}

#[test]
fn topological_ids_hold_after_a_nontrivial_build() {
    let mut m = Manager::new();
    let mut cur = m.create_pi();
    for _ in 0..8 {
        let pi = m.create_pi();
        cur = m.xor(cur, pi);
    }
    m.create_po(cur);
    assert!(m.check_topological_ids());
}

#[test]
fn cleanup_leaves_every_node_reachable_from_a_po() {
    let mut m = Manager::new();
    let a = m.create_pi();
    let b = m.create_pi();
    let dangling = m.make_and(a, b);
    let c = m.create_pi();
    let live = m.make_and(a, c);
    m.create_po(live);

    let reachable = m.mark_reachable_from_pos();
    assert!(reachable.contains(&var_of(live)));
    assert!(reachable.contains(&var_of(a)));
    assert!(reachable.contains(&var_of(c)));
    assert!(!reachable.contains(&var_of(dangling)));
    assert!(!reachable.contains(&var_of(b)));
}

#[test]
fn duplication_variants_preserve_the_function() {
    let mut src = Manager::new();
    let a = src.create_pi();
    let b = src.create_pi();
    let c = src.create_pi();
    let ab = src.make_and(a, b);
    let f = src.xor(ab, c);
    src.create_po(f);

    let (simple, _) = dup::duplicate_simple(&src);
    let (dfs, _) = dup::duplicate_dfs(&src);
    let (ordered, _) = dup::duplicate_ordered(&src);

    for bits in [
        [true, true, true],
        [true, false, true],
        [false, true, false],
        [false, false, false],
    ] {
        let (_, want) = src.eval_all(&bits);
        let (_, got_simple) = simple.eval_all(&bits);
        let (_, got_dfs) = dfs.eval_all(&bits);
        let (_, got_ordered) = ordered.eval_all(&bits);
        assert_eq!(want, got_simple);
        assert_eq!(want, got_dfs);
        assert_eq!(want, got_ordered);
    }
}

#[test]
fn miter_of_and_and_or_under_xor_is_sat_with_differing_inputs() {
    // Scenario 2 (§8): miter of a 2-input AND and a 2-input OR under Oper=0
    // (XOR). Any satisfying assignment to the miter must disagree on the
    // two functions, which only happens when x1 != x2.
    let (and_m, or_m) = build_miter_and_or();
    let miter = dup::miter(&and_m, &or_m, MiterOp::Xor).unwrap();
    // AND(x1,x2) != OR(x1,x2) exactly when x1 != x2.
    let (_, po_diff) = miter.eval_all(&[true, false]);
    assert_eq!(po_diff, vec![true]);
    let (_, po_same_t) = miter.eval_all(&[true, true]);
    assert_eq!(po_same_t, vec![false]);
    let (_, po_same_f) = miter.eval_all(&[false, false]);
    assert_eq!(po_same_f, vec![false]);
}

#[test]
fn xor_construction_is_recognized_and_and_is_not_mux_or_xor() {
    let mut m = Manager::new();
    let a = m.create_pi();
    let b = m.create_pi();
    let xor_lit = m.xor(a, b);
    let xor_node = var_of(xor_lit);
    assert!(recognize_exor(&m, xor_node).is_some());

    let and_lit = m.make_and(a, b);
    let and_node = var_of(and_lit);
    assert!(!is_mux_type(&m, and_node));
    assert!(recognize_exor(&m, and_node).is_none());
    let _ = not(and_lit);
}
