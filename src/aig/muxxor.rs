//! MUX/XOR structural recognition (§4.B).
//!
//! Both patterns are "an AND of two inverted ANDs whose grandchildren share
//! a complementary literal pair" -- the two constructors differ only in how
//! much of the two inner ANDs' fanins overlap once that pair is factored
//! out. See [`Manager::mux`]/[`Manager::xor`] for the constructors this is
//! the inverse of.

use super::node::NodeKind;
use super::{not, sign_of, var_of, Lit, Manager};

struct TwoAnd {
    /// `n`'s own two fanins (both expected inverted).
    outer: (Lit, Lit),
    /// Fanins of the AND named by `outer.0` (sign already stripped).
    g0: (Lit, Lit),
    /// Fanins of the AND named by `outer.1` (sign already stripped).
    g1: (Lit, Lit),
}

/// If `n` is an AND node whose both fanins are themselves inverted AND
/// nodes, return the decomposed structure; otherwise `None`.
fn decompose(m: &Manager, n: super::super::arena::Id) -> Option<TwoAnd> {
    let (f0, f1) = m.node(n).and_fanins()?;
    if !sign_of(f0) || !sign_of(f1) {
        return None;
    }
    let g0n = var_of(f0);
    let g1n = var_of(f1);
    let g0 = m.node(g0n).and_fanins()?;
    let g1 = m.node(g1n).and_fanins()?;
    Some(TwoAnd {
        outer: (f0, f1),
        g0,
        g1,
    })
}

/// `is_mux_type(n)`: true iff `n` decomposes into two inverted ANDs whose
/// grandchildren share exactly one complementary literal pair (the control
/// variable), per §4.B.
pub fn is_mux_type(m: &Manager, n: super::super::arena::Id) -> bool {
    recognize_mux(m, n).is_some()
}

/// `recognize_mux(n) -> (c, t, e)`: returns the control and then/else legs
/// with polarities normalized so `c` is non-inverted (§4.B).
///
/// `n`'s fanins are `NOT(AND(c, t))` and `NOT(AND(NOT c, e))` in some order,
/// each stored by [`Manager::make_and`] with its own internal literal
/// ordering, so the shared control literal may appear in either slot of
/// either grandchild pair. We search all four `(g0 slot, g1 slot)`
/// combinations for the one complementary pair.
pub fn recognize_mux(m: &Manager, n: super::super::arena::Id) -> Option<(Lit, Lit, Lit)> {
    let two = decompose(m, n)?;
    let g0 = [two.g0.0, two.g0.1];
    let g1 = [two.g1.0, two.g1.1];
    for i in 0..2 {
        for j in 0..2 {
            if g1[j] == not(g0[i]) {
                let control = g0[i];
                let then_leg = g0[1 - i];
                let else_leg = g1[1 - j];
                return Some(if sign_of(control) {
                    (not(control), else_leg, then_leg)
                } else {
                    (control, then_leg, else_leg)
                });
            }
        }
    }
    None
}

/// `recognize_exor(n) -> (a, b)`: true iff `n` is the canonical two-AND
/// encoding of `a XOR b` (§4.B). Here the grandchildren of the two inner
/// ANDs are a *complete* complementary pair (no variable shared outright).
pub fn recognize_exor(m: &Manager, n: super::super::arena::Id) -> Option<(Lit, Lit)> {
    let two = decompose(m, n)?;
    let (a0, b0) = two.g0;
    let (a1, b1) = two.g1;
    if a1 == not(a0) && b1 == not(b0) {
        return Some((a0, b0));
    }
    if a1 == not(b0) && b1 == not(a0) {
        return Some((a0, b0));
    }
    None
}
