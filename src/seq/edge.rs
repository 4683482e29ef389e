//! Per-edge latch annotation: count plus a ring of init values (§3,
//! "Sequential edge").

use std::collections::VecDeque;

use crate::consts::MAX_EDGE_LATCHES;
use crate::error::{AigError, AigResult};

/// A register's initial value: `ZERO`/`ONE`/`DC` (don't-care) per the AIGER
/// convention, plus `Unknown` for latches created mid-retiming whose init
/// has not yet been reconstructed by `retime::apply`'s SAT-based pass
/// (§4.D).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InitVal {
    Zero,
    One,
    Dc,
    Unknown,
}

impl InitVal {
    /// Invert a propagated init value through a signed fanin literal.
    pub fn invert(self) -> InitVal {
        match self {
            InitVal::Zero => InitVal::One,
            InitVal::One => InitVal::Zero,
            InitVal::Dc => InitVal::Dc,
            InitVal::Unknown => InitVal::Unknown,
        }
    }

    /// Combine several per-fanout head-init readings into one tail-insert
    /// value (§4.C, retime-forward step 1/2): `ZERO` dominates, `DC`/
    /// `Unknown` otherwise dominate over a unanimous `ONE`.
    pub fn combine(values: &[InitVal]) -> InitVal {
        if values.is_empty() {
            return InitVal::Dc;
        }
        if values.iter().any(|&v| v == InitVal::Zero) {
            return InitVal::Zero;
        }
        if values.iter().all(|&v| v == InitVal::One) {
            return InitVal::One;
        }
        if values.iter().any(|&v| v == InitVal::Unknown) {
            return InitVal::Unknown;
        }
        InitVal::Dc
    }
}

/// The latch stack on one fanin edge: up to [`MAX_EDGE_LATCHES`] registers,
/// head = nearest the edge's source, tail = nearest its consumer.
#[derive(Debug, Clone, Default)]
pub struct EdgeLatch {
    inits: VecDeque<InitVal>,
}

impl EdgeLatch {
    /// Number of latches currently on this edge.
    pub fn len(&self) -> u32 {
        self.inits.len() as u32
    }

    /// True iff this edge carries no latches.
    pub fn is_empty(&self) -> bool {
        self.inits.is_empty()
    }

    /// Init value at position `i` (head = 0), if present.
    pub fn get(&self, i: usize) -> Option<InitVal> {
        self.inits.get(i).copied()
    }

    fn check_capacity(&self) -> AigResult<()> {
        let next = self.inits.len() as u32 + 1;
        if next > MAX_EDGE_LATCHES {
            return Err(AigError::LatchCapExceeded(next));
        }
        Ok(())
    }

    /// Push a new latch at the head (closest to the edge's source).
    pub fn insert_first(&mut self, v: InitVal) -> AigResult<()> {
        self.check_capacity()?;
        self.inits.push_front(v);
        Ok(())
    }

    /// Push a new latch at the tail (closest to the edge's consumer).
    pub fn insert_last(&mut self, v: InitVal) -> AigResult<()> {
        self.check_capacity()?;
        self.inits.push_back(v);
        Ok(())
    }

    /// Pop the head latch's init value.
    pub fn delete_first(&mut self) -> AigResult<InitVal> {
        self.inits
            .pop_front()
            .ok_or_else(|| AigError::Precondition("delete_first on an empty edge".into()))
    }

    /// Pop the tail latch's init value.
    pub fn delete_last(&mut self) -> AigResult<InitVal> {
        self.inits
            .pop_back()
            .ok_or_else(|| AigError::Precondition("delete_last on an empty edge".into()))
    }

    /// True iff every position on this edge is a known `ONE` (the
    /// precondition for phase abstraction's reset-canonicalization, §4.I).
    pub fn all_known_one(&self) -> bool {
        !self.inits.is_empty() && self.inits.iter().all(|&v| v == InitVal::One)
    }

    /// Recomplement every position: `ONE` becomes `ZERO`. Callers must check
    /// [`EdgeLatch::all_known_one`] first; positions that aren't a known
    /// `ONE` are left untouched.
    pub fn invert_ones(&mut self) {
        for v in self.inits.iter_mut() {
            if *v == InitVal::One {
                *v = InitVal::Zero;
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn combine_zero_dominates() {
        let v = InitVal::combine(&[InitVal::One, InitVal::Zero, InitVal::Dc]);
        assert_eq!(v, InitVal::Zero);
    }

    #[test]
    fn combine_unanimous_one() {
        let v = InitVal::combine(&[InitVal::One, InitVal::One]);
        assert_eq!(v, InitVal::One);
    }

    #[test]
    fn combine_mixed_without_zero_is_dc_or_unknown() {
        assert_eq!(InitVal::combine(&[InitVal::One, InitVal::Dc]), InitVal::Dc);
        assert_eq!(
            InitVal::combine(&[InitVal::One, InitVal::Unknown]),
            InitVal::Unknown
        );
    }

    #[test]
    fn fifo_ordering_head_and_tail() {
        let mut e = EdgeLatch::default();
        e.insert_last(InitVal::Zero).unwrap();
        e.insert_last(InitVal::One).unwrap();
        e.insert_first(InitVal::Dc).unwrap();
        assert_eq!(e.get(0), Some(InitVal::Dc));
        assert_eq!(e.get(1), Some(InitVal::Zero));
        assert_eq!(e.get(2), Some(InitVal::One));
        assert_eq!(e.delete_last().unwrap(), InitVal::One);
        assert_eq!(e.delete_first().unwrap(), InitVal::Dc);
        assert_eq!(e.len(), 1);
    }
}
