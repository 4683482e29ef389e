//! Counter-example resimulation (§4.B).
//!
//! Given a bit-packed counter-example over a sequential AIG, replay it frame
//! by frame and check that the named PO evaluates to `1` at the named
//! frame. Used both as a proof obligation (§8) and as driver feedback
//! (§4.I).

use super::Manager;

/// A bit-packed counter-example: the frame and PO under test, the register
/// count assumed, the PI count per frame, and the flattened PI bit stream
/// (`nFrames * nPis` bits, row-major by frame).
#[derive(Debug, Clone)]
pub struct Cex {
    /// Frame at which `po` is claimed to evaluate to `1`.
    pub frame: usize,
    /// Index of the PO under test.
    pub po: usize,
    /// Number of registers in the AIG this cex was produced against.
    pub regs: usize,
    /// Number of PIs per frame.
    pub pis: usize,
    /// `bits[f * pis + i]` is the value of PI `i` at frame `f`.
    pub bits: Vec<bool>,
}

impl Cex {
    /// PI values for frame `f`.
    pub fn frame_inputs(&self, f: usize) -> &[bool] {
        &self.bits[f * self.pis..(f + 1) * self.pis]
    }
}

/// Resimulate `cex` against `aig`'s combinational PO logic, treating the
/// trailing `regs` PIs as the unrolled register state carried from the
/// previous frame (the same convention `mc::Driver`'s BMC unroller uses,
/// §4.I step 2). Returns true iff PO `cex.po` evaluates to `1` at
/// `cex.frame`.
///
/// `aig` is expected to be single-frame combinational logic whose first
/// `aig.pis().len() - regs` PIs are the real primary inputs and whose
/// remaining `regs` PIs are the current-state latch outputs, mirroring the
/// unrolled-frame convention used throughout the retiming and
/// model-checking passes.
pub fn resimulate(aig: &Manager, cex: &Cex) -> bool {
    assert_eq!(aig.pis().len(), cex.pis + cex.regs, "cex PI layout does not match aig");
    let mut state = vec![false; cex.regs];
    let mut last_po = vec![false; aig.pos().len()];
    for f in 0..=cex.frame {
        let mut inputs = cex.frame_inputs(f).to_vec();
        inputs.extend_from_slice(&state);
        let (_, po_values) = aig.eval_all(&inputs);
        last_po = po_values;
        // The convention here treats the AIG's extra "latch" POs (appended
        // after the real ones, §9 open question 1) as the next-state
        // values; callers that model real+latch POs together pass a
        // `regs`-sized tail of POs for that purpose.
        if cex.regs > 0 {
            let real_po_count = aig.pos().len() - cex.regs;
            state = last_po[real_po_count..].to_vec();
        }
    }
    last_po[cex.po]
}
