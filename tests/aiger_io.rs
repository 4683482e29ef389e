//! AIGER reader / BLIF writer boundary behavior (§6, §8 scenario 1).

use aig_toolkit::aig::Manager;
use aig_toolkit::io::aiger::read_bytes;
use aig_toolkit::io::blif::write_string;
use aig_toolkit::seq::{InitVal, SeqAig};

fn scenario_one_bytes() -> Vec<u8> {
    // Scenario 1 (§8): `aig 3 2 0 1 1`, one AND of x1/x2, PO literal 6.
    let mut bytes = b"aig 3 2 0 1 1\n6\n".to_vec();
    bytes.push(2);
    bytes.push(2);
    bytes
}

#[test]
fn reads_scenario_one_and_its_header_counts_match_the_manager() {
    let seq = read_bytes(&scenario_one_bytes()).unwrap();
    assert_eq!(seq.aig().pis().len(), 2);
    assert_eq!(seq.aig().and_count(), 1);
    assert_eq!(seq.aig().pos().len(), 1);
    assert_eq!(seq.register_count(), 0);
}

#[test]
fn scenario_one_and_gate_truth_table_is_preserved() {
    let seq = read_bytes(&scenario_one_bytes()).unwrap();
    let combos = [
        (true, true, true),
        (true, false, false),
        (false, true, false),
        (false, false, false),
    ];
    for (x1, x2, want) in combos {
        let (_, po) = seq.aig().eval_all(&[x1, x2]);
        assert_eq!(po[0], want);
    }
}

#[test]
fn a_latch_with_no_init_token_defaults_to_zero() {
    // 1 PI, 1 latch driven by the PI with no trailing init token.
    let bytes = b"aig 2 1 1 1 0\n2\n4\n".to_vec();
    let seq = read_bytes(&bytes).unwrap();
    let edge = (seq.aig().latch_ins()[0], 0);
    assert_eq!(seq.init_at(edge, 0), Some(InitVal::Zero));
}

#[test]
fn a_latch_with_dont_care_init_round_trips_through_the_blif_writer() {
    let bytes = b"aig 2 1 1 1 0\n2 x\n4\n".to_vec();
    let seq = read_bytes(&bytes).unwrap();
    let edge = (seq.aig().latch_ins()[0], 0);
    assert_eq!(seq.init_at(edge, 0), Some(InitVal::Dc));

    let text = write_string(&seq, "scenario");
    assert!(text.contains(".latch"));
    assert!(text.trim_end().ends_with(".end") || text.contains(".end\n"));
}

#[test]
fn blif_writer_emits_an_inputs_and_outputs_line_for_every_pi_and_po() {
    let mut m = Manager::new();
    let a = m.create_pi();
    let b = m.create_pi();
    let c = m.make_and(a, b);
    m.create_po(c);
    m.create_po(a);
    let seq = SeqAig::new(m);
    let text = write_string(&seq, "two_outputs");
    assert_eq!(text.matches(".outputs").count(), 1);
    let outputs_line = text.lines().find(|l| l.starts_with(".outputs")).unwrap();
    assert_eq!(outputs_line.split_whitespace().count(), 3);
}

#[test]
fn rejects_truncated_binary_and_section() {
    let mut bytes = b"aig 3 2 0 1 1\n6\n".to_vec();
    bytes.push(0x80); // continuation bit set with no following byte
    let err = read_bytes(&bytes).unwrap_err();
    assert!(matches!(err, aig_toolkit::error::IoFormatError::TruncatedBody));
}
