//! AIGER binary format reader (§6, "AIGER binary format (input)").
//!
//! Implements exactly the encoding §6 describes: an ASCII header
//! `aig M I L O A\n`, then `L+O` ASCII driver-literal lines (latches first,
//! then outputs, each latch line optionally carrying a second `0`/`1`/`x`
//! init token), then `A` AND gates in binary delta encoding. Symbol tables
//! and the trailing `c`-delimited comment section are not parsed (§9, Open
//! Question #2): reading stops as soon as the `A` AND gates are decoded.
//!
//! The PO-ordering open question (§9) is a *write-side* concern (witness
//! literal numbering must present real POs before latch-input POs); this
//! reader keeps POs and latch inputs in separate manager-level vectors
//! (`Manager::pos` / `Manager::latch_ins`) precisely so a caller can present
//! them in that order without the reader having to fabricate anything.

use crate::aig::{not, Lit, Manager};
use crate::error::{IoFormatError, IoResult};
use crate::seq::{InitVal, SeqAig};

struct Header {
    m: usize,
    i: usize,
    l: usize,
    o: usize,
    a: usize,
}

fn parse_header(data: &[u8], pos: &mut usize) -> IoResult<Header> {
    if data.len() < 3 || &data[0..3] != b"aig" {
        return Err(IoFormatError::BadMagic(
            "missing 'aig' magic at start of file".into(),
        ));
    }
    let nl = data
        .iter()
        .position(|&b| b == b'\n')
        .ok_or_else(|| IoFormatError::BadMagic("no newline terminating header".into()))?;
    let line = std::str::from_utf8(&data[0..nl])
        .map_err(|_| IoFormatError::BadMagic("header is not valid UTF-8".into()))?;
    let mut tokens = line.split_whitespace();
    let tag = tokens.next().unwrap_or("");
    if tag != "aig" {
        return Err(IoFormatError::BadMagic(format!("expected 'aig', got {tag:?}")));
    }
    let parse_usize = |t: Option<&str>, field: &str| -> IoResult<usize> {
        t.and_then(|s| s.parse::<usize>().ok())
            .ok_or_else(|| IoFormatError::BadMagic(format!("missing/invalid header field {field}")))
    };
    let m = parse_usize(tokens.next(), "M")?;
    let i = parse_usize(tokens.next(), "I")?;
    let l = parse_usize(tokens.next(), "L")?;
    let o = parse_usize(tokens.next(), "O")?;
    let a = parse_usize(tokens.next(), "A")?;
    if m != i + l + a {
        return Err(IoFormatError::CountMismatch(format!(
            "M={m} but I+L+A={}",
            i + l + a
        )));
    }
    *pos = nl + 1;
    Ok(Header { m, i, l, o, a })
}

/// Consume one `\n`-terminated ASCII line starting at `*pos`, advancing
/// `*pos` past it.
fn take_line<'a>(data: &'a [u8], pos: &mut usize) -> IoResult<&'a str> {
    let start = *pos;
    let nl = data[start..]
        .iter()
        .position(|&b| b == b'\n')
        .ok_or(IoFormatError::TruncatedBody)?;
    *pos = start + nl + 1;
    std::str::from_utf8(&data[start..start + nl]).map_err(|_| IoFormatError::TruncatedBody)
}

/// §6: "each byte's high bit signals continuation and the low 7 bits carry
/// the next 7 payload bits starting at the least significant."
fn decode_delta(data: &[u8], pos: &mut usize) -> IoResult<u32> {
    let mut x: u32 = 0;
    let mut i: u32 = 0;
    loop {
        let ch = *data.get(*pos).ok_or(IoFormatError::TruncatedBody)?;
        *pos += 1;
        if ch & 0x80 != 0 {
            x |= ((ch & 0x7f) as u32) << (7 * i);
            i += 1;
        } else {
            x |= (ch as u32) << (7 * i);
            return Ok(x);
        }
    }
}

/// Translate a raw AIGER literal (indexing the original `0..=M` variable
/// numbering) through `id_map` into a [`Lit`] in the manager being built.
fn translate_raw(id_map: &[Lit], raw: u32) -> Lit {
    let var = (raw >> 1) as usize;
    let sign = raw & 1 != 0;
    let mapped = id_map[var];
    if sign {
        not(mapped)
    } else {
        mapped
    }
}

fn parse_init_token(tok: Option<&str>) -> InitVal {
    match tok {
        Some("1") => InitVal::One,
        Some("x") => InitVal::Dc,
        _ => InitVal::Zero,
    }
}

/// Read an AIGER byte stream, returning the sequential AIG it encodes.
pub fn read_bytes(data: &[u8]) -> IoResult<SeqAig> {
    let mut pos = 0usize;
    let header = parse_header(data, &mut pos)?;

    let mut aig = Manager::new();
    // `id_map[v]` is the translated literal (always non-inverted at this
    // point) standing in for original variable `v`; index 0 is the
    // constant.
    let mut id_map: Vec<Lit> = vec![0u32; header.m + 1];

    for v in 1..=header.i {
        id_map[v] = aig.create_pi();
    }
    for k in 0..header.l {
        id_map[header.i + 1 + k] = aig.create_latch_out();
    }

    // The L+O text lines sit between the header and the binary AND section;
    // latch driver literals may reference AND gates that haven't been
    // decoded yet, so we stash the raw tokens and translate once the AND
    // section below has filled in the rest of `id_map`.
    let mut latch_raw: Vec<(u32, InitVal)> = Vec::with_capacity(header.l);
    for _ in 0..header.l {
        let line = take_line(data, &mut pos)?;
        let mut tokens = line.split_whitespace();
        let lit: u32 = tokens
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or(IoFormatError::TruncatedBody)?;
        let init = parse_init_token(tokens.next());
        latch_raw.push((lit, init));
    }
    let mut po_raw: Vec<u32> = Vec::with_capacity(header.o);
    for _ in 0..header.o {
        let line = take_line(data, &mut pos)?;
        let lit: u32 = line
            .split_whitespace()
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or(IoFormatError::TruncatedBody)?;
        po_raw.push(lit);
    }

    for gate in 0..header.a {
        let idx = header.i + header.l + 1 + gate;
        let node_lit = (idx as u32) << 1;
        let d0 = decode_delta(data, &mut pos)?;
        let lit1 = node_lit
            .checked_sub(d0)
            .ok_or(IoFormatError::TruncatedBody)?;
        let d1 = decode_delta(data, &mut pos)?;
        let lit0 = lit1.checked_sub(d1).ok_or(IoFormatError::TruncatedBody)?;
        let a = translate_raw(&id_map, lit0);
        let b = translate_raw(&id_map, lit1);
        id_map[idx] = aig.make_and(a, b);
    }

    for &raw in &po_raw {
        aig.create_po(translate_raw(&id_map, raw));
    }
    let mut seq = SeqAig::new(aig);
    for &(raw, init) in &latch_raw {
        let driver = translate_raw(&id_map, raw);
        let latch_in_id = seq.aig_mut().create_latch_in(driver);
        seq.insert_first((latch_in_id, 0), init)
            .expect("first latch on a fresh edge never exceeds the cap");
        seq.bump_register_count(1);
    }
    Ok(seq)
}

/// Read an AIGER file from disk.
pub fn read_file(path: &std::path::Path) -> IoResult<SeqAig> {
    let data = std::fs::read(path)?;
    read_bytes(&data)
}

#[cfg(test)]
mod test {
    use super::*;

    /// Scenario 1 (§8): `aig 3 2 0 1 1\n6\n1 2 2\n` -- 2 PIs, one AND of
    /// `x1` and `x2`, PO = literal 6.
    #[test]
    fn reads_scenario_one_and_gate() {
        let mut bytes = b"aig 3 2 0 1 1\n6\n".to_vec();
        // AND gate: node literal = 2*3 = 6, fanins lit1=4 (x2), lit0=2 (x1).
        // d0 = 6 - 4 = 2, d1 = 4 - 2 = 2. Both fit in one byte (no
        // continuation bit).
        bytes.push(2);
        bytes.push(2);
        let seq = read_bytes(&bytes).unwrap();
        assert_eq!(seq.aig().pis().len(), 2);
        assert_eq!(seq.aig().and_count(), 1);
        assert_eq!(seq.aig().pos().len(), 1);

        let (_, po_vals) = seq.aig().eval_all(&[true, true]);
        assert_eq!(po_vals, vec![true]);
        let (_, po_vals) = seq.aig().eval_all(&[false, true]);
        assert_eq!(po_vals, vec![false]);
    }

    #[test]
    fn rejects_bad_magic() {
        let err = read_bytes(b"not-aiger\n").unwrap_err();
        assert!(matches!(err, IoFormatError::BadMagic(_)));
    }

    #[test]
    fn rejects_inconsistent_header_counts() {
        let err = read_bytes(b"aig 10 2 0 1 1\n2\n").unwrap_err();
        assert!(matches!(err, IoFormatError::CountMismatch(_)));
    }

    #[test]
    fn reads_a_single_latch_with_explicit_init() {
        // 1 PI, 1 latch whose next state is driven directly by the PI, PO
        // observes the latch output. Variable numbering: 0=const, 1=PI,
        // 2=latch-out. M = I+L+A = 1+1+0 = 2.
        let bytes = b"aig 2 1 1 1 0\n2 1\n4\n".to_vec();
        let seq = read_bytes(&bytes).unwrap();
        assert_eq!(seq.register_count(), 1);
        assert_eq!(seq.aig().latch_outs().len(), 1);
        assert_eq!(seq.aig().latch_ins().len(), 1);
        let edge = (seq.aig().latch_ins()[0], 0);
        assert_eq!(seq.k(edge), 1);
        assert_eq!(seq.init_at(edge, 0), Some(InitVal::One));
    }
}
