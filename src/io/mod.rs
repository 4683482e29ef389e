//! §6 External interfaces: file-format collaborators.
//!
//! §1 lists "file I/O for AIGER/BLIF (format codecs)" among the surrounding
//! functionality that is out of scope for the three cores, to be treated
//! "only as external collaborators (via the interfaces in §6)". This module
//! is that collaborator boundary: a thin reader for the AIGER binary format
//! (§6, "AIGER binary format (input)") and a thin writer for BLIF (§6,
//! "BLIF (output)"), neither of which participates in strashing, SAT
//! solving, or retiming -- they only translate bytes at the edges.

pub mod aiger;
pub mod blif;
