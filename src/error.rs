//! Crate-wide error types.
//!
//! Follows the severity ordering of §7: I/O and format errors are surfaced
//! immediately as [`AigError`] variants; budget exhaustion is *not* an error
//! (see [`crate::sat::SolveStatus`] / [`crate::mc::Status`]) and is never
//! represented here; assertion/invariant violations panic rather than
//! returning an `Err`, since they are programmer errors, not user errors.

use std::io;
use thiserror::Error;

/// Errors surfaced by the AIG/sequential-AIG/retiming layers.
#[derive(Debug, Error)]
pub enum AigError {
    /// Underlying I/O failure while reading or writing a netlist.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The AIGER header or body was inconsistent with the declared counts.
    #[error("malformed AIGER input: {0}")]
    Format(String),

    /// A sequential fanin edge would exceed [`crate::consts::MAX_EDGE_LATCHES`].
    #[error("latch count {0} exceeds the per-edge cap of {max}", max = crate::consts::MAX_EDGE_LATCHES)]
    LatchCapExceeded(u32),

    /// A duplication/cofactor/trim precondition was violated by the caller.
    #[error("precondition violated: {0}")]
    Precondition(String),
}

/// Result alias for fallible AIG-layer operations.
pub type AigResult<T> = Result<T, AigError>;

/// Errors specific to AIGER/BLIF codecs (§6 External Interfaces).
#[derive(Debug, Error)]
pub enum IoFormatError {
    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Bad magic string / header tokens.
    #[error("bad AIGER magic or header: {0}")]
    BadMagic(String),

    /// Header counts (`M = I + L + A`) did not reconcile with the body.
    #[error("AIGER header/body count mismatch: {0}")]
    CountMismatch(String),

    /// Truncated input while decoding the delta-encoded AND section.
    #[error("truncated AIGER body while decoding delta-encoded literal")]
    TruncatedBody,
}

/// Result alias for fallible codec operations.
pub type IoResult<T> = Result<T, IoFormatError>;
