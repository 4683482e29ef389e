//! Fixed parameters shared across the AIG, retiming, simulation, and SAT cores.

/// Maximum number of latches a single sequential fanin edge may carry (§3,
/// "Sequential edge").
pub const MAX_EDGE_LATCHES: u32 = 16;

/// Cap on L-value relaxation passes before a candidate period is declared
/// non-convergent ("infeasible") during retiming feasibility search (§4.D).
pub const LVALUE_RELAX_PASSES: usize = 20;

/// Bias added to the lag computation so that `lag()` can be evaluated with
/// unsigned integer division before re-biasing back to a signed value (§4.D,
/// `lag(n) := floor((L(n) + 256*Fi)/Fi) - 256 - ...`).
pub const LAG_BIAS: i64 = 256;

/// Default number of 32-bit words per simulation vector (`W`), giving
/// `32 * W` parallel patterns per round (§4.E, default run size).
pub const DEFAULT_SIM_WORDS: usize = 64;

/// Iteration cap for the target-driven simulation refinement loop (§4.E).
pub const SIM_TARGET_ITER_CAP: usize = 64;

/// Default maximum number of fast-extract divisor nodes to create in one run
/// (§4.F, `nNodesExt`).
pub const DEFAULT_FX_MAX_NODES: usize = 10_000;

/// Default cap on indexed cube pairs per cover during double-cube divisor
/// enumeration (§4.F, `nPairsMax`).
pub const DEFAULT_FX_MAX_PAIRS: usize = 5_000;

/// Glue (LBD) threshold separating the "core" learned-clause tier from
/// tier2 (§4.G, learned-clause management).
pub const DEFAULT_GLUE_TIER1: u32 = 2;

/// Glue threshold separating tier2 from tier3 (§4.G).
pub const DEFAULT_GLUE_TIER2: u32 = 6;

/// Number of conflicts between recomputations of the glue-tier thresholds
/// from observed quantiles (§4.G).
pub const TIER_RECOMPUTE_PERIOD: u64 = 5_000;

/// VSIDS-like score bump increment growth factor applied on every conflict
/// (§4.G, "represented as an exponentially growing increment").
pub const VAR_BUMP_RESCALE: f64 = 1.0 / 1e-100;

/// Overflow threshold for the `var_inc` bump before all scores are rescaled
/// down, avoiding floating point overflow.
pub const VAR_ACTIVITY_RESCALE_LIMIT: f64 = 1e100;

/// Number of conflicts in the first "stable" restart phase before the
/// stable/focused mode schedule starts flipping (§4.G, restarts).
pub const INITIAL_STABLE_CONFLICTS: u64 = 1_000;

/// Luby restart sequence base unit of conflicts (§4.G).
pub const LUBY_UNIT: u64 = 100;

/// Default wall-clock budget, in milliseconds, for a single `mc::Driver`
/// run (§4.I, "under a wall-clock budget").
pub const DEFAULT_WALLCLOCK_BUDGET_MS: u64 = 10_000;

/// Default bounded-model-checking unrolling depth cap (§4.I step 2, `F`).
pub const DEFAULT_BMC_FRAMES: u32 = 32;

/// Default frame limit for the sequential simplification loop (§4.I step 3,
/// `F_max`).
pub const DEFAULT_SEQ_SIMPLIFY_FRAME_LIMIT: u32 = 16;

/// Register-count ceiling under which BDD reachability is attempted
/// (§4.I step 4).
pub const BDD_REGISTER_LIMIT: usize = 150;

/// Number of simulated frames `mc::latch_correspondence` runs to seed
/// candidate equivalence classes before attempting to discharge them by
/// induction (§4.I step 3).
pub const LATCH_CORRESPONDENCE_ROUNDS: u32 = 32;

/// Traversal id overflow threshold; beyond this all per-node stamps are
/// rewritten to zero and the counter resets (§4.A).
pub const TRAVERSAL_ID_OVERFLOW: u64 = u32::MAX as u64;
