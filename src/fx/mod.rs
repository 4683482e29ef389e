//! §4.F Fast-extract algebraic factoring.
//!
//! Operates on a flat table of per-node SOP covers (`Vec<Cube>`) and fanin
//! lists, independent of [`crate::aig::Manager`]: fast extract is a
//! cover-rewriting pass that happens before an SOP cover is ever lowered to
//! AND/OR gates, so this module owns its own small node representation
//! rather than reusing the AIG arena.

use std::collections::HashMap;

use crate::consts::{DEFAULT_FX_MAX_NODES, DEFAULT_FX_MAX_PAIRS};

/// A variable reference within a cube: a fanin index plus polarity.
pub type Lit = (usize, bool);

/// One product term (cube) of an SOP cover: a conjunction of literals.
pub type Cube = Vec<Lit>;

/// One node's sum-of-products cover plus its fanin list (the ordered
/// variables cube literals index into).
#[derive(Debug, Clone)]
pub struct FxNode {
    pub fanins: Vec<usize>,
    pub cover: Vec<Cube>,
}

/// Tunable knobs (§4.F: `nNodesExt`, `nPairsMax`, `onlyS/onlyD/use0/useCompl`).
#[derive(Debug, Clone, Copy)]
pub struct Params {
    pub max_nodes: usize,
    pub max_pairs: usize,
    pub only_single_cube: bool,
    pub only_double_cube: bool,
    pub use_zero_weight: bool,
    pub use_complement: bool,
}

impl Default for Params {
    fn default() -> Self {
        Params {
            max_nodes: DEFAULT_FX_MAX_NODES,
            max_pairs: DEFAULT_FX_MAX_PAIRS,
            only_single_cube: false,
            only_double_cube: false,
            use_zero_weight: false,
            use_complement: true,
        }
    }
}

/// A candidate shared sub-expression: either a single cube shared verbatim
/// across nodes, or the pairwise intersection of two cubes within one
/// node's cover, canonically keyed so occurrences accumulate weight across
/// covers (§4.F step 1/2).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DivisorKey(Vec<Lit>);

fn canonical(mut lits: Vec<Lit>) -> DivisorKey {
    lits.sort_unstable();
    lits.dedup();
    DivisorKey(lits)
}

/// One occurrence of a divisor: which node's cover, and which cube index(es)
/// it would replace.
#[derive(Debug, Clone)]
struct Occurrence {
    node: usize,
    cube: usize,
}

struct Divisor {
    key: DivisorKey,
    occurrences: Vec<Occurrence>,
}

fn cube_superset(cube: &Cube, divisor: &DivisorKey) -> bool {
    divisor.0.iter().all(|lit| cube.contains(lit))
}

/// Weight of a divisor: `(literals saved per occurrence - 1) * occurrences -
/// cost of the new node`, the standard fast-extract savings estimate
/// (§4.F step 1: "its weight is the savings from extracting it as a shared
/// subexpression").
fn weight_of(divisor: &Divisor) -> i64 {
    let width = divisor.key.0.len() as i64;
    let uses = divisor.occurrences.len() as i64;
    if width <= 1 || uses <= 1 {
        return 0;
    }
    (width - 1) * uses - width
}

/// Index every single-cube and double-cube candidate divisor across `nodes`,
/// scored and ready for the substitution heap (§4.F steps 1-2).
fn index_divisors(nodes: &[FxNode], params: &Params) -> Vec<Divisor> {
    let mut table: HashMap<DivisorKey, Vec<Occurrence>> = HashMap::new();

    if !params.only_double_cube {
        for (ni, node) in nodes.iter().enumerate() {
            for (ci, cube) in node.cover.iter().enumerate() {
                if cube.len() < 2 {
                    continue;
                }
                let key = canonical(cube.clone());
                table.entry(key).or_default().push(Occurrence { node: ni, cube: ci });
            }
        }
    }

    if !params.only_single_cube {
        let mut pairs_seen = 0usize;
        for (ni, node) in nodes.iter().enumerate() {
            for i in 0..node.cover.len() {
                for j in (i + 1)..node.cover.len() {
                    if pairs_seen >= params.max_pairs {
                        break;
                    }
                    pairs_seen += 1;
                    let inter: Vec<Lit> = node.cover[i]
                        .iter()
                        .filter(|l| node.cover[j].contains(l))
                        .copied()
                        .collect();
                    if inter.len() < 2 {
                        continue;
                    }
                    let key = canonical(inter);
                    table.entry(key).or_default().push(Occurrence { node: ni, cube: i });
                }
            }
        }
    }

    table
        .into_iter()
        .map(|(key, occurrences)| Divisor { key, occurrences })
        .collect()
}

/// Run fast extract to completion on `nodes`, returning the number of new
/// shared nodes appended. Mutates `nodes` in place, appending extracted
/// divisors as new entries and rewriting containing covers to reference them
/// (§4.F step 3-4).
pub fn extract(nodes: &mut Vec<FxNode>, params: &Params) -> usize {
    let mut created = 0usize;

    loop {
        if created >= params.max_nodes {
            break;
        }
        let mut divisors = index_divisors(nodes, params);
        divisors.retain(|d| weight_of(d) >= if params.use_zero_weight { 0 } else { 1 });
        divisors.sort_by_key(|d| std::cmp::Reverse(weight_of(d)));

        let Some(best) = divisors.into_iter().next() else {
            break;
        };
        if best.occurrences.len() < 2 {
            break;
        }

        let new_node_idx = nodes.len();
        nodes.push(FxNode {
            fanins: best.key.0.iter().map(|&(v, _)| v).collect(),
            cover: vec![best.key.0.iter().enumerate().map(|(i, &(_, neg))| (i, neg)).collect()],
        });
        created += 1;

        for occ in &best.occurrences {
            substitute_occurrence(nodes, occ, new_node_idx, &best.key, params);
        }
    }

    created
}

fn substitute_occurrence(nodes: &mut [FxNode], occ: &Occurrence, new_node: usize, key: &DivisorKey, params: &Params) {
    let cube = nodes[occ.node].cover[occ.cube].clone();
    if !cube_superset(&cube, key) {
        return;
    }
    let remainder: Vec<Lit> = cube.into_iter().filter(|l| !key.0.contains(l)).collect();
    let mut new_cube = remainder;
    new_cube.push((new_node, false));
    if params.use_complement {
        new_cube.sort_unstable();
    }
    nodes[occ.node].cover[occ.cube] = new_cube;
    if !nodes[occ.node].fanins.contains(&new_node) {
        nodes[occ.node].fanins.push(new_node);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn node(fanins: &[usize], cover: Vec<Cube>) -> FxNode {
        FxNode {
            fanins: fanins.to_vec(),
            cover,
        }
    }

    #[test]
    fn shared_double_cube_gets_extracted_once() {
        // Two nodes each containing cube (a&b&c) plus a distinct literal.
        let mut nodes = vec![
            node(&[0, 1, 2, 3], vec![vec![(0, false), (1, false), (2, false)], vec![(3, false)]]),
            node(&[0, 1, 2, 4], vec![vec![(0, false), (1, false), (2, false)], vec![(4, false)]]),
        ];
        let params = Params::default();
        let created = extract(&mut nodes, &params);
        assert!(created >= 1, "expected at least one shared divisor to be extracted");
        assert!(nodes.len() > 2);
    }

    #[test]
    fn idempotent_on_a_second_run() {
        let mut nodes = vec![
            node(&[0, 1, 2, 3], vec![vec![(0, false), (1, false), (2, false)], vec![(3, false)]]),
            node(&[0, 1, 2, 4], vec![vec![(0, false), (1, false), (2, false)], vec![(4, false)]]),
        ];
        let params = Params::default();
        extract(&mut nodes, &params);
        let len_after_first = nodes.len();
        let created_again = extract(&mut nodes, &params);
        assert_eq!(created_again, 0);
        assert_eq!(nodes.len(), len_after_first);
    }

    #[test]
    fn no_sharing_extracts_nothing() {
        let mut nodes = vec![node(&[0, 1], vec![vec![(0, false), (1, false)]])];
        let params = Params::default();
        assert_eq!(extract(&mut nodes, &params), 0);
    }
}
