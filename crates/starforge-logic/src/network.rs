//! Hyperlane network generation over a fixed set of star systems.
//!
//! Two passes over the node set:
//! 1. Highways: each node links to its nearest candidates in
//!    `[highway_threshold, max_distance]`, up to `highways_per_node` new lanes.
//! 2. Local fill: nodes still below `target_degree` link to their nearest
//!    candidates in `[min_distance, highway_threshold)` until the target is met.
//!
//! Highways go first so long-range connectivity exists before the short local
//! lanes saturate every node. Nodes that run out of candidates simply stay
//! under-connected.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::constants::network::*;

/// A star system position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StarNode {
    pub id: u64,
    pub x: f64,
    pub y: f64,
}

impl StarNode {
    pub fn distance_to(&self, other: &StarNode) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// A bidirectional hyperlane. `a` is always the node that created it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lane {
    pub a: u64,
    pub b: u64,
    pub distance: f64,
}

impl Lane {
    /// Unordered pair key, smaller id first.
    pub fn key(&self) -> (u64, u64) {
        pair_key(self.a, self.b)
    }

    pub fn connects(&self, node: u64) -> bool {
        self.a == node || self.b == node
    }
}

/// Tuning for [`generate_lanes`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkParams {
    pub min_distance: f64,
    pub max_distance: f64,
    pub highway_threshold: f64,
    pub highways_per_node: usize,
    pub target_degree: usize,
}

impl Default for NetworkParams {
    fn default() -> Self {
        Self {
            min_distance: DEFAULT_MIN_DISTANCE,
            max_distance: DEFAULT_MAX_DISTANCE,
            highway_threshold: HIGHWAY_THRESHOLD,
            highways_per_node: HIGHWAYS_PER_NODE,
            target_degree: TARGET_DEGREE,
        }
    }
}

/// Invalid generator parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamsError {
    NegativeMinDistance(f64),
    MaxBelowMin { min: f64, max: f64 },
    NotFinite,
}

impl std::fmt::Display for ParamsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamsError::NegativeMinDistance(d) => write!(f, "min_distance {d} is negative"),
            ParamsError::MaxBelowMin { min, max } => {
                write!(f, "max_distance {max} is below min_distance {min}")
            }
            ParamsError::NotFinite => write!(f, "network distances must be finite"),
        }
    }
}

impl std::error::Error for ParamsError {}

/// Check generator parameters before running a rebuild.
pub fn validate_params(params: &NetworkParams) -> Result<(), ParamsError> {
    if !params.min_distance.is_finite()
        || !params.max_distance.is_finite()
        || !params.highway_threshold.is_finite()
    {
        return Err(ParamsError::NotFinite);
    }
    if params.min_distance < 0.0 {
        return Err(ParamsError::NegativeMinDistance(params.min_distance));
    }
    if params.max_distance < params.min_distance {
        return Err(ParamsError::MaxBelowMin {
            min: params.min_distance,
            max: params.max_distance,
        });
    }
    Ok(())
}

fn pair_key(a: u64, b: u64) -> (u64, u64) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Lane set under construction; membership is checked on the unordered pair.
struct LaneSet {
    lanes: Vec<Lane>,
    pairs: HashSet<(u64, u64)>,
}

impl LaneSet {
    fn new() -> Self {
        Self {
            lanes: Vec::new(),
            pairs: HashSet::new(),
        }
    }

    fn contains(&self, a: u64, b: u64) -> bool {
        self.pairs.contains(&pair_key(a, b))
    }

    fn add(&mut self, a: u64, b: u64, distance: f64) -> bool {
        if a == b || !self.pairs.insert(pair_key(a, b)) {
            return false;
        }
        self.lanes.push(Lane { a, b, distance });
        true
    }
}

/// Candidates for `node` whose distance falls in `[lo, hi]` (or `[lo, hi)`
/// when `hi_inclusive` is false), nearest first, ties broken by id.
fn candidates(
    node: &StarNode,
    nodes: &[StarNode],
    lo: f64,
    hi: f64,
    hi_inclusive: bool,
) -> Vec<(u64, f64)> {
    let mut found: Vec<(u64, f64)> = nodes
        .iter()
        .filter(|other| other.id != node.id)
        .map(|other| (other.id, node.distance_to(other)))
        .filter(|&(_, d)| d >= lo && if hi_inclusive { d <= hi } else { d < hi })
        .collect();
    found.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
    found
}

/// Build the full lane set for `nodes`. Always a full rebuild.
///
/// Both phase windows are clipped to `[min_distance, max_distance]`, so a
/// threshold outside that range only shifts lanes between the phases.
pub fn generate_lanes(nodes: &[StarNode], params: &NetworkParams) -> Vec<Lane> {
    let mut set = LaneSet::new();
    let highway_lo = params.highway_threshold.max(params.min_distance);
    let (local_hi, local_hi_inclusive) = if params.max_distance < params.highway_threshold {
        (params.max_distance, true)
    } else {
        (params.highway_threshold, false)
    };

    // Phase 1: highways
    for node in nodes {
        let mut added = 0;
        for (other, distance) in candidates(
            node,
            nodes,
            highway_lo,
            params.max_distance,
            true,
        ) {
            if added >= params.highways_per_node {
                break;
            }
            if set.contains(node.id, other) {
                continue;
            }
            if set.add(node.id, other, distance) {
                added += 1;
            }
        }
    }

    // Phase 2: local fill, degrees taken fresh from the highway set
    let mut degrees = degree_map(&set.lanes);
    for node in nodes {
        if degree_of(&degrees, node.id) >= params.target_degree {
            continue;
        }
        for (other, distance) in candidates(
            node,
            nodes,
            params.min_distance,
            local_hi,
            local_hi_inclusive,
        ) {
            if degree_of(&degrees, node.id) >= params.target_degree {
                break;
            }
            if set.add(node.id, other, distance) {
                *degrees.entry(node.id).or_default() += 1;
                *degrees.entry(other).or_default() += 1;
            }
        }
    }

    set.lanes
}

fn degree_of(degrees: &HashMap<u64, usize>, node: u64) -> usize {
    degrees.get(&node).copied().unwrap_or(0)
}

/// Number of lanes touching each node. Nodes with no lanes are absent.
pub fn degree_map(lanes: &[Lane]) -> HashMap<u64, usize> {
    let mut degrees = HashMap::new();
    for lane in lanes {
        *degrees.entry(lane.a).or_default() += 1;
        *degrees.entry(lane.b).or_default() += 1;
    }
    degrees
}

/// Nodes whose degree stayed below `target`, in input order.
pub fn under_connected(nodes: &[StarNode], lanes: &[Lane], target: usize) -> Vec<u64> {
    let degrees = degree_map(lanes);
    nodes
        .iter()
        .filter(|n| degree_of(&degrees, n.id) < target)
        .map(|n| n.id)
        .collect()
}

/// True if some unordered pair appears more than once.
pub fn has_duplicate_lanes(lanes: &[Lane]) -> bool {
    let mut seen = HashSet::new();
    lanes.iter().any(|lane| !seen.insert(lane.key()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: u64, x: f64, y: f64) -> StarNode {
        StarNode { id, x, y }
    }

    #[test]
    fn test_two_distant_systems_get_one_highway() {
        let nodes = [node(1, 0.0, 0.0), node(2, 500.0, 0.0)];
        let lanes = generate_lanes(&nodes, &NetworkParams::default());
        assert_eq!(lanes.len(), 1);
        assert_eq!(lanes[0].key(), (1, 2));
        assert!((lanes[0].distance - 500.0).abs() < 1e-9);
    }

    #[test]
    fn test_out_of_range_systems_stay_unconnected() {
        let nodes = [node(1, 0.0, 0.0), node(2, 5000.0, 0.0), node(3, 0.0, 50.0)];
        let lanes = generate_lanes(&nodes, &NetworkParams::default());
        assert!(lanes.is_empty());
        assert_eq!(under_connected(&nodes, &lanes, 3), vec![1, 2, 3]);
    }

    #[test]
    fn test_highways_limited_per_node() {
        // Hub with five neighbours all at highway range; spokes far from each other
        let mut nodes = vec![node(0, 0.0, 0.0)];
        for i in 0..5 {
            let angle = i as f64 * std::f64::consts::TAU / 5.0;
            nodes.push(node(i + 1, angle.cos() * 500.0, angle.sin() * 500.0));
        }
        let params = NetworkParams {
            max_distance: 550.0,
            ..Default::default()
        };
        let lanes = generate_lanes(&nodes, &params);
        // Hub creates 2, each spoke then links back to the hub if not already linked.
        let hub_degree = degree_map(&lanes)[&0];
        assert_eq!(hub_degree, 5);
        let created_by_hub = lanes.iter().filter(|l| l.a == 0).count();
        assert_eq!(created_by_hub, 2);
        assert!(!has_duplicate_lanes(&lanes));
    }

    #[test]
    fn test_local_fill_reaches_target_degree() {
        // Tight cluster, every pair within local range
        let nodes: Vec<StarNode> = (0..6)
            .map(|i| node(i, (i % 3) as f64 * 150.0, (i / 3) as f64 * 150.0))
            .collect();
        let lanes = generate_lanes(&nodes, &NetworkParams::default());
        let degrees = degree_map(&lanes);
        for n in &nodes {
            assert!(degrees[&n.id] >= 3, "node {} has degree {}", n.id, degrees[&n.id]);
        }
        for lane in &lanes {
            assert!(lane.distance >= 100.0 && lane.distance < 400.0);
        }
    }

    #[test]
    fn test_min_distance_respected() {
        let nodes = [node(1, 0.0, 0.0), node(2, 50.0, 0.0), node(3, 200.0, 0.0)];
        let lanes = generate_lanes(&nodes, &NetworkParams::default());
        assert!(lanes.iter().all(|l| l.key() != (1, 2)));
        assert!(lanes.iter().any(|l| l.key() == (1, 3)));
    }

    #[test]
    fn test_short_max_distance_caps_local_lanes() {
        // Threshold above max: everything in range is local fill.
        let params = NetworkParams {
            min_distance: 100.0,
            max_distance: 300.0,
            ..Default::default()
        };
        assert!(validate_params(&params).is_ok());
        let far = [node(1, 0.0, 0.0), node(2, 350.0, 0.0)];
        assert!(generate_lanes(&far, &params).is_empty());

        let edge = [node(1, 0.0, 0.0), node(2, 300.0, 0.0)];
        let lanes = generate_lanes(&edge, &params);
        assert_eq!(lanes.len(), 1);
        assert!((lanes[0].distance - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_large_min_distance_caps_highways() {
        // Threshold below min: highways start at min_distance.
        let params = NetworkParams {
            min_distance: 500.0,
            max_distance: 900.0,
            ..Default::default()
        };
        assert!(validate_params(&params).is_ok());
        let near = [node(1, 0.0, 0.0), node(2, 450.0, 0.0)];
        assert!(generate_lanes(&near, &params).is_empty());

        let nodes = [node(1, 0.0, 0.0), node(2, 450.0, 0.0), node(3, 1000.0, 0.0)];
        let lanes = generate_lanes(&nodes, &params);
        assert!(!lanes.is_empty());
        for lane in &lanes {
            assert!(lane.distance >= 500.0 && lane.distance <= 900.0, "{lane:?}");
        }
    }

    #[test]
    fn test_validate_params() {
        assert!(validate_params(&NetworkParams::default()).is_ok());
        let bad = NetworkParams {
            min_distance: 500.0,
            max_distance: 100.0,
            ..Default::default()
        };
        assert!(matches!(validate_params(&bad), Err(ParamsError::MaxBelowMin { .. })));
        let bad = NetworkParams {
            min_distance: -1.0,
            ..Default::default()
        };
        assert_eq!(validate_params(&bad), Err(ParamsError::NegativeMinDistance(-1.0)));
        let bad = NetworkParams {
            max_distance: f64::INFINITY,
            ..Default::default()
        };
        assert_eq!(validate_params(&bad), Err(ParamsError::NotFinite));
    }

    #[test]
    fn test_empty_and_single_node() {
        assert!(generate_lanes(&[], &NetworkParams::default()).is_empty());
        assert!(generate_lanes(&[node(1, 0.0, 0.0)], &NetworkParams::default()).is_empty());
    }
}
