//! Route finding over the hyperlane network.
//!
//! `LaneGraph` holds an adjacency list built from generated lanes and finds
//! fewest-jump routes with BFS.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::network::Lane;

/// One jump of a route: travel along a lane into `system_id`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Jump {
    pub system_id: u64,
    pub distance: f64,
}

/// Adjacency view of the hyperlane network.
pub struct LaneGraph {
    /// system_id → list of (neighbor_system_id, lane distance)
    adj: HashMap<u64, Vec<(u64, f64)>>,
}

impl LaneGraph {
    pub fn from_lanes(lanes: &[Lane]) -> Self {
        let mut adj: HashMap<u64, Vec<(u64, f64)>> = HashMap::new();
        for lane in lanes {
            adj.entry(lane.a).or_default().push((lane.b, lane.distance));
            adj.entry(lane.b).or_default().push((lane.a, lane.distance));
        }
        Self { adj }
    }

    /// Fewest-jump route from `from` to `to`.
    ///
    /// Empty for the same system, `None` if unreachable.
    pub fn find_route(&self, from: u64, to: u64) -> Option<Vec<Jump>> {
        if from == to {
            return Some(vec![]);
        }

        let mut came_from: HashMap<u64, (u64, f64)> = HashMap::new();
        let mut visited = HashSet::from([from]);
        let mut queue = VecDeque::from([from]);

        while let Some(current) = queue.pop_front() {
            for &(next, distance) in self.neighbors(current) {
                if !visited.insert(next) {
                    continue;
                }
                came_from.insert(next, (current, distance));
                if next == to {
                    return Some(Self::unwind(&came_from, from, to));
                }
                queue.push_back(next);
            }
        }

        None
    }

    fn unwind(came_from: &HashMap<u64, (u64, f64)>, from: u64, to: u64) -> Vec<Jump> {
        let mut jumps = Vec::new();
        let mut at = to;
        while at != from {
            let Some(&(prev, distance)) = came_from.get(&at) else {
                break;
            };
            jumps.push(Jump {
                system_id: at,
                distance,
            });
            at = prev;
        }
        jumps.reverse();
        jumps
    }

    /// Lanes leaving a system.
    pub fn neighbors(&self, system_id: u64) -> &[(u64, f64)] {
        self.adj.get(&system_id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Every system reachable from `start`, including `start`.
    pub fn reachable_from(&self, start: u64) -> HashSet<u64> {
        let mut seen = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            for &(next, _) in self.neighbors(current) {
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        seen
    }

    /// Number of systems with at least one lane.
    pub fn system_count(&self) -> usize {
        self.adj.len()
    }
}

/// Total length of a route.
pub fn route_length(route: &[Jump]) -> f64 {
    route.iter().map(|j| j.distance).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lane(a: u64, b: u64, distance: f64) -> Lane {
        Lane { a, b, distance }
    }

    fn chain() -> LaneGraph {
        // 1 - 2 - 3
        LaneGraph::from_lanes(&[lane(1, 2, 150.0), lane(2, 3, 450.0)])
    }

    #[test]
    fn test_same_system() {
        assert_eq!(chain().find_route(1, 1), Some(vec![]));
    }

    #[test]
    fn test_multi_jump() {
        let route = chain().find_route(1, 3).unwrap();
        assert_eq!(route.len(), 2);
        assert_eq!(route[0].system_id, 2);
        assert_eq!(route[1].system_id, 3);
        assert!((route_length(&route) - 600.0).abs() < 1e-9);
    }

    #[test]
    fn test_reverse_direction() {
        let route = chain().find_route(3, 1).unwrap();
        assert_eq!(route.iter().map(|j| j.system_id).collect::<Vec<_>>(), vec![2, 1]);
    }

    #[test]
    fn test_unreachable() {
        assert_eq!(chain().find_route(1, 99), None);
    }

    #[test]
    fn test_fewest_jumps_preferred() {
        //   1 - 2 - 3 - 4
        //    \_________/
        let graph = LaneGraph::from_lanes(&[
            lane(1, 2, 100.0),
            lane(2, 3, 100.0),
            lane(3, 4, 100.0),
            lane(1, 4, 800.0),
        ]);
        let route = graph.find_route(1, 4).unwrap();
        assert_eq!(route.len(), 1);
        assert_eq!(route[0].system_id, 4);
    }

    #[test]
    fn test_reachable_from() {
        let graph = LaneGraph::from_lanes(&[lane(1, 2, 100.0), lane(5, 6, 100.0)]);
        assert_eq!(graph.reachable_from(1), HashSet::from([1, 2]));
        assert_eq!(graph.reachable_from(9), HashSet::from([9]));
        assert_eq!(graph.system_count(), 4);
        assert_eq!(graph.neighbors(2).len(), 1);
    }
}
