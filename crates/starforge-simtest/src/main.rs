//! Starforge Headless Simulation Harness
//!
//! Validates the pure simulation logic without the server.
//! Runs entirely in-process: no store, no networking.
//!
//! Usage:
//!   cargo run -p starforge-simtest
//!   cargo run -p starforge-simtest -- --verbose

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use starforge_logic::economy::{efficiency, population_cap, tick_planet, tick_planet_report, PlanetEconomy};
use starforge_logic::ledger::{balance, deposit_capped, plan_deduction, vault_capacity, Vault};
use starforge_logic::network::{
    degree_map, generate_lanes, has_duplicate_lanes, under_connected, Lane, NetworkParams, StarNode,
};
use starforge_logic::routes::{route_length, LaneGraph};

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== Starforge Simulation Harness ===\n");

    let mut results = Vec::new();

    // 1. Hyperlane generation over random galaxies
    results.extend(validate_network(verbose));

    // 2. Route finding on generated networks
    results.extend(validate_routes(verbose));

    // 3. Long-running planet economies
    results.extend(validate_economy(verbose));

    // 4. Credit ledger planning
    results.extend(validate_ledger(verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

/// Scatter `count` systems over a `size` x `size` square.
fn random_galaxy(rng: &mut StdRng, count: usize, size: f64) -> Vec<StarNode> {
    (0..count)
        .map(|i| StarNode {
            id: i as u64 + 1,
            x: rng.gen::<f64>() * size,
            y: rng.gen::<f64>() * size,
        })
        .collect()
}

// ── 1. Network ──────────────────────────────────────────────────────────

fn validate_network(verbose: bool) -> Vec<TestResult> {
    println!("--- Hyperlane Network ---");
    let mut results = Vec::new();
    let params = NetworkParams::default();
    let mut rng = StdRng::seed_from_u64(42);

    let mut duplicates = 0;
    let mut self_edges = 0;
    let mut out_of_range = 0;
    let mut lane_total = 0;
    let mut under_total = 0;
    let mut node_total = 0;
    for round in 0..50 {
        let nodes = random_galaxy(&mut rng, 80, 3000.0);
        let lanes = generate_lanes(&nodes, &params);
        if has_duplicate_lanes(&lanes) {
            duplicates += 1;
        }
        self_edges += lanes.iter().filter(|l| l.a == l.b).count();
        out_of_range += lanes
            .iter()
            .filter(|l| l.distance < params.min_distance || l.distance > params.max_distance)
            .count();
        let under = under_connected(&nodes, &lanes, params.target_degree).len();
        if verbose && round % 10 == 0 {
            println!(
                "  galaxy {:>2}: {} lanes, {} nodes under degree {}",
                round,
                lanes.len(),
                under,
                params.target_degree
            );
        }
        lane_total += lanes.len();
        under_total += under;
        node_total += nodes.len();
    }

    results.push(TestResult {
        name: "network_no_duplicates".into(),
        passed: duplicates == 0 && self_edges == 0,
        detail: format!(
            "{} galaxies with duplicate pairs, {} self edges",
            duplicates, self_edges
        ),
    });

    results.push(TestResult {
        name: "network_lane_range".into(),
        passed: out_of_range == 0,
        detail: format!(
            "{} of {} lanes outside [{}, {}]",
            out_of_range, lane_total, params.min_distance, params.max_distance
        ),
    });

    // Dense random galaxies should leave few stragglers
    let under_ratio = under_total as f64 / node_total as f64;
    results.push(TestResult {
        name: "network_target_degree".into(),
        passed: under_ratio < 0.05,
        detail: format!(
            "{:.1}% of nodes below target degree",
            under_ratio * 100.0
        ),
    });

    // Same input, same output
    let nodes = random_galaxy(&mut StdRng::seed_from_u64(7), 60, 2500.0);
    let first: Vec<(u64, u64)> = generate_lanes(&nodes, &params).iter().map(Lane::key).collect();
    let second: Vec<(u64, u64)> = generate_lanes(&nodes, &params).iter().map(Lane::key).collect();
    results.push(TestResult {
        name: "network_deterministic".into(),
        passed: first == second,
        detail: format!("{} lanes, identical across runs", first.len()),
    });

    // Degree sum is twice the lane count
    let lanes = generate_lanes(&nodes, &params);
    let degree_sum: usize = degree_map(&lanes).values().sum();
    results.push(TestResult {
        name: "network_degree_sum".into(),
        passed: degree_sum == lanes.len() * 2,
        detail: format!("degree sum {} for {} lanes", degree_sum, lanes.len()),
    });

    // Empty and single-node galaxies
    let empty = generate_lanes(&[], &params);
    let single = generate_lanes(&nodes[..1], &params);
    results.push(TestResult {
        name: "network_degenerate_inputs".into(),
        passed: empty.is_empty() && single.is_empty(),
        detail: "0 or 1 systems → no lanes".into(),
    });

    results
}

// ── 2. Routes ───────────────────────────────────────────────────────────

fn validate_routes(_verbose: bool) -> Vec<TestResult> {
    println!("--- Routes ---");
    let mut results = Vec::new();
    let params = NetworkParams::default();

    // Evenly spaced grid: every neighbour is in local range
    let nodes: Vec<StarNode> = (0..36)
        .map(|i| StarNode {
            id: i + 1,
            x: (i % 6) as f64 * 250.0,
            y: (i / 6) as f64 * 250.0,
        })
        .collect();
    let graph = LaneGraph::from_lanes(&generate_lanes(&nodes, &params));

    let reachable = graph.reachable_from(1);
    results.push(TestResult {
        name: "routes_grid_connected".into(),
        passed: reachable.len() == nodes.len(),
        detail: format!("{}/{} systems reachable from 1", reachable.len(), nodes.len()),
    });

    let same = graph.find_route(1, 1);
    results.push(TestResult {
        name: "routes_same_system".into(),
        passed: same.as_ref().is_some_and(|r| r.is_empty()),
        detail: "same system → empty route".into(),
    });

    // Opposite corners of the grid
    let corner = graph.find_route(1, 36);
    let hops = corner.as_ref().map(|r| r.len()).unwrap_or(0);
    let length = corner.as_deref().map(route_length).unwrap_or(0.0);
    results.push(TestResult {
        name: "routes_corner_to_corner".into(),
        passed: corner.is_some() && hops <= 10 && length >= 1250.0 * 2f64.sqrt(),
        detail: format!("1→36 in {} jumps, {:.0} units", hops, length),
    });

    // Unknown system
    results.push(TestResult {
        name: "routes_unknown_system".into(),
        passed: graph.find_route(1, 999).is_none(),
        detail: "route to missing system → None".into(),
    });

    results
}

// ── 3. Economy ──────────────────────────────────────────────────────────

fn validate_economy(verbose: bool) -> Vec<TestResult> {
    println!("--- Economy ---");
    let mut results = Vec::new();
    let mut rng = StdRng::seed_from_u64(1234);

    // Random colonies run for 500 ticks each
    let mut violations = Vec::new();
    for colony in 0..200 {
        let mut planet = PlanetEconomy {
            population: rng.gen_range(0..20_000),
            morale: rng.gen_range(0..=100),
            richness: rng.gen_range(0..=5),
            habitat_level: rng.gen_range(0..=50),
            farm_level: rng.gen_range(0..=10),
            mine_level: rng.gen_range(0..=10),
            factory_level: rng.gen_range(0..=10),
            shipyard_level: rng.gen_range(0..=5),
            food: rng.gen_range(0..5_000),
            ore: rng.gen_range(0..5_000),
            goods: 0,
            fuel: 0,
        };
        for tick in 0..500 {
            let before = planet.population;
            planet = tick_planet(&planet);
            let bad_stock = planet.food < 0 || planet.ore < 0 || planet.goods < 0 || planet.fuel < 0;
            let bad_morale = !(0..=100).contains(&planet.morale);
            let over_cap = planet.population > before
                && planet.population > population_cap(planet.habitat_level);
            if bad_stock || bad_morale || over_cap {
                violations.push(format!("colony {} tick {}: {:?}", colony, tick, planet));
                break;
            }
        }
    }
    results.push(TestResult {
        name: "economy_invariants_500_ticks".into(),
        passed: violations.is_empty(),
        detail: if violations.is_empty() {
            "200 colonies, stocks ≥ 0, morale in [0, 100], growth capped".into()
        } else {
            violations.join("; ")
        },
    });

    // Morale settles on the set point when fed
    let mut fed = PlanetEconomy {
        population: 1000,
        morale: 10,
        habitat_level: 20,
        farm_level: 10,
        food: 10_000,
        ..Default::default()
    };
    for _ in 0..100 {
        fed = tick_planet(&fed);
    }
    results.push(TestResult {
        name: "economy_morale_settles".into(),
        passed: fed.morale == 75,
        detail: format!("morale {} after 100 fed ticks", fed.morale),
    });

    // Growth stops at the habitat cap
    results.push(TestResult {
        name: "economy_population_capped".into(),
        passed: fed.population == population_cap(20),
        detail: format!("population {} (cap {})", fed.population, population_cap(20)),
    });

    // A colony with no farms starves
    let hungry = PlanetEconomy {
        population: 5000,
        morale: 75,
        habitat_level: 60,
        ..Default::default()
    };
    let (after, report) = tick_planet_report(&hungry);
    if verbose {
        println!("  starving colony: {:?}", report);
    }
    results.push(TestResult {
        name: "economy_starvation_penalty".into(),
        passed: report.starved && after.food == 0 && after.morale == 67,
        detail: format!("morale 75 → {}, food {}", after.morale, after.food),
    });

    // Efficiency curve endpoints
    results.push(TestResult {
        name: "economy_efficiency_clamp".into(),
        passed: efficiency(0) == 0.5 && efficiency(50) == 1.0 && efficiency(100) == 1.5,
        detail: "0 → 0.5, 50 → 1.0, 100 → 1.5".into(),
    });

    results
}

// ── 4. Ledger ───────────────────────────────────────────────────────────

fn validate_ledger(_verbose: bool) -> Vec<TestResult> {
    println!("--- Credit Ledger ---");
    let mut results = Vec::new();
    let mut rng = StdRng::seed_from_u64(99);

    // Random purchases against random vault sets
    let mut partial = 0;
    let mut wrong_total = 0;
    let mut rejected = 0;
    for _ in 0..2000 {
        let vaults: Vec<Vault> = (0..rng.gen_range(0..6u64))
            .map(|i| {
                let level = rng.gen_range(1..=4u64);
                Vault {
                    building_id: i + 1,
                    level,
                    stored: rng.gen_range(0..=vault_capacity(level)),
                }
            })
            .collect();
        let before = balance(&vaults);
        let amount = rng.gen_range(0..=before + 500);
        match plan_deduction(&vaults, amount) {
            Ok(plan) => {
                let mut after = vaults.clone();
                for write in &plan {
                    if let Some(v) = after.iter_mut().find(|v| v.building_id == write.building_id) {
                        v.stored = write.stored;
                    }
                }
                if balance(&after) != before - amount {
                    wrong_total += 1;
                }
            }
            Err(e) => {
                rejected += 1;
                if e.available != before || amount <= before {
                    partial += 1;
                }
            }
        }
    }
    results.push(TestResult {
        name: "ledger_deduct_exact".into(),
        passed: wrong_total == 0,
        detail: format!("{} plans removed the wrong amount", wrong_total),
    });
    results.push(TestResult {
        name: "ledger_deduct_all_or_nothing".into(),
        passed: partial == 0 && rejected > 0,
        detail: format!("{} rejections, {} inconsistent", rejected, partial),
    });

    // Deposits into a level-3 vault until full
    let mut stored = 0;
    let mut discarded = 0;
    for _ in 0..10 {
        let d = deposit_capped(stored, 3, 400);
        stored = d.stored;
        discarded += d.overflow;
    }
    results.push(TestResult {
        name: "ledger_deposit_cap".into(),
        passed: stored == vault_capacity(3) && discarded == 4000 - vault_capacity(3),
        detail: format!("stored {}, discarded {}", stored, discarded),
    });

    results
}
