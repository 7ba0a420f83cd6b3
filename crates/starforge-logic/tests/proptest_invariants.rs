//! Property-based tests for the pure simulation rules.
//!
//! Uses proptest to generate random planets, star layouts and vault sets,
//! then verify the invariants the server relies on.

use proptest::prelude::*;
use starforge_logic::economy::{efficiency, population_cap, tick_planet, PlanetEconomy};
use starforge_logic::ledger::{balance, deposit_capped, plan_deduction, vault_capacity, Vault};
use starforge_logic::network::{generate_lanes, has_duplicate_lanes, NetworkParams, StarNode};

// ===========================================================================
// Generators
// ===========================================================================

fn arb_planet() -> impl Strategy<Value = PlanetEconomy> {
    (
        (0..50_000i64, -50..150i64, 0..10i64, 0..30i64),
        (0..20i64, 0..20i64, 0..20i64, 0..20i64),
        (0..100_000i64, 0..10_000i64, 0..10_000i64, 0..10_000i64),
    )
        .prop_map(|((population, morale, richness, habitat), (farm, mine, factory, shipyard), (food, ore, goods, fuel))| {
            PlanetEconomy {
                population,
                morale,
                richness,
                habitat_level: habitat,
                farm_level: farm,
                mine_level: mine,
                factory_level: factory,
                shipyard_level: shipyard,
                food,
                ore,
                goods,
                fuel,
            }
        })
}

fn arb_nodes(max_nodes: usize) -> impl Strategy<Value = Vec<StarNode>> {
    proptest::collection::vec((0.0..3000.0f64, 0.0..3000.0f64), 0..=max_nodes).prop_map(|coords| {
        coords
            .into_iter()
            .enumerate()
            .map(|(i, (x, y))| StarNode { id: i as u64 + 1, x, y })
            .collect()
    })
}

fn arb_vaults() -> impl Strategy<Value = Vec<Vault>> {
    proptest::collection::vec((1..5u64, 0..5000u64), 0..8).prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (level, stored))| Vault {
                building_id: i as u64 + 1,
                level,
                stored: stored.min(vault_capacity(level)),
            })
            .collect()
    })
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Stocks never end a tick negative; morale stays in [0, 100].
    #[test]
    fn tick_keeps_stocks_and_morale_in_range(planet in arb_planet()) {
        let next = tick_planet(&planet);
        prop_assert!(next.food >= 0);
        prop_assert!(next.ore >= 0);
        prop_assert!(next.goods >= 0);
        prop_assert!(next.fuel >= 0);
        prop_assert!((0..=100).contains(&next.morale));
    }

    /// Efficiency is clamped no matter how far morale strays.
    #[test]
    fn efficiency_is_bounded(morale in -10_000..10_000i64) {
        let e = efficiency(morale);
        prop_assert!((0.5..=1.5).contains(&e));
    }

    /// Growth never pushes population past the habitat cap.
    #[test]
    fn growth_respects_habitat_cap(planet in arb_planet()) {
        let next = tick_planet(&planet);
        if next.population > planet.population {
            prop_assert!(next.population <= population_cap(planet.habitat_level));
        }
    }

    /// Factories never draw ore below zero; short ore means goods += ore on hand.
    #[test]
    fn goods_limited_by_ore(ore in 0..500i64, factory in 0..20i64, goods in 0..1000i64) {
        // Morale 50, no mines or richness: efficiency 1.0 and no ore income.
        let planet = PlanetEconomy { morale: 50, factory_level: factory, ore, goods, ..Default::default() };
        let next = tick_planet(&planet);
        let wanted = factory * 20;
        if ore < wanted {
            prop_assert_eq!(next.ore, 0);
            prop_assert_eq!(next.goods, goods + ore);
        } else {
            prop_assert_eq!(next.ore, ore - wanted);
            prop_assert_eq!(next.goods, goods + wanted);
        }
    }

    /// No unordered pair appears twice and every lane is within range.
    #[test]
    fn lanes_unique_and_in_range(nodes in arb_nodes(40)) {
        let params = NetworkParams::default();
        let lanes = generate_lanes(&nodes, &params);
        prop_assert!(!has_duplicate_lanes(&lanes));
        for lane in &lanes {
            prop_assert!(lane.a != lane.b);
            prop_assert!(lane.distance >= params.min_distance);
            prop_assert!(lane.distance <= params.max_distance);
        }
    }

    /// The distance bounds hold wherever the highway threshold falls.
    #[test]
    fn lanes_in_range_for_any_bounds(
        nodes in arb_nodes(30),
        min in 0.0..700.0f64,
        span in 0.0..800.0f64,
    ) {
        let params = NetworkParams { min_distance: min, max_distance: min + span, ..Default::default() };
        for lane in generate_lanes(&nodes, &params) {
            prop_assert!(lane.distance >= params.min_distance);
            prop_assert!(lane.distance <= params.max_distance);
        }
    }

    /// Deduction is all-or-nothing and removes exactly the requested amount.
    #[test]
    fn deduction_all_or_nothing(vaults in arb_vaults(), amount in 0..20_000u64) {
        let before = balance(&vaults);
        match plan_deduction(&vaults, amount) {
            Err(e) => {
                prop_assert!(before < amount);
                prop_assert_eq!(e.available, before);
            }
            Ok(plan) => {
                let mut after = vaults.clone();
                for write in plan {
                    let v = after.iter_mut().find(|v| v.building_id == write.building_id).unwrap();
                    prop_assert!(write.stored <= v.stored);
                    v.stored = write.stored;
                }
                prop_assert_eq!(balance(&after), before - amount);
            }
        }
    }

    /// Deposits never exceed capacity and never lose accepted credits.
    #[test]
    fn deposit_never_exceeds_capacity(level in 0..10u64, stored in 0..10_000u64, amount in 0..20_000u64) {
        let stored = stored.min(vault_capacity(level));
        let d = deposit_capped(stored, level, amount);
        prop_assert!(d.stored <= vault_capacity(level));
        prop_assert_eq!(d.stored, stored + d.accepted);
        prop_assert_eq!(d.accepted + d.overflow, amount);
    }
}
