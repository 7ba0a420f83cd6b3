//! Pure economy logic: per-planet production, consumption, growth and morale.
//!
//! `tick_planet` is the whole per-tick transition for one planet. It reads
//! nothing but its argument, so the server can run it for every planet in
//! parallel and only has to isolate the write of each result.

use serde::{Deserialize, Serialize};

use crate::constants::economy::*;

/// Economic state of one planet, as read at the start of a tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanetEconomy {
    pub population: i64,
    /// 0–100 after every tick.
    pub morale: i64,
    /// Terrain factor feeding ore and fuel output.
    pub richness: i64,
    pub habitat_level: i64,
    pub farm_level: i64,
    pub mine_level: i64,
    pub factory_level: i64,
    pub shipyard_level: i64,
    pub food: i64,
    pub ore: i64,
    pub goods: i64,
    pub fuel: i64,
}

/// What one tick did to a planet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionReport {
    pub food_produced: i64,
    pub ore_produced: i64,
    pub goods_produced: i64,
    pub fuel_produced: i64,
    pub food_consumed: i64,
    pub starved: bool,
    pub famine: bool,
    pub growth: i64,
}

/// Production multiplier derived from morale, always within [0.5, 1.5].
pub fn efficiency(morale: i64) -> f64 {
    ((morale as f64 + 50.0) / 100.0).clamp(MIN_EFFICIENCY, MAX_EFFICIENCY)
}

/// Maximum population the habitat supports.
pub fn population_cap(habitat_level: i64) -> i64 {
    habitat_level * HABITAT_CAPACITY_PER_LEVEL
}

/// Advance one planet by one tick.
pub fn tick_planet(state: &PlanetEconomy) -> PlanetEconomy {
    tick_planet_report(state).0
}

/// Advance one planet by one tick and report what happened.
///
/// Step order matters: consumption sees this tick's production, but growth
/// and morale drift only see the morale/food left after consumption.
pub fn tick_planet_report(state: &PlanetEconomy) -> (PlanetEconomy, ProductionReport) {
    let mut next = state.clone();
    let mut report = ProductionReport::default();
    let eff = efficiency(state.morale);

    produce(&mut next, &mut report, eff);
    consume(&mut next, &mut report);
    grow(&mut next, &mut report);
    drift_morale(&mut next);

    next.food = next.food.max(0);
    next.ore = next.ore.max(0);
    next.goods = next.goods.max(0);
    next.fuel = next.fuel.max(0);

    (next, report)
}

fn scaled(base: i64, eff: f64) -> i64 {
    (base as f64 * eff) as i64
}

fn produce(p: &mut PlanetEconomy, report: &mut ProductionReport, eff: f64) {
    report.food_produced = scaled(p.farm_level * 50 + p.population / 10, eff);
    p.food += report.food_produced;

    report.ore_produced = scaled(p.mine_level * 30 + p.richness * 10, eff);
    p.ore += report.ore_produced;

    // Factories convert ore 1:1; short ore means partial output.
    let wanted = scaled(p.factory_level * 20, eff);
    let goods = wanted.min(p.ore.max(0));
    p.ore -= goods;
    p.goods += goods;
    report.goods_produced = goods;

    report.fuel_produced = scaled(p.shipyard_level * 10 + p.richness * 5, eff);
    p.fuel += report.fuel_produced;
}

fn consume(p: &mut PlanetEconomy, report: &mut ProductionReport) {
    report.food_consumed = p.population / 5;
    p.food -= report.food_consumed;

    if p.food < 0 {
        report.starved = true;
        p.morale -= STARVATION_MORALE_PENALTY;
        let deficit = -p.food;
        if deficit > p.population {
            report.famine = true;
            p.population = (p.population as f64 * FAMINE_SURVIVAL) as i64;
        }
        p.food = 0;
    }
}

fn grow(p: &mut PlanetEconomy, report: &mut ProductionReport) {
    if p.food <= p.population || p.morale <= GROWTH_MORALE_THRESHOLD {
        return;
    }
    let cap = population_cap(p.habitat_level);
    if p.population >= cap {
        return;
    }
    let growth = ((p.population as f64 * GROWTH_RATE * p.morale as f64 / 100.0) as i64).max(1);
    let grown = (p.population + growth).min(cap);
    report.growth = grown - p.population;
    p.population = grown;
}

fn drift_morale(p: &mut PlanetEconomy) {
    if p.morale < MORALE_SET_POINT {
        p.morale += MORALE_RISE_PER_TICK;
    } else if p.morale > MORALE_SET_POINT {
        p.morale -= MORALE_FALL_PER_TICK;
    }
    p.morale = p.morale.clamp(0, 100);
}
