//! Galaxy seeding and hyperlane rebuilds.
//!
//! Seeding only runs against an empty galaxy:
//!   1. place_systems        -- scatter star systems with minimum spacing
//!   2. create_planets       -- planets per system with random richness
//!   3. regenerate_hyperlanes -- build the travel graph
//!   4. seed_players         -- starting users, each with a colony and a bank

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use starforge_logic::constants::{building_types, resources};
use starforge_logic::network::{generate_lanes, validate_params, NetworkParams, StarNode};

use crate::config::{GalaxyConfig, PlayerSeed};
use crate::error::GenerationError;
use crate::store::{RecordStore, TableExt};
use crate::tables::*;

const NAME_HEADS: &[&str] = &[
    "Ar", "Bel", "Cor", "Dra", "El", "Fen", "Gal", "Hy", "Ix", "Jor", "Kes", "Lum", "Mor", "Nev",
    "Or", "Pra", "Quel", "Ryn", "Sol", "Tar", "Ul", "Vex", "Wyr", "Zan",
];

const NAME_TAILS: &[&str] = &[
    "a", "ax", "eon", "ia", "is", "on", "or", "us", "ara", "eth", "ion", "oth", "yx",
];

const PLANET_NUMERALS: &[&str] = &["I", "II", "III", "IV", "V", "VI", "VII", "VIII"];

/// Placement attempts per system before it is skipped.
const PLACEMENT_ATTEMPTS: usize = 40;

/// Starting credits in a new player's first bank.
const STARTING_BANK_CREDITS: u64 = 500;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub systems: usize,
    pub planets: usize,
    pub hyperlanes: usize,
}

fn system_name(rng: &mut StdRng) -> String {
    let head = NAME_HEADS[rng.gen_range(0..NAME_HEADS.len())];
    let tail = NAME_TAILS[rng.gen_range(0..NAME_TAILS.len())];
    format!("{head}{tail}")
}

fn planet_name(system: &str, index: usize) -> String {
    match PLANET_NUMERALS.get(index) {
        Some(numeral) => format!("{system} {numeral}"),
        None => format!("{system} {}", index + 1),
    }
}

/// Seed an empty galaxy. A galaxy that already has systems is left alone.
pub fn seed_galaxy(
    store: &dyn RecordStore,
    galaxy: &GalaxyConfig,
    params: &NetworkParams,
) -> Result<SeedReport, GenerationError> {
    validate_params(params)?;
    if !store.all::<StarSystem>()?.is_empty() {
        log::warn!("Galaxy already generated, skipping seed");
        return Ok(SeedReport::default());
    }

    let mut rng = StdRng::seed_from_u64(galaxy.seed);
    let systems = place_systems(store, galaxy, params, &mut rng)?;
    let planets = create_planets(store, &systems, galaxy.planets_per_system, &mut rng)?;
    let hyperlanes = regenerate_hyperlanes(store, params)?;

    log::info!(
        "Galaxy seeded: {} systems, {} planets, {} hyperlanes",
        systems.len(),
        planets,
        hyperlanes
    );
    Ok(SeedReport {
        systems: systems.len(),
        planets,
        hyperlanes,
    })
}

fn place_systems(
    store: &dyn RecordStore,
    galaxy: &GalaxyConfig,
    params: &NetworkParams,
    rng: &mut StdRng,
) -> Result<Vec<StarSystem>, GenerationError> {
    let mut placed: Vec<StarSystem> = Vec::with_capacity(galaxy.system_count);
    for _ in 0..galaxy.system_count {
        let spot = (0..PLACEMENT_ATTEMPTS)
            .map(|_| (rng.gen::<f64>() * galaxy.width, rng.gen::<f64>() * galaxy.height))
            .find(|&(x, y)| {
                let candidate = StarNode { id: 0, x, y };
                placed
                    .iter()
                    .all(|s| s.node().distance_to(&candidate) >= params.min_distance)
            });
        let Some((x, y)) = spot else {
            log::debug!("No room for another system after {} tries", PLACEMENT_ATTEMPTS);
            continue;
        };
        let system = store.create(StarSystem {
            id: 0,
            name: system_name(rng),
            x,
            y,
            discovered_by: None,
        })?;
        placed.push(system);
    }
    Ok(placed)
}

fn create_planets(
    store: &dyn RecordStore,
    systems: &[StarSystem],
    per_system: usize,
    rng: &mut StdRng,
) -> Result<usize, GenerationError> {
    let mut count = 0;
    for system in systems {
        for index in 0..per_system {
            store.create(Planet {
                id: 0,
                system_id: system.id,
                name: planet_name(&system.name, index),
                owner: None,
                population: 0,
                morale: 50,
                richness: rng.gen_range(1..=5),
                habitat_level: 0,
                farm_level: 0,
                mine_level: 0,
                factory_level: 0,
                shipyard_level: 0,
                food: 0,
                ore: 0,
                goods: 0,
                fuel: 0,
            })?;
            count += 1;
        }
    }
    Ok(count)
}

/// Replace every hyperlane with a freshly generated network.
///
/// Parameters are checked before anything is deleted.
pub fn regenerate_hyperlanes(
    store: &dyn RecordStore,
    params: &NetworkParams,
) -> Result<usize, GenerationError> {
    validate_params(params)?;

    for lane in store.all::<Hyperlane>()? {
        store.remove::<Hyperlane>(lane.id)?;
    }

    let nodes: Vec<StarNode> = store.all::<StarSystem>()?.iter().map(StarSystem::node).collect();
    let lanes = generate_lanes(&nodes, params);
    for lane in &lanes {
        store.create(Hyperlane {
            id: 0,
            system_a: lane.a,
            system_b: lane.b,
            distance: lane.distance,
        })?;
    }

    log::info!(
        "Hyperlanes rebuilt: {} lanes across {} systems",
        lanes.len(),
        nodes.len()
    );
    Ok(lanes.len())
}

/// Create starting players. Each claims the lowest-id unowned planet as a
/// colony with one credit bank. Names that already exist are skipped.
pub fn seed_players(
    store: &dyn RecordStore,
    players: &[PlayerSeed],
) -> Result<Vec<User>, GenerationError> {
    let mut created = Vec::new();
    for seed in players {
        if !store.filter::<User>(|u| u.name == seed.name)?.is_empty() {
            continue;
        }
        let user = store.create(User {
            id: 0,
            name: seed.name.clone(),
            credits: 0,
            auth_token: seed.token.clone(),
        })?;

        let Some(mut home) = store.filter::<Planet>(|p| p.owner.is_none())?.into_iter().next()
        else {
            log::warn!("No free planet for {}, created without a colony", user.name);
            created.push(user);
            continue;
        };
        home.owner = Some(user.id);
        home.population = 1000;
        home.morale = 75;
        home.habitat_level = 20;
        home.farm_level = 3;
        home.mine_level = 1;
        home.food = 500;
        store.save(&home)?;

        let mut system = store.fetch::<StarSystem>(home.system_id)?;
        if system.discovered_by.is_none() {
            system.discovered_by = Some(user.id);
            store.save(&system)?;
        }

        store.create(Building {
            id: 0,
            planet_id: home.id,
            building_type: building_types::BANK.to_string(),
            level: 1,
            active: true,
            resource: Some(resources::CREDITS.to_string()),
            stored: STARTING_BANK_CREDITS,
        })?;

        log::info!("Player {} starts on {}", user.name, home.name);
        created.push(user);
    }
    Ok(created)
}
