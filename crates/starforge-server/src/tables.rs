//! Record definitions for the galaxy simulation.
//!
//! Each record lives in a named collection of the record store and carries
//! its own `id`. The store assigns ids on insert.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use starforge_logic::constants::{building_types, resources};
use starforge_logic::economy::PlanetEconomy;
use starforge_logic::ledger::Vault;
use starforge_logic::network::StarNode;

/// A record type stored under a fixed collection name.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + 'static {
    const COLLECTION: &'static str;

    fn id(&self) -> u64;
    fn set_id(&mut self, id: u64);
}

macro_rules! record {
    ($ty:ty, $collection:literal) => {
        impl Record for $ty {
            const COLLECTION: &'static str = $collection;

            fn id(&self) -> u64 {
                self.id
            }

            fn set_id(&mut self, id: u64) {
                self.id = id;
            }
        }
    };
}

// ============================================================================
// GALAXY
// ============================================================================

/// Star system. Position never changes after generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarSystem {
    pub id: u64,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub discovered_by: Option<u64>,
}

impl StarSystem {
    pub fn node(&self) -> StarNode {
        StarNode {
            id: self.id,
            x: self.x,
            y: self.y,
        }
    }
}

/// Bidirectional travel lane between two systems
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hyperlane {
    pub id: u64,
    pub system_a: u64,
    pub system_b: u64,
    pub distance: f64,
}

record!(StarSystem, "systems");
record!(Hyperlane, "hyperlanes");

// ============================================================================
// PLANETS
// ============================================================================

/// Planet with its economy. Unowned planets are not simulated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Planet {
    pub id: u64,
    pub system_id: u64,
    pub name: String,
    pub owner: Option<u64>,
    pub population: i64,
    pub morale: i64,
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

impl Planet {
    pub fn economy(&self) -> PlanetEconomy {
        PlanetEconomy {
            population: self.population,
            morale: self.morale,
            richness: self.richness,
            habitat_level: self.habitat_level,
            farm_level: self.farm_level,
            mine_level: self.mine_level,
            factory_level: self.factory_level,
            shipyard_level: self.shipyard_level,
            food: self.food,
            ore: self.ore,
            goods: self.goods,
            fuel: self.fuel,
        }
    }

    /// Copy the mutable economy fields back. Improvement levels and richness
    /// are owned by construction, not by the tick.
    pub fn apply_economy(&mut self, economy: &PlanetEconomy) {
        self.population = economy.population;
        self.morale = economy.morale;
        self.food = economy.food;
        self.ore = economy.ore;
        self.goods = economy.goods;
        self.fuel = economy.fuel;
    }
}

record!(Planet, "planets");

// ============================================================================
// BUILDINGS
// ============================================================================

/// Planetary building. Banks with a credits slot hold part of their owner's credits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    pub id: u64,
    pub planet_id: u64,
    pub building_type: String,
    pub level: u64,
    pub active: bool,
    /// Resource slot, `Some("credits")` for credit-holding banks
    pub resource: Option<String>,
    pub stored: u64,
}

impl Building {
    pub fn is_bank(&self) -> bool {
        self.building_type == building_types::BANK
    }

    /// Active bank configured to hold credits.
    pub fn holds_credits(&self) -> bool {
        self.is_bank() && self.active && self.resource.as_deref() == Some(resources::CREDITS)
    }

    pub fn vault(&self) -> Vault {
        Vault {
            building_id: self.id,
            level: self.level,
            stored: self.stored,
        }
    }
}

record!(Building, "buildings");

// ============================================================================
// USERS & WORLD
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    /// Scalar balance fed by bank income. Separate from bank vault storage.
    pub credits: i64,
    pub auth_token: String,
}

record!(User, "users");

/// World clock singleton (id always 0)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldClock {
    pub id: u64,
    pub tick: u64,
}

pub const WORLD_CLOCK_ID: u64 = 0;

record!(WorldClock, "world");
