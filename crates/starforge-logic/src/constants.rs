//! Game constants: building types, resource slots, economy tuning.
//!
//! These are plain constants with no database dependency.
//! Both the server and the native simtest use these.

pub mod building_types {
    /// Credit-storing building. The only type the credit ledger reads.
    pub const BANK: &str = "bank";
    pub const WAREHOUSE: &str = "warehouse";
}

pub mod resources {
    /// Resource slot a bank must be configured with to hold credits.
    pub const CREDITS: &str = "credits";
    pub const ORE: &str = "ore";
}

pub mod economy {
    /// Morale the drift step pulls towards.
    pub const MORALE_SET_POINT: i64 = 75;
    pub const MORALE_RISE_PER_TICK: i64 = 2;
    pub const MORALE_FALL_PER_TICK: i64 = 1;
    pub const STARVATION_MORALE_PENALTY: i64 = 10;
    /// Growth only happens above this morale.
    pub const GROWTH_MORALE_THRESHOLD: i64 = 70;
    pub const GROWTH_RATE: f64 = 0.02;
    /// Population kept after a famine (deficit larger than the population).
    pub const FAMINE_SURVIVAL: f64 = 0.95;
    pub const HABITAT_CAPACITY_PER_LEVEL: i64 = 100;
    pub const MIN_EFFICIENCY: f64 = 0.5;
    pub const MAX_EFFICIENCY: f64 = 1.5;
}

pub mod ledger {
    /// Credits a bank can hold per building level.
    pub const CREDITS_PER_LEVEL: u64 = 1000;
    /// Credits paid to a user per active bank per tick.
    pub const BANK_INCOME_PER_TICK: i64 = 1;
}

pub mod network {
    /// Lanes at least this long are highways (phase 1); shorter ones are local fill.
    pub const HIGHWAY_THRESHOLD: f64 = 400.0;
    pub const HIGHWAYS_PER_NODE: usize = 2;
    pub const TARGET_DEGREE: usize = 3;
    pub const DEFAULT_MIN_DISTANCE: f64 = 100.0;
    pub const DEFAULT_MAX_DISTANCE: f64 = 900.0;
}
