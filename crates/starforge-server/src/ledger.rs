//! Credit ledger over bank buildings.
//!
//! A user's spendable credits are whatever their active credit banks hold.
//! This is the only code that writes bank storage. Deductions for one user
//! are serialized so two purchases cannot both spend the same credits.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use starforge_logic::constants::ledger::BANK_INCOME_PER_TICK;
use starforge_logic::ledger::{self as vaults, Deposit, InsufficientFunds};

use crate::error::{LedgerError, StoreError};
use crate::store::{RecordStore, TableExt};
use crate::tables::{Building, Planet, User};

/// Result of one bank income pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BankIncome {
    pub users_paid: usize,
    pub credits_paid: i64,
    pub users_failed: usize,
}

pub struct CreditLedger {
    store: Arc<dyn RecordStore>,
    user_locks: Mutex<HashMap<u64, Arc<Mutex<()>>>>,
}

impl CreditLedger {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            user_locks: Mutex::new(HashMap::new()),
        }
    }

    fn user_lock(&self, user_id: u64) -> Arc<Mutex<()>> {
        let mut locks = self.user_locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.entry(user_id).or_default().clone()
    }

    fn require_user(&self, user_id: u64) -> Result<User, LedgerError> {
        self.store
            .find::<User>(user_id)?
            .ok_or(LedgerError::UserNotFound(user_id))
    }

    /// The user's credit banks, ordered by building id.
    pub fn vault_buildings(&self, user_id: u64) -> Result<Vec<Building>, LedgerError> {
        let planets: HashSet<u64> = self
            .store
            .filter::<Planet>(|p| p.owner == Some(user_id))?
            .into_iter()
            .map(|p| p.id)
            .collect();
        Ok(self
            .store
            .filter::<Building>(|b| b.holds_credits() && planets.contains(&b.planet_id))?)
    }

    /// Total credits held by the user's banks.
    pub fn balance(&self, user_id: u64) -> Result<u64, LedgerError> {
        self.require_user(user_id)?;
        let buildings = self.vault_buildings(user_id)?;
        let held: Vec<_> = buildings.iter().map(Building::vault).collect();
        Ok(vaults::balance(&held))
    }

    /// Spend `amount` credits, draining banks in id order.
    ///
    /// Either the full amount is deducted or nothing is. Returns the balance
    /// left afterwards.
    pub fn deduct(&self, user_id: u64, amount: u64) -> Result<u64, LedgerError> {
        self.require_user(user_id)?;
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        let buildings = self.vault_buildings(user_id)?;
        let held: Vec<_> = buildings.iter().map(Building::vault).collect();
        let plan = vaults::plan_deduction(&held, amount).map_err(
            |InsufficientFunds {
                 requested,
                 available,
             }| LedgerError::InsufficientFunds {
                requested,
                available,
            },
        )?;

        let by_id: BTreeMap<u64, &Building> = buildings.iter().map(|b| (b.id, b)).collect();
        let mut written: Vec<&Building> = Vec::new();
        for write in &plan {
            let Some(&original) = by_id.get(&write.building_id) else {
                continue;
            };
            let mut updated = original.clone();
            updated.stored = write.stored;
            if let Err(e) = self.store.save(&updated) {
                log::warn!(
                    "Deduct of {} for user {} failed at building {}: {}",
                    amount,
                    user_id,
                    original.id,
                    e
                );
                self.restore(&written);
                return Err(e.into());
            }
            written.push(original);
        }

        let remaining = vaults::balance(&held) - amount;
        log::debug!(
            "User {} spent {} credits, {} left",
            user_id,
            amount,
            remaining
        );
        Ok(remaining)
    }

    fn restore(&self, written: &[&Building]) {
        for original in written {
            if let Err(e) = self.store.save(*original) {
                log::error!(
                    "Could not restore bank {} to {} credits: {}",
                    original.id,
                    original.stored,
                    e
                );
            }
        }
    }

    /// Store credits in one bank. Whatever exceeds its capacity is discarded.
    pub fn deposit(&self, building_id: u64, amount: u64) -> Result<Deposit, LedgerError> {
        let building = self
            .store
            .find::<Building>(building_id)?
            .ok_or(LedgerError::BuildingNotFound(building_id))?;
        if !building.holds_credits() {
            return Err(LedgerError::NotAVault(building_id));
        }

        // Serialize with deductions for the same owner.
        let owner = self
            .store
            .find::<Planet>(building.planet_id)?
            .and_then(|p| p.owner);
        let lock = owner.map(|o| self.user_lock(o));
        let _guard = lock
            .as_ref()
            .map(|l| l.lock().unwrap_or_else(|e| e.into_inner()));

        // Re-read under the lock so a concurrent deduct is not overwritten.
        let mut building = self.store.fetch::<Building>(building_id)?;
        let deposit = vaults::deposit_capped(building.stored, building.level, amount);
        if deposit.overflow > 0 {
            log::debug!(
                "Bank {} full, discarded {} credits",
                building_id,
                deposit.overflow
            );
        }
        building.stored = deposit.stored;
        self.store.save(&building)?;
        Ok(deposit)
    }

    /// Pay every user one credit per active bank they own.
    ///
    /// This feeds the scalar `User::credits` balance, not bank storage.
    /// A user whose record cannot be written is skipped.
    pub fn apply_bank_income(&self) -> Result<BankIncome, StoreError> {
        let owners: HashMap<u64, u64> = self
            .store
            .all::<Planet>()?
            .into_iter()
            .filter_map(|p| p.owner.map(|owner| (p.id, owner)))
            .collect();

        let mut banks_per_user: BTreeMap<u64, i64> = BTreeMap::new();
        for bank in self.store.filter::<Building>(|b| b.is_bank() && b.active)? {
            if let Some(&owner) = owners.get(&bank.planet_id) {
                *banks_per_user.entry(owner).or_default() += 1;
            }
        }

        let mut income = BankIncome::default();
        for (user_id, banks) in banks_per_user {
            let paid = banks * BANK_INCOME_PER_TICK;
            let result = self.store.fetch::<User>(user_id).and_then(|mut user| {
                user.credits += paid;
                self.store.save(&user)
            });
            match result {
                Ok(()) => {
                    income.users_paid += 1;
                    income.credits_paid += paid;
                }
                Err(e) => {
                    log::warn!("Bank income for user {} skipped: {}", user_id, e);
                    income.users_failed += 1;
                }
            }
        }
        Ok(income)
    }
}
