//! Pure credit ledger arithmetic over bank vaults.
//!
//! A user's credits are not a single number: they are the sum of what their
//! banks hold. Deduction is planned in full before anything is written so a
//! failed purchase never leaves a partial drain behind.

use serde::{Deserialize, Serialize};

use crate::constants::ledger::CREDITS_PER_LEVEL;

/// Credit storage view of one bank building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vault {
    pub building_id: u64,
    pub level: u64,
    pub stored: u64,
}

impl Vault {
    pub fn capacity(&self) -> u64 {
        vault_capacity(self.level)
    }
}

/// A single vault write produced by a deduction plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VaultWrite {
    pub building_id: u64,
    pub stored: u64,
}

/// Requested more than the vaults hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsufficientFunds {
    pub requested: u64,
    pub available: u64,
}

/// Outcome of depositing into one vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deposit {
    /// New stored value.
    pub stored: u64,
    /// Amount actually added.
    pub accepted: u64,
    /// Amount discarded because the vault was full.
    pub overflow: u64,
}

/// Maximum credits a bank of `level` can hold.
pub fn vault_capacity(level: u64) -> u64 {
    CREDITS_PER_LEVEL.saturating_mul(level)
}

/// Total credits across `vaults`.
pub fn balance(vaults: &[Vault]) -> u64 {
    vaults.iter().map(|v| v.stored).sum()
}

/// Plan draining `amount` credits from `vaults` in the given order.
///
/// Each vault is emptied before the next one is touched. Vaults left
/// untouched get no write. Fails without a plan if the total is short.
pub fn plan_deduction(vaults: &[Vault], amount: u64) -> Result<Vec<VaultWrite>, InsufficientFunds> {
    let available = balance(vaults);
    if available < amount {
        return Err(InsufficientFunds {
            requested: amount,
            available,
        });
    }

    let mut remaining = amount;
    let mut writes = Vec::new();
    for vault in vaults {
        if remaining == 0 {
            break;
        }
        if vault.stored == 0 {
            continue;
        }
        let take = vault.stored.min(remaining);
        remaining -= take;
        writes.push(VaultWrite {
            building_id: vault.building_id,
            stored: vault.stored - take,
        });
    }
    Ok(writes)
}

/// Add `amount` to a vault, discarding whatever exceeds capacity.
pub fn deposit_capped(stored: u64, level: u64, amount: u64) -> Deposit {
    let capacity = vault_capacity(level);
    // Also pulls a vault whose level was lowered back under its cap.
    let new_stored = stored.saturating_add(amount).min(capacity);
    let accepted = new_stored.saturating_sub(stored);
    Deposit {
        stored: new_stored,
        accepted,
        overflow: amount - accepted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vault(id: u64, level: u64, stored: u64) -> Vault {
        Vault {
            building_id: id,
            level,
            stored,
        }
    }

    #[test]
    fn test_balance_sums_vaults() {
        let vaults = [vault(1, 1, 300), vault(2, 2, 500), vault(3, 1, 0)];
        assert_eq!(balance(&vaults), 800);
        assert_eq!(balance(&[]), 0);
    }

    #[test]
    fn test_plan_drains_in_order() {
        let vaults = [vault(1, 1, 300), vault(2, 2, 500), vault(3, 1, 200)];
        let plan = plan_deduction(&vaults, 600).unwrap();
        assert_eq!(
            plan,
            vec![
                VaultWrite { building_id: 1, stored: 0 },
                VaultWrite { building_id: 2, stored: 200 },
            ]
        );
    }

    #[test]
    fn test_plan_rejects_shortfall() {
        let vaults = [vault(1, 1, 300), vault(2, 1, 100)];
        assert_eq!(
            plan_deduction(&vaults, 401),
            Err(InsufficientFunds { requested: 401, available: 400 })
        );
    }

    #[test]
    fn test_plan_exact_balance() {
        let vaults = [vault(1, 1, 300), vault(2, 1, 100)];
        let plan = plan_deduction(&vaults, 400).unwrap();
        assert!(plan.iter().all(|w| w.stored == 0));
        assert_eq!(plan.len(), 2);
    }

    #[test]
    fn test_plan_zero_amount_is_empty() {
        let vaults = [vault(1, 1, 300)];
        assert!(plan_deduction(&vaults, 0).unwrap().is_empty());
    }

    #[test]
    fn test_plan_skips_empty_vaults() {
        let vaults = [vault(1, 1, 0), vault(2, 1, 50)];
        let plan = plan_deduction(&vaults, 10).unwrap();
        assert_eq!(plan, vec![VaultWrite { building_id: 2, stored: 40 }]);
    }

    #[test]
    fn test_deposit_caps_at_capacity() {
        let d = deposit_capped(900, 1, 250);
        assert_eq!(d.stored, 1000);
        assert_eq!(d.accepted, 100);
        assert_eq!(d.overflow, 150);
    }

    #[test]
    fn test_deposit_within_capacity() {
        let d = deposit_capped(100, 2, 250);
        assert_eq!(d.stored, 350);
        assert_eq!(d.accepted, 250);
        assert_eq!(d.overflow, 0);
    }

    #[test]
    fn test_deposit_level_zero_discards_all() {
        let d = deposit_capped(0, 0, 500);
        assert_eq!(d.stored, 0);
        assert_eq!(d.overflow, 500);
    }
}
