//! Reward-per-unit accounting for reflection payouts.
//!
//! ```text
//!   deposit(amount, supply):   reward_per_unit += amount / supply
//!   accrued(holder):           (reward_per_unit − snapshot) × units
//!   claimable(holder):         unsettled + accrued(holder)
//! ```
//!
//! `reward_per_unit` is a [`RewardIndex`]: whole smallest units per token plus
//! a fraction in `1 / SCALE` steps, i.e. a 256-bit fixed-point value kept as
//! two `u128` halves. The whole part only overflows past `u128::MAX` units per
//! token.
//!
//! Every deposit and every holding change is O(1); nothing loops over holders
//! except the `total_claimable` view.
//!
//! ## Drift
//!
//! A deposit truncates less than one `1 / SCALE` step per circulating token,
//! which costs each holder strictly less than `units / SCALE` of the smallest
//! currency unit. Each settlement floors once more, losing less than one
//! smallest unit. Truncated value is never credited to anyone, so
//! `Σ claimable + total_claimed ≤ total_received` holds at all times and the
//! residue stays in the pool.

use ink::primitives::AccountId;
use ink::storage::Mapping;

use crate::constants::SCALE;
use crate::errors::Error;
use crate::Balance;

/// Fixed-point reward per token: `whole + fraction / SCALE`.
///
/// `fraction < SCALE` always holds, so the derived ordering is numeric.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, scale::Encode, scale::Decode)]
#[cfg_attr(feature = "std", derive(scale_info::TypeInfo, ink::storage::traits::StorageLayout))]
pub struct RewardIndex {
    pub whole: u128,
    pub fraction: u128,
}

impl RewardIndex {
    /// `self + amount / supply`, truncated to a `1 / SCALE` step.
    /// `None` on a zero supply or if the whole part overflows.
    pub fn add_share(self, amount: Balance, supply: u32) -> Option<Self> {
        if supply == 0 {
            return None;
        }
        let supply = supply as u128;
        // remainder < 2^32, so remainder × SCALE stays below 2^92
        let remainder_share = (amount % supply) * SCALE / supply;

        let fraction = self.fraction + remainder_share;
        let whole = self
            .whole
            .checked_add(amount / supply)?
            .checked_add(fraction / SCALE)?;
        Some(Self { whole, fraction: fraction % SCALE })
    }

    /// `self − earlier`, or zero if `earlier` is not behind `self`.
    pub fn since(self, earlier: Self) -> Self {
        if self <= earlier {
            return Self::default();
        }
        if self.fraction >= earlier.fraction {
            Self {
                whole: self.whole - earlier.whole,
                fraction: self.fraction - earlier.fraction,
            }
        } else {
            Self {
                whole: self.whole - earlier.whole - 1,
                fraction: self.fraction + SCALE - earlier.fraction,
            }
        }
    }

    /// `floor(self × units)` in smallest currency units.
    pub fn accrued(self, units: u32) -> Option<Balance> {
        let units = units as u128;
        // fraction < 2^60 and units < 2^32
        self.whole
            .checked_mul(units)?
            .checked_add(self.fraction * units / SCALE)
    }
}

#[derive(Debug)]
#[ink::storage_item]
pub struct RewardAccumulator {
    /// Cumulative reward per unit ever held.
    reward_per_unit: RewardIndex,
    /// Reflection received while nothing circulated; rolls into the next deposit.
    undistributed: Balance,
    total_received: Balance,
    total_claimed: Balance,

    snapshots: Mapping<AccountId, RewardIndex>,
    unsettled: Mapping<AccountId, Balance>,
    units: Mapping<AccountId, u32>,

    /// Index → holder, populated the first time an address receives a token.
    holders: Mapping<u32, AccountId>,
    holder_count: u32,
}

impl RewardAccumulator {
    pub fn new() -> Self {
        Self {
            reward_per_unit: RewardIndex::default(),
            undistributed: 0,
            total_received: 0,
            total_claimed: 0,
            snapshots: Mapping::default(),
            unsettled: Mapping::default(),
            units: Mapping::default(),
            holders: Mapping::default(),
            holder_count: 0,
        }
    }

    // =====================================================================
    // MUTATIONS
    // =====================================================================

    /// Spreads `amount` (plus anything carried forward) over `circulating`
    /// units. With nothing circulating the amount is parked in
    /// `undistributed` instead. Returns the amount actually distributed.
    pub fn deposit(&mut self, amount: Balance, circulating: u32) -> Result<Balance, Error> {
        let total_received = self
            .total_received
            .checked_add(amount)
            .ok_or(Error::Overflow)?;
        let pending = self
            .undistributed
            .checked_add(amount)
            .ok_or(Error::Overflow)?;

        if circulating == 0 {
            self.undistributed = pending;
            self.total_received = total_received;
            return Ok(0);
        }

        self.reward_per_unit = self
            .reward_per_unit
            .add_share(pending, circulating)
            .ok_or(Error::Overflow)?;
        self.undistributed = 0;
        self.total_received = total_received;

        Ok(pending)
    }

    /// Folds the holder's pending accrual into their unsettled balance and
    /// re-bases their snapshot. Returns the new unsettled balance.
    ///
    /// Accounts that never held a token have nothing to settle and are left
    /// untouched.
    pub fn settle(&mut self, holder: AccountId) -> Result<Balance, Error> {
        if !self.is_holder(holder) {
            return Ok(0);
        }

        let accrued = self.accrued(holder).ok_or(Error::Overflow)?;
        let owed = self
            .unsettled
            .get(holder)
            .unwrap_or(0)
            .checked_add(accrued)
            .ok_or(Error::Overflow)?;

        self.unsettled.insert(holder, &owed);
        self.snapshots.insert(holder, &self.reward_per_unit);
        Ok(owed)
    }

    /// Settle, then add `count` units. First-time holders are registered
    /// with a snapshot at the current index.
    pub fn increase_holding(&mut self, holder: AccountId, count: u32) -> Result<(), Error> {
        if !self.is_holder(holder) {
            self.register(holder)?;
        }
        self.settle(holder)?;
        let units = self
            .units_of(holder)
            .checked_add(count)
            .ok_or(Error::Overflow)?;
        self.units.insert(holder, &units);
        Ok(())
    }

    /// Settle, then remove `count` units.
    pub fn decrease_holding(&mut self, holder: AccountId, count: u32) -> Result<(), Error> {
        self.settle(holder)?;
        let units = self
            .units_of(holder)
            .checked_sub(count)
            .ok_or(Error::Overflow)?;
        self.units.insert(holder, &units);
        Ok(())
    }

    /// Settles and empties the holder's balance. The caller pays it out.
    pub fn claim(&mut self, holder: AccountId) -> Result<Balance, Error> {
        let owed = self.settle(holder)?;
        if owed == 0 {
            return Ok(0);
        }

        self.total_claimed = self
            .total_claimed
            .checked_add(owed)
            .ok_or(Error::Overflow)?;
        self.unsettled.insert(holder, &0);
        Ok(owed)
    }

    fn register(&mut self, holder: AccountId) -> Result<(), Error> {
        let index = self.holder_count;
        self.holder_count = index.checked_add(1).ok_or(Error::Overflow)?;
        self.holders.insert(index, &holder);
        self.snapshots.insert(holder, &self.reward_per_unit);
        Ok(())
    }

    // =====================================================================
    // VIEWS
    // =====================================================================

    /// Same figure `settle` would produce, without touching storage.
    pub fn claimable(&self, holder: AccountId) -> Balance {
        self.unsettled
            .get(holder)
            .unwrap_or(0)
            .saturating_add(self.accrued(holder).unwrap_or(Balance::MAX))
    }

    /// Accrual of a single unit held by `holder` since their last settlement.
    pub fn pending_per_unit(&self, holder: AccountId) -> Balance {
        if !self.is_holder(holder) {
            return 0;
        }
        // a single unit never exceeds the whole part
        self.delta(holder).whole
    }

    pub fn is_holder(&self, holder: AccountId) -> bool {
        self.snapshots.contains(holder)
    }

    pub fn units_of(&self, holder: AccountId) -> u32 {
        self.units.get(holder).unwrap_or(0)
    }

    pub fn reward_per_unit(&self) -> RewardIndex {
        self.reward_per_unit
    }

    pub fn undistributed(&self) -> Balance {
        self.undistributed
    }

    pub fn total_received(&self) -> Balance {
        self.total_received
    }

    pub fn total_claimed(&self) -> Balance {
        self.total_claimed
    }

    /// Reflection funds received and not yet paid out.
    pub fn pool_balance(&self) -> Balance {
        self.total_received.saturating_sub(self.total_claimed)
    }

    pub fn holder_count(&self) -> u32 {
        self.holder_count
    }

    pub fn holder_at(&self, index: u32) -> Option<AccountId> {
        self.holders.get(index)
    }

    /// Sum of every registered holder's claimable balance.
    pub fn total_claimable(&self) -> Balance {
        (0..self.holder_count)
            .filter_map(|index| self.holders.get(index))
            .fold(0, |sum: Balance, holder| sum.saturating_add(self.claimable(holder)))
    }

    fn delta(&self, holder: AccountId) -> RewardIndex {
        let snapshot = self.snapshots.get(holder).unwrap_or_default();
        self.reward_per_unit.since(snapshot)
    }

    fn accrued(&self, holder: AccountId) -> Option<Balance> {
        self.delta(holder).accrued(self.units_of(holder))
    }
}

impl Default for RewardAccumulator {
    fn default() -> Self {
        Self::new()
    }
}
