use ink::primitives::AccountId;
use ink::storage::Mapping;

use crate::constants::zero_account;
use crate::errors::Error;
use crate::TokenId;

/// Ground truth for who owns which token.
///
/// Ids are handed out sequentially from zero and never burned, so
/// `total_minted` doubles as the circulating supply.
#[derive(Debug)]
#[ink::storage_item]
pub struct Ledger {
    owners: Mapping<TokenId, AccountId>,
    token_approvals: Mapping<TokenId, AccountId>,
    operator_approvals: Mapping<(AccountId, AccountId), bool>,
    total_minted: u32,
    max_supply: u32,
}

impl Ledger {
    pub fn new(max_supply: u32) -> Self {
        Self {
            owners: Mapping::default(),
            token_approvals: Mapping::default(),
            operator_approvals: Mapping::default(),
            total_minted: 0,
            max_supply,
        }
    }

    // ---------------------------------------------------------------------
    // Ownership
    // ---------------------------------------------------------------------

    /// Fails with `SupplyExceeded` if `quantity` more tokens would not fit.
    pub fn ensure_capacity(&self, quantity: u32) -> Result<(), Error> {
        let after = self
            .total_minted
            .checked_add(quantity)
            .ok_or(Error::SupplyExceeded)?;
        if after > self.max_supply {
            return Err(Error::SupplyExceeded);
        }
        Ok(())
    }

    pub fn create(&mut self, owner: AccountId) -> Result<TokenId, Error> {
        if self.total_minted >= self.max_supply {
            return Err(Error::SupplyExceeded);
        }
        if owner == zero_account() {
            return Err(Error::InvalidRecipient);
        }

        let id = self.total_minted;
        self.owners.insert(id, &owner);
        self.total_minted += 1;
        Ok(id)
    }

    /// Moves `id` from `from` to `to` and drops any single-token approval.
    pub fn transfer(&mut self, from: AccountId, to: AccountId, id: TokenId) -> Result<(), Error> {
        let owner = self.owners.get(id).ok_or(Error::TokenNotFound)?;
        if owner != from {
            return Err(Error::NotOwner);
        }
        if to == zero_account() {
            return Err(Error::InvalidRecipient);
        }

        self.token_approvals.remove(id);
        self.owners.insert(id, &to);
        Ok(())
    }

    pub fn owner_of(&self, id: TokenId) -> Option<AccountId> {
        self.owners.get(id)
    }

    pub fn exists(&self, id: TokenId) -> bool {
        id < self.total_minted
    }

    pub fn total_minted(&self) -> u32 {
        self.total_minted
    }

    pub fn max_supply(&self) -> u32 {
        self.max_supply
    }

    // ---------------------------------------------------------------------
    // Approvals
    // ---------------------------------------------------------------------

    pub fn approve(&mut self, id: TokenId, spender: AccountId) {
        self.token_approvals.insert(id, &spender);
    }

    pub fn clear_approval(&mut self, id: TokenId) {
        self.token_approvals.remove(id);
    }

    pub fn approved(&self, id: TokenId) -> Option<AccountId> {
        self.token_approvals.get(id)
    }

    pub fn set_operator(&mut self, owner: AccountId, operator: AccountId, approved: bool) {
        if approved {
            self.operator_approvals.insert((owner, operator), &true);
        } else {
            self.operator_approvals.remove((owner, operator));
        }
    }

    pub fn is_operator(&self, owner: AccountId, operator: AccountId) -> bool {
        self.operator_approvals.get((owner, operator)).unwrap_or(false)
    }

    /// Owner, approved spender, or operator of the owner.
    pub fn can_move(&self, spender: AccountId, id: TokenId) -> bool {
        match self.owners.get(id) {
            Some(owner) => {
                spender == owner
                    || self.token_approvals.get(id) == Some(spender)
                    || self.is_operator(owner, spender)
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ink::env::{test, DefaultEnvironment};

    type Env = DefaultEnvironment;

    fn accounts() -> test::DefaultAccounts<Env> {
        test::default_accounts::<Env>()
    }

    #[ink::test]
    fn create_assigns_sequential_ids() {
        let accs = accounts();
        let mut ledger = Ledger::new(3);

        assert_eq!(ledger.create(accs.alice), Ok(0));
        assert_eq!(ledger.create(accs.bob), Ok(1));
        assert_eq!(ledger.owner_of(0), Some(accs.alice));
        assert_eq!(ledger.owner_of(1), Some(accs.bob));
        assert_eq!(ledger.total_minted(), 2);
        assert!(ledger.exists(1));
        assert!(!ledger.exists(2));
    }

    #[ink::test]
    fn create_stops_at_max_supply() {
        let accs = accounts();
        let mut ledger = Ledger::new(2);
        ledger.create(accs.alice).unwrap();
        ledger.create(accs.alice).unwrap();

        assert_eq!(ledger.create(accs.alice), Err(Error::SupplyExceeded));
        assert_eq!(ledger.total_minted(), 2);
    }

    #[ink::test]
    fn ensure_capacity_checks_the_whole_batch() {
        let accs = accounts();
        let mut ledger = Ledger::new(5);
        ledger.create(accs.alice).unwrap();

        assert_eq!(ledger.ensure_capacity(4), Ok(()));
        assert_eq!(ledger.ensure_capacity(5), Err(Error::SupplyExceeded));
        assert_eq!(ledger.ensure_capacity(u32::MAX), Err(Error::SupplyExceeded));
    }

    #[ink::test]
    fn transfer_rejects_wrong_sender() {
        let accs = accounts();
        let mut ledger = Ledger::new(10);
        ledger.create(accs.alice).unwrap();

        assert_eq!(ledger.transfer(accs.bob, accs.charlie, 0), Err(Error::NotOwner));
        assert_eq!(ledger.owner_of(0), Some(accs.alice));
    }

    #[ink::test]
    fn transfer_rejects_zero_recipient_and_unknown_token() {
        let accs = accounts();
        let mut ledger = Ledger::new(10);
        ledger.create(accs.alice).unwrap();

        assert_eq!(
            ledger.transfer(accs.alice, zero_account(), 0),
            Err(Error::InvalidRecipient)
        );
        assert_eq!(ledger.transfer(accs.alice, accs.bob, 7), Err(Error::TokenNotFound));
    }

    #[ink::test]
    fn transfer_clears_single_token_approval() {
        let accs = accounts();
        let mut ledger = Ledger::new(10);
        ledger.create(accs.alice).unwrap();
        ledger.approve(0, accs.django);
        assert!(ledger.can_move(accs.django, 0));

        ledger.transfer(accs.alice, accs.bob, 0).unwrap();

        assert_eq!(ledger.owner_of(0), Some(accs.bob));
        assert_eq!(ledger.approved(0), None);
        assert!(!ledger.can_move(accs.django, 0));
    }

    #[ink::test]
    fn operators_can_move_every_token_of_the_owner() {
        let accs = accounts();
        let mut ledger = Ledger::new(10);
        ledger.create(accs.alice).unwrap();
        ledger.create(accs.alice).unwrap();

        ledger.set_operator(accs.alice, accs.eve, true);
        assert!(ledger.can_move(accs.eve, 0));
        assert!(ledger.can_move(accs.eve, 1));

        ledger.set_operator(accs.alice, accs.eve, false);
        assert!(!ledger.is_operator(accs.alice, accs.eve));
        assert!(!ledger.can_move(accs.eve, 1));
    }
}
