#![cfg_attr(not(feature = "std"), no_std, no_main)]

pub mod accumulator;
pub mod errors;
pub mod ledger;

pub type Balance = u128;
pub type TokenId = u32;

pub mod constants {
    use ink::primitives::AccountId;

    /// Fixed-point factor for the reward-per-unit accumulator (18 decimals).
    pub const SCALE: u128 = 1_000_000_000_000_000_000;

    /// Collection cap used by the six-argument constructor.
    pub const MAX_SUPPLY: u32 = 100;

    /// Reflection share is a whole percentage.
    pub const PERCENT_DENOMINATOR: u128 = 100;

    /// Raw bytes of the zero account.
    pub const ZERO_ADDRESS: [u8; 32] = [0u8; 32];

    /// Stand-in for "no account": never a valid owner, recipient or beneficiary.
    pub fn zero_account() -> AccountId {
        AccountId::from(ZERO_ADDRESS)
    }
}

/// # Reflectionary NFT
///
/// **Role:** Fixed-supply, pay-to-mint NFT collection. Every mint payment is
/// split in two: a configurable percentage is reflected back to the holders
/// of the collection (proportional to how many tokens each one holds), the
/// rest goes straight to the beneficiary.
///
/// ```text
///   mint_tokens(n) ── price × n ──┬── reflection % ──► RewardAccumulator
///                                 │                     (all holders, incl. minter)
///                                 └── remainder ──────► beneficiary
///
///   transfer_from ──► ledger.transfer ─► settle + debit(from) ─► settle + credit(to)
///                                        (accrual stays with the sender, claimable any time)
/// ```
///
/// Three layers, leaves first:
/// - `Ledger` (`ledger.rs`) — ownership, approvals and the supply cap.
/// - `RewardAccumulator` (`accumulator.rs`) — reward-per-unit accounting.
/// - `ReflectionaryNft` (this module) — sale gating, payment split,
///   settlement on every ownership change.
#[ink::contract]
mod reflectionary_nft {
    use ink::prelude::format;
    use ink::prelude::string::String;

    use crate::accumulator::{RewardAccumulator, RewardIndex};
    use crate::constants::{zero_account, MAX_SUPPLY, PERCENT_DENOMINATOR};
    use crate::ledger::Ledger;
    use crate::TokenId;

    pub use crate::errors::Error;

    // =========================================================================
    // STORAGE
    // =========================================================================

    #[ink(storage)]
    pub struct ReflectionaryNft {
        /// Admin: toggles the sale, sets the base URI.
        owner: AccountId,
        beneficiary: AccountId,

        name: String,
        symbol: String,
        base_uri: String,

        price: Balance,
        /// Percentage (0–100) of each mint payment reflected to holders.
        reflection_share: u8,
        sale_active: bool,

        ledger: Ledger,
        rewards: RewardAccumulator,
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    #[ink(event)]
    pub struct Transfer {
        #[ink(topic)]
        from: Option<AccountId>,
        #[ink(topic)]
        to: Option<AccountId>,
        #[ink(topic)]
        id: TokenId,
    }

    #[ink(event)]
    pub struct Approval {
        #[ink(topic)]
        owner: AccountId,
        #[ink(topic)]
        approved: AccountId,
        #[ink(topic)]
        id: TokenId,
    }

    #[ink(event)]
    pub struct ApprovalForAll {
        #[ink(topic)]
        owner: AccountId,
        #[ink(topic)]
        operator: AccountId,
        approved: bool,
    }

    #[ink(event)]
    pub struct SaleStateSwitched {
        active: bool,
    }

    /// Reflection share of a mint folded into the accumulator.
    #[ink(event)]
    pub struct ReflectionDeposited {
        #[ink(topic)]
        minter: AccountId,
        amount: Balance,
        distributed: Balance,
        circulating_supply: u32,
        reward_per_unit: RewardIndex,
    }

    #[ink(event)]
    pub struct BeneficiaryPaid {
        #[ink(topic)]
        beneficiary: AccountId,
        amount: Balance,
    }

    #[ink(event)]
    pub struct RewardClaimed {
        #[ink(topic)]
        holder: AccountId,
        amount: Balance,
    }

    #[ink(event)]
    pub struct OwnershipTransferred {
        #[ink(topic)]
        previous: AccountId,
        #[ink(topic)]
        new_owner: AccountId,
    }

    #[ink(event)]
    pub struct BaseUriChanged {
        base_uri: String,
    }

    // =========================================================================
    // IMPLEMENTATION
    // =========================================================================

    impl ReflectionaryNft {
        #[ink(constructor)]
        pub fn new(
            name: String,
            symbol: String,
            beneficiary: AccountId,
            base_uri: String,
            reflection_share: u8,
            price: Balance,
        ) -> Result<Self, Error> {
            Self::with_max_supply(
                name,
                symbol,
                beneficiary,
                base_uri,
                reflection_share,
                price,
                MAX_SUPPLY,
            )
        }

        #[ink(constructor)]
        pub fn with_max_supply(
            name: String,
            symbol: String,
            beneficiary: AccountId,
            base_uri: String,
            reflection_share: u8,
            price: Balance,
            max_supply: u32,
        ) -> Result<Self, Error> {
            if reflection_share as u128 > PERCENT_DENOMINATOR {
                return Err(Error::InvalidReflectionShare);
            }
            if beneficiary == zero_account() {
                return Err(Error::InvalidRecipient);
            }

            Ok(Self {
                owner: Self::env().caller(),
                beneficiary,
                name,
                symbol,
                base_uri,
                price,
                reflection_share,
                sale_active: false,
                ledger: Ledger::new(max_supply),
                rewards: RewardAccumulator::new(),
            })
        }

        // =====================================================================
        // SALE
        // =====================================================================

        #[ink(message)]
        pub fn switch_sale_state(&mut self) -> Result<(), Error> {
            self.only_owner()?;
            self.sale_active = !self.sale_active;
            self.env().emit_event(SaleStateSwitched { active: self.sale_active });
            Ok(())
        }

        /// Mint `quantity` tokens to the caller.
        ///
        /// The attached value must be exactly `price × quantity`. The
        /// reflection share is deposited *after* the new tokens are counted,
        /// so the minter shares in their own purchase.
        #[ink(message, payable)]
        pub fn mint_tokens(&mut self, quantity: u32) -> Result<(), Error> {
            let caller = self.env().caller();
            let payment = self.env().transferred_value();

            if !self.sale_active {
                return Err(Error::SaleInactive);
            }
            if quantity == 0 {
                return Err(Error::InvalidQuantity);
            }
            self.ledger.ensure_capacity(quantity)?;

            let required = self
                .price
                .checked_mul(quantity as Balance)
                .ok_or(Error::Overflow)?;
            if payment != required {
                return Err(Error::InsufficientPayment);
            }

            let (reflection_amount, beneficiary_amount) = self.split_payment(payment)?;

            for _ in 0..quantity {
                let id = self.ledger.create(caller)?;
                self.rewards.increase_holding(caller, 1)?;
                self.env().emit_event(Transfer { from: None, to: Some(caller), id });
            }

            let circulating_supply = self.ledger.total_minted();
            let distributed = self.rewards.deposit(reflection_amount, circulating_supply)?;
            self.env().emit_event(ReflectionDeposited {
                minter: caller,
                amount: reflection_amount,
                distributed,
                circulating_supply,
                reward_per_unit: self.rewards.reward_per_unit(),
            });

            if beneficiary_amount > 0 {
                self.pay_out(self.beneficiary, beneficiary_amount)?;
                self.env().emit_event(BeneficiaryPaid {
                    beneficiary: self.beneficiary,
                    amount: beneficiary_amount,
                });
            }

            Ok(())
        }

        /// `(reflection, beneficiary)` parts of a payment; they always sum to it.
        ///
        /// `floor(payment × share / 100)` computed on quotient and remainder
        /// separately, so any `Balance` splits without overflow.
        fn split_payment(&self, payment: Balance) -> Result<(Balance, Balance), Error> {
            let share = self.reflection_share as Balance;
            let reflection_amount = (payment / PERCENT_DENOMINATOR)
                .checked_mul(share)
                .and_then(|whole| {
                    whole.checked_add(payment % PERCENT_DENOMINATOR * share / PERCENT_DENOMINATOR)
                })
                .ok_or(Error::Overflow)?;
            let beneficiary_amount = payment
                .checked_sub(reflection_amount)
                .ok_or(Error::Overflow)?;
            Ok((reflection_amount, beneficiary_amount))
        }

        /// Native transfer out of the contract. Fails with `TransferFailed`
        /// when the contract cannot cover `amount`.
        fn pay_out(&self, to: AccountId, amount: Balance) -> Result<(), Error> {
            if amount > self.env().balance() {
                return Err(Error::TransferFailed);
            }
            self.env()
                .transfer(to, amount)
                .map_err(|_| Error::TransferFailed)
        }

        // =====================================================================
        // TRANSFERS & APPROVALS
        // =====================================================================

        #[ink(message)]
        pub fn transfer_from(&mut self, from: AccountId, to: AccountId, id: TokenId) -> Result<(), Error> {
            let caller = self.env().caller();
            if !self.ledger.exists(id) {
                return Err(Error::TokenNotFound);
            }
            if !self.ledger.can_move(caller, id) {
                return Err(Error::NotOwner);
            }
            self.move_token(from, to, id)
        }

        #[ink(message)]
        pub fn transfer(&mut self, to: AccountId, id: TokenId) -> Result<(), Error> {
            let caller = self.env().caller();
            self.transfer_from(caller, to, id)
        }

        /// Ledger move plus settlement of both sides. The sender's accrual
        /// is parked in their claimable balance, not paid out.
        fn move_token(&mut self, from: AccountId, to: AccountId, id: TokenId) -> Result<(), Error> {
            self.ledger.transfer(from, to, id)?;
            self.rewards.decrease_holding(from, 1)?;
            self.rewards.increase_holding(to, 1)?;
            self.env().emit_event(Transfer { from: Some(from), to: Some(to), id });
            Ok(())
        }

        #[ink(message)]
        pub fn approve(&mut self, to: AccountId, id: TokenId) -> Result<(), Error> {
            let caller = self.env().caller();
            let owner = self.ledger.owner_of(id).ok_or(Error::TokenNotFound)?;
            if caller != owner && !self.ledger.is_operator(owner, caller) {
                return Err(Error::NotOwner);
            }
            if to == owner {
                return Err(Error::InvalidRecipient);
            }

            if to == zero_account() {
                self.ledger.clear_approval(id);
            } else {
                self.ledger.approve(id, to);
            }
            self.env().emit_event(Approval { owner, approved: to, id });
            Ok(())
        }

        #[ink(message)]
        pub fn set_approval_for_all(&mut self, operator: AccountId, approved: bool) -> Result<(), Error> {
            let caller = self.env().caller();
            if operator == caller {
                return Err(Error::InvalidRecipient);
            }
            self.ledger.set_operator(caller, operator, approved);
            self.env().emit_event(ApprovalForAll { owner: caller, operator, approved });
            Ok(())
        }

        // =====================================================================
        // REFLECTION
        // =====================================================================

        /// Pay out everything the caller has accrued. Returns the amount;
        /// zero is a normal outcome.
        #[ink(message)]
        pub fn claim_rewards(&mut self) -> Result<Balance, Error> {
            let caller = self.env().caller();
            let amount = self.rewards.claim(caller)?;
            if amount == 0 {
                return Ok(0);
            }

            self.pay_out(caller, amount)?;
            self.env().emit_event(RewardClaimed { holder: caller, amount });
            Ok(amount)
        }

        /// Reflection funds held by the contract and not yet claimed,
        /// including rounding residue.
        #[ink(message)]
        pub fn reflection_balance(&self) -> Balance {
            self.rewards.pool_balance()
        }

        /// Accrual of token `id` under its current owner since that owner's
        /// last settlement. Zero right after the token changes hands.
        #[ink(message)]
        pub fn get_reflection_balance(&self, id: TokenId) -> Result<Balance, Error> {
            let owner = self.ledger.owner_of(id).ok_or(Error::TokenNotFound)?;
            Ok(self.rewards.pending_per_unit(owner))
        }

        /// Caller's claimable reflection.
        #[ink(message)]
        pub fn get_reflection_balances(&self) -> Balance {
            self.rewards.claimable(self.env().caller())
        }

        #[ink(message)]
        pub fn reflection_balance_of(&self, account: AccountId) -> Balance {
            self.rewards.claimable(account)
        }

        /// Sum of every holder's claimable balance. Walks the holder registry.
        #[ink(message)]
        pub fn total_claimable(&self) -> Balance {
            self.rewards.total_claimable()
        }

        #[ink(message)]
        pub fn undistributed_reflection(&self) -> Balance {
            self.rewards.undistributed()
        }

        #[ink(message)]
        pub fn reward_per_unit(&self) -> RewardIndex {
            self.rewards.reward_per_unit()
        }

        // =====================================================================
        // VIEW FUNCTIONS
        // =====================================================================

        #[ink(message)]
        pub fn name(&self) -> String { self.name.clone() }

        #[ink(message)]
        pub fn symbol(&self) -> String { self.symbol.clone() }

        #[ink(message)]
        pub fn is_sale_active(&self) -> bool { self.sale_active }

        #[ink(message)]
        pub fn reflection(&self) -> u8 { self.reflection_share }

        #[ink(message)]
        pub fn price(&self) -> Balance { self.price }

        #[ink(message)]
        pub fn beneficiary(&self) -> AccountId { self.beneficiary }

        #[ink(message)]
        pub fn owner(&self) -> AccountId { self.owner }

        #[ink(message)]
        pub fn max_supply(&self) -> u32 { self.ledger.max_supply() }

        /// Tokens minted so far (none are ever burned).
        #[ink(message)]
        pub fn total_supply(&self) -> u32 { self.ledger.total_minted() }

        #[ink(message)]
        pub fn owner_of(&self, id: TokenId) -> Option<AccountId> {
            self.ledger.owner_of(id)
        }

        #[ink(message)]
        pub fn balance_of(&self, owner: AccountId) -> u32 {
            self.rewards.units_of(owner)
        }

        #[ink(message)]
        pub fn get_approved(&self, id: TokenId) -> Option<AccountId> {
            self.ledger.approved(id)
        }

        #[ink(message)]
        pub fn is_approved_for_all(&self, owner: AccountId, operator: AccountId) -> bool {
            self.ledger.is_operator(owner, operator)
        }

        #[ink(message)]
        pub fn base_uri(&self) -> String { self.base_uri.clone() }

        #[ink(message)]
        pub fn token_uri(&self, id: TokenId) -> Result<String, Error> {
            if !self.ledger.exists(id) {
                return Err(Error::TokenNotFound);
            }
            Ok(format!("{}{}", self.base_uri, id))
        }

        // =====================================================================
        // ADMIN
        // =====================================================================

        #[ink(message)]
        pub fn set_base_uri(&mut self, base_uri: String) -> Result<(), Error> {
            self.only_owner()?;
            self.base_uri = base_uri.clone();
            self.env().emit_event(BaseUriChanged { base_uri });
            Ok(())
        }

        #[ink(message)]
        pub fn transfer_ownership(&mut self, new_owner: AccountId) -> Result<(), Error> {
            self.only_owner()?;
            if new_owner == zero_account() {
                return Err(Error::InvalidRecipient);
            }
            let previous = self.owner;
            self.owner = new_owner;
            self.env().emit_event(OwnershipTransferred { previous, new_owner });
            Ok(())
        }

        fn only_owner(&self) -> Result<(), Error> {
            if self.env().caller() != self.owner {
                return Err(Error::Unauthorized);
            }
            Ok(())
        }
    }

    // =========================================================================
    // UNIT TESTS
    // =========================================================================

}
