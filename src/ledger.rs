//! External token ledger consumed by settlement.

use std::collections::HashMap;

use tracing::debug;

use crate::Amount;
use crate::engine::Marketplace;
use crate::model::ParticipantId;

/// Fungible-token ledger the marketplace pays through.
///
/// The marketplace only reads balances and allowances and asks for transfers;
/// minting and approvals belong to the ledger itself.
pub trait TokenLedger {
    fn balance_of(&self, who: ParticipantId) -> Amount;

    /// Amount `owner` has authorized `spender` to move on its behalf.
    fn allowance(&self, owner: ParticipantId, spender: ParticipantId) -> Amount;

    /// Move `amount` from `owner` to `recipient`, spending the allowance
    /// granted to `market.address()`. Returns `false` if the transfer was
    /// refused, in which case the ledger must be left unchanged.
    ///
    /// `market` is the marketplace performing the settlement. Implementations
    /// may call back into it, as a token with transfer hooks would.
    fn transfer_from(
        &mut self,
        market: &mut Marketplace,
        owner: ParticipantId,
        recipient: ParticipantId,
        amount: Amount,
    ) -> bool;
}

/// Ledger kept in process memory.
#[derive(Debug, Default, Clone)]
pub struct InMemoryLedger {
    balances: HashMap<ParticipantId, Amount>,
    allowances: HashMap<(ParticipantId, ParticipantId), Amount>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit new tokens to `to`. Saturates at the maximum representable amount.
    pub fn mint(&mut self, to: ParticipantId, amount: Amount) {
        let balance = self.balances.entry(to).or_default();
        *balance = balance
            .checked_add(amount)
            .unwrap_or(Amount::new(u128::MAX));
    }

    /// Set the allowance `owner` grants to `spender`, replacing any previous one.
    pub fn approve(&mut self, owner: ParticipantId, spender: ParticipantId, amount: Amount) {
        self.allowances.insert((owner, spender), amount);
    }

    fn move_funds(
        &mut self,
        spender: ParticipantId,
        owner: ParticipantId,
        recipient: ParticipantId,
        amount: Amount,
    ) -> bool {
        let allowance = self.allowance(owner, spender);
        let balance = self.balance_of(owner);
        let received = self.balance_of(recipient);

        let (Some(allowance), Some(balance)) =
            (allowance.checked_sub(amount), balance.checked_sub(amount))
        else {
            debug!(owner, spender, amount = %amount, "transfer refused");
            return false;
        };
        if owner != recipient && received.checked_add(amount).is_none() {
            return false;
        }

        self.allowances.insert((owner, spender), allowance);
        self.balances.insert(owner, balance);
        *self.balances.entry(recipient).or_default() += amount;
        true
    }
}

impl TokenLedger for InMemoryLedger {
    fn balance_of(&self, who: ParticipantId) -> Amount {
        self.balances.get(&who).copied().unwrap_or_default()
    }

    fn allowance(&self, owner: ParticipantId, spender: ParticipantId) -> Amount {
        self.allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or_default()
    }

    fn transfer_from(
        &mut self,
        market: &mut Marketplace,
        owner: ParticipantId,
        recipient: ParticipantId,
        amount: Amount,
    ) -> bool {
        self.move_funds(market.address(), owner, recipient, amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKET: ParticipantId = 1_000;

    fn market() -> Marketplace {
        Marketplace::new(0, MARKET)
    }

    #[test]
    fn mint_and_approve() {
        let mut ledger = InMemoryLedger::new();
        ledger.mint(1, Amount::new(500));
        ledger.mint(1, Amount::new(250));
        ledger.approve(1, MARKET, Amount::new(100));
        ledger.approve(1, MARKET, Amount::new(300));

        assert_eq!(ledger.balance_of(1), Amount::new(750));
        assert_eq!(ledger.allowance(1, MARKET), Amount::new(300));
        assert_eq!(ledger.balance_of(2), Amount::ZERO);
        assert_eq!(ledger.allowance(2, MARKET), Amount::ZERO);
    }

    #[test]
    fn transfer_consumes_allowance_and_moves_balance() {
        let mut ledger = InMemoryLedger::new();
        let mut market = market();
        ledger.mint(1, Amount::new(2_000));
        ledger.approve(1, MARKET, Amount::new(1_500));

        assert!(ledger.transfer_from(&mut market, 1, 2, Amount::new(1_500)));
        assert_eq!(ledger.balance_of(1), Amount::new(500));
        assert_eq!(ledger.balance_of(2), Amount::new(1_500));
        assert_eq!(ledger.allowance(1, MARKET), Amount::ZERO);
    }

    #[test]
    fn transfer_without_allowance_is_refused_unchanged() {
        let mut ledger = InMemoryLedger::new();
        let mut market = market();
        ledger.mint(1, Amount::new(2_000));
        ledger.approve(1, MARKET, Amount::new(10));

        assert!(!ledger.transfer_from(&mut market, 1, 2, Amount::new(11)));
        assert_eq!(ledger.balance_of(1), Amount::new(2_000));
        assert_eq!(ledger.balance_of(2), Amount::ZERO);
        assert_eq!(ledger.allowance(1, MARKET), Amount::new(10));
    }

    #[test]
    fn transfer_without_balance_is_refused() {
        let mut ledger = InMemoryLedger::new();
        let mut market = market();
        ledger.mint(1, Amount::new(5));
        ledger.approve(1, MARKET, Amount::new(100));

        assert!(!ledger.transfer_from(&mut market, 1, 2, Amount::new(6)));
        assert_eq!(ledger.balance_of(1), Amount::new(5));
    }

    #[test]
    fn allowance_is_per_spender() {
        let mut ledger = InMemoryLedger::new();
        let mut market = market();
        ledger.mint(1, Amount::new(100));
        ledger.approve(1, 77, Amount::new(100));

        assert!(!ledger.transfer_from(&mut market, 1, 2, Amount::new(1)));
    }
}
