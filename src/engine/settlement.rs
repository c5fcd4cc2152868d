//! Settlement: paying a picker for an approved transaction.
//!
//! Order of work inside [`Marketplace::settle`]:
//! 1. Take the settlement lock (reentrant calls fail here)
//! 2. Check the transaction is `Approved` and owned by the caller
//! 3. Check the caller's allowance and balance on the token ledger
//! 4. Mark the transaction `Settled`
//! 5. Ask the ledger to transfer `weight × price` to the picker
//!
//! Step 4 happens before step 5 so that a callback from the ledger can never
//! observe the transaction as still payable. Steps 4 and 5 run inside the
//! state journal: if the ledger refuses the transfer every change since step 4
//! is undone, including anything the callback changed, and none of the events
//! emitted meanwhile reach the log.

use tracing::warn;

use super::error::{MarketError, SettlementError, StateError};
use super::event::MarketEvent;
use super::Marketplace;
use crate::Amount;
use crate::ledger::TokenLedger;
use crate::model::{ParticipantId, TxId, TxState};

impl Marketplace {
    /// Pay the picker of an approved transaction on behalf of the owning
    /// company. Returns the amount paid.
    pub fn settle<L: TokenLedger + ?Sized>(
        &mut self,
        caller: ParticipantId,
        tx: TxId,
        ledger: &mut L,
    ) -> Result<Amount, MarketError> {
        let _guard = self.lock.enter().inspect_err(|_| {
            warn!(caller, tx, "settlement re-entered while in progress");
        })?;

        let record = self
            .state
            .transactions
            .get(tx)
            .ok_or(StateError::UnknownTransaction(tx))?;
        if record.state != TxState::Approved {
            return Err(StateError::InvalidState {
                tx,
                expected: TxState::Approved,
                actual: record.state,
            }
            .into());
        }
        if record.company != caller {
            return Err(StateError::NotOwner {
                tx,
                owner: record.company,
                caller,
            }
            .into());
        }
        let payee = record.picker;
        let amount = Amount::for_delivery(record.weight, record.price);

        let granted = ledger.allowance(caller, self.address);
        if granted < amount {
            return Err(SettlementError::InsufficientAllowance {
                needed: amount,
                granted,
            }
            .into());
        }
        let available = ledger.balance_of(caller);
        if available < amount {
            return Err(SettlementError::InsufficientBalance {
                needed: amount,
                available,
            }
            .into());
        }

        self.state.begin();
        match self.pay(caller, tx, payee, amount, ledger) {
            Ok(()) => {
                self.state.commit();
                Ok(amount)
            }
            Err(e) => {
                self.state.rollback();
                Err(e)
            }
        }
    }

    /// Effects, then the ledger interaction. Runs with the journal open.
    fn pay<L: TokenLedger + ?Sized>(
        &mut self,
        caller: ParticipantId,
        tx: TxId,
        payee: ParticipantId,
        amount: Amount,
        ledger: &mut L,
    ) -> Result<(), MarketError> {
        self.state
            .transition(tx, TxState::Approved, TxState::Settled)?;

        if !ledger.transfer_from(self, caller, payee, amount) {
            warn!(caller, tx, amount = %amount, "token transfer refused, rolling back");
            return Err(SettlementError::TransferFailed(tx).into());
        }

        self.state.emit(MarketEvent::PickerPaid {
            payer: caller,
            payee,
            amount,
        });
        Ok(())
    }
}
