//! Batch replay of a call log against a marketplace and an in-memory ledger.

use tokio_stream::{Stream, StreamExt};
use tracing::info;

use crate::{Amount, Call, InMemoryLedger, Marketplace, ParticipantId};

/// One row of a call log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// A marketplace call issued by `caller`.
    Call { caller: ParticipantId, call: Call },
    /// Credit tokens to `to` on the ledger.
    Mint { to: ParticipantId, amount: Amount },
    /// `owner` authorizes the marketplace to spend `amount` on its behalf.
    Approve { owner: ParticipantId, amount: Amount },
}

/// Apply every command of the stream in order.
///
/// A rejected call does not stop the replay; the rejection is logged by
/// [`Marketplace::apply`].
pub async fn replay(
    market: &mut Marketplace,
    ledger: &mut InMemoryLedger,
    mut commands: impl Stream<Item = Command> + Unpin,
) {
    while let Some(command) = commands.next().await {
        apply_command(market, ledger, command);
    }
}

pub fn apply_command(market: &mut Marketplace, ledger: &mut InMemoryLedger, command: Command) {
    match command {
        Command::Call { caller, call } => {
            // errors are already logged, so we just ignore the application result
            let _ = market.apply(caller, call, ledger);
        }
        Command::Mint { to, amount } => {
            ledger.mint(to, amount);
            info!(to, amount = %amount, "mint applied");
        }
        Command::Approve { owner, amount } => {
            ledger.approve(owner, market.address(), amount);
            info!(owner, amount = %amount, "approve applied");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TokenLedger, TxState};

    const MARKET: ParticipantId = 1_000;

    fn call(caller: ParticipantId, call: Call) -> Command {
        Command::Call { caller, call }
    }

    fn scenario() -> Vec<Command> {
        vec![
            call(
                10,
                Call::RegisterCompany {
                    name: "Acme".into(),
                    min_weight: 100,
                    max_price: 10,
                    active: true,
                },
            ),
            call(
                20,
                Call::RegisterPicker {
                    name: "Ana".into(),
                    email: "ana@example.org".into(),
                },
            ),
            call(
                20,
                Call::Deposit {
                    company: 10,
                    weight: 150,
                },
            ),
            // rejected: below minimum
            call(
                20,
                Call::Deposit {
                    company: 10,
                    weight: 50,
                },
            ),
            call(10, Call::Validate { tx: 0 }),
            Command::Mint {
                to: 10,
                amount: Amount::new(2_000),
            },
            Command::Approve {
                owner: 10,
                amount: Amount::new(1_500),
            },
            call(10, Call::Settle { tx: 0 }),
            // rejected: already settled
            call(10, Call::Settle { tx: 0 }),
        ]
    }

    #[tokio::test]
    async fn replay_runs_past_rejected_calls() {
        let mut market = Marketplace::new(1, MARKET);
        let mut ledger = InMemoryLedger::new();

        replay(
            &mut market,
            &mut ledger,
            tokio_stream::iter(scenario()),
        )
        .await;

        assert_eq!(market.transaction_count(), 1);
        assert_eq!(market.transaction(0).unwrap().state, TxState::Settled);
        assert_eq!(ledger.balance_of(20), Amount::new(1_500));
        assert_eq!(ledger.balance_of(10), Amount::new(500));
        assert_eq!(ledger.allowance(10, MARKET), Amount::ZERO);
    }
}
