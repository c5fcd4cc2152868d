pub mod amount;
pub mod csv;
pub mod engine;
pub mod ledger;
pub mod model;
pub mod replay;

pub use amount::Amount;
pub use engine::{MarketError, MarketEvent, Marketplace, Role};
pub use ledger::{InMemoryLedger, TokenLedger};
pub use model::{Call, Company, ParticipantId, Picker, Price, Transaction, TxId, TxState, Weight};
