//! Error types for marketplace calls.

use thiserror::Error;

use crate::Amount;
use crate::model::{ParticipantId, TxId, TxState, Weight};

/// Top-level error returned by every mutating [`Marketplace`](super::Marketplace) call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MarketError {
    #[error("unauthorized: {0}")]
    Authorization(#[from] AuthError),

    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    State(#[from] StateError),

    #[error("settlement failed: {0}")]
    Settlement(#[from] SettlementError),

    #[error("reentrant settlement call rejected")]
    Reentrancy,
}

/// The caller does not hold the role the call requires.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("{0} is not a registered company")]
    NotCompany(ParticipantId),
    #[error("company {0} is not active")]
    InactiveCompany(ParticipantId),
    #[error("{0} is not a registered picker")]
    NotPicker(ParticipantId),
}

/// Malformed call arguments.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,
    #[error("email must not be empty")]
    EmptyEmail,
    #[error("minimum weight must be greater than zero")]
    ZeroMinWeight,
    #[error("maximum price must be greater than zero")]
    ZeroMaxPrice,
    #[error("weight must be greater than zero")]
    ZeroWeight,
    #[error("weight {weight} is below the company minimum of {minimum}")]
    BelowMinimumWeight { weight: Weight, minimum: Weight },
    #[error("deposited weight of picker {0} would overflow")]
    WeightOverflow(ParticipantId),
}

/// Which side of the marketplace a registration refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Company,
    Picker,
}

/// The call conflicts with the current marketplace state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("{1} is already registered as a {0:?}")]
    AlreadyRegistered(Side, ParticipantId),
    #[error("company {0} not found")]
    UnknownCompany(ParticipantId),
    #[error("company {0} is not accepting deposits")]
    CompanyInactive(ParticipantId),
    #[error("transaction {0} not found")]
    UnknownTransaction(TxId),
    #[error("transaction {tx} belongs to company {owner}, not {caller}")]
    NotOwner {
        tx: TxId,
        owner: ParticipantId,
        caller: ParticipantId,
    },
    #[error("transaction {tx} is {actual}, expected {expected}")]
    InvalidState {
        tx: TxId,
        expected: TxState,
        actual: TxState,
    },
}

/// The token ledger refused or cannot cover the payment.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettlementError {
    #[error("allowance of {granted} does not cover payment of {needed}")]
    InsufficientAllowance { needed: Amount, granted: Amount },
    #[error("balance of {available} does not cover payment of {needed}")]
    InsufficientBalance { needed: Amount, available: Amount },
    #[error("token transfer for transaction {0} was refused")]
    TransferFailed(TxId),
}
