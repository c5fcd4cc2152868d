//! Mutable marketplace state and the undo journal that makes settlement atomic.

use std::collections::HashMap;

use super::error::StateError;
use super::event::MarketEvent;
use super::registry::Registry;
use crate::model::{Company, ParticipantId, Picker, Transaction, TxId, TxState, Weight};

/// Everything a call can mutate.
///
/// Reads go straight to the fields. Writes to existing records go through
/// [`MarketState::company_mut`], [`MarketState::picker_mut`] and
/// [`MarketState::transition`] so that an open journal can undo them.
#[derive(Debug, Default)]
pub struct MarketState {
    pub registry: Registry,
    pub transactions: TransactionLog,
    pub events: Vec<MarketEvent>,
    journal: Option<Journal>,
}

impl MarketState {
    /// Record an event. While a journal is open the tracing mirror waits for
    /// [`MarketState::commit`].
    pub fn emit(&mut self, event: MarketEvent) {
        if self.journal.is_none() {
            event.trace();
        }
        self.events.push(event);
    }

    pub fn company_mut(&mut self, id: ParticipantId) -> Option<&mut Company> {
        let company = self.registry.company_mut(id)?;
        if let Some(journal) = &mut self.journal {
            journal
                .companies
                .entry(id)
                .or_insert_with(|| company.clone());
        }
        Some(company)
    }

    pub fn picker_mut(&mut self, id: ParticipantId) -> Option<&mut Picker> {
        let picker = self.registry.picker_mut(id)?;
        if let Some(journal) = &mut self.journal {
            journal
                .pickers
                .entry(id)
                .or_insert_with(|| PickerSnapshot::of(picker));
        }
        Some(picker)
    }

    pub fn transition(
        &mut self,
        id: TxId,
        from: TxState,
        to: TxState,
    ) -> Result<&Transaction, StateError> {
        if let Some(journal) = &mut self.journal {
            if let Some(record) = self.transactions.get(id) {
                journal.tx_states.entry(id).or_insert(record.state);
            }
        }
        self.transactions.transition(id, from, to)
    }

    /// Start recording undo information. Only one journal is open at a time.
    pub fn begin(&mut self) {
        debug_assert!(self.journal.is_none(), "journal already open");
        self.journal = Some(Journal {
            events: self.events.len(),
            transactions: self.transactions.len(),
            companies_len: self.registry.company_count(),
            pickers_len: self.registry.picker_count(),
            ..Journal::default()
        });
    }

    /// Keep every change since [`MarketState::begin`] and publish its events.
    pub fn commit(&mut self) {
        let Some(journal) = self.journal.take() else {
            return;
        };
        for event in self.events.get(journal.events..).unwrap_or_default() {
            event.trace();
        }
    }

    /// Undo every change since [`MarketState::begin`].
    pub fn rollback(&mut self) {
        let Some(journal) = self.journal.take() else {
            return;
        };

        for (id, company) in journal.companies {
            if let Some(current) = self.registry.company_mut(id) {
                *current = company;
            }
        }
        for (id, snapshot) in journal.pickers {
            if let Some(current) = self.registry.picker_mut(id) {
                snapshot.restore(current);
            }
        }
        self.registry.truncate_companies(journal.companies_len);
        self.registry.truncate_pickers(journal.pickers_len);

        self.transactions.truncate(journal.transactions);
        for (id, state) in journal.tx_states {
            if let Some(record) = self.transactions.get_mut(id) {
                record.state = state;
            }
        }
        self.events.truncate(journal.events);
    }
}

/// Lengths of the append-only collections plus the first-seen value of every
/// record modified in place.
#[derive(Debug, Default)]
struct Journal {
    events: usize,
    transactions: usize,
    companies_len: usize,
    pickers_len: usize,
    companies: HashMap<ParticipantId, Company>,
    pickers: HashMap<ParticipantId, PickerSnapshot>,
    tx_states: HashMap<TxId, TxState>,
}

/// A picker's fields, with the transaction list kept as a length since it
/// only grows.
#[derive(Debug)]
struct PickerSnapshot {
    name: String,
    email: String,
    deposited_weight: Weight,
    transactions: usize,
}

impl PickerSnapshot {
    fn of(picker: &Picker) -> Self {
        Self {
            name: picker.name.clone(),
            email: picker.email.clone(),
            deposited_weight: picker.deposited_weight,
            transactions: picker.transactions.len(),
        }
    }

    fn restore(self, picker: &mut Picker) {
        picker.name = self.name;
        picker.email = self.email;
        picker.deposited_weight = self.deposited_weight;
        picker.transactions.truncate(self.transactions);
    }
}

/// Append-only transaction arena. A transaction's id is its index.
#[derive(Debug, Default)]
pub struct TransactionLog {
    records: Vec<Transaction>,
}

impl TransactionLog {
    /// Id the next appended transaction will receive.
    pub fn next_id(&self) -> TxId {
        self.records.len() as TxId
    }

    pub fn append(&mut self, tx: Transaction) -> TxId {
        debug_assert_eq!(tx.id, self.next_id());
        let id = tx.id;
        self.records.push(tx);
        id
    }

    pub fn get(&self, id: TxId) -> Option<&Transaction> {
        usize::try_from(id).ok().and_then(|idx| self.records.get(idx))
    }

    pub fn get_mut(&mut self, id: TxId) -> Option<&mut Transaction> {
        usize::try_from(id)
            .ok()
            .and_then(|idx| self.records.get_mut(idx))
    }

    /// Move a transaction from `from` to `to`, failing if it is in any other state.
    pub fn transition(
        &mut self,
        id: TxId,
        from: TxState,
        to: TxState,
    ) -> Result<&Transaction, StateError> {
        let record = self.get_mut(id).ok_or(StateError::UnknownTransaction(id))?;
        if record.state != from {
            return Err(StateError::InvalidState {
                tx: id,
                expected: from,
                actual: record.state,
            });
        }
        record.state = to;
        Ok(record)
    }

    /// Drop every transaction from index `len` on.
    fn truncate(&mut self, len: usize) {
        self.records.truncate(len);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transaction> + '_ {
        self.records.iter()
    }
}
