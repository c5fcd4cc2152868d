//! Marketplace engine.
//!
//! Holds the identity registry and the transaction log, and drives the
//! deposit → validate → settle lifecycle. Every call either applies all of
//! its changes or none of them: checks run before any mutation, and
//! settlement undoes its journal if the token transfer is refused.

use tracing::{info, warn};

use crate::Amount;
use crate::ledger::TokenLedger;
use crate::model::{
    Call, Company, ParticipantId, Picker, Price, Transaction, TxId, TxState, Weight,
};

mod auth;
pub use auth::Role;
use auth::Authorizer;

mod error;
pub use error::{AuthError, MarketError, SettlementError, Side, StateError, ValidationError};

mod event;
pub use event::MarketEvent;

mod lock;
use lock::SettlementLock;

mod registry;
use registry::{
    validate_company, validate_email, validate_max_price, validate_min_weight, validate_name,
    validate_picker,
};

mod settlement;

mod state;
use state::MarketState;

/// The marketplace between companies and pickers.
#[derive(Debug)]
pub struct Marketplace {
    owner: ParticipantId,
    /// Identity of the marketplace on the token ledger.
    address: ParticipantId,
    state: MarketState,
    lock: SettlementLock,
}

/// Public API: queries
impl Marketplace {
    /// Deploy a marketplace. The deploying identity becomes the owner.
    pub fn new(deployer: ParticipantId, address: ParticipantId) -> Self {
        Self {
            owner: deployer,
            address,
            state: MarketState::default(),
            lock: SettlementLock::default(),
        }
    }

    pub fn owner(&self) -> ParticipantId {
        self.owner
    }

    /// Spender identity that companies must approve on the token ledger.
    pub fn address(&self) -> ParticipantId {
        self.address
    }

    /// Whether a settlement is currently in progress.
    pub fn is_settling(&self) -> bool {
        self.lock.is_entered()
    }

    pub fn has_role(&self, who: ParticipantId, role: Role) -> bool {
        self.authorizer().has_role(who, role)
    }

    pub fn company(&self, id: ParticipantId) -> Option<&Company> {
        self.state.registry.company(id)
    }

    /// Company identities in registration order.
    pub fn company_ids(&self) -> &[ParticipantId] {
        self.state.registry.company_ids()
    }

    pub fn companies(&self) -> impl Iterator<Item = &Company> + '_ {
        self.state.registry.companies()
    }

    pub fn company_count(&self) -> usize {
        self.state.registry.company_count()
    }

    pub fn picker(&self, id: ParticipantId) -> Option<&Picker> {
        self.state.registry.picker(id)
    }

    /// Picker identities in registration order.
    pub fn picker_ids(&self) -> &[ParticipantId] {
        self.state.registry.picker_ids()
    }

    pub fn pickers(&self) -> impl Iterator<Item = &Picker> + '_ {
        self.state.registry.pickers()
    }

    pub fn picker_count(&self) -> usize {
        self.state.registry.picker_count()
    }

    pub fn transaction(&self, id: TxId) -> Option<&Transaction> {
        self.state.transactions.get(id)
    }

    /// All transactions in id order.
    pub fn transactions(&self) -> impl Iterator<Item = &Transaction> + '_ {
        self.state.transactions.iter()
    }

    pub fn transaction_count(&self) -> usize {
        self.state.transactions.len()
    }

    /// Full records of a picker's transactions, in deposit order.
    /// Empty for an unknown picker.
    pub fn picker_transactions(
        &self,
        picker: ParticipantId,
    ) -> impl Iterator<Item = &Transaction> + '_ {
        self.state
            .registry
            .picker(picker)
            .into_iter()
            .flat_map(|p| p.transactions.iter())
            .filter_map(|id| self.state.transactions.get(*id))
    }

    /// Token balance of `who`, as reported by the ledger.
    pub fn balance<L: TokenLedger + ?Sized>(&self, who: ParticipantId, ledger: &L) -> Amount {
        ledger.balance_of(who)
    }

    /// Events emitted so far, oldest first.
    pub fn events(&self) -> &[MarketEvent] {
        &self.state.events
    }

    /// Remove and return the emitted events.
    pub fn take_events(&mut self) -> Vec<MarketEvent> {
        std::mem::take(&mut self.state.events)
    }
}

/// Public API: calls
impl Marketplace {
    /// Apply a single call on behalf of `caller`.
    pub fn apply<L: TokenLedger + ?Sized>(
        &mut self,
        caller: ParticipantId,
        call: Call,
        ledger: &mut L,
    ) -> Result<(), MarketError> {
        let op = call.op();
        let mut tx = call.tx();
        let result = match call {
            Call::RegisterCompany {
                name,
                min_weight,
                max_price,
                active,
            } => self.register_company(caller, name, min_weight, max_price, active),
            Call::EditCompany {
                name,
                min_weight,
                max_price,
                active,
            } => self.edit_company(caller, name, min_weight, max_price, active),
            Call::SetCompanyName { name } => self.set_company_name(caller, name),
            Call::SetCompanyMinWeight { min_weight } => {
                self.set_company_min_weight(caller, min_weight)
            }
            Call::SetCompanyMaxPrice { max_price } => self.set_company_max_price(caller, max_price),
            Call::SetCompanyActive { active } => self.set_company_active(caller, active),
            Call::RegisterPicker { name, email } => self.register_picker(caller, name, email),
            Call::EditPicker { name, email } => self.edit_picker(caller, name, email),
            Call::SetPickerName { name } => self.set_picker_name(caller, name),
            Call::SetPickerEmail { email } => self.set_picker_email(caller, email),
            Call::Deposit { company, weight } => self
                .deposit(caller, company, weight)
                .map(|id| tx = Some(id)),
            Call::Validate { tx } => self.validate(caller, tx),
            Call::Settle { tx } => self.settle(caller, tx, ledger).map(|_| ()),
        };
        Self::log_result(op, caller, tx, &result);
        result
    }

    pub fn register_company(
        &mut self,
        caller: ParticipantId,
        name: String,
        min_weight: Weight,
        max_price: Price,
        active: bool,
    ) -> Result<(), MarketError> {
        if self.has_role(caller, Role::Company) {
            return Err(StateError::AlreadyRegistered(Side::Company, caller).into());
        }
        validate_company(&name, min_weight, max_price)?;

        let company = self.state.registry.insert_company(Company {
            id: caller,
            name,
            min_weight,
            max_price,
            active,
        })?;
        let event = MarketEvent::CompanyRegistered {
            company: caller,
            name: company.name.clone(),
            min_weight,
            max_price,
            active,
        };
        self.state.emit(event);
        Ok(())
    }

    /// Replace every field of the caller's company profile.
    pub fn edit_company(
        &mut self,
        caller: ParticipantId,
        name: String,
        min_weight: Weight,
        max_price: Price,
        active: bool,
    ) -> Result<(), MarketError> {
        self.authorizer().company(caller)?;
        validate_company(&name, min_weight, max_price)?;

        let company = self.company_mut(caller)?;
        company.name = name.clone();
        company.min_weight = min_weight;
        company.max_price = max_price;
        company.active = active;
        self.state.emit(MarketEvent::CompanyEdited {
            company: caller,
            name,
            min_weight,
            max_price,
            active,
        });
        Ok(())
    }

    pub fn set_company_name(
        &mut self,
        caller: ParticipantId,
        name: String,
    ) -> Result<(), MarketError> {
        self.authorizer().company(caller)?;
        validate_name(&name)?;

        self.company_mut(caller)?.name = name.clone();
        self.state.emit(MarketEvent::CompanyNameUpdated {
            company: caller,
            name,
        });
        Ok(())
    }

    /// Change the minimum deposit weight. Existing transactions are unaffected.
    pub fn set_company_min_weight(
        &mut self,
        caller: ParticipantId,
        min_weight: Weight,
    ) -> Result<(), MarketError> {
        self.authorizer().company(caller)?;
        validate_min_weight(min_weight)?;

        self.company_mut(caller)?.min_weight = min_weight;
        self.state.emit(MarketEvent::CompanyMinWeightUpdated {
            company: caller,
            min_weight,
        });
        Ok(())
    }

    /// Change the advertised price. Existing transactions keep their price.
    pub fn set_company_max_price(
        &mut self,
        caller: ParticipantId,
        max_price: Price,
    ) -> Result<(), MarketError> {
        self.authorizer().company(caller)?;
        validate_max_price(max_price)?;

        self.company_mut(caller)?.max_price = max_price;
        self.state.emit(MarketEvent::CompanyMaxPriceUpdated {
            company: caller,
            max_price,
        });
        Ok(())
    }

    pub fn set_company_active(
        &mut self,
        caller: ParticipantId,
        active: bool,
    ) -> Result<(), MarketError> {
        self.authorizer().company(caller)?;

        self.company_mut(caller)?.active = active;
        self.state.emit(MarketEvent::CompanyActiveUpdated {
            company: caller,
            active,
        });
        Ok(())
    }

    pub fn register_picker(
        &mut self,
        caller: ParticipantId,
        name: String,
        email: String,
    ) -> Result<(), MarketError> {
        if self.has_role(caller, Role::Picker) {
            return Err(StateError::AlreadyRegistered(Side::Picker, caller).into());
        }
        validate_picker(&name, &email)?;

        self.state
            .registry
            .insert_picker(Picker::new(caller, name.clone(), email.clone()))?;
        self.state.emit(MarketEvent::PickerRegistered {
            picker: caller,
            name,
            email,
        });
        Ok(())
    }

    /// Replace the caller's picker name and email. Deposit history is kept.
    pub fn edit_picker(
        &mut self,
        caller: ParticipantId,
        name: String,
        email: String,
    ) -> Result<(), MarketError> {
        self.authorizer().picker(caller)?;
        validate_picker(&name, &email)?;

        let picker = self.picker_mut(caller)?;
        picker.name = name.clone();
        picker.email = email.clone();
        self.state.emit(MarketEvent::PickerEdited {
            picker: caller,
            name,
            email,
        });
        Ok(())
    }

    pub fn set_picker_name(
        &mut self,
        caller: ParticipantId,
        name: String,
    ) -> Result<(), MarketError> {
        self.authorizer().picker(caller)?;
        validate_name(&name)?;

        self.picker_mut(caller)?.name = name.clone();
        self.state.emit(MarketEvent::PickerNameUpdated {
            picker: caller,
            name,
        });
        Ok(())
    }

    pub fn set_picker_email(
        &mut self,
        caller: ParticipantId,
        email: String,
    ) -> Result<(), MarketError> {
        self.authorizer().picker(caller)?;
        validate_email(&email)?;

        self.picker_mut(caller)?.email = email.clone();
        self.state.emit(MarketEvent::PickerEmailUpdated {
            picker: caller,
            email,
        });
        Ok(())
    }

    /// Record a delivery of `weight` units by the calling picker to `company`.
    ///
    /// The transaction is created `Pending` with the company's current price.
    /// Returns the new transaction id.
    pub fn deposit(
        &mut self,
        caller: ParticipantId,
        company: ParticipantId,
        weight: Weight,
    ) -> Result<TxId, MarketError> {
        let auth = self.authorizer();
        let picker = auth.picker(caller)?;

        if weight == 0 {
            return Err(ValidationError::ZeroWeight.into());
        }

        let target = self
            .state
            .registry
            .company(company)
            .ok_or(StateError::UnknownCompany(company))?;
        if !target.active {
            return Err(StateError::CompanyInactive(company).into());
        }
        if weight < target.min_weight {
            return Err(ValidationError::BelowMinimumWeight {
                weight,
                minimum: target.min_weight,
            }
            .into());
        }

        let deposited_weight = picker
            .deposited_weight
            .checked_add(weight)
            .ok_or(ValidationError::WeightOverflow(caller))?;
        let price = target.max_price;

        let id = self.state.transactions.next_id();
        let picker = self.picker_mut(caller)?;
        picker.deposited_weight = deposited_weight;
        picker.transactions.push(id);
        self.state
            .transactions
            .append(Transaction::new(id, company, caller, weight, price));

        self.state.emit(MarketEvent::PlasticDeposited {
            picker: caller,
            company,
            weight,
        });
        Ok(id)
    }

    /// Approve a pending transaction addressed to the calling company.
    pub fn validate(&mut self, caller: ParticipantId, tx: TxId) -> Result<(), MarketError> {
        self.authorizer().active_company(caller)?;

        let record = self
            .state
            .transactions
            .get(tx)
            .ok_or(StateError::UnknownTransaction(tx))?;
        if record.company != caller {
            return Err(StateError::NotOwner {
                tx,
                owner: record.company,
                caller,
            }
            .into());
        }

        self.state
            .transition(tx, TxState::Pending, TxState::Approved)?;
        self.state.emit(MarketEvent::PlasticValidated {
            company: caller,
            tx,
        });
        Ok(())
    }
}

/// Private API
impl Marketplace {
    fn authorizer(&self) -> Authorizer<'_> {
        Authorizer::new(self.owner, &self.state.registry)
    }

    fn company_mut(&mut self, id: ParticipantId) -> Result<&mut Company, AuthError> {
        self.state
            .company_mut(id)
            .ok_or(AuthError::NotCompany(id))
    }

    fn picker_mut(&mut self, id: ParticipantId) -> Result<&mut Picker, AuthError> {
        self.state
            .picker_mut(id)
            .ok_or(AuthError::NotPicker(id))
    }

    /// Small helper to log `apply` results
    fn log_result(
        op: &str,
        caller: ParticipantId,
        tx: Option<TxId>,
        result: &Result<(), MarketError>,
    ) {
        match (result, tx) {
            (Ok(()), Some(tx)) => info!(caller, tx, "{op} applied"),
            (Ok(()), None) => info!(caller, "{op} applied"),
            (Err(e), Some(tx)) => warn!(caller, tx, reason = %e, "{op} skipped"),
            (Err(e), None) => warn!(caller, reason = %e, "{op} skipped"),
        }
    }
}
