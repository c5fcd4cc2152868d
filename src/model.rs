//! Core domain types for the plastic marketplace.

/// Identity of a participant (company, picker, owner or the engine itself).
pub type ParticipantId = u64;

/// Transaction identifier, allocated sequentially from zero.
pub type TxId = u64;

/// Weight of deposited material, in whole units.
pub type Weight = u64;

/// Token units paid per unit of weight.
pub type Price = u64;

/// A buyer of collected plastic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Company {
    pub id: ParticipantId,
    pub name: String,
    /// Smallest weight accepted in a single deposit.
    pub min_weight: Weight,
    /// Price per unit of weight, frozen into each deposit.
    pub max_price: Price,
    pub active: bool,
}

/// A supplier of collected plastic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Picker {
    pub id: ParticipantId,
    pub name: String,
    pub email: String,
    /// Sum of the weights of every deposit this picker has made.
    pub deposited_weight: Weight,
    /// Owned transaction ids, in deposit order.
    pub transactions: Vec<TxId>,
}

impl Picker {
    pub fn new(id: ParticipantId, name: String, email: String) -> Self {
        Self {
            id,
            name,
            email,
            deposited_weight: 0,
            transactions: Vec::new(),
        }
    }
}

/// Lifecycle of a deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TxState {
    /// Deposited, awaiting the company's validation.
    #[default]
    Pending,
    /// Validated by the company, awaiting payment.
    Approved,
    /// Paid out. Terminal.
    Settled,
}

impl TxState {
    pub fn as_str(self) -> &'static str {
        match self {
            TxState::Pending => "pending",
            TxState::Approved => "approved",
            TxState::Settled => "settled",
        }
    }
}

impl std::fmt::Display for TxState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record of a deposit of material by a picker against a company.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub id: TxId,
    pub company: ParticipantId,
    pub picker: ParticipantId,
    pub weight: Weight,
    /// Company price at deposit time; never updated afterwards.
    pub price: Price,
    pub state: TxState,
}

impl Transaction {
    /// Create a new transaction in the `Pending` state.
    pub fn new(
        id: TxId,
        company: ParticipantId,
        picker: ParticipantId,
        weight: Weight,
        price: Price,
    ) -> Self {
        Self {
            id,
            company,
            picker,
            weight,
            price,
            state: TxState::Pending,
        }
    }
}

/// A mutating call into the marketplace, as issued by some caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    RegisterCompany {
        name: String,
        min_weight: Weight,
        max_price: Price,
        active: bool,
    },
    EditCompany {
        name: String,
        min_weight: Weight,
        max_price: Price,
        active: bool,
    },
    SetCompanyName { name: String },
    SetCompanyMinWeight { min_weight: Weight },
    SetCompanyMaxPrice { max_price: Price },
    SetCompanyActive { active: bool },
    RegisterPicker { name: String, email: String },
    EditPicker { name: String, email: String },
    SetPickerName { name: String },
    SetPickerEmail { email: String },
    /// Deliver `weight` units of material to `company`.
    Deposit {
        company: ParticipantId,
        weight: Weight,
    },
    /// Approve a pending deposit.
    Validate { tx: TxId },
    /// Pay out an approved deposit.
    Settle { tx: TxId },
}

impl Call {
    /// Short name used in logs.
    pub fn op(&self) -> &'static str {
        match self {
            Call::RegisterCompany { .. } => "register_company",
            Call::EditCompany { .. } => "edit_company",
            Call::SetCompanyName { .. } => "set_company_name",
            Call::SetCompanyMinWeight { .. } => "set_company_min_weight",
            Call::SetCompanyMaxPrice { .. } => "set_company_max_price",
            Call::SetCompanyActive { .. } => "set_company_active",
            Call::RegisterPicker { .. } => "register_picker",
            Call::EditPicker { .. } => "edit_picker",
            Call::SetPickerName { .. } => "set_picker_name",
            Call::SetPickerEmail { .. } => "set_picker_email",
            Call::Deposit { .. } => "deposit",
            Call::Validate { .. } => "validate",
            Call::Settle { .. } => "settle",
        }
    }

    /// Transaction the call targets, if it names one.
    pub fn tx(&self) -> Option<TxId> {
        match self {
            Call::Validate { tx } | Call::Settle { tx } => Some(*tx),
            _ => None,
        }
    }
}
