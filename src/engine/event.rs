//! Notifications emitted by successful calls.

use tracing::info;

use crate::Amount;
use crate::model::{ParticipantId, Price, TxId, Weight};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarketEvent {
    CompanyRegistered {
        company: ParticipantId,
        name: String,
        min_weight: Weight,
        max_price: Price,
        active: bool,
    },
    CompanyEdited {
        company: ParticipantId,
        name: String,
        min_weight: Weight,
        max_price: Price,
        active: bool,
    },
    CompanyNameUpdated {
        company: ParticipantId,
        name: String,
    },
    CompanyMinWeightUpdated {
        company: ParticipantId,
        min_weight: Weight,
    },
    CompanyMaxPriceUpdated {
        company: ParticipantId,
        max_price: Price,
    },
    CompanyActiveUpdated {
        company: ParticipantId,
        active: bool,
    },
    PickerRegistered {
        picker: ParticipantId,
        name: String,
        email: String,
    },
    PickerEdited {
        picker: ParticipantId,
        name: String,
        email: String,
    },
    PickerNameUpdated {
        picker: ParticipantId,
        name: String,
    },
    PickerEmailUpdated {
        picker: ParticipantId,
        email: String,
    },
    PlasticDeposited {
        picker: ParticipantId,
        company: ParticipantId,
        weight: Weight,
    },
    PlasticValidated {
        company: ParticipantId,
        tx: TxId,
    },
    PickerPaid {
        payer: ParticipantId,
        payee: ParticipantId,
        amount: Amount,
    },
}

impl MarketEvent {
    pub fn name(&self) -> &'static str {
        match self {
            MarketEvent::CompanyRegistered { .. } => "company_registered",
            MarketEvent::CompanyEdited { .. } => "company_edited",
            MarketEvent::CompanyNameUpdated { .. } => "company_name_updated",
            MarketEvent::CompanyMinWeightUpdated { .. } => "company_min_weight_updated",
            MarketEvent::CompanyMaxPriceUpdated { .. } => "company_max_price_updated",
            MarketEvent::CompanyActiveUpdated { .. } => "company_active_updated",
            MarketEvent::PickerRegistered { .. } => "picker_registered",
            MarketEvent::PickerEdited { .. } => "picker_edited",
            MarketEvent::PickerNameUpdated { .. } => "picker_name_updated",
            MarketEvent::PickerEmailUpdated { .. } => "picker_email_updated",
            MarketEvent::PlasticDeposited { .. } => "plastic_deposited",
            MarketEvent::PlasticValidated { .. } => "plastic_validated",
            MarketEvent::PickerPaid { .. } => "picker_paid",
        }
    }

    /// Mirror the event into the tracing output.
    pub(crate) fn trace(&self) {
        match self {
            MarketEvent::PlasticDeposited {
                picker,
                company,
                weight,
            } => info!(picker, company, weight, "{}", self.name()),
            MarketEvent::PlasticValidated { company, tx } => {
                info!(company, tx, "{}", self.name())
            }
            MarketEvent::PickerPaid {
                payer,
                payee,
                amount,
            } => info!(payer, payee, amount = %amount, "{}", self.name()),
            other => info!(event = ?other, "{}", other.name()),
        }
    }
}
