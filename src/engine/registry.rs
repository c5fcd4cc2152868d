//! Identity registry: company and picker profiles keyed by participant.
//!
//! Presence is explicit: an identity is registered iff its key is in the
//! map. Each side keeps a separate index recording registration order.

use std::collections::HashMap;

use super::error::{Side, StateError, ValidationError};
use crate::model::{Company, ParticipantId, Picker, Price, Weight};

#[derive(Debug, Clone, Default)]
pub struct Registry {
    companies: HashMap<ParticipantId, Company>,
    company_order: Vec<ParticipantId>,
    pickers: HashMap<ParticipantId, Picker>,
    picker_order: Vec<ParticipantId>,
}

impl Registry {
    pub fn company(&self, id: ParticipantId) -> Option<&Company> {
        self.companies.get(&id)
    }

    pub fn company_mut(&mut self, id: ParticipantId) -> Option<&mut Company> {
        self.companies.get_mut(&id)
    }

    pub fn picker(&self, id: ParticipantId) -> Option<&Picker> {
        self.pickers.get(&id)
    }

    pub fn picker_mut(&mut self, id: ParticipantId) -> Option<&mut Picker> {
        self.pickers.get_mut(&id)
    }

    pub fn company_ids(&self) -> &[ParticipantId] {
        &self.company_order
    }

    pub fn picker_ids(&self) -> &[ParticipantId] {
        &self.picker_order
    }

    /// Companies in registration order.
    pub fn companies(&self) -> impl Iterator<Item = &Company> + '_ {
        self.company_order
            .iter()
            .filter_map(|id| self.companies.get(id))
    }

    /// Pickers in registration order.
    pub fn pickers(&self) -> impl Iterator<Item = &Picker> + '_ {
        self.picker_order.iter().filter_map(|id| self.pickers.get(id))
    }

    pub fn company_count(&self) -> usize {
        self.company_order.len()
    }

    pub fn picker_count(&self) -> usize {
        self.picker_order.len()
    }

    /// Store a new company. The fields must already be validated.
    pub fn insert_company(&mut self, company: Company) -> Result<&Company, StateError> {
        if self.companies.contains_key(&company.id) {
            return Err(StateError::AlreadyRegistered(Side::Company, company.id));
        }
        let id = company.id;
        self.company_order.push(id);
        Ok(self.companies.entry(id).or_insert(company))
    }

    /// Store a new picker. The fields must already be validated.
    pub fn insert_picker(&mut self, picker: Picker) -> Result<&Picker, StateError> {
        if self.pickers.contains_key(&picker.id) {
            return Err(StateError::AlreadyRegistered(Side::Picker, picker.id));
        }
        let id = picker.id;
        self.picker_order.push(id);
        Ok(self.pickers.entry(id).or_insert(picker))
    }

    /// Forget companies registered after the first `len`.
    pub fn truncate_companies(&mut self, len: usize) {
        for id in self.company_order.drain(len.min(self.company_order.len())..) {
            self.companies.remove(&id);
        }
    }

    /// Forget pickers registered after the first `len`.
    pub fn truncate_pickers(&mut self, len: usize) {
        for id in self.picker_order.drain(len.min(self.picker_order.len())..) {
            self.pickers.remove(&id);
        }
    }
}

pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::EmptyEmail);
    }
    Ok(())
}

pub fn validate_min_weight(min_weight: Weight) -> Result<(), ValidationError> {
    if min_weight == 0 {
        return Err(ValidationError::ZeroMinWeight);
    }
    Ok(())
}

pub fn validate_max_price(max_price: Price) -> Result<(), ValidationError> {
    if max_price == 0 {
        return Err(ValidationError::ZeroMaxPrice);
    }
    Ok(())
}

/// Checks shared by company registration and full edits.
pub fn validate_company(
    name: &str,
    min_weight: Weight,
    max_price: Price,
) -> Result<(), ValidationError> {
    validate_name(name)?;
    validate_max_price(max_price)?;
    validate_min_weight(min_weight)
}

/// Checks shared by picker registration and full edits.
pub fn validate_picker(name: &str, email: &str) -> Result<(), ValidationError> {
    validate_name(name)?;
    validate_email(email)
}
