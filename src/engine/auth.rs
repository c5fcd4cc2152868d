//! Role checks consulted by mutating calls.

use super::error::AuthError;
use super::registry::Registry;
use crate::model::{Company, ParticipantId, Picker};

/// A role a caller may hold in the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The identity that deployed the marketplace.
    Owner,
    /// Any registered company, active or not.
    Company,
    /// A registered company currently accepting deposits.
    ActiveCompany,
    /// Any registered picker.
    Picker,
}

/// Role predicates over the registry.
pub struct Authorizer<'a> {
    owner: ParticipantId,
    registry: &'a Registry,
}

impl<'a> Authorizer<'a> {
    pub fn new(owner: ParticipantId, registry: &'a Registry) -> Self {
        Self { owner, registry }
    }

    pub fn has_role(&self, who: ParticipantId, role: Role) -> bool {
        match role {
            Role::Owner => who == self.owner,
            Role::Company => self.registry.company(who).is_some(),
            Role::ActiveCompany => self.registry.company(who).is_some_and(|c| c.active),
            Role::Picker => self.registry.picker(who).is_some(),
        }
    }

    pub fn company(&self, who: ParticipantId) -> Result<&'a Company, AuthError> {
        self.registry.company(who).ok_or(AuthError::NotCompany(who))
    }

    pub fn active_company(&self, who: ParticipantId) -> Result<&'a Company, AuthError> {
        let company = self.company(who)?;
        if !company.active {
            return Err(AuthError::InactiveCompany(who));
        }
        Ok(company)
    }

    pub fn picker(&self, who: ParticipantId) -> Result<&'a Picker, AuthError> {
        self.registry.picker(who).ok_or(AuthError::NotPicker(who))
    }
}
