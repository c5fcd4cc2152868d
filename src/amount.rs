use std::fmt;

use crate::model::{Price, Weight};

/// Quantity of ledger tokens, stored as an unsigned integer of base units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct Amount(u128);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub fn new(units: u128) -> Self {
        Amount(units)
    }

    /// Payment owed for `weight` units of material at `price` per unit.
    ///
    /// Both factors are 64-bit, so the product always fits.
    pub fn for_delivery(weight: Weight, price: Price) -> Self {
        Amount(u128::from(weight) * u128::from(price))
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Amount)
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Amount)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}
