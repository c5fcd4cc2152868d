//! Settlement lock rejecting reentrant calls.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::error::MarketError;

/// Flag shared by a marketplace and its outstanding [`SettlementGuard`].
#[derive(Debug, Default)]
pub struct SettlementLock {
    entered: Arc<AtomicBool>,
}

impl SettlementLock {
    /// Take the lock, or fail with [`MarketError::Reentrancy`] if a settlement
    /// is already in progress.
    ///
    /// The returned guard owns its handle to the flag, so the marketplace stays
    /// mutably borrowable (and re-enterable) while it is held.
    pub fn enter(&self) -> Result<SettlementGuard, MarketError> {
        self.entered
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .map_err(|_| MarketError::Reentrancy)?;
        Ok(SettlementGuard {
            entered: Arc::clone(&self.entered),
        })
    }

    pub fn is_entered(&self) -> bool {
        self.entered.load(Ordering::Acquire)
    }
}

/// Releases the lock when dropped, on success and error paths alike.
#[derive(Debug)]
pub struct SettlementGuard {
    entered: Arc<AtomicBool>,
}

impl Drop for SettlementGuard {
    fn drop(&mut self) {
        self.entered.store(false, Ordering::Release);
    }
}
