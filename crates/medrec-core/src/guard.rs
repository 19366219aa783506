//! Duplicate-submission latch.
//!
//! A per-desk latch that rejects a second mutating operation while one
//! is already running, the same mitigation a UI gets by disabling the
//! submit control. It is a UX guard, not a mutex: two processes can
//! still race, which is an accepted weakness of the design.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::CoreError;

#[derive(Debug, Default)]
pub struct InFlightGuard {
    busy: AtomicBool,
}

/// Held for the duration of one operation; releases the latch on drop,
/// including on early `?` returns.
#[derive(Debug)]
pub struct InFlightToken<'a> {
    guard: &'a InFlightGuard,
}

impl InFlightGuard {
    pub const fn new() -> Self {
        InFlightGuard {
            busy: AtomicBool::new(false),
        }
    }

    pub fn begin(&self) -> Result<InFlightToken<'_>, CoreError> {
        if self.busy.swap(true, Ordering::AcqRel) {
            return Err(CoreError::OperationInFlight);
        }
        Ok(InFlightToken { guard: self })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Drop for InFlightToken<'_> {
    fn drop(&mut self) {
        self.guard.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_begin_is_rejected_while_held() {
        let guard = InFlightGuard::new();
        let token = guard.begin().unwrap();
        assert_eq!(guard.begin().unwrap_err(), CoreError::OperationInFlight);
        drop(token);
        assert!(guard.begin().is_ok());
    }

    #[test]
    fn early_return_releases_the_latch() {
        let guard = InFlightGuard::new();
        fn failing(guard: &InFlightGuard) -> Result<(), CoreError> {
            let _token = guard.begin()?;
            Err(CoreError::EmptyUpdate)
        }
        assert!(failing(&guard).is_err());
        assert!(!guard.is_busy());
    }
}
