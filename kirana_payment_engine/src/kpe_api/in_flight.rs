use std::{
    collections::HashSet,
    sync::{Arc, Mutex, PoisonError},
};

/// The set of gateway references currently being verified by this process.
///
/// Claiming a reference collapses duplicate concurrent verification requests (redirect retries, double clicks,
/// polling) into a single in-flight attempt; the duplicates are answered with "verification in progress" without
/// touching the store or the gateway.
///
/// This registry is a duplicate-work optimization, not a correctness mechanism: it is process-local, is not shared
/// between server instances and does not survive a restart. Correctness under races — including cross-instance ones —
/// rests on the store transaction and the one-order-per-cart uniqueness constraint.
///
/// The registry is injected into the coordinator rather than kept as a module-level singleton, so tests can run
/// independent coordinators side by side.
#[derive(Clone, Debug, Default)]
pub struct InFlightVerifications {
    refs: Arc<Mutex<HashSet<String>>>,
}

impl InFlightVerifications {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `pidx` for this verification attempt. Returns `None` when another task already holds the claim.
    ///
    /// The claim is released when the returned guard is dropped, so every exit path — success, error, panic —
    /// deregisters the reference.
    pub fn try_claim(&self, pidx: &str) -> Option<VerificationClaim> {
        let mut refs = self.refs.lock().unwrap_or_else(PoisonError::into_inner);
        refs.insert(pidx.to_string())
            .then(|| VerificationClaim { pidx: pidx.to_string(), refs: Arc::clone(&self.refs) })
    }

    pub fn contains(&self, pidx: &str) -> bool {
        self.refs.lock().unwrap_or_else(PoisonError::into_inner).contains(pidx)
    }

    pub fn len(&self) -> usize {
        self.refs.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// RAII claim on a gateway reference. Dropping it releases the claim.
#[derive(Debug)]
pub struct VerificationClaim {
    pidx: String,
    refs: Arc<Mutex<HashSet<String>>>,
}

impl Drop for VerificationClaim {
    fn drop(&mut self) {
        let mut refs = self.refs.lock().unwrap_or_else(PoisonError::into_inner);
        refs.remove(&self.pidx);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn duplicate_claims_are_rejected() {
        let registry = InFlightVerifications::new();
        let claim = registry.try_claim("pidx-1");
        assert!(claim.is_some());
        assert!(registry.try_claim("pidx-1").is_none());
        assert!(registry.try_claim("pidx-2").is_some());
    }

    #[test]
    fn dropping_the_claim_releases_the_reference() {
        let registry = InFlightVerifications::new();
        {
            let _claim = registry.try_claim("pidx-1").unwrap();
            assert!(registry.contains("pidx-1"));
        }
        assert!(!registry.contains("pidx-1"));
        assert!(registry.try_claim("pidx-1").is_some());
    }

    #[test]
    fn claims_are_independent_per_registry() {
        let a = InFlightVerifications::new();
        let b = InFlightVerifications::new();
        let _claim = a.try_claim("pidx-1").unwrap();
        assert!(b.try_claim("pidx-1").is_some());
    }
}
