//! Shared test harness.

use async_trait::async_trait;
use mg_runtime::{MemoryFieldService, MemoryGuardConfig, MemorySecurityService, SubsystemContainer};
use shared_crypto::LocalIdentity;
use shared_types::{
    Fingerprint, InMemoryStore, ManualClock, SecurityError, TrustAssessment, TrustDecision,
    TrustEvaluator, DAY_MS,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Start of simulated time.
pub const T0: u64 = 100 * DAY_MS;

pub struct Harness {
    pub identity: Arc<LocalIdentity>,
    pub store: Arc<InMemoryStore>,
    pub clock: Arc<ManualClock>,
    pub security: Arc<MemorySecurityService>,
    pub fields: MemoryFieldService,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(MemoryGuardConfig::default(), None)
    }

    pub fn with(config: MemoryGuardConfig, trust: Option<Arc<dyn TrustEvaluator>>) -> Self {
        Self::with_identity(Arc::new(LocalIdentity::generate()), config, trust)
    }

    pub fn with_identity(
        identity: Arc<LocalIdentity>,
        config: MemoryGuardConfig,
        trust: Option<Arc<dyn TrustEvaluator>>,
    ) -> Self {
        Self::assemble(
            identity,
            Arc::new(InMemoryStore::new()),
            Arc::new(ManualClock::new(T0)),
            config,
            trust,
        )
    }

    /// A fresh process over the same identity, store and clock.
    pub fn with_store(other: &Harness) -> Self {
        Self::assemble(
            other.identity.clone(),
            other.store.clone(),
            other.clock.clone(),
            MemoryGuardConfig::default(),
            None,
        )
    }

    fn assemble(
        identity: Arc<LocalIdentity>,
        store: Arc<InMemoryStore>,
        clock: Arc<ManualClock>,
        config: MemoryGuardConfig,
        trust: Option<Arc<dyn TrustEvaluator>>,
    ) -> Self {
        let container = SubsystemContainer::new(
            config,
            identity.clone(),
            store.clone(),
            clock.clone(),
            trust,
        );
        let security = Arc::new(MemorySecurityService::new(Arc::new(container)));
        Self {
            identity,
            store,
            clock,
            fields: MemoryFieldService::new(security.clone()),
            security,
        }
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

pub fn caller() -> TrustAssessment {
    TrustAssessment::new(Fingerprint::new("caller"), 0.75)
}

/// Evaluator that records how often it was consulted.
pub struct CountingEvaluator {
    calls: AtomicUsize,
    decision: TrustDecision,
}

impl CountingEvaluator {
    pub fn new(decision: TrustDecision) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            decision,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TrustEvaluator for CountingEvaluator {
    async fn check_capability(
        &self,
        _capability: &str,
        _trust: &TrustAssessment,
    ) -> Result<TrustDecision, SecurityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.decision.clone())
    }
}
