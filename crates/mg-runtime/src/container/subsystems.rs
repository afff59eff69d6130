//! # Subsystem Container
//!
//! Builds every subsystem over the three outbound collaborators (identity,
//! store, clock) plus the optional trust evaluator.
//!
//! ```text
//! Level 0: Replay Guard, Provenance Store   (store, clock, identity)
//! Level 1: Envelope Service                 (Level 0)
//! Level 2: Fold Service                     (Level 1)
//! Independent: Semantic Validator, Capability Gate, Encryption,
//!              Entropy Budget, GC Policy
//! ```

use crate::container::config::MemoryGuardConfig;
use mg_01_envelope::{EnvelopeService, ProvenanceStore, ReplayGuard};
use mg_02_semantic_validation::SemanticValidator;
use mg_03_capability_gate::CapabilityGate;
use mg_04_encryption::EncryptionService;
use mg_05_fold_redaction::FoldService;
use mg_06_entropy_budget::EntropyBudgetTracker;
use mg_07_gc_policy::GcService;
use shared_types::{IdentityProvider, PersistentStore, TimeSource, TrustEvaluator};
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub struct SubsystemContainer {
    // =========================================================================
    // OUTBOUND COLLABORATORS
    // =========================================================================
    pub identity: Arc<dyn IdentityProvider>,
    pub store: Arc<dyn PersistentStore>,
    pub clock: Arc<dyn TimeSource>,

    // =========================================================================
    // SUBSYSTEMS
    // =========================================================================
    pub replay: Arc<ReplayGuard>,
    pub provenance: Arc<ProvenanceStore>,
    pub envelopes: Arc<EnvelopeService>,
    pub validator: SemanticValidator,
    pub gate: CapabilityGate,
    pub encryption: EncryptionService,
    pub folds: FoldService,
    pub entropy: EntropyBudgetTracker,
    pub gc: GcService,

    pub config: MemoryGuardConfig,
}

impl SubsystemContainer {
    #[instrument(name = "subsystem_init", skip_all)]
    pub fn new(
        config: MemoryGuardConfig,
        identity: Arc<dyn IdentityProvider>,
        store: Arc<dyn PersistentStore>,
        clock: Arc<dyn TimeSource>,
        trust: Option<Arc<dyn TrustEvaluator>>,
    ) -> Self {
        match identity.public_identity() {
            Some(public) => info!(
                fingerprint = %public.fingerprint,
                exchange_key = public.exchange_key.is_some(),
                "Initializing memory guard subsystems"
            ),
            None => warn!("Initializing memory guard without an identity; signing will fail"),
        }
        if trust.is_none() {
            warn!("No trust evaluator configured; listed capabilities are allowed");
        }

        let replay = Arc::new(ReplayGuard::new(
            config.replay.clone(),
            store.clone(),
            clock.clone(),
        ));
        let provenance = Arc::new(ProvenanceStore::new(
            config.provenance.clone(),
            identity.clone(),
            clock.clone(),
        ));
        let envelopes = Arc::new(EnvelopeService::new(
            identity.clone(),
            clock.clone(),
            replay.clone(),
            provenance.clone(),
        ));
        let folds = FoldService::new(envelopes.clone(), clock.clone());
        let encryption = EncryptionService::new(identity.clone(), config.encryption.clone());
        let entropy = EntropyBudgetTracker::new(clock.clone());

        info!(
            nonce_ttl_ms = config.replay.nonce_ttl_ms,
            provenance_capacity = config.provenance.capacity,
            key_wrap_policy = ?config.encryption.key_wrap_policy,
            "All subsystems initialized"
        );

        Self {
            identity,
            store,
            clock,
            replay,
            provenance,
            envelopes,
            validator: SemanticValidator::new(),
            gate: CapabilityGate::new(trust),
            encryption,
            folds,
            entropy,
            gc: GcService::new(),
            config,
        }
    }
}
