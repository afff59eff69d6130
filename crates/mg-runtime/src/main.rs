//! # Memory Guard
//!
//! Demonstration binary: builds the security stack over an in-memory store,
//! writes into a private and a shared field, folds one into the other, and
//! prints the resulting metrics.
//!
//! ```text
//! memory-guard [config.toml]
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use mg_05_fold_redaction::PrivacyPolicy;
use mg_runtime::{
    FoldOptions, FragmentDraft, MemoryFieldService, MemoryGuardConfig, MemorySecurityService,
    SubsystemContainer,
};
use shared_crypto::LocalIdentity;
use shared_types::{InMemoryStore, Scope, SystemTimeSource, TrustAssessment};

fn load_config() -> Result<MemoryGuardConfig> {
    let mut config = match std::env::args().nth(1) {
        Some(path) => MemoryGuardConfig::load(&path)
            .with_context(|| format!("failed to load configuration from {path}"))?,
        None => MemoryGuardConfig::default(),
    };
    config.apply_env();
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config()?;
    mg_telemetry::init_telemetry(&config.telemetry)?;

    let identity = Arc::new(LocalIdentity::generate());
    let container = SubsystemContainer::new(
        config,
        identity.clone(),
        Arc::new(InMemoryStore::new()),
        Arc::new(SystemTimeSource),
        None,
    );
    let security = Arc::new(MemorySecurityService::new(Arc::new(container)));
    let fields = MemoryFieldService::new(security.clone());
    let trust = TrustAssessment::new(identity.fingerprint().clone(), 1.0);

    let journal = fields
        .create_field("journal", Scope::User, vec![0.6, 0.8])
        .await?;
    let commons = fields
        .create_field("commons", Scope::Organization, vec![0.6, 0.8])
        .await?;

    for (content, significance) in [
        ("Rust ownership makes aliasing explicit.", 0.8),
        ("Lunch was late today.", 0.1),
    ] {
        let draft = FragmentDraft::new(content, significance)
            .with_prime_factors(vec![0.5, 0.9])
            .with_metadata("conversation_id", serde_json::json!("conv-7"))
            .with_metadata("ip_address", serde_json::json!("192.0.2.1"));
        fields.store_fragment(&journal.id, draft, &trust).await?;
    }

    let options = FoldOptions {
        verified_only: true,
        privacy: PrivacyPolicy::default(),
    };
    let fold = fields
        .fold_fields(&journal.id, &commons.id, options, &trust)
        .await?;
    info!(
        synced = fold.synced_count,
        duplicates = fold.skipped_duplicates,
        entropy_delta = fold.entropy_delta,
        operation_hash = %fold.operation.content_hash,
        "Journal folded into commons"
    );

    let query = fields.query_field(&commons.id, &trust).await?;
    for fragment in &query.fragments {
        info!(
            fragment_id = %fragment.id,
            metadata = ?fragment.metadata.keys().collect::<Vec<_>>(),
            "{}",
            fragment.content
        );
    }

    println!("{}", mg_telemetry::gather_metrics()?);
    Ok(())
}
