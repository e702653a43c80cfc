use tracing::info;

use crate::client::ChainSource;
use crate::error::Result;
use crate::validator::{apply_soft_opt_out, reconcile, sort_by_power, IdentityConfidence, ValidatorRecord};

/// Chain id and the reconciled validator set, fetched once before the
/// dashboard opens.
#[derive(Debug, Clone)]
pub struct InitialState {
    pub chain_id: String,
    pub validators: Vec<ValidatorRecord>,
}

fn progress(message: &str) {
    println!("{}", message);
    info!("{}", message);
}

/// Fetch both rosters and build the validator set. Any failure here is fatal.
pub async fn load_initial_state<S: ChainSource + ?Sized>(
    source: &S,
    reconcile_identities: bool,
) -> Result<InitialState> {
    progress("fetching chain id...");
    let chain_id = source.chain_id().await?;

    let provider = if reconcile_identities {
        progress("fetching provider validator info...");
        source.provider_validators().await?
    } else {
        Vec::new()
    };

    progress("fetching consumer validator info...");
    let mut consumer = source.consumer_validators().await?;
    sort_by_power(&mut consumer);

    let mut validators = reconcile(&provider, &consumer)?;
    apply_soft_opt_out(&mut validators);

    let count = |confidence: IdentityConfidence| {
        validators
            .iter()
            .filter(|v| v.identity_confidence == confidence)
            .count()
    };
    info!(
        "Chain {}: {} validators ({} by key, {} by voting power, {} unresolved, {} soft opt-out)",
        chain_id,
        validators.len(),
        count(IdentityConfidence::ExactKeyMatch),
        count(IdentityConfidence::PowerHeuristicMatch),
        count(IdentityConfidence::Unresolved),
        validators.iter().filter(|v| v.soft_opt_out).count()
    );

    Ok(InitialState { chain_id, validators })
}
