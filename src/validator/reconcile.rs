use std::collections::HashMap;

use super::types::{IdentityConfidence, ValidatorRecord};
use crate::client::{ConsumerValidator, ProviderValidator};
use crate::crypto::address_from_pubkey;
use crate::error::Result;

/// Bonded provider tokens per unit of consumer voting power.
pub const TOKENS_PER_POWER_UNIT: u128 = 1_000_000;

/// Order a consumer roster by voting power, highest first. Equal powers keep
/// their roster order.
pub fn sort_by_power(validators: &mut [ConsumerValidator]) {
    validators.sort_by(|a, b| b.voting_power.cmp(&a.voting_power));
}

/// Merge the provider roster into the consumer roster.
///
/// Output order follows `consumer`. Each record's display name is resolved
/// by exact consensus key first, then by a voting power value that exactly
/// one consumer validator holds, and otherwise falls back to the raw
/// consumer address.
pub fn reconcile(
    provider: &[ProviderValidator],
    consumer: &[ConsumerValidator],
) -> Result<Vec<ValidatorRecord>> {
    let power_counts = power_frequencies(consumer);
    let total_power: u128 = consumer.iter().map(|v| v.voting_power as u128).sum();

    consumer
        .iter()
        .map(|entry| {
            let (display_name, identity_confidence) =
                resolve_identity(provider, entry, &power_counts);

            Ok(ValidatorRecord {
                consensus_pubkey_b64: entry.pubkey_b64.clone(),
                address_hex: address_from_pubkey(&entry.pubkey_b64)?,
                voting_power: entry.voting_power,
                voting_power_share: power_share(entry.voting_power, total_power),
                display_name,
                identity_confidence,
                soft_opt_out: false,
            })
        })
        .collect()
}

fn power_frequencies(consumer: &[ConsumerValidator]) -> HashMap<u64, usize> {
    let mut counts = HashMap::new();
    for validator in consumer {
        *counts.entry(validator.voting_power).or_insert(0) += 1;
    }
    counts
}

fn resolve_identity(
    provider: &[ProviderValidator],
    entry: &ConsumerValidator,
    power_counts: &HashMap<u64, usize>,
) -> (String, IdentityConfidence) {
    if let Some(found) = provider.iter().find(|p| p.pubkey_b64 == entry.pubkey_b64) {
        return (found.moniker.clone(), IdentityConfidence::ExactKeyMatch);
    }

    // Shared power values are ambiguous and never matched
    if power_counts.get(&entry.voting_power) == Some(&1) {
        let target = entry.voting_power as u128;
        if let Some(found) = provider
            .iter()
            .find(|p| p.bonded_tokens / TOKENS_PER_POWER_UNIT == target)
        {
            return (found.moniker.clone(), IdentityConfidence::PowerHeuristicMatch);
        }
    }

    (entry.address.clone(), IdentityConfidence::Unresolved)
}

fn power_share(voting_power: u64, total_power: u128) -> f64 {
    if total_power == 0 {
        return 0.0;
    }
    voting_power as f64 / total_power as f64
}
