use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashSet;

pub const BOND_STATUS_BONDED: &str = "BOND_STATUS_BONDED";

/// Validator entry from the provider chain staking module.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderValidator {
    pub pubkey_b64: String,
    pub bonded_tokens: u128,
    pub moniker: String,
    pub bond_status: String,
}

impl ProviderValidator {
    pub fn is_bonded(&self) -> bool {
        self.bond_status == BOND_STATUS_BONDED
    }
}

/// Validator entry from the consumer chain `/validators` endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumerValidator {
    pub pubkey_b64: String,
    pub voting_power: u64,
    pub address: String,
}

/// A consumer chain block reduced to what the dashboard needs.
///
/// `commit_signers` are the validators that signed `commit_height`, which is
/// the block before `height`.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub height: u64,
    pub time: DateTime<Utc>,
    pub proposer_address: String,
    pub commit_height: u64,
    pub commit_signers: HashSet<String>,
}

// Wire shapes. Only the fields the monitor reads are declared.

/// Numbers that CometBFT and the Cosmos REST API encode as JSON strings.
mod string_number {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use std::fmt::Display;
    use std::str::FromStr;

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: FromStr,
        T::Err: Display,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(D::Error::custom)
    }
}

#[derive(Debug, Deserialize)]
pub struct RpcEnvelope<T> {
    pub result: T,
}

#[derive(Debug, Deserialize)]
pub struct StatusResult {
    pub node_info: NodeInfo,
}

#[derive(Debug, Deserialize)]
pub struct NodeInfo {
    pub network: String,
}

#[derive(Debug, Deserialize)]
pub struct ValidatorsResult {
    pub validators: Vec<ConsumerValidatorEntry>,
    #[serde(deserialize_with = "string_number::deserialize")]
    pub count: u64,
    #[serde(deserialize_with = "string_number::deserialize")]
    pub total: u64,
}

#[derive(Debug, Deserialize)]
pub struct ConsumerValidatorEntry {
    pub address: String,
    pub pub_key: TypedKey,
    #[serde(deserialize_with = "string_number::deserialize")]
    pub voting_power: u64,
}

#[derive(Debug, Deserialize)]
pub struct TypedKey {
    pub value: String,
}

impl From<ConsumerValidatorEntry> for ConsumerValidator {
    fn from(entry: ConsumerValidatorEntry) -> Self {
        Self {
            pubkey_b64: entry.pub_key.value,
            voting_power: entry.voting_power,
            address: entry.address,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StakingValidatorsPage {
    pub validators: Vec<StakingValidatorEntry>,
    pub pagination: Pagination,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    pub next_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StakingValidatorEntry {
    pub consensus_pubkey: ConsensusPubKey,
    #[serde(deserialize_with = "string_number::deserialize")]
    pub tokens: u128,
    pub description: Description,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct ConsensusPubKey {
    pub key: String,
}

#[derive(Debug, Deserialize)]
pub struct Description {
    #[serde(default)]
    pub moniker: String,
}

impl From<StakingValidatorEntry> for ProviderValidator {
    fn from(entry: StakingValidatorEntry) -> Self {
        Self {
            pubkey_b64: entry.consensus_pubkey.key,
            bonded_tokens: entry.tokens,
            moniker: entry.description.moniker,
            bond_status: entry.status,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BlockResult {
    pub block: BlockBody,
}

#[derive(Debug, Deserialize)]
pub struct BlockBody {
    pub header: Header,
    pub last_commit: Option<LastCommit>,
}

#[derive(Debug, Deserialize)]
pub struct Header {
    #[serde(deserialize_with = "string_number::deserialize")]
    pub height: u64,
    pub time: DateTime<Utc>,
    pub proposer_address: String,
}

#[derive(Debug, Deserialize)]
pub struct LastCommit {
    #[serde(deserialize_with = "string_number::deserialize")]
    pub height: u64,
    #[serde(default)]
    pub signatures: Vec<CommitSig>,
}

#[derive(Debug, Deserialize)]
pub struct CommitSig {
    #[serde(default)]
    pub validator_address: Option<String>,
}

impl From<BlockResult> for Block {
    fn from(result: BlockResult) -> Self {
        let header = result.block.header;
        let (commit_height, commit_signers) = match result.block.last_commit {
            Some(commit) => (
                commit.height,
                commit
                    .signatures
                    .into_iter()
                    .filter_map(|sig| sig.validator_address)
                    .filter(|address| !address.is_empty())
                    .map(|address| address.to_uppercase())
                    .collect(),
            ),
            None => (header.height.saturating_sub(1), HashSet::new()),
        };

        Self {
            height: header.height,
            time: header.time,
            proposer_address: header.proposer_address.to_uppercase(),
            commit_height,
            commit_signers,
        }
    }
}
