
/// How a validator's display name was resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdentityConfidence {
    /// Provider and consumer chain report the same consensus key.
    ExactKeyMatch,
    /// Matched on a voting power value held by exactly one consumer validator.
    PowerHeuristicMatch,
    /// No provider entry found; the display name is the raw consumer address.
    Unresolved,
}

/// One consumer chain validator, as shown on the dashboard.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidatorRecord {
    pub consensus_pubkey_b64: String,
    /// Uppercase hex consensus address, unique across the set.
    pub address_hex: String,
    pub voting_power: u64,
    /// Share of the total consumer voting power, 0.0 - 1.0
    pub voting_power_share: f64,
    pub display_name: String,
    pub identity_confidence: IdentityConfidence,
    pub soft_opt_out: bool,
}

impl ValidatorRecord {
    /// True when the name came from anything weaker than a key match.
    pub fn is_key_assigned(&self) -> bool {
        self.identity_confidence != IdentityConfidence::ExactKeyMatch
    }
}
