//! Validator identities across the provider and consumer chains.
//!
//! `reconcile` merges the two rosters into `ValidatorRecord`s and
//! `apply_soft_opt_out` flags the low-power tail exempt from strict
//! participation requirements.

pub mod cutoff;
pub mod reconcile;
pub mod types;

pub use cutoff::{apply_soft_opt_out, SOFT_OPT_OUT_PERCENT};
pub use reconcile::{reconcile, sort_by_power, TOKENS_PER_POWER_UNIT};
pub use types::{IdentityConfidence, ValidatorRecord};
