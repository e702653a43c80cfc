use super::types::ValidatorRecord;

/// Share of total voting power, in percent, that may opt out.
pub const SOFT_OPT_OUT_PERCENT: u128 = 5;

/// Flag the trailing low-power validators whose combined voting power stays
/// within `SOFT_OPT_OUT_PERCENT` of the total.
///
/// `validators` must be sorted by voting power, highest first. Marking stops
/// at the first validator that would push the running sum over the threshold;
/// it and everything above it are left unflagged.
pub fn apply_soft_opt_out(validators: &mut [ValidatorRecord]) {
    let total: u128 = validators.iter().map(|v| v.voting_power as u128).sum();

    let mut cumulative: u128 = 0;
    for validator in validators.iter_mut().rev() {
        cumulative += validator.voting_power as u128;
        if cumulative * 100 > total * SOFT_OPT_OUT_PERCENT {
            break;
        }
        validator.soft_opt_out = true;
    }
}
