//! Pure eligibility decisions for member and salary-cycle bumps.
//!
//! No I/O happens here: callers resolve ranks and demotion periods first
//! and pass plain values in. Members are judged independently of each
//! other, so result ordering is up to the caller.

use crate::types::{CyclePeriods, CycleStatus, MemberRecord};

/// Decide whether a member is due for a bump
///
/// Active members are never due, regardless of elapsed time. A rank with no
/// configured demotion period is conservatively skipped. Otherwise the
/// member is due once strictly more than `demotion_period` blocks have
/// elapsed since its last proof; at exactly the period boundary it is not.
pub fn is_member_due(
    member: &MemberRecord,
    demotion_period: Option<u64>,
    current_block: u64,
) -> bool {
    if member.is_active {
        return false;
    }
    let Some(period) = demotion_period else {
        return false;
    };
    // A proof newer than the current block reads as no elapsed time rather
    // than underflowing.
    match current_block.checked_sub(member.last_proof_block) {
        Some(elapsed) => period > 0 && elapsed > period,
        None => false,
    }
}

/// Decide whether the salary cycle must be advanced
///
/// Due once the registration and payout sub-periods have both fully elapsed
/// since the cycle started; at exactly the boundary block it is not.
pub fn is_cycle_due(status: &CycleStatus, periods: &CyclePeriods, current_block: u64) -> bool {
    let cycle_end = status
        .cycle_start
        .saturating_add(periods.registration_period)
        .saturating_add(periods.payout_period);
    cycle_end < current_block
}
