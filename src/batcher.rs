//! Minimal transaction construction for a due-set of accounts.

use crate::types::{AccountId, BumpCall, TransactionRequest};

/// Map a non-empty due-set to the minimal transaction request
///
/// A single account gets a plain bump call; more than one get exactly one
/// atomic all-or-nothing batch, preserving the due-set's order. Callers
/// guard against an empty due-set.
pub fn member_bumps(due: &[AccountId]) -> TransactionRequest {
    debug_assert!(!due.is_empty(), "due-set must be non-empty");
    if due.len() == 1 {
        TransactionRequest::Single(BumpCall::Member(due[0].clone()))
    } else {
        TransactionRequest::BatchAll(due.iter().cloned().map(BumpCall::Member).collect())
    }
}

/// The salary-cycle bump is always a single call
pub fn salary_cycle_bump() -> TransactionRequest {
    TransactionRequest::Single(BumpCall::SalaryCycle)
}
