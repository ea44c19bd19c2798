//! Typed records for the bump decision engine.
//!
//! Raw chain-query output is decoded into these types once, at the
//! `ChainStateReader` boundary; the eligibility logic never sees untyped
//! data.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque account identifier, as rendered by the chain (address text)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Create an account identifier from its textual form
    pub fn new(id: impl Into<String>) -> Self {
        AccountId(id.into())
    }

    /// The textual form of the identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        AccountId(id.to_string())
    }
}

impl From<String> for AccountId {
    fn from(id: String) -> Self {
        AccountId(id)
    }
}

/// Names the signing origin for submitted transactions
///
/// Key material and signing live in the `TransactionSubmitter`; the core
/// only passes this through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sender(String);

impl Sender {
    pub fn new(id: impl Into<String>) -> Self {
        Sender(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One tracked member's last-known liveness proof
///
/// Read fresh each pass, never mutated locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    /// Account the record belongs to
    pub account: AccountId,
    /// Whether the member is currently marked active
    pub is_active: bool,
    /// Block at which the member last proved activity
    pub last_proof_block: u64,
}

impl MemberRecord {
    pub fn new(account: impl Into<AccountId>, is_active: bool, last_proof_block: u64) -> Self {
        MemberRecord {
            account: account.into(),
            is_active,
            last_proof_block,
        }
    }
}

/// Maps an account to its current rank tier
///
/// An account with no rank record holds rank 0, the lowest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankRecord {
    pub account: AccountId,
    /// Positive rank tier; rank 0 never appears on chain
    pub rank: u16,
}

/// Per-rank demotion periods, in blocks, indexed by rank − 1
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankPeriodTable {
    demotion_periods: Vec<u64>,
}

impl RankPeriodTable {
    pub fn new(demotion_periods: Vec<u64>) -> Self {
        RankPeriodTable { demotion_periods }
    }

    /// The demotion period configured for a rank, if any
    ///
    /// Rank 0 and ranks beyond the table have no period; members holding
    /// them can never become due by the rank rule.
    pub fn demotion_period(&self, rank: u16) -> Option<u64> {
        if rank == 0 {
            return None;
        }
        self.demotion_periods.get(rank as usize - 1).copied()
    }
}

/// The current salary payout cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleStatus {
    pub cycle_index: u32,
    /// Block at which the cycle started
    pub cycle_start: u64,
}

/// Chain-wide cycle period constants, in blocks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CyclePeriods {
    pub registration_period: u64,
    pub payout_period: u64,
}

/// A single corrective call to include in a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BumpCall {
    /// Demote or refresh one stale member
    Member(AccountId),
    /// Advance the salary payout cycle
    SalaryCycle,
}

/// A constructed transaction request, ready for signing and submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionRequest {
    /// One call submitted on its own
    Single(BumpCall),
    /// Atomic all-or-nothing batch: every inner call applies, or none do
    ///
    /// The submitter must map this onto the chain's atomic batch primitive.
    BatchAll(Vec<BumpCall>),
}

impl TransactionRequest {
    /// Number of inner calls carried by the request
    pub fn call_count(&self) -> usize {
        match self {
            TransactionRequest::Single(_) => 1,
            TransactionRequest::BatchAll(calls) => calls.len(),
        }
    }
}
