//! Bump decision engine for a ranked governance collective.
//!
//! This crate decides, from a snapshot of on-chain state, which fellowship
//! members have become stale and must be demoted or refreshed, and whether
//! the current salary payout cycle has run past its payout period and must
//! be advanced. Actionable accounts are turned into the minimal set of
//! transaction requests (a single bump call, or one atomic batch).
//!
//! Chain transport, signing, and submission are external collaborators
//! behind the [`chain::ChainStateReader`] and [`chain::TransactionSubmitter`]
//! traits; nothing in this crate talks to a node directly.

use std::fmt;

use thiserror::Error;

pub mod batcher;
pub mod chain;
pub mod config;
pub mod eligibility;
pub mod scheduler;
pub mod types;

use chain::{ChainError, SubmitError};

/// Which evaluation pass produced a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    /// The member staleness pass
    Member,
    /// The salary-cycle pass
    Cycle,
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pass::Member => write!(f, "member"),
            Pass::Cycle => write!(f, "cycle"),
        }
    }
}

/// Error types for bump passes
///
/// Every variant names the pass that failed; a pass surfaces at most one
/// failure signal.
#[derive(Error, Debug)]
pub enum BumpError {
    /// A required chain read could not be obtained
    #[error("{pass} pass: {what} unavailable: {source}")]
    DataUnavailable {
        pass: Pass,
        what: &'static str,
        #[source]
        source: ChainError,
    },

    /// A record needed for the decision could not be decoded
    #[error("{pass} pass: malformed record: {detail}")]
    MalformedRecord { pass: Pass, detail: String },

    /// The constructed transaction was rejected or failed in transit
    #[error("{pass} pass: submission failed: {source}")]
    Submission {
        pass: Pass,
        #[source]
        source: SubmitError,
    },
}

impl BumpError {
    pub(crate) fn data_unavailable(pass: Pass, what: &'static str, source: ChainError) -> Self {
        BumpError::DataUnavailable { pass, what, source }
    }

    /// The pass that failed
    pub fn pass(&self) -> Pass {
        match self {
            BumpError::DataUnavailable { pass, .. } => *pass,
            BumpError::MalformedRecord { pass, .. } => *pass,
            BumpError::Submission { pass, .. } => *pass,
        }
    }
}

/// Result type for bump operations
pub type BumpResult<T> = Result<T, BumpError>;

pub use batcher::{member_bumps, salary_cycle_bump};
pub use chain::{ChainResult, ChainStateReader, TransactionSubmitter};
pub use config::BumperConfig;
pub use eligibility::{is_cycle_due, is_member_due};
pub use scheduler::{Bumper, FellowshipBumper};
pub use types::{
    AccountId, BumpCall, CyclePeriods, CycleStatus, MemberRecord, RankPeriodTable, RankRecord,
    Sender, TransactionRequest,
};
