//! Chain-facing collaborator traits.
//!
//! The bump engine reads chain state and submits transactions only through
//! these traits; RPC transport, key handling, and fee logic live behind
//! them. Decoding raw query output into typed records happens here, at the
//! boundary, via the `decode_*` helpers.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::types::{
    AccountId, CyclePeriods, CycleStatus, MemberRecord, RankPeriodTable, RankRecord, Sender,
    TransactionRequest,
};

/// Error types for chain reads
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// The read could not be completed
    #[error("chain state unavailable: {0}")]
    Unavailable(String),

    /// The query result could not be decoded into the expected shape
    #[error("malformed chain record: {0}")]
    Malformed(String),
}

/// Result type for chain reads
pub type ChainResult<T> = Result<T, ChainError>;

/// Error types for transaction submission
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// The node rejected the transaction during validation
    #[error("transaction rejected: {0}")]
    Rejected(String),

    /// The transaction could not be delivered
    #[error("transport failure: {0}")]
    Transport(String),
}

/// Read-only queries against current chain state
///
/// Each method is one chain read. Member entries the reader could not
/// decode are flagged in place rather than failing the whole read, so
/// callers can apply their own skip policy.
#[async_trait]
pub trait ChainStateReader: Send + Sync {
    /// Current best block height
    async fn current_block(&self) -> ChainResult<u64>;

    /// All tracked member records
    async fn list_members(&self) -> ChainResult<Vec<ChainResult<MemberRecord>>>;

    /// All rank records
    async fn list_ranks(&self) -> ChainResult<Vec<RankRecord>>;

    /// The per-rank demotion period table
    async fn rank_period_table(&self) -> ChainResult<RankPeriodTable>;

    /// The current salary cycle status
    async fn cycle_status(&self) -> ChainResult<CycleStatus>;

    /// Chain-wide cycle period constants
    async fn cycle_periods(&self) -> ChainResult<CyclePeriods>;
}

/// Signs and submits a constructed transaction request
#[async_trait]
pub trait TransactionSubmitter: Send + Sync {
    /// Submit a request on behalf of `sender`, resolving once the node has
    /// accepted or rejected it
    async fn submit(&self, request: TransactionRequest, sender: &Sender) -> Result<(), SubmitError>;
}

#[derive(Deserialize)]
struct MemberWire {
    #[serde(rename = "isActive")]
    is_active: bool,
    #[serde(rename = "lastProof")]
    last_proof: u64,
}

#[derive(Deserialize)]
struct CycleStatusWire {
    #[serde(rename = "cycleIndex")]
    cycle_index: u32,
    #[serde(rename = "cycleStart")]
    cycle_start: u64,
}

#[derive(Deserialize)]
struct ParamsWire {
    #[serde(rename = "demotionPeriod")]
    demotion_period: Vec<u64>,
}

/// Decode one member entry value as returned by the membership query
///
/// The account comes from the entry's storage key; the value carries the
/// activity flag and last proof block.
pub fn decode_member(account: AccountId, value: &serde_json::Value) -> ChainResult<MemberRecord> {
    let wire: MemberWire = serde_json::from_value(value.clone())
        .map_err(|e| ChainError::Malformed(format!("member {account}: {e}")))?;
    Ok(MemberRecord {
        account,
        is_active: wire.is_active,
        last_proof_block: wire.last_proof,
    })
}

/// Decode the salary cycle status value
pub fn decode_cycle_status(value: &serde_json::Value) -> ChainResult<CycleStatus> {
    let wire: CycleStatusWire = serde_json::from_value(value.clone())
        .map_err(|e| ChainError::Malformed(format!("cycle status: {e}")))?;
    Ok(CycleStatus {
        cycle_index: wire.cycle_index,
        cycle_start: wire.cycle_start,
    })
}

/// Decode the collective's parameter value into the demotion period table
///
/// Unrelated parameter fields in the value are ignored.
pub fn decode_period_table(value: &serde_json::Value) -> ChainResult<RankPeriodTable> {
    let wire: ParamsWire = serde_json::from_value(value.clone())
        .map_err(|e| ChainError::Malformed(format!("collective params: {e}")))?;
    Ok(RankPeriodTable::new(wire.demotion_period))
}

pub mod mock {
    //! Mock chain collaborators for testing
    //!
    //! `MockChainReader` serves scripted state; `RecordingSubmitter` records
    //! every request it is handed, so tests can assert on exactly what a
    //! pass submitted (including nothing at all).

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Mutex, RwLock};

    use async_trait::async_trait;

    use super::{ChainError, ChainResult, ChainStateReader, SubmitError, TransactionSubmitter};
    use crate::types::{
        AccountId, CyclePeriods, CycleStatus, MemberRecord, RankPeriodTable, RankRecord, Sender,
        TransactionRequest,
    };

    /// A scriptable ChainStateReader for tests
    pub struct MockChainReader {
        current_block: RwLock<ChainResult<u64>>,
        members: RwLock<Vec<ChainResult<MemberRecord>>>,
        ranks: RwLock<Vec<RankRecord>>,
        period_table: RwLock<ChainResult<RankPeriodTable>>,
        cycle_status: RwLock<ChainResult<CycleStatus>>,
        cycle_periods: RwLock<ChainResult<CyclePeriods>>,
        period_table_reads: AtomicUsize,
    }

    impl MockChainReader {
        /// Create a reader with empty collections at block 0
        pub fn new() -> Self {
            MockChainReader {
                current_block: RwLock::new(Ok(0)),
                members: RwLock::new(Vec::new()),
                ranks: RwLock::new(Vec::new()),
                period_table: RwLock::new(Ok(RankPeriodTable::default())),
                cycle_status: RwLock::new(Ok(CycleStatus {
                    cycle_index: 0,
                    cycle_start: 0,
                })),
                cycle_periods: RwLock::new(Ok(CyclePeriods {
                    registration_period: 0,
                    payout_period: 0,
                })),
                period_table_reads: AtomicUsize::new(0),
            }
        }

        pub fn set_current_block(&self, block: u64) {
            *self.current_block.write().unwrap() = Ok(block);
        }

        /// Make the block height read fail with `Unavailable`
        pub fn fail_current_block(&self, reason: &str) {
            *self.current_block.write().unwrap() =
                Err(ChainError::Unavailable(reason.to_string()));
        }

        pub fn add_member(&self, member: MemberRecord) {
            self.members.write().unwrap().push(Ok(member));
        }

        /// Add a member entry the reader failed to decode
        pub fn add_malformed_member(&self, detail: &str) {
            self.members
                .write()
                .unwrap()
                .push(Err(ChainError::Malformed(detail.to_string())));
        }

        pub fn set_rank(&self, account: impl Into<AccountId>, rank: u16) {
            self.ranks.write().unwrap().push(RankRecord {
                account: account.into(),
                rank,
            });
        }

        pub fn set_period_table(&self, demotion_periods: Vec<u64>) {
            *self.period_table.write().unwrap() = Ok(RankPeriodTable::new(demotion_periods));
        }

        pub fn set_cycle_status(&self, cycle_index: u32, cycle_start: u64) {
            *self.cycle_status.write().unwrap() = Ok(CycleStatus {
                cycle_index,
                cycle_start,
            });
        }

        /// Make the cycle status read fail with `Malformed`
        pub fn fail_cycle_status_malformed(&self, detail: &str) {
            *self.cycle_status.write().unwrap() =
                Err(ChainError::Malformed(detail.to_string()));
        }

        pub fn set_cycle_periods(&self, registration_period: u64, payout_period: u64) {
            *self.cycle_periods.write().unwrap() = Ok(CyclePeriods {
                registration_period,
                payout_period,
            });
        }

        /// How many times the period table has been fetched
        pub fn period_table_reads(&self) -> usize {
            self.period_table_reads.load(Ordering::SeqCst)
        }
    }

    impl Default for MockChainReader {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl ChainStateReader for MockChainReader {
        async fn current_block(&self) -> ChainResult<u64> {
            self.current_block.read().unwrap().clone()
        }

        async fn list_members(&self) -> ChainResult<Vec<ChainResult<MemberRecord>>> {
            Ok(self.members.read().unwrap().clone())
        }

        async fn list_ranks(&self) -> ChainResult<Vec<RankRecord>> {
            Ok(self.ranks.read().unwrap().clone())
        }

        async fn rank_period_table(&self) -> ChainResult<RankPeriodTable> {
            self.period_table_reads.fetch_add(1, Ordering::SeqCst);
            self.period_table.read().unwrap().clone()
        }

        async fn cycle_status(&self) -> ChainResult<CycleStatus> {
            self.cycle_status.read().unwrap().clone()
        }

        async fn cycle_periods(&self) -> ChainResult<CyclePeriods> {
            self.cycle_periods.read().unwrap().clone()
        }
    }

    /// Records every submitted request; can be made to fail
    pub struct RecordingSubmitter {
        requests: Mutex<Vec<TransactionRequest>>,
        fail_with: Mutex<Option<SubmitError>>,
    }

    impl RecordingSubmitter {
        pub fn new() -> Self {
            RecordingSubmitter {
                requests: Mutex::new(Vec::new()),
                fail_with: Mutex::new(None),
            }
        }

        /// Make every subsequent submission fail with `error`
        pub fn fail_with(&self, error: SubmitError) {
            *self.fail_with.lock().unwrap() = Some(error);
        }

        /// Every request submitted so far, in order
        pub fn requests(&self) -> Vec<TransactionRequest> {
            self.requests.lock().unwrap().clone()
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    impl Default for RecordingSubmitter {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl TransactionSubmitter for RecordingSubmitter {
        async fn submit(
            &self,
            request: TransactionRequest,
            _sender: &Sender,
        ) -> Result<(), SubmitError> {
            if let Some(error) = self.fail_with.lock().unwrap().clone() {
                return Err(error);
            }
            self.requests.lock().unwrap().push(request);
            Ok(())
        }
    }
}
