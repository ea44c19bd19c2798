//! Bump pass orchestration.
//!
//! [`FellowshipBumper`] pulls a snapshot of chain state, classifies each
//! member and the salary cycle through the eligibility functions, and
//! submits the minimal set of corrective transactions. The member pass and
//! the cycle pass are independent; failure of one never affects the other.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::batcher;
use crate::chain::{ChainError, ChainResult, ChainStateReader, TransactionSubmitter};
use crate::config::BumperConfig;
use crate::eligibility::{is_cycle_due, is_member_due};
use crate::types::{AccountId, RankPeriodTable, Sender};
use crate::{BumpError, BumpResult, Pass};

/// Capability interface for governance bodies that support bumping
///
/// Concrete bodies are implementations selected at composition time; the
/// fellowship collective is one of them.
#[async_trait]
pub trait Bumper: Send + Sync {
    /// Bump every member that has become stale
    ///
    /// Returns the accounts that were bumped, empty for a no-op pass.
    async fn bump_members(&self, sender: &Sender) -> BumpResult<Vec<AccountId>>;

    /// Advance the salary cycle if it has run past its payout period
    async fn bump_salary_cycle(&self, sender: &Sender) -> BumpResult<()>;
}

/// Bump scheduler for the fellowship collective
///
/// The rank period table is loaded lazily on first need and cached for the
/// lifetime of the instance; set
/// [`BumperConfig::reload_periods_each_pass`] to refetch it on every member
/// pass instead. Everything else is read fresh each pass.
pub struct FellowshipBumper {
    reader: Arc<dyn ChainStateReader>,
    submitter: Arc<dyn TransactionSubmitter>,
    config: BumperConfig,
    period_table: RwLock<Option<RankPeriodTable>>,
}

impl FellowshipBumper {
    pub fn new(
        reader: Arc<dyn ChainStateReader>,
        submitter: Arc<dyn TransactionSubmitter>,
        config: BumperConfig,
    ) -> Self {
        FellowshipBumper {
            reader,
            submitter,
            config,
            period_table: RwLock::new(None),
        }
    }

    /// Run one member evaluation pass
    ///
    /// Returns the due accounts in discovery order; an empty due-set is a
    /// valid no-op outcome and submits zero transactions. Member entries the
    /// reader flagged as malformed are skipped, not fatal.
    pub async fn run_member_pass(&self, sender: &Sender) -> BumpResult<Vec<AccountId>> {
        if self.config.reload_periods_each_pass {
            *self.period_table.write().await = None;
        }

        // Snapshot the height once; every member in this pass is judged
        // against the same reference block.
        let current_block = self
            .reader
            .current_block()
            .await
            .map_err(|e| BumpError::data_unavailable(Pass::Member, "block height", e))?;

        let (members, ranks) =
            futures::try_join!(self.reader.list_members(), self.reader.list_ranks()).map_err(
                |e| BumpError::data_unavailable(Pass::Member, "member and rank records", e),
            )?;

        let rank_of: HashMap<AccountId, u16> =
            ranks.into_iter().map(|r| (r.account, r.rank)).collect();

        let mut due = Vec::new();
        for entry in members {
            let member = match entry {
                Ok(member) => member,
                Err(e) => {
                    warn!("Skipping malformed member record: {}", e);
                    continue;
                }
            };
            let rank = rank_of.get(&member.account).copied().unwrap_or(0);
            let period = self
                .demotion_period(rank)
                .await
                .map_err(|e| BumpError::data_unavailable(Pass::Member, "rank period table", e))?;
            if rank > 0 && period.is_none() {
                debug!(
                    "No demotion period configured for rank {} ({})",
                    rank, member.account
                );
            }
            if is_member_due(&member, period, current_block) {
                due.push(member.account);
            }
        }

        if due.is_empty() {
            debug!("Member pass at block {}: nothing to bump", current_block);
            return Ok(due);
        }

        info!("Bumping {} accounts: {:?}", due.len(), due);
        self.submitter
            .submit(batcher::member_bumps(&due), sender)
            .await
            .map_err(|e| BumpError::Submission {
                pass: Pass::Member,
                source: e,
            })?;

        Ok(due)
    }

    /// Run one cycle evaluation pass
    ///
    /// Returns the index of the cycle that was bumped, or `None` when the
    /// cycle is still within its registration or payout period. A malformed
    /// cycle status aborts the pass; the cycle decision is meaningless
    /// without it.
    pub async fn run_cycle_pass(&self, sender: &Sender) -> BumpResult<Option<u32>> {
        let (status, periods, current_block) = futures::try_join!(
            self.reader.cycle_status(),
            self.reader.cycle_periods(),
            self.reader.current_block(),
        )
        .map_err(|e| match e {
            ChainError::Malformed(detail) => BumpError::MalformedRecord {
                pass: Pass::Cycle,
                detail,
            },
            e => BumpError::data_unavailable(Pass::Cycle, "cycle state", e),
        })?;

        if !is_cycle_due(&status, &periods, current_block) {
            debug!(
                "Cycle {} at block {}: not due",
                status.cycle_index, current_block
            );
            return Ok(None);
        }

        info!("Bumping salary cycle {}", status.cycle_index);
        self.submitter
            .submit(batcher::salary_cycle_bump(), sender)
            .await
            .map_err(|e| BumpError::Submission {
                pass: Pass::Cycle,
                source: e,
            })?;

        Ok(Some(status.cycle_index))
    }

    /// Resolve the demotion period for a rank, loading the table on first
    /// need
    ///
    /// Rank 0 never has a period and never triggers a table load. A
    /// concurrent duplicate load is harmless; both produce the same table.
    async fn demotion_period(&self, rank: u16) -> ChainResult<Option<u64>> {
        if rank == 0 {
            return Ok(None);
        }
        if let Some(table) = self.period_table.read().await.as_ref() {
            return Ok(table.demotion_period(rank));
        }
        let table = self.reader.rank_period_table().await?;
        let period = table.demotion_period(rank);
        *self.period_table.write().await = Some(table);
        Ok(period)
    }
}

#[async_trait]
impl Bumper for FellowshipBumper {
    async fn bump_members(&self, sender: &Sender) -> BumpResult<Vec<AccountId>> {
        self.run_member_pass(sender).await
    }

    async fn bump_salary_cycle(&self, sender: &Sender) -> BumpResult<()> {
        self.run_cycle_pass(sender).await.map(|_| ())
    }
}
