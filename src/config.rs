//! Runtime configuration for the bump scheduler.

use serde::{Deserialize, Serialize};

/// Configuration for a [`FellowshipBumper`](crate::FellowshipBumper) instance
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BumperConfig {
    /// Refetch the rank period table at the start of every member pass
    /// instead of caching it for the lifetime of the instance.
    ///
    /// On-chain parameter changes are only picked up between passes when
    /// this is set; the table is always immutable within one pass.
    pub reload_periods_each_pass: bool,
}
