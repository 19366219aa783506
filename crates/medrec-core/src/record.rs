//! On-chain record projection and its state machine.
//!
//! The contract owns records; this client only observes them. A record
//! starts Active and can move to Inactive exactly once, via the
//! dedicated deactivate call. Updates swap the content identifier while
//! Active and leave the status label untouched. No transition back is
//! exposed.

use serde::{Deserialize, Serialize};

use crate::address::Address;

/// Lifecycle label of a record as observed by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordStatus {
    Active,
    Inactive,
}

impl RecordStatus {
    pub fn from_active_flag(active: bool) -> Self {
        if active {
            RecordStatus::Active
        } else {
            RecordStatus::Inactive
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, RecordStatus::Active)
    }

    /// Deactivation is only meaningful from Active; asking again is a
    /// client-side no-op.
    pub fn can_deactivate(&self) -> bool {
        self.is_active()
    }

    /// The content identifier may only change while Active.
    pub fn can_update(&self) -> bool {
        self.is_active()
    }
}

/// A record as returned by the contract's per-id query.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChainRecord {
    pub id: u64,
    pub patient: Address,
    pub doctor: Address,
    /// Content identifier of the off-chain manifest.
    pub cid: String,
    /// Creation time, unix seconds, set by the contract.
    pub created_at: i64,
    pub status: RecordStatus,
}

impl ChainRecord {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}
