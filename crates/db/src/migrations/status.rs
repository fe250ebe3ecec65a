//! Status Reporter - read-only diff of registry against ledger
//!
//! Answers "what's applied, what's pending, what was the last group"
//! without taking the advisory lock. Reads are best effort: a concurrent
//! migration may be observed mid-flight.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::migrator::{MigrationGroup, MigrationRecord};
use super::registry::MigrationRegistry;

/// Per-unit applied/pending state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MigrationState {
    Pending,
    Applied {
        group_id: i32,
        applied_at: DateTime<Utc>,
    },
}

/// One registry unit with its ledger state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationStatus {
    pub id: String,
    pub state: MigrationState,
}

impl MigrationStatus {
    pub fn is_applied(&self) -> bool {
        matches!(self.state, MigrationState::Applied { .. })
    }
}

impl std::fmt::Display for MigrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.state {
            MigrationState::Pending => write!(f, "{} (pending)", self.id),
            MigrationState::Applied { group_id, .. } => {
                write!(f, "{} (group #{})", self.id, group_id)
            }
        }
    }
}

/// Full registry/ledger diff
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReport {
    /// Every registry unit, in ascending identifier order
    pub migrations: Vec<MigrationStatus>,
    /// Ledger rows with no registry counterpart (drift)
    pub orphaned: Vec<MigrationRecord>,
    /// The most recently applied group; id 0 when the ledger is empty
    pub last_group: MigrationGroup,
}

impl StatusReport {
    /// Join a registry against ledger records.
    pub fn compute(registry: &MigrationRegistry, records: Vec<MigrationRecord>) -> Self {
        let mut migrations = Vec::with_capacity(registry.len());
        for unit in registry.iter() {
            let state = records
                .iter()
                .find(|r| r.id == unit.id)
                .map(|r| MigrationState::Applied {
                    group_id: r.group_id,
                    applied_at: r.applied_at,
                })
                .unwrap_or(MigrationState::Pending);
            migrations.push(MigrationStatus {
                id: unit.id.clone(),
                state,
            });
        }

        let last_group_id = records.iter().map(|r| r.group_id).max().unwrap_or(0);
        let last_group = MigrationGroup {
            id: last_group_id,
            migrations: records
                .iter()
                .filter(|r| r.group_id == last_group_id && last_group_id != 0)
                .map(|r| r.id.clone())
                .collect(),
        };

        let orphaned = records
            .into_iter()
            .filter(|r| !registry.contains(&r.id))
            .collect();

        Self {
            migrations,
            orphaned,
            last_group,
        }
    }

    /// Units not yet recorded in the ledger.
    pub fn unapplied(&self) -> Vec<&MigrationStatus> {
        self.migrations.iter().filter(|m| !m.is_applied()).collect()
    }

    pub fn last_group(&self) -> &MigrationGroup {
        &self.last_group
    }
}
