//! Persisted roster snapshot and the in-memory state it is adopted into.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{default_squads, GeneralStats, Rank, Squad};
use crate::color;
use crate::errors::AppError;
use crate::totals::{compute_totals, Totals};

/// Minimum length of the General's display name.
pub const MIN_GENERAL_NAME_LEN: usize = 2;

/// The unit of save and load: one remote document, mirrored into one cache entry.
///
/// Every field is optional on the wire so documents written by older clients
/// still load; defaults are applied by [`RosterState::from_snapshot`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RosterSnapshot {
    #[serde(default)]
    pub squads_data: Vec<Squad>,
    #[serde(default)]
    pub total_missions_override: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub general_stats: Option<GeneralStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl RosterSnapshot {
    /// Reject documents the editor could never have produced.
    pub fn validate(&self) -> Result<(), AppError> {
        for squad in &self.squads_data {
            if squad.name.trim().is_empty() {
                return Err(AppError::Validation("Squad name is required".to_string()));
            }
            if !color::is_hex_color(&squad.color) || !color::is_hex_color(&squad.text_color) {
                return Err(AppError::Validation(format!(
                    "Squad {} has an invalid color",
                    squad.name
                )));
            }
            if squad.colonel_rank != Rank::Colonel {
                return Err(AppError::Validation(format!(
                    "Squad {} colonel must hold rank {}",
                    squad.name,
                    Rank::Colonel.as_str()
                )));
            }
            if let Some(member) = squad.members.iter().find(|m| m.rank == Rank::Colonel) {
                return Err(AppError::Validation(format!(
                    "Member {} cannot hold rank {}",
                    member.name,
                    Rank::Colonel.as_str()
                )));
            }
        }

        if let Some(general) = &self.general_stats {
            if general.name.trim().chars().count() < MIN_GENERAL_NAME_LEN {
                return Err(AppError::Validation(format!(
                    "General name must be at least {} characters",
                    MIN_GENERAL_NAME_LEN
                )));
            }
        }

        Ok(())
    }

    /// Fill in a missing General record from the caller's copy.
    pub fn with_general_fallback(mut self, general: &GeneralStats) -> Self {
        if self.general_stats.is_none() {
            self.general_stats = Some(general.clone());
        }
        self
    }
}

/// The roster as the application edits it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterState {
    pub squads: Vec<Squad>,
    pub total_missions_override: Option<u32>,
    pub general_stats: GeneralStats,
}

impl RosterState {
    /// Adopt a snapshot, defaulting whatever it lacks.
    pub fn from_snapshot(snapshot: RosterSnapshot) -> Self {
        Self {
            squads: snapshot.squads_data,
            total_missions_override: snapshot.total_missions_override,
            general_stats: snapshot.general_stats.unwrap_or_default(),
        }
    }

    /// The hardcoded example roster.
    pub fn seeded() -> Self {
        Self {
            squads: default_squads(),
            total_missions_override: None,
            general_stats: GeneralStats::default(),
        }
    }

    pub fn to_snapshot(&self, at: DateTime<Utc>) -> RosterSnapshot {
        RosterSnapshot {
            squads_data: self.squads.clone(),
            total_missions_override: self.total_missions_override,
            general_stats: Some(self.general_stats.clone()),
            last_updated: Some(at),
        }
    }

    pub fn totals(&self) -> Totals {
        compute_totals(
            &self.squads,
            &self.general_stats,
            self.total_missions_override,
        )
    }
}

/// Revision information for change detection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RevisionInfo {
    pub revision_id: i64,
    pub generated_at: String,
}
