//! Interaction controller.
//!
//! Every roster edit goes through [`RosterApp`]: it checks the session may
//! edit, validates and applies the change in one step, then saves the whole
//! roster through the sync adapter.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::color;
use crate::edit::{ColorChoice, EditField, FieldEditor};
use crate::errors::AppError;
use crate::models::{
    Member, Rank, RosterState, Squad, Stat, MIN_GENERAL_NAME_LEN,
};
use crate::session::{Authenticator, Credentials, Session};
use crate::sync::{LoadSource, SaveOutcome, SyncAdapter};
use crate::totals::Totals;
use crate::view::{self, TableView};

/// Members a new squad starts with.
pub const NEW_SQUAD_MEMBERS: usize = 4;

pub struct RosterApp {
    adapter: SyncAdapter,
    authenticator: Arc<dyn Authenticator>,
}

impl RosterApp {
    pub fn new(adapter: SyncAdapter, authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            adapter: adapter.with_authenticator(authenticator.clone()),
            authenticator,
        }
    }

    pub fn adapter(&self) -> &SyncAdapter {
        &self.adapter
    }

    pub fn session(&self) -> &Arc<RwLock<Session>> {
        self.adapter.session()
    }

    // ==================== SESSION ====================

    pub async fn login(&self, credentials: &Credentials) -> Result<LoadSource, AppError> {
        let user = match self.authenticator.login(credentials).await {
            Ok(user) => user,
            Err(err) => {
                tracing::warn!(username = %credentials.username, error = %err, "Login failed");
                self.adapter.notifier().error(err.message());
                return Err(err);
            }
        };

        self.session().write().await.signed_in(user);
        Ok(self.adapter.load().await)
    }

    /// Browse without signing in.
    pub async fn view_only(&self) -> LoadSource {
        self.session().write().await.enter_view_only();
        self.adapter.load().await
    }

    pub async fn logout(&self) {
        self.adapter.unsubscribe().await;
        if let Err(err) = self.authenticator.logout().await {
            tracing::warn!(error = %err, "Logout failed");
        }
        self.session().write().await.reset();
        tracing::info!("Signed out");
    }

    /// Re-run the load chain on demand.
    pub async fn reload(&self) -> Result<LoadSource, AppError> {
        if self.session().read().await.user().is_none() {
            return Err(AppError::Forbidden("Sign in to load the roster".to_string()));
        }
        Ok(self.adapter.load().await)
    }

    /// Save the roster as it stands.
    pub async fn save(&self) -> Result<SaveOutcome, AppError> {
        self.ensure_can_edit().await?;
        Ok(self.adapter.save().await)
    }

    pub async fn view(&self) -> TableView {
        let editable = self.session().read().await.can_edit();
        view::render(&self.adapter.state().await, editable)
    }

    pub async fn totals(&self) -> Totals {
        self.adapter.state().await.totals()
    }

    // ==================== EDITS ====================

    /// Apply `change` and save. `change` returns `false` for a no-op, which
    /// skips the save and yields `None`.
    async fn edit<F>(&self, change: F) -> Result<Option<SaveOutcome>, AppError>
    where
        F: FnOnce(&mut RosterState) -> Result<bool, AppError>,
    {
        self.ensure_can_edit().await?;

        if !self.adapter.mutate(change).await? {
            return Ok(None);
        }
        Ok(Some(self.adapter.save().await))
    }

    async fn ensure_can_edit(&self) -> Result<(), AppError> {
        if self.session().read().await.can_edit() {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Editing requires an admin session".to_string(),
            ))
        }
    }

    pub async fn set_member_stat(
        &self,
        squad: usize,
        member: usize,
        stat: Stat,
        value: u32,
    ) -> Result<Option<SaveOutcome>, AppError> {
        self.edit(|state| {
            member_mut(state, squad, member)?.set_stat(stat, value);
            Ok(true)
        })
        .await
    }

    pub async fn set_general_stat(
        &self,
        stat: Stat,
        value: u32,
    ) -> Result<Option<SaveOutcome>, AppError> {
        self.edit(|state| {
            state.general_stats.set_stat(stat, value);
            Ok(true)
        })
        .await
    }

    /// `None` clears the override so the computed sum shows again.
    pub async fn set_missions_override(
        &self,
        value: Option<u32>,
    ) -> Result<Option<SaveOutcome>, AppError> {
        self.edit(|state| {
            state.total_missions_override = value;
            Ok(true)
        })
        .await
    }

    pub async fn rename_squad(
        &self,
        squad: usize,
        name: &str,
    ) -> Result<Option<SaveOutcome>, AppError> {
        self.edit(|state| Ok(rename(&mut squad_mut(state, squad)?.name, name)))
            .await
    }

    pub async fn rename_colonel(
        &self,
        squad: usize,
        name: &str,
    ) -> Result<Option<SaveOutcome>, AppError> {
        self.edit(|state| Ok(rename(&mut squad_mut(state, squad)?.colonel, name)))
            .await
    }

    pub async fn rename_member(
        &self,
        squad: usize,
        member: usize,
        name: &str,
    ) -> Result<Option<SaveOutcome>, AppError> {
        self.edit(|state| Ok(rename(&mut member_mut(state, squad, member)?.name, name)))
            .await
    }

    pub async fn rename_general(&self, name: &str) -> Result<Option<SaveOutcome>, AppError> {
        self.edit(|state| {
            let trimmed = name.trim();
            if trimmed.is_empty() || trimmed == state.general_stats.name {
                return Ok(false);
            }
            if trimmed.chars().count() < MIN_GENERAL_NAME_LEN {
                return Err(AppError::Validation(format!(
                    "The General's name must be at least {} characters",
                    MIN_GENERAL_NAME_LEN
                )));
            }
            state.general_stats.name = trimmed.to_string();
            Ok(true)
        })
        .await
    }

    pub async fn set_member_rank(
        &self,
        squad: usize,
        member: usize,
        rank: Rank,
    ) -> Result<Option<SaveOutcome>, AppError> {
        self.edit(|state| {
            if rank == Rank::Colonel {
                return Err(AppError::Validation(format!(
                    "Members cannot hold rank {}",
                    Rank::Colonel.as_str()
                )));
            }
            member_mut(state, squad, member)?.rank = rank;
            Ok(true)
        })
        .await
    }

    pub async fn set_squad_color(
        &self,
        squad: usize,
        choice: &ColorChoice,
    ) -> Result<Option<SaveOutcome>, AppError> {
        self.edit(|state| {
            let target = squad_mut(state, squad)?;
            match choice {
                ColorChoice::Palette(entry) => target.set_palette_color(entry),
                ColorChoice::Custom(hex) => {
                    if !color::is_custom_hex(hex) {
                        return Err(AppError::Validation(format!(
                            "Invalid HEX color: {}",
                            hex
                        )));
                    }
                    target.set_color(hex);
                }
            }
            Ok(true)
        })
        .await
    }

    /// Append a squad with a cycling palette color, a colonel and four recruits.
    pub async fn add_squad(&self) -> Result<Option<SaveOutcome>, AppError> {
        self.edit(|state| {
            let position = state.squads.len();
            let entry = color::palette_for_index(position);
            let mut squad = Squad {
                name: format!("Squad {}", position + 1),
                color: String::new(),
                text_color: String::new(),
                colonel: "New Colonel".to_string(),
                colonel_rank: Rank::Colonel,
                members: (1..=NEW_SQUAD_MEMBERS)
                    .map(|i| Member::recruit(format!("Soldier {}", i)))
                    .collect(),
            };
            squad.set_palette_color(entry);
            state.squads.push(squad);
            Ok(true)
        })
        .await
    }

    pub async fn delete_squad(&self, squad: usize) -> Result<Option<SaveOutcome>, AppError> {
        self.edit(|state| {
            squad_mut(state, squad)?;
            let removed = state.squads.remove(squad);
            tracing::info!(squad = %removed.name, "Squad deleted");
            Ok(true)
        })
        .await
    }

    /// Apply the editor's committed value. A rejected value leaves the
    /// editor open with the error.
    pub async fn apply_edit(
        &self,
        editor: &mut FieldEditor,
    ) -> Result<Option<SaveOutcome>, AppError> {
        let Some((field, value)) = editor.commit() else {
            return Ok(None);
        };

        let result = self.apply_field(field, &value).await;
        editor.resolve(result.as_ref().map(|_| ()));
        result
    }

    async fn apply_field(
        &self,
        field: EditField,
        value: &str,
    ) -> Result<Option<SaveOutcome>, AppError> {
        match field {
            EditField::SquadName { squad } => self.rename_squad(squad, value).await,
            EditField::Colonel { squad } => self.rename_colonel(squad, value).await,
            EditField::MemberName { squad, member } => {
                self.rename_member(squad, member, value).await
            }
            EditField::MemberRank { squad, member } => {
                let rank = Rank::from_label(value).ok_or_else(|| {
                    AppError::Validation(format!("Unknown rank: {}", value))
                })?;
                self.set_member_rank(squad, member, rank).await
            }
            EditField::MemberStat {
                squad,
                member,
                stat,
            } => {
                let value = parse_count(value)?;
                self.set_member_stat(squad, member, stat, value).await
            }
            EditField::GeneralName => self.rename_general(value).await,
            EditField::GeneralStat(stat) => {
                let value = parse_count(value)?;
                self.set_general_stat(stat, value).await
            }
            EditField::MissionsOverride => {
                let value = match value.trim() {
                    "" => None,
                    raw => Some(parse_count(raw)?),
                };
                self.set_missions_override(value).await
            }
        }
    }
}

/// Trim and assign; empty or unchanged input is a no-op.
fn rename(target: &mut String, name: &str) -> bool {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed == target.as_str() {
        return false;
    }
    *target = trimmed.to_string();
    true
}

fn parse_count(raw: &str) -> Result<u32, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::Validation(format!("Not a whole number: {}", raw.trim())))
}

fn squad_mut(state: &mut RosterState, squad: usize) -> Result<&mut Squad, AppError> {
    state
        .squads
        .get_mut(squad)
        .ok_or_else(|| AppError::NotFound(format!("Squad {} not found", squad)))
}

fn member_mut(
    state: &mut RosterState,
    squad: usize,
    member: usize,
) -> Result<&mut Member, AppError> {
    squad_mut(state, squad)?
        .members
        .get_mut(member)
        .ok_or_else(|| AppError::NotFound(format!("Member {} not found", member)))
}
