//! Table view of the roster.
//!
//! `render` is a pure function of the roster and the edit mode, re-run after
//! every change. The result is a row model; how it is drawn is up to the caller.

use serde::Serialize;

use crate::color;
use crate::models::{Rank, RosterState};

/// Background of the General's row.
pub const GENERAL_BACKGROUND: &str = "#2c3e50";
/// How much lighter member rows are than their squad header.
pub const MEMBER_LIGHTEN_PERCENT: f64 = 20.0;

const COLUMNS: [&str; 6] = ["Squad", "Member", "Rank", "Kills", "Deaths", "Missions"];

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TableView {
    pub editable: bool,
    pub headers: Vec<&'static str>,
    pub totals: TotalsRow,
    pub general: GeneralRow,
    pub squads: Vec<SquadBlock>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TotalsRow {
    pub kills: u64,
    pub deaths: u64,
    pub missions: u64,
    pub missions_overridden: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GeneralRow {
    pub name: String,
    pub rank_label: &'static str,
    pub kills: u32,
    pub deaths: u32,
    pub missions: u32,
    pub background: &'static str,
    pub text_color: &'static str,
}

/// Colonel header row plus its member rows.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SquadBlock {
    pub index: usize,
    pub name: String,
    pub colonel: String,
    pub colonel_rank: Rank,
    pub background: String,
    pub text_color: String,
    /// Rows spanned by the squad name cell
    pub row_span: usize,
    pub members: Vec<MemberRow>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MemberRow {
    pub index: usize,
    pub name: String,
    pub rank: Rank,
    pub kills: u32,
    pub deaths: u32,
    pub missions: u32,
    pub background: String,
    pub text_color: String,
}

/// One entry of the member rank dropdown.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RankOption {
    pub rank: Rank,
    pub selected: bool,
}

pub fn render(state: &RosterState, editable: bool) -> TableView {
    let totals = state.totals();

    let mut headers = COLUMNS.to_vec();
    if editable {
        headers.push("Actions");
    }

    let general = &state.general_stats;

    TableView {
        editable,
        headers,
        totals: TotalsRow {
            kills: totals.kills,
            deaths: totals.deaths,
            missions: totals.missions,
            missions_overridden: totals.missions_overridden,
        },
        general: GeneralRow {
            name: general.name.clone(),
            rank_label: "General",
            kills: general.kills,
            deaths: general.deaths,
            missions: general.missions,
            background: GENERAL_BACKGROUND,
            text_color: color::WHITE,
        },
        squads: state
            .squads
            .iter()
            .enumerate()
            .map(|(index, squad)| {
                let member_background = color::lighten(&squad.color, MEMBER_LIGHTEN_PERCENT);
                SquadBlock {
                    index,
                    name: squad.name.clone(),
                    colonel: squad.colonel.clone(),
                    colonel_rank: squad.colonel_rank,
                    background: squad.color.clone(),
                    text_color: squad.text_color.clone(),
                    row_span: squad.members.len() + 1,
                    members: squad
                        .members
                        .iter()
                        .enumerate()
                        .map(|(index, member)| MemberRow {
                            index,
                            name: member.name.clone(),
                            rank: member.rank,
                            kills: member.kills,
                            deaths: member.deaths,
                            missions: member.missions,
                            background: member_background.clone(),
                            text_color: squad.text_color.clone(),
                        })
                        .collect(),
                }
            })
            .collect(),
    }
}

/// Ranks offered for a member, with `current` selected. Colonel is never offered.
pub fn rank_options(current: Rank) -> Vec<RankOption> {
    Rank::member_ranks()
        .map(|rank| RankOption {
            rank,
            selected: rank == current,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_seed() {
        let view = render(&RosterState::seeded(), false);

        assert!(!view.editable);
        assert_eq!(view.headers.len(), 6);
        assert_eq!(view.totals.kills, 40);
        assert_eq!(view.totals.missions, 55);
        assert!(!view.totals.missions_overridden);

        assert_eq!(view.general.name, "General");
        assert_eq!(view.general.background, GENERAL_BACKGROUND);

        let squad = &view.squads[0];
        assert_eq!(squad.row_span, 5);
        assert_eq!(squad.background, "#3498db");
        assert_eq!(squad.members[0].background, "#67cbff");
        assert_eq!(squad.members[0].text_color, squad.text_color);
        assert_eq!(squad.colonel_rank, Rank::Colonel);
    }

    #[test]
    fn test_editable_adds_actions_column() {
        let view = render(&RosterState::seeded(), true);
        assert_eq!(view.headers.last(), Some(&"Actions"));
    }

    #[test]
    fn test_override_shown_in_totals() {
        let mut state = RosterState::seeded();
        state.total_missions_override = Some(0);

        let view = render(&state, false);
        assert_eq!(view.totals.missions, 0);
        assert!(view.totals.missions_overridden);
    }

    #[test]
    fn test_rank_options_exclude_colonel() {
        let options = rank_options(Rank::Sergeant);
        assert_eq!(options.len(), 7);
        assert!(options.iter().all(|o| o.rank != Rank::Colonel));
        assert_eq!(
            options.iter().filter(|o| o.selected).map(|o| o.rank).collect::<Vec<_>>(),
            vec![Rank::Sergeant]
        );
    }

    #[test]
    fn test_serializes_rank_labels() {
        let json = serde_json::to_value(render(&RosterState::seeded(), false)).unwrap();
        assert_eq!(json["squads"][0]["colonelRank"], "Coronel");
        assert_eq!(json["squads"][0]["members"][1]["rank"], "Cabo Primero");
        assert_eq!(json["totals"]["missionsOverridden"], false);
    }
}
