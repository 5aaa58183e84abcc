//! Global roster totals.
//!
//! The General's kills and deaths count toward the global totals; the General's
//! missions never do. The mission total is the override when one is set and the
//! sum over squad members otherwise.

use serde::{Deserialize, Serialize};

use crate::models::{GeneralStats, Squad};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub kills: u64,
    pub deaths: u64,
    pub missions: u64,
    /// True when `missions` comes from the manual override.
    pub missions_overridden: bool,
}

/// Sum of missions over every squad member.
pub fn member_missions(squads: &[Squad]) -> u64 {
    squads
        .iter()
        .flat_map(|squad| &squad.members)
        .map(|member| u64::from(member.missions))
        .sum()
}

pub fn compute_totals(
    squads: &[Squad],
    general: &GeneralStats,
    missions_override: Option<u32>,
) -> Totals {
    let members = squads.iter().flat_map(|squad| &squad.members);

    let (kills, deaths) = members.fold(
        (u64::from(general.kills), u64::from(general.deaths)),
        |(kills, deaths), member| {
            (
                kills + u64::from(member.kills),
                deaths + u64::from(member.deaths),
            )
        },
    );

    let missions = match missions_override {
        Some(value) => u64::from(value),
        None => member_missions(squads),
    };

    Totals {
        kills,
        deaths,
        missions,
        missions_overridden: missions_override.is_some(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{default_squads, Member, Rank};

    fn member(name: &str, kills: u32, deaths: u32, missions: u32) -> Member {
        Member {
            name: name.to_string(),
            rank: Rank::Cadet,
            kills,
            deaths,
            missions,
        }
    }

    fn general(kills: u32, deaths: u32, missions: u32) -> GeneralStats {
        GeneralStats {
            name: "General".to_string(),
            kills,
            deaths,
            missions,
        }
    }

    #[test]
    fn test_seed_totals() {
        let totals = compute_totals(&default_squads(), &GeneralStats::default(), None);
        assert_eq!(totals.kills, 40);
        assert_eq!(totals.deaths, 10);
        assert_eq!(totals.missions, 55);
        assert!(!totals.missions_overridden);
    }

    #[test]
    fn test_general_kills_and_deaths_count_but_missions_do_not() {
        let squads = default_squads();
        let without = compute_totals(&squads, &general(0, 0, 0), None);
        let with = compute_totals(&squads, &general(7, 3, 100), None);

        assert_eq!(with.kills, without.kills + 7);
        assert_eq!(with.deaths, without.deaths + 3);
        assert_eq!(with.missions, without.missions);
    }

    #[test]
    fn test_general_missions_excluded_from_override_too() {
        let totals = compute_totals(&default_squads(), &general(0, 0, 40), Some(5));
        assert_eq!(totals.missions, 5);
    }

    #[test]
    fn test_override_wins_over_member_edits() {
        let mut squads = default_squads();
        let before = compute_totals(&squads, &GeneralStats::default(), Some(0));
        squads[0].members[0].missions += 1000;
        let after = compute_totals(&squads, &GeneralStats::default(), Some(0));

        assert_eq!(before.missions, 0);
        assert_eq!(after.missions, 0);
        assert!(after.missions_overridden);
    }

    #[test]
    fn test_invariant_under_reordering_and_regrouping() {
        let members = vec![
            member("a", 1, 2, 3),
            member("b", 4, 5, 6),
            member("c", 7, 8, 9),
            member("d", 10, 11, 12),
        ];
        let mut one = default_squads();
        one[0].members = members.clone();

        let mut split = default_squads();
        split.push(split[0].clone());
        split[0].members = vec![members[3].clone(), members[0].clone()];
        split[1].members = vec![members[2].clone(), members[1].clone()];

        let g = general(2, 2, 2);
        assert_eq!(
            compute_totals(&one, &g, None),
            compute_totals(&split, &g, None)
        );
    }

    #[test]
    fn test_empty_roster() {
        let totals = compute_totals(&[], &general(1, 0, 0), None);
        assert_eq!(totals.kills, 1);
        assert_eq!(totals.deaths, 0);
        assert_eq!(totals.missions, 0);
    }
}
