//! Squad, member and General models matching the stored roster document.

use serde::{Deserialize, Serialize};

use crate::color;

/// Fixed rank ladder. Wire labels are the ones stored in existing documents.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Rank {
    #[serde(rename = " - ")]
    Unranked,
    #[serde(rename = "Cadete")]
    Cadet,
    #[serde(rename = "Cabo")]
    Corporal,
    #[serde(rename = "Cabo Primero")]
    FirstCorporal,
    #[serde(rename = "Sargento")]
    Sergeant,
    #[serde(rename = "Teniente")]
    Lieutenant,
    #[serde(rename = "Teniente Primero")]
    FirstLieutenant,
    #[serde(rename = "Coronel")]
    Colonel,
}

impl Rank {
    pub const ALL: [Rank; 8] = [
        Rank::Unranked,
        Rank::Cadet,
        Rank::Corporal,
        Rank::FirstCorporal,
        Rank::Sergeant,
        Rank::Lieutenant,
        Rank::FirstLieutenant,
        Rank::Colonel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Rank::Unranked => " - ",
            Rank::Cadet => "Cadete",
            Rank::Corporal => "Cabo",
            Rank::FirstCorporal => "Cabo Primero",
            Rank::Sergeant => "Sargento",
            Rank::Lieutenant => "Teniente",
            Rank::FirstLieutenant => "Teniente Primero",
            Rank::Colonel => "Coronel",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|rank| rank.as_str() == s)
    }

    /// Ranks a regular squad member may hold (everything but Colonel).
    pub fn member_ranks() -> impl Iterator<Item = Rank> {
        Self::ALL.into_iter().filter(|rank| *rank != Rank::Colonel)
    }
}

fn colonel_rank() -> Rank {
    Rank::Colonel
}

/// A squad member with combat statistics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub name: String,
    pub rank: Rank,
    #[serde(default)]
    pub kills: u32,
    #[serde(default)]
    pub deaths: u32,
    #[serde(default)]
    pub missions: u32,
}

impl Member {
    pub fn recruit(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rank: Rank::Corporal,
            kills: 0,
            deaths: 0,
            missions: 0,
        }
    }
}

/// A squad led by a colonel.
///
/// `text_color` is always derived from `color`, except when the color comes
/// from the fixed palette, which carries its own paired text color.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Squad {
    pub name: String,
    pub color: String,
    pub text_color: String,
    pub colonel: String,
    #[serde(default = "colonel_rank")]
    pub colonel_rank: Rank,
    #[serde(default)]
    pub members: Vec<Member>,
}

impl Squad {
    /// Apply a free-form hex color, recomputing the text color.
    pub fn set_color(&mut self, hex: &str) {
        self.color = hex.to_string();
        self.text_color = color::contrast_of(hex);
    }

    /// Apply a palette entry together with its paired text color.
    pub fn set_palette_color(&mut self, entry: &color::PaletteColor) {
        self.color = entry.value.to_string();
        self.text_color = entry.text_color.to_string();
    }
}

/// Statistics for the General, who sits outside the squad hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GeneralStats {
    pub name: String,
    #[serde(default)]
    pub kills: u32,
    #[serde(default)]
    pub deaths: u32,
    #[serde(default)]
    pub missions: u32,
}

impl Default for GeneralStats {
    fn default() -> Self {
        Self {
            name: "General".to_string(),
            kills: 0,
            deaths: 0,
            missions: 0,
        }
    }
}

/// Editable numeric statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stat {
    Kills,
    Deaths,
    Missions,
}

impl Member {
    pub fn set_stat(&mut self, stat: Stat, value: u32) {
        match stat {
            Stat::Kills => self.kills = value,
            Stat::Deaths => self.deaths = value,
            Stat::Missions => self.missions = value,
        }
    }
}

impl GeneralStats {
    pub fn set_stat(&mut self, stat: Stat, value: u32) {
        match stat {
            Stat::Kills => self.kills = value,
            Stat::Deaths => self.deaths = value,
            Stat::Missions => self.missions = value,
        }
    }
}

/// The seed squad used when neither the remote store nor the cache has data.
pub fn default_squads() -> Vec<Squad> {
    let blue = &color::PALETTE[0];
    vec![Squad {
        name: "Alpha Squad".to_string(),
        color: blue.value.to_string(),
        text_color: color::contrast_of(blue.value),
        colonel: "Colonel Rodriguez".to_string(),
        colonel_rank: Rank::Colonel,
        members: vec![
            seeded("Soldier Perez", Rank::Corporal, 12, 2, 15),
            seeded("Soldier Gomez", Rank::FirstCorporal, 8, 3, 12),
            seeded("Soldier Lopez", Rank::Sergeant, 15, 1, 18),
            seeded("Soldier Martinez", Rank::Lieutenant, 5, 4, 10),
        ],
    }]
}

fn seeded(name: &str, rank: Rank, kills: u32, deaths: u32, missions: u32) -> Member {
    Member {
        name: name.to_string(),
        rank,
        kills,
        deaths,
        missions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_wire_labels() {
        let json = serde_json::to_string(&Rank::FirstCorporal).unwrap();
        assert_eq!(json, "\"Cabo Primero\"");
        let rank: Rank = serde_json::from_str("\" - \"").unwrap();
        assert_eq!(rank, Rank::Unranked);
        assert_eq!(Rank::from_label("Coronel"), Some(Rank::Colonel));
        assert_eq!(Rank::from_label("Captain"), None);
    }

    #[test]
    fn test_member_ranks_exclude_colonel() {
        let ranks: Vec<Rank> = Rank::member_ranks().collect();
        assert_eq!(ranks.len(), 7);
        assert!(!ranks.contains(&Rank::Colonel));
    }

    #[test]
    fn test_squad_colonel_rank_defaults() {
        let squad: Squad = serde_json::from_value(serde_json::json!({
            "name": "Bravo",
            "color": "#e74c3c",
            "textColor": "#ffffff",
            "colonel": "Colonel Vega"
        }))
        .unwrap();
        assert_eq!(squad.colonel_rank, Rank::Colonel);
        assert!(squad.members.is_empty());
    }

    #[test]
    fn test_set_color_recomputes_text_color() {
        let mut squad = default_squads().remove(0);
        squad.set_color("#f1c40f");
        assert_eq!(squad.text_color, "#000000");
        squad.set_color("#2c3e50");
        assert_eq!(squad.text_color, "#ffffff");
    }

    #[test]
    fn test_default_seed() {
        let squads = default_squads();
        assert_eq!(squads.len(), 1);
        assert_eq!(squads[0].members.len(), 4);
        assert_eq!(squads[0].color, "#3498db");
        // The seed derives its text color rather than taking the palette pairing.
        assert_eq!(squads[0].text_color, "#000000");
    }
}
