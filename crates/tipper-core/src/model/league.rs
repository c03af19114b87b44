// League aggregate: roster, invitations and seasons.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::user::User;
use super::week::Week;

/// Offset between a calendar year and the NFL season number (2024 -> 105).
pub const SEASON_NUMBER_OFFSET: i32 = 1919;

/// Offset between a calendar year and the Super Bowl it ends with (2024 -> 59).
pub const SUPER_BOWL_OFFSET: i32 = 1965;

/// League membership record, denormalized from the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub avatar: Option<String>,
}

impl From<&User> for Player {
    fn from(user: &User) -> Self {
        Player {
            id: user.id.clone(),
            name: user.username.clone(),
            avatar: user.avatar_url.clone(),
        }
    }
}

/// A player's accumulated score in one season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Standing {
    pub player_id: String,
    pub name: String,
    pub score: u32,
}

/// One year's competition inside a league.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Season {
    pub year: i32,
    pub number_of_season: i32,
    pub number_of_super_bowl: i32,
    pub is_open: bool,
    pub weeks: Vec<Week>,
    pub standings: Vec<Standing>,
    /// Player id -> predicted champion alias.
    pub final_winner: BTreeMap<String, Option<String>>,
}

impl Season {
    /// Open a season for `year` with a zeroed standing and an empty champion
    /// pick for every player on the roster.
    pub fn open(year: i32, roster: &[Player]) -> Self {
        Season {
            year,
            number_of_season: year - SEASON_NUMBER_OFFSET,
            number_of_super_bowl: year - SUPER_BOWL_OFFSET,
            is_open: true,
            weeks: Vec::new(),
            standings: roster
                .iter()
                .map(|p| Standing {
                    player_id: p.id.clone(),
                    name: p.name.clone(),
                    score: 0,
                })
                .collect(),
            final_winner: roster.iter().map(|p| (p.id.clone(), None)).collect(),
        }
    }

    pub fn week(&self, week_id: &str) -> Option<&Week> {
        self.weeks.iter().find(|w| w.week_id == week_id)
    }

    pub fn week_mut(&mut self, week_id: &str) -> Option<&mut Week> {
        self.weeks.iter_mut().find(|w| w.week_id == week_id)
    }

    pub fn open_week(&self) -> Option<&Week> {
        self.weeks.iter().find(|w| w.is_open)
    }

    pub fn open_week_mut(&mut self) -> Option<&mut Week> {
        self.weeks.iter_mut().find(|w| w.is_open)
    }

    pub fn standing_mut(&mut self, player_id: &str) -> Option<&mut Standing> {
        self.standings.iter_mut().find(|s| s.player_id == player_id)
    }

    pub fn standing(&self, player_id: &str) -> Option<&Standing> {
        self.standings.iter().find(|s| s.player_id == player_id)
    }
}

/// The unit of persistence: everything a league owns lives in this document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct League {
    pub id: String,
    pub name: String,
    /// User id of the creator, the only player allowed to invite.
    pub creator: String,
    pub league_avatar_url: Option<String>,
    pub players: Vec<Player>,
    /// User ids with a pending invitation.
    pub invitations: Vec<String>,
    pub seasons: Vec<Season>,
}

impl League {
    /// A league whose only player is the creator, with an open season for
    /// `year` and no weeks yet.
    pub fn new(creator: &User, name: &str, avatar: Option<String>, year: i32) -> Self {
        let players = vec![Player::from(creator)];
        let season = Season::open(year, &players);
        League {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            creator: creator.id.clone(),
            league_avatar_url: avatar,
            players,
            invitations: Vec::new(),
            seasons: vec![season],
        }
    }

    pub fn is_member(&self, player_id: &str) -> bool {
        self.players.iter().any(|p| p.id == player_id)
    }

    pub fn is_invited(&self, player_id: &str) -> bool {
        self.invitations.iter().any(|id| id == player_id)
    }

    pub fn player_mut(&mut self, player_id: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == player_id)
    }

    pub fn open_season(&self) -> Option<&Season> {
        self.seasons.iter().find(|s| s.is_open)
    }

    pub fn open_season_mut(&mut self) -> Option<&mut Season> {
        self.seasons.iter_mut().find(|s| s.is_open)
    }

    pub fn season(&self, year: i32) -> Option<&Season> {
        self.seasons.iter().find(|s| s.year == year)
    }

    pub fn season_mut(&mut self, year: i32) -> Option<&mut Season> {
        self.seasons.iter_mut().find(|s| s.year == year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creator() -> User {
        User::new("u1", "alice", "alice@example.com")
    }

    #[test]
    fn new_league_has_creator_as_only_player() {
        let league = League::new(&creator(), "Sunday Club", None, 2024);
        assert_eq!(league.creator, "u1");
        assert_eq!(league.players.len(), 1);
        assert_eq!(league.players[0].name, "alice");
        assert!(league.invitations.is_empty());
        assert!(!league.id.is_empty());
    }

    #[test]
    fn new_season_numbers_derive_from_year() {
        let league = League::new(&creator(), "Sunday Club", None, 2024);
        let season = league.open_season().unwrap();
        assert_eq!(season.year, 2024);
        assert_eq!(season.number_of_season, 105);
        assert_eq!(season.number_of_super_bowl, 59);
        assert!(season.weeks.is_empty());
        assert_eq!(season.standings.len(), 1);
        assert_eq!(season.standings[0].score, 0);
        assert_eq!(season.final_winner.get("u1"), Some(&None));
    }

    #[test]
    fn league_round_trips_through_json() {
        let league = League::new(&creator(), "Sunday Club", Some("a.png".into()), 2024);
        let json = serde_json::to_string(&league).unwrap();
        assert!(json.contains("\"leagueAvatarUrl\":\"a.png\""));
        assert!(json.contains("\"finalWinner\":{\"u1\":null}"));
        let back: League = serde_json::from_str(&json).unwrap();
        assert_eq!(back, league);
    }
}
