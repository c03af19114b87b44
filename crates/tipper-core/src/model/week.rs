// Weeks, games and the per-player bets attached to each game.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::bucket::{Bucket, Side};

/// Game lifecycle status, shared by the schedule feed and stored games.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameStatus {
    #[serde(rename = "scheduled")]
    Scheduled,
    #[serde(rename = "created")]
    Created,
    #[serde(rename = "inprogress")]
    InProgress,
    #[serde(rename = "halftime")]
    Halftime,
    #[serde(rename = "complete")]
    Complete,
    #[serde(rename = "closed")]
    Closed,
    #[serde(rename = "postponed")]
    Postponed,
    #[serde(rename = "time-tbd")]
    TimeTbd,
}

impl GameStatus {
    /// Feed statuses that make a game eligible for settlement.
    pub fn is_final(&self) -> bool {
        matches!(self, GameStatus::Closed | GameStatus::Postponed)
    }
}

/// Which side won a settled game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    Home,
    Away,
    Tie,
}

impl From<Option<Side>> for Winner {
    fn from(side: Option<Side>) -> Self {
        match side {
            Some(Side::Home) => Winner::Home,
            Some(Side::Away) => Winner::Away,
            None => Winner::Tie,
        }
    }
}

/// Team identity as carried by the schedule feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub name: String,
    pub alias: String,
}

/// One player's pick for one game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bet {
    pub player_id: String,
    /// Display name, denormalized from the roster.
    pub name: String,
    pub pick: Option<Bucket>,
}

impl Bet {
    pub fn unplaced(player_id: &str, name: &str) -> Self {
        Bet {
            player_id: player_id.to_string(),
            name: name.to_string(),
            pick: None,
        }
    }
}

/// A single real-world game with its betting window and settlement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub game_id: String,
    pub home: Team,
    pub away: Team,
    pub status: GameStatus,
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
    pub start_time: DateTime<Utc>,
    pub is_open: bool,
    pub winner: Option<Winner>,
    pub winner_team_alias: Option<String>,
    pub winner_value: Option<Bucket>,
    pub bets: Vec<Bet>,
}

impl Game {
    pub fn bet(&self, player_id: &str) -> Option<&Bet> {
        self.bets.iter().find(|b| b.player_id == player_id)
    }

    pub fn bet_mut(&mut self, player_id: &str) -> Option<&mut Bet> {
        self.bets.iter_mut().find(|b| b.player_id == player_id)
    }

    /// The betting window is open strictly before kickoff.
    pub fn accepts_wagers_at(&self, now: DateTime<Utc>) -> bool {
        now < self.start_time
    }
}

/// One scheduling round within a season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Week {
    /// Week id assigned by the schedule provider.
    pub week_id: String,
    /// 1..=18 regular season, 19..=22 postseason.
    pub number: u8,
    pub is_open: bool,
    pub games: Vec<Game>,
}

impl Week {
    pub fn game(&self, game_id: &str) -> Option<&Game> {
        self.games.iter().find(|g| g.game_id == game_id)
    }

    pub fn game_mut(&mut self, game_id: &str) -> Option<&mut Game> {
        self.games.iter_mut().find(|g| g.game_id == game_id)
    }

    pub fn has_open_games(&self) -> bool {
        self.games.iter().any(|g| g.is_open)
    }

    /// Kickoff of the earliest game, if the week has any games.
    pub fn first_kickoff(&self) -> Option<DateTime<Utc>> {
        self.games.iter().map(|g| g.start_time).min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn game_status_uses_feed_vocabulary() {
        let parsed: Vec<GameStatus> =
            serde_json::from_str(r#"["scheduled","inprogress","halftime","closed","postponed","time-tbd"]"#)
                .unwrap();
        assert_eq!(
            parsed,
            vec![
                GameStatus::Scheduled,
                GameStatus::InProgress,
                GameStatus::Halftime,
                GameStatus::Closed,
                GameStatus::Postponed,
                GameStatus::TimeTbd,
            ]
        );
        assert!(GameStatus::Closed.is_final());
        assert!(GameStatus::Postponed.is_final());
        assert!(!GameStatus::Complete.is_final());
        assert!(!GameStatus::Halftime.is_final());
    }

    #[test]
    fn wager_window_closes_at_kickoff() {
        let kickoff = Utc.with_ymd_and_hms(2024, 9, 8, 17, 0, 0).unwrap();
        let game = Game {
            game_id: "g1".into(),
            home: Team { name: "Chiefs".into(), alias: "KC".into() },
            away: Team { name: "Ravens".into(), alias: "BAL".into() },
            status: GameStatus::Scheduled,
            home_score: None,
            away_score: None,
            start_time: kickoff,
            is_open: true,
            winner: None,
            winner_team_alias: None,
            winner_value: None,
            bets: vec![],
        };
        assert!(game.accepts_wagers_at(kickoff - chrono::Duration::seconds(1)));
        assert!(!game.accepts_wagers_at(kickoff));
        assert!(!game.accepts_wagers_at(kickoff + chrono::Duration::minutes(5)));
    }
}
