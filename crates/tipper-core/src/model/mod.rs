// Domain model: league documents, the tracker and auxiliary aggregates.

pub mod bucket;
pub mod league;
pub mod tracker;
pub mod user;
pub mod week;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use bucket::{score_pick, Bucket, Margin, Side};
pub use league::{League, Player, Season, Standing};
pub use tracker::{Phase, Tracker};
pub use user::{LeagueRef, User};
pub use week::{Bet, Game, GameStatus, Team, Week, Winner};

/// Win/loss/tie record of one NFL team.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRecord {
    pub win: u32,
    pub loss: u32,
    pub tie: u32,
}

/// NFL standings for a season year, keyed by team alias. Display data only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamStandings {
    pub year: i32,
    pub teams: BTreeMap<String, TeamRecord>,
}
