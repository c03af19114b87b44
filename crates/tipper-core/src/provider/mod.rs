// Schedule/result provider seam.
//
// The engine only talks to `ScheduleProvider`; the Sportradar client is the
// production implementation and tests script their own.

pub mod sportradar;
mod wire;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{GameStatus, Phase, Team, TeamStandings, Tracker};

pub use sportradar::SportradarClient;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("network error for {url}: {source}")]
    Network {
        url: String,
        source: reqwest::Error,
    },

    #[error("provider returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        source: reqwest::Error,
    },
}

/// One game as reported by the feed, before or after it is played.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledGame {
    pub id: String,
    pub home: Team,
    pub away: Team,
    pub scheduled: DateTime<Utc>,
    pub status: GameStatus,
    pub home_points: Option<u32>,
    pub away_points: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleWeek {
    pub id: String,
    /// Position within the phase (1..=18 regular, 1..=4 postseason).
    pub sequence: u8,
    pub games: Vec<ScheduledGame>,
}

/// Schedule and results for one `{year, phase, week}`.
#[derive(Debug, Clone, PartialEq)]
pub struct WeekSchedule {
    pub year: i32,
    pub phase: Phase,
    pub week: ScheduleWeek,
}

impl WeekSchedule {
    /// True when the schedule is the championship week.
    pub fn is_championship(&self) -> bool {
        Tracker {
            year: self.year,
            phase: self.phase,
            week: self.week.sequence,
        }
        .is_championship()
    }

    /// True when every game in the feed has reached a final status.
    pub fn all_final(&self) -> bool {
        self.week.games.iter().all(|g| g.status.is_final())
    }
}

/// External schedule/result source.
///
/// `Ok(None)` means the provider has nothing for the request (unknown week,
/// season not published). Transport and decode failures are errors.
#[async_trait]
pub trait ScheduleProvider: Send + Sync {
    async fn week_schedule(
        &self,
        year: i32,
        phase: Phase,
        week: u8,
    ) -> Result<Option<WeekSchedule>, ProviderError>;

    /// NFL standings for a season year. Display data only.
    async fn team_standings(&self, year: i32) -> Result<Option<TeamStandings>, ProviderError>;
}
