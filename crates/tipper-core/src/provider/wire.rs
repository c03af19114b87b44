// Sportradar wire types and their mapping into provider types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use super::{ScheduleWeek, ScheduledGame, WeekSchedule};
use crate::model::{GameStatus, Phase, Team, TeamRecord, TeamStandings};

#[derive(Debug, Deserialize)]
pub(crate) struct ScheduleResponse {
    pub year: i32,
    #[serde(rename = "type")]
    pub season_type: String,
    pub week: Option<WeekPayload>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WeekPayload {
    pub id: String,
    pub sequence: u8,
    #[serde(default)]
    pub games: Vec<GamePayload>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GamePayload {
    pub id: String,
    pub status: String,
    pub scheduled: DateTime<Utc>,
    pub home: TeamPayload,
    pub away: TeamPayload,
    pub scoring: Option<ScoringPayload>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TeamPayload {
    pub name: String,
    pub alias: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScoringPayload {
    pub home_points: Option<u32>,
    pub away_points: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StandingsResponse {
    #[serde(default)]
    pub conferences: Vec<ConferencePayload>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConferencePayload {
    #[serde(default)]
    pub divisions: Vec<DivisionPayload>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DivisionPayload {
    #[serde(default)]
    pub teams: Vec<StandingTeamPayload>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StandingTeamPayload {
    pub alias: String,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
    #[serde(default)]
    pub ties: u32,
}

fn map_status(raw: &str) -> GameStatus {
    match raw {
        "scheduled" => GameStatus::Scheduled,
        "created" => GameStatus::Created,
        "inprogress" => GameStatus::InProgress,
        "halftime" => GameStatus::Halftime,
        "complete" => GameStatus::Complete,
        "closed" => GameStatus::Closed,
        "postponed" => GameStatus::Postponed,
        "time-tbd" => GameStatus::TimeTbd,
        other => {
            debug!(status = other, "unrecognized feed status, treating as scheduled");
            GameStatus::Scheduled
        }
    }
}

impl From<TeamPayload> for Team {
    fn from(t: TeamPayload) -> Self {
        Team {
            name: t.name,
            alias: t.alias,
        }
    }
}

/// Map a schedule response; `None` when the response carries no week, an
/// unknown season type or a week sequence outside that phase.
pub(crate) fn map_schedule(raw: ScheduleResponse) -> Option<WeekSchedule> {
    let phase = Phase::from_path(&raw.season_type)?;
    let week = raw.week?;
    if !phase.has_week(week.sequence) {
        debug!(sequence = week.sequence, phase = phase.as_path(), "week sequence out of range");
        return None;
    }
    let games = week
        .games
        .into_iter()
        .map(|g| {
            let (home_points, away_points) = g
                .scoring
                .map(|s| (s.home_points, s.away_points))
                .unwrap_or((None, None));
            ScheduledGame {
                id: g.id,
                status: map_status(&g.status),
                scheduled: g.scheduled,
                home: g.home.into(),
                away: g.away.into(),
                home_points,
                away_points,
            }
        })
        .collect();
    Some(WeekSchedule {
        year: raw.year,
        phase,
        week: ScheduleWeek {
            id: week.id,
            sequence: week.sequence,
            games,
        },
    })
}

pub(crate) fn map_standings(year: i32, raw: StandingsResponse) -> Option<TeamStandings> {
    let teams: BTreeMap<String, TeamRecord> = raw
        .conferences
        .into_iter()
        .flat_map(|c| c.divisions)
        .flat_map(|d| d.teams)
        .map(|t| {
            (
                t.alias,
                TeamRecord {
                    win: t.wins,
                    loss: t.losses,
                    tie: t.ties,
                },
            )
        })
        .collect();
    if teams.is_empty() {
        return None;
    }
    Some(TeamStandings { year, teams })
}
