// Read-side projections of league documents.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::{require_admin, Engine};
use crate::error::{EngineError, EngineResult};
use crate::model::{League, TeamStandings, User};
use crate::provider::ScheduleProvider;
use crate::store::WriteBatch;

/// A league as one member is allowed to see it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueView {
    pub league: League,
    pub team_standings: Option<TeamStandings>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueSummary {
    pub id: String,
    pub name: String,
    pub league_avatar_url: Option<String>,
    pub creator: String,
    pub player_count: usize,
}

impl From<&League> for LeagueSummary {
    fn from(league: &League) -> Self {
        LeagueSummary {
            id: league.id.clone(),
            name: league.name.clone(),
            league_avatar_url: league.league_avatar_url.clone(),
            creator: league.creator.clone(),
            player_count: league.players.len(),
        }
    }
}

/// Hide other players' open-week bets, and their champion picks while the
/// first week has not kicked off.
pub fn redact_for(league: &mut League, viewer_id: &str, now: DateTime<Utc>) {
    let Some(season) = league.open_season_mut() else {
        return;
    };
    let Some(week) = season.open_week_mut() else {
        return;
    };
    for game in week.games.iter_mut() {
        game.bets.retain(|b| b.player_id == viewer_id);
    }
    let before_first_kickoff = week.number == 1 && week.first_kickoff().is_some_and(|k| now < k);
    if before_first_kickoff {
        season.final_winner.retain(|player_id, _| player_id == viewer_id);
    }
}

impl<P: ScheduleProvider> Engine<P> {
    pub fn league_view(&self, viewer_id: &str, league_id: &str, now: DateTime<Utc>) -> EngineResult<LeagueView> {
        let mut league = self.load_league(league_id)?;
        if !league.is_member(viewer_id) {
            return Err(EngineError::not_authorized("view a league they do not belong to"));
        }
        redact_for(&mut league, viewer_id, now);

        let team_standings = match league.open_season() {
            Some(season) => self
                .db
                .load_team_standings(season.year)
                .map_err(EngineError::persistence)?,
            None => None,
        };
        Ok(LeagueView {
            league,
            team_standings,
        })
    }

    pub fn league_summaries(&self, league_ids: &[String]) -> EngineResult<Vec<LeagueSummary>> {
        let leagues = self.db.get_leagues(league_ids).map_err(EngineError::persistence)?;
        Ok(leagues.iter().map(LeagueSummary::from).collect())
    }

    /// Fetch and cache NFL standings for `year`.
    pub async fn refresh_team_standings(&self, actor: &User, year: i32) -> EngineResult<TeamStandings> {
        require_admin(actor, "refresh team standings")?;
        let request = self.provider.team_standings(year);
        let standings = match tokio::time::timeout(self.fetch_timeout, request).await {
            Ok(Ok(Some(standings))) => standings,
            Ok(Ok(None)) => return Err(EngineError::NoScheduleData),
            Ok(Err(e)) => {
                warn!("Standings fetch for {year} failed: {e}");
                return Err(EngineError::NoScheduleData);
            }
            Err(_) => {
                warn!("Standings fetch for {year} timed out");
                return Err(EngineError::NoScheduleData);
            }
        };

        self.commit(&WriteBatch {
            team_standings: Some(standings.clone()),
            ..WriteBatch::default()
        })?;
        info!("Cached standings for {year}: {} teams", standings.teams.len());
        Ok(standings)
    }
}
