// Wager placement gate and champion picks.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info};

use super::Engine;
use crate::error::{EngineError, EngineResult};
use crate::model::{Bucket, League};
use crate::provider::ScheduleProvider;
use crate::store::WriteBatch;

/// One `(game, bucket code)` pair from a wager submission.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pick {
    pub game_id: String,
    pub bucket: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WagerTarget {
    League(String),
    /// Every league the player belongs to.
    AllLeagues,
}

#[derive(Debug, Clone)]
pub struct WagerSlip {
    pub player_id: String,
    pub target: WagerTarget,
    pub year: i32,
    pub week_id: String,
    pub picks: Vec<Pick>,
}

/// Counts across all targeted leagues.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WagerReceipt {
    pub leagues: usize,
    pub accepted: usize,
    /// Picks dropped for a closed window, an unknown code or an unknown game.
    pub ignored: usize,
}

/// Write the player's picks into one league's week. Picks for games that have
/// kicked off, unknown games and unrecognized codes are dropped.
pub(crate) fn apply_picks(
    league: &mut League,
    player_id: &str,
    year: i32,
    week_id: &str,
    picks: &[Pick],
    now: DateTime<Utc>,
) -> EngineResult<WagerReceipt> {
    let league_id = league.id.clone();
    let week = league
        .season_mut(year)
        .ok_or_else(|| EngineError::SeasonNotFound {
            league_id: league_id.clone(),
            year,
        })?
        .week_mut(week_id)
        .ok_or_else(|| EngineError::WeekNotFound {
            league_id: league_id.clone(),
            week_id: week_id.to_string(),
        })?;

    let mut receipt = WagerReceipt {
        leagues: 1,
        ..WagerReceipt::default()
    };
    for pick in picks {
        let Some(bucket) = Bucket::from_code(&pick.bucket) else {
            debug!("Ignoring unknown bucket code {:?}", pick.bucket);
            receipt.ignored += 1;
            continue;
        };
        let bet = week
            .game_mut(&pick.game_id)
            .filter(|g| g.accepts_wagers_at(now))
            .and_then(|g| g.bet_mut(player_id));
        match bet {
            Some(bet) => {
                bet.pick = Some(bucket);
                receipt.accepted += 1;
            }
            None => {
                debug!(
                    "League {league_id}: ignoring late or unknown pick on game {}",
                    pick.game_id
                );
                receipt.ignored += 1;
            }
        }
    }
    Ok(receipt)
}

impl<P: ScheduleProvider> Engine<P> {
    /// Apply a wager slip to every targeted league and write them together.
    pub fn place_wagers(&self, slip: &WagerSlip, now: DateTime<Utc>) -> EngineResult<WagerReceipt> {
        let user = self.load_user(&slip.player_id)?;
        let league_ids: Vec<String> = match &slip.target {
            WagerTarget::League(id) => vec![id.clone()],
            WagerTarget::AllLeagues => user.leagues.iter().map(|r| r.league_id.clone()).collect(),
        };

        let mut leagues = Vec::with_capacity(league_ids.len());
        let mut total = WagerReceipt::default();
        for league_id in &league_ids {
            let mut league = self.load_league(league_id)?;
            if !league.is_member(&user.id) {
                return Err(EngineError::not_authorized("place wagers in a league they do not belong to"));
            }
            let receipt = apply_picks(&mut league, &user.id, slip.year, &slip.week_id, &slip.picks, now)?;
            total.leagues += receipt.leagues;
            total.accepted += receipt.accepted;
            total.ignored += receipt.ignored;
            if receipt.accepted > 0 {
                leagues.push(league);
            }
        }

        let batch = WriteBatch {
            leagues,
            ..WriteBatch::default()
        };
        if !batch.is_empty() {
            self.commit(&batch)?;
        }
        info!(
            "Player {} wagers for week {}: {} accepted, {} ignored across {} leagues",
            user.id, slip.week_id, total.accepted, total.ignored, total.leagues
        );
        Ok(total)
    }

    /// Record the player's champion pick for the open season. Only accepted
    /// while week 1 is open and has not kicked off; returns whether the pick
    /// was stored.
    pub fn set_final_winner(
        &self,
        player_id: &str,
        league_id: &str,
        team_alias: &str,
        now: DateTime<Utc>,
    ) -> EngineResult<bool> {
        let mut league = self.load_league(league_id)?;
        if !league.is_member(player_id) {
            return Err(EngineError::not_authorized("pick a champion in a league they do not belong to"));
        }
        let season = league.open_season_mut().ok_or_else(|| EngineError::NoOpenSeason {
            league_id: league_id.to_string(),
        })?;

        let window_open = season
            .weeks
            .iter()
            .find(|w| w.number == 1)
            .is_some_and(|w| w.is_open && w.first_kickoff().is_some_and(|k| now < k));
        if !window_open {
            debug!("League {league_id}: champion pick from {player_id} after the window closed");
            return Ok(false);
        }

        season
            .final_winner
            .insert(player_id.to_string(), Some(team_alias.to_string()));
        self.commit(&WriteBatch {
            leagues: vec![league],
            ..WriteBatch::default()
        })?;
        info!("League {league_id}: {player_id} picked {team_alias} as champion");
        Ok(true)
    }
}
