// Materializes a fetched schedule week inside a league's season.

use tracing::{debug, warn};

use crate::model::{Bet, Game, GameStatus, League, Player, Week};
use crate::provider::{ScheduledGame, WeekSchedule};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    /// A new open week was appended.
    Built,
    /// The season already has a week with this id.
    AlreadyPresent,
    /// The league has no season for the schedule's year.
    SeasonMissing,
}

fn open_game(fetched: &ScheduledGame, roster: &[Player]) -> Game {
    Game {
        game_id: fetched.id.clone(),
        home: fetched.home.clone(),
        away: fetched.away.clone(),
        status: GameStatus::Scheduled,
        home_score: None,
        away_score: None,
        start_time: fetched.scheduled,
        is_open: true,
        winner: None,
        winner_team_alias: None,
        winner_value: None,
        bets: roster.iter().map(|p| Bet::unplaced(&p.id, &p.name)).collect(),
    }
}

/// Append the fetched week to the league's season for that year, with one
/// unplaced bet per current player on every game.
pub fn build_week(league: &mut League, schedule: &WeekSchedule) -> BuildOutcome {
    let roster = league.players.clone();
    let league_id = league.id.clone();
    let Some(season) = league.season_mut(schedule.year) else {
        warn!(
            "League {league_id} has no season for {}, skipping week {}",
            schedule.year, schedule.week.id
        );
        return BuildOutcome::SeasonMissing;
    };

    if season.week(&schedule.week.id).is_some() {
        debug!("League {league_id} already has week {}", schedule.week.id);
        return BuildOutcome::AlreadyPresent;
    }

    let week = Week {
        week_id: schedule.week.id.clone(),
        number: schedule.phase.week_number(schedule.week.sequence),
        is_open: true,
        games: schedule
            .week
            .games
            .iter()
            .map(|g| open_game(g, &roster))
            .collect(),
    };
    debug!(
        "League {league_id}: built week {} ({} games)",
        week.number,
        week.games.len()
    );
    season.weeks.push(week);
    BuildOutcome::Built
}

/// Build the week for every league. Leagues without a matching season are
/// skipped and do not block the others.
pub(crate) fn build_all(leagues: &mut [League], schedule: &WeekSchedule) -> usize {
    leagues
        .iter_mut()
        .map(|league| build_week(league, schedule))
        .filter(|outcome| *outcome == BuildOutcome::Built)
        .count()
}
