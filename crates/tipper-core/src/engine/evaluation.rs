// Settles finished games, scores bets and decides whether the cycle advances
// the tracker.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use super::builder::build_all;
use super::{require_admin, Engine};
use crate::error::{EngineError, EngineResult};
use crate::model::{score_pick, Bucket, Game, League, Side, Tracker, User, Winner};
use crate::provider::{ScheduleProvider, ScheduledGame, WeekSchedule};
use crate::store::WriteBatch;

/// Bonus for correctly predicting the champion.
pub const CHAMPION_BONUS: u32 = 30;

/// How an evaluation cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Scores persisted, some games still pending. Tracker unchanged.
    WeekPending,
    /// Championship week closed. Tracker unchanged until rollover.
    SeasonComplete,
    /// Week closed; the next week was built and the tracker moved here.
    Advanced { tracker: Tracker },
}

/// Result of one evaluation pass over one league's week.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeekEvaluation {
    pub settled_games: usize,
    /// Points earned this pass, per player id.
    pub points: BTreeMap<String, u32>,
    /// No game in the week remains open.
    pub week_closed: bool,
    /// The week was open before this pass and is closed after it.
    pub just_closed: bool,
    pub champion: Option<String>,
    /// Players who received the champion bonus.
    pub bonus_awarded: Vec<String>,
}

/// Settle a local game from its final feed record. Returns the outcome
/// bucket, or `None` when the feed carries no final score (postponed).
fn settle_game(game: &mut Game, fetched: &ScheduledGame) -> Option<Bucket> {
    game.status = fetched.status;
    game.home_score = fetched.home_points;
    game.away_score = fetched.away_points;
    game.is_open = false;

    let (Some(home), Some(away)) = (fetched.home_points, fetched.away_points) else {
        debug!("Game {} closed without a final score", game.game_id);
        return None;
    };

    let outcome = Bucket::from_scores(home, away);
    game.winner = Some(Winner::from(outcome.side()));
    game.winner_team_alias = match outcome.side() {
        Some(Side::Home) => Some(game.home.alias.clone()),
        Some(Side::Away) => Some(game.away.alias.clone()),
        None => None,
    };
    game.winner_value = Some(outcome);
    Some(outcome)
}

/// Apply one fetched result set to a league.
///
/// Only games that are final upstream and still open locally are settled,
/// so evaluating the same results again changes nothing.
pub fn evaluate_league(league: &mut League, schedule: &WeekSchedule) -> EngineResult<WeekEvaluation> {
    let league_id = league.id.clone();
    let season = league
        .season_mut(schedule.year)
        .ok_or_else(|| EngineError::SeasonNotFound {
            league_id: league_id.clone(),
            year: schedule.year,
        })?;

    let mut eval = WeekEvaluation::default();
    {
        let week = season
            .week_mut(&schedule.week.id)
            .ok_or_else(|| EngineError::WeekNotFound {
                league_id: league_id.clone(),
                week_id: schedule.week.id.clone(),
            })?;
        let was_open = week.is_open;

        for fetched in &schedule.week.games {
            if !fetched.status.is_final() {
                continue;
            }
            let Some(game) = week.game_mut(&fetched.id) else {
                debug!("League {league_id}: feed game {} not in week", fetched.id);
                continue;
            };
            if !game.is_open {
                continue;
            }
            eval.settled_games += 1;
            let Some(outcome) = settle_game(game, fetched) else {
                continue;
            };
            for bet in &game.bets {
                *eval.points.entry(bet.player_id.clone()).or_default() +=
                    score_pick(bet.pick, outcome);
            }
        }

        eval.week_closed = !week.has_open_games();
        if eval.week_closed {
            week.is_open = false;
        }
        eval.just_closed = was_open && eval.week_closed;

        if eval.just_closed && schedule.is_championship() {
            eval.champion = week.games.iter().find_map(|g| g.winner_team_alias.clone());
        }
    }

    for (player_id, points) in &eval.points {
        match season.standing_mut(player_id) {
            Some(standing) => standing.score += points,
            None => warn!("League {league_id}: no standing for player {player_id}"),
        }
    }

    if let Some(champion) = &eval.champion {
        let winners: Vec<String> = season
            .final_winner
            .iter()
            .filter(|(_, pick)| pick.as_deref() == Some(champion.as_str()))
            .map(|(player_id, _)| player_id.clone())
            .collect();
        for player_id in &winners {
            if let Some(standing) = season.standing_mut(player_id) {
                standing.score += CHAMPION_BONUS;
            }
        }
        eval.bonus_awarded = winners;
    }

    Ok(eval)
}

impl<P: ScheduleProvider> Engine<P> {
    /// Run one evaluation cycle for the tracked week.
    ///
    /// All league updates, the backup snapshot and (when the week closed) the
    /// advanced tracker are committed in one batch. A league missing the
    /// tracked season or week aborts the cycle before anything is written.
    pub async fn evaluate(&self, actor: &User) -> EngineResult<CycleOutcome> {
        require_admin(actor, "run the evaluation cycle")?;
        let tracker = self.tracker()?;
        let schedule = self.fetch_schedule(tracker).await?;

        let mut leagues = self.all_leagues()?;
        let backup = leagues.clone();

        let mut evaluations = Vec::with_capacity(leagues.len());
        for league in leagues.iter_mut() {
            let eval = evaluate_league(league, &schedule)?;
            if let Some(champion) = &eval.champion {
                info!(
                    "League {}: champion {champion}, bonus to {} players",
                    league.id,
                    eval.bonus_awarded.len()
                );
            }
            evaluations.push(eval);
        }

        let settled: usize = evaluations.iter().map(|e| e.settled_games).sum();
        let week_closed = if evaluations.is_empty() {
            schedule.all_final()
        } else {
            evaluations.iter().all(|e| e.week_closed)
        };
        info!(
            "Evaluated {tracker}: {settled} games settled across {} leagues, week closed: {week_closed}",
            leagues.len()
        );

        let mut batch = WriteBatch {
            backup: Some(backup),
            ..WriteBatch::default()
        };

        if !week_closed {
            batch.leagues = leagues;
            self.commit(&batch)?;
            return Ok(CycleOutcome::WeekPending);
        }

        if tracker.is_championship() {
            batch.leagues = leagues;
            self.commit(&batch)?;
            info!("Season {} complete, awaiting rollover", tracker.year);
            return Ok(CycleOutcome::SeasonComplete);
        }

        let next = tracker.advanced();
        let next_schedule = match self.fetch_schedule(next).await {
            Ok(s) => s,
            Err(e) => {
                warn!("Week {tracker} closed but {next} is unavailable, saving scores only");
                batch.leagues = leagues;
                self.commit(&batch)?;
                return Err(e);
            }
        };

        let built = build_all(&mut leagues, &next_schedule);
        batch.leagues = leagues;
        batch.tracker = Some(next);
        self.commit(&batch)?;
        info!("Advanced tracker to {next}, built week for {built} leagues");
        Ok(CycleOutcome::Advanced { tracker: next })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::builder::build_week;
    use crate::engine::builder::tests::{fetched_game, schedule};
    use crate::model::{GameStatus, Phase, Player};

    fn league() -> League {
        let alice = User::new("u1", "alice", "alice@example.com");
        let mut league = League::new(&alice, "Sunday Club", None, 2024);
        let bob = Player { id: "u2".into(), name: "bob".into(), avatar: None };
        league.players.push(bob.clone());
        let season = league.open_season_mut().unwrap();
        season.standings.push(crate::model::Standing {
            player_id: bob.id.clone(),
            name: bob.name.clone(),
            score: 0,
        });
        season.final_winner.insert(bob.id, None);
        league
    }

    fn pick(league: &mut League, game_id: &str, player_id: &str, code: &str) {
        let week = league.open_season_mut().unwrap().open_week_mut().unwrap();
        week.game_mut(game_id).unwrap().bet_mut(player_id).unwrap().pick = Bucket::from_code(code);
    }

    fn finished(mut game: ScheduledGame, home: u32, away: u32) -> ScheduledGame {
        game.status = GameStatus::Closed;
        game.home_points = Some(home);
        game.away_points = Some(away);
        game
    }

    fn score(league: &League, player_id: &str) -> u32 {
        league.open_season().unwrap().standing(player_id).unwrap().score
    }

    #[test]
    fn settles_closed_games_and_scores_bets() {
        let mut league = league();
        let g1 = fetched_game("g1", "KC", "BAL");
        build_week(&mut league, &schedule(2024, Phase::Regular, 1, vec![g1.clone()]));
        pick(&mut league, "g1", "u1", "HOME_8_14");
        pick(&mut league, "g1", "u2", "HOME_4_7");

        let results = schedule(2024, Phase::Regular, 1, vec![finished(g1, 27, 17)]);
        let eval = evaluate_league(&mut league, &results).unwrap();

        assert_eq!(eval.settled_games, 1);
        assert!(eval.week_closed);
        assert!(eval.just_closed);
        assert_eq!(score(&league, "u1"), 4);
        assert_eq!(score(&league, "u2"), 1);

        let week = &league.open_season().unwrap().weeks[0];
        assert!(!week.is_open);
        let game = &week.games[0];
        assert!(!game.is_open);
        assert_eq!(game.winner, Some(Winner::Home));
        assert_eq!(game.winner_team_alias.as_deref(), Some("KC"));
        assert_eq!(game.winner_value, Bucket::from_code("HOME_8_14"));
        assert_eq!(game.home_score, Some(27));
    }

    #[test]
    fn re_evaluation_does_not_change_standings() {
        let mut league = league();
        let g1 = fetched_game("g1", "KC", "BAL");
        build_week(&mut league, &schedule(2024, Phase::Regular, 1, vec![g1.clone()]));
        pick(&mut league, "g1", "u1", "AWAY_0_3");

        let results = schedule(2024, Phase::Regular, 1, vec![finished(g1, 20, 21)]);
        evaluate_league(&mut league, &results).unwrap();
        let after_first = league.clone();
        let second = evaluate_league(&mut league, &results).unwrap();

        assert_eq!(second.settled_games, 0);
        assert!(second.week_closed);
        assert!(!second.just_closed);
        assert_eq!(league, after_first);
        assert_eq!(score(&league, "u1"), 4);
    }

    #[test]
    fn pending_games_keep_the_week_open() {
        let mut league = league();
        let g1 = fetched_game("g1", "KC", "BAL");
        let g2 = fetched_game("g2", "ATL", "PIT");
        build_week(&mut league, &schedule(2024, Phase::Regular, 1, vec![g1.clone(), g2.clone()]));
        pick(&mut league, "g1", "u1", "HOME_0_3");

        let mut halftime = g2;
        halftime.status = GameStatus::Halftime;
        halftime.home_points = Some(10);
        halftime.away_points = Some(3);
        let results = schedule(2024, Phase::Regular, 1, vec![finished(g1, 13, 13), halftime]);
        let eval = evaluate_league(&mut league, &results).unwrap();

        assert_eq!(eval.settled_games, 1);
        assert!(!eval.week_closed);
        assert_eq!(score(&league, "u1"), 4);
        let week = league.open_season().unwrap().open_week().unwrap();
        assert!(week.game("g2").unwrap().is_open);
        assert_eq!(week.game("g1").unwrap().winner, Some(Winner::Tie));
        assert_eq!(week.game("g1").unwrap().winner_team_alias, None);
    }

    #[test]
    fn postponed_game_without_score_closes_with_no_points() {
        let mut league = league();
        let g1 = fetched_game("g1", "KC", "BAL");
        build_week(&mut league, &schedule(2024, Phase::Regular, 1, vec![g1.clone()]));
        pick(&mut league, "g1", "u1", "HOME_0_3");

        let mut postponed = g1;
        postponed.status = GameStatus::Postponed;
        let eval = evaluate_league(&mut league, &schedule(2024, Phase::Regular, 1, vec![postponed])).unwrap();

        assert!(eval.week_closed);
        assert_eq!(score(&league, "u1"), 0);
        let game = &league.open_season().unwrap().weeks[0].games[0];
        assert!(!game.is_open);
        assert_eq!(game.status, GameStatus::Postponed);
        assert_eq!(game.winner, None);
    }

    #[test]
    fn championship_awards_bonus_for_correct_champion_pick() {
        let mut league = league();
        let sb = fetched_game("sb", "KC", "SF");
        build_week(&mut league, &schedule(2024, Phase::Postseason, 4, vec![sb.clone()]));
        {
            let season = league.open_season_mut().unwrap();
            season.final_winner.insert("u1".into(), Some("KC".into()));
            season.final_winner.insert("u2".into(), Some("SF".into()));
        }
        pick(&mut league, "sb", "u2", "HOME_4_7");

        let results = schedule(2024, Phase::Postseason, 4, vec![finished(sb, 25, 22)]);
        let eval = evaluate_league(&mut league, &results).unwrap();

        assert_eq!(eval.champion.as_deref(), Some("KC"));
        assert_eq!(eval.bonus_awarded, vec!["u1".to_string()]);
        assert_eq!(score(&league, "u1"), CHAMPION_BONUS);
        assert_eq!(score(&league, "u2"), 1);

        // A second pass finds the week already closed and pays nothing.
        let again = evaluate_league(&mut league, &results).unwrap();
        assert_eq!(again.champion, None);
        assert_eq!(score(&league, "u1"), CHAMPION_BONUS);
    }

    #[test]
    fn missing_week_is_an_error() {
        let mut league = league();
        let results = schedule(2024, Phase::Regular, 5, vec![]);
        let err = evaluate_league(&mut league, &results).unwrap_err();
        assert!(matches!(err, EngineError::WeekNotFound { .. }));

        let results = schedule(2023, Phase::Regular, 5, vec![]);
        let err = evaluate_league(&mut league, &results).unwrap_err();
        assert!(matches!(err, EngineError::SeasonNotFound { year: 2023, .. }));
    }
}
