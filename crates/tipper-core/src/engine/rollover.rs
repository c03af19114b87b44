// Season rollover: closes the finished season and opens the next one.

use tracing::info;

use super::builder::build_all;
use super::{require_admin, Engine};
use crate::error::{EngineError, EngineResult};
use crate::model::{League, Season, Tracker, User};
use crate::provider::ScheduleProvider;
use crate::store::WriteBatch;

/// Open a season for `year` carrying the current roster forward. Returns
/// `false` when the league already has that season.
pub fn open_next_season(league: &mut League, year: i32) -> bool {
    if league.season(year).is_some() {
        return false;
    }
    for season in league.seasons.iter_mut().filter(|s| s.is_open) {
        season.is_open = false;
    }
    league.seasons.push(Season::open(year, &league.players));
    true
}

impl<P: ScheduleProvider> Engine<P> {
    /// Move from the championship week into the next year. The first week of
    /// the new season is fetched before anything changes, so a missing
    /// schedule leaves the store untouched.
    pub async fn start_new_season(&self, actor: &User) -> EngineResult<Tracker> {
        require_admin(actor, "start a new season")?;
        let tracker = self.tracker()?;
        if !tracker.is_championship() {
            return Err(EngineError::TrackerNotAtSeasonEnd {
                tracker: tracker.to_string(),
            });
        }

        let next = tracker.advanced();
        let schedule = self.fetch_schedule(next).await?;

        let mut leagues = self.all_leagues()?;
        let opened = leagues
            .iter_mut()
            .map(|league| open_next_season(league, next.year))
            .filter(|opened| *opened)
            .count();
        let built = build_all(&mut leagues, &schedule);

        self.commit(&WriteBatch {
            leagues,
            tracker: Some(next),
            ..WriteBatch::default()
        })?;
        info!("Started season {}: {opened} seasons opened, {built} weeks built", next.year);
        Ok(next)
    }
}
