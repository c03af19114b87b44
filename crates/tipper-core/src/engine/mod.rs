// Season engine: every state transition of leagues and the tracker goes
// through `Engine`, which loads documents, applies a pure transform and
// commits the result as one batch.

pub mod builder;
pub mod evaluation;
pub mod membership;
pub mod rollover;
pub mod view;
pub mod wager;

use std::time::Duration;

use tracing::{info, warn};

use crate::error::{EngineError, EngineResult};
use crate::model::{League, Tracker, User};
use crate::provider::{ScheduleProvider, WeekSchedule};
use crate::store::{Database, WriteBatch};

pub use builder::{build_week, BuildOutcome};
pub use evaluation::{evaluate_league, CycleOutcome, WeekEvaluation, CHAMPION_BONUS};
pub use view::{LeagueSummary, LeagueView};
pub use wager::{Pick, WagerReceipt, WagerSlip, WagerTarget};

/// Default bound on a single provider request.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(20);

pub struct Engine<P> {
    db: Database,
    provider: P,
    fetch_timeout: Duration,
}

impl<P: ScheduleProvider> Engine<P> {
    pub fn new(db: Database, provider: P, fetch_timeout: Duration) -> Self {
        Self {
            db,
            provider,
            fetch_timeout,
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Create the tracker at `{year, REG, 1}`. Returns the existing tracker
    /// unchanged when one is already stored.
    pub fn init_tracker(&self, year: i32) -> EngineResult<Tracker> {
        if let Some(existing) = self.db.load_tracker().map_err(EngineError::persistence)? {
            info!("Tracker already initialized at {existing}");
            return Ok(existing);
        }
        let tracker = Tracker::season_start(year);
        self.commit(&WriteBatch {
            tracker: Some(tracker),
            ..WriteBatch::default()
        })?;
        info!("Initialized tracker at {tracker}");
        Ok(tracker)
    }

    pub fn tracker(&self) -> EngineResult<Tracker> {
        self.db
            .load_tracker()
            .map_err(EngineError::persistence)?
            .ok_or(EngineError::TrackerMissing)
    }

    /// Fetch the schedule the tracker points at. Timeouts, transport errors and
    /// empty responses all collapse into `NoScheduleData`.
    pub(crate) async fn fetch_schedule(&self, tracker: Tracker) -> EngineResult<WeekSchedule> {
        let request = self
            .provider
            .week_schedule(tracker.year, tracker.phase, tracker.week);
        match tokio::time::timeout(self.fetch_timeout, request).await {
            Ok(Ok(Some(schedule))) if schedule.week.games.is_empty() => {
                warn!("Schedule for {tracker} has no games yet");
                Err(EngineError::NoScheduleData)
            }
            Ok(Ok(Some(schedule))) => Ok(schedule),
            Ok(Ok(None)) => {
                warn!("No schedule available for {tracker}");
                Err(EngineError::NoScheduleData)
            }
            Ok(Err(e)) => {
                warn!("Schedule fetch for {tracker} failed: {e}");
                Err(EngineError::NoScheduleData)
            }
            Err(_) => {
                warn!(
                    "Schedule fetch for {tracker} timed out after {:?}",
                    self.fetch_timeout
                );
                Err(EngineError::NoScheduleData)
            }
        }
    }

    pub(crate) fn commit(&self, batch: &WriteBatch) -> EngineResult<()> {
        self.db.commit(batch).map_err(|e| {
            warn!("Batch commit failed: {e:#}");
            EngineError::persistence(e)
        })
    }

    pub(crate) fn load_user(&self, user_id: &str) -> EngineResult<User> {
        self.db
            .get_user(user_id)
            .map_err(EngineError::persistence)?
            .ok_or_else(|| EngineError::UserNotFound {
                user: user_id.to_string(),
            })
    }

    pub(crate) fn load_league(&self, league_id: &str) -> EngineResult<League> {
        self.db
            .get_league(league_id)
            .map_err(EngineError::persistence)?
            .ok_or_else(|| EngineError::LeagueNotFound {
                league_id: league_id.to_string(),
            })
    }

    pub(crate) fn all_leagues(&self) -> EngineResult<Vec<League>> {
        self.db.all_leagues().map_err(EngineError::persistence)
    }
}

/// Reject non-admin callers of admin-only operations.
pub(crate) fn require_admin(actor: &User, action: &str) -> EngineResult<()> {
    if actor.is_admin {
        Ok(())
    } else {
        warn!("User {} is not allowed to {action}", actor.id);
        Err(EngineError::not_authorized(action))
    }
}
