// Engine error types.

use thiserror::Error;

/// Every way an engine operation can fail.
///
/// Callers on the trigger surface collapse all of these into one failure
/// status; the variants exist for logging and tests.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("schedule provider returned no data")]
    NoScheduleData,

    #[error("league not found: {league_id}")]
    LeagueNotFound { league_id: String },

    #[error("league {league_id} has no season for {year}")]
    SeasonNotFound { league_id: String, year: i32 },

    #[error("league {league_id} has no week {week_id}")]
    WeekNotFound { league_id: String, week_id: String },

    #[error("user not found: {user}")]
    UserNotFound { user: String },

    #[error("persistence failure: {message}")]
    PersistenceFailure { message: String },

    #[error("not authorized to {action}")]
    NotAuthorized { action: String },

    #[error("user {user_id} is already a member of league {league_id}")]
    AlreadyMember { user_id: String, league_id: String },

    #[error("user {user_id} is already invited to league {league_id}")]
    AlreadyInvited { user_id: String, league_id: String },

    #[error("user {user_id} has no invitation to league {league_id}")]
    NotInvited { user_id: String, league_id: String },

    #[error("league {league_id} has no open season")]
    NoOpenSeason { league_id: String },

    #[error("league name must not be empty")]
    InvalidLeagueName,

    #[error("schedule tracker has not been initialized")]
    TrackerMissing,

    #[error("season rollover requires the championship week, tracker is at {tracker}")]
    TrackerNotAtSeasonEnd { tracker: String },
}

impl EngineError {
    /// Wrap a store error. The store reports `anyhow` errors; the engine only
    /// needs the rendered chain.
    pub fn persistence(err: anyhow::Error) -> Self {
        EngineError::PersistenceFailure {
            message: format!("{err:#}"),
        }
    }

    pub fn not_authorized(action: &str) -> Self {
        EngineError::NotAuthorized {
            action: action.to_string(),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
