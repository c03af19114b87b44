// Process-wide schedule pointer: which year/phase/week is being played.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of regular-season weeks.
pub const REGULAR_WEEKS: u8 = 18;

/// Number of postseason rounds (wild card through the championship).
pub const POSTSEASON_WEEKS: u8 = 4;

/// Season phase, serialized as the schedule feed's path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    #[serde(rename = "REG")]
    Regular,
    #[serde(rename = "PST")]
    Postseason,
}

impl Phase {
    /// Path segment used by the schedule provider (`REG` / `PST`).
    pub fn as_path(&self) -> &'static str {
        match self {
            Phase::Regular => "REG",
            Phase::Postseason => "PST",
        }
    }

    pub fn from_path(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "REG" => Some(Phase::Regular),
            "PST" => Some(Phase::Postseason),
            _ => None,
        }
    }

    pub fn week_count(&self) -> u8 {
        match self {
            Phase::Regular => REGULAR_WEEKS,
            Phase::Postseason => POSTSEASON_WEEKS,
        }
    }

    /// Whether `sequence` names a week that exists in this phase.
    pub fn has_week(&self, sequence: u8) -> bool {
        (1..=self.week_count()).contains(&sequence)
    }

    /// Week ordinal within a season for a feed `sequence` in this phase.
    /// Postseason weeks continue after the regular season (19..=22).
    /// Callers check [`Phase::has_week`] first.
    pub fn week_number(&self, sequence: u8) -> u8 {
        match self {
            Phase::Regular => sequence,
            Phase::Postseason => REGULAR_WEEKS.saturating_add(sequence),
        }
    }
}

/// The singleton tracker aggregate.
///
/// Read once at the start of an evaluation cycle and written once at the end,
/// together with the league updates of that cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tracker {
    pub year: i32,
    #[serde(rename = "regOrPst")]
    pub phase: Phase,
    pub week: u8,
}

impl Tracker {
    /// The first regular-season week of `year`.
    pub fn season_start(year: i32) -> Self {
        Tracker {
            year,
            phase: Phase::Regular,
            week: 1,
        }
    }

    /// The tracker one week later. Total over valid trackers and never
    /// produces an out-of-range week.
    pub fn advanced(&self) -> Self {
        match (self.phase, self.week) {
            (Phase::Postseason, w) if w >= POSTSEASON_WEEKS => Tracker::season_start(self.year + 1),
            (Phase::Regular, w) if w >= REGULAR_WEEKS => Tracker {
                year: self.year,
                phase: Phase::Postseason,
                week: 1,
            },
            (phase, w) => Tracker {
                year: self.year,
                phase,
                week: w + 1,
            },
        }
    }

    /// True when the tracker points at the championship game week.
    pub fn is_championship(&self) -> bool {
        self.phase == Phase::Postseason && self.week == POSTSEASON_WEEKS
    }

    /// Ordinal of the tracked week within the season (1..=22).
    pub fn week_number(&self) -> u8 {
        self.phase.week_number(self.week)
    }
}

impl fmt::Display for Tracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.year, self.phase.as_path(), self.week)
    }
}
