// Margin buckets: the vocabulary for both player picks and settled outcomes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Points for a pick that lands in the exact settled bucket.
pub const EXACT_POINTS: u32 = 4;

/// Points for a pick on the winning side but in the wrong bucket.
pub const SIDE_POINTS: u32 = 1;

/// Which team a bucket favours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Home,
    Away,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Home => Side::Away,
            Side::Away => Side::Home,
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            Side::Home => "HOME",
            Side::Away => "AWAY",
        }
    }
}

/// Width of a non-tie margin bucket, in points of final score difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Margin {
    /// 1 to 3 points.
    UpTo3,
    /// 4 to 7 points.
    From4To7,
    /// 8 to 14 points.
    From8To14,
    /// 15 points or more.
    Over15,
}

impl Margin {
    /// Bucket an absolute (non-zero) point difference.
    fn from_abs(diff: u32) -> Self {
        match diff {
            0..=3 => Margin::UpTo3,
            4..=7 => Margin::From4To7,
            8..=14 => Margin::From8To14,
            _ => Margin::Over15,
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            Margin::UpTo3 => "0_3",
            Margin::From4To7 => "4_7",
            Margin::From8To14 => "8_14",
            Margin::Over15 => "15_PLUS",
        }
    }
}

/// One of the nine margin buckets.
///
/// Serialized as the wire code (`HOME_8_14`, `TIE`, ...), so stored documents
/// and client payloads share one vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Bucket {
    Tie,
    Win { side: Side, margin: Margin },
}

impl Bucket {
    /// All nine buckets, away blowout through home blowout.
    pub const ALL: [Bucket; 9] = [
        Bucket::win(Side::Away, Margin::Over15),
        Bucket::win(Side::Away, Margin::From8To14),
        Bucket::win(Side::Away, Margin::From4To7),
        Bucket::win(Side::Away, Margin::UpTo3),
        Bucket::Tie,
        Bucket::win(Side::Home, Margin::UpTo3),
        Bucket::win(Side::Home, Margin::From4To7),
        Bucket::win(Side::Home, Margin::From8To14),
        Bucket::win(Side::Home, Margin::Over15),
    ];

    pub const fn win(side: Side, margin: Margin) -> Self {
        Bucket::Win { side, margin }
    }

    /// Classify a final score by `home - away`.
    pub fn from_scores(home: u32, away: u32) -> Self {
        match home.cmp(&away) {
            std::cmp::Ordering::Equal => Bucket::Tie,
            std::cmp::Ordering::Greater => Bucket::win(Side::Home, Margin::from_abs(home - away)),
            std::cmp::Ordering::Less => Bucket::win(Side::Away, Margin::from_abs(away - home)),
        }
    }

    /// Parse a wire code. Unknown codes yield `None`.
    pub fn from_code(code: &str) -> Option<Self> {
        Bucket::ALL.into_iter().find(|b| b.code() == code)
    }

    /// The wire code for this bucket.
    pub fn code(&self) -> String {
        match self {
            Bucket::Tie => "TIE".to_string(),
            Bucket::Win { side, margin } => format!("{}_{}", side.prefix(), margin.suffix()),
        }
    }

    pub fn side(&self) -> Option<Side> {
        match self {
            Bucket::Tie => None,
            Bucket::Win { side, .. } => Some(*side),
        }
    }

    /// The same margin credited to the other team.
    pub fn mirror(&self) -> Self {
        match self {
            Bucket::Tie => Bucket::Tie,
            Bucket::Win { side, margin } => Bucket::win(side.opposite(), *margin),
        }
    }

    /// True for the two one-score buckets (`HOME_0_3`, `AWAY_0_3`).
    pub fn is_near_zero(&self) -> bool {
        matches!(self, Bucket::Win { margin: Margin::UpTo3, .. })
    }
}

/// Score one pick against a settled outcome.
///
/// A tie pays only the one-score buckets on either side. Otherwise the exact
/// bucket pays [`EXACT_POINTS`], the right side in the wrong bucket pays
/// [`SIDE_POINTS`], and anything else (including an unplaced pick) pays 0.
pub fn score_pick(pick: Option<Bucket>, outcome: Bucket) -> u32 {
    let Some(pick) = pick else {
        return 0;
    };
    match outcome {
        Bucket::Tie => {
            if pick.is_near_zero() {
                EXACT_POINTS
            } else {
                0
            }
        }
        Bucket::Win { side, .. } => {
            if pick == outcome {
                EXACT_POINTS
            } else if pick.side() == Some(side) {
                SIDE_POINTS
            } else {
                0
            }
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code())
    }
}

impl From<Bucket> for String {
    fn from(bucket: Bucket) -> Self {
        bucket.code()
    }
}

impl TryFrom<String> for Bucket {
    type Error = String;

    fn try_from(code: String) -> Result<Self, Self::Error> {
        Bucket::from_code(&code).ok_or_else(|| format!("unknown bucket code `{code}`"))
    }
}
