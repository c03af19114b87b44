// User side of the league membership relation.

use serde::{Deserialize, Serialize};

/// A league as listed on a user record (membership or pending invitation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueRef {
    pub league_id: String,
    pub name: String,
}

/// Account record owned by the outer auth layer. The engine reads identity
/// fields and maintains `leagues` and `invitations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub is_admin: bool,
    pub leagues: Vec<LeagueRef>,
    pub invitations: Vec<LeagueRef>,
}

impl User {
    pub fn new(id: &str, username: &str, email: &str) -> Self {
        User {
            id: id.to_string(),
            username: username.to_string(),
            email: email.to_string(),
            avatar_url: None,
            is_admin: false,
            leagues: Vec::new(),
            invitations: Vec::new(),
        }
    }

    pub fn has_invitation(&self, league_id: &str) -> bool {
        self.invitations.iter().any(|r| r.league_id == league_id)
    }

    pub fn belongs_to(&self, league_id: &str) -> bool {
        self.leagues.iter().any(|r| r.league_id == league_id)
    }
}
