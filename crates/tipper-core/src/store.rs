// SQLite document store for league, user and tracker aggregates.

use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::model::{League, TeamStandings, Tracker, User};

/// Everything one engine operation wants written. Applied by
/// [`Database::commit`] in a single transaction.
#[derive(Debug, Default)]
pub struct WriteBatch {
    pub leagues: Vec<League>,
    pub users: Vec<User>,
    pub deleted_leagues: Vec<String>,
    pub tracker: Option<Tracker>,
    pub team_standings: Option<TeamStandings>,
    /// Snapshot of league documents as they were before this batch.
    pub backup: Option<Vec<League>>,
}

impl WriteBatch {
    pub fn is_empty(&self) -> bool {
        self.leagues.is_empty()
            && self.users.is_empty()
            && self.deleted_leagues.is_empty()
            && self.tracker.is_none()
            && self.team_standings.is_none()
            && self.backup.is_none()
    }
}

/// The stored snapshot of all league documents. Only the most recent one is
/// kept.
#[derive(Debug, Clone)]
pub struct LeagueBackup {
    pub taken_at: DateTime<Utc>,
    pub leagues: Vec<League>,
}

/// SQLite-backed persistence. Each aggregate is one JSON document and every
/// write replaces the whole document.
pub struct Database {
    conn: Mutex<Connection>,
}

fn encode<T: Serialize>(doc: &T, what: &str) -> Result<String> {
    serde_json::to_string(doc).with_context(|| format!("failed to serialize {what}"))
}

fn decode<T: DeserializeOwned>(body: &str, what: &str) -> Result<T> {
    serde_json::from_str(body).with_context(|| format!("failed to deserialize {what}"))
}

impl Database {
    /// Open (or create) a database at `path`. Pass `":memory:"` for an
    /// ephemeral database.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS leagues (
                id   TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                body TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS users (
                id    TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                body  TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS tracker (
                id   INTEGER PRIMARY KEY CHECK (id = 1),
                body TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS team_standings (
                year INTEGER PRIMARY KEY,
                body TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS league_backups (
                id       INTEGER PRIMARY KEY CHECK (id = 1),
                taken_at TEXT NOT NULL,
                body     TEXT NOT NULL
            );
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Panics if the mutex is poisoned.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    pub fn get_league(&self, league_id: &str) -> Result<Option<League>> {
        let conn = self.conn();
        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM leagues WHERE id = ?1",
                params![league_id],
                |row| row.get(0),
            )
            .optional()
            .context("failed to query league")?;
        body.map(|b| decode(&b, "league")).transpose()
    }

    /// Fetch the leagues with the given ids, in the order requested. Unknown
    /// ids are skipped.
    pub fn get_leagues(&self, league_ids: &[String]) -> Result<Vec<League>> {
        let mut leagues = Vec::with_capacity(league_ids.len());
        for id in league_ids {
            if let Some(league) = self.get_league(id)? {
                leagues.push(league);
            }
        }
        Ok(leagues)
    }

    pub fn all_leagues(&self) -> Result<Vec<League>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT body FROM leagues ORDER BY name, id")
            .context("failed to prepare all_leagues query")?;
        let bodies = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .context("failed to query leagues")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to read league rows")?;
        bodies.iter().map(|b| decode(b, "league")).collect()
    }

    pub fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        let conn = self.conn();
        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM users WHERE id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()
            .context("failed to query user")?;
        body.map(|b| decode(&b, "user")).transpose()
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn();
        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM users WHERE email = ?1",
                params![email],
                |row| row.get(0),
            )
            .optional()
            .context("failed to query user by email")?;
        body.map(|b| decode(&b, "user")).transpose()
    }

    /// Insert or replace a single user record.
    pub fn upsert_user(&self, user: &User) -> Result<()> {
        self.commit(&WriteBatch {
            users: vec![user.clone()],
            ..WriteBatch::default()
        })
    }

    pub fn load_tracker(&self) -> Result<Option<Tracker>> {
        let conn = self.conn();
        let body: Option<String> = conn
            .query_row("SELECT body FROM tracker WHERE id = 1", [], |row| row.get(0))
            .optional()
            .context("failed to query tracker")?;
        body.map(|b| decode(&b, "tracker")).transpose()
    }

    pub fn load_team_standings(&self, year: i32) -> Result<Option<TeamStandings>> {
        let conn = self.conn();
        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM team_standings WHERE year = ?1",
                params![year],
                |row| row.get(0),
            )
            .optional()
            .context("failed to query team standings")?;
        body.map(|b| decode(&b, "team standings")).transpose()
    }

    pub fn latest_backup(&self) -> Result<Option<LeagueBackup>> {
        let conn = self.conn();
        let row: Option<(String, String)> = conn
            .query_row(
                "SELECT taken_at, body FROM league_backups WHERE id = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .context("failed to query league backups")?;
        let Some((taken_at, body)) = row else {
            return Ok(None);
        };
        let taken_at = DateTime::parse_from_rfc3339(&taken_at)
            .context("failed to parse backup timestamp")?
            .with_timezone(&Utc);
        Ok(Some(LeagueBackup {
            taken_at,
            leagues: decode(&body, "league backup")?,
        }))
    }

    /// Apply a batch in one transaction. Any failure rolls back the whole
    /// batch.
    pub fn commit(&self, batch: &WriteBatch) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin transaction")?;

        if let Some(snapshot) = &batch.backup {
            tx.execute(
                "INSERT OR REPLACE INTO league_backups (id, taken_at, body) VALUES (1, ?1, ?2)",
                params![Utc::now().to_rfc3339(), encode(snapshot, "league backup")?],
            )
            .context("failed to write league backup")?;
        }

        for league in &batch.leagues {
            tx.execute(
                "INSERT INTO leagues (id, name, body) VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET name = excluded.name, body = excluded.body",
                params![league.id, league.name, encode(league, "league")?],
            )
            .with_context(|| format!("failed to write league {}", league.id))?;
        }

        for league_id in &batch.deleted_leagues {
            tx.execute("DELETE FROM leagues WHERE id = ?1", params![league_id])
                .with_context(|| format!("failed to delete league {league_id}"))?;
        }

        for user in &batch.users {
            tx.execute(
                "INSERT INTO users (id, email, body) VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET email = excluded.email, body = excluded.body",
                params![user.id, user.email, encode(user, "user")?],
            )
            .with_context(|| format!("failed to write user {}", user.id))?;
        }

        if let Some(tracker) = &batch.tracker {
            tx.execute(
                "INSERT OR REPLACE INTO tracker (id, body) VALUES (1, ?1)",
                params![encode(tracker, "tracker")?],
            )
            .context("failed to write tracker")?;
        }

        if let Some(standings) = &batch.team_standings {
            tx.execute(
                "INSERT OR REPLACE INTO team_standings (year, body) VALUES (?1, ?2)",
                params![standings.year, encode(standings, "team standings")?],
            )
            .context("failed to write team standings")?;
        }

        tx.commit().context("failed to commit batch")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Phase, TeamRecord};

    fn test_db() -> Database {
        Database::open(":memory:").expect("in-memory database should open")
    }

    fn alice() -> User {
        User::new("u1", "alice", "alice@example.com")
    }

    #[test]
    fn open_creates_tables() {
        let db = test_db();
        let conn = db.conn();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        for name in ["leagues", "users", "tracker", "team_standings", "league_backups"] {
            assert!(tables.contains(&name.to_string()), "missing table {name}");
        }
    }

    #[test]
    fn missing_documents_are_none() {
        let db = test_db();
        assert!(db.get_league("nope").unwrap().is_none());
        assert!(db.get_user("nope").unwrap().is_none());
        assert!(db.load_tracker().unwrap().is_none());
        assert!(db.load_team_standings(2024).unwrap().is_none());
        assert!(db.latest_backup().unwrap().is_none());
    }

    #[test]
    fn league_write_replaces_whole_document() {
        let db = test_db();
        let mut league = League::new(&alice(), "Sunday Club", None, 2024);
        db.commit(&WriteBatch {
            leagues: vec![league.clone()],
            ..WriteBatch::default()
        })
        .unwrap();

        league.name = "Monday Club".into();
        league.invitations.push("u2".into());
        db.commit(&WriteBatch {
            leagues: vec![league.clone()],
            ..WriteBatch::default()
        })
        .unwrap();

        let stored = db.get_league(&league.id).unwrap().unwrap();
        assert_eq!(stored, league);
        assert_eq!(db.all_leagues().unwrap().len(), 1);
    }

    #[test]
    fn users_are_found_by_id_and_email() {
        let db = test_db();
        db.upsert_user(&alice()).unwrap();
        assert_eq!(db.get_user("u1").unwrap().unwrap().username, "alice");
        assert_eq!(
            db.get_user_by_email("alice@example.com").unwrap().unwrap().id,
            "u1"
        );
        assert!(db.get_user_by_email("bob@example.com").unwrap().is_none());
    }

    #[test]
    fn get_leagues_skips_unknown_ids() {
        let db = test_db();
        let league = League::new(&alice(), "Sunday Club", None, 2024);
        db.commit(&WriteBatch {
            leagues: vec![league.clone()],
            ..WriteBatch::default()
        })
        .unwrap();
        let found = db
            .get_leagues(&["missing".to_string(), league.id.clone()])
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, league.id);
    }

    #[test]
    fn batch_writes_tracker_standings_and_backup() {
        let db = test_db();
        let league = League::new(&alice(), "Sunday Club", None, 2024);
        let mut teams = std::collections::BTreeMap::new();
        teams.insert("KC".to_string(), TeamRecord { win: 15, loss: 2, tie: 0 });
        db.commit(&WriteBatch {
            leagues: vec![league.clone()],
            tracker: Some(Tracker { year: 2024, phase: Phase::Postseason, week: 2 }),
            team_standings: Some(TeamStandings { year: 2024, teams }),
            backup: Some(vec![league.clone()]),
            ..WriteBatch::default()
        })
        .unwrap();

        let tracker = db.load_tracker().unwrap().unwrap();
        assert_eq!(tracker.phase, Phase::Postseason);
        assert_eq!(tracker.week, 2);
        assert_eq!(db.load_team_standings(2024).unwrap().unwrap().teams["KC"].win, 15);
        let backup = db.latest_backup().unwrap().unwrap();
        assert_eq!(backup.leagues, vec![league]);
    }

    #[test]
    fn backup_keeps_only_the_latest_snapshot() {
        let db = test_db();
        let mut league = League::new(&alice(), "Sunday Club", None, 2024);
        for round in 0..5 {
            league.name = format!("Sunday Club {round}");
            db.commit(&WriteBatch {
                backup: Some(vec![league.clone()]),
                ..WriteBatch::default()
            })
            .unwrap();
        }

        let rows: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM league_backups", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
        let backup = db.latest_backup().unwrap().unwrap();
        assert_eq!(backup.leagues[0].name, "Sunday Club 4");
    }

    #[test]
    fn failed_batch_rolls_back_everything() {
        let db = test_db();
        db.upsert_user(&alice()).unwrap();
        let league = League::new(&alice(), "Sunday Club", None, 2024);

        // Second user collides on the unique email column.
        let clash = User::new("u2", "mallory", "alice@example.com");
        let result = db.commit(&WriteBatch {
            leagues: vec![league.clone()],
            users: vec![clash],
            tracker: Some(Tracker::season_start(2024)),
            ..WriteBatch::default()
        });

        assert!(result.is_err());
        assert!(db.get_league(&league.id).unwrap().is_none());
        assert!(db.get_user("u2").unwrap().is_none());
        assert!(db.load_tracker().unwrap().is_none());
    }

    #[test]
    fn deleted_leagues_are_removed() {
        let db = test_db();
        let league = League::new(&alice(), "Sunday Club", None, 2024);
        db.commit(&WriteBatch {
            leagues: vec![league.clone()],
            ..WriteBatch::default()
        })
        .unwrap();
        db.commit(&WriteBatch {
            deleted_leagues: vec![league.id.clone()],
            ..WriteBatch::default()
        })
        .unwrap();
        assert!(db.get_league(&league.id).unwrap().is_none());
    }

    #[test]
    fn empty_batch_reports_empty() {
        assert!(WriteBatch::default().is_empty());
        let batch = WriteBatch {
            tracker: Some(Tracker::season_start(2024)),
            ..WriteBatch::default()
        };
        assert!(!batch.is_empty());
    }
}
