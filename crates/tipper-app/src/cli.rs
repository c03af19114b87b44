// Admin command surface. Each command runs one engine operation.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use tipper_core::engine::{CycleOutcome, Engine};
use tipper_core::model::User;
use tipper_core::provider::ScheduleProvider;

use crate::config::Config;

#[derive(Debug, Parser)]
#[command(name = "tipper", about = "NFL tipper season engine", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the schedule tracker (no-op when it already exists).
    InitTracker {
        /// Defaults to `season.initial_year`.
        #[arg(long)]
        year: Option<i32>,
    },
    /// Register a user record.
    AddUser {
        id: String,
        username: String,
        email: String,
        #[arg(long)]
        admin: bool,
    },
    CreateLeague {
        creator: String,
        name: String,
        #[arg(long)]
        avatar: Option<String>,
    },
    Invite {
        inviter: String,
        league_id: String,
        email: String,
    },
    Accept {
        user: String,
        league_id: String,
    },
    /// Run one evaluation cycle for the tracked week.
    Evaluate {
        #[arg(long)]
        actor: String,
    },
    /// Roll over into the next season (championship week only).
    NewSeason {
        #[arg(long)]
        actor: String,
    },
    RefreshStandings {
        #[arg(long)]
        actor: String,
        #[arg(long)]
        year: Option<i32>,
    },
    ShowTracker,
}

fn load_actor<P: ScheduleProvider>(engine: &Engine<P>, user_id: &str) -> Result<User> {
    engine
        .db()
        .get_user(user_id)?
        .with_context(|| format!("unknown user {user_id}"))
}

/// Run one command against the engine.
pub async fn run<P: ScheduleProvider>(engine: &Engine<P>, config: &Config, command: Command) -> Result<()> {
    match command {
        Command::InitTracker { year } => {
            let year = year.unwrap_or(config.season.initial_year);
            let tracker = engine.init_tracker(year)?;
            info!("Tracker at {tracker}");
        }
        Command::AddUser {
            id,
            username,
            email,
            admin,
        } => {
            let mut user = User::new(&id, &username, &email);
            user.is_admin = admin;
            engine
                .db()
                .upsert_user(&user)
                .with_context(|| format!("failed to add user {id}"))?;
            info!("Added user {id} ({email})");
        }
        Command::CreateLeague {
            creator,
            name,
            avatar,
        } => {
            let league = engine.create_league(&creator, &name, avatar).await?;
            println!("{}", league.id);
        }
        Command::Invite {
            inviter,
            league_id,
            email,
        } => engine.invite(&inviter, &league_id, &email)?,
        Command::Accept { user, league_id } => {
            engine.accept_invitation(&user, &league_id)?;
        }
        Command::Evaluate { actor } => {
            let actor = load_actor(engine, &actor)?;
            match engine.evaluate(&actor).await? {
                CycleOutcome::WeekPending => info!("Week still in progress"),
                CycleOutcome::SeasonComplete => info!("Season complete, run new-season next"),
                CycleOutcome::Advanced { tracker } => info!("Advanced to {tracker}"),
            }
        }
        Command::NewSeason { actor } => {
            let actor = load_actor(engine, &actor)?;
            engine.start_new_season(&actor).await?;
        }
        Command::RefreshStandings { actor, year } => {
            let actor = load_actor(engine, &actor)?;
            let year = match year {
                Some(year) => year,
                None => engine.tracker()?.year,
            };
            engine.refresh_team_standings(&actor, year).await?;
        }
        Command::ShowTracker => {
            println!("{}", engine.tracker()?);
        }
    }
    Ok(())
}
