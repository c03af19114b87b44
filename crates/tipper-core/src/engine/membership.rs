// League creation, invitations, membership and league deletion.
//
// Both halves of the relation (league roster/invitations and the user's
// league/invitation refs) are updated together and written in one batch.

use tracing::{info, warn};

use super::builder::{build_week, BuildOutcome};
use super::Engine;
use crate::error::{EngineError, EngineResult};
use crate::model::{Bet, League, LeagueRef, Player, Standing, User};
use crate::provider::ScheduleProvider;
use crate::store::WriteBatch;

fn league_ref(league: &League) -> LeagueRef {
    LeagueRef {
        league_id: league.id.clone(),
        name: league.name.clone(),
    }
}

/// Add `user` to the league roster and to every open structure of the open
/// season: a zero standing, an empty champion pick and an unplaced bet on
/// each game of the open week.
fn join_open_season(league: &mut League, user: &User) -> EngineResult<()> {
    let player = Player::from(user);
    let league_id = league.id.clone();
    let season = league
        .open_season_mut()
        .ok_or(EngineError::NoOpenSeason { league_id })?;

    if season.standing(&player.id).is_none() {
        season.standings.push(Standing {
            player_id: player.id.clone(),
            name: player.name.clone(),
            score: 0,
        });
    }
    season.final_winner.entry(player.id.clone()).or_insert(None);
    if let Some(week) = season.open_week_mut() {
        for game in week.games.iter_mut().filter(|g| g.bet(&player.id).is_none()) {
            game.bets.push(Bet::unplaced(&player.id, &player.name));
        }
    }

    league.players.push(player);
    Ok(())
}

impl<P: ScheduleProvider> Engine<P> {
    /// Create a league owned by `creator_id` with an open season for the
    /// tracked year and the current week already built.
    pub async fn create_league(
        &self,
        creator_id: &str,
        name: &str,
        avatar: Option<String>,
    ) -> EngineResult<League> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EngineError::InvalidLeagueName);
        }
        let mut creator = self.load_user(creator_id)?;
        let tracker = self.tracker()?;
        let schedule = self.fetch_schedule(tracker).await?;

        let mut league = League::new(&creator, name, avatar, tracker.year);
        if build_week(&mut league, &schedule) == BuildOutcome::SeasonMissing {
            warn!(
                "League {} created without a week: feed year {} differs from tracker {tracker}",
                league.id, schedule.year
            );
        }
        creator.leagues.push(league_ref(&league));

        self.commit(&WriteBatch {
            leagues: vec![league.clone()],
            users: vec![creator],
            ..WriteBatch::default()
        })?;
        info!("Created league {} ({}) for {creator_id}", league.id, league.name);
        Ok(league)
    }

    /// Invite the user registered under `invitee_email`. Only the league
    /// creator may invite.
    pub fn invite(&self, inviter_id: &str, league_id: &str, invitee_email: &str) -> EngineResult<()> {
        let mut league = self.load_league(league_id)?;
        if league.creator != inviter_id {
            return Err(EngineError::not_authorized("invite players to a league they did not create"));
        }
        let mut invitee = self
            .db
            .get_user_by_email(invitee_email)
            .map_err(EngineError::persistence)?
            .ok_or_else(|| EngineError::UserNotFound {
                user: invitee_email.to_string(),
            })?;

        if league.is_member(&invitee.id) || invitee.belongs_to(league_id) {
            return Err(EngineError::AlreadyMember {
                user_id: invitee.id,
                league_id: league_id.to_string(),
            });
        }
        if league.is_invited(&invitee.id) || invitee.has_invitation(league_id) {
            return Err(EngineError::AlreadyInvited {
                user_id: invitee.id,
                league_id: league_id.to_string(),
            });
        }

        league.invitations.push(invitee.id.clone());
        invitee.invitations.push(league_ref(&league));
        self.commit(&WriteBatch {
            leagues: vec![league],
            users: vec![invitee.clone()],
            ..WriteBatch::default()
        })?;
        info!("League {league_id}: invited {}", invitee.id);
        Ok(())
    }

    /// Accept a pending invitation. Fails without writing anything unless the
    /// league holds an invitation for the user.
    pub fn accept_invitation(&self, user_id: &str, league_id: &str) -> EngineResult<League> {
        let mut user = self.load_user(user_id)?;
        let mut league = self.load_league(league_id)?;

        if !league.is_invited(user_id) {
            return Err(EngineError::NotInvited {
                user_id: user_id.to_string(),
                league_id: league_id.to_string(),
            });
        }
        if league.is_member(user_id) {
            return Err(EngineError::AlreadyMember {
                user_id: user_id.to_string(),
                league_id: league_id.to_string(),
            });
        }

        join_open_season(&mut league, &user)?;
        league.invitations.retain(|id| id != user_id);
        user.invitations.retain(|r| r.league_id != league_id);
        if !user.belongs_to(league_id) {
            user.leagues.push(league_ref(&league));
        }

        self.commit(&WriteBatch {
            leagues: vec![league.clone()],
            users: vec![user],
            ..WriteBatch::default()
        })?;
        info!("League {league_id}: {user_id} joined");
        Ok(league)
    }

    /// Delete a league and every user-side reference to it. Creator only.
    pub fn delete_league(&self, actor_id: &str, league_id: &str) -> EngineResult<()> {
        let league = self.load_league(league_id)?;
        if league.creator != actor_id {
            return Err(EngineError::not_authorized("delete a league they did not create"));
        }

        let mut users = Vec::new();
        let related = league
            .players
            .iter()
            .map(|p| p.id.as_str())
            .chain(league.invitations.iter().map(String::as_str));
        for user_id in related {
            let Some(mut user) = self.db.get_user(user_id).map_err(EngineError::persistence)? else {
                warn!("League {league_id}: referenced user {user_id} does not exist");
                continue;
            };
            user.leagues.retain(|r| r.league_id != league_id);
            user.invitations.retain(|r| r.league_id != league_id);
            users.push(user);
        }

        self.commit(&WriteBatch {
            users,
            deleted_leagues: vec![league.id.clone()],
            ..WriteBatch::default()
        })?;
        info!("Deleted league {league_id}");
        Ok(())
    }

    /// Change a user's avatar and the denormalized copy in every league roster.
    pub fn update_avatar(&self, user_id: &str, avatar: Option<String>) -> EngineResult<User> {
        let mut user = self.load_user(user_id)?;
        user.avatar_url = avatar.clone();

        let ids: Vec<String> = user.leagues.iter().map(|r| r.league_id.clone()).collect();
        let mut leagues = self.db.get_leagues(&ids).map_err(EngineError::persistence)?;
        for league in leagues.iter_mut() {
            if let Some(player) = league.player_mut(user_id) {
                player.avatar = avatar.clone();
            }
        }

        self.commit(&WriteBatch {
            leagues,
            users: vec![user.clone()],
            ..WriteBatch::default()
        })?;
        Ok(user)
    }
}
