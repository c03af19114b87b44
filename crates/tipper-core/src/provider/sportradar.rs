// Sportradar NFL API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::wire::{self, ScheduleResponse, StandingsResponse};
use super::{ProviderError, ScheduleProvider, WeekSchedule};
use crate::model::{Phase, TeamStandings};

pub const DEFAULT_BASE_URL: &str = "https://api.sportradar.us/nfl/official/trial/v7/en";

/// HTTP client for the Sportradar schedule and standings endpoints.
#[derive(Debug, Clone)]
pub struct SportradarClient {
    http: Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl SportradarClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Self {
        Self {
            http: Client::builder()
                .user_agent("nfl-tipper/0.1")
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            timeout,
        }
    }

    /// GET `{base}{path}` and decode JSON. Client errors (unknown week,
    /// unpublished season) map to `Ok(None)`.
    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, ProviderError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "requesting");
        let response = self
            .http
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|source| ProviderError::Network {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if status.is_client_error() {
            warn!(%url, status = status.as_u16(), "provider has no data for request");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ProviderError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response
            .json::<T>()
            .await
            .map_err(|source| ProviderError::Decode { url, source })?;
        Ok(Some(body))
    }
}

#[async_trait]
impl ScheduleProvider for SportradarClient {
    async fn week_schedule(
        &self,
        year: i32,
        phase: Phase,
        week: u8,
    ) -> Result<Option<WeekSchedule>, ProviderError> {
        let path = format!("/games/{year}/{}/{week}/schedule.json", phase.as_path());
        let raw: Option<ScheduleResponse> = self.get(&path).await?;
        Ok(raw.and_then(wire::map_schedule))
    }

    async fn team_standings(&self, year: i32) -> Result<Option<TeamStandings>, ProviderError> {
        let path = format!("/seasons/{year}/REG/standings/season.json");
        let raw: Option<StandingsResponse> = self.get(&path).await?;
        Ok(raw.and_then(|r| wire::map_standings(year, r)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GameStatus;
    use mockito::Matcher;

    const SCHEDULE_JSON: &str = r#"{
        "id": "season-2024",
        "year": 2024,
        "type": "REG",
        "name": "REG",
        "week": {
            "id": "week-2024-reg-1",
            "sequence": 1,
            "title": "1",
            "games": [
                {
                    "id": "game-1",
                    "status": "closed",
                    "scheduled": "2024-09-06T00:20:00+00:00",
                    "home": {"id": "h1", "name": "Kansas City Chiefs", "alias": "KC"},
                    "away": {"id": "a1", "name": "Baltimore Ravens", "alias": "BAL"},
                    "scoring": {"home_points": 27, "away_points": 20}
                },
                {
                    "id": "game-2",
                    "status": "scheduled",
                    "scheduled": "2024-09-08T17:00:00+00:00",
                    "home": {"id": "h2", "name": "Atlanta Falcons", "alias": "ATL"},
                    "away": {"id": "a2", "name": "Pittsburgh Steelers", "alias": "PIT"}
                }
            ]
        }
    }"#;

    fn client(server: &mockito::ServerGuard) -> SportradarClient {
        SportradarClient::new(&server.url(), "test-key", Duration::from_secs(5))
    }

    #[tokio::test]
    async fn fetches_and_maps_week_schedule() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/games/2024/REG/1/schedule.json")
            .match_query(Matcher::UrlEncoded("api_key".into(), "test-key".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(SCHEDULE_JSON)
            .create_async()
            .await;

        let schedule = client(&server)
            .week_schedule(2024, Phase::Regular, 1)
            .await
            .unwrap()
            .expect("schedule should be present");
        mock.assert_async().await;

        assert_eq!(schedule.year, 2024);
        assert_eq!(schedule.phase, Phase::Regular);
        assert_eq!(schedule.week.id, "week-2024-reg-1");
        assert_eq!(schedule.week.sequence, 1);
        assert_eq!(schedule.week.games.len(), 2);

        let first = &schedule.week.games[0];
        assert_eq!(first.status, GameStatus::Closed);
        assert_eq!(first.home.alias, "KC");
        assert_eq!(first.away.name, "Baltimore Ravens");
        assert_eq!(first.home_points, Some(27));
        assert_eq!(first.away_points, Some(20));

        let second = &schedule.week.games[1];
        assert_eq!(second.status, GameStatus::Scheduled);
        assert_eq!(second.home_points, None);
        assert!(!schedule.all_final());
    }

    #[tokio::test]
    async fn client_error_means_no_data() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/games/2024/PST/5/schedule.json")
            .match_query(Matcher::Any)
            .with_status(404)
            .create_async()
            .await;

        let result = client(&server)
            .week_schedule(2024, Phase::Postseason, 5)
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn server_error_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/games/2024/REG/2/schedule.json")
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let err = client(&server)
            .week_schedule(2024, Phase::Regular, 2)
            .await
            .unwrap_err();
        match err {
            ProviderError::Status { status, .. } => assert_eq!(status, 503),
            other => panic!("expected Status error, got: {other}"),
        }
    }

    #[tokio::test]
    async fn response_without_week_is_no_data() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/games/2024/REG/3/schedule.json")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"year": 2024, "type": "REG"}"#)
            .create_async()
            .await;

        let result = client(&server)
            .week_schedule(2024, Phase::Regular, 3)
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn out_of_range_week_sequence_is_no_data() {
        let mut server = mockito::Server::new_async().await;
        let body = SCHEDULE_JSON
            .replace(r#""type": "REG""#, r#""type": "PST""#)
            .replace(r#""sequence": 1"#, r#""sequence": 250"#);
        let _mock = server
            .mock("GET", "/games/2024/PST/4/schedule.json")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await;

        let result = client(&server)
            .week_schedule(2024, Phase::Postseason, 4)
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn fetches_team_standings() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/seasons/2024/REG/standings/season.json")
            .match_query(Matcher::UrlEncoded("api_key".into(), "test-key".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"season": {"year": 2024},
                    "conferences": [{"divisions": [{"teams": [
                        {"alias": "KC", "wins": 15, "losses": 2, "ties": 0},
                        {"alias": "DEN", "wins": 10, "losses": 7}
                    ]}]}]}"#,
            )
            .create_async()
            .await;

        let standings = client(&server).team_standings(2024).await.unwrap().unwrap();
        assert_eq!(standings.year, 2024);
        assert_eq!(standings.teams["KC"].win, 15);
        assert_eq!(standings.teams["DEN"].loss, 7);
        assert_eq!(standings.teams["DEN"].tie, 0);
    }
}
