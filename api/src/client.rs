use crate::wire::{
    Envelope, ErrorBody, LoginRequest, ParticipantFields, ParticipantRequest, ResultsRequest,
    TournamentFields, TournamentRequest,
};
use crate::{Login, NewRound, Participant, Round, RoundResult, Tournament};
use reqwest::{Client, Response};
use std::fmt;
use std::time::Duration;

pub type ApiResult<T> = Result<T, ApiError>;

const DEFAULT_API_URL: &str = "http://localhost:4000/api";

/// Organizer API client. Holds the bearer token once logged in; every other
/// endpoint requires it.
#[derive(Debug, Clone)]
pub struct TourneyApi {
    client: Client,
    base_url: String,
    token: Option<String>,
    timeout: Duration,
}

impl Default for TourneyApi {
    fn default() -> Self {
        let base_url = std::env::var("PODTUI_API_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        Self::with_base_url(base_url)
    }
}

#[derive(Debug)]
pub enum ApiError {
    Network(reqwest::Error, String),
    Api(reqwest::Error, String),
    Parsing(reqwest::Error, String),
    /// 4xx with a server-provided message; shown to the user verbatim.
    Rejected(String),
    Other(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(e, url) => write!(f, "Network error for {url}: {e}"),
            ApiError::Api(e, url) => write!(f, "API error for {url}: {e}"),
            ApiError::Parsing(e, url) => write!(f, "Parse error for {url}: {e}"),
            ApiError::Rejected(msg) => write!(f, "{msg}"),
            ApiError::Other(msg) => write!(f, "Error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl TourneyApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .user_agent("podtui/0.1 (terminal tournament organizer)")
                .build()
                .unwrap_or_default(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
            timeout: Duration::from_secs(10),
        }
    }

    /// Install or clear the bearer token used by all authenticated calls.
    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    /// Exchange credentials for a token and the current-user identity.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<Login> {
        self.post("/login", &LoginRequest { email, password }).await
    }

    /// Fetch one page of the tournament list, newest first.
    pub async fn fetch_tournaments(&self, page: u32, limit: u32) -> ApiResult<Vec<Tournament>> {
        let data: Envelope<Vec<Tournament>> = self
            .get(&format!("/tournaments?page={page}&limit={limit}"))
            .await?;
        Ok(data.data)
    }

    /// Create a tournament owned by the logged-in user.
    pub async fn create_tournament(
        &self,
        name: &str,
        description_raw: &str,
        format: &str,
    ) -> ApiResult<Tournament> {
        let data: Envelope<Tournament> = self
            .post(
                "/tournaments",
                &TournamentRequest {
                    tournament: TournamentFields { name, description_raw, format },
                },
            )
            .await?;
        Ok(data.data)
    }

    /// Register a participant in a tournament.
    pub async fn create_participant(
        &self,
        tournament_id: u64,
        name: &str,
    ) -> ApiResult<Participant> {
        let data: Envelope<Participant> = self
            .post(
                &format!("/tournaments/{tournament_id}/participants"),
                &ParticipantRequest { participant: ParticipantFields { name } },
            )
            .await?;
        Ok(data.data)
    }

    /// Rename a participant.
    pub async fn update_participant(
        &self,
        tournament_id: u64,
        participant_id: u64,
        name: &str,
    ) -> ApiResult<Participant> {
        let data: Envelope<Participant> = self
            .put(
                &format!("/tournaments/{tournament_id}/participants/{participant_id}"),
                &ParticipantRequest { participant: ParticipantFields { name } },
            )
            .await?;
        Ok(data.data)
    }

    /// Fetch a tournament with its participants and round summaries.
    pub async fn fetch_tournament(&self, id: u64) -> ApiResult<Tournament> {
        let data: Envelope<Tournament> = self.get(&format!("/tournaments/{id}")).await?;
        Ok(data.data)
    }

    /// Fetch round metadata plus its full pairing list.
    pub async fn fetch_round(&self, tournament_id: u64, number: u32) -> ApiResult<Round> {
        let data: Envelope<Round> = self
            .get(&format!("/tournaments/{tournament_id}/rounds/{number}"))
            .await?;
        Ok(data.data)
    }

    /// Record a table's results for round `number`. The server recomputes
    /// pairing activity and round completion; callers refetch rather than
    /// derive those locally.
    pub async fn update_round(
        &self,
        tournament_id: u64,
        number: u32,
        results: &[RoundResult],
    ) -> ApiResult<Round> {
        let data: Envelope<Round> = self
            .put(
                &format!("/tournaments/{tournament_id}/rounds/{number}"),
                &ResultsRequest { results },
            )
            .await?;
        Ok(data.data)
    }

    /// Start the next round; the server generates the pairings.
    pub async fn create_round(&self, tournament_id: u64) -> ApiResult<NewRound> {
        let data: Envelope<NewRound> = self
            .post(&format!("/tournaments/{tournament_id}/rounds"), &())
            .await?;
        Ok(data.data)
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let url = format!("{}{path}", self.base_url);
        let mut request = self.client.get(&url).timeout(self.timeout);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url.clone()))?;
        decode(response, url).await
    }

    async fn post<T: serde::de::DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let url = format!("{}{path}", self.base_url);
        let mut request = self.client.post(&url).timeout(self.timeout).json(body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url.clone()))?;
        decode(response, url).await
    }

    async fn put<T: serde::de::DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let url = format!("{}{path}", self.base_url);
        let mut request = self.client.put(&url).timeout(self.timeout).json(body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url.clone()))?;
        decode(response, url).await
    }
}

async fn decode<T: serde::de::DeserializeOwned>(response: Response, url: String) -> ApiResult<T> {
    let status = response.status();
    if status.is_client_error() {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(ErrorBody::into_message)
            .unwrap_or_else(|| format!("Request rejected ({status})"));
        return Err(ApiError::Rejected(message));
    }
    match response.error_for_status() {
        Ok(res) => res
            .json::<T>()
            .await
            .map_err(|e| ApiError::Parsing(e, url)),
        Err(e) => Err(ApiError::Api(e, url)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authed(server: &mockito::ServerGuard) -> TourneyApi {
        let mut api = TourneyApi::with_base_url(server.url());
        api.set_token(Some("t0k3n".into()));
        api
    }

    #[tokio::test]
    async fn login_returns_token_and_identity() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/login")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "email": "org@example.com",
                "password": "hunter2",
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"token": "t0k3n", "user": {"id": 7, "email": "org@example.com"}}"#)
            .create_async()
            .await;

        let api = TourneyApi::with_base_url(server.url());
        let login = api.login("org@example.com", "hunter2").await.unwrap();
        assert_eq!(login.token, "t0k3n");
        assert_eq!(login.user.id, 7);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn login_failure_surfaces_server_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/login")
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error": "invalid email or password"}"#)
            .create_async()
            .await;

        let api = TourneyApi::with_base_url(server.url());
        let err = api.login("org@example.com", "wrong").await.unwrap_err();
        match err {
            ApiError::Rejected(msg) => assert_eq!(msg, "invalid email or password"),
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn fetch_round_unwraps_envelope_and_sends_bearer_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/tournaments/3/rounds/0")
            .match_header("authorization", "Bearer t0k3n")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"data": {
                    "id": 11, "number": 0, "tournament_id": 3,
                    "inserted_at": "2026-08-24T18:00:00",
                    "is_complete": false,
                    "pairings": [
                        {"id": 1, "number": 1, "participant_id": 21, "points": 3,
                         "participant": {"id": 21, "name": "Ada"}},
                        {"id": 2, "number": 1, "participant_id": 22, "active": false}
                    ]
                }}"#,
            )
            .create_async()
            .await;

        let round = authed(&server).fetch_round(3, 0).await.unwrap();
        assert_eq!(round.number, 0);
        assert_eq!(round.pairings.len(), 2);
        assert_eq!(round.pairings[0].participant_name(), "Ada");
        assert_eq!(round.pairings[1].active, Some(false));
        assert_eq!(round.pairings[1].participant_name(), "Unknown player");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn update_round_posts_results_wrapper() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/tournaments/3/rounds/1")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "results": [
                    {"participant_id": 21, "points": 5},
                    {"participant_id": 22, "points": 0},
                ]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data": {"id": 12, "number": 1, "tournament_id": 3, "is_complete": true}}"#)
            .create_async()
            .await;

        let results = [
            RoundResult { participant_id: 21, points: 5 },
            RoundResult { participant_id: 22, points: 0 },
        ];
        let round = authed(&server).update_round(3, 1, &results).await.unwrap();
        assert!(round.is_complete);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn update_round_rejection_is_verbatim() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("PUT", "/tournaments/3/rounds/1")
            .with_status(422)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error": "table 2 already has results"}"#)
            .create_async()
            .await;

        let err = authed(&server).update_round(3, 1, &[]).await.unwrap_err();
        assert_eq!(err.to_string(), "table 2 already has results");
    }

    #[tokio::test]
    async fn create_round_without_number_is_a_generic_ack() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/tournaments/3/rounds")
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data": {}}"#)
            .create_async()
            .await;

        let created = authed(&server).create_round(3).await.unwrap();
        assert!(created.number.is_none());
    }

    #[tokio::test]
    async fn create_tournament_posts_named_wrapper() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/tournaments")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "tournament": {
                    "name": "FNM",
                    "description_raw": "Weekly commander pods",
                    "format": "edh",
                }
            })))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data": {"id": 9, "name": "FNM", "user_id": 7, "status": "inactive"}}"#)
            .create_async()
            .await;

        let tournament = authed(&server)
            .create_tournament("FNM", "Weekly commander pods", "edh")
            .await
            .unwrap();
        assert_eq!(tournament.id, 9);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn participant_create_and_rename_use_nested_routes() {
        let mut server = mockito::Server::new_async().await;
        let create = server
            .mock("POST", "/tournaments/3/participants")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "participant": {"name": "Ada"}
            })))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data": {"id": 21, "name": "Ada"}}"#)
            .create_async()
            .await;
        let rename = server
            .mock("PUT", "/tournaments/3/participants/21")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "participant": {"name": "Ada L."}
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data": {"id": 21, "name": "Ada L."}}"#)
            .create_async()
            .await;

        let api = authed(&server);
        let added = api.create_participant(3, "Ada").await.unwrap();
        assert_eq!(added.id, 21);
        let renamed = api.update_participant(3, 21, "Ada L.").await.unwrap();
        assert_eq!(renamed.name, "Ada L.");
        create.assert_async().await;
        rename.assert_async().await;
    }

    #[tokio::test]
    async fn fetch_tournaments_passes_pagination() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/tournaments?page=2&limit=10")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"data": [{"id": 9, "name": "FNM", "user_id": 7, "status": "active"}]}"#,
            )
            .create_async()
            .await;

        let tournaments = authed(&server).fetch_tournaments(2, 10).await.unwrap();
        assert_eq!(tournaments.len(), 1);
        assert_eq!(tournaments[0].name, "FNM");
        mock.assert_async().await;
    }
}
