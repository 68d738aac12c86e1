use crate::state::messages::{NetworkRequest, NetworkResponse};
use log::{debug, error};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tourney_api::client::TourneyApi;

const SPINNER_CHARS: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
pub const ERROR_CHAR: char = '!';

#[derive(Debug, Copy, Clone)]
pub struct LoadingState {
    pub is_loading: bool,
    pub spinner_char: char,
}

impl Default for LoadingState {
    fn default() -> Self {
        Self { is_loading: false, spinner_char: ' ' }
    }
}

/// Owns the API client and serves requests off the queue one at a time.
/// Fetch and submit failures that a view must route specially come back as
/// their own response variants with enough context to find that view.
pub struct NetworkWorker {
    client: TourneyApi,
    requests: mpsc::Receiver<NetworkRequest>,
    responses: mpsc::Sender<NetworkResponse>,
    is_loading: Arc<AtomicBool>,
}

impl NetworkWorker {
    pub fn new(
        requests: mpsc::Receiver<NetworkRequest>,
        responses: mpsc::Sender<NetworkResponse>,
        token: Option<String>,
    ) -> Self {
        let mut client = TourneyApi::new();
        client.set_token(token);
        Self {
            client,
            requests,
            responses,
            is_loading: Arc::new(AtomicBool::new(false)),
        }
    }

    pub async fn run(mut self) {
        while let Some(request) = self.requests.recv().await {
            self.start_loading_animation().await;

            let response = self.handle(request).await;
            let is_ok = !matches!(
                response,
                NetworkResponse::Error { .. }
                    | NetworkResponse::LoginFailed { .. }
                    | NetworkResponse::TournamentsLoadFailed { .. }
                    | NetworkResponse::TournamentLoadFailed { .. }
                    | NetworkResponse::RoundLoadFailed { .. }
                    | NetworkResponse::SubmitFailed { .. }
                    | NetworkResponse::TournamentCreateFailed { .. }
                    | NetworkResponse::ParticipantSaveFailed { .. }
            );

            debug!("network request complete");
            self.stop_loading_animation(is_ok).await;

            if let Err(e) = self.responses.send(response).await {
                error!("Failed to send network response: {e}");
                break;
            }
        }
    }

    async fn handle(&mut self, request: NetworkRequest) -> NetworkResponse {
        match request {
            NetworkRequest::Login { email, password } => {
                debug!("logging in as {email}");
                match self.client.login(&email, &password).await {
                    Ok(login) => {
                        self.client.set_token(Some(login.token.clone()));
                        NetworkResponse::LoggedIn { login }
                    }
                    Err(e) => NetworkResponse::LoginFailed { message: e.to_string() },
                }
            }
            NetworkRequest::Logout => {
                self.client.set_token(None);
                NetworkResponse::LoggedOut
            }
            NetworkRequest::LoadTournaments { page } => {
                debug!("loading tournaments page {page}");
                match self
                    .client
                    .fetch_tournaments(page, crate::state::app_state::TOURNAMENTS_LIMIT)
                    .await
                {
                    Ok(tournaments) => NetworkResponse::TournamentsLoaded { page, tournaments },
                    Err(e) => NetworkResponse::TournamentsLoadFailed { message: e.to_string() },
                }
            }
            NetworkRequest::LoadTournament { id } => {
                debug!("loading tournament {id}");
                match self.client.fetch_tournament(id).await {
                    Ok(tournament) => NetworkResponse::TournamentLoaded { tournament },
                    Err(e) => NetworkResponse::TournamentLoadFailed { id, message: e.to_string() },
                }
            }
            NetworkRequest::LoadRound { tournament_id, number } => {
                debug!("loading round {number} of tournament {tournament_id}");
                match self.client.fetch_round(tournament_id, number).await {
                    Ok(round) => NetworkResponse::RoundLoaded { round },
                    Err(e) => NetworkResponse::RoundLoadFailed {
                        tournament_id,
                        number,
                        message: e.to_string(),
                    },
                }
            }
            NetworkRequest::SubmitResults { tournament_id, number, table, results } => {
                debug!("submitting table {table} results for round {number}");
                match self.client.update_round(tournament_id, number, &results).await {
                    // Dependent views get invalidated and refetched; the
                    // round in the response body is not applied locally.
                    Ok(_round) => NetworkResponse::ResultsSubmitted { tournament_id, number, table },
                    Err(e) => NetworkResponse::SubmitFailed {
                        tournament_id,
                        number,
                        table,
                        message: e.to_string(),
                    },
                }
            }
            NetworkRequest::CreateRound { tournament_id } => {
                debug!("starting a round for tournament {tournament_id}");
                match self.client.create_round(tournament_id).await {
                    Ok(created) => NetworkResponse::RoundCreated {
                        tournament_id,
                        number: created.number,
                    },
                    Err(e) => NetworkResponse::Error { message: e.to_string() },
                }
            }
            NetworkRequest::CreateTournament { name, description, format } => {
                debug!("creating tournament {name}");
                match self.client.create_tournament(&name, &description, &format).await {
                    Ok(tournament) => NetworkResponse::TournamentCreated { tournament },
                    Err(e) => {
                        NetworkResponse::TournamentCreateFailed { message: e.to_string() }
                    }
                }
            }
            NetworkRequest::CreateParticipant { tournament_id, name } => {
                debug!("adding a player to tournament {tournament_id}");
                match self.client.create_participant(tournament_id, &name).await {
                    Ok(_participant) => NetworkResponse::ParticipantSaved { tournament_id },
                    Err(e) => NetworkResponse::ParticipantSaveFailed {
                        tournament_id,
                        message: e.to_string(),
                    },
                }
            }
            NetworkRequest::UpdateParticipant { tournament_id, participant_id, name } => {
                debug!("renaming participant {participant_id}");
                match self
                    .client
                    .update_participant(tournament_id, participant_id, &name)
                    .await
                {
                    Ok(_participant) => NetworkResponse::ParticipantSaved { tournament_id },
                    Err(e) => NetworkResponse::ParticipantSaveFailed {
                        tournament_id,
                        message: e.to_string(),
                    },
                }
            }
        }
    }

    async fn start_loading_animation(&self) {
        self.is_loading.store(true, Ordering::Relaxed);

        let mut loading_state = LoadingState { is_loading: true, spinner_char: SPINNER_CHARS[0] };
        let _ = self
            .responses
            .send(NetworkResponse::LoadingStateChanged { loading_state })
            .await;

        let responses = self.responses.clone();
        let is_loading = self.is_loading.clone();

        tokio::spawn(async move {
            let mut spinner_index = 1;
            let mut interval = tokio::time::interval(Duration::from_millis(33));
            loop {
                interval.tick().await;
                if !is_loading.load(Ordering::Relaxed) {
                    break;
                }
                loading_state.spinner_char = SPINNER_CHARS[spinner_index];
                spinner_index = (spinner_index + 1) % SPINNER_CHARS.len();
                let _ = responses
                    .send(NetworkResponse::LoadingStateChanged { loading_state })
                    .await;
            }
        });
    }

    async fn stop_loading_animation(&self, is_ok: bool) {
        self.is_loading.store(false, Ordering::Relaxed);
        tokio::time::sleep(Duration::from_millis(15)).await;

        let spinner_char = if is_ok { ' ' } else { ERROR_CHAR };
        let _ = self
            .responses
            .send(NetworkResponse::LoadingStateChanged {
                loading_state: LoadingState { is_loading: false, spinner_char },
            })
            .await;
    }
}
