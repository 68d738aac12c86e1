use crate::state::network::LoadingState;
use crossterm::event::KeyEvent;
use tourney_api::{Login, Round, RoundResult, Tournament};

#[derive(Debug, Clone)]
pub enum NetworkRequest {
    Login { email: String, password: String },
    Logout,
    LoadTournaments { page: u32 },
    LoadTournament { id: u64 },
    LoadRound { tournament_id: u64, number: u32 },
    /// `table` tags the submission so the response routes back to the dialog
    /// that was open when it was sent, never to a later-opened one.
    SubmitResults {
        tournament_id: u64,
        number: u32,
        table: u32,
        results: Vec<RoundResult>,
    },
    CreateRound { tournament_id: u64 },
    CreateTournament { name: String, description: String, format: String },
    CreateParticipant { tournament_id: u64, name: String },
    UpdateParticipant { tournament_id: u64, participant_id: u64, name: String },
}

#[derive(Debug)]
pub enum NetworkResponse {
    LoadingStateChanged { loading_state: LoadingState },
    LoggedIn { login: Login },
    LoginFailed { message: String },
    LoggedOut,
    TournamentsLoaded { page: u32, tournaments: Vec<Tournament> },
    TournamentsLoadFailed { message: String },
    TournamentLoaded { tournament: Tournament },
    TournamentLoadFailed { id: u64, message: String },
    RoundLoaded { round: Round },
    RoundLoadFailed { tournament_id: u64, number: u32, message: String },
    /// The updated round in the body is deliberately discarded: dependent
    /// views are invalidated and refetched instead.
    ResultsSubmitted { tournament_id: u64, number: u32, table: u32 },
    SubmitFailed { tournament_id: u64, number: u32, table: u32, message: String },
    RoundCreated { tournament_id: u64, number: Option<u32> },
    TournamentCreated { tournament: Tournament },
    TournamentCreateFailed { message: String },
    /// Covers both adding and renaming; either way only the parent
    /// tournament needs a refetch.
    ParticipantSaved { tournament_id: u64 },
    ParticipantSaveFailed { tournament_id: u64, message: String },
    Error { message: String },
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    KeyPressed(KeyEvent),
    Resize,
    AppStarted,
    /// One-second round clock tick from the ticker task.
    ClockTick,
}
