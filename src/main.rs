mod app;
mod draw;
mod keys;
mod state;
mod time;
mod ui;

use crate::app::App;
use crate::state::cache::CacheBus;
use crate::state::messages::{NetworkRequest, NetworkResponse, UiEvent};
use crate::state::network::{LoadingState, NetworkWorker};
use crate::state::session::Session;
use crossterm::event::{self as crossterm_event, Event};
use crossterm::{cursor, execute, terminal};
use log::error;
use std::io::Stdout;
use std::sync::Arc;
use std::{io, panic};
use tokio::sync::{Mutex, mpsc};
use tui::{Terminal, backend::CrosstermBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if handle_cli_args() {
        return Ok(());
    }

    better_panic::install();

    let backend = CrosstermBackend::new(io::stdout());
    let terminal = Terminal::new(backend)?;

    setup_panic_hook();
    setup_terminal();

    tui_logger::init_logger(log::LevelFilter::Debug)?;
    tui_logger::set_default_level(log::LevelFilter::Debug);

    let session = Session::load();
    let token = session.token.clone();

    let (ui_event_tx, ui_event_rx) = mpsc::channel::<UiEvent>(100);
    let (network_req_tx, network_req_rx) = mpsc::channel::<NetworkRequest>(100);
    let (network_resp_tx, network_resp_rx) = mpsc::channel::<NetworkResponse>(100);

    let app = Arc::new(Mutex::new(App::new(session, ui_event_tx.clone())));

    // Input handler thread
    let input_handler = tokio::spawn(input_handler_task(ui_event_tx.clone()));

    // Network thread
    let network_worker = NetworkWorker::new(network_req_rx, network_resp_tx, token);
    let network_task = tokio::spawn(network_worker.run());

    // Trigger the first tournament fetch on startup
    let _ = ui_event_tx.send(UiEvent::AppStarted).await;

    main_ui_loop(terminal, app, ui_event_rx, network_req_tx, network_resp_rx).await;

    input_handler.abort();
    network_task.abort();

    Ok(())
}

fn handle_cli_args() -> bool {
    let mut args = std::env::args().skip(1);
    let Some(arg) = args.next() else {
        return false;
    };

    match arg.as_str() {
        "-h" | "--help" => {
            println!("{}", usage_text());
            true
        }
        "-V" | "--version" => {
            println!("podtui {}", env!("CARGO_PKG_VERSION"));
            true
        }
        _ => {
            eprintln!("Unknown argument: {arg}\n\n{}", usage_text());
            std::process::exit(2);
        }
    }
}

fn usage_text() -> &'static str {
    "podtui - pod tournament terminal UI

Usage:
  podtui
  podtui --help
  podtui --version

Environment:
  PODTUI_API_URL   Tournament API base URL (default http://localhost:4000/api)"
}

async fn main_ui_loop(
    mut terminal: Terminal<CrosstermBackend<Stdout>>,
    app: Arc<Mutex<App>>,
    mut ui_events: mpsc::Receiver<UiEvent>,
    network_requests: mpsc::Sender<NetworkRequest>,
    mut network_responses: mpsc::Receiver<NetworkResponse>,
) {
    let mut loading = LoadingState::default();

    loop {
        tokio::select! {
            Some(ui_event) = ui_events.recv() => {
                let should_redraw = handle_ui_event(ui_event, &app, &network_requests).await;
                if should_redraw && !loading.is_loading {
                    let mut app_guard = app.lock().await;
                    draw::draw(&mut terminal, &mut app_guard, loading);
                }
            }

            Some(response) = network_responses.recv() => {
                let should_redraw =
                    handle_network_response(response, &app, &network_requests, &mut loading).await;
                if should_redraw {
                    let mut app_guard = app.lock().await;
                    draw::draw(&mut terminal, &mut app_guard, loading);
                }
            }
        }
    }
}

async fn handle_ui_event(
    ui_event: UiEvent,
    app: &Arc<Mutex<App>>,
    network_requests: &mpsc::Sender<NetworkRequest>,
) -> bool {
    match ui_event {
        UiEvent::AppStarted => {
            let authenticated = app.lock().await.state.session.is_authenticated();
            if authenticated {
                let _ = network_requests
                    .send(NetworkRequest::LoadTournaments { page: 1 })
                    .await;
            }
            true
        }
        UiEvent::KeyPressed(key_event) => {
            keys::handle_key_bindings(key_event, app, network_requests).await;
            true
        }
        UiEvent::Resize => true,
        UiEvent::ClockTick => {
            let mut guard = app.lock().await;
            guard.on_clock_tick()
        }
    }
}

async fn handle_network_response(
    response: NetworkResponse,
    app: &Arc<Mutex<App>>,
    network_requests: &mpsc::Sender<NetworkRequest>,
    loading: &mut LoadingState,
) -> bool {
    let mut cache = CacheBus::new(network_requests.clone());

    match response {
        NetworkResponse::LoadingStateChanged { loading_state } => {
            *loading = loading_state;
            return true;
        }
        NetworkResponse::LoggedIn { login } => {
            let mut guard = app.lock().await;
            guard.on_logged_in(login);
            drop(guard);
            let _ = network_requests
                .send(NetworkRequest::LoadTournaments { page: 1 })
                .await;
        }
        NetworkResponse::LoginFailed { message } => {
            let mut guard = app.lock().await;
            guard.on_login_failed(message);
        }
        NetworkResponse::LoggedOut => {}
        NetworkResponse::TournamentsLoaded { page, tournaments } => {
            let mut guard = app.lock().await;
            guard.on_tournaments_loaded(page, tournaments);
        }
        NetworkResponse::TournamentsLoadFailed { message } => {
            error!("Tournament list load failed: {message}");
            let mut guard = app.lock().await;
            guard.on_tournaments_load_failed(message);
        }
        NetworkResponse::TournamentLoaded { tournament } => {
            let mut guard = app.lock().await;
            guard.on_tournament_loaded(tournament);
        }
        NetworkResponse::TournamentLoadFailed { id, message } => {
            error!("Tournament {id} load failed: {message}");
            let mut guard = app.lock().await;
            guard.on_tournament_load_failed(id, message);
        }
        NetworkResponse::RoundLoaded { round } => {
            let mut guard = app.lock().await;
            guard.on_round_loaded(round);
        }
        NetworkResponse::RoundLoadFailed { tournament_id, number, message } => {
            error!("Round {number} of tournament {tournament_id} load failed: {message}");
            let mut guard = app.lock().await;
            guard.on_round_load_failed(tournament_id, number, message);
        }
        NetworkResponse::ResultsSubmitted { tournament_id, number, table } => {
            let mut guard = app.lock().await;
            guard.on_results_submitted(tournament_id, number, table, &mut cache);
        }
        NetworkResponse::SubmitFailed { tournament_id, number, table, message } => {
            error!("Table {table} submit failed: {message}");
            let mut guard = app.lock().await;
            guard.on_submit_failed(tournament_id, number, table, message);
        }
        NetworkResponse::RoundCreated { tournament_id, number } => {
            let mut guard = app.lock().await;
            let target = guard.on_round_created(tournament_id, number, &mut cache);
            drop(guard);
            if let Some((tournament_id, number)) = target {
                let _ = network_requests
                    .send(NetworkRequest::LoadRound { tournament_id, number })
                    .await;
            }
        }
        NetworkResponse::TournamentCreated { tournament } => {
            let mut guard = app.lock().await;
            guard.on_tournament_created(tournament, &mut cache);
        }
        NetworkResponse::TournamentCreateFailed { message } => {
            error!("Tournament create failed: {message}");
            let mut guard = app.lock().await;
            guard.on_tournament_create_failed(message);
        }
        NetworkResponse::ParticipantSaved { tournament_id } => {
            let mut guard = app.lock().await;
            guard.on_participant_saved(tournament_id, &mut cache);
        }
        NetworkResponse::ParticipantSaveFailed { tournament_id, message } => {
            error!("Player save failed for tournament {tournament_id}: {message}");
            let mut guard = app.lock().await;
            guard.on_participant_save_failed(tournament_id, message);
        }
        NetworkResponse::Error { message } => {
            error!("Network error: {message}");
            let mut guard = app.lock().await;
            guard.on_error(message);
        }
    }
    !loading.is_loading
}

async fn input_handler_task(ui_events: mpsc::Sender<UiEvent>) {
    loop {
        if let Ok(event) = crossterm_event::read() {
            let ui_event = match event {
                Event::Key(key_event) => Some(UiEvent::KeyPressed(key_event)),
                Event::Resize(_, _) => Some(UiEvent::Resize),
                _ => None,
            };

            if let Some(ui_event) = ui_event
                && ui_events.send(ui_event).await.is_err()
            {
                break;
            }
        }
    }
}

fn setup_terminal() {
    let mut stdout = io::stdout();
    let _ = execute!(stdout, cursor::Hide);
    let _ = execute!(stdout, terminal::EnterAlternateScreen);
    let _ = execute!(stdout, terminal::Clear(terminal::ClearType::All));
    let _ = terminal::enable_raw_mode();
}

pub fn cleanup_terminal() {
    let mut stdout = io::stdout();
    let _ = execute!(stdout, cursor::MoveTo(0, 0));
    let _ = execute!(stdout, terminal::Clear(terminal::ClearType::All));
    let _ = execute!(stdout, terminal::LeaveAlternateScreen);
    let _ = execute!(stdout, cursor::Show);
    let _ = terminal::disable_raw_mode();
}

fn setup_panic_hook() {
    panic::set_hook(Box::new(|panic_info| {
        cleanup_terminal();
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));
}
