use crate::app::{App, MenuItem};
use crate::state::app_state::{FormKind, round_start_blocker};
use crate::state::messages::NetworkRequest;
use crossterm::event::KeyCode::Char;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

pub async fn handle_key_bindings(
    key_event: KeyEvent,
    app: &Arc<Mutex<App>>,
    network_requests: &mpsc::Sender<NetworkRequest>,
) {
    let mut guard = app.lock().await;

    // The login screen captures everything until a session exists.
    if !guard.state.session.is_authenticated() {
        match (key_event.code, key_event.modifiers) {
            (Char('c'), KeyModifiers::CONTROL) => {
                crate::cleanup_terminal();
                std::process::exit(0);
            }
            (KeyCode::Tab | KeyCode::Up | KeyCode::Down, _) => guard.state.login.toggle_field(),
            (KeyCode::Backspace, _) => guard.state.login.backspace(),
            (KeyCode::Enter, _) => {
                if guard.state.login.can_submit() {
                    guard.state.login.in_flight = true;
                    guard.state.login.error = None;
                    let email = guard.state.login.email.trim().to_string();
                    let password = guard.state.login.password.clone();
                    drop(guard);
                    let _ = network_requests
                        .send(NetworkRequest::Login { email, password })
                        .await;
                }
            }
            (Char(c), _) => guard.state.login.push_char(c),
            _ => {}
        }
        return;
    }

    // An open create/edit form captures everything next.
    if guard.state.form.is_some() {
        let mut cancel = false;
        let mut request = None;
        if let Some(form) = guard.state.form.as_mut() {
            match (key_event.code, key_event.modifiers) {
                (Char('c'), KeyModifiers::CONTROL) => {
                    crate::cleanup_terminal();
                    std::process::exit(0);
                }
                (KeyCode::Esc, _) => cancel = true,
                (KeyCode::Tab | KeyCode::Down, _) => form.next_field(),
                (KeyCode::Up, _) => form.prev_field(),
                (KeyCode::Backspace, _) => form.backspace(),
                (KeyCode::Enter, _) => {
                    if form.can_submit() {
                        form.in_flight = true;
                        form.error = None;
                        request = Some(match form.kind {
                            FormKind::CreateTournament => NetworkRequest::CreateTournament {
                                name: form.field(0).trim().to_string(),
                                description: form.field(1).trim().to_string(),
                                format: form.field(2).trim().to_string(),
                            },
                            FormKind::AddParticipant { tournament_id } => {
                                NetworkRequest::CreateParticipant {
                                    tournament_id,
                                    name: form.field(0).trim().to_string(),
                                }
                            }
                            FormKind::RenameParticipant { tournament_id, participant_id } => {
                                NetworkRequest::UpdateParticipant {
                                    tournament_id,
                                    participant_id,
                                    name: form.field(0).trim().to_string(),
                                }
                            }
                        });
                    }
                }
                (Char(c), _) => form.push_char(c),
                _ => {}
            }
        }
        if cancel {
            guard.cancel_form();
        }
        if let Some(request) = request {
            drop(guard);
            let _ = network_requests.send(request).await;
        }
        return;
    }

    // An open score dialog captures everything next.
    if guard.state.active_tab == MenuItem::RoundDetail
        && guard.state.round.as_ref().is_some_and(|s| s.dialog.is_some())
    {
        let mut submit = None;
        if let Some(session) = guard.state.round.as_mut() {
            match (key_event.code, key_event.modifiers) {
                (Char('c'), KeyModifiers::CONTROL) => {
                    crate::cleanup_terminal();
                    std::process::exit(0);
                }
                // Cancel: buffer discarded, no network call. An in-flight
                // submission keeps running and still reconciles the cache.
                (KeyCode::Esc, _) => session.cancel_dialog(),
                (KeyCode::Tab | KeyCode::Down, _) => {
                    if let Some(dialog) = session.dialog.as_mut() {
                        dialog.cursor_down();
                    }
                }
                (KeyCode::Up, _) => {
                    if let Some(dialog) = session.dialog.as_mut() {
                        dialog.cursor_up();
                    }
                }
                (KeyCode::Backspace, _) => {
                    if let Some(dialog) = session.dialog.as_mut() {
                        dialog.backspace();
                    }
                }
                // Free-form at keystroke time; parsed (and coerced) only
                // when submitting.
                (Char(c), _) => {
                    if let Some(dialog) = session.dialog.as_mut() {
                        dialog.push_char(c);
                    }
                }
                (KeyCode::Enter, _) => {
                    if let Some((table, results)) = session.begin_submit() {
                        submit = Some(NetworkRequest::SubmitResults {
                            tournament_id: session.tournament_id,
                            number: session.number,
                            table,
                            results,
                        });
                    }
                }
                _ => {}
            }
        }
        if let Some(request) = submit {
            drop(guard);
            let _ = network_requests.send(request).await;
        }
        return;
    }

    match (guard.state.active_tab, key_event.code, key_event.modifiers) {
        // Quit
        (_, Char('q'), _) | (_, Char('c'), KeyModifiers::CONTROL) => {
            crate::cleanup_terminal();
            std::process::exit(0);
        }

        // Tab switching
        (_, Char('1'), _) => guard.update_tab(MenuItem::Tournaments),
        (_, Char('?'), _) => guard.update_tab(MenuItem::Help),
        (MenuItem::Help, KeyCode::Esc, _) => guard.exit_help(),

        // Tournament list
        (MenuItem::Tournaments, Char('j') | KeyCode::Down, _) => {
            guard.state.tournaments.select_next();
        }
        (MenuItem::Tournaments, Char('k') | KeyCode::Up, _) => {
            guard.state.tournaments.select_prev();
        }
        (MenuItem::Tournaments, KeyCode::Enter, _) => {
            if let Some(id) = guard.open_selected_tournament() {
                drop(guard);
                let _ = network_requests
                    .send(NetworkRequest::LoadTournament { id })
                    .await;
                return;
            }
        }
        (MenuItem::Tournaments, Char('n'), _) => {
            let list = &guard.state.tournaments;
            if list.loaded && !list.last_page {
                let page = list.page + 1;
                drop(guard);
                let _ = network_requests
                    .send(NetworkRequest::LoadTournaments { page })
                    .await;
                return;
            }
        }
        (MenuItem::Tournaments, Char('c'), _) => guard.open_new_tournament_form(),
        (MenuItem::Tournaments, Char('R'), _) => {
            drop(guard);
            let _ = network_requests
                .send(NetworkRequest::LoadTournaments { page: 1 })
                .await;
            return;
        }

        // Tournament detail
        (MenuItem::TournamentDetail, Char('j') | KeyCode::Down, _) => {
            guard.state.detail.select_next_round();
        }
        (MenuItem::TournamentDetail, Char('k') | KeyCode::Up, _) => {
            guard.state.detail.select_prev_round();
        }
        (MenuItem::TournamentDetail, KeyCode::Enter, _) => {
            if let Some((tournament_id, number)) = guard.open_selected_round() {
                drop(guard);
                let _ = network_requests
                    .send(NetworkRequest::LoadRound { tournament_id, number })
                    .await;
                return;
            }
        }
        (MenuItem::TournamentDetail, Char('s'), _) => {
            // Owner-only; blocked states show their reason instead of a
            // server round-trip that would be rejected anyway.
            if guard.viewer_owns_detail()
                && let Some(tournament) = guard.state.detail.tournament.as_ref()
            {
                match round_start_blocker(tournament) {
                    Some(reason) => guard.state.status = Some(reason.to_string()),
                    None => {
                        let tournament_id = tournament.id;
                        drop(guard);
                        let _ = network_requests
                            .send(NetworkRequest::CreateRound { tournament_id })
                            .await;
                        return;
                    }
                }
            }
        }
        (MenuItem::TournamentDetail, Char('p'), _) => {
            guard.state.detail.select_next_player();
        }
        (MenuItem::TournamentDetail, Char('P'), _) => {
            guard.state.detail.select_prev_player();
        }
        (MenuItem::TournamentDetail, Char('a'), _) => guard.open_add_player_form(),
        (MenuItem::TournamentDetail, Char('e'), _) => guard.open_rename_player_form(),
        (MenuItem::TournamentDetail, Char('R'), _) => {
            if let Some(id) = guard.state.detail.id {
                guard.state.detail.error = None;
                drop(guard);
                let _ = network_requests
                    .send(NetworkRequest::LoadTournament { id })
                    .await;
                return;
            }
        }
        (MenuItem::TournamentDetail, KeyCode::Esc, _) => {
            guard.update_tab(MenuItem::Tournaments);
        }

        // Round view
        (MenuItem::RoundDetail, Char('j') | KeyCode::Down, _) => {
            if let Some(session) = guard.state.round.as_mut() {
                session.select_next_table();
            }
        }
        (MenuItem::RoundDetail, Char('k') | KeyCode::Up, _) => {
            if let Some(session) = guard.state.round.as_mut() {
                session.select_prev_table();
            }
        }
        (MenuItem::RoundDetail, KeyCode::Enter, _) => {
            let is_owner = guard.viewer_owns_round();
            if let Some(session) = guard.state.round.as_mut() {
                session.open_dialog(is_owner);
            }
        }
        (MenuItem::RoundDetail, Char('R'), _) => {
            if let Some(session) = guard.state.round.as_mut() {
                session.begin_refresh();
                let tournament_id = session.tournament_id;
                let number = session.number;
                drop(guard);
                let _ = network_requests
                    .send(NetworkRequest::LoadRound { tournament_id, number })
                    .await;
                return;
            }
        }
        (MenuItem::RoundDetail, KeyCode::Esc, _) => guard.leave_round_view(),

        // Global
        (_, Char('f'), _) => guard.toggle_full_screen(),
        (_, Char('"'), _) => guard.toggle_show_logs(),
        (_, Char('L'), _) => {
            guard.logout();
            drop(guard);
            let _ = network_requests.send(NetworkRequest::Logout).await;
            return;
        }

        _ => {}
    }
}
