use crate::state::app_state::{AppState, FormKind, FormState};
use crate::state::cache::{QueryInvalidator, QueryKey};
use crate::state::messages::UiEvent;
use crate::state::refresher::RoundTicker;
use crate::state::round::RoundSession;
use crate::state::session::Session;
use chrono::Utc;
use tokio::sync::mpsc;
use tourney_api::{Login, Round, Tournament};

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum MenuItem {
    #[default]
    Tournaments,
    TournamentDetail,
    RoundDetail,
    Help,
}

pub struct App {
    pub state: AppState,
    ui_events: mpsc::Sender<UiEvent>,
    ticker: Option<RoundTicker>,
}

impl App {
    pub fn new(session: Session, ui_events: mpsc::Sender<UiEvent>) -> Self {
        Self {
            state: AppState::new(session),
            ui_events,
            ticker: None,
        }
    }

    // -----------------------------------------------------------------------
    // Ownership — evaluated per render from the latest tournament + user data
    // -----------------------------------------------------------------------

    pub fn viewer_owns_detail(&self) -> bool {
        self.state
            .detail
            .tournament
            .as_ref()
            .is_some_and(|t| self.state.session.owns(t.user_id))
    }

    /// The round view's owner check uses the round's parent tournament.
    pub fn viewer_owns_round(&self) -> bool {
        let Some(round) = &self.state.round else {
            return false;
        };
        self.state
            .detail
            .tournament
            .as_ref()
            .filter(|t| t.id == round.tournament_id)
            .is_some_and(|t| self.state.session.owns(t.user_id))
    }

    // -----------------------------------------------------------------------
    // Network response handlers — called from main_ui_loop
    // -----------------------------------------------------------------------

    pub fn on_logged_in(&mut self, login: Login) {
        self.state.session.establish(login.token, login.user);
        self.state.login = Default::default();
        self.state.status = Some("Logged in.".to_string());
    }

    pub fn on_login_failed(&mut self, message: String) {
        self.state.login.in_flight = false;
        self.state.login.error = Some(message);
    }

    pub fn logout(&mut self) {
        self.state.session.clear();
        self.state.login = Default::default();
        self.state.tournaments = Default::default();
        self.state.detail = Default::default();
        self.state.round = None;
        self.state.form = None;
        self.state.active_tab = MenuItem::Tournaments;
        self.state.status = None;
        self.sync_round_ticker();
    }

    pub fn on_tournaments_loaded(&mut self, page: u32, tournaments: Vec<Tournament>) {
        self.state.tournaments.on_page_loaded(page, tournaments);
    }

    pub fn on_tournaments_load_failed(&mut self, message: String) {
        self.state.tournaments.loaded = true;
        self.state.tournaments.error = Some(message);
    }

    pub fn on_tournament_loaded(&mut self, tournament: Tournament) {
        self.state.detail.on_loaded(tournament);
    }

    pub fn on_tournament_load_failed(&mut self, id: u64, message: String) {
        if self.state.detail.id == Some(id) {
            self.state.detail.error = Some(message);
        }
    }

    pub fn on_round_loaded(&mut self, round: Round) {
        if let Some(session) = self
            .state
            .round
            .as_mut()
            .filter(|s| s.tournament_id == round.tournament_id && s.number == round.number)
        {
            session.on_round_loaded(round, Utc::now());
        }
        self.sync_round_ticker();
    }

    pub fn on_round_load_failed(&mut self, tournament_id: u64, number: u32, message: String) {
        if let Some(session) = self
            .state
            .round
            .as_mut()
            .filter(|s| s.tournament_id == tournament_id && s.number == number)
        {
            session.on_load_failed(message);
        }
    }

    /// A submit resolved. The round and its parent tournament are stale
    /// regardless of whether the dialog (or even the round view) is still
    /// up, so both get invalidated either way.
    pub fn on_results_submitted(
        &mut self,
        tournament_id: u64,
        number: u32,
        table: u32,
        cache: &mut dyn QueryInvalidator,
    ) {
        match self
            .state
            .round
            .as_mut()
            .filter(|s| s.tournament_id == tournament_id && s.number == number)
        {
            Some(session) => session.on_submit_ok(table, cache),
            None => {
                cache.invalidate(QueryKey::Round { tournament_id, number });
                cache.invalidate(QueryKey::Tournament(tournament_id));
            }
        }
        self.state.status = Some("Results submitted!".to_string());
    }

    pub fn on_submit_failed(
        &mut self,
        tournament_id: u64,
        number: u32,
        table: u32,
        message: String,
    ) {
        let routed = self
            .state
            .round
            .as_mut()
            .filter(|s| s.tournament_id == tournament_id && s.number == number)
            .is_some_and(|s| s.on_submit_failed(table, message.clone()));
        if !routed {
            self.state.status = Some(message);
        }
    }

    /// Round started. Returns the navigation target when the server told us
    /// the new round's number; otherwise only a confirmation is shown.
    pub fn on_round_created(
        &mut self,
        tournament_id: u64,
        number: Option<u32>,
        cache: &mut dyn QueryInvalidator,
    ) -> Option<(u64, u32)> {
        // Starting a round also flips the tournament's list-visible status.
        cache.invalidate(QueryKey::Tournament(tournament_id));
        cache.invalidate(QueryKey::Tournaments);
        match number {
            Some(number) => {
                self.open_round(tournament_id, number);
                Some((tournament_id, number))
            }
            None => {
                self.state.status = Some("Round started!".to_string());
                None
            }
        }
    }

    pub fn on_error(&mut self, message: String) {
        self.state.status = Some(message);
    }

    // -----------------------------------------------------------------------
    // Create/edit forms
    // -----------------------------------------------------------------------

    pub fn open_new_tournament_form(&mut self) {
        if self.state.form.is_none() {
            self.state.form = Some(FormState::create_tournament());
        }
    }

    pub fn open_add_player_form(&mut self) {
        if self.state.form.is_some() || !self.viewer_owns_detail() {
            return;
        }
        if let Some(id) = self.state.detail.id {
            self.state.form = Some(FormState::add_participant(id));
        }
    }

    pub fn open_rename_player_form(&mut self) {
        if self.state.form.is_some() || !self.viewer_owns_detail() {
            return;
        }
        let Some(id) = self.state.detail.id else {
            return;
        };
        if let Some(player) = self.state.detail.selected_player() {
            self.state.form = Some(FormState::rename_participant(id, player.id, &player.name));
        }
    }

    pub fn cancel_form(&mut self) {
        self.state.form = None;
    }

    /// Tournament created: the list is stale, the form closes, and the
    /// confirmation names the new event.
    pub fn on_tournament_created(
        &mut self,
        tournament: Tournament,
        cache: &mut dyn QueryInvalidator,
    ) {
        cache.invalidate(QueryKey::Tournaments);
        if self
            .state
            .form
            .as_ref()
            .is_some_and(|f| f.kind == FormKind::CreateTournament)
        {
            self.state.form = None;
        }
        self.state.status = Some(format!("Created \"{}\".", tournament.name));
    }

    pub fn on_tournament_create_failed(&mut self, message: String) {
        match self
            .state
            .form
            .as_mut()
            .filter(|f| f.kind == FormKind::CreateTournament)
        {
            Some(form) => {
                form.in_flight = false;
                form.error = Some(message);
            }
            None => self.state.status = Some(message),
        }
    }

    fn form_targets_tournament(kind: FormKind, tournament_id: u64) -> bool {
        match kind {
            FormKind::AddParticipant { tournament_id: t }
            | FormKind::RenameParticipant { tournament_id: t, .. } => t == tournament_id,
            FormKind::CreateTournament => false,
        }
    }

    /// A player was added or renamed; only the parent tournament view holds
    /// stale data.
    pub fn on_participant_saved(
        &mut self,
        tournament_id: u64,
        cache: &mut dyn QueryInvalidator,
    ) {
        cache.invalidate(QueryKey::Tournament(tournament_id));
        if self
            .state
            .form
            .as_ref()
            .is_some_and(|f| Self::form_targets_tournament(f.kind, tournament_id))
        {
            self.state.form = None;
        }
        self.state.status = Some("Player saved.".to_string());
    }

    pub fn on_participant_save_failed(&mut self, tournament_id: u64, message: String) {
        match self
            .state
            .form
            .as_mut()
            .filter(|f| Self::form_targets_tournament(f.kind, tournament_id))
        {
            Some(form) => {
                form.in_flight = false;
                form.error = Some(message);
            }
            None => self.state.status = Some(message),
        }
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    pub fn update_tab(&mut self, next: MenuItem) {
        if self.state.active_tab == next {
            return;
        }
        self.state.previous_tab = self.state.active_tab;
        self.state.active_tab = next;
        self.state.status = None;
        self.sync_round_ticker();
    }

    pub fn exit_help(&mut self) {
        if self.state.active_tab == MenuItem::Help {
            self.state.active_tab = self.state.previous_tab;
            // Returning to a round view must restart its clock.
            self.sync_round_ticker();
        }
    }

    /// Returns the tournament id to fetch when the user opens the selected
    /// list entry.
    pub fn open_selected_tournament(&mut self) -> Option<u64> {
        let id = self.state.tournaments.selected_id()?;
        self.state.detail.open(id);
        self.update_tab(MenuItem::TournamentDetail);
        Some(id)
    }

    pub fn open_round(&mut self, tournament_id: u64, number: u32) {
        self.state.round = Some(RoundSession::new(tournament_id, number));
        self.update_tab(MenuItem::RoundDetail);
        self.sync_round_ticker();
    }

    /// Returns the fetch target when the user opens the selected round.
    pub fn open_selected_round(&mut self) -> Option<(u64, u32)> {
        let id = self.state.detail.id?;
        let number = self.state.detail.selected_round_number()?;
        self.open_round(id, number);
        Some((id, number))
    }

    /// Leaving the round view tears the session down, dialog, buffer,
    /// ticker and all.
    pub fn leave_round_view(&mut self) {
        self.state.round = None;
        self.update_tab(MenuItem::TournamentDetail);
        self.sync_round_ticker();
    }

    pub fn toggle_show_logs(&mut self) {
        self.state.show_logs = !self.state.show_logs;
    }

    pub fn toggle_full_screen(&mut self) {
        self.state.full_screen = !self.state.full_screen;
    }

    // -----------------------------------------------------------------------
    // Round clock
    // -----------------------------------------------------------------------

    /// Recompute the countdown on a ticker tick. Redraw only while the
    /// round view is up.
    pub fn on_clock_tick(&mut self) -> bool {
        if self.state.active_tab != MenuItem::RoundDetail {
            return false;
        }
        if let Some(session) = self.state.round.as_mut() {
            session.update_clock(Utc::now());
            return true;
        }
        false
    }

    /// Start or stop the one-second ticker to match the current view: it
    /// runs exactly while an incomplete round's view is open.
    pub fn sync_round_ticker(&mut self) {
        let wants_ticker = self.state.active_tab == MenuItem::RoundDetail
            && self.state.round.as_ref().is_some_and(|s| !s.is_complete());

        match (wants_ticker, self.ticker.is_some()) {
            (true, false) => self.ticker = Some(RoundTicker::start(self.ui_events.clone())),
            (false, true) => {
                if let Some(ticker) = self.ticker.take() {
                    ticker.stop();
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tourney_api::User;

    #[derive(Default)]
    struct RecordingCache {
        keys: Vec<QueryKey>,
    }

    impl QueryInvalidator for RecordingCache {
        fn invalidate(&mut self, key: QueryKey) {
            self.keys.push(key);
        }
    }

    fn logged_in_app() -> App {
        let (tx, _rx) = mpsc::channel(8);
        let session = Session {
            token: Some("t".into()),
            user: Some(User { id: 7, email: "org@example.com".into() }),
        };
        App::new(session, tx)
    }

    fn incomplete_round() -> Round {
        Round {
            id: 11,
            number: 0,
            tournament_id: 3,
            inserted_at: "2026-08-24T18:00:00Z".into(),
            is_complete: false,
            ..Round::default()
        }
    }

    #[tokio::test]
    async fn help_roundtrip_keeps_the_round_clock_running() {
        let mut app = logged_in_app();
        app.open_round(3, 0);
        app.on_round_loaded(incomplete_round());
        assert!(app.ticker.is_some(), "open incomplete round runs the clock");

        app.update_tab(MenuItem::Help);
        assert!(app.ticker.is_none(), "help view needs no clock");

        app.exit_help();
        assert_eq!(app.state.active_tab, MenuItem::RoundDetail);
        assert!(app.ticker.is_some(), "clock resumes with the round view");
    }

    #[tokio::test]
    async fn leaving_the_round_view_stops_the_clock() {
        let mut app = logged_in_app();
        app.open_round(3, 0);
        app.on_round_loaded(incomplete_round());
        app.leave_round_view();
        assert!(app.ticker.is_none());
    }

    #[tokio::test]
    async fn tournament_created_closes_the_form_and_refreshes_the_list() {
        let mut app = logged_in_app();
        app.open_new_tournament_form();
        let mut cache = RecordingCache::default();
        app.on_tournament_created(
            Tournament { id: 9, name: "FNM".into(), ..Tournament::default() },
            &mut cache,
        );
        assert!(app.state.form.is_none());
        assert_eq!(cache.keys, vec![QueryKey::Tournaments]);
    }

    #[tokio::test]
    async fn player_save_refreshes_only_its_tournament() {
        let mut app = logged_in_app();
        app.state.detail.open(3);
        app.state.detail.on_loaded(Tournament {
            id: 3,
            user_id: 7,
            ..Tournament::default()
        });
        app.open_add_player_form();
        assert!(app.state.form.is_some(), "owner may add players");

        let mut cache = RecordingCache::default();
        app.on_participant_saved(3, &mut cache);
        assert!(app.state.form.is_none());
        assert_eq!(cache.keys, vec![QueryKey::Tournament(3)]);
    }

    #[tokio::test]
    async fn player_save_failure_keeps_the_form_with_its_error() {
        let mut app = logged_in_app();
        app.state.detail.open(3);
        app.state.detail.on_loaded(Tournament {
            id: 3,
            user_id: 7,
            ..Tournament::default()
        });
        app.open_add_player_form();
        app.on_participant_save_failed(3, "name already taken".into());
        let form = app.state.form.as_ref().unwrap();
        assert!(!form.in_flight);
        assert_eq!(form.error.as_deref(), Some("name already taken"));
    }

    #[tokio::test]
    async fn non_owners_get_no_player_forms() {
        let mut app = logged_in_app();
        app.state.detail.open(3);
        app.state.detail.on_loaded(Tournament {
            id: 3,
            user_id: 8,
            ..Tournament::default()
        });
        app.open_add_player_form();
        app.open_rename_player_form();
        assert!(app.state.form.is_none());
    }
}
