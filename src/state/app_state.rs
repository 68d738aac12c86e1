use crate::app::MenuItem;
use crate::state::round::RoundSession;
use crate::state::session::Session;
use tourney_api::{Participant, Tournament, TournamentStatus};

pub const TOURNAMENTS_LIMIT: u32 = 10;

// ---------------------------------------------------------------------------
// Login form state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoginField {
    #[default]
    Email,
    Password,
}

#[derive(Debug, Default)]
pub struct LoginState {
    pub email: String,
    pub password: String,
    pub field: LoginField,
    pub in_flight: bool,
    pub error: Option<String>,
}

impl LoginState {
    pub fn toggle_field(&mut self) {
        self.field = match self.field {
            LoginField::Email => LoginField::Password,
            LoginField::Password => LoginField::Email,
        };
    }

    pub fn push_char(&mut self, c: char) {
        match self.field {
            LoginField::Email => self.email.push(c),
            LoginField::Password => self.password.push(c),
        }
    }

    pub fn backspace(&mut self) {
        match self.field {
            LoginField::Email => self.email.pop(),
            LoginField::Password => self.password.pop(),
        };
    }

    pub fn can_submit(&self) -> bool {
        !self.in_flight && !self.email.trim().is_empty() && !self.password.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Create/edit forms
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    CreateTournament,
    AddParticipant { tournament_id: u64 },
    RenameParticipant { tournament_id: u64, participant_id: u64 },
}

#[derive(Debug)]
pub struct FormField {
    pub label: &'static str,
    pub value: String,
}

/// One modal form at a time: new tournament, or add/rename a player.
/// Free-form text per field; validation is "every field non-empty", checked
/// at submit time only.
#[derive(Debug)]
pub struct FormState {
    pub kind: FormKind,
    pub fields: Vec<FormField>,
    pub cursor: usize,
    pub in_flight: bool,
    pub error: Option<String>,
}

impl FormState {
    pub fn create_tournament() -> Self {
        Self {
            kind: FormKind::CreateTournament,
            fields: vec![
                FormField { label: "Name", value: String::new() },
                FormField { label: "Description", value: String::new() },
                // The server knows "edh" and "standard".
                FormField { label: "Format", value: "edh".to_string() },
            ],
            cursor: 0,
            in_flight: false,
            error: None,
        }
    }

    pub fn add_participant(tournament_id: u64) -> Self {
        Self {
            kind: FormKind::AddParticipant { tournament_id },
            fields: vec![FormField { label: "Name", value: String::new() }],
            cursor: 0,
            in_flight: false,
            error: None,
        }
    }

    /// Seeded with the current name so a rename starts from what is there.
    pub fn rename_participant(
        tournament_id: u64,
        participant_id: u64,
        current_name: &str,
    ) -> Self {
        Self {
            kind: FormKind::RenameParticipant { tournament_id, participant_id },
            fields: vec![FormField { label: "Name", value: current_name.to_string() }],
            cursor: 0,
            in_flight: false,
            error: None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self.kind {
            FormKind::CreateTournament => "New tournament",
            FormKind::AddParticipant { .. } => "Add player",
            FormKind::RenameParticipant { .. } => "Rename player",
        }
    }

    pub fn field(&self, index: usize) -> &str {
        self.fields.get(index).map(|f| f.value.as_str()).unwrap_or("")
    }

    pub fn push_char(&mut self, c: char) {
        if let Some(field) = self.fields.get_mut(self.cursor) {
            field.value.push(c);
        }
    }

    pub fn backspace(&mut self) {
        if let Some(field) = self.fields.get_mut(self.cursor) {
            field.value.pop();
        }
    }

    pub fn next_field(&mut self) {
        let max = self.fields.len().saturating_sub(1);
        if self.cursor < max {
            self.cursor += 1;
        }
    }

    pub fn prev_field(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn can_submit(&self) -> bool {
        !self.in_flight && self.fields.iter().all(|f| !f.value.trim().is_empty())
    }
}

// ---------------------------------------------------------------------------
// Tournament list state
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct TournamentsState {
    pub tournaments: Vec<Tournament>,
    pub page: u32,
    /// True once a short page came back; no further pages to request.
    pub last_page: bool,
    pub selected: usize,
    pub loaded: bool,
    pub error: Option<String>,
}

impl TournamentsState {
    /// Merge one fetched page. Page 1 replaces (a refetch after
    /// invalidation); later pages append.
    pub fn on_page_loaded(&mut self, page: u32, tournaments: Vec<Tournament>) {
        self.last_page = (tournaments.len() as u32) < TOURNAMENTS_LIMIT;
        if page <= 1 {
            self.tournaments = tournaments;
        } else {
            self.tournaments.extend(tournaments);
        }
        self.page = page;
        self.loaded = true;
        self.error = None;
        self.selected = self.selected.min(self.tournaments.len().saturating_sub(1));
    }

    pub fn select_next(&mut self) {
        let max = self.tournaments.len().saturating_sub(1);
        if self.selected < max {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn selected_id(&self) -> Option<u64> {
        self.tournaments.get(self.selected).map(|t| t.id)
    }
}

// ---------------------------------------------------------------------------
// Tournament detail state
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct TournamentDetailState {
    pub id: Option<u64>,
    pub tournament: Option<Tournament>,
    pub selected_round: usize,
    /// Cursor into the standings-ordered player list.
    pub player_cursor: usize,
    pub error: Option<String>,
}

impl TournamentDetailState {
    pub fn open(&mut self, id: u64) {
        if self.id != Some(id) {
            self.tournament = None;
            self.selected_round = 0;
            self.player_cursor = 0;
        }
        self.id = Some(id);
        self.error = None;
    }

    pub fn on_loaded(&mut self, tournament: Tournament) {
        if self.id == Some(tournament.id) {
            self.selected_round = self
                .selected_round
                .min(tournament.rounds.len().saturating_sub(1));
            self.player_cursor = self
                .player_cursor
                .min(tournament.participants.len().saturating_sub(1));
            self.tournament = Some(tournament);
            self.error = None;
        }
    }

    pub fn select_next_player(&mut self) {
        let max = self
            .tournament
            .as_ref()
            .map(|t| t.participants.len().saturating_sub(1))
            .unwrap_or(0);
        if self.player_cursor < max {
            self.player_cursor += 1;
        }
    }

    pub fn select_prev_player(&mut self) {
        self.player_cursor = self.player_cursor.saturating_sub(1);
    }

    /// The player under the cursor, in the same standings order the view
    /// renders.
    pub fn selected_player(&self) -> Option<&Participant> {
        let tournament = self.tournament.as_ref()?;
        ranked_participants(tournament).into_iter().nth(self.player_cursor)
    }

    pub fn select_next_round(&mut self) {
        let max = self
            .tournament
            .as_ref()
            .map(|t| t.rounds.len().saturating_sub(1))
            .unwrap_or(0);
        if self.selected_round < max {
            self.selected_round += 1;
        }
    }

    pub fn select_prev_round(&mut self) {
        self.selected_round = self.selected_round.saturating_sub(1);
    }

    pub fn selected_round_number(&self) -> Option<u32> {
        self.tournament
            .as_ref()
            .and_then(|t| t.rounds.get(self.selected_round))
            .map(|r| r.number)
    }
}

/// Standings order: highest points first, server order breaks ties.
pub fn ranked_participants(tournament: &Tournament) -> Vec<&Participant> {
    let mut ranked: Vec<&Participant> = tournament.participants.iter().collect();
    ranked.sort_by_key(|p| std::cmp::Reverse(p.points.unwrap_or(0)));
    ranked
}

/// Label for the round-start action: the final configured round gets its own
/// wording.
pub fn round_start_label(tournament: &Tournament) -> &'static str {
    if tournament.rounds.len() as u32 + 1 == tournament.round_count {
        "Start last round"
    } else {
        "Start next round"
    }
}

/// Why the round-start action is unavailable, or None when it may proceed.
/// Checked client-side so the action is disabled with an explanation instead
/// of being attempted and rejected by the server.
pub fn round_start_blocker(tournament: &Tournament) -> Option<&'static str> {
    if tournament.status == TournamentStatus::Finished {
        return Some("The tournament is finished.");
    }
    if !tournament.has_enough_participants {
        return Some("Must have at least 4 participants before starting this tournament.");
    }
    if tournament.rounds.last().is_some_and(|r| !r.is_complete) {
        return Some("The current round is still in progress. Finish all pod results first.");
    }
    None
}

// ---------------------------------------------------------------------------
// Root app state
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct AppState {
    pub active_tab: MenuItem,
    pub previous_tab: MenuItem,
    pub show_logs: bool,
    pub full_screen: bool,
    /// Transient status-line message: confirmations and generic errors.
    pub status: Option<String>,
    pub session: Session,
    pub login: LoginState,
    pub tournaments: TournamentsState,
    pub detail: TournamentDetailState,
    pub round: Option<RoundSession>,
    /// Open create/edit form, if any; captures input like the score dialog.
    pub form: Option<FormState>,
}

impl AppState {
    pub fn new(session: Session) -> Self {
        Self { session, ..Self::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tourney_api::RoundSummary;

    fn tournament(
        status: TournamentStatus,
        enough: bool,
        rounds: Vec<RoundSummary>,
    ) -> Tournament {
        Tournament {
            id: 3,
            name: "FNM".into(),
            status,
            user_id: 7,
            round_count: 3,
            has_enough_participants: enough,
            rounds,
            ..Tournament::default()
        }
    }

    fn round(number: u32, is_complete: bool) -> RoundSummary {
        RoundSummary { id: number as u64 + 10, number, is_complete }
    }

    #[test]
    fn round_start_allowed_when_latest_round_complete_and_enough_players() {
        let t = tournament(TournamentStatus::Active, true, vec![round(0, true)]);
        assert_eq!(round_start_blocker(&t), None);
    }

    #[test]
    fn round_start_blocked_while_a_round_is_in_progress() {
        let t = tournament(TournamentStatus::Active, true, vec![round(0, false)]);
        assert!(round_start_blocker(&t).unwrap().contains("still in progress"));
    }

    #[test]
    fn round_start_blocked_without_enough_participants() {
        let t = tournament(TournamentStatus::Inactive, false, vec![]);
        assert!(round_start_blocker(&t).unwrap().contains("at least 4 participants"));
    }

    #[test]
    fn round_start_blocked_on_finished_tournaments() {
        let t = tournament(TournamentStatus::Finished, true, vec![round(0, true)]);
        assert!(round_start_blocker(&t).unwrap().contains("finished"));
    }

    #[test]
    fn last_configured_round_gets_its_own_label() {
        let t = tournament(TournamentStatus::Active, true, vec![round(0, true), round(1, true)]);
        assert_eq!(round_start_label(&t), "Start last round");
        let t = tournament(TournamentStatus::Active, true, vec![round(0, true)]);
        assert_eq!(round_start_label(&t), "Start next round");
    }

    #[test]
    fn page_one_replaces_and_short_pages_mark_the_end() {
        let mut list = TournamentsState::default();
        let full: Vec<Tournament> = (0..TOURNAMENTS_LIMIT as u64)
            .map(|i| Tournament { id: i, ..Tournament::default() })
            .collect();
        list.on_page_loaded(1, full);
        assert!(!list.last_page);
        assert_eq!(list.tournaments.len(), 10);

        list.on_page_loaded(2, vec![Tournament { id: 99, ..Tournament::default() }]);
        assert!(list.last_page);
        assert_eq!(list.tournaments.len(), 11);

        // Refetch after invalidation replaces the whole list.
        list.on_page_loaded(1, vec![Tournament { id: 1, ..Tournament::default() }]);
        assert_eq!(list.tournaments.len(), 1);
        assert_eq!(list.selected, 0);
    }

    #[test]
    fn tournament_form_requires_every_field() {
        let mut form = FormState::create_tournament();
        assert!(!form.can_submit(), "name and description start empty");
        form.push_char('F');
        form.next_field();
        form.push_char('W');
        assert!(form.can_submit(), "format is pre-seeded");
        form.in_flight = true;
        assert!(!form.can_submit());
    }

    #[test]
    fn rename_form_seeds_the_current_name() {
        let mut form = FormState::rename_participant(3, 21, "Ada");
        assert_eq!(form.field(0), "Ada");
        form.backspace();
        form.push_char('n');
        assert_eq!(form.field(0), "Adn");
        assert!(form.can_submit());
    }

    #[test]
    fn standings_rank_by_points_with_stable_ties() {
        let tournament = Tournament {
            participants: vec![
                Participant { id: 1, name: "Ada".into(), points: Some(3) },
                Participant { id: 2, name: "Bo".into(), points: None },
                Participant { id: 3, name: "Cy".into(), points: Some(7) },
                Participant { id: 4, name: "Di".into(), points: Some(3) },
            ],
            ..Tournament::default()
        };
        let ranked = ranked_participants(&tournament);
        let ids: Vec<u64> = ranked.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![3, 1, 4, 2]);

        let mut detail = TournamentDetailState::default();
        detail.open(tournament.id);
        detail.on_loaded(tournament);
        detail.select_next_player();
        assert_eq!(detail.selected_player().unwrap().id, 1);
    }

    #[test]
    fn detail_ignores_responses_for_other_tournaments() {
        let mut detail = TournamentDetailState::default();
        detail.open(3);
        detail.on_loaded(Tournament { id: 4, ..Tournament::default() });
        assert!(detail.tournament.is_none());
        detail.on_loaded(Tournament { id: 3, ..Tournament::default() });
        assert!(detail.tournament.is_some());
    }
}
