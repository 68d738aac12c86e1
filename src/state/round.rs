use crate::state::cache::{QueryInvalidator, QueryKey};
use crate::time;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tourney_api::{Pairing, Round, RoundResult};

// ---------------------------------------------------------------------------
// Pairing grouper
// ---------------------------------------------------------------------------

/// A table (pod) reconstructed from the round's flat pairing list.
#[derive(Debug, Clone)]
pub struct TableView {
    pub table: u32,
    /// Pairings in input order; not re-sorted within the table.
    pub players: Vec<Pairing>,
    /// True unless every pairing is explicitly marked inactive.
    pub active: bool,
}

impl TableView {
    pub fn is_bye(&self) -> bool {
        self.players.len() == 1
    }
}

/// Group a round's pairings into tables, ascending by table number.
///
/// A pure projection of the input: re-running it after every refresh yields
/// the same grouping for the same pairings, with no stale tables carried
/// over. A pairing counts toward a table's activity unless its flag is an
/// explicit `false`.
pub fn group_by_table(pairings: &[Pairing]) -> Vec<TableView> {
    let mut grouped: BTreeMap<u32, Vec<Pairing>> = BTreeMap::new();
    for pairing in pairings {
        grouped.entry(pairing.number).or_default().push(pairing.clone());
    }
    grouped
        .into_iter()
        .map(|(table, players)| {
            let active = players.iter().any(|p| p.active != Some(false));
            TableView { table, players, active }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Score edit buffer
// ---------------------------------------------------------------------------

/// Result-entry dialog for one table: the table snapshot taken at open time
/// plus one raw text entry per participant. Exists only while the dialog is
/// open; cancelling or a successful submit drops it whole, so reopening
/// always reseeds from the latest server-known points.
#[derive(Debug, Clone)]
pub struct ScoreDialog {
    pub table: TableView,
    scores: BTreeMap<u64, String>,
    /// Which participant row the cursor is on.
    pub cursor: usize,
    pub submitting: bool,
    pub error: Option<String>,
}

impl ScoreDialog {
    pub fn open(table: TableView) -> Self {
        let scores = table
            .players
            .iter()
            .map(|p| (p.participant_id, p.points.unwrap_or(0).to_string()))
            .collect();
        Self { table, scores, cursor: 0, submitting: false, error: None }
    }

    pub fn value(&self, participant_id: u64) -> &str {
        self.scores.get(&participant_id).map(String::as_str).unwrap_or("")
    }

    /// Overwrite one entry. No validation at edit time; anything the user
    /// types is held verbatim until submission.
    pub fn set_value(&mut self, participant_id: u64, text: impl Into<String>) {
        if self.scores.contains_key(&participant_id) {
            self.scores.insert(participant_id, text.into());
        }
    }

    pub fn cursor_participant(&self) -> Option<u64> {
        self.table.players.get(self.cursor).map(|p| p.participant_id)
    }

    pub fn push_char(&mut self, c: char) {
        if let Some(id) = self.cursor_participant()
            && let Some(entry) = self.scores.get_mut(&id)
        {
            entry.push(c);
        }
    }

    pub fn backspace(&mut self) {
        if let Some(id) = self.cursor_participant()
            && let Some(entry) = self.scores.get_mut(&id)
        {
            entry.pop();
        }
    }

    pub fn cursor_down(&mut self) {
        let max = self.table.players.len().saturating_sub(1);
        if self.cursor < max {
            self.cursor += 1;
        }
    }

    pub fn cursor_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// One result per participant in the table. Text that fails to parse as
    /// an integer is coerced to 0: result entry must never block the
    /// organizer at the table, so malformed input silently becomes zero
    /// instead of a validation error.
    pub fn validated_results(&self) -> Vec<RoundResult> {
        self.table
            .players
            .iter()
            .map(|p| {
                let raw = self.value(p.participant_id);
                RoundResult {
                    participant_id: p.participant_id,
                    points: raw.trim().parse().unwrap_or(0),
                }
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Round session
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundPhase {
    Loading,
    Loaded,
    /// Terminal until the user triggers a manual refresh.
    Failed(String),
}

/// State for one round view: the fetched round, its derived tables, the
/// countdown string, and at most one open score dialog.
#[derive(Debug)]
pub struct RoundSession {
    pub tournament_id: u64,
    pub number: u32,
    pub phase: RoundPhase,
    pub round: Option<Round>,
    pub tables: Vec<TableView>,
    pub dialog: Option<ScoreDialog>,
    pub clock: String,
    /// Table cursor in the list view.
    pub selected: usize,
}

impl RoundSession {
    pub fn new(tournament_id: u64, number: u32) -> Self {
        Self {
            tournament_id,
            number,
            phase: RoundPhase::Loading,
            round: None,
            tables: Vec::new(),
            dialog: None,
            clock: "00:00".to_string(),
            selected: 0,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.round.as_ref().is_some_and(|r| r.is_complete)
    }

    /// Store freshly fetched round data and rebuild the table list. An open
    /// dialog keeps its buffer untouched — a background refresh must never
    /// overwrite in-progress edits.
    pub fn on_round_loaded(&mut self, round: Round, now: DateTime<Utc>) {
        self.tables = group_by_table(&round.pairings);
        self.selected = self.selected.min(self.tables.len().saturating_sub(1));
        self.phase = RoundPhase::Loaded;
        self.round = Some(round);
        self.update_clock(now);
    }

    pub fn on_load_failed(&mut self, message: String) {
        self.phase = RoundPhase::Failed(message);
    }

    /// Manual refresh out of the Failed (or any) state.
    pub fn begin_refresh(&mut self) {
        self.phase = RoundPhase::Loading;
    }

    /// Recompute the countdown string. Frozen once the round is complete.
    pub fn update_clock(&mut self, now: DateTime<Utc>) {
        if let Some(round) = &self.round
            && !round.is_complete
        {
            self.clock =
                time::format_remaining_at(&round.inserted_at, round.length_seconds(), now);
        }
    }

    pub fn select_next_table(&mut self) {
        let max = self.tables.len().saturating_sub(1);
        if self.selected < max {
            self.selected += 1;
        }
    }

    pub fn select_prev_table(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Whether the selected table offers a result-entry action: owners only,
    /// active tables only. Non-owners and completed tables get no action at
    /// all rather than a rejected attempt.
    pub fn can_enter_results(&self, is_owner: bool) -> bool {
        is_owner
            && self.phase == RoundPhase::Loaded
            && self.tables.get(self.selected).is_some_and(|t| t.active)
    }

    /// Open the score dialog for the selected table, seeding the buffer from
    /// the table's last known points.
    pub fn open_dialog(&mut self, is_owner: bool) -> bool {
        if self.dialog.is_some() || !self.can_enter_results(is_owner) {
            return false;
        }
        let table = self.tables[self.selected].clone();
        self.dialog = Some(ScoreDialog::open(table));
        true
    }

    /// Close the dialog without submitting. The buffer is discarded; an
    /// in-flight submission, if any, is not cancelled.
    pub fn cancel_dialog(&mut self) {
        self.dialog = None;
    }

    /// Mark the dialog as submitting and return the tagged, validated
    /// results to send. None if no dialog is open or one is already in
    /// flight.
    pub fn begin_submit(&mut self) -> Option<(u32, Vec<RoundResult>)> {
        let dialog = self.dialog.as_mut()?;
        if dialog.submitting {
            return None;
        }
        dialog.submitting = true;
        dialog.error = None;
        Some((dialog.table.table, dialog.validated_results()))
    }

    /// Submission for `table` succeeded: close that dialog if it is still
    /// the open one, and invalidate the two views that now hold stale data —
    /// this round and its parent tournament. Completion state is refetched,
    /// never guessed here.
    pub fn on_submit_ok(&mut self, table: u32, cache: &mut dyn QueryInvalidator) {
        if self
            .dialog
            .as_ref()
            .is_some_and(|d| d.submitting && d.table.table == table)
        {
            self.dialog = None;
        }
        cache.invalidate(QueryKey::Round {
            tournament_id: self.tournament_id,
            number: self.number,
        });
        cache.invalidate(QueryKey::Tournament(self.tournament_id));
    }

    /// Submission for `table` failed. If its dialog is still open the buffer
    /// is kept exactly as typed so the organizer can correct and resubmit;
    /// returns false when the dialog is gone and the caller should surface
    /// the message elsewhere.
    pub fn on_submit_failed(&mut self, table: u32, message: String) -> bool {
        if let Some(dialog) = self
            .dialog
            .as_mut()
            .filter(|d| d.submitting && d.table.table == table)
        {
            dialog.submitting = false;
            dialog.error = Some(message);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn pairing(id: u64, table: u32, participant_id: u64, active: Option<bool>) -> Pairing {
        Pairing {
            id,
            number: table,
            participant_id,
            points: None,
            active,
            participant: None,
        }
    }

    fn two_table_round() -> Vec<Pairing> {
        vec![
            pairing(1, 1, 101, None),
            pairing(2, 1, 102, None),
            pairing(3, 2, 103, Some(false)),
        ]
    }

    #[derive(Default)]
    struct RecordingCache {
        keys: Vec<QueryKey>,
    }

    impl QueryInvalidator for RecordingCache {
        fn invalidate(&mut self, key: QueryKey) {
            self.keys.push(key);
        }
    }

    fn loaded_session(pairings: Vec<Pairing>) -> RoundSession {
        let mut session = RoundSession::new(3, 0);
        let round = Round {
            id: 11,
            number: 0,
            tournament_id: 3,
            inserted_at: "2026-08-24T18:00:00".into(),
            length_minutes: None,
            is_complete: false,
            pairings,
        };
        session.on_round_loaded(round, Utc.with_ymd_and_hms(2026, 8, 24, 18, 30, 0).unwrap());
        session
    }

    // -- grouper --

    #[test]
    fn groups_ascending_with_stable_player_order() {
        let pairings = vec![
            pairing(1, 2, 103, None),
            pairing(2, 1, 102, None),
            pairing(3, 1, 101, None),
        ];
        let tables = group_by_table(&pairings);
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].table, 1);
        // Input order within the table, not participant order.
        assert_eq!(tables[0].players[0].participant_id, 102);
        assert_eq!(tables[0].players[1].participant_id, 101);
        assert_eq!(tables[1].table, 2);
    }

    #[test]
    fn table_inactive_only_when_every_pairing_explicitly_inactive() {
        let all_done = vec![
            pairing(1, 1, 101, Some(false)),
            pairing(2, 1, 102, Some(false)),
        ];
        assert!(!group_by_table(&all_done)[0].active);

        let one_unset = vec![
            pairing(1, 1, 101, Some(false)),
            pairing(2, 1, 102, None),
        ];
        assert!(group_by_table(&one_unset)[0].active);

        let one_true = vec![
            pairing(1, 1, 101, Some(false)),
            pairing(2, 1, 102, Some(true)),
        ];
        assert!(group_by_table(&one_true)[0].active);
    }

    #[test]
    fn single_player_table_is_a_bye() {
        let tables = group_by_table(&[pairing(1, 4, 101, None)]);
        assert!(tables[0].is_bye());
    }

    #[test]
    fn empty_input_yields_empty_grouping() {
        assert!(group_by_table(&[]).is_empty());
    }

    #[test]
    fn grouping_is_idempotent() {
        let tables = group_by_table(&two_table_round());
        let flattened: Vec<Pairing> = tables
            .iter()
            .flat_map(|t| t.players.iter().cloned())
            .collect();
        let regrouped = group_by_table(&flattened);
        assert_eq!(tables.len(), regrouped.len());
        for (a, b) in tables.iter().zip(regrouped.iter()) {
            assert_eq!(a.table, b.table);
            assert_eq!(a.active, b.active);
            assert_eq!(a.players, b.players);
        }
    }

    #[test]
    fn two_table_scenario_only_offers_entry_on_the_active_table() {
        let mut session = loaded_session(two_table_round());
        let tables = &session.tables;
        assert_eq!(tables[0].table, 1);
        assert!(tables[0].active);
        assert_eq!(tables[1].table, 2);
        assert!(!tables[1].active);
        assert!(tables[1].is_bye());

        session.selected = 0;
        assert!(session.can_enter_results(true));
        assert!(!session.can_enter_results(false), "non-owner gets no action");
        session.selected = 1;
        assert!(!session.can_enter_results(true), "inactive table gets no action");
    }

    // -- score buffer --

    #[test]
    fn dialog_seeds_from_known_points_defaulting_to_zero() {
        let mut players = vec![pairing(1, 1, 101, None), pairing(2, 1, 102, None)];
        players[0].points = Some(4);
        let dialog = ScoreDialog::open(TableView { table: 1, players, active: true });
        assert_eq!(dialog.value(101), "4");
        assert_eq!(dialog.value(102), "0");
    }

    #[test]
    fn malformed_entries_coerce_to_zero() {
        let players = vec![pairing(1, 1, 3, None), pairing(2, 1, 4, None)];
        let mut dialog = ScoreDialog::open(TableView { table: 1, players, active: true });
        dialog.set_value(3, "5");
        dialog.set_value(4, "abc");
        assert_eq!(
            dialog.validated_results(),
            vec![
                RoundResult { participant_id: 3, points: 5 },
                RoundResult { participant_id: 4, points: 0 },
            ]
        );
    }

    #[test]
    fn set_value_ignores_participants_outside_the_table() {
        let players = vec![pairing(1, 1, 3, None)];
        let mut dialog = ScoreDialog::open(TableView { table: 1, players, active: true });
        dialog.set_value(99, "7");
        assert_eq!(dialog.validated_results().len(), 1);
    }

    #[test]
    fn typing_edits_the_cursor_row() {
        let players = vec![pairing(1, 1, 3, None), pairing(2, 1, 4, None)];
        let mut dialog = ScoreDialog::open(TableView { table: 1, players, active: true });
        dialog.backspace(); // clear the seeded "0"
        dialog.push_char('1');
        dialog.push_char('2');
        dialog.cursor_down();
        dialog.backspace();
        dialog.push_char('7');
        assert_eq!(dialog.value(3), "12");
        assert_eq!(dialog.value(4), "7");
    }

    #[test]
    fn free_form_typing_is_held_verbatim_and_coerced_at_submit() {
        let players = vec![pairing(1, 1, 3, None)];
        let mut dialog = ScoreDialog::open(TableView { table: 1, players, active: true });
        dialog.backspace();
        for c in "4 pts".chars() {
            dialog.push_char(c);
        }
        assert_eq!(dialog.value(3), "4 pts");
        assert_eq!(dialog.validated_results()[0].points, 0);
    }

    // -- session state machine --

    #[test]
    fn load_failure_is_terminal_until_manual_refresh() {
        let mut session = RoundSession::new(3, 0);
        session.on_load_failed("boom".into());
        assert_eq!(session.phase, RoundPhase::Failed("boom".into()));
        assert!(!session.can_enter_results(true));
        session.begin_refresh();
        assert_eq!(session.phase, RoundPhase::Loading);
    }

    #[test]
    fn submit_success_invalidates_round_then_tournament_and_nothing_else() {
        let mut session = loaded_session(two_table_round());
        assert!(session.open_dialog(true));
        let (table, _) = session.begin_submit().unwrap();

        let mut cache = RecordingCache::default();
        session.on_submit_ok(table, &mut cache);
        assert!(session.dialog.is_none(), "dialog closes on success");
        assert_eq!(
            cache.keys,
            vec![
                QueryKey::Round { tournament_id: 3, number: 0 },
                QueryKey::Tournament(3),
            ]
        );
    }

    #[test]
    fn submit_failure_keeps_buffer_for_retry() {
        let mut session = loaded_session(two_table_round());
        assert!(session.open_dialog(true));
        session.dialog.as_mut().unwrap().set_value(101, "9x");
        let (table, _) = session.begin_submit().unwrap();

        assert!(session.on_submit_failed(table, "server said no".into()));
        let dialog = session.dialog.as_ref().unwrap();
        assert!(!dialog.submitting);
        assert_eq!(dialog.error.as_deref(), Some("server said no"));
        assert_eq!(dialog.value(101), "9x", "typed values survive a failure");
    }

    #[test]
    fn reopening_after_close_reseeds_from_server_points() {
        let mut session = loaded_session(two_table_round());
        assert!(session.open_dialog(true));
        session.dialog.as_mut().unwrap().set_value(101, "42");
        session.cancel_dialog();

        assert!(session.open_dialog(true));
        assert_eq!(session.dialog.as_ref().unwrap().value(101), "0");
    }

    #[test]
    fn refresh_does_not_touch_an_open_dialog() {
        let mut session = loaded_session(two_table_round());
        assert!(session.open_dialog(true));
        session.dialog.as_mut().unwrap().set_value(101, "6");

        // Server refresh arrives with updated points while the dialog is up.
        let mut refreshed = two_table_round();
        refreshed[0].points = Some(99);
        let round = Round {
            id: 11,
            number: 0,
            tournament_id: 3,
            inserted_at: "2026-08-24T18:00:00".into(),
            is_complete: false,
            pairings: refreshed,
            ..Round::default()
        };
        session.on_round_loaded(round, Utc.with_ymd_and_hms(2026, 8, 24, 18, 40, 0).unwrap());

        assert_eq!(session.dialog.as_ref().unwrap().value(101), "6");
    }

    #[test]
    fn late_success_for_a_closed_dialog_still_invalidates_but_spares_a_new_dialog() {
        let mut session = loaded_session(two_table_round());
        assert!(session.open_dialog(true));
        let (table, _) = session.begin_submit().unwrap();
        session.cancel_dialog();

        // Organizer reopens the same table before the response lands.
        assert!(session.open_dialog(true));

        let mut cache = RecordingCache::default();
        session.on_submit_ok(table, &mut cache);
        assert_eq!(cache.keys.len(), 2, "cache reconciliation still runs");
        assert!(
            session.dialog.is_some(),
            "a dialog that was not submitting stays open"
        );
    }

    #[test]
    fn late_failure_for_a_closed_dialog_is_reported_to_the_caller() {
        let mut session = loaded_session(two_table_round());
        assert!(session.open_dialog(true));
        let (table, _) = session.begin_submit().unwrap();
        session.cancel_dialog();
        assert!(!session.on_submit_failed(table, "too late".into()));
    }

    #[test]
    fn only_one_dialog_at_a_time() {
        let mut session = loaded_session(two_table_round());
        assert!(session.open_dialog(true));
        assert!(!session.open_dialog(true));
    }

    #[test]
    fn double_submit_is_a_no_op() {
        let mut session = loaded_session(two_table_round());
        assert!(session.open_dialog(true));
        assert!(session.begin_submit().is_some());
        assert!(session.begin_submit().is_none());
    }

    #[test]
    fn clock_updates_while_incomplete_and_freezes_when_complete() {
        let mut session = loaded_session(two_table_round());
        let now = Utc.with_ymd_and_hms(2026, 8, 24, 18, 30, 0).unwrap();
        session.update_clock(now);
        assert_eq!(session.clock, "30:00");

        session.round.as_mut().unwrap().is_complete = true;
        session.update_clock(Utc.with_ymd_and_hms(2026, 8, 24, 18, 45, 0).unwrap());
        assert_eq!(session.clock, "30:00", "completed rounds never recompute expiry");
    }
}
