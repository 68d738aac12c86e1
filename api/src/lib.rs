pub mod client;
pub mod wire;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Domain types — mirror the organizer REST API's JSON model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub email: String,
}

/// Successful login payload: the bearer token plus the identity used for
/// ownership checks client-side.
#[derive(Debug, Clone, Deserialize)]
pub struct Login {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TournamentStatus {
    /// Registration open, no rounds yet.
    #[default]
    Inactive,
    /// Rounds under way.
    Active,
    /// All rounds played.
    Finished,
}

impl TournamentStatus {
    pub fn label(&self) -> &'static str {
        match self {
            TournamentStatus::Inactive => "Open (registering)",
            TournamentStatus::Active => "In progress",
            TournamentStatus::Finished => "Finished",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Tournament {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub description_raw: String,
    #[serde(default)]
    pub status: TournamentStatus,
    /// Identity of the organizer who created the tournament. Only this user
    /// may record results or start rounds.
    pub user_id: u64,
    #[serde(default)]
    pub round_count: u32,
    #[serde(default)]
    pub has_enough_participants: bool,
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub rounds: Vec<RoundSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Participant {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub points: Option<i64>,
}

/// Round as embedded in a tournament response: enough to list rounds and
/// gate the next-round action, without the pairing payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoundSummary {
    pub id: u64,
    pub number: u32,
    #[serde(default)]
    pub is_complete: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Round {
    pub id: u64,
    /// 0-based sequence number within the tournament.
    pub number: u32,
    pub tournament_id: u64,
    /// Raw server timestamp. The server emits UTC but not always with a
    /// marker; parse through [`parse_server_timestamp`].
    #[serde(default)]
    pub inserted_at: String,
    #[serde(default)]
    pub length_minutes: Option<u32>,
    #[serde(default)]
    pub is_complete: bool,
    #[serde(default)]
    pub pairings: Vec<Pairing>,
}

impl Round {
    /// Configured round length in seconds; the API omits the field for
    /// tournaments using the default of one hour.
    pub fn length_seconds(&self) -> i64 {
        i64::from(self.length_minutes.unwrap_or(60)) * 60
    }
}

/// One participant's assignment to a table within a round. A table groups
/// all pairings sharing `number`; a single-pairing table is a bye.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Pairing {
    pub id: u64,
    /// Table/pod number.
    pub number: u32,
    pub participant_id: u64,
    #[serde(default)]
    pub points: Option<i64>,
    /// `Some(false)` marks the pairing resolved. Absent counts as active.
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub participant: Option<Participant>,
}

impl Pairing {
    pub fn participant_name(&self) -> &str {
        self.participant
            .as_ref()
            .map(|p| p.name.as_str())
            .unwrap_or("Unknown player")
    }
}

/// One line of a table's submitted result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundResult {
    pub participant_id: u64,
    pub points: i64,
}

/// Response to starting a round. Older servers acknowledge without a round
/// number, in which case callers fall back to a generic confirmation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewRound {
    #[serde(default)]
    pub number: Option<u32>,
}

/// Parse a server timestamp, coercing marker-less values to UTC.
///
/// The server always emits UTC; a timestamp missing its `Z` must not be read
/// in the client's local zone or every round clock would be skewed by the
/// viewer's UTC offset.
pub fn parse_server_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}
