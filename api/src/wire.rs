//! Request/response envelopes for the organizer REST API. Resource payloads
//! arrive wrapped in `{"data": ...}`; mutations post named wrappers.

use crate::RoundResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ResultsRequest<'a> {
    pub results: &'a [RoundResult],
}

#[derive(Debug, Serialize)]
pub struct TournamentRequest<'a> {
    pub tournament: TournamentFields<'a>,
}

#[derive(Debug, Serialize)]
pub struct TournamentFields<'a> {
    pub name: &'a str,
    pub description_raw: &'a str,
    pub format: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ParticipantRequest<'a> {
    pub participant: ParticipantFields<'a>,
}

#[derive(Debug, Serialize)]
pub struct ParticipantFields<'a> {
    pub name: &'a str,
}

/// Error bodies vary: `{"error": "..."}` for auth and business-rule
/// rejections, `{"message": "..."}` from the framework layer.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.error.or(self.message).filter(|m| !m.trim().is_empty())
    }
}
