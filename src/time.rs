use chrono::{DateTime, Duration, Utc};
use tourney_api::parse_server_timestamp;

/// Format the time remaining until a round expires, as of now.
///
/// `inserted_at` is the round's creation timestamp as the server sent it;
/// the expiry is creation plus the configured length. The caller re-invokes
/// this once a second while the round is incomplete.
pub fn format_remaining(inserted_at: &str, round_length_seconds: i64) -> String {
    format_remaining_at(inserted_at, round_length_seconds, Utc::now())
}

/// Pure form of [`format_remaining`] with an explicit clock.
///
/// Renders the smallest representation that fits: `D:HH:MM:SS` when days
/// remain, `H:MM:SS` when hours do, otherwise `MM:SS`. An expired round is
/// always `"00:00"` — the clock never goes negative, and an unparseable or
/// missing timestamp reads as expired rather than erroring.
pub fn format_remaining_at(
    inserted_at: &str,
    round_length_seconds: i64,
    now: DateTime<Utc>,
) -> String {
    let Some(start) = parse_server_timestamp(inserted_at) else {
        return "00:00".to_string();
    };
    let expiry = start + Duration::seconds(round_length_seconds);
    let remaining = (expiry - now).num_seconds();
    if remaining <= 0 {
        return "00:00".to_string();
    }

    let days = remaining / 86_400;
    let hours = (remaining % 86_400) / 3_600;
    let minutes = (remaining % 3_600) / 60;
    let seconds = remaining % 60;

    if days > 0 {
        format!("{days}:{hours:02}:{minutes:02}:{seconds:02}")
    } else if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}
