use crate::state::messages::NetworkRequest;
use tokio::sync::mpsc;

/// Cache keys for the server-derived views the app holds. Mirrors the shape
/// of the fetch endpoints: the list, one tournament, one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKey {
    Tournaments,
    Tournament(u64),
    Round { tournament_id: u64, number: u32 },
}

/// Invalidate-by-key capability. After a successful mutation the caller
/// invalidates every dependent view instead of patching local copies; server
/// truth (pairing activity, round completion) is only ever refetched.
pub trait QueryInvalidator {
    fn invalidate(&mut self, key: QueryKey);
}

/// Production invalidator: each invalidated key becomes a refetch request on
/// the network worker's queue, so the owning view re-renders from fresh data.
pub struct CacheBus {
    requests: mpsc::Sender<NetworkRequest>,
}

impl CacheBus {
    pub fn new(requests: mpsc::Sender<NetworkRequest>) -> Self {
        Self { requests }
    }
}

impl QueryInvalidator for CacheBus {
    fn invalidate(&mut self, key: QueryKey) {
        let request = match key {
            QueryKey::Tournaments => NetworkRequest::LoadTournaments { page: 1 },
            QueryKey::Tournament(id) => NetworkRequest::LoadTournament { id },
            QueryKey::Round { tournament_id, number } => {
                NetworkRequest::LoadRound { tournament_id, number }
            }
        };
        // A dropped refetch is recoverable with a manual refresh; do not
        // block the UI loop on a full queue.
        if self.requests.try_send(request).is_err() {
            log::warn!("cache refetch queue full, dropped {key:?}");
        }
    }
}
