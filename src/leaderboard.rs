//! Leaderboard reconciliation.
//!
//! The ranking service is the authority when it answers; when it does
//! not, the core reconstructs a plausible board from the cached (or
//! synthesized) local ranking plus the device's own score. Either way
//! the list handed to the shell is ordered by score descending with
//! contiguous ranks from 1 and at most one highlighted row.

use std::sync::Arc;
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use log::{info, warn};
use rand::Rng;

use crate::app_response::AppResponse;
use crate::identity::{self, IdentityProvider};
use crate::local_store::LocalStore;
use crate::models::{LeaderboardEntry, RemoteRecord};
use crate::score::ScoreStore;

pub const LEADERBOARD_KEY: &str = "@leaderboard_data";

/// Number of entries requested from the ranking service and synthesized
/// for the fallback board.
pub const TOP_N: usize = 20;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Blocking client for the hosted ranking service.
///
/// Every endpoint treats a transport error, a timeout or a non-success
/// status as a recoverable failure; nothing here retries.
pub struct RankingClient {
    http: reqwest::blocking::Client,
    base_url: String,
}

impl RankingClient {
    pub fn new(base_url: &str) -> Result<Self, AppResponse> {
        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// `POST /leaderboard/{name}` with the new total.
    pub fn submit_score(&self, display_name: &str, score: i64) -> Result<(), AppResponse> {
        let url = format!("{}/leaderboard/{}", self.base_url, display_name);
        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "score": score }))
            .send()?;
        if !response.status().is_success() {
            return Err(AppResponse::NetworkError(format!(
                "Score submission rejected with status {}",
                response.status()
            )));
        }
        Ok(())
    }

    /// `GET /leaderboard/{name}`. A non-success status means "no record"
    /// and maps to `Ok(None)`; only transport failures error.
    pub fn fetch_user(&self, display_name: &str) -> Result<Option<RemoteRecord>, AppResponse> {
        let url = format!("{}/leaderboard/{}", self.base_url, display_name);
        let response = self.http.get(&url).send()?;
        if !response.status().is_success() {
            return Ok(None);
        }
        Ok(Some(response.json::<RemoteRecord>()?))
    }

    /// `GET /leaderboard/top/{n}`, ordered by the service.
    pub fn fetch_top(&self, n: usize) -> Result<Vec<RemoteRecord>, AppResponse> {
        let url = format!("{}/leaderboard/top/{}", self.base_url, n);
        let response = self.http.get(&url).send()?;
        if !response.status().is_success() {
            return Err(AppResponse::NetworkError(format!(
                "Leaderboard fetch failed with status {}",
                response.status()
            )));
        }
        Ok(response.json::<Vec<RemoteRecord>>()?)
    }
}

/// Where a reconciled board came from. The shell-facing call unwraps
/// this; it exists so the remote-vs-local duality stays explicit and
/// testable.
#[derive(Debug)]
pub enum RankingSource {
    /// Entries mapped straight from a successful remote fetch.
    Fresh(Vec<LeaderboardEntry>),
    /// Entries reconstructed from cached/synthesized local state.
    Fallback(Vec<LeaderboardEntry>),
}

impl RankingSource {
    pub fn into_entries(self) -> Vec<LeaderboardEntry> {
        match self {
            RankingSource::Fresh(entries) => entries,
            RankingSource::Fallback(entries) => entries,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, RankingSource::Fallback(_))
    }
}

fn now_stamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Stable re-sort by score descending, then contiguous ranks from 1.
/// Equal scores keep their incoming relative order; that tie-break is
/// load-bearing and covered by tests.
pub(crate) fn rerank(entries: &mut [LeaderboardEntry]) {
    entries.sort_by(|a, b| b.score.cmp(&a.score));
    for (i, entry) in entries.iter_mut().enumerate() {
        entry.rank = (i + 1) as u32;
    }
}

pub(crate) fn remote_to_entry(record: RemoteRecord, current_name: &str) -> LeaderboardEntry {
    let is_current_user = record.user_id == current_name;
    LeaderboardEntry {
        display_name: record.user_id.clone(),
        user_id: record.user_id,
        score: record.score,
        rank: record.rank,
        last_updated: record.last_updated,
        is_current_user,
    }
}

fn current_user_entry(display_name: &str, score: i64, rank: u32) -> LeaderboardEntry {
    LeaderboardEntry {
        user_id: display_name.to_string(),
        display_name: display_name.to_string(),
        score,
        rank,
        last_updated: now_stamp(),
        is_current_user: true,
    }
}

/// Twenty placeholder rows with random pseudonyms and scores, ranked.
pub(crate) fn synthesize_placeholders() -> Vec<LeaderboardEntry> {
    let mut rng = rand::thread_rng();
    let stamp = now_stamp();
    let mut entries: Vec<LeaderboardEntry> = (0..TOP_N)
        .map(|_| {
            let name = identity::random_name();
            LeaderboardEntry {
                user_id: name.clone(),
                display_name: name,
                score: rng.gen_range(100..10_100),
                rank: 0,
                last_updated: stamp.clone(),
                is_current_user: false,
            }
        })
        .collect();
    rerank(&mut entries);
    entries
}

pub struct LeaderboardService {
    store: Arc<LocalStore>,
    client: Arc<RankingClient>,
    identity: IdentityProvider,
    scores: ScoreStore,
}

impl LeaderboardService {
    pub fn new(
        store: Arc<LocalStore>,
        client: Arc<RankingClient>,
        identity: IdentityProvider,
        scores: ScoreStore,
    ) -> Self {
        Self {
            store,
            client,
            identity,
            scores,
        }
    }

    /// The shell-facing board: [`Self::fetch_ranked`] unwrapped.
    pub fn get_leaderboard(&self) -> Vec<LeaderboardEntry> {
        self.fetch_ranked().into_entries()
    }

    /// Reconciles remote and local state into an ordered board.
    ///
    /// Remote success keeps the server's ordering and ranks untouched.
    /// Remote failure of any kind reconstructs a board locally and
    /// caches it. On both paths, a positive local score that is missing
    /// from the list is appended and the board re-ranked, so the
    /// device's own progress is never silently dropped.
    pub fn fetch_ranked(&self) -> RankingSource {
        let name = self.identity.display_name();
        let local_score = self.scores.get();

        let (mut entries, fresh) = match self.client.fetch_top(TOP_N) {
            Ok(records) => {
                let entries: Vec<LeaderboardEntry> = records
                    .into_iter()
                    .map(|record| remote_to_entry(record, name))
                    .collect();
                (entries, true)
            }
            Err(e) => {
                warn!("Ranking service unavailable, using local fallback: {}", e);
                (self.fallback_entries(local_score), false)
            }
        };

        if local_score > 0 && !entries.iter().any(|entry| entry.user_id == name) {
            entries.push(current_user_entry(name, local_score, entries.len() as u32 + 1));
            rerank(&mut entries);
        }

        if fresh {
            RankingSource::Fresh(entries)
        } else {
            RankingSource::Fallback(entries)
        }
    }

    /// Fetches a single user's remote record. Absent records, non-success
    /// statuses and network failures all read as `None` — "not yet
    /// ranked" is a valid outcome, not an error.
    pub fn get_user_entry(&self, display_name: &str) -> Option<LeaderboardEntry> {
        match self.client.fetch_user(display_name) {
            Ok(Some(record)) => Some(LeaderboardEntry {
                display_name: record.user_id.clone(),
                user_id: record.user_id,
                score: record.score,
                rank: record.rank,
                last_updated: record.last_updated,
                is_current_user: true,
            }),
            Ok(None) => None,
            Err(e) => {
                warn!("Could not fetch user record for {}: {}", display_name, e);
                None
            }
        }
    }

    /// Builds the offline board: cached list (or fresh placeholders),
    /// minus any row for the current identity, plus the current user at
    /// their local score, re-ranked and re-cached.
    fn fallback_entries(&self, local_score: i64) -> Vec<LeaderboardEntry> {
        let mut entries = match self.load_cached() {
            Some(cached) => cached,
            None => {
                info!("No cached leaderboard, synthesizing placeholder board");
                synthesize_placeholders()
            }
        };

        let name = self.identity.display_name();
        let device_id = self.identity.device_id();
        entries.retain(|entry| entry.user_id != name && entry.user_id != device_id);
        entries.push(current_user_entry(name, local_score, 0));
        rerank(&mut entries);

        if let Err(e) = self.cache_entries(&entries) {
            warn!("Could not cache fallback leaderboard: {}", e);
        }

        entries
    }

    /// Cached fallback board, if present and readable. Highlight flags
    /// are stripped on load; a stale flag written under a previous
    /// identity must not survive into a new board.
    fn load_cached(&self) -> Option<Vec<LeaderboardEntry>> {
        let raw = match self.store.get(LEADERBOARD_KEY) {
            Ok(value) => value?,
            Err(e) => {
                warn!("Could not read cached leaderboard: {}", e);
                return None;
            }
        };
        match serde_json::from_str::<Vec<LeaderboardEntry>>(&raw) {
            Ok(mut entries) => {
                for entry in &mut entries {
                    entry.is_current_user = false;
                }
                Some(entries)
            }
            Err(e) => {
                warn!("Cached leaderboard is unreadable, discarding: {}", e);
                None
            }
        }
    }

    fn cache_entries(&self, entries: &[LeaderboardEntry]) -> Result<(), AppResponse> {
        let json = serde_json::to_string(entries)?;
        self.store.put(LEADERBOARD_KEY, &json)
    }
}
