//! Local score store.
//!
//! The persisted score is the source of truth for "my score"; the
//! ranking service holds a copy that may lag. Every mutation lands
//! locally first, then is forwarded best-effort — a failed forward is
//! logged and swallowed, never surfaced to the caller.

use std::sync::Arc;

use log::{info, warn};

use crate::app_response::AppResponse;
use crate::identity::IdentityProvider;
use crate::leaderboard::RankingClient;
use crate::local_store::LocalStore;

pub const SCORE_KEY: &str = "@user_score";

/// Points awarded for a successful classification.
pub const CLASSIFICATION_AWARD: i64 = 10;
/// Bonus points awarded for submitting prediction feedback.
pub const FEEDBACK_AWARD: i64 = 5;

#[derive(Clone)]
pub struct ScoreStore {
    store: Arc<LocalStore>,
    client: Arc<RankingClient>,
    identity: IdentityProvider,
}

impl ScoreStore {
    pub fn new(
        store: Arc<LocalStore>,
        client: Arc<RankingClient>,
        identity: IdentityProvider,
    ) -> Self {
        Self {
            store,
            client,
            identity,
        }
    }

    /// Current persisted score. Total: absent, unreadable or malformed
    /// values all read as 0.
    pub fn get(&self) -> i64 {
        match self.store.get(SCORE_KEY) {
            Ok(Some(raw)) => match raw.trim().parse::<i64>() {
                Ok(score) => score,
                Err(_) => {
                    warn!("Stored score {:?} is not a number, treating as 0", raw);
                    0
                }
            },
            Ok(None) => 0,
            Err(e) => {
                warn!("Could not read score, treating as 0: {}", e);
                0
            }
        }
    }

    /// Adds `points` (may be negative) to the persisted score and
    /// forwards the new total to the ranking service under the derived
    /// display name.
    ///
    /// The read-modify-write runs inside one store transaction, so
    /// concurrent awards never drop points. Returns the new local total
    /// whether or not the forward succeeded.
    pub fn add_points(&self, points: i64) -> Result<i64, AppResponse> {
        let mut new_total = 0i64;
        self.store.update(SCORE_KEY, |current| {
            let current_score = current
                .and_then(|raw| raw.trim().parse::<i64>().ok())
                .unwrap_or(0);
            new_total = current_score.saturating_add(points);
            Some(new_total.to_string())
        })?;

        if let Err(e) = self
            .client
            .submit_score(self.identity.display_name(), new_total)
        {
            warn!("Score sync to ranking service failed, keeping local total: {}", e);
        }

        Ok(new_total)
    }

    pub fn award_classification(&self) -> Result<i64, AppResponse> {
        self.add_points(CLASSIFICATION_AWARD)
    }

    pub fn award_feedback(&self) -> Result<i64, AppResponse> {
        self.add_points(FEEDBACK_AWARD)
    }

    /// Clears the persisted score back to absent (reads as 0).
    pub fn reset(&self) -> Result<(), AppResponse> {
        self.store.remove(SCORE_KEY)?;
        info!("User score reset");
        Ok(())
    }
}
