//! Composition root for one app instance.
//!
//! Opens the local store, resolves the installation identity once, and
//! wires the score store, history store, leaderboard service and
//! detector client together. The FFI layer holds exactly one of these
//! per `create_app` call.

use std::sync::Arc;

use log::info;

use crate::app_response::AppResponse;
use crate::classify::DetectorClient;
use crate::history::HistoryStore;
use crate::identity::IdentityProvider;
use crate::leaderboard::{LeaderboardService, RankingClient};
use crate::local_store::LocalStore;
use crate::models::AppConfig;
use crate::score::ScoreStore;

pub struct AppState {
    store: Arc<LocalStore>,
    identity: IdentityProvider,
    scores: ScoreStore,
    history: HistoryStore,
    leaderboard: LeaderboardService,
    detector: DetectorClient,
}

impl AppState {
    pub fn init(name: &str, config: AppConfig) -> Result<Self, AppResponse> {
        let store = Arc::new(LocalStore::init(name)?);
        let identity = IdentityProvider::load_or_create(&store);
        info!("App core ready, playing as {}", identity.display_name());

        let client = Arc::new(RankingClient::new(&config.ranking_base_url)?);
        let scores = ScoreStore::new(Arc::clone(&store), Arc::clone(&client), identity.clone());
        let history = HistoryStore::new(Arc::clone(&store));
        let leaderboard = LeaderboardService::new(
            Arc::clone(&store),
            client,
            identity.clone(),
            scores.clone(),
        );
        let detector = DetectorClient::new(config.detector)?;

        Ok(Self {
            store,
            identity,
            scores,
            history,
            leaderboard,
            detector,
        })
    }

    pub fn identity(&self) -> &IdentityProvider {
        &self.identity
    }

    pub fn scores(&self) -> &ScoreStore {
        &self.scores
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn leaderboard(&self) -> &LeaderboardService {
        &self.leaderboard
    }

    pub fn detector(&self) -> &DetectorClient {
        &self.detector
    }

    /// Clears the persisted device identifier. The identity already
    /// loaded by this instance keeps serving until the next launch.
    pub fn reset_identity(&self) -> Result<(), AppResponse> {
        IdentityProvider::clear(&self.store)
    }

    /// Irreversibly wipes every persisted key: identity, score, history
    /// and the cached fallback leaderboard.
    pub fn wipe_all_data(&self) -> Result<(), AppResponse> {
        self.store.clear_all()?;
        info!("All local data wiped");
        Ok(())
    }

    /// Flushes the store so the shell can tear down at a durable point.
    pub fn close(&self) -> Result<(), AppResponse> {
        self.store.close()
    }
}
