pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliArgs;
pub use crate::config::AppConfig;

pub use crate::adapters::{NoopHaptics, SupabaseClient};
pub use crate::core::{
    dispatch::{DecisionDispatcher, DispatchStats, RetryPolicy},
    engine::{DragEnd, SwipeDecisionEngine, SwipeSettings},
    feed::{FeedSettings, RecommendedFeed},
    session::{SwipeOutcome, SwipeSession},
};
pub use crate::domain::model::{Card, Decision, Identity, UserContext, Wager, WagerTerms};
pub use crate::utils::error::{Result, SwipeError};

use std::sync::Arc;

/// Wires a session against the configured Supabase backend.
/// Must be called from within a tokio runtime.
pub fn session_from_config(config: &AppConfig) -> Result<SwipeSession> {
    let backend = SupabaseClient::new(
        &config.backend.url,
        &config.backend.anon_key,
        config.timeout(),
    )?;

    let engine = SwipeDecisionEngine::new(config.swipe_settings(), Arc::new(NoopHaptics));
    let dispatcher = DecisionDispatcher::spawn(Arc::new(backend.clone()), config.retry_policy());
    let feed = RecommendedFeed::new(backend.clone(), config.feed_settings());

    Ok(SwipeSession::new(
        engine,
        Arc::new(feed),
        Arc::new(backend),
        dispatcher,
        config.wager_terms(),
    ))
}
