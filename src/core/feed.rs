use crate::domain::model::{Card, UserContext};
use crate::domain::ports::{FeedProvider, MarketSource};
use crate::utils::error::Result;
use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq)]
pub struct FeedSettings {
    /// Minimum similarity passed to the recommendation procedure.
    pub match_threshold: f64,
    pub match_count: usize,
    pub global_limit: usize,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            // low on purpose so a fresh user still sees content
            match_threshold: 0.0,
            match_count: 10,
            global_limit: 10,
        }
    }
}

/// Personalised markets for synced users, newest open markets for everyone else.
///
/// An error or an empty result from the personalised query falls through to
/// the global feed; only a failing global query is reported.
pub struct RecommendedFeed<S: MarketSource> {
    source: S,
    settings: FeedSettings,
}

impl<S: MarketSource> RecommendedFeed<S> {
    pub fn new(source: S, settings: FeedSettings) -> Self {
        Self { source, settings }
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

#[async_trait]
impl<S: MarketSource> FeedProvider for RecommendedFeed<S> {
    async fn fetch_feed(&self, user: &UserContext) -> Result<Vec<Card>> {
        if let Some(user_id) = &user.user_id {
            tracing::info!("🧠 Fetching personalised feed for {}", user_id);
            match self
                .source
                .match_markets(
                    user_id,
                    self.settings.match_threshold,
                    self.settings.match_count,
                )
                .await
            {
                Ok(cards) if !cards.is_empty() => return Ok(cards),
                Ok(_) => tracing::info!("No personalised matches for {}", user_id),
                Err(e) => tracing::warn!("Personalised feed failed: {}", e),
            }
        }

        tracing::info!("🌍 Fetching global feed");
        self.source.open_markets(self.settings.global_limit).await
    }
}
