use crate::domain::model::{Card, Identity, UserContext, Wager};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Supplies the ordered card stack. Each call replaces the previous stack.
#[async_trait]
pub trait FeedProvider: Send + Sync {
    async fn fetch_feed(&self, user: &UserContext) -> Result<Vec<Card>>;
}

/// System of record for decisions.
#[async_trait]
pub trait DecisionSink: Send + Sync {
    async fn record_decision(&self, wager: &Wager) -> Result<()>;
}

/// Maps an identity-provider user onto a backend user row.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn sync_user(&self, identity: &Identity) -> Result<String>;
}

/// Raw market queries the recommended feed is built from.
#[async_trait]
pub trait MarketSource: Send + Sync {
    async fn match_markets(&self, user_id: &str, threshold: f64, count: usize)
        -> Result<Vec<Card>>;
    async fn open_markets(&self, limit: usize) -> Result<Vec<Card>>;
}

/// One heavy impact pulse, fired when a card is decided.
pub trait Haptics: Send + Sync {
    fn impact(&self) -> Result<()>;
}
