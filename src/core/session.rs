use crate::core::dispatch::{DecisionDispatcher, DispatchStats};
use crate::core::engine::{DragEnd, SwipeDecisionEngine};
use crate::domain::model::{
    Card, Decision, DecisionEvent, Feedback, Identity, UserContext, Wager, WagerTerms,
};
use crate::domain::ports::{FeedProvider, UserDirectory};
use crate::utils::error::Result;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum SwipeOutcome {
    /// Decision emitted. `queued` is false when no wager was handed to the dispatcher.
    Committed { event: DecisionEvent, queued: bool },
    SprungBack,
    /// A guest crossed the threshold; the card sprang back and stays interactive.
    LoginRequired { card_id: String, attempted: Decision },
    Ignored,
}

/// One user's swiping session: identity, current feed, and decision delivery.
pub struct SwipeSession {
    engine: SwipeDecisionEngine,
    feed: Arc<dyn FeedProvider>,
    users: Arc<dyn UserDirectory>,
    dispatcher: DecisionDispatcher,
    terms: WagerTerms,
    user: UserContext,
}

impl SwipeSession {
    pub fn new(
        engine: SwipeDecisionEngine,
        feed: Arc<dyn FeedProvider>,
        users: Arc<dyn UserDirectory>,
        dispatcher: DecisionDispatcher,
        terms: WagerTerms,
    ) -> Self {
        Self {
            engine,
            feed,
            users,
            dispatcher,
            terms,
            user: UserContext::guest(),
        }
    }

    pub fn user(&self) -> &UserContext {
        &self.user
    }

    pub fn engine(&self) -> &SwipeDecisionEngine {
        &self.engine
    }

    /// Syncs the identity with the backend. A failed sync leaves the user
    /// signed in without a backend id: they still swipe, nothing is recorded.
    pub async fn sign_in(&mut self, identity: Identity) {
        let same_user = self
            .user
            .identity
            .as_ref()
            .is_some_and(|current| current.provider_user_id == identity.provider_user_id);
        if !same_user {
            self.engine.forget_decisions();
        }

        let user_id = match self.users.sync_user(&identity).await {
            Ok(id) => {
                tracing::info!("Signed in as {} (user {})", identity.display_label(), id);
                Some(id)
            }
            Err(e) => {
                tracing::warn!(
                    "Could not sync {} with the backend: {}",
                    identity.display_label(),
                    e
                );
                None
            }
        };
        self.user = UserContext::signed_in(identity, user_id);
    }

    pub fn sign_out(&mut self) {
        if let Some(identity) = &self.user.identity {
            tracing::info!("Signed out {}", identity.display_label());
        }
        self.engine.forget_decisions();
        self.user = UserContext::guest();
    }

    /// Replaces the card stack with a fresh feed and returns how many cards it
    /// holds; already decided cards are not counted. On error the current stack is kept.
    pub async fn refresh(&mut self) -> Result<usize> {
        let cards = self.feed.fetch_feed(&self.user).await?;
        self.engine.replace_cards(cards);
        Ok(self.engine.visible_cards().len())
    }

    pub fn visible_cards(&self) -> Vec<Card> {
        self.engine.visible_cards()
    }

    pub fn top_card(&self) -> Option<Card> {
        self.engine.top_card()
    }

    pub fn is_caught_up(&self) -> bool {
        self.engine.visible_cards().is_empty()
    }

    pub fn drag(&mut self, card_id: &str, offset: f64) -> Option<Feedback> {
        self.engine.on_drag(card_id, offset)
    }

    pub fn release(&mut self, card_id: &str, offset: f64) -> SwipeOutcome {
        if !self.user.is_authenticated() && self.engine.is_interactive(card_id) {
            if let Some(attempted) = self.engine.preview(offset) {
                tracing::info!("Guest swiped {} on {}, login required", attempted, card_id);
                self.engine.cancel_drag(card_id);
                return SwipeOutcome::LoginRequired {
                    card_id: card_id.to_string(),
                    attempted,
                };
            }
        }

        match self.engine.on_drag_end(card_id, offset) {
            DragEnd::Committed(event) => {
                let queued = self.record(&event);
                SwipeOutcome::Committed { event, queued }
            }
            DragEnd::SprungBack => SwipeOutcome::SprungBack,
            DragEnd::Ignored => SwipeOutcome::Ignored,
        }
    }

    pub fn dispatch_stats(&self) -> DispatchStats {
        self.dispatcher.stats()
    }

    /// Waits for queued decisions to be delivered.
    pub async fn shutdown(self) -> DispatchStats {
        self.dispatcher.shutdown().await
    }

    fn record(&self, event: &DecisionEvent) -> bool {
        let Some(user_id) = &self.user.user_id else {
            tracing::warn!(
                "No backend user for this session, {} on {} not recorded",
                event.decision,
                event.card_id
            );
            return false;
        };
        match self
            .dispatcher
            .submit(Wager::new(user_id.clone(), event, &self.terms))
        {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("{} on {} not recorded: {}", event.decision, event.card_id, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::haptics::NoopHaptics;
    use crate::core::dispatch::RetryPolicy;
    use crate::core::engine::SwipeSettings;
    use crate::domain::ports::DecisionSink;
    use crate::utils::error::SwipeError;
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::sync::Mutex;

    struct StaticFeed;

    #[async_trait]
    impl FeedProvider for StaticFeed {
        async fn fetch_feed(&self, _user: &UserContext) -> Result<Vec<Card>> {
            Ok(vec![
                Card::new("m-1", "Will the Lakers make the playoffs?"),
                Card::new("m-2", "Will GPT-6 ship this year?"),
            ])
        }
    }

    struct Directory {
        fail: bool,
    }

    #[async_trait]
    impl UserDirectory for Directory {
        async fn sync_user(&self, identity: &Identity) -> Result<String> {
            if self.fail {
                return Err(SwipeError::BackendError {
                    status: 401,
                    body: "invalid api key".to_string(),
                });
            }
            Ok(format!("db-{}", identity.provider_user_id))
        }
    }

    #[derive(Default)]
    struct MemorySink {
        wagers: Mutex<Vec<Wager>>,
        fail: bool,
    }

    #[async_trait]
    impl DecisionSink for MemorySink {
        async fn record_decision(&self, wager: &Wager) -> Result<()> {
            if self.fail {
                return Err(SwipeError::BackendError {
                    status: 500,
                    body: "simulated outage".to_string(),
                });
            }
            self.wagers.lock().await.push(wager.clone());
            Ok(())
        }
    }

    fn session(sink: Arc<MemorySink>, directory_fails: bool) -> SwipeSession {
        let engine = SwipeDecisionEngine::new(
            SwipeSettings {
                threshold: 100.0,
                exit_delay: Duration::ZERO,
            },
            Arc::new(NoopHaptics),
        );
        let dispatcher = DecisionDispatcher::spawn(
            sink,
            RetryPolicy {
                max_attempts: 2,
                base_delay: Duration::from_millis(1),
                multiplier: 1.0,
            },
        );
        SwipeSession::new(
            engine,
            Arc::new(StaticFeed),
            Arc::new(Directory {
                fail: directory_fails,
            }),
            dispatcher,
            WagerTerms::default(),
        )
    }

    #[tokio::test]
    async fn test_signed_in_swipe_records_wager() {
        let sink = Arc::new(MemorySink::default());
        let mut session = session(sink.clone(), false);
        session.sign_in(Identity::new("alice")).await;
        assert_eq!(session.refresh().await.unwrap(), 2);

        let outcome = session.release("m-1", 150.0);
        assert!(matches!(
            outcome,
            SwipeOutcome::Committed { queued: true, .. }
        ));
        assert_eq!(session.top_card().unwrap().id, "m-2");

        let stats = session.shutdown().await;
        assert_eq!(stats.recorded, 1);
        let wagers = sink.wagers.lock().await;
        assert_eq!(wagers[0].user_id, "db-alice");
        assert_eq!(wagers[0].market_id, "m-1");
        assert_eq!(wagers[0].direction, Decision::Yes);
    }

    #[tokio::test]
    async fn test_guest_crossing_threshold_springs_back() {
        let sink = Arc::new(MemorySink::default());
        let mut session = session(sink.clone(), false);
        session.refresh().await.unwrap();

        session.drag("m-1", -160.0);
        let outcome = session.release("m-1", -160.0);

        assert_eq!(
            outcome,
            SwipeOutcome::LoginRequired {
                card_id: "m-1".to_string(),
                attempted: Decision::No,
            }
        );
        assert!(session.engine().is_interactive("m-1"));
        assert_eq!(session.engine().offset("m-1"), Some(0.0));
        assert_eq!(session.visible_cards().len(), 2);
        assert_eq!(session.shutdown().await.submitted, 0);
    }

    #[tokio::test]
    async fn test_guest_sub_threshold_release_is_a_plain_spring_back() {
        let mut session = session(Arc::new(MemorySink::default()), false);
        session.refresh().await.unwrap();

        assert_eq!(session.release("m-2", 40.0), SwipeOutcome::SprungBack);
    }

    #[tokio::test]
    async fn test_failed_sync_still_swipes_without_recording() {
        let sink = Arc::new(MemorySink::default());
        let mut session = session(sink.clone(), true);
        session.sign_in(Identity::new("bob")).await;
        session.refresh().await.unwrap();

        assert!(session.user().is_authenticated());
        assert!(matches!(
            session.release("m-1", -120.0),
            SwipeOutcome::Committed {
                queued: false,
                ..
            }
        ));
        assert_eq!(session.visible_cards().len(), 1);
        assert_eq!(session.shutdown().await.submitted, 0);
    }

    #[tokio::test]
    async fn test_sink_failure_does_not_reach_the_caller() {
        let sink = Arc::new(MemorySink {
            fail: true,
            ..Default::default()
        });
        let mut session = session(sink, false);
        session.sign_in(Identity::new("carol")).await;
        session.refresh().await.unwrap();

        let outcome = session.release("m-1", 300.0);
        assert!(matches!(outcome, SwipeOutcome::Committed { .. }));
        assert_eq!(session.release("m-1", 300.0), SwipeOutcome::Ignored);

        let outcome = session.release("m-2", -300.0);
        assert!(matches!(outcome, SwipeOutcome::Committed { .. }));
        assert!(session.is_caught_up());

        let stats = session.shutdown().await;
        assert_eq!(stats.submitted, 2);
        assert_eq!(stats.failed, 2);
    }

    #[tokio::test]
    async fn test_refreshed_feed_cannot_decide_a_card_twice() {
        let sink = Arc::new(MemorySink::default());
        let mut session = session(sink.clone(), false);
        session.sign_in(Identity::new("erin")).await;
        session.refresh().await.unwrap();

        assert!(matches!(
            session.release("m-1", 150.0),
            SwipeOutcome::Committed { queued: true, .. }
        ));
        assert_eq!(session.refresh().await.unwrap(), 1);
        assert_eq!(session.release("m-1", -150.0), SwipeOutcome::Ignored);
        assert_eq!(session.top_card().unwrap().id, "m-2");

        // signing in again as the same user keeps the history
        session.sign_in(Identity::new("erin")).await;
        session.refresh().await.unwrap();
        assert_eq!(session.release("m-1", -150.0), SwipeOutcome::Ignored);

        let stats = session.shutdown().await;
        assert_eq!(stats.submitted, 1);
        let wagers = sink.wagers.lock().await;
        assert_eq!(wagers.len(), 1);
        assert_eq!(wagers[0].direction, Decision::Yes);
    }

    #[tokio::test]
    async fn test_another_user_can_decide_the_same_cards() {
        let sink = Arc::new(MemorySink::default());
        let mut session = session(sink.clone(), false);
        session.sign_in(Identity::new("frank")).await;
        session.refresh().await.unwrap();
        assert!(matches!(
            session.release("m-1", 150.0),
            SwipeOutcome::Committed { .. }
        ));

        session.sign_in(Identity::new("grace")).await;
        session.refresh().await.unwrap();
        assert!(matches!(
            session.release("m-1", -150.0),
            SwipeOutcome::Committed { queued: true, .. }
        ));

        session.shutdown().await;
        let users: Vec<_> = sink
            .wagers
            .lock()
            .await
            .iter()
            .map(|w| w.user_id.clone())
            .collect();
        assert_eq!(users, vec!["db-frank".to_string(), "db-grace".to_string()]);
    }

    #[tokio::test]
    async fn test_sign_out_returns_to_guest() {
        let mut session = session(Arc::new(MemorySink::default()), false);
        session.sign_in(Identity::new("dave")).await;
        session.sign_out();
        session.refresh().await.unwrap();

        assert!(!session.user().is_authenticated());
        assert!(matches!(
            session.release("m-1", 200.0),
            SwipeOutcome::LoginRequired { .. }
        ));
    }
}
