use crate::core::feedback::{self, DEFAULT_THRESHOLD};
use crate::core::gesture::{CardGesture, Release};
use crate::domain::model::{Card, CardId, Decision, DecisionEvent, Feedback, GesturePhase};
use crate::domain::ports::Haptics;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct SwipeSettings {
    pub threshold: f64,
    /// How long a decided card stays visible for its exit animation.
    pub exit_delay: Duration,
}

impl Default for SwipeSettings {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            exit_delay: Duration::from_millis(200),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DragEnd {
    Committed(DecisionEvent),
    SprungBack,
    /// Unknown card, or one that already has a decision.
    Ignored,
}

type VisibleStack = Arc<Mutex<Vec<Card>>>;

fn lock(stack: &VisibleStack) -> MutexGuard<'_, Vec<Card>> {
    // the guarded Vec is never left half-updated, so a poisoned lock is still usable
    stack.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Turns drag gestures on a stack of cards into at most one decision per card.
///
/// Gesture methods are synchronous and meant to be called from the host's
/// event loop. Visual removal of a decided card happens on a spawned timer so
/// the next card is interactive immediately.
///
/// Decided ids outlive [`replace_cards`](Self::replace_cards): a feed that
/// returns an already decided market again does not bring it back.
pub struct SwipeDecisionEngine {
    settings: SwipeSettings,
    haptics: Arc<dyn Haptics>,
    visible: VisibleStack,
    gestures: HashMap<CardId, CardGesture>,
    decided: HashMap<CardId, Decision>,
}

impl SwipeDecisionEngine {
    pub fn new(settings: SwipeSettings, haptics: Arc<dyn Haptics>) -> Self {
        Self {
            settings,
            haptics,
            visible: Arc::new(Mutex::new(Vec::new())),
            gestures: HashMap::new(),
            decided: HashMap::new(),
        }
    }

    pub fn settings(&self) -> &SwipeSettings {
        &self.settings
    }

    /// Replaces the whole stack. Cards that already have a decision are left out.
    pub fn replace_cards(&mut self, cards: Vec<Card>) {
        self.gestures.clear();

        let mut unique = Vec::with_capacity(cards.len());
        for card in cards {
            if let Some(decision) = self.decided.get(&card.id) {
                tracing::debug!("Skipping card {}, already decided {}", card.id, decision);
                continue;
            }
            if self.gestures.contains_key(&card.id) {
                tracing::warn!("Duplicate card {} in feed, keeping the first", card.id);
                continue;
            }
            self.gestures.insert(card.id.clone(), CardGesture::new());
            unique.push(card);
        }

        tracing::debug!("Loaded {} cards", unique.len());
        *lock(&self.visible) = unique;
    }

    /// Cards still on screen, including decided ones mid exit animation.
    pub fn visible_cards(&self) -> Vec<Card> {
        lock(&self.visible).clone()
    }

    /// The first card that can still be swiped.
    pub fn top_card(&self) -> Option<Card> {
        lock(&self.visible)
            .iter()
            .find(|card| self.is_interactive(&card.id))
            .cloned()
    }

    pub fn is_interactive(&self, card_id: &str) -> bool {
        self.gestures
            .get(card_id)
            .map(|g| !g.phase().is_terminal())
            .unwrap_or(false)
    }

    pub fn phase(&self, card_id: &str) -> Option<GesturePhase> {
        if let Some(gesture) = self.gestures.get(card_id) {
            return Some(gesture.phase());
        }
        self.decided.get(card_id).copied().map(GesturePhase::decided)
    }

    /// The decision taken on a card, if any, across refreshes.
    pub fn decision(&self, card_id: &str) -> Option<Decision> {
        self.decided.get(card_id).copied()
    }

    /// Forgets every past decision, e.g. when a different user takes over.
    /// Cards on the current stack are not re-armed until the next refresh.
    pub fn forget_decisions(&mut self) {
        if !self.decided.is_empty() {
            tracing::debug!("Forgetting {} decided cards", self.decided.len());
        }
        self.decided.clear();
    }

    /// Current offset of a card; 0 after a spring-back.
    pub fn offset(&self, card_id: &str) -> Option<f64> {
        self.gestures.get(card_id).map(CardGesture::offset)
    }

    /// What releasing at `offset` would decide, without touching any card.
    pub fn preview(&self, offset: f64) -> Option<Decision> {
        feedback::classify(offset, self.settings.threshold)
    }

    pub fn on_drag(&mut self, card_id: &str, offset: f64) -> Option<Feedback> {
        let threshold = self.settings.threshold;
        self.gestures.get_mut(card_id)?.drag(offset, threshold)
    }

    pub fn on_drag_end(&mut self, card_id: &str, offset: f64) -> DragEnd {
        let threshold = self.settings.threshold;
        let Some(gesture) = self.gestures.get_mut(card_id) else {
            tracing::debug!("Drag end on unknown card {}", card_id);
            return DragEnd::Ignored;
        };

        match gesture.release(offset, threshold) {
            Release::Decided(decision) => {
                let event = DecisionEvent {
                    card_id: card_id.to_string(),
                    decision,
                    offset,
                    decided_at: Utc::now(),
                };
                tracing::info!("Card {} decided {}", card_id, decision);
                self.decided.insert(card_id.to_string(), decision);
                self.pulse();
                self.schedule_removal(card_id.to_string());
                DragEnd::Committed(event)
            }
            Release::SprungBack => {
                tracing::debug!("Card {} sprang back from {}", card_id, offset);
                DragEnd::SprungBack
            }
            Release::AlreadyDecided => DragEnd::Ignored,
        }
    }

    /// Forces an in-flight drag back to centre.
    pub fn cancel_drag(&mut self, card_id: &str) {
        if let Some(gesture) = self.gestures.get_mut(card_id) {
            gesture.cancel();
        }
    }

    fn pulse(&self) {
        if let Err(e) = self.haptics.impact() {
            tracing::warn!("Haptic pulse failed: {}", e);
        }
    }

    fn schedule_removal(&self, card_id: CardId) {
        let visible = Arc::clone(&self.visible);
        let delay = self.settings.exit_delay;

        if delay.is_zero() {
            remove_card(&visible, &card_id);
            return;
        }

        // a refresh never brings a decided id back, so a late timer cannot hit a live card
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    remove_card(&visible, &card_id);
                });
            }
            Err(_) => {
                tracing::debug!("No async runtime, removing card {} immediately", card_id);
                remove_card(&visible, &card_id);
            }
        }
    }
}

fn remove_card(visible: &VisibleStack, card_id: &str) {
    lock(visible).retain(|card| card.id != card_id);
}
