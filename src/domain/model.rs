use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type CardId = String;

fn default_odds() -> String {
    "+100".to_string()
}

/// A prediction-market card as served by the feed. Immutable once shown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub question: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub category: String,
    #[serde(default = "default_odds")]
    pub odds: String,
    /// Present only on personalised results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
}

impl Card {
    pub fn new(id: impl Into<CardId>, question: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            question: question.into(),
            image_url: String::new(),
            category: String::new(),
            odds: default_odds(),
            similarity: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Yes,
    No,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Yes => "YES",
            Decision::No => "NO",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-card gesture phase. `DecidedYes` and `DecidedNo` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Idle,
    Dragging,
    DecidedYes,
    DecidedNo,
}

impl GesturePhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, GesturePhase::DecidedYes | GesturePhase::DecidedNo)
    }

    /// Terminal phase for a decision.
    pub fn decided(decision: Decision) -> Self {
        match decision {
            Decision::Yes => GesturePhase::DecidedYes,
            Decision::No => GesturePhase::DecidedNo,
        }
    }
}

/// Visual feedback derived from a horizontal drag offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Feedback {
    pub offset: f64,
    /// Tilt in degrees.
    pub rotation: f64,
    pub yes_intensity: f64,
    pub no_intensity: f64,
    pub opacity: f64,
}

/// Emitted once per card when a gesture crosses the threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionEvent {
    pub card_id: CardId,
    pub decision: Decision,
    pub offset: f64,
    pub decided_at: DateTime<Utc>,
}

/// Who is swiping, as reported by the hosted identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub provider_user_id: String,
    pub wallet_address: Option<String>,
    pub email: Option<String>,
}

impl Identity {
    pub fn new(provider_user_id: impl Into<String>) -> Self {
        Self {
            provider_user_id: provider_user_id.into(),
            wallet_address: None,
            email: None,
        }
    }

    pub fn with_wallet(mut self, wallet_address: impl Into<String>) -> Self {
        self.wallet_address = Some(wallet_address.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Email when known, otherwise a shortened wallet address.
    pub fn display_label(&self) -> String {
        if let Some(email) = &self.email {
            return email.clone();
        }
        match &self.wallet_address {
            Some(wallet) => format!("{}...", wallet.chars().take(6).collect::<String>()),
            None => self.provider_user_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserContext {
    pub identity: Option<Identity>,
    /// Backend row id, set once the identity has been synced.
    pub user_id: Option<String>,
}

impl UserContext {
    pub fn guest() -> Self {
        Self::default()
    }

    pub fn signed_in(identity: Identity, user_id: Option<String>) -> Self {
        Self {
            identity: Some(identity),
            user_id,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }
}

/// Stake terms attached to every recorded decision.
#[derive(Debug, Clone, PartialEq)]
pub struct WagerTerms {
    pub amount: u64,
    pub currency: String,
    pub potential_payout: u64,
}

impl Default for WagerTerms {
    fn default() -> Self {
        Self {
            amount: 10,
            currency: "GOLD".to_string(),
            potential_payout: 20,
        }
    }
}

/// The row written to the decision sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wager {
    pub user_id: String,
    pub market_id: CardId,
    pub amount: u64,
    pub currency: String,
    pub direction: Decision,
    pub potential_payout: u64,
}

impl Wager {
    pub fn new(user_id: impl Into<String>, event: &DecisionEvent, terms: &WagerTerms) -> Self {
        Self {
            user_id: user_id.into(),
            market_id: event.card_id.clone(),
            amount: terms.amount,
            currency: terms.currency.clone(),
            direction: event.decision,
            potential_payout: terms.potential_payout,
        }
    }
}
