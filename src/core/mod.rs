pub mod dispatch;
pub mod engine;
pub mod feed;
pub mod feedback;
pub mod gesture;
pub mod session;

pub use crate::domain::model::{Card, Decision, DecisionEvent, Feedback, GesturePhase, Wager};
pub use crate::domain::ports::{DecisionSink, FeedProvider, Haptics, MarketSource, UserDirectory};
pub use crate::utils::error::Result;
