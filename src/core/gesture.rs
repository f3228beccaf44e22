use crate::core::feedback;
use crate::domain::model::{Decision, Feedback, GesturePhase};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Release {
    Decided(Decision),
    SprungBack,
    AlreadyDecided,
}

/// Gesture state for a single card: `Idle -> Dragging -> {DecidedYes | DecidedNo | Idle}`.
#[derive(Debug, Clone, PartialEq)]
pub struct CardGesture {
    phase: GesturePhase,
    offset: f64,
}

impl Default for CardGesture {
    fn default() -> Self {
        Self::new()
    }
}

impl CardGesture {
    pub fn new() -> Self {
        Self {
            phase: GesturePhase::Idle,
            offset: 0.0,
        }
    }

    pub fn phase(&self) -> GesturePhase {
        self.phase
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Returns `None` once the card has been decided.
    pub fn drag(&mut self, offset: f64, threshold: f64) -> Option<Feedback> {
        if self.phase.is_terminal() {
            return None;
        }
        let fb = feedback::feedback(offset, threshold);
        self.phase = GesturePhase::Dragging;
        self.offset = fb.offset;
        Some(fb)
    }

    pub fn release(&mut self, offset: f64, threshold: f64) -> Release {
        if self.phase.is_terminal() {
            return Release::AlreadyDecided;
        }
        match feedback::classify(offset, threshold) {
            Some(decision) => {
                self.phase = GesturePhase::decided(decision);
                self.offset = offset;
                Release::Decided(decision)
            }
            None => {
                self.spring_back();
                Release::SprungBack
            }
        }
    }

    /// Abandons an in-flight drag. No effect on a decided card.
    pub fn cancel(&mut self) {
        if !self.phase.is_terminal() {
            self.spring_back();
        }
    }

    fn spring_back(&mut self) {
        self.phase = GesturePhase::Idle;
        self.offset = 0.0;
    }
}
