use crate::session::answer::{DiffChar, char_diff, normalize_answer};

/// Outcome of checking one field of a vocabulary answer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldCheck {
    pub expected: String,
    pub given: String,
    pub correct: bool,
}

impl FieldCheck {
    pub fn new(expected: &str, given: &str) -> Self {
        Self {
            expected: expected.to_string(),
            given: given.to_string(),
            correct: given == normalize_answer(expected),
        }
    }

    /// Position-wise mismatch marks against the expected value.
    pub fn diff(&self) -> Vec<DiffChar> {
        char_diff(&normalize_answer(&self.expected), &self.given)
    }
}

/// What the UI shows after a vocabulary answer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Feedback {
    pub correct: bool,
    pub romaji: Option<FieldCheck>,
    pub english: Option<FieldCheck>,
    pub comment: Option<String>,
    /// The quiz is paused until `acknowledge` is called (by the user or by
    /// the countdown running out).
    pub needs_ack: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    Running(u32),
    Expired,
}

/// Whole-second auto-dismiss timer for a feedback message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Countdown {
    remaining: u32,
}

impl Countdown {
    pub fn new(seconds: u32) -> Self {
        Self { remaining: seconds }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Called once per elapsed second. Expires on the tick that would take
    /// the count to zero.
    pub fn tick(&mut self) -> Tick {
        if self.remaining <= 1 {
            self.remaining = 0;
            return Tick::Expired;
        }
        self.remaining -= 1;
        Tick::Running(self.remaining)
    }

    pub fn label(&self) -> String {
        let plural = if self.remaining == 1 { "" } else { "s" };
        format!("Automatically continuing in {} second{plural}...", self.remaining)
    }
}
