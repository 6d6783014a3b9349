pub mod alphabet;
pub mod error_stats;
pub mod round;
pub mod scoring;
pub mod selection;
pub mod settings;

pub use alphabet::{AlphabetQuiz, AnswerOutcome, PendingAdvance};
