use thiserror::Error;

use crate::content::kana::Script;

/// Reasons an engine refuses an operation. None of these are fatal: the
/// caller shows an advisory and keeps going.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuizError {
    #[error("No script selected: enable at least one script to practice")]
    NoScriptSelected,

    #[error("No words selected: the chosen practice set is empty")]
    NoWordsSelected,

    #[error("Row {row} does not exist in the {script} table ({rows} rows)")]
    RowOutOfRange { script: Script, row: usize, rows: usize },

    #[error("Feedback is still showing; acknowledge it before answering again")]
    AwaitingAcknowledgement,

    #[error("The quiz is finished")]
    Finished,
}

pub type QuizResult<T> = Result<T, QuizError>;
