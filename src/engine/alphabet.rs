use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::{debug, info};

use crate::content::kana::{KanaPair, Script};
use crate::engine::error_stats::ErrorStats;
use crate::engine::round::{RoundState, RoundSummary, rebuild_round};
use crate::engine::selection::pick_next;
use crate::engine::settings::{QuizSettings, Toggle};
use crate::error::{QuizError, QuizResult};
use crate::session::answer::normalize_answer;

pub const DEFAULT_ADVANCE_DELAY: Duration = Duration::from_millis(700);

/// Deferred "show the next prompt" after a wrong answer. It only takes
/// effect if nothing else happened to the quiz in the meantime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingAdvance {
    generation: u64,
    pub delay: Duration,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnswerOutcome {
    Correct {
        pair: KanaPair,
        /// No occurrences of this pair are left in the round.
        cleared: bool,
        /// Set when this answer finished the round; a new round has
        /// already been started with the same settings.
        round: Option<RoundSummary>,
    },
    Incorrect {
        pair: KanaPair,
        advance: PendingAdvance,
    },
}

pub struct AlphabetQuiz {
    settings: QuizSettings,
    round: RoundState,
    current: Option<KanaPair>,
    stats: ErrorStats,
    rng: SmallRng,
    generation: u64,
    advance_delay: Duration,
}

impl AlphabetQuiz {
    pub fn new(settings: QuizSettings, stats: ErrorStats) -> Self {
        Self::with_rng(settings, stats, SmallRng::from_entropy())
    }

    pub fn with_rng(settings: QuizSettings, stats: ErrorStats, rng: SmallRng) -> Self {
        let round = rebuild_round(&settings);
        let mut quiz = Self {
            settings,
            round,
            current: None,
            stats,
            rng,
            generation: 0,
            advance_delay: DEFAULT_ADVANCE_DELAY,
        };
        quiz.next_prompt(false);
        quiz
    }

    pub fn with_advance_delay(mut self, delay: Duration) -> Self {
        self.advance_delay = delay;
        self
    }

    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    pub fn round(&self) -> &RoundState {
        &self.round
    }

    pub fn stats(&self) -> &ErrorStats {
        &self.stats
    }

    /// Current prompt, or the "no script selected" advisory when nothing
    /// is enabled.
    pub fn prompt(&self) -> QuizResult<&KanaPair> {
        if self.round.is_empty_selection() {
            return Err(QuizError::NoScriptSelected);
        }
        self.current.as_ref().ok_or(QuizError::NoScriptSelected)
    }

    /// (correct, retries) for the running round.
    pub fn counters(&self) -> (u32, u32) {
        (self.round.correct_count, self.round.retry_count)
    }

    pub fn remaining(&self) -> usize {
        self.round.remaining()
    }

    pub fn submit(&mut self, raw: &str) -> QuizResult<AnswerOutcome> {
        let pair = self.prompt()?.clone();
        self.generation += 1;

        if normalize_answer(raw) != pair.romaji {
            self.round.record_incorrect(&pair);
            self.stats.record_wrong(&pair);
            debug!(kana = %pair.kana, weight = self.stats.weight(&pair), "incorrect answer");
            return Ok(AnswerOutcome::Incorrect {
                pair,
                advance: PendingAdvance {
                    generation: self.generation,
                    delay: self.advance_delay,
                },
            });
        }

        let cleared = self.round.record_correct(&pair);
        self.stats.record_correct(&pair);

        let round = if self.round.is_complete() {
            let summary = self.round.summary();
            info!(
                correct = summary.correct,
                incorrect = summary.incorrect,
                hard = summary.hard.len(),
                "alphabet round complete"
            );
            self.round = rebuild_round(&self.settings);
            self.next_prompt(false);
            Some(summary)
        } else {
            let exclude = self.round.remaining() > 1;
            self.next_prompt(exclude);
            None
        };

        Ok(AnswerOutcome::Correct {
            pair,
            cleared,
            round,
        })
    }

    /// Run a deferred advance. Returns false (and does nothing) when the
    /// token is stale.
    pub fn fire_advance(&mut self, advance: PendingAdvance) -> bool {
        if advance.generation != self.generation || self.current.is_none() {
            return false;
        }
        self.generation += 1;
        let exclude = self.round.remaining() > 1;
        self.next_prompt(exclude);
        true
    }

    /// Replace the whole settings snapshot and start over.
    pub fn apply_settings(&mut self, settings: QuizSettings) {
        self.settings = settings;
        self.restart();
    }

    pub fn set_row_enabled(
        &mut self,
        script: Script,
        row: usize,
        enabled: bool,
    ) -> QuizResult<Toggle> {
        let toggle = self.settings.set_row_enabled(script, row, enabled)?;
        if toggle == Toggle::Applied {
            self.restart();
        }
        Ok(toggle)
    }

    pub fn set_script_enabled(&mut self, script: Script, enabled: bool) -> Toggle {
        let toggle = self.settings.set_script_enabled(script, enabled);
        if toggle == Toggle::Applied {
            self.restart();
        }
        toggle
    }

    pub fn set_times_to_show(&mut self, times: u32) -> Toggle {
        let toggle = self.settings.set_times_to_show(times);
        if toggle == Toggle::Applied {
            self.restart();
        }
        toggle
    }

    /// Only changes how the next prompts are drawn; the round continues.
    pub fn set_weighted(&mut self, weighted: bool) {
        self.settings.weighted = weighted;
    }

    /// Forget the error history. A pending advance is dropped; the current
    /// prompt stays up.
    pub fn reset_error_stats(&mut self) {
        self.generation += 1;
        self.stats.reset();
    }

    fn restart(&mut self) {
        self.generation += 1;
        self.round = rebuild_round(&self.settings);
        self.current = None;
        self.next_prompt(false);
        debug!(pool = self.round.pool_size(), "alphabet round rebuilt");
    }

    fn next_prompt(&mut self, exclude_current: bool) {
        self.current = pick_next(
            self.round.unanswered(),
            self.current.as_ref(),
            exclude_current,
            self.settings.weighted,
            &self.stats,
            &mut self.rng,
        );
    }
}
