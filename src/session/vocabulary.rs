use std::collections::BTreeMap;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use tracing::debug;

use crate::content::vocabulary::VocabularyWord;
use crate::error::{QuizError, QuizResult};
use crate::session::answer::{normalize_answer, split_combined};
use crate::session::feedback::{Feedback, FieldCheck};
use crate::session::result::{CategoryScore, VocabularyReport};

/// Which answer fields are asked for. At least one is always on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Categories {
    romaji: bool,
    english: bool,
}

impl Default for Categories {
    fn default() -> Self {
        Self::BOTH
    }
}

impl Categories {
    pub const BOTH: Self = Self {
        romaji: true,
        english: true,
    };
    pub const ROMAJI: Self = Self {
        romaji: true,
        english: false,
    };
    pub const ENGLISH: Self = Self {
        romaji: false,
        english: true,
    };

    /// Both off falls back to romaji only.
    pub fn new(romaji: bool, english: bool) -> Self {
        if !romaji && !english {
            return Self::ROMAJI;
        }
        Self { romaji, english }
    }

    pub fn romaji(&self) -> bool {
        self.romaji
    }

    pub fn english(&self) -> bool {
        self.english
    }

    /// Turning off the last enabled category turns the other one on.
    pub fn set_romaji(&mut self, on: bool) {
        self.romaji = on;
        if !on && !self.english {
            self.english = true;
        }
    }

    pub fn set_english(&mut self, on: bool) {
        self.english = on;
        if !on && !self.romaji {
            self.romaji = true;
        }
    }

    pub fn prompt_label(&self) -> &'static str {
        match (self.romaji, self.english) {
            (true, true) => "Enter Romaji and English (separated by comma):",
            (false, true) => "Enter English:",
            _ => "Enter Romaji:",
        }
    }
}

pub struct VocabularyQuiz {
    words: Vec<VocabularyWord>,
    cursor: usize,
    categories: Categories,
    romaji: CategoryScore,
    english: CategoryScore,
    hints_used: u32,
    mistakes: BTreeMap<usize, u32>,
    awaiting_ack: bool,
    show_comments_on_correct: bool,
    rng: SmallRng,
}

impl VocabularyQuiz {
    pub fn new(words: Vec<VocabularyWord>, categories: Categories) -> QuizResult<Self> {
        Self::with_rng(words, categories, SmallRng::from_entropy())
    }

    pub fn with_rng(
        words: Vec<VocabularyWord>,
        categories: Categories,
        rng: SmallRng,
    ) -> QuizResult<Self> {
        if words.is_empty() {
            return Err(QuizError::NoWordsSelected);
        }
        let mut quiz = Self {
            words,
            cursor: 0,
            categories,
            romaji: CategoryScore::default(),
            english: CategoryScore::default(),
            hints_used: 0,
            mistakes: BTreeMap::new(),
            awaiting_ack: false,
            show_comments_on_correct: true,
            rng,
        };
        quiz.words.shuffle(&mut quiz.rng);
        Ok(quiz)
    }

    pub fn with_comments_on_correct(mut self, show: bool) -> Self {
        self.show_comments_on_correct = show;
        self
    }

    pub fn set_show_comments_on_correct(&mut self, show: bool) {
        self.show_comments_on_correct = show;
    }

    pub fn categories(&self) -> Categories {
        self.categories
    }

    /// Words in the order of this pass.
    pub fn words(&self) -> &[VocabularyWord] {
        &self.words
    }

    pub fn current(&self) -> Option<&VocabularyWord> {
        self.words.get(self.cursor)
    }

    /// (1-based position, total). Stays at the total once finished.
    pub fn progress(&self) -> (usize, usize) {
        let total = self.words.len();
        ((self.cursor + 1).min(total), total)
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.words.len()
    }

    pub fn is_awaiting_ack(&self) -> bool {
        self.awaiting_ack
    }

    pub fn romaji_score(&self) -> CategoryScore {
        self.romaji
    }

    pub fn english_score(&self) -> CategoryScore {
        self.english
    }

    pub fn hints_used(&self) -> u32 {
        self.hints_used
    }

    /// (position in this pass, mistake count) for every word missed so far.
    pub fn mistakes(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.mistakes.iter().map(|(&pos, &count)| (pos, count))
    }

    /// Check an answer for the current word.
    ///
    /// Blank input is ignored and returns `Ok(None)`. When the returned
    /// feedback has `needs_ack` set, the quiz stays on this word until
    /// [`acknowledge`](Self::acknowledge) is called.
    pub fn submit(&mut self, raw: &str) -> QuizResult<Option<Feedback>> {
        if self.awaiting_ack {
            return Err(QuizError::AwaitingAcknowledgement);
        }
        let word = self.current().ok_or(QuizError::Finished)?.clone();
        let input = normalize_answer(raw);
        if input.is_empty() {
            return Ok(None);
        }

        let (romaji, english) = match (self.categories.romaji, self.categories.english) {
            (true, true) => {
                let (r, e) = split_combined(&input);
                (
                    Some(FieldCheck::new(&word.romaji, &r)),
                    Some(FieldCheck::new(&word.english, &e)),
                )
            }
            (true, false) => (Some(FieldCheck::new(&word.romaji, &input)), None),
            _ => (None, Some(FieldCheck::new(&word.english, &input))),
        };

        if let Some(check) = &romaji {
            self.romaji.record(check.correct);
        }
        if let Some(check) = &english {
            self.english.record(check.correct);
        }

        let correct = romaji.iter().chain(english.iter()).all(|c| c.correct);
        let comment = word.comment().map(str::to_string);

        if !correct {
            *self.mistakes.entry(self.cursor).or_insert(0) += 1;
            self.awaiting_ack = true;
            debug!(word = %word.primary_form(), position = self.cursor, "vocabulary miss");
            return Ok(Some(Feedback {
                correct,
                romaji,
                english,
                comment,
                needs_ack: true,
            }));
        }

        let comment = comment.filter(|_| self.show_comments_on_correct);
        let needs_ack = comment.is_some();
        if needs_ack {
            self.awaiting_ack = true;
        } else {
            self.cursor += 1;
        }
        Ok(Some(Feedback {
            correct,
            romaji,
            english,
            comment,
            needs_ack,
        }))
    }

    /// Dismiss pending feedback and move to the next word. Returns false
    /// when nothing was pending, so a late timeout cannot skip a word.
    pub fn acknowledge(&mut self) -> bool {
        if !self.awaiting_ack {
            return false;
        }
        self.awaiting_ack = false;
        self.cursor += 1;
        true
    }

    /// Hint for the current word. Every request counts, even repeats.
    pub fn request_hint(&mut self) -> Option<&str> {
        let hint = self.words.get(self.cursor)?.hint()?;
        self.hints_used += 1;
        Some(hint)
    }

    pub fn report(&self) -> Option<VocabularyReport> {
        self.is_finished().then(|| VocabularyReport::from_quiz(self))
    }

    /// Reshuffle and zero every counter.
    pub fn restart(&mut self) {
        self.words.shuffle(&mut self.rng);
        self.cursor = 0;
        self.romaji = CategoryScore::default();
        self.english = CategoryScore::default();
        self.hints_used = 0;
        self.mistakes.clear();
        self.awaiting_ack = false;
    }

    pub fn set_categories(&mut self, categories: Categories) {
        self.categories = categories;
        self.restart();
    }

    /// One-line running tally for the enabled categories.
    pub fn status_line(&self) -> String {
        let (pos, total) = self.progress();
        let mut line = format!("Progress: {pos}/{total}");
        if self.categories.romaji {
            line.push_str(&format!(
                " | Romaji - Correct: {}, Incorrect: {}",
                self.romaji.correct, self.romaji.incorrect
            ));
        }
        if self.categories.english {
            line.push_str(&format!(
                " | English - Correct: {}, Incorrect: {}",
                self.english.correct, self.english.incorrect
            ));
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiz(words: Vec<VocabularyWord>, categories: Categories) -> VocabularyQuiz {
        VocabularyQuiz::with_rng(words, categories, SmallRng::seed_from_u64(7)).unwrap()
    }

    fn child() -> VocabularyWord {
        VocabularyWord::new("こ", "ko", "child")
    }

    #[test]
    fn test_empty_word_list_is_refused() {
        let result = VocabularyQuiz::new(Vec::new(), Categories::BOTH);
        assert!(matches!(result, Err(QuizError::NoWordsSelected)));
    }

    #[test]
    fn test_combined_single_part_checks_both_fields() {
        let mut q = quiz(vec![child()], Categories::BOTH);
        let feedback = q.submit("ko").unwrap().unwrap();
        assert!(!feedback.correct);
        assert!(feedback.romaji.as_ref().unwrap().correct);
        assert!(!feedback.english.as_ref().unwrap().correct);
        assert_eq!(q.romaji_score(), CategoryScore { correct: 1, incorrect: 0 });
        assert_eq!(q.english_score(), CategoryScore { correct: 0, incorrect: 1 });
        assert_eq!(q.mistakes().collect::<Vec<_>>(), vec![(0, 1)]);
    }

    #[test]
    fn test_combined_answer_is_trimmed_and_case_insensitive() {
        let mut q = quiz(vec![child()], Categories::BOTH);
        let feedback = q.submit("  KO , Child ").unwrap().unwrap();
        assert!(feedback.correct);
        assert!(!feedback.needs_ack);
        assert!(q.is_finished());
    }

    #[test]
    fn test_blank_input_is_ignored() {
        let mut q = quiz(vec![child()], Categories::ROMAJI);
        assert_eq!(q.submit("   ").unwrap(), None);
        assert_eq!(q.romaji_score().attempts(), 0);
    }

    #[test]
    fn test_wrong_answer_waits_for_one_acknowledgement() {
        let words = vec![child(), VocabularyWord::new("め", "me", "eye")];
        let mut q = quiz(words, Categories::ROMAJI);
        let first = q.current().unwrap().clone();
        let feedback = q.submit("zzz").unwrap().unwrap();
        assert!(feedback.needs_ack);
        assert_eq!(q.submit(&first.romaji), Err(QuizError::AwaitingAcknowledgement));

        assert!(q.acknowledge());
        assert!(!q.acknowledge());
        assert_eq!(q.progress(), (2, 2));
    }

    #[test]
    fn test_comment_on_correct_pauses_when_enabled() {
        let word = child().with_comment("also used for small things");
        let mut q = quiz(vec![word.clone()], Categories::ROMAJI);
        let feedback = q.submit("ko").unwrap().unwrap();
        assert!(feedback.needs_ack);
        assert_eq!(feedback.comment.as_deref(), Some("also used for small things"));
        assert!(!q.is_finished());
        q.acknowledge();
        assert!(q.is_finished());

        let mut quiet = quiz(vec![word], Categories::ROMAJI).with_comments_on_correct(false);
        let feedback = quiet.submit("ko").unwrap().unwrap();
        assert!(!feedback.needs_ack);
        assert!(quiet.is_finished());
    }

    #[test]
    fn test_submit_after_finish_is_refused() {
        let mut q = quiz(vec![child()], Categories::ENGLISH);
        q.submit("child").unwrap();
        assert_eq!(q.submit("child"), Err(QuizError::Finished));
    }

    #[test]
    fn test_hints_count_every_request() {
        let mut q = quiz(vec![child().with_hint("small person")], Categories::ROMAJI);
        assert_eq!(q.request_hint(), Some("small person"));
        assert_eq!(q.request_hint(), Some("small person"));
        assert_eq!(q.hints_used(), 2);

        let mut bare = quiz(vec![child()], Categories::ROMAJI);
        assert_eq!(bare.request_hint(), None);
        assert_eq!(bare.hints_used(), 0);
    }

    #[test]
    fn test_perfect_run_reports_no_mistakes() {
        let words = vec![child(), VocabularyWord::new("め", "me", "eye")];
        let mut q = quiz(words, Categories::BOTH);
        assert!(q.report().is_none());
        while let Some(word) = q.current().cloned() {
            q.submit(&format!("{},{}", word.romaji, word.english)).unwrap();
        }
        let report = q.report().unwrap();
        assert!(report.is_perfect());
        assert_eq!(report.romaji_percent(), 100.0);
        assert_eq!(report.english_percent(), 100.0);
    }

    #[test]
    fn test_report_sorts_mistakes_descending() {
        let words = vec![child(), VocabularyWord::new("め", "me", "eye")];
        let mut q = quiz(words, Categories::ROMAJI);
        q.submit("x").unwrap();
        q.acknowledge();
        let second = q.current().unwrap().clone();
        q.submit("x").unwrap();
        q.acknowledge();
        let report = q.report().unwrap();
        assert_eq!(report.mistakes.len(), 2);
        assert!(report.english.is_none());
        assert_eq!(report.romaji.unwrap().incorrect, 2);
        assert_eq!(report.mistakes[1].word, second);
    }

    #[test]
    fn test_restart_zeroes_counters() {
        let mut q = quiz(vec![child()], Categories::ROMAJI);
        q.request_hint();
        q.submit("x").unwrap();
        q.acknowledge();
        q.restart();
        assert!(!q.is_finished());
        assert_eq!(q.hints_used(), 0);
        assert_eq!(q.mistakes().count(), 0);
        assert_eq!(q.romaji_score(), CategoryScore::default());
    }

    #[test]
    fn test_disabling_last_category_enables_the_other() {
        let mut categories = Categories::ROMAJI;
        categories.set_romaji(false);
        assert_eq!(categories, Categories::ENGLISH);
        categories.set_romaji(true);
        categories.set_english(false);
        assert_eq!(categories, Categories::ROMAJI);
        assert_eq!(Categories::new(false, false), Categories::ROMAJI);
    }

    #[test]
    fn test_set_categories_restarts_pass() {
        let mut q = quiz(vec![child()], Categories::BOTH);
        q.submit("ko,child").unwrap();
        assert!(q.is_finished());
        q.set_categories(Categories::ENGLISH);
        assert!(!q.is_finished());
        assert_eq!(q.categories().prompt_label(), "Enter English:");
        assert_eq!(q.status_line(), "Progress: 1/1 | English - Correct: 0, Incorrect: 0");
    }
}
