use chrono::{DateTime, Utc};

use crate::content::vocabulary::VocabularyWord;
use crate::engine::scoring::{self, Grade};
use crate::session::vocabulary::VocabularyQuiz;

/// Correct/incorrect tally for one answer category.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CategoryScore {
    pub correct: u32,
    pub incorrect: u32,
}

impl CategoryScore {
    pub fn record(&mut self, correct: bool) {
        if correct {
            self.correct += 1;
        } else {
            self.incorrect += 1;
        }
    }

    pub fn attempts(&self) -> u32 {
        self.correct + self.incorrect
    }

    pub fn percent(&self) -> f64 {
        scoring::percent(self.correct, self.incorrect)
    }

    pub fn grade(&self) -> Grade {
        Grade::from_percent(self.percent())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MistakeEntry {
    pub word: VocabularyWord,
    pub count: u32,
}

/// End-of-pass summary for a vocabulary quiz.
#[derive(Clone, Debug)]
pub struct VocabularyReport {
    /// Present only for categories that were being practiced.
    pub romaji: Option<CategoryScore>,
    pub english: Option<CategoryScore>,
    pub hints_used: u32,
    /// Words answered wrong at least once, most mistakes first.
    pub mistakes: Vec<MistakeEntry>,
    pub finished_at: DateTime<Utc>,
}

impl VocabularyReport {
    pub fn from_quiz(quiz: &VocabularyQuiz) -> Self {
        let categories = quiz.categories();
        // Pass order breaks ties so equal counts keep a stable listing.
        let mut mistakes: Vec<(usize, MistakeEntry)> = quiz
            .mistakes()
            .filter_map(|(pos, count)| {
                quiz.words().get(pos).map(|word| {
                    (
                        pos,
                        MistakeEntry {
                            word: word.clone(),
                            count,
                        },
                    )
                })
            })
            .collect();
        mistakes.sort_by(|a, b| b.1.count.cmp(&a.1.count).then(a.0.cmp(&b.0)));

        Self {
            romaji: categories.romaji().then(|| quiz.romaji_score()),
            english: categories.english().then(|| quiz.english_score()),
            hints_used: quiz.hints_used(),
            mistakes: mistakes.into_iter().map(|(_, m)| m).collect(),
            finished_at: Utc::now(),
        }
    }

    pub fn romaji_percent(&self) -> f64 {
        self.romaji.map(|s| s.percent()).unwrap_or(0.0)
    }

    pub fn english_percent(&self) -> f64 {
        self.english.map(|s| s.percent()).unwrap_or(0.0)
    }

    /// Accuracy over every answer in every category, if any were given.
    pub fn overall_percent(&self) -> Option<f64> {
        let total = self
            .romaji
            .into_iter()
            .chain(self.english)
            .fold(CategoryScore::default(), |acc, s| CategoryScore {
                correct: acc.correct + s.correct,
                incorrect: acc.incorrect + s.incorrect,
            });
        (total.attempts() > 0).then(|| total.percent())
    }

    pub fn is_perfect(&self) -> bool {
        self.mistakes.is_empty()
    }
}
